use std::fmt;

macro_rules! opaque_string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_string_id!(UserId);
opaque_string_id!(TenantId);
opaque_string_id!(SessionId);

/// Ordered string of segments locating a mandate document, e.g.
/// `clients/{user_id}/bo_clients/{client_id}/mandates/{mandate_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MandatePath(String);

impl MandatePath {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn join(&self, segment: &str) -> String {
        format!("{}/{}", self.0, segment)
    }
}

impl fmt::Display for MandatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `Kind ∈ { erp_odoo, drive_oauth, … }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    ErpOdoo,
    DriveOAuth,
}

impl CredentialKind {
    /// `(document_collection, document_name)` under the mandate path, e.g.
    /// `{mandate}/erp/odoo`.
    pub fn doc_segment(&self) -> (&'static str, &'static str) {
        match self {
            CredentialKind::ErpOdoo => ("erp", "odoo"),
            CredentialKind::DriveOAuth => ("drive", "oauth"),
        }
    }
}

/// A resolved secret value. `Debug` redacts the inner value so it never ends
/// up in a log line by accident.
#[derive(Clone)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue(<redacted>)")
    }
}

/// Per-`(UserId, TenantId, Kind)` credentials bundle, materialized on first
/// request.
#[derive(Debug, Clone)]
pub struct CredentialsBundle {
    pub kind: CredentialKind,
    pub endpoint: String,
    pub database: Option<String>,
    pub user_handle: String,
    pub secret_ref: String,
    pub secret_value: SecretValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_value_debug_is_redacted() {
        let secret = SecretValue::new("super-secret".to_string());
        assert_eq!(format!("{secret:?}"), "SecretValue(<redacted>)");
    }

    #[test]
    fn credential_kind_doc_segment() {
        assert_eq!(CredentialKind::ErpOdoo.doc_segment(), ("erp", "odoo"));
        assert_eq!(CredentialKind::DriveOAuth.doc_segment(), ("drive", "oauth"));
    }
}
