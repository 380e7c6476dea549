//! RPC-facing error taxonomy. Every downstream crate's error
//! enum collapses into one `RpcErrorKind` here, so the wire envelope in
//! `wire.rs` never has to know about `DataError`, `ConnectionError`, and the
//! rest individually.

use hr_connections::{ConnectionError, ProbeFailure};
use hr_data::DataError;
use hr_identity::IdentityError;
use hr_secrets::SecretError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcErrorKind {
    NotConfigured,
    NotFound,
    PermissionDenied,
    OAuthReauthRequired,
    IncompleteCredentials,
    Transport,
    Timeout,
    Conflict,
    BadRequest,
    Internal,
}

/// The only error type an `RpcContext` handler may return. `oauth_error` is
/// set automatically for [`RpcErrorKind::OAuthReauthRequired`] so callers at
/// the wire boundary don't have to match on `kind` twice.
#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub kind: RpcErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub oauth_error: bool,
}

impl RpcError {
    pub fn new(kind: RpcErrorKind, message: impl Into<String>) -> Self {
        let oauth_error = matches!(kind, RpcErrorKind::OAuthReauthRequired);
        Self { kind, message: message.into(), details: None, oauth_error }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::BadRequest, message)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::NotConfigured, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::Internal, message)
    }

    pub fn oauth_reauth_required(message: impl Into<String>) -> Self {
        Self::new(RpcErrorKind::OAuthReauthRequired, message)
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<DataError> for RpcError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => RpcError::new(RpcErrorKind::NotFound, msg),
            DataError::Database(err) => RpcError::new(RpcErrorKind::Internal, err.to_string()),
            DataError::Other(msg) => RpcError::new(RpcErrorKind::Internal, msg),
        }
    }
}

impl From<IdentityError> for RpcError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound(msg) => RpcError::new(RpcErrorKind::NotFound, msg),
            IdentityError::IncompleteCredentials { missing } => RpcError::new(
                RpcErrorKind::IncompleteCredentials,
                format!("missing credential fields: {}", missing.join(", ")),
            )
            .with_details(serde_json::json!({ "missing": missing })),
            IdentityError::Transport(msg) => RpcError::new(RpcErrorKind::Transport, msg),
            IdentityError::Secret(err) => RpcError::from(err),
        }
    }
}

impl From<SecretError> for RpcError {
    fn from(err: SecretError) -> Self {
        match err {
            SecretError::NotConfigured(msg) => RpcError::new(RpcErrorKind::NotConfigured, msg),
            SecretError::NotFound(name) => RpcError::new(RpcErrorKind::NotFound, format!("secret not found: {name}")),
            SecretError::PermissionDenied(name) => {
                RpcError::new(RpcErrorKind::PermissionDenied, format!("secret access denied: {name}"))
            }
            SecretError::Transport(msg) => RpcError::new(RpcErrorKind::Transport, msg),
        }
    }
}

impl From<ProbeFailure> for RpcError {
    fn from(err: ProbeFailure) -> Self {
        match err {
            ProbeFailure::OAuthRecoverable(msg) => RpcError::new(RpcErrorKind::OAuthReauthRequired, msg),
            ProbeFailure::Permission(msg) => RpcError::new(RpcErrorKind::PermissionDenied, msg),
            ProbeFailure::Transport(msg) => RpcError::new(RpcErrorKind::Transport, msg),
        }
    }
}

impl From<ConnectionError> for RpcError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Identity(err) => RpcError::from(err),
            ConnectionError::Probe(err) => RpcError::from(err),
            ConnectionError::Factory(msg) => RpcError::new(RpcErrorKind::Transport, msg),
        }
    }
}

pub type RpcResult<T> = Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_reauth_sets_flag_automatically() {
        let err = RpcError::oauth_reauth_required("refresh token revoked");
        assert!(err.oauth_error);
    }

    #[test]
    fn incomplete_credentials_carries_missing_list_in_details() {
        let err = RpcError::from(IdentityError::IncompleteCredentials { missing: vec!["secret_ref".to_string()] });
        assert_eq!(err.kind, RpcErrorKind::IncompleteCredentials);
        assert_eq!(err.details.unwrap()["missing"][0], "secret_ref");
    }

    #[test]
    fn oauth_recoverable_probe_failure_becomes_reauth_required() {
        let err = RpcError::from(ConnectionError::Probe(ProbeFailure::OAuthRecoverable("expired".to_string())));
        assert_eq!(err.kind, RpcErrorKind::OAuthReauthRequired);
        assert!(err.oauth_error);
    }
}
