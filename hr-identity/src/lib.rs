//! Identity and mandate resolution.
//!
//! Grounded on `original_source/app/erp_service.py`'s `_get_erp_credentials` /
//! `get_mandate_path`: the same three-step client-uuid resolution order
//! (explicit id → contact-space mapping → legacy per-user root document),
//! the same `clients/{user_id}/bo_clients/{client_id}/mandates/{mandate_id}`
//! path shape, and the same "read the downstream doc, extract fields, fail
//! on the first missing one" credential materialization. The Firestore
//! document layout itself is a non-goal, so the concrete reads are behind a
//! `MetadataStore` seam rather than a real Firestore client.

pub mod types;

use std::sync::Arc;

use dashmap::DashMap;
use hr_secrets::{SecretError, SecretResolver};

pub use types::{CredentialKind, CredentialsBundle, MandatePath, SecretValue, SessionId, TenantId, UserId};

#[derive(Debug, Clone)]
pub enum MetadataError {
    NotFound(String),
    Transport(String),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::NotFound(path) => write!(f, "metadata document not found: {path}"),
            MetadataError::Transport(msg) => write!(f, "metadata store transport error: {msg}"),
        }
    }
}

impl std::error::Error for MetadataError {}

/// The resolved mandate-id/client-id pair needed to build profile-scoped
/// Firestore paths, grounded on `firebase_providers.reconstruct_full_client_profile`.
#[derive(Debug, Clone)]
pub struct ClientProfile {
    pub mandate_id: String,
    pub client_id: String,
    pub mandate_bank_erp: Option<String>,
}

/// Pluggable seam over the metadata store (Firestore in production). Its
/// document layout is out of scope for this crate — only the three lookups
/// the mandate resolver needs are named here.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// `resolve_client_by_contact_space(user_id, tenant_id) -> client_uuid`.
    async fn resolve_client_by_contact_space(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> Result<Option<String>, MetadataError>;

    /// Legacy fallback: `clients/{user_id}/bo_clients/{user_id}`.
    async fn legacy_root_client_uuid(&self, user_id: &UserId) -> Result<Option<String>, MetadataError>;

    /// `reconstruct_full_client_profile(user_id, client_uuid, tenant_id)`.
    async fn reconstruct_full_client_profile(
        &self,
        user_id: &UserId,
        client_uuid: &str,
        tenant_id: &TenantId,
    ) -> Result<Option<ClientProfile>, MetadataError>;

    /// Generic document read, used for `{mandate}/erp/{kind}` and similar.
    async fn get_document(&self, path: &str) -> Result<Option<serde_json::Value>, MetadataError>;
}

#[derive(Debug, Clone)]
pub enum IdentityError {
    NotFound(String),
    IncompleteCredentials { missing: Vec<String> },
    Transport(String),
    Secret(SecretError),
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::NotFound(msg) => write!(f, "not found: {msg}"),
            IdentityError::IncompleteCredentials { missing } => {
                write!(f, "incomplete credentials, missing: {}", missing.join(", "))
            }
            IdentityError::Transport(msg) => write!(f, "transport error: {msg}"),
            IdentityError::Secret(err) => write!(f, "secret resolution error: {err}"),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<MetadataError> for IdentityError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::NotFound(msg) => IdentityError::NotFound(msg),
            MetadataError::Transport(msg) => IdentityError::Transport(msg),
        }
    }
}

impl From<SecretError> for IdentityError {
    fn from(err: SecretError) -> Self {
        IdentityError::Secret(err)
    }
}

/// `(user_id, tenant_id) -> mandate_path + client_id + mandate_id`, plus
/// per-kind credential materialization.
#[async_trait::async_trait]
pub trait MandateResolver: Send + Sync {
    async fn resolve(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
        explicit_client_id: Option<&str>,
    ) -> Result<MandateResolution, IdentityError>;

    async fn get_credentials(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
        kind: CredentialKind,
    ) -> Result<CredentialsBundle, IdentityError>;
}

#[derive(Debug, Clone)]
pub struct MandateResolution {
    pub mandate_path: MandatePath,
    pub client_id: String,
    pub mandate_id: String,
}

/// The mandate cache is a performance shortcut only — never consulted for
/// correctness, so it is never invalidated on a write path, only ever
/// refreshed by a fresh `resolve()` call when a caller chooses to bypass it.
pub struct FirestoreMandateResolver {
    store: Arc<dyn MetadataStore>,
    secrets: Arc<dyn SecretResolver>,
    cache: DashMap<(UserId, TenantId), MandateResolution>,
}

impl FirestoreMandateResolver {
    pub fn new(store: Arc<dyn MetadataStore>, secrets: Arc<dyn SecretResolver>) -> Self {
        Self {
            store,
            secrets,
            cache: DashMap::new(),
        }
    }

    async fn resolve_client_uuid(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
        explicit_client_id: Option<&str>,
    ) -> Result<String, IdentityError> {
        if let Some(explicit) = explicit_client_id {
            return Ok(explicit.to_string());
        }
        if let Some(uuid) = self.store.resolve_client_by_contact_space(user_id, tenant_id).await? {
            return Ok(uuid);
        }
        if let Some(uuid) = self.store.legacy_root_client_uuid(user_id).await? {
            return Ok(uuid);
        }
        Err(IdentityError::NotFound(format!(
            "client_uuid not found for user={} tenant={}",
            user_id.as_str(),
            tenant_id.as_str()
        )))
    }
}

#[async_trait::async_trait]
impl MandateResolver for FirestoreMandateResolver {
    async fn resolve(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
        explicit_client_id: Option<&str>,
    ) -> Result<MandateResolution, IdentityError> {
        if explicit_client_id.is_none() {
            if let Some(cached) = self.cache.get(&(user_id.clone(), tenant_id.clone())) {
                return Ok(cached.clone());
            }
        }

        let client_uuid = self.resolve_client_uuid(user_id, tenant_id, explicit_client_id).await?;
        let profile = self
            .store
            .reconstruct_full_client_profile(user_id, &client_uuid, tenant_id)
            .await?
            .ok_or_else(|| {
                IdentityError::NotFound(format!(
                    "full client profile not found for user={} tenant={}",
                    user_id.as_str(),
                    tenant_id.as_str()
                ))
            })?;

        let mandate_path = MandatePath::new(format!(
            "clients/{}/bo_clients/{}/mandates/{}",
            user_id.as_str(),
            profile.client_id,
            profile.mandate_id
        ));

        let resolution = MandateResolution {
            mandate_path,
            client_id: profile.client_id,
            mandate_id: profile.mandate_id,
        };

        self.cache
            .insert((user_id.clone(), tenant_id.clone()), resolution.clone());
        Ok(resolution)
    }

    async fn get_credentials(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
        kind: CredentialKind,
    ) -> Result<CredentialsBundle, IdentityError> {
        let resolution = self.resolve(user_id, tenant_id, None).await?;
        let (segment, name) = kind.doc_segment();
        let doc_path = format!("{}/{}/{}", resolution.mandate_path.as_str(), segment, name);

        let doc = self
            .store
            .get_document(&doc_path)
            .await?
            .ok_or_else(|| IdentityError::NotFound(format!("credentials document not found: {doc_path}")))?;

        let mut missing = Vec::new();
        let endpoint = field_str(&doc, "endpoint", &mut missing);
        let user_handle = field_str(&doc, "user_handle", &mut missing);
        let secret_ref = field_str(&doc, "secret_ref", &mut missing);
        let database = doc.get("database").and_then(|v| v.as_str()).map(str::to_string);

        if !missing.is_empty() {
            return Err(IdentityError::IncompleteCredentials { missing });
        }

        let secret_value = self.secrets.get_secret(&secret_ref.unwrap()).await?;

        Ok(CredentialsBundle {
            kind,
            endpoint: endpoint.unwrap(),
            database,
            user_handle: user_handle.unwrap(),
            secret_ref: secret_ref_fallback(&doc),
            secret_value: SecretValue::new(secret_value),
        })
    }
}

fn field_str(doc: &serde_json::Value, field: &str, missing: &mut Vec<String>) -> Option<String> {
    match doc.get(field).and_then(|v| v.as_str()) {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => {
            missing.push(field.to_string());
            None
        }
    }
}

fn secret_ref_fallback(doc: &serde_json::Value) -> String {
    doc.get("secret_ref").and_then(|v| v.as_str()).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeStore {
        contact_space: Option<String>,
        legacy_root: Option<String>,
        profile: Option<ClientProfile>,
        docs: Mutex<std::collections::HashMap<String, serde_json::Value>>,
    }

    #[async_trait::async_trait]
    impl MetadataStore for FakeStore {
        async fn resolve_client_by_contact_space(
            &self,
            _user_id: &UserId,
            _tenant_id: &TenantId,
        ) -> Result<Option<String>, MetadataError> {
            Ok(self.contact_space.clone())
        }

        async fn legacy_root_client_uuid(&self, _user_id: &UserId) -> Result<Option<String>, MetadataError> {
            Ok(self.legacy_root.clone())
        }

        async fn reconstruct_full_client_profile(
            &self,
            _user_id: &UserId,
            _client_uuid: &str,
            _tenant_id: &TenantId,
        ) -> Result<Option<ClientProfile>, MetadataError> {
            Ok(self.profile.clone())
        }

        async fn get_document(&self, path: &str) -> Result<Option<serde_json::Value>, MetadataError> {
            Ok(self.docs.lock().unwrap().get(path).cloned())
        }
    }

    struct FakeSecrets;

    #[async_trait::async_trait]
    impl SecretResolver for FakeSecrets {
        async fn get_secret(&self, _name: &str) -> Result<String, SecretError> {
            Ok("shh".to_string())
        }
    }

    fn store_with_profile() -> FakeStore {
        FakeStore {
            contact_space: Some("client-uuid-1".to_string()),
            legacy_root: None,
            profile: Some(ClientProfile {
                mandate_id: "mandate-1".to_string(),
                client_id: "client-uuid-1".to_string(),
                mandate_bank_erp: Some("odoo".to_string()),
            }),
            docs: Mutex::new(std::collections::HashMap::new()),
        }
    }

    #[tokio::test]
    async fn resolve_prefers_contact_space_over_legacy_root() {
        let store = Arc::new(store_with_profile());
        let resolver = FirestoreMandateResolver::new(store, Arc::new(FakeSecrets));
        let user = UserId::new("u1");
        let tenant = TenantId::new("t1");

        let resolution = resolver.resolve(&user, &tenant, None).await.unwrap();
        assert_eq!(
            resolution.mandate_path.as_str(),
            "clients/u1/bo_clients/client-uuid-1/mandates/mandate-1"
        );
    }

    #[tokio::test]
    async fn resolve_is_cached_on_second_call() {
        let store = Arc::new(store_with_profile());
        let resolver = FirestoreMandateResolver::new(store.clone(), Arc::new(FakeSecrets));
        let user = UserId::new("u1");
        let tenant = TenantId::new("t1");

        let first = resolver.resolve(&user, &tenant, None).await.unwrap();
        let second = resolver.resolve(&user, &tenant, None).await.unwrap();
        assert_eq!(first.mandate_path.as_str(), second.mandate_path.as_str());
    }

    #[tokio::test]
    async fn get_credentials_reports_missing_fields() {
        let store = store_with_profile();
        store.docs.lock().unwrap().insert(
            "clients/u1/bo_clients/client-uuid-1/mandates/mandate-1/erp/odoo".to_string(),
            serde_json::json!({ "endpoint": "https://odoo.example.com" }),
        );
        let resolver = FirestoreMandateResolver::new(Arc::new(store), Arc::new(FakeSecrets));
        let user = UserId::new("u1");
        let tenant = TenantId::new("t1");

        let err = resolver
            .get_credentials(&user, &tenant, CredentialKind::ErpOdoo)
            .await
            .unwrap_err();
        match err {
            IdentityError::IncompleteCredentials { missing } => {
                assert!(missing.contains(&"user_handle".to_string()));
                assert!(missing.contains(&"secret_ref".to_string()));
            }
            other => panic!("expected IncompleteCredentials, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_credentials_materializes_secret_on_complete_doc() {
        let store = store_with_profile();
        store.docs.lock().unwrap().insert(
            "clients/u1/bo_clients/client-uuid-1/mandates/mandate-1/erp/odoo".to_string(),
            serde_json::json!({
                "endpoint": "https://odoo.example.com",
                "database": "acme",
                "user_handle": "svc-account",
                "secret_ref": "odoo-secret",
            }),
        );
        let resolver = FirestoreMandateResolver::new(Arc::new(store), Arc::new(FakeSecrets));
        let user = UserId::new("u1");
        let tenant = TenantId::new("t1");

        let bundle = resolver
            .get_credentials(&user, &tenant, CredentialKind::ErpOdoo)
            .await
            .unwrap();
        assert_eq!(bundle.endpoint, "https://odoo.example.com");
        assert_eq!(bundle.secret_value.expose(), "shh");
    }
}
