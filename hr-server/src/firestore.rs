//! Placeholder `hr_identity::MetadataStore`.
//!
//! The Firestore document layout other services already use is an explicit
//! non-goal (see `hr-identity`'s module doc), so this binary cannot ship a
//! real client for it without inventing a schema no other service agrees
//! with. This implementation fails every lookup with a clear
//! `NotConfigured`-shaped error rather than silently returning empty data —
//! a deployment that needs mandate resolution must inject its own
//! `MetadataStore` built against its actual Firestore project.

use hr_identity::{ClientProfile, MetadataError, MetadataStore, TenantId, UserId};
use serde_json::Value;

pub struct UnconfiguredMetadataStore;

#[async_trait::async_trait]
impl MetadataStore for UnconfiguredMetadataStore {
    async fn resolve_client_by_contact_space(
        &self,
        _user_id: &UserId,
        _tenant_id: &TenantId,
    ) -> Result<Option<String>, MetadataError> {
        Err(unconfigured())
    }

    async fn legacy_root_client_uuid(&self, _user_id: &UserId) -> Result<Option<String>, MetadataError> {
        Err(unconfigured())
    }

    async fn reconstruct_full_client_profile(
        &self,
        _user_id: &UserId,
        _client_uuid: &str,
        _tenant_id: &TenantId,
    ) -> Result<Option<ClientProfile>, MetadataError> {
        Err(unconfigured())
    }

    async fn get_document(&self, _path: &str) -> Result<Option<Value>, MetadataError> {
        Err(unconfigured())
    }
}

fn unconfigured() -> MetadataError {
    MetadataError::Transport(
        "no Firestore metadata store wired into this deployment; inject a concrete MetadataStore".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_lookup_fails_clearly() {
        let store = UnconfiguredMetadataStore;
        let user = UserId::new("u1");
        let tenant = TenantId::new("t1");

        assert!(matches!(
            store.resolve_client_by_contact_space(&user, &tenant).await,
            Err(MetadataError::Transport(_))
        ));
        assert!(matches!(
            store.legacy_root_client_uuid(&user).await,
            Err(MetadataError::Transport(_))
        ));
        assert!(matches!(
            store.reconstruct_full_client_profile(&user, "client-1", &tenant).await,
            Err(MetadataError::Transport(_))
        ));
        assert!(matches!(store.get_document("any/path").await, Err(MetadataError::Transport(_))));
    }
}
