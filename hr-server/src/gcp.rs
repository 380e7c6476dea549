//! Concrete `hr-secrets` seam implementations for this binary.
//!
//! `hr-secrets` deliberately stops short of depending on the Google Cloud
//! SDK (see its module doc). The ambient-credentials path doesn't need one
//! though — on GCE/GKE/Cloud Run, ambient credentials are a single
//! unauthenticated GET against the instance metadata server, so that half
//! of the seam gets a real implementation here. Minting a token from an
//! inline service-account key needs RSA/JWT signing this workspace's
//! dependency stack doesn't carry, so that half stays a documented stub.

use hr_secrets::{AmbientCredentialSource, SecretError, ServiceAccountTokenMinter};
use serde::Deserialize;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

/// Fetches a bearer token from the GCE/GKE/Cloud Run metadata server.
pub struct MetadataServerAmbientSource {
    http: reqwest::Client,
}

impl MetadataServerAmbientSource {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }
}

impl Default for MetadataServerAmbientSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AmbientCredentialSource for MetadataServerAmbientSource {
    async fn bearer_token(&self) -> Result<String, SecretError> {
        let resp = self
            .http
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| SecretError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SecretError::Transport(format!("metadata server returned {}", resp.status())));
        }

        let body: MetadataTokenResponse =
            resp.json().await.map_err(|e| SecretError::Transport(e.to_string()))?;
        Ok(body.access_token)
    }
}

/// Minting a token from an inline service-account key requires RSA-signing a
/// JWT assertion, which needs a crate this workspace doesn't carry. Rather
/// than fabricate that dependency, this reports `NotConfigured` — deployments
/// that need the inline-key bootstrap path must supply their own minter.
pub struct UnavailableServiceAccountTokenMinter;

#[async_trait::async_trait]
impl ServiceAccountTokenMinter for UnavailableServiceAccountTokenMinter {
    async fn mint_token(&self, _service_account_json: &serde_json::Value) -> Result<String, SecretError> {
        Err(SecretError::NotConfigured(
            "inline service-account token minting is not implemented in this deployment".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_minter_reports_not_configured() {
        let minter = UnavailableServiceAccountTokenMinter;
        let err = minter.mint_token(&serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, SecretError::NotConfigured(_)));
    }
}
