//! Secret and credential resolution.
//!
//! Grounded on `original_source/app/tools/g_cred.py`: the same four-step
//! identity bootstrap order, the same secret-version path resolution, and
//! the same `get_aws_credentials_from_gsm`-style JSON convenience. The
//! `SecretResolver` trait shape follows `r2e-core::config::secrets`'s
//! `SecretResolver`/`DefaultSecretResolver` split (a trait for the contract,
//! one concrete implementation that talks to the real backend).
//!
//! This crate cannot depend on the real Google Cloud SDK (it isn't part of
//! this workspace's dependency stack, and minting an OAuth2 bearer token
//! from a service-account key requires RSA/JWT machinery this workspace
//! doesn't carry). Both "turn ambient environment credentials into
//! a bearer token" and "turn an inline service-account key into a bearer
//! token" are therefore pluggable seams (`AmbientCredentialSource`,
//! `ServiceAccountTokenMinter>`) rather than real implementations — callers
//! inject the concrete minter appropriate to their deployment.

use std::fmt;
use std::sync::Arc;

use hr_config::{GoogleIdentitySource, HrConfig};
use tokio::sync::OnceCell;

#[derive(Debug, Clone)]
pub enum SecretError {
    NotConfigured(String),
    NotFound(String),
    PermissionDenied(String),
    Transport(String),
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretError::NotConfigured(msg) => write!(f, "secret resolver not configured: {msg}"),
            SecretError::NotFound(name) => write!(f, "secret not found: {name}"),
            SecretError::PermissionDenied(name) => write!(f, "permission denied fetching secret: {name}"),
            SecretError::Transport(msg) => write!(f, "secret store transport error: {msg}"),
        }
    }
}

impl std::error::Error for SecretError {}

/// Mints a bearer token from ambient environment credentials (step 3 of the
/// bootstrap order). A real implementation talks to a metadata server or
/// reads a credential file pointed to by the environment; this crate only
/// defines the seam.
#[async_trait::async_trait]
pub trait AmbientCredentialSource: Send + Sync {
    async fn bearer_token(&self) -> Result<String, SecretError>;
}

/// Mints a bearer token from an inline service-account key (steps 1 and 2 of
/// the bootstrap order).
#[async_trait::async_trait]
pub trait ServiceAccountTokenMinter: Send + Sync {
    async fn mint_token(&self, service_account_json: &serde_json::Value) -> Result<String, SecretError>;
}

#[async_trait::async_trait]
pub trait SecretResolver: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError>;

    /// Convenience for callers that store a JSON-encoded credentials bundle
    /// as a single secret (the `AWS_SECRET_NAME` path in `g_cred.py`).
    async fn get_json_secret(&self, name: &str) -> Result<serde_json::Value, SecretError> {
        let raw = self.get_secret(name).await?;
        serde_json::from_str(&raw).map_err(|e| SecretError::Transport(e.to_string()))
    }
}

/// Concrete `SecretResolver` backed by a GCP Secret Manager-style REST API.
///
/// The resolved bearer token is memoized for the process lifetime, matching
/// `g_cred.py`'s module-level `_client_cache` — this process never re-runs
/// the identity bootstrap once it has succeeded once.
pub struct SecretManagerClient {
    http: reqwest::Client,
    project_id: Option<String>,
    identity: GoogleIdentitySource,
    ambient: Arc<dyn AmbientCredentialSource>,
    minter: Arc<dyn ServiceAccountTokenMinter>,
    token: OnceCell<String>,
    api_base: String,
}

impl SecretManagerClient {
    pub fn new(
        config: &HrConfig,
        ambient: Arc<dyn AmbientCredentialSource>,
        minter: Arc<dyn ServiceAccountTokenMinter>,
    ) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(5))
                .build()
                .expect("reqwest client build"),
            project_id: config.google_project_id.clone(),
            identity: config.google_identity.clone(),
            ambient,
            minter,
            token: OnceCell::new(),
            api_base: "https://secretmanager.googleapis.com/v1".to_string(),
        }
    }

    async fn bearer_token(&self) -> Result<&str, SecretError> {
        self.token
            .get_or_try_init(|| async { self.bootstrap_token().await })
            .await
            .map(|s| s.as_str())
    }

    async fn bootstrap_token(&self) -> Result<String, SecretError> {
        match &self.identity {
            GoogleIdentitySource::InlineBase64(b64) => {
                let decoded = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, b64)
                    .map_err(|e| SecretError::NotConfigured(format!("invalid base64 service account: {e}")))?;
                let json: serde_json::Value = serde_json::from_slice(&decoded)
                    .map_err(|e| SecretError::NotConfigured(format!("invalid service account json: {e}")))?;
                self.minter.mint_token(&json).await
            }
            GoogleIdentitySource::Inline(json) => {
                let json: serde_json::Value = serde_json::from_str(json)
                    .map_err(|e| SecretError::NotConfigured(format!("invalid service account json: {e}")))?;
                self.minter.mint_token(&json).await
            }
            GoogleIdentitySource::Ambient { bootstrap_secret } => {
                let ambient_token = self.ambient.bearer_token().await?;
                match bootstrap_secret {
                    None => Ok(ambient_token),
                    Some(secret_name) => {
                        // Fetch the real service-account key using ambient credentials,
                        // then mint a token from it — matches g_cred.py's step 3.
                        let raw = self.access_secret_with_token(&ambient_token, secret_name).await?;
                        let json: serde_json::Value = serde_json::from_str(&raw)
                            .map_err(|e| SecretError::NotConfigured(format!("invalid service account json: {e}")))?;
                        self.minter.mint_token(&json).await
                    }
                }
            }
        }
    }

    fn resolve_version_path(&self, secret_name: &str) -> Result<String, SecretError> {
        if secret_name.starts_with("projects/") {
            return Ok(if secret_name.contains("/versions/") {
                secret_name.to_string()
            } else {
                format!("{secret_name}/versions/latest")
            });
        }
        let project_id = self
            .project_id
            .as_ref()
            .ok_or_else(|| SecretError::NotConfigured("GOOGLE_PROJECT_ID missing for secret access".into()))?;
        Ok(format!("projects/{project_id}/secrets/{secret_name}/versions/latest"))
    }

    async fn access_secret_with_token(&self, token: &str, secret_name: &str) -> Result<String, SecretError> {
        let path = self.resolve_version_path(secret_name)?;
        let url = format!("{}/{path}:access", self.api_base);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SecretError::Transport(e.to_string()))?;

        match resp.status() {
            reqwest::StatusCode::OK => {}
            reqwest::StatusCode::NOT_FOUND => return Err(SecretError::NotFound(secret_name.to_string())),
            reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::UNAUTHORIZED => {
                return Err(SecretError::PermissionDenied(secret_name.to_string()))
            }
            status => return Err(SecretError::Transport(format!("unexpected status {status}"))),
        }

        let body: SecretAccessResponse = resp
            .json()
            .await
            .map_err(|e| SecretError::Transport(e.to_string()))?;
        let decoded = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &body.payload.data)
            .map_err(|e| SecretError::Transport(format!("invalid base64 payload: {e}")))?;
        String::from_utf8(decoded).map_err(|e| SecretError::Transport(e.to_string()))
    }
}

#[derive(serde::Deserialize)]
struct SecretAccessResponse {
    payload: SecretPayload,
}

#[derive(serde::Deserialize)]
struct SecretPayload {
    data: String,
}

#[async_trait::async_trait]
impl SecretResolver for SecretManagerClient {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let token = self.bearer_token().await?.to_string();
        self.access_secret_with_token(&token, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticAmbient;

    #[async_trait::async_trait]
    impl AmbientCredentialSource for StaticAmbient {
        async fn bearer_token(&self) -> Result<String, SecretError> {
            Ok("ambient-token".to_string())
        }
    }

    struct StaticMinter;

    #[async_trait::async_trait]
    impl ServiceAccountTokenMinter for StaticMinter {
        async fn mint_token(&self, _service_account_json: &serde_json::Value) -> Result<String, SecretError> {
            Ok("minted-token".to_string())
        }
    }

    #[test]
    fn resolve_version_path_appends_latest() {
        let client = SecretManagerClient {
            http: reqwest::Client::new(),
            project_id: Some("proj-1".into()),
            identity: GoogleIdentitySource::Ambient { bootstrap_secret: None },
            ambient: Arc::new(StaticAmbient),
            minter: Arc::new(StaticMinter),
            token: OnceCell::new(),
            api_base: "https://secretmanager.googleapis.com/v1".into(),
        };
        assert_eq!(
            client.resolve_version_path("my-secret").unwrap(),
            "projects/proj-1/secrets/my-secret/versions/latest"
        );
    }

    #[test]
    fn resolve_version_path_respects_explicit_version() {
        let client = SecretManagerClient {
            http: reqwest::Client::new(),
            project_id: Some("proj-1".into()),
            identity: GoogleIdentitySource::Ambient { bootstrap_secret: None },
            ambient: Arc::new(StaticAmbient),
            minter: Arc::new(StaticMinter),
            token: OnceCell::new(),
            api_base: "https://secretmanager.googleapis.com/v1".into(),
        };
        assert_eq!(
            client.resolve_version_path("projects/proj-1/secrets/s/versions/3").unwrap(),
            "projects/proj-1/secrets/s/versions/3"
        );
    }

    #[tokio::test]
    async fn ambient_without_bootstrap_secret_uses_ambient_token_directly() {
        let client = SecretManagerClient {
            http: reqwest::Client::new(),
            project_id: None,
            identity: GoogleIdentitySource::Ambient { bootstrap_secret: None },
            ambient: Arc::new(StaticAmbient),
            minter: Arc::new(StaticMinter),
            token: OnceCell::new(),
            api_base: "https://secretmanager.googleapis.com/v1".into(),
        };
        assert_eq!(client.bearer_token().await.unwrap(), "ambient-token");
    }
}
