//! Google Drive client, grounded on `original_source/app/driveClientService.py`'s
//! `_initialize_prod_credentials`: a stored OAuth2 refresh token is
//! exchanged for a short-lived access token against `token_uri` using the
//! standard `grant_type=refresh_token` form POST, then that access token
//! authenticates Drive REST calls. No service-account JWT signing is
//! involved in this path, so unlike the Secret Manager bootstrap in
//! `hr-secrets`, it doesn't need a pluggable crypto seam — it's a plain
//! reqwest round trip.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use hr_identity::CredentialsBundle;
use serde::Deserialize;
use serde_json::Value;

use crate::cache::{ConnectionError, ConnectionFactory};
use crate::connectable::{Connectable, ProbeFailure};

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

#[derive(Debug, Clone, Deserialize)]
struct OAuthRefreshDoc {
    refresh_token: String,
    token_uri: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Holds the refresh credentials and a lazily-refreshed access token behind
/// a std `RwLock` (refreshed rarely, read on every call).
#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    refresh: OAuthRefreshDoc,
    token: std::sync::Arc<RwLock<Option<AccessToken>>>,
}

#[derive(Debug, Clone)]
pub enum DriveError {
    OAuth(String),
    Transport(String),
    Api { status: u16, body: String },
}

impl std::fmt::Display for DriveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriveError::OAuth(msg) => write!(f, "drive oauth error: {msg}"),
            DriveError::Transport(msg) => write!(f, "drive transport error: {msg}"),
            DriveError::Api { status, body } => write!(f, "drive api error ({status}): {body}"),
        }
    }
}

impl std::error::Error for DriveError {}

impl DriveClient {
    pub async fn connect(http: reqwest::Client, secret_json: &str) -> Result<Self, ConnectionError> {
        let refresh: OAuthRefreshDoc =
            serde_json::from_str(secret_json).map_err(|e| ConnectionError::Factory(format!("invalid drive oauth secret: {e}")))?;

        let client = Self {
            http,
            refresh,
            token: std::sync::Arc::new(RwLock::new(None)),
        };
        client.ensure_token().await.map_err(|e| ConnectionError::Factory(e.to_string()))?;
        Ok(client)
    }

    async fn ensure_token(&self) -> Result<String, DriveError> {
        if let Some(token) = self.token.read().unwrap().as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }
        self.refresh_token().await
    }

    async fn refresh_token(&self) -> Result<String, DriveError> {
        let form = [
            ("refresh_token", self.refresh.refresh_token.as_str()),
            ("client_id", self.refresh.client_id.as_str()),
            ("client_secret", self.refresh.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.refresh.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| DriveError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::OAuth(format!("token refresh failed ({status}): {body}")));
        }

        let parsed: TokenResponse = response.json().await.map_err(|e| DriveError::Transport(e.to_string()))?;
        let expires_at = Instant::now() + Duration::from_secs(parsed.expires_in.saturating_sub(30));
        let access_token = parsed.access_token.clone();

        *self.token.write().unwrap() = Some(AccessToken {
            value: access_token.clone(),
            expires_at,
        });
        Ok(access_token)
    }

    /// Authenticated no-op metadata fetch, used as the Drive connectivity probe.
    pub async fn about(&self) -> Result<Value, DriveError> {
        self.get("/about", &[("fields", "user")]).await
    }

    /// Lists the files directly under a folder, grounded on
    /// `driveClientService.py`'s `list_files_in_doc_to_do`. Each returned
    /// file carries whatever `status` field the caller's Drive convention
    /// stamps on it (`to_process`/`in_process`/`processed`); `DRIVE_CACHE.*`
    /// handlers bucket by it.
    pub async fn list_files_in_folder(&self, folder_id: &str) -> Result<Value, DriveError> {
        let query = format!("'{folder_id}' in parents and trashed = false");
        self.get("/files", &[("q", query.as_str()), ("fields", "files(id,name,status,mimeType,modifiedTime)")])
            .await
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, DriveError> {
        let token = self.ensure_token().await?;
        let response = self
            .http
            .get(format!("{DRIVE_API_BASE}{path}"))
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| DriveError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Api { status: status.as_u16(), body });
        }
        response.json().await.map_err(|e| DriveError::Transport(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Connectable for DriveClient {
    async fn probe(&self) -> Result<(), ProbeFailure> {
        match self.about().await {
            Ok(_) => Ok(()),
            Err(DriveError::OAuth(msg)) => Err(ProbeFailure::OAuthRecoverable(msg)),
            Err(DriveError::Api { status: 401, body }) | Err(DriveError::Api { status: 403, body }) => {
                Err(ProbeFailure::Permission(body))
            }
            Err(err) => Err(ProbeFailure::Transport(err.to_string())),
        }
    }

    async fn close(self) {}
}

pub struct DriveClientFactory {
    http: reqwest::Client,
}

impl DriveClientFactory {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl ConnectionFactory<DriveClient> for DriveClientFactory {
    async fn build(&self, creds: &CredentialsBundle) -> Result<DriveClient, ConnectionError> {
        DriveClient::connect(self.http.clone(), creds.secret_value.expose()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_refresh_doc_parses_expected_shape() {
        let json = r#"{
            "refresh_token": "rt",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "cid",
            "client_secret": "secret"
        }"#;
        let doc: OAuthRefreshDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.refresh_token, "rt");
        assert_eq!(doc.token_uri, "https://oauth2.googleapis.com/token");
    }
}
