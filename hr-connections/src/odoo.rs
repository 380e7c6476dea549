//! Odoo ERP client over XML-RPC, grounded on
//! `original_source/app/erp_manager.py`'s `ODOO_KLK_VISION`: authenticate
//! against `{url}/xmlrpc/2/common`, then call `execute_kw` against
//! `{url}/xmlrpc/2/object` with `(db, uid, password, model, method, args,
//! kwargs)`.

use hr_identity::CredentialsBundle;
use serde_json::Value;

use crate::cache::{ConnectionError, ConnectionFactory};
use crate::connectable::{Connectable, ProbeFailure};
use crate::xmlrpc::{self, XmlRpcError};

#[derive(Clone)]
pub struct OdooClient {
    http: reqwest::Client,
    url: String,
    db: String,
    username: String,
    password: String,
    uid: i64,
}

impl OdooClient {
    /// Authenticates against `/xmlrpc/2/common` and returns a ready client.
    pub async fn connect(http: reqwest::Client, url: &str, db: &str, username: &str, password: &str) -> Result<Self, ConnectionError> {
        let url = url.trim_end_matches('/').to_string();
        let params = vec![
            Value::String(db.to_string()),
            Value::String(username.to_string()),
            Value::String(password.to_string()),
            Value::Object(Default::default()),
        ];
        let body = xmlrpc::encode_call("authenticate", &params).map_err(|e| ConnectionError::Factory(e.to_string()))?;

        let response = http
            .post(format!("{url}/xmlrpc/2/common"))
            .header("Content-Type", "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| ConnectionError::Factory(format!("authenticate request failed: {e}")))?;
        let text = response
            .text()
            .await
            .map_err(|e| ConnectionError::Factory(format!("authenticate response read failed: {e}")))?;
        let value = xmlrpc::decode_response(&text).map_err(|e| ConnectionError::Factory(e.to_string()))?;

        let uid = value
            .as_i64()
            .ok_or_else(|| ConnectionError::Factory("authenticate did not return a uid".to_string()))?;
        if uid <= 0 {
            return Err(ConnectionError::Factory("odoo rejected credentials (uid <= 0)".to_string()));
        }

        Ok(Self {
            http,
            url,
            db: db.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            uid,
        })
    }

    /// `execute_kw(model, method, args, kwargs)` against `/xmlrpc/2/object`.
    pub async fn execute_kw(&self, model: &str, method: &str, args: Value, kwargs: Value) -> Result<Value, OdooError> {
        let params = vec![
            Value::String(self.db.clone()),
            Value::Number(self.uid.into()),
            Value::String(self.password.clone()),
            Value::String(model.to_string()),
            Value::String(method.to_string()),
            args,
            kwargs,
        ];
        let body = xmlrpc::encode_call("execute_kw", &params).map_err(OdooError::Codec)?;

        let response = self
            .http
            .post(format!("{}/xmlrpc/2/object", self.url))
            .header("Content-Type", "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| OdooError::Transport(e.to_string()))?;
        let text = response.text().await.map_err(|e| OdooError::Transport(e.to_string()))?;
        xmlrpc::decode_response(&text).map_err(OdooError::Codec)
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, Clone)]
pub enum OdooError {
    Transport(String),
    Codec(XmlRpcError),
}

impl std::fmt::Display for OdooError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OdooError::Transport(msg) => write!(f, "odoo transport error: {msg}"),
            OdooError::Codec(err) => write!(f, "odoo xmlrpc error: {err}"),
        }
    }
}

impl std::error::Error for OdooError {}

#[async_trait::async_trait]
impl Connectable for OdooClient {
    /// Lightweight authenticated read: a journal count, the cheapest
    /// `search_count` Odoo offers.
    async fn probe(&self) -> Result<(), ProbeFailure> {
        let result = self
            .execute_kw("account.journal", "search_count", Value::Array(vec![Value::Array(vec![])]), Value::Object(Default::default()))
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(OdooError::Codec(XmlRpcError::Fault { code, message })) if code == 3 || message.to_lowercase().contains("access") => {
                Err(ProbeFailure::Permission(message))
            }
            Err(OdooError::Codec(err)) => Err(ProbeFailure::Transport(err.to_string())),
            Err(OdooError::Transport(msg)) => Err(ProbeFailure::Transport(msg)),
        }
    }

    async fn close(self) {}
}

pub struct OdooClientFactory {
    http: reqwest::Client,
}

impl OdooClientFactory {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl ConnectionFactory<OdooClient> for OdooClientFactory {
    async fn build(&self, creds: &CredentialsBundle) -> Result<OdooClient, ConnectionError> {
        OdooClient::connect(
            self.http.clone(),
            &creds.endpoint,
            creds.database.as_deref().unwrap_or_default(),
            &creds.user_handle,
            creds.secret_value.expose(),
        )
        .await
    }
}
