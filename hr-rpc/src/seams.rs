//! Pluggable seams for the `LLM.*`/`VECTOR.*` namespaces. The LLM prompt
//! content and the vector store's collection semantics are both explicit
//! Non-goals of this crate, so neither talks to a real vendor — these
//! traits are the same kind of seam `hr-identity::MetadataStore` and
//! `hr-secrets::AmbientCredentialSource` already use for out-of-scope
//! backends: the RPC surface and session bookkeeping are real, the concrete
//! implementation is injected by whoever wires this crate into a binary.

use async_trait::async_trait;
use hr_identity::{SessionId, UserId};
use serde_json::Value;

#[derive(Debug, Clone)]
pub enum GatewayError {
    NotConfigured(String),
    Transport(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::NotConfigured(msg) => write!(f, "llm/vector gateway not configured: {msg}"),
            GatewayError::Transport(msg) => write!(f, "llm/vector gateway transport error: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for crate::error::RpcError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotConfigured(msg) => crate::error::RpcError::not_configured(msg),
            GatewayError::Transport(msg) => crate::error::RpcError::new(crate::error::RpcErrorKind::Transport, msg),
        }
    }
}

/// `LLM.*` vendor seam. `send_message` always returns the structured form at
/// the RPC boundary, even though the underlying vendor call may itself
/// stream — streaming is surfaced separately over the WebSocket transport.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn initialize_session(&self, user_id: &UserId, session_id: &SessionId, company_id: &str) -> Result<Value, GatewayError>;
    async fn send_message(&self, session_id: &SessionId, message: &str) -> Result<Value, GatewayError>;
    async fn update_company_context(&self, session_id: &SessionId, context: Value) -> Result<(), GatewayError>;
}

/// `VECTOR.*` store seam (ChromaDB in production).
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_info(&self, collection: &str) -> Result<Value, GatewayError>;
    async fn add_documents(&self, collection: &str, documents: Vec<Value>) -> Result<u64, GatewayError>;
    async fn query_documents(&self, collection: &str, query: &str, top_k: u32) -> Result<Value, GatewayError>;
    async fn analyze_collection(&self, collection: &str) -> Result<Value, GatewayError>;
}
