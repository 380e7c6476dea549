//! `LLM.*` namespace. Prompt content and vendor selection are a Non-goal
//!, so these handlers do session bookkeeping and delegate
//! to the injected [`crate::seams::LlmGateway`] — when none is configured
//! they return `NotConfigured` rather than fabricating a response.

use hr_identity::{SessionId, UserId};
use serde_json::Value;

use crate::context::RpcContext;
use crate::error::{RpcError, RpcResult};
use crate::handlers::util::{require_str, require_uuid};

fn gateway(ctx: &RpcContext) -> RpcResult<std::sync::Arc<dyn crate::seams::LlmGateway>> {
    ctx.llm.clone().ok_or_else(|| RpcError::not_configured("no LLM gateway configured"))
}

pub async fn initialize_session(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let gateway = gateway(&ctx)?;
    let company_id = require_uuid(&params, "company_id")?;
    let session_id = SessionId::new(require_str(&params, "session_id")?);

    let result = gateway.initialize_session(&user, &session_id, &company_id.to_string()).await?;
    Ok(result)
}

pub async fn send_message(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let gateway = gateway(&ctx)?;
    let session_id = SessionId::new(require_str(&params, "session_id")?);
    let message = require_str(&params, "message")?;

    let result = gateway.send_message(&session_id, &message).await?;
    Ok(result)
}

pub async fn update_company_context(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let gateway = gateway(&ctx)?;
    let session_id = SessionId::new(require_str(&params, "session_id")?);
    let context = params.get("context").cloned().unwrap_or(Value::Null);

    gateway.update_company_context(&session_id, context).await?;
    Ok(serde_json::json!({ "updated": true }))
}
