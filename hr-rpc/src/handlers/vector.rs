//! `VECTOR.*` namespace. Vector store business logic (embedding strategy,
//! collection layout) is out of scope; these handlers validate params and
//! delegate to the injected [`crate::seams::VectorStore`].

use hr_identity::UserId;
use serde_json::{json, Value};

use crate::context::RpcContext;
use crate::error::{RpcError, RpcResult};
use crate::handlers::util::require_str;

fn store(ctx: &RpcContext) -> RpcResult<std::sync::Arc<dyn crate::seams::VectorStore>> {
    ctx.vector.clone().ok_or_else(|| RpcError::not_configured("no vector store configured"))
}

pub async fn get_collection_info(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let store = store(&ctx)?;
    let collection = require_str(&params, "collection")?;
    Ok(store.collection_info(&collection).await?)
}

pub async fn add_documents(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let store = store(&ctx)?;
    let collection = require_str(&params, "collection")?;
    let documents = params
        .get("documents")
        .and_then(Value::as_array)
        .ok_or_else(|| RpcError::bad_request("missing or non-array field: documents"))?
        .clone();

    let added = store.add_documents(&collection, documents).await?;
    Ok(json!({ "added": added }))
}

pub async fn query_documents(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let store = store(&ctx)?;
    let collection = require_str(&params, "collection")?;
    let query = require_str(&params, "query")?;
    let top_k = params.get("top_k").and_then(Value::as_u64).unwrap_or(5) as u32;

    Ok(store.query_documents(&collection, &query, top_k).await?)
}

pub async fn analyze_collection(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let store = store(&ctx)?;
    let collection = require_str(&params, "collection")?;
    Ok(store.analyze_collection(&collection).await?)
}
