//! `POST /rpc` — the single entry point for every `NAMESPACE.method` call
//!. Always answers `200 OK`; success and failure are two
//! shapes of the same envelope, not two status codes.

use axum::extract::State;
use axum::Json;
use hr_rpc::{CallerIdentity, RpcRequest, RpcResponse};

use crate::state::AppState;

pub async fn rpc_handler(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    let RpcRequest { method, params, id } = req;
    match state.dispatcher.dispatch(state.rpc.clone(), user_id, &method, params).await {
        Ok(result) => Json(RpcResponse::ok(id, result)),
        Err(err) => {
            tracing::warn!(%method, kind = ?err.kind, message = %err.message, "rpc call failed");
            Json(RpcResponse::err(id, err))
        }
    }
}
