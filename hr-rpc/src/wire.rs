//! Wire envelope for the `POST /rpc` endpoint: one request
//! shape in, one of two response shapes out. `id` is opaque and simply
//! echoed back, matching the JSON-RPC-adjacent convention the frontend
//! already speaks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcSuccess {
    pub id: Option<Value>,
    pub result: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcFailure {
    pub id: Option<Value>,
    pub error: RpcError,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RpcResponse {
    Success(RpcSuccess),
    Failure(RpcFailure),
}

impl RpcResponse {
    pub fn ok(id: Option<Value>, result: Value) -> Self {
        RpcResponse::Success(RpcSuccess { id, result })
    }

    pub fn err(id: Option<Value>, error: RpcError) -> Self {
        RpcResponse::Failure(RpcFailure { id, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_params_default_to_null_when_absent() {
        let req: RpcRequest = serde_json::from_str(r#"{"method":"HR.get_employees"}"#).unwrap();
        assert_eq!(req.params, Value::Null);
        assert!(req.id.is_none());
    }
}
