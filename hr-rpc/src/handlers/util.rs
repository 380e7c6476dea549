//! Small, repetitive params-parsing helpers shared by every handler module.
//! Every failure here is a [`RpcErrorKind::BadRequest`] — malformed RPC
//! parameters are a caller error, never an internal one.

use serde_json::Value;
use uuid::Uuid;

use hr_identity::TenantId;

use crate::error::RpcError;

pub fn require_str(params: &Value, field: &str) -> Result<String, RpcError> {
    params
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RpcError::bad_request(format!("missing or non-string field: {field}")))
}

pub fn optional_str(params: &Value, field: &str) -> Option<String> {
    params.get(field).and_then(Value::as_str).map(str::to_string)
}

pub fn require_uuid(params: &Value, field: &str) -> Result<Uuid, RpcError> {
    let raw = require_str(params, field)?;
    Uuid::parse_str(&raw).map_err(|e| RpcError::bad_request(format!("invalid uuid for {field}: {e}")))
}

pub fn optional_uuid(params: &Value, field: &str) -> Result<Option<Uuid>, RpcError> {
    match params.get(field).and_then(Value::as_str) {
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|e| RpcError::bad_request(format!("invalid uuid for {field}: {e}"))),
        None => Ok(None),
    }
}

pub fn require_i64(params: &Value, field: &str) -> Result<i64, RpcError> {
    params.get(field).and_then(Value::as_i64).ok_or_else(|| RpcError::bad_request(format!("missing or non-integer field: {field}")))
}

pub fn optional_bool(params: &Value, field: &str, default: bool) -> bool {
    params.get(field).and_then(Value::as_bool).unwrap_or(default)
}

pub fn require_tenant_id(params: &Value) -> Result<TenantId, RpcError> {
    require_str(params, "tenant_id").map(TenantId::new)
}

/// The cache key's "tenant" segment for HR families is the PostgreSQL
/// `company_id`, not the Firestore `tenant_id` — confirmed against
/// `hr_cache_manager.py`'s key construction.
pub fn tenant_segment(company_id: Uuid) -> String {
    company_id.to_string()
}
