//! `DRIVE_CACHE.*` namespace, grounded on
//! `original_source/app/drive_cache_handlers.py`: cache-first read, fetch on
//! miss, write-through sync to Redis, and the same three-status document
//! bucketing. Unlike the source, OAuth and other Drive failures surface as
//! typed [`RpcError`]s (`OAuthReauthRequired`/`Transport`) instead of an
//! `oauth_error: bool` flag folded into a 200 response — this system already
//! has a dedicated error kind for exactly that case.

use hr_cache::{family_ttl, Family};
use hr_connections::DriveError;
use hr_identity::UserId;
use serde_json::{json, Value};

use crate::context::RpcContext;
use crate::error::{RpcError, RpcResult};
use crate::handlers::util::{require_str, require_tenant_id, require_uuid, tenant_segment};

const SUBKEY: &str = "documents";

fn organize_by_status(files: &[Value]) -> Value {
    let mut to_process = Vec::new();
    let mut in_process = Vec::new();
    let mut processed = Vec::new();

    for file in files {
        match file.get("status").and_then(Value::as_str) {
            Some("in_process") => in_process.push(file.clone()),
            Some("processed") => processed.push(file.clone()),
            _ => to_process.push(file.clone()),
        }
    }

    json!({ "to_process": to_process, "in_process": in_process, "processed": processed })
}

async fn fetch_and_organize(ctx: &RpcContext, user: &UserId, tenant: &hr_identity::TenantId, folder_id: &str) -> RpcResult<Value> {
    let client = ctx.drive.get(user, tenant).await?;
    let raw = client.list_files_in_folder(folder_id).await.map_err(|err| match err {
        DriveError::OAuth(msg) => RpcError::oauth_reauth_required(msg),
        DriveError::Api { status: 401, body } | DriveError::Api { status: 403, body } => {
            RpcError::oauth_reauth_required(body)
        }
        DriveError::Api { status, body } => RpcError::new(crate::error::RpcErrorKind::Transport, format!("HTTP {status}: {body}")),
        DriveError::Transport(msg) => RpcError::new(crate::error::RpcErrorKind::Transport, msg),
    })?;

    let files = raw
        .get("files")
        .and_then(Value::as_array)
        .ok_or_else(|| RpcError::internal("unexpected data format from Drive API"))?;

    Ok(organize_by_status(files))
}

pub async fn get_documents(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let folder_id = require_str(&params, "input_drive_id")?;
    let tenant_cache_key = tenant_segment(company_id);

    if let Some(envelope) = ctx.cache.get(user.as_str(), &tenant_cache_key, Family::Drive, SUBKEY).await {
        return Ok(json!({ "data": envelope.data, "source": "cache" }));
    }

    let tenant = require_tenant_id(&params)?;
    let data = fetch_and_organize(&ctx, &user, &tenant, &folder_id).await?;

    let ttl = family_ttl(Family::Drive, SUBKEY);
    ctx.cache.set(user.as_str(), &tenant_cache_key, Family::Drive, SUBKEY, data.clone(), ttl.as_secs()).await;

    Ok(json!({ "data": data, "source": "drive" }))
}

pub async fn refresh_documents(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let tenant_cache_key = tenant_segment(company_id);
    ctx.cache.invalidate(user.as_str(), &tenant_cache_key, Family::Drive, SUBKEY).await;
    get_documents(ctx, user, params).await
}

pub async fn invalidate_cache(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let tenant_cache_key = tenant_segment(company_id);
    let success = ctx.cache.invalidate(user.as_str(), &tenant_cache_key, Family::Drive, SUBKEY).await;
    Ok(json!({ "success": success }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organize_buckets_default_to_to_process() {
        let files = vec![json!({"id": "a"}), json!({"id": "b", "status": "processed"}), json!({"id": "c", "status": "in_process"})];
        let organized = organize_by_status(&files);
        assert_eq!(organized["to_process"].as_array().unwrap().len(), 1);
        assert_eq!(organized["processed"].as_array().unwrap().len(), 1);
        assert_eq!(organized["in_process"].as_array().unwrap().len(), 1);
    }
}
