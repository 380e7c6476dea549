//! `ERP.*` namespace. Odoo business rules (P&L aggregation, account-chart
//! restructuring, bank-statement reconciliation filtering — see
//! `original_source/app/erp_manager.py`'s pandas-based transformations) are
//! an explicit Non-goal, so beyond `test_connection` these are thin,
//! generic `execute_kw` passthroughs: they build the right Odoo domain and
//! hand the raw rows back, rather than reimplementing the original's
//! DataFrame arithmetic.

use hr_identity::UserId;
use serde_json::{json, Value};

use crate::context::RpcContext;
use crate::error::{RpcError, RpcResult};
use crate::handlers::util::{optional_str, require_tenant_id};

pub async fn test_connection(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let tenant = require_tenant_id(&params)?;
    match ctx.odoo.get(&user, &tenant).await {
        Ok(client) => Ok(json!({ "success": true, "username": client.username() })),
        Err(err) => {
            let rpc_err: RpcError = err.into();
            if matches!(rpc_err.kind, crate::error::RpcErrorKind::OAuthReauthRequired | crate::error::RpcErrorKind::PermissionDenied) {
                return Err(rpc_err);
            }
            Ok(json!({ "success": false, "error": rpc_err.message }))
        }
    }
}

/// `search_read` on `account.account`, optionally filtered by
/// `account_type`. Returns raw rows — the original's grouping into expense
/// vs. revenue trees is the excluded business logic.
pub async fn get_account_chart(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let tenant = require_tenant_id(&params)?;
    let client = ctx.odoo.get(&user, &tenant).await?;

    let mut domain = vec![];
    if let Some(account_type) = optional_str(&params, "account_type") {
        domain.push(json!(["account_type", "=", account_type]));
    }

    let rows = client
        .execute_kw(
            "account.account",
            "search_read",
            json!([domain]),
            json!({ "fields": ["id", "code", "name", "account_type"] }),
        )
        .await
        .map_err(|e| RpcError::new(crate::error::RpcErrorKind::Transport, e.to_string()))?;

    Ok(json!({ "accounts": rows }))
}

/// The set of selectable Odoo `account_type` values, straight from Odoo's
/// own field metadata rather than a hand-maintained list.
pub async fn get_account_types(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let tenant = require_tenant_id(&params)?;
    let client = ctx.odoo.get(&user, &tenant).await?;

    let fields = client
        .execute_kw(
            "account.account",
            "fields_get",
            json!([["account_type"]]),
            json!({ "attributes": ["selection"] }),
        )
        .await
        .map_err(|e| RpcError::new(crate::error::RpcErrorKind::Transport, e.to_string()))?;

    let selection = fields.get("account_type").and_then(|f| f.get("selection")).cloned().unwrap_or(Value::Null);
    Ok(json!({ "account_types": selection }))
}

/// Raw `account.move.line` rows in the requested date range — aggregating
/// them into profit/loss totals is the out-of-scope business rule; callers
/// that need the aggregate compute it client-side from these rows.
pub async fn get_pl_metrics(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let tenant = require_tenant_id(&params)?;
    let client = ctx.odoo.get(&user, &tenant).await?;

    let mut domain = vec![json!(["account_id.account_type", "in", ["income", "expense", "income_other", "expense_direct_cost"]])];
    if let Some(start) = optional_str(&params, "start_date") {
        domain.push(json!(["date", ">=", start]));
    }
    if let Some(end) = optional_str(&params, "end_date") {
        domain.push(json!(["date", "<=", end]));
    }

    let rows = client
        .execute_kw(
            "account.move.line",
            "search_read",
            json!([domain]),
            json!({ "fields": ["id", "account_id", "date", "debit", "credit", "balance"] }),
        )
        .await
        .map_err(|e| RpcError::new(crate::error::RpcErrorKind::Transport, e.to_string()))?;

    Ok(json!({ "lines": rows }))
}

pub async fn update_accounts(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let tenant = require_tenant_id(&params)?;
    let client = ctx.odoo.get(&user, &tenant).await?;

    let updates = params
        .get("accounts")
        .and_then(Value::as_array)
        .ok_or_else(|| RpcError::bad_request("missing or non-array field: accounts"))?;

    let mut updated = 0u64;
    for entry in updates {
        let id = entry.get("id").and_then(Value::as_i64).ok_or_else(|| RpcError::bad_request("account update missing id"))?;
        let mut values = entry.clone();
        if let Some(obj) = values.as_object_mut() {
            obj.remove("id");
        }
        client
            .execute_kw("account.account", "write", json!([[id], values]), json!({}))
            .await
            .map_err(|e| RpcError::new(crate::error::RpcErrorKind::Transport, e.to_string()))?;
        updated += 1;
    }

    Ok(json!({ "updated": updated }))
}

pub async fn update_coa_structure(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let tenant = require_tenant_id(&params)?;
    let client = ctx.odoo.get(&user, &tenant).await?;

    let group_id = params.get("account_id").and_then(Value::as_i64).ok_or_else(|| RpcError::bad_request("missing field: account_id"))?;
    let parent_group_id = params.get("parent_group_id").and_then(Value::as_i64);

    client
        .execute_kw(
            "account.account",
            "write",
            json!([[group_id], { "group_id": parent_group_id }]),
            json!({}),
        )
        .await
        .map_err(|e| RpcError::new(crate::error::RpcErrorKind::Transport, e.to_string()))?;

    Ok(json!({ "updated": true }))
}

pub async fn get_bank_statement_lines_not_reconciled(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let tenant = require_tenant_id(&params)?;
    let client = ctx.odoo.get(&user, &tenant).await?;

    let mut domain = vec![json!(["is_reconciled", "=", false])];
    if let Some(journal_id) = params.get("journal_id").and_then(Value::as_i64) {
        domain.push(json!(["journal_id", "=", journal_id]));
    }

    let rows = client
        .execute_kw(
            "account.bank.statement.line",
            "search_read",
            json!([domain]),
            json!({ "fields": ["id", "date", "payment_ref", "amount", "journal_id", "is_reconciled"] }),
        )
        .await
        .map_err(|e| RpcError::new(crate::error::RpcErrorKind::Transport, e.to_string()))?;

    Ok(json!({ "lines": rows }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_without_tenant_id_fail_fast_as_bad_request() {
        let err = require_tenant_id(&json!({})).unwrap_err();
        assert_eq!(err.kind, crate::error::RpcErrorKind::BadRequest);
    }
}
