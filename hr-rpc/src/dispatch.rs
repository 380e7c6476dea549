//! Method registry and the `Authorization` → caller identity extractor.
//!
//! The registry is a plain `HashMap<&'static str, HandlerFn>` built once in
//! [`Dispatcher::new`], deliberately skipping a macro-based dependency
//! injection layer in favor of an explicit map. `HandlerFn`'s boxed-future
//! shape is grounded on `r2e-events::local::LocalEventBus`'s `Handler` type
//! alias.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use hr_identity::UserId;
use serde_json::Value;

use crate::context::RpcContext;
use crate::error::{RpcError, RpcResult};
use crate::handlers;

pub type HandlerFn =
    Arc<dyn Fn(RpcContext, UserId, Value) -> Pin<Box<dyn Future<Output = RpcResult<Value>> + Send>> + Send + Sync>;

/// Caller identity extracted from the `Authorization: Bearer <token>` header.
/// Real deployments verify the token against an auth provider; the Firestore
/// document layout used by other services is out of scope for this crate, so
/// the token value is treated directly as the `UserId` — a deliberate
/// simplification of the seam, not a production auth check.
pub struct CallerIdentity(pub UserId);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or((StatusCode::UNAUTHORIZED, "Authorization header must be a Bearer token".to_string()))?
            .trim();

        if token.is_empty() {
            return Err((StatusCode::UNAUTHORIZED, "empty bearer token".to_string()));
        }

        Ok(CallerIdentity(UserId::new(token)))
    }
}

macro_rules! register {
    ($map:expr, $name:literal, $handler:path) => {
        $map.insert(
            $name,
            Arc::new(|ctx: RpcContext, user: UserId, params: Value| {
                Box::pin($handler(ctx, user, params)) as Pin<Box<dyn Future<Output = RpcResult<Value>> + Send>>
            }) as HandlerFn,
        );
    };
}

pub struct Dispatcher {
    handlers: HashMap<&'static str, HandlerFn>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, HandlerFn> = HashMap::new();

        register!(handlers, "HR.get_or_create_company", self::handlers::hr::get_or_create_company);
        register!(handlers, "HR.list_employees", self::handlers::hr::list_employees);
        register!(handlers, "HR.get_employee", self::handlers::hr::get_employee);
        register!(handlers, "HR.create_employee", self::handlers::hr::create_employee);
        register!(handlers, "HR.update_employee", self::handlers::hr::update_employee);
        register!(handlers, "HR.delete_employee", self::handlers::hr::delete_employee);
        register!(handlers, "HR.list_contracts", self::handlers::hr::list_contracts);
        register!(handlers, "HR.get_active_contract", self::handlers::hr::get_active_contract);
        register!(handlers, "HR.create_contract", self::handlers::hr::create_contract);
        register!(handlers, "HR.list_clusters", self::handlers::hr::list_clusters);
        register!(handlers, "HR.get_payroll_result", self::handlers::hr::get_payroll_result);
        register!(handlers, "HR.list_payroll_results", self::handlers::hr::list_payroll_results);
        register!(handlers, "HR.submit_payroll_calculate", self::handlers::hr::submit_payroll_calculate);
        register!(handlers, "HR.submit_payroll_batch", self::handlers::hr::submit_payroll_batch);
        register!(handlers, "HR.submit_pdf_generate", self::handlers::hr::submit_pdf_generate);
        register!(handlers, "HR.get_job_status", self::handlers::hr::get_job_status);
        register!(handlers, "HR.check_jobber_health", self::handlers::hr::check_jobber_health);
        register!(handlers, "HR.get_all_references", self::handlers::hr::get_all_references);
        register!(handlers, "HR.get_contract_types", self::handlers::hr::get_contract_types);
        register!(handlers, "HR.get_remuneration_types", self::handlers::hr::get_remuneration_types);
        register!(handlers, "HR.get_family_status", self::handlers::hr::get_family_status);
        register!(handlers, "HR.get_tax_status", self::handlers::hr::get_tax_status);
        register!(handlers, "HR.get_permit_types", self::handlers::hr::get_permit_types);
        register!(handlers, "HR.get_payroll_status", self::handlers::hr::get_payroll_status);
        register!(handlers, "HR.get_payroll_items", self::handlers::hr::get_payroll_items);

        register!(handlers, "DRIVE_CACHE.get_documents", self::handlers::drive_cache::get_documents);
        register!(handlers, "DRIVE_CACHE.refresh_documents", self::handlers::drive_cache::refresh_documents);
        register!(handlers, "DRIVE_CACHE.invalidate_cache", self::handlers::drive_cache::invalidate_cache);

        register!(handlers, "ERP.test_connection", self::handlers::erp::test_connection);
        register!(handlers, "ERP.get_account_chart", self::handlers::erp::get_account_chart);
        register!(handlers, "ERP.get_account_types", self::handlers::erp::get_account_types);
        register!(handlers, "ERP.get_pl_metrics", self::handlers::erp::get_pl_metrics);
        register!(handlers, "ERP.update_accounts", self::handlers::erp::update_accounts);
        register!(handlers, "ERP.update_coa_structure", self::handlers::erp::update_coa_structure);
        register!(
            handlers,
            "ERP.get_odoo_bank_statement_move_line_not_rec",
            self::handlers::erp::get_bank_statement_lines_not_reconciled
        );

        register!(handlers, "LLM.initialize_session", self::handlers::llm::initialize_session);
        register!(handlers, "LLM.send_message", self::handlers::llm::send_message);
        register!(handlers, "LLM.update_company_context", self::handlers::llm::update_company_context);

        register!(handlers, "VECTOR.get_collection_info", self::handlers::vector::get_collection_info);
        register!(handlers, "VECTOR.add_documents", self::handlers::vector::add_documents);
        register!(handlers, "VECTOR.query_documents", self::handlers::vector::query_documents);
        register!(handlers, "VECTOR.analyze_collection", self::handlers::vector::analyze_collection);

        Self { handlers }
    }

    pub async fn dispatch(&self, ctx: RpcContext, user_id: UserId, method: &str, params: Value) -> RpcResult<Value> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| RpcError::bad_request(format!("unknown method: {method}")))?
            .clone();
        handler(ctx, user_id, params).await
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_is_bad_request_not_a_panic() {
        let dispatcher = Dispatcher::new();
        assert!(dispatcher.handlers.get("NOPE.nothing").is_none());
    }

    #[test]
    fn registry_contains_every_documented_hr_method() {
        let dispatcher = Dispatcher::new();
        assert!(dispatcher.handlers.contains_key("HR.list_employees"));
        assert!(dispatcher.handlers.contains_key("HR.submit_payroll_calculate"));
        assert!(dispatcher.handlers.contains_key("HR.get_all_references"));
        assert!(dispatcher.handlers.contains_key("HR.get_payroll_items"));
        assert!(dispatcher.handlers.contains_key("DRIVE_CACHE.get_documents"));
        assert!(dispatcher.handlers.contains_key("ERP.test_connection"));
    }
}
