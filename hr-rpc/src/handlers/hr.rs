//! `HR.*` namespace — the largest handler set, backed directly by
//! `hr-data`'s PostgreSQL repositories, `hr-cache`'s Redis cache-aside
//! contract, and `hr-jobber`'s submission/poll/health/reference-data client.
//! Every Postgres-backed read follows the same cache-first/write-through
//! shape; every write invalidates the exact subkeys the same operation
//! invalidated upstream. `get_all_references` follows the same shape when a
//! `company_id` is given; the per-table reference reads at the bottom of
//! this file stay direct, uncached Jobber passthroughs.

use std::future::Future;

use hr_cache::{family_ttl, Family};
use hr_data::entities::{EmployeePatch, NewContract, NewEmployee};
use hr_identity::{SessionId, UserId};
use hr_jobber::{PayrollBatchRequest, PayrollCalculateRequest, PdfGenerateRequest};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::context::RpcContext;
use crate::error::{RpcError, RpcResult};
use crate::handlers::util::{
    optional_bool, optional_str, optional_uuid, require_i64, require_str, require_uuid, tenant_segment,
};

async fn cached_read<F, Fut>(ctx: &RpcContext, user: &UserId, tenant: &str, subkey: &str, fetch: F) -> RpcResult<Value>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = RpcResult<Value>>,
{
    if let Some(envelope) = ctx.cache.get(user.as_str(), tenant, Family::Hr, subkey).await {
        return Ok(json!({ "data": envelope.data, "source": "cache" }));
    }

    let data = fetch().await?;
    let ttl = family_ttl(Family::Hr, subkey);
    ctx.cache.set(user.as_str(), tenant, Family::Hr, subkey, data.clone(), ttl.as_secs()).await;
    Ok(json!({ "data": data, "source": "database" }))
}

async fn invalidate(ctx: &RpcContext, user: &UserId, tenant: &str, subkey: &str) {
    ctx.cache.invalidate(user.as_str(), tenant, Family::Hr, subkey).await;
}

pub async fn get_or_create_company(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let account_firebase_uid = require_str(&params, "account_firebase_uid")?;
    let mandate_path = require_str(&params, "mandate_path")?;
    let name = require_str(&params, "company_name")?;
    let country = require_str(&params, "country")?;
    let country_code = optional_str(&params, "country_code");
    let region = optional_str(&params, "region");
    let region_code = optional_str(&params, "region_code");

    let company_id = ctx
        .data
        .companies
        .get_or_create_company(
            &account_firebase_uid,
            &mandate_path,
            &name,
            &country,
            country_code.as_deref(),
            region.as_deref(),
            region_code.as_deref(),
        )
        .await?;

    Ok(json!({ "company_id": company_id }))
}

pub async fn list_employees(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let tenant = tenant_segment(company_id);

    cached_read(&ctx, &user, &tenant, "employees", || {
        let data = ctx.data.clone();
        async move {
            let employees = data.employees.list(company_id).await?;
            Ok(serde_json::to_value(employees).unwrap_or(Value::Null))
        }
    })
    .await
}

pub async fn get_employee(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_id = require_uuid(&params, "employee_id")?;
    let tenant = tenant_segment(company_id);
    let subkey = format!("employee:{employee_id}");

    cached_read(&ctx, &user, &tenant, &subkey, || {
        let data = ctx.data.clone();
        async move {
            let employee = data
                .employees
                .get(company_id, employee_id)
                .await?
                .ok_or_else(|| RpcError::not_found(format!("employee {employee_id} not found")))?;
            Ok(serde_json::to_value(employee).unwrap_or(Value::Null))
        }
    })
    .await
}

pub async fn create_employee(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let new = NewEmployee {
        identifier: require_str(&params, "identifier")?,
        first_name: require_str(&params, "first_name")?,
        last_name: require_str(&params, "last_name")?,
        birth_date: require_str(&params, "birth_date")?
            .parse()
            .map_err(|e| RpcError::bad_request(format!("invalid birth_date: {e}")))?,
        cluster_code: require_str(&params, "cluster_code")?,
        hire_date: require_str(&params, "hire_date")?
            .parse()
            .map_err(|e| RpcError::bad_request(format!("invalid hire_date: {e}")))?,
    };

    let employee_id = ctx.data.employees.create(company_id, new).await?;
    invalidate(&ctx, &user, &tenant_segment(company_id), "employees").await;
    Ok(json!({ "employee_id": employee_id }))
}

pub async fn update_employee(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_id = require_uuid(&params, "employee_id")?;

    let patch = EmployeePatch {
        identifier: optional_str(&params, "identifier"),
        first_name: optional_str(&params, "first_name"),
        last_name: optional_str(&params, "last_name"),
        birth_date: optional_str(&params, "birth_date")
            .map(|s| s.parse().map_err(|e| RpcError::bad_request(format!("invalid birth_date: {e}"))))
            .transpose()?,
        cluster_code: optional_str(&params, "cluster_code"),
        hire_date: optional_str(&params, "hire_date")
            .map(|s| s.parse().map_err(|e| RpcError::bad_request(format!("invalid hire_date: {e}"))))
            .transpose()?,
        is_active: params.get("is_active").and_then(Value::as_bool),
    };

    let updated = ctx.data.employees.update(company_id, employee_id, patch).await?;
    if updated {
        let tenant = tenant_segment(company_id);
        invalidate(&ctx, &user, &tenant, "employees").await;
        invalidate(&ctx, &user, &tenant, &format!("employee:{employee_id}")).await;
    }
    Ok(json!({ "updated": updated }))
}

pub async fn delete_employee(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_id = require_uuid(&params, "employee_id")?;

    let deleted = ctx.data.employees.delete(company_id, employee_id).await?;
    if deleted {
        let tenant = tenant_segment(company_id);
        invalidate(&ctx, &user, &tenant, "employees").await;
        invalidate(&ctx, &user, &tenant, &format!("employee:{employee_id}")).await;
        invalidate(&ctx, &user, &tenant, &format!("contracts:{employee_id}")).await;
        invalidate(&ctx, &user, &tenant, &format!("active_contract:{employee_id}")).await;
    }
    Ok(json!({ "deleted": deleted }))
}

pub async fn list_contracts(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_id = require_uuid(&params, "employee_id")?;
    let tenant = tenant_segment(company_id);
    let subkey = format!("contracts:{employee_id}");

    cached_read(&ctx, &user, &tenant, &subkey, || {
        let data = ctx.data.clone();
        async move {
            let contracts = data.contracts.list(company_id, employee_id).await?;
            Ok(serde_json::to_value(contracts).unwrap_or(Value::Null))
        }
    })
    .await
}

pub async fn get_active_contract(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_id = require_uuid(&params, "employee_id")?;
    let tenant = tenant_segment(company_id);
    let subkey = format!("active_contract:{employee_id}");

    cached_read(&ctx, &user, &tenant, &subkey, || {
        let data = ctx.data.clone();
        async move {
            let contract = data.contracts.get_active(company_id, employee_id).await?;
            Ok(serde_json::to_value(contract).unwrap_or(Value::Null))
        }
    })
    .await
}

pub async fn create_contract(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_id = require_uuid(&params, "employee_id")?;

    let new = NewContract {
        contract_type: require_str(&params, "contract_type")?,
        start_date: require_str(&params, "start_date")?
            .parse()
            .map_err(|e| RpcError::bad_request(format!("invalid start_date: {e}")))?,
        end_date: optional_str(&params, "end_date")
            .map(|s| s.parse().map_err(|e| RpcError::bad_request(format!("invalid end_date: {e}"))))
            .transpose()?,
        base_salary: params
            .get("base_salary")
            .and_then(Value::as_f64)
            .map(rust_decimal::Decimal::try_from)
            .transpose()
            .map_err(|e| RpcError::bad_request(format!("invalid base_salary: {e}")))?
            .ok_or_else(|| RpcError::bad_request("missing or non-numeric field: base_salary"))?,
        currency: optional_str(&params, "currency").unwrap_or_else(|| "CHF".to_string()),
        work_rate: params
            .get("work_rate")
            .and_then(Value::as_f64)
            .map(rust_decimal::Decimal::try_from)
            .transpose()
            .map_err(|e| RpcError::bad_request(format!("invalid work_rate: {e}")))?
            .unwrap_or(rust_decimal::Decimal::ONE),
        weekly_hours: params
            .get("weekly_hours")
            .and_then(Value::as_f64)
            .map(rust_decimal::Decimal::try_from)
            .transpose()
            .map_err(|e| RpcError::bad_request(format!("invalid weekly_hours: {e}")))?
            .unwrap_or_else(|| rust_decimal::Decimal::from(42)),
    };

    let contract_id = ctx.data.contracts.create(company_id, employee_id, new).await?;
    let tenant = tenant_segment(company_id);
    invalidate(&ctx, &user, &tenant, &format!("contracts:{employee_id}")).await;
    invalidate(&ctx, &user, &tenant, &format!("active_contract:{employee_id}")).await;
    Ok(json!({ "contract_id": contract_id }))
}

pub async fn list_clusters(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let country_code = optional_str(&params, "country_code");
    let tenant = tenant_segment(company_id);
    let subkey = match &country_code {
        Some(code) => format!("clusters:{code}"),
        None => "clusters".to_string(),
    };

    cached_read(&ctx, &user, &tenant, &subkey, || {
        let data = ctx.data.clone();
        async move {
            let clusters = data.clusters.list(country_code.as_deref()).await?;
            Ok(serde_json::to_value(clusters).unwrap_or(Value::Null))
        }
    })
    .await
}

pub async fn get_payroll_result(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_id = require_uuid(&params, "employee_id")?;
    let year = require_i64(&params, "year")? as i32;
    let month = require_i64(&params, "month")? as i32;

    let result = ctx.data.payroll.get(company_id, employee_id, year, month).await?;
    Ok(serde_json::to_value(result).unwrap_or(Value::Null))
}

pub async fn list_payroll_results(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_id = optional_uuid(&params, "employee_id")?;
    let year = params.get("year").and_then(Value::as_i64).map(|y| y as i32);

    let results = ctx.data.payroll.list(company_id, employee_id, year).await?;
    Ok(serde_json::to_value(results).unwrap_or(Value::Null))
}

pub async fn submit_payroll_calculate(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_id = require_uuid(&params, "employee_id")?;
    let session_id = optional_str(&params, "session_id").map(SessionId::new);

    let outcome = ctx
        .jobber
        .submit_payroll_calculate(PayrollCalculateRequest {
            user_id: user.clone(),
            company_id,
            employee_id,
            year: require_i64(&params, "year")? as i32,
            month: require_i64(&params, "month")? as u32,
            variables: params.get("variables").cloned().unwrap_or(Value::Null),
            force_recalculate: optional_bool(&params, "force_recalculate", false),
            session_id: session_id.clone(),
            mandate_path: optional_str(&params, "mandate_path"),
        })
        .await;

    if let hr_jobber::SubmissionOutcome::Pending { job_id, .. } = &outcome {
        if let Some(session_id) = session_id {
            ctx.callbacks.track(job_id.clone(), session_id);
        }
    }

    Ok(serde_json::to_value(outcome).unwrap_or(Value::Null))
}

pub async fn submit_payroll_batch(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let company_id = require_uuid(&params, "company_id")?;
    let employee_ids = params
        .get("employee_ids")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).filter_map(|s| Uuid::parse_str(s).ok()).collect::<Vec<_>>());
    let session_id = optional_str(&params, "session_id").map(SessionId::new);

    let outcome = ctx
        .jobber
        .submit_payroll_batch(PayrollBatchRequest {
            user_id: user,
            company_id,
            year: require_i64(&params, "year")? as i32,
            month: require_i64(&params, "month")? as u32,
            employee_ids,
            cluster_code: optional_str(&params, "cluster_code"),
            session_id: session_id.clone(),
            mandate_path: optional_str(&params, "mandate_path"),
        })
        .await;

    if let hr_jobber::SubmissionOutcome::Pending { job_id, .. } = &outcome {
        if let Some(session_id) = session_id {
            ctx.callbacks.track(job_id.clone(), session_id);
        }
    }

    Ok(serde_json::to_value(outcome).unwrap_or(Value::Null))
}

pub async fn submit_pdf_generate(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let payroll_id = require_uuid(&params, "payroll_id")?;
    let session_id = optional_str(&params, "session_id").map(SessionId::new);

    let outcome = ctx
        .jobber
        .submit_pdf_generate(PdfGenerateRequest {
            user_id: user,
            payroll_id,
            session_id: session_id.clone(),
            mandate_path: optional_str(&params, "mandate_path"),
        })
        .await;

    if let hr_jobber::SubmissionOutcome::Pending { job_id, .. } = &outcome {
        if let Some(session_id) = session_id {
            ctx.callbacks.track(job_id.clone(), session_id);
        }
    }

    Ok(serde_json::to_value(outcome).unwrap_or(Value::Null))
}

pub async fn get_job_status(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let job_id = require_str(&params, "job_id")?;
    let status = ctx.jobber.get_job_status(&job_id).await;
    match status {
        hr_jobber::JobStatus::Found(body) => Ok(json!({ "found": true, "job": body })),
        hr_jobber::JobStatus::NotFound => Ok(json!({ "found": false })),
        hr_jobber::JobStatus::Error(err) => Err(RpcError::new(crate::error::RpcErrorKind::Transport, err)),
    }
}

pub async fn check_jobber_health(ctx: RpcContext, _user: UserId, _params: Value) -> RpcResult<Value> {
    let health = ctx.jobber.check_health().await;
    Ok(serde_json::to_value(health).unwrap_or(Value::Null))
}

fn lang(params: &Value) -> String {
    optional_str(params, "lang").unwrap_or_else(|| "fr".to_string())
}

fn country_code(params: &Value, default: &str) -> String {
    optional_str(params, "country_code").unwrap_or_else(|| default.to_string())
}

/// Caches only when both `user` and `company_id` are available to build a
/// key, same as `hr_rpc_handlers.py`'s `get_all_references` — an anonymous
/// or company-less call always goes straight to Jobber.
pub async fn get_all_references(ctx: RpcContext, user: UserId, params: Value) -> RpcResult<Value> {
    let country = country_code(&params, "CH");
    let lang_code = lang(&params);
    let subkey = format!("references:{country}:{lang_code}");

    match optional_uuid(&params, "company_id")? {
        Some(company_id) => {
            let tenant = tenant_segment(company_id);
            cached_read(&ctx, &user, &tenant, &subkey, || {
                let jobber = ctx.jobber.clone();
                async move { Ok(jobber.get_all_references(&country, &lang_code).await) }
            })
            .await
        }
        None => {
            let data = ctx.jobber.get_all_references(&country, &lang_code).await;
            Ok(json!({ "data": data, "source": "database" }))
        }
    }
}

pub async fn get_contract_types(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let types = ctx.jobber.get_contract_types(optional_str(&params, "country_code").as_deref(), &lang(&params)).await;
    Ok(Value::Array(types))
}

pub async fn get_remuneration_types(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let types =
        ctx.jobber.get_remuneration_types(optional_str(&params, "country_code").as_deref(), &lang(&params)).await;
    Ok(Value::Array(types))
}

pub async fn get_family_status(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let statuses =
        ctx.jobber.get_family_status(optional_str(&params, "country_code").as_deref(), &lang(&params)).await;
    Ok(Value::Array(statuses))
}

pub async fn get_tax_status(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let statuses = ctx.jobber.get_tax_status(&country_code(&params, "CH"), &lang(&params)).await;
    Ok(Value::Array(statuses))
}

pub async fn get_permit_types(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let types = ctx.jobber.get_permit_types(&country_code(&params, "CH"), &lang(&params)).await;
    Ok(Value::Array(types))
}

pub async fn get_payroll_status(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let statuses = ctx.jobber.get_payroll_status(&lang(&params)).await;
    Ok(Value::Array(statuses))
}

pub async fn get_payroll_items(ctx: RpcContext, _user: UserId, params: Value) -> RpcResult<Value> {
    let items = ctx
        .jobber
        .get_payroll_items(&country_code(&params, "CH"), optional_str(&params, "cluster_code").as_deref())
        .await;
    Ok(Value::Array(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_segment_is_the_company_uuid_string() {
        let id = Uuid::nil();
        assert_eq!(tenant_segment(id), id.to_string());
    }
}
