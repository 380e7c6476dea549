use std::sync::Arc;
use std::time::Duration;

use hr_identity::{SessionId, UserId};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::TransportError;

/// Configuration for one Jobber endpoint. `callback_base_url` is this
/// service's own externally reachable base URL — it is handed back to the
/// Jobber so it knows where to POST the result.
#[derive(Debug, Clone)]
pub struct JobberConfig {
    pub jobber_url: String,
    pub api_key: Option<String>,
    pub callback_base_url: String,
    pub timeout: Duration,
}

/// Outcome of a submission call (payroll calculate, payroll batch, PDF
/// generate). Never an `Err` — transport failures are folded into `Failed`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Pending {
        job_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        estimated_time_seconds: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        estimated_count: Option<u64>,
    },
    Completed {
        job_id: String,
        result: Value,
    },
    Failed {
        job_id: String,
        error: String,
    },
}

/// Outcome of `get_job_status`. A 404 is a normal outcome, not a transport
/// failure — it surfaces as `NotFound`, never as `Error`.
#[derive(Debug, Clone)]
pub enum JobStatus {
    Found(Value),
    NotFound,
    Error(String),
}

/// Terse liveness probe result. `check_health` never throws — any failure
/// (transport, non-200, ...) ends up as `ok: false` with `error` set.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub jobber_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobber_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobber_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct PayrollCalculateRequest {
    pub user_id: UserId,
    pub company_id: Uuid,
    pub employee_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub variables: Value,
    pub force_recalculate: bool,
    pub session_id: Option<SessionId>,
    pub mandate_path: Option<String>,
}

pub struct PayrollBatchRequest {
    pub user_id: UserId,
    pub company_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub employee_ids: Option<Vec<Uuid>>,
    pub cluster_code: Option<String>,
    pub session_id: Option<SessionId>,
    pub mandate_path: Option<String>,
}

pub struct PdfGenerateRequest {
    pub user_id: UserId,
    pub payroll_id: Uuid,
    pub session_id: Option<SessionId>,
    pub mandate_path: Option<String>,
}

/// HTTP client wrapper for the Jobber. Mirrors
/// `ProductClient`'s shape (a `reqwest::Client` plus a base URL) but none of
/// its methods return `Result` — every failure mode already has a place in
/// `SubmissionOutcome`/`JobStatus`/`HealthStatus`.
#[derive(Clone)]
pub struct JobberClient {
    http: reqwest::Client,
    config: Arc<JobberConfig>,
}

impl JobberClient {
    pub fn new(config: JobberConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, config: Arc::new(config) }
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = &self.config.api_key {
            if let Ok(value) = reqwest::header::HeaderValue::from_str(&format!("Bearer {key}")) {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }
        headers
    }

    fn generate_job_id(prefix: &str) -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("{prefix}_{}", &hex[..12])
    }

    fn callback_url(&self) -> String {
        format!("{}/hr/callback", self.config.callback_base_url)
    }

    pub async fn submit_payroll_calculate(&self, req: PayrollCalculateRequest) -> SubmissionOutcome {
        let job_id = Self::generate_job_id("payroll");
        let payload = json!({
            "company_id": req.company_id,
            "employee_id": req.employee_id,
            "year": req.year,
            "month": req.month,
            "variables": req.variables,
            "force_recalculate": req.force_recalculate,
            "callback_url": self.callback_url(),
            "callback_data": {
                "job_id": job_id,
                "job_type": "payroll_calculate",
                "user_id": req.user_id.as_str(),
                "session_id": req.session_id.as_ref().map(SessionId::as_str),
                "mandate_path": req.mandate_path,
                "employee_id": req.employee_id,
                "period_year": req.year,
                "period_month": req.month,
            },
        });

        let url = format!("{}/api/payroll/calculate", self.config.jobber_url);
        match self.post(&url, &payload).await {
            Ok(resp) if resp.status() == StatusCode::ACCEPTED => {
                tracing::info!(%job_id, employee_id = %req.employee_id, year = req.year, month = req.month, "payroll calculate submitted");
                SubmissionOutcome::Pending { job_id, estimated_time_seconds: Some(30), estimated_count: None }
            }
            Ok(resp) if resp.status() == StatusCode::OK => self.decode_completed(resp, job_id).await,
            Ok(resp) => Self::failed_from_response(resp, job_id).await,
            Err(e) => SubmissionOutcome::Failed { job_id, error: e.to_string() },
        }
    }

    pub async fn submit_payroll_batch(&self, req: PayrollBatchRequest) -> SubmissionOutcome {
        let job_id = Self::generate_job_id("batch");
        let payload = json!({
            "company_id": req.company_id,
            "year": req.year,
            "month": req.month,
            "employee_ids": req.employee_ids,
            "cluster_code": req.cluster_code,
            "callback_url": self.callback_url(),
            "callback_data": {
                "job_id": job_id,
                "job_type": "payroll_batch",
                "user_id": req.user_id.as_str(),
                "session_id": req.session_id.as_ref().map(SessionId::as_str),
                "mandate_path": req.mandate_path,
                "company_id": req.company_id,
                "period_year": req.year,
                "period_month": req.month,
            },
        });

        let url = format!("{}/api/payroll/batch", self.config.jobber_url);
        match self.post(&url, &payload).await {
            Ok(resp) if resp.status() == StatusCode::OK || resp.status() == StatusCode::ACCEPTED => {
                match resp.json::<Value>().await {
                    Ok(result) => {
                        let estimated_count = result.get("estimated_count").and_then(Value::as_u64);
                        let estimated_time_seconds =
                            result.get("estimated_duration_seconds").and_then(Value::as_u64).or(Some(300));
                        tracing::info!(%job_id, company_id = %req.company_id, year = req.year, month = req.month, "payroll batch submitted");
                        SubmissionOutcome::Pending { job_id, estimated_time_seconds, estimated_count }
                    }
                    Err(e) => SubmissionOutcome::Failed { job_id, error: TransportError::from(e).to_string() },
                }
            }
            Ok(resp) => Self::failed_from_response(resp, job_id).await,
            Err(e) => SubmissionOutcome::Failed { job_id, error: e.to_string() },
        }
    }

    pub async fn submit_pdf_generate(&self, req: PdfGenerateRequest) -> SubmissionOutcome {
        let job_id = Self::generate_job_id("pdf");
        let direct_url = format!("{}/api/payroll/pdf/{}", self.config.jobber_url, req.payroll_id);

        let existing = self.http.get(&direct_url).headers(self.headers()).send().await;
        if let Ok(resp) = &existing {
            if resp.status() == StatusCode::OK {
                let is_pdf = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(|ct| ct.contains("application/pdf"))
                    .unwrap_or(false);
                if is_pdf {
                    tracing::info!(payroll_id = %req.payroll_id, "pdf already exists");
                    return SubmissionOutcome::Completed { job_id, result: json!({ "pdf_url": direct_url }) };
                }
            }
        }

        let payload = json!({
            "payroll_id": req.payroll_id,
            "callback_url": self.callback_url(),
            "callback_data": {
                "job_id": job_id,
                "job_type": "pdf_generate",
                "user_id": req.user_id.as_str(),
                "session_id": req.session_id.as_ref().map(SessionId::as_str),
                "mandate_path": req.mandate_path,
            },
        });

        let generate_url = format!("{}/api/payroll/pdf/generate", self.config.jobber_url);
        match self.post(&generate_url, &payload).await {
            Ok(resp) if resp.status() == StatusCode::OK || resp.status() == StatusCode::ACCEPTED => {
                tracing::info!(%job_id, payroll_id = %req.payroll_id, "pdf generation submitted");
                SubmissionOutcome::Pending { job_id, estimated_time_seconds: None, estimated_count: None }
            }
            Ok(resp) => Self::failed_from_response(resp, job_id).await,
            Err(e) => SubmissionOutcome::Failed { job_id, error: e.to_string() },
        }
    }

    pub async fn get_job_status(&self, job_id: &str) -> JobStatus {
        let url = format!("{}/api/jobs/{job_id}", self.config.jobber_url);
        let request = self.http.get(&url).headers(self.headers()).timeout(Duration::from_secs(10));
        match request.send().await {
            Ok(resp) if resp.status() == StatusCode::OK => match resp.json::<Value>().await {
                Ok(body) => JobStatus::Found(body),
                Err(e) => JobStatus::Error(TransportError::from(e).to_string()),
            },
            Ok(resp) if resp.status() == StatusCode::NOT_FOUND => JobStatus::NotFound,
            Ok(resp) => JobStatus::Error(format!("HTTP {}", resp.status())),
            Err(e) => JobStatus::Error(TransportError::from(e).to_string()),
        }
    }

    /// All reference tables in one round trip.
    /// Jobber answers with a flat object keyed by table name; transport or
    /// non-200 failures fold into `{"error": ...}` rather than an `Err`, same
    /// as every other Jobber call on this client.
    pub async fn get_all_references(&self, country_code: &str, lang: &str) -> Value {
        let url = format!("{}/references/all", self.config.jobber_url);
        let request = self
            .http
            .get(&url)
            .query(&[("country_code", country_code), ("lang", lang)])
            .headers(self.headers());

        match request.send().await {
            Ok(resp) if resp.status() == StatusCode::OK => match resp.json::<Value>().await {
                Ok(body) => body,
                Err(e) => json!({ "error": TransportError::from(e).to_string() }),
            },
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                tracing::error!(%status, error = %body, "get_all_references failed");
                json!({ "error": format!("HTTP {status}: {body}") })
            }
            Err(e) => json!({ "error": TransportError::from(e).to_string() }),
        }
    }

    pub async fn get_contract_types(&self, country_code: Option<&str>, lang: &str) -> Vec<Value> {
        self.get_reference("contract-types", country_code, lang).await
    }

    pub async fn get_remuneration_types(&self, country_code: Option<&str>, lang: &str) -> Vec<Value> {
        self.get_reference("remuneration-types", country_code, lang).await
    }

    pub async fn get_family_status(&self, country_code: Option<&str>, lang: &str) -> Vec<Value> {
        self.get_reference("family-status", country_code, lang).await
    }

    pub async fn get_tax_status(&self, country_code: &str, lang: &str) -> Vec<Value> {
        self.get_reference("tax-status", Some(country_code), lang).await
    }

    pub async fn get_permit_types(&self, country_code: &str, lang: &str) -> Vec<Value> {
        self.get_reference("permit-types", Some(country_code), lang).await
    }

    pub async fn get_payroll_status(&self, lang: &str) -> Vec<Value> {
        self.get_reference("payroll-status", None, lang).await
    }

    /// Payroll items are looked up by country plus an optional cluster, not
    /// language, so this bypasses `get_reference` rather than bend its shape.
    pub async fn get_payroll_items(&self, country_code: &str, cluster_code: Option<&str>) -> Vec<Value> {
        let url = format!("{}/references/payroll-items", self.config.jobber_url);
        let mut query = vec![("country_code", country_code.to_string())];
        if let Some(cluster_code) = cluster_code {
            query.push(("cluster_code", cluster_code.to_string()));
        }

        let request = self.http.get(&url).query(&query).headers(self.headers());
        match request.send().await {
            Ok(resp) if resp.status() == StatusCode::OK => resp.json::<Vec<Value>>().await.unwrap_or_default(),
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::error!(error = %e, "get_payroll_items failed");
                Vec::new()
            }
        }
    }

    async fn get_reference(&self, endpoint: &str, country_code: Option<&str>, lang: &str) -> Vec<Value> {
        let url = format!("{}/references/{endpoint}", self.config.jobber_url);
        let mut query = vec![("lang", lang.to_string())];
        if let Some(country_code) = country_code {
            query.push(("country_code", country_code.to_string()));
        }

        let request = self.http.get(&url).query(&query).headers(self.headers());
        match request.send().await {
            Ok(resp) if resp.status() == StatusCode::OK => resp.json::<Vec<Value>>().await.unwrap_or_default(),
            Ok(resp) => {
                tracing::warn!(%endpoint, status = %resp.status(), "get_reference failed");
                Vec::new()
            }
            Err(e) => {
                tracing::error!(%endpoint, error = %e, "get_reference error");
                Vec::new()
            }
        }
    }

    pub async fn check_health(&self) -> HealthStatus {
        let url = format!("{}/health", self.config.jobber_url);
        let request = self.http.get(&url).headers(self.headers()).timeout(Duration::from_secs(5));
        match request.send().await {
            Ok(resp) if resp.status() == StatusCode::OK => match resp.json::<Value>().await {
                Ok(body) => HealthStatus {
                    ok: true,
                    jobber_url: self.config.jobber_url.clone(),
                    jobber_status: body.get("status").and_then(Value::as_str).map(str::to_string),
                    jobber_version: body.get("version").and_then(Value::as_str).map(str::to_string),
                    http_status: None,
                    error: None,
                },
                Err(e) => HealthStatus {
                    ok: false,
                    jobber_url: self.config.jobber_url.clone(),
                    jobber_status: None,
                    jobber_version: None,
                    http_status: Some(StatusCode::OK.as_u16()),
                    error: Some(TransportError::from(e).to_string()),
                },
            },
            Ok(resp) => HealthStatus {
                ok: false,
                jobber_url: self.config.jobber_url.clone(),
                jobber_status: None,
                jobber_version: None,
                http_status: Some(resp.status().as_u16()),
                error: None,
            },
            Err(e) => HealthStatus {
                ok: false,
                jobber_url: self.config.jobber_url.clone(),
                jobber_status: None,
                jobber_version: None,
                http_status: None,
                error: Some(TransportError::from(e).to_string()),
            },
        }
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<reqwest::Response, TransportError> {
        self.http
            .post(url)
            .json(payload)
            .headers(self.headers())
            .send()
            .await
            .map_err(TransportError::from)
    }

    async fn decode_completed(&self, resp: reqwest::Response, job_id: String) -> SubmissionOutcome {
        match resp.json::<Value>().await {
            Ok(result) => {
                tracing::info!(%job_id, "synchronous completion");
                SubmissionOutcome::Completed { job_id, result }
            }
            Err(e) => SubmissionOutcome::Failed { job_id, error: TransportError::from(e).to_string() },
        }
    }

    async fn failed_from_response(resp: reqwest::Response, job_id: String) -> SubmissionOutcome {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::error!(%job_id, %status, error = %body, "jobber submission rejected");
        SubmissionOutcome::Failed { job_id, error: format!("HTTP {status}: {body}") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(jobber_url: String) -> JobberConfig {
        JobberConfig {
            jobber_url,
            api_key: Some("test-key".to_string()),
            callback_base_url: "http://listener.local".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn payroll_calculate_202_is_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/payroll/calculate"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let client = JobberClient::new(config(server.uri()));
        let outcome = client
            .submit_payroll_calculate(PayrollCalculateRequest {
                user_id: UserId::new("u1"),
                company_id: Uuid::nil(),
                employee_id: Uuid::nil(),
                year: 2026,
                month: 1,
                variables: json!({}),
                force_recalculate: false,
                session_id: None,
                mandate_path: None,
            })
            .await;

        assert!(matches!(outcome, SubmissionOutcome::Pending { .. }));
    }

    #[tokio::test]
    async fn payroll_calculate_200_is_completed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/payroll/calculate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"gross": 5000})))
            .mount(&server)
            .await;

        let client = JobberClient::new(config(server.uri()));
        let outcome = client
            .submit_payroll_calculate(PayrollCalculateRequest {
                user_id: UserId::new("u1"),
                company_id: Uuid::nil(),
                employee_id: Uuid::nil(),
                year: 2026,
                month: 1,
                variables: json!({}),
                force_recalculate: false,
                session_id: None,
                mandate_path: None,
            })
            .await;

        match outcome {
            SubmissionOutcome::Completed { result, .. } => assert_eq!(result["gross"], 5000),
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn job_status_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = JobberClient::new(config(server.uri()));
        assert!(matches!(client.get_job_status("missing").await, JobStatus::NotFound));
    }

    #[tokio::test]
    async fn check_health_never_throws_on_transport_error() {
        let client = JobberClient::new(config("http://127.0.0.1:1".to_string()));
        let health = client.check_health().await;
        assert!(!health.ok);
        assert!(health.error.is_some());
    }

    #[tokio::test]
    async fn get_contract_types_decodes_the_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/references/contract-types"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"code": "CDI", "label": "Permanent"}])))
            .mount(&server)
            .await;

        let client = JobberClient::new(config(server.uri()));
        let types = client.get_contract_types(Some("CH"), "fr").await;
        assert_eq!(types[0]["code"], "CDI");
    }

    #[tokio::test]
    async fn get_reference_failure_returns_empty_list_not_an_error() {
        let client = JobberClient::new(config("http://127.0.0.1:1".to_string()));
        assert!(client.get_family_status(None, "fr").await.is_empty());
    }

    #[tokio::test]
    async fn get_all_references_failure_folds_into_error_object() {
        let client = JobberClient::new(config("http://127.0.0.1:1".to_string()));
        let value = client.get_all_references("CH", "fr").await;
        assert!(value.get("error").is_some());
    }

    #[tokio::test]
    async fn get_payroll_items_passes_cluster_code_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/references/payroll-items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"code": "SAL001"}])))
            .mount(&server)
            .await;

        let client = JobberClient::new(config(server.uri()));
        let items = client.get_payroll_items("CH", Some("cluster-a")).await;
        assert_eq!(items[0]["code"], "SAL001");
    }
}
