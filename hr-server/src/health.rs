//! `/health`, `/health/live`, `/health/ready` — grounded on `r2e-core::health`'s
//! `HealthIndicator`/`HealthBuilder` aggregation pattern, trimmed to the
//! three checks this service actually has (Postgres, Redis, Jobber) and
//! without a result-caching layer, since none of these probes is expensive
//! enough to need it.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down(String),
}

pub trait HealthIndicator: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self) -> impl std::future::Future<Output = HealthStatus> + Send;
    /// Whether this check gates readiness (default: `true`). Liveness-only
    /// checks return `false` so a slow downstream never fails the liveness
    /// probe a scheduler uses to decide whether to restart the process.
    fn affects_readiness(&self) -> bool {
        true
    }
}

pub struct PostgresHealth {
    pool: PgPool,
}

impl PostgresHealth {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl HealthIndicator for PostgresHealth {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn check(&self) -> HealthStatus {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => HealthStatus::Up,
            Err(e) => HealthStatus::Down(e.to_string()),
        }
    }
}

pub struct RedisHealth {
    cache: Arc<hr_cache::RedisCacheManager>,
}

impl RedisHealth {
    pub fn new(cache: Arc<hr_cache::RedisCacheManager>) -> Self {
        Self { cache }
    }
}

impl HealthIndicator for RedisHealth {
    fn name(&self) -> &str {
        "redis"
    }

    async fn check(&self) -> HealthStatus {
        match self.cache.ping().await {
            Ok(()) => HealthStatus::Up,
            Err(e) => HealthStatus::Down(e.to_string()),
        }
    }
}

pub struct JobberHealth {
    client: Arc<hr_jobber::JobberClient>,
}

impl JobberHealth {
    pub fn new(client: Arc<hr_jobber::JobberClient>) -> Self {
        Self { client }
    }
}

impl HealthIndicator for JobberHealth {
    fn name(&self) -> &str {
        "jobber"
    }

    async fn check(&self) -> HealthStatus {
        let status = self.client.check_health().await;
        if status.ok {
            HealthStatus::Up
        } else {
            HealthStatus::Down(status.error.unwrap_or_else(|| "unreachable".to_string()))
        }
    }

    /// The Jobber is a downstream dependency for async jobs only; its
    /// outage shouldn't flip this service's own readiness to "not ready"
    /// for RPC traffic that never touches it.
    fn affects_readiness(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthCheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthCheckStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthCheckStatus,
    pub checks: Vec<HealthCheck>,
}

async fn aggregate(state: &AppState, readiness_only: bool) -> HealthResponse {
    let mut checks = Vec::new();
    let mut all_up = true;

    let mut push = |indicator: &dyn ErasedIndicator, status: HealthStatus| {
        if readiness_only && !indicator.affects_readiness() {
            return;
        }
        let (check_status, reason) = match status {
            HealthStatus::Up => (HealthCheckStatus::Up, None),
            HealthStatus::Down(reason) => {
                all_up = false;
                (HealthCheckStatus::Down, Some(reason))
            }
        };
        checks.push(HealthCheck { name: indicator.name().to_string(), status: check_status, reason });
    };

    let pg_status = state.health.postgres.check().await;
    push(&state.health.postgres, pg_status);
    let redis_status = state.health.redis.check().await;
    push(&state.health.redis, redis_status);
    let jobber_status = state.health.jobber.check().await;
    push(&state.health.jobber, jobber_status);

    HealthResponse { status: if all_up { HealthCheckStatus::Up } else { HealthCheckStatus::Down }, checks }
}

trait ErasedIndicator {
    fn name(&self) -> &str;
    fn affects_readiness(&self) -> bool;
}

impl<T: HealthIndicator> ErasedIndicator for T {
    fn name(&self) -> &str {
        HealthIndicator::name(self)
    }

    fn affects_readiness(&self) -> bool {
        HealthIndicator::affects_readiness(self)
    }
}

pub struct HealthIndicators {
    pub postgres: PostgresHealth,
    pub redis: RedisHealth,
    pub jobber: JobberHealth,
}

fn status_code(response: &HealthResponse) -> StatusCode {
    if response.status == HealthCheckStatus::Up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = aggregate(&state, false).await;
    (status_code(&response), Json(response))
}

pub async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = aggregate(&state, true).await;
    (status_code(&response), Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_up_maps_to_200() {
        let response = HealthResponse { status: HealthCheckStatus::Up, checks: vec![] };
        assert_eq!(status_code(&response), StatusCode::OK);
    }

    #[test]
    fn any_down_maps_to_503() {
        let response = HealthResponse {
            status: HealthCheckStatus::Down,
            checks: vec![HealthCheck {
                name: "redis".to_string(),
                status: HealthCheckStatus::Down,
                reason: Some("connection refused".to_string()),
            }],
        };
        assert_eq!(status_code(&response), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn jobber_indicator_does_not_affect_readiness() {
        let client = Arc::new(hr_jobber::JobberClient::new(hr_jobber::JobberConfig {
            jobber_url: "http://127.0.0.1:1".to_string(),
            api_key: None,
            callback_base_url: "http://localhost".to_string(),
            timeout: std::time::Duration::from_secs(1),
        }));
        let indicator = JobberHealth::new(client);
        assert!(!indicator.affects_readiness());
    }
}
