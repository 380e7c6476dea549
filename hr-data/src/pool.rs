use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use crate::error::{DataError, SqlxErrorExt};

/// Builds the process-wide pool: min 2 / max 10 connections, matching
/// `neon_hr_manager.py`'s `asyncpg.create_pool(min_size=2, max_size=10,
/// command_timeout=60)`. sqlx has no direct per-statement command timeout
/// knob on the pool, so the closest equivalent, `acquire_timeout`, is set to
/// the same 60s instead — documented in DESIGN.md as an approximation.
///
/// TLS is forced to `require` for managed endpoints (anything with
/// `neon.tech` in the host), `prefer` otherwise, matching the original's
/// `ssl='require' if 'neon.tech' in self._database_url else 'prefer'`.
pub async fn connect_pool(database_url: &str) -> Result<PgPool, DataError> {
    let mut options = PgConnectOptions::from_str(database_url).map_err(|e| e.into_data_error())?;
    if database_url.contains("neon.tech") {
        options = options.ssl_mode(PgSslMode::Require);
    } else {
        options = options.ssl_mode(PgSslMode::Prefer);
    }

    PgPoolOptions::new()
        .min_connections(2)
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(60))
        .connect_with(options)
        .await
        .map_err(|e| e.into_data_error())
}

#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub status: String,
    pub schemas: Vec<String>,
    pub pool_size: u32,
}

pub async fn check_connection(pool: &PgPool) -> ConnectionStatus {
    let schemas = sqlx::query_scalar::<_, String>(
        "SELECT schema_name FROM information_schema.schemata WHERE schema_name IN ('core', 'hr')",
    )
    .fetch_all(pool)
    .await;

    match schemas {
        Ok(schemas) => ConnectionStatus {
            status: "connected".to_string(),
            schemas,
            pool_size: pool.size(),
        },
        Err(err) => {
            tracing::error!(error = %err, "neon connection check failed");
            ConnectionStatus {
                status: "error".to_string(),
                schemas: Vec::new(),
                pool_size: 0,
            }
        }
    }
}
