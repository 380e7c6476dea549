//! Library half of the binary, split out so `tests/` can drive the real
//! `axum::Router` with `tower::ServiceExt::oneshot` instead of only unit
//! testing individual handlers — router-level coverage of the `/rpc` and
//! `/hr/callback` contracts needs the real router, not isolated functions.

pub mod firestore;
pub mod gcp;
pub mod health;
pub mod routes;
pub mod state;

use std::sync::Arc;

use hr_cache::RedisCacheManager;
use hr_config::{HrConfig, PgSource};
use hr_connections::{ConnectionCache, DriveClientFactory, OdooClientFactory};
use hr_data::HrData;
use hr_identity::{CredentialKind, FirestoreMandateResolver, MandateResolver};
use hr_jobber::{CallbackRouter, JobberClient};
use hr_rpc::{Dispatcher, RpcContext};
use hr_secrets::{SecretManagerClient, SecretResolver};
use hr_stream::StreamRegistry;

use crate::health::{HealthIndicators, JobberHealth, PostgresHealth, RedisHealth};
use crate::state::AppState;

pub fn build_secret_resolver(config: &HrConfig) -> Arc<dyn SecretResolver> {
    Arc::new(SecretManagerClient::new(
        config,
        Arc::new(gcp::MetadataServerAmbientSource::new()),
        Arc::new(gcp::UnavailableServiceAccountTokenMinter),
    ))
}

pub async fn resolve_database_url(
    config: &HrConfig,
    secrets: &dyn SecretResolver,
) -> Result<String, hr_secrets::SecretError> {
    match &config.pg {
        PgSource::DirectUrl(url) => Ok(url.clone()),
        PgSource::Secret(name) => secrets.get_secret(name).await,
    }
}

/// Assembles `AppState` from a config and already-connected pool/cache,
/// shared by `main()` and by integration tests that bring their own
/// Postgres/Redis instances.
pub fn build_state(
    config: &HrConfig,
    pool: sqlx::PgPool,
    cache: Arc<RedisCacheManager>,
    secrets: Arc<dyn SecretResolver>,
) -> AppState {
    let data = HrData::new(pool.clone());

    let identity: Arc<dyn MandateResolver> = Arc::new(FirestoreMandateResolver::new(
        Arc::new(firestore::UnconfiguredMetadataStore),
        secrets,
    ));

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("reqwest client build");

    let odoo = Arc::new(ConnectionCache::new(
        CredentialKind::ErpOdoo,
        identity.clone(),
        Arc::new(OdooClientFactory::new(http.clone())),
    ));
    let drive = Arc::new(ConnectionCache::new(
        CredentialKind::DriveOAuth,
        identity.clone(),
        Arc::new(DriveClientFactory::new(http)),
    ));

    let jobber = Arc::new(JobberClient::new(hr_jobber::JobberConfig {
        jobber_url: config.jobber.base_url.clone(),
        api_key: Some(config.jobber.api_key.clone()),
        callback_base_url: config.listeners_url.trim_end_matches('/').to_string(),
        timeout: config.jobber.timeout,
    }));
    let callbacks = Arc::new(CallbackRouter::new());

    let health = Arc::new(HealthIndicators {
        postgres: PostgresHealth::new(pool),
        redis: RedisHealth::new(cache.clone()),
        jobber: JobberHealth::new(jobber.clone()),
    });

    let rpc = RpcContext {
        identity,
        cache,
        data,
        odoo,
        drive,
        jobber,
        callbacks: callbacks.clone(),
        llm: None,
        vector: None,
    };

    AppState {
        rpc,
        dispatcher: Arc::new(Dispatcher::new()),
        streams: StreamRegistry::new(),
        callbacks,
        callback_key: config.callback_key.clone().into(),
        health,
    }
}

pub async fn run() {
    hr_telemetry::init_tracing(hr_telemetry::LogFormat::from_env());

    let config = HrConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    });

    let secrets = build_secret_resolver(&config);
    let database_url = resolve_database_url(&config, secrets.as_ref())
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to resolve database url");
            std::process::exit(1);
        });

    let pool = hr_data::connect_pool(&database_url).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to connect to postgres");
        std::process::exit(1);
    });

    let cache = Arc::new(RedisCacheManager::connect(&config.redis).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to connect to redis");
        std::process::exit(1);
    }));

    let state = build_state(&config, pool, cache, secrets);
    let router = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, addr = %config.bind_addr, "failed to bind");
        std::process::exit(1);
    });
    tracing::info!(addr = %config.bind_addr, "hr-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| tracing::error!(error = %e, "server exited with error"));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
