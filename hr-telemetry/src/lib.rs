//! Logging init and request-id plumbing.
//!
//! Grounded on `r2e-observability`'s `tracing_setup`/`middleware` shape, but
//! trimmed down to the console/JSON `tracing-subscriber` stack this service
//! actually ships with — no OTLP exporter, since distributed tracing export
//! is outside this crate's scope.

pub mod request_id;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Log output format, selected by the `HR_LOG_FORMAT` environment variable
/// (`json` or `pretty`, default `pretty`).
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("HR_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Initialize the global `tracing` subscriber. Call exactly once at startup.
pub fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    match format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE);
            Registry::default().with(env_filter).with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE);
            Registry::default().with(env_filter).with(fmt_layer).init();
        }
    }
}

/// The default `tower-http` trace layer used by `hr-server`, matching the
/// teacher's `default_trace()` helper.
pub fn default_trace_layer() -> tower_http::trace::TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>> {
    tower_http::trace::TraceLayer::new_for_http()
}
