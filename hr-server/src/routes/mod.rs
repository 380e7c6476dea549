pub mod callback;
pub mod rpc;
pub mod ws;

use axum::routing::{get, post};
use axum::Router;

use crate::health;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/health/live", get(health::liveness_handler))
        .route("/health/ready", get(health::readiness_handler))
        .route("/rpc", post(rpc::rpc_handler))
        .route("/hr/callback", post(callback::callback_handler))
        .route("/ws/{session_id}", get(ws::ws_handler))
        .layer(hr_telemetry::default_trace_layer())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
