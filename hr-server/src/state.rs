//! Process-wide application state, grounded on `example-postgres`'s
//! `state.rs` (one struct, cheaply `Clone`, handed to every handler through
//! axum's `State` extractor) — without a `#[derive(BeanState)]` macro, since
//! this crate has no dependency-injection builder to feed.

use std::sync::Arc;

use hr_jobber::CallbackRouter;
use hr_rpc::{Dispatcher, RpcContext};
use hr_stream::StreamRegistry;

use crate::health::HealthIndicators;

#[derive(Clone)]
pub struct AppState {
    pub rpc: RpcContext,
    pub dispatcher: Arc<Dispatcher>,
    pub streams: StreamRegistry,
    pub callbacks: Arc<CallbackRouter>,
    pub callback_key: Arc<str>,
    pub health: Arc<HealthIndicators>,
}
