//! `RpcContext` — the one bag of shared dependencies every handler closes
//! over. Grounded on `example-postgres`'s `AppState` (one struct, built once
//! at startup, cloned cheaply into every request).

use std::sync::Arc;

use hr_cache::RedisCacheManager;
use hr_connections::{ConnectionCache, DriveClient, OdooClient};
use hr_data::HrData;
use hr_identity::MandateResolver;
use hr_jobber::{CallbackRouter, JobberClient};

use crate::seams::{LlmGateway, VectorStore};

#[derive(Clone)]
pub struct RpcContext {
    pub identity: Arc<dyn MandateResolver>,
    pub cache: Arc<RedisCacheManager>,
    pub data: HrData,
    pub odoo: Arc<ConnectionCache<OdooClient>>,
    pub drive: Arc<ConnectionCache<DriveClient>>,
    pub jobber: Arc<JobberClient>,
    pub callbacks: Arc<CallbackRouter>,
    /// `None` when no LLM vendor is wired up — `LLM.*` handlers then return
    /// `NotConfigured` rather than panicking.
    pub llm: Option<Arc<dyn LlmGateway>>,
    pub vector: Option<Arc<dyn VectorStore>>,
}
