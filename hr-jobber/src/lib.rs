//! Jobber HTTP client and inbound callback routing.
//!
//! Grounded on `original_source/app/tools/hr_jobber_client.py` for the
//! submit/poll/health contracts and the job-id/callback-data correlation
//! shape; on `example-microservice::ProductClient` for the reqwest-wrapper
//! pattern; on `r2e-events::local::LocalEventBus` for the shared-map fan-out
//! shape behind `CallbackRouter`.

mod client;
mod error;
mod router;

pub use client::{
    HealthStatus, JobStatus, JobberClient, JobberConfig, PayrollBatchRequest, PayrollCalculateRequest,
    PdfGenerateRequest, SubmissionOutcome,
};
pub use router::{CallbackEvent, CallbackPayload, CallbackRouter};
