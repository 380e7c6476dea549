//! Per-session LLM token streaming transport.
//!
//! Grounded on `r2e-core::sse::SseBroadcaster`'s broadcast-channel/`Stream`
//! shape, adapted from fan-out-to-all-subscribers to one `mpsc` channel per
//! session — each client's stream is independent, there is no "all
//! listeners get every chunk" requirement here. Cancellation uses
//! `tokio_util::sync::CancellationToken`.
//!
//! The job-progress half of the streaming transport is handled by
//! `hr_jobber::CallbackRouter`'s own per-session channel; `hr-server`
//! selects over both channels per session when writing to the client
//! WebSocket.

mod chunk;
mod receiver;
mod registry;

pub use chunk::{ChunkKind, StreamChunk};
pub use receiver::CoalescingReceiver;
pub use registry::{StreamClosed, StreamHandle, StreamRegistry};
