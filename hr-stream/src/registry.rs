use dashmap::DashMap;
use hr_identity::SessionId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::chunk::StreamChunk;
use crate::receiver::CoalescingReceiver;

const DEFAULT_CAPACITY: usize = 64;

/// Producer handle for one session's LLM stream. Cloned into the task
/// driving the vendor call; `cancel` is checked cooperatively between
/// chunks so a client disconnect stops the upstream request promptly.
#[derive(Clone)]
pub struct StreamHandle {
    session_id: SessionId,
    tx: mpsc::Sender<StreamChunk>,
    cancel: CancellationToken,
}

#[derive(Debug)]
pub struct StreamClosed;

impl StreamHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Delivers one chunk, preserving producer order. `Err` means the
    /// consumer side (the WebSocket write task) has gone away.
    pub async fn push(&self, chunk: StreamChunk) -> Result<(), StreamClosed> {
        self.tx.send(chunk).await.map_err(|_| StreamClosed)
    }
}

/// Tracks the single active LLM stream per session. A session may only run
/// one LLM stream at a time — starting a new one replaces (and cancels) any
/// prior handle for that session.
#[derive(Clone, Default)]
pub struct StreamRegistry {
    streams: DashMap<SessionId, StreamHandle>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self { streams: DashMap::new() }
    }

    /// Starts a new stream for `session_id`, cancelling and dropping any
    /// stream already registered for it.
    pub fn start(&self, session_id: SessionId) -> (StreamHandle, CoalescingReceiver) {
        if let Some((_, old)) = self.streams.remove(&session_id) {
            old.cancel.cancel();
        }
        let (tx, rx) = mpsc::channel(DEFAULT_CAPACITY);
        let handle = StreamHandle { session_id: session_id.clone(), tx, cancel: CancellationToken::new() };
        self.streams.insert(session_id, handle.clone());
        (handle, CoalescingReceiver::new(rx))
    }

    /// Called on client disconnect — cancels the upstream vendor call and
    /// stops tracking the stream.
    pub fn cancel(&self, session_id: &SessionId) {
        if let Some((_, handle)) = self.streams.remove(session_id) {
            handle.cancel.cancel();
        }
    }

    pub fn finish(&self, session_id: &SessionId) {
        self.streams.remove(session_id);
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starting_a_second_stream_cancels_the_first() {
        let registry = StreamRegistry::new();
        let session_id = SessionId::new("s1");
        let (first, _rx1) = registry.start(session_id.clone());
        assert!(!first.is_cancelled());

        let (_second, _rx2) = registry.start(session_id);
        assert!(first.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_stops_the_registered_stream() {
        let registry = StreamRegistry::new();
        let session_id = SessionId::new("s1");
        let (handle, _rx) = registry.start(session_id.clone());
        registry.cancel(&session_id);
        assert!(handle.is_cancelled());
        assert_eq!(registry.len(), 0);
    }
}
