/// Classification surfaced by a failed connectivity probe, so the frontend
/// can decide between silent retry, re-consent, or a user-visible error.
#[derive(Debug, Clone)]
pub enum ProbeFailure {
    OAuthRecoverable(String),
    Permission(String),
    Transport(String),
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeFailure::OAuthRecoverable(msg) => write!(f, "oauth recoverable: {msg}"),
            ProbeFailure::Permission(msg) => write!(f, "permission denied: {msg}"),
            ProbeFailure::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

/// A live, authenticated client held in the connection cache. `probe` is a
/// lightweight authenticated call confirming the credentials work end to
/// end; `close` releases any underlying socket and must never be skipped on
/// eviction.
#[async_trait::async_trait]
pub trait Connectable: Clone + Send + Sync + Sized + 'static {
    async fn probe(&self) -> Result<(), ProbeFailure>;
    async fn close(self);
}
