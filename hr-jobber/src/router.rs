use dashmap::DashMap;
use hr_identity::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

/// Body posted by the Jobber to `/hr/callback`. It echoes the
/// `callback_data` a submission handed it, plus the job's current `status`
/// and whatever domain result it produced.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackPayload {
    pub job_id: String,
    pub job_type: String,
    pub user_id: String,
    pub session_id: Option<String>,
    pub mandate_path: Option<String>,
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// What actually gets pushed down a session's streaming transport.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackEvent {
    pub job_id: String,
    pub job_type: String,
    pub status: String,
    pub payload: Value,
}

impl From<CallbackPayload> for CallbackEvent {
    fn from(p: CallbackPayload) -> Self {
        let job_id = p.job_id.clone();
        let job_type = p.job_type.clone();
        let status = p.status.clone();
        let payload = serde_json::to_value(&p).unwrap_or(Value::Null);
        Self { job_id, job_type, status, payload }
    }
}

/// Fans inbound Jobber callbacks out to the originating session's streaming
/// transport. Grounded on `r2e-events::local::LocalEventBus`'s
/// shared-map-plus-lookup shape, adapted from `TypeId`-keyed subscription to
/// session-id-keyed delivery — there is exactly one recipient per callback,
/// not a fan-out-to-all broadcast. `job_sessions` and the `seen` dedup set
/// are bounded by live sessions: `unregister_session` drains both of
/// whatever the disconnecting session owned.
pub struct CallbackRouter {
    job_sessions: DashMap<String, SessionId>,
    sessions: DashMap<SessionId, UnboundedSender<CallbackEvent>>,
    seen: DashMap<(String, String), ()>,
}

impl CallbackRouter {
    pub fn new() -> Self {
        Self { job_sessions: DashMap::new(), sessions: DashMap::new(), seen: DashMap::new() }
    }

    /// Called when a job is submitted, so a later callback for `job_id` can
    /// be traced back to the session that requested it even after
    /// `session_id` drops out of the payload.
    pub fn track(&self, job_id: impl Into<String>, session_id: SessionId) {
        self.job_sessions.insert(job_id.into(), session_id);
    }

    pub fn register_session(&self, session_id: SessionId, sender: UnboundedSender<CallbackEvent>) {
        self.sessions.insert(session_id, sender);
    }

    /// Drops the session's delivery channel plus every trace of the jobs it
    /// submitted, so `job_sessions` and `seen` stay bounded by live sessions
    /// rather than growing for the life of the process.
    pub fn unregister_session(&self, session_id: &SessionId) {
        self.sessions.remove(session_id);

        let mut finished_jobs = std::collections::HashSet::new();
        self.job_sessions.retain(|job_id, owner| {
            if owner == session_id {
                finished_jobs.insert(job_id.clone());
                false
            } else {
                true
            }
        });

        self.seen.retain(|(job_id, _status), _| !finished_jobs.contains(job_id));
    }

    /// Routes one inbound callback. Idempotent: a repeated `(job_id,
    /// status)` pair is dropped silently after the first delivery.
    pub fn route(&self, payload: CallbackPayload) {
        let dedup_key = (payload.job_id.clone(), payload.status.clone());
        if self.seen.insert(dedup_key, ()).is_some() {
            tracing::debug!(job_id = %payload.job_id, status = %payload.status, "duplicate callback dropped");
            return;
        }

        let Some(session_id) = self.job_sessions.get(&payload.job_id).map(|e| e.value().clone()) else {
            tracing::warn!(job_id = %payload.job_id, "callback for unknown job_id dropped");
            return;
        };

        match self.sessions.get(&session_id) {
            Some(sender) => {
                if sender.send(CallbackEvent::from(payload)).is_err() {
                    tracing::warn!(session_id = %session_id, "callback session channel closed, dropped");
                }
            }
            None => {
                tracing::warn!(session_id = %session_id, job_id = %payload.job_id, "callback for expired session dropped");
            }
        }
    }
}

impl Default for CallbackRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(job_id: &str, status: &str) -> CallbackPayload {
        CallbackPayload {
            job_id: job_id.to_string(),
            job_type: "payroll_calculate".to_string(),
            user_id: "u1".to_string(),
            session_id: Some("s1".to_string()),
            mandate_path: None,
            status: status.to_string(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn unknown_job_id_is_dropped() {
        let router = CallbackRouter::new();
        router.route(payload("ghost_job", "completed"));
        // no panic, nothing registered to assert against beyond "it returned"
    }

    #[test]
    fn duplicate_state_delivered_once() {
        let router = CallbackRouter::new();
        let session_id = SessionId::new("s1");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        router.track("job1", session_id.clone());
        router.register_session(session_id, tx);

        router.route(payload("job1", "completed"));
        router.route(payload("job1", "completed"));

        assert_eq!(rx.try_recv().unwrap().job_id, "job1");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn expired_session_drops_with_warning() {
        let router = CallbackRouter::new();
        router.track("job2", SessionId::new("s2"));
        // session never registered (or since expired) -> dropped, not a panic
        router.route(payload("job2", "completed"));
    }

    #[test]
    fn unregister_session_drains_its_jobs_and_seen_entries() {
        let router = CallbackRouter::new();
        let session_id = SessionId::new("s3");
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        router.track("job3", session_id.clone());
        router.register_session(session_id.clone(), tx);
        router.route(payload("job3", "completed"));

        assert_eq!(router.job_sessions.len(), 1);
        assert_eq!(router.seen.len(), 1);

        router.unregister_session(&session_id);

        assert!(router.job_sessions.is_empty());
        assert!(router.seen.is_empty());
        assert!(!router.sessions.contains_key(&session_id));
    }

    #[test]
    fn unregister_session_leaves_other_sessions_jobs_alone() {
        let router = CallbackRouter::new();
        let session_a = SessionId::new("s4");
        let session_b = SessionId::new("s5");
        router.track("job4", session_a.clone());
        router.track("job5", session_b.clone());

        router.unregister_session(&session_a);

        assert!(router.job_sessions.get("job4").is_none());
        assert!(router.job_sessions.get("job5").is_some());
    }
}
