//! `ConnectionCache<C>` — generic over the connected client type, keyed on
//! `(UserId, TenantId)` per credential kind.
//!
//! Grounded on `r2e-openfga::cache::DecisionCache`'s TTL/eviction shape and
//! `r2e-cache::TtlCache`'s lazy-eviction-on-`get`, adapted to hold live
//! client handles instead of authorization decisions, plus a per-key
//! single-flight guard that neither of those two caches needs since they
//! never construct anything expensive on miss.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hr_identity::{CredentialKind, CredentialsBundle, IdentityError, MandateResolver, TenantId, UserId};
use tokio::sync::{Mutex, OnceCell, RwLock};

use crate::connectable::{Connectable, ProbeFailure};

type ConnKey = (UserId, TenantId);

#[derive(Debug, Clone)]
pub enum ConnectionError {
    Identity(IdentityError),
    Probe(ProbeFailure),
    Factory(String),
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::Identity(err) => write!(f, "identity resolution failed: {err}"),
            ConnectionError::Probe(err) => write!(f, "connectivity probe failed: {err}"),
            ConnectionError::Factory(msg) => write!(f, "client construction failed: {msg}"),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// Builds a concrete `Connectable` from a materialized credentials bundle.
/// Kept separate from `Connectable` itself so the same client type can be
/// constructed by different factories in tests.
#[async_trait::async_trait]
pub trait ConnectionFactory<C: Connectable>: Send + Sync {
    async fn build(&self, creds: &CredentialsBundle) -> Result<C, ConnectionError>;
}

struct ConnectionEntry<C> {
    client: C,
    created_at: Instant,
}

/// Default eviction TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

pub struct ConnectionCache<C: Connectable> {
    kind: CredentialKind,
    identity: Arc<dyn MandateResolver>,
    factory: Arc<dyn ConnectionFactory<C>>,
    ttl: Duration,
    entries: RwLock<HashMap<ConnKey, ConnectionEntry<C>>>,
    inflight: Mutex<HashMap<ConnKey, Arc<OnceCell<Result<C, ConnectionError>>>>>,
}

impl<C: Connectable> ConnectionCache<C> {
    pub fn new(kind: CredentialKind, identity: Arc<dyn MandateResolver>, factory: Arc<dyn ConnectionFactory<C>>) -> Self {
        Self::with_ttl(kind, identity, factory, DEFAULT_TTL)
    }

    pub fn with_ttl(
        kind: CredentialKind,
        identity: Arc<dyn MandateResolver>,
        factory: Arc<dyn ConnectionFactory<C>>,
        ttl: Duration,
    ) -> Self {
        Self {
            kind,
            identity,
            factory,
            ttl,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a live, authenticated client. Concurrent misses on the same
    /// key are coalesced into exactly one constructor call; losers receive
    /// the winner's client. After responding, every
    /// entry older than the TTL is swept, not just the queried key.
    pub async fn get(&self, user_id: &UserId, tenant_id: &TenantId) -> Result<C, ConnectionError> {
        let key = (user_id.clone(), tenant_id.clone());

        let result = if let Some(client) = self.fresh_entry(&key).await {
            Ok(client)
        } else {
            self.get_or_construct(key).await
        };

        self.sweep_expired().await;
        result
    }

    async fn fresh_entry(&self, key: &ConnKey) -> Option<C> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.created_at.elapsed() < self.ttl {
            Some(entry.client.clone())
        } else {
            None
        }
    }

    /// Never holds the lock across I/O: expired entries are drained under
    /// the write lock, then closed one by one after the lock is released.
    async fn sweep_expired(&self) {
        let expired: Vec<_> = {
            let mut entries = self.entries.write().await;
            let expired_keys: Vec<ConnKey> = entries
                .iter()
                .filter(|(_, entry)| entry.created_at.elapsed() >= self.ttl)
                .map(|(key, _)| key.clone())
                .collect();
            expired_keys
                .into_iter()
                .filter_map(|key| entries.remove(&key))
                .collect()
        };
        for entry in expired {
            entry.client.close().await;
        }
    }

    async fn get_or_construct(&self, key: ConnKey) -> Result<C, ConnectionError> {
        let cell = {
            let mut inflight = self.inflight.lock().await;
            inflight.entry(key.clone()).or_insert_with(|| Arc::new(OnceCell::new())).clone()
        };

        let result = cell
            .get_or_init(|| async { self.construct(&key).await })
            .await
            .clone();

        self.inflight.lock().await.remove(&key);

        match result {
            Ok(client) => {
                let replaced = self.entries.write().await.insert(
                    key,
                    ConnectionEntry {
                        client: client.clone(),
                        created_at: Instant::now(),
                    },
                );
                if let Some(old) = replaced {
                    old.client.close().await;
                }
                Ok(client)
            }
            Err(err) => Err(err),
        }
    }

    async fn construct(&self, key: &ConnKey) -> Result<C, ConnectionError> {
        let (user_id, tenant_id) = key;
        let creds = self
            .identity
            .get_credentials(user_id, tenant_id, self.kind)
            .await
            .map_err(ConnectionError::Identity)?;
        let client = self.factory.build(&creds).await?;
        client.probe().await.map_err(ConnectionError::Probe)?;
        Ok(client)
    }

    pub async fn invalidate(&self, user_id: &UserId, tenant_id: &TenantId) {
        let key = (user_id.clone(), tenant_id.clone());
        let removed = self.entries.write().await.remove(&key);
        if let Some(entry) = removed {
            entry.client.close().await;
        }
    }

    pub async fn clear_all(&self) {
        let drained: Vec<_> = self.entries.write().await.drain().collect();
        for (_, entry) in drained {
            entry.client.close().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_identity::{MandatePath, SecretValue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Clone)]
    struct CountingClient {
        id: usize,
        closed: Arc<StdMutex<Vec<usize>>>,
    }

    #[async_trait::async_trait]
    impl Connectable for CountingClient {
        async fn probe(&self) -> Result<(), ProbeFailure> {
            Ok(())
        }
        async fn close(self) {
            self.closed.lock().unwrap().push(self.id);
        }
    }

    struct CountingFactory {
        counter: Arc<AtomicUsize>,
        closed: Arc<StdMutex<Vec<usize>>>,
    }

    #[async_trait::async_trait]
    impl ConnectionFactory<CountingClient> for CountingFactory {
        async fn build(&self, _creds: &CredentialsBundle) -> Result<CountingClient, ConnectionError> {
            let id = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(CountingClient {
                id,
                closed: self.closed.clone(),
            })
        }
    }

    struct StaticIdentity;

    #[async_trait::async_trait]
    impl MandateResolver for StaticIdentity {
        async fn resolve(
            &self,
            _user_id: &UserId,
            _tenant_id: &TenantId,
            _explicit_client_id: Option<&str>,
        ) -> Result<MandateResolution, IdentityError> {
            Ok(MandateResolution {
                mandate_path: MandatePath::new("clients/u/bo_clients/c/mandates/m"),
                client_id: "c".to_string(),
                mandate_id: "m".to_string(),
            })
        }

        async fn get_credentials(
            &self,
            _user_id: &UserId,
            _tenant_id: &TenantId,
            kind: CredentialKind,
        ) -> Result<CredentialsBundle, IdentityError> {
            Ok(CredentialsBundle {
                kind,
                endpoint: "https://example.com".to_string(),
                database: None,
                user_handle: "svc".to_string(),
                secret_ref: "ref".to_string(),
                secret_value: SecretValue::new("s".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn concurrent_miss_constructs_exactly_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(StdMutex::new(Vec::new()));
        let cache = Arc::new(ConnectionCache::new(
            CredentialKind::ErpOdoo,
            Arc::new(StaticIdentity),
            Arc::new(CountingFactory {
                counter: counter.clone(),
                closed: closed.clone(),
            }),
        ));

        let user = UserId::new("u1");
        let tenant = TenantId::new("t1");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let user = user.clone();
            let tenant = tenant.clone();
            handles.push(tokio::spawn(async move { cache.get(&user, &tenant).await.unwrap().id }));
        }

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
    }

    #[tokio::test]
    async fn expired_entry_is_reconstructed_and_old_client_closed_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(StdMutex::new(Vec::new()));
        let cache = ConnectionCache::with_ttl(
            CredentialKind::ErpOdoo,
            Arc::new(StaticIdentity),
            Arc::new(CountingFactory {
                counter: counter.clone(),
                closed: closed.clone(),
            }),
            Duration::from_millis(10),
        );

        let user = UserId::new("u1");
        let tenant = TenantId::new("t1");

        let first = cache.get(&user, &tenant).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = cache.get(&user, &tenant).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(closed.lock().unwrap().as_slice(), &[first.id]);
    }
}
