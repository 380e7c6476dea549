//! `RedisCacheManager` — grounded on `original_source/app/tools/hr_cache_manager.py`:
//! same cache-first/write-through/selective-invalidation architecture, same
//! cursor-scan-not-`KEYS` bulk invalidation, same batched delete, same
//! empty-result rejection. Generalized from the HR-only `HRCacheManager` to
//! the full `Family` taxonomy (`hr`/`erp`/`drive`/`llm_ref`), and from a
//! lazily-constructed client to one built once at startup against
//! `redis::aio::ConnectionManager` (auto-reconnecting, matching the
//! `connection-manager` feature used in `examples/golemcloud-golem` and
//! `examples/other_examples/manifests/eosin-platform-eosin`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::warn;

use crate::envelope::{is_empty_value, CacheEnvelope};
use crate::key::{build_key, family_pattern, tenant_pattern, Family};

const SCAN_COUNT: usize = 100;
const DELETE_BATCH: usize = 1000;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    pub count: usize,
    pub bytes: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub per_family_count: HashMap<String, usize>,
}

pub struct RedisCacheManager {
    conn: ConnectionManager,
}

impl RedisCacheManager {
    pub async fn connect(redis_cfg: &hr_config::RedisConfig) -> redis::RedisResult<Self> {
        let client = redis::Client::open(redis_cfg.connection_url())?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    /// On hit, if `data` is `null`/`[]`/`{}` the entry is deleted and `None`
    /// is returned instead — a previous write of an empty result must never
    /// be served as a hit.
    pub async fn get(&self, user: &str, tenant: &str, family: Family, subkey: &str) -> Option<CacheEnvelope> {
        let key = build_key(user, tenant, family, subkey);
        let mut conn = self.conn.clone();
        let raw: Option<String> = match conn.get(&key).await {
            Ok(v) => v,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "cache get failed, degrading to miss");
                return None;
            }
        };
        let raw = raw?;
        let envelope: CacheEnvelope = match serde_json::from_str(&raw) {
            Ok(e) => e,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "cache value corrupt, degrading to miss");
                return None;
            }
        };
        if is_empty_value(&envelope.data) {
            warn!(cache_key = %key, "empty cached value detected, deleting and treating as miss");
            let _: Result<(), _> = conn.del(&key).await;
            return None;
        }
        Some(envelope)
    }

    /// Refuses to write an empty result in the first place, matching the
    /// source's `if not data: return False`. `SETEX` sets value and TTL
    /// atomically.
    pub async fn set(
        &self,
        user: &str,
        tenant: &str,
        family: Family,
        subkey: &str,
        data: serde_json::Value,
        ttl_seconds: u64,
    ) -> bool {
        if is_empty_value(&data) {
            return false;
        }
        let key = build_key(user, tenant, family, subkey);
        let source = format!("{family}.{subkey}");
        let envelope = CacheEnvelope::new(data, ttl_seconds, source);
        let payload = match serde_json::to_string(&envelope) {
            Ok(p) => p,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "failed to serialize cache envelope");
                return false;
            }
        };
        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(&key, payload, ttl_seconds).await {
            Ok(_) => true,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "cache set failed");
                false
            }
        }
    }

    pub async fn invalidate(&self, user: &str, tenant: &str, family: Family, subkey: &str) -> bool {
        let key = build_key(user, tenant, family, subkey);
        let mut conn = self.conn.clone();
        match conn.del::<_, i64>(&key).await {
            Ok(_) => true,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "cache invalidate failed");
                false
            }
        }
    }

    /// Cursor-based `SCAN`, never the blocking `KEYS` primitive — batches
    /// deletes at `<=` [`DELETE_BATCH`] keys.
    pub async fn invalidate_family(&self, user: &str, tenant: &str, family: Family) -> usize {
        let pattern = family_pattern(user, tenant, family);
        let keys = match self.scan_keys(&pattern).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(pattern = %pattern, error = %err, "cache family scan failed");
                return 0;
            }
        };
        self.delete_batched(&keys).await
    }

    async fn scan_keys(&self, pattern: &str) -> redis::RedisResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }
        Ok(keys)
    }

    async fn delete_batched(&self, keys: &[String]) -> usize {
        if keys.is_empty() {
            return 0;
        }
        let mut conn = self.conn.clone();
        let mut deleted = 0usize;
        for chunk in keys.chunks(DELETE_BATCH) {
            match conn.del::<_, i64>(chunk).await {
                Ok(n) => deleted += n as usize,
                Err(err) => warn!(error = %err, "batched cache delete failed"),
            }
        }
        deleted
    }

    /// Liveness probe for the `/health` endpoint — a bare `PING`, nothing
    /// namespaced or data-bearing.
    pub async fn ping(&self) -> redis::RedisResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await
    }

    pub async fn stats(&self, user: &str, tenant: &str) -> CacheStats {
        let pattern = tenant_pattern(user, tenant);
        let keys = match self.scan_keys(&pattern).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(pattern = %pattern, error = %err, "cache stats scan failed");
                return CacheStats::default();
            }
        };

        let mut stats = CacheStats {
            count: keys.len(),
            ..Default::default()
        };
        let mut conn = self.conn.clone();
        for key in &keys {
            let raw: Option<String> = conn.get(key).await.unwrap_or(None);
            let Some(raw) = raw else { continue };
            stats.bytes += raw.len();

            let family = key.split(':').nth(3).unwrap_or("unknown").to_string();
            *stats.per_family_count.entry(family).or_insert(0) += 1;

            if let Ok(envelope) = serde_json::from_str::<CacheEnvelope>(&raw) {
                stats.oldest = Some(stats.oldest.map_or(envelope.cached_at, |o| o.min(envelope.cached_at)));
                stats.newest = Some(stats.newest.map_or(envelope.cached_at, |n| n.max(envelope.cached_at)));
            }
        }
        stats
    }
}
