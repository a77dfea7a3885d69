/// Redis-backed retrieval cache that degrades to a no-op.
///
/// Every operation swallows Redis errors after logging them at warn level. When the
/// server runs without `REDIS_URL`, or Redis goes away mid-flight, callers simply see
/// cache misses and recompute from the vector store.
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::warn;

/// Keys fetched per SCAN round trip when invalidating a prefix.
const SCAN_BATCH: usize = 100;

pub struct RedisCache {
    client: Option<redis::Client>,
}

impl RedisCache {
    /// Build a cache handle. `None` or an unparsable URL yields a disabled cache.
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "invalid redis url, cache disabled"))
                .ok()
        });
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// PING the server.
    pub async fn is_available(&self) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()?
    }

    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }

    /// Remove every key starting with `prefix`. Uses SCAN so large keyspaces don't block
    /// the server.
    pub async fn delete_by_prefix(&self, prefix: &str) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };

        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut removed = 0usize;
        loop {
            let scanned: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await;
            let (next, keys) = match scanned {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, pattern, "redis SCAN failed");
                    return false;
                }
            };

            if !keys.is_empty() {
                if let Err(e) = conn.del::<_, ()>(&keys).await {
                    warn!(error = %e, pattern, "redis DEL failed during prefix invalidation");
                    return false;
                }
                removed += keys.len();
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        tracing::debug!(pattern, removed, "cache prefix invalidated");
        true
    }

    async fn connection(&self) -> Option<MultiplexedConnection> {
        let client = self.client.as_ref()?;
        client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_cache_misses_without_error() {
        let cache = RedisCache::new(None);
        assert!(!cache.is_enabled());
        assert!(!cache.is_available().await);
        assert_eq!(cache.get("rag:v1:anything").await, None);
        assert!(!cache.set_with_ttl("k", "v", 10).await);
        assert!(!cache.delete_by_prefix("rag:v1:").await);
    }

    #[test]
    fn invalid_url_disables_cache() {
        let cache = RedisCache::new(Some("not a url"));
        assert!(!cache.is_enabled());
    }
}
