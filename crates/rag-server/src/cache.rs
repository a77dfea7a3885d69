/// Redis caching layer for retrieval results.
///
/// Key schema (namespaced to avoid collisions):
/// - `rag:v1:retrieve:{collection}:{sha256(query|k)}`: JSON-serialized `Vec<RetrievedChunk>`
///   (TTL: 3600s, invalidated when the collection is written to or dropped)
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::retrieval::RetrievedChunk;
use rag_common::redis::RedisCache;

const KEY_PREFIX: &str = "rag:v1:";
const RETRIEVE_TTL_SECS: u64 = 3600;

pub struct RetrievalCache {
    redis: RedisCache,
}

impl RetrievalCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub async fn get(&self, collection: &str, query: &str, k: usize) -> Option<Vec<RetrievedChunk>> {
        let key = retrieve_key(collection, query, k);
        let json = self.redis.get(&key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set(&self, collection: &str, query: &str, k: usize, chunks: &[RetrievedChunk]) {
        let key = retrieve_key(collection, query, k);
        if let Ok(json) = serde_json::to_string(chunks) {
            self.redis.set_with_ttl(&key, &json, RETRIEVE_TTL_SECS).await;
        }
    }

    /// Drop every cached retrieval for `collection`.
    pub async fn invalidate_collection(&self, collection: &str) {
        self.redis.delete_by_prefix(&collection_prefix(collection)).await;
    }
}

fn collection_prefix(collection: &str) -> String {
    format!("{KEY_PREFIX}retrieve:{collection}:")
}

fn retrieve_key(collection: &str, query: &str, k: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update(b"|");
    hasher.update(k.to_string().as_bytes());
    format!("{}{:x}", collection_prefix(collection), hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_scoped_to_collection() {
        let key = retrieve_key("biologi", "buatkan 5 soal", 4);
        assert!(key.starts_with("rag:v1:retrieve:biologi:"));
        assert!(key.starts_with(&collection_prefix("biologi")));
        // sha256 hex digest
        assert_eq!(key.len(), "rag:v1:retrieve:biologi:".len() + 64);
    }

    #[test]
    fn key_depends_on_query_and_k() {
        let base = retrieve_key("c", "q", 4);
        assert_eq!(base, retrieve_key("c", "q", 4));
        assert_ne!(base, retrieve_key("c", "q", 5));
        assert_ne!(base, retrieve_key("c", "q2", 4));
        assert_ne!(base, retrieve_key("d", "q", 4));
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let cache = RetrievalCache::new(RedisCache::disabled());
        cache.set("c", "q", 4, &[]).await;
        assert!(cache.get("c", "q", 4).await.is_none());
        cache.invalidate_collection("c").await;
    }
}
