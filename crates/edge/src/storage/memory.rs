use std::collections::BTreeMap;

use async_trait::async_trait;
use moka::future::Cache;
use tokio::sync::RwLock;

use super::CacheStorage;
use crate::error::CacheError;
use crate::exchange::EdgeResponse;

const BUCKET_CAPACITY: u64 = 2_000;

/// In-memory buckets, one `moka` cache each. Lost on restart.
#[derive(Default)]
pub struct MemoryCacheStorage {
    buckets: RwLock<BTreeMap<String, Cache<String, EdgeResponse>>>,
}

impl MemoryCacheStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<EdgeResponse>, CacheError> {
        let cache = self.buckets.read().await.get(bucket).cloned();
        match cache {
            Some(cache) => Ok(cache.get(key).await),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        response: &EdgeResponse,
    ) -> Result<(), CacheError> {
        let cache = {
            let mut buckets = self.buckets.write().await;
            buckets
                .entry(bucket.to_string())
                .or_insert_with(|| Cache::builder().max_capacity(BUCKET_CAPACITY).build())
                .clone()
        };
        cache.insert(key.to_string(), response.clone()).await;
        Ok(())
    }

    async fn bucket_names(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError> {
        let removed = self.buckets.write().await.remove(bucket);
        if let Some(cache) = &removed {
            cache.invalidate_all();
        }
        Ok(removed.is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    fn page(body: &'static str) -> EdgeResponse {
        EdgeResponse::new(StatusCode::OK, "text/html", body)
    }

    #[tokio::test]
    async fn put_then_get_in_the_same_bucket() {
        let storage = MemoryCacheStorage::new();
        storage.put("a", "/fees", &page("fees")).await.unwrap();

        let hit = storage.get("a", "/fees").await.unwrap().unwrap();
        assert_eq!(hit.body, "fees");
        assert!(storage.get("b", "/fees").await.unwrap().is_none());
        assert!(storage.get("a", "/about").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn match_any_searches_every_bucket() {
        let storage = MemoryCacheStorage::new();
        storage.put("stillwaters-static-v1", "/static/images/icon.svg", &page("icon")).await.unwrap();

        let hit = storage.match_any("/static/images/icon.svg").await.unwrap();
        assert_eq!(hit.unwrap().body, "icon");
        assert!(storage.match_any("/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_bucket_reports_existence() {
        let storage = MemoryCacheStorage::new();
        storage.put("old", "/", &page("home")).await.unwrap();
        storage.put("new", "/", &page("home")).await.unwrap();

        assert!(storage.delete_bucket("old").await.unwrap());
        assert!(!storage.delete_bucket("old").await.unwrap());
        assert_eq!(storage.bucket_names().await.unwrap(), vec!["new".to_string()]);
    }
}
