//! Named cache buckets holding complete responses.
//!
//! Entries are keyed by request path plus query. Two backends:
//! [`MemoryCacheStorage`] for tests and throwaway deployments, and
//! [`DiskCacheStorage`] so buckets survive a restart.

mod disk;
mod memory;

pub use disk::DiskCacheStorage;
pub use memory::MemoryCacheStorage;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::exchange::EdgeResponse;

/// A set of named response caches.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Look up `key` in one bucket.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<EdgeResponse>, CacheError>;

    /// Look up `key` in every bucket, in name order, returning the first hit.
    async fn match_any(&self, key: &str) -> Result<Option<EdgeResponse>, CacheError> {
        for bucket in self.bucket_names().await? {
            if let Some(response) = self.get(&bucket, key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Store `response` under `key`, creating the bucket if needed.
    async fn put(&self, bucket: &str, key: &str, response: &EdgeResponse)
    -> Result<(), CacheError>;

    /// Names of every existing bucket, sorted.
    async fn bucket_names(&self) -> Result<Vec<String>, CacheError>;

    /// Delete a bucket and everything in it. Returns whether it existed.
    async fn delete_bucket(&self, bucket: &str) -> Result<bool, CacheError>;
}
