//! Cached practice location directory.
//!
//! Locations change only when an administrator runs `sw-cli locations
//! import`, so the active list is cached for five minutes. There is no
//! explicit invalidation; an import shows up once the entry expires.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use stillwaters_core::PracticeLocation;

use crate::db::{LocationRepository, RepositoryError};

const ACTIVE_KEY: &str = "locations:active";

/// Read-through cache over [`LocationRepository::list_active`].
#[derive(Clone)]
pub struct LocationDirectory {
    pool: PgPool,
    cache: Cache<&'static str, Arc<Vec<PracticeLocation>>>,
}

impl LocationDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        Self { pool, cache }
    }

    /// Every active location, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cache is cold and the query fails.
    #[instrument(skip(self))]
    pub async fn active(&self) -> Result<Arc<Vec<PracticeLocation>>, RepositoryError> {
        if let Some(locations) = self.cache.get(ACTIVE_KEY).await {
            debug!("Cache hit for locations");
            return Ok(locations);
        }

        let locations = Arc::new(LocationRepository::new(&self.pool).list_active().await?);

        self.cache.insert(ACTIVE_KEY, Arc::clone(&locations)).await;

        Ok(locations)
    }

    /// An active location by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the location list cannot be loaded.
    pub async fn find(&self, slug: &str) -> Result<Option<PracticeLocation>, RepositoryError> {
        Ok(self.active().await?.iter().find(|l| l.slug == slug).cloned())
    }

    #[cfg(test)]
    pub(crate) async fn prime(&self, locations: Vec<PracticeLocation>) {
        self.cache.insert(ACTIVE_KEY, Arc::new(locations)).await;
    }
}
