//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::SiteConfig;
use crate::content::ContentStore;
use crate::services::LocationDirectory;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the connection pool, configuration,
/// the markdown pages and the cached location directory.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: PgPool,
    content: ContentStore,
    locations: LocationDirectory,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: SiteConfig, pool: PgPool, content: ContentStore) -> Self {
        let locations = LocationDirectory::new(pool.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                content,
                locations,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Markdown content pages.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }

    /// Active practice locations, cached for five minutes.
    #[must_use]
    pub fn locations(&self) -> &LocationDirectory {
        &self.inner.locations
    }
}
