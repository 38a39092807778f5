//! Integration tests for Still Waters Counselling.
//!
//! # Running Tests
//!
//! ```bash
//! # Edge tests against a local origin and a temporary cache directory
//! cargo test -p stillwaters-integration-tests
//!
//! # Live tests against running servers (migrated database, one active location)
//! SITE_URL=http://127.0.0.1:3000 EDGE_URL=http://127.0.0.1:3080 \
//!     cargo test -p stillwaters-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `edge_offline` - install, activation and offline fallbacks, self-contained
//! - `site_live` - pages, SEO files, JSON API and the booking wizard
//! - `edge_live` - the deployed edge in front of the site

use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use reqwest::Client;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use stillwaters_edge::network::OriginNetwork;
use stillwaters_edge::storage::DiskCacheStorage;
use stillwaters_edge::{Buckets, CacheRouter, EdgeWorker, Precache};

pub type HarnessResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Base URL of the running site.
pub fn site_url() -> String {
    env_url("SITE_URL", "http://127.0.0.1:3000")
}

/// Base URL of the running edge.
pub fn edge_url() -> String {
    env_url("EDGE_URL", "http://127.0.0.1:3080")
}

fn env_url(key: &str, default: &str) -> String {
    std::env::var(key)
        .map_or_else(|_| default.to_string(), |url| url.trim_end_matches('/').to_string())
}

/// A client that carries the session cookie between requests.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn session_client() -> reqwest::Result<Client> {
    Client::builder().cookie_store(true).build()
}

/// An axum app served on an ephemeral local port until dropped.
pub struct LocalServer {
    pub url: String,
    handle: JoinHandle<std::io::Result<()>>,
}

impl LocalServer {
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn spawn(app: Router) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
        });
        Ok(Self {
            url: format!("http://{addr}"),
            handle,
        })
    }
}

impl Drop for LocalServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A URL that refuses connections.
///
/// # Errors
///
/// Returns an error if no local port can be bound.
pub async fn unreachable_origin() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

/// A cache router over a disk cache, as the edge binary builds it.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be opened or the origin
/// URL is invalid.
pub async fn disk_router(
    origin: &str,
    cache_dir: &Path,
    buckets: Buckets,
) -> HarnessResult<(CacheRouter, TaskTracker)> {
    let storage = DiskCacheStorage::open(cache_dir).await?;
    let network = OriginNetwork::new(origin)?;
    let tracker = TaskTracker::new();
    let router = CacheRouter::new(
        Arc::new(storage),
        Arc::new(network),
        buckets,
        tracker.clone(),
    );
    Ok((router, tracker))
}

/// An edge worker over a disk cache, not yet installed.
///
/// # Errors
///
/// See [`disk_router`].
pub async fn disk_worker(
    origin: &str,
    cache_dir: &Path,
    buckets: Buckets,
    precache: Precache,
) -> HarnessResult<EdgeWorker> {
    let (router, _tracker) = disk_router(origin, cache_dir, buckets).await?;
    Ok(EdgeWorker::new(router, precache))
}
