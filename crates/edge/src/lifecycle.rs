//! Install and activation.
//!
//! The edge starts in [`Lifecycle::Installing`] and forwards every request
//! untouched until it is [`Lifecycle::Activated`]. Installing fetches the
//! static manifest (all or nothing) and warms the page cache; activating
//! deletes buckets left over from older cache versions.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::error::InstallError;
use crate::exchange::{EdgeRequest, EdgeResponse};
use crate::router::CacheRouter;

/// Written to the static bucket at install. Every entry must succeed.
pub const STATIC_MANIFEST: &[&str] = &[
    "/static/css/main.css",
    "/static/images/icon.svg",
    "/site.webmanifest",
];

/// Pages warmed into the dynamic bucket at install, best effort.
pub const PREFETCH_ROUTES: &[&str] = &["/", "/services", "/fees", "/locations", "/contact", "/about"];

/// Where the edge is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activated,
    /// Install failed; requests are forwarded for the life of the process.
    Redundant,
}

/// What to fetch at install.
#[derive(Debug, Clone)]
pub struct Precache {
    pub manifest: Vec<String>,
    pub routes: Vec<String>,
}

impl Default for Precache {
    fn default() -> Self {
        Self {
            manifest: STATIC_MANIFEST.iter().map(ToString::to_string).collect(),
            routes: PREFETCH_ROUTES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// The cache router plus its lifecycle state.
#[derive(Clone)]
pub struct EdgeWorker {
    router: CacheRouter,
    precache: Arc<Precache>,
    state: Arc<RwLock<Lifecycle>>,
}

impl EdgeWorker {
    #[must_use]
    pub fn new(router: CacheRouter, precache: Precache) -> Self {
        Self {
            router,
            precache: Arc::new(precache),
            state: Arc::new(RwLock::new(Lifecycle::Installing)),
        }
    }

    pub async fn state(&self) -> Lifecycle {
        *self.state.read().await
    }

    #[must_use]
    pub const fn router(&self) -> &CacheRouter {
        &self.router
    }

    /// Install, then activate unless `wait_for_skip` asks to wait for a
    /// `SKIP_WAITING` message.
    pub async fn start(&self, wait_for_skip: bool) {
        if let Err(e) = self.install().await {
            error!(error = %e, "Install failed, forwarding without cache");
            return;
        }
        if wait_for_skip {
            info!("Installed, waiting for SKIP_WAITING");
        } else {
            self.activate().await;
        }
    }

    /// Pre-populate the static bucket and warm the page cache.
    ///
    /// # Errors
    ///
    /// Returns `InstallError` if any manifest entry cannot be fetched or
    /// stored. Nothing from the manifest is stored in that case, and the
    /// edge becomes [`Lifecycle::Redundant`].
    #[instrument(skip(self))]
    pub async fn install(&self) -> Result<(), InstallError> {
        *self.state.write().await = Lifecycle::Installing;

        if let Err(e) = self.precache_manifest().await {
            *self.state.write().await = Lifecycle::Redundant;
            return Err(e);
        }

        let mut warmed = 0_usize;
        for route in &self.precache.routes {
            if self.router.prefetch(route).await {
                warmed += 1;
            }
        }
        info!(
            assets = self.precache.manifest.len(),
            pages = warmed,
            "Install complete"
        );

        *self.state.write().await = Lifecycle::Installed;
        Ok(())
    }

    async fn precache_manifest(&self) -> Result<(), InstallError> {
        let mut fetched: Vec<(&str, EdgeResponse)> =
            Vec::with_capacity(self.precache.manifest.len());

        for path in &self.precache.manifest {
            let response = self
                .router
                .fetch(&EdgeRequest::get(path))
                .await
                .map_err(|source| InstallError::Fetch {
                    path: path.clone(),
                    source,
                })?;
            if !response.status.is_success() {
                return Err(InstallError::Status {
                    path: path.clone(),
                    status: response.status.as_u16(),
                });
            }
            fetched.push((path.as_str(), response));
        }

        let storage = self.router.storage();
        let bucket = &self.router.buckets().static_assets;
        for (path, response) in &fetched {
            if let Err(e) = storage.put(bucket, path, response).await {
                if let Err(cleanup) = storage.delete_bucket(bucket).await {
                    warn!(error = %cleanup, bucket = %bucket, "Could not remove partial install");
                }
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Delete stale buckets and start serving through the router.
    ///
    /// Only an installed edge activates. Returns whether the edge is active
    /// afterwards.
    #[instrument(skip(self))]
    pub async fn activate(&self) -> bool {
        let mut state = self.state.write().await;
        match *state {
            Lifecycle::Activated => return true,
            Lifecycle::Installed => {}
            Lifecycle::Installing | Lifecycle::Redundant => return false,
        }

        let deleted = self.delete_stale_buckets().await;
        *state = Lifecycle::Activated;
        info!(deleted = ?deleted, "Activated");
        true
    }

    async fn delete_stale_buckets(&self) -> Vec<String> {
        let storage = self.router.storage();
        let names = match storage.bucket_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Could not list buckets");
                return Vec::new();
            }
        };

        let mut deleted = Vec::new();
        for name in names {
            if self.router.buckets().is_current(&name) {
                continue;
            }
            match storage.delete_bucket(&name).await {
                Ok(_) => deleted.push(name),
                Err(e) => warn!(error = %e, bucket = %name, "Could not delete bucket"),
            }
        }
        deleted
    }

    /// Fetch and store each route in the dynamic bucket, best effort.
    ///
    /// Routes must be site paths starting with a single `/`. Returns how many
    /// were stored.
    pub async fn preload(&self, routes: &[String]) -> usize {
        let mut stored = 0;
        for route in routes {
            if !route.starts_with('/') || route.starts_with("//") {
                warn!(route = %route, "Ignoring preload route");
                continue;
            }
            if self.router.prefetch(route).await {
                stored += 1;
            }
        }
        stored
    }

    /// Answer a request through the router once active, otherwise forward.
    pub async fn handle(&self, request: EdgeRequest) -> EdgeResponse {
        if self.state().await == Lifecycle::Activated {
            self.router.handle(request).await
        } else {
            self.router.forward(&request).await
        }
    }
}
