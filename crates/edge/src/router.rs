//! Per-request caching strategies.
//!
//! GET requests are matched against these rules, first match wins:
//!
//! | Rule | Strategy | Bucket |
//! |------|----------|--------|
//! | path starts with `/api/` | network-first | api |
//! | image or font extension, or under `/assets/` | cache-first | static |
//! | ends in `.js` or `.css` | stale-while-revalidate | dynamic |
//! | anything else | network-first | dynamic |
//!
//! Only successful responses without `Set-Cookie` are stored. Pages fetched
//! for a request carrying a cookie are not stored either, since the session
//! may have shaped them; assets and API reads are stored regardless.
//!
//! Every other method is forwarded untouched. No error leaves this module:
//! a failure becomes a cached response or one of the [`crate::offline`]
//! payloads.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use tokio_util::task::TaskTracker;
use tracing::{debug, instrument, warn};

use crate::buckets::Buckets;
use crate::error::NetworkError;
use crate::exchange::{CacheStatus, EdgeRequest, EdgeResponse};
use crate::network::Network;
use crate::offline;
use crate::storage::CacheStorage;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "avif", "svg", "ico"];
const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "otf", "eot"];

/// What kind of static asset a path names, for picking its fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Font,
    Other,
}

/// The strategy chosen for a GET request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Api,
    CacheFirst(AssetKind),
    StaleWhileRevalidate,
    Navigation,
}

fn extension(path: &str) -> Option<String> {
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Pick the strategy for a request path (without query).
#[must_use]
pub fn classify(path: &str) -> Strategy {
    if path.starts_with("/api/") {
        return Strategy::Api;
    }

    let ext = extension(path);
    let ext = ext.as_deref();
    if let Some(ext) = ext {
        if IMAGE_EXTENSIONS.contains(&ext) {
            return Strategy::CacheFirst(AssetKind::Image);
        }
        if FONT_EXTENSIONS.contains(&ext) {
            return Strategy::CacheFirst(AssetKind::Font);
        }
    }
    if path.starts_with("/assets/") {
        return Strategy::CacheFirst(AssetKind::Other);
    }
    if matches!(ext, Some("js" | "css")) {
        return Strategy::StaleWhileRevalidate;
    }
    Strategy::Navigation
}

fn api_offline() -> EdgeResponse {
    let body = serde_json::json!({
        "error": offline::API_OFFLINE_MESSAGE,
        "offline": true,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    EdgeResponse::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "application/json",
        body.to_string(),
    )
}

fn service_unavailable() -> EdgeResponse {
    EdgeResponse::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "text/plain; charset=utf-8",
        offline::SERVICE_UNAVAILABLE_TEXT,
    )
}

fn offline_page() -> EdgeResponse {
    EdgeResponse::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "text/html; charset=utf-8",
        offline::OFFLINE_HTML,
    )
}

fn placeholder_image() -> EdgeResponse {
    EdgeResponse::new(StatusCode::OK, "image/svg+xml", offline::PLACEHOLDER_SVG)
}

/// Routes requests through the cache and the network.
#[derive(Clone)]
pub struct CacheRouter {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    buckets: Buckets,
    tracker: TaskTracker,
}

impl CacheRouter {
    /// Background refreshes are spawned on `tracker`; close and wait on it
    /// to let them finish.
    #[must_use]
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        buckets: Buckets,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            storage,
            network,
            buckets,
            tracker,
        }
    }

    #[must_use]
    pub const fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Fetch from the origin without touching the cache.
    pub async fn fetch(&self, request: &EdgeRequest) -> Result<EdgeResponse, NetworkError> {
        self.network.fetch(request).await
    }

    /// Forward a request untouched; `502` if the origin is unreachable.
    pub async fn forward(&self, request: &EdgeRequest) -> EdgeResponse {
        match self.network.fetch(request).await {
            Ok(response) => response.with_cache_status(CacheStatus::Bypass),
            Err(e) => {
                warn!(error = %e, path = %request.path(), "Forwarding failed");
                EdgeResponse::new(
                    StatusCode::BAD_GATEWAY,
                    "text/plain; charset=utf-8",
                    offline::SERVICE_UNAVAILABLE_TEXT,
                )
                .with_cache_status(CacheStatus::Offline)
            }
        }
    }

    /// Answer a request.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path()))]
    pub async fn handle(&self, request: EdgeRequest) -> EdgeResponse {
        if request.method != Method::GET {
            return self.forward(&request).await;
        }

        match classify(request.path()) {
            Strategy::Api => {
                self.network_first(&request, Some(self.buckets.api.as_str()), api_offline)
                    .await
            }
            Strategy::CacheFirst(kind) => self.cache_first(&request, kind).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::Navigation => {
                let bucket = (!request.is_personalised()).then_some(self.buckets.dynamic.as_str());
                self.network_first(&request, bucket, offline_page).await
            }
        }
    }

    /// `bucket` is `None` when the response must not be stored.
    async fn network_first(
        &self,
        request: &EdgeRequest,
        bucket: Option<&str>,
        fallback: fn() -> EdgeResponse,
    ) -> EdgeResponse {
        match self.network.fetch(request).await {
            Ok(response) => {
                if let Some(bucket) = bucket {
                    self.store(bucket, request, &response).await;
                }
                response.with_cache_status(CacheStatus::Miss)
            }
            Err(e) => {
                debug!(error = %e, "Network failed, trying cache");
                match self.lookup(request).await {
                    Some(cached) => cached.with_cache_status(CacheStatus::Stale),
                    None => fallback().with_cache_status(CacheStatus::Offline),
                }
            }
        }
    }

    async fn cache_first(&self, request: &EdgeRequest, kind: AssetKind) -> EdgeResponse {
        if let Some(cached) = self.lookup(request).await {
            return cached.with_cache_status(CacheStatus::Hit);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(&self.buckets.static_assets, request, &response)
                    .await;
                response.with_cache_status(CacheStatus::Miss)
            }
            Err(e) => {
                debug!(error = %e, "Static asset unavailable");
                let fallback = match kind {
                    AssetKind::Image => placeholder_image(),
                    AssetKind::Font | AssetKind::Other => service_unavailable(),
                };
                fallback.with_cache_status(CacheStatus::Offline)
            }
        }
    }

    async fn stale_while_revalidate(&self, request: EdgeRequest) -> EdgeResponse {
        if let Some(cached) = self.lookup(&request).await {
            let router = self.clone();
            self.tracker.spawn(async move {
                router.refresh(&request).await;
            });
            return cached.with_cache_status(CacheStatus::Hit);
        }

        match self.network.fetch(&request).await {
            Ok(response) => {
                self.store(&self.buckets.dynamic, &request, &response).await;
                response.with_cache_status(CacheStatus::Miss)
            }
            Err(e) => {
                debug!(error = %e, "Script or stylesheet unavailable");
                service_unavailable().with_cache_status(CacheStatus::Offline)
            }
        }
    }

    /// Re-fetch a request into the dynamic bucket, ignoring failures.
    async fn refresh(&self, request: &EdgeRequest) {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(&self.buckets.dynamic, request, &response).await;
            }
            Err(e) => debug!(error = %e, path = %request.path(), "Background refresh failed"),
        }
    }

    /// Fetch `path` and store it in the dynamic bucket. Returns whether it
    /// was stored.
    pub async fn prefetch(&self, path: &str) -> bool {
        let request = EdgeRequest::get(path);
        match self.network.fetch(&request).await {
            Ok(response) if response.is_storable() => {
                self.store(&self.buckets.dynamic, &request, &response).await
            }
            Ok(response) => {
                debug!(path, status = response.status.as_u16(), "Prefetch not stored");
                false
            }
            Err(e) => {
                debug!(path, error = %e, "Prefetch failed");
                false
            }
        }
    }

    async fn lookup(&self, request: &EdgeRequest) -> Option<EdgeResponse> {
        match self.storage.match_any(request.cache_key()).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, key = request.cache_key(), "Cache read failed");
                None
            }
        }
    }

    async fn store(&self, bucket: &str, request: &EdgeRequest, response: &EdgeResponse) -> bool {
        if !response.is_storable() {
            return false;
        }
        match self
            .storage
            .put(bucket, request.cache_key(), response)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, bucket, key = request.cache_key(), "Cache write failed");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::http::{HeaderValue, header};

    use super::*;
    use crate::storage::{DiskCacheStorage, MemoryCacheStorage};
    use crate::testing::ScriptedNetwork;

    struct Harness {
        router: CacheRouter,
        network: Arc<ScriptedNetwork>,
        storage: Arc<MemoryCacheStorage>,
        tracker: TaskTracker,
    }

    fn harness() -> Harness {
        let network = Arc::new(ScriptedNetwork::new());
        let storage = Arc::new(MemoryCacheStorage::new());
        let tracker = TaskTracker::new();
        let router = CacheRouter::new(
            storage.clone(),
            network.clone(),
            Buckets::new("test"),
            tracker.clone(),
        );
        Harness {
            router,
            network,
            storage,
            tracker,
        }
    }

    fn html(body: &'static str) -> EdgeResponse {
        EdgeResponse::new(StatusCode::OK, "text/html; charset=utf-8", body)
    }

    #[test]
    fn classification_follows_rule_order() {
        assert_eq!(classify("/api/services"), Strategy::Api);
        assert_eq!(classify("/api/logo.png"), Strategy::Api);
        assert_eq!(
            classify("/static/images/icon.SVG"),
            Strategy::CacheFirst(AssetKind::Image)
        );
        assert_eq!(
            classify("/fonts/inter.woff2"),
            Strategy::CacheFirst(AssetKind::Font)
        );
        assert_eq!(
            classify("/assets/app.js"),
            Strategy::CacheFirst(AssetKind::Other)
        );
        assert_eq!(classify("/static/css/main.css"), Strategy::StaleWhileRevalidate);
        assert_eq!(classify("/static/app.js"), Strategy::StaleWhileRevalidate);
        assert_eq!(classify("/services/couples-counselling"), Strategy::Navigation);
        assert_eq!(classify("/"), Strategy::Navigation);
        assert_eq!(classify("/site.webmanifest"), Strategy::Navigation);
    }

    #[tokio::test]
    async fn api_success_is_stored_and_returned() {
        let h = harness();
        h.network.respond(
            "/api/services",
            EdgeResponse::new(StatusCode::OK, "application/json", "[]"),
        );

        let response = h.router.handle(EdgeRequest::get("/api/services")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.cache_status(), Some("miss"));
        assert!(h.storage.get("stillwaters-api-test", "/api/services").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn api_errors_are_returned_but_not_stored() {
        let h = harness();
        h.network.respond(
            "/api/availability?date=nope",
            EdgeResponse::new(StatusCode::BAD_REQUEST, "application/json", "{}"),
        );

        let response = h.router.handle(EdgeRequest::get("/api/availability?date=nope")).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(h.storage.bucket_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn api_failure_falls_back_to_cache_then_offline_json() {
        let h = harness();
        h.network.respond(
            "/api/locations",
            EdgeResponse::new(StatusCode::OK, "application/json", "[1]"),
        );
        h.router.handle(EdgeRequest::get("/api/locations")).await;

        h.network.go_offline();
        let stale = h.router.handle(EdgeRequest::get("/api/locations")).await;
        assert_eq!(stale.cache_status(), Some("stale"));
        assert_eq!(stale.body, "[1]");

        let fallback = h.router.handle(EdgeRequest::get("/api/services")).await;
        assert_eq!(fallback.status, StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = serde_json::from_slice(&fallback.body).unwrap();
        assert_eq!(body["offline"], true);
        assert!(body["error"].is_string());
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn cache_first_hit_skips_the_network() {
        let h = harness();
        h.network.respond(
            "/static/images/icon.svg",
            EdgeResponse::new(StatusCode::OK, "image/svg+xml", "<svg/>"),
        );

        let first = h.router.handle(EdgeRequest::get("/static/images/icon.svg")).await;
        assert_eq!(first.cache_status(), Some("miss"));
        let second = h.router.handle(EdgeRequest::get("/static/images/icon.svg")).await;
        assert_eq!(second.cache_status(), Some("hit"));
        assert_eq!(second.body, "<svg/>");
        assert_eq!(h.network.calls("/static/images/icon.svg"), 1);
    }

    #[tokio::test]
    async fn missing_assets_get_category_fallbacks() {
        let h = harness();
        h.network.go_offline();

        let image = h.router.handle(EdgeRequest::get("/images/office.jpg")).await;
        assert_eq!(image.status, StatusCode::OK);
        assert_eq!(image.headers.get(header::CONTENT_TYPE).unwrap(), "image/svg+xml");
        assert_eq!(image.body, offline::PLACEHOLDER_SVG);

        let font = h.router.handle(EdgeRequest::get("/fonts/inter.woff2")).await;
        assert_eq!(font.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(font.body, offline::SERVICE_UNAVAILABLE_TEXT);
    }

    #[tokio::test]
    async fn stale_while_revalidate_serves_cache_and_refreshes() {
        let h = harness();
        h.storage
            .put(
                "stillwaters-dynamic-test",
                "/static/css/main.css",
                &EdgeResponse::new(StatusCode::OK, "text/css", "old"),
            )
            .await
            .unwrap();
        h.network.respond(
            "/static/css/main.css",
            EdgeResponse::new(StatusCode::OK, "text/css", "new"),
        );

        let response = h.router.handle(EdgeRequest::get("/static/css/main.css")).await;
        assert_eq!(response.cache_status(), Some("hit"));
        assert_eq!(response.body, "old");

        h.tracker.close();
        h.tracker.wait().await;

        let refreshed = h
            .storage
            .get("stillwaters-dynamic-test", "/static/css/main.css")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.body, "new");
    }

    #[tokio::test]
    async fn stale_while_revalidate_miss_waits_for_network() {
        let h = harness();
        h.network.respond(
            "/static/app.js",
            EdgeResponse::new(StatusCode::OK, "text/javascript", "run()"),
        );

        let response = h.router.handle(EdgeRequest::get("/static/app.js")).await;
        assert_eq!(response.cache_status(), Some("miss"));
        assert_eq!(response.body, "run()");

        h.network.go_offline();
        let missing = h.router.handle(EdgeRequest::get("/static/other.js")).await;
        assert_eq!(missing.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn navigation_falls_back_to_offline_page() {
        let h = harness();
        h.network.respond("/fees", html("<h1>Fees</h1>"));
        h.router.handle(EdgeRequest::get("/fees")).await;

        h.network.go_offline();
        let cached = h.router.handle(EdgeRequest::get("/fees")).await;
        assert_eq!(cached.body, "<h1>Fees</h1>");

        let fallback = h.router.handle(EdgeRequest::get("/about")).await;
        assert_eq!(fallback.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(fallback.body, offline::OFFLINE_HTML);
        assert_eq!(fallback.cache_status(), Some("offline"));
    }

    #[tokio::test]
    async fn personalised_pages_are_not_stored() {
        let h = harness();
        h.network.respond("/book", html("<h1>Your booking</h1>"));

        h.router.handle(with_session("/book")).await;

        let mut with_cookie = html("<h1>Book</h1>");
        with_cookie
            .headers
            .insert(header::SET_COOKIE, HeaderValue::from_static("sw_session=xyz"));
        h.network.respond("/contact", with_cookie);
        h.router.handle(EdgeRequest::get("/contact")).await;

        assert!(h.storage.match_any("/book").await.unwrap().is_none());
        assert!(h.storage.match_any("/contact").await.unwrap().is_none());
    }

    fn with_session(path: &str) -> EdgeRequest {
        let mut request = EdgeRequest::get(path);
        request
            .headers
            .insert(header::COOKIE, HeaderValue::from_static("sw_session=abc"));
        request
    }

    #[tokio::test]
    async fn session_cookies_do_not_stop_asset_and_api_caching() {
        let h = harness();
        h.network.respond(
            "/static/images/icon.svg",
            EdgeResponse::new(StatusCode::OK, "image/svg+xml", "<svg/>"),
        );
        h.network.respond(
            "/api/services",
            EdgeResponse::new(StatusCode::OK, "application/json", "[]"),
        );
        h.network.respond(
            "/static/app.js",
            EdgeResponse::new(StatusCode::OK, "text/javascript", "run()"),
        );

        let first = h.router.handle(with_session("/static/images/icon.svg")).await;
        assert_eq!(first.cache_status(), Some("miss"));
        let second = h.router.handle(with_session("/static/images/icon.svg")).await;
        assert_eq!(second.cache_status(), Some("hit"));
        assert_eq!(h.network.calls("/static/images/icon.svg"), 1);

        h.router.handle(with_session("/api/services")).await;
        assert!(h.storage.get("stillwaters-api-test", "/api/services").await.unwrap().is_some());

        h.router.handle(with_session("/static/app.js")).await;
        assert!(h.storage.get("stillwaters-dynamic-test", "/static/app.js").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn session_pages_fall_back_to_the_shared_copy_offline() {
        let h = harness();
        h.network.respond("/fees", html("<h1>Fees</h1>"));
        h.router.handle(EdgeRequest::get("/fees")).await;

        h.network.go_offline();
        let cached = h.router.handle(with_session("/fees")).await;
        assert_eq!(cached.cache_status(), Some("stale"));
        assert_eq!(cached.body, "<h1>Fees</h1>");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn revalidation_on_disk_never_serves_a_mixed_entry() {
        const SIZE: usize = 256 * 1024;
        let stylesheet = |fill: u8, content_type: &'static str| {
            EdgeResponse::new(StatusCode::OK, content_type, vec![fill; SIZE])
        };

        let dir = tempfile::tempdir().unwrap();
        let network = Arc::new(ScriptedNetwork::new());
        let storage = Arc::new(DiskCacheStorage::open(dir.path()).await.unwrap());
        let tracker = TaskTracker::new();
        let router = CacheRouter::new(storage, network.clone(), Buckets::new("test"), tracker.clone());

        network.respond("/static/app.css", stylesheet(b'a', "text/css"));
        router.handle(EdgeRequest::get("/static/app.css")).await;

        for i in 0..30 {
            let (fill, content_type) = if i % 2 == 0 {
                (b'b', "text/plain")
            } else {
                (b'a', "text/css")
            };
            network.respond("/static/app.css", stylesheet(fill, content_type));

            let response = router.handle(EdgeRequest::get("/static/app.css")).await;
            assert_eq!(response.body.len(), SIZE);
            let first = response.body[0];
            assert!(response.body.iter().all(|b| *b == first), "torn body");
            let expected = if first == b'a' { "text/css" } else { "text/plain" };
            assert_eq!(response.headers.get(header::CONTENT_TYPE).unwrap(), expected);
        }

        tracker.close();
        tracker.wait().await;
    }

    #[tokio::test]
    async fn non_get_requests_are_forwarded() {
        let h = harness();
        h.network.respond(
            "/contact",
            EdgeResponse::new(StatusCode::SEE_OTHER, "text/plain", ""),
        );

        let mut post = EdgeRequest::get("/contact");
        post.method = Method::POST;
        let response = h.router.handle(post.clone()).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.cache_status(), Some("bypass"));
        assert!(h.storage.bucket_names().await.unwrap().is_empty());

        h.network.go_offline();
        let failed = h.router.handle(post).await;
        assert_eq!(failed.status, StatusCode::BAD_GATEWAY);
    }
}
