//! Edge behaviour against a local origin, with no external services.
//!
//! Each test serves a small stand-in site on an ephemeral port and keeps its
//! cache in a temporary directory, so restarts can be simulated by opening a
//! second router over the same directory.

#![allow(clippy::unwrap_used)]

use axum::{
    Json, Router,
    http::{StatusCode, header},
    response::Html,
    routing::get,
};
use serde_json::{Value, json};

use stillwaters_edge::storage::CacheStorage;
use stillwaters_edge::{Buckets, EdgeRequest, Lifecycle, Precache, app, lifecycle};
use stillwaters_integration_tests::{
    LocalServer, disk_router, disk_worker, unreachable_origin,
};

fn origin() -> Router {
    Router::new()
        .route("/", get(|| async { Html("<h1>Still Waters Counselling</h1>") }))
        .route("/services", get(|| async { Html("<h1>Services</h1>") }))
        .route(
            "/static/css/main.css",
            get(|| async { ([(header::CONTENT_TYPE, "text/css")], "body { margin: 0 }") }),
        )
        .route(
            "/static/images/icon.svg",
            get(|| async { ([(header::CONTENT_TYPE, "image/svg+xml")], "<svg/>") }),
        )
        .route(
            "/site.webmanifest",
            get(|| async { Json(json!({ "name": "Still Waters Counselling" })) }),
        )
        .route(
            "/api/services",
            get(|| async { Json(json!([{ "id": "individual-counselling" }])) }),
        )
        .route(
            "/account",
            get(|| async { ([(header::SET_COOKIE, "id=abc; HttpOnly")], Html("<h1>Yours</h1>")) }),
        )
}

fn precache() -> Precache {
    Precache {
        manifest: lifecycle::STATIC_MANIFEST.iter().map(ToString::to_string).collect(),
        routes: vec!["/".to_string(), "/services".to_string()],
    }
}

fn cache_status(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get("x-edge-cache")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn cached_pages_survive_a_restart_with_the_site_down() {
    let dir = tempfile::tempdir().unwrap();
    let site = LocalServer::spawn(origin()).await.unwrap();

    let worker = disk_worker(&site.url, dir.path(), Buckets::default(), precache())
        .await
        .unwrap();
    worker.start(false).await;
    assert_eq!(worker.state().await, Lifecycle::Activated);

    let edge = LocalServer::spawn(app(worker)).await.unwrap();
    let client = reqwest::Client::new();

    let api = client
        .get(format!("{}/api/services", edge.url))
        .send()
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::OK);
    assert_eq!(cache_status(&api), "miss");

    let css = client
        .get(format!("{}/static/css/main.css", edge.url))
        .send()
        .await
        .unwrap();
    assert_eq!(cache_status(&css), "hit");

    // Restart against a site that is down
    let down = unreachable_origin().await.unwrap();
    let (router, _tracker) = disk_router(&down, dir.path(), Buckets::default())
        .await
        .unwrap();

    let home = router.handle(EdgeRequest::get("/")).await;
    assert_eq!(home.status, StatusCode::OK);
    assert_eq!(home.cache_status(), Some("stale"));
    assert!(String::from_utf8_lossy(&home.body).contains("Still Waters Counselling"));

    let services = router.handle(EdgeRequest::get("/api/services")).await;
    assert_eq!(services.status, StatusCode::OK);
    assert_eq!(services.cache_status(), Some("stale"));
    let body: Value = serde_json::from_slice(&services.body).unwrap();
    assert_eq!(body[0]["id"], "individual-counselling");

    let icon = router.handle(EdgeRequest::get("/static/images/icon.svg")).await;
    assert_eq!(icon.cache_status(), Some("hit"));
    assert_eq!(icon.body.as_ref(), b"<svg/>");
}

#[tokio::test]
async fn uncached_requests_fall_back_while_offline() {
    let dir = tempfile::tempdir().unwrap();
    let down = unreachable_origin().await.unwrap();
    let (router, _tracker) = disk_router(&down, dir.path(), Buckets::default())
        .await
        .unwrap();

    let page = router.handle(EdgeRequest::get("/fees")).await;
    assert_eq!(page.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(page.cache_status(), Some("offline"));
    assert!(String::from_utf8_lossy(&page.body).contains("13 11 14"));

    let api = router
        .handle(EdgeRequest::get("/api/availability?date=2026-03-10"))
        .await;
    assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = serde_json::from_slice(&api.body).unwrap();
    assert_eq!(body["offline"], true);
    assert_eq!(body["error"], "Network unavailable");

    let photo = router
        .handle(EdgeRequest::get("/static/images/counsellor.jpg"))
        .await;
    assert_eq!(photo.status, StatusCode::OK);
    assert_eq!(
        photo.headers.get(header::CONTENT_TYPE).unwrap(),
        "image/svg+xml"
    );

    let font = router.handle(EdgeRequest::get("/static/fonts/inter.woff2")).await;
    assert_eq!(font.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn personalised_responses_are_never_stored() {
    let dir = tempfile::tempdir().unwrap();
    let site = LocalServer::spawn(origin()).await.unwrap();
    let (router, _tracker) = disk_router(&site.url, dir.path(), Buckets::default())
        .await
        .unwrap();

    let account = router.handle(EdgeRequest::get("/account")).await;
    assert_eq!(account.status, StatusCode::OK);
    assert_eq!(account.cache_status(), Some("miss"));

    let mut with_cookie = EdgeRequest::get("/services");
    with_cookie
        .headers
        .insert(header::COOKIE, "id=abc".parse().unwrap());
    router.handle(with_cookie).await;

    let storage = router.storage();
    assert!(storage.match_any("/account").await.unwrap().is_none());
    assert!(storage.match_any("/services").await.unwrap().is_none());
}

#[tokio::test]
async fn failed_install_leaves_the_edge_forwarding() {
    let dir = tempfile::tempdir().unwrap();
    let site = LocalServer::spawn(origin()).await.unwrap();

    let mut broken = precache();
    broken.manifest.push("/static/css/missing.css".to_string());
    let worker = disk_worker(&site.url, dir.path(), Buckets::default(), broken)
        .await
        .unwrap();
    worker.start(false).await;
    assert_eq!(worker.state().await, Lifecycle::Redundant);

    // Nothing from the manifest was kept
    let storage = worker.router().storage();
    assert!(
        storage
            .match_any("/static/css/main.css")
            .await
            .unwrap()
            .is_none()
    );

    let home = worker.handle(EdgeRequest::get("/")).await;
    assert_eq!(home.status, StatusCode::OK);
    assert_eq!(home.cache_status(), Some("bypass"));
}

#[tokio::test]
async fn activating_a_new_version_deletes_old_buckets() {
    let dir = tempfile::tempdir().unwrap();
    let site = LocalServer::spawn(origin()).await.unwrap();

    let v1 = disk_worker(&site.url, dir.path(), Buckets::new("v1"), precache())
        .await
        .unwrap();
    v1.start(false).await;
    let names = v1.router().storage().bucket_names().await.unwrap();
    assert!(names.contains(&"stillwaters-static-v1".to_string()));

    let v2 = disk_worker(&site.url, dir.path(), Buckets::new("v2"), precache())
        .await
        .unwrap();
    v2.install().await.unwrap();

    // Old buckets stay until activation
    let names = v2.router().storage().bucket_names().await.unwrap();
    assert!(names.iter().any(|name| name.ends_with("-v1")));

    assert!(v2.activate().await);
    let names = v2.router().storage().bucket_names().await.unwrap();
    assert!(!names.is_empty());
    assert!(names.iter().all(|name| name.ends_with("-v2")), "{names:?}");
}

#[tokio::test]
async fn message_channel_drives_activation_and_preload() {
    let dir = tempfile::tempdir().unwrap();
    let site = LocalServer::spawn(origin()).await.unwrap();

    let worker = disk_worker(&site.url, dir.path(), Buckets::default(), precache())
        .await
        .unwrap();
    worker.start(true).await;
    assert_eq!(worker.state().await, Lifecycle::Installed);

    let edge = LocalServer::spawn(app(worker)).await.unwrap();
    let client = reqwest::Client::new();

    let status: Value = client
        .get(format!("{}/__edge/status", edge.url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["state"], "installed");

    let skip: Value = client
        .post(format!("{}/__edge/message", edge.url))
        .body(r#"{"type":"SKIP_WAITING"}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(skip["activated"], true);
    assert_eq!(skip["state"], "activated");

    let preload: Value = client
        .post(format!("{}/__edge/message", edge.url))
        .body(r#"{"type":"FACTORY_AI_PRELOAD","routes":["/services","https://elsewhere.example/"]}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(preload["requested"], 2);
    assert_eq!(preload["stored"], 1);

    let unknown = client
        .post(format!("{}/__edge/message", edge.url))
        .body(r#"{"type":"CLAIM"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
}
