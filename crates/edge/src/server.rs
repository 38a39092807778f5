//! HTTP front of the edge proxy.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `POST /__edge/message` | lifecycle and preload messages |
//! | `GET /__edge/status` | lifecycle state and bucket names |
//! | anything else | [`EdgeWorker::handle`] |

use std::net::SocketAddr;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::exchange::EdgeRequest;
use crate::lifecycle::{EdgeWorker, Lifecycle};

/// Largest request body forwarded to the origin.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const REQUEST_ID_HEADER: &str = "x-request-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// A control message posted by a page.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeMessage {
    /// Activate now if installed and waiting.
    SkipWaiting,
    /// Fetch these routes into the page cache.
    FactoryAiPreload { routes: Vec<String> },
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    state: Lifecycle,
    buckets: Vec<String>,
}

/// Build the edge application.
pub fn app(worker: EdgeWorker) -> Router {
    Router::new()
        .route("/__edge/message", post(message))
        .route("/__edge/status", get(status))
        .fallback(proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(worker)
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

#[instrument(skip(worker, body))]
async fn message(State(worker): State<EdgeWorker>, body: Bytes) -> Response {
    let message: EdgeMessage = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Rejected edge message");
            return bad_request("unknown or malformed message");
        }
    };

    match message {
        EdgeMessage::SkipWaiting => {
            let activated = worker.activate().await;
            info!(activated, "SKIP_WAITING received");
            Json(json!({
                "activated": activated,
                "state": worker.state().await,
            }))
            .into_response()
        }
        EdgeMessage::FactoryAiPreload { routes } => {
            let stored = worker.preload(&routes).await;
            info!(requested = routes.len(), stored, "Preload complete");
            Json(json!({ "requested": routes.len(), "stored": stored })).into_response()
        }
    }
}

async fn status(State(worker): State<EdgeWorker>) -> Json<StatusResponse> {
    let buckets = worker
        .router()
        .storage()
        .bucket_names()
        .await
        .unwrap_or_default();
    Json(StatusResponse {
        state: worker.state().await,
        buckets,
    })
}

async fn proxy(State(worker): State<EdgeWorker>, request: Request) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Request body rejected");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let mut headers = parts.headers;
    if !headers.contains_key(REQUEST_ID_HEADER)
        && let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string())
    {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    if let Some(ip) = peer
        && let Ok(value) = HeaderValue::from_str(&ip.to_string())
    {
        headers.append(HeaderName::from_static(FORWARDED_FOR_HEADER), value);
    }

    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);

    worker
        .handle(EdgeRequest {
            method: parts.method,
            path_and_query,
            headers,
            body,
        })
        .await
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use tokio_util::task::TaskTracker;
    use tower::ServiceExt;

    use super::*;
    use crate::buckets::Buckets;
    use crate::exchange::EdgeResponse;
    use crate::lifecycle::Precache;
    use crate::router::CacheRouter;
    use crate::storage::MemoryCacheStorage;
    use crate::testing::ScriptedNetwork;

    fn worker() -> (EdgeWorker, Arc<ScriptedNetwork>) {
        let network = Arc::new(ScriptedNetwork::new());
        let router = CacheRouter::new(
            Arc::new(MemoryCacheStorage::new()),
            network.clone(),
            Buckets::new("v1"),
            TaskTracker::new(),
        );
        let precache = Precache {
            manifest: vec!["/static/images/icon.svg".to_string()],
            routes: Vec::new(),
        };
        network.respond(
            "/static/images/icon.svg",
            EdgeResponse::new(StatusCode::OK, "image/svg+xml", "<svg/>"),
        );
        (EdgeWorker::new(router, precache), network)
    }

    fn post_message(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/__edge/message")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn skip_waiting_activates_an_installed_edge() {
        let (worker, _network) = worker();
        worker.start(true).await;

        let response = app(worker.clone())
            .oneshot(post_message(r#"{"type":"SKIP_WAITING"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["activated"], true);
        assert_eq!(body["state"], "activated");
        assert_eq!(worker.state().await, Lifecycle::Activated);
    }

    #[tokio::test]
    async fn preload_message_reports_stored_routes() {
        let (worker, network) = worker();
        network.respond("/fees", EdgeResponse::new(StatusCode::OK, "text/html", "fees"));

        let response = app(worker)
            .oneshot(post_message(
                r#"{"type":"FACTORY_AI_PRELOAD","routes":["/fees","/nowhere"]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["requested"], 2);
        assert_eq!(body["stored"], 1);
    }

    #[tokio::test]
    async fn unknown_messages_are_rejected() {
        let (worker, _network) = worker();
        for body in [r#"{"type":"CLAIM"}"#, r#"{"routes":[]}"#, "not json"] {
            let response = app(worker.clone()).oneshot(post_message(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        }
    }

    #[tokio::test]
    async fn proxied_requests_report_cache_status() {
        let (worker, network) = worker();
        network.respond("/about", EdgeResponse::new(StatusCode::OK, "text/html", "about"));
        worker.start(false).await;

        let response = app(worker)
            .oneshot(Request::builder().uri("/about").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-edge-cache"], "miss");
        assert_eq!(network.calls("/about"), 1);
    }

    #[tokio::test]
    async fn status_reports_lifecycle_and_buckets() {
        let (worker, _network) = worker();
        worker.start(false).await;

        let response = app(worker)
            .oneshot(Request::builder().uri("/__edge/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["state"], "activated");
        assert_eq!(body["buckets"][0], "stillwaters-static-v1");
    }
}
