//! Web app manifest route handler.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::catalog::PRACTICE_NAME;

/// Serve the web app manifest.
pub async fn manifest() -> Response {
    let manifest = serde_json::json!({
        "name": PRACTICE_NAME,
        "short_name": "Still Waters",
        "start_url": "/",
        "scope": "/",
        "icons": [
            {
                "src": "/static/images/icon.svg",
                "sizes": "any",
                "type": "image/svg+xml",
                "purpose": "any maskable"
            }
        ],
        "theme_color": "#2f5d62",
        "background_color": "#f7f5f0",
        "display": "standalone"
    });

    (
        [(header::CONTENT_TYPE, "application/manifest+json")],
        manifest.to_string(),
    )
        .into_response()
}
