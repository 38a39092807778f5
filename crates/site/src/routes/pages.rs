//! Markdown content pages (about, privacy, terms).

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::NaiveDate;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::seo::SeoMeta;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
    pub title: String,
    pub updated_at: Option<NaiveDate>,
    pub content_html: String,
}

/// Serve a content page by slug.
fn serve_content_page(state: &AppState, slug: &str, nonce: CspNonce) -> Result<ContentPageTemplate> {
    let page = state
        .content()
        .get_page(slug)
        .ok_or_else(|| AppError::NotFound(format!("page {slug}")))?;

    let description = page.meta.description.as_deref().unwrap_or_default();
    Ok(ContentPageTemplate {
        seo: SeoMeta::for_path(state.config(), &format!("/{slug}"), &page.meta.title, description),
        nonce: nonce.0,
        title: page.meta.title.clone(),
        updated_at: page.meta.updated_at,
        content_html: page.content_html.clone(),
    })
}

/// Display the About page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip(state, nonce))]
pub async fn about(State(state): State<AppState>, nonce: CspNonce) -> Result<ContentPageTemplate> {
    serve_content_page(&state, "about", nonce)
}

/// Display the Privacy Policy page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip(state, nonce))]
pub async fn privacy(State(state): State<AppState>, nonce: CspNonce) -> Result<ContentPageTemplate> {
    serve_content_page(&state, "privacy", nonce)
}

/// Display the Terms of Service page.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist.
#[instrument(skip(state, nonce))]
pub async fn terms(State(state): State<AppState>, nonce: CspNonce) -> Result<ContentPageTemplate> {
    serve_content_page(&state, "terms", nonce)
}

/// Page-not-found template, used as the router fallback.
#[derive(Template, WebTemplate)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
}

/// Fallback for unmatched routes.
pub async fn not_found(
    State(state): State<AppState>,
    nonce: CspNonce,
) -> (axum::http::StatusCode, NotFoundTemplate) {
    (
        axum::http::StatusCode::NOT_FOUND,
        NotFoundTemplate {
            seo: SeoMeta::for_path(state.config(), "/404", "Page not found", "").noindex(),
            nonce: nonce.0,
        },
    )
}
