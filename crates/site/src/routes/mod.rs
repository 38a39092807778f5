//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /services               - Service list
//! GET  /services/{slug}        - Service detail
//! GET  /fees                   - Fee schedule
//! GET  /locations              - Practice locations
//! GET  /contact                - Contact form
//! POST /contact                - Contact form submission (rate limited)
//!
//! # Booking wizard (session-backed)
//! GET  /book[?step=N]          - Current step
//! POST /book/service           - Select service
//! POST /book/datetime          - Choose date and time
//! POST /book/details           - Personal details
//! POST /book/back              - Previous step
//! POST /book/confirm           - Submit (rate limited)
//!
//! # Content and metadata
//! GET  /about /privacy /terms  - Markdown pages
//! GET  /robots.txt /sitemap.xml /site.webmanifest
//!
//! # JSON API
//! GET  /api/services
//! GET  /api/locations
//! GET  /api/config/maps
//! GET  /api/availability?date=YYYY-MM-DD[&location=slug]
//! GET  /api/calendar/status
//! POST /api/bookings           - (rate limited)
//! POST /api/contacts           - (rate limited)
//! ```

pub mod api;
pub mod book;
pub mod contact;
pub mod home;
pub mod locations;
pub mod manifest;
pub mod pages;
pub mod seo;
pub mod services;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::submission_rate_limiter;
use crate::state::AppState;

/// Create the booking wizard routes router.
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(book::show))
        .route("/service", post(book::select_service))
        .route("/datetime", post(book::choose_date_time))
        .route("/details", post(book::enter_details))
        .route("/back", post(book::back))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(api::services))
        .route("/locations", get(api::locations))
        .route("/config/maps", get(api::maps_config))
        .route("/availability", get(api::availability))
        .route("/calendar/status", get(api::calendar_status))
}

/// Routes that write to the database, limited per client IP.
pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact::submit))
        .route("/book/confirm", post(book::confirm))
        .route("/api/bookings", post(api::create_booking))
        .route("/api/contacts", post(api::create_contact))
        .route_layer(submission_rate_limiter())
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/services", get(services::index))
        .route("/services/{slug}", get(services::show))
        .route("/fees", get(services::fees))
        .route("/locations", get(locations::index))
        .route("/contact", get(contact::show))
        .nest("/book", book_routes())
        .nest("/api", api_routes())
        .route("/about", get(pages::about))
        .route("/privacy", get(pages::privacy))
        .route("/terms", get(pages::terms))
        .route("/robots.txt", get(seo::robots))
        .route("/sitemap.xml", get(seo::sitemap))
        .route("/site.webmanifest", get(manifest::manifest))
        .merge(submission_routes())
}
