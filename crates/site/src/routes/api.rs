//! JSON API route handlers.
//!
//! Reads are public; the two submission endpoints validate the whole body,
//! answer `400` with every issue at once, and only then touch the database.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stillwaters_core::{
    BookingSubmission, ContactId, ContactSubmission, PracticeLocation, TimeSlot, ValidationErrors,
};

use crate::catalog::{self, Service};
use crate::config::MapsConfig;
use crate::db::{BookingRepository, ContactRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::{CalendarService, CalendarStatus};
use crate::state::AppState;

/// The practice's current date, used to reject bookings in the past.
pub(crate) fn practice_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Every service in the catalogue.
pub async fn services() -> Json<&'static [Service]> {
    Json(catalog::services())
}

/// Active practice locations.
///
/// # Errors
///
/// Returns 500 if the locations cannot be loaded.
#[instrument(skip(state))]
pub async fn locations(State(state): State<AppState>) -> Result<Json<Arc<Vec<PracticeLocation>>>> {
    Ok(Json(state.locations().active().await?))
}

/// Maps configuration for client-side rendering.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapsConfigResponse {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub center: MapCenter,
    pub zoom: u8,
}

#[derive(Debug, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lng: f64,
}

impl From<&MapsConfig> for MapsConfigResponse {
    fn from(maps: &MapsConfig) -> Self {
        Self {
            enabled: maps.enabled(),
            api_key: maps.api_key.clone(),
            center: MapCenter {
                lat: maps.default_lat,
                lng: maps.default_lng,
            },
            zoom: maps.default_zoom,
        }
    }
}

/// Maps configuration.
pub async fn maps_config(State(state): State<AppState>) -> Json<MapsConfigResponse> {
    Json(MapsConfigResponse::from(&state.config().maps))
}

/// Query for `/api/availability`.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
    pub location: Option<String>,
}

/// Open slots on a date.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub location: Option<String>,
    pub slots: Vec<TimeSlot>,
}

/// Open appointment slots for a date, optionally at one location.
///
/// # Errors
///
/// Returns 400 for a malformed date or unknown location.
#[instrument(skip(state))]
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>> {
    let date = NaiveDate::parse_from_str(query.date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("date must be YYYY-MM-DD".to_string()))?;

    let location = match query.location.as_deref().filter(|s| !s.is_empty()) {
        Some(slug) => Some(
            state
                .locations()
                .find(slug)
                .await?
                .ok_or_else(|| AppError::BadRequest(format!("unknown location {slug}")))?,
        ),
        None => None,
    };

    let slots = if date < practice_today() {
        Vec::new()
    } else {
        CalendarService::new(state.pool())
            .open_slots(date, location.as_ref())
            .await?
    };

    Ok(Json(AvailabilityResponse {
        date,
        location: location.map(|l| l.slug),
        slots,
    }))
}

/// Calendar connection status.
///
/// # Errors
///
/// Returns 500 if the token cannot be read.
#[instrument(skip(state))]
pub async fn calendar_status(State(state): State<AppState>) -> Result<Json<CalendarStatus>> {
    Ok(Json(
        CalendarService::new(state.pool()).status(Utc::now()).await?,
    ))
}

/// Look up an optional location slug, rejecting one that is not active.
pub(crate) async fn resolve_location(
    state: &AppState,
    field: &str,
    slug: Option<&str>,
) -> Result<Option<PracticeLocation>> {
    let Some(slug) = slug else {
        return Ok(None);
    };
    match state.locations().find(slug).await? {
        Some(location) => Ok(Some(location)),
        None => {
            let mut errors = ValidationErrors::new();
            errors.push(field, "is not an active location");
            Err(errors.into())
        }
    }
}

/// Reject a location slug that is not an active location.
pub(crate) async fn check_location(
    state: &AppState,
    field: &str,
    slug: Option<&str>,
) -> Result<()> {
    resolve_location(state, field, slug).await.map(drop)
}

/// Reject a time that is not among the open slots for its day.
pub(crate) fn require_open_slot(open: &[TimeSlot], time: TimeSlot, errors: &mut ValidationErrors) {
    if !open.contains(&time) {
        errors.push("time", "is no longer available");
    }
}

/// Create a booking.
///
/// The snapshot is checked against the fee schedule and the time against
/// the open slots for the day, the same as the booking wizard does.
///
/// # Errors
///
/// Returns 400 with every issue if validation fails, 409 if the slot is
/// already booked.
#[instrument(skip(state, submission))]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(submission): Json<BookingSubmission>,
) -> Result<impl IntoResponse> {
    let booking = submission.validate(practice_today())?;

    let mut errors = ValidationErrors::new();
    catalog::check_snapshot(&booking.service, &mut errors);
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let location = resolve_location(&state, "location", booking.location.as_deref()).await?;
    let open = CalendarService::new(state.pool())
        .open_slots(booking.date, location.as_ref())
        .await?;
    require_open_slot(&open, booking.time, &mut errors);
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let booking = BookingRepository::new(state.pool()).insert(&booking).await?;

    add_breadcrumb(
        "booking",
        "Booking created",
        Some(&[("service", booking.service.id.as_str())]),
    );
    tracing::info!(booking_id = %booking.id, "Booking created");

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Response for a stored contact enquiry.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub id: ContactId,
    pub message: String,
}

/// Create a contact enquiry.
///
/// # Errors
///
/// Returns 400 with every issue if validation fails (including missing
/// privacy consent).
#[instrument(skip(state, submission))]
pub async fn create_contact(
    State(state): State<AppState>,
    Json(submission): Json<ContactSubmission>,
) -> Result<impl IntoResponse> {
    let contact = submission.validate()?;
    check_location(&state, "preferredLocation", contact.preferred_location.as_deref()).await?;

    let contact = ContactRepository::new(state.pool()).insert(&contact).await?;

    add_breadcrumb(
        "contact",
        "Contact enquiry stored",
        Some(&[("enquiry_type", contact.enquiry_type.as_str())]),
    );
    tracing::info!(contact_id = %contact.id, "Contact enquiry stored");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            id: contact.id,
            message: "Thanks, we'll be in touch within two business days.".to_string(),
        }),
    ))
}
