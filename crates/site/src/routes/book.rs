//! Booking wizard route handlers.
//!
//! The wizard state lives in the visitor's session under [`SESSION_KEY`].
//! Every POST updates it and redirects back to `GET /book`, which renders
//! whatever step the wizard is on. `?step=N` jumps directly; entering the
//! confirmation step with an incomplete draft falls back to the details step.
//!
//! Only `POST /book/confirm` writes to the database.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use stillwaters_core::{
    BookingWizard, Money, PersonalDetails, PracticeLocation, TimeSlot, ValidationErrors,
    WizardStep, booking::PersonalDetailsInput,
};

use crate::catalog::{self, Service};
use crate::db::{BookingRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::Booking;
use crate::seo::SeoMeta;
use crate::services::CalendarService;
use crate::state::AppState;

use super::api::{check_location, practice_today, require_open_slot};

/// Session key holding the [`BookingSession`].
pub const SESSION_KEY: &str = "booking";

/// Everything the wizard keeps between requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingSession {
    pub wizard: BookingWizard,
    /// Preferred location slug, chosen alongside the date.
    pub location: Option<String>,
}

impl BookingSession {
    /// Load from the session, re-applying the confirmation guard.
    async fn load(session: &Session) -> Result<Self> {
        let stored: Self = session.get(SESSION_KEY).await?.unwrap_or_default();
        let wizard = BookingWizard::restore(stored.wizard.step(), stored.wizard.draft().clone());
        Ok(Self {
            wizard,
            location: stored.location,
        })
    }

    async fn save(&self, session: &Session) -> Result<()> {
        session.insert(SESSION_KEY, self).await?;
        Ok(())
    }
}

// =============================================================================
// Form types
// =============================================================================

/// Query for `GET /book`.
#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    /// Step index from a progress link; anything but a number is ignored.
    pub step: Option<String>,
    /// Date to list open times for (`YYYY-MM-DD`).
    pub date: Option<String>,
    pub location: Option<String>,
}

impl BookQuery {
    fn step_index(&self) -> Option<usize> {
        self.step.as_deref()?.trim().parse().ok()
    }
}

#[derive(Debug, Deserialize)]
pub struct ServiceForm {
    pub service: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DateTimeForm {
    pub date: String,
    pub time: String,
    pub location: String,
}

/// Personal details as posted. The referral checkbox is absent when unticked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailsForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub has_referral: Option<String>,
    pub notes: String,
}

impl DetailsForm {
    fn input(&self) -> PersonalDetailsInput {
        PersonalDetailsInput {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            has_referral: self.has_referral.is_some(),
            notes: Some(self.notes.clone()),
        }
    }
}

impl From<&PersonalDetails> for DetailsForm {
    fn from(details: &PersonalDetails) -> Self {
        Self {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            email: details.email.to_string(),
            phone: details.phone.clone(),
            has_referral: details.has_referral.then(|| "on".to_string()),
            notes: details.notes.clone().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// One entry of the progress indicator.
pub struct StepView {
    pub number: usize,
    pub title: &'static str,
    pub current: bool,
    pub done: bool,
}

/// The booking as shown on the confirmation step.
pub struct ConfirmationView {
    pub service_name: String,
    pub duration: i32,
    pub price: Money,
    pub rebate: Option<Money>,
    pub gap: Money,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub has_referral: bool,
    pub notes: Option<String>,
    pub location: Option<String>,
}

/// Booking wizard template; renders the section for the current step.
#[derive(Template, WebTemplate)]
#[template(path = "book/wizard.html")]
pub struct BookTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
    pub step: usize,
    pub steps: Vec<StepView>,
    pub services: &'static [Service],
    pub selected_service: String,
    pub date: String,
    pub min_date: String,
    pub location: String,
    pub locations: Vec<PracticeLocation>,
    /// Open times for `date`; `None` until a date is chosen.
    pub slots: Option<Vec<TimeSlot>>,
    pub selected_time: String,
    pub details: DetailsForm,
    pub confirmation: Option<ConfirmationView>,
    pub errors: ValidationErrors,
    pub notice: Option<String>,
}

impl BookTemplate {
    /// The validation message for a field, or an empty string.
    #[must_use]
    pub fn error_for(&self, field: &str) -> &str {
        self.errors.message_for(field).unwrap_or_default()
    }
}

/// Booking received page.
#[derive(Template, WebTemplate)]
#[template(path = "book/confirmed.html")]
pub struct ConfirmedTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
    pub booking: Booking,
}

/// Extra input for rendering a step.
#[derive(Default)]
struct StepContext {
    date: Option<String>,
    details: Option<DetailsForm>,
    time: Option<String>,
    errors: ValidationErrors,
    notice: Option<String>,
}

async fn render(
    state: &AppState,
    nonce: CspNonce,
    booking: &BookingSession,
    ctx: StepContext,
) -> Result<BookTemplate> {
    let wizard = &booking.wizard;
    let draft = wizard.draft();
    let step = wizard.step();
    let today = practice_today();

    let locations = state.locations().active().await?.as_ref().clone();
    let location = booking
        .location
        .as_deref()
        .and_then(|slug| locations.iter().find(|l| l.slug == slug));

    let date = ctx
        .date
        .or_else(|| draft.date.map(|d| d.format("%Y-%m-%d").to_string()))
        .unwrap_or_default();

    let slots = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
        Ok(day) if step == WizardStep::DateTime && day >= today => Some(
            CalendarService::new(state.pool())
                .open_slots(day, location)
                .await?,
        ),
        Ok(_) if step == WizardStep::DateTime => Some(Vec::new()),
        _ => None,
    };

    let confirmation = wizard.confirmation().map(|c| ConfirmationView {
        service_name: c.service.name.clone(),
        duration: c.service.duration,
        price: c.service.price,
        rebate: c.service.rebate,
        gap: c.service.out_of_pocket(),
        date: c.date,
        time: c.time,
        name: c.personal_details.full_name(),
        email: c.personal_details.email.to_string(),
        phone: c.personal_details.phone.clone(),
        has_referral: c.personal_details.has_referral,
        notes: c.personal_details.notes.clone(),
        location: location.map(|l| l.name.clone()),
    });

    let steps = [
        WizardStep::ServiceSelection,
        WizardStep::DateTime,
        WizardStep::PersonalDetails,
        WizardStep::Confirmation,
    ]
    .into_iter()
    .map(|s| StepView {
        number: s.index() + 1,
        title: s.title(),
        current: s == step,
        done: s < step,
    })
    .collect();

    Ok(BookTemplate {
        seo: SeoMeta::for_path(
            state.config(),
            "/book",
            "Book an appointment",
            "Choose a service, pick a time and send a booking request.",
        )
        .noindex(),
        nonce: nonce.0,
        step: step.index(),
        steps,
        services: catalog::services(),
        selected_service: draft.service.as_ref().map(|s| s.id.clone()).unwrap_or_default(),
        date,
        min_date: today.format("%Y-%m-%d").to_string(),
        location: booking.location.clone().unwrap_or_default(),
        locations,
        slots,
        selected_time: ctx
            .time
            .or_else(|| draft.time.map(|t| t.to_hhmm()))
            .unwrap_or_default(),
        details: ctx
            .details
            .or_else(|| draft.personal_details.as_ref().map(DetailsForm::from))
            .unwrap_or_default(),
        confirmation,
        errors: ctx.errors,
        notice: ctx.notice,
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the wizard at its current step, or at `?step=N`.
///
/// # Errors
///
/// Returns 500 if the session or availability cannot be read.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Query(query): Query<BookQuery>,
) -> Result<BookTemplate> {
    let mut booking = BookingSession::load(&session).await?;
    let mut changed = false;

    if let Some(index) = query.step_index() {
        booking.wizard.go_to(index);
        changed = true;
    }
    if let Some(slug) = query.location.as_deref().map(str::trim) {
        booking.location = if slug.is_empty() {
            None
        } else {
            state.locations().find(slug).await?.map(|l| l.slug)
        };
        changed = true;
    }
    if changed {
        booking.save(&session).await?;
    }

    render(
        &state,
        nonce,
        &booking,
        StepContext {
            date: query.date,
            ..StepContext::default()
        },
    )
    .await
}

/// Select a service; advances to the date step when starting out.
///
/// # Errors
///
/// Returns 400 for an unknown service.
#[instrument(skip(session, form))]
pub async fn select_service(session: Session, Form(form): Form<ServiceForm>) -> Result<Redirect> {
    let service = catalog::service(&form.service)
        .ok_or_else(|| AppError::BadRequest(format!("unknown service {}", form.service)))?;

    let mut booking = BookingSession::load(&session).await?;
    booking.wizard.select_service(service.snapshot());
    booking.save(&session).await?;

    Ok(Redirect::to("/book"))
}

/// Choose the appointment date, time and location.
///
/// The time must be one of the open slots for that date.
///
/// # Errors
///
/// Returns 500 if the session or availability cannot be read.
#[instrument(skip(state, session, nonce, form))]
pub async fn choose_date_time(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Form(form): Form<DateTimeForm>,
) -> Result<Response> {
    let mut booking = BookingSession::load(&session).await?;
    let mut errors = ValidationErrors::new();

    let location = match form.location.trim() {
        "" => None,
        slug => {
            let found = state.locations().find(slug).await?;
            if found.is_none() {
                errors.push("location", "is not an active location");
            }
            found
        }
    };

    let date = errors.check(
        "date",
        NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d").map_err(|_| "is required"),
    );
    if date.is_some_and(|d| d < practice_today()) {
        errors.push("date", "must not be in the past");
    }
    let time = errors.check("time", TimeSlot::parse(&form.time));

    if let (Some(date), Some(time)) = (date, time)
        && errors.is_empty()
    {
        let open = CalendarService::new(state.pool())
            .open_slots(date, location.as_ref())
            .await?;
        require_open_slot(&open, time, &mut errors);
    }

    booking.location = location.map(|l| l.slug);

    match (date, time) {
        (Some(date), Some(time)) if errors.is_empty() => {
            booking.wizard.set_date_time(date, time);
            booking.wizard.next();
            booking.save(&session).await?;
            Ok(Redirect::to("/book").into_response())
        }
        _ => {
            booking.save(&session).await?;
            let page = render(
                &state,
                nonce,
                &booking,
                StepContext {
                    date: Some(form.date),
                    time: Some(form.time),
                    errors,
                    ..StepContext::default()
                },
            )
            .await?;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
    }
}

/// Enter personal details; advances to confirmation.
///
/// # Errors
///
/// Returns 500 if the session cannot be read.
#[instrument(skip(state, session, nonce, form))]
pub async fn enter_details(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
    Form(form): Form<DetailsForm>,
) -> Result<Response> {
    let mut booking = BookingSession::load(&session).await?;

    match form.input().validate() {
        Ok(details) => {
            booking.wizard.set_personal_details(details);
            booking.wizard.next();
            booking.save(&session).await?;
            Ok(Redirect::to("/book").into_response())
        }
        Err(errors) => {
            let page = render(
                &state,
                nonce,
                &booking,
                StepContext {
                    details: Some(form),
                    errors: errors.nested("personalDetails"),
                    ..StepContext::default()
                },
            )
            .await?;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
    }
}

/// Go back one step.
///
/// # Errors
///
/// Returns 500 if the session cannot be read or written.
#[instrument(skip(session))]
pub async fn back(session: Session) -> Result<Redirect> {
    let mut booking = BookingSession::load(&session).await?;
    booking.wizard.back();
    booking.save(&session).await?;
    Ok(Redirect::to("/book"))
}

/// The step to show for a rejected submission.
fn step_for(errors: &ValidationErrors) -> WizardStep {
    let touches = |prefix: &str| errors.errors().iter().any(|e| e.field.starts_with(prefix));
    if touches("service") {
        WizardStep::ServiceSelection
    } else if touches("date") || touches("time") || touches("location") {
        WizardStep::DateTime
    } else {
        WizardStep::PersonalDetails
    }
}

/// Submit the confirmed booking.
///
/// An incomplete draft redirects back to the wizard. A slot taken in the
/// meantime returns the visitor to the date step with a notice.
///
/// # Errors
///
/// Returns 500 if the booking cannot be stored.
#[instrument(skip(state, session, nonce))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    nonce: CspNonce,
) -> Result<Response> {
    let mut booking = BookingSession::load(&session).await?;
    let Some(submission) = booking.wizard.to_submission(booking.location.clone()) else {
        return Ok(Redirect::to("/book").into_response());
    };

    let checked = match submission.validate(practice_today()) {
        Ok(valid) => check_location(&state, "location", valid.location.as_deref())
            .await
            .map(|()| valid),
        Err(errors) => Err(errors.into()),
    };

    let valid = match checked {
        Ok(valid) => valid,
        Err(AppError::Validation(errors)) => {
            booking.wizard.go_to(step_for(&errors).index());
            booking.save(&session).await?;
            let page = render(
                &state,
                nonce,
                &booking,
                StepContext {
                    errors,
                    ..StepContext::default()
                },
            )
            .await?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
        Err(e) => return Err(e),
    };

    let stored = match BookingRepository::new(state.pool()).insert(&valid).await {
        Ok(stored) => stored,
        Err(RepositoryError::Conflict(message)) => {
            booking.wizard.go_to(WizardStep::DateTime.index());
            booking.save(&session).await?;
            let page = render(
                &state,
                nonce,
                &booking,
                StepContext {
                    notice: Some(format!("Sorry, {message}. Please choose another time.")),
                    ..StepContext::default()
                },
            )
            .await?;
            return Ok((StatusCode::CONFLICT, page).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    add_breadcrumb(
        "booking",
        "Booking confirmed",
        Some(&[("service", stored.service.id.as_str())]),
    );
    tracing::info!(booking_id = %stored.id, "Booking confirmed");

    booking.wizard.reset();
    booking.save(&session).await?;

    let seo = SeoMeta::for_path(state.config(), "/book", "Booking received", "").noindex();
    Ok(ConfirmedTemplate {
        seo,
        nonce: nonce.0,
        booking: stored,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_submission_returns_to_the_right_step() {
        let mut errors = ValidationErrors::new();
        errors.push("personalDetails.email", "is invalid");
        assert_eq!(step_for(&errors), WizardStep::PersonalDetails);

        errors.push("date", "must not be in the past");
        assert_eq!(step_for(&errors), WizardStep::DateTime);

        errors.push("service.price", "must not be negative");
        assert_eq!(step_for(&errors), WizardStep::ServiceSelection);
    }

    #[test]
    fn step_links_accept_only_indices() {
        let query = |step: &str| BookQuery {
            step: Some(step.to_string()),
            ..BookQuery::default()
        };
        assert_eq!(query("2").step_index(), Some(2));
        assert_eq!(query(" 0 ").step_index(), Some(0));
        assert_eq!(query("-1").step_index(), None);
        assert_eq!(query("x").step_index(), None);
        assert_eq!(query("").step_index(), None);
        assert_eq!(BookQuery::default().step_index(), None);
    }

    #[test]
    fn details_form_round_trips_referral_checkbox() {
        let form = DetailsForm {
            first_name: "Alex".to_string(),
            last_name: "Rivers".to_string(),
            email: "Alex@Example.com".to_string(),
            phone: "0412 345 678".to_string(),
            has_referral: Some("on".to_string()),
            notes: "  ".to_string(),
        };
        let details = form.input().validate().unwrap_or_else(|e| panic!("{e}"));
        assert!(details.has_referral);
        assert_eq!(details.notes, None);

        let back = DetailsForm::from(&details);
        assert_eq!(back.email, "alex@example.com");
        assert_eq!(back.has_referral.as_deref(), Some("on"));
    }
}
