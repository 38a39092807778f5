//! Contact form route handlers.
//!
//! The HTML form posts back to `/contact`; rejected submissions re-render the
//! form with the visitor's input and a message per field.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use stillwaters_core::{
    ContactSubmission, EnquiryType, PracticeLocation, ValidationErrors, contact::UrgencyInput,
};

use crate::catalog::{PRACTICE_EMAIL, PRACTICE_PHONE};
use crate::db::ContactRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::seo::SeoMeta;
use crate::state::AppState;

use super::api::check_location;

/// Contact form fields as posted. Checkboxes are absent when unticked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub enquiry_type: String,
    pub preferred_location: String,
    pub message: String,
    pub urgency: String,
    pub privacy_consent: Option<String>,
}

impl ContactForm {
    fn submission(&self) -> ContactSubmission {
        let optional = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
        ContactSubmission {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: optional(&self.phone),
            enquiry_type: self.enquiry_type.clone(),
            preferred_location: optional(&self.preferred_location),
            message: self.message.clone(),
            urgency: UrgencyInput::Text(self.urgency.clone()),
            privacy_consent: self.privacy_consent.is_some(),
        }
    }
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
    pub phone: &'static str,
    pub email: &'static str,
    pub enquiry_types: [EnquiryType; 6],
    pub locations: Vec<PracticeLocation>,
    pub form: ContactForm,
    pub errors: ValidationErrors,
    pub sent: bool,
}

impl ContactTemplate {
    async fn build(state: &AppState, nonce: CspNonce, form: ContactForm) -> Self {
        let locations = state.locations().active().await.map_or_else(
            |e| {
                tracing::error!("Failed to load locations: {e}");
                Vec::new()
            },
            |l| l.as_ref().clone(),
        );
        Self {
            seo: SeoMeta::for_path(
                state.config(),
                "/contact",
                "Contact",
                "Ask a question or request an appointment.",
            ),
            nonce: nonce.0,
            phone: PRACTICE_PHONE,
            email: PRACTICE_EMAIL,
            enquiry_types: EnquiryType::ALL,
            locations,
            form,
            errors: ValidationErrors::new(),
            sent: false,
        }
    }

    /// The validation message for a field, or an empty string.
    #[must_use]
    pub fn error_for(&self, field: &str) -> &str {
        self.errors.message_for(field).unwrap_or_default()
    }
}

/// Display the contact form.
#[instrument(skip(state, nonce))]
pub async fn show(State(state): State<AppState>, nonce: CspNonce) -> ContactTemplate {
    let form = ContactForm {
        urgency: "3".to_string(),
        ..ContactForm::default()
    };
    ContactTemplate::build(&state, nonce, form).await
}

/// Handle a contact form submission.
///
/// # Errors
///
/// Returns 500 if the enquiry cannot be stored.
#[instrument(skip(state, nonce, form))]
pub async fn submit(
    State(state): State<AppState>,
    nonce: CspNonce,
    Form(form): Form<ContactForm>,
) -> Result<impl IntoResponse> {
    let checked = match form.submission().validate() {
        Ok(contact) => check_location(&state, "preferredLocation", contact.preferred_location.as_deref())
            .await
            .map(|()| contact),
        Err(errors) => Err(errors.into()),
    };

    let contact = match checked {
        Ok(contact) => contact,
        Err(AppError::Validation(errors)) => {
            let mut page = ContactTemplate::build(&state, nonce, form).await;
            page.errors = errors;
            return Ok((StatusCode::BAD_REQUEST, page));
        }
        Err(e) => return Err(e),
    };

    let stored = ContactRepository::new(state.pool()).insert(&contact).await?;
    add_breadcrumb(
        "contact",
        "Contact form submitted",
        Some(&[("enquiry_type", stored.enquiry_type.as_str())]),
    );
    tracing::info!(contact_id = %stored.id, "Contact enquiry stored");

    let mut page = ContactTemplate::build(&state, nonce, ContactForm::default()).await;
    page.sent = true;
    Ok((StatusCode::OK, page))
}
