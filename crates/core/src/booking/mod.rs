//! Booking requests.
//!
//! A booking is built incrementally by the [`wizard`] as a [`BookingDraft`],
//! converted into a [`BookingSubmission`] (the wire shape accepted by the
//! JSON API as well), and only becomes a [`ValidBooking`] after
//! [`BookingSubmission::validate`].

pub mod wizard;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Email, Money, TimeSlot};
use crate::validation::{ValidationErrors, is_valid_phone};

const MAX_NAME_LEN: usize = 100;
const MAX_NOTES_LEN: usize = 2000;

/// The service a client booked, copied at booking time.
///
/// Stored denormalised with the booking so later fee changes never rewrite
/// history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSnapshot {
    pub id: String,
    pub name: String,
    /// Session length in minutes.
    pub duration: i32,
    pub price: Money,
    /// Medicare rebate, if the service is eligible.
    #[serde(default)]
    pub rebate: Option<Money>,
}

impl ServiceSnapshot {
    /// Check the snapshot's shape.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint, with unprefixed field names.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("id", &self.id, MAX_NAME_LEN);
        errors.required("name", &self.name, MAX_NAME_LEN);
        if self.duration <= 0 {
            errors.push("duration", "must be greater than zero");
        }
        if self.price.is_negative() {
            errors.push("price", "must not be negative");
        }
        if let Some(rebate) = self.rebate {
            if rebate.is_negative() {
                errors.push("rebate", "must not be negative");
            } else if rebate > self.price {
                errors.push("rebate", "must not exceed the price");
            }
        }
        errors.finish(|| Some(()))
    }

    /// What the client pays after any rebate.
    #[must_use]
    pub fn out_of_pocket(&self) -> Money {
        Money::out_of_pocket(self.price, self.rebate)
    }
}

/// Client details as typed into the form, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalDetailsInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub has_referral: bool,
    pub notes: Option<String>,
}

impl PersonalDetailsInput {
    /// Validate into [`PersonalDetails`].
    ///
    /// # Errors
    ///
    /// Returns every violated constraint, with unprefixed field names.
    pub fn validate(&self) -> Result<PersonalDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let first_name = errors.required("firstName", &self.first_name, MAX_NAME_LEN);
        let last_name = errors.required("lastName", &self.last_name, MAX_NAME_LEN);
        let email = errors.check("email", Email::parse(&self.email));
        let phone = errors.required("phone", &self.phone, 30);
        if phone.as_deref().is_some_and(|p| !is_valid_phone(p)) {
            errors.push("phone", "must contain 8 to 15 digits");
        }
        let notes = self
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned);
        if notes
            .as_deref()
            .is_some_and(|n| n.chars().count() > MAX_NOTES_LEN)
        {
            errors.push(
                "notes",
                format!("must be at most {MAX_NOTES_LEN} characters"),
            );
        }

        errors.finish(|| {
            Some(PersonalDetails {
                first_name: first_name?,
                last_name: last_name?,
                email: email?,
                phone: phone?,
                has_referral: self.has_referral,
                notes,
            })
        })
    }
}

/// Validated client details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    /// Whether the client holds a GP referral / Mental Health Care Plan.
    pub has_referral: bool,
    pub notes: Option<String>,
}

impl PersonalDetails {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl From<&PersonalDetails> for PersonalDetailsInput {
    fn from(details: &PersonalDetails) -> Self {
        Self {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            email: details.email.to_string(),
            phone: details.phone.clone(),
            has_referral: details.has_referral,
            notes: details.notes.clone(),
        }
    }
}

/// A booking being assembled step by step. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub service: Option<ServiceSnapshot>,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSlot>,
    pub personal_details: Option<PersonalDetails>,
}

impl BookingDraft {
    /// Whether every part needed for confirmation is present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.service.is_some()
            && self.date.is_some()
            && self.time.is_some()
            && self.personal_details.is_some()
    }

    /// Convert a complete draft into the submission shape.
    #[must_use]
    pub fn to_submission(&self, location: Option<String>) -> Option<BookingSubmission> {
        Some(BookingSubmission {
            service: self.service.clone()?,
            date: self.date?.format("%Y-%m-%d").to_string(),
            time: self.time?.to_hhmm(),
            personal_details: PersonalDetailsInput::from(self.personal_details.as_ref()?),
            location,
        })
    }
}

/// A booking as submitted, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    pub service: ServiceSnapshot,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    pub time: String,
    #[serde(alias = "client")]
    pub personal_details: PersonalDetailsInput,
    /// Preferred practice location slug.
    #[serde(default)]
    pub location: Option<String>,
}

impl BookingSubmission {
    /// Validate the nested service and client shapes.
    ///
    /// `today` is the practice's current date; appointments cannot be booked
    /// in the past.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint, using JSON paths as field names.
    pub fn validate(&self, today: NaiveDate) -> Result<ValidBooking, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(service_errors) = self.service.validate() {
            errors.extend(service_errors.nested("service"));
        }

        let date = errors.check(
            "date",
            NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
                .map_err(|_| "must be a date in YYYY-MM-DD format"),
        );
        if date.is_some_and(|d| d < today) {
            errors.push("date", "must not be in the past");
        }

        let time = errors.check("time", TimeSlot::parse(&self.time));

        let personal_details = match self.personal_details.validate() {
            Ok(details) => Some(details),
            Err(detail_errors) => {
                errors.extend(detail_errors.nested("personalDetails"));
                None
            }
        };

        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned);

        errors.finish(|| {
            Some(ValidBooking {
                service: self.service.clone(),
                date: date?,
                time: time?,
                personal_details: personal_details?,
                location,
            })
        })
    }
}

/// A booking that passed validation and may be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidBooking {
    pub service: ServiceSnapshot,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub personal_details: PersonalDetails,
    pub location: Option<String>,
}
