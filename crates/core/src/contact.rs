//! Contact enquiries.

use serde::{Deserialize, Serialize};

use crate::types::{Email, EnquiryType};
use crate::validation::{ValidationErrors, is_valid_phone};

const MAX_NAME_LEN: usize = 100;
const MIN_MESSAGE_LEN: usize = 10;
const MAX_MESSAGE_LEN: usize = 5000;

/// Lowest and highest accepted urgency level.
pub const URGENCY_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

/// Urgency as it arrives: forms send strings, scripts send numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrgencyInput {
    Number(serde_json::Number),
    Text(String),
}

impl Default for UrgencyInput {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl UrgencyInput {
    /// Coerce to an integer level.
    ///
    /// Integral numbers (`3`, `3.0`) and numeric strings (`" 3 "`) are
    /// accepted; fractions and anything else are not. Whole numbers beyond
    /// `i32` saturate, so they still read as out of range.
    #[must_use]
    pub fn coerce(&self) -> Option<i32> {
        let value = match self {
            Self::Number(n) => n
                .as_i64()
                .or_else(|| n.as_u64().map(|_| i64::MAX))
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| {
                            // `as` saturates at the i64 bounds
                            #[allow(clippy::cast_possible_truncation)]
                            let whole = f as i64;
                            whole
                        })
                })?,
            Self::Text(s) => {
                let s = s.trim();
                let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                s.parse::<i64>()
                    .unwrap_or(if s.starts_with('-') { i64::MIN } else { i64::MAX })
            }
        };
        Some(i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX }))
    }
}

/// A contact enquiry as submitted, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub enquiry_type: String,
    pub preferred_location: Option<String>,
    pub message: String,
    pub urgency: UrgencyInput,
    pub privacy_consent: bool,
}

impl ContactSubmission {
    /// Validate the enquiry.
    ///
    /// Consent is checked like every other field, so a submission without it
    /// can never reach persistence.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint, using JSON field names.
    pub fn validate(&self) -> Result<ValidContact, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let first_name = errors.required("firstName", &self.first_name, MAX_NAME_LEN);
        let last_name = errors.required("lastName", &self.last_name, MAX_NAME_LEN);
        let email = errors.check("email", Email::parse(&self.email));

        let phone = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned);
        if phone.as_deref().is_some_and(|p| !is_valid_phone(p)) {
            errors.push("phone", "must contain 8 to 15 digits");
        }

        let enquiry_type = if self.enquiry_type.trim().is_empty() {
            errors.push("enquiryType", "is required");
            None
        } else {
            errors.check("enquiryType", self.enquiry_type.parse::<EnquiryType>())
        };

        let preferred_location = self
            .preferred_location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned);

        let message = self.message.trim();
        let message_len = message.chars().count();
        if message_len < MIN_MESSAGE_LEN {
            errors.push(
                "message",
                format!("must be at least {MIN_MESSAGE_LEN} characters"),
            );
        } else if message_len > MAX_MESSAGE_LEN {
            errors.push(
                "message",
                format!("must be at most {MAX_MESSAGE_LEN} characters"),
            );
        }

        let urgency = match self.urgency.coerce() {
            Some(level) if URGENCY_RANGE.contains(&level) => Some(level),
            Some(_) => {
                errors.push(
                    "urgency",
                    format!(
                        "must be between {} and {}",
                        URGENCY_RANGE.start(),
                        URGENCY_RANGE.end()
                    ),
                );
                None
            }
            None => {
                errors.push("urgency", "must be a whole number");
                None
            }
        };

        if !self.privacy_consent {
            errors.push("privacyConsent", "must be accepted");
        }

        errors.finish(|| {
            Some(ValidContact {
                first_name: first_name?,
                last_name: last_name?,
                email: email?,
                phone,
                enquiry_type: enquiry_type?,
                preferred_location,
                message: message.to_owned(),
                urgency: urgency?,
            })
        })
    }
}

/// A contact enquiry that passed validation.
///
/// Only constructed by [`ContactSubmission::validate`], which requires
/// consent, so holding one implies consent was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidContact {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub enquiry_type: EnquiryType,
    pub preferred_location: Option<String>,
    pub message: String,
    pub urgency: i32,
}

impl ValidContact {
    /// Always `true`; stored so the database can enforce it too.
    #[must_use]
    pub const fn privacy_consent(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn submission() -> ContactSubmission {
        serde_json::from_value(serde_json::json!({
            "firstName": "Jordan",
            "lastName": "Hale",
            "email": "jordan@example.com",
            "phone": "0400 111 222",
            "enquiryType": "fees",
            "preferredLocation": "sandy-bay",
            "message": "Do you bulk bill for students?",
            "urgency": "2",
            "privacyConsent": true
        }))
        .unwrap()
    }

    #[test]
    fn valid_submission_passes() {
        let contact = submission().validate().unwrap();
        assert_eq!(contact.enquiry_type, EnquiryType::Fees);
        assert_eq!(contact.urgency, 2);
        assert!(contact.privacy_consent());
    }

    #[test]
    fn missing_consent_is_rejected() {
        let mut s = submission();
        s.privacy_consent = false;
        let errors = s.validate().unwrap_err();
        assert!(errors.has("privacyConsent"));
        assert_eq!(errors.errors().len(), 1);
    }

    #[test]
    fn consent_defaults_to_false() {
        let s: ContactSubmission = serde_json::from_value(serde_json::json!({
            "firstName": "Jordan",
            "lastName": "Hale",
            "email": "jordan@example.com",
            "enquiryType": "general",
            "message": "Just wanted to say hello there.",
            "urgency": 1
        }))
        .unwrap();
        assert!(s.validate().unwrap_err().has("privacyConsent"));
    }

    #[test]
    fn urgency_coercion() {
        let n = |v: serde_json::Value| -> UrgencyInput { serde_json::from_value(v).unwrap() };
        assert_eq!(n(serde_json::json!(3)).coerce(), Some(3));
        assert_eq!(n(serde_json::json!(4.0)).coerce(), Some(4));
        assert_eq!(n(serde_json::json!(" 5 ")).coerce(), Some(5));
        assert_eq!(n(serde_json::json!(2.5)).coerce(), None);
        assert_eq!(n(serde_json::json!("high")).coerce(), None);
        assert_eq!(n(serde_json::json!("-")).coerce(), None);
        assert_eq!(n(serde_json::json!(1e12)).coerce(), Some(i32::MAX));
        assert_eq!(n(serde_json::json!(-1e12)).coerce(), Some(i32::MIN));
        assert_eq!(n(serde_json::json!(u64::MAX)).coerce(), Some(i32::MAX));
    }

    #[test]
    fn huge_whole_urgency_reports_the_range() {
        for urgency in [
            serde_json::json!(1e12),
            serde_json::json!(4_000_000_000_u64),
            serde_json::json!("99999999999999999999999"),
            serde_json::json!("-12345678901"),
        ] {
            let mut s = submission();
            s.urgency = serde_json::from_value(urgency.clone()).unwrap();
            assert_eq!(
                s.validate().unwrap_err().message_for("urgency"),
                Some("must be between 1 and 5"),
                "{urgency}"
            );
        }
    }

    #[test]
    fn urgency_out_of_range_is_rejected() {
        let mut s = submission();
        s.urgency = UrgencyInput::Text("9".to_string());
        assert_eq!(
            s.validate().unwrap_err().message_for("urgency"),
            Some("must be between 1 and 5")
        );
    }

    #[test]
    fn reports_all_problems_at_once() {
        let s = ContactSubmission::default();
        let errors = s.validate().unwrap_err();
        for field in [
            "firstName",
            "lastName",
            "email",
            "enquiryType",
            "message",
            "urgency",
            "privacyConsent",
        ] {
            assert!(errors.has(field), "expected error for {field}");
        }
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let mut s = submission();
        s.phone = Some("  ".to_string());
        s.preferred_location = Some(String::new());
        let contact = s.validate().unwrap();
        assert_eq!(contact.phone, None);
        assert_eq!(contact.preferred_location, None);
    }
}
