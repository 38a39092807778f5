//! Stored records as read back from the database.

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use stillwaters_core::{
    BookingId, BookingStatus, ContactId, Email, EnquiryType, OAuthTokenId, PersonalDetails,
    ServiceSnapshot, TimeSlot,
};

/// A persisted booking request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub service: ServiceSnapshot,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub personal_details: PersonalDetails,
    pub location: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// A persisted contact enquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub enquiry_type: EnquiryType,
    pub preferred_location: Option<String>,
    pub message: String,
    pub urgency: i16,
    pub created_at: DateTime<Utc>,
}

/// Credentials for an external calendar provider.
#[derive(Clone)]
pub struct OAuthToken {
    pub id: OAuthTokenId,
    pub provider: String,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Whether the access token has passed its expiry at `now`.
    ///
    /// Tokens without an expiry never expire.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// A token to be stored, as given on the command line.
pub struct NewOAuthToken {
    pub provider: String,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}
