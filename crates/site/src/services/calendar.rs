//! Appointment availability and calendar connection status.
//!
//! Open slots are computed locally from the weekly availability rules minus
//! the bookings already made. The practice calendar provider is not synced;
//! [`CalendarService::status`] only reports whether a token is on file.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use stillwaters_core::{PracticeLocation, TimeSlot, location::open_slots};

use crate::db::{AvailabilityRepository, BookingRepository, OAuthTokenRepository, RepositoryError};
use crate::models::OAuthToken;

/// Provider name the practice calendar token is stored under.
pub const CALENDAR_PROVIDER: &str = "google";

/// Calendar connection state reported by `/api/calendar/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarStatus {
    pub provider: &'static str,
    pub connected: bool,
    pub expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// External sync is never performed.
    pub sync_enabled: bool,
}

impl CalendarStatus {
    /// Status derived from the stored token, if any.
    #[must_use]
    pub fn from_token(token: Option<&OAuthToken>, now: DateTime<Utc>) -> Self {
        Self {
            provider: CALENDAR_PROVIDER,
            connected: token.is_some(),
            expired: token.is_some_and(|t| t.is_expired(now)),
            expires_at: token.and_then(|t| t.expires_at),
            sync_enabled: false,
        }
    }
}

/// Slot computation over the availability and booking tables.
pub struct CalendarService<'a> {
    pool: &'a PgPool,
}

impl<'a> CalendarService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Bookable times on `date`, earliest first.
    ///
    /// Rules for the date's weekday are expanded into slots, then every time
    /// already booked is removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if either query fails.
    #[instrument(skip(self, location), fields(location = location.map(|l| l.slug.as_str())))]
    pub async fn open_slots(
        &self,
        date: NaiveDate,
        location: Option<&PracticeLocation>,
    ) -> Result<Vec<TimeSlot>, RepositoryError> {
        use chrono::Datelike;

        let rules = AvailabilityRepository::new(self.pool)
            .rules_for_weekday(date.weekday(), location.map(|l| l.id))
            .await?;
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let booked = BookingRepository::new(self.pool).booked_times(date).await?;
        Ok(open_slots(&rules, date, &booked))
    }

    /// Whether a calendar token is stored and still valid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the token cannot be read.
    #[instrument(skip(self))]
    pub async fn status(&self, now: DateTime<Utc>) -> Result<CalendarStatus, RepositoryError> {
        let token = OAuthTokenRepository::new(self.pool)
            .get(CALENDAR_PROVIDER)
            .await?;
        Ok(CalendarStatus::from_token(token.as_ref(), now))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use secrecy::SecretString;
    use stillwaters_core::OAuthTokenId;

    use super::*;

    fn token(expires_at: Option<DateTime<Utc>>) -> OAuthToken {
        OAuthToken {
            id: OAuthTokenId::new(1),
            provider: CALENDAR_PROVIDER.to_string(),
            access_token: SecretString::from("ya29.token"),
            refresh_token: None,
            expires_at,
            scope: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn status_without_token_is_disconnected() {
        let status = CalendarStatus::from_token(None, Utc::now());
        assert!(!status.connected);
        assert!(!status.expired);
        assert!(!status.sync_enabled);
    }

    #[test]
    fn status_reports_expiry() {
        let now = Utc::now();
        let live = token(Some(now + TimeDelta::hours(1)));
        let stale = token(Some(now - TimeDelta::minutes(1)));

        let status = CalendarStatus::from_token(Some(&live), now);
        assert!(status.connected);
        assert!(!status.expired);

        assert!(CalendarStatus::from_token(Some(&stale), now).expired);
    }

    #[test]
    fn status_serializes_camel_case() {
        let value = serde_json::to_value(CalendarStatus::from_token(None, Utc::now()))
            .unwrap_or_default();
        assert_eq!(value["provider"], "google");
        assert_eq!(value["syncEnabled"], false);
    }
}
