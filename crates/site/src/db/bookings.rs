//! Booking repository.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use stillwaters_core::{
    BookingId, BookingStatus, Email, PersonalDetails, ServiceSnapshot, TimeSlot, ValidBooking,
};

use super::RepositoryError;
use crate::models::Booking;

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i32,
    service: Json<ServiceSnapshot>,
    appointment_date: NaiveDate,
    appointment_time: NaiveTime,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    has_referral: bool,
    notes: Option<String>,
    location_slug: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let status = row
            .status
            .parse::<BookingStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: BookingId::new(row.id),
            service: row.service.0,
            date: row.appointment_date,
            time: TimeSlot::from_time(row.appointment_time),
            personal_details: PersonalDetails {
                first_name: row.first_name,
                last_name: row.last_name,
                email,
                phone: row.phone,
                has_referral: row.has_referral,
                notes: row.notes,
            },
            location: row.location_slug,
            status,
            created_at: row.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, service, appointment_date, appointment_time, first_name, \
     last_name, email, phone, has_referral, notes, location_slug, status, created_at";

/// Repository for booking requests.
pub struct BookingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookingRepository<'a> {
    /// Create a new booking repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a validated booking as `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slot already holds a live
    /// booking, `RepositoryError::Database` for other failures.
    #[instrument(skip(self, booking), fields(service = %booking.service.id, date = %booking.date))]
    pub async fn insert(&self, booking: &ValidBooking) -> Result<Booking, RepositoryError> {
        let details = &booking.personal_details;
        let sql = format!(
            "INSERT INTO practice.booking \
                 (service, appointment_date, appointment_time, first_name, last_name, \
                  email, phone, has_referral, notes, location_slug, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let row: BookingRow = sqlx::query_as(&sql)
            .bind(Json(&booking.service))
            .bind(booking.date)
            .bind(booking.time.time())
            .bind(&details.first_name)
            .bind(&details.last_name)
            .bind(details.email.as_str())
            .bind(&details.phone)
            .bind(details.has_referral)
            .bind(details.notes.as_deref())
            .bind(booking.location.as_deref())
            .bind(BookingStatus::Pending.to_string())
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "that time has already been booked"))?;

        row.try_into()
    }

    /// Most recent bookings first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    #[instrument(skip(self))]
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Booking>, RepositoryError> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM practice.booking \
             ORDER BY created_at DESC, id DESC LIMIT $1"
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    /// Start times already held by live bookings on `date`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn booked_times(&self, date: NaiveDate) -> Result<Vec<TimeSlot>, RepositoryError> {
        let times: Vec<NaiveTime> = sqlx::query_scalar(
            "SELECT appointment_time FROM practice.booking \
             WHERE appointment_date = $1 AND status <> 'cancelled' \
             ORDER BY appointment_time",
        )
        .bind(date)
        .fetch_all(self.pool)
        .await?;

        Ok(times.into_iter().map(TimeSlot::from_time).collect())
    }
}
