//! Database operations for the practice `PostgreSQL` schema.
//!
//! ## Tables (schema `practice`)
//!
//! - `location` - Practice locations, upserted by slug from the CLI
//! - `availability` - Weekly bookable blocks per location
//! - `booking` - Booking requests (service snapshot stored as JSONB)
//! - `contact` - Contact enquiries (consent enforced by a `CHECK`)
//! - `oauth_token` - Calendar provider credentials, one row per provider
//!
//! Every operation is a single statement; nothing here opens a transaction.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/site/migrations/` and run via:
//! ```bash
//! cargo run -p stillwaters-cli -- migrate
//! ```

pub mod availability;
pub mod bookings;
pub mod contacts;
pub mod locations;
pub mod oauth_tokens;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use availability::AvailabilityRepository;
pub use bookings::BookingRepository;
pub use contacts::ContactRepository;
pub use locations::LocationRepository;
pub use oauth_tokens::OAuthTokenRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., a slot that is already booked).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_insert(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the bundled migrations against `pool`.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
