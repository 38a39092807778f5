//! Practice location repository.

use sqlx::PgPool;
use tracing::instrument;

use stillwaters_core::location::NewLocation;
use stillwaters_core::{LocationId, PracticeLocation};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct LocationRow {
    id: i32,
    slug: String,
    name: String,
    address_line: String,
    suburb: String,
    state: String,
    postcode: String,
    phone: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    is_telehealth: bool,
    active: bool,
}

impl From<LocationRow> for PracticeLocation {
    fn from(row: LocationRow) -> Self {
        Self {
            id: LocationId::new(row.id),
            slug: row.slug,
            name: row.name,
            address_line: row.address_line,
            suburb: row.suburb,
            state: row.state,
            postcode: row.postcode,
            phone: row.phone,
            latitude: row.latitude,
            longitude: row.longitude,
            is_telehealth: row.is_telehealth,
            active: row.active,
        }
    }
}

const LOCATION_COLUMNS: &str = "id, slug, name, address_line, suburb, state, postcode, phone, \
     latitude, longitude, is_telehealth, active";

/// Repository for practice locations.
pub struct LocationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LocationRepository<'a> {
    /// Create a new location repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active locations, in-person rooms before telehealth, then by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<PracticeLocation>, RepositoryError> {
        let sql = format!(
            "SELECT {LOCATION_COLUMNS} FROM practice.location \
             WHERE active ORDER BY is_telehealth, name"
        );
        let rows: Vec<LocationRow> = sqlx::query_as(&sql).fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(PracticeLocation::from).collect())
    }

    /// Every location, including deactivated ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<PracticeLocation>, RepositoryError> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM practice.location ORDER BY slug");
        let rows: Vec<LocationRow> = sqlx::query_as(&sql).fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(PracticeLocation::from).collect())
    }

    /// Look up a location by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<PracticeLocation>, RepositoryError> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM practice.location WHERE slug = $1");
        let row: Option<LocationRow> = sqlx::query_as(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(PracticeLocation::from))
    }

    /// Insert a location, or replace every field of the one with the same
    /// slug. Upserting reactivates a deactivated location.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    #[instrument(skip(self, location), fields(slug = %location.slug))]
    pub async fn upsert(&self, location: &NewLocation) -> Result<PracticeLocation, RepositoryError> {
        let sql = format!(
            "INSERT INTO practice.location \
                 (slug, name, address_line, suburb, state, postcode, phone, \
                  latitude, longitude, is_telehealth, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 address_line = EXCLUDED.address_line, \
                 suburb = EXCLUDED.suburb, \
                 state = EXCLUDED.state, \
                 postcode = EXCLUDED.postcode, \
                 phone = EXCLUDED.phone, \
                 latitude = EXCLUDED.latitude, \
                 longitude = EXCLUDED.longitude, \
                 is_telehealth = EXCLUDED.is_telehealth, \
                 active = TRUE, \
                 updated_at = now() \
             RETURNING {LOCATION_COLUMNS}"
        );
        let row: LocationRow = sqlx::query_as(&sql)
            .bind(location.slug.trim())
            .bind(location.name.trim())
            .bind(location.address_line.trim())
            .bind(location.suburb.trim())
            .bind(location.state.trim())
            .bind(location.postcode.trim())
            .bind(location.phone.as_deref().map(str::trim))
            .bind(location.latitude)
            .bind(location.longitude)
            .bind(location.is_telehealth)
            .fetch_one(self.pool)
            .await?;
        Ok(row.into())
    }

    /// Hide a location from the site without deleting it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no location has that slug.
    /// Returns `RepositoryError::Database` if the statement fails.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, slug: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE practice.location SET active = FALSE, updated_at = now() WHERE slug = $1",
        )
        .bind(slug)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
