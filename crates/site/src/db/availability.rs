//! Availability rule repository.

use chrono::{NaiveTime, Weekday};
use sqlx::PgPool;
use tracing::instrument;

use stillwaters_core::location::{weekday_from_index, weekday_index};
use stillwaters_core::{AvailabilityId, AvailabilityRule, LocationId, NewAvailability};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct AvailabilityRow {
    id: i32,
    location_id: Option<i32>,
    weekday: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_minutes: i32,
    active: bool,
}

impl TryFrom<AvailabilityRow> for AvailabilityRule {
    type Error = RepositoryError;

    fn try_from(row: AvailabilityRow) -> Result<Self, Self::Error> {
        let weekday = weekday_from_index(row.weekday).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("invalid weekday: {}", row.weekday))
        })?;
        Ok(Self {
            id: AvailabilityId::new(row.id),
            location_id: row.location_id.map(LocationId::new),
            weekday,
            start_time: row.start_time,
            end_time: row.end_time,
            slot_minutes: row.slot_minutes,
            active: row.active,
        })
    }
}

/// Repository for weekly availability.
pub struct AvailabilityRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AvailabilityRepository<'a> {
    /// Create a new availability repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active rules for `weekday`.
    ///
    /// With a location, only that location's rules and practice-wide rules
    /// (no location) are returned; without one, every rule is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored weekday is invalid.
    #[instrument(skip(self))]
    pub async fn rules_for_weekday(
        &self,
        weekday: Weekday,
        location: Option<LocationId>,
    ) -> Result<Vec<AvailabilityRule>, RepositoryError> {
        let rows: Vec<AvailabilityRow> = sqlx::query_as(
            "SELECT id, location_id, weekday, start_time, end_time, slot_minutes, active \
             FROM practice.availability \
             WHERE active AND weekday = $1 \
               AND ($2::INTEGER IS NULL OR location_id IS NULL OR location_id = $2) \
             ORDER BY start_time",
        )
        .bind(weekday_index(weekday))
        .bind(location)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(AvailabilityRule::try_from).collect()
    }

    /// Replace every rule for a location with `blocks`.
    ///
    /// Runs as one statement, so readers see either the old rules or the new.
    /// Returns the number of rules written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    #[instrument(skip(self, blocks), fields(blocks = blocks.len()))]
    pub async fn replace_for_location(
        &self,
        location: LocationId,
        blocks: &[NewAvailability],
    ) -> Result<u64, RepositoryError> {
        let weekdays: Vec<i16> = blocks.iter().map(|b| weekday_index(b.weekday)).collect();
        let starts: Vec<NaiveTime> = blocks.iter().map(|b| b.start.time()).collect();
        let ends: Vec<NaiveTime> = blocks.iter().map(|b| b.end.time()).collect();
        let minutes: Vec<i32> = blocks.iter().map(|b| b.slot_minutes).collect();

        let result = sqlx::query(
            "WITH removed AS ( \
                 DELETE FROM practice.availability WHERE location_id = $1 \
             ) \
             INSERT INTO practice.availability \
                 (location_id, weekday, start_time, end_time, slot_minutes) \
             SELECT $1, t.weekday, t.start_time, t.end_time, t.slot_minutes \
             FROM UNNEST($2::SMALLINT[], $3::TIME[], $4::TIME[], $5::INTEGER[]) \
                 AS t(weekday, start_time, end_time, slot_minutes)",
        )
        .bind(location)
        .bind(&weekdays)
        .bind(&starts)
        .bind(&ends)
        .bind(&minutes)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
