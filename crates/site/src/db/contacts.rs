//! Contact enquiry repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use stillwaters_core::{ContactId, Email, EnquiryType, ValidContact};

use super::RepositoryError;
use crate::models::Contact;

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    enquiry_type: String,
    preferred_location: Option<String>,
    message: String,
    urgency: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = RepositoryError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let enquiry_type = row
            .enquiry_type
            .parse::<EnquiryType>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: ContactId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            phone: row.phone,
            enquiry_type,
            preferred_location: row.preferred_location,
            message: row.message,
            urgency: row.urgency,
            created_at: row.created_at,
        })
    }
}

const CONTACT_COLUMNS: &str = "id, first_name, last_name, email, phone, enquiry_type, \
     preferred_location, message, urgency, created_at";

/// Repository for contact enquiries.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a validated enquiry.
    ///
    /// Only a [`ValidContact`] can be stored, and the table's `CHECK` on
    /// `privacy_consent` rejects anything else that slips through.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, contact), fields(enquiry_type = %contact.enquiry_type))]
    pub async fn insert(&self, contact: &ValidContact) -> Result<Contact, RepositoryError> {
        let urgency = i16::try_from(contact.urgency).map_err(|_| {
            RepositoryError::DataCorruption(format!("urgency out of range: {}", contact.urgency))
        })?;
        let sql = format!(
            "INSERT INTO practice.contact \
                 (first_name, last_name, email, phone, enquiry_type, preferred_location, \
                  message, urgency, privacy_consent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {CONTACT_COLUMNS}"
        );
        let row: ContactRow = sqlx::query_as(&sql)
            .bind(&contact.first_name)
            .bind(&contact.last_name)
            .bind(contact.email.as_str())
            .bind(contact.phone.as_deref())
            .bind(contact.enquiry_type.as_str())
            .bind(contact.preferred_location.as_deref())
            .bind(&contact.message)
            .bind(urgency)
            .bind(contact.privacy_consent())
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// Most recent enquiries first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    #[instrument(skip(self))]
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Contact>, RepositoryError> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM practice.contact \
             ORDER BY created_at DESC, id DESC LIMIT $1"
        );
        let rows: Vec<ContactRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Contact::try_from).collect()
    }
}
