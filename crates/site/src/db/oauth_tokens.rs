//! Calendar OAuth token repository.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::instrument;

use stillwaters_core::OAuthTokenId;

use super::RepositoryError;
use crate::models::{NewOAuthToken, OAuthToken};

#[derive(sqlx::FromRow)]
struct OAuthTokenRow {
    id: i32,
    provider: String,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    scope: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<OAuthTokenRow> for OAuthToken {
    fn from(row: OAuthTokenRow) -> Self {
        Self {
            id: OAuthTokenId::new(row.id),
            provider: row.provider,
            access_token: SecretString::from(row.access_token),
            refresh_token: row.refresh_token.map(SecretString::from),
            expires_at: row.expires_at,
            scope: row.scope,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for calendar provider credentials.
pub struct OAuthTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OAuthTokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store the token for a provider, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    #[instrument(skip(self, token), fields(provider = %token.provider))]
    pub async fn upsert(&self, token: &NewOAuthToken) -> Result<OAuthToken, RepositoryError> {
        let row: OAuthTokenRow = sqlx::query_as(
            "INSERT INTO practice.oauth_token \
                 (provider, access_token, refresh_token, expires_at, scope) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (provider) DO UPDATE SET \
                 access_token = EXCLUDED.access_token, \
                 refresh_token = EXCLUDED.refresh_token, \
                 expires_at = EXCLUDED.expires_at, \
                 scope = EXCLUDED.scope, \
                 updated_at = now() \
             RETURNING id, provider, access_token, refresh_token, expires_at, scope, updated_at",
        )
        .bind(&token.provider)
        .bind(token.access_token.expose_secret())
        .bind(token.refresh_token.as_ref().map(|t| t.expose_secret()))
        .bind(token.expires_at)
        .bind(token.scope.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// The stored token for a provider, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, provider: &str) -> Result<Option<OAuthToken>, RepositoryError> {
        let row: Option<OAuthTokenRow> = sqlx::query_as(
            "SELECT id, provider, access_token, refresh_token, expires_at, scope, updated_at \
             FROM practice.oauth_token WHERE provider = $1",
        )
        .bind(provider)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(OAuthToken::from))
    }
}
