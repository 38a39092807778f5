//! Calendar credential commands.
//!
//! ```bash
//! sw-cli calendar set-token --access-token ya29... --refresh-token 1//0g... --expires-in 3599
//! ```
//!
//! Tokens are checked for placeholder text and low entropy before they are
//! stored, so a pasted example value fails loudly here instead of at the
//! calendar provider.

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;

use stillwaters_site::config::validate_secret_strength;
use stillwaters_site::db::OAuthTokenRepository;
use stillwaters_site::models::NewOAuthToken;

use super::{CliError, connect};

/// Arguments of `calendar set-token`.
pub struct TokenArgs {
    pub provider: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

/// Check the arguments and build the token to store.
pub fn build_token(args: TokenArgs, now: DateTime<Utc>) -> Result<NewOAuthToken, CliError> {
    let provider = args.provider.trim().to_lowercase();
    if provider.is_empty() {
        return Err(CliError::InvalidArgument("--provider must not be empty".to_string()));
    }

    validate_secret_strength(&args.access_token, "--access-token")?;
    if let Some(refresh) = &args.refresh_token {
        validate_secret_strength(refresh, "--refresh-token")?;
    }

    let expires_at = match args.expires_in {
        Some(secs) if secs <= 0 => {
            return Err(CliError::InvalidArgument(
                "--expires-in must be a positive number of seconds".to_string(),
            ));
        }
        Some(secs) => Some(now + TimeDelta::seconds(secs)),
        None => None,
    };

    Ok(NewOAuthToken {
        provider,
        access_token: SecretString::from(args.access_token),
        refresh_token: args.refresh_token.map(SecretString::from),
        expires_at,
        scope: args.scope.filter(|s| !s.trim().is_empty()),
    })
}

/// Store an OAuth token for a calendar provider.
pub async fn set_token(args: TokenArgs) -> Result<(), CliError> {
    let token = build_token(args, Utc::now())?;

    let pool = connect().await?;
    let stored = OAuthTokenRepository::new(&pool).upsert(&token).await?;

    tracing::info!(
        provider = %stored.provider,
        expires_at = ?stored.expires_at,
        "Calendar token stored"
    );
    Ok(())
}
