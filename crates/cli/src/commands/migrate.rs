//! Database migration command.
//!
//! ```bash
//! sw-cli migrate
//! ```
//!
//! Migrations live in `crates/site/migrations/` and are embedded at build time.

use super::{CliError, connect};

/// Run the site migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running site migrations...");
    stillwaters_site::db::run_migrations(&pool).await?;

    tracing::info!("Site migrations complete!");
    Ok(())
}
