//! Still Waters Counselling CLI - migrations and practice management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sw-cli migrate
//!
//! # Import locations (and their weekly availability) from YAML
//! sw-cli locations import locations.yaml
//! sw-cli locations list
//! sw-cli locations deactivate sandy-bay
//!
//! # Store calendar credentials
//! sw-cli calendar set-token --provider google --access-token ya29... --expires-in 3600
//!
//! # Review recent submissions
//! sw-cli bookings recent --limit 20
//! sw-cli contacts recent
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stillwaters_site::services::calendar::CALENDAR_PROVIDER;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "sw-cli")]
#[command(author, version, about = "Still Waters Counselling CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage practice locations
    Locations {
        #[command(subcommand)]
        action: LocationAction,
    },
    /// Manage calendar provider credentials
    Calendar {
        #[command(subcommand)]
        action: CalendarAction,
    },
    /// Review booking requests
    Bookings {
        #[command(subcommand)]
        action: RecentAction,
    },
    /// Review contact enquiries
    Contacts {
        #[command(subcommand)]
        action: RecentAction,
    },
}

#[derive(Subcommand)]
enum LocationAction {
    /// Upsert locations by slug from a YAML file
    Import {
        /// Path to the YAML file
        file: PathBuf,
    },
    /// List every location, active or not
    List,
    /// Hide a location from the site
    Deactivate {
        /// Location slug
        slug: String,
    },
}

#[derive(Subcommand)]
enum CalendarAction {
    /// Store an OAuth token, replacing any previous one for the provider
    SetToken {
        /// Calendar provider
        #[arg(long, default_value = CALENDAR_PROVIDER)]
        provider: String,

        /// OAuth access token
        #[arg(long)]
        access_token: String,

        /// OAuth refresh token
        #[arg(long)]
        refresh_token: Option<String>,

        /// Seconds until the access token expires
        #[arg(long)]
        expires_in: Option<i64>,

        /// Granted scopes
        #[arg(long)]
        scope: Option<String>,
    },
}

#[derive(Subcommand)]
enum RecentAction {
    /// Show the newest records first
    Recent {
        /// Maximum number of records
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Locations { action } => match action {
            LocationAction::Import { file } => commands::locations::import(&file).await?,
            LocationAction::List => commands::locations::list().await?,
            LocationAction::Deactivate { slug } => commands::locations::deactivate(&slug).await?,
        },
        Commands::Calendar { action } => match action {
            CalendarAction::SetToken {
                provider,
                access_token,
                refresh_token,
                expires_in,
                scope,
            } => {
                commands::calendar::set_token(commands::calendar::TokenArgs {
                    provider,
                    access_token,
                    refresh_token,
                    expires_in,
                    scope,
                })
                .await?;
            }
        },
        Commands::Bookings {
            action: RecentAction::Recent { limit },
        } => commands::records::recent_bookings(limit).await?,
        Commands::Contacts {
            action: RecentAction::Recent { limit },
        } => commands::records::recent_contacts(limit).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn set_token_defaults_to_google() {
        let cli = Cli::try_parse_from([
            "sw-cli",
            "calendar",
            "set-token",
            "--access-token",
            "ya29.token",
            "--expires-in",
            "3600",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Calendar {
            action:
                CalendarAction::SetToken {
                    provider,
                    expires_in,
                    refresh_token,
                    ..
                },
        } = cli.command
        else {
            panic!("expected calendar command");
        };
        assert_eq!(provider, "google");
        assert_eq!(expires_in, Some(3600));
        assert!(refresh_token.is_none());
    }

    #[test]
    fn recent_limit_has_a_default() {
        let cli = Cli::try_parse_from(["sw-cli", "bookings", "recent"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Bookings {
                action: RecentAction::Recent { limit: 20 }
            }
        ));
    }
}
