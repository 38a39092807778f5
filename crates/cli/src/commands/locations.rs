//! Practice location commands.
//!
//! The import file is a YAML list of locations, each optionally carrying its
//! weekly availability. Availability listed for a location replaces whatever
//! it had; a location without an `availability` key keeps its rules.
//!
//! ```yaml
//! - slug: north-hobart
//!   name: North Hobart
//!   addressLine: 12 Elizabeth St
//!   suburb: North Hobart
//!   state: TAS
//!   postcode: "7000"
//!   latitude: -42.8745
//!   longitude: 147.3125
//!   availability:
//!     - { weekday: Tue, start: "09:00", end: "17:00" }
//!     - { weekday: Thu, start: "12:00", end: "20:00", slotMinutes: 90 }
//! - slug: telehealth
//!   name: Telehealth
//!   isTelehealth: true
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use stillwaters_core::{NewAvailability, NewLocation};
use stillwaters_site::db::{AvailabilityRepository, LocationRepository, RepositoryError};

use super::{CliError, connect};

/// One entry of an import file.
#[derive(Debug, Deserialize)]
pub struct LocationImport {
    #[serde(flatten)]
    pub location: NewLocation,
    #[serde(default)]
    pub availability: Option<Vec<NewAvailability>>,
}

/// Parse an import file without touching the database.
pub fn parse_import(content: &str) -> Result<Vec<LocationImport>, CliError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Every problem in an import, as `slug: message` lines.
pub fn validate_import(entries: &[LocationImport]) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for entry in entries {
        let slug = entry.location.slug.as_str();
        if !seen.insert(slug) {
            problems.push(format!("{slug}: duplicate slug"));
        }
        if let Err(errors) = entry.location.validate() {
            problems.push(format!("{slug}: {errors}"));
        }
        for (i, block) in entry.availability.iter().flatten().enumerate() {
            if let Err(errors) = block.validate() {
                problems.push(format!("{slug}: availability[{i}]: {errors}"));
            }
        }
    }
    problems
}

/// Upsert every location in `file`, then replace listed availability.
pub async fn import(file: &Path) -> Result<(), CliError> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| CliError::Io {
            path: file.display().to_string(),
            source,
        })?;

    // Validate everything before connecting
    let entries = parse_import(&content)?;
    let problems = validate_import(&entries);
    if !problems.is_empty() {
        error!("Import validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(CliError::InvalidImport {
            count: problems.len(),
        });
    }
    info!(locations = entries.len(), "Import file validated");

    let pool = connect().await?;
    let locations = LocationRepository::new(&pool);
    let availability = AvailabilityRepository::new(&pool);

    for entry in &entries {
        let stored = locations.upsert(&entry.location).await?;
        info!(slug = %stored.slug, id = %stored.id, "Location upserted");

        if let Some(blocks) = &entry.availability {
            let written = availability.replace_for_location(stored.id, blocks).await?;
            info!(slug = %stored.slug, rules = written, "Availability replaced");
        }
    }

    info!("Import complete!");
    Ok(())
}

/// Print every location.
pub async fn list() -> Result<(), CliError> {
    let pool = connect().await?;
    let locations = LocationRepository::new(&pool).list_all().await?;

    #[allow(clippy::print_stdout)]
    {
        if locations.is_empty() {
            println!("No locations. Import some with `sw-cli locations import <file>`.");
        }
        for location in &locations {
            let status = if location.active { "active" } else { "inactive" };
            let place = if location.is_telehealth {
                "telehealth".to_string()
            } else {
                location.full_address()
            };
            println!("{:<20} {:<9} {} - {place}", location.slug, status, location.name);
        }
    }
    Ok(())
}

/// Hide a location from the site.
pub async fn deactivate(slug: &str) -> Result<(), CliError> {
    let pool = connect().await?;
    match LocationRepository::new(&pool).deactivate(slug).await {
        Ok(()) => {
            info!(slug, "Location deactivated");
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(CliError::UnknownLocation(slug.to_string())),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Weekday;

    use super::*;

    const IMPORT: &str = r#"
- slug: north-hobart
  name: North Hobart
  addressLine: 12 Elizabeth St
  suburb: North Hobart
  state: TAS
  postcode: "7000"
  latitude: -42.8745
  longitude: 147.3125
  availability:
    - { weekday: Tue, start: "09:00", end: "17:00" }
    - { weekday: Thu, start: "12:00", end: "20:00", slotMinutes: 90 }
- slug: telehealth
  name: Telehealth
  isTelehealth: true
"#;

    #[test]
    fn parses_locations_with_availability() {
        let entries = parse_import(IMPORT).unwrap();
        assert_eq!(entries.len(), 2);

        let north = &entries[0];
        assert_eq!(north.location.slug, "north-hobart");
        assert_eq!(north.location.postcode, "7000");
        let blocks = north.availability.as_ref().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].weekday, Weekday::Tue);
        assert_eq!(blocks[0].slot_minutes, 60);
        assert_eq!(blocks[1].slot_minutes, 90);

        let telehealth = &entries[1];
        assert!(telehealth.location.is_telehealth);
        assert!(telehealth.availability.is_none());

        assert!(validate_import(&entries).is_empty());
    }

    #[test]
    fn reports_every_problem() {
        let entries = parse_import(
            r#"
- slug: Sandy Bay
  name: Sandy Bay
  addressLine: 1 Sandy Bay Rd
  suburb: Sandy Bay
  state: TAS
  postcode: "7005"
  availability:
    - { weekday: Mon, start: "17:00", end: "09:00" }
- slug: telehealth
  name: Telehealth
  isTelehealth: true
- slug: telehealth
  name: Telehealth again
  isTelehealth: true
"#,
        )
        .unwrap();

        let problems = validate_import(&entries);
        assert_eq!(problems.len(), 3, "{problems:?}");
        assert!(problems[0].starts_with("Sandy Bay: "));
        assert!(problems[1].contains("availability[0]"));
        assert_eq!(problems[2], "telehealth: duplicate slug");
    }

    #[test]
    fn bad_times_fail_to_parse() {
        let result = parse_import(
            r#"
- slug: telehealth
  name: Telehealth
  isTelehealth: true
  availability:
    - { weekday: Mon, start: "9am", end: "17:00" }
"#,
        );
        assert!(matches!(result, Err(CliError::Yaml(_))));
    }
}
