//! Practice locations and their weekly availability.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::{AvailabilityId, LocationId, TimeSlot};
use crate::validation::ValidationErrors;

/// Australian states and territories accepted in addresses.
pub const STATES: [&str; 8] = ["ACT", "NSW", "NT", "QLD", "SA", "TAS", "VIC", "WA"];

/// A place where sessions are held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeLocation {
    pub id: LocationId,
    pub slug: String,
    pub name: String,
    pub address_line: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Sessions held by video rather than in rooms.
    pub is_telehealth: bool,
    pub active: bool,
}

impl PracticeLocation {
    /// Single-line postal address, e.g. `12 Elizabeth St, Hobart TAS 7000`.
    #[must_use]
    pub fn full_address(&self) -> String {
        let locality = format!("{} {} {}", self.suburb, self.state, self.postcode);
        let locality = locality.trim();
        match (self.address_line.trim(), locality) {
            ("", l) => l.to_owned(),
            (a, "") => a.to_owned(),
            (a, l) => format!("{a}, {l}"),
        }
    }

    /// Latitude and longitude, when both are known.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// A location as written in an import file, keyed by slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub address_line: String,
    #[serde(default)]
    pub suburb: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_telehealth: bool,
}

impl NewLocation {
    /// Check the record before it is upserted.
    ///
    /// Telehealth locations need no street address.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !is_slug(&self.slug) {
            errors.push("slug", "must be lowercase letters, digits and dashes");
        }
        errors.required("name", &self.name, 100);

        if !self.is_telehealth {
            errors.required("addressLine", &self.address_line, 200);
            errors.required("suburb", &self.suburb, 100);
            if !STATES.contains(&self.state.as_str()) {
                errors.push("state", "must be an Australian state or territory");
            }
            let postcode = self.postcode.trim();
            if postcode.len() != 4 || !postcode.bytes().all(|b| b.is_ascii_digit()) {
                errors.push("postcode", "must be four digits");
            }
        }

        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    errors.push("latitude", "must be between -90 and 90");
                }
                if !(-180.0..=180.0).contains(&lng) {
                    errors.push("longitude", "must be between -180 and 180");
                }
            }
            (None, None) => {}
            _ => errors.push("latitude", "latitude and longitude must be given together"),
        }

        errors.finish(|| Some(()))
    }
}

fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// A recurring weekly block of bookable time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRule {
    pub id: AvailabilityId,
    /// `None` applies to every location.
    pub location_id: Option<LocationId>,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: i32,
    pub active: bool,
}

impl AvailabilityRule {
    /// Whether the rule covers `date`.
    #[must_use]
    pub fn applies_to(&self, date: NaiveDate) -> bool {
        self.active && self.weekday == date.weekday()
    }

    /// Start times of every whole slot that fits between start and end.
    #[must_use]
    pub fn slots(&self) -> Vec<TimeSlot> {
        if self.slot_minutes <= 0 {
            return Vec::new();
        }
        let step = TimeDelta::minutes(i64::from(self.slot_minutes));
        let mut slots = Vec::new();
        let mut start = self.start_time;
        loop {
            let (end, wrapped) = start.overflowing_add_signed(step);
            if wrapped != 0 || end > self.end_time {
                break;
            }
            slots.push(TimeSlot::from_time(start));
            start = end;
        }
        slots
    }
}

const fn default_slot_minutes() -> i32 {
    60
}

/// A weekly block as written in an import file.
///
/// ```yaml
/// - weekday: Tue
///   start: "09:00"
///   end: "17:00"
///   slotMinutes: 60
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAvailability {
    pub weekday: Weekday,
    pub start: TimeSlot,
    pub end: TimeSlot,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: i32,
}

impl NewAvailability {
    /// # Errors
    ///
    /// Returns every violated constraint.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.start >= self.end {
            errors.push("end", "must be after start");
        }
        if !(5..=240).contains(&self.slot_minutes) {
            errors.push("slotMinutes", "must be between 5 and 240");
        }
        errors.finish(|| Some(()))
    }
}

/// Weekday stored as `0 = Monday .. 6 = Sunday`.
#[must_use]
pub fn weekday_from_index(index: i16) -> Option<Weekday> {
    Some(match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        6 => Weekday::Sun,
        _ => return None,
    })
}

/// Inverse of [`weekday_from_index`].
#[must_use]
pub fn weekday_index(weekday: Weekday) -> i16 {
    // num_days_from_monday is always < 7
    i16::try_from(weekday.num_days_from_monday()).unwrap_or_default()
}

/// Open slots on `date`: every slot of every applicable rule, minus those
/// already booked, sorted and de-duplicated.
#[must_use]
pub fn open_slots(rules: &[AvailabilityRule], date: NaiveDate, booked: &[TimeSlot]) -> Vec<TimeSlot> {
    let booked: BTreeSet<_> = booked.iter().collect();
    rules
        .iter()
        .filter(|rule| rule.applies_to(date))
        .flat_map(AvailabilityRule::slots)
        .filter(|slot| !booked.contains(slot))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn rule(weekday: Weekday, start: NaiveTime, end: NaiveTime, minutes: i32) -> AvailabilityRule {
        AvailabilityRule {
            id: AvailabilityId::new(1),
            location_id: None,
            weekday,
            start_time: start,
            end_time: end,
            slot_minutes: minutes,
            active: true,
        }
    }

    fn hhmm(slots: &[TimeSlot]) -> Vec<String> {
        slots.iter().map(TimeSlot::to_hhmm).collect()
    }

    fn new_location() -> NewLocation {
        NewLocation {
            slug: "north-hobart".to_string(),
            name: "North Hobart".to_string(),
            address_line: "12 Elizabeth St".to_string(),
            suburb: "North Hobart".to_string(),
            state: "TAS".to_string(),
            postcode: "7000".to_string(),
            phone: None,
            latitude: Some(-42.87),
            longitude: Some(147.31),
            is_telehealth: false,
        }
    }

    #[test]
    fn slots_fit_inside_the_window() {
        let r = rule(Weekday::Tue, time(9, 0), time(12, 30), 60);
        assert_eq!(hhmm(&r.slots()), ["09:00", "10:00", "11:00"]);
    }

    #[test]
    fn zero_length_slots_yield_nothing() {
        let r = rule(Weekday::Tue, time(9, 0), time(17, 0), 0);
        assert!(r.slots().is_empty());
    }

    #[test]
    fn slots_never_wrap_past_midnight() {
        let r = rule(Weekday::Fri, time(22, 0), time(23, 59), 60);
        assert_eq!(hhmm(&r.slots()), ["22:00"]);
    }

    #[test]
    fn open_slots_merge_rules_and_drop_bookings() {
        // 2026-03-10 is a Tuesday
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let rules = [
            rule(Weekday::Tue, time(9, 0), time(11, 0), 60),
            rule(Weekday::Tue, time(10, 0), time(12, 0), 60),
            rule(Weekday::Wed, time(9, 0), time(17, 0), 60),
        ];
        let booked = [TimeSlot::parse("10:00").unwrap()];
        assert_eq!(hhmm(&open_slots(&rules, date, &booked)), ["09:00", "11:00"]);
    }

    #[test]
    fn inactive_rules_are_ignored() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let mut r = rule(Weekday::Tue, time(9, 0), time(10, 0), 60);
        r.active = false;
        assert!(open_slots(&[r], date, &[]).is_empty());
    }

    #[test]
    fn weekday_indices_start_on_monday() {
        assert_eq!(weekday_from_index(0), Some(Weekday::Mon));
        assert_eq!(weekday_from_index(6), Some(Weekday::Sun));
        assert_eq!(weekday_from_index(7), None);
        assert_eq!(weekday_from_index(-1), None);
        assert_eq!(weekday_index(Weekday::Sun), 6);
    }

    #[test]
    fn full_address_joins_parts() {
        let location = PracticeLocation {
            id: LocationId::new(1),
            slug: "telehealth".to_string(),
            name: "Telehealth".to_string(),
            address_line: String::new(),
            suburb: String::new(),
            state: String::new(),
            postcode: String::new(),
            phone: None,
            latitude: None,
            longitude: None,
            is_telehealth: true,
            active: true,
        };
        assert_eq!(location.full_address(), "");
        let located = PracticeLocation {
            address_line: "12 Elizabeth St".to_string(),
            suburb: "Hobart".to_string(),
            state: "TAS".to_string(),
            postcode: "7000".to_string(),
            ..location
        };
        assert_eq!(located.full_address(), "12 Elizabeth St, Hobart TAS 7000");
    }

    #[test]
    fn new_location_validation() {
        assert!(new_location().validate().is_ok());

        let mut bad = new_location();
        bad.slug = "North Hobart".to_string();
        bad.postcode = "70".to_string();
        bad.longitude = None;
        let errors = bad.validate().unwrap_err();
        assert!(errors.has("slug"));
        assert!(errors.has("postcode"));
        assert!(errors.has("latitude"));
    }

    #[test]
    fn telehealth_needs_no_address() {
        let telehealth = NewLocation {
            slug: "telehealth".to_string(),
            name: "Telehealth".to_string(),
            address_line: String::new(),
            suburb: String::new(),
            state: String::new(),
            postcode: String::new(),
            phone: None,
            latitude: None,
            longitude: None,
            is_telehealth: true,
        };
        assert!(telehealth.validate().is_ok());
    }

    #[test]
    fn availability_blocks_parse_and_validate() {
        let block: NewAvailability = serde_json::from_value(serde_json::json!({
            "weekday": "Tue",
            "start": "09:00",
            "end": "12:30",
        }))
        .unwrap();
        assert_eq!(block.weekday, Weekday::Tue);
        assert_eq!(block.slot_minutes, 60);
        assert!(block.validate().is_ok());

        let backwards = NewAvailability {
            start: TimeSlot::parse("17:00").unwrap(),
            end: TimeSlot::parse("09:00").unwrap(),
            slot_minutes: 0,
            ..block
        };
        let errors = backwards.validate().unwrap_err();
        assert!(errors.has("end"));
        assert!(errors.has("slotMinutes"));
    }
}
