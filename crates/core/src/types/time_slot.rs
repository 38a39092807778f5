//! Appointment start times.

use core::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TimeSlot`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeSlotError {
    #[error("time is required")]
    Empty,
    #[error("time must be in HH:MM format")]
    Format,
}

/// A wall-clock appointment start time with minute precision.
///
/// Parsed from and serialised as 24-hour `HH:MM`; displayed to visitors as
/// `9:00 AM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    /// Parse a `HH:MM` string.
    ///
    /// # Errors
    ///
    /// Returns [`TimeSlotError`] if the string is empty or not a valid time.
    pub fn parse(s: &str) -> Result<Self, TimeSlotError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TimeSlotError::Empty);
        }
        NaiveTime::parse_from_str(s, "%H:%M")
            .map(Self)
            .map_err(|_| TimeSlotError::Format)
    }

    /// Build a slot from a time, dropping seconds.
    #[must_use]
    pub fn from_time(time: NaiveTime) -> Self {
        Self(time.with_second(0).unwrap_or(time).with_nanosecond(0).unwrap_or(time))
    }

    /// The slot as a time of day.
    #[must_use]
    pub const fn time(&self) -> NaiveTime {
        self.0
    }

    /// 24-hour `HH:MM` form used on the wire and in storage.
    #[must_use]
    pub fn to_hhmm(&self) -> String {
        self.0.format("%H:%M").to_string()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%-I:%M %p"))
    }
}

impl std::str::FromStr for TimeSlot {
    type Err = TimeSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = TimeSlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.to_hhmm()
    }
}
