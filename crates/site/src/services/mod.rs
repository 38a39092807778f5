//! Services layered over the repositories.
//!
//! - [`LocationDirectory`] - active practice locations behind a `moka` cache
//! - [`CalendarService`] - open appointment slots and calendar token status

pub mod calendar;
pub mod locations;

pub use calendar::{CalendarService, CalendarStatus};
pub use locations::LocationDirectory;
