//! Core value types for Still Waters.

pub mod email;
pub mod id;
pub mod money;
pub mod status;
pub mod time_slot;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;
pub use time_slot::{TimeSlot, TimeSlotError};
