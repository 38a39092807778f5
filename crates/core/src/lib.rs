//! Still Waters Core - Shared domain library.
//!
//! This crate provides the types used across all Still Waters components:
//! - `site` - Public website and JSON API
//! - `edge` - Offline-first caching proxy
//! - `cli` - Migrations and practice administration
//!
//! # Architecture
//!
//! The core crate contains only types, validation and the booking wizard
//! state machine - no I/O, no database access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, money, time slots and statuses
//! - [`validation`] - Field-level validation errors
//! - [`booking`] - Booking submissions and the multi-step wizard
//! - [`contact`] - Contact enquiries
//! - [`location`] - Practice locations and availability rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod booking;
pub mod contact;
pub mod location;
pub mod types;
pub mod validation;

pub use booking::wizard::{BookingWizard, Confirmation, WizardStep};
pub use booking::{
    BookingDraft, BookingSubmission, PersonalDetails, ServiceSnapshot, ValidBooking,
};
pub use contact::{ContactSubmission, ValidContact};
pub use location::{AvailabilityRule, NewAvailability, NewLocation, PracticeLocation};
pub use types::*;
pub use validation::{FieldError, ValidationErrors};
