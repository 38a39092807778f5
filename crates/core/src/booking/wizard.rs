//! Multi-step booking wizard.
//!
//! ```text
//! ServiceSelection(0) -> DateTime(1) -> PersonalDetails(2) -> Confirmation(3)
//! ```
//!
//! Steps are strictly linear. `next` and `back` clamp at the ends. The
//! Confirmation step is guarded: entering it with any part of the draft
//! missing drops the wizard back to PersonalDetails, so a hand-edited step
//! index can never render a partial confirmation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookingDraft, BookingSubmission, PersonalDetails, ServiceSnapshot};
use crate::types::TimeSlot;

/// A step of the booking wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    #[default]
    ServiceSelection,
    DateTime,
    PersonalDetails,
    Confirmation,
}

impl WizardStep {
    pub const FIRST: Self = Self::ServiceSelection;
    pub const LAST: Self = Self::Confirmation;

    /// Zero-based position of the step.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::ServiceSelection => 0,
            Self::DateTime => 1,
            Self::PersonalDetails => 2,
            Self::Confirmation => 3,
        }
    }

    /// Step at `index`, clamped to the last step.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => Self::ServiceSelection,
            1 => Self::DateTime,
            2 => Self::PersonalDetails,
            _ => Self::Confirmation,
        }
    }

    /// The following step, or `self` at the end.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// The preceding step, or `self` at the start.
    #[must_use]
    pub const fn previous(self) -> Self {
        Self::from_index(self.index().saturating_sub(1))
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ServiceSelection => "Choose a service",
            Self::DateTime => "Pick a date and time",
            Self::PersonalDetails => "Your details",
            Self::Confirmation => "Confirm your booking",
        }
    }
}

/// State of one visitor's booking wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWizard {
    step: WizardStep,
    draft: BookingDraft,
}

impl BookingWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a wizard from stored parts, applying the confirmation guard.
    #[must_use]
    pub fn restore(step: WizardStep, draft: BookingDraft) -> Self {
        let mut wizard = Self { step, draft };
        wizard.guard_confirmation();
        wizard
    }

    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub const fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Advance one step, clamping at Confirmation.
    pub fn next(&mut self) {
        self.step = self.step.next();
        self.guard_confirmation();
    }

    /// Go back one step, clamping at ServiceSelection.
    pub fn back(&mut self) {
        self.step = self.step.previous();
    }

    /// Jump straight to a step index, as a `?step=N` URL would.
    pub fn go_to(&mut self, index: usize) {
        self.step = WizardStep::from_index(index);
        self.guard_confirmation();
    }

    /// Record the chosen service; auto-advances from the first step.
    pub fn select_service(&mut self, service: ServiceSnapshot) {
        self.draft.service = Some(service);
        if self.step == WizardStep::ServiceSelection {
            self.next();
        }
    }

    pub fn set_date_time(&mut self, date: NaiveDate, time: TimeSlot) {
        self.draft.date = Some(date);
        self.draft.time = Some(time);
    }

    pub fn set_personal_details(&mut self, details: PersonalDetails) {
        self.draft.personal_details = Some(details);
    }

    /// The complete booking for rendering, only at the Confirmation step.
    #[must_use]
    pub fn confirmation(&self) -> Option<Confirmation<'_>> {
        if self.step != WizardStep::Confirmation {
            return None;
        }
        Some(Confirmation {
            service: self.draft.service.as_ref()?,
            date: self.draft.date?,
            time: self.draft.time?,
            personal_details: self.draft.personal_details.as_ref()?,
        })
    }

    /// The submission shape of a confirmed draft.
    #[must_use]
    pub fn to_submission(&self, location: Option<String>) -> Option<BookingSubmission> {
        self.confirmation()?;
        self.draft.to_submission(location)
    }

    /// Discard the draft and return to the first step.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn guard_confirmation(&mut self) {
        if self.step == WizardStep::Confirmation && !self.draft.is_complete() {
            self.step = WizardStep::Confirmation.previous();
        }
    }
}

/// Every part of a booking, borrowed for the confirmation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation<'a> {
    pub service: &'a ServiceSnapshot,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub personal_details: &'a PersonalDetails,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::booking::tests::{details, service};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 14).unwrap()
    }

    fn slot() -> TimeSlot {
        TimeSlot::parse("11:00").unwrap()
    }

    fn complete_wizard() -> BookingWizard {
        let mut wizard = BookingWizard::new();
        wizard.select_service(service());
        wizard.set_date_time(date(), slot());
        wizard.next();
        wizard.set_personal_details(details());
        wizard.next();
        wizard
    }

    #[test]
    fn step_indices_are_linear() {
        for i in 0..4 {
            assert_eq!(WizardStep::from_index(i).index(), i);
        }
        assert_eq!(WizardStep::from_index(99), WizardStep::LAST);
    }

    #[test]
    fn back_clamps_at_first_step() {
        let mut wizard = BookingWizard::new();
        wizard.back();
        wizard.back();
        assert_eq!(wizard.step(), WizardStep::FIRST);
    }

    #[test]
    fn next_clamps_at_last_step() {
        let mut wizard = complete_wizard();
        assert_eq!(wizard.step(), WizardStep::Confirmation);
        wizard.next();
        assert_eq!(wizard.step(), WizardStep::Confirmation);
    }

    #[test]
    fn selecting_a_service_auto_advances_from_first_step() {
        let mut wizard = BookingWizard::new();
        wizard.select_service(service());
        assert_eq!(wizard.step(), WizardStep::DateTime);
    }

    #[test]
    fn selecting_a_service_later_does_not_advance() {
        let mut wizard = BookingWizard::new();
        wizard.select_service(service());
        wizard.next();
        assert_eq!(wizard.step(), WizardStep::PersonalDetails);
        wizard.select_service(service());
        assert_eq!(wizard.step(), WizardStep::PersonalDetails);
    }

    #[test]
    fn confirmation_with_missing_parts_regresses() {
        // Every single missing part must bounce the wizard back.
        let strip: [fn(&mut BookingDraft); 4] = [
            |d| d.service = None,
            |d| d.date = None,
            |d| d.time = None,
            |d| d.personal_details = None,
        ];
        for remove in strip {
            let mut draft = complete_wizard().draft().clone();
            remove(&mut draft);
            let mut wizard = BookingWizard::restore(WizardStep::PersonalDetails, draft);
            wizard.go_to(3);
            assert_eq!(wizard.step(), WizardStep::PersonalDetails);
            assert!(wizard.confirmation().is_none());
        }
    }

    #[test]
    fn next_into_confirmation_is_guarded() {
        let mut wizard = BookingWizard::new();
        wizard.select_service(service());
        wizard.next();
        wizard.next();
        assert_eq!(wizard.step(), WizardStep::PersonalDetails);
    }

    #[test]
    fn restore_applies_guard() {
        let wizard = BookingWizard::restore(WizardStep::Confirmation, BookingDraft::default());
        assert_eq!(wizard.step(), WizardStep::PersonalDetails);
    }

    #[test]
    fn complete_wizard_renders_confirmation() {
        let wizard = complete_wizard();
        let confirmation = wizard.confirmation().unwrap();
        assert_eq!(confirmation.service.id, "individual-50");
        assert_eq!(confirmation.date, date());
        assert_eq!(confirmation.time, slot());
        assert_eq!(confirmation.personal_details.first_name, "Alex");
    }

    #[test]
    fn confirmation_only_at_last_step() {
        let mut wizard = complete_wizard();
        wizard.back();
        assert!(wizard.confirmation().is_none());
        assert!(wizard.to_submission(None).is_none());
        wizard.go_to(3);
        assert!(wizard.to_submission(None).is_some());
    }

    #[test]
    fn reset_discards_everything() {
        let mut wizard = complete_wizard();
        wizard.reset();
        assert_eq!(wizard, BookingWizard::new());
    }

    #[test]
    fn survives_serde_round_trip() {
        let wizard = complete_wizard();
        let json = serde_json::to_string(&wizard).unwrap();
        let restored: BookingWizard = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, wizard);
    }
}
