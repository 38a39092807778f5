//! Australian dollar amounts for session fees and Medicare rebates.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount in Australian dollars.
///
/// Serialised as a decimal string (`"150.00"`) so fees never pass through
/// floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from whole cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// What the client pays after the rebate, never below zero.
    #[must_use]
    pub fn out_of_pocket(fee: Self, rebate: Option<Self>) -> Self {
        let gap = fee.0 - rebate.map_or(Decimal::ZERO, |r| r.0);
        Self(gap.max(Decimal::ZERO))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-${:.2}", rounded.abs())
        } else {
            write!(f, "${:.2}", rounded.abs())
        }
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_with_two_decimals() {
        assert_eq!(Money::from_cents(15_000).to_string(), "$150.00");
        assert_eq!(Money::from_cents(9_880).to_string(), "$98.80");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
        assert_eq!(Money::from_cents(-500).to_string(), "-$5.00");
    }

    #[test]
    fn out_of_pocket_subtracts_rebate() {
        let fee = Money::from_cents(22_000);
        let rebate = Money::from_cents(9_880);
        assert_eq!(
            Money::out_of_pocket(fee, Some(rebate)),
            Money::from_cents(12_120)
        );
        assert_eq!(Money::out_of_pocket(fee, None), fee);
    }

    #[test]
    fn out_of_pocket_never_negative() {
        let fee = Money::from_cents(5_000);
        let rebate = Money::from_cents(9_880);
        assert_eq!(Money::out_of_pocket(fee, Some(rebate)), Money::ZERO);
    }

    #[test]
    fn negative_detection() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::ZERO.is_negative());
        assert!(!Money::from_cents(1).is_negative());
    }

    #[test]
    fn serialises_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(15_000)).ok();
        assert_eq!(json.as_deref(), Some("\"150.00\""));
    }
}
