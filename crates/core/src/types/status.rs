//! Enumerations stored as text in the database.

use serde::{Deserialize, Serialize};

/// What a contact enquiry is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryType {
    #[default]
    General,
    Booking,
    Fees,
    Referral,
    Telehealth,
    Other,
}

impl EnquiryType {
    /// Every enquiry type, in form display order.
    pub const ALL: [Self; 6] = [
        Self::General,
        Self::Booking,
        Self::Fees,
        Self::Referral,
        Self::Telehealth,
        Self::Other,
    ];

    /// Stable identifier used in forms and storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Booking => "booking",
            Self::Fees => "fees",
            Self::Referral => "referral",
            Self::Telehealth => "telehealth",
            Self::Other => "other",
        }
    }

    /// Human-readable label for the contact form.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::General => "General enquiry",
            Self::Booking => "Booking question",
            Self::Fees => "Fees and rebates",
            Self::Referral => "GP or Mental Health Care Plan referral",
            Self::Telehealth => "Telehealth sessions",
            Self::Other => "Something else",
        }
    }
}

impl std::fmt::Display for EnquiryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnquiryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("invalid enquiry type: {s}"))
    }
}

/// Lifecycle of a booking request.
///
/// Bookings arrive as `Pending`; the practitioner confirms or cancels them
/// outside this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid booking status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enquiry_type_round_trips_through_str() {
        for t in EnquiryType::ALL {
            assert_eq!(t.as_str().parse::<EnquiryType>(), Ok(t));
        }
        assert!("complaint".parse::<EnquiryType>().is_err());
    }

    #[test]
    fn booking_status_parses_storage_values() {
        assert_eq!("pending".parse::<BookingStatus>(), Ok(BookingStatus::Pending));
        assert_eq!(BookingStatus::Cancelled.to_string(), "cancelled");
        assert!("done".parse::<BookingStatus>().is_err());
    }
}
