//! Recent bookings and enquiries, newest first.

use stillwaters_site::db::{BookingRepository, ContactRepository};
use stillwaters_site::models::{Booking, Contact};

use super::{CliError, connect};

const MAX_LIMIT: i64 = 500;

fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIMIT)
}

fn booking_line(booking: &Booking) -> String {
    format!(
        "#{:<5} {} {:>8}  {:<28} {:<24} {:<9} {}{}",
        booking.id.as_i32(),
        booking.date.format("%Y-%m-%d"),
        booking.time.to_hhmm(),
        booking.service.name,
        booking.personal_details.full_name(),
        booking.status,
        booking.personal_details.email,
        if booking.personal_details.has_referral {
            "  [referral]"
        } else {
            ""
        },
    )
}

fn contact_line(contact: &Contact) -> String {
    format!(
        "#{:<5} {}  {:<12} urgency {}  {} {} <{}>",
        contact.id.as_i32(),
        contact.created_at.format("%Y-%m-%d %H:%M"),
        contact.enquiry_type,
        contact.urgency,
        contact.first_name,
        contact.last_name,
        contact.email,
    )
}

/// Print the newest booking requests.
pub async fn recent_bookings(limit: i64) -> Result<(), CliError> {
    let pool = connect().await?;
    let bookings = BookingRepository::new(&pool)
        .list_recent(clamp_limit(limit))
        .await?;

    #[allow(clippy::print_stdout)]
    {
        if bookings.is_empty() {
            println!("No bookings yet.");
        }
        for booking in &bookings {
            println!("{}", booking_line(booking));
        }
    }
    Ok(())
}

/// Print the newest contact enquiries.
pub async fn recent_contacts(limit: i64) -> Result<(), CliError> {
    let pool = connect().await?;
    let contacts = ContactRepository::new(&pool)
        .list_recent(clamp_limit(limit))
        .await?;

    #[allow(clippy::print_stdout)]
    {
        if contacts.is_empty() {
            println!("No enquiries yet.");
        }
        for contact in &contacts {
            println!("{}", contact_line(contact));
        }
    }
    Ok(())
}
