//! Dashboard statistics.
//!
//! Stats are computed from a fresh merge of the booking collections on
//! every request; the numbers and the reservation screen may each hit the
//! store independently. The computation itself is pure, taking `now` and
//! the day boundary as parameters so tests pin them.

use crate::types::{Booking, BookingDetails, BookingKind, BookingStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Headline numbers for the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// All bookings across the three collections.
    pub total_bookings: usize,
    /// Bookings pending staff action.
    pub pending_bookings: usize,
    /// Bookings created since the day boundary.
    pub today_bookings: usize,
    /// Guests of confirmed room stays currently in house.
    pub active_guests: i64,
}

/// Compute the headline numbers.
///
/// `day_start` is the staff-local midnight; "today" means created at or
/// after it. Active guests sum `guests` over confirmed room stays whose
/// `[check_in, check_out]` window contains `now`.
#[must_use]
pub fn compute_stats(
    bookings: &[Booking],
    now: DateTime<Utc>,
    day_start: DateTime<Utc>,
) -> DashboardStats {
    let mut stats = DashboardStats {
        total_bookings: bookings.len(),
        ..DashboardStats::default()
    };

    for booking in bookings {
        if booking.status == BookingStatus::Pending {
            stats.pending_bookings += 1;
        }
        if booking.created_at.is_some_and(|t| t >= day_start) {
            stats.today_bookings += 1;
        }
        if booking.kind == BookingKind::Room && booking.status == BookingStatus::Confirmed {
            if let BookingDetails::Room {
                check_in: Some(check_in),
                check_out: Some(check_out),
                guests,
                ..
            } = &booking.details
            {
                if *check_in <= now && now <= *check_out {
                    stats.active_guests += guests;
                }
            }
        }
    }
    stats
}

/// The five most recent bookings. Input must already be sorted newest
/// first, which the aggregator guarantees.
#[must_use]
pub fn recent_activity(bookings: &[Booking]) -> &[Booking] {
    &bookings[..bookings.len().min(5)]
}
