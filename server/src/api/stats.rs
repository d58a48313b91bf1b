//! Dashboard statistics endpoint.

use crate::auth::middleware::AdminSession;
use crate::error::AppError;
use crate::reservations::list_reservations;
use crate::server::state::AppState;
use crate::stats::{compute_stats, recent_activity, DashboardStats};
use crate::types::Booking;
use axum::{extract::State, Json};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

/// Stats payload: headline numbers plus the five most recent bookings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Headline counters.
    #[serde(flatten)]
    pub stats: DashboardStats,
    /// The five most recent bookings across all kinds.
    pub recent_activity: Vec<Booking>,
}

/// Start of the current day in the server's local timezone.
///
/// "Today's bookings" is a staff-facing number; the boundary follows the
/// hotel's wall clock, not UTC.
fn local_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = now.with_timezone(&Local).date_naive();
    local_date
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map_or(now, |t| t.with_timezone(&Utc))
}

/// `GET /api/dashboard/stats`
///
/// A fetch failure degrades to zeroed counters and an empty activity
/// list.
pub async fn dashboard_stats(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let bookings = match list_reservations(state.records.as_ref(), None).await {
        Ok(bookings) => bookings,
        Err(e) => {
            tracing::error!(error = %e, "stats fetch failed, returning zeroed counters");
            Vec::new()
        },
    };

    let now = Utc::now();
    let stats = compute_stats(&bookings, now, local_day_start(now));
    let recent = recent_activity(&bookings).to_vec();

    Ok(Json(StatsResponse {
        stats,
        recent_activity: recent,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_start_is_not_after_now() {
        let now = Utc::now();
        let start = local_day_start(now);
        assert!(start <= now);
        // Within the last 24 hours plus the widest UTC offset.
        assert!(now - start < chrono::Duration::hours(38));
    }
}
