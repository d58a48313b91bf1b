//! Reservation endpoints.
//!
//! - `GET /api/reservations?type=` — merged list, optionally filtered
//! - `GET /api/reservations/:id?type=` — one reservation plus its guest
//! - `PUT /api/reservations/:id/status` — persist a new status

use crate::auth::middleware::AdminSession;
use crate::error::AppError;
use crate::reservations;
use crate::server::state::AppState;
use crate::types::{Booking, BookingKind, User};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use obwira_core::document::DocumentId;
use serde::{Deserialize, Serialize};

/// Query parameters for the reservation list and detail.
#[derive(Debug, Deserialize)]
pub struct KindQuery {
    /// `all`, `room`, `restaurant`, or `shuttle`. Defaults to `all`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn parse_kind_filter(query: &KindQuery) -> Result<Option<BookingKind>, AppError> {
    match query.kind.as_deref() {
        None | Some("all") => Ok(None),
        Some(raw) => BookingKind::parse(raw).map(Some).ok_or_else(|| {
            AppError::bad_request(format!(
                "unknown reservation type '{raw}', expected all, room, restaurant, or shuttle"
            ))
        }),
    }
}

/// `GET /api/reservations`
///
/// A fetch failure degrades to an empty list; the client shows an empty
/// state rather than an error page.
pub async fn list(
    _admin: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<KindQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let kind = parse_kind_filter(&query)?;
    match reservations::list_reservations(state.records.as_ref(), kind).await {
        Ok(bookings) => Ok(Json(bookings)),
        Err(e) => {
            tracing::error!(error = %e, "reservation fetch failed, returning empty list");
            Ok(Json(Vec::new()))
        },
    }
}

/// Reservation detail payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetail {
    /// The reservation itself.
    #[serde(flatten)]
    pub booking: Booking,
    /// The guest account, when it resolves.
    pub user: Option<User>,
}

/// `GET /api/reservations/:id`
///
/// The `type` parameter is required here: ids are only unique within a
/// collection.
pub async fn detail(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<KindQuery>,
) -> Result<Json<ReservationDetail>, AppError> {
    let kind = parse_kind_filter(&query)?
        .ok_or_else(|| AppError::bad_request("a concrete reservation type is required"))?;

    let Some((booking, user)) =
        reservations::get_reservation(state.records.as_ref(), kind, DocumentId::from(id.as_str()))
            .await?
    else {
        return Err(AppError::not_found("Reservation", id));
    };

    Ok(Json(ReservationDetail { booking, user }))
}

/// Status update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Which collection the reservation lives in.
    #[serde(rename = "type")]
    pub kind: String,
    /// The new status. Any non-empty string is accepted and persisted.
    pub status: String,
}

/// `PUT /api/reservations/:id/status`
pub async fn update_status(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind = BookingKind::parse(&request.kind)
        .ok_or_else(|| AppError::bad_request(format!("unknown reservation type '{}'", request.kind)))?;
    if request.status.trim().is_empty() {
        return Err(AppError::validation("status must not be empty"));
    }

    reservations::update_status(
        state.records.as_ref(),
        kind,
        DocumentId::from(id.as_str()),
        &request.status,
    )
    .await?;

    Ok(Json(serde_json::json!({ "id": id, "status": request.status })))
}
