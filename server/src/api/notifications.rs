//! Notification feed endpoints.
//!
//! The handlers talk to the feed store, never to the record store
//! directly; the subscription task keeps the store current.

use crate::auth::middleware::AdminSession;
use crate::error::AppError;
use crate::notifications::FeedAction;
use crate::server::state::AppState;
use crate::types::Notification;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use obwira_core::document::DocumentId;
use serde::Serialize;

/// Feed snapshot payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    /// Notifications, newest first, capped at twenty.
    pub items: Vec<Notification>,
    /// Unread entries in the snapshot.
    pub unread_count: usize,
    /// Whether the client should play the alert sound once.
    pub chime: bool,
}

/// `GET /api/notifications`
///
/// Returning the snapshot consumes a pending chime: it rings once per
/// increase, not on every poll.
pub async fn feed(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<FeedResponse>, AppError> {
    let (items, unread_count, chime) = state
        .feed
        .state(|s| (s.items.clone(), s.unread_count, s.chime_pending))
        .await;

    if chime {
        state.feed.send(FeedAction::ChimeConsumed).await?;
    }

    Ok(Json(FeedResponse {
        items,
        unread_count,
        chime,
    }))
}

/// `POST /api/notifications/:id/read`
///
/// Fire-and-forget: the local snapshot is patched immediately and the
/// write happens in the background.
pub async fn mark_read(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .feed
        .send(FeedAction::MarkRead(DocumentId::from(id.as_str())))
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /api/notifications/read-all`
pub async fn mark_all_read(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.feed.send(FeedAction::MarkAllRead).await?;
    Ok(StatusCode::ACCEPTED)
}
