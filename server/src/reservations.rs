//! Reservation aggregation over the three booking collections.
//!
//! The dashboard treats room, restaurant, and shuttle bookings as one
//! reservation list. The merge is recomputed from the store on every read
//! (full-snapshot semantics); a status update writes one document and, for
//! an already-held list, patches the entry in place without re-sorting so
//! the row keeps its position on screen.

use crate::types::{booking_from_document, Booking, BookingKind, BookingStatus, User};
use obwira_core::document::{DocumentId, SortOrder};
use obwira_core::record_store::{RecordStore, RecordStoreError};
use serde_json::{Map, Value};

/// Fetch and merge all three booking collections, newest first.
///
/// The optional kind filter is applied in memory after the merge.
///
/// # Errors
///
/// [`RecordStoreError`] if any of the three fetches fails; nothing partial
/// is returned.
pub async fn list_reservations(
    store: &dyn RecordStore,
    kind: Option<BookingKind>,
) -> Result<Vec<Booking>, RecordStoreError> {
    let mut merged = Vec::new();
    for k in BookingKind::ALL {
        let docs = store
            .list(k.collection(), Vec::new(), SortOrder::CreatedAtDesc)
            .await?;
        merged.extend(docs.iter().map(|doc| booking_from_document(k, doc)));
    }

    // Each collection arrives sorted; the concatenation is not.
    sort_bookings_desc(&mut merged);

    if let Some(kind) = kind {
        merged.retain(|b| b.kind == kind);
    }
    Ok(merged)
}

/// Sort bookings newest first; a missing timestamp sorts last.
pub fn sort_bookings_desc(bookings: &mut [Booking]) {
    bookings.sort_by_key(|b| {
        std::cmp::Reverse(b.created_at.unwrap_or(chrono::DateTime::UNIX_EPOCH))
    });
}

/// Fetch one reservation plus the guest account it references.
///
/// A missing or unreadable user is tolerated; the booking renders without
/// guest details.
///
/// # Errors
///
/// [`RecordStoreError`] if the booking fetch itself fails.
pub async fn get_reservation(
    store: &dyn RecordStore,
    kind: BookingKind,
    id: DocumentId,
) -> Result<Option<(Booking, Option<User>)>, RecordStoreError> {
    let Some(doc) = store.get(kind.collection(), id).await? else {
        return Ok(None);
    };
    let booking = booking_from_document(kind, &doc);

    let user = match &booking.user_id {
        Some(user_id) => {
            match store
                .get(
                    obwira_core::document::Collection::Users,
                    DocumentId::from(user_id.as_str()),
                )
                .await
            {
                Ok(doc) => doc.as_ref().map(crate::types::user_from_document),
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "guest lookup failed, rendering without");
                    None
                },
            }
        },
        None => None,
    };

    Ok(Some((booking, user)))
}

/// Persist a new status for one reservation.
///
/// The raw string is written verbatim; unknown statuses are data, not
/// errors.
///
/// # Errors
///
/// [`RecordStoreError::NotFound`] for a missing booking,
/// [`RecordStoreError::Backend`] on write failure.
pub async fn update_status(
    store: &dyn RecordStore,
    kind: BookingKind,
    id: DocumentId,
    status: &str,
) -> Result<(), RecordStoreError> {
    let mut patch = Map::new();
    patch.insert("status".to_string(), Value::String(status.to_string()));
    store.update(kind.collection(), id, patch).await
}

/// Patch a held list in place after a successful status write.
///
/// Matching is by `(id, kind)`; ids are only unique within a collection.
/// The entry keeps its position — no re-sort.
pub fn patch_status(bookings: &mut [Booking], kind: BookingKind, id: &DocumentId, status: &str) {
    for booking in bookings {
        if booking.kind == kind && booking.id == *id {
            booking.status = BookingStatus::parse(status);
        }
    }
}
