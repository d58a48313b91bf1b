//! Application state for the HTTP server.
//!
//! Contains every shared resource the handlers need. Cloned per request;
//! all members are cheap handles.

use crate::auth::SessionRegistry;
use crate::featured::FeaturedManager;
use crate::notifications::FeedStore;
use obwira_core::blob_store::BlobStore;
use obwira_core::record_store::RecordStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store backing every screen.
    pub records: Arc<dyn RecordStore>,

    /// Image upload backend.
    pub blobs: Arc<dyn BlobStore>,

    /// Live admin sessions.
    pub sessions: Arc<SessionRegistry>,

    /// Notification feed store, fed by the subscription task.
    pub feed: FeedStore,

    /// Featured-experience exclusivity manager.
    pub featured: Arc<FeaturedManager>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        sessions: Arc<SessionRegistry>,
        feed: FeedStore,
        featured: Arc<FeaturedManager>,
    ) -> Self {
        Self {
            records,
            blobs,
            sessions,
            feed,
            featured,
        }
    }
}
