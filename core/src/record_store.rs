//! Record store abstraction: uniform CRUD over named collections.
//!
//! This module defines the core adapter the rest of the service is written
//! against — a managed document database reduced to exactly the operations
//! the dashboard needs:
//!
//! - List with equality filters and descending-timestamp ordering
//! - Point reads, creates, shallow-merge updates, deletes
//! - Atomic multi-document batched updates
//! - A change signal per collection for live views
//!
//! # Implementations
//!
//! - `PostgresRecordStore` (in `obwira-postgres`): production implementation
//!   backed by a JSONB table, transactional batches, LISTEN/NOTIFY signals
//! - `InMemoryRecordStore` (in `obwira-testing`): fast, deterministic tests
//!
//! # Failure model
//!
//! The adapter reports failures as [`RecordStoreError`] and never retries;
//! callers surface the error and leave their state unchanged (the dashboard
//! shows an alert, nothing is rolled back).
//!
//! # Dyn Compatibility
//!
//! The trait uses explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so it can be held as `Arc<dyn RecordStore>` and captured by
//! effects.

use crate::document::{Collection, Document, DocumentId, Filter, SortOrder};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors that can occur during record store operations.
#[derive(Error, Debug)]
pub enum RecordStoreError {
    /// The addressed document does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound {
        /// Collection that was addressed.
        collection: Collection,
        /// Id that was addressed.
        id: DocumentId,
    },

    /// Backend connection or query failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// A document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RecordStoreError {
    /// Shorthand for a not-found error.
    #[must_use]
    pub const fn not_found(collection: Collection, id: DocumentId) -> Self {
        Self::NotFound { collection, id }
    }
}

/// One mutation inside a batched write.
#[derive(Clone, Debug)]
pub struct WriteOp {
    /// Collection holding the document.
    pub collection: Collection,
    /// Document to patch.
    pub id: DocumentId,
    /// Fields to merge into the document (shallow).
    pub patch: Map<String, Value>,
}

impl WriteOp {
    /// Builds a write op patching a single field.
    #[must_use]
    pub fn set_field(
        collection: Collection,
        id: DocumentId,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let mut patch = Map::new();
        patch.insert(field.into(), value.into());
        Self {
            collection,
            id,
            patch,
        }
    }
}

/// Boxed future alias used by the trait methods.
pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, RecordStoreError>> + Send + 'a>>;

/// Uniform document CRUD over named collections.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the store is shared across
/// request handlers and background subscription tasks.
pub trait RecordStore: Send + Sync {
    /// Lists documents matching every filter, in the requested order.
    ///
    /// An unknown collection or empty result is an empty vector, not an
    /// error. No pagination: the dashboard's collections are small.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError::Backend`] on connection or query failure.
    fn list(
        &self,
        collection: Collection,
        filters: Vec<Filter>,
        order: SortOrder,
    ) -> StoreFuture<'_, Vec<Document>>;

    /// Fetches a single document.
    ///
    /// Returns `Ok(None)` when the document does not exist — detail screens
    /// render an explicit not-found state rather than erroring.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError::Backend`] on connection or query failure.
    fn get(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> StoreFuture<'_, Option<Document>>;

    /// Creates a document, stamping the server-assigned `created_at`,
    /// and returns its generated id.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError::Backend`] on connection or query failure.
    fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> StoreFuture<'_, DocumentId>;

    /// Shallow-merges `patch` into an existing document.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError::NotFound`] when the document does not exist,
    /// [`RecordStoreError::Backend`] on connection or query failure.
    fn update(
        &self,
        collection: Collection,
        id: DocumentId,
        patch: Map<String, Value>,
    ) -> StoreFuture<'_, ()>;

    /// Deletes a document. Deleting an absent document is a no-op.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError::Backend`] on connection or query failure.
    fn delete(&self, collection: Collection, id: DocumentId) -> StoreFuture<'_, ()>;

    /// Applies every write op, all-or-nothing.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError::NotFound`] if any addressed document is missing
    /// (nothing is applied), [`RecordStoreError::Backend`] on failure.
    fn batch_update(&self, ops: Vec<WriteOp>) -> StoreFuture<'_, ()>;

    /// Change signal for a collection.
    ///
    /// Every committed write to the collection sends the collection tag on
    /// the returned channel. Subscribers re-list on each signal — emissions
    /// carry no payload, the snapshot is always re-fetched (full-snapshot
    /// semantics, matching the upstream live-query behavior).
    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<Collection>;
}
