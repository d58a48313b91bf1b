//! In-memory store implementations.
//!
//! `InMemoryRecordStore` and `InMemoryBlobStore` implement the core store
//! traits over plain hash maps. They are used by reducer and handler tests,
//! and by integration tests that exercise the full HTTP surface without a
//! database.
//!
//! The record store honors the same contract as the Postgres
//! implementation: shallow-merge updates, all-or-nothing batches, and a
//! payload-free change signal per collection.

use chrono::{DateTime, Utc};
use obwira_core::blob_store::{BlobFuture, BlobKey, BlobStore};
use obwira_core::document::{
    sort_created_at_desc, Collection, Document, DocumentId, Filter, SortOrder,
};
use obwira_core::record_store::{RecordStore, RecordStoreError, StoreFuture, WriteOp};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use tokio::sync::{broadcast, Mutex};

type CollectionMap = HashMap<Collection, HashMap<DocumentId, Document>>;

/// In-memory [`RecordStore`] for tests.
///
/// Clones share the same underlying data, like a pooled database handle.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    data: Arc<Mutex<CollectionMap>>,
    // std Mutex: subscribe() is synchronous and never held across await.
    signals: Arc<std::sync::Mutex<HashMap<Collection, broadcast::Sender<Collection>>>>,
    fixed_now: Option<DateTime<Utc>>,
}

impl InMemoryRecordStore {
    /// Create an empty store stamping real timestamps on create.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store stamping a fixed `created_at` on create.
    #[must_use]
    pub fn with_fixed_now(now: DateTime<Utc>) -> Self {
        Self {
            fixed_now: Some(now),
            ..Self::default()
        }
    }

    /// Insert a document directly, bypassing timestamp stamping.
    ///
    /// Test setup helper: seeds documents with explicit ids and timestamps.
    pub async fn seed(&self, collection: Collection, document: Document) {
        let mut data = self.data.lock().await;
        data.entry(collection)
            .or_default()
            .insert(document.id.clone(), document);
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        let data = self.data.lock().await;
        data.get(&collection).map_or(0, HashMap::len)
    }

    /// Whether a collection holds no documents.
    pub async fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection).await == 0
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    fn signal(&self, collection: Collection) {
        let signals = self.signals.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = signals.get(&collection) {
            // Nobody listening is fine.
            let _ = tx.send(collection);
        }
    }
}

impl RecordStore for InMemoryRecordStore {
    fn list(
        &self,
        collection: Collection,
        filters: Vec<Filter>,
        order: SortOrder,
    ) -> StoreFuture<'_, Vec<Document>> {
        Box::pin(async move {
            let data = self.data.lock().await;
            let mut docs: Vec<Document> = data
                .get(&collection)
                .map(|docs| {
                    docs.values()
                        .filter(|doc| filters.iter().all(|f| f.matches(doc)))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            if order == SortOrder::CreatedAtDesc {
                sort_created_at_desc(&mut docs);
            }
            Ok(docs)
        })
    }

    fn get(&self, collection: Collection, id: DocumentId) -> StoreFuture<'_, Option<Document>> {
        Box::pin(async move {
            let data = self.data.lock().await;
            Ok(data.get(&collection).and_then(|docs| docs.get(&id)).cloned())
        })
    }

    fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> StoreFuture<'_, DocumentId> {
        Box::pin(async move {
            let id = DocumentId::generate();
            let doc = Document {
                id: id.clone(),
                fields,
                created_at: Some(self.now()),
            };
            {
                let mut data = self.data.lock().await;
                data.entry(collection).or_default().insert(id.clone(), doc);
            }
            self.signal(collection);
            Ok(id)
        })
    }

    fn update(
        &self,
        collection: Collection,
        id: DocumentId,
        patch: Map<String, Value>,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            {
                let mut data = self.data.lock().await;
                let doc = data
                    .get_mut(&collection)
                    .and_then(|docs| docs.get_mut(&id))
                    .ok_or_else(|| RecordStoreError::not_found(collection, id.clone()))?;
                for (k, v) in patch {
                    doc.fields.insert(k, v);
                }
            }
            self.signal(collection);
            Ok(())
        })
    }

    fn delete(&self, collection: Collection, id: DocumentId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let removed = {
                let mut data = self.data.lock().await;
                data.get_mut(&collection)
                    .and_then(|docs| docs.remove(&id))
                    .is_some()
            };
            if removed {
                self.signal(collection);
            }
            Ok(())
        })
    }

    fn batch_update(&self, ops: Vec<WriteOp>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut touched: Vec<Collection> = Vec::new();
            {
                let mut data = self.data.lock().await;
                // Validate every target exists before mutating anything.
                for op in &ops {
                    let exists = data
                        .get(&op.collection)
                        .is_some_and(|docs| docs.contains_key(&op.id));
                    if !exists {
                        return Err(RecordStoreError::not_found(op.collection, op.id.clone()));
                    }
                }
                for op in ops {
                    if let Some(doc) = data
                        .get_mut(&op.collection)
                        .and_then(|docs| docs.get_mut(&op.id))
                    {
                        for (k, v) in op.patch {
                            doc.fields.insert(k, v);
                        }
                    }
                    if !touched.contains(&op.collection) {
                        touched.push(op.collection);
                    }
                }
            }
            for collection in touched {
                self.signal(collection);
            }
            Ok(())
        })
    }

    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<Collection> {
        let mut signals = self.signals.lock().unwrap_or_else(PoisonError::into_inner);
        signals
            .entry(collection)
            .or_insert_with(|| broadcast::channel(64).0)
            .subscribe()
    }
}

/// In-memory [`BlobStore`] for tests.
///
/// Stores payloads in a map and returns `memory://{key}` URLs.
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    /// Create an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored payload by key.
    pub async fn payload(&self, key: &str) -> Option<Vec<u8>> {
        let blobs = self.blobs.lock().await;
        blobs.get(key).cloned()
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        let blobs = self.blobs.lock().await;
        blobs.len()
    }

    /// Whether the store holds no blobs.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, key: BlobKey, bytes: Vec<u8>) -> BlobFuture<'_, String> {
        Box::pin(async move {
            let mut blobs = self.blobs.lock().await;
            let url = format!("memory://{key}");
            blobs.insert(key.as_str().to_owned(), bytes);
            Ok(url)
        })
    }
}
