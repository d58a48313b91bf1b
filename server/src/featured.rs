//! Featured-experience exclusivity.
//!
//! At most one experience is featured at a time. Featuring goes through
//! this manager: it reads the currently featured set and commits one batch
//! that clears every other flag and sets the target. A `tokio::Mutex`
//! serializes featuring operations in-process and the batch is atomic at
//! the store, so two concurrent calls cannot leave two flags set.

use chrono::{DateTime, Duration, Utc};
use obwira_core::document::{Collection, DocumentId, Filter, SortOrder};
use obwira_core::record_store::{RecordStore, RecordStoreError, WriteOp};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Serializes all featuring writes against one record store.
pub struct FeaturedManager {
    store: Arc<dyn RecordStore>,
    lock: Mutex<()>,
}

impl FeaturedManager {
    /// Create a manager over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Feature or unfeature one experience.
    ///
    /// Featuring clears every other flag in the same batch. Unfeaturing is
    /// a plain single-document update, still taken under the lock.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError::NotFound`] if the target is missing (nothing is
    /// written), [`RecordStoreError::Backend`] on store failure.
    pub async fn set_featured(
        &self,
        id: DocumentId,
        featured: bool,
    ) -> Result<(), RecordStoreError> {
        let _guard = self.lock.lock().await;

        if !featured {
            let mut patch = Map::new();
            patch.insert("isFeatured".to_string(), Value::Bool(false));
            return self.store.update(Collection::Experiences, id, patch).await;
        }

        let currently_featured = self
            .store
            .list(
                Collection::Experiences,
                vec![Filter::eq("isFeatured", true)],
                SortOrder::Unordered,
            )
            .await?;

        let mut ops: Vec<WriteOp> = currently_featured
            .iter()
            .filter(|doc| doc.id != id)
            .map(|doc| {
                WriteOp::set_field(Collection::Experiences, doc.id.clone(), "isFeatured", false)
            })
            .collect();
        ops.push(WriteOp::set_field(
            Collection::Experiences,
            id.clone(),
            "isFeatured",
            true,
        ));

        self.store.batch_update(ops).await?;
        tracing::info!(id = %id, cleared = currently_featured.len(), "experience featured");
        Ok(())
    }

    /// Seed the four canned experiences, featuring the first.
    ///
    /// Dates are staggered weekly into the future from `now`. Runs through
    /// the same featuring path so the exclusivity invariant holds after
    /// seeding, even against pre-existing documents.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError`] if any create or the featuring batch fails.
    pub async fn seed_defaults(&self, now: DateTime<Utc>) -> Result<Vec<DocumentId>, RecordStoreError> {
        let canned = [
            (
                "Sunset Rooftop Jazz",
                "Live jazz over the skyline, cocktails included.",
            ),
            (
                "Chef's Table Tasting",
                "Seven courses at the pass with our head chef.",
            ),
            (
                "Lakeside Morning Yoga",
                "Guided session on the private deck, mats provided.",
            ),
            (
                "City Heritage Walk",
                "Two hours through the old quarter with a local guide.",
            ),
        ];

        let mut ids = Vec::with_capacity(canned.len());
        for (i, (title, description)) in canned.iter().enumerate() {
            let date = now + Duration::weeks(i64::try_from(i).unwrap_or(0) + 1);
            let mut fields = Map::new();
            fields.insert("title".to_string(), json!(title));
            fields.insert("description".to_string(), json!(description));
            fields.insert("date".to_string(), json!(date.format("%Y-%m-%d").to_string()));
            fields.insert("imageUrl".to_string(), Value::Null);
            fields.insert("isFeatured".to_string(), Value::Bool(false));
            let id = self.store.create(Collection::Experiences, fields).await?;
            ids.push(id);
        }

        if let Some(first) = ids.first() {
            self.set_featured(first.clone(), true).await?;
        }
        tracing::info!(count = ids.len(), "seeded default experiences");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use obwira_core::document::Document;
    use obwira_testing::InMemoryRecordStore;

    fn experience(id: &str, featured: bool) -> Document {
        let mut fields = Map::new();
        fields.insert("title".to_string(), json!(id));
        fields.insert("isFeatured".to_string(), json!(featured));
        Document::new(DocumentId::new(id), fields)
    }

    async fn featured_ids(store: &InMemoryRecordStore) -> Vec<String> {
        store
            .list(
                Collection::Experiences,
                vec![Filter::eq("isFeatured", true)],
                SortOrder::Unordered,
            )
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id.as_str().to_string())
            .collect()
    }

    #[tokio::test]
    async fn featuring_clears_previous_flag() {
        let store = InMemoryRecordStore::new();
        store.seed(Collection::Experiences, experience("a", true)).await;
        store.seed(Collection::Experiences, experience("b", false)).await;

        let manager = FeaturedManager::new(Arc::new(store.clone()));
        manager
            .set_featured(DocumentId::from("b"), true)
            .await
            .unwrap();

        assert_eq!(featured_ids(&store).await, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn featuring_collapses_corrupt_multi_featured_state() {
        let store = InMemoryRecordStore::new();
        store.seed(Collection::Experiences, experience("a", true)).await;
        store.seed(Collection::Experiences, experience("b", true)).await;
        store.seed(Collection::Experiences, experience("c", false)).await;

        let manager = FeaturedManager::new(Arc::new(store.clone()));
        manager
            .set_featured(DocumentId::from("c"), true)
            .await
            .unwrap();

        assert_eq!(featured_ids(&store).await, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn unfeaturing_touches_only_the_target() {
        let store = InMemoryRecordStore::new();
        store.seed(Collection::Experiences, experience("a", true)).await;
        store.seed(Collection::Experiences, experience("b", false)).await;

        let manager = FeaturedManager::new(Arc::new(store.clone()));
        manager
            .set_featured(DocumentId::from("a"), false)
            .await
            .unwrap();

        assert!(featured_ids(&store).await.is_empty());
    }

    #[tokio::test]
    async fn featuring_missing_target_changes_nothing() {
        let store = InMemoryRecordStore::new();
        store.seed(Collection::Experiences, experience("a", true)).await;

        let manager = FeaturedManager::new(Arc::new(store.clone()));
        let err = manager
            .set_featured(DocumentId::from("ghost"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, RecordStoreError::NotFound { .. }));

        // The previous flag survives the failed batch.
        assert_eq!(featured_ids(&store).await, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn seeding_creates_four_with_first_featured() {
        let store = InMemoryRecordStore::new();
        let manager = FeaturedManager::new(Arc::new(store.clone()));

        let ids = manager.seed_defaults(Utc::now()).await.unwrap();
        assert_eq!(ids.len(), 4);
        assert_eq!(store.len(Collection::Experiences).await, 4);
        assert_eq!(
            featured_ids(&store).await,
            vec![ids[0].as_str().to_string()]
        );
    }

    #[tokio::test]
    async fn concurrent_featuring_leaves_exactly_one_flag() {
        let store = InMemoryRecordStore::new();
        for id in ["a", "b", "c", "d"] {
            store.seed(Collection::Experiences, experience(id, false)).await;
        }
        let manager = Arc::new(FeaturedManager::new(Arc::new(store.clone())));

        let tasks: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|id| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    manager.set_featured(DocumentId::from(id), true).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(featured_ids(&store).await.len(), 1);
    }
}
