//! JSONB-backed document store.
//!
//! One table holds every collection:
//!
//! ```sql
//! CREATE TABLE documents (
//!     collection TEXT        NOT NULL,
//!     id         TEXT        NOT NULL,
//!     data       JSONB       NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (collection, id)
//! );
//! ```
//!
//! Updates are shallow merges via the JSONB `||` operator, mirroring the
//! merge semantics the handlers rely on. Every committed write issues
//! `pg_notify` inside the same transaction, so the signal fires exactly
//! when the write becomes visible.

use obwira_core::document::{Collection, Document, DocumentId, Filter, SortOrder};
use obwira_core::record_store::{RecordStore, RecordStoreError, StoreFuture, WriteOp};
use serde_json::{Map, Value};
use sqlx::postgres::{PgListener, PgPoolOptions};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// NOTIFY channel carrying collection names as payloads.
const NOTIFY_CHANNEL: &str = "obwira_documents";

/// Capacity of each per-collection signal channel.
const SIGNAL_CAPACITY: usize = 64;

/// `PostgreSQL`-backed [`RecordStore`].
///
/// Cheap to clone; clones share the pool and the signal channels.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
    signals: Arc<HashMap<Collection, broadcast::Sender<Collection>>>,
}

fn backend(e: sqlx::Error) -> RecordStoreError {
    RecordStoreError::Backend(e.to_string())
}

/// Merge equality filters into one JSONB containment probe.
fn filters_to_containment(filters: &[Filter]) -> Value {
    let mut probe = Map::new();
    for filter in filters {
        probe.insert(filter.field.clone(), filter.value.clone());
    }
    Value::Object(probe)
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<Document, RecordStoreError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;
    let data: Value = row
        .try_get("data")
        .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;
    let created_at = row
        .try_get("created_at")
        .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;
    let Value::Object(fields) = data else {
        return Err(RecordStoreError::Serialization(format!(
            "document {id} is not a JSON object"
        )));
    };
    Ok(Document {
        id: DocumentId::from(id.as_str()),
        fields,
        created_at: Some(created_at),
    })
}

impl PostgresRecordStore {
    /// Connect to the database, create the schema if needed, and start the
    /// notification listener.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError::Backend`] if the connection or schema setup
    /// fails.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RecordStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(backend)?;
        Self::from_pool(pool).await
    }

    /// Build a store over an existing pool.
    ///
    /// # Errors
    ///
    /// [`RecordStoreError::Backend`] if schema setup or the listener
    /// connection fails.
    pub async fn from_pool(pool: PgPool) -> Result<Self, RecordStoreError> {
        ensure_schema(&pool).await?;

        let signals: Arc<HashMap<Collection, broadcast::Sender<Collection>>> = Arc::new(
            Collection::ALL
                .into_iter()
                .map(|c| (c, broadcast::channel(SIGNAL_CAPACITY).0))
                .collect(),
        );

        let mut listener = PgListener::connect_with(&pool).await.map_err(backend)?;
        listener.listen(NOTIFY_CHANNEL).await.map_err(backend)?;
        tokio::spawn(run_listener(listener, Arc::clone(&signals)));

        tracing::info!("postgres record store ready");
        Ok(Self { pool, signals })
    }

    /// Access the underlying pool (health checks).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn ensure_schema(pool: &PgPool) -> Result<(), RecordStoreError> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT        NOT NULL,
            id         TEXT        NOT NULL,
            data       JSONB       NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (collection, id)
        )
        ",
    )
    .execute(pool)
    .await
    .map_err(backend)?;

    sqlx::query(
        r"
        CREATE INDEX IF NOT EXISTS documents_collection_created_at_idx
        ON documents (collection, created_at DESC)
        ",
    )
    .execute(pool)
    .await
    .map_err(backend)?;

    Ok(())
}

/// Forward NOTIFY payloads to the per-collection broadcast channels.
///
/// `PgListener` reconnects on its own; a recv error is logged and the loop
/// continues.
async fn run_listener(
    mut listener: PgListener,
    signals: Arc<HashMap<Collection, broadcast::Sender<Collection>>>,
) {
    loop {
        match listener.recv().await {
            Ok(notification) => {
                let payload = notification.payload();
                match Collection::parse(payload) {
                    Some(collection) => {
                        if let Some(tx) = signals.get(&collection) {
                            // No subscribers is fine.
                            let _ = tx.send(collection);
                        }
                    },
                    None => {
                        tracing::warn!(payload, "unknown collection in change notification");
                    },
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "notification listener error, retrying");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            },
        }
    }
}

impl RecordStore for PostgresRecordStore {
    fn list(
        &self,
        collection: Collection,
        filters: Vec<Filter>,
        order: SortOrder,
    ) -> StoreFuture<'_, Vec<Document>> {
        Box::pin(async move {
            let order_clause = match order {
                SortOrder::CreatedAtDesc => "ORDER BY created_at DESC",
                SortOrder::Unordered => "",
            };
            let rows = if filters.is_empty() {
                sqlx::query(&format!(
                    "SELECT id, data, created_at FROM documents WHERE collection = $1 {order_clause}"
                ))
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await
            } else {
                sqlx::query(&format!(
                    "SELECT id, data, created_at FROM documents \
                     WHERE collection = $1 AND data @> $2 {order_clause}"
                ))
                .bind(collection.as_str())
                .bind(filters_to_containment(&filters))
                .fetch_all(&self.pool)
                .await
            }
            .map_err(backend)?;

            metrics::counter!("record_store.reads", "collection" => collection.as_str())
                .increment(1);

            rows.iter().map(row_to_document).collect()
        })
    }

    fn get(&self, collection: Collection, id: DocumentId) -> StoreFuture<'_, Option<Document>> {
        Box::pin(async move {
            let row = sqlx::query(
                "SELECT id, data, created_at FROM documents WHERE collection = $1 AND id = $2",
            )
            .bind(collection.as_str())
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

            row.as_ref().map(row_to_document).transpose()
        })
    }

    fn create(
        &self,
        collection: Collection,
        fields: Map<String, Value>,
    ) -> StoreFuture<'_, DocumentId> {
        Box::pin(async move {
            let id = DocumentId::generate();
            let mut tx = self.pool.begin().await.map_err(backend)?;

            sqlx::query(
                "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)",
            )
            .bind(collection.as_str())
            .bind(id.as_str())
            .bind(Value::Object(fields))
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

            notify(&mut tx, collection).await?;
            tx.commit().await.map_err(backend)?;

            tracing::debug!(collection = %collection, id = %id, "document created");
            metrics::counter!("record_store.writes", "collection" => collection.as_str())
                .increment(1);
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
            let mut tx = self.pool.begin().await.map_err(backend)?;

            let result = sqlx::query(
                "UPDATE documents SET data = data || $3 WHERE collection = $1 AND id = $2",
            )
            .bind(collection.as_str())
            .bind(id.as_str())
            .bind(Value::Object(patch))
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

            if result.rows_affected() == 0 {
                return Err(RecordStoreError::not_found(collection, id));
            }

            notify(&mut tx, collection).await?;
            tx.commit().await.map_err(backend)?;

            tracing::debug!(collection = %collection, id = %id, "document updated");
            metrics::counter!("record_store.writes", "collection" => collection.as_str())
                .increment(1);
            Ok(())
        })
    }

    fn delete(&self, collection: Collection, id: DocumentId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(backend)?;

            let result =
                sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                    .bind(collection.as_str())
                    .bind(id.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(backend)?;

            // Deleting an absent document is a no-op, but only real
            // deletions signal.
            if result.rows_affected() > 0 {
                notify(&mut tx, collection).await?;
                metrics::counter!("record_store.writes", "collection" => collection.as_str())
                    .increment(1);
            }
            tx.commit().await.map_err(backend)?;
            Ok(())
        })
    }

    fn batch_update(&self, ops: Vec<WriteOp>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await.map_err(backend)?;
            let mut touched: Vec<Collection> = Vec::new();

            for op in ops {
                let result = sqlx::query(
                    "UPDATE documents SET data = data || $3 WHERE collection = $1 AND id = $2",
                )
                .bind(op.collection.as_str())
                .bind(op.id.as_str())
                .bind(Value::Object(op.patch))
                .execute(&mut *tx)
                .await
                .map_err(backend)?;

                if result.rows_affected() == 0 {
                    // Dropping the transaction rolls everything back.
                    return Err(RecordStoreError::not_found(op.collection, op.id));
                }
                if !touched.contains(&op.collection) {
                    touched.push(op.collection);
                }
            }

            for collection in &touched {
                notify(&mut tx, *collection).await?;
            }
            tx.commit().await.map_err(backend)?;

            for collection in touched {
                metrics::counter!("record_store.writes", "collection" => collection.as_str())
                    .increment(1);
            }
            Ok(())
        })
    }

    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<Collection> {
        match self.signals.get(&collection) {
            Some(tx) => tx.subscribe(),
            // Unreachable: the map is built over Collection::ALL. A dead
            // receiver keeps the signature honest without panicking.
            None => broadcast::channel(1).1,
        }
    }
}

async fn notify(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    collection: Collection,
) -> Result<(), RecordStoreError> {
    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(NOTIFY_CHANNEL)
        .bind(collection.as_str())
        .execute(&mut **tx)
        .await
        .map_err(backend)?;
    Ok(())
}
