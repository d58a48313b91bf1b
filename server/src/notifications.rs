//! Staff notification feed.
//!
//! The feed is a reducer-owned state cell fed by a channel, not a callback
//! mutating shared state: a background task subscribes to the store's
//! `notifications` collection, re-lists the admin-targeted documents on
//! every change signal, and sends the snapshot into the feed store as an
//! action. All transitions happen inside [`FeedReducer::reduce`], so a
//! snapshot can never interleave with a mark-read halfway through.

use crate::types::{notification_from_document, Notification};
use obwira_core::document::{Collection, DocumentId, Filter, SortOrder};
use obwira_core::effect::Effect;
use obwira_core::record_store::RecordStore;
use obwira_core::reducer::Reducer;
use obwira_runtime::Store;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Feed length cap. Older notifications fall off the end.
pub const FEED_LIMIT: usize = 20;

/// Notification feed state.
#[derive(Clone, Debug, Default)]
pub struct FeedState {
    /// Current snapshot, newest first, at most [`FEED_LIMIT`] entries.
    pub items: Vec<Notification>,
    /// Unread entries in the snapshot.
    pub unread_count: usize,
    /// One-shot audible-alert flag, set when unread strictly increased.
    pub chime_pending: bool,
    /// Whether a first snapshot has been applied. The initial load never
    /// chimes, however many unread it carries.
    pub initialized: bool,
}

/// Feed inputs.
#[derive(Clone, Debug)]
pub enum FeedAction {
    /// A fresh snapshot from the subscription task. Replaces the list.
    SnapshotArrived(Vec<Notification>),
    /// The chime was surfaced to the client.
    ChimeConsumed,
    /// Staff opened one notification.
    MarkRead(DocumentId),
    /// Staff cleared the feed.
    MarkAllRead,
}

/// Injected dependencies for feed effects.
#[derive(Clone)]
pub struct FeedEnvironment {
    /// Record store the mark-read writes go to.
    pub records: Arc<dyn RecordStore>,
}

/// The feed transition function.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeedReducer;

/// The feed store type used by the server.
pub type FeedStore = Store<FeedState, FeedAction, FeedEnvironment, FeedReducer>;

fn sort_notifications_desc(items: &mut [Notification]) {
    items.sort_by_key(|n| {
        std::cmp::Reverse(n.created_at.unwrap_or(chrono::DateTime::UNIX_EPOCH))
    });
}

fn mark_read_effect(records: Arc<dyn RecordStore>, id: DocumentId) -> Effect<FeedAction> {
    Effect::future(async move {
        let mut patch = Map::new();
        patch.insert("read".to_string(), Value::Bool(true));
        if let Err(e) = records.update(Collection::Notifications, id.clone(), patch).await {
            // Fire-and-forget: the snapshot refresh will reconcile.
            tracing::warn!(id = %id, error = %e, "mark-read write failed");
        }
        None
    })
}

impl Reducer for FeedReducer {
    type State = FeedState;
    type Action = FeedAction;
    type Environment = FeedEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FeedAction::SnapshotArrived(mut items) => {
                sort_notifications_desc(&mut items);
                items.truncate(FEED_LIMIT);
                let unread = items.iter().filter(|n| !n.read).count();

                if state.initialized && unread > state.unread_count {
                    state.chime_pending = true;
                }
                state.items = items;
                state.unread_count = unread;
                state.initialized = true;
                SmallVec::new()
            },
            FeedAction::ChimeConsumed => {
                state.chime_pending = false;
                SmallVec::new()
            },
            FeedAction::MarkRead(id) => {
                let mut effects: SmallVec<[Effect<Self::Action>; 4]> = SmallVec::new();
                if let Some(item) =
                    state.items.iter_mut().find(|n| n.id == id && !n.read)
                {
                    item.read = true;
                    state.unread_count = state.unread_count.saturating_sub(1);
                    effects.push(mark_read_effect(Arc::clone(&env.records), id));
                }
                effects
            },
            FeedAction::MarkAllRead => {
                let mut effects: SmallVec<[Effect<Self::Action>; 4]> = SmallVec::new();
                // One write per unread entry; the upstream API has no batch
                // here and the feed is capped at twenty anyway.
                for item in state.items.iter_mut().filter(|n| !n.read) {
                    item.read = true;
                    effects.push(mark_read_effect(Arc::clone(&env.records), item.id.clone()));
                }
                state.unread_count = 0;
                effects
            },
        }
    }
}

/// Fetch the admin-targeted notification snapshot.
async fn fetch_snapshot(
    records: &dyn RecordStore,
) -> Result<Vec<Notification>, obwira_core::record_store::RecordStoreError> {
    let docs = records
        .list(
            Collection::Notifications,
            vec![Filter::eq("targetRole", "admin")],
            SortOrder::CreatedAtDesc,
        )
        .await?;
    Ok(docs.iter().map(notification_from_document).collect())
}

/// Spawn the subscription task feeding the store.
///
/// Loads one snapshot immediately, then re-lists on every change signal.
/// A fetch failure is logged and the previous snapshot stands. The task
/// ends when the signal channel closes or the feed store shuts down.
pub fn spawn_feed_subscription(records: Arc<dyn RecordStore>, feed: FeedStore) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut signals = records.subscribe(Collection::Notifications);
        loop {
            match fetch_snapshot(records.as_ref()).await {
                Ok(snapshot) => {
                    if feed.send(FeedAction::SnapshotArrived(snapshot)).await.is_err() {
                        tracing::debug!("feed store shut down, stopping subscription");
                        return;
                    }
                },
                Err(e) => {
                    tracing::error!(error = %e, "notification snapshot fetch failed");
                },
            }

            match signals.recv().await {
                Ok(_) => {},
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    // Snapshots are re-fetched in full; lag only means we
                    // coalesced some signals.
                    tracing::debug!(skipped, "notification signals coalesced");
                },
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    tracing::debug!("notification signal channel closed");
                    return;
                },
            }
        }
    })
}
