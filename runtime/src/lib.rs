//! # Obwira Runtime
//!
//! Runtime implementation for the Obwira back-office.
//!
//! This crate provides the `Store` runtime that coordinates reducer
//! execution and effect handling. The store is the single writer for its
//! state: actions are applied one at a time under a write lock, so a
//! subscription callback can never observe or produce a half-applied
//! transition — the explicit replacement for the upstream pattern of
//! ambient callbacks mutating shared state.
//!
//! ## Core Components
//!
//! - **Store**: manages state and executes effects
//! - **Effect execution**: runs effect descriptions, feeding produced
//!   actions back into the reducer and broadcasting them to observers
//!
//! ## Example
//!
//! ```ignore
//! use obwira_runtime::Store;
//!
//! let store = Store::new(FeedState::default(), FeedReducer, environment);
//!
//! store.send(FeedAction::Snapshot(items)).await?;
//! let unread = store.state(|s| s.unread_count).await;
//! ```

use obwira_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

/// Error types for the Store runtime.
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations.
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions.
        #[error("store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete.
        #[error("shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a matching action.
        #[error("timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed.
        #[error("action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Health check status levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    /// Component is fully operational.
    Healthy,
    /// Component is operational but experiencing issues.
    Degraded,
    /// Component is not operational.
    Unhealthy,
}

impl HealthStatus {
    /// Check if status is healthy.
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Get the worst of two statuses.
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check result for a component.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Name of the component being checked.
    pub component: String,
    /// Current health status.
    pub status: HealthStatus,
    /// Optional message providing details.
    pub message: Option<String>,
}

impl HealthCheck {
    /// Create a healthy check result.
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    /// Create an unhealthy check result.
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// The Store runtime.
///
/// Holds state behind a write lock, runs the reducer for each action, and
/// executes the returned effects on the tokio runtime. Actions produced by
/// effects are fed back into the reducer and broadcast to observers.
///
/// # Type Parameters
///
/// - `S`: state type
/// - `A`: action type
/// - `E`: environment type
/// - `R`: reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: R,
    environment: E,
    shutdown: Arc<AtomicBool>,
    pending_effects: Arc<AtomicUsize>,
    /// Broadcasts actions produced by effects, for observers
    /// (request-response waits, live views).
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
    }

    /// Create a new store with a custom action broadcast capacity.
    ///
    /// Increase the capacity when observers are slow or numerous.
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity);
        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer,
            environment,
            shutdown: Arc::new(AtomicBool::new(false)),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            action_broadcast,
        }
    }

    /// Send an action through the reducer.
    ///
    /// The reducer runs under the state write lock; returned effects are
    /// spawned after the lock is released and complete in the background.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting
    /// down.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("rejected action: store is shutting down");
            return Err(StoreError::ShutdownInProgress);
        }

        metrics::counter!("store.actions.total").increment(1);

        let effects = {
            let mut state = self.state.write().await;
            let start = std::time::Instant::now();
            let effects = self.reducer.reduce(&mut state, action, &self.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());
            effects
        };

        tracing::trace!(count = effects.len(), "executing effects");
        for effect in effects {
            self.spawn_effect(effect);
        }
        Ok(())
    }

    /// Send an action and wait for a matching result action.
    ///
    /// Subscribes to the action broadcast before sending, then returns the
    /// first effect-produced action matching the predicate.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: no matching action within `timeout`
    /// - [`StoreError::ChannelClosed`]: broadcast closed (shutting down)
    /// - [`StoreError::ShutdownInProgress`]: store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        // Subscribe BEFORE sending to avoid a race with fast effects.
        let mut rx = self.action_broadcast.subscribe();
        self.send(action).await?;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to all actions produced by effects.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Read current state via a closure.
    ///
    /// The lock is released as soon as the closure returns:
    ///
    /// ```ignore
    /// let unread = store.state(|s| s.unread_count).await;
    /// ```
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Number of effects currently in flight.
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.pending_effects.load(Ordering::Acquire)
    }

    /// Wait until every in-flight effect has completed.
    ///
    /// # Errors
    ///
    /// [`StoreError::Timeout`] if effects are still running when the
    /// timeout elapses.
    pub async fn wait_until_idle(&self, timeout: Duration) -> Result<(), StoreError> {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.pending_effects() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return Err(StoreError::Timeout);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Ok(())
    }

    /// Initiate graceful shutdown: reject new actions, wait for in-flight
    /// effects to drain.
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownTimeout`] with the number of effects still
    /// running when the timeout elapsed.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.shutdown.store(true, Ordering::Release);
        tracing::info!("store shutdown initiated");

        match self.wait_until_idle(timeout).await {
            Ok(()) => Ok(()),
            Err(_) => Err(StoreError::ShutdownTimeout(self.pending_effects())),
        }
    }

    /// Health check for this store.
    #[must_use]
    pub fn health(&self, component: &str) -> HealthCheck {
        if self.shutdown.load(Ordering::Acquire) {
            HealthCheck::unhealthy(component, "shutting down")
        } else {
            HealthCheck::healthy(component)
        }
    }

    fn spawn_effect(&self, effect: Effect<A>) {
        self.pending_effects.fetch_add(1, Ordering::AcqRel);
        let store = self.clone();
        tokio::spawn(async move {
            store.run_effect(effect).await;
            store.pending_effects.fetch_sub(1, Ordering::AcqRel);
        });
    }

    fn run_effect(
        &self,
        effect: Effect<A>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            match effect {
                Effect::None => {},
                Effect::Parallel(effects) => {
                    futures::future::join_all(effects.into_iter().map(|e| self.run_effect(e)))
                        .await;
                },
                Effect::Sequential(effects) => {
                    for e in effects {
                        self.run_effect(e).await;
                    }
                },
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        // Broadcast first so request-response observers see
                        // the action even if a follow-up send is rejected.
                        let _ = self.action_broadcast.send(action.clone());
                        if let Err(err) = self.send(action).await {
                            tracing::warn!(error = %err, "dropping effect-produced action");
                        }
                    }
                },
            }
        })
    }
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: self.reducer.clone(),
            environment: self.environment.clone(),
            shutdown: Arc::clone(&self.shutdown),
            pending_effects: Arc::clone(&self.pending_effects),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use obwira_core::SmallVec;

    #[derive(Clone, Debug, Default)]
    struct CounterState {
        count: i64,
    }

    #[derive(Clone, Debug)]
    enum CounterAction {
        Increment,
        IncrementLater,
        Incremented,
    }

    #[derive(Clone)]
    struct CounterEnv;

    #[derive(Clone)]
    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = CounterEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CounterAction::Increment => {
                    state.count += 1;
                    SmallVec::new()
                },
                CounterAction::IncrementLater => {
                    let mut effects: SmallVec<[Effect<Self::Action>; 4]> = SmallVec::new();
                    effects.push(Effect::future(async {
                        Some(CounterAction::Incremented)
                    }));
                    effects
                },
                CounterAction::Incremented => {
                    state.count += 1;
                    SmallVec::new()
                },
            }
        }
    }

    fn store() -> Store<CounterState, CounterAction, CounterEnv, CounterReducer> {
        Store::new(CounterState::default(), CounterReducer, CounterEnv)
    }

    #[tokio::test]
    async fn send_applies_transition() {
        let store = store();
        store.send(CounterAction::Increment).await.unwrap();
        assert_eq!(store.state(|s| s.count).await, 1);
    }

    #[tokio::test]
    async fn effect_produced_action_feeds_back() {
        let store = store();
        let result = store
            .send_and_wait_for(
                CounterAction::IncrementLater,
                |a| matches!(a, CounterAction::Incremented),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert!(matches!(result, CounterAction::Incremented));
        store.wait_until_idle(Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.state(|s| s.count).await, 1);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = store();
        store.shutdown(Duration::from_secs(1)).await.unwrap();
        let err = store.send(CounterAction::Increment).await.unwrap_err();
        assert!(matches!(err, StoreError::ShutdownInProgress));
    }

    #[test]
    fn health_status_worst_prefers_unhealthy() {
        assert_eq!(
            HealthStatus::Healthy.worst(HealthStatus::Unhealthy),
            HealthStatus::Unhealthy
        );
        assert_eq!(
            HealthStatus::Degraded.worst(HealthStatus::Healthy),
            HealthStatus::Degraded
        );
    }
}
