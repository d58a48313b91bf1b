//! Effect descriptions.
//!
//! Effects are NOT executed when a reducer returns them. They are values
//! describing what should happen, executed by the `Store` runtime in
//! `obwira-runtime`. An effect may produce a follow-up action which is fed
//! back into the reducer.

use std::future::Future;
use std::pin::Pin;

/// A side effect to be executed by the runtime.
///
/// # Type Parameters
///
/// - `Action`: the action type effects can produce (feedback loop)
pub enum Effect<Action> {
    /// No-op effect.
    None,

    /// Run effects concurrently.
    Parallel(Vec<Effect<Action>>),

    /// Run effects one after another.
    Sequential(Vec<Effect<Action>>),

    /// Arbitrary async computation.
    ///
    /// Returns `Option<Action>` — if `Some`, the action is fed back into
    /// the reducer. Fire-and-forget work (the notification "mark as read"
    /// write) returns `None`.
    Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
}

// Manual Debug since Future doesn't implement it.
impl<Action> std::fmt::Debug for Effect<Action>
where
    Action: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "Effect::None"),
            Self::Parallel(effects) => f.debug_tuple("Effect::Parallel").field(effects).finish(),
            Self::Sequential(effects) => {
                f.debug_tuple("Effect::Sequential").field(effects).finish()
            },
            Self::Future(_) => write!(f, "Effect::Future(<future>)"),
        }
    }
}

impl<Action> Effect<Action> {
    /// Combine effects to run concurrently.
    #[must_use]
    pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
        Effect::Parallel(effects)
    }

    /// Chain effects to run sequentially.
    #[must_use]
    pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
        Effect::Sequential(effects)
    }

    /// Wrap an async computation.
    pub fn future<F>(fut: F) -> Effect<Action>
    where
        F: Future<Output = Option<Action>> + Send + 'static,
    {
        Effect::Future(Box::pin(fut))
    }
}
