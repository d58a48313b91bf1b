//! The Reducer trait — core abstraction for state transitions.
//!
//! Reducers are pure functions `(State, Action, Environment) → Effects`.
//! All shared in-memory state in the service (the notification feed, in
//! particular) is mutated exclusively inside a reducer, driven by actions
//! arriving on a channel — never from an ambient subscription callback.

use crate::effect::Effect;
use smallvec::SmallVec;

/// The Reducer trait.
///
/// # Type Parameters
///
/// - `State`: domain state this reducer operates on (owned data, `Clone`)
/// - `Action`: all possible inputs, including feedback from effects
/// - `Environment`: injected dependencies (clock, stores)
///
/// # Example
///
/// ```ignore
/// impl Reducer for FeedReducer {
///     type State = FeedState;
///     type Action = FeedAction;
///     type Environment = FeedEnvironment;
///
///     fn reduce(
///         &self,
///         state: &mut FeedState,
///         action: FeedAction,
///         env: &FeedEnvironment,
///     ) -> SmallVec<[Effect<FeedAction>; 4]> {
///         match action {
///             FeedAction::Snapshot(items) => {
///                 state.apply_snapshot(items);
///                 SmallVec::new()
///             }
///             _ => SmallVec::new(),
///         }
///     }
/// }
/// ```
pub trait Reducer {
    /// The state type this reducer operates on.
    type State;

    /// The action type this reducer processes.
    type Action;

    /// The environment type with injected dependencies.
    type Environment;

    /// Reduce an action into state changes and effects.
    ///
    /// This is a pure function that:
    /// 1. Validates the action
    /// 2. Updates state in place
    /// 3. Returns effect descriptions to be executed by the runtime
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]>;
}
