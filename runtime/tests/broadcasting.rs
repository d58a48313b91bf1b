//! Integration tests for store action broadcasting.
//!
//! Exercises the observation surface request handlers rely on: waiting for
//! an effect-produced action, observing actions from the outside, and the
//! idle/shutdown lifecycle.

#![allow(clippy::unwrap_used)]

use obwira_core::{effect::Effect, reducer::Reducer, SmallVec};
use obwira_runtime::{Store, StoreError};
use std::time::Duration;

#[derive(Clone, Debug, Default)]
struct JobState {
    started: usize,
    finished: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum JobAction {
    Start(u64),
    Finished(u64),
}

#[derive(Clone, Copy, Default)]
struct JobReducer;

impl Reducer for JobReducer {
    type State = JobState;
    type Action = JobAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut JobState,
        action: JobAction,
        _env: &(),
    ) -> SmallVec<[Effect<JobAction>; 4]> {
        match action {
            JobAction::Start(id) => {
                state.started += 1;
                let mut effects = SmallVec::new();
                effects.push(Effect::future(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Some(JobAction::Finished(id))
                }));
                effects
            },
            JobAction::Finished(_) => {
                state.finished += 1;
                SmallVec::new()
            },
        }
    }
}

#[tokio::test]
async fn send_and_wait_for_returns_the_matching_completion() {
    let store = Store::new(JobState::default(), JobReducer, ());

    let action = store
        .send_and_wait_for(
            JobAction::Start(7),
            |a| matches!(a, JobAction::Finished(7)),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(action, JobAction::Finished(7));
    assert_eq!(store.state(|s| s.finished).await, 1);
}

#[tokio::test]
async fn observers_see_effect_produced_actions() {
    let store = Store::new(JobState::default(), JobReducer, ());
    let mut rx = store.subscribe_actions();

    store.send(JobAction::Start(1)).await.unwrap();
    store.send(JobAction::Start(2)).await.unwrap();
    store.wait_until_idle(Duration::from_secs(1)).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(action) = rx.try_recv() {
        seen.push(action);
    }
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|a| matches!(a, JobAction::Finished(_))));
}

#[tokio::test]
async fn wait_for_times_out_when_nothing_matches() {
    let store = Store::new(JobState::default(), JobReducer, ());

    let result = store
        .send_and_wait_for(
            JobAction::Start(1),
            |a| matches!(a, JobAction::Finished(99)),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn shutdown_rejects_sends_after_draining() {
    let store = Store::new(JobState::default(), JobReducer, ());
    for id in 0..4 {
        store.send(JobAction::Start(id)).await.unwrap();
    }
    store.wait_until_idle(Duration::from_secs(1)).await.unwrap();
    assert_eq!(store.state(|s| s.finished).await, 4);

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    let result = store.send(JobAction::Start(9)).await;
    assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
}
