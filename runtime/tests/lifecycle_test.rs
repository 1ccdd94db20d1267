//! Integration tests for teardown and subscription management.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use futures::stream::StreamExt;
use rxreactor_core::mutation::{self, MutationStream};
use rxreactor_core::{Context, Reactor, ReactorError};
use rxreactor_runtime::{Lifecycle, ReactorConfig, Scheduled, Store, StoreError};
use rxreactor_testing::{DEFAULT_TIMEOUT, Recorder};
use std::time::Duration;

/// Adds the action to the state after the given delay, optionally emitting a
/// "tick" effect every millisecond until then.
struct TimerReactor;

impl Reactor for TimerReactor {
    type Action = (u64, bool);
    type Mutation = u64;
    type State = u64;
    type Effect = &'static str;

    fn mutate(&self, (delay, ticking): (u64, bool), context: &Context<u64, &'static str>) -> MutationStream<u64> {
        if ticking {
            let ticks = futures::stream::repeat("tick")
                .then(|tick| async move {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    tick
                })
                .boxed();
            context.emit_effect_stream(ticks);
        }
        mutation::delayed(Duration::from_millis(delay), delay)
    }

    fn reduce(&self, state: &u64, mutation: u64) -> Result<u64, ReactorError> {
        Ok(state + mutation)
    }
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    let store = Store::new(TimerReactor, 0);
    assert_eq!(store.lifecycle(), Lifecycle::Connected);
    assert!(store.subscription_count() > 0);

    store.clear_subscriptions();
    store.clear_subscriptions();

    assert_eq!(store.lifecycle(), Lifecycle::TornDown);
    assert_eq!(store.subscription_count(), 0);
}

#[tokio::test]
async fn test_teardown_without_observers_does_not_fail() {
    let store = Store::with_config(TimerReactor, 0, ReactorConfig::new("unobserved")).unwrap();
    store.clear_subscriptions();
    assert_eq!(store.subscription_count(), 0);
}

#[tokio::test]
async fn test_observers_complete_on_teardown() {
    let store = Store::new(TimerReactor, 0);
    let states = Recorder::record(store.observe_state());
    let effects = Recorder::record(store.observe_effect());
    states.wait_for(1, DEFAULT_TIMEOUT).await.unwrap();

    store.clear_subscriptions();

    assert_eq!(states.wait_for_completion(DEFAULT_TIMEOUT).await.unwrap(), vec![0]);
    assert!(effects.wait_for_completion(DEFAULT_TIMEOUT).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_actions_after_teardown_are_ignored() {
    let store = Store::new(TimerReactor, 0);
    let states = Recorder::record(store.observe_state());
    store.submit((3, false));
    assert_eq!(states.wait_for(2, DEFAULT_TIMEOUT).await.unwrap(), vec![0, 3]);

    store.clear_subscriptions();

    assert_eq!(store.try_submit((5, false)), Err(StoreError::TornDown));
    store.submit((5, false));

    // A late observer gets the last state once, then completes.
    let late: Vec<u64> = store.observe_state().collect().await;
    assert_eq!(late, vec![3]);
    assert_eq!(store.current_state(), 3);
    assert!(store.observe_effect().next().await.is_none());
}

#[tokio::test]
async fn test_teardown_cancels_pending_mutations() {
    let store = Store::new(TimerReactor, 0);
    let states = Recorder::record(store.observe_state());

    store.submit((40, false));
    states.wait_for(1, DEFAULT_TIMEOUT).await.unwrap();
    store.clear_subscriptions();

    let observed = states.wait_for_completion(DEFAULT_TIMEOUT).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(observed, vec![0]);
    assert_eq!(store.current_state(), 0);
}

#[tokio::test]
async fn test_teardown_stops_effect_streams() {
    let store = Store::new(TimerReactor, 0);
    let effects = Recorder::record(store.observe_effect());

    store.submit((1_000, true));
    effects.wait_for(2, DEFAULT_TIMEOUT).await.unwrap();
    assert!(store.subscription_count() >= 3);

    store.clear_subscriptions();

    let received = effects.wait_for_completion(DEFAULT_TIMEOUT).await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(effects.len(), received);
    assert_eq!(store.subscription_count(), 0);
}

#[tokio::test]
async fn test_clones_share_teardown() {
    let store = Store::new(TimerReactor, 0);
    let handle = store.clone();

    handle.clear_subscriptions();

    assert_eq!(store.lifecycle(), Lifecycle::TornDown);
    assert_eq!(store.try_submit((1, false)), Err(StoreError::TornDown));
}

#[test]
fn test_store_can_run_on_a_dedicated_runtime() {
    let worker = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let main = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let observed = main.block_on(async {
        let reactor = Scheduled::new(TimerReactor, worker.handle().clone());
        let store = Store::spawn_on(worker.handle(), reactor, 0, ReactorConfig::new("worker")).unwrap();
        let states = Recorder::record(store.observe_state());

        store.submit((1, false));
        store.submit((2, false));

        let observed = states.wait_for(3, DEFAULT_TIMEOUT).await.unwrap();
        store.clear_subscriptions();
        observed
    });

    assert_eq!(observed.first(), Some(&0));
    assert_eq!(observed.last(), Some(&3));
}
