//! Integration tests for stall recovery against a live session
//!
//! Time is paused so backoff delays elapse instantly and deterministically.

use contact_queue::queue::{
    BackoffConfig, CacheConfig, CurrentPayload, QueueSession, SessionOptions, StallAction,
};
use contact_queue::store::MemoryContactStore;
use contact_queue::types::ItemId;
use std::sync::Arc;
use std::time::Duration;

use crate::integration::test_utils::open_store;

type Session = QueueSession<MemoryContactStore, MemoryContactStore>;

async fn open_session(store: &Arc<MemoryContactStore>) -> Session {
    QueueSession::open(
        Arc::clone(store),
        Arc::clone(store),
        CacheConfig::default(),
        BackoffConfig::default(),
        SessionOptions::default(),
    )
    .await
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_absent_contact_is_skipped_without_agent_action() {
    let (store, _clock) = open_store(3);
    store.revoke(&ItemId::new("c0"));

    let mut session = open_session(&store).await;
    assert!(session.next_completion().await);
    assert!(session.cache().state_of(&ItemId::new("c0")).is_absent());

    match session.tick().await {
        StallAction::Skipped { from, to, .. } => assert_eq!((from, to), (0, 1)),
        other => panic!("expected skip, got {:?}", other),
    }
    assert_eq!(session.cache().cursor(), 1);
    assert!(session.current_payload().is_ready());
    assert_eq!(session.tick().await, StallAction::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_absent_contacts_are_skipped_one_at_a_time() {
    let (store, _clock) = open_store(4);
    store.revoke(&ItemId::new("c0"));
    store.revoke(&ItemId::new("c1"));

    let mut session = open_session(&store).await;
    assert!(session.wait_until_ready(10).await);
    assert_eq!(session.cache().cursor(), 2);
    assert_eq!(
        session.current_payload().payload().map(|p| p.id.clone()),
        Some(ItemId::new("c2"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_to_cap_and_resets_on_success() {
    let (store, _clock) = open_store(2);
    store.fail_next_loads(usize::MAX);

    let mut session = open_session(&store).await;
    let mut delays = Vec::new();
    for _ in 0..7 {
        match session.tick().await {
            StallAction::Retry { delay, .. } => delays.push(delay.as_millis() as u64),
            other => panic!("expected retry, got {:?}", other),
        }
    }
    assert_eq!(delays, vec![400, 800, 1600, 3200, 5000, 5000, 5000]);
    assert_eq!(session.cache().backoff().current_ms(), 5000);
    assert!(store.load_calls() >= 2);

    store.fail_next_loads(0);
    assert!(session.wait_until_ready(10).await);
    assert!(session.cache().backoff().is_baseline());
    assert_eq!(session.tick().await, StallAction::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_single_failure_recovers_on_retry() {
    let (store, _clock) = open_store(3);
    store.fail_next_loads(1);

    let mut session = open_session(&store).await;
    assert!(session.next_completion().await);
    // The failed ids went back to unknown and were immediately re-planned.
    assert!(session.cache().is_loading());
    assert!(session.cache().state_of(&ItemId::new("c0")).is_pending());

    assert!(session.wait_until_ready(5).await);
    assert_eq!(store.load_calls(), 2);
    assert!(session.cache().backoff().is_baseline());
}

#[tokio::test(start_paused = true)]
async fn test_absent_last_contact_waits_instead_of_skipping() {
    let (store, _clock) = open_store(1);
    store.revoke(&ItemId::new("c0"));

    let mut session = open_session(&store).await;
    assert!(session.next_completion().await);
    match session.tick().await {
        StallAction::Retry { delay, request } => {
            assert_eq!(delay, Duration::from_millis(400));
            assert!(request.is_none());
        }
        other => panic!("expected retry, got {:?}", other),
    }
    assert_eq!(session.cache().cursor(), 0);
    assert!(matches!(session.current_payload(), CurrentPayload::Item(state) if state.is_absent()));
}

#[tokio::test(start_paused = true)]
async fn test_empty_list_never_stalls() {
    let (store, _clock) = open_store(0);
    let mut session = open_session(&store).await;
    assert_eq!(session.current_payload(), CurrentPayload::NoItems);
    assert_eq!(session.tick().await, StallAction::Idle);
    assert!(!session.wait_until_ready(3).await);
    assert_eq!(store.load_calls(), 0);
}
