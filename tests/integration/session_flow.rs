//! Integration tests for an agent working through a queue session

use contact_queue::config::{ConfigLoader, QueueConfig};
use contact_queue::eligibility::ContactsFilter;
use contact_queue::queue::{
    BackoffConfig, CacheConfig, CurrentPayload, FinishOutcome, ProgressTotal, QueueSession,
    RequestMorePolicy, SessionOptions, StartPosition,
};
use contact_queue::store::MemoryContactStore;
use contact_queue::types::{ItemId, ItemStatus};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use crate::integration::test_utils::open_store;

type Session = QueueSession<MemoryContactStore, MemoryContactStore>;

fn needs_message() -> ContactsFilter {
    ContactsFilter {
        message_status: Some(ItemStatus::NeedsMessage),
        ..Default::default()
    }
}

async fn open_with(store: &Arc<MemoryContactStore>, options: SessionOptions) -> Session {
    QueueSession::open(
        Arc::clone(store),
        Arc::clone(store),
        CacheConfig::default(),
        BackoffConfig::default(),
        options,
    )
    .await
    .unwrap()
}

fn current_id(session: &Session) -> Option<String> {
    session
        .current_payload()
        .payload()
        .map(|p| p.id.as_str().to_string())
}

#[tokio::test]
async fn test_send_and_advance_through_list() {
    let (store, _clock) = open_store(3);
    let options = SessionOptions {
        filter: needs_message(),
        ..Default::default()
    };
    let mut session = open_with(&store, options).await;
    assert!(session.next_completion().await);
    assert_eq!(current_id(&session).as_deref(), Some("c0"));
    assert_eq!(session.title(), "1 of 3");
    assert!(!session.has_previous());
    assert!(session.has_next());

    store.set_status(&ItemId::new("c0"), ItemStatus::Messaged);
    let outcome = session.finish_item(&ItemId::new("c0")).await.unwrap();
    assert_eq!(outcome, FinishOutcome::Advanced);
    assert_eq!(session.cache().cursor(), 1);
    assert!(session.has_previous());

    // Refreshing drops the worked contact; the cursor follows c1 to the front.
    session.refresh().await.unwrap();
    assert_eq!(session.cache().len(), 2);
    assert_eq!(session.cache().cursor(), 0);
    assert_eq!(current_id(&session).as_deref(), Some("c1"));
    assert_eq!(session.title(), "2 of 3");
}

#[tokio::test]
async fn test_finishing_last_contact_refreshes_list() {
    let (store, _clock) = open_store(2);
    let options = SessionOptions {
        filter: needs_message(),
        ..Default::default()
    };
    let mut session = open_with(&store, options).await;
    assert!(session.next_completion().await);

    store.set_status(&ItemId::new("c0"), ItemStatus::Messaged);
    session.finish_item(&ItemId::new("c0")).await.unwrap();
    store.set_status(&ItemId::new("c1"), ItemStatus::Messaged);
    let outcome = session.finish_item(&ItemId::new("c1")).await.unwrap();

    assert_eq!(outcome, FinishOutcome::RefreshRequired);
    assert!(session.cache().is_empty());
    assert_eq!(session.current_payload(), CurrentPayload::NoItems);
    assert!(session.is_finished());
}

#[tokio::test]
async fn test_new_assignments_extend_list_on_refresh() {
    let (store, _clock) = open_store(1);
    let options = SessionOptions {
        filter: needs_message(),
        ..Default::default()
    };
    let mut session = open_with(&store, options).await;
    assert!(session.next_completion().await);

    // More contacts were assigned while the agent worked the last one.
    store.upsert(crate::integration::test_utils::contact("c1", None));
    store.set_status(&ItemId::new("c0"), ItemStatus::Messaged);
    let outcome = session.finish_item(&ItemId::new("c0")).await.unwrap();
    assert_eq!(outcome, FinishOutcome::RefreshRequired);
    assert!(!session.is_finished());
    assert_eq!(session.cache().len(), 1);
    assert!(session.next_completion().await);
    assert_eq!(current_id(&session).as_deref(), Some("c1"));
}

#[tokio::test]
async fn test_review_mode_finishes_without_refresh() {
    let (store, _clock) = open_store(3);
    let options = SessionOptions {
        start: StartPosition {
            review_id: Some(ItemId::new("c2")),
            ..Default::default()
        },
        review_mode: true,
        ..Default::default()
    };
    let mut session = open_with(&store, options).await;
    assert_eq!(session.cache().cursor(), 2);
    assert!(session.next_completion().await);
    assert_eq!(current_id(&session).as_deref(), Some("c2"));

    let outcome = session.finish_item(&ItemId::new("c2")).await.unwrap();
    assert_eq!(outcome, FinishOutcome::Finished);
    assert!(session.is_finished());
    assert_eq!(session.cache().len(), 3);
}

#[tokio::test]
async fn test_sidebar_opens_on_first_matching_status() {
    let (store, _clock) = open_store(4);
    store.set_status(&ItemId::new("c2"), ItemStatus::NeedsResponse);

    let mut config = QueueConfig::default();
    config.eligibility.contacts_sidebar = true;
    let mut options = SessionOptions::from_config(&config, ContactsFilter::default());
    options.start.status_filter = Some(ItemStatus::NeedsResponse);

    let session = open_with(&store, options).await;
    assert_eq!(session.cache().cursor(), 2);
}

#[tokio::test]
async fn test_navigation_and_jump() {
    let (store, _clock) = open_store(5);
    let mut session = open_with(&store, SessionOptions::default()).await;

    assert!(!session.move_previous());
    assert!(session.move_next());
    assert!(session.move_next());
    assert_eq!(session.cache().cursor(), 2);

    assert!(session.jump_to_id(&ItemId::new("c4")));
    assert_eq!(session.cache().cursor(), 4);
    assert!(!session.move_next());

    assert!(!session.jump_to_id(&ItemId::new("missing")));
    assert_eq!(session.cache().cursor(), 0);
}

#[tokio::test]
async fn test_resolve_item_reloads_updated_record() {
    let (store, _clock) = open_store(2);
    let mut session = open_with(&store, SessionOptions::default()).await;
    assert!(session.next_completion().await);
    let calls = store.load_calls();

    store.set_status(&ItemId::new("c0"), ItemStatus::Convo);
    session.resolve_item(&ItemId::new("c0"));
    assert!(session.next_completion().await);

    assert_eq!(store.load_calls(), calls + 1);
    let payload = session.current_payload().payload().cloned().unwrap();
    assert_eq!(payload.status, ItemStatus::Convo);
}

#[tokio::test]
async fn test_dynamic_assignment_shows_unknown_total_at_end() {
    let (store, _clock) = open_store(2);
    let options = SessionOptions {
        dynamic_assignment: true,
        ..Default::default()
    };
    let mut session = open_with(&store, options).await;
    assert_eq!(session.progress().total, ProgressTotal::Known(2));

    session.move_next();
    assert_eq!(session.progress().total, ProgressTotal::Unknown);
    assert_eq!(session.title(), "2 of ?");
}

#[tokio::test]
async fn test_request_more_follows_status_filter() {
    let (store, _clock) = open_store(1);
    let session = open_with(
        &store,
        SessionOptions {
            filter: needs_message(),
            ..Default::default()
        },
    )
    .await;

    let policy = RequestMorePolicy {
        has_unassigned_contacts: true,
        ..Default::default()
    };
    assert!(session.can_request_more(&policy));
    assert!(!session.can_request_more(&RequestMorePolicy::default()));
}

#[tokio::test]
async fn test_open_with_loaded_config_uses_its_window() {
    let dir = TempDir::new().unwrap();
    let config_file = dir.path().join("contact-queue.toml");
    fs::write(&config_file, "[cache]\nbatch_get = 2\nbatch_forward = 1\n").unwrap();
    let config = ConfigLoader::load_from_file(&config_file).unwrap();

    let (store, _clock) = open_store(5);
    let options = SessionOptions::from_config(&config, needs_message());
    let mut session = QueueSession::open_with_config(
        Arc::clone(&store),
        Arc::clone(&store),
        &config,
        options,
    )
    .await
    .unwrap();
    assert_eq!(session.cache().config().batch_get, 2);

    assert!(session.next_completion().await);
    let cache = session.cache();
    assert!(cache.state_of(&ItemId::new("c1")).is_present());
    assert!(cache.state_of(&ItemId::new("c2")).is_unknown());
    assert_eq!(store.load_calls(), 1);
}
