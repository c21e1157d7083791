//! Shared fixtures for integration tests
//!
//! Builds contact records, in-memory stores, and environment guards so individual
//! test files stay focused on behavior.

use chrono::{DateTime, TimeZone, Utc};
use contact_queue::clock::FixedClock;
use contact_queue::eligibility::{DefaultTimezone, EligibilityPolicy};
use contact_queue::queue::{BatchRequest, BatchResult};
use contact_queue::store::MemoryContactStore;
use contact_queue::types::{
    ItemId, ItemLocation, ItemPayload, ItemStatus, ItemSummary, TimezoneOffset,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// Serializes tests that read or write process environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

/// Restores the listed environment variables when dropped.
pub struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    pub fn capture(keys: &[&'static str]) -> Self {
        Self {
            saved: keys.iter().map(|k| (*k, std::env::var(k).ok())).collect(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn summaries(n: usize) -> Vec<ItemSummary> {
    (0..n)
        .map(|i| ItemSummary::new(format!("c{i}"), ItemStatus::NeedsMessage, epoch()))
        .collect()
}

pub fn contact(id: &str, timezone: Option<TimezoneOffset>) -> ItemPayload {
    ItemPayload {
        id: ItemId::new(id),
        assignment_id: "assignment-1".to_string(),
        first_name: format!("First {id}"),
        last_name: "Last".to_string(),
        cell: "+15555550100".to_string(),
        zip: None,
        custom_fields: serde_json::json!({ "source": "fixture" }),
        opted_out: false,
        location: ItemLocation {
            timezone,
            ..Default::default()
        },
        status: ItemStatus::NeedsMessage,
        updated_at: epoch(),
    }
}

/// Answer every id in `request` with a record.
pub fn answer_all(request: &BatchRequest) -> BatchResult {
    request
        .ids
        .iter()
        .map(|id| (id.clone(), Some(contact(id.as_str(), None))))
        .collect()
}

/// A store with unenforced texting hours holding contacts `c0..cn`.
pub fn open_store(n: usize) -> (Arc<MemoryContactStore>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 1, 15, 17, 0, 0).unwrap(),
    ));
    let store = MemoryContactStore::new(
        EligibilityPolicy::unenforced(),
        DefaultTimezone::Fixed(TimezoneOffset::from_hours(-5, true).unwrap()),
        clock.clone(),
    );
    for i in 0..n {
        store.upsert(contact(&format!("c{i}"), None));
    }
    (Arc::new(store), clock)
}
