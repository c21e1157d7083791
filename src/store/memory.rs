//! In-memory contact store.
//!
//! Holds the records of one assignment in insertion order. List queries build an
//! [`EligibilityFilter`] from the current policy snapshot and clock on every call.
//! Records can be revoked to model contacts that were reassigned or claimed by
//! another agent; the loader then answers them as absent.

use crate::clock::Clock;
use crate::eligibility::{ContactsFilter, DefaultTimezone, EligibilityFilter, EligibilityPolicy};
use crate::error::LoadError;
use crate::queue::loader::{BatchLoader, BatchResult, ItemList, ListProvider};
use crate::types::{ItemId, ItemPayload, ItemStatus};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct MemoryContactStore {
    records: RwLock<Vec<ItemPayload>>,
    index: RwLock<HashMap<ItemId, usize>>,
    revoked: RwLock<HashSet<ItemId>>,
    policy: RwLock<EligibilityPolicy>,
    default_timezone: DefaultTimezone,
    clock: Arc<dyn Clock>,
    load_calls: AtomicUsize,
    failures_remaining: AtomicUsize,
}

impl MemoryContactStore {
    pub fn new(
        policy: EligibilityPolicy,
        default_timezone: DefaultTimezone,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            index: RwLock::new(HashMap::new()),
            revoked: RwLock::new(HashSet::new()),
            policy: RwLock::new(policy),
            default_timezone,
            clock,
            load_calls: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(0),
        }
    }

    /// Insert or replace a record. New ids go to the end of the list order.
    pub fn upsert(&self, payload: ItemPayload) {
        let mut records = self.records.write();
        let mut index = self.index.write();
        match index.get(&payload.id) {
            Some(&position) => records[position] = payload,
            None => {
                index.insert(payload.id.clone(), records.len());
                records.push(payload);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<ItemPayload> {
        let position = *self.index.read().get(id)?;
        self.records.read().get(position).cloned()
    }

    /// Change a record's message status, as another agent or a send would.
    pub fn set_status(&self, id: &ItemId, status: ItemStatus) -> bool {
        let Some(&position) = self.index.read().get(id) else {
            return false;
        };
        let mut records = self.records.write();
        match records.get_mut(position) {
            Some(record) => {
                record.status = status;
                record.updated_at = self.clock.now();
                true
            }
            None => false,
        }
    }

    /// Hide a record from the loader; it is answered as absent from now on.
    pub fn revoke(&self, id: &ItemId) {
        self.revoked.write().insert(id.clone());
    }

    pub fn restore(&self, id: &ItemId) {
        self.revoked.write().remove(id);
    }

    pub fn set_policy(&self, policy: EligibilityPolicy) {
        *self.policy.write() = policy;
    }

    /// Make the next `count` loader calls fail.
    pub fn fail_next_loads(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Loader calls served so far, failed ones included.
    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    fn eligibility_filter(&self) -> EligibilityFilter {
        EligibilityFilter::new(*self.policy.read(), self.default_timezone, Arc::clone(&self.clock))
    }

    fn take_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ListProvider for MemoryContactStore {
    async fn refresh(&self, filter: &ContactsFilter) -> Result<ItemList, LoadError> {
        let selection = self.eligibility_filter().timezone_selection(filter.valid_timezone);
        let records = self.records.read();
        let items: Vec<_> = records
            .iter()
            .filter(|record| filter.matches(&selection, record))
            .map(ItemPayload::summary)
            .collect();
        debug!(
            matched = items.len(),
            total = records.len(),
            "Listed contacts"
        );
        Ok(ItemList {
            items,
            total_count: records.len(),
        })
    }
}

#[async_trait]
impl BatchLoader for MemoryContactStore {
    async fn load(&self, ids: &[ItemId]) -> Result<BatchResult, LoadError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            return Err(LoadError::Unavailable("injected failure".to_string()));
        }

        let records = self.records.read();
        let index = self.index.read();
        let revoked = self.revoked.read();
        let result: BatchResult = ids
            .iter()
            .map(|id| {
                let payload = if revoked.contains(id) {
                    None
                } else {
                    index.get(id).and_then(|&position| records.get(position)).cloned()
                };
                (id.clone(), payload)
            })
            .collect();
        debug!(requested = ids.len(), "Loaded contact batch");
        Ok(result)
    }
}
