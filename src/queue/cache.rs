//! Windowed prefetch cache over an externally supplied ordered contact list.
//!
//! The cache owns an id -> [`PayloadState`] map, a cursor into the current list, and
//! the batching state that keeps the cursor's neighbourhood populated. It is a
//! synchronous state machine: [`ContactQueueCache::ensure_window_loaded`] hands back
//! the [`BatchRequest`] to run, and the caller reports the loader's answer through
//! [`ContactQueueCache::complete_batch`]. At most one batch is outstanding at a time.
//!
//! With `batch_get = 50` and `batch_forward = 25`, moving to item 0 loads items
//! 0..50; nothing more is fetched until the cursor reaches 25, at which point items
//! 50..100 are requested, so an in-order walk over n items issues about n / 50
//! loader calls.

use crate::error::LoadError;
use crate::queue::cursor::rederive_cursor;
use crate::queue::loader::BatchResult;
use crate::queue::progress::{Progress, ProgressTotal};
use crate::queue::stall::{Backoff, BackoffConfig};
use crate::queue::state::{CurrentPayload, PayloadState};
use crate::types::{ItemId, ItemSummary};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Batch sizing for the prefetch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How many ids one loader call covers.
    #[serde(default = "default_batch_get")]
    pub batch_get: usize,
    /// How far ahead of the cursor to look before fetching the next window.
    #[serde(default = "default_batch_forward")]
    pub batch_forward: usize,
}

fn default_batch_get() -> usize {
    50
}

fn default_batch_forward() -> usize {
    25
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            batch_get: default_batch_get(),
            batch_forward: default_batch_forward(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_get == 0 {
            return Err("batch_get must be greater than zero".to_string());
        }
        if self.batch_forward == 0 {
            return Err("batch_forward must be greater than zero".to_string());
        }
        // A look-ahead past the window end would leave unfetched gaps behind it.
        if self.batch_forward > self.batch_get {
            return Err(format!(
                "batch_forward ({}) must not exceed batch_get ({})",
                self.batch_forward, self.batch_get
            ));
        }
        Ok(())
    }
}

/// One loader invocation planned by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub batch_id: u64,
    /// List index the batch window starts at.
    pub start: usize,
    pub ids: Vec<ItemId>,
}

/// What happened when the agent finished an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// There was a next item; the cursor moved onto it.
    Advanced,
    /// Last item in the list: the list must be refreshed before continuing.
    RefreshRequired,
    /// Last item while reviewing a single conversation; nothing else to do.
    Finished,
}

static UNKNOWN: PayloadState = PayloadState::Unknown;

pub struct ContactQueueCache {
    config: CacheConfig,
    items: Arc<Vec<ItemSummary>>,
    total_count: usize,
    id_to_payload: HashMap<ItemId, PayloadState>,
    cursor: usize,
    /// Id of the outstanding batch, if any.
    loading: Option<u64>,
    /// Ids resolved while their batch was in flight; that batch's answer is stale.
    resolved_in_flight: HashSet<ItemId>,
    next_batch_id: u64,
    backoff: Backoff,
    last_resolved_id: Option<ItemId>,
    batches_issued: u64,
}

impl ContactQueueCache {
    pub fn new(config: CacheConfig, backoff: BackoffConfig) -> Self {
        Self {
            config,
            items: Arc::new(Vec::new()),
            total_count: 0,
            id_to_payload: HashMap::new(),
            cursor: 0,
            loading: None,
            resolved_in_flight: HashSet::new(),
            next_batch_id: 1,
            backoff: Backoff::new(backoff),
            last_resolved_id: None,
            batches_issued: 0,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn items(&self) -> &[ItemSummary] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub(crate) fn backoff_mut(&mut self) -> &mut Backoff {
        &mut self.backoff
    }

    pub fn last_resolved_id(&self) -> Option<&ItemId> {
        self.last_resolved_id.as_ref()
    }

    /// Number of batches planned over the cache's lifetime.
    pub fn batches_issued(&self) -> u64 {
        self.batches_issued
    }

    pub fn state_of(&self, id: &ItemId) -> &PayloadState {
        self.id_to_payload.get(id).unwrap_or(&UNKNOWN)
    }

    /// Replace the working list.
    ///
    /// The cursor follows its id into the new list. Payloads for ids still present
    /// are kept; entries for ids that dropped out are evicted.
    pub fn set_items(&mut self, items: impl Into<Arc<Vec<ItemSummary>>>, total_count: usize) {
        let items = items.into();
        let previous_cursor = self.cursor;
        self.cursor = rederive_cursor(&self.items, &items, previous_cursor);

        let present: HashSet<&ItemId> = items.iter().map(|item| &item.id).collect();
        let before = self.id_to_payload.len();
        self.id_to_payload
            .retain(|id, state| state.is_pending() || present.contains(id));
        let evicted = before - self.id_to_payload.len();

        debug!(
            previous_len = self.items.len(),
            new_len = items.len(),
            previous_cursor,
            cursor = self.cursor,
            evicted,
            "Replaced contact list"
        );
        self.items = items;
        self.total_count = total_count;
    }

    pub fn has_previous(&self) -> bool {
        self.cursor > 0
    }

    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.items.len()
    }

    /// Move the cursor by `delta`. Moves that would leave the list are ignored.
    pub fn move_cursor(&mut self, delta: isize) -> bool {
        match self
            .cursor
            .checked_add_signed(delta)
            .filter(|target| *target < self.items.len())
        {
            Some(target) => {
                self.cursor = target;
                true
            }
            None => {
                debug!(cursor = self.cursor, delta, len = self.items.len(), "Ignored cursor move");
                false
            }
        }
    }

    /// Point the cursor at `id`, or at the front when the id is not in the list.
    pub fn jump_to_id(&mut self, id: &ItemId) -> bool {
        match self.items.iter().position(|item| &item.id == id) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => {
                self.cursor = 0;
                false
            }
        }
    }

    /// Point the cursor at `index`, clamped into the list.
    pub fn seek(&mut self, index: usize) {
        self.cursor = index.min(self.items.len().saturating_sub(1));
    }

    pub fn current_item(&self) -> Option<&ItemSummary> {
        self.items.get(self.cursor)
    }

    pub fn current_payload(&self) -> CurrentPayload<'_> {
        if self.items.is_empty() {
            return CurrentPayload::NoItems;
        }
        match self.current_item() {
            Some(item) => CurrentPayload::Item(self.state_of(&item.id)),
            None => CurrentPayload::Item(&UNKNOWN),
        }
    }

    fn is_fetchable(&self, id: &ItemId) -> bool {
        self.state_of(id).is_unknown()
    }

    fn needs_fetch(&self, index: usize) -> bool {
        self.items
            .get(index)
            .is_some_and(|item| self.is_fetchable(&item.id))
    }

    /// Plan the next batch for the cursor's window, if one is needed.
    ///
    /// Fetches the window starting at the cursor when the cursor's own item is
    /// unknown; otherwise the window starting `batch_forward` ahead when that item
    /// is unknown. Only unknown ids are requested: `force` marks a stall-recovery
    /// retry in the logs but never re-requests pending or absent ids.
    pub fn ensure_window_loaded(&mut self, force: bool) -> Option<BatchRequest> {
        if let Some(batch_id) = self.loading {
            debug!(batch_id, cursor = self.cursor, "Batch outstanding, not planning another");
            return None;
        }

        let lookahead = self.cursor + self.config.batch_forward;
        let start = if self.needs_fetch(self.cursor) {
            self.cursor
        } else if self.needs_fetch(lookahead) {
            lookahead
        } else {
            return None;
        };

        let end = (start + self.config.batch_get).min(self.items.len());
        let ids: Vec<ItemId> = self.items[start..end]
            .iter()
            .filter(|item| self.is_fetchable(&item.id))
            .map(|item| item.id.clone())
            .collect();
        if ids.is_empty() {
            return None;
        }

        for id in &ids {
            self.id_to_payload.insert(id.clone(), PayloadState::Pending);
        }
        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;
        self.loading = Some(batch_id);
        self.batches_issued += 1;

        debug!(
            batch_id,
            cursor = self.cursor,
            start,
            count = ids.len(),
            force,
            "Planned contact batch"
        );
        Some(BatchRequest {
            batch_id,
            start,
            ids,
        })
    }

    /// Apply a loader answer for `request`.
    ///
    /// Ids the loader answered with a record become present; ids it left out or
    /// nulled become absent. A failed batch returns its ids to unknown. Results of
    /// a stale batch are applied all the same, except for ids resolved meanwhile.
    pub fn complete_batch(&mut self, request: &BatchRequest, result: Result<BatchResult, LoadError>) {
        if self.loading == Some(request.batch_id) {
            self.loading = None;
        } else {
            debug!(
                batch_id = request.batch_id,
                outstanding = ?self.loading,
                "Applying results of a stale batch"
            );
        }

        match result {
            Ok(mut records) => {
                let mut present = 0usize;
                let mut skipped = 0usize;
                for id in &request.ids {
                    if self.resolved_in_flight.remove(id) {
                        skipped += 1;
                        continue;
                    }
                    let state = match records.remove(id).flatten() {
                        Some(payload) => {
                            present += 1;
                            PayloadState::Present(payload)
                        }
                        None => PayloadState::Absent,
                    };
                    self.id_to_payload.insert(id.clone(), state);
                }
                if present > 0 {
                    self.backoff.reset();
                }
                debug!(
                    batch_id = request.batch_id,
                    requested = request.ids.len(),
                    present,
                    absent = request.ids.len() - present - skipped,
                    skipped,
                    "Applied contact batch"
                );
            }
            Err(err) => {
                for id in &request.ids {
                    self.resolved_in_flight.remove(id);
                    if let Some(state) = self.id_to_payload.get_mut(id) {
                        if state.is_pending() {
                            *state = PayloadState::Unknown;
                        }
                    }
                }
                warn!(
                    batch_id = request.batch_id,
                    requested = request.ids.len(),
                    error = %err,
                    "Contact batch failed, ids returned to unknown"
                );
            }
        }
    }

    /// Forget the cached payload for `id` so it is fetched again.
    ///
    /// If `id` is in the outstanding batch, that batch's answer for it is
    /// discarded when it arrives.
    pub fn resolve_item(&mut self, id: &ItemId) {
        let in_flight = self.state_of(id).is_pending();
        if in_flight {
            self.resolved_in_flight.insert(id.clone());
        }
        self.id_to_payload.insert(id.clone(), PayloadState::Unknown);
        debug!(item_id = %id, in_flight, "Resolved contact, cached payload dropped");
    }

    /// Mark `id` finished.
    ///
    /// With a next item, the entry is resolved and the cursor advances. On the
    /// last item the id is remembered as the last resolved one and, outside of
    /// review, the caller must refresh the list.
    pub fn finish_item(&mut self, id: &ItemId, review_mode: bool) -> FinishOutcome {
        if self.has_next() {
            self.last_resolved_id = None;
            self.resolve_item(id);
            self.move_cursor(1);
            return FinishOutcome::Advanced;
        }
        self.last_resolved_id = Some(id.clone());
        if review_mode {
            return FinishOutcome::Finished;
        }
        self.resolve_item(id);
        FinishOutcome::RefreshRequired
    }

    /// True when there is nothing left to work in the current list.
    pub fn is_finished(&self) -> bool {
        match self.current_item() {
            None => true,
            Some(item) => !self.has_next() && self.last_resolved_id.as_ref() == Some(&item.id),
        }
    }

    /// "current of total" progress, counting items already worked off the list.
    pub fn progress(&self, dynamic_assignment: bool) -> Progress {
        let worked = self.total_count.saturating_sub(self.items.len());
        let current_index = self.cursor + 1 + worked;
        let total = if dynamic_assignment && current_index == self.total_count {
            ProgressTotal::Unknown
        } else {
            ProgressTotal::Known(self.total_count)
        };
        Progress::new(current_index, total)
    }
}
