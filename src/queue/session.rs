//! Queue session: drives one agent's cache against the loader and list provider.
//!
//! All cursor and cache mutation happens on the caller's task. Batch fetches are
//! the only suspension point: each planned batch is spawned onto the runtime and
//! its answer comes back over a channel, to be applied on the next poll. Callers
//! poll [`QueueSession::current_payload`] after every mutating call; nothing is
//! pushed to them.

use crate::config::QueueConfig;
use crate::eligibility::ContactsFilter;
use crate::error::{LoadError, QueueError};
use crate::queue::cache::{BatchRequest, CacheConfig, ContactQueueCache, FinishOutcome};
use crate::queue::cursor::{initial_cursor, StartPosition};
use crate::queue::loader::{BatchLoader, BatchResult, ListProvider};
use crate::queue::progress::{Progress, RequestMorePolicy};
use crate::queue::stall::{BackoffConfig, StallAction, StallRecovery};
use crate::queue::state::CurrentPayload;
use crate::types::ItemId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info};

/// How a session queries its list and where it starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    #[serde(default)]
    pub filter: ContactsFilter,
    #[serde(default)]
    pub start: StartPosition,
    /// Reviewing a single conversation: finishing the last item does not refresh.
    #[serde(default)]
    pub review_mode: bool,
    /// Campaign hands out contacts dynamically, so the total may still grow.
    #[serde(default)]
    pub dynamic_assignment: bool,
}

impl SessionOptions {
    /// Options for working `filter`, with the sidebar flag taken from configuration.
    pub fn from_config(config: &QueueConfig, filter: ContactsFilter) -> Self {
        Self {
            filter,
            start: StartPosition {
                review_id: None,
                status_filter: filter.message_status,
                contacts_sidebar: config.eligibility.contacts_sidebar,
            },
            review_mode: false,
            dynamic_assignment: false,
        }
    }
}

struct BatchCompletion {
    request: BatchRequest,
    result: Result<BatchResult, LoadError>,
}

pub struct QueueSession<L, P> {
    cache: ContactQueueCache,
    stall: StallRecovery,
    loader: Arc<L>,
    provider: Arc<P>,
    options: SessionOptions,
    completions_tx: mpsc::UnboundedSender<BatchCompletion>,
    completions_rx: mpsc::UnboundedReceiver<BatchCompletion>,
}

impl<L, P> QueueSession<L, P>
where
    L: BatchLoader + 'static,
    P: ListProvider,
{
    /// Query the first list snapshot, position the cursor, and start loading.
    pub async fn open(
        loader: Arc<L>,
        provider: Arc<P>,
        cache_config: CacheConfig,
        backoff_config: BackoffConfig,
        options: SessionOptions,
    ) -> Result<Self, QueueError> {
        cache_config.validate().map_err(QueueError::ConfigError)?;
        backoff_config.validate().map_err(QueueError::ConfigError)?;

        let list = provider.refresh(&options.filter).await?;
        let start = initial_cursor(&list.items, &options.start);
        let mut cache = ContactQueueCache::new(cache_config, backoff_config);
        cache.set_items(list.items, list.total_count);
        cache.seek(start);

        info!(
            items = cache.len(),
            total = cache.total_count(),
            cursor = cache.cursor(),
            review_mode = options.review_mode,
            "Opened contact queue session"
        );

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let mut session = Self {
            cache,
            stall: StallRecovery::new(),
            loader,
            provider,
            options,
            completions_tx,
            completions_rx,
        };
        session.load_window(false);
        Ok(session)
    }

    /// Open using the cache and backoff sections of a loaded configuration.
    pub async fn open_with_config(
        loader: Arc<L>,
        provider: Arc<P>,
        config: &QueueConfig,
        options: SessionOptions,
    ) -> Result<Self, QueueError> {
        Self::open(loader, provider, config.cache, config.backoff, options).await
    }

    pub fn cache(&self) -> &ContactQueueCache {
        &self.cache
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn current_payload(&self) -> CurrentPayload<'_> {
        self.cache.current_payload()
    }

    pub fn has_next(&self) -> bool {
        self.cache.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.cache.has_previous()
    }

    pub fn progress(&self) -> Progress {
        self.cache.progress(self.options.dynamic_assignment)
    }

    pub fn title(&self) -> String {
        self.progress().title
    }

    pub fn is_finished(&self) -> bool {
        self.cache.is_finished()
    }

    pub fn can_request_more(&self, policy: &RequestMorePolicy) -> bool {
        policy.can_request_more(self.options.filter.message_status)
    }

    fn dispatch(&self, request: BatchRequest) {
        let loader = Arc::clone(&self.loader);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = loader.load(&request.ids).await;
            // The receiver only goes away with the session itself.
            let _ = tx.send(BatchCompletion { request, result });
        });
    }

    fn load_window(&mut self, force: bool) -> bool {
        match self.cache.ensure_window_loaded(force) {
            Some(request) => {
                self.dispatch(request);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, completion: BatchCompletion) {
        self.cache
            .complete_batch(&completion.request, completion.result);
    }

    /// Apply every batch answer that has arrived, then top up the window.
    pub fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        if applied > 0 {
            self.load_window(false);
        }
        applied
    }

    /// Wait for the outstanding batch, if any, and apply it.
    pub async fn next_completion(&mut self) -> bool {
        if !self.cache.is_loading() {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                self.load_window(false);
                true
            }
            None => false,
        }
    }

    fn after_cursor_change(&mut self) {
        self.stall = StallRecovery::new();
        self.poll_completions();
        self.load_window(false);
    }

    pub fn move_cursor(&mut self, delta: isize) -> bool {
        let moved = self.cache.move_cursor(delta);
        if moved {
            self.after_cursor_change();
        }
        moved
    }

    pub fn move_next(&mut self) -> bool {
        self.move_cursor(1)
    }

    pub fn move_previous(&mut self) -> bool {
        self.move_cursor(-1)
    }

    pub fn jump_to_id(&mut self, id: &ItemId) -> bool {
        let found = self.cache.jump_to_id(id);
        self.after_cursor_change();
        found
    }

    /// Drop the cached payload for an item mutated elsewhere and reload it.
    pub fn resolve_item(&mut self, id: &ItemId) {
        self.cache.resolve_item(id);
        self.load_window(false);
    }

    /// Re-query the list and re-derive the cursor against the new snapshot.
    pub async fn refresh(&mut self) -> Result<(), QueueError> {
        let list = self.provider.refresh(&self.options.filter).await?;
        self.cache.set_items(list.items, list.total_count);
        self.after_cursor_change();
        Ok(())
    }

    /// The agent is done with `id`: move on, or refresh when it was the last one.
    pub async fn finish_item(&mut self, id: &ItemId) -> Result<FinishOutcome, QueueError> {
        let outcome = self.cache.finish_item(id, self.options.review_mode);
        debug!(item_id = %id, outcome = ?outcome, "Finished contact");
        match outcome {
            FinishOutcome::Advanced => self.after_cursor_change(),
            FinishOutcome::RefreshRequired => self.refresh().await?,
            FinishOutcome::Finished => {}
        }
        Ok(outcome)
    }

    /// Run one stall-recovery step.
    ///
    /// Yields once so finished fetches can report, and if the current item is still
    /// unresolved waits out the backoff delay before re-checking it.
    pub async fn tick(&mut self) -> StallAction {
        tokio::task::yield_now().await;
        self.poll_completions();

        let Some(delay) = self.stall.arm(&self.cache) else {
            return StallAction::Idle;
        };
        sleep(delay).await;
        self.poll_completions();

        let action = self.stall.on_timer(&mut self.cache);
        match &action {
            StallAction::Skipped {
                request: Some(request),
                ..
            }
            | StallAction::Retry {
                request: Some(request),
                ..
            } => self.dispatch(request.clone()),
            _ => {}
        }
        action
    }

    /// Tick until the current item has a payload or the list is empty.
    ///
    /// Returns whether a payload is ready after at most `max_ticks` steps.
    pub async fn wait_until_ready(&mut self, max_ticks: usize) -> bool {
        for _ in 0..max_ticks {
            match self.current_payload() {
                CurrentPayload::NoItems => return false,
                current if current.is_ready() => return true,
                _ => {}
            }
            self.tick().await;
        }
        self.current_payload().is_ready()
    }
}
