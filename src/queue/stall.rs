//! Stall recovery: what to do when the item at the cursor has no payload yet.
//!
//! The machine only decides. Arming a timer and re-entering [`StallRecovery::on_timer`]
//! after it fires is the driver's job, so the decisions can be tested without real
//! timers.

use crate::queue::cache::{BatchRequest, ContactQueueCache};
use crate::queue::state::{CurrentPayload, PayloadState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first re-check, and after any successful resolution.
    #[serde(default = "default_baseline_ms")]
    pub baseline_ms: u64,
    /// Hard cap on the doubled delay.
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

fn default_baseline_ms() -> u64 {
    200
}

fn default_max_ms() -> u64 {
    5000
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            baseline_ms: default_baseline_ms(),
            max_ms: default_max_ms(),
        }
    }
}

impl BackoffConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.baseline_ms == 0 {
            return Err("baseline_ms must be greater than zero".to_string());
        }
        if self.max_ms < self.baseline_ms {
            return Err(format!(
                "max_ms ({}) must be at least baseline_ms ({})",
                self.max_ms, self.baseline_ms
            ));
        }
        Ok(())
    }
}

/// Retry delay, doubled on each stall and capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    config: BackoffConfig,
    current_ms: u64,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            current_ms: config.baseline_ms,
        }
    }

    pub fn current_ms(&self) -> u64 {
        self.current_ms
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.current_ms)
    }

    pub fn is_baseline(&self) -> bool {
        self.current_ms == self.config.baseline_ms
    }

    pub fn reset(&mut self) {
        self.current_ms = self.config.baseline_ms;
    }

    pub fn grow(&mut self) -> Duration {
        self.current_ms = self.current_ms.saturating_mul(2).min(self.config.max_ms);
        self.delay()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StallState {
    #[default]
    Idle,
    Waiting {
        delay: Duration,
    },
}

/// Outcome of one stall-recovery step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StallAction {
    /// Nothing stalled.
    Idle,
    /// The current item's payload arrived while waiting.
    Resolved,
    /// The current item is confirmed absent; the cursor moved past it.
    Skipped {
        from: usize,
        to: usize,
        request: Option<BatchRequest>,
    },
    /// Still unresolved: wait `delay` and check again, running `request` if any.
    Retry {
        delay: Duration,
        request: Option<BatchRequest>,
    },
}

#[derive(Debug, Default)]
pub struct StallRecovery {
    state: StallState,
}

impl StallRecovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StallState {
        self.state
    }

    /// Enter `Waiting` if the current item is unresolved and return the delay to
    /// arm. Returns `None` when there is nothing to wait for.
    pub fn arm(&mut self, cache: &ContactQueueCache) -> Option<Duration> {
        match cache.current_payload() {
            CurrentPayload::NoItems | CurrentPayload::Item(PayloadState::Present(_)) => {
                self.state = StallState::Idle;
                None
            }
            CurrentPayload::Item(_) => {
                let delay = match self.state {
                    StallState::Waiting { delay } => delay,
                    StallState::Idle => {
                        let delay = cache.backoff().delay();
                        debug!(
                            cursor = cache.cursor(),
                            delay_ms = delay.as_millis() as u64,
                            "Current contact unresolved, waiting"
                        );
                        delay
                    }
                };
                self.state = StallState::Waiting { delay };
                Some(delay)
            }
        }
    }

    /// Re-check the current item after the armed delay elapsed.
    pub fn on_timer(&mut self, cache: &mut ContactQueueCache) -> StallAction {
        if self.state == StallState::Idle {
            return StallAction::Idle;
        }

        let (present, absent) = match cache.current_payload() {
            CurrentPayload::NoItems => {
                self.state = StallState::Idle;
                return StallAction::Idle;
            }
            CurrentPayload::Item(state) => (state.is_present(), state.is_absent()),
        };

        if present {
            cache.backoff_mut().reset();
            self.state = StallState::Idle;
            return StallAction::Resolved;
        }

        if absent && cache.has_next() {
            let from = cache.cursor();
            cache.move_cursor(1);
            let to = cache.cursor();
            info!(from, to, "Skipping unavailable contact");
            let request = cache.ensure_window_loaded(false);
            self.state = StallState::Idle;
            return StallAction::Skipped { from, to, request };
        }

        let delay = cache.backoff_mut().grow();
        warn!(
            cursor = cache.cursor(),
            absent,
            loading = cache.is_loading(),
            delay_ms = delay.as_millis() as u64,
            "Contact still unresolved, backing off"
        );
        let request = cache.ensure_window_loaded(true);
        self.state = StallState::Waiting { delay };
        StallAction::Retry { delay, request }
    }
}
