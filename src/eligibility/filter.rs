//! Contacts filter evaluated by the list query layer.
//!
//! The filter is rebuilt from a fresh policy snapshot and the current time on every
//! query, so crossing a window boundary changes the result of the next query.

use crate::clock::Clock;
use crate::eligibility::offsets::{
    classify_offsets, is_default_offset_valid, local_hour, DefaultTimezone, OffsetClassification,
};
use crate::eligibility::policy::EligibilityPolicy;
use crate::types::{ItemPayload, ItemStatus, TimezoneOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Index key selecting contacts whose timezone is unknown.
pub const MISSING_TIMEZONE_KEY: &str = "";

/// Query-time restrictions on which contacts a list contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsFilter {
    /// `Some(true)`: only currently textable timezones. `Some(false)`: only the rest.
    #[serde(default)]
    pub valid_timezone: Option<bool>,
    #[serde(default)]
    pub message_status: Option<ItemStatus>,
    #[serde(default)]
    pub is_opted_out: Option<bool>,
}

impl ContactsFilter {
    pub fn textable(message_status: ItemStatus) -> Self {
        Self {
            valid_timezone: Some(true),
            message_status: Some(message_status),
            is_opted_out: Some(false),
        }
    }

    pub fn matches(&self, selection: &TimezoneSelection, payload: &ItemPayload) -> bool {
        if let Some(status) = self.message_status {
            if payload.status != status {
                return false;
            }
        }
        if let Some(opted_out) = self.is_opted_out {
            if payload.opted_out != opted_out {
                return false;
            }
        }
        selection.contains(payload.timezone())
    }
}

/// Set of timezone index keys a query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimezoneSelection {
    Any,
    Keys(BTreeSet<String>),
}

impl TimezoneSelection {
    pub fn contains(&self, timezone: Option<TimezoneOffset>) -> bool {
        match self {
            TimezoneSelection::Any => true,
            TimezoneSelection::Keys(keys) => match timezone {
                Some(offset) => keys.contains(&offset.index_key()),
                None => keys.contains(MISSING_TIMEZONE_KEY),
            },
        }
    }

    pub fn includes_missing(&self) -> bool {
        self.contains(None)
    }
}

/// Evaluates a policy snapshot at the injected clock's current time.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    policy: EligibilityPolicy,
    default_timezone: DefaultTimezone,
    clock: Arc<dyn Clock>,
}

impl EligibilityFilter {
    pub fn new(
        policy: EligibilityPolicy,
        default_timezone: DefaultTimezone,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            default_timezone,
            clock,
        }
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn classify_offsets(&self) -> OffsetClassification {
        classify_offsets(&self.policy, self.clock.now())
    }

    pub fn is_default_offset_valid(&self) -> bool {
        is_default_offset_valid(&self.policy, self.default_timezone, self.clock.now())
    }

    /// Whether a single contact's timezone (or its absence) is eligible right now.
    pub fn is_eligible(&self, timezone: Option<TimezoneOffset>) -> bool {
        let now = self.clock.now();
        match timezone {
            Some(offset) => self.policy.is_hour_eligible(local_hour(offset, now)),
            None => is_default_offset_valid(&self.policy, self.default_timezone, now),
        }
    }

    /// Index keys selected by the `valid_timezone` part of a contacts filter.
    ///
    /// Missing timezones join the valid side when the default stand-in is valid,
    /// and the invalid side otherwise.
    pub fn timezone_selection(&self, valid_timezone: Option<bool>) -> TimezoneSelection {
        let Some(want_valid) = valid_timezone else {
            return TimezoneSelection::Any;
        };
        let classification = self.classify_offsets();
        let default_valid = self.is_default_offset_valid();
        let offsets = if want_valid {
            &classification.valid
        } else {
            &classification.invalid
        };
        let mut keys: BTreeSet<String> = offsets.iter().map(TimezoneOffset::index_key).collect();
        if default_valid == want_valid {
            keys.insert(MISSING_TIMEZONE_KEY.to_string());
        }
        debug!(
            want_valid,
            default_valid,
            key_count = keys.len(),
            "Built timezone selection"
        );
        TimezoneSelection::Keys(keys)
    }
}
