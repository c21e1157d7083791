//! Progress display and request-more eligibility.

use crate::types::ItemStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressTotal {
    Known(usize),
    /// Dynamic assignment at the end of the list: more contacts may still arrive.
    Unknown,
}

impl fmt::Display for ProgressTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressTotal::Known(total) => write!(f, "{}", total),
            ProgressTotal::Unknown => f.write_str("?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub current_index: usize,
    pub total: ProgressTotal,
    pub title: String,
}

impl Progress {
    pub fn new(current_index: usize, total: ProgressTotal) -> Self {
        Self {
            current_index,
            total,
            title: format!("{} of {}", current_index, total),
        }
    }
}

/// Inputs deciding whether an agent may ask for more contacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMorePolicy {
    pub has_unassigned_contacts: bool,
    pub request_after_reply: bool,
    pub unmessaged_count: usize,
    pub unreplied_count: usize,
    pub second_pass_count: usize,
}

impl RequestMorePolicy {
    pub fn can_request_more(&self, status_filter: Option<ItemStatus>) -> bool {
        if !self.has_unassigned_contacts {
            return false;
        }
        match status_filter {
            Some(ItemStatus::NeedsMessage | ItemStatus::NeedsSecondPass) => !self.request_after_reply,
            Some(ItemStatus::NeedsResponse) => {
                self.request_after_reply
                    && self.unmessaged_count == 0
                    && self.unreplied_count == 0
                    && self.second_pass_count == 0
            }
            _ => false,
        }
    }
}
