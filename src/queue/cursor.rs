//! Cursor derivation over item lists.

use crate::types::{ItemId, ItemStatus, ItemSummary};
use serde::{Deserialize, Serialize};

/// Re-derive the cursor after the ordered list is replaced.
///
/// The cursor follows the id it pointed at. If that id is gone, or the old cursor
/// was already out of range, it falls back to the front of the new list.
pub fn rederive_cursor(old: &[ItemSummary], new: &[ItemSummary], old_cursor: usize) -> usize {
    match old.get(old_cursor) {
        Some(current) => new
            .iter()
            .position(|item| item.id == current.id)
            .unwrap_or(0),
        None => 0,
    }
}

/// Where a session starts in a freshly loaded list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPosition {
    /// Open on this item (conversation review link).
    #[serde(default)]
    pub review_id: Option<ItemId>,
    /// Status filter the list was queried with.
    #[serde(default)]
    pub status_filter: Option<ItemStatus>,
    /// With the contacts sidebar enabled, open on the first item matching the
    /// status filter instead of the first item.
    #[serde(default)]
    pub contacts_sidebar: bool,
}

pub fn initial_cursor(items: &[ItemSummary], start: &StartPosition) -> usize {
    if let Some(review_id) = &start.review_id {
        return items
            .iter()
            .position(|item| &item.id == review_id)
            .unwrap_or(0);
    }
    match start.status_filter {
        Some(status) if start.contacts_sidebar && status != ItemStatus::NeedsMessage => items
            .iter()
            .position(|item| item.status == status)
            .unwrap_or(0),
        _ => 0,
    }
}
