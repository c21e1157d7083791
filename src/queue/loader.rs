//! Collaborator contracts consumed by the queue session.

use crate::eligibility::ContactsFilter;
use crate::error::LoadError;
use crate::types::{ItemId, ItemPayload, ItemSummary};
use async_trait::async_trait;
use std::collections::HashMap;

/// Loader answer: `None` (or a missing key) means no accessible record for the id.
pub type BatchResult = HashMap<ItemId, Option<ItemPayload>>;

/// Bulk record retrieval for a set of ids.
#[async_trait]
pub trait BatchLoader: Send + Sync {
    async fn load(&self, ids: &[ItemId]) -> Result<BatchResult, LoadError>;
}

/// One snapshot of the ordered, eligibility-filtered contact list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemList {
    pub items: Vec<ItemSummary>,
    /// All contacts in the assignment, worked or not; drives "current of total".
    pub total_count: usize,
}

/// Supplies contact list snapshots.
#[async_trait]
pub trait ListProvider: Send + Sync {
    /// Query a fresh snapshot. Eligibility is evaluated at call time.
    async fn refresh(&self, filter: &ContactsFilter) -> Result<ItemList, LoadError>;
}
