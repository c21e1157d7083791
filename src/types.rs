//! Core value types shared by the eligibility filter and the contact queue cache.

use crate::error::PolicyError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest representable UTC offset (UTC-12:00), in minutes.
pub const MIN_OFFSET_MINUTES: i32 = -12 * 60;

/// Largest representable UTC offset (UTC+14:00), in minutes.
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Identifier of a contact work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        ItemId(id)
    }
}

/// Message status of a contact within its assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemStatus {
    NeedsMessage,
    NeedsResponse,
    NeedsSecondPass,
    Convo,
    Messaged,
    Closed,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::NeedsMessage => "needsMessage",
            ItemStatus::NeedsResponse => "needsResponse",
            ItemStatus::NeedsSecondPass => "needsSecondPass",
            ItemStatus::Convo => "convo",
            ItemStatus::Messaged => "messaged",
            ItemStatus::Closed => "closed",
        }
    }
}

/// A contact's UTC offset plus whether its zone observes daylight saving.
///
/// Offsets are bounded to the real-world range UTC-12:00..=UTC+14:00. Anything
/// outside that range is rejected at construction, deserialization included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTimezoneOffset")]
pub struct TimezoneOffset {
    offset_minutes: i32,
    observes_dst: bool,
}

#[derive(Deserialize)]
struct RawTimezoneOffset {
    offset_minutes: i32,
    observes_dst: bool,
}

impl TryFrom<RawTimezoneOffset> for TimezoneOffset {
    type Error = PolicyError;

    fn try_from(raw: RawTimezoneOffset) -> Result<Self, Self::Error> {
        Self::new(raw.offset_minutes, raw.observes_dst)
    }
}

impl TimezoneOffset {
    pub fn new(offset_minutes: i32, observes_dst: bool) -> Result<Self, PolicyError> {
        if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&offset_minutes) {
            return Err(PolicyError::OffsetOutOfRange(offset_minutes));
        }
        Ok(Self {
            offset_minutes,
            observes_dst,
        })
    }

    /// Convenience constructor for whole-hour offsets.
    pub fn from_hours(hours: i32, observes_dst: bool) -> Result<Self, PolicyError> {
        Self::new(hours.saturating_mul(60), observes_dst)
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }

    pub fn observes_dst(&self) -> bool {
        self.observes_dst
    }

    /// Key used by list queries to select contacts by timezone: `"{minutes}_{dst}"`.
    pub fn index_key(&self) -> String {
        format!("{}_{}", self.offset_minutes, self.observes_dst)
    }
}

/// Lightweight summary of one contact, as handed out by the list provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: ItemId,
    pub status: ItemStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl ItemSummary {
    pub fn new(id: impl Into<ItemId>, status: ItemStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status,
            updated_at,
            first_name: String::new(),
            last_name: String::new(),
        }
    }
}

/// Where a contact lives; the timezone drives eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub timezone: Option<TimezoneOffset>,
}

/// Full record for one contact, fetched lazily by the batch loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub id: ItemId,
    pub assignment_id: String,
    pub first_name: String,
    pub last_name: String,
    pub cell: String,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub custom_fields: serde_json::Value,
    #[serde(default)]
    pub opted_out: bool,
    #[serde(default)]
    pub location: ItemLocation,
    pub status: ItemStatus,
    pub updated_at: DateTime<Utc>,
}

impl ItemPayload {
    pub fn timezone(&self) -> Option<TimezoneOffset> {
        self.location.timezone
    }

    /// Project the payload down to the summary the list provider hands out.
    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.id.clone(),
            status: self.status,
            updated_at: self.updated_at,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}
