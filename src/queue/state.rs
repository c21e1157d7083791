//! Per-id cache state.

use crate::types::ItemPayload;

/// What the cache knows about one id.
///
/// `Absent` means the loader answered and had no accessible record (revoked,
/// claimed elsewhere). It is distinct from `Unknown` so the id is not requested
/// again until it is explicitly resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PayloadState {
    #[default]
    Unknown,
    Pending,
    Present(ItemPayload),
    Absent,
}

impl PayloadState {
    pub fn is_unknown(&self) -> bool {
        matches!(self, PayloadState::Unknown)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PayloadState::Pending)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, PayloadState::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PayloadState::Absent)
    }

    /// Present or absent: the loader has answered for this id.
    pub fn is_settled(&self) -> bool {
        self.is_present() || self.is_absent()
    }

    pub fn payload(&self) -> Option<&ItemPayload> {
        match self {
            PayloadState::Present(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Payload state at the cursor, or a sentinel for an empty list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrentPayload<'a> {
    NoItems,
    Item(&'a PayloadState),
}

impl<'a> CurrentPayload<'a> {
    pub fn payload(&self) -> Option<&'a ItemPayload> {
        match self {
            CurrentPayload::NoItems => None,
            CurrentPayload::Item(state) => state.payload(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.payload().is_some()
    }
}
