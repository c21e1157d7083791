//! Texting-hours policy window.

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};

/// Local-time window during which contacts may be surfaced.
///
/// The window is `[start_hour, end_hour)`. When `end_hour <= start_hour` the window
/// wraps past midnight, so `22..6` covers 22:00 through 05:59. An unenforced policy
/// admits every hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEligibilityPolicy")]
pub struct EligibilityPolicy {
    start_hour: u32,
    end_hour: u32,
    enforced: bool,
}

#[derive(Deserialize)]
struct RawEligibilityPolicy {
    start_hour: u32,
    end_hour: u32,
    enforced: bool,
}

impl TryFrom<RawEligibilityPolicy> for EligibilityPolicy {
    type Error = PolicyError;

    fn try_from(raw: RawEligibilityPolicy) -> Result<Self, Self::Error> {
        Self::new(raw.start_hour, raw.end_hour, raw.enforced)
    }
}

impl EligibilityPolicy {
    pub fn new(start_hour: u32, end_hour: u32, enforced: bool) -> Result<Self, PolicyError> {
        if start_hour >= 24 {
            return Err(PolicyError::InvalidStartHour(start_hour));
        }
        if end_hour >= 24 {
            return Err(PolicyError::InvalidEndHour(end_hour));
        }
        Ok(Self {
            start_hour,
            end_hour,
            enforced,
        })
    }

    /// Policy that admits every hour.
    pub fn unenforced() -> Self {
        Self {
            start_hour: 0,
            end_hour: 0,
            enforced: false,
        }
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn enforced(&self) -> bool {
        self.enforced
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end_hour <= self.start_hour
    }

    /// Whether a local wall-clock hour falls inside the window.
    pub fn is_hour_eligible(&self, hour: u32) -> bool {
        if !self.enforced {
            return true;
        }
        if self.wraps_midnight() {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            hour >= self.start_hour && hour < self.end_hour
        }
    }
}
