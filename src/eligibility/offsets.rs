//! Timezone offset classification against a policy window.
//!
//! Every representable offset (UTC-12:00 through UTC+14:00 in half-hour steps, each
//! with and without daylight saving) is assigned to exactly one of two partitions:
//! offsets whose local hour is currently inside the window, and the rest. The list
//! query layer turns these partitions into index keys.

use crate::eligibility::policy::EligibilityPolicy;
use crate::types::{TimezoneOffset, MAX_OFFSET_MINUTES, MIN_OFFSET_MINUTES};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Spacing between enumerated offsets.
pub const OFFSET_STEP_MINUTES: i32 = 30;

/// Stand-in timezone for contacts whose timezone is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultTimezone {
    /// The evaluating host's own local timezone.
    HostLocal,
    Fixed(TimezoneOffset),
}

impl DefaultTimezone {
    pub fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        match self {
            DefaultTimezone::HostLocal => now.with_timezone(&Local).hour(),
            DefaultTimezone::Fixed(offset) => local_hour(*offset, now),
        }
    }
}

/// Result of classifying every representable offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetClassification {
    pub valid: BTreeSet<TimezoneOffset>,
    pub invalid: BTreeSet<TimezoneOffset>,
}

impl OffsetClassification {
    pub fn is_valid(&self, offset: &TimezoneOffset) -> bool {
        self.valid.contains(offset)
    }
}

/// All representable offsets, DST-observing variants first.
pub fn all_offsets() -> impl Iterator<Item = TimezoneOffset> {
    [true, false].into_iter().flat_map(|observes_dst| {
        (MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES)
            .step_by(OFFSET_STEP_MINUTES as usize)
            .filter_map(move |minutes| TimezoneOffset::new(minutes, observes_dst).ok())
    })
}

/// Whether daylight saving is active at `now`.
///
/// Uses the US rule anchored on Eastern time: from the second Sunday of March at
/// 02:00 EST until the first Sunday of November at 02:00 EDT.
pub fn dst_in_effect(now: DateTime<Utc>) -> bool {
    let year = now.year();
    match (
        transition_instant(year, 3, 2, 7),
        transition_instant(year, 11, 1, 6),
    ) {
        (Some(start), Some(end)) => now >= start && now < end,
        _ => false,
    }
}

fn transition_instant(year: i32, month: u32, nth_sunday: u8, utc_hour: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, nth_sunday)?
        .and_hms_opt(utc_hour, 0, 0)
        .map(|naive| naive.and_utc())
}

/// Wall-clock hour at `offset` for the instant `now`.
pub fn local_hour(offset: TimezoneOffset, now: DateTime<Utc>) -> u32 {
    let mut minutes = i64::from(offset.offset_minutes());
    if offset.observes_dst() && dst_in_effect(now) {
        minutes += 60;
    }
    (now + Duration::minutes(minutes)).hour()
}

/// Partition every representable offset into currently valid and invalid sets.
pub fn classify_offsets(policy: &EligibilityPolicy, now: DateTime<Utc>) -> OffsetClassification {
    let mut classification = OffsetClassification::default();
    for offset in all_offsets() {
        if policy.is_hour_eligible(local_hour(offset, now)) {
            classification.valid.insert(offset);
        } else {
            classification.invalid.insert(offset);
        }
    }
    classification
}

/// Whether contacts with no known timezone may be surfaced at `now`.
pub fn is_default_offset_valid(
    policy: &EligibilityPolicy,
    default_timezone: DefaultTimezone,
    now: DateTime<Utc>,
) -> bool {
    policy.is_hour_eligible(default_timezone.local_hour(now))
}
