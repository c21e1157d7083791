//! Eligibility domain: texting-hours policy, timezone offset classification, and
//! the contacts filter the list query layer applies at query time.

pub mod filter;
pub mod offsets;
pub mod policy;

pub use filter::{ContactsFilter, EligibilityFilter, TimezoneSelection, MISSING_TIMEZONE_KEY};
pub use offsets::{
    all_offsets, classify_offsets, dst_in_effect, is_default_offset_valid, local_hour,
    DefaultTimezone, OffsetClassification, OFFSET_STEP_MINUTES,
};
pub use policy::EligibilityPolicy;
