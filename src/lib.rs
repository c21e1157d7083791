//! Contact Queue: windowed prefetch over an agent's contact list
//!
//! An agent works through an ordered list of contacts one at a time. The queue keeps
//! a cursor into that list, prefetches contact payloads in batches around the cursor,
//! recovers from slow or missing payloads with a capped backoff, and re-derives the
//! cursor when the list is refreshed. Which contacts may be texted right now is
//! decided by the eligibility filter from the organization's texting hours and each
//! contact's timezone offset.

pub mod clock;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod logging;
pub mod queue;
pub mod store;
pub mod types;
