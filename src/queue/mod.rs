//! Contact queue domain: the windowed prefetch cache, cursor re-derivation, stall
//! recovery, and the async session that drives them against the collaborators.

pub mod cache;
pub mod cursor;
pub mod loader;
pub mod progress;
pub mod session;
pub mod stall;
pub mod state;

pub use cache::{BatchRequest, CacheConfig, ContactQueueCache, FinishOutcome};
pub use cursor::{initial_cursor, rederive_cursor, StartPosition};
pub use loader::{BatchLoader, BatchResult, ItemList, ListProvider};
pub use progress::{Progress, ProgressTotal, RequestMorePolicy};
pub use session::{QueueSession, SessionOptions};
pub use stall::{Backoff, BackoffConfig, StallAction, StallRecovery, StallState};
pub use state::{CurrentPayload, PayloadState};
