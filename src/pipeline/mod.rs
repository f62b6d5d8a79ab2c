//! The availability watch pipeline.
//!
//! - `classify`: scraped text → `Status`
//! - `StatusCache`: transition detection per course
//! - `PollScheduler`: one scrape → classify → notify cycle at a time
//! - `WatchEngine`: facade used by front ends

pub mod cache;
pub mod classify;
pub mod engine;
pub mod scheduler;

pub use cache::{CacheEntry, StatusCache};
pub use classify::{classify, classify_text};
pub use engine::{TriggerOutcome, WatchEngine};
pub use scheduler::{CycleGuard, PollScheduler, SchedulerSettings, group_by_course};
