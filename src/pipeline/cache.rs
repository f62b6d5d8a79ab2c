// src/pipeline/cache.rs

//! Last-known status per course, for transition detection.
//!
//! Lives for the process lifetime only. After a restart every course starts
//! from `Unknown`, so a course that is open at that moment notifies once more.

use dashmap::DashMap;

use crate::models::{CourseCode, Status, Transition};

/// Cached observation of one course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub status: Status,
    /// Cycle of the most recent observation (diagnostics only)
    pub last_cycle: u64,
    pub observations: u64,
}

/// Concurrent map of course → last observed status.
#[derive(Debug, Default)]
pub struct StatusCache {
    entries: DashMap<CourseCode, CacheEntry>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `status` for `course` and report the transition from the
    /// previous observation (`Unknown` when there was none).
    ///
    /// The read and the write happen under the entry's lock, so concurrent
    /// observers of the same course cannot both see `BecameOpen`.
    pub fn observe(&self, course: &CourseCode, status: Status, cycle: u64) -> Transition {
        let mut entry = self.entries.entry(course.clone()).or_default();
        let transition = Transition::between(entry.status, status);

        entry.status = status;
        entry.last_cycle = cycle;
        entry.observations += 1;

        transition
    }

    /// Last observed status, `Unknown` if never observed.
    pub fn status(&self, course: &CourseCode) -> Status {
        self.entries
            .get(course)
            .map(|entry| entry.status)
            .unwrap_or_default()
    }

    pub fn entry(&self, course: &CourseCode) -> Option<CacheEntry> {
        self.entries.get(course).map(|entry| *entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
