// src/models/report.rs

//! Summary of one polling cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::CourseCode;

/// What happened during a single polling cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Monotonic cycle number, starting at 1
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Distinct course codes scraped
    pub courses_checked: usize,
    pub fetch_failures: usize,
    /// Courses that transitioned into `Open` this cycle
    pub opened: Vec<CourseCode>,
    pub notifications_sent: usize,
    pub notification_failures: usize,
}

impl CycleReport {
    /// Wall-clock duration of the cycle in milliseconds.
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// One-line summary suitable for logging.
    pub fn summary(&self) -> String {
        format!(
            "cycle #{}: {} course(s) checked, {} fetch failure(s), {} opened, {} notified, {} notify failure(s) in {}ms",
            self.cycle,
            self.courses_checked,
            self.fetch_failures,
            self.opened.len(),
            self.notifications_sent,
            self.notification_failures,
            self.elapsed_ms()
        )
    }
}
