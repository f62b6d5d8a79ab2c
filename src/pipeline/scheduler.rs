// src/pipeline/scheduler.rs

//! Polling cycle orchestration.
//!
//! One cycle: snapshot the watch set, group it by course so each course is
//! scraped once, fetch with bounded parallelism, classify, record the status
//! and notify every watcher of a course that just opened. A failure for one
//! course or one recipient never affects any other.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::future;
use futures::stream::{self, StreamExt};

use crate::error::{AppError, FetchError, NotifyError, Result};
use crate::models::{CourseCode, CycleReport, Messages, Status, Transition, UserId, WatchConfig};
use crate::pipeline::classify::classify;
use crate::pipeline::StatusCache;
use crate::services::{Notifier, Scraper};
use crate::storage::WatchStore;

/// Timeouts and limits for a cycle.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub fetch_timeout: Duration,
    pub notify_timeout: Duration,
    pub max_concurrent: usize,
}

impl From<&WatchConfig> for SchedulerSettings {
    fn from(config: &WatchConfig) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            notify_timeout: config.notify_timeout(),
            max_concurrent: config.max_concurrent,
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from(&WatchConfig::default())
    }
}

/// Proof that the scheduler is in the `Running` state. Dropping it returns
/// the scheduler to `Idle`, whatever happened during the cycle.
pub struct CycleGuard {
    running: Arc<AtomicBool>,
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// A course after its scrape, waiting for notification.
struct CheckedCourse {
    course: CourseCode,
    status: Status,
    transition: Transition,
    users: Vec<UserId>,
}

/// Per-course result, folded into the cycle report.
#[derive(Debug)]
struct CourseOutcome {
    course: CourseCode,
    status: Status,
    opened: bool,
    notified: usize,
    notify_failures: usize,
}

/// Runs polling cycles, at most one at a time.
pub struct PollScheduler {
    store: Arc<WatchStore>,
    cache: Arc<StatusCache>,
    scraper: Arc<dyn Scraper>,
    notifier: Arc<dyn Notifier>,
    messages: Messages,
    settings: SchedulerSettings,
    running: Arc<AtomicBool>,
    cycles: AtomicU64,
}

impl PollScheduler {
    pub fn new(
        store: Arc<WatchStore>,
        cache: Arc<StatusCache>,
        scraper: Arc<dyn Scraper>,
        notifier: Arc<dyn Notifier>,
        messages: Messages,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            store,
            cache,
            scraper,
            notifier,
            messages,
            settings,
            running: Arc::new(AtomicBool::new(false)),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of cycles started so far.
    pub fn cycles_started(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    /// Move from `Idle` to `Running`, or `None` if a cycle is already running.
    pub fn try_begin(&self) -> Option<CycleGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleGuard {
                running: Arc::clone(&self.running),
            })
    }

    /// Run one cycle to completion.
    ///
    /// Returns `CycleAlreadyInProgress` instead of queueing when another
    /// cycle is running.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let guard = self.try_begin().ok_or(AppError::CycleAlreadyInProgress)?;
        Ok(self.run_with(guard).await)
    }

    /// Run a cycle for which the caller already holds the guard.
    pub async fn run_with(&self, _guard: CycleGuard) -> CycleReport {
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let started_at = Utc::now();

        let groups = group_by_course(self.store.all_pairs().await);
        log::info!("Cycle #{}: checking {} course(s)", cycle, groups.len());

        // Scrapes hold one of `max_concurrent` slots; deliveries run in a
        // second stage so a slow recipient never holds a scrape slot.
        let concurrency = self.settings.max_concurrent.max(1);
        let course_count = groups.len().max(1);
        let outcomes: Vec<CourseOutcome> = stream::iter(groups)
            .map(|(course, users)| self.check_course(cycle, course, users))
            .buffer_unordered(concurrency)
            .map(|checked| self.notify_watchers(checked))
            .buffer_unordered(course_count)
            .collect()
            .await;

        let mut report = CycleReport {
            cycle,
            started_at,
            finished_at: Utc::now(),
            courses_checked: outcomes.len(),
            fetch_failures: 0,
            opened: Vec::new(),
            notifications_sent: 0,
            notification_failures: 0,
        };
        for outcome in outcomes {
            if outcome.status == Status::FetchFailed {
                report.fetch_failures += 1;
            }
            if outcome.opened {
                report.opened.push(outcome.course);
            }
            report.notifications_sent += outcome.notified;
            report.notification_failures += outcome.notify_failures;
        }
        report.opened.sort();

        log::info!("{}", report.summary());
        report
    }

    /// Scrape, classify and record one course.
    async fn check_course(
        &self,
        cycle: u64,
        course: CourseCode,
        users: Vec<UserId>,
    ) -> CheckedCourse {
        let fetched = self.fetch(&course).await;
        if let Err(e) = &fetched {
            log::warn!("Failed to fetch course {}: {}", course, e);
        }

        let status = classify(&fetched);
        let transition = self.cache.observe(&course, status, cycle);
        log::debug!("Course {} is {} ({:?})", course, status, transition);

        CheckedCourse {
            course,
            status,
            transition,
            users,
        }
    }

    /// On a fresh opening, notify every watcher of the course.
    async fn notify_watchers(&self, checked: CheckedCourse) -> CourseOutcome {
        let mut outcome = CourseOutcome {
            course: checked.course,
            status: checked.status,
            opened: checked.transition == Transition::BecameOpen,
            notified: 0,
            notify_failures: 0,
        };
        if !outcome.opened {
            return outcome;
        }

        log::info!(
            "Course {} has an open spot, notifying {} user(s)",
            outcome.course,
            checked.users.len()
        );
        let message = self.messages.seat_open_for(&outcome.course);
        let deliveries = future::join_all(
            checked
                .users
                .iter()
                .map(|user| self.deliver(user, &outcome.course, &message)),
        )
        .await;

        for delivered in deliveries {
            if delivered {
                outcome.notified += 1;
            } else {
                outcome.notify_failures += 1;
            }
        }
        outcome
    }

    /// Scraper call bounded by the fetch timeout, even if the scraper
    /// itself ignores the timeout it is given.
    async fn fetch(&self, course: &CourseCode) -> std::result::Result<String, FetchError> {
        let timeout = self.settings.fetch_timeout;
        match tokio::time::timeout(timeout, self.scraper.fetch(course, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }

    async fn deliver(&self, user: &UserId, course: &CourseCode, message: &str) -> bool {
        let result = tokio::time::timeout(
            self.settings.notify_timeout,
            self.notifier.notify(user, message),
        )
        .await
        .unwrap_or(Err(NotifyError::Timeout));

        match result {
            Ok(()) => {
                log::info!("Notified user {} about {}", user, course);
                true
            }
            Err(e) => {
                log::warn!("Failed to notify user {} about {}: {}", user, course, e);
                false
            }
        }
    }
}

/// Group (user, course) pairs by course, so each course is scraped once.
pub fn group_by_course(pairs: Vec<(UserId, CourseCode)>) -> BTreeMap<CourseCode, Vec<UserId>> {
    let mut groups: BTreeMap<CourseCode, Vec<UserId>> = BTreeMap::new();
    for (user, course) in pairs {
        groups.entry(course).or_default().push(user);
    }
    groups
}
