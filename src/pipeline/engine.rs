// src/pipeline/engine.rs

//! Facade consumed by front ends.
//!
//! Wraps the watch store and the poll scheduler, and owns the background
//! loop that runs scheduled cycles.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{AppError, Result};
use crate::models::{AddOutcome, Config, CourseCode, CycleReport, RemoveOutcome, Status, UserId};
use crate::pipeline::{PollScheduler, SchedulerSettings, StatusCache};
use crate::services::{Notifier, Scraper};
use crate::storage::{WatchPersistence, WatchStore};

/// Answer to a manual trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A cycle was started in the background.
    Started,
    /// A cycle was already running; nothing was started.
    AlreadyRunning,
}

struct ScheduledLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Entry point for every front-end operation. Safe to share across tasks.
pub struct WatchEngine {
    store: Arc<WatchStore>,
    scheduler: Arc<PollScheduler>,
    scheduled: Mutex<Option<ScheduledLoop>>,
}

impl WatchEngine {
    pub fn new(store: Arc<WatchStore>, scheduler: Arc<PollScheduler>) -> Self {
        Self {
            store,
            scheduler,
            scheduled: Mutex::new(None),
        }
    }

    /// Open the store and wire up a scheduler from configuration.
    pub async fn from_config(
        config: &Config,
        backend: Arc<dyn WatchPersistence>,
        scraper: Arc<dyn Scraper>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = Arc::new(WatchStore::open(backend).await);
        let scheduler = Arc::new(PollScheduler::new(
            Arc::clone(&store),
            Arc::new(StatusCache::new()),
            scraper,
            notifier,
            config.messages.clone(),
            SchedulerSettings::from(&config.watch),
        ));
        Self::new(store, scheduler)
    }

    pub async fn add_watch(&self, user: UserId, course: CourseCode) -> Result<AddOutcome> {
        self.store.add(user, course).await
    }

    pub async fn remove_watch(&self, user: &UserId, course: &CourseCode) -> Result<RemoveOutcome> {
        self.store.remove(user, course).await
    }

    /// Courses watched by `user`, sorted.
    pub async fn list_watches(&self, user: &UserId) -> Vec<CourseCode> {
        self.store.list(user).await
    }

    /// Last status observed for a course in this process.
    pub fn last_status(&self, course: &CourseCode) -> Status {
        self.scheduler.cache().status(course)
    }

    /// Start a cycle in the background unless one is already running.
    pub fn trigger_cycle_now(&self) -> TriggerOutcome {
        let Some(guard) = self.scheduler.try_begin() else {
            log::info!("Manual check requested while a cycle is running");
            return TriggerOutcome::AlreadyRunning;
        };

        let scheduler = Arc::clone(&self.scheduler);
        tokio::spawn(async move {
            scheduler.run_with(guard).await;
        });
        TriggerOutcome::Started
    }

    /// Run a cycle and wait for its report.
    pub async fn check_now(&self) -> Result<CycleReport> {
        self.scheduler.run_cycle().await
    }

    /// Start running cycles every `interval`, the first one immediately.
    ///
    /// Returns `false` if the loop is already running.
    pub async fn start_scheduled_loop(&self, interval: Duration) -> Result<bool> {
        if interval.is_zero() {
            return Err(AppError::validation("scheduled interval must be > 0"));
        }

        let mut scheduled = self.scheduled.lock().await;
        if scheduled.as_ref().is_some_and(|l| !l.handle.is_finished()) {
            return Ok(false);
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduled_loop(
            Arc::clone(&self.scheduler),
            interval,
            shutdown_rx,
        ));
        *scheduled = Some(ScheduledLoop { shutdown, handle });

        log::info!("Scheduled checks every {}s", interval.as_secs_f64());
        Ok(true)
    }

    /// Stop the scheduled loop. A cycle already in flight runs to completion
    /// before this returns; no further cycles are scheduled.
    ///
    /// Returns `false` if no loop was running.
    pub async fn stop_scheduled_loop(&self) -> bool {
        let Some(scheduled) = self.scheduled.lock().await.take() else {
            return false;
        };

        // The receiver is gone only if the loop already exited.
        let _ = scheduled.shutdown.send(true);
        if let Err(e) = scheduled.handle.await {
            log::error!("Scheduled loop ended abnormally: {}", e);
        }

        log::info!("Scheduled checks stopped");
        true
    }
}

async fn scheduled_loop(
    scheduler: Arc<PollScheduler>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => break,
            _ = ticker.tick() => match scheduler.run_cycle().await {
                Ok(_) => {}
                Err(AppError::CycleAlreadyInProgress) => {
                    log::info!("Skipping scheduled cycle, a manual one is running");
                }
                Err(e) => log::error!("Scheduled cycle failed: {}", e),
            },
        }
    }
}
