//! Scripted collaborators for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{FetchError, NotifyError, Result};
use crate::models::{CourseCode, UserId, WatchSet};
use crate::services::{Notifier, Scraper};
use crate::storage::WatchPersistence;

pub const FULL_TEXT: &str = "34250  Lec  A  4  STAFF  MWF 10:00-10:50  Total Seats: 30 ... FULL";
pub const OPEN_TEXT: &str = "34250  Lec  A  4  STAFF  MWF 10:00-10:50  Total Seats: 30 ... 2 open";

/// Scraper returning whatever response was last scripted for a course.
#[derive(Default)]
pub struct ScriptedScraper {
    responses: Mutex<HashMap<CourseCode, std::result::Result<String, FetchError>>>,
    delays: Mutex<HashMap<CourseCode, Duration>>,
    calls: Mutex<HashMap<CourseCode, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl ScriptedScraper {
    pub fn respond(&self, course: &str, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(CourseCode::from(course), Ok(text.to_string()));
    }

    pub fn fail(&self, course: &str, error: FetchError) {
        self.responses
            .lock()
            .unwrap()
            .insert(CourseCode::from(course), Err(error));
    }

    pub fn delay(&self, course: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(CourseCode::from(course), delay);
    }

    /// Hold every fetch until `release` is notified; `entered` fires as each
    /// fetch starts.
    pub fn hold(&self, entered: Arc<Notify>, release: Arc<Notify>) {
        *self.gate.lock().unwrap() = Some((entered, release));
    }

    pub fn calls(&self, course: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&CourseCode::from(course))
            .copied()
            .unwrap_or(0)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for ScriptedScraper {
    async fn fetch(
        &self,
        course: &CourseCode,
        _timeout: Duration,
    ) -> std::result::Result<String, FetchError> {
        *self.calls.lock().unwrap().entry(course.clone()).or_default() += 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }

        let delay = self.delays.lock().unwrap().get(course).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .get(course)
            .cloned()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

/// Notifier recording every delivery, optionally failing or stalling for
/// some users.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(UserId, String)>>,
    failing: Mutex<HashSet<UserId>>,
    stalled: Mutex<HashMap<UserId, Arc<Notify>>>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, user: &str) {
        self.failing.lock().unwrap().insert(UserId::from(user));
    }

    /// Deliveries to `user` wait until `release` is notified. A `Notify`
    /// nobody fires makes them hang forever.
    pub fn stall(&self, user: &str, release: Arc<Notify>) {
        self.stalled
            .lock()
            .unwrap()
            .insert(UserId::from(user), release);
    }

    pub fn sent(&self) -> Vec<(UserId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, user: &str) -> usize {
        let user = UserId::from(user);
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == user)
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user: &UserId, message: &str) -> std::result::Result<(), NotifyError> {
        if self.failing.lock().unwrap().contains(user) {
            return Err(NotifyError::Transport("connection reset".to_string()));
        }
        let stall = self.stalled.lock().unwrap().get(user).cloned();
        if let Some(release) = stall {
            release.notified().await;
        }
        self.sent
            .lock()
            .unwrap()
            .push((user.clone(), message.to_string()));
        Ok(())
    }
}

/// Persistence that keeps the last saved set in memory.
#[derive(Default)]
pub struct MemoryStorage {
    saved: Mutex<WatchSet>,
}

#[async_trait]
impl WatchPersistence for MemoryStorage {
    async fn load(&self) -> Result<WatchSet> {
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn save(&self, watches: &WatchSet) -> Result<()> {
        *self.saved.lock().unwrap() = watches.clone();
        Ok(())
    }
}
