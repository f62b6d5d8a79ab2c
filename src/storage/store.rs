// src/storage/store.rs

//! The owned, durable watch registry.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{AddOutcome, CourseCode, RemoveOutcome, UserId, WatchSet};
use crate::storage::WatchPersistence;

/// In-memory watch set backed by a persistence layer.
///
/// Mutations are serialized. Each one is applied to a copy of the set,
/// saved, and only then swapped in, so a failed save leaves memory
/// exactly as it was.
pub struct WatchStore {
    state: Mutex<WatchSet>,
    backend: Arc<dyn WatchPersistence>,
}

impl WatchStore {
    /// Open the store, loading whatever the backend has.
    ///
    /// Missing or unreadable state is treated as an empty watch set. The
    /// file backend sets unreadable state aside before the first save.
    pub async fn open(backend: Arc<dyn WatchPersistence>) -> Self {
        let watches = match backend.load().await {
            Ok(watches) => {
                log::info!(
                    "Loaded {} watch(es) for {} user(s)",
                    watches.len(),
                    watches.user_count()
                );
                watches
            }
            Err(e) => {
                log::warn!("Failed to load watch list: {}. Starting empty.", e);
                WatchSet::default()
            }
        };

        Self {
            state: Mutex::new(watches),
            backend,
        }
    }

    pub async fn add(&self, user: UserId, course: CourseCode) -> Result<AddOutcome> {
        let mut state = self.state.lock().await;
        if state.contains(&user, &course) {
            return Ok(AddOutcome::AlreadyWatching);
        }

        let mut next = state.clone();
        next.insert(user.clone(), course.clone());
        self.commit(&mut state, next).await?;

        log::info!("User {} is now watching {}", user, course);
        Ok(AddOutcome::Added)
    }

    pub async fn remove(&self, user: &UserId, course: &CourseCode) -> Result<RemoveOutcome> {
        let mut state = self.state.lock().await;
        if !state.contains(user, course) {
            return Ok(RemoveOutcome::NotWatching);
        }

        let mut next = state.clone();
        next.remove(user, course);
        self.commit(&mut state, next).await?;

        log::info!("User {} stopped watching {}", user, course);
        Ok(RemoveOutcome::Removed)
    }

    /// Courses watched by `user`, sorted.
    pub async fn list(&self, user: &UserId) -> Vec<CourseCode> {
        self.state.lock().await.courses(user)
    }

    /// Point-in-time copy of every (user, course) pair.
    pub async fn all_pairs(&self) -> Vec<(UserId, CourseCode)> {
        self.state.lock().await.pairs()
    }

    /// Point-in-time copy of the whole watch set.
    pub async fn snapshot(&self) -> WatchSet {
        self.state.lock().await.clone()
    }

    async fn commit(&self, state: &mut WatchSet, next: WatchSet) -> Result<()> {
        if let Err(e) = self.backend.save(&next).await {
            log::error!("Failed to persist watch list, change rolled back: {}", e);
            return Err(AppError::store(e.to_string()));
        }
        *state = next;
        Ok(())
    }
}
