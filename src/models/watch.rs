// src/models/watch.rs

//! The per-user watch set.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{CourseCode, UserId};

/// Result of adding a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyWatching,
}

/// Result of removing a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotWatching,
}

/// Mapping from user to the set of course codes they watch.
///
/// Serialized as a JSON object of user id to a sorted array of codes.
/// Users with no remaining watches are dropped, so an empty set never
/// appears in the mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WatchSet {
    users: BTreeMap<UserId, BTreeSet<CourseCode>>,
}

impl<'de> Deserialize<'de> for WatchSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut users = BTreeMap::<UserId, BTreeSet<CourseCode>>::deserialize(deserializer)?;
        users.retain(|_, courses| !courses.is_empty());
        Ok(Self { users })
    }
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, user: &UserId, course: &CourseCode) -> bool {
        self.users
            .get(user)
            .is_some_and(|courses| courses.contains(course))
    }

    /// Add a watch. Returns `false` if it was already present.
    pub fn insert(&mut self, user: UserId, course: CourseCode) -> bool {
        self.users.entry(user).or_default().insert(course)
    }

    /// Remove a watch. Returns `false` if it was not present.
    pub fn remove(&mut self, user: &UserId, course: &CourseCode) -> bool {
        let Some(courses) = self.users.get_mut(user) else {
            return false;
        };
        let removed = courses.remove(course);
        if courses.is_empty() {
            self.users.remove(user);
        }
        removed
    }

    /// Courses watched by `user`, in lexicographic order.
    pub fn courses(&self, user: &UserId) -> Vec<CourseCode> {
        self.users
            .get(user)
            .map(|courses| courses.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every (user, course) pair, ordered by user then course.
    pub fn pairs(&self) -> Vec<(UserId, CourseCode)> {
        self.users
            .iter()
            .flat_map(|(user, courses)| {
                courses
                    .iter()
                    .map(move |course| (user.clone(), course.clone()))
            })
            .collect()
    }

    /// Number of users with at least one watch.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Total number of (user, course) pairs.
    pub fn len(&self) -> usize {
        self.users.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
