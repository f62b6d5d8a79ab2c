// src/models/course.rs

//! Identifiers and availability states for watched course sections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a notification recipient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Code of a course section as supplied by the user.
///
/// Compared by exact value. No case folding or trimming is applied, so
/// `"cs101"` and `"CS101"` are two different watches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCode(String);

impl CourseCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CourseCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Classified availability of a course section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Unknown,
    Full,
    Open,
    FetchFailed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Full => "full",
            Status::Open => "open",
            Status::FetchFailed => "fetch-failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of recording a new status for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Status unchanged and the course is not open.
    None,
    /// The course is open and was not open at the previous observation.
    BecameOpen,
    /// Any other change, or an open course observed open again.
    Other,
}

impl Transition {
    /// Work out the transition between two consecutive observations.
    pub fn between(previous: Status, current: Status) -> Self {
        match (previous, current) {
            (Status::Open, Status::Open) => Transition::Other,
            (_, Status::Open) => Transition::BecameOpen,
            (prev, curr) if prev == curr => Transition::None,
            _ => Transition::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_code_is_case_sensitive() {
        assert_ne!(CourseCode::from("cs101"), CourseCode::from("CS101"));
    }

    #[test]
    fn test_user_id_from_snowflake() {
        assert_eq!(UserId::from(1234567890u64).as_str(), "1234567890");
    }

    #[test]
    fn test_transition_into_open() {
        for prev in [Status::Unknown, Status::Full, Status::FetchFailed] {
            assert_eq!(
                Transition::between(prev, Status::Open),
                Transition::BecameOpen
            );
        }
    }

    #[test]
    fn test_transition_open_repeat_is_other() {
        assert_eq!(
            Transition::between(Status::Open, Status::Open),
            Transition::Other
        );
    }

    #[test]
    fn test_transition_unchanged_closed_is_none() {
        assert_eq!(
            Transition::between(Status::Full, Status::Full),
            Transition::None
        );
        assert_eq!(
            Transition::between(Status::Open, Status::Full),
            Transition::Other
        );
    }
}
