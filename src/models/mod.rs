// src/models/mod.rs

//! Domain models for the watch engine.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod course;
mod report;
mod watch;

// Re-export all public types
pub use config::{
    Config, LoggingConfig, Messages, NotifierConfig, ScraperConfig, StorageConfig, WatchConfig,
};
pub use course::{CourseCode, Status, Transition, UserId};
pub use report::CycleReport;
pub use watch::{AddOutcome, RemoveOutcome, WatchSet};
