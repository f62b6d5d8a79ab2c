// src/pipeline/classify.rs

//! Raw scrape result → availability status.
//!
//! The site renders free text rather than structured data, so the whole
//! signal is the presence of the literal marker `FULL`.

use crate::error::FetchError;
use crate::models::Status;

/// Marker the site prints for a section with no seats left.
pub const FULL_MARKER: &str = "FULL";

/// Classify the outcome of a scraper call.
pub fn classify(fetched: &Result<String, FetchError>) -> Status {
    match fetched {
        Ok(text) => classify_text(text),
        Err(_) => Status::FetchFailed,
    }
}

/// Classify successfully fetched page text.
pub fn classify_text(text: &str) -> Status {
    if text.trim().is_empty() {
        Status::Unknown
    } else if text.contains(FULL_MARKER) {
        Status::Full
    } else {
        Status::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_errors_are_fetch_failed() {
        for error in [
            FetchError::Timeout,
            FetchError::Network("connection refused".into()),
            FetchError::Parse("no <pre> block".into()),
        ] {
            assert_eq!(classify(&Err(error)), Status::FetchFailed);
        }
    }

    #[test]
    fn test_blank_text_is_unknown() {
        assert_eq!(classify_text(""), Status::Unknown);
        assert_eq!(classify_text("  \n\t "), Status::Unknown);
    }

    #[test]
    fn test_full_marker() {
        assert_eq!(
            classify(&Ok("Total Seats: 30 ... FULL".to_string())),
            Status::Full
        );
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        assert_eq!(classify_text("Total Seats: 30 ... full"), Status::Open);
    }

    #[test]
    fn test_anything_else_is_open() {
        assert_eq!(
            classify(&Ok("Total Seats: 30 ... 2 open".to_string())),
            Status::Open
        );
    }
}
