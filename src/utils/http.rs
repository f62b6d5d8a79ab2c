// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::ScraperConfig;

/// Connect timeout for outbound requests. Whole-request timeouts are set per
/// call by the engine.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Create a configured asynchronous HTTP client.
///
/// The client keeps no cookie store, so requests made through it share no
/// session state.
pub fn create_async_client(config: &ScraperConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_from_defaults() {
        assert!(create_async_client(&ScraperConfig::default()).is_ok());
    }
}
