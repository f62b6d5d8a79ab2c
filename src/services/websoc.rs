// src/services/websoc.rs

//! Course-section availability scraping.
//!
//! Submits the text-results form of the schedule-of-classes site for a single
//! course code and returns the contents of the `<pre>` block the site renders.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{FetchError, Result};
use crate::models::{CourseCode, ScraperConfig};
use crate::utils::http;

/// Source of raw availability text for a course.
///
/// Implementations must tolerate concurrent calls for different course codes,
/// with no session state shared between calls.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn fetch(
        &self,
        course: &CourseCode,
        timeout: Duration,
    ) -> std::result::Result<String, FetchError>;
}

/// Scraper for the WebSoc schedule-of-classes endpoint.
pub struct WebSocScraper {
    client: Client,
    base_url: Url,
    year_term: Option<String>,
}

impl WebSocScraper {
    /// Create a scraper with its own HTTP client.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = http::create_async_client(config)?;
        Self::with_client(config, client)
    }

    /// Create a scraper reusing an existing HTTP client.
    pub fn with_client(config: &ScraperConfig, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            year_term: config.year_term.clone(),
        })
    }

    fn form<'a>(&'a self, course: &'a CourseCode) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![
            ("CourseCodes", course.as_str()),
            ("Submit", "Display Text Results"),
        ];
        if let Some(term) = &self.year_term {
            form.push(("YearTerm", term.as_str()));
        }
        form
    }

    /// Pull the text of the first `<pre>` element out of a results page.
    fn extract_text(html: &str) -> std::result::Result<String, FetchError> {
        let document = Html::parse_document(html);
        let pre = Selector::parse("pre").map_err(|e| FetchError::Parse(format!("{e:?}")))?;

        document
            .select(&pre)
            .next()
            .map(|el| el.text().collect::<String>())
            .ok_or_else(|| FetchError::Parse("no <pre> block in response".to_string()))
    }
}

#[async_trait]
impl Scraper for WebSocScraper {
    async fn fetch(
        &self,
        course: &CourseCode,
        timeout: Duration,
    ) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .post(self.base_url.clone())
            .form(&self.form(course))
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {status} for {course}")));
        }

        let html = response.text().await?;
        Self::extract_text(&html)
    }
}
