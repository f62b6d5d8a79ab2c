//! Service layer: the engine's external collaborators.
//!
//! - Course availability scraping (`Scraper`, `WebSocScraper`)
//! - Notification delivery (`Notifier`, `LogNotifier`, `WebhookNotifier`)

mod notifier;
mod websoc;

#[cfg(test)]
pub(crate) mod testing;

pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
pub use websoc::{Scraper, WebSocScraper};
