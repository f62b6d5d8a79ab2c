// src/services/notifier.rs

//! Notification delivery.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::error::{NotifyError, Result};
use crate::models::UserId;

/// Delivers a free-text message to a user. Best effort: a failure is
/// reported, never retried here.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: &UserId, message: &str) -> std::result::Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user: &UserId, message: &str) -> std::result::Result<(), NotifyError> {
        log::info!("[notify {}] {}", user, message);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    user_id: &'a UserId,
    content: &'a str,
}

/// POSTs each notification as JSON to a relay endpoint (for example a chat
/// bot that forwards it as a direct message).
pub struct WebhookNotifier {
    client: Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: &str) -> Result<Self> {
        Ok(Self {
            client,
            url: Url::parse(url)?,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, user: &UserId, message: &str) -> std::result::Result<(), NotifyError> {
        let payload = WebhookPayload {
            user_id: user,
            content: message,
        };
        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(format!("HTTP {status}")));
        }
        Ok(())
    }
}
