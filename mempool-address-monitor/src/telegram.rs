// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Telegram Notification Module
//!
//! Delivers formatted event messages through the Telegram Bot API.
//!
//! ## Usage Pattern
//!
//! ```text
//!   AddressMonitor
//!         │
//!         ├─► New txids ───────► format_message(New) ──► Notifier.send()
//!         │
//!         └─► Confirmed txids ─► format_message(Confirmed) ──► Notifier.send()
//! ```
//!
//! Each message is sent once. A failed send is reported to the caller, which
//! logs it and moves on.

use crate::config::TelegramConfig;
use crate::error::{MonitorError, MonitorResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Delivery channel for notification messages
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> MonitorResult<()>;
}

/// Telegram notifier for address events
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
    api_base: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("configured", &self.is_configured())
            .field("api_base", &"<redacted>")
            .finish()
    }
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> MonitorResult<Self> {
        let api_base = format!(
            "{}/bot{}",
            config.api_url.trim_end_matches('/'),
            config.bot_token
        );
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(Self {
            config,
            client,
            api_base,
        })
    }

    /// Check if Telegram is configured
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> MonitorResult<()> {
        if !self.is_configured() {
            let preview: String = text.chars().take(200).collect();
            info!("[Telegram] Not configured, would send: {}", preview);
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/sendMessage", self.api_base))
            .json(&json!({
                "chat_id": self.config.chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .map_err(|e| MonitorError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            return Err(MonitorError::Delivery(format!("HTTP {}: {}", status, body)));
        }

        info!("[Telegram] Message sent ({} chars)", text.chars().count());
        Ok(())
    }
}
