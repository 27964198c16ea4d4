//! Thin Telegram Bot API client.
//!
//! Long polling via `getUpdates` and delivery via `sendMessage` with
//! `parse_mode=HTML`. This is deliberately a minimal boundary: Telegram
//! rejects malformed HTML outright, which is why everything sent through
//! here has already passed the markup sanitizer.

use crate::error::{ReferatError, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Long-poll window for `getUpdates`, in seconds.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// An update delivered by `getUpdates`.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

/// An inbound chat message.
#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Telegram Bot API client.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    /// Build a client for `token`, optionally routed through a proxy.
    pub fn new(token: &str, proxy_url: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            // Must outlast the long-poll window.
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 15));

        if let Some(proxy) = proxy_url {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| ReferatError::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: format!("https://api.telegram.org/bot{}", token),
        })
    }

    /// Fetch pending updates, long-polling up to [`POLL_TIMEOUT_SECS`].
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let response: ApiResponse<Vec<Update>> = self
            .http
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[("offset", offset), ("timeout", POLL_TIMEOUT_SECS as i64)])
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(ReferatError::Telegram(
                response
                    .description
                    .unwrap_or_else(|| "getUpdates failed".to_string()),
            ));
        }

        let updates = response.result.unwrap_or_default();
        debug!("Received {} update(s)", updates.len());
        Ok(updates)
    }

    /// Send an HTML-formatted message to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let response: ApiResponse<serde_json::Value> = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(ReferatError::Telegram(
                response
                    .description
                    .unwrap_or_else(|| "sendMessage failed".to_string()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deserialization() {
        let payload = r#"{
            "ok": true,
            "result": [{
                "update_id": 100,
                "message": {
                    "message_id": 1,
                    "chat": {"id": -42, "type": "group"},
                    "from": {"id": 7, "is_bot": false, "username": "alice"},
                    "text": "hello"
                }
            }]
        }"#;

        let response: ApiResponse<Vec<Update>> = serde_json::from_str(payload).unwrap();
        assert!(response.ok);
        let updates = response.result.unwrap();
        assert_eq!(updates.len(), 1);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, -42);
        assert_eq!(message.from.as_ref().unwrap().username.as_deref(), Some("alice"));
        assert_eq!(message.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_error_response_deserialization() {
        let payload = r#"{"ok": false, "description": "Unauthorized"}"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(payload).unwrap();
        assert!(!response.ok);
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
    }
}
