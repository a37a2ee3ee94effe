// src/integrations/telegram/client.rs
//
// Telegram Bot API client
//
// Sends channel posts through `sendMessage` / `sendVideo` and returns the
// message id Telegram assigned. A reply is only a success when the HTTP
// status is 2xx and the body says `ok: true`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::{Channel, ChatRef};
use crate::error::{AppError, AppResult};
use crate::ports::ChannelPublisher;

const API_BASE_URL: &str = "https://api.telegram.org";

/// `chat_id` accepts either a numeric id or an `@username`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
enum ChatTarget {
    Id(i64),
    Username(String),
}

impl From<&ChatRef> for ChatTarget {
    fn from(chat: &ChatRef) -> Self {
        match chat {
            ChatRef::Id(id) => ChatTarget::Id(*id),
            ChatRef::Name(_) => ChatTarget::Username(chat.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: ChatTarget,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SendVideoRequest<'a> {
    chat_id: ChatTarget,
    video: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<SentMessage>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Telegram Bot API Client
pub struct TelegramClient {
    base_url: String,
    token: String,
    http_client: Client,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AppError::Config("Telegram bot token is empty".to_string()));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: API_BASE_URL.to_string(),
            token,
            http_client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn chat_target(channel: &Channel) -> AppResult<ChatTarget> {
        channel
            .chat_ref()
            .map(|chat| ChatTarget::from(&chat))
            .ok_or_else(|| {
                AppError::Config("channel has neither chat id nor chat name".to_string())
            })
    }

    async fn call<B: Serialize>(&self, method: &str, body: &B) -> AppResult<i64> {
        let response = self
            .http_client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        Self::parse_reply(method, status.is_success(), &text)
    }

    fn parse_reply(method: &str, status_ok: bool, body: &str) -> AppResult<i64> {
        let reply: ApiResponse = serde_json::from_str(body).map_err(|e| {
            AppError::Transport(format!("{}: unreadable Telegram reply: {}", method, e))
        })?;

        match (status_ok && reply.ok, reply.result) {
            (true, Some(message)) => Ok(message.message_id),
            _ => Err(AppError::Transport(format!(
                "{} failed: {}",
                method,
                reply.description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }

    /// The video must be reachable before Telegram is asked to fetch it.
    async fn check_video_url(&self, url: &str) -> AppResult<()> {
        let response = self.http_client.head(url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::Transport(format!(
                "video {} answered {}",
                url,
                response.status()
            )))
        }
    }
}

#[async_trait]
impl ChannelPublisher for TelegramClient {
    async fn send_text(&self, channel: &Channel, text: &str) -> AppResult<i64> {
        let request = SendMessageRequest {
            chat_id: Self::chat_target(channel)?,
            text,
        };
        self.call("sendMessage", &request).await
    }

    async fn send_video(&self, channel: &Channel, url: &str) -> AppResult<i64> {
        self.check_video_url(url).await?;
        let request = SendVideoRequest {
            chat_id: Self::chat_target(channel)?,
            video: url,
        };
        self.call("sendVideo", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlatformId;

    fn client() -> TelegramClient {
        TelegramClient::new("123:abc", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_empty_token_is_config_error() {
        assert!(matches!(
            TelegramClient::new("  ", Duration::from_secs(5)),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_method_url() {
        assert_eq!(
            client().method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_chat_target_prefers_id() {
        let both =
            Channel::new(PlatformId(1), Some("animestele".into()), Some(-100), None).unwrap();
        let name_only =
            Channel::new(PlatformId(1), Some("@animestele".into()), None, None).unwrap();

        let id_target = TelegramClient::chat_target(&both).unwrap();
        let name_target = TelegramClient::chat_target(&name_only).unwrap();
        let id_json = serde_json::to_value(id_target).unwrap();
        let name_json = serde_json::to_value(name_target).unwrap();

        assert_eq!(id_json, serde_json::json!(-100));
        assert_eq!(name_json, serde_json::json!("@animestele"));
    }

    #[test]
    fn test_parse_successful_reply() {
        let body = r#"{"ok": true, "result": {"message_id": 42, "chat": {"id": -100}}}"#;
        assert_eq!(TelegramClient::parse_reply("sendMessage", true, body).unwrap(), 42);
    }

    #[test]
    fn test_parse_error_reply() {
        let body =
            r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let err = TelegramClient::parse_reply("sendMessage", false, body).unwrap_err();

        assert!(err.is_transient());
        assert!(err.to_string().contains("chat not found"));
    }

    #[test]
    fn test_parse_garbage_reply() {
        let err = TelegramClient::parse_reply("sendVideo", true, "<html>").unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }
}
