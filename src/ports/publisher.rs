use async_trait::async_trait;

use crate::domain::Channel;
use crate::error::AppResult;

/// Messaging platform client. Both methods return the platform's id for
/// the message that was created.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    async fn send_text(&self, channel: &Channel, text: &str) -> AppResult<i64>;

    async fn send_video(&self, channel: &Channel, url: &str) -> AppResult<i64>;
}
