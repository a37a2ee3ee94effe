// src/domain/destination.rs
//
// Publication destinations: a Platform (messaging system) and the
// Channels registered inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{ChannelId, DomainError, DomainResult, Entity, PlatformId};

/// A named external messaging system, unique by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: Option<PlatformId>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Platform {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let platform = Self {
            id: None,
            name: name.into().trim().to_string(),
            created_at: Utc::now(),
        };
        validate_platform(&platform)?;
        Ok(platform)
    }

    pub fn with_id(mut self, id: PlatformId) -> Self {
        self.id = Some(id);
        self
    }
}

impl Entity for Platform {
    type Id = PlatformId;
    type Key = String;

    const KIND: &'static str = "platform";

    fn natural_key(&self) -> String {
        self.name.clone()
    }
}

pub fn validate_platform(platform: &Platform) -> DomainResult<()> {
    if platform.name.is_empty() {
        return Err(DomainError::InvariantViolation(
            "Platform name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// How a channel is addressed inside its platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatRef {
    Id(i64),
    Name(String),
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{}", id),
            ChatRef::Name(name) => write!(f, "@{}", name.trim_start_matches('@')),
        }
    }
}

/// Natural key of a Channel: the platform plus either chat identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub platform_id: PlatformId,
    pub chat: ChatRef,
}

/// A destination within a Platform
///
/// At least one of `chat_name` / `chat_id` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Option<ChannelId>,
    pub platform_id: PlatformId,
    pub chat_name: Option<String>,
    pub chat_id: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    pub fn new(
        platform_id: PlatformId,
        chat_name: Option<String>,
        chat_id: Option<i64>,
        description: Option<String>,
    ) -> DomainResult<Self> {
        let channel = Self {
            id: None,
            platform_id,
            chat_name: chat_name
                .map(|n| n.trim().trim_start_matches('@').to_string())
                .filter(|n| !n.is_empty()),
            chat_id,
            description,
            created_at: Utc::now(),
        };
        validate_channel(&channel)?;
        Ok(channel)
    }

    pub fn with_id(mut self, id: ChannelId) -> Self {
        self.id = Some(id);
        self
    }

    /// Address used when sending; the numeric id wins when both exist.
    pub fn chat_ref(&self) -> Option<ChatRef> {
        match (&self.chat_id, &self.chat_name) {
            (Some(id), _) => Some(ChatRef::Id(*id)),
            (None, Some(name)) => Some(ChatRef::Name(name.clone())),
            (None, None) => None,
        }
    }
}

impl Entity for Channel {
    type Id = ChannelId;
    type Key = ChannelKey;

    const KIND: &'static str = "channel";

    /// Falls back to a name key only for channels without a numeric id.
    fn natural_key(&self) -> ChannelKey {
        let chat = match (&self.chat_id, &self.chat_name) {
            (Some(id), _) => ChatRef::Id(*id),
            (None, Some(name)) => ChatRef::Name(name.clone()),
            (None, None) => ChatRef::Name(String::new()),
        };
        ChannelKey {
            platform_id: self.platform_id,
            chat,
        }
    }
}

pub fn validate_channel(channel: &Channel) -> DomainResult<()> {
    if channel.chat_name.is_none() && channel.chat_id.is_none() {
        return Err(DomainError::InvariantViolation(
            "Channel needs a chat name or a chat id".to_string(),
        ));
    }
    Ok(())
}
