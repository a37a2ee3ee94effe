// src/domain/publication.rs
//
// Publication state.
//
// A PublicationRecord is the only proof that an entity reached a channel.
// `AddedTo` is a read-only diagnostic rendering of those records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{AnimeId, ChannelId, DomainError, Entity, EpisodeId, PublicationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Anime,
    Episode,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Anime => "anime",
            EntityKind::Episode => "episode",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anime" => Ok(EntityKind::Anime),
            "episode" => Ok(EntityKind::Episode),
            other => Err(DomainError::InvariantViolation(format!(
                "Unknown entity kind '{}'",
                other
            ))),
        }
    }
}

/// The stored entity a publication refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicationTarget {
    Anime(AnimeId),
    Episode(EpisodeId),
}

impl PublicationTarget {
    pub fn from_parts(kind: EntityKind, entity_id: i64) -> Self {
        match kind {
            EntityKind::Anime => PublicationTarget::Anime(AnimeId(entity_id)),
            EntityKind::Episode => PublicationTarget::Episode(EpisodeId(entity_id)),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            PublicationTarget::Anime(_) => EntityKind::Anime,
            PublicationTarget::Episode(_) => EntityKind::Episode,
        }
    }

    pub fn entity_id(&self) -> i64 {
        match self {
            PublicationTarget::Anime(id) => id.0,
            PublicationTarget::Episode(id) => id.0,
        }
    }
}

impl fmt::Display for PublicationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.entity_id())
    }
}

/// Natural key of a PublicationRecord: one per (entity, channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicationKey {
    pub target: PublicationTarget,
    pub channel_id: ChannelId,
}

/// Durable proof that `target` was sent to `channel_id`.
/// Created only after the send is confirmed; never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub id: Option<PublicationId>,
    pub target: PublicationTarget,
    pub channel_id: ChannelId,
    pub external_message_id: i64,
    pub created_at: DateTime<Utc>,
}

impl PublicationRecord {
    pub fn new(target: PublicationTarget, channel_id: ChannelId, external_message_id: i64) -> Self {
        Self {
            id: None,
            target,
            channel_id,
            external_message_id,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: PublicationId) -> Self {
        self.id = Some(id);
        self
    }
}

impl Entity for PublicationRecord {
    type Id = PublicationId;
    type Key = PublicationKey;

    const KIND: &'static str = "publication";

    fn natural_key(&self) -> PublicationKey {
        PublicationKey {
            target: self.target,
            channel_id: self.channel_id,
        }
    }
}

/// One `#destination=message_id` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationMarker {
    pub destination: String,
    pub message_id: i64,
}

impl fmt::Display for PublicationMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}={}", self.destination, self.message_id)
    }
}

/// Accumulated publication markers of an entity, rendered as
/// `#telegram=12,#telegram=40` or `#none`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddedTo(Vec<PublicationMarker>);

impl AddedTo {
    pub fn push(&mut self, destination: impl Into<String>, message_id: i64) {
        self.0.push(PublicationMarker {
            destination: destination.into(),
            message_id,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn markers(&self) -> &[PublicationMarker] {
        &self.0
    }
}

impl From<Vec<PublicationMarker>> for AddedTo {
    fn from(markers: Vec<PublicationMarker>) -> Self {
        Self(markers)
    }
}

impl fmt::Display for AddedTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("#none");
        }
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}
