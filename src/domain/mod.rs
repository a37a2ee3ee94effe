// src/domain/mod.rs
//
// Domain Root - the single source of truth for the domain API.
// All other modules import from `crate::domain::*`.

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod anime;
pub mod destination;
pub mod episode;
pub mod links;
pub mod publication;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use anime::{validate_anime, Anime, AnimeMetadata};
pub use destination::{validate_channel, validate_platform, Channel, ChannelKey, ChatRef, Platform};
pub use episode::{validate_episode, Episode, EpisodeKey};
pub use links::{
    catalog_name_from_href, CatalogEntry, DownloadLink, EpisodeCandidate, WatchLink,
    ALL_EPISODES_SUFFIX,
};
pub use publication::{
    AddedTo, EntityKind, PublicationKey, PublicationMarker, PublicationRecord, PublicationTarget,
};

// ============================================================================
// IDENTITIES
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! surrogate_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

surrogate_id!(
    /// Store-assigned identity of an Anime row
    AnimeId
);
surrogate_id!(
    /// Store-assigned identity of an Episode row
    EpisodeId
);
surrogate_id!(PlatformId);
surrogate_id!(ChannelId);
surrogate_id!(PublicationId);

/// Binds an entity kind to its identity and natural-key types.
///
/// The identity is assigned by the store on insert; the natural key is
/// what deduplication is decided on.
pub trait Entity: Sized {
    type Id: Copy + fmt::Debug + fmt::Display;
    type Key: fmt::Debug;

    /// Short lowercase name used in log lines and error messages
    const KIND: &'static str;

    fn natural_key(&self) -> Self::Key;
}

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error(
        "Ordinal mismatch for source {source_id} at position {position}: \
         watch ordinal {watch_ordinal} != download ordinal {download_ordinal}"
    )]
    OrdinalMismatch {
        source_id: i64,
        position: usize,
        watch_ordinal: u32,
        download_ordinal: u32,
    },
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
