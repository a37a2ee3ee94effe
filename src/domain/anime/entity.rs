use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::invariants::validate_anime;
use crate::domain::publication::AddedTo;
use crate::domain::{AnimeId, DomainResult, Entity};

/// Descriptive record returned by the metadata provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimeMetadata {
    /// Canonical provider identifier
    pub source_id: i64,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    /// Classification such as "TV", "Movie" or "OVA"
    pub kind: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub airing: Option<bool>,
    /// Human-readable airing window, e.g. "Apr 3, 2024 to ?"
    pub aired: Option<String>,
    pub rating: Option<String>,
    pub duration: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    pub studios: Vec<String>,
    pub producers: Vec<String>,
    pub synopsis: Option<String>,
}

/// An anime work known to the store
///
/// Identity is `source_id`; `id` is assigned by the store on insert and is
/// `None` until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub id: Option<AnimeId>,
    pub source_id: i64,
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,
    pub kind: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    pub airing: Option<bool>,
    pub aired: Option<String>,
    pub rating: Option<String>,
    pub duration: Option<String>,
    pub season: Option<String>,
    pub year: Option<i32>,
    pub studios: Vec<String>,
    pub producers: Vec<String>,
    pub synopsis: Option<String>,

    /// Diagnostic view of where this anime was published.
    /// Derived from publication records, never consulted for dedup.
    #[serde(default)]
    pub added_to: AddedTo,

    pub created_at: DateTime<Utc>,
}

impl Anime {
    /// Build a not-yet-persisted Anime from provider metadata.
    pub fn from_metadata(metadata: AnimeMetadata) -> DomainResult<Self> {
        let anime = Self {
            id: None,
            source_id: metadata.source_id,
            title: metadata.title.trim().to_string(),
            title_english: non_blank(metadata.title_english),
            title_japanese: non_blank(metadata.title_japanese),
            kind: non_blank(metadata.kind),
            episodes: metadata.episodes,
            status: non_blank(metadata.status),
            airing: metadata.airing,
            aired: non_blank(metadata.aired),
            rating: non_blank(metadata.rating),
            duration: non_blank(metadata.duration),
            season: non_blank(metadata.season),
            year: metadata.year,
            studios: metadata.studios,
            producers: metadata.producers,
            synopsis: non_blank(metadata.synopsis),
            added_to: AddedTo::default(),
            created_at: Utc::now(),
        };

        validate_anime(&anime)?;
        Ok(anime)
    }

    /// Attach the identity assigned by the store.
    pub fn with_id(mut self, id: AnimeId) -> Self {
        self.id = Some(id);
        self
    }
}

impl Entity for Anime {
    type Id = AnimeId;
    type Key = i64;

    const KIND: &'static str = "anime";

    fn natural_key(&self) -> i64 {
        self.source_id
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
