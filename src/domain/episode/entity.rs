use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::invariants::validate_episode;
use crate::domain::links::EpisodeCandidate;
use crate::domain::publication::AddedTo;
use crate::domain::{AnimeId, DomainResult, Entity, EpisodeId};

/// Natural key of an Episode: owning anime's source id + episode number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeKey {
    pub source_id: i64,
    pub episode_number: u32,
}

/// A single released episode with its stream and download links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Assigned by the store on insert
    pub id: Option<EpisodeId>,

    /// Owning anime (REQUIRED, must already be persisted)
    pub anime_id: AnimeId,

    /// Owning anime's provider identifier
    pub source_id: i64,

    pub episode_number: u32,
    pub watch_link: String,
    pub download_link_hd: Option<String>,
    pub download_link_sd: Option<String>,

    /// Links point at the provisional hosting bucket
    pub temp: bool,

    #[serde(default)]
    pub added_to: AddedTo,

    pub created_at: DateTime<Utc>,
}

impl Episode {
    /// Build a not-yet-persisted Episode from a merged candidate.
    /// `anime_id` MUST be the stored identity of the candidate's anime.
    pub fn from_candidate(anime_id: AnimeId, candidate: EpisodeCandidate) -> DomainResult<Self> {
        let episode = Self {
            id: None,
            anime_id,
            source_id: candidate.source_id,
            episode_number: candidate.episode_number,
            watch_link: candidate.watch_link,
            download_link_hd: candidate.download_link_hd,
            download_link_sd: candidate.download_link_sd,
            temp: candidate.temp,
            added_to: AddedTo::default(),
            created_at: Utc::now(),
        };

        validate_episode(&episode)?;
        Ok(episode)
    }

    pub fn with_id(mut self, id: EpisodeId) -> Self {
        self.id = Some(id);
        self
    }

    /// Preferred link for video delivery: HD, falling back to SD
    pub fn best_download_link(&self) -> Option<&str> {
        self.download_link_hd
            .as_deref()
            .or(self.download_link_sd.as_deref())
    }
}

impl Entity for Episode {
    type Id = EpisodeId;
    type Key = EpisodeKey;

    const KIND: &'static str = "episode";

    fn natural_key(&self) -> EpisodeKey {
        EpisodeKey {
            source_id: self.source_id,
            episode_number: self.episode_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> EpisodeCandidate {
        EpisodeCandidate {
            source_id: 52991,
            episode_number: 4,
            watch_link: "https://catalog.test/animes/frieren/4".to_string(),
            download_link_hd: None,
            download_link_sd: Some("https://cdn.test/mp4/frieren-4-sd.mp4".to_string()),
            temp: false,
        }
    }

    #[test]
    fn test_from_candidate_carries_links() {
        let episode = Episode::from_candidate(AnimeId(7), candidate()).unwrap();

        assert_eq!(episode.anime_id, AnimeId(7));
        assert_eq!(
            episode.natural_key(),
            EpisodeKey { source_id: 52991, episode_number: 4 }
        );
        assert_eq!(
            episode.best_download_link(),
            Some("https://cdn.test/mp4/frieren-4-sd.mp4")
        );
    }

    #[test]
    fn test_from_candidate_requires_a_download_link() {
        let mut c = candidate();
        c.download_link_sd = None;
        assert!(Episode::from_candidate(AnimeId(7), c).is_err());
    }
}
