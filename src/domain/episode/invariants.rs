use super::entity::Episode;
use crate::domain::{DomainError, DomainResult};

/// Validates all Episode invariants
pub fn validate_episode(episode: &Episode) -> DomainResult<()> {
    if episode.source_id <= 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Episode source id must be positive, got {}",
            episode.source_id
        )));
    }

    if episode.watch_link.trim().is_empty() {
        return Err(DomainError::InvariantViolation(format!(
            "Episode {} of source {} has no watch link",
            episode.episode_number, episode.source_id
        )));
    }

    let hd = present(&episode.download_link_hd);
    let sd = present(&episode.download_link_sd);
    if !hd && !sd {
        return Err(DomainError::InvariantViolation(format!(
            "Episode {} of source {} has no download link",
            episode.episode_number, episode.source_id
        )));
    }

    Ok(())
}

fn present(link: &Option<String>) -> bool {
    link.as_deref().is_some_and(|l| !l.trim().is_empty())
}

/// Invariants that must hold true for Episode domain:
///
/// 1. Episode MUST belong to a persisted Anime
/// 2. (source_id, episode_number) is unique
/// 3. Watch link is required; at least one download link is required
/// 4. No two episodes share any link (enforced by the store)

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::publication::AddedTo;
    use crate::domain::AnimeId;
    use chrono::Utc;

    fn episode() -> Episode {
        Episode {
            id: None,
            anime_id: AnimeId(1),
            source_id: 21,
            episode_number: 1,
            watch_link: "https://catalog.test/animes/one-piece/1".to_string(),
            download_link_hd: Some("https://cdn.test/mp4/op-1-hd.mp4".to_string()),
            download_link_sd: None,
            temp: false,
            added_to: AddedTo::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_valid_episode() {
        assert!(validate_episode(&episode()).is_ok());
    }

    #[test]
    fn test_blank_watch_link_fails() {
        let mut ep = episode();
        ep.watch_link = " ".to_string();
        assert!(validate_episode(&ep).is_err());
    }

    #[test]
    fn test_blank_download_links_fail() {
        let mut ep = episode();
        ep.download_link_hd = Some(String::new());
        assert!(validate_episode(&ep).is_err());
    }
}
