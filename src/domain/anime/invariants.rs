use super::entity::Anime;
use crate::domain::{DomainError, DomainResult};

/// Validates all Anime invariants
pub fn validate_anime(anime: &Anime) -> DomainResult<()> {
    validate_source_id(anime.source_id)?;
    validate_title(&anime.title)?;
    Ok(())
}

/// Provider identifiers are positive
fn validate_source_id(source_id: i64) -> DomainResult<()> {
    if source_id <= 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Anime source id must be positive, got {}",
            source_id
        )));
    }
    Ok(())
}

/// Title cannot be empty
fn validate_title(title: &str) -> DomainResult<()> {
    if title.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Anime title cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Invariants that must hold true for Anime domain:
///
/// 1. `source_id` is positive and globally unique (uniqueness enforced by the store)
/// 2. Title is non-empty and unique within the store
/// 3. Identity never changes once assigned
/// 4. An Anime can exist without episodes or publications

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::anime::AnimeMetadata;

    fn anime(source_id: i64, title: &str) -> Anime {
        let mut anime = Anime::from_metadata(AnimeMetadata {
            source_id: 1,
            title: "placeholder".to_string(),
            ..Default::default()
        })
        .unwrap();
        anime.source_id = source_id;
        anime.title = title.to_string();
        anime
    }

    #[test]
    fn test_valid_anime() {
        assert!(validate_anime(&anime(5114, "Fullmetal Alchemist: Brotherhood")).is_ok());
    }

    #[test]
    fn test_empty_title_fails() {
        assert!(validate_anime(&anime(5114, "   ")).is_err());
    }

    #[test]
    fn test_non_positive_source_id_fails() {
        assert!(validate_anime(&anime(0, "Monster")).is_err());
        assert!(validate_anime(&anime(-3, "Monster")).is_err());
    }

    #[test]
    fn test_from_metadata_rejects_blank_title() {
        let result = Anime::from_metadata(AnimeMetadata {
            source_id: 19,
            title: "  ".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
    }
}
