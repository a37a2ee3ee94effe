pub mod entity;
pub mod invariants;

pub use entity::{Episode, EpisodeKey};
pub use invariants::validate_episode;
