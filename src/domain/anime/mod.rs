pub mod entity;
pub mod invariants;

pub use entity::{Anime, AnimeMetadata};
pub use invariants::validate_anime;
