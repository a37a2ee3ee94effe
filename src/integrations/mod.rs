// src/integrations/mod.rs
//
// External Integrations Module
//
// HTTP adapters behind the ports: the source catalog, the metadata
// provider and the messaging platform. Adapters map external payloads to
// domain records and never touch the store.

pub mod animefire;
pub mod jikan;
pub mod telegram;

pub use animefire::{AnimeFireClient, ScanPolicy};
pub use jikan::JikanClient;
pub use telegram::TelegramClient;
