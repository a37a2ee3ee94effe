// src/integrations/jikan/mod.rs
//
// Jikan (MyAnimeList) metadata provider.

pub mod client;

pub use client::JikanClient;
