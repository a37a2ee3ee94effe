// src/integrations/animefire/mod.rs
//
// AnimeFire catalog: release listing and episode page scanning.

pub mod client;
pub mod parsing;

pub use client::{AnimeFireClient, ScanPolicy};
