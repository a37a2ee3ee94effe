// src/domain/links.rs
//
// Raw records produced by the source catalog and the merged episode
// candidate built from them.

use serde::{Deserialize, Serialize};

/// Suffix the catalog appends to an anime's all-episodes page
pub const ALL_EPISODES_SUFFIX: &str = "-todos-os-episodios";

/// One release listed by the source catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Title as shown on the listing, used for metadata search
    pub title: String,
    /// Link to the anime's detail (all episodes) page
    pub detail_href: String,
    /// Slug the catalog uses in download paths
    pub catalog_name: String,
}

impl CatalogEntry {
    /// Build an entry from a listing anchor. Returns `None` when the href
    /// carries no usable slug.
    pub fn from_listing(title: impl Into<String>, detail_href: impl Into<String>) -> Option<Self> {
        let detail_href = detail_href.into();
        let catalog_name = catalog_name_from_href(&detail_href)?;
        Some(Self {
            title: title.into().trim().to_string(),
            detail_href,
            catalog_name,
        })
    }

    /// Entry for a detail URL with no listing title; the slug stands in
    /// for the title.
    pub fn from_detail_href(detail_href: impl Into<String>) -> Option<Self> {
        let detail_href = detail_href.into();
        let catalog_name = catalog_name_from_href(&detail_href)?;
        Some(Self {
            title: catalog_name.replace('-', " "),
            detail_href,
            catalog_name,
        })
    }
}

/// `https://host/animes/frieren-todos-os-episodios` -> `frieren`
pub fn catalog_name_from_href(href: &str) -> Option<String> {
    let last = href
        .trim_end_matches('/')
        .rsplit('/')
        .next()?
        .trim_end_matches(ALL_EPISODES_SUFFIX);

    if last.is_empty() || last.contains(':') {
        None
    } else {
        Some(last.to_string())
    }
}

/// Stream page of one episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchLink {
    pub source_id: i64,
    pub ordinal: u32,
    pub watch_link: String,
}

/// Download links of one episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub source_id: i64,
    pub ordinal: u32,
    pub hd_link: Option<String>,
    pub sd_link: Option<String>,
    /// Links point at the provisional hosting bucket
    pub temporary: bool,
}

/// A watch link and a download link that agreed on their ordinal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCandidate {
    pub source_id: i64,
    pub episode_number: u32,
    pub watch_link: String,
    pub download_link_hd: Option<String>,
    pub download_link_sd: Option<String>,
    pub temp: bool,
}
