// src/integrations/animefire/parsing.rs
//
// Pure HTML extraction for the catalog pages. No network access here so
// every rule can be tested on literal fixtures.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::domain::{CatalogEntry, DownloadLink};
use crate::error::{AppError, AppResult};

const DUBBED_MARKER: &str = "(Dublado)";
const SD_MARKER: &str = "(SD)";
const HD_MARKER: &str = "(HD)";

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|e| AppError::Other(format!("invalid selector '{}': {}", css, e)))
}

fn anchor_text(anchor: &ElementRef) -> String {
    anchor
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Releases listed on one `em-lancamento` page, in page order.
pub fn parse_release_page(
    html: &str,
    catalog_url: &str,
    include_dubbed: bool,
) -> AppResult<Vec<CatalogEntry>> {
    let document = Html::parse_document(html);
    let a_selector = selector("a[href]")?;
    let needle = format!("{}/animes/", catalog_url.trim_end_matches('/'));

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for anchor in document.select(&a_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(&needle) {
            continue;
        }

        let title = anchor_text(&anchor);
        if title.is_empty() {
            continue;
        }
        if !include_dubbed && title.contains(DUBBED_MARKER) {
            log::debug!("Skipping dubbed release '{}'", title);
            continue;
        }
        if !seen.insert(href.to_string()) {
            continue;
        }

        if let Some(entry) = CatalogEntry::from_listing(title, href) {
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// True when the page carries at least one link. Episode pages beyond the
/// last episode render without any.
pub fn page_has_anchor(html: &str) -> AppResult<bool> {
    let document = Html::parse_document(html);
    let a_selector = selector("a[href]")?;
    let found = document.select(&a_selector).next().is_some();
    Ok(found)
}

/// Download links of one episode page. `None` when no anchor points at the
/// accepted download host.
pub fn parse_download_page(
    html: &str,
    download_host: &str,
    source_id: i64,
    ordinal: u32,
) -> AppResult<Option<DownloadLink>> {
    let document = Html::parse_document(html);
    let a_selector = selector("a[href]")?;
    let permanent = format!("{}mp4/", download_host);
    let temporary = format!("{}mp4_temp/", download_host);

    let mut link = DownloadLink {
        source_id,
        ordinal,
        hd_link: None,
        sd_link: None,
        temporary: false,
    };

    for anchor in document.select(&a_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let is_temp = href.starts_with(&temporary);
        if !is_temp && !href.starts_with(&permanent) {
            continue;
        }

        let text = anchor_text(&anchor);
        let slot = if href.contains(SD_MARKER) || text.contains(SD_MARKER) {
            &mut link.sd_link
        } else if href.contains(HD_MARKER) || text.contains(HD_MARKER) {
            &mut link.hd_link
        } else {
            continue;
        };

        if slot.is_none() {
            *slot = Some(href.to_string());
            link.temporary |= is_temp;
        }
    }

    if link.hd_link.is_none() && link.sd_link.is_none() {
        Ok(None)
    } else {
        Ok(Some(link))
    }
}
