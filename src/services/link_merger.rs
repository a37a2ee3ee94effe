// src/services/link_merger.rs
//
// Pairs an anime's watch links with its download links.
//
// RULES:
// - Pairing is positional: the i-th watch record goes with the i-th download record
// - Both records at a position MUST carry the same ordinal
// - The first disagreement ends the merge for that anime
// - Unequal lengths: merging stops at the shorter list, the rest is dropped

use std::iter::{FusedIterator, Zip};
use std::vec;

use crate::domain::{DomainError, DomainResult, DownloadLink, EpisodeCandidate, WatchLink};

pub struct LinkMerger;

impl LinkMerger {
    /// Lazily merge the two lists of one anime.
    ///
    /// The returned iterator yields one candidate per agreeing position.
    /// On an ordinal disagreement it yields a single `OrdinalMismatch`
    /// error and then ends.
    pub fn merge(watch: Vec<WatchLink>, download: Vec<DownloadLink>) -> MergedEpisodes {
        MergedEpisodes {
            watch_len: watch.len(),
            download_len: download.len(),
            pairs: watch.into_iter().zip(download),
            position: 0,
            finished: false,
        }
    }
}

/// Single-pass sequence of merged candidates
pub struct MergedEpisodes {
    pairs: Zip<vec::IntoIter<WatchLink>, vec::IntoIter<DownloadLink>>,
    watch_len: usize,
    download_len: usize,
    position: usize,
    finished: bool,
}

impl MergedEpisodes {
    /// Drain the sequence into the agreeing prefix and the error that
    /// stopped it, if any.
    pub fn into_prefix(self) -> (Vec<EpisodeCandidate>, Option<DomainError>) {
        let mut candidates = Vec::new();
        for item in self {
            match item {
                Ok(candidate) => candidates.push(candidate),
                Err(err) => return (candidates, Some(err)),
            }
        }
        (candidates, None)
    }
}

impl Iterator for MergedEpisodes {
    type Item = DomainResult<EpisodeCandidate>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let Some((watch, download)) = self.pairs.next() else {
            self.finished = true;
            if self.watch_len != self.download_len {
                log::warn!(
                    "Link lists differ in length ({} watch, {} download); dropped {} unmatched",
                    self.watch_len,
                    self.download_len,
                    self.watch_len.abs_diff(self.download_len)
                );
            }
            return None;
        };

        let position = self.position;
        self.position += 1;

        if watch.ordinal != download.ordinal {
            self.finished = true;
            log::warn!(
                "Ordinal mismatch for source {} at position {}: watch {} vs download {}",
                watch.source_id,
                position,
                watch.ordinal,
                download.ordinal
            );
            return Some(Err(DomainError::OrdinalMismatch {
                source_id: watch.source_id,
                position,
                watch_ordinal: watch.ordinal,
                download_ordinal: download.ordinal,
            }));
        }

        Some(Ok(EpisodeCandidate {
            source_id: watch.source_id,
            episode_number: watch.ordinal,
            watch_link: watch.watch_link,
            download_link_hd: download.hd_link,
            download_link_sd: download.sd_link,
            temp: download.temporary,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, self.pairs.size_hint().1)
        }
    }
}

impl FusedIterator for MergedEpisodes {}
