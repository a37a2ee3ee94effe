// src/services/report.rs
//
// Per-item outcome bookkeeping shared by ingestion and publication.

use crate::error::AppError;

/// One item that was abandoned without aborting its batch
#[derive(Debug)]
pub struct ItemFailure {
    /// What failed, e.g. a catalog title or "episode 3 of source 52991"
    pub subject: String,
    pub error: AppError,
}

impl ItemFailure {
    pub fn new(subject: impl Into<String>, error: AppError) -> Self {
        let subject = subject.into();
        log::error!("{}: {}", subject, error);
        Self { subject, error }
    }
}
