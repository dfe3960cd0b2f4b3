//! Error types

use std::fmt;

use thiserror::Error;

/// Errors surfaced by the request-level operations.
///
/// An unparseable selector is not an error: it simply matches nothing.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The source document could not be fetched. Never retried internally.
    #[error("Failed to fetch URL {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    /// The configured trim step matched nothing (or could not be parsed).
    #[error("Trim tag not found in page: {0}")]
    TrimNotFound(String),

    #[error("Scraper {0} not found")]
    ScraperNotFound(u64),

    #[error("Scraper config {0} not found")]
    ConfigNotFound(u64),

    #[error("Invalid or missing output_format parameter: {0:?}")]
    InvalidOutputFormat(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ScrapeError {
    /// Whether the caller should report this as a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TrimNotFound(_)
                | Self::ScraperNotFound(_)
                | Self::ConfigNotFound(_)
                | Self::Store(StoreError::NotFound { .. })
        )
    }
}

impl From<StoreError> for ScrapeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity: Entity::Scraper, id } => Self::ScraperNotFound(id),
            StoreError::NotFound { entity: Entity::ScraperConfig, id } => Self::ConfigNotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Kind of record held by a [`crate::store::ConfigStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Scraper,
    ScraperConfig,
    RowLabel,
    Tag,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scraper => "Scraper",
            Self::ScraperConfig => "Scraper config",
            Self::RowLabel => "Row label",
            Self::Tag => "Tag",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: u64 },

    /// Rejected input, e.g. a missing required field.
    #[error("{0}")]
    Invalid(String),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn not_found(entity: Entity, id: u64) -> Self {
        Self::NotFound { entity, id }
    }
}
