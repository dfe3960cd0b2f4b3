//! Request layer
//!
//! Resolves a stored scraper, fetches its page and runs one of the engine
//! operations. Every call parses its own document; nothing is cached.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::Document;
use crate::engine::{self, ExtractionSpec, OutputFormat, RawOutput, TagPathStat};
use crate::error::ScrapeError;
use crate::fetch::Fetcher;
use crate::grouping::Record;
use crate::store::ConfigStore;

/// Simple-mode result with the settings that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResponse {
    pub data: Vec<Record>,
    pub debug_info: DebugInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugInfo {
    pub trim_tag: Option<String>,
    pub group_row_count: Option<i64>,
    pub row_labels: Vec<String>,
    /// Selectors with surrounding angle brackets stripped
    pub tags: Vec<String>,
}

/// Ad-hoc raw-mode parameters; nothing here is read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuery {
    /// `html` or `json`; anything else is rejected
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub trim_tag: Option<String>,
    #[serde(default)]
    pub group_row_count: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub row_labels: Vec<String>,
}

pub struct ScrapeService<F, S> {
    fetcher: F,
    store: S,
}

impl<F: Fetcher, S: ConfigStore> ScrapeService<F, S> {
    pub fn new(fetcher: F, store: S) -> Self {
        Self { fetcher, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the stored spec of `scraper_id` in simple mode.
    pub fn scrape(&self, scraper_id: u64) -> Result<ScrapeResponse, ScrapeError> {
        let (scraper, spec) = self.store.load_spec(scraper_id)?;

        let debug_info = DebugInfo {
            trim_tag: spec.trim.clone(),
            group_row_count: spec.group_width,
            row_labels: spec.labels.clone(),
            tags: spec
                .selectors
                .iter()
                .map(|s| s.trim_matches(|c| c == '<' || c == '>').to_string())
                .collect(),
        };

        let markup = self.fetcher.fetch(&scraper.scraping_url)?;
        let document = Document::parse(&markup);
        let data = engine::extract(&document, &spec)?;

        info!(scraper_id, records = data.len(), "scrape finished");
        Ok(ScrapeResponse { data, debug_info })
    }

    /// Run ad-hoc selectors against the page of `scraper_id` in raw mode.
    pub fn raw(&self, scraper_id: u64, query: &RawQuery) -> Result<RawOutput, ScrapeError> {
        let format: OutputFormat = query.output_format.as_deref().unwrap_or_default().parse()?;

        let scraper = self.store.get_scraper(scraper_id)?;
        let markup = self.fetcher.fetch(&scraper.scraping_url)?;
        let document = Document::parse(&markup);

        let spec = ExtractionSpec {
            trim: query.trim_tag.clone(),
            selectors: query.tags.iter().map(|t| t.trim().to_string()).collect(),
            labels: query.row_labels.clone(),
            group_width: query.group_row_count,
        };
        engine::extract_raw(&document, &spec, format)
    }

    /// Tag census of the page of `scraper_id`.
    pub fn raw_tags(
        &self,
        scraper_id: u64,
        trim_tag: Option<&str>,
    ) -> Result<Vec<TagPathStat>, ScrapeError> {
        let scraper = self.store.get_scraper(scraper_id)?;
        let markup = self.fetcher.fetch(&scraper.scraping_url)?;
        let document = Document::parse(&markup);
        engine::census(&document, trim_tag)
    }
}
