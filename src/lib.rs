//! Tag-path HTML scraper
//!
//! Extracts tabular records from HTML using a small declarative spec:
//! - an optional trim scope, e.g. `<div class="results">`
//! - tag-path selectors, e.g. `<table><tr><td>`
//! - row labels and a group width
//!
//! Text fragments are collected in document order and regrouped into
//! labeled rows. A tag census mode lists every tag path of a page to help
//! write selectors.

pub mod document;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod fetch;
pub mod grouping;
pub mod path;
pub mod service;
pub mod settings;
pub mod store;

pub use document::{Document, DomNode};
pub use engine::{census, extract, extract_raw, ExtractionSpec, OutputFormat, RawOutput, TagPathStat};
pub use error::{Entity, ScrapeError, StoreError};
pub use fetch::{Fetcher, HttpFetcher, StaticFetcher};
pub use grouping::Record;
pub use service::{DebugInfo, RawQuery, ScrapeResponse, ScrapeService};
pub use store::{ConfigStore, MemoryStore};
