//! Extraction entry points
//!
//! Three operations over an already-parsed [`Document`]:
//! - [`extract`] - simple mode: flat tag set, short last row kept
//! - [`extract_raw`] - raw mode: nested selectors, short last row dropped,
//!   optionally returns the trimmed markup instead
//! - [`census`] - tag-path statistics for exploring a page

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::Document;
use crate::error::ScrapeError;
use crate::extractors::{self, apply_trim, extract_nested, extract_sequential, simple_tag_names};
use crate::grouping::{
    group_fragments, raw_labels, resolve_width, simple_labels, PartialGroup, Record,
};

pub use crate::extractors::TagPathStat;

/// Declarative description of what to pull out of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSpec {
    /// Single-step scope, e.g. `<div class="results">`
    #[serde(default)]
    pub trim: Option<String>,
    /// Tag-path selectors, e.g. `<table><tr><td>`
    #[serde(default)]
    pub selectors: Vec<String>,
    /// Row labels, paired by position with the fragments of one row
    #[serde(default)]
    pub labels: Vec<String>,
    /// Fragments per row; non-positive or absent means "derive it"
    #[serde(default)]
    pub group_width: Option<i64>,
}

/// Raw-mode output selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Serialized (trimmed) markup, extraction skipped
    Html,
    /// Grouped records
    Json,
}

impl FromStr for OutputFormat {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(ScrapeError::InvalidOutputFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Html => "html",
            Self::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutput {
    Html(String),
    Records(Vec<Record>),
}

/// Simple-mode extraction.
///
/// Every selector is reduced to its last segment, taken as a plain tag
/// name. Matching elements are collected in document order and grouped; a
/// short final row is kept.
pub fn extract(document: &Document, spec: &ExtractionSpec) -> Result<Vec<Record>, ScrapeError> {
    let root = apply_trim(document.root(), spec.trim.as_deref())?;

    let tag_names = simple_tag_names(&spec.selectors);
    info!(tags = ?tag_names, "extracting text using tags");
    let cells = extract_sequential(root, &tag_names);

    let width = resolve_width(spec.group_width, spec.labels.len(), cells.len());
    let labels = if spec.labels.is_empty() {
        simple_labels(&spec.selectors)
    } else {
        spec.labels.clone()
    };

    let records = group_fragments(&cells, &labels, width, PartialGroup::Keep);
    info!(cells = cells.len(), width, records = records.len(), "grouped simple extraction");
    Ok(records)
}

/// Raw-mode extraction.
///
/// With [`OutputFormat::Html`] the (trimmed) markup is returned in the
/// parser's compact serialization. It is not re-indented or pretty-printed.
/// Otherwise every selector is matched as a nested path, results are
/// concatenated in selector order and grouped; a short final row is dropped.
pub fn extract_raw(
    document: &Document,
    spec: &ExtractionSpec,
    format: OutputFormat,
) -> Result<RawOutput, ScrapeError> {
    let root = apply_trim(document.root(), spec.trim.as_deref())?;

    if format == OutputFormat::Html {
        return Ok(RawOutput::Html(document.serialize(root)));
    }

    info!(
        tags = ?spec.selectors,
        row_labels = ?spec.labels,
        group_width = ?spec.group_width,
        "raw extraction"
    );
    let cells = extract_nested(root, &spec.selectors);

    let width = resolve_width(spec.group_width, spec.labels.len(), cells.len());
    let labels = if spec.labels.is_empty() {
        raw_labels(&spec.selectors)
    } else {
        spec.labels.clone()
    };

    let records = group_fragments(&cells, &labels, width, PartialGroup::Discard);
    info!(cells = cells.len(), width, records = records.len(), "grouped raw extraction");
    Ok(RawOutput::Records(records))
}

/// Tag-path census of the (optionally trimmed) document.
pub fn census(document: &Document, trim: Option<&str>) -> Result<Vec<TagPathStat>, ScrapeError> {
    let root = apply_trim(document.root(), trim)?;
    let stats = extractors::census(root);
    info!(paths = stats.len(), "tag census");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <html><body>
          <div class="menu"><td>not a cell</td></div>
          <table class="scores">
            <tr><td>Ada</td><td>36</td></tr>
            <tr><td>Grace</td><td>45</td></tr>
            <tr><td>Linus</td></tr>
          </table>
        </body></html>
    "#;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    fn spec(trim: Option<&str>, selectors: &[&str], labels: &[&str], width: Option<i64>) -> ExtractionSpec {
        ExtractionSpec {
            trim: trim.map(String::from),
            selectors: strings(selectors),
            labels: strings(labels),
            group_width: width,
        }
    }

    #[test]
    fn test_simple_mode_keeps_short_row() {
        let doc = Document::parse(PAGE);
        let records = extract(
            &doc,
            &spec(Some(r#"<table class="scores">"#), &["<td>"], &["name", "age"], None),
        )
        .unwrap();
        assert_eq!(
            records,
            vec![
                record(&[("name", "Ada"), ("age", "36")]),
                record(&[("name", "Grace"), ("age", "45")]),
                record(&[("name", "Linus")]),
            ]
        );
    }

    #[test]
    fn test_raw_mode_drops_short_row() {
        let doc = Document::parse(PAGE);
        let out = extract_raw(
            &doc,
            &spec(Some(r#"<table class="scores">"#), &["<table><tr><td>"], &["name", "age"], None),
            OutputFormat::Json,
        )
        .unwrap();
        assert_eq!(
            out,
            RawOutput::Records(vec![
                record(&[("name", "Ada"), ("age", "36")]),
                record(&[("name", "Grace"), ("age", "45")]),
            ])
        );
    }

    #[test]
    fn test_simple_mode_default_labels_and_width() {
        let doc = Document::parse("<ul><li>a</li><li>b</li><li>c</li></ul>");
        let records = extract(&doc, &spec(None, &["<ul><li>"], &[], None)).unwrap();
        // No width, no labels: one group of everything, labeled by the last segment.
        assert_eq!(records, vec![record(&[("li", "a")])]);
    }

    #[test]
    fn test_raw_mode_default_labels_are_selectors() {
        let doc = Document::parse("<h1>T</h1><p>body</p>");
        let out = extract_raw(&doc, &spec(None, &["<h1>", "<p>"], &[], None), OutputFormat::Json)
            .unwrap();
        assert_eq!(
            out,
            RawOutput::Records(vec![record(&[("<h1>", "T"), ("<p>", "body")])])
        );
    }

    #[test]
    fn test_trim_not_found_stops_every_mode() {
        let doc = Document::parse(PAGE);
        let missing = spec(Some("<article>"), &["<td>"], &[], Some(1));

        assert!(matches!(extract(&doc, &missing), Err(ScrapeError::TrimNotFound(_))));
        assert!(matches!(
            extract_raw(&doc, &missing, OutputFormat::Json),
            Err(ScrapeError::TrimNotFound(_))
        ));
        assert!(matches!(
            extract_raw(&doc, &missing, OutputFormat::Html),
            Err(ScrapeError::TrimNotFound(_))
        ));
        assert!(matches!(census(&doc, Some("<article>")), Err(ScrapeError::TrimNotFound(_))));
    }

    #[test]
    fn test_html_output_skips_extraction() {
        let doc = Document::parse(PAGE);
        let out = extract_raw(
            &doc,
            &spec(Some(r#"<div class="menu">"#), &["<nonsense"], &[], None),
            OutputFormat::Html,
        )
        .unwrap();
        assert_eq!(
            out,
            RawOutput::Html(r#"<div class="menu">not a cell</div>"#.to_string())
        );
    }

    #[test]
    fn test_census_with_trim() {
        let doc = Document::parse(PAGE);
        let stats = census(&doc, Some("<table>")).unwrap();
        let tr = stats.iter().find(|s| s.tag == "<table><tbody><tr>").unwrap();
        assert_eq!(tr.count, 3);
        assert_eq!(tr.example_output, "Ada36");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(ScrapeError::InvalidOutputFormat(_))
        ));
    }
}
