//! Scope trimming
//!
//! Narrows the working root to the first element matching a single step.

use tracing::{debug, warn};

use crate::document::DomNode;
use crate::error::ScrapeError;
use crate::path::parse_step;

/// Find the first node (pre-order, root included) matching `trim_input`.
///
/// An unparseable step is reported exactly like a step that matched nothing:
/// extraction must never silently fall back to the whole document.
pub fn trim_scope<'a>(root: DomNode<'a>, trim_input: &str) -> Result<DomNode<'a>, ScrapeError> {
    let not_found = || ScrapeError::TrimNotFound(trim_input.to_string());

    let Some(step) = parse_step(trim_input.trim()) else {
        warn!(trim = trim_input, "trim step is not parseable");
        return Err(not_found());
    };

    let found = std::iter::once(root)
        .chain(root.descendants())
        .find(|node| step.matches(node));

    match found {
        Some(node) => {
            debug!(trim = trim_input, "trimmed working root");
            Ok(node)
        }
        None => {
            warn!(trim = trim_input, "trim tag not found in page");
            Err(not_found())
        }
    }
}

/// Apply an optional trim. Absent or blank input keeps `root`.
pub fn apply_trim<'a>(
    root: DomNode<'a>,
    trim_input: Option<&str>,
) -> Result<DomNode<'a>, ScrapeError> {
    match trim_input {
        Some(input) if !input.trim().is_empty() => trim_scope(root, input),
        _ => Ok(root),
    }
}
