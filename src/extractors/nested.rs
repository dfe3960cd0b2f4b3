//! Raw-mode extraction: independent multi-step selectors, fanned out step by step.

use tracing::{debug, warn};

use crate::document::DomNode;
use crate::path::{parse_path, PathExpr};

/// All elements reached by following `path` down from `root`.
///
/// A first step naming the root's own tag is skipped instead of being
/// matched again below the root. Each later step replaces the candidates with
/// every matching descendant of every candidate, in order. Overlapping
/// candidates may contribute the same element twice.
pub fn match_path<'a>(root: DomNode<'a>, path: &PathExpr) -> Vec<DomNode<'a>> {
    let mut steps = path.steps();
    if root.tag_name() == Some(path.first().tag_name.as_str()) {
        steps = &steps[1..];
    }

    let mut candidates = vec![root];
    for step in steps {
        candidates = candidates
            .iter()
            .flat_map(|candidate| candidate.descendants().filter(|node| step.matches(node)))
            .collect();
        debug!(tag = step.tag_name.as_str(), found = candidates.len(), "path step");
        if candidates.is_empty() {
            break;
        }
    }
    candidates
}

/// Text of every match of every selector, concatenated in selector order.
///
/// An unparseable selector contributes nothing; the others still run.
pub fn extract_nested(root: DomNode<'_>, selectors: &[String]) -> Vec<String> {
    let mut fragments = Vec::new();

    for selector in selectors {
        let Some(path) = parse_path(selector) else {
            warn!(selector = selector.as_str(), "selector is not parseable, skipping");
            continue;
        };
        fragments.extend(
            match_path(root, &path)
                .into_iter()
                .map(|node| node.text())
                .filter(|text| !text.is_empty()),
        );
    }

    debug!(selectors = selectors.len(), count = fragments.len(), "nested extraction");
    fragments
}
