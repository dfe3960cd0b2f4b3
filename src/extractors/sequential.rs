//! Simple-mode extraction: one flat set of tag names, document order.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::document::DomNode;
use crate::path::last_segment;

/// Reduce configured selectors to the flat tag-name set used in simple mode.
///
/// Only the last segment of a multi-step selector counts, and it is taken
/// verbatim: `<table><tr><td>` means `td`, while `<td class="x">` names a tag
/// called `td class="x"` and so matches nothing.
pub fn simple_tag_names(selectors: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for selector in selectors {
        let name = last_segment(selector).trim();
        if name.is_empty() {
            warn!(selector = selector.as_str(), "empty selector, skipping");
            continue;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Text of every descendant element whose tag is in `tag_names`.
///
/// Matching elements do not stop the walk: a `<td>` nested in another `<td>`
/// yields its own fragment too. Elements with empty text are dropped.
pub fn extract_sequential(root: DomNode<'_>, tag_names: &[String]) -> Vec<String> {
    let wanted: HashSet<&str> = tag_names.iter().map(String::as_str).collect();

    let fragments: Vec<String> = root
        .descendants()
        .filter(|node| node.tag_name().is_some_and(|name| wanted.contains(name)))
        .map(|node| node.text())
        .filter(|text| !text.is_empty())
        .collect();

    debug!(tags = ?tag_names, count = fragments.len(), "sequential extraction");
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_simple_tag_names_use_last_segment() {
        let names = simple_tag_names(&strings(&[
            "<table><tr><td>",
            r#"<th class="head">"#,
            " <td> ",
            "<>",
        ]));
        assert_eq!(names, strings(&["td", r#"th class="head""#]));
    }

    #[test]
    fn test_class_qualified_name_matches_nothing() {
        let doc = Document::parse(
            r#"<table><tr><td class="name">Ada</td><td class="price">9</td></tr></table>"#,
        );
        let names = simple_tag_names(&strings(&[r#"<td class="price">"#]));
        assert!(extract_sequential(doc.root(), &names).is_empty());
    }

    #[test]
    fn test_document_order_across_tags() {
        let doc = Document::parse(
            "<table><tr><th>Name</th><td>Ada</td></tr><tr><th>Age</th><td>36</td></tr></table>",
        );
        let cells = extract_sequential(doc.root(), &strings(&["td", "th"]));
        assert_eq!(cells, strings(&["Name", "Ada", "Age", "36"]));
    }

    #[test]
    fn test_empty_elements_are_dropped() {
        let doc = Document::parse("<ul><li> </li><li>a</li><li></li><li>\n b \n</li></ul>");
        let items = extract_sequential(doc.root(), &strings(&["li"]));
        assert_eq!(items, strings(&["a", "b"]));
    }

    #[test]
    fn test_nested_matches_each_produce_a_fragment() {
        let doc = Document::parse("<div>outer <div>inner</div></div>");
        let texts = extract_sequential(doc.root(), &strings(&["div"]));
        assert_eq!(texts, strings(&["outerinner", "inner"]));
    }

    #[test]
    fn test_root_itself_is_not_a_candidate() {
        let doc = Document::parse("<div><span>x</span></div>");
        let div = doc
            .root()
            .descendants()
            .find(|n| n.tag_name() == Some("div"))
            .unwrap();
        assert!(extract_sequential(div, &strings(&["div"])).is_empty());
        assert_eq!(extract_sequential(div, &strings(&["span"])), strings(&["x"]));
    }

    #[test]
    fn test_no_tags_no_fragments() {
        let doc = Document::parse("<p>a</p>");
        assert!(extract_sequential(doc.root(), &[]).is_empty());
    }
}
