//! Tag census: every distinct root-to-node tag path with a count and sample text.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::DomNode;

/// Occurrences of one tag path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPathStat {
    /// Full path, e.g. `<div><ul><li>`
    pub tag: String,
    pub count: u64,
    /// Text of the first element seen on this path
    pub example_output: String,
}

#[derive(Default)]
struct Census {
    stats: Vec<TagPathStat>,
    index: HashMap<String, usize>,
}

impl Census {
    fn record(&mut self, path: &str, node: &DomNode<'_>) {
        match self.index.get(path) {
            Some(&i) => self.stats[i].count += 1,
            None => {
                self.index.insert(path.to_string(), self.stats.len());
                self.stats.push(TagPathStat {
                    tag: path.to_string(),
                    count: 1,
                    example_output: node.text(),
                });
            }
        }
    }

    fn visit(&mut self, node: DomNode<'_>, parent_path: &str) {
        let Some(name) = node.tag_name() else {
            return;
        };
        let path = format!("{parent_path}<{name}>");
        self.record(&path, &node);
        for child in node.children() {
            self.visit(child, &path);
        }
    }
}

/// Walk the working root in pre-order and collect tag-path stats in
/// first-seen order.
///
/// The document root has no tag and is transparent: paths of an untrimmed
/// document start at `<html>`. Text and comment nodes are ignored.
pub fn census(root: DomNode<'_>) -> Vec<TagPathStat> {
    let mut census = Census::default();
    if root.is_element() {
        census.visit(root, "");
    } else {
        for child in root.children() {
            census.visit(child, "");
        }
    }
    census.stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::extractors::trim_scope;
    use pretty_assertions::assert_eq;

    fn stat(tag: &str, count: u64, example: &str) -> TagPathStat {
        TagPathStat {
            tag: tag.to_string(),
            count,
            example_output: example.to_string(),
        }
    }

    #[test]
    fn test_census_of_trimmed_div() {
        let doc = Document::parse("<div><span>x</span><span>y</span></div>");
        let div = trim_scope(doc.root(), "<div>").unwrap();
        assert_eq!(
            census(div),
            vec![stat("<div>", 1, "xy"), stat("<div><span>", 2, "x")]
        );
    }

    #[test]
    fn test_untrimmed_paths_start_at_html() {
        let doc = Document::parse("<p>a</p><!-- note --><p>b</p>");
        let tags: Vec<_> = census(doc.root()).into_iter().map(|s| s.tag).collect();
        assert_eq!(
            tags,
            vec!["<html>", "<html><head>", "<html><body>", "<html><body><p>"]
        );
    }

    #[test]
    fn test_example_is_first_occurrence_even_if_empty() {
        let doc = Document::parse("<ul><li></li><li>second</li></ul>");
        let ul = trim_scope(doc.root(), "<ul>").unwrap();
        let stats = census(ul);
        assert_eq!(stats[1], stat("<ul><li>", 2, ""));
    }

    #[test]
    fn test_same_tag_under_different_parents() {
        let doc = Document::parse("<div><b>1</b><i><b>2</b></i></div>");
        let div = trim_scope(doc.root(), "<div>").unwrap();
        let tags: Vec<_> = census(div).into_iter().map(|s| s.tag).collect();
        assert_eq!(tags, vec!["<div>", "<div><b>", "<div><i>", "<div><i><b>"]);
    }

    #[test]
    fn test_census_is_idempotent() {
        let doc = Document::parse("<section><h1>T</h1><p>a</p><p>b</p></section>");
        assert_eq!(census(doc.root()), census(doc.root()));
    }
}
