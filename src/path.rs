//! Tag-path expressions
//!
//! Syntax:
//! - `<div class="row">` - one step, used for trimming
//! - `<table><tr><td>` - several steps, each one nested somewhere below the previous
//!
//! Only `class` is recognized as an attribute filter. Anything else inside the
//! brackets is accepted and ignored. Angle brackets inside attribute values
//! are not supported.

use std::collections::BTreeMap;
use std::fmt;

use crate::document::DomNode;

/// One hop of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub tag_name: String,
    /// Attribute name -> tokens that must all be present on the node
    pub filters: BTreeMap<String, Vec<String>>,
}

impl PathStep {
    /// Whether `node` is an element with this tag name that satisfies every filter.
    pub fn matches(&self, node: &DomNode<'_>) -> bool {
        if node.tag_name() != Some(self.tag_name.as_str()) {
            return false;
        }
        self.filters.iter().all(|(attr, wanted)| {
            let present = node.attr_tokens(attr);
            wanted.iter().all(|token| present.contains(&token.as_str()))
        })
    }
}

/// A parsed, non-empty sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    steps: Vec<PathStep>,
}

impl PathExpr {
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn first(&self) -> &PathStep {
        &self.steps[0]
    }

    pub fn last(&self) -> &PathStep {
        &self.steps[self.steps.len() - 1]
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "<{}", step.tag_name)?;
            if let Some(classes) = step.filters.get("class") {
                write!(f, " class=\"{}\"", classes.join(" "))?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// Parse a single `<tag attrs...>` step.
///
/// The input must start with `<` and a word-character tag name; everything
/// after the first closing `>` is ignored. Returns `None` when no tag name
/// can be read.
pub fn parse_step(input: &str) -> Option<PathStep> {
    let rest = input.strip_prefix('<')?;

    let name_len = rest
        .char_indices()
        .find(|&(_, c)| !is_word_char(c))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let (name, rest) = rest.split_at(name_len);

    let close = rest.find('>')?;
    let attrs = rest[..close].trim();

    let mut filters = BTreeMap::new();
    if let Some(classes) = class_filter(attrs) {
        filters.insert("class".to_string(), classes);
    }

    Some(PathStep {
        tag_name: name.to_string(),
        filters,
    })
}

/// Parse a multi-step `<a><b class="x"><c>` expression.
///
/// Surrounding whitespace and angle brackets are stripped, the remainder is
/// split on `><` and every segment must parse as a step.
pub fn parse_path(input: &str) -> Option<PathExpr> {
    let inner = strip_brackets(input.trim());

    let steps = inner
        .split("><")
        .map(|segment| parse_step(&format!("<{segment}>")))
        .collect::<Option<Vec<_>>>()?;

    if steps.is_empty() {
        return None;
    }
    Some(PathExpr { steps })
}

/// Last `><`-separated segment of a selector, brackets stripped.
///
/// `"<table><tr><td>"` -> `"td"`, `"<div class=\"x\">"` -> `"div class=\"x\""`.
pub fn last_segment(selector: &str) -> &str {
    let selector = selector.trim();
    strip_brackets(selector)
        .rsplit("><")
        .next()
        .unwrap_or(selector)
}

fn strip_brackets(s: &str) -> &str {
    s.trim_matches(|c| c == '<' || c == '>')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// First `class="..."` (or single-quoted) value in an attribute section.
fn class_filter(attrs: &str) -> Option<Vec<String>> {
    const KEY: &str = "class=";
    let is_quote = |c: char| c == '"' || c == '\'';

    for (idx, _) in attrs.match_indices(KEY) {
        let Some(value) = attrs[idx + KEY.len()..].strip_prefix(is_quote) else {
            continue;
        };
        match value.find(is_quote) {
            Some(end) if end > 0 => {
                return Some(value[..end].split_whitespace().map(String::from).collect());
            }
            _ => continue,
        }
    }
    None
}
