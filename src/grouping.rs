//! Row grouping
//!
//! Slices the flat fragment list into fixed-width chunks and zips each chunk
//! against the row labels.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::path::last_segment;

/// One labeled row. Keeps label order; a repeated label keeps its first
/// position and takes the later value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }
}

impl<L: Into<String>, V: Into<String>> FromIterator<(L, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (L, V)>>(iter: I) -> Self {
        let mut record = Record::default();
        for (label, value) in iter {
            record.insert(label, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (label, value) in &self.fields {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// What to do with a trailing chunk shorter than the group width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialGroup {
    /// Simple mode: emit it with only the available positions.
    Keep,
    /// Raw mode: drop it.
    Discard,
}

/// Effective group width: explicit positive width, else the label count,
/// else every fragment in one group. Never 0.
pub fn resolve_width(explicit: Option<i64>, label_count: usize, fragment_count: usize) -> usize {
    let width = match explicit {
        Some(w) if w > 0 => usize::try_from(w).unwrap_or(usize::MAX),
        _ if label_count > 0 => label_count,
        _ => fragment_count,
    };
    width.max(1)
}

/// Default simple-mode labels: the last segment of each selector.
pub fn simple_labels(selectors: &[String]) -> Vec<String> {
    selectors
        .iter()
        .map(|selector| last_segment(selector).to_string())
        .collect()
}

/// Default raw-mode labels: the selector expressions themselves.
pub fn raw_labels(selectors: &[String]) -> Vec<String> {
    selectors.iter().map(|s| s.trim().to_string()).collect()
}

/// Chunk `fragments` by `width` and zip each chunk against `labels`.
///
/// Positions beyond the label count are dropped.
pub fn group_fragments(
    fragments: &[String],
    labels: &[String],
    width: usize,
    partial: PartialGroup,
) -> Vec<Record> {
    let width = width.max(1);
    fragments
        .chunks(width)
        .filter(|chunk| partial == PartialGroup::Keep || chunk.len() == width)
        .map(|chunk| labels.iter().zip(chunk).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_resolve_width() {
        assert_eq!(resolve_width(Some(3), 2, 10), 3);
        assert_eq!(resolve_width(Some(0), 2, 10), 2);
        assert_eq!(resolve_width(Some(-4), 2, 10), 2);
        assert_eq!(resolve_width(None, 0, 10), 10);
        assert_eq!(resolve_width(None, 0, 0), 1);
    }

    #[test]
    fn test_simple_keeps_short_tail_raw_drops_it() {
        let fragments = strings(&["a", "b", "c"]);
        let labels = strings(&["L0", "L1"]);

        let simple = group_fragments(&fragments, &labels, 2, PartialGroup::Keep);
        assert_eq!(
            simple,
            vec![record(&[("L0", "a"), ("L1", "b")]), record(&[("L0", "c")])]
        );

        let raw = group_fragments(&fragments, &labels, 2, PartialGroup::Discard);
        assert_eq!(raw, vec![record(&[("L0", "a"), ("L1", "b")])]);
    }

    #[test]
    fn test_even_division_gives_n_over_w_records() {
        let fragments: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        let labels = strings(&["x", "y"]);
        let rows = group_fragments(&fragments, &labels, 3, PartialGroup::Keep);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.len() == 2));
        assert_eq!(rows[1], record(&[("x", "3"), ("y", "4")]));
    }

    #[test]
    fn test_no_labels_no_fields() {
        let rows = group_fragments(&strings(&["a", "b"]), &[], 1, PartialGroup::Keep);
        assert_eq!(rows, vec![Record::default(), Record::default()]);
    }

    #[test]
    fn test_duplicate_label_takes_later_value() {
        let rows = group_fragments(
            &strings(&["a", "b", "c"]),
            &strings(&["k", "v", "k"]),
            3,
            PartialGroup::Discard,
        );
        assert_eq!(rows, vec![record(&[("k", "c"), ("v", "b")])]);
    }

    #[test]
    fn test_default_labels() {
        let selectors = strings(&["<table><tr><td>", " <th> "]);
        assert_eq!(simple_labels(&selectors), strings(&["td", " <th> "]));
        assert_eq!(raw_labels(&selectors), strings(&["<table><tr><td>", "<th>"]));
    }

    #[test]
    fn test_record_serializes_in_label_order() {
        let r = record(&[("zeta", "1"), ("alpha", "2")]);
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"zeta":"1","alpha":"2"}"#);
    }
}
