/// Span annotation model: offset ranges, overlap validation and the
/// per-document annotation set.
///
/// All offsets count `char`s (Unicode scalar values) of the document text,
/// never bytes. `end` is exclusive.
pub mod offsets;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a span cannot be added to an annotation set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("annotations cannot overlap: [{start}, {end}) intersects existing {class} span [{existing_start}, {existing_end})")]
    Overlap {
        start: usize,
        end: usize,
        class: String,
        existing_start: usize,
        existing_end: usize,
    },

    #[error("span [{start}, {end}) is outside a document of {len} characters")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("span [{start}, {end}) is empty")]
    Empty { start: usize, end: usize },

    #[error("span text {expected:?} does not match document text {actual:?}")]
    TextMismatch { expected: String, actual: String },

    #[error("unknown class: {0}")]
    UnknownClass(String),
}

/// Half-open character range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetRange {
    pub start: usize,
    pub end: usize,
}

impl OffsetRange {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Adjacent ranges do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &OffsetRange) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

impl fmt::Display for OffsetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A labeled span as persisted on disk and exchanged over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub class: String,
}

impl Span {
    /// Build a span from a document range, copying the covered text.
    pub fn from_document(
        document: &str,
        range: OffsetRange,
        class: impl Into<String>,
    ) -> Result<Self, AnnotationError> {
        if range.is_empty() {
            return Err(AnnotationError::Empty {
                start: range.start,
                end: range.end,
            });
        }
        let text = char_slice(document, range).ok_or_else(|| AnnotationError::OutOfBounds {
            start: range.start,
            end: range.end,
            len: document.chars().count(),
        })?;

        Ok(Self {
            text: text.to_string(),
            start: range.start,
            end: range.end,
            class: class.into(),
        })
    }

    #[must_use]
    pub fn range(&self) -> OffsetRange {
        OffsetRange::new(self.start, self.end)
    }

    /// Check the span against the document it claims to annotate.
    pub fn validate(&self, document: &str) -> Result<(), AnnotationError> {
        let range = self.range();
        if range.is_empty() {
            return Err(AnnotationError::Empty {
                start: self.start,
                end: self.end,
            });
        }
        let actual = char_slice(document, range).ok_or_else(|| AnnotationError::OutOfBounds {
            start: self.start,
            end: self.end,
            len: document.chars().count(),
        })?;
        if actual != self.text {
            return Err(AnnotationError::TextMismatch {
                expected: self.text.clone(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

/// Slice `text` by char offsets. Returns `None` when the range runs past the end.
#[must_use]
pub fn char_slice(text: &str, range: OffsetRange) -> Option<&str> {
    if range.start > range.end {
        return None;
    }
    let start = char_to_byte(text, range.start)?;
    let end = char_to_byte(text, range.end)?;
    Some(&text[start..end])
}

/// Byte index of the `n`-th char, or `text.len()` when `n` equals the char count.
#[must_use]
pub fn char_to_byte(text: &str, n: usize) -> Option<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(n)
}

/// Session-local span identity. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(pub u64);

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A span together with its stable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: SpanId,
    pub span: Span,
}

/// Ordered, non-overlapping spans of one document.
///
/// Insertion order is preserved. Ids are assigned from a counter that never
/// goes backwards, so a removed id is never handed out again.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSet {
    entries: Vec<Entry>,
    next_id: u64,
}

impl AnnotationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap persisted spans, assigning ids `0..n` in stored order.
    ///
    /// Stored files are trusted: overlap is not re-checked here.
    #[must_use]
    pub fn from_spans(spans: Vec<Span>) -> Self {
        let entries: Vec<Entry> = spans
            .into_iter()
            .enumerate()
            .map(|(i, span)| Entry {
                id: SpanId(i as u64),
                span,
            })
            .collect();
        let next_id = entries.len() as u64;
        Self { entries, next_id }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, id: SpanId) -> Option<&Span> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.span)
    }

    /// Spans in insertion order, ready to persist.
    #[must_use]
    pub fn to_spans(&self) -> Vec<Span> {
        self.entries.iter().map(|e| e.span.clone()).collect()
    }

    /// First existing span intersecting `range`, if any.
    #[must_use]
    pub fn find_overlap(&self, range: OffsetRange) -> Option<&Entry> {
        self.entries.iter().find(|e| e.span.range().intersects(&range))
    }

    /// Append a span unless it intersects an existing one.
    pub fn insert(&mut self, span: Span) -> Result<SpanId, AnnotationError> {
        if let Some(existing) = self.find_overlap(span.range()) {
            return Err(AnnotationError::Overlap {
                start: span.start,
                end: span.end,
                class: existing.span.class.clone(),
                existing_start: existing.span.start,
                existing_end: existing.span.end,
            });
        }

        let id = SpanId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, span });
        Ok(id)
    }

    pub fn remove(&mut self, id: SpanId) -> Option<Span> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx).span)
    }

    /// Remove the first span (in list order) with this class and text.
    ///
    /// Ambiguous when duplicates exist; prefer [`AnnotationSet::remove`].
    pub fn remove_first_match(&mut self, class: &str, text: &str) -> Option<Span> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.span.class == class && e.span.text == text)?;
        Some(self.entries.remove(idx).span)
    }
}

/// First pair of intersecting spans in `spans`, by index.
#[must_use]
pub fn find_conflict(spans: &[Span]) -> Option<(usize, usize)> {
    for (i, a) in spans.iter().enumerate() {
        for (j, b) in spans.iter().enumerate().skip(i + 1) {
            if a.range().intersects(&b.range()) {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, start: usize, end: usize, class: &str) -> Span {
        Span {
            text: text.to_string(),
            start,
            end,
            class: class.to_string(),
        }
    }

    #[test]
    fn test_intersects() {
        let a = OffsetRange::new(4, 9);
        assert!(a.intersects(&OffsetRange::new(8, 12)));
        assert!(a.intersects(&OffsetRange::new(0, 5)));
        assert!(a.intersects(&OffsetRange::new(5, 6)));
        assert!(!a.intersects(&OffsetRange::new(9, 12)), "adjacent after");
        assert!(!a.intersects(&OffsetRange::new(0, 4)), "adjacent before");
    }

    #[test]
    fn test_from_document_quick_brown_fox() {
        let s = Span::from_document("The quick brown fox", OffsetRange::new(4, 9), "PRODUCT").unwrap();
        assert_eq!(s, span("quick", 4, 9, "PRODUCT"));
    }

    #[test]
    fn test_from_document_counts_chars() {
        let text = "Zürich und Köln";
        let s = Span::from_document(text, OffsetRange::new(11, 15), "GPE").unwrap();
        assert_eq!(s.text, "Köln");
        assert!(s.validate(text).is_ok());
    }

    #[test]
    fn test_from_document_out_of_bounds() {
        let err = Span::from_document("short", OffsetRange::new(2, 10), "OTHER").unwrap_err();
        assert_eq!(
            err,
            AnnotationError::OutOfBounds {
                start: 2,
                end: 10,
                len: 5
            }
        );
    }

    #[test]
    fn test_validate_text_mismatch() {
        let s = span("slow", 4, 9, "PRODUCT");
        assert!(matches!(
            s.validate("The quick brown fox"),
            Err(AnnotationError::TextMismatch { .. })
        ));
    }

    #[test]
    fn test_insert_rejects_overlap_and_keeps_state() {
        let mut set = AnnotationSet::new();
        set.insert(span("quick brown", 4, 15, "ORG")).unwrap();
        let before = set.to_spans();

        let err = set.insert(span("brown fox", 10, 19, "PERSON")).unwrap_err();
        assert!(matches!(err, AnnotationError::Overlap { existing_start: 4, .. }));
        assert_eq!(set.to_spans(), before);
    }

    #[test]
    fn test_insert_allows_adjacent() {
        let mut set = AnnotationSet::new();
        set.insert(span("quick", 4, 9, "PRODUCT")).unwrap();
        set.insert(span(" brown", 9, 15, "OTHER")).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_ids_never_reused() {
        let mut set = AnnotationSet::new();
        let a = set.insert(span("a", 0, 1, "OTHER")).unwrap();
        set.remove(a).unwrap();
        let b = set.insert(span("a", 0, 1, "OTHER")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_spans_assigns_ids_in_order() {
        let set = AnnotationSet::from_spans(vec![span("b", 1, 2, "X"), span("a", 0, 1, "Y")]);
        let ids: Vec<u64> = set.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(set.get(SpanId(1)).unwrap().class, "Y");
    }

    #[test]
    fn test_remove_first_match_removes_exactly_one() {
        let mut set = AnnotationSet::from_spans(vec![
            span("Paris", 0, 5, "GPE"),
            span("Paris", 10, 15, "PERSON"),
            span("Paris", 20, 25, "GPE"),
        ]);

        let removed = set.remove_first_match("GPE", "Paris").unwrap();
        assert_eq!(removed.start, 0);
        assert_eq!(
            set.to_spans(),
            vec![span("Paris", 10, 15, "PERSON"), span("Paris", 20, 25, "GPE")]
        );
    }

    #[test]
    fn test_remove_by_id_targets_the_clicked_duplicate() {
        let mut set = AnnotationSet::from_spans(vec![
            span("Paris", 0, 5, "GPE"),
            span("Paris", 20, 25, "GPE"),
        ]);
        let removed = set.remove(SpanId(1)).unwrap();
        assert_eq!(removed.start, 20);
        assert_eq!(set.to_spans(), vec![span("Paris", 0, 5, "GPE")]);
    }

    #[test]
    fn test_find_conflict() {
        assert_eq!(find_conflict(&[span("a", 0, 3, "X"), span("b", 3, 5, "X")]), None);
        assert_eq!(
            find_conflict(&[span("a", 0, 3, "X"), span("b", 5, 6, "X"), span("c", 2, 4, "X")]),
            Some((0, 2))
        );
    }

    #[test]
    fn test_char_to_byte() {
        assert_eq!(char_to_byte("aé b", 0), Some(0));
        assert_eq!(char_to_byte("aé b", 2), Some(3));
        assert_eq!(char_to_byte("aé b", 4), Some(5));
        assert_eq!(char_to_byte("aé b", 5), None);
    }
}
