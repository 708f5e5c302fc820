/// Offset resolution: map a selection in the rendered view back to a
/// character range in the original document.
///
/// The start offset is the length of everything that precedes the selection
/// anchor once highlight markup is flattened back to text. This holds for
/// any number of intervening highlights because rendering only wraps
/// characters.
use super::{OffsetRange, char_slice};
use crate::render::{self, Segment};

/// A position in the rendered segment list: segment index plus a char
/// offset inside that segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPoint {
    pub segment: usize,
    pub offset: usize,
}

/// A user selection: where it starts, and the text it covers.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub anchor: SelectionPoint,
    pub text: &'a str,
}

/// Resolve a selection made over rendered segments.
///
/// Returns `None` (no state change) for collapsed or whitespace-only
/// selections, anchors outside the rendered root, and selections that do
/// not match the document characters at the resolved position.
#[must_use]
pub fn resolve_selection(segments: &[Segment<'_>], selection: &Selection<'_>) -> Option<OffsetRange> {
    if selection.text.trim().is_empty() {
        return None;
    }

    let anchor = selection.anchor;
    let segment = segments.get(anchor.segment)?;
    if anchor.offset > segment.char_len() {
        return None;
    }

    let preceding: usize = segments[..anchor.segment].iter().map(Segment::char_len).sum();
    let start = preceding + anchor.offset;
    let range = OffsetRange::new(start, start + selection.text.chars().count());

    let document: String = segments.iter().map(Segment::text).collect();
    confirm(&document, range, selection.text)
}

/// Resolve a selection made over rendered HTML markup, with the anchor
/// given as a byte position in `markup`.
///
/// Anchors inside a tag or an entity cannot come from a real text
/// selection and yield `None`.
#[must_use]
pub fn resolve_in_markup(markup: &str, anchor: usize, selected: &str) -> Option<OffsetRange> {
    if selected.trim().is_empty() || !markup.is_char_boundary(anchor) {
        return None;
    }

    let prefix = &markup[..anchor];
    if inside_tag(prefix) || inside_entity(markup, anchor) {
        return None;
    }

    let start = render::strip_markup(prefix).chars().count();
    let range = OffsetRange::new(start, start + selected.chars().count());
    confirm(&render::strip_markup(markup), range, selected)
}

fn confirm(document: &str, range: OffsetRange, selected: &str) -> Option<OffsetRange> {
    (char_slice(document, range)? == selected).then_some(range)
}

fn inside_tag(prefix: &str) -> bool {
    match (prefix.rfind('<'), prefix.rfind('>')) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

fn inside_entity(markup: &str, anchor: usize) -> bool {
    let Some(amp) = markup[..anchor].rfind('&') else {
        return false;
    };
    render::entity_len(&markup[amp..]).is_some_and(|len| amp + len > anchor)
}
