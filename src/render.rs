/// Renders document text with its spans as highlighted regions.
///
/// Rendering only wraps characters, it never inserts or removes any, so
/// flattening the output back to text reproduces the document exactly.
/// Offset resolution relies on this.
use tracing::debug;

use crate::annotation::{AnnotationSet, SpanId};
use crate::palette::Palette;

/// One run of the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Highlight {
        id: SpanId,
        class: &'a str,
        text: &'a str,
    },
}

impl<'a> Segment<'a> {
    #[must_use]
    pub fn text(&self) -> &'a str {
        match *self {
            Segment::Plain(text) => text,
            Segment::Highlight { text, .. } => text,
        }
    }

    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }
}

/// Split `text` into plain and highlighted segments.
///
/// Spans are processed by descending `start`, walking from the end of the
/// document towards the beginning, so every span still to be processed
/// lies entirely before the cursor. Spans that are out of range or collide
/// with an already placed span (possible only for hand-edited files) are
/// rendered as plain text.
#[must_use]
pub fn render_segments<'a>(text: &'a str, annotations: &'a AnnotationSet) -> Vec<Segment<'a>> {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = bounds.len() - 1;

    let mut entries: Vec<_> = annotations.iter().collect();
    entries.sort_by(|a, b| b.span.start.cmp(&a.span.start));

    let mut segments = Vec::with_capacity(entries.len() * 2 + 1);
    let mut cursor = char_len;

    for entry in entries {
        let span = &entry.span;
        if span.start >= span.end || span.end > cursor {
            debug!(
                "skipping span {} [{}, {}) while rendering",
                entry.id, span.start, span.end
            );
            continue;
        }

        if span.end < cursor {
            segments.push(Segment::Plain(&text[bounds[span.end]..bounds[cursor]]));
        }
        segments.push(Segment::Highlight {
            id: entry.id,
            class: &span.class,
            text: &text[bounds[span.start]..bounds[span.end]],
        });
        cursor = span.start;
    }

    if cursor > 0 {
        segments.push(Segment::Plain(&text[..bounds[cursor]]));
    }

    segments.reverse();
    segments
}

/// Render `text` as HTML with every span wrapped in a colored `<span>`.
#[must_use]
pub fn render_html(text: &str, annotations: &AnnotationSet, palette: &Palette) -> String {
    segments_to_html(&render_segments(text, annotations), palette)
}

#[must_use]
pub fn segments_to_html(segments: &[Segment<'_>], palette: &Palette) -> String {
    let mut html = String::new();
    for segment in segments {
        match segment {
            Segment::Plain(text) => escape_html_into(text, &mut html),
            Segment::Highlight { id, class, text } => {
                let (bg, fg) = palette.colors_for(class);
                html.push_str("<span class=\"highlight\" style=\"background-color: ");
                escape_html_into(bg, &mut html);
                html.push_str("; color: ");
                escape_html_into(fg, &mut html);
                html.push_str("\" data-class=\"");
                escape_html_into(class, &mut html);
                html.push_str(&format!("\" data-id=\"{id}\" title=\""));
                escape_html_into(class, &mut html);
                html.push_str("\">");
                escape_html_into(text, &mut html);
                html.push_str("</span>");
            }
        }
    }
    html
}

pub fn escape_html_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_html_into(text, &mut out);
    out
}

/// Flatten renderer output back to plain text: drop tags, decode entities.
#[must_use]
pub fn strip_markup(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => match rest.find('>') {
                Some(close) => rest = &rest[close + 1..],
                None => {
                    out.push_str(rest);
                    break;
                }
            },
            '&' => {
                let (decoded, consumed) = decode_entity(rest);
                out.push_str(decoded);
                rest = &rest[consumed..];
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    out
}

const ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

/// Decode the entity at the start of `s`; unknown ones pass through as `&`.
fn decode_entity(s: &str) -> (&'static str, usize) {
    ENTITIES
        .iter()
        .find(|(entity, _)| s.starts_with(entity))
        .map(|(entity, decoded)| (*decoded, entity.len()))
        .unwrap_or(("&", 1))
}

/// Byte length of the renderer entity starting at `s`, if any.
pub(crate) fn entity_len(s: &str) -> Option<usize> {
    ENTITIES
        .iter()
        .find(|(entity, _)| s.starts_with(entity))
        .map(|(entity, _)| entity.len())
}
