//! Layout source text with optional paragraph styles.

use std::sync::Arc;

/// Horizontal alignment of a line within the layout width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Start edge of the paragraph direction.
    #[default]
    Normal,
    /// End edge of the paragraph direction.
    Opposite,
    Center,
    Left,
    Right,
}

/// Paragraph-level style attached to a byte range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParagraphStyle {
    Alignment(Alignment),
    /// Explicit tab stop, in pixels from the line start.
    TabStop(f32),
    /// ARGB fill behind each line of the paragraph.
    LineBackground(u32),
}

/// A paragraph style over `start..end` (bytes).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParagraphSpan {
    pub start: usize,
    pub end: usize,
    pub style: ParagraphStyle,
}

impl ParagraphSpan {
    pub fn new(start: usize, end: usize, style: ParagraphStyle) -> Self {
        Self { start, end, style }
    }
}

/// Text shown by a layout. Cheap to clone.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutText {
    content: Arc<str>,
    spans: Option<Arc<[ParagraphSpan]>>,
}

impl LayoutText {
    pub fn plain(text: impl Into<Arc<str>>) -> Self {
        Self { content: text.into(), spans: None }
    }

    pub fn spanned(text: impl Into<Arc<str>>, spans: Vec<ParagraphSpan>) -> Self {
        Self {
            content: text.into(),
            spans: Some(spans.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Whether the text carries paragraph styles (even an empty list).
    pub fn is_spanned(&self) -> bool {
        self.spans.is_some()
    }

    /// Spans overlapping `start..end`. An empty range at `start > 0` matches
    /// nothing.
    pub fn paragraph_spans(&self, start: usize, end: usize) -> impl Iterator<Item = &ParagraphSpan> {
        let spans: &[ParagraphSpan] = self.spans.as_deref().unwrap_or(&[]);
        let skip = start == end && start > 0;
        spans
            .iter()
            .filter(move |span| !skip && span.start < end.max(start + 1) && span.end > start)
    }

    /// Last alignment span over `start..end`.
    pub fn alignment_at(&self, start: usize, end: usize) -> Option<Alignment> {
        self.paragraph_spans(start, end)
            .filter_map(|span| match span.style {
                ParagraphStyle::Alignment(align) => Some(align),
                _ => None,
            })
            .last()
    }

    /// Tab stop positions over `start..end`.
    pub fn tab_stops_at(&self, start: usize, end: usize) -> Vec<f32> {
        self.paragraph_spans(start, end)
            .filter_map(|span| match span.style {
                ParagraphStyle::TabStop(stop) => Some(stop),
                _ => None,
            })
            .collect()
    }

    /// Background colors over `start..end`.
    pub fn backgrounds_at(&self, start: usize, end: usize) -> Vec<u32> {
        self.paragraph_spans(start, end)
            .filter_map(|span| match span.style {
                ParagraphStyle::LineBackground(color) => Some(color),
                _ => None,
            })
            .collect()
    }
}

impl From<&str> for LayoutText {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for LayoutText {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_has_no_spans() {
        let text = LayoutText::from("hello");
        assert!(!text.is_spanned());
        assert_eq!(text.paragraph_spans(0, 5).count(), 0);
        assert_eq!(text.alignment_at(0, 5), None);
    }

    #[test]
    fn test_span_overlap() {
        let text = LayoutText::spanned(
            "one\ntwo\n",
            vec![
                ParagraphSpan::new(0, 4, ParagraphStyle::Alignment(Alignment::Center)),
                ParagraphSpan::new(4, 8, ParagraphStyle::TabStop(40.0)),
            ],
        );
        assert!(text.is_spanned());
        assert_eq!(text.alignment_at(0, 4), Some(Alignment::Center));
        assert_eq!(text.alignment_at(4, 8), None);
        assert_eq!(text.tab_stops_at(4, 8), vec![40.0]);
        assert_eq!(text.paragraph_spans(8, 8).count(), 0);
        assert_eq!(text.paragraph_spans(0, 0).count(), 1);
    }
}
