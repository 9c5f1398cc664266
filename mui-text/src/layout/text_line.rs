//! A single visual line, built on the stack for one measure or draw call.
//!
//! The line is cut into segments: one per bidi run, further split at tabs.
//! Segments are laid out left to right in visual order; positions returned
//! by this module are measured from the line's left edge.

use std::borrow::Cow;
use std::iter;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use super::directions::{BidiRun, Directions};
use super::tab_stops::{TabStops, TAB_INCREMENT};
use super::text_utils::apply_ellipsis;
use super::DIR_RIGHT_TO_LEFT;
use crate::canvas::Canvas;
use crate::error::TextError;
use crate::manager::GlyphManager;
use crate::paint::{FontMetricsInt, TextPaint};
use crate::piece::LayoutPiece;

struct Segment {
    /// Line-relative byte range.
    start: usize,
    end: usize,
    /// Left edge and width.
    x: f32,
    width: f32,
    rtl: bool,
    /// `None` for a tab.
    piece: Option<Arc<LayoutPiece>>,
}

/// One line of text with its direction runs and tab stops.
pub struct TextLine<'a> {
    paint: &'a TextPaint,
    /// Line text without a trailing newline; ellipsized text when an
    /// ellipsis window is applied.
    text: Cow<'a, str>,
    /// Length of the source range, newline included.
    len: usize,
    dir: i32,
    runs: Vec<BidiRun>,
    has_tabs: bool,
    tab_stops: Option<TabStops>,
}

impl<'a> TextLine<'a> {
    pub fn new(
        paint: &'a TextPaint,
        text: &'a str,
        dir: i32,
        directions: &Directions,
        has_tabs: bool,
        tab_stops: Option<TabStops>,
    ) -> Self {
        let visible = text.strip_suffix('\n').unwrap_or(text);
        Self {
            paint,
            text: Cow::Borrowed(visible),
            len: text.len(),
            dir,
            runs: directions.runs(visible.len()),
            has_tabs,
            tab_stops,
        }
    }

    /// Replace chars `start..start + count` with an ellipsis. The line then
    /// draws as a single run in the paragraph direction.
    pub fn with_ellipsis(mut self, start: usize, count: usize) -> Self {
        if count == 0 {
            return self;
        }
        let text = apply_ellipsis(&self.text, start, count);
        let level = if self.dir == DIR_RIGHT_TO_LEFT { 1 } else { 0 };
        self.runs = vec![BidiRun { start: 0, end: text.len(), level }];
        self.len = text.len();
        self.text = Cow::Owned(text);
        self
    }

    /// Unsigned width of the line. When `fm` is given it is extended by the
    /// extents of every shaped run.
    pub fn metrics(
        &self,
        glyphs: &mut GlyphManager,
        fm: Option<&mut FontMetricsInt>,
    ) -> Result<f32, TextError> {
        let segments = self.segments(glyphs)?;
        if let Some(fm) = fm {
            for piece in segments.iter().filter_map(|s| s.piece.as_ref()) {
                fm.extend_by(&FontMetricsInt {
                    ascent: piece.ascent(),
                    descent: piece.descent(),
                    height: piece.ascent() + piece.descent(),
                });
            }
        }
        Ok(total_width(&segments))
    }

    /// Draw with the line's left edge at `x`.
    pub fn draw(
        &self,
        canvas: &mut dyn Canvas,
        glyphs: &mut GlyphManager,
        x: f32,
        _top: i32,
        baseline: i32,
        _bottom: i32,
    ) -> Result<(), TextError> {
        let baseline = baseline as f32;
        for segment in self.segments(glyphs)? {
            let Some(piece) = &segment.piece else {
                continue;
            };
            for shaped in piece.glyphs() {
                if let Some(glyph) = glyphs.lookup_glyph(shaped.font, shaped.code)? {
                    canvas.draw_glyph(
                        &glyph,
                        shaped.font,
                        shaped.code,
                        x + segment.x + shaped.x,
                        baseline + shaped.y,
                        self.paint,
                    );
                }
            }
        }
        Ok(())
    }

    /// Caret position of a line-relative offset, from the left edge.
    pub fn measure(&self, glyphs: &mut GlyphManager, offset: usize) -> Result<f32, TextError> {
        let segments = self.segments(glyphs)?;
        Ok(self.position(&segments, offset))
    }

    /// Offset whose caret position is closest to `x`.
    pub fn offset_at(&self, glyphs: &mut GlyphManager, x: f32) -> Result<usize, TextError> {
        let segments = self.segments(glyphs)?;
        let mut best = 0;
        let mut best_distance = f32::INFINITY;
        for offset in self.boundaries() {
            let distance = (self.position(&segments, offset) - x).abs();
            if distance < best_distance {
                best = offset;
                best_distance = distance;
            }
        }
        Ok(best)
    }

    /// Offset one grapheme to the left or right of `cursor`, visually.
    /// Returns `cursor` when it cannot move within this line.
    pub fn offset_to_left_right_of(
        &self,
        glyphs: &mut GlyphManager,
        cursor: usize,
        to_left: bool,
    ) -> Result<usize, TextError> {
        let cursor = cursor.min(self.len);
        let boundaries = self.boundaries();

        let rtl = self
            .runs
            .first()
            .map_or(self.dir == DIR_RIGHT_TO_LEFT, BidiRun::is_rtl);
        if self.runs.iter().all(|run| run.is_rtl() == rtl) {
            let forward = to_left == rtl;
            let next = if forward {
                boundaries.iter().copied().find(|&b| b > cursor)
            } else {
                boundaries.iter().rev().copied().find(|&b| b < cursor)
            };
            return Ok(next.unwrap_or(cursor));
        }

        // Mixed directions: walk by screen position.
        let segments = self.segments(glyphs)?;
        let here = self.position(&segments, cursor);
        let mut best: Option<(usize, f32)> = None;
        for &b in &boundaries {
            if b == cursor {
                continue;
            }
            let x = self.position(&segments, b);
            let moved = if to_left { here - x } else { x - here };
            if moved <= 0.01 {
                continue;
            }
            if best.map_or(true, |(_, d)| moved < d) {
                best = Some((b, moved));
            }
        }
        Ok(best.map_or(cursor, |(b, _)| b))
    }

    // ---------------------------------------------------------------
    // Internal helpers
    // ---------------------------------------------------------------

    /// Grapheme boundaries of the line, including both ends.
    fn boundaries(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .text
            .grapheme_indices(true)
            .map(|(i, _)| i)
            .chain(iter::once(self.text.len()))
            .collect();
        if self.len > self.text.len() {
            out.push(self.len);
        }
        out
    }

    fn segments(&self, glyphs: &mut GlyphManager) -> Result<Vec<Segment>, TextError> {
        let mut segments = Vec::with_capacity(self.runs.len());
        let mut h = 0.0f32;
        for run in &self.runs {
            if run.start >= run.end {
                continue;
            }
            let rtl = run.is_rtl();
            let mut parts = self.split_tabs(run.start, run.end);
            if rtl {
                parts.reverse();
            }
            for (start, end) in parts {
                let text = &self.text[start..end];
                if self.has_tabs && text == "\t" {
                    let next = match &self.tab_stops {
                        Some(stops) => stops.next_tab(h),
                        None => TabStops::next_default_stop(h, TAB_INCREMENT),
                    };
                    segments.push(Segment { start, end, x: h, width: next - h, rtl, piece: None });
                    h = next;
                } else {
                    let piece = glyphs.layout_piece(text, self.paint, rtl)?;
                    let width = piece.advance();
                    segments.push(Segment { start, end, x: h, width, rtl, piece: Some(piece) });
                    h += width;
                }
            }
        }
        Ok(segments)
    }

    /// Split `start..end` so that every tab is its own part.
    fn split_tabs(&self, start: usize, end: usize) -> Vec<(usize, usize)> {
        if !self.has_tabs {
            return vec![(start, end)];
        }
        let mut parts = Vec::new();
        let mut from = start;
        for (i, _) in self.text[start..end].match_indices('\t') {
            let tab = start + i;
            if tab > from {
                parts.push((from, tab));
            }
            parts.push((tab, tab + 1));
            from = tab + 1;
        }
        if from < end {
            parts.push((from, end));
        }
        parts
    }

    fn position(&self, segments: &[Segment], offset: usize) -> f32 {
        for segment in segments {
            if offset >= segment.start && offset < segment.end {
                let inner = segment
                    .piece
                    .as_ref()
                    .map_or(0.0, |piece| piece.advance_range(0, offset - segment.start));
                return if segment.rtl {
                    segment.x + segment.width - inner
                } else {
                    segment.x + inner
                };
            }
        }
        // Logical end of the line: the far edge of the last logical run.
        let end = self.text.len();
        match segments.iter().find(|s| s.end == end) {
            Some(last) if last.rtl => last.x,
            Some(last) => last.x + last.width,
            None if self.dir == DIR_RIGHT_TO_LEFT => 0.0,
            None => total_width(segments),
        }
    }
}

fn total_width(segments: &[Segment]) -> f32 {
    segments.last().map_or(0.0, |s| s.x + s.width)
}

// ===================================================================
// Tests
// ===================================================================
