//! Layout engine — positioned lines over a text and paint.
//!
//! ## Architecture
//!
//! ```text
//!  LayoutText + TextPaint + width
//!        │
//!        ▼
//!  StaticLayout / BoringLayout   (per-line start, top, descent, direction, runs)
//!        │
//!        ▼  Layout provided operations
//!  TextLine ──▶ GlyphManager::layout_piece / lookup_glyph ──▶ Canvas
//! ```
//!
//! Concrete layouts store per-line data; everything else (drawing,
//! alignment, caret movement, picking) is provided by the [`Layout`] trait.
//! Offsets are byte offsets into the layout's text.
//!
//! Line accessors index per-line tables directly.
//!
//! # Panics
//!
//! Per-line accessors panic when `line > line_count()`, like slice indexing.
//! Vertical and offset queries clamp instead.

pub mod boring;
pub mod directions;
pub mod static_layout;
pub mod tab_stops;
pub mod text;
pub mod text_dir;
pub mod text_line;
pub mod text_utils;

pub use boring::{is_boring, BoringLayout, BoringMetrics};
pub use directions::{BidiRun, Directions};
pub use static_layout::{StaticLayout, StaticLayoutBuilder};
pub use tab_stops::{TabStops, TAB_INCREMENT};
pub use text::{Alignment, LayoutText, ParagraphSpan, ParagraphStyle};
pub use text_dir::TextDirectionHeuristic;
pub use text_line::TextLine;
pub use text_utils::{could_affect_rtl, TruncateAt, ELLIPSIS_FILLER, ELLIPSIS_NORMAL};

use crate::canvas::Canvas;
use crate::error::TextError;
use crate::manager::GlyphManager;
use crate::paint::TextPaint;
use directions::ParagraphBidi;
use text_utils::is_line_end_space;

pub const DIR_LEFT_TO_RIGHT: i32 = 1;
pub const DIR_RIGHT_TO_LEFT: i32 = -1;

/// State shared by every layout.
#[derive(Clone, Debug)]
pub struct LayoutBase {
    text: LayoutText,
    paint: TextPaint,
    width: i32,
    alignment: Alignment,
    text_dir: TextDirectionHeuristic,
}

impl LayoutBase {
    pub fn new(
        text: LayoutText,
        paint: TextPaint,
        width: i32,
        alignment: Alignment,
        text_dir: TextDirectionHeuristic,
    ) -> Result<Self, TextError> {
        if width < 0 {
            return Err(TextError::NegativeWidth(width));
        }
        Ok(Self { text, paint, width, alignment, text_dir })
    }

    /// Swap in new contents, keeping the direction heuristic.
    pub(crate) fn replace_with(
        &mut self,
        text: LayoutText,
        paint: TextPaint,
        width: i32,
        alignment: Alignment,
    ) -> Result<(), TextError> {
        if width < 0 {
            return Err(TextError::NegativeWidth(width));
        }
        self.text = text;
        self.paint = paint;
        self.width = width;
        self.alignment = alignment;
        Ok(())
    }

    pub fn text(&self) -> &LayoutText {
        &self.text
    }

    pub fn paint(&self) -> &TextPaint {
        &self.paint
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn text_direction_heuristic(&self) -> TextDirectionHeuristic {
        self.text_dir
    }
}

/// A laid-out text.
pub trait Layout {
    fn base(&self) -> &LayoutBase;

    fn line_count(&self) -> usize;

    /// Top of `line`; `line == line_count()` gives the layout bottom.
    fn line_top(&self, line: usize) -> i32;

    /// Descent below the baseline of `line`.
    fn line_descent(&self, line: usize) -> i32;

    /// First offset of `line`; `line == line_count()` gives the end of the
    /// laid-out text, which is short of the text end when a line limit
    /// dropped lines.
    fn line_start(&self, line: usize) -> usize;

    /// [`DIR_LEFT_TO_RIGHT`] or [`DIR_RIGHT_TO_LEFT`].
    fn paragraph_direction(&self, line: usize) -> i32;

    fn line_contains_tab(&self, line: usize) -> bool;

    fn line_directions(&self, line: usize) -> Directions;

    /// First elided char of `line`, relative to the line start.
    fn ellipsis_start(&self, line: usize) -> usize;

    /// Number of elided chars in `line`.
    fn ellipsis_count(&self, line: usize) -> usize;

    fn top_padding(&self) -> i32 {
        0
    }

    fn bottom_padding(&self) -> i32 {
        0
    }

    fn ellipsized_width(&self) -> i32 {
        self.width()
    }

    // ── Base accessors ──────────────────────────────────────────────

    fn text(&self) -> &str {
        self.base().text().as_str()
    }

    fn layout_text(&self) -> &LayoutText {
        self.base().text()
    }

    fn paint(&self) -> &TextPaint {
        self.base().paint()
    }

    fn width(&self) -> i32 {
        self.base().width()
    }

    fn alignment(&self) -> Alignment {
        self.base().alignment()
    }

    fn text_direction_heuristic(&self) -> TextDirectionHeuristic {
        self.base().text_direction_heuristic()
    }

    // ── Line geometry ───────────────────────────────────────────────

    fn height(&self) -> i32 {
        self.line_top(self.line_count())
    }

    fn line_end(&self, line: usize) -> usize {
        self.line_start(line + 1)
    }

    /// End of `line` without its newline, and without trailing spaces except
    /// on the last line.
    fn line_visible_end(&self, line: usize) -> usize {
        visible_end(self, line, self.line_start(line), self.line_start(line + 1))
    }

    fn line_bottom(&self, line: usize) -> i32 {
        self.line_top(line + 1)
    }

    fn line_baseline(&self, line: usize) -> i32 {
        self.line_top(line + 1) - self.line_descent(line)
    }

    /// Ascent of `line`, negative (above the baseline).
    fn line_ascent(&self, line: usize) -> i32 {
        self.line_top(line) - self.line_baseline(line)
    }

    /// Line containing `vertical`, clamped to existing lines.
    fn line_for_vertical(&self, vertical: i32) -> usize {
        let mut high = self.line_count() as i64;
        let mut low = -1i64;
        while high - low > 1 {
            let guess = (high + low) >> 1;
            if self.line_top(guess as usize) > vertical {
                high = guess;
            } else {
                low = guess;
            }
        }
        low.max(0) as usize
    }

    /// Line containing `offset`, clamped to existing lines.
    fn line_for_offset(&self, offset: usize) -> usize {
        let mut high = self.line_count() as i64;
        let mut low = -1i64;
        while high - low > 1 {
            let guess = (high + low) >> 1;
            if self.line_start(guess as usize) > offset {
                high = guess;
            } else {
                low = guess;
            }
        }
        low.max(0) as usize
    }

    // ── Drawing ─────────────────────────────────────────────────────

    /// First and last line not rejected by the canvas clip, testing each
    /// line over `0..width`.
    fn line_range_for_draw(&self, canvas: &dyn Canvas) -> Option<(usize, usize)> {
        let count = self.line_count();
        let right = self.width() as f32;
        if count == 0 || canvas.quick_reject(0.0, 0.0, right, self.line_top(count) as f32) {
            return None;
        }
        let mut range: Option<(usize, usize)> = None;
        for line in 0..count {
            let top = self.line_top(line) as f32;
            let bottom = self.line_top(line + 1) as f32;
            if canvas.quick_reject(0.0, top, right, bottom) {
                if range.is_some() {
                    break;
                }
                continue;
            }
            range = Some(match range {
                Some((first, _)) => (first, line),
                None => (line, line),
            });
        }
        range
    }

    fn draw(&self, canvas: &mut dyn Canvas, glyphs: &mut GlyphManager) -> Result<(), TextError> {
        draw_layout(self, canvas, glyphs)
    }

    /// Fill paragraph backgrounds of lines `first..=last`.
    fn draw_background(&self, canvas: &mut dyn Canvas, first: usize, last: usize) {
        let text = self.layout_text();
        if !text.is_spanned() {
            return;
        }
        for line in first..=last {
            let colors = text.backgrounds_at(self.line_start(line), self.line_end(line));
            for color in colors {
                canvas.draw_rect(
                    0.0,
                    self.line_top(line) as f32,
                    self.width() as f32,
                    self.line_bottom(line) as f32,
                    color,
                );
            }
        }
    }

    /// Draw the text of lines `first..=last`.
    fn draw_text(
        &self,
        canvas: &mut dyn Canvas,
        glyphs: &mut GlyphManager,
        first: usize,
        last: usize,
    ) -> Result<(), TextError> {
        let spanned = self.layout_text().is_spanned();
        let mut previous_line_bottom = self.line_top(first);
        let mut previous_line_end = self.line_start(first);

        for line in first..=last {
            let start = previous_line_end;
            previous_line_end = self.line_start(line + 1);
            let end = visible_end(self, line, start, previous_line_end);

            let ltop = previous_line_bottom;
            let lbottom = self.line_top(line + 1);
            previous_line_bottom = lbottom;
            let lbaseline = lbottom - self.line_descent(line);

            let dir = self.paragraph_direction(line);
            let align = line_alignment(self, start, previous_line_end);
            let line_text = make_text_line(self, line, start, end, true);
            let width = if align == Alignment::Normal && dir == DIR_LEFT_TO_RIGHT {
                0.0
            } else {
                line_text.metrics(glyphs, None)?
            };
            let x = aligned_left(align, dir, 0, self.width(), width);

            let direct = self.line_directions(line) == Directions::AllLeftToRight
                && !spanned
                && !self.text()[start..end].contains('\n')
                && !self.line_contains_tab(line)
                && self.ellipsis_count(line) == 0;
            if direct {
                canvas.draw_text(&self.text()[start..end], x, lbaseline as f32, self.paint());
            } else {
                line_text.draw(canvas, glyphs, x, ltop, lbaseline, lbottom)?;
            }
        }
        Ok(())
    }

    // ── Measurement ─────────────────────────────────────────────────

    /// Width of `line` without trailing whitespace.
    fn line_max(&self, glyphs: &mut GlyphManager, line: usize) -> Result<f32, TextError> {
        let start = self.line_start(line);
        let end = self.line_visible_end(line);
        make_text_line(self, line, start, end, true).metrics(glyphs, None)
    }

    /// Width of `line` including trailing whitespace.
    fn line_width(&self, glyphs: &mut GlyphManager, line: usize) -> Result<f32, TextError> {
        let start = self.line_start(line);
        let end = self.line_end(line);
        make_text_line(self, line, start, end, true).metrics(glyphs, None)
    }

    /// Left edge of the visible text of `line`.
    fn line_left(&self, glyphs: &mut GlyphManager, line: usize) -> Result<f32, TextError> {
        let width = self.line_max(glyphs, line)?;
        let start = self.line_start(line);
        let align = line_alignment(self, start, self.line_end(line));
        Ok(aligned_left(align, self.paragraph_direction(line), 0, self.width(), width))
    }

    /// Left edge of `line`'s full text, trailing whitespace included.
    fn line_origin(&self, glyphs: &mut GlyphManager, line: usize) -> Result<f32, TextError> {
        let left = self.line_left(glyphs, line)?;
        if self.paragraph_direction(line) == DIR_LEFT_TO_RIGHT {
            return Ok(left);
        }
        // Trailing whitespace of a right-to-left line hangs off the left.
        let visible = self.line_max(glyphs, line)?;
        let full = self.line_width(glyphs, line)?;
        Ok(left + visible - full)
    }

    // ── Picking and caret movement ──────────────────────────────────

    /// Horizontal caret position of `offset`.
    fn primary_horizontal(&self, glyphs: &mut GlyphManager, offset: usize) -> Result<f32, TextError> {
        let offset = offset.min(self.line_start(self.line_count()));
        let line = self.line_for_offset(offset);
        let start = self.line_start(line);
        let end = self.line_end(line);
        let h = make_text_line(self, line, start, end, false).measure(glyphs, offset - start)?;
        Ok(self.line_origin(glyphs, line)? + h)
    }

    /// Offset on `line` closest to `horizontal`.
    fn offset_for_horizontal(
        &self,
        glyphs: &mut GlyphManager,
        line: usize,
        horizontal: f32,
    ) -> Result<usize, TextError> {
        let start = self.line_start(line);
        let end = self.line_end(line);
        let origin = self.line_origin(glyphs, line)?;
        let offset = make_text_line(self, line, start, end, false).offset_at(glyphs, horizontal - origin)?;
        let max = if self.text()[start..end].ends_with('\n') { end - 1 } else { end };
        Ok((start + offset).min(max))
    }

    fn offset_to_left_of(&self, glyphs: &mut GlyphManager, offset: usize) -> Result<usize, TextError> {
        offset_to_left_right_of(self, glyphs, offset, true)
    }

    fn offset_to_right_of(&self, glyphs: &mut GlyphManager, offset: usize) -> Result<usize, TextError> {
        offset_to_left_right_of(self, glyphs, offset, false)
    }
}

// ---------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------

/// Background, then text, over the lines the canvas can see.
pub(crate) fn draw_layout<L: Layout + ?Sized>(
    layout: &L,
    canvas: &mut dyn Canvas,
    glyphs: &mut GlyphManager,
) -> Result<(), TextError> {
    let Some((first, last)) = layout.line_range_for_draw(canvas) else {
        return Ok(());
    };
    layout.draw_background(canvas, first, last);
    layout.draw_text(canvas, glyphs, first, last)
}

fn visible_end<L: Layout + ?Sized>(layout: &L, line: usize, start: usize, end: usize) -> usize {
    let text = layout.text();
    if line + 1 == layout.line_count() {
        // Only a line cut short by a line limit ends in a newline here.
        return if text[start..end].ends_with('\n') { end - 1 } else { end };
    }
    let mut end = end;
    while end > start {
        let Some(c) = text[..end].chars().next_back() else {
            break;
        };
        if c == '\n' {
            return end - 1;
        }
        if !is_line_end_space(c) {
            break;
        }
        end -= c.len_utf8();
    }
    end
}

fn line_alignment<L: Layout + ?Sized>(layout: &L, start: usize, end: usize) -> Alignment {
    layout
        .layout_text()
        .alignment_at(start, end)
        .unwrap_or_else(|| layout.alignment())
}

/// Left edge of a line of `width` pixels between `left` and `right`.
///
/// Centering snaps the integer extent down to even before halving, so
/// lines whose widths differ by one pixel share a position.
pub(crate) fn aligned_left(align: Alignment, dir: i32, left: i32, right: i32, width: f32) -> f32 {
    let ltr = dir == DIR_LEFT_TO_RIGHT;
    let align = match align {
        Alignment::Left if ltr => Alignment::Normal,
        Alignment::Left => Alignment::Opposite,
        Alignment::Right if ltr => Alignment::Opposite,
        Alignment::Right => Alignment::Normal,
        other => other,
    };
    // Signed extent: right-to-left text is drawn leftwards from its anchor.
    let max = if ltr { width as i32 } else { -(width as i32) };
    let anchor = match align {
        Alignment::Normal if ltr => left,
        Alignment::Normal => right,
        Alignment::Opposite => {
            if ltr {
                right - max
            } else {
                left - max
            }
        }
        _ => {
            let max = max & !1;
            (right + left - max) >> 1
        }
    };
    if ltr {
        anchor as f32
    } else {
        anchor as f32 - width
    }
}

/// Build the [`TextLine`] for `start..end` of `line`.
pub(crate) fn make_text_line<'l, L: Layout + ?Sized>(
    layout: &'l L,
    line: usize,
    start: usize,
    end: usize,
    ellipsize: bool,
) -> TextLine<'l> {
    let has_tab = layout.line_contains_tab(line);
    let tab_stops = has_tab.then(|| {
        TabStops::new(TAB_INCREMENT, layout.layout_text().tab_stops_at(start, end.max(start + 1)))
    });
    let text_line = TextLine::new(
        layout.paint(),
        &layout.text()[start..end],
        layout.paragraph_direction(line),
        &layout.line_directions(line),
        has_tab,
        tab_stops,
    );
    if ellipsize {
        text_line.with_ellipsis(layout.ellipsis_start(line), layout.ellipsis_count(line))
    } else {
        text_line
    }
}

fn offset_to_left_right_of<L: Layout + ?Sized>(
    layout: &L,
    glyphs: &mut GlyphManager,
    caret: usize,
    mut to_left: bool,
) -> Result<usize, TextError> {
    let caret = caret.min(layout.line_start(layout.line_count()));
    let mut line = layout.line_for_offset(caret);
    let line_dir = layout.paragraph_direction(line);
    let advance = to_left == (line_dir == DIR_RIGHT_TO_LEFT);

    let mut line_changed = false;
    if advance {
        if caret == layout.line_end(line) {
            if line + 1 < layout.line_count() {
                line_changed = true;
                line += 1;
            } else {
                return Ok(caret);
            }
        }
    } else if caret == layout.line_start(line) {
        if line > 0 {
            line_changed = true;
            line -= 1;
        } else {
            return Ok(caret);
        }
    }

    let start = layout.line_start(line);
    let end = layout.line_end(line);
    if line_changed && layout.paragraph_direction(line) != line_dir {
        // Walk onto a line of the other direction by faking the opposite move.
        to_left = !to_left;
    }

    let text_line = make_text_line(layout, line, start, end, false);
    let offset = text_line.offset_to_left_right_of(glyphs, caret - start, to_left)?;
    Ok(start + offset)
}

/// Width needed to show each paragraph of `text` on one line.
pub fn desired_width(
    text: &str,
    paint: &TextPaint,
    text_dir: TextDirectionHeuristic,
    glyphs: &mut GlyphManager,
) -> Result<f32, TextError> {
    let mut need = 0.0f32;
    for paragraph in text.split('\n') {
        let rtl = text_dir.is_rtl(paragraph);
        let dir = if rtl { DIR_RIGHT_TO_LEFT } else { DIR_LEFT_TO_RIGHT };
        let directions = ParagraphBidi::new(paragraph, rtl).line_directions(0..paragraph.len());
        let has_tab = paragraph.contains('\t');
        let line = TextLine::new(paint, paragraph, dir, &directions, has_tab, None);
        need = need.max(line.metrics(glyphs, None)?);
    }
    Ok(need)
}

// ===================================================================
// Tests
// ===================================================================
