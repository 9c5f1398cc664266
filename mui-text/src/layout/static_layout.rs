//! StaticLayout — greedy word-wrapping layout of multi-paragraph text.
//!
//! Paragraphs are split on `\n`. Each paragraph is shaped once to get
//! per-byte advances, then wrapped on word boundaries; trailing spaces may
//! hang past the right edge. A word wider than the layout is broken between
//! graphemes. Every line keeps its newline, so a trailing `\n` produces a
//! final empty line.

use unicode_segmentation::UnicodeSegmentation;

use super::directions::{Directions, ParagraphBidi};
use super::tab_stops::{TabStops, TAB_INCREMENT};
use super::text::{Alignment, LayoutText};
use super::text_dir::TextDirectionHeuristic;
use super::text_utils::{ellipsize_window, is_line_end_space, TruncateAt, ELLIPSIS_NORMAL};
use super::{Layout, LayoutBase, DIR_LEFT_TO_RIGHT, DIR_RIGHT_TO_LEFT};
use crate::error::TextError;
use crate::manager::GlyphManager;
use crate::paint::TextPaint;
use crate::piece::LayoutPiece;

#[derive(Clone, Debug)]
struct LineInfo {
    descent: i32,
    dir: i32,
    directions: Directions,
    has_tab: bool,
    ellipsis_start: usize,
    ellipsis_count: usize,
}

/// A layout whose text does not change after construction.
#[derive(Clone, Debug)]
pub struct StaticLayout {
    base: LayoutBase,
    /// `line_count + 1` entries; the last is the text end.
    starts: Vec<usize>,
    /// `line_count + 1` entries; the last is the layout height.
    tops: Vec<i32>,
    lines: Vec<LineInfo>,
    ellipsized_width: i32,
}

impl StaticLayout {
    pub fn builder(
        text: impl Into<LayoutText>,
        paint: TextPaint,
        width: i32,
    ) -> StaticLayoutBuilder {
        StaticLayoutBuilder {
            text: text.into(),
            paint,
            width,
            alignment: Alignment::Normal,
            text_dir: TextDirectionHeuristic::default(),
            max_lines: usize::MAX,
            ellipsize: None,
            ellipsized_width: None,
        }
    }
}

/// Options for [`StaticLayout`].
#[derive(Clone, Debug)]
pub struct StaticLayoutBuilder {
    text: LayoutText,
    paint: TextPaint,
    width: i32,
    alignment: Alignment,
    text_dir: TextDirectionHeuristic,
    max_lines: usize,
    ellipsize: Option<TruncateAt>,
    ellipsized_width: Option<i32>,
}

impl StaticLayoutBuilder {
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn text_direction(mut self, text_dir: TextDirectionHeuristic) -> Self {
        self.text_dir = text_dir;
        self
    }

    /// Keep at most `max_lines` lines. Text past the last kept line is not
    /// laid out unless ellipsizing, in which case that line absorbs it.
    /// Zero is treated as one.
    pub fn max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines.max(1);
        self
    }

    /// Elide the last kept line when text is cut by `max_lines`.
    /// `Start` and `Middle` only apply to single-line layouts; otherwise
    /// they fall back to `End`.
    pub fn ellipsize(mut self, at: TruncateAt) -> Self {
        self.ellipsize = Some(at);
        self
    }

    /// Width the ellipsized line must fit in; defaults to the layout width.
    pub fn ellipsized_width(mut self, width: i32) -> Self {
        self.ellipsized_width = Some(width);
        self
    }

    pub fn build(self, glyphs: &mut GlyphManager) -> Result<StaticLayout, TextError> {
        let base = LayoutBase::new(self.text, self.paint, self.width, self.alignment, self.text_dir)?;
        let ellipsized_width = self.ellipsized_width.unwrap_or(self.width).max(0);

        let fm = glyphs.measure_font_extents(base.paint())?;
        let line_height = fm.ascent + fm.descent;

        let text = base.text().as_str();
        let mut starts = Vec::new();
        let mut lines = Vec::new();

        for (para_start, para_end) in paragraphs(text) {
            let para = &text[para_start..para_end];
            let body = para.strip_suffix('\n').unwrap_or(para);
            let rtl = self.text_dir.is_rtl(body);
            let dir = if rtl { DIR_RIGHT_TO_LEFT } else { DIR_LEFT_TO_RIGHT };
            let bidi = ParagraphBidi::new(body, rtl);
            let piece = glyphs.layout_piece(body, base.paint(), rtl)?;
            let stops = TabStops::new(
                TAB_INCREMENT,
                base.text().tab_stops_at(para_start, para_end),
            );

            let breaks = wrap_paragraph(body, &piece, &stops, self.width as f32);
            for (i, &line_start) in breaks.iter().enumerate() {
                let line_end = breaks.get(i + 1).copied().unwrap_or(para.len());
                let visible_end = line_end.min(body.len());
                starts.push(para_start + line_start);
                lines.push(LineInfo {
                    descent: fm.descent,
                    dir,
                    directions: bidi.line_directions(line_start..visible_end),
                    has_tab: body[line_start..visible_end].contains('\t'),
                    ellipsis_start: 0,
                    ellipsis_count: 0,
                });
            }
        }

        let mut laid_out_end = text.len();
        if lines.len() > self.max_lines {
            let kept = self.max_lines;
            let last = kept - 1;
            let natural_end = starts[kept];
            lines.truncate(kept);
            starts.truncate(kept);

            match self.ellipsize {
                // The last line keeps its natural end; the rest is not laid out.
                None => laid_out_end = natural_end,
                Some(at) => {
                    let at = if kept == 1 { at } else { TruncateAt::End };
                    let start = starts[last];
                    let visible = text[start..].strip_suffix('\n').unwrap_or(&text[start..]);
                    let shown = text[start..natural_end].trim_end_matches('\n').chars().count();
                    let info = &mut lines[last];
                    let rtl = info.dir == DIR_RIGHT_TO_LEFT;
                    info.directions = merged_directions(visible, rtl);
                    info.has_tab = visible.contains('\t');
                    let (e_start, e_count) = truncation_window(
                        glyphs,
                        base.paint(),
                        visible,
                        rtl,
                        ellipsized_width as f32,
                        at,
                        shown,
                    )?;
                    info.ellipsis_start = e_start;
                    info.ellipsis_count = e_count;
                }
            }
        }

        starts.push(laid_out_end);
        let mut tops = Vec::with_capacity(lines.len() + 1);
        let mut top = 0;
        tops.push(top);
        for _ in &lines {
            top += line_height;
            tops.push(top);
        }

        log::debug!(
            "StaticLayout: {} bytes in {} lines, width {}",
            text.len(),
            lines.len(),
            base.width()
        );

        Ok(StaticLayout { base, starts, tops, lines, ellipsized_width })
    }
}

impl Layout for StaticLayout {
    fn base(&self) -> &LayoutBase {
        &self.base
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_top(&self, line: usize) -> i32 {
        self.tops[line]
    }

    fn line_descent(&self, line: usize) -> i32 {
        self.lines[line].descent
    }

    fn line_start(&self, line: usize) -> usize {
        self.starts[line]
    }

    fn paragraph_direction(&self, line: usize) -> i32 {
        self.lines[line].dir
    }

    fn line_contains_tab(&self, line: usize) -> bool {
        self.lines[line].has_tab
    }

    fn line_directions(&self, line: usize) -> Directions {
        self.lines[line].directions.clone()
    }

    fn ellipsis_start(&self, line: usize) -> usize {
        self.lines[line].ellipsis_start
    }

    fn ellipsis_count(&self, line: usize) -> usize {
        self.lines[line].ellipsis_count
    }

    fn ellipsized_width(&self) -> i32 {
        self.ellipsized_width
    }
}

// ---------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------

/// Byte ranges of each paragraph, newline included. Empty text and a
/// trailing newline each yield an empty final paragraph.
fn paragraphs(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices('\n') {
        out.push((start, i + 1));
        start = i + 1;
    }
    out.push((start, text.len()));
    out
}

/// Paragraph-relative line starts for `body`; the first is always 0.
fn wrap_paragraph(body: &str, piece: &LayoutPiece, stops: &TabStops, avail: f32) -> Vec<usize> {
    let mut breaks = vec![0];
    let mut line_start = 0;
    let mut w = 0.0f32;

    for (ws, word) in body.split_word_bound_indices() {
        let we = ws + word.len();
        let hanging = !word.contains('\t') && word.chars().all(is_line_end_space);
        let next = advance_over(body, piece, stops, ws, we, w);
        if hanging || next <= avail {
            w = next;
            continue;
        }

        if ws > line_start {
            breaks.push(ws);
            line_start = ws;
            w = advance_over(body, piece, stops, ws, we, 0.0);
            if w <= avail {
                continue;
            }
        }

        // A single word wider than the line: break between graphemes.
        w = 0.0;
        for (gs, grapheme) in word.grapheme_indices(true) {
            let gs = ws + gs;
            let next = advance_over(body, piece, stops, gs, gs + grapheme.len(), w);
            if next > avail && gs > line_start {
                breaks.push(gs);
                line_start = gs;
                w = advance_over(body, piece, stops, gs, gs + grapheme.len(), 0.0);
            } else {
                w = next;
            }
        }
    }
    breaks
}

/// Pen position after `body[start..end]` starting at `from`.
fn advance_over(
    body: &str,
    piece: &LayoutPiece,
    stops: &TabStops,
    start: usize,
    end: usize,
    from: f32,
) -> f32 {
    let chunk = &body[start..end];
    if !chunk.contains('\t') {
        return from + piece.advance_range(start, end);
    }
    let mut h = from;
    for (i, c) in chunk.char_indices() {
        h = if c == '\t' {
            stops.next_tab(h)
        } else {
            h + piece.advance_range(start + i, start + i + c.len_utf8())
        };
    }
    h
}

/// Run table of a line that absorbed the paragraphs after it. Breaks
/// inside it are analysed as spaces so the line keeps one base level.
fn merged_directions(visible: &str, rtl: bool) -> Directions {
    let merged = visible.replace('\n', " ");
    ParagraphBidi::new(&merged, rtl).line_directions(0..merged.len())
}

/// Ellipsis window for a line that absorbed the hidden text. `shown` is the
/// number of chars the line held before absorbing.
fn truncation_window(
    glyphs: &mut GlyphManager,
    paint: &TextPaint,
    visible: &str,
    rtl: bool,
    avail: f32,
    at: TruncateAt,
    shown: usize,
) -> Result<(usize, usize), TextError> {
    let piece = glyphs.layout_piece(visible, paint, rtl)?;
    let advances = piece.char_advances(visible);
    let ellipsis = glyphs.layout_piece(ELLIPSIS_NORMAL, paint, rtl)?.advance();
    let (start, count) = ellipsize_window(&advances, avail, ellipsis, at);
    if at != TruncateAt::End && count > 0 {
        return Ok((start, count));
    }
    // Hidden text always starts inside the window.
    let total = advances.len();
    let start = if count > 0 { start.min(shown) } else { shown };
    Ok((start, total - start))
}

// ===================================================================
// Tests
// ===================================================================
