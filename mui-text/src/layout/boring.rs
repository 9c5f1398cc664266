//! Boring-text fast path — single-line, left-to-right, unstyled text.
//!
//! [`is_boring`] decides whether a text qualifies and measures it once;
//! [`BoringLayout`] then stores a single width/ascent/descent triple and can
//! be rebuilt in place for the next text.

use super::directions::Directions;
use super::text::{Alignment, LayoutText};
use super::text_dir::TextDirectionHeuristic;
use super::text_line::TextLine;
use super::text_utils::{could_affect_rtl, ellipsize_window, TruncateAt, ELLIPSIS_NORMAL};
use super::{draw_layout, Layout, LayoutBase, DIR_LEFT_TO_RIGHT};
use crate::canvas::Canvas;
use crate::error::TextError;
use crate::manager::GlyphManager;
use crate::paint::{FontMetricsInt, TextPaint};

/// Measured extent of a boring text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoringMetrics {
    /// Rounded-up advance of the whole text.
    pub width: i32,
    /// Distance above the baseline, positive.
    pub ascent: i32,
    pub descent: i32,
}

/// Metrics of `text` if it can be drawn by a [`BoringLayout`], `None` if it
/// needs the general layout path.
pub fn is_boring(
    text: &LayoutText,
    paint: &TextPaint,
    text_dir: TextDirectionHeuristic,
    glyphs: &mut GlyphManager,
) -> Result<Option<BoringMetrics>, TextError> {
    let s = text.as_str();
    if s.chars().any(|c| c == '\n' || c == '\t' || could_affect_rtl(c)) {
        return Ok(None);
    }
    if text_dir.is_rtl(s) {
        return Ok(None);
    }
    if text.paragraph_spans(0, s.len()).next().is_some() {
        return Ok(None);
    }

    let mut fm = FontMetricsInt::default();
    let line = TextLine::new(paint, s, DIR_LEFT_TO_RIGHT, &Directions::AllLeftToRight, false, None);
    let width = line.metrics(glyphs, Some(&mut fm))?;
    if fm.ascent == 0 && fm.descent == 0 {
        fm = glyphs.measure_font_extents(paint)?;
    }

    Ok(Some(BoringMetrics {
        width: width.ceil() as i32,
        ascent: fm.ascent,
        descent: fm.descent,
    }))
}

/// One-line layout for boring text.
#[derive(Clone, Debug)]
pub struct BoringLayout {
    base: LayoutBase,
    /// Draw with a single `draw_text` call.
    direct: bool,
    bottom: i32,
    desc: i32,
    max: f32,
    ellipsized_width: i32,
    ellipsis_start: usize,
    ellipsis_count: usize,
}

impl BoringLayout {
    pub fn make(
        text: impl Into<LayoutText>,
        paint: TextPaint,
        width: i32,
        alignment: Alignment,
        metrics: &BoringMetrics,
    ) -> Result<Self, TextError> {
        let base = LayoutBase::new(
            text.into(),
            paint,
            width,
            alignment,
            TextDirectionHeuristic::FirstStrongLtr,
        )?;
        let mut layout = Self {
            base,
            direct: false,
            bottom: 0,
            desc: 0,
            max: 0.0,
            ellipsized_width: width,
            ellipsis_start: 0,
            ellipsis_count: 0,
        };
        layout.init(metrics);
        Ok(layout)
    }

    /// Like [`make`](Self::make), eliding text wider than `ellipsized_width`.
    #[allow(clippy::too_many_arguments)]
    pub fn make_ellipsized(
        text: impl Into<LayoutText>,
        paint: TextPaint,
        width: i32,
        alignment: Alignment,
        metrics: &BoringMetrics,
        at: TruncateAt,
        ellipsized_width: i32,
        glyphs: &mut GlyphManager,
    ) -> Result<Self, TextError> {
        let mut layout = Self::make(text, paint, width, alignment, metrics)?;
        layout.ellipsize(metrics, at, ellipsized_width, glyphs)?;
        Ok(layout)
    }

    /// Reuse this layout for new contents.
    pub fn rebuild(
        &mut self,
        text: impl Into<LayoutText>,
        paint: TextPaint,
        width: i32,
        alignment: Alignment,
        metrics: &BoringMetrics,
    ) -> Result<(), TextError> {
        self.base.replace_with(text.into(), paint, width, alignment)?;
        self.ellipsized_width = width;
        self.ellipsis_start = 0;
        self.ellipsis_count = 0;
        self.init(metrics);
        Ok(())
    }

    /// Reuse this layout for new contents, eliding text wider than
    /// `ellipsized_width`.
    #[allow(clippy::too_many_arguments)]
    pub fn rebuild_ellipsized(
        &mut self,
        text: impl Into<LayoutText>,
        paint: TextPaint,
        width: i32,
        alignment: Alignment,
        metrics: &BoringMetrics,
        at: TruncateAt,
        ellipsized_width: i32,
        glyphs: &mut GlyphManager,
    ) -> Result<(), TextError> {
        self.rebuild(text, paint, width, alignment, metrics)?;
        self.ellipsize(metrics, at, ellipsized_width, glyphs)
    }

    fn init(&mut self, metrics: &BoringMetrics) {
        self.direct = !self.base.text().is_spanned() && self.base.alignment() == Alignment::Normal;
        self.bottom = metrics.ascent + metrics.descent;
        self.desc = metrics.descent;
        self.max = metrics.width as f32;
    }

    fn ellipsize(
        &mut self,
        metrics: &BoringMetrics,
        at: TruncateAt,
        ellipsized_width: i32,
        glyphs: &mut GlyphManager,
    ) -> Result<(), TextError> {
        self.ellipsized_width = ellipsized_width;
        if metrics.width <= ellipsized_width {
            return Ok(());
        }

        let text = self.base.text().as_str();
        let paint = self.base.paint();
        let advances = glyphs.layout_piece(text, paint, false)?.char_advances(text);
        let ellipsis = glyphs.layout_piece(ELLIPSIS_NORMAL, paint, false)?.advance();
        let (start, count) = ellipsize_window(&advances, ellipsized_width as f32, ellipsis, at);
        if count == 0 {
            return Ok(());
        }

        // The stored width was for the full text; measure what is shown.
        let line = TextLine::new(paint, text, DIR_LEFT_TO_RIGHT, &Directions::AllLeftToRight, false, None)
            .with_ellipsis(start, count);
        self.max = line.metrics(glyphs, None)?.ceil();
        self.ellipsis_start = start;
        self.ellipsis_count = count;
        Ok(())
    }

    /// Whether [`Layout::draw`] takes the single-call path.
    pub fn is_direct(&self) -> bool {
        self.direct && self.ellipsis_count == 0
    }
}

impl Layout for BoringLayout {
    fn base(&self) -> &LayoutBase {
        &self.base
    }

    fn line_count(&self) -> usize {
        1
    }

    fn line_top(&self, line: usize) -> i32 {
        if line == 0 {
            0
        } else {
            self.bottom
        }
    }

    fn line_descent(&self, _line: usize) -> i32 {
        self.desc
    }

    fn line_start(&self, line: usize) -> usize {
        if line == 0 {
            0
        } else {
            self.base.text().len()
        }
    }

    fn paragraph_direction(&self, _line: usize) -> i32 {
        DIR_LEFT_TO_RIGHT
    }

    fn line_contains_tab(&self, _line: usize) -> bool {
        false
    }

    fn line_directions(&self, _line: usize) -> Directions {
        Directions::AllLeftToRight
    }

    fn ellipsis_start(&self, _line: usize) -> usize {
        self.ellipsis_start
    }

    fn ellipsis_count(&self, _line: usize) -> usize {
        self.ellipsis_count
    }

    fn ellipsized_width(&self) -> i32 {
        self.ellipsized_width
    }

    fn line_max(&self, _glyphs: &mut GlyphManager, _line: usize) -> Result<f32, TextError> {
        Ok(self.max)
    }

    fn line_width(&self, _glyphs: &mut GlyphManager, line: usize) -> Result<f32, TextError> {
        Ok(if line == 0 { self.max } else { 0.0 })
    }

    fn draw(&self, canvas: &mut dyn Canvas, glyphs: &mut GlyphManager) -> Result<(), TextError> {
        if self.is_direct() {
            canvas.draw_text(
                self.base.text().as_str(),
                0.0,
                (self.bottom - self.desc) as f32,
                self.base.paint(),
            );
            return Ok(());
        }
        draw_layout(self, canvas, glyphs)
    }
}

// ===================================================================
// Tests
// ===================================================================
