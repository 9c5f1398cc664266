//! Per-line bidi run tables.
//!
//! Paragraph levels come from `unicode-bidi`; each line then stores its
//! runs in visual order with line-relative byte offsets.

use std::ops::Range;
use std::sync::Arc;

use unicode_bidi::{BidiInfo, Level};

use super::text_utils::could_affect_rtl;

/// One directional run of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BidiRun {
    /// Line-relative byte range.
    pub start: usize,
    pub end: usize,
    /// Embedding level; odd levels are right to left.
    pub level: u8,
}

impl BidiRun {
    pub fn is_rtl(&self) -> bool {
        self.level & 1 == 1
    }
}

/// Directional runs of a line, in visual order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directions {
    AllLeftToRight,
    AllRightToLeft,
    Runs(Arc<[BidiRun]>),
}

impl Directions {
    /// Simplify a run list covering `len` bytes.
    pub fn from_runs(runs: Vec<BidiRun>, len: usize) -> Self {
        match runs.as_slice() {
            [] => Directions::AllLeftToRight,
            [only] if only.start == 0 && only.end >= len => {
                if only.is_rtl() {
                    Directions::AllRightToLeft
                } else {
                    Directions::AllLeftToRight
                }
            }
            _ => Directions::Runs(runs.into()),
        }
    }

    /// Runs in visual order for a line of `len` bytes, clipped to `len`.
    pub fn runs(&self, len: usize) -> Vec<BidiRun> {
        match self {
            Directions::AllLeftToRight => vec![BidiRun { start: 0, end: len, level: 0 }],
            Directions::AllRightToLeft => vec![BidiRun { start: 0, end: len, level: 1 }],
            Directions::Runs(runs) => runs
                .iter()
                .filter(|run| run.start < len)
                .map(|run| BidiRun { end: run.end.min(len), ..*run })
                .collect(),
        }
    }

    /// Whether the whole line runs in one direction.
    pub fn is_single_direction(&self) -> bool {
        match self {
            Directions::AllLeftToRight | Directions::AllRightToLeft => true,
            Directions::Runs(runs) => {
                runs.iter().all(|run| run.is_rtl() == runs[0].is_rtl())
            }
        }
    }
}

/// Bidi analysis of one paragraph (no line breaks inside).
pub struct ParagraphBidi<'t> {
    info: Option<BidiInfo<'t>>,
    rtl: bool,
}

impl<'t> ParagraphBidi<'t> {
    pub fn new(text: &'t str, rtl: bool) -> Self {
        let needs_bidi = rtl || text.chars().any(could_affect_rtl);
        let info = needs_bidi.then(|| {
            let level = if rtl { Level::rtl() } else { Level::ltr() };
            BidiInfo::new(text, Some(level))
        });
        Self { info, rtl }
    }

    pub fn is_rtl(&self) -> bool {
        self.rtl
    }

    /// Runs of the paragraph-relative byte `range`, rebased to the line.
    pub fn line_directions(&self, range: Range<usize>) -> Directions {
        let len = range.len();
        let Some(info) = &self.info else {
            return Directions::AllLeftToRight;
        };
        let base = if self.rtl { 1 } else { 0 };
        if len == 0 {
            return Directions::from_runs(vec![BidiRun { start: 0, end: 0, level: base }], 0);
        }
        let Some(para) = info
            .paragraphs
            .iter()
            .find(|p| p.range.start <= range.start && range.start < p.range.end)
        else {
            return Directions::from_runs(vec![BidiRun { start: 0, end: len, level: base }], len);
        };

        let clipped = range.start..range.end.min(para.range.end);
        let (levels, visual) = info.visual_runs(para, clipped.clone());
        let mut runs: Vec<BidiRun> = visual
            .into_iter()
            .filter(|run| !run.is_empty())
            .map(|run| BidiRun {
                start: run.start - range.start,
                end: run.end - range.start,
                level: levels[run.start].number(),
            })
            .collect();
        if clipped.end < range.end {
            // Text past a paragraph separator keeps the base direction.
            runs.push(BidiRun {
                start: clipped.end - range.start,
                end: len,
                level: base,
            });
        }
        Directions::from_runs(runs, len)
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ltr_skips_bidi() {
        let bidi = ParagraphBidi::new("hello world", false);
        assert_eq!(bidi.line_directions(0..11), Directions::AllLeftToRight);
    }

    #[test]
    fn test_pure_rtl_line() {
        let text = "שלום";
        let bidi = ParagraphBidi::new(text, true);
        assert_eq!(bidi.line_directions(0..text.len()), Directions::AllRightToLeft);
    }

    #[test]
    fn test_mixed_runs_in_visual_order() {
        // "ab " then 4 Hebrew letters (8 bytes).
        let text = "ab שלום";
        let bidi = ParagraphBidi::new(text, false);
        let dirs = bidi.line_directions(0..text.len());
        let runs = dirs.runs(text.len());
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], BidiRun { start: 0, end: 3, level: 0 });
        assert_eq!(runs[1], BidiRun { start: 3, end: 11, level: 1 });
        assert!(!dirs.is_single_direction());
    }

    #[test]
    fn test_rtl_paragraph_puts_ltr_run_on_the_right_order() {
        let text = "שלום abc";
        let bidi = ParagraphBidi::new(text, true);
        let runs = bidi.line_directions(0..text.len()).runs(text.len());
        // Visual order: the embedded LTR run comes first (leftmost).
        assert_eq!(runs[0].level, 2);
        assert_eq!(&text[runs[0].start..runs[0].end], "abc");
        assert!(runs[1].is_rtl());
    }

    #[test]
    fn test_runs_clip_to_length() {
        let dirs = Directions::Runs(
            vec![
                BidiRun { start: 0, end: 4, level: 0 },
                BidiRun { start: 4, end: 8, level: 1 },
            ]
            .into(),
        );
        let runs = dirs.runs(6);
        assert_eq!(runs[1], BidiRun { start: 4, end: 6, level: 1 });
        assert_eq!(dirs.runs(3).len(), 1);
    }

    #[test]
    fn test_from_runs_simplifies() {
        let runs = vec![BidiRun { start: 0, end: 5, level: 1 }];
        assert_eq!(Directions::from_runs(runs, 5), Directions::AllRightToLeft);
    }
}
