//! Character classification and ellipsizing helpers.

/// Horizontal ellipsis drawn in place of truncated text.
pub const ELLIPSIS_NORMAL: &str = "\u{2026}";

/// Zero-width filler that replaces the rest of an ellipsized window.
pub const ELLIPSIS_FILLER: char = '\u{FEFF}';

/// Where truncated text is elided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TruncateAt {
    Start,
    Middle,
    End,
}

/// Whether `c` could change the direction of the text it appears in.
///
/// Conservative: Hebrew through Arabic Extended, bidi controls, everything
/// outside the BMP, and the Hebrew/Arabic presentation forms.
pub fn could_affect_rtl(c: char) -> bool {
    let c = c as u32;
    (0x0590..=0x08FF).contains(&c)
        || c == 0x200E
        || c == 0x200F
        || (0x202A..=0x202E).contains(&c)
        || (0x2066..=0x2069).contains(&c)
        || c > 0xFFFF
        || (0xFB1D..=0xFDFF).contains(&c)
        || (0xFE70..=0xFEFE).contains(&c)
}

/// Whitespace that may hang past the right edge of a line.
pub fn is_line_end_space(c: char) -> bool {
    let c = c as u32;
    c == 0x20
        || c == 0x09
        || c == 0x1680
        || ((0x2000..=0x200A).contains(&c) && c != 0x2007)
        || c == 0x205F
        || c == 0x3000
}

/// Compute the elided window for text whose chars have `advances`, so that
/// the kept chars plus an ellipsis of `ellipsis_width` fit in `avail`.
///
/// Returns `(start, count)` in chars; `count == 0` when everything fits.
pub fn ellipsize_window(
    advances: &[f32],
    avail: f32,
    ellipsis_width: f32,
    at: TruncateAt,
) -> (usize, usize) {
    let total: f32 = advances.iter().sum();
    let len = advances.len();
    if total <= avail || len == 0 {
        return (0, 0);
    }
    let room = (avail - ellipsis_width).max(0.0);

    match at {
        TruncateAt::End => {
            let keep = fit_prefix(advances.iter(), room);
            (keep, len - keep)
        }
        TruncateAt::Start => {
            let keep = fit_prefix(advances.iter().rev(), room);
            (0, len - keep)
        }
        TruncateAt::Middle => {
            let head = fit_prefix(advances.iter(), room / 2.0);
            let head_width: f32 = advances[..head].iter().sum();
            let tail = fit_prefix(advances[head..].iter().rev(), room - head_width);
            (head, len - head - tail)
        }
    }
}

fn fit_prefix<'a>(advances: impl Iterator<Item = &'a f32>, room: f32) -> usize {
    let mut used = 0.0;
    let mut count = 0;
    for advance in advances {
        if used + advance > room {
            break;
        }
        used += advance;
        count += 1;
    }
    count
}

/// Text of a line with its ellipsis window applied: the first elided char
/// becomes the ellipsis, the rest become zero-width fillers.
pub fn apply_ellipsis(text: &str, start: usize, count: usize) -> String {
    let mut out = String::with_capacity(text.len() + ELLIPSIS_NORMAL.len());
    for (i, c) in text.chars().enumerate() {
        if i < start || i >= start + count {
            out.push(c);
        } else if i == start {
            out.push_str(ELLIPSIS_NORMAL);
        } else {
            out.push(ELLIPSIS_FILLER);
        }
    }
    out
}

// ===================================================================
// Tests
// ===================================================================
