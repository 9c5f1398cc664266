//! Paint and font metrics.

use std::sync::Arc;

/// Font style bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    pub const NORMAL: FontStyle = FontStyle { bold: false, italic: false };
    pub const BOLD: FontStyle = FontStyle { bold: true, italic: false };
    pub const ITALIC: FontStyle = FontStyle { bold: false, italic: true };
    pub const BOLD_ITALIC: FontStyle = FontStyle { bold: true, italic: true };
}

/// Ordered font family fallback chain, e.g. `["Minecraft", "sans-serif"]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontCollection {
    families: Arc<[String]>,
}

impl FontCollection {
    pub fn new<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let families: Vec<String> = families.into_iter().map(Into::into).collect();
        if families.is_empty() {
            return Self::default();
        }
        Self { families: families.into() }
    }

    /// Parse a CSS-style family list: `"Minecraft", Arial, sans-serif`.
    pub fn from_css(css: &str) -> Self {
        Self::new(
            css.split(',')
                .map(|s| s.trim().trim_matches('"').trim_matches('\'').to_string())
                .filter(|s| !s.is_empty()),
        )
    }

    pub fn families(&self) -> &[String] {
        &self.families
    }
}

impl Default for FontCollection {
    fn default() -> Self {
        Self { families: vec![String::from("sans-serif")].into() }
    }
}

/// What to draw text with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextPaint {
    pub families: FontCollection,
    pub style: FontStyle,
    /// Font size in pixels.
    pub size: u32,
    /// ARGB color.
    pub color: u32,
}

impl Default for TextPaint {
    fn default() -> Self {
        Self {
            families: FontCollection::default(),
            style: FontStyle::NORMAL,
            size: 16,
            color: 0xFFFF_FFFF,
        }
    }
}

impl TextPaint {
    pub fn new(families: FontCollection, size: u32) -> Self {
        Self { families, size, ..Self::default() }
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_color(mut self, argb: u32) -> Self {
        self.color = argb;
        self
    }

    /// Color as RGBA floats in [0, 1].
    pub fn color_rgba(&self) -> [f32; 4] {
        let c = self.color;
        [
            ((c >> 16) & 0xFF) as f32 / 255.0,
            ((c >> 8) & 0xFF) as f32 / 255.0,
            (c & 0xFF) as f32 / 255.0,
            (c >> 24) as f32 / 255.0,
        ]
    }
}

/// Integer font metrics in pixels. Ascent and descent are both positive
/// distances from the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FontMetricsInt {
    pub ascent: i32,
    pub descent: i32,
    /// Recommended line height (ascent + descent + leading).
    pub height: i32,
}

impl FontMetricsInt {
    /// Grow each field to at least `other`'s.
    pub fn extend_by(&mut self, other: &FontMetricsInt) {
        self.ascent = self.ascent.max(other.ascent);
        self.descent = self.descent.max(other.descent);
        self.height = self.height.max(other.height);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ===================================================================
// Tests
// ===================================================================
