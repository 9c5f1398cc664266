//! Shaped, measured runs and their LRU cache.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use crate::backend::{ShapedGlyph, ShapedRun};
use crate::paint::{FontCollection, FontMetricsInt, FontStyle, TextPaint};

/// A run of text shaped in one paint and one direction.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPiece {
    glyphs: Vec<ShapedGlyph>,
    advances: Vec<f32>,
    advance: f32,
    ascent: i32,
    descent: i32,
}

impl LayoutPiece {
    /// Wrap a shaped run with the extent of the fonts it used.
    pub fn new(run: ShapedRun, extent: FontMetricsInt) -> Self {
        Self {
            glyphs: run.glyphs,
            advances: run.advances,
            advance: run.advance,
            ascent: extent.ascent,
            descent: extent.descent,
        }
    }

    pub fn glyphs(&self) -> &[ShapedGlyph] {
        &self.glyphs
    }

    /// Per-byte advances; see [`ShapedRun::advances`].
    pub fn advances(&self) -> &[f32] {
        &self.advances
    }

    /// Total advance of the run.
    pub fn advance(&self) -> f32 {
        self.advance
    }

    pub fn ascent(&self) -> i32 {
        self.ascent
    }

    pub fn descent(&self) -> i32 {
        self.descent
    }

    /// Sum of advances of the bytes in `start..end`, clamped to the run.
    pub fn advance_range(&self, start: usize, end: usize) -> f32 {
        let end = end.min(self.advances.len());
        if start >= end {
            return 0.0;
        }
        self.advances[start..end].iter().sum()
    }

    /// Advance of each char of `text`, which must be the text this piece
    /// was shaped from.
    pub fn char_advances(&self, text: &str) -> Vec<f32> {
        text.char_indices()
            .map(|(i, c)| self.advance_range(i, i + c.len_utf8()))
            .collect()
    }
}

/// Cache key: the shaping-relevant parts of a paint plus text and direction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PieceKey {
    text: Box<str>,
    families: FontCollection,
    style: FontStyle,
    size: u32,
    rtl: bool,
}

impl PieceKey {
    pub fn new(text: &str, paint: &TextPaint, rtl: bool) -> Self {
        Self {
            text: text.into(),
            families: paint.families.clone(),
            style: paint.style,
            size: paint.size,
            rtl,
        }
    }
}

/// LRU cache of shaped pieces.
pub struct LayoutCache {
    pieces: LruCache<PieceKey, Arc<LayoutPiece>>,
    hits: u64,
    misses: u64,
}

impl LayoutCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            pieces: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &PieceKey) -> Option<Arc<LayoutPiece>> {
        match self.pieces.get(key) {
            Some(piece) => {
                self.hits += 1;
                Some(Arc::clone(piece))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, key: PieceKey, piece: Arc<LayoutPiece>) {
        self.pieces.put(key, piece);
    }

    pub fn clear(&mut self) {
        self.pieces.clear();
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(advances: Vec<f32>) -> LayoutPiece {
        let advance = advances.iter().sum();
        let run = ShapedRun { glyphs: vec![], advances, advance };
        LayoutPiece::new(run, FontMetricsInt { ascent: 12, descent: 4, height: 16 })
    }

    #[test]
    fn test_advance_range() {
        let p = piece(vec![5.0, 6.0, 7.0]);
        assert_eq!(p.advance(), 18.0);
        assert_eq!(p.advance_range(0, 2), 11.0);
        assert_eq!(p.advance_range(1, 10), 13.0);
        assert_eq!(p.advance_range(2, 1), 0.0);
        assert_eq!((p.ascent(), p.descent()), (12, 4));
    }

    #[test]
    fn test_char_advances_multibyte() {
        // "aé" is 3 bytes; the cluster advance sits on the first byte.
        let p = piece(vec![5.0, 8.0, 0.0]);
        assert_eq!(p.char_advances("aé"), vec![5.0, 8.0]);
    }

    #[test]
    fn test_cache_hits_and_eviction() {
        let mut cache = LayoutCache::new(2);
        let paint = TextPaint::default();
        let a = PieceKey::new("a", &paint, false);
        let b = PieceKey::new("b", &paint, false);
        let c = PieceKey::new("c", &paint, false);
        cache.put(a.clone(), Arc::new(piece(vec![1.0])));
        cache.put(b.clone(), Arc::new(piece(vec![2.0])));
        assert!(cache.get(&a).is_some());
        cache.put(c.clone(), Arc::new(piece(vec![3.0])));
        // b was least recently used.
        assert!(cache.get(&b).is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_key_ignores_color_but_not_direction() {
        let paint = TextPaint::default();
        let red = paint.clone().with_color(0xFFFF_0000);
        assert_eq!(PieceKey::new("x", &paint, false), PieceKey::new("x", &red, false));
        assert_ne!(PieceKey::new("x", &paint, false), PieceKey::new("x", &paint, true));
    }
}
