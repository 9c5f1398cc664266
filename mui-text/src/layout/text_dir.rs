//! Paragraph direction heuristics.

use unicode_bidi::{bidi_class, BidiClass};

/// How to pick a paragraph's base direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextDirectionHeuristic {
    /// Always left to right.
    Ltr,
    /// Always right to left.
    Rtl,
    /// First strong character decides; left to right if there is none.
    #[default]
    FirstStrongLtr,
    /// First strong character decides; right to left if there is none.
    FirstStrongRtl,
    /// Right to left if any strong right-to-left character is present.
    AnyRtlLtr,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Strong {
    Ltr,
    Rtl,
}

impl TextDirectionHeuristic {
    /// Whether `text` (one paragraph) should be laid out right to left.
    pub fn is_rtl(self, text: &str) -> bool {
        match self {
            Self::Ltr => false,
            Self::Rtl => true,
            Self::FirstStrongLtr => first_strong(text) == Some(Strong::Rtl),
            Self::FirstStrongRtl => first_strong(text) != Some(Strong::Ltr),
            Self::AnyRtlLtr => text.chars().any(|c| strong(c) == Some(Strong::Rtl)),
        }
    }
}

fn strong(c: char) -> Option<Strong> {
    match bidi_class(c) {
        BidiClass::L | BidiClass::LRE | BidiClass::LRO => Some(Strong::Ltr),
        BidiClass::R | BidiClass::AL | BidiClass::RLE | BidiClass::RLO => Some(Strong::Rtl),
        _ => None,
    }
}

/// First strong direction outside isolates.
fn first_strong(text: &str) -> Option<Strong> {
    let mut isolate_depth = 0usize;
    for c in text.chars() {
        match bidi_class(c) {
            BidiClass::LRI | BidiClass::RLI | BidiClass::FSI => isolate_depth += 1,
            BidiClass::PDI => isolate_depth = isolate_depth.saturating_sub(1),
            _ if isolate_depth > 0 => {}
            _ => {
                if let Some(dir) = strong(c) {
                    return Some(dir);
                }
            }
        }
    }
    None
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_heuristics() {
        assert!(!TextDirectionHeuristic::Ltr.is_rtl("שלום"));
        assert!(TextDirectionHeuristic::Rtl.is_rtl("hello"));
    }

    #[test]
    fn test_first_strong() {
        let h = TextDirectionHeuristic::FirstStrongLtr;
        assert!(!h.is_rtl("hello שלום"));
        assert!(h.is_rtl("123 שלום hello"));
        assert!(!h.is_rtl("123 ..."));
        assert!(TextDirectionHeuristic::FirstStrongRtl.is_rtl("123 ..."));
        assert!(!TextDirectionHeuristic::FirstStrongRtl.is_rtl("a"));
    }

    #[test]
    fn test_first_strong_skips_isolates() {
        let h = TextDirectionHeuristic::FirstStrongLtr;
        assert!(!h.is_rtl("\u{2067}שלום\u{2069} hello"));
    }

    #[test]
    fn test_any_rtl() {
        let h = TextDirectionHeuristic::AnyRtlLtr;
        assert!(h.is_rtl("hello مرحبا"));
        assert!(!h.is_rtl("hello 123"));
    }

    #[test]
    fn test_default_is_first_strong_ltr() {
        assert_eq!(TextDirectionHeuristic::default(), TextDirectionHeuristic::FirstStrongLtr);
    }
}
