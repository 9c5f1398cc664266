//! Layout integration tests — line queries, alignment, picking and caret
//! movement through the public API, measured with the fixed-advance
//! backend (8px per char, ascent 13, descent 4 at the default 16px).

use mui_text::layout::{desired_width, TabStops};
use mui_text::{
    Alignment, BoringLayout, Canvas, CpuTextureFactory, DrawList, DrawOp, FixedAdvanceBackend,
    GlyphCode, GlyphConfig, GlyphManager, Layout, LayoutText, ParagraphSpan, ParagraphStyle,
    StaticLayout, TextDirectionHeuristic, TextPaint, TruncateAt,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn manager() -> GlyphManager {
    GlyphManager::new(
        Box::new(FixedAdvanceBackend::new()),
        Box::new(CpuTextureFactory),
        GlyphConfig::default(),
    )
}

fn layout(text: &str, width: i32, glyphs: &mut GlyphManager) -> StaticLayout {
    StaticLayout::builder(text, TextPaint::default(), width)
        .build(glyphs)
        .unwrap()
}

fn text_ops(list: &DrawList) -> Vec<(String, f32, f32)> {
    list.ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { text, x, baseline, .. } => Some((text.clone(), *x, *baseline)),
            _ => None,
        })
        .collect()
}

fn glyph_xs(list: &DrawList) -> Vec<f32> {
    let mut xs: Vec<f32> = list.glyph_quads().map(|q| q.x).collect();
    xs.sort_by(f32::total_cmp);
    xs
}

// ─── Line queries ────────────────────────────────────────────────────────────

#[test]
fn test_hello_single_line() {
    let mut glyphs = manager();
    let layout = layout("Hello", 100, &mut glyphs);
    assert_eq!(layout.line_count(), 1);
    assert_eq!(layout.line_start(0), 0);
    assert_eq!(layout.line_end(0), 5);
    assert_eq!(layout.paragraph_direction(0), 1);
    assert_eq!(layout.line_top(0), 0);
    assert_eq!(layout.line_bottom(0), 17);
    assert_eq!(layout.line_ascent(0), -13);
    assert_eq!(layout.line_max(&mut glyphs, 0).unwrap(), 40.0);
}

#[test]
fn test_line_lookup_is_monotonic_and_clamped() {
    let mut glyphs = manager();
    let layout = layout("aaa bbb ccc", 48, &mut glyphs);
    assert_eq!(layout.line_count(), 3);

    let lines: Vec<usize> = (0..=11).map(|o| layout.line_for_offset(o)).collect();
    assert!(lines.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(layout.line_for_offset(0), 0);
    assert_eq!(layout.line_for_offset(4), 1);
    assert_eq!(layout.line_for_offset(1000), 2);

    assert_eq!(layout.line_for_vertical(-5), 0);
    assert_eq!(layout.line_for_vertical(16), 0);
    assert_eq!(layout.line_for_vertical(17), 1);
    assert_eq!(layout.line_for_vertical(1000), 2);
}

#[test]
fn test_visible_end_drops_trailing_space_except_last_line() {
    let mut glyphs = manager();
    let layout = layout("ab  cd  ", 32, &mut glyphs);
    assert_eq!(layout.line_count(), 2);
    assert_eq!(layout.line_visible_end(0), 2);
    assert_eq!(layout.line_visible_end(1), 8);
    assert_eq!(layout.line_max(&mut glyphs, 0).unwrap(), 16.0);
    assert_eq!(layout.line_width(&mut glyphs, 0).unwrap(), 32.0);
}

// ─── Drawing and alignment ───────────────────────────────────────────────────

#[test]
fn test_alignment_positions_direct_draws() {
    let mut glyphs = manager();
    let cases = [
        (Alignment::Normal, 0.0),
        (Alignment::Opposite, 84.0),
        (Alignment::Center, 42.0),
        (Alignment::Left, 0.0),
        (Alignment::Right, 84.0),
    ];
    for (alignment, x) in cases {
        let layout = StaticLayout::builder("ab", TextPaint::default(), 100)
            .alignment(alignment)
            .build(&mut glyphs)
            .unwrap();
        let mut list = DrawList::new();
        layout.draw(&mut list, &mut glyphs).unwrap();
        assert_eq!(text_ops(&list), vec![("ab".to_string(), x, 13.0)], "{:?}", alignment);
    }
}

#[test]
fn test_rtl_line_is_right_flush() {
    let mut glyphs = manager();
    let layout = layout("\u{05D0}\u{05D1}", 100, &mut glyphs);
    assert_eq!(layout.paragraph_direction(0), -1);

    let mut list = DrawList::new();
    layout.draw(&mut list, &mut glyphs).unwrap();
    assert!(text_ops(&list).is_empty());
    assert_eq!(glyph_xs(&list), vec![84.0, 92.0]);

    assert_eq!(layout.primary_horizontal(&mut glyphs, 0).unwrap(), 100.0);
    assert_eq!(layout.primary_horizontal(&mut glyphs, 2).unwrap(), 92.0);
    assert_eq!(layout.primary_horizontal(&mut glyphs, 4).unwrap(), 84.0);
}

#[test]
fn test_paragraph_alignment_span_overrides_base() {
    let mut glyphs = manager();
    let text = LayoutText::spanned(
        "ab\ncd",
        vec![ParagraphSpan::new(3, 5, ParagraphStyle::Alignment(Alignment::Opposite))],
    );
    let layout = StaticLayout::builder(text, TextPaint::default(), 100)
        .build(&mut glyphs)
        .unwrap();
    let mut list = DrawList::new();
    layout.draw(&mut list, &mut glyphs).unwrap();

    // Spanned text always takes the line path.
    assert!(text_ops(&list).is_empty());
    assert_eq!(glyph_xs(&list), vec![0.0, 8.0, 84.0, 92.0]);
}

#[test]
fn test_line_background_drawn_first() {
    let mut glyphs = manager();
    let text = LayoutText::spanned(
        "ab",
        vec![ParagraphSpan::new(0, 2, ParagraphStyle::LineBackground(0xFF00FF00))],
    );
    let layout = StaticLayout::builder(text, TextPaint::default(), 100)
        .build(&mut glyphs)
        .unwrap();
    let mut list = DrawList::new();
    layout.draw(&mut list, &mut glyphs).unwrap();
    assert_eq!(
        list.ops()[0],
        DrawOp::Rect { left: 0.0, top: 0.0, right: 100.0, bottom: 17.0, color: 0xFF00FF00 }
    );
    assert_eq!(list.glyph_quads().count(), 2);
}

#[test]
fn test_clip_limits_drawn_lines() {
    let mut glyphs = manager();
    let layout = layout("aaa bbb ccc", 48, &mut glyphs);
    let mut list = DrawList::with_clip(0.0, 17.0, 100.0, 34.0);
    assert_eq!(layout.line_range_for_draw(&list), Some((1, 1)));

    layout.draw(&mut list, &mut glyphs).unwrap();
    assert_eq!(text_ops(&list), vec![("bbb".to_string(), 0.0, 30.0)]);

    let hidden = DrawList::with_clip(0.0, 100.0, 100.0, 200.0);
    assert!(hidden.quick_reject(0.0, 0.0, 10.0, 51.0));
    assert_eq!(layout.line_range_for_draw(&hidden), None);
}

#[test]
fn test_clip_beside_layout_draws_nothing() {
    let mut glyphs = manager();
    let layout = layout("aaa bbb ccc", 48, &mut glyphs);
    let mut list = DrawList::with_clip(100.0, 0.0, 200.0, 100.0);
    assert_eq!(layout.line_range_for_draw(&list), None);

    layout.draw(&mut list, &mut glyphs).unwrap();
    assert!(list.ops().is_empty());
}

#[test]
fn test_line_limit_draws_only_kept_text() {
    let mut glyphs = manager();
    let layout = StaticLayout::builder("aaa bbb ccc", TextPaint::default(), 48)
        .max_lines(1)
        .build(&mut glyphs)
        .unwrap();
    let mut list = DrawList::new();
    layout.draw(&mut list, &mut glyphs).unwrap();
    assert_eq!(text_ops(&list), vec![("aaa ".to_string(), 0.0, 13.0)]);

    let layout = StaticLayout::builder("a\nb\nc", TextPaint::default(), 100)
        .max_lines(1)
        .build(&mut glyphs)
        .unwrap();
    let mut list = DrawList::new();
    layout.draw(&mut list, &mut glyphs).unwrap();
    assert_eq!(text_ops(&list), vec![("a".to_string(), 0.0, 13.0)]);
}

#[test]
fn test_tab_advances_to_next_stop() {
    let mut glyphs = manager();
    let layout = layout("a\tb", 200, &mut glyphs);
    assert!(layout.line_contains_tab(0));
    assert_eq!(layout.primary_horizontal(&mut glyphs, 2).unwrap(), 20.0);

    let mut list = DrawList::new();
    layout.draw(&mut list, &mut glyphs).unwrap();
    assert_eq!(glyph_xs(&list), vec![0.0, 20.0]);
    assert_eq!(TabStops::default().next_tab(8.0), 20.0);
}

#[test]
fn test_explicit_tab_stop_span() {
    let mut glyphs = manager();
    let text = LayoutText::spanned(
        "a\tb",
        vec![ParagraphSpan::new(0, 3, ParagraphStyle::TabStop(50.0))],
    );
    let layout = StaticLayout::builder(text, TextPaint::default(), 200)
        .build(&mut glyphs)
        .unwrap();
    assert_eq!(layout.primary_horizontal(&mut glyphs, 2).unwrap(), 50.0);
}

#[test]
fn test_ellipsized_line_draws_ellipsis_glyph() {
    let mut glyphs = manager();
    let layout = StaticLayout::builder("aaa bbb ccc", TextPaint::default(), 48)
        .max_lines(1)
        .ellipsize(TruncateAt::End)
        .build(&mut glyphs)
        .unwrap();
    let mut list = DrawList::new();
    layout.draw(&mut list, &mut glyphs).unwrap();

    let ellipsis: Vec<f32> = list
        .glyph_quads()
        .filter(|q| q.code == GlyphCode(0x2026))
        .map(|q| q.x)
        .collect();
    assert_eq!(ellipsis, vec![32.0]);
    assert_eq!(list.glyph_quads().count(), 4);
    assert_eq!(layout.line_max(&mut glyphs, 0).unwrap(), 40.0);
}

// ─── Picking and caret movement ──────────────────────────────────────────────

#[test]
fn test_offset_for_horizontal() {
    let mut glyphs = manager();
    let layout = layout("Hello\nab", 100, &mut glyphs);
    assert_eq!(layout.offset_for_horizontal(&mut glyphs, 0, 19.0).unwrap(), 2);
    assert_eq!(layout.offset_for_horizontal(&mut glyphs, 0, -10.0).unwrap(), 0);
    // Never lands after the newline.
    assert_eq!(layout.offset_for_horizontal(&mut glyphs, 0, 500.0).unwrap(), 5);
    assert_eq!(layout.offset_for_horizontal(&mut glyphs, 1, 500.0).unwrap(), 8);
}

#[test]
fn test_caret_crosses_lines() {
    let mut glyphs = manager();
    let layout = layout("ab\nc", 100, &mut glyphs);
    assert_eq!(layout.offset_to_left_of(&mut glyphs, 0).unwrap(), 0);
    assert_eq!(layout.offset_to_right_of(&mut glyphs, 0).unwrap(), 1);
    assert_eq!(layout.offset_to_right_of(&mut glyphs, 2).unwrap(), 3);
    assert_eq!(layout.offset_to_left_of(&mut glyphs, 3).unwrap(), 2);
    assert_eq!(layout.offset_to_right_of(&mut glyphs, 3).unwrap(), 4);
    assert_eq!(layout.offset_to_right_of(&mut glyphs, 4).unwrap(), 4);
}

#[test]
fn test_caret_flips_on_direction_change() {
    let mut glyphs = manager();
    // Line 1 is right to left: its start is the right edge.
    let layout = layout("ab\n\u{05D0}\u{05D1}", 100, &mut glyphs);
    assert_eq!(layout.paragraph_direction(1), -1);
    assert_eq!(layout.offset_to_left_of(&mut glyphs, 3).unwrap(), 5);
    assert_eq!(layout.offset_to_left_of(&mut glyphs, 5).unwrap(), 7);
    assert_eq!(layout.offset_to_right_of(&mut glyphs, 5).unwrap(), 3);
    assert_eq!(layout.offset_to_right_of(&mut glyphs, 3).unwrap(), 2);
}

// ─── Measurement helpers ─────────────────────────────────────────────────────

#[test]
fn test_desired_width() {
    let mut glyphs = manager();
    let paint = TextPaint::default();
    let width = desired_width("a\nabcde\nab", &paint, TextDirectionHeuristic::default(), &mut glyphs)
        .unwrap();
    assert_eq!(width, 40.0);
}

#[test]
fn test_boring_and_static_agree() {
    let mut glyphs = manager();
    let text = LayoutText::from("plain text");
    let paint = TextPaint::default();
    let metrics = mui_text::is_boring(&text, &paint, TextDirectionHeuristic::default(), &mut glyphs)
        .unwrap()
        .unwrap();
    let boring = BoringLayout::make(text.clone(), paint.clone(), 200, Alignment::Normal, &metrics).unwrap();
    let full = StaticLayout::builder(text, paint, 200).build(&mut glyphs).unwrap();

    assert_eq!(boring.height(), full.height());
    assert_eq!(boring.line_baseline(0), full.line_baseline(0));
    assert_eq!(
        boring.line_max(&mut glyphs, 0).unwrap(),
        full.line_max(&mut glyphs, 0).unwrap()
    );
    assert_eq!(
        boring.primary_horizontal(&mut glyphs, 5).unwrap(),
        full.primary_horizontal(&mut glyphs, 5).unwrap()
    );
}
