//! Benchmarks for mui-render instance generation and batching.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mui_render::renderer::build_batches;
use mui_render::vertex::{argb_to_rgba, CameraUniform, GlyphInstance};
use mui_text::{DrawOp, FaceId, Font, GlyphCode, GlyphQuad, TextureId, TexturedGlyph};

/// `n` glyph quads spread over a few atlases, with a rect every 50 ops.
fn make_ops(n: usize) -> Vec<DrawOp> {
    (0..n)
        .map(|i| {
            let fi = i as f32;
            if i % 50 == 0 {
                return DrawOp::Rect {
                    left: 0.0,
                    top: fi,
                    right: 400.0,
                    bottom: fi + 18.0,
                    color: 0xFF20_2020,
                };
            }
            DrawOp::Glyph(GlyphQuad {
                font: Font::new(FaceId(0), 16),
                code: GlyphCode((i % 95) as u16 + 32),
                glyph: TexturedGlyph {
                    texture: TextureId((i / 200) as u64 % 3 + 1),
                    offset_x: 0,
                    offset_y: -13,
                    width: 7,
                    height: 13,
                    u1: 0.0,
                    v1: 0.0,
                    u2: 0.03,
                    v2: 0.05,
                },
                x: (fi * 8.0) % 1920.0,
                y: (fi * 0.1) % 1080.0,
                color: 0xFFFF_FFFF,
            })
        })
        .collect()
}

fn bench_build_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_batches");
    for &count in &[100, 1_000, 10_000] {
        let ops = make_ops(count);
        let mut instances = Vec::with_capacity(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &ops, |b, ops| {
            b.iter(|| {
                black_box(build_batches(black_box(ops), &mut instances, |_| true));
            });
        });
    }
    group.finish();
}

fn bench_argb_to_rgba(c: &mut Criterion) {
    c.bench_function("argb_to_rgba", |b| {
        b.iter(|| black_box(argb_to_rgba(black_box(0x80FF_8040))));
    });
}

fn bench_camera_orthographic(c: &mut Criterion) {
    c.bench_function("CameraUniform::orthographic", |b| {
        b.iter(|| {
            black_box(CameraUniform::orthographic(
                black_box(1920.0),
                black_box(1080.0),
                black_box(100.0),
                black_box(50.0),
                black_box(1.5),
            ));
        });
    });
}

fn bench_bytemuck_cast(c: &mut Criterion) {
    let mut instances = Vec::new();
    build_batches(&make_ops(1_000), &mut instances, |_| true);

    c.bench_function("bytemuck_cast_1k_instances", |b| {
        b.iter(|| {
            let bytes: &[u8] = bytemuck::cast_slice::<GlyphInstance, u8>(black_box(&instances));
            black_box(bytes.len());
        });
    });
}

criterion_group!(
    benches,
    bench_build_batches,
    bench_argb_to_rgba,
    bench_camera_orthographic,
    bench_bytemuck_cast,
);
criterion_main!(benches);
