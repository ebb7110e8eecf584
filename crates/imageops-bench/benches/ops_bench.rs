//! Benchmarks for imageops operators.
//!
//! Run with: `cargo bench -p imageops-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use imageops::raster::Canvas;
use imageops::resize::{Filter, resize_filtered};
use imageops::roto::VectorMaskSpec;
use imageops::{Blur, ImageBatch, ImageOp, OpsConfig, Transform};

fn gradient(size: usize) -> ImageBatch {
    ImageBatch::from_fn(1, size, size, 4, |_, y, x| {
        vec![x as f32 / size as f32, y as f32 / size as f32, 0.5, 1.0]
    })
    .unwrap_or_else(|e| panic!("bench image: {e}"))
}

/// Separable gaussian blur at several radii.
fn bench_blur(c: &mut Criterion) {
    let mut group = c.benchmark_group("blur");
    let cfg = OpsConfig::default();
    let img = gradient(512);
    group.throughput(Throughput::Elements((512 * 512) as u64));

    for radius in [1usize, 4, 16] {
        let op = Blur { radius, sigma: radius as f32 / 2.0 };
        group.bench_with_input(BenchmarkId::new("radius", radius), &op, |b, op| {
            b.iter(|| op.process(black_box(&img), &cfg))
        });
    }
    group.finish();
}

/// Filtered resize, up and down.
fn bench_resize(c: &mut Criterion) {
    let mut group = c.benchmark_group("resize");
    let img = gradient(512);

    for filter in [Filter::Nearest, Filter::Bilinear, Filter::Bicubic] {
        let name = format!("{:?}", filter).to_lowercase();
        group.bench_function(BenchmarkId::new("down_2x", &name), |b| {
            b.iter(|| resize_filtered(black_box(img.data()), 512, 512, 4, 256, 256, filter))
        });
        group.bench_function(BenchmarkId::new("up_2x", &name), |b| {
            b.iter(|| resize_filtered(black_box(img.data()), 512, 512, 4, 1024, 1024, filter))
        });
    }

    let cfg = OpsConfig::default();
    let rotate = Transform { rotate_deg: 33.0, expand: true, ..Default::default() };
    group.bench_function("rotate_expand", |b| b.iter(|| rotate.process(black_box(&img), &cfg)));
    group.finish();
}

/// Vector mask rasterization.
fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");

    let bezier = VectorMaskSpec::parse(
        r#"{"mode":"bezier","steps":64,"points":[
            {"x":0.1,"y":0.2},{"x":0.5,"y":0.05},{"x":0.9,"y":0.3},
            {"x":0.8,"y":0.9},{"x":0.3,"y":0.8}]}"#,
    );
    group.bench_function("bezier_1k", |b| b.iter(|| black_box(&bezier).rasterize(1024, 1024)));

    let paint = VectorMaskSpec::parse(
        r#"{"mode":"paint","strokes":[
            {"points":[[0.1,0.1],[0.3,0.5],[0.6,0.4],[0.9,0.9]],"brush":32},
            {"points":[[0.9,0.1],[0.1,0.9]],"brush":12,"erase":true}]}"#,
    );
    group.bench_function("paint_1k", |b| b.iter(|| black_box(&paint).rasterize(1024, 1024)));

    let circles: Vec<(f32, f32)> = (0..64).map(|i| (i as f32 * 16.0, 512.0)).collect();
    group.bench_function("circles", |b| {
        b.iter(|| {
            let mut canvas = Canvas::new(1024, 1024);
            for (x, y) in &circles {
                canvas.fill_circle(*x, *y, 24.0, 255);
            }
            canvas
        })
    });
    group.finish();
}

criterion_group!(benches, bench_blur, bench_resize, bench_rasterize);
criterion_main!(benches);
