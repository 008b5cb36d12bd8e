//! Benchmarks for lumen engines and their building blocks.
//!
//! Run with: `cargo bench -p lumen-bench`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lumen_core::PixelBuffer;
use lumen_enhance::bimef::{IlluminationEstimator, IlluminationParams};
use lumen_enhance::{Agcwd, Bimef, HistogramStats, ResolutionAdapter};
use lumen_ops::resize::{resize_f32, Filter};
use lumen_ops::solver::{solve_weighted_laplacian, SolverOptions};

fn dim_rgb(width: u32, height: u32) -> PixelBuffer {
    let data = (0..width * height * 3)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 26) as u8)
        .collect();
    PixelBuffer::from_u8(width, height, 3, data).unwrap()
}

/// Histogram statistics and the full AGCWD pass.
fn bench_agcwd(c: &mut Criterion) {
    let mut group = c.benchmark_group("agcwd");

    for side in [256u32, 512, 1024] {
        let buf = dim_rgb(side, side);
        group.throughput(Throughput::Elements((side * side) as u64));

        group.bench_with_input(BenchmarkId::new("histogram", side), &buf, |b, buf| {
            b.iter(|| HistogramStats::compute(black_box(buf)).unwrap())
        });

        let engine = Agcwd::default();
        group.bench_with_input(BenchmarkId::new("enhance", side), &buf, |b, buf| {
            b.iter(|| engine.enhance(black_box(buf)).unwrap())
        });
    }

    group.finish();
}

/// Illumination estimation and the full BIMEF pass.
fn bench_bimef(c: &mut Criterion) {
    let mut group = c.benchmark_group("bimef");
    group.sample_size(10);

    for side in [128u32, 256, 512] {
        let buf = dim_rgb(side, side);
        group.throughput(Throughput::Elements((side * side) as u64));

        let estimator = IlluminationEstimator::new(IlluminationParams::default());
        group.bench_with_input(BenchmarkId::new("illumination", side), &buf, |b, buf| {
            b.iter(|| estimator.estimate(black_box(buf)).unwrap())
        });

        let engine = Bimef::default();
        group.bench_with_input(BenchmarkId::new("enhance", side), &buf, |b, buf| {
            b.iter(|| engine.enhance(black_box(buf)).unwrap())
        });
    }

    group.finish();
}

/// Adapter overhead on a camera-sized frame.
fn bench_adapter(c: &mut Criterion) {
    let mut group = c.benchmark_group("adapter");
    group.sample_size(10);

    let frame = dim_rgb(1920, 1080);
    let adapter = ResolutionAdapter::new(512).unwrap();
    group.bench_function("downscale_1080p", |b| {
        b.iter(|| adapter.downscale(black_box(&frame)).unwrap())
    });

    let small = adapter.downscale(&frame).unwrap();
    group.bench_function("upscale_1080p", |b| {
        b.iter(|| adapter.upscale(black_box(&small), (1920, 1080)).unwrap())
    });

    let engine = Agcwd::default();
    group.bench_function("agcwd_1080p", |b| {
        b.iter(|| adapter.run(black_box(&frame), &engine).unwrap())
    });

    group.finish();
}

/// Resampling and the weighted-Laplacian solve.
fn bench_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("ops");

    let plane: Vec<f32> = (0..256 * 256).map(|i| (i % 97) as f32 / 97.0).collect();
    for filter in [Filter::Area, Filter::Bilinear, Filter::Bicubic] {
        group.bench_with_input(
            BenchmarkId::new("resize_256_to_100", format!("{filter:?}")),
            &plane,
            |b, p| b.iter(|| resize_f32(black_box(p), 256, 256, 1, 100, 100, filter).unwrap()),
        );
    }

    let weights = vec![1.0f32; 256 * 256];
    let options = SolverOptions::default();
    group.bench_function("solve_256", |b| {
        b.iter(|| {
            solve_weighted_laplacian(black_box(&plane), 256, 256, &weights, &weights, 0.5, &options)
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_agcwd, bench_bimef, bench_adapter, bench_ops);
criterion_main!(benches);
