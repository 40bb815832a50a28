//! Benchmarks for the welding strategies.
//!
//! Run with: cargo bench -p meshgeo-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meshgeo_core::{weld, WeldStrategy};

/// Unrolled grid mesh: every quad contributes six corners, so interior
/// positions appear up to six times.
fn unrolled_grid(n: usize) -> Vec<[f32; 3]> {
    let mut positions = Vec::with_capacity(n * n * 6);
    for y in 0..n {
        for x in 0..n {
            let (x0, y0) = (x as f32, y as f32);
            let (x1, y1) = (x0 + 1.0, y0 + 1.0);
            positions.extend_from_slice(&[
                [x0, y0, 0.0],
                [x1, y0, 0.0],
                [x1, y1, 0.0],
                [x0, y0, 0.0],
                [x1, y1, 0.0],
                [x0, y1, 0.0],
            ]);
        }
    }
    positions
}

fn bench_weld(c: &mut Criterion) {
    let mut group = c.benchmark_group("weld");
    for n in [8usize, 32] {
        let positions = unrolled_grid(n);
        group.throughput(Throughput::Elements(positions.len() as u64));
        for (label, strategy) in [
            ("linear_scan", WeldStrategy::LinearScan),
            ("spatial_hash", WeldStrategy::SpatialHash),
        ] {
            group.bench_with_input(BenchmarkId::new(label, positions.len()), &positions, |b, p| {
                b.iter(|| weld(black_box(p), 1e-4, strategy))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_weld);
criterion_main!(benches);
