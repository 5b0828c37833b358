//! Benchmarks for Matrix2d allocation and transfers
//!
//! Measures resize, broadcast fill, bulk logical writes and reads, and
//! single-element access against the host runtime.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use matrixcl_core::{ComputeContext, Matrix2d};

const SIDES: [usize; 3] = [64, 256, 1024];

fn benchmark_resize(c: &mut Criterion) {
    matrixcl_tracing::install_for_tests();
    let mut group = c.benchmark_group("matrix2d_resize");
    let ctx = ComputeContext::host().unwrap();

    for side in SIDES.iter() {
        group.bench_with_input(BenchmarkId::new("alternate", side), side, |bencher, &side| {
            let mut m = Matrix2d::<f32>::empty(&ctx);
            let mut grow = false;
            bencher.iter(|| {
                grow = !grow;
                let width = if grow { side + 1 } else { side };
                m.resize_with_rim(black_box(width), side, 1).unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("unchanged", side), side, |bencher, &side| {
            let mut m = Matrix2d::<f32>::new(&ctx, side, side).unwrap();
            bencher.iter(|| {
                m.resize(black_box(side), side).unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix2d_fill");
    let ctx = ComputeContext::host().unwrap();

    for side in SIDES.iter() {
        group.throughput(Throughput::Bytes((side * side * 4) as u64));

        group.bench_with_input(BenchmarkId::new("clear", side), side, |bencher, &side| {
            let mut m = Matrix2d::<f32>::new(&ctx, side, side).unwrap();
            bencher.iter(|| m.clear().unwrap());
        });

        group.bench_with_input(BenchmarkId::new("fill", side), side, |bencher, &side| {
            let mut m = Matrix2d::<f32>::new(&ctx, side, side).unwrap();
            bencher.iter(|| m.fill(black_box(1.5)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_transfers(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix2d_transfer");
    let ctx = ComputeContext::host().unwrap();

    for side in SIDES.iter() {
        group.throughput(Throughput::Elements((side * side) as u64));
        let data: Vec<f32> = (0..side * side).map(|i| i as f32).collect();

        group.bench_with_input(BenchmarkId::new("copy_from_slice", side), side, |bencher, &side| {
            let mut m = Matrix2d::<f32>::empty(&ctx);
            m.resize_with_rim(side, side, 1).unwrap();
            bencher.iter(|| m.copy_from_slice(black_box(&data)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("to_vec", side), side, |bencher, &side| {
            let mut m = Matrix2d::<f32>::empty(&ctx);
            m.resize_with_rim(side, side, 1).unwrap();
            m.copy_from_slice(&data).unwrap();
            bencher.iter(|| black_box(m.to_vec().unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("map_unmap", side), side, |bencher, &side| {
            let mut m = Matrix2d::<f32>::empty(&ctx);
            m.resize_with_rim(side, side, 1).unwrap();
            m.clear().unwrap();
            bencher.iter(|| {
                let mut map = m.map().unwrap();
                map[(side / 2, side / 2)] += 1.0;
                map.unmap().unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_element_access(c: &mut Criterion) {
    let ctx = ComputeContext::host().unwrap();
    let mut m = Matrix2d::<f32>::empty(&ctx);
    m.resize_with_rim(256, 256, 1).unwrap();
    m.clear().unwrap();

    c.bench_function("matrix2d_get", |bencher| {
        bencher.iter(|| black_box(m.get(black_box(128), black_box(64)).unwrap()));
    });

    c.bench_function("matrix2d_put", |bencher| {
        bencher.iter(|| m.put(black_box(128), black_box(64), 2.0).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_resize,
    benchmark_fill,
    benchmark_transfers,
    benchmark_element_access
);
criterion_main!(benches);
