use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use parallel_kernels::generate;
use parallel_kernels::implementations::jacobi::JacobiParams;
use parallel_kernels::{
    Backend, Dijkstra, FloydWarshall, Jacobi, Kernel, ParallelConfig, Prim, SearchParams,
};

const SEED: u64 = 7;
const WORKERS: [usize; 3] = [1, 2, 4];

fn bench_kernel<K: Kernel>(c: &mut Criterion, size: usize, problem: &K::Problem, params: &K::Params) {
    let mut group = c.benchmark_group(format!("{} n={}", K::NAME, size));
    group.sample_size(10);

    group.bench_function(BenchmarkId::new("sequential", 1), |b| {
        b.iter(|| black_box(K::run_sequential(problem, params)))
    });

    for backend in [Backend::Scoped, Backend::Rayon] {
        for workers in WORKERS {
            let config = ParallelConfig::new(workers).with_backend(backend);
            group.bench_function(BenchmarkId::new(backend.to_string(), workers), |b| {
                b.iter(|| black_box(K::run_parallel(problem, params, &config)))
            });
        }
    }
    group.finish();
}

fn criterion_jacobi(c: &mut Criterion) {
    let size = 256;
    let system = generate::diagonally_dominant_system(size, SEED).unwrap();
    bench_kernel::<Jacobi>(c, size, &system, &JacobiParams::default());
}

fn criterion_floyd(c: &mut Criterion) {
    let size = 200;
    let graph = generate::floyd_graph(size, SEED).unwrap();
    bench_kernel::<FloydWarshall>(c, size, &graph, &());
}

fn criterion_dijkstra(c: &mut Criterion) {
    let size = 500;
    let graph = generate::dijkstra_graph(size, SEED, &ParallelConfig::new(4)).unwrap();
    bench_kernel::<Dijkstra>(c, size, &graph, &SearchParams::starting_at(0));
}

fn criterion_prim(c: &mut Criterion) {
    let size = 500;
    let graph = generate::prim_graph(size, SEED).unwrap();
    bench_kernel::<Prim>(c, size, &graph, &SearchParams::starting_at(0));
}

criterion_group!(
    benches,
    criterion_jacobi,
    criterion_floyd,
    criterion_dijkstra,
    criterion_prim
);
criterion_main!(benches);
