use parallel_kernels::generate;
use parallel_kernels::guard::TieBreak;
use parallel_kernels::implementations::jacobi::{self, JacobiParams};
use parallel_kernels::oracle::{equal, Equivalent};
use parallel_kernels::{
    Backend, Dijkstra, FloydWarshall, Jacobi, Kernel, ParallelConfig, Prim, SearchParams,
};

const EPSILON: f64 = 1e-10;
const SEEDS: [u64; 3] = [1, 17, 4242];
const BACKENDS: [Backend; 2] = [Backend::Scoped, Backend::Rayon];

/// 検証するワーカー数: 1, 2, 5, N, N+10
fn worker_counts(n: usize) -> [usize; 5] {
    [1, 2, 5, n, n + 10]
}

/// 逐次版を正解として、全バックエンド・全ワーカー数の並列版と比較する
fn assert_parallel_matches<K>(problem: &K::Problem, params: &K::Params, n: usize)
where
    K: Kernel,
    K::Output: Equivalent + std::fmt::Debug,
{
    let expected = K::run_sequential(problem, params).unwrap();

    for backend in BACKENDS {
        for workers in worker_counts(n) {
            let config = ParallelConfig::new(workers).with_backend(backend);
            let actual = K::run_parallel(problem, params, &config).unwrap();
            assert!(
                equal(&expected, &actual, EPSILON),
                "{} sequential and parallel ({}, {} workers) differ:\n{:?}\nvs\n{:?}",
                K::NAME,
                backend,
                workers,
                expected,
                actual
            );
        }
    }
}

#[test]
fn test_jacobi_sequential_vs_parallel() {
    for seed in SEEDS {
        let n = 24;
        let system = generate::diagonally_dominant_system(n, seed).unwrap();
        assert_parallel_matches::<Jacobi>(&system, &JacobiParams::default(), n);
    }

    println!("✓ Jacobi: sequential vs parallel match!");
}

#[test]
fn test_jacobi_parallel_is_bit_identical() {
    let n = 31;
    let system = generate::diagonally_dominant_system(n, 99).unwrap();
    let params = JacobiParams::default();

    let expected = Jacobi::run_sequential(&system, &params).unwrap();
    for workers in worker_counts(n) {
        let actual = Jacobi::run_parallel(&system, &params, &ParallelConfig::new(workers)).unwrap();
        assert_eq!(expected.x, actual.x);
        assert_eq!(expected.iterations, actual.iterations);
        assert_eq!(expected.status, actual.status);
    }
}

#[test]
fn test_jacobi_sequential_vs_persistent_barrier() {
    let n = 24;
    let system = generate::diagonally_dominant_system(n, 5).unwrap();
    let params = JacobiParams::default();
    let expected = jacobi::single::solve(&system, &params).unwrap();

    for workers in worker_counts(n) {
        let actual = jacobi::barrier::solve(&system, &params, workers).unwrap();
        assert_eq!(expected.x, actual.x, "persistent solver with {} workers", workers);
        assert_eq!(expected.iterations, actual.iterations);
        assert_eq!(expected.status, actual.status);
    }

    println!("✓ Jacobi: sequential vs persistent barrier match!");
}

#[test]
fn test_persistent_barrier_reports_exhaustion() {
    let system = generate::diagonally_dominant_system(10, 3).unwrap();
    let params = JacobiParams {
        max_iterations: 3,
        tolerance: 1e-300,
    };
    let expected = jacobi::single::solve(&system, &params).unwrap();
    let actual = jacobi::barrier::solve(&system, &params, 4).unwrap();

    assert!(!actual.is_converged());
    assert_eq!(actual.iterations, 3);
    assert_eq!(expected.x, actual.x);
}

#[test]
fn test_floyd_sequential_vs_parallel() {
    for seed in SEEDS {
        let n = 40;
        let graph = generate::floyd_graph(n, seed).unwrap();
        assert_parallel_matches::<FloydWarshall>(&graph, &(), n);
    }

    println!("✓ Floyd–Warshall: sequential vs parallel match!");
}

#[test]
fn test_dijkstra_sequential_vs_parallel() {
    for seed in SEEDS {
        let n = 60;
        let graph = generate::dijkstra_graph(n, seed, &ParallelConfig::new(3)).unwrap();
        for source in [0, n / 2, n - 1] {
            assert_parallel_matches::<Dijkstra>(&graph, &SearchParams::starting_at(source), n);
        }
    }

    println!("✓ Dijkstra: sequential vs parallel match!");
}

#[test]
fn test_prim_sequential_vs_parallel() {
    for seed in SEEDS {
        let n = 60;
        let graph = generate::prim_graph(n, seed).unwrap();
        assert_parallel_matches::<Prim>(&graph, &SearchParams::starting_at(0), n);

        // 同じ始点なら親配列そのものが一致する
        let params = SearchParams::starting_at(7);
        let expected = Prim::run_sequential(&graph, &params).unwrap();
        let actual = Prim::run_parallel(&graph, &params, &ParallelConfig::new(5)).unwrap();
        assert_eq!(expected.parent, actual.parent);
    }

    println!("✓ Prim: sequential vs parallel match!");
}

#[test]
fn test_tie_break_modes_agree_across_variants() {
    let graph = generate::prim_graph(30, 11).unwrap();
    let dijkstra_graph = generate::dijkstra_graph(30, 11, &ParallelConfig::new(2)).unwrap();

    for tie_break in [TieBreak::LowestIndex, TieBreak::HighestIndex] {
        let params = SearchParams::starting_at(0).with_tie_break(tie_break);
        assert_parallel_matches::<Prim>(&graph, &params, 30);
        assert_parallel_matches::<Dijkstra>(&dijkstra_graph, &params, 30);
    }
}

#[test]
fn test_sequential_runs_are_deterministic() {
    let system = generate::diagonally_dominant_system(20, 8).unwrap();
    let first = Jacobi::run_sequential(&system, &JacobiParams::default()).unwrap();
    let second = Jacobi::run_sequential(&system, &JacobiParams::default()).unwrap();
    assert_eq!(first, second);

    let graph = generate::floyd_graph(25, 8).unwrap();
    assert_eq!(
        FloydWarshall::run_sequential(&graph, &()).unwrap(),
        FloydWarshall::run_sequential(&graph, &()).unwrap()
    );

    let graph = generate::prim_graph(25, 8).unwrap();
    let params = SearchParams::starting_at(3);
    assert_eq!(
        Prim::run_sequential(&graph, &params).unwrap(),
        Prim::run_sequential(&graph, &params).unwrap()
    );
}

#[test]
fn test_parallel_runs_are_deterministic_for_fixed_workers() {
    let graph = generate::prim_graph(40, 21).unwrap();
    let params = SearchParams::starting_at(0);
    let config = ParallelConfig::new(3).with_backend(Backend::Rayon);

    let first = Prim::run_parallel(&graph, &params, &config).unwrap();
    for _ in 0..5 {
        assert_eq!(first, Prim::run_parallel(&graph, &params, &config).unwrap());
    }
}
