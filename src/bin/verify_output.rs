use std::process;

use parallel_kernels::generate;
use parallel_kernels::implementations::jacobi::{self, JacobiParams};
use parallel_kernels::oracle::Equivalent;
use parallel_kernels::{
    Backend, Dijkstra, FloydWarshall, Jacobi, Kernel, KernelResult, ParallelConfig, Prim, SearchParams,
};

const SIZE: usize = 60;
const SEED: u64 = 2024;
const TOLERANCE: f64 = 1e-9;

/// 逐次版を1回実行し、全バックエンド・全ワーカー数の並列版と照合して結果を表示する
fn check<K>(problem: &K::Problem, params: &K::Params, worker_counts: &[usize]) -> KernelResult<bool>
where
    K: Kernel,
    K::Output: Equivalent,
{
    let baseline = K::run_sequential(problem, params)?;
    let mut all_equal = true;

    for backend in [Backend::Scoped, Backend::Rayon] {
        for &workers in worker_counts {
            let config = ParallelConfig::new(workers).with_backend(backend);
            let out = K::run_parallel(problem, params, &config)?;
            let equal = baseline.equivalent(&out, TOLERANCE);
            all_equal &= equal;
            println!(
                "{} {} ({}, {} workers)",
                if equal { "✓" } else { "✗" },
                K::NAME,
                backend,
                workers
            );
        }
    }
    Ok(all_equal)
}

fn run() -> KernelResult<bool> {
    let worker_counts = [1, 2, 5, SIZE, SIZE + 10];
    let mut ok = true;

    let system = generate::diagonally_dominant_system(SIZE, SEED)?;
    let params = JacobiParams::default();
    ok &= check::<Jacobi>(&system, &params, &worker_counts)?;

    let baseline = jacobi::single::solve(&system, &params)?;
    for &workers in &worker_counts {
        let out = jacobi::barrier::solve(&system, &params, workers)?;
        let equal = baseline.equivalent(&out, TOLERANCE);
        ok &= equal;
        println!(
            "{} jacobi (persistent, {} workers)",
            if equal { "✓" } else { "✗" },
            workers
        );
    }

    let floyd_graph = generate::floyd_graph(SIZE, SEED)?;
    ok &= check::<FloydWarshall>(&floyd_graph, &(), &worker_counts)?;

    let dijkstra_graph = generate::dijkstra_graph(SIZE, SEED, &ParallelConfig::new(4))?;
    ok &= check::<Dijkstra>(&dijkstra_graph, &SearchParams::starting_at(0), &worker_counts)?;

    let prim_graph = generate::prim_graph(SIZE, SEED)?;
    ok &= check::<Prim>(&prim_graph, &SearchParams::starting_at(0), &worker_counts)?;

    Ok(ok)
}

fn main() {
    env_logger::init();

    println!("=== sequential vs parallel output check ===");
    println!("size: {}, seed: {}\n", SIZE, SEED);

    match run() {
        Ok(true) => println!("\nall variants match"),
        Ok(false) => {
            eprintln!("\nmismatch detected");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
