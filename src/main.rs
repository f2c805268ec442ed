use std::process;

use clap::{Parser, Subcommand};
use log::info;

use parallel_kernels::bench::{compare, compare_with, measure, BenchOptions, Comparison};
use parallel_kernels::generate;
use parallel_kernels::guard::TieBreak;
use parallel_kernels::implementations::floyd;
use parallel_kernels::implementations::jacobi::{self, JacobiParams};
use parallel_kernels::{Backend, Dijkstra, Jacobi, KernelResult, ParallelConfig, Prim, SearchParams};

#[derive(Parser, Debug)]
#[command(
    name = "parallel-kernels",
    about = "Sequential vs parallel benchmarks of Jacobi, Floyd–Warshall, Dijkstra and Prim"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// 行列の行数 / グラフの頂点数
    #[arg(short = 'n', long, global = true, default_value_t = 500)]
    size: usize,

    /// ワーカー数（問題サイズで頭打ち）
    #[arg(short, long, global = true, default_value_t = 2)]
    threads: usize,

    /// scoped | rayon
    #[arg(long, global = true, default_value_t = Backend::Scoped)]
    backend: Backend,

    /// 入力生成のシード（省略時はランダム）
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// 各版の測定回数
    #[arg(long, global = true, default_value_t = 3)]
    samples: usize,

    /// 測定前の空回し回数
    #[arg(long, global = true, default_value_t = 1)]
    warmup: usize,

    #[arg(long, global = true)]
    skip_sequential: bool,

    #[arg(long, global = true)]
    skip_parallel: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 対角優位な連立方程式に対する Jacobi 法
    Jacobi {
        #[arg(long, default_value_t = jacobi::DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
        #[arg(long, default_value_t = jacobi::DEFAULT_TOLERANCE)]
        tolerance: f64,
        /// ワーカーを反復をまたいで常駐させ、バリアで同期する
        #[arg(long)]
        persistent: bool,
    },
    /// Floyd–Warshall 全点対最短路
    Floyd {
        #[arg(long, default_value_t = 0)]
        from: usize,
        #[arg(long, default_value_t = 1)]
        to: usize,
    },
    /// Dijkstra 単一始点最短路
    Dijkstra {
        #[arg(long, default_value_t = 0)]
        source: usize,
        /// 暫定距離が並んだら添字の大きい頂点を選ぶ
        #[arg(long)]
        last_tie_wins: bool,
    },
    /// Prim 最小全域木
    Prim {
        #[arg(long, default_value_t = 0)]
        source: usize,
        #[arg(long)]
        last_tie_wins: bool,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Jacobi { .. } => "Jacobi",
            Command::Floyd { .. } => "Floyd–Warshall",
            Command::Dijkstra { .. } => "Dijkstra",
            Command::Prim { .. } => "Prim",
        }
    }
}

fn tie_break(last_tie_wins: bool) -> TieBreak {
    if last_tie_wins {
        TieBreak::HighestIndex
    } else {
        TieBreak::LowestIndex
    }
}

// これ以下の頂点数なら Floyd の距離行列を表示する
const PRINT_LIMIT: usize = 10;

/// 入力生成にかかった時間を表示してから結果を返す
fn generated<T>(what: &str, f: impl FnOnce() -> KernelResult<T>) -> KernelResult<T> {
    let (elapsed, input) = measure(f);
    let input = input?;
    println!("{} generated in {:.3} ms", what, elapsed.as_secs_f64() * 1e3);
    Ok(input)
}

fn print_samples(comparison: &Comparison) {
    if let Some(s) = &comparison.sequential {
        println!("Sequential ({} runs):\n{}\n", s.len(), s);
    }
    if let Some(p) = &comparison.parallel {
        println!("Parallel ({} runs):\n{}\n", p.len(), p);
    }
}

fn run(cli: Cli) -> KernelResult<()> {
    let seed = cli.seed.unwrap_or_else(rand::random);
    let config = ParallelConfig::new(cli.threads).with_backend(cli.backend);
    let mut options = BenchOptions {
        warmup: cli.warmup,
        samples: cli.samples,
        run_sequential: !cli.skip_sequential,
        run_parallel: !cli.skip_parallel,
        ..BenchOptions::default()
    };
    let n = cli.size;
    let threads = cli.threads;

    println!("=== {} benchmark ===", cli.command.name());
    println!(
        "size: {}, threads: {}, backend: {}, seed: {}, samples: {}\n",
        n, threads, cli.backend, seed, cli.samples
    );

    let comparison = match cli.command {
        Command::Jacobi {
            max_iterations,
            tolerance,
            persistent,
        } => {
            info!("generating {}x{} diagonally dominant system", n, n);
            let system = generated("System", || generate::diagonally_dominant_system(n, seed))?;
            let params = JacobiParams {
                max_iterations,
                tolerance,
            };
            options.tolerance = tolerance;

            if persistent {
                compare_with(
                    "jacobi (persistent)",
                    n,
                    threads,
                    &options,
                    || jacobi::single::solve(&system, &params),
                    || jacobi::barrier::solve(&system, &params, threads),
                )?
            } else {
                compare::<Jacobi>(&system, &params, n, &config, &options)?
            }
        }
        Command::Floyd { from, to } => {
            if from >= n || to >= n {
                eprintln!("error: --from and --to must be between 0 and {}", n.saturating_sub(1));
                process::exit(1);
            }
            info!("generating floyd graph with {} vertices", n);
            let graph = generated("Graph", || generate::floyd_graph(n, seed))?;

            let mut sequential_path = None;
            let mut parallel_path = None;
            let mut small_result = None;
            let comparison = compare_with(
                "floyd",
                n,
                threads,
                &options,
                || {
                    let paths = floyd::sequential(&graph)?;
                    sequential_path = Some(paths.distance(from, to));
                    if n <= PRINT_LIMIT && small_result.is_none() {
                        small_result = Some(paths.clone());
                    }
                    Ok(paths)
                },
                || {
                    let paths = floyd::parallel(&graph, &config)?;
                    parallel_path = Some(paths.distance(from, to));
                    Ok(paths)
                },
            )?;

            for (label, path) in [("sequential", sequential_path), ("parallel", parallel_path)] {
                match path {
                    Some(Some(d)) => println!("Shortest path {} -> {} ({}): {}", from, to, label, d),
                    Some(None) => println!("Shortest path {} -> {} ({}): unreachable", from, to, label),
                    None => {}
                }
            }
            println!();
            if let Some(paths) = &small_result {
                println!("Distance matrix:\n{}", paths);
            }
            comparison
        }
        Command::Dijkstra {
            source,
            last_tie_wins,
        } => {
            info!("generating dijkstra graph with {} vertices", n);
            let graph = generated("Graph", || generate::dijkstra_graph(n, seed, &config))?;
            println!("Source node: {}\n", source);
            let params = SearchParams::starting_at(source).with_tie_break(tie_break(last_tie_wins));
            compare::<Dijkstra>(&graph, &params, n, &config, &options)?
        }
        Command::Prim {
            source,
            last_tie_wins,
        } => {
            info!("generating prim graph with {} vertices", n);
            let graph = generated("Graph", || generate::prim_graph(n, seed))?;
            println!("Source node: {}\n", source);
            let params = SearchParams::starting_at(source).with_tie_break(tie_break(last_tie_wins));
            compare::<Prim>(&graph, &params, n, &config, &options)?
        }
    };

    print_samples(&comparison);
    println!("{comparison}");
    println!("=== done ===");
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if cli.threads < 1 {
        eprintln!("error: --threads must be at least 1");
        process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
