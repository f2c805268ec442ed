//! ベンチマークとテスト用の、シード付き乱数による問題生成

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{invalid, KernelResult};
use crate::implementations::jacobi::LinearSystem;
use crate::matrix::{Graph, Matrix, INF};
use crate::pool::{ParallelConfig, WorkerPool};

fn require_size(n: usize) -> KernelResult<()> {
    if n == 0 {
        return invalid("problem size must be at least 1");
    }
    Ok(())
}

/// 整数値の狭義対角優位な連立方程式
///
/// 非対角成分は 0..=9、対角成分は行の和 + 1..=10、右辺は 0..=9
pub fn diagonally_dominant_system(n: usize, seed: u64) -> KernelResult<LinearSystem> {
    require_size(n)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut a = Matrix::filled(n, n, 0.0);

    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..n {
            if i != j {
                let v = f64::from(rng.gen_range(0..10u32));
                a[(i, j)] = v;
                sum += v;
            }
        }
        a[(i, i)] = sum + f64::from(rng.gen_range(1..=10u32));
    }

    let b = (0..n).map(|_| f64::from(rng.gen_range(0..10u32))).collect();
    LinearSystem::new(a, b)
}

/// Directed graph for Floyd–Warshall: 20% edge density, weights 1..=10,
/// 辺なしは `INF`、対角は 0
pub fn floyd_graph(n: usize, seed: u64) -> KernelResult<Matrix<u64>> {
    require_size(n)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut graph = Matrix::filled(n, n, INF);

    for i in 0..n {
        for j in 0..n {
            graph[(i, j)] = if i == j {
                0
            } else if rng.gen_bool(0.2) {
                rng.gen_range(1..=10)
            } else {
                INF
            };
        }
    }
    Ok(graph)
}

/// Dijkstra 用の有向グラフ: 辺の密度 50%、重み 1..=10、0 = 辺なし
///
/// 行は並列に生成する。ワーカー `w` は `seed + w` で初期化した自分専用の
/// 乱数生成器を使うので、生成結果はワーカー数に依存する
pub fn dijkstra_graph(n: usize, seed: u64, config: &ParallelConfig) -> KernelResult<Graph<u64>> {
    require_size(n)?;
    let pool = WorkerPool::for_problem(n, config)?;
    let mut adjacency = Matrix::filled(n, n, 0u64);

    pool.round_mut(adjacency.as_mut_slice(), n, |worker, rows, cells| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(worker as u64));
        for (i, row) in rows.zip(cells.chunks_mut(n)) {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = if i != j && rng.gen_bool(0.5) {
                    rng.gen_range(1..=10)
                } else {
                    0
                };
            }
        }
    })?;

    Graph::from_matrix(adjacency)
}

/// Prim 用の連結な無向グラフ: ランダムなハミルトン路に最大 `2n` 本の辺を追加。
/// 重みは `[1, 10)` の一様分布、0 = 辺なし
pub fn prim_graph(n: usize, seed: u64) -> KernelResult<Graph<f64>> {
    require_size(n)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut adjacency = Matrix::filled(n, n, 0.0);

    let mut nodes: Vec<usize> = (0..n).collect();
    nodes.shuffle(&mut rng);
    for pair in nodes.windows(2) {
        let (u, v) = (pair[0], pair[1]);
        let w = rng.gen_range(1.0..10.0);
        adjacency[(u, v)] = w;
        adjacency[(v, u)] = w;
    }

    for _ in 0..n * 2 {
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        if u != v && adjacency[(u, v)] == 0.0 {
            let w = rng.gen_range(1.0..10.0);
            adjacency[(u, v)] = w;
            adjacency[(v, u)] = w;
        }
    }

    Graph::from_matrix(adjacency)
}
