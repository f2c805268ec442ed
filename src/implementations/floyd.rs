use std::fmt;

use log::{debug, trace};

use crate::error::KernelResult;
use crate::matrix::{Matrix, INF};
use crate::pool::{ParallelConfig, WorkerPool};

use super::Kernel;

/*
  Floyd–Warshall 全点対最短路

  入力: n×n の重み行列（辺なし = INF、対角は通常 0）
  k ラウンド目: dist[i][j] = min(dist[i][j], dist[i][k] + dist[k][j])
  どちらかが INF の場合は更新しない（オーバーフロー防止）

  並列版は行 i で分割。k 行目はラウンド k 中に変化しないので、
  ラウンド開始前に pivot バッファへコピーして全ワーカーで共有する。
*/

/// 全点対の距離行列。到達不能な組は `INF`
#[derive(Clone, Debug, PartialEq)]
pub struct ShortestPaths {
    dist: Matrix<u64>,
}

impl ShortestPaths {
    pub fn distance(&self, from: usize, to: usize) -> Option<u64> {
        let d = self.dist[(from, to)];
        (d != INF).then_some(d)
    }

    pub fn matrix(&self) -> &Matrix<u64> {
        &self.dist
    }
}

impl fmt::Display for ShortestPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.dist.rows() {
            for &d in self.dist.row(i) {
                if d == INF {
                    write!(f, "{:>6}", "INF")?;
                } else {
                    write!(f, "{d:>6}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[inline]
fn relax_row(row: &mut [u64], d_ik: u64, pivot: &[u64]) {
    if d_ik == INF {
        return;
    }
    for (d_ij, &d_kj) in row.iter_mut().zip(pivot) {
        if d_kj == INF {
            continue;
        }
        if let Some(via) = d_ik.checked_add(d_kj) {
            if via < *d_ij {
                *d_ij = via;
            }
        }
    }
}

pub fn sequential(graph: &Matrix<u64>) -> KernelResult<ShortestPaths> {
    let n = graph.require_square("distance matrix")?;
    debug!("floyd (single): n={}", n);

    let mut dist = graph.clone();
    for k in 0..n {
        for i in 0..n {
            let d_ik = dist[(i, k)];
            if d_ik == INF {
                continue;
            }
            for j in 0..n {
                let d_kj = dist[(k, j)];
                if d_kj == INF {
                    continue;
                }
                if let Some(via) = d_ik.checked_add(d_kj) {
                    if via < dist[(i, j)] {
                        dist[(i, j)] = via;
                    }
                }
            }
        }
    }

    Ok(ShortestPaths { dist })
}

pub fn parallel(graph: &Matrix<u64>, config: &ParallelConfig) -> KernelResult<ShortestPaths> {
    let n = graph.require_square("distance matrix")?;
    let pool = WorkerPool::for_problem(n, config)?;
    debug!("floyd (parallel): n={} workers={}", n, pool.workers());

    let mut dist = graph.clone();
    let mut pivot = vec![INF; n];

    for k in 0..n {
        pivot.copy_from_slice(dist.row(k));
        let pivot = &pivot;

        pool.round_mut(dist.as_mut_slice(), n, |_, _, rows| {
            for row in rows.chunks_mut(n) {
                let d_ik = row[k];
                relax_row(row, d_ik, pivot);
            }
        })?;
        trace!("floyd round {} done", k);
    }

    Ok(ShortestPaths { dist })
}

pub struct FloydWarshall;

impl Kernel for FloydWarshall {
    type Problem = Matrix<u64>;
    type Params = ();
    type Output = ShortestPaths;

    const NAME: &'static str = "floyd";

    fn run_sequential(problem: &Matrix<u64>, _: &()) -> KernelResult<ShortestPaths> {
        sequential(problem)
    }

    fn run_parallel(problem: &Matrix<u64>, _: &(), config: &ParallelConfig) -> KernelResult<ShortestPaths> {
        parallel(problem, config)
    }
}
