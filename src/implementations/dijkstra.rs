use log::{debug, trace};

use crate::error::KernelResult;
use crate::guard::{local_min, reduce_min, AtomicDistances};
use crate::matrix::{Graph, INF};
use crate::pool::{ParallelConfig, WorkerPool};

use super::{Kernel, SearchParams};

/*
  Dijkstra 単一始点最短路（隣接行列、0 = 辺なし）

  各ラウンド:
  1. 未確定かつ到達可能な頂点から最小距離の頂点 u を選ぶ
     （並列版: 範囲ごとの局所最小 → join 後に逐次リダクション）
  2. u を確定
  3. u から出る辺で残りの頂点を緩和
     （並列版: 範囲分割 + AtomicU64::fetch_min による比較更新）
  最小探索で候補がなければ早期終了。
*/

pub fn sequential(graph: &Graph<u64>, params: &SearchParams) -> KernelResult<Vec<u64>> {
    graph.check_vertex(params.start, "source")?;
    let v_count = graph.vertices();
    debug!("dijkstra (single): V={} source={}", v_count, params.start);

    let mut dist = vec![INF; v_count];
    let mut finalized = vec![false; v_count];
    dist[params.start] = 0;

    for _ in 0..v_count - 1 {
        let candidates = (0..v_count)
            .filter(|&v| !finalized[v] && dist[v] != INF)
            .map(|v| (v, dist[v]));
        let Some(frontier) = local_min(candidates, params.tie_break) else {
            break;
        };

        let u = frontier.index;
        finalized[u] = true;

        for (v, &w) in graph.neighbours(u).iter().enumerate() {
            if finalized[v] || w == 0 {
                continue;
            }
            if let Some(candidate) = frontier.value.checked_add(w) {
                if candidate < dist[v] {
                    dist[v] = candidate;
                }
            }
        }
    }

    Ok(dist)
}

pub fn parallel(graph: &Graph<u64>, params: &SearchParams, config: &ParallelConfig) -> KernelResult<Vec<u64>> {
    graph.check_vertex(params.start, "source")?;
    let v_count = graph.vertices();
    let pool = WorkerPool::for_problem(v_count, config)?;
    debug!(
        "dijkstra (parallel): V={} source={} workers={}",
        v_count,
        params.start,
        pool.workers()
    );

    let dist = AtomicDistances::new(v_count, INF);
    let mut finalized = vec![false; v_count];
    dist.set(params.start, 0);

    for round in 0..v_count - 1 {
        let locals = pool.round(|_, range| {
            let candidates = range
                .filter(|&v| !finalized[v])
                .map(|v| (v, dist.get(v)))
                .filter(|&(_, d)| d != INF);
            local_min(candidates, params.tie_break)
        })?;

        // 最小値の確定は全ワーカーの join 後に行う
        let Some(frontier) = reduce_min(locals, params.tie_break) else {
            trace!("dijkstra: no reachable vertex left after {} rounds", round);
            break;
        };

        let u = frontier.index;
        finalized[u] = true;
        let edges = graph.neighbours(u);
        let finalized = &finalized;

        pool.round(|_, range| {
            for v in range {
                let w = edges[v];
                if finalized[v] || w == 0 {
                    continue;
                }
                if let Some(candidate) = frontier.value.checked_add(w) {
                    dist.relax(v, candidate);
                }
            }
        })?;
    }

    Ok(dist.into_vec())
}

pub struct Dijkstra;

impl Kernel for Dijkstra {
    type Problem = Graph<u64>;
    type Params = SearchParams;
    type Output = Vec<u64>;

    const NAME: &'static str = "dijkstra";

    fn run_sequential(problem: &Graph<u64>, params: &SearchParams) -> KernelResult<Vec<u64>> {
        sequential(problem, params)
    }

    fn run_parallel(problem: &Graph<u64>, params: &SearchParams, config: &ParallelConfig) -> KernelResult<Vec<u64>> {
        parallel(problem, params, config)
    }
}
