use std::collections::BTreeSet;

use log::{debug, trace};

use crate::error::{invalid, KernelResult};
use crate::guard::{local_min, reduce_min, KeySlots};
use crate::matrix::Graph;
use crate::pool::{ParallelConfig, WorkerPool};

use super::{Kernel, SearchParams};

/// `root` を根とする最小全域木の親配列
///
/// `key[v]` は辺 `(parent[v], v)` の重み。木に到達しなかった頂点は
/// `key = ∞`、`parent = None` のまま
#[derive(Clone, Debug, PartialEq)]
pub struct SpanningTree {
    pub root: usize,
    pub parent: Vec<Option<usize>>,
    pub key: Vec<f64>,
}

impl SpanningTree {
    /// 根に依存しない `(min, max)` 形式の無向辺の集合
    pub fn edges(&self) -> BTreeSet<(usize, usize)> {
        self.parent
            .iter()
            .enumerate()
            .filter_map(|(v, p)| p.map(|u| (u.min(v), u.max(v))))
            .collect()
    }

    pub fn total_weight(&self) -> f64 {
        self.parent
            .iter()
            .zip(&self.key)
            .filter(|(p, _)| p.is_some())
            .map(|(_, k)| k)
            .sum()
    }

    /// 根以外の全頂点に親があるか
    pub fn is_spanning(&self) -> bool {
        self.parent
            .iter()
            .enumerate()
            .all(|(v, p)| v == self.root || p.is_some())
    }
}

fn validate(graph: &Graph<f64>, params: &SearchParams) -> KernelResult<usize> {
    graph.check_vertex(params.start, "start")?;
    let n = graph.vertices();
    let adjacency = graph.adjacency();
    for u in 0..n {
        for v in u..n {
            let w = adjacency[(u, v)];
            if !w.is_finite() {
                return invalid(format!("edge ({u}, {v}) has non-finite weight {w}"));
            }
            if w != adjacency[(v, u)] {
                return invalid(format!("graph is not undirected: ({u}, {v}) differs from ({v}, {u})"));
            }
        }
    }
    Ok(n)
}

pub fn sequential(graph: &Graph<f64>, params: &SearchParams) -> KernelResult<SpanningTree> {
    let n = validate(graph, params)?;
    debug!("prim (single): V={} start={}", n, params.start);

    let mut key = vec![f64::INFINITY; n];
    let mut parent = vec![None; n];
    let mut in_tree = vec![false; n];
    key[params.start] = 0.0;

    for _ in 0..n - 1 {
        let candidates = (0..n)
            .filter(|&v| !in_tree[v] && key[v].is_finite())
            .map(|v| (v, key[v]));
        let Some(frontier) = local_min(candidates, params.tie_break) else {
            break;
        };

        let u = frontier.index;
        in_tree[u] = true;

        for (v, &w) in graph.neighbours(u).iter().enumerate() {
            if w != 0.0 && !in_tree[v] && w < key[v] {
                key[v] = w;
                parent[v] = Some(u);
            }
        }
    }

    Ok(SpanningTree {
        root: params.start,
        parent,
        key,
    })
}

pub fn parallel(graph: &Graph<f64>, params: &SearchParams, config: &ParallelConfig) -> KernelResult<SpanningTree> {
    let n = validate(graph, params)?;
    let pool = WorkerPool::for_problem(n, config)?;
    debug!(
        "prim (parallel): V={} start={} workers={}",
        n,
        params.start,
        pool.workers()
    );

    let slots = KeySlots::new(n, f64::INFINITY);
    let mut in_tree = vec![false; n];
    slots.set_key(params.start, 0.0);

    for round in 0..n - 1 {
        let locals = pool.round(|_, range| {
            let candidates = range
                .filter(|&v| !in_tree[v])
                .map(|v| (v, slots.key(v)))
                .filter(|(_, k)| k.is_finite());
            local_min(candidates, params.tie_break)
        })?;

        let Some(frontier) = reduce_min(locals, params.tie_break) else {
            trace!("prim: graph disconnected, stopping after {} rounds", round);
            break;
        };

        let u = frontier.index;
        in_tree[u] = true;
        let edges = graph.neighbours(u);
        let in_tree = &in_tree;

        // キーと親の更新は頂点ごとのロックで保護する
        pool.round(|_, range| {
            for v in range {
                let w = edges[v];
                if w != 0.0 && !in_tree[v] {
                    slots.lower(v, w, u);
                }
            }
        })?;
    }

    let (key, parent) = slots.into_parts();
    Ok(SpanningTree {
        root: params.start,
        parent,
        key,
    })
}

pub struct Prim;

impl Kernel for Prim {
    type Problem = Graph<f64>;
    type Params = SearchParams;
    type Output = SpanningTree;

    const NAME: &'static str = "prim";

    fn run_sequential(problem: &Graph<f64>, params: &SearchParams) -> KernelResult<SpanningTree> {
        sequential(problem, params)
    }

    fn run_parallel(
        problem: &Graph<f64>,
        params: &SearchParams,
        config: &ParallelConfig,
    ) -> KernelResult<SpanningTree> {
        parallel(problem, params, config)
    }
}
