use std::any::Any;
use std::fmt;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::thread;

use log::{debug, trace};
use rayon::prelude::*;

use crate::error::{invalid, KernelError, KernelResult};
use crate::partition::{partition, PartitionPlan};

/*
  Fork/join ラウンド実行器

  1ラウンド = 各ワーカーに1つの範囲を割り当てて同時実行し、全員の完了を待つ。
  - Scoped: ラウンドごとに thread::scope でスレッドを生成して join
  - Rayon : 実行ごとにスレッド数固定の ThreadPool を1つ作り、全ラウンドで再利用

  タスク内の panic はワーカー単位で捕捉し、全タスクの join 後に
  最小インデックスのワーカーの失敗を WorkerFailure として返す。
*/

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Scoped,
    Rayon,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Scoped => f.write_str("scoped"),
            Backend::Rayon => f.write_str("rayon"),
        }
    }
}

impl FromStr for Backend {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scoped" | "threads" => Ok(Backend::Scoped),
            "rayon" => Ok(Backend::Rayon),
            other => invalid(format!("unknown backend `{other}`")),
        }
    }
}

/// 1回のカーネル実行に要求する並列度
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelConfig {
    pub workers: usize,
    pub backend: Backend,
}

impl ParallelConfig {
    pub fn new(workers: usize) -> Self {
        ParallelConfig {
            workers,
            backend: Backend::default(),
        }
    }

    pub fn with_backend(self, backend: Backend) -> Self {
        ParallelConfig { backend, ..self }
    }
}

enum Engine {
    Scoped,
    Rayon(rayon::ThreadPool),
}

/// 固定の分割計画の上で、バリア同期されたラウンドを実行する
pub struct WorkerPool {
    plan: PartitionPlan,
    engine: Engine,
}

impl WorkerPool {
    pub fn new(plan: PartitionPlan, backend: Backend) -> KernelResult<Self> {
        let engine = match backend {
            Backend::Scoped => Engine::Scoped,
            Backend::Rayon => Engine::Rayon(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(plan.workers().max(1))
                    .build()?,
            ),
        };
        debug!(
            "worker pool: {} items over {} workers ({})",
            plan.total(),
            plan.workers(),
            backend
        );
        Ok(WorkerPool { plan, engine })
    }

    /// `total` 個の要素を `config` に従って分割し、プールを作る
    pub fn for_problem(total: usize, config: &ParallelConfig) -> KernelResult<Self> {
        let plan = partition(total, config.workers)?;
        WorkerPool::new(plan, config.backend)
    }

    pub fn workers(&self) -> usize {
        self.plan.workers()
    }

    /// 全ワーカーが共有状態を読むだけのラウンド
    ///
    /// 全タスクの join 後、ワーカー順に各ワーカーの結果を返す
    pub fn round<R, F>(&self, task: F) -> KernelResult<Vec<R>>
    where
        R: Send,
        F: Fn(usize, Range<usize>) -> R + Sync,
    {
        let jobs = self
            .plan
            .ranges()
            .iter()
            .cloned()
            .enumerate()
            .map(|(worker, range)| (worker, range, ()))
            .collect();
        self.dispatch(jobs, |worker, range, ()| task(worker, range))
    }

    /// 各ワーカーが `out` の自分の行だけを排他的に書き換えるラウンド
    ///
    /// `out` は `stride` 要素 × `plan.total()` 行。
    /// ワーカーに渡るスライスは担当範囲の先頭行から始まる
    pub fn round_mut<T, R, F>(&self, out: &mut [T], stride: usize, task: F) -> KernelResult<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(usize, Range<usize>, &mut [T]) -> R + Sync,
    {
        if out.len() != self.plan.total() * stride {
            return invalid(format!(
                "output buffer of {} cells does not match {} rows of stride {}",
                out.len(),
                self.plan.total(),
                stride
            ));
        }

        let mut jobs = Vec::with_capacity(self.plan.workers());
        let mut rest = out;
        for (worker, range) in self.plan.ranges().iter().enumerate() {
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * stride);
            jobs.push((worker, range.clone(), chunk));
            rest = tail;
        }
        self.dispatch(jobs, task)
    }

    fn dispatch<P, R, F>(&self, jobs: Vec<(usize, Range<usize>, P)>, task: F) -> KernelResult<Vec<R>>
    where
        P: Send,
        R: Send,
        F: Fn(usize, Range<usize>, P) -> R + Sync,
    {
        trace!("round start: {} tasks", jobs.len());
        let task = &task;

        let outcomes: Vec<KernelResult<R>> = match &self.engine {
            Engine::Scoped => thread::scope(|scope| {
                let handles: Vec<_> = jobs
                    .into_iter()
                    .map(|(worker, range, part)| {
                        let owned = range.clone();
                        (worker, owned, scope.spawn(move || task(worker, range, part)))
                    })
                    .collect();

                // 全スレッドの join を待ってから失敗を判定する
                handles
                    .into_iter()
                    .map(|(worker, range, handle)| {
                        handle
                            .join()
                            .map_err(|payload| worker_failure(worker, range, payload))
                    })
                    .collect()
            }),
            Engine::Rayon(pool) => pool.install(|| {
                jobs.into_par_iter()
                    .map(|(worker, range, part)| {
                        let owned = range.clone();
                        panic::catch_unwind(AssertUnwindSafe(|| task(worker, range, part)))
                            .map_err(|payload| worker_failure(worker, owned, payload))
                    })
                    .collect()
            }),
        };

        outcomes.into_iter().collect()
    }
}

pub(crate) fn worker_failure(worker: usize, range: Range<usize>, payload: Box<dyn Any + Send>) -> KernelError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    };
    KernelError::WorkerFailure {
        worker,
        range,
        message,
    }
}
