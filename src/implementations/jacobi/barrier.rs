use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Barrier, Mutex, PoisonError};
use std::thread;

use log::{debug, trace};

use crate::error::{KernelError, KernelResult};
use crate::guard::AtomicF64;
use crate::partition::partition;
use crate::pool::worker_failure;

use super::{relax_row, JacobiParams, JacobiSolution, LinearSystem};

/*
  常駐ワーカー + Barrier 版

  ワーカーは解の計算が終わるまで生き続け、1反復ごとに2回バリアで同期する。
  1. 自分の行を計算して書き込み先バッファへ書く
  2. バリア: 全員の書き込み完了を待つ（リーダーが収束判定）
  3. バリア: 判定結果を全員が読んでから次の反復へ
  2つのバッファは反復の偶奇で読み取り元/書き込み先を入れ替える。
*/

struct Progress {
    iterations: usize,
    error: f64,
    failure: Option<KernelError>,
}

pub fn solve(system: &LinearSystem, params: &JacobiParams, workers: usize) -> KernelResult<JacobiSolution> {
    solve_with(system, params, workers, |_, _| {})
}

/// `before_rows(worker, iteration)` は各反復で自分の行を計算する直前に呼ばれる
fn solve_with<H>(
    system: &LinearSystem,
    params: &JacobiParams,
    workers: usize,
    before_rows: H,
) -> KernelResult<JacobiSolution>
where
    H: Fn(usize, usize) + Sync,
{
    let n = system.validate()?;
    params.validate()?;
    let plan = partition(n, workers)?;
    debug!("jacobi (persistent): n={} workers={}", n, plan.workers());

    let buffers: [Vec<AtomicF64>; 2] = [
        (0..n).map(|_| AtomicF64::new(0.0)).collect(),
        (0..n).map(|_| AtomicF64::new(0.0)).collect(),
    ];
    let barrier = Barrier::new(plan.workers());
    let done = AtomicBool::new(false);
    let progress = Mutex::new(Progress {
        iterations: 0,
        error: f64::INFINITY,
        failure: None,
    });

    thread::scope(|scope| {
        for (worker, rows) in plan.ranges().iter().cloned().enumerate() {
            let (buffers, barrier, done, progress) = (&buffers, &barrier, &done, &progress);
            let before_rows = &before_rows;

            scope.spawn(move || {
                let mut snapshot = Vec::with_capacity(n);

                for iteration in 0..params.max_iterations {
                    let (src, dst) = if iteration % 2 == 0 {
                        (&buffers[0], &buffers[1])
                    } else {
                        (&buffers[1], &buffers[0])
                    };

                    let computed = panic::catch_unwind(AssertUnwindSafe(|| {
                        before_rows(worker, iteration);
                        snapshot.clear();
                        snapshot.extend(src.iter().map(AtomicF64::load));
                        for i in rows.clone() {
                            dst[i].store(relax_row(system.a.row(i), system.b[i], i, &snapshot));
                        }
                    }));

                    if let Err(payload) = computed {
                        let failure = worker_failure(worker, rows.clone(), payload);
                        let mut state = progress.lock().unwrap_or_else(PoisonError::into_inner);
                        let replace = match &state.failure {
                            Some(KernelError::WorkerFailure { worker: w, .. }) => worker < *w,
                            _ => true,
                        };
                        if replace {
                            state.failure = Some(failure);
                        }
                    }

                    // バリア: 全ワーカーの書き込み完了を待つ
                    if barrier.wait().is_leader() {
                        let mut state = progress.lock().unwrap_or_else(PoisonError::into_inner);
                        state.iterations = iteration + 1;
                        if state.failure.is_some() {
                            done.store(true, Ordering::Relaxed);
                        } else {
                            state.error = src
                                .iter()
                                .zip(dst.iter())
                                .map(|(old, new)| (new.load() - old.load()).abs())
                                .sum();
                            trace!("jacobi iteration {}: error {:e}", state.iterations, state.error);
                            if state.error < params.tolerance {
                                done.store(true, Ordering::Relaxed);
                            }
                        }
                    }

                    // バリア: 判定結果の公開
                    barrier.wait();
                    if done.load(Ordering::Relaxed) {
                        break;
                    }
                }
            });
        }
    });

    let state = progress.into_inner().unwrap_or_else(PoisonError::into_inner);
    if let Some(failure) = state.failure {
        return Err(failure);
    }

    // 最後に書き込んだのは反復回数が奇数なら buffers[1]
    let latest = if state.iterations % 2 == 1 {
        &buffers[1]
    } else {
        &buffers[0]
    };
    let x = latest.iter().map(AtomicF64::load).collect();
    Ok(JacobiSolution::finish(x, state.iterations, state.error, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate;

    #[test]
    fn failing_workers_report_lowest_index() {
        let system = generate::diagonally_dominant_system(8, 1).unwrap();
        let params = JacobiParams::default();

        // ワーカー 1 と 3 が 2 反復目で失敗する
        let result = solve_with(&system, &params, 4, |worker, iteration| {
            if iteration == 2 && worker % 2 == 1 {
                panic!("row failure in worker {}", worker);
            }
        });

        match result {
            Err(KernelError::WorkerFailure {
                worker,
                range,
                message,
            }) => {
                assert_eq!(worker, 1);
                assert_eq!(range, 2..4);
                assert_eq!(message, "row failure in worker 1");
            }
            other => panic!("expected WorkerFailure, got {:?}", other),
        }
    }

    #[test]
    fn failure_in_first_iteration_stops_all_workers() {
        let system = generate::diagonally_dominant_system(5, 9).unwrap();
        let result = solve_with(&system, &JacobiParams::default(), 5, |worker, _| {
            if worker == 4 {
                panic!("boom");
            }
        });
        assert!(matches!(result, Err(KernelError::WorkerFailure { worker: 4, .. })));
    }
}
