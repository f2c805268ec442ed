use std::mem;

use log::{debug, trace};

use crate::error::KernelResult;
use crate::pool::{ParallelConfig, WorkerPool};

use super::{relax_row, step_error, JacobiParams, JacobiSolution, LinearSystem};

/*
  行分割による fork/join 版

  - 各ワーカーは x_old（凍結済み）を読むだけで、x_new の自分の行だけに書き込む
  - round_mut が x_new を行範囲ごとの &mut スライスに分割するのでロック不要
  - ラウンド終了（全ワーカーの join）がバリアの役割を果たす
  - 収束判定は join 後に逐次で計算するので逐次版と同じビット列になる
*/

pub fn solve(
    system: &LinearSystem,
    params: &JacobiParams,
    config: &ParallelConfig,
) -> KernelResult<JacobiSolution> {
    let n = system.validate()?;
    params.validate()?;

    let pool = WorkerPool::for_problem(n, config)?;
    debug!("jacobi (parallel): n={} workers={}", n, pool.workers());

    let mut x_old = vec![0.0; n];
    let mut x_new = vec![0.0; n];
    let mut error = f64::INFINITY;
    let mut iterations = 0;

    while iterations < params.max_iterations {
        let snapshot = &x_old;
        pool.round_mut(&mut x_new, 1, |_, rows, out| {
            for (slot, i) in out.iter_mut().zip(rows) {
                *slot = relax_row(system.a.row(i), system.b[i], i, snapshot);
            }
        })?;

        error = step_error(&x_new, &x_old);
        iterations += 1;
        trace!("jacobi iteration {}: error {:e}", iterations, error);

        mem::swap(&mut x_old, &mut x_new);

        if error < params.tolerance {
            break;
        }
    }

    Ok(JacobiSolution::finish(x_old, iterations, error, params))
}
