use std::mem;

use log::{debug, trace};

use crate::error::KernelResult;

use super::{relax_row, step_error, JacobiParams, JacobiSolution, LinearSystem};

pub fn solve(system: &LinearSystem, params: &JacobiParams) -> KernelResult<JacobiSolution> {
    let n = system.validate()?;
    params.validate()?;
    debug!("jacobi (single): n={}", n);

    let mut x_old = vec![0.0; n];
    let mut x_new = vec![0.0; n];
    let mut error = f64::INFINITY;
    let mut iterations = 0;

    while iterations < params.max_iterations {
        for i in 0..n {
            x_new[i] = relax_row(system.a.row(i), system.b[i], i, &x_old);
        }

        error = step_error(&x_new, &x_old);
        iterations += 1;
        trace!("jacobi iteration {}: error {:e}", iterations, error);

        // 最新の解は常に x_old 側に置く
        mem::swap(&mut x_old, &mut x_new);

        if error < params.tolerance {
            break;
        }
    }

    Ok(JacobiSolution::finish(x_old, iterations, error, params))
}
