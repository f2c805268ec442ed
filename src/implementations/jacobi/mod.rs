pub mod barrier;
pub mod parallel;
pub mod single;

use crate::error::{invalid, KernelResult};
use crate::matrix::Matrix;
use crate::pool::ParallelConfig;

use super::Kernel;

pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// `A·x = b`（A は正方で対角成分が正）
#[derive(Clone, Debug, PartialEq)]
pub struct LinearSystem {
    pub a: Matrix<f64>,
    pub b: Vec<f64>,
}

impl LinearSystem {
    pub fn new(a: Matrix<f64>, b: Vec<f64>) -> KernelResult<Self> {
        let system = LinearSystem { a, b };
        system.validate()?;
        Ok(system)
    }

    /// ワーカーを起動する前に検査する
    pub(crate) fn validate(&self) -> KernelResult<usize> {
        let n = self.a.require_square("coefficient matrix")?;
        if self.b.len() != n {
            return invalid(format!(
                "right-hand side has {} entries, expected {}",
                self.b.len(),
                n
            ));
        }
        for i in 0..n {
            let d = self.a[(i, i)];
            if d.is_nan() || d <= 0.0 || d.is_infinite() {
                return invalid(format!("diagonal entry {i} is {d}, expected a positive finite value"));
            }
        }
        Ok(n)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JacobiParams {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for JacobiParams {
    fn default() -> Self {
        JacobiParams {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl JacobiParams {
    pub(crate) fn validate(&self) -> KernelResult<()> {
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1");
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return invalid(format!("tolerance must be positive, got {}", self.tolerance));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JacobiStatus {
    Converged,
    /// `max_iterations` に到達。最後の反復結果はそのまま返す
    Exhausted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JacobiSolution {
    pub x: Vec<f64>,
    pub iterations: usize,
    /// `Σ|x_new − x_old|` of the final iteration.
    pub error: f64,
    pub status: JacobiStatus,
}

impl JacobiSolution {
    pub fn is_converged(&self) -> bool {
        self.status == JacobiStatus::Converged
    }

    pub(crate) fn finish(x: Vec<f64>, iterations: usize, error: f64, params: &JacobiParams) -> Self {
        let status = if error < params.tolerance {
            JacobiStatus::Converged
        } else {
            JacobiStatus::Exhausted
        };
        log::debug!("jacobi: {:?} after {} iterations (error {:e})", status, iterations, error);
        JacobiSolution {
            x,
            iterations,
            error,
            status,
        }
    }
}

/// `x_new[i] = (b[i] − Σ_{j≠i} A[i][j]·x_old[j]) / A[i][i]`
#[inline]
pub(crate) fn relax_row(a_row: &[f64], b_i: f64, i: usize, x_old: &[f64]) -> f64 {
    let mut sigma = 0.0;
    for (j, (&a_ij, &x_j)) in a_row.iter().zip(x_old).enumerate() {
        if j != i {
            sigma += a_ij * x_j;
        }
    }
    (b_i - sigma) / a_row[i]
}

/// 添字順に足し合わせるので、どの版でも同じ値になる
pub(crate) fn step_error(x_new: &[f64], x_old: &[f64]) -> f64 {
    x_new.iter().zip(x_old).map(|(n, o)| (n - o).abs()).sum()
}

pub struct Jacobi;

impl Kernel for Jacobi {
    type Problem = LinearSystem;
    type Params = JacobiParams;
    type Output = JacobiSolution;

    const NAME: &'static str = "jacobi";

    fn run_sequential(problem: &LinearSystem, params: &JacobiParams) -> KernelResult<JacobiSolution> {
        single::solve(problem, params)
    }

    fn run_parallel(
        problem: &LinearSystem,
        params: &JacobiParams,
        config: &ParallelConfig,
    ) -> KernelResult<JacobiSolution> {
        parallel::solve(problem, params, config)
    }
}
