pub mod dijkstra;
pub mod floyd;
pub mod jacobi;
pub mod prim;

use crate::error::KernelResult;
use crate::guard::TieBreak;
use crate::pool::ParallelConfig;

pub use dijkstra::Dijkstra;
pub use floyd::FloydWarshall;
pub use jacobi::Jacobi;
pub use prim::Prim;

/// 同じ問題に対する逐次版と並列版
///
/// 両者の出力は等価性オラクルで一致と判定されなければならない
pub trait Kernel {
    type Problem;
    type Params;
    type Output;

    const NAME: &'static str;

    fn run_sequential(problem: &Self::Problem, params: &Self::Params) -> KernelResult<Self::Output>;

    fn run_parallel(
        problem: &Self::Problem,
        params: &Self::Params,
        config: &ParallelConfig,
    ) -> KernelResult<Self::Output>;
}

/// Dijkstra / Prim の始点と、最小値が並んだときの選び方
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub start: usize,
    pub tie_break: TieBreak,
}

impl SearchParams {
    pub fn starting_at(start: usize) -> Self {
        SearchParams {
            start,
            tie_break: TieBreak::default(),
        }
    }

    pub fn with_tie_break(self, tie_break: TieBreak) -> Self {
        SearchParams { tie_break, ..self }
    }
}
