//! 等価性オラクル: 並列版の出力が逐次版と同じかを判定する
//!
//! 整数の結果（Floyd–Warshall の距離、Dijkstra の距離）は完全一致で比較し、
//! 許容誤差は無視する。浮動小数点の結果は要素ごとに `tolerance` 以内なら一致とし、
//! 同符号の無限大同士も一致とみなす。

use log::debug;

use crate::implementations::floyd::ShortestPaths;
use crate::implementations::jacobi::JacobiSolution;
use crate::implementations::prim::SpanningTree;
use crate::matrix::Matrix;

pub trait Equivalent {
    fn equivalent(&self, other: &Self, tolerance: f64) -> bool;
}

pub fn equal<T: Equivalent + ?Sized>(a: &T, b: &T, tolerance: f64) -> bool {
    a.equivalent(b, tolerance)
}

fn close(a: f64, b: f64, tolerance: f64) -> bool {
    a == b || (a - b).abs() <= tolerance
}

impl Equivalent for [f64] {
    fn equivalent(&self, other: &Self, tolerance: f64) -> bool {
        if self.len() != other.len() {
            debug!("length mismatch: {} vs {}", self.len(), other.len());
            return false;
        }
        match self
            .iter()
            .zip(other)
            .position(|(&a, &b)| !close(a, b, tolerance))
        {
            Some(i) => {
                debug!(
                    "mismatch at index {}: {} vs {} (diff: {})",
                    i,
                    self[i],
                    other[i],
                    (self[i] - other[i]).abs()
                );
                false
            }
            None => true,
        }
    }
}

impl Equivalent for [u64] {
    fn equivalent(&self, other: &Self, _tolerance: f64) -> bool {
        if self.len() != other.len() {
            debug!("length mismatch: {} vs {}", self.len(), other.len());
            return false;
        }
        match self.iter().zip(other).position(|(a, b)| a != b) {
            Some(i) => {
                debug!("mismatch at index {}: {} vs {}", i, self[i], other[i]);
                false
            }
            None => true,
        }
    }
}

impl<T> Equivalent for Vec<T>
where
    [T]: Equivalent,
{
    fn equivalent(&self, other: &Self, tolerance: f64) -> bool {
        self.as_slice().equivalent(other.as_slice(), tolerance)
    }
}

impl<T> Equivalent for Matrix<T>
where
    [T]: Equivalent,
{
    fn equivalent(&self, other: &Self, tolerance: f64) -> bool {
        self.rows() == other.rows()
            && self.cols() == other.cols()
            && self.as_slice().equivalent(other.as_slice(), tolerance)
    }
}

impl Equivalent for ShortestPaths {
    fn equivalent(&self, other: &Self, tolerance: f64) -> bool {
        self.matrix().equivalent(other.matrix(), tolerance)
    }
}

/// 解ベクトルと終了状態（収束 / 反復上限）を比較する。反復回数は比較しない
impl Equivalent for JacobiSolution {
    fn equivalent(&self, other: &Self, tolerance: f64) -> bool {
        if self.status != other.status {
            debug!("jacobi status mismatch: {:?} vs {:?}", self.status, other.status);
            return false;
        }
        self.x.equivalent(&other.x, tolerance)
    }
}

/// 無向辺の集合が同じで、総重みが一致すれば等価（根の違いは許容）
impl Equivalent for SpanningTree {
    fn equivalent(&self, other: &Self, tolerance: f64) -> bool {
        if self.parent.len() != other.parent.len() {
            return false;
        }
        if self.edges() != other.edges() {
            debug!("spanning trees differ in their edge sets");
            return false;
        }
        close(self.total_weight(), other.total_weight(), tolerance * self.parent.len().max(1) as f64)
    }
}
