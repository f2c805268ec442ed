use std::ops::{Index, IndexMut};

use crate::error::{invalid, KernelResult};

/// 整数重みグラフの「辺なし」「到達不能」を表す番兵
pub const INF: u64 = u64::MAX;

/// 1本の連続バッファに行優先で格納した密行列
///
/// 分割の単位は行。ワーカープールは行が `cols` 間隔で並んでいることを前提に
/// バッファを切り分ける
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Matrix<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }
}

impl<T> Matrix<T> {
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> KernelResult<Self> {
        if data.len() != rows * cols {
            return invalid(format!(
                "buffer of {} cells cannot hold a {}x{} matrix",
                data.len(),
                rows,
                cols
            ));
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> KernelResult<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return invalid(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                ));
            }
            data.extend(row);
        }
        Ok(Matrix {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// 正方かつ空でなければ行数を返し、それ以外は `InvalidArgument`
    pub fn require_square(&self, what: &str) -> KernelResult<usize> {
        if self.rows == 0 {
            return invalid(format!("{what} must have at least one row"));
        }
        if !self.is_square() {
            return invalid(format!(
                "{what} must be square, got {}x{}",
                self.rows, self.cols
            ));
        }
        Ok(self.rows)
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[i * self.cols + j]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.data[i * self.cols + j]
    }
}

/// 正方の隣接行列。実行中は変更しない
///
/// Dijkstra と Prim では `W::default()`（0）の重みを「辺なし」とみなす
#[derive(Clone, Debug, PartialEq)]
pub struct Graph<W> {
    adjacency: Matrix<W>,
}

impl<W> Graph<W> {
    pub fn from_matrix(adjacency: Matrix<W>) -> KernelResult<Self> {
        adjacency.require_square("adjacency matrix")?;
        Ok(Graph { adjacency })
    }

    pub fn vertices(&self) -> usize {
        self.adjacency.rows()
    }

    pub fn adjacency(&self) -> &Matrix<W> {
        &self.adjacency
    }

    /// `u` から出る辺の重み（添字は行き先の頂点）
    pub fn neighbours(&self, u: usize) -> &[W] {
        self.adjacency.row(u)
    }

    pub fn check_vertex(&self, v: usize, what: &str) -> KernelResult<()> {
        if v >= self.vertices() {
            return invalid(format!(
                "{what} vertex {v} is out of range for {} vertices",
                self.vertices()
            ));
        }
        Ok(())
    }
}

impl<W: Copy + PartialEq + Default> Graph<W> {
    pub fn weight(&self, u: usize, v: usize) -> Option<W> {
        let w = self.adjacency[(u, v)];
        (w != W::default()).then_some(w)
    }
}
