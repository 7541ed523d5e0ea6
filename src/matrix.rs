//! Square matrix type for mass matrices and Jacobians.

use crate::Float;

/// Storage layout of a [`Matrix`].
///
/// - `Identity`: implicit identity, no data stored.
/// - `Full`: dense row-major.
/// - `Banded`: `ml` sub- and `mu` super-diagonals stored as `ml + mu + 1`
///   band rows of length `n`, entry `(i, j)` at band row `i - j + mu`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatrixStorage {
    Identity,
    Full,
    Banded { ml: usize, mu: usize },
}

/// Square `n x n` matrix with identity, dense, or banded storage.
#[derive(Clone, Debug)]
pub struct Matrix {
    n: usize,
    storage: MatrixStorage,
    data: Vec<Float>,
}

impl Matrix {
    /// Implicit identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            n,
            storage: MatrixStorage::Identity,
            data: Vec::new(),
        }
    }

    /// Dense zero matrix.
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            storage: MatrixStorage::Full,
            data: vec![0.0; n * n],
        }
    }

    /// Dense matrix from rows. Panics if the rows do not form a square matrix.
    pub fn from_rows(rows: &[Vec<Float>]) -> Self {
        let n = rows.len();
        let mut data = vec![0.0; n * n];
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), n, "row {} has length {}, expected {}", i, row.len(), n);
            data[i * n..(i + 1) * n].copy_from_slice(row);
        }
        Self {
            n,
            storage: MatrixStorage::Full,
            data,
        }
    }

    /// Banded zero matrix with `ml` sub- and `mu` super-diagonals.
    pub fn banded(n: usize, ml: usize, mu: usize) -> Self {
        Self {
            n,
            storage: MatrixStorage::Banded { ml, mu },
            data: vec![0.0; (ml + mu + 1) * n],
        }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn storage(&self) -> &MatrixStorage {
        &self.storage
    }

    pub fn get(&self, i: usize, j: usize) -> Float {
        match &self.storage {
            MatrixStorage::Identity => {
                if i == j {
                    1.0
                } else {
                    0.0
                }
            }
            MatrixStorage::Full => self.data[i * self.n + j],
            MatrixStorage::Banded { ml, mu } => {
                if j > i + *mu || i > j + *ml {
                    0.0
                } else {
                    self.data[(i + *mu - j) * self.n + j]
                }
            }
        }
    }

    /// Write entry `(i, j)`. Panics on identity storage or outside the band.
    pub fn set(&mut self, i: usize, j: usize, value: Float) {
        match &self.storage {
            MatrixStorage::Identity => panic!("cannot write to identity storage"),
            MatrixStorage::Full => self.data[i * self.n + j] = value,
            MatrixStorage::Banded { ml, mu } => {
                assert!(
                    j <= i + *mu && i <= j + *ml,
                    "entry ({}, {}) is outside the band (ml = {}, mu = {})",
                    i,
                    j,
                    ml,
                    mu
                );
                self.data[(i + *mu - j) * self.n + j] = value;
            }
        }
    }

    /// True if row `i` is identically zero.
    pub fn is_zero_row(&self, i: usize) -> bool {
        (0..self.n).all(|j| self.get(i, j) == 0.0)
    }

    /// Indices of identically-zero rows, in order.
    pub fn zero_rows(&self) -> Vec<usize> {
        (0..self.n).filter(|&i| self.is_zero_row(i)).collect()
    }

    /// y = A x
    pub fn mul_vec(&self, x: &[Float], y: &mut [Float]) {
        assert_eq!(x.len(), self.n, "dimension mismatch in mul_vec");
        assert_eq!(y.len(), self.n, "dimension mismatch in mul_vec");
        match &self.storage {
            MatrixStorage::Identity => y.copy_from_slice(x),
            _ => {
                for i in 0..self.n {
                    let mut sum = 0.0;
                    for j in 0..self.n {
                        sum += self.get(i, j) * x[j];
                    }
                    y[i] = sum;
                }
            }
        }
    }

    /// Densify into a row-major buffer.
    fn densify(&self) -> Vec<Float> {
        let n = self.n;
        let mut a = vec![0.0; n * n];
        match &self.storage {
            MatrixStorage::Identity => {
                for i in 0..n {
                    a[i * n + i] = 1.0;
                }
            }
            MatrixStorage::Full => a.copy_from_slice(&self.data),
            MatrixStorage::Banded { .. } => {
                for i in 0..n {
                    for j in 0..n {
                        a[i * n + j] = self.get(i, j);
                    }
                }
            }
        }
        a
    }

    /// Determinant via LU with partial pivoting.
    pub fn det(&self) -> Float {
        if matches!(self.storage, MatrixStorage::Identity) {
            return 1.0;
        }
        let n = self.n;
        let mut a = self.densify();
        let mut det = 1.0;
        for k in 0..n {
            let mut pivot_row = k;
            let mut pivot_val = a[k * n + k].abs();
            for i in (k + 1)..n {
                let val = a[i * n + k].abs();
                if val > pivot_val {
                    pivot_val = val;
                    pivot_row = i;
                }
            }
            if pivot_val == 0.0 {
                return 0.0;
            }
            if pivot_row != k {
                for j in 0..n {
                    a.swap(k * n + j, pivot_row * n + j);
                }
                det = -det;
            }
            det *= a[k * n + k];
            for i in (k + 1)..n {
                let factor = a[i * n + k] / a[k * n + k];
                for j in (k + 1)..n {
                    a[i * n + j] -= factor * a[k * n + j];
                }
            }
        }
        det
    }

    /// Solve A x = b, returning x.
    pub fn lin_solve(&self, b: &[Float]) -> Vec<Float> {
        let mut b_copy = b.to_vec();
        self.lin_solve_mut(&mut b_copy);
        b_copy
    }

    /// In-place solve: overwrites `b` with `x`. LU with partial pivoting,
    /// applying permutations to `b` as they are found.
    pub fn lin_solve_mut(&self, b: &mut [Float]) {
        let n = self.n;
        assert_eq!(
            b.len(),
            n,
            "dimension mismatch in solve: A is {}x{}, b has length {}",
            n,
            n,
            b.len()
        );
        if matches!(self.storage, MatrixStorage::Identity) {
            return;
        }

        let mut a = self.densify();

        // LU with partial pivoting, applying permutations to b
        for k in 0..n {
            let mut pivot_row = k;
            let mut pivot_val = a[k * n + k].abs();
            for i in (k + 1)..n {
                let val = a[i * n + k].abs();
                if val > pivot_val {
                    pivot_val = val;
                    pivot_row = i;
                }
            }
            if pivot_row != k {
                for j in 0..n {
                    a.swap(k * n + j, pivot_row * n + j);
                }
                b.swap(k, pivot_row);
            }
            for i in (k + 1)..n {
                let factor = a[i * n + k] / a[k * n + k];
                if factor != 0.0 {
                    for j in (k + 1)..n {
                        a[i * n + j] -= factor * a[k * n + j];
                    }
                    b[i] -= factor * b[k];
                }
            }
        }

        // Back substitution
        for i in (0..n).rev() {
            let mut sum = b[i];
            for j in (i + 1)..n {
                sum -= a[i * n + j] * b[j];
            }
            b[i] = sum / a[i * n + i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lin_solve_dense() {
        let a = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]);
        let x = a.lin_solve(&[5.0, 10.0]);
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn det_and_zero_rows() {
        let m = Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 0.0]]);
        assert_eq!(m.det(), 0.0);
        assert_eq!(m.zero_rows(), vec![1]);
        assert!(Matrix::identity(3).zero_rows().is_empty());
        assert_eq!(Matrix::identity(3).det(), 1.0);
    }

    #[test]
    fn banded_roundtrip() {
        let mut m = Matrix::banded(3, 1, 0);
        m.set(0, 0, 2.0);
        m.set(1, 0, -1.0);
        m.set(1, 1, 2.0);
        m.set(2, 1, -1.0);
        m.set(2, 2, 2.0);
        assert_eq!(m.get(1, 0), -1.0);
        assert_eq!(m.get(0, 1), 0.0);
        let mut y = vec![0.0; 3];
        m.mul_vec(&[1.0, 1.0, 1.0], &mut y);
        assert_eq!(y, vec![2.0, 1.0, 1.0]);
        assert_relative_eq!(m.det(), 8.0, epsilon = 1e-12);
    }
}
