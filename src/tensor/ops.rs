use super::{Result, Tensor, TensorElem, TensorError};
use encoder_rs_kernels::{cpu_matmul, cpu_transpose};
use rayon::prelude::*;
use std::ops::{Add, Div, Mul, Sub};

// Element-wise arithmetic between tensors of identical shape.
macro_rules! impl_bin_op {
    ($trait:ident, $method:ident) => {
        impl<T, const RANK: usize> $trait for &Tensor<T, RANK>
        where
            T: TensorElem,
        {
            type Output = Result<Tensor<T, RANK>>;

            fn $method(self, rhs: Self) -> Self::Output {
                if self.shape != rhs.shape {
                    return Err(TensorError::ShapeMismatch {
                        expected: self.shape.to_vec(),
                        got: rhs.shape.to_vec(),
                    });
                }

                let mut out = Tensor::zeros(self.shape);
                out.data
                    .par_iter_mut()
                    .zip(self.data.par_iter())
                    .zip(rhs.data.par_iter())
                    .for_each(|((o, a), b)| {
                        *o = a.$method(*b);
                    });

                Ok(out)
            }
        }
    };
}

impl_bin_op!(Add, add);
impl_bin_op!(Sub, sub);
impl_bin_op!(Mul, mul);
impl_bin_op!(Div, div);

impl<T, const RANK: usize> Tensor<T, RANK>
where
    T: TensorElem,
{
    /// Applies a function element-wise.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T + Sync + Send,
    {
        let mut out = Tensor::zeros(self.shape);
        out.data
            .par_iter_mut()
            .zip(self.data.par_iter())
            .for_each(|(o, i)| *o = f(*i));
        out
    }

    /// Multiplies every element by `factor`.
    pub fn scale(&self, factor: T) -> Self {
        self.map(|v| v * factor)
    }
}

/// Matrix operations.
///
/// Rank-2 tensors are the working type of the encoder: row `i` is the feature
/// vector of token `i`.
impl<T> Tensor<T, 2>
where
    T: TensorElem,
{
    /// Creates an `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_fn([n, n], |i| if i / n == i % n { T::one() } else { T::zero() })
    }

    /// Number of rows (sequence length for a sequence matrix).
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Number of columns (feature width).
    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    /// Returns row `i` as a slice.
    pub fn row(&self, i: usize) -> Result<&[T]> {
        if i >= self.rows() {
            return Err(TensorError::IndexOutOfBounds {
                index: vec![i],
                shape: self.shape.to_vec(),
            });
        }
        let cols = self.cols();
        Ok(&self.data[i * cols..(i + 1) * cols])
    }

    /// Matrix multiplication: `[M, K] x [K, N] -> [M, N]`.
    pub fn matmul(&self, rhs: &Self) -> Result<Self> {
        let [m, k] = self.shape;
        let [k2, n] = rhs.shape;
        if k != k2 {
            return Err(TensorError::ShapeMismatch {
                expected: vec![k, n],
                got: vec![k2, n],
            });
        }

        let data = cpu_matmul(&self.data, &rhs.data, self.shape, rhs.shape)?;
        Tensor::new(data, [m, n])
    }

    /// Swaps rows and columns.
    pub fn transpose(&self) -> Result<Self> {
        let [m, n] = self.shape;
        let data = cpu_transpose(&self.data, self.shape)?;
        Tensor::new(data, [n, m])
    }

    /// Adds `bias` to every row.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the bias length differs from the column count.
    pub fn add_row_broadcast(&self, bias: &Tensor<T, 1>) -> Result<Self> {
        let cols = self.cols();
        let [b_cols] = *bias.shape();
        if cols != b_cols {
            return Err(TensorError::ShapeMismatch {
                expected: vec![cols],
                got: vec![b_cols],
            });
        }

        let mut out = self.clone();
        if cols == 0 {
            return Ok(out);
        }
        out.data.par_chunks_mut(cols).for_each(|row| {
            for (r, b) in row.iter_mut().zip(bias.data().iter()) {
                *r += *b;
            }
        });
        Ok(out)
    }

    /// Copies the column range `[start, start + len)` into a new `[rows, len]` matrix.
    pub fn narrow_cols(&self, start: usize, len: usize) -> Result<Self> {
        let [rows, cols] = self.shape;
        if start + len > cols {
            return Err(TensorError::IndexOutOfBounds {
                index: vec![start, start + len],
                shape: self.shape.to_vec(),
            });
        }

        let mut data = Vec::with_capacity(rows * len);
        for r in 0..rows {
            let offset = r * cols + start;
            data.extend_from_slice(&self.data[offset..offset + len]);
        }
        Tensor::new(data, [rows, len])
    }

    /// Concatenates matrices with equal row counts along the column axis, in slice order.
    pub fn concat_cols(parts: &[Self]) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Err(TensorError::ShapeMismatch {
                expected: vec![1],
                got: vec![0],
            });
        };
        let rows = first.rows();
        if let Some(bad) = parts.iter().find(|p| p.rows() != rows) {
            return Err(TensorError::ShapeMismatch {
                expected: vec![rows, bad.cols()],
                got: bad.shape.to_vec(),
            });
        }

        let total_cols: usize = parts.iter().map(|p| p.cols()).sum();
        let mut data = Vec::with_capacity(rows * total_cols);
        for r in 0..rows {
            for part in parts {
                let c = part.cols();
                data.extend_from_slice(&part.data[r * c..(r + 1) * c]);
            }
        }
        Tensor::new(data, [rows, total_cols])
    }
}
