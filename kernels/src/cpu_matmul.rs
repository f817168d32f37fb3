use crate::{KernelElem, KernelError, Result, check_buffer};
use rayon::prelude::*;

/// Row-major matrix product `[m, k] x [k, n] -> [m, n]`.
///
/// The right-hand side is transposed once up front so every output element is
/// a dot product of two contiguous slices. Output rows are filled in parallel.
pub fn cpu_matmul<T>(
    lhs_data: &[T],
    rhs_data: &[T],
    lhs_shape: [usize; 2],
    rhs_shape: [usize; 2],
) -> Result<Vec<T>>
where
    T: KernelElem,
{
    let [m, k] = lhs_shape;
    let [k2, n] = rhs_shape;

    if k != k2 {
        return Err(KernelError::ShapeMismatch {
            expected: vec![k, n],
            got: vec![k2, n],
        });
    }
    check_buffer(lhs_data, m, k)?;
    check_buffer(rhs_data, k, n)?;

    let mut out_data = vec![T::zero(); m * n];
    if m == 0 || n == 0 {
        return Ok(out_data);
    }

    // rhs_t is [n, k]
    let rhs_t_data = crate::cpu_transpose(rhs_data, rhs_shape)?;

    out_data
        .par_chunks_mut(n)
        .zip(lhs_data.par_chunks(k.max(1)))
        .for_each(|(out_row, lhs_row)| {
            for (col, out_elem) in out_row.iter_mut().enumerate() {
                let rhs_col = &rhs_t_data[col * k..(col + 1) * k];
                let mut sum = T::zero();
                for (&a, &b) in lhs_row.iter().zip(rhs_col.iter()) {
                    sum += a * b;
                }
                *out_elem = sum;
            }
        });

    Ok(out_data)
}
