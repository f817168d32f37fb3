use crate::{KernelElem, Result, check_buffer};
use rayon::prelude::*;

/// Transposes a row-major `[m, n]` buffer into `[n, m]`.
///
/// Parallelized over rows of the output; each output row gathers one input column.
pub fn cpu_transpose<T>(data: &[T], shape: [usize; 2]) -> Result<Vec<T>>
where
    T: KernelElem,
{
    let [m, n] = shape;
    check_buffer(data, m, n)?;

    let mut out_data = vec![T::zero(); m * n];
    if m == 0 || n == 0 {
        return Ok(out_data);
    }

    out_data
        .par_chunks_mut(m)
        .enumerate()
        .for_each(|(col_idx, out_row)| {
            for (r, out_elem) in out_row.iter_mut().enumerate() {
                *out_elem = data[r * n + col_idx];
            }
        });

    Ok(out_data)
}
