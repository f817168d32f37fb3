use crate::tensor::{Tensor, TensorError};

#[test]
fn test_tensor_creation() {
    let data = vec![1.0, 2.0, 3.0, 4.0];
    let tensor = Tensor::<f32, 2>::new(data.clone(), [2, 2]).unwrap();
    assert_eq!(tensor.shape(), &[2, 2]);
    assert_eq!(tensor.strides(), &[2, 1]);
    assert_eq!(tensor.data(), &data[..]);

    // Size mismatch
    let err = Tensor::<f32, 2>::new(vec![1.0, 2.0, 3.0], [2, 2]);
    assert!(matches!(err, Err(TensorError::ShapeMismatch { .. })));
}

#[test]
fn test_zeros_ones_full() {
    let zeros = Tensor::<f32, 2>::zeros([2, 3]);
    assert_eq!(zeros.data(), &[0.0; 6]);

    let ones = Tensor::<f32, 2>::ones([2, 3]);
    assert_eq!(ones.data(), &[1.0; 6]);

    let sevens = Tensor::<f64, 1>::full([3], 7.0);
    assert_eq!(sevens.data(), &[7.0; 3]);
}

#[test]
fn test_from_fn_and_identity() {
    let t = Tensor::<f32, 2>::from_fn([2, 2], |i| i as f32);
    assert_eq!(t.data(), &[0.0, 1.0, 2.0, 3.0]);

    let eye = Tensor::<f32, 2>::identity(3);
    assert_eq!(
        eye.data(),
        &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
    );
}

#[test]
fn test_reshape() {
    let tensor = Tensor::<f32, 2>::zeros([2, 3]);

    let reshaped: Tensor<f32, 1> = tensor.reshape([6]).unwrap();
    assert_eq!(reshaped.shape(), &[6]);

    let err = reshaped.reshape([4, 2]);
    assert!(matches!(err, Err(TensorError::ShapeMismatch { .. })));
}

#[test]
fn test_arithmetic() {
    let a = Tensor::<f32, 1>::new(vec![1.0, 2.0], [2]).unwrap();
    let b = Tensor::<f32, 1>::new(vec![3.0, 4.0], [2]).unwrap();

    let c = (&a + &b).unwrap();
    assert_eq!(c.data(), &[4.0, 6.0]);

    let d = (&a * &b).unwrap();
    assert_eq!(d.data(), &[3.0, 8.0]);

    let e = (&b - &a).unwrap();
    assert_eq!(e.data(), &[2.0, 2.0]);

    let f = Tensor::<f32, 1>::new(vec![1.0, 2.0, 3.0], [3]).unwrap();
    let err = &a + &f;
    assert!(matches!(err, Err(TensorError::ShapeMismatch { .. })));
}

#[test]
fn test_map_and_scale() {
    let a = Tensor::<f32, 2>::new(vec![-1.0, 2.0, -3.0, 4.0], [2, 2]).unwrap();
    assert_eq!(a.map(|v| v.abs()).data(), &[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(a.scale(0.5).data(), &[-0.5, 1.0, -1.5, 2.0]);
}

#[test]
fn test_matmul_2d() {
    // A: [2, 3], B: [3, 2] -> C: [2, 2]
    let a = Tensor::<f32, 2>::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap();
    let b = Tensor::<f32, 2>::new(vec![7.0, 8.0, 9.0, 1.0, 2.0, 3.0], [3, 2]).unwrap();

    let c = a.matmul(&b).unwrap();
    assert_eq!(c.shape(), &[2, 2]);

    // Row 0: 1*7 + 2*9 + 3*2 = 31, 1*8 + 2*1 + 3*3 = 19
    // Row 1: 4*7 + 5*9 + 6*2 = 85, 4*8 + 5*1 + 6*3 = 55
    assert_eq!(c.data(), &[31.0, 19.0, 85.0, 55.0]);
}

#[test]
fn test_matmul_inner_dim_mismatch() {
    let a = Tensor::<f32, 2>::zeros([2, 3]);
    let b = Tensor::<f32, 2>::zeros([4, 2]);

    let err = a.matmul(&b);
    assert!(matches!(err, Err(TensorError::ShapeMismatch { .. })));
}

#[test]
fn test_transpose() {
    let t = Tensor::<f32, 2>::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3]).unwrap();
    // [ 1 2 3 ]
    // [ 4 5 6 ]

    let t_t = t.transpose().unwrap();
    assert_eq!(t_t.shape(), &[3, 2]);
    assert_eq!(t_t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn test_rows_and_row_access() {
    let t = Tensor::<f32, 2>::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [3, 2]).unwrap();
    assert_eq!(t.rows(), 3);
    assert_eq!(t.cols(), 2);
    assert_eq!(t.row(1).unwrap(), &[3.0, 4.0]);
    assert!(matches!(
        t.row(3),
        Err(TensorError::IndexOutOfBounds { .. })
    ));
}

#[test]
fn test_add_row_broadcast() {
    let x = Tensor::<f32, 2>::new(vec![1.0, 1.0, 2.0, 2.0], [2, 2]).unwrap();
    let bias = Tensor::<f32, 1>::new(vec![0.5, -1.0], [2]).unwrap();

    let out = x.add_row_broadcast(&bias).unwrap();
    assert_eq!(out.data(), &[1.5, 0.0, 2.5, 1.0]);

    let wrong = Tensor::<f32, 1>::zeros([3]);
    assert!(matches!(
        x.add_row_broadcast(&wrong),
        Err(TensorError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_narrow_then_concat_restores_matrix() {
    // 2 x 4, split into two heads of width 2
    let x = Tensor::<f32, 2>::from_fn([2, 4], |i| i as f32);

    let left = x.narrow_cols(0, 2).unwrap();
    let right = x.narrow_cols(2, 2).unwrap();
    assert_eq!(left.data(), &[0.0, 1.0, 4.0, 5.0]);
    assert_eq!(right.data(), &[2.0, 3.0, 6.0, 7.0]);

    let joined = Tensor::concat_cols(&[left, right]).unwrap();
    assert_eq!(joined, x);
}

#[test]
fn test_narrow_out_of_range() {
    let x = Tensor::<f32, 2>::zeros([2, 4]);
    assert!(matches!(
        x.narrow_cols(3, 2),
        Err(TensorError::IndexOutOfBounds { .. })
    ));
}

#[test]
fn test_concat_row_mismatch() {
    let a = Tensor::<f32, 2>::zeros([2, 2]);
    let b = Tensor::<f32, 2>::zeros([3, 2]);
    assert!(matches!(
        Tensor::concat_cols(&[a, b]),
        Err(TensorError::ShapeMismatch { .. })
    ));
    assert!(Tensor::<f32, 2>::concat_cols(&[]).is_err());
}

#[test]
fn test_macro() {
    let t = crate::tensor!([1.0, 2.0, 3.0, 4.0], [2, 2]);
    assert_eq!(t.shape(), &[2, 2]);
    assert_eq!(t.data(), &[1.0, 2.0, 3.0, 4.0]);
}
