use crate::tensor::Tensor;

/// Mean-squared error: per-sample squared errors averaged over the output
/// dimension, then averaged over the batch.
pub fn mse(pred: &Tensor, target: &Tensor) -> f32 {
    assert_eq!(pred.shape, target.shape);
    let n = pred.rows() as f32;
    let d = pred.cols() as f32;
    let sum: f32 = pred
        .data
        .iter()
        .zip(&target.data)
        .map(|(&p, &t)| (p - t).powi(2))
        .sum();
    sum / (n * d)
}

/// Gradient of [`mse`] with respect to the predictions.
pub fn mse_grad(pred: &Tensor, target: &Tensor) -> Tensor {
    let scale = 2.0 / pred.len() as f32;
    let data = pred
        .data
        .iter()
        .zip(&target.data)
        .map(|(&p, &t)| scale * (p - t))
        .collect();
    Tensor::from_vec(pred.shape.clone(), data)
}

/// Per-sample-weighted mean-squared error. `weights` holds one weight per
/// batch row; the weighted per-sample losses are summed and divided by the
/// batch size.
pub fn weighted_mse(pred: &Tensor, target: &Tensor, weights: &[f32]) -> f32 {
    assert_eq!(pred.shape, target.shape);
    assert_eq!(weights.len(), pred.rows());
    let n = pred.rows();
    let d = pred.cols() as f32;
    let mut sum = 0.0;
    for k in 0..n {
        let mut sample = 0.0;
        for (&p, &t) in pred.row(k).iter().zip(target.row(k)) {
            sample += (p - t).powi(2);
        }
        sum += weights[k] * sample / d;
    }
    sum / n as f32
}

/// Gradient of [`weighted_mse`] with respect to the predictions.
pub fn weighted_mse_grad(pred: &Tensor, target: &Tensor, weights: &[f32]) -> Tensor {
    assert_eq!(weights.len(), pred.rows());
    let n = pred.rows();
    let d = pred.cols();
    let scale = 2.0 / (n as f32 * d as f32);
    let mut data = vec![0.0; pred.len()];
    for k in 0..n {
        for j in 0..d {
            let idx = k * d + j;
            data[idx] = scale * weights[k] * (pred.data[idx] - target.data[idx]);
        }
    }
    Tensor::from_vec(pred.shape.clone(), data)
}
