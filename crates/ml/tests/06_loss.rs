use ml::{mse, mse_grad, weighted_mse, weighted_mse_grad, Tensor};

#[test]
fn mse_exact() {
    let pred = Tensor::from_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
    let target = Tensor::zeros(vec![2, 2]);
    assert!((mse(&pred, &target) - 7.5).abs() < 1e-6);

    let grad = mse_grad(&pred, &target);
    for (g, p) in grad.data.iter().zip(&pred.data) {
        assert!((g - p / 2.0).abs() < 1e-6);
    }
}

#[test]
fn weighted_mse_exact() {
    let pred = Tensor::from_vec(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
    let target = Tensor::zeros(vec![2, 2]);
    let weights = [1.0, 0.5];

    // sample losses: (1 + 4) / 2 = 2.5 and (9 + 16) / 2 = 12.5
    let expected = (1.0 * 2.5 + 0.5 * 12.5) / 2.0;
    assert!((weighted_mse(&pred, &target, &weights) - expected).abs() < 1e-6);

    let grad = weighted_mse_grad(&pred, &target, &weights);
    for k in 0..2 {
        for j in 0..2 {
            let expected = 2.0 * weights[k] * pred.data[k * 2 + j] / 4.0;
            assert!((grad.data[k * 2 + j] - expected).abs() < 1e-6);
        }
    }
}

#[test]
fn negative_weights_flip_the_gradient() {
    let pred = Tensor::from_vec(vec![1, 1], vec![2.0]);
    let target = Tensor::from_vec(vec![1, 1], vec![0.0]);
    let up = weighted_mse_grad(&pred, &target, &[1.0]);
    let down = weighted_mse_grad(&pred, &target, &[-1.0]);
    assert!((up.data[0] + down.data[0]).abs() < 1e-6);
    assert!(up.data[0] > 0.0);
}
