use ml::nn::Layer;
use ml::{Dense, Tensor};

#[test]
fn dense_forward_exact() {
    let w = vec![
        1.0, 0.5, -0.5, -1.0, // first row
        0.2, 0.3, 0.1, 0.9, // second row
    ];
    let b = vec![0.1, -0.2];
    let mut layer = Dense::new(w, b.clone(), 4, 2, 0.0);
    let x = Tensor::from_vec(vec![1, 4], vec![1.0, 2.0, 3.0, 4.0]);
    let y = layer.forward(&x, false);

    let expected_y0 = 1.0 * 1.0 + 0.5 * 2.0 - 0.5 * 3.0 - 1.0 * 4.0 + b[0];
    let expected_y1 = 0.2 * 1.0 + 0.3 * 2.0 + 0.1 * 3.0 + 0.9 * 4.0 + b[1];

    assert!((y.data[0] - expected_y0).abs() < 1e-6);
    assert!((y.data[1] - expected_y1).abs() < 1e-6);
}

#[test]
fn dense_forward_batched() {
    let mut layer = Dense::new(vec![2.0, 0.0, 0.0, 3.0], vec![1.0, -1.0], 2, 2, 0.0);
    let x = Tensor::from_vec(vec![2, 2], vec![1.0, 1.0, -1.0, 2.0]);
    let y = layer.forward(&x, false);

    assert_eq!(y.shape, vec![2, 2]);
    assert!((y.data[0] - 3.0).abs() < 1e-6);
    assert!((y.data[1] - 2.0).abs() < 1e-6);
    assert!((y.data[2] - -1.0).abs() < 1e-6);
    assert!((y.data[3] - 5.0).abs() < 1e-6);
}

#[test]
fn dense_l2_adds_weight_gradient() {
    let w = vec![0.5, -0.25, 1.0, 2.0];
    let b = vec![0.0, 0.0];
    let mut plain = Dense::new(w.clone(), b.clone(), 2, 2, 0.0);
    let mut regularized = Dense::new(w.clone(), b, 2, 2, 1e-2);

    let x = Tensor::from_vec(vec![1, 2], vec![0.3, -0.7]);
    let grad = Tensor::from_vec(vec![1, 2], vec![1.0, -2.0]);
    let (_, plain_grads) = plain.backward(&x, &grad);
    let (_, reg_grads) = regularized.backward(&x, &grad);

    for i in 0..w.len() {
        let expected = plain_grads[0].data[i] + 2.0 * 1e-2 * w[i];
        assert!((reg_grads[0].data[i] - expected).abs() < 1e-6);
    }
    // bias is not regularized
    assert_eq!(plain_grads[1].data, reg_grads[1].data);
}
