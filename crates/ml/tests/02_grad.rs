use ml::{mse, mse_grad, BatchNorm, Dense, Relu, Sequential, Tensor};

/// Central-difference gradient of the mse loss with respect to one parameter
/// element.
fn numerical_grad(
    net: &mut Sequential,
    x: &Tensor,
    y: &Tensor,
    param: usize,
    elem: usize,
    eps: f32,
) -> f32 {
    net.params_mut()[param].data[elem] += eps;
    let plus = mse(&net.forward(x, true).0, y);
    net.params_mut()[param].data[elem] -= 2.0 * eps;
    let minus = mse(&net.forward(x, true).0, y);
    net.params_mut()[param].data[elem] += eps;
    (plus - minus) / (2.0 * eps)
}

fn check_all_params(net: &mut Sequential, x: &Tensor, y: &Tensor) {
    let (pred, activations) = net.forward(x, true);
    let grads = net.backward(&activations, &mse_grad(&pred, y));

    let n_params = net.params().len();
    assert_eq!(grads.len(), n_params);
    for p in 0..n_params {
        for e in 0..grads[p].len() {
            let analytical = grads[p].data[e];
            let numerical = numerical_grad(net, x, y, p, e, 1e-2);
            let diff = (numerical - analytical).abs();
            assert!(
                diff < 1e-2,
                "param {p} elem {e}: numerical {numerical} analytical {analytical}"
            );
        }
    }
}

#[test]
fn dense_relu_stack_backward_matches_finite_difference() {
    fastrand::seed(42);
    let mut net = Sequential::new();
    net.push(Dense::random(3, 4, 0.0));
    net.push(Relu);
    net.push(Dense::random(4, 2, 0.0));

    let x = Tensor::from_vec(
        vec![4, 3],
        vec![
            0.9, -0.1, 0.3, //
            -0.5, 0.8, 0.2, //
            0.1, 0.4, -0.9, //
            0.7, -0.6, 0.5,
        ],
    );
    let y = Tensor::from_vec(vec![4, 2], vec![0.5, -0.5, 1.0, 0.0, -1.0, 0.3, 0.2, 0.8]);
    check_all_params(&mut net, &x, &y);
}

#[test]
fn batchnorm_backward_matches_finite_difference() {
    fastrand::seed(7);
    let mut net = Sequential::new();
    net.push(Dense::random(2, 3, 0.0));
    net.push(BatchNorm::new(3));
    net.push(Dense::random(3, 1, 0.0));

    let x = Tensor::from_vec(vec![4, 2], vec![0.2, 1.1, -0.4, 0.5, 0.9, -0.8, -1.2, 0.3]);
    let y = Tensor::from_vec(vec![4, 1], vec![0.1, -0.2, 0.4, 0.0]);
    check_all_params(&mut net, &x, &y);
}
