use crate::tensor::Tensor;

/// A differentiable layer operating on `[n, d]` batch tensors.
///
/// `forward` takes a `train` flag because dropout and batch normalization
/// behave differently during fitting and during inference. Layers that need
/// forward-pass state for their backward pass (dropout masks, batch
/// statistics) cache it internally, which is why both methods take `&mut
/// self`. `backward` receives the same input tensor the preceding `forward`
/// saw and returns the gradient with respect to that input together with the
/// gradients for the layer's own parameters, in `params()` order.
pub trait Layer {
    fn forward(&mut self, x: &Tensor, train: bool) -> Tensor;
    fn backward(&mut self, x: &Tensor, grad: &Tensor) -> (Tensor, Vec<Tensor>);
    fn params(&self) -> Vec<&Tensor> {
        Vec::new()
    }
    fn params_mut(&mut self) -> Vec<&mut Tensor> {
        Vec::new()
    }
}

/// A fully connected layer with L2 weight regularization.
pub struct Dense {
    /// Weight matrix, shape `[out_dim, in_dim]`.
    pub w: Tensor,
    /// Bias vector, shape `[out_dim]`.
    pub b: Tensor,
    pub in_dim: usize,
    pub out_dim: usize,
    /// L2 penalty factor on the weights; its gradient contribution `2 * l2 * w`
    /// is added during the backward pass.
    pub l2: f32,
}

impl Dense {
    pub fn new(weights: Vec<f32>, bias: Vec<f32>, in_dim: usize, out_dim: usize, l2: f32) -> Self {
        assert_eq!(weights.len(), in_dim * out_dim);
        assert_eq!(bias.len(), out_dim);
        Self {
            w: Tensor::from_vec(vec![out_dim, in_dim], weights),
            b: Tensor::from_vec(vec![out_dim], bias),
            in_dim,
            out_dim,
            l2,
        }
    }

    /// Glorot-uniform initialization.
    pub fn random(in_dim: usize, out_dim: usize, l2: f32) -> Self {
        let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
        let weights = (0..in_dim * out_dim)
            .map(|_| fastrand::f32() * 2.0 * limit - limit)
            .collect();
        let bias = vec![0.0; out_dim];
        Self::new(weights, bias, in_dim, out_dim, l2)
    }
}

impl Layer for Dense {
    fn forward(&mut self, x: &Tensor, _train: bool) -> Tensor {
        assert_eq!(x.cols(), self.in_dim);
        let n = x.rows();
        let mut y = vec![0.0; n * self.out_dim];
        for k in 0..n {
            let row = x.row(k);
            for o in 0..self.out_dim {
                let mut sum = self.b.data[o];
                let w_row = &self.w.data[o * self.in_dim..(o + 1) * self.in_dim];
                for (wi, xi) in w_row.iter().zip(row) {
                    sum += wi * xi;
                }
                y[k * self.out_dim + o] = sum;
            }
        }
        Tensor::from_vec(vec![n, self.out_dim], y)
    }

    fn backward(&mut self, x: &Tensor, grad: &Tensor) -> (Tensor, Vec<Tensor>) {
        let n = x.rows();
        let mut grad_input = vec![0.0; n * self.in_dim];
        let mut grad_w = vec![0.0; self.in_dim * self.out_dim];
        let mut grad_b = vec![0.0; self.out_dim];
        for k in 0..n {
            let x_row = x.row(k);
            let g_row = grad.row(k);
            for o in 0..self.out_dim {
                let go = g_row[o];
                for i in 0..self.in_dim {
                    grad_w[o * self.in_dim + i] += go * x_row[i];
                    grad_input[k * self.in_dim + i] += self.w.data[o * self.in_dim + i] * go;
                }
                grad_b[o] += go;
            }
        }
        if self.l2 > 0.0 {
            for (gw, w) in grad_w.iter_mut().zip(&self.w.data) {
                *gw += 2.0 * self.l2 * w;
            }
        }
        (
            Tensor::from_vec(vec![n, self.in_dim], grad_input),
            vec![
                Tensor::from_vec(vec![self.out_dim, self.in_dim], grad_w),
                Tensor::from_vec(vec![self.out_dim], grad_b),
            ],
        )
    }

    fn params(&self) -> Vec<&Tensor> {
        vec![&self.w, &self.b]
    }

    fn params_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.w, &mut self.b]
    }
}

#[derive(Default)]
pub struct Relu;

impl Layer for Relu {
    fn forward(&mut self, x: &Tensor, _train: bool) -> Tensor {
        let data = x.data.iter().map(|&v| v.max(0.0)).collect();
        Tensor::from_vec(x.shape.clone(), data)
    }

    fn backward(&mut self, x: &Tensor, grad: &Tensor) -> (Tensor, Vec<Tensor>) {
        let data = x
            .data
            .iter()
            .zip(&grad.data)
            .map(|(&v, &g)| if v > 0.0 { g } else { 0.0 })
            .collect();
        (Tensor::from_vec(x.shape.clone(), data), Vec::new())
    }
}

#[derive(Default)]
pub struct TanhAct;

impl Layer for TanhAct {
    fn forward(&mut self, x: &Tensor, _train: bool) -> Tensor {
        let data = x.data.iter().map(|&v| v.tanh()).collect();
        Tensor::from_vec(x.shape.clone(), data)
    }

    fn backward(&mut self, x: &Tensor, grad: &Tensor) -> (Tensor, Vec<Tensor>) {
        let data = x
            .data
            .iter()
            .zip(&grad.data)
            .map(|(&v, &g)| {
                let t = v.tanh();
                g * (1.0 - t * t)
            })
            .collect();
        (Tensor::from_vec(x.shape.clone(), data), Vec::new())
    }
}

/// Inverted dropout: active only while training, where kept units are scaled
/// by `1 / (1 - rate)` so inference needs no rescaling.
pub struct Dropout {
    pub rate: f32,
    mask: Vec<f32>,
}

impl Dropout {
    pub fn new(rate: f32) -> Self {
        assert!((0.0..1.0).contains(&rate));
        Self {
            rate,
            mask: Vec::new(),
        }
    }
}

impl Layer for Dropout {
    fn forward(&mut self, x: &Tensor, train: bool) -> Tensor {
        if !train {
            return x.clone();
        }
        let keep_scale = 1.0 / (1.0 - self.rate);
        self.mask = x
            .data
            .iter()
            .map(|_| if fastrand::f32() < self.rate { 0.0 } else { keep_scale })
            .collect();
        let data = x.data.iter().zip(&self.mask).map(|(&v, &m)| v * m).collect();
        Tensor::from_vec(x.shape.clone(), data)
    }

    fn backward(&mut self, x: &Tensor, grad: &Tensor) -> (Tensor, Vec<Tensor>) {
        assert_eq!(self.mask.len(), grad.len(), "dropout backward before forward");
        let data = grad
            .data
            .iter()
            .zip(&self.mask)
            .map(|(&g, &m)| g * m)
            .collect();
        (Tensor::from_vec(x.shape.clone(), data), Vec::new())
    }
}

struct BnCache {
    x_hat: Vec<f32>,
    std_inv: Vec<f32>,
    rows: usize,
}

/// Batch normalization over the feature axis of a `[n, d]` batch.
///
/// Training uses per-batch statistics and updates exponential running
/// estimates; inference normalizes with the frozen running estimates.
pub struct BatchNorm {
    pub gamma: Tensor,
    pub beta: Tensor,
    pub running_mean: Vec<f32>,
    pub running_var: Vec<f32>,
    pub momentum: f32,
    pub eps: f32,
    dim: usize,
    cache: Option<BnCache>,
}

impl BatchNorm {
    pub fn new(dim: usize) -> Self {
        Self {
            gamma: Tensor::from_vec(vec![dim], vec![1.0; dim]),
            beta: Tensor::zeros(vec![dim]),
            running_mean: vec![0.0; dim],
            running_var: vec![1.0; dim],
            momentum: 0.99,
            eps: 1e-3,
            dim,
            cache: None,
        }
    }
}

impl Layer for BatchNorm {
    fn forward(&mut self, x: &Tensor, train: bool) -> Tensor {
        assert_eq!(x.cols(), self.dim);
        let n = x.rows();
        let d = self.dim;
        let mut out = vec![0.0; n * d];

        if train {
            let mut mean = vec![0.0; d];
            let mut var = vec![0.0; d];
            for k in 0..n {
                for (j, &v) in x.row(k).iter().enumerate() {
                    mean[j] += v;
                }
            }
            for m in &mut mean {
                *m /= n as f32;
            }
            for k in 0..n {
                for (j, &v) in x.row(k).iter().enumerate() {
                    var[j] += (v - mean[j]).powi(2);
                }
            }
            for v in &mut var {
                *v /= n as f32;
            }

            let std_inv: Vec<f32> = var.iter().map(|&v| 1.0 / (v + self.eps).sqrt()).collect();
            let mut x_hat = vec![0.0; n * d];
            for k in 0..n {
                for (j, &v) in x.row(k).iter().enumerate() {
                    let h = (v - mean[j]) * std_inv[j];
                    x_hat[k * d + j] = h;
                    out[k * d + j] = self.gamma.data[j] * h + self.beta.data[j];
                }
            }
            for j in 0..d {
                self.running_mean[j] =
                    self.momentum * self.running_mean[j] + (1.0 - self.momentum) * mean[j];
                self.running_var[j] =
                    self.momentum * self.running_var[j] + (1.0 - self.momentum) * var[j];
            }
            self.cache = Some(BnCache {
                x_hat,
                std_inv,
                rows: n,
            });
        } else {
            for k in 0..n {
                for (j, &v) in x.row(k).iter().enumerate() {
                    let h = (v - self.running_mean[j]) / (self.running_var[j] + self.eps).sqrt();
                    out[k * d + j] = self.gamma.data[j] * h + self.beta.data[j];
                }
            }
        }
        Tensor::from_vec(vec![n, d], out)
    }

    fn backward(&mut self, x: &Tensor, grad: &Tensor) -> (Tensor, Vec<Tensor>) {
        let cache = self.cache.as_ref().expect("batchnorm backward before training forward");
        let n = cache.rows;
        let nf = n as f32;
        let d = self.dim;

        let mut grad_gamma = vec![0.0; d];
        let mut grad_beta = vec![0.0; d];
        // column sums of dL/dx_hat and of dL/dx_hat * x_hat
        let mut sum_dxh = vec![0.0; d];
        let mut sum_dxh_xh = vec![0.0; d];
        for k in 0..n {
            for j in 0..d {
                let g = grad.data[k * d + j];
                let h = cache.x_hat[k * d + j];
                grad_gamma[j] += g * h;
                grad_beta[j] += g;
                let dxh = g * self.gamma.data[j];
                sum_dxh[j] += dxh;
                sum_dxh_xh[j] += dxh * h;
            }
        }

        let mut grad_input = vec![0.0; n * d];
        for k in 0..n {
            for j in 0..d {
                let g = grad.data[k * d + j];
                let h = cache.x_hat[k * d + j];
                let dxh = g * self.gamma.data[j];
                grad_input[k * d + j] =
                    cache.std_inv[j] / nf * (nf * dxh - sum_dxh[j] - h * sum_dxh_xh[j]);
            }
        }

        (
            Tensor::from_vec(x.shape.clone(), grad_input),
            vec![
                Tensor::from_vec(vec![d], grad_gamma),
                Tensor::from_vec(vec![d], grad_beta),
            ],
        )
    }

    fn params(&self) -> Vec<&Tensor> {
        vec![&self.gamma, &self.beta]
    }

    fn params_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.gamma, &mut self.beta]
    }
}

/// A stack of layers applied in sequence.
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn push<L: Layer + 'static>(&mut self, layer: L) {
        self.layers.push(Box::new(layer));
    }

    /// Runs the forward pass, returning the output and the stack of
    /// activations (`activations[0]` is the input, `activations[i + 1]` the
    /// output of layer `i`) needed by [`Sequential::backward`].
    pub fn forward(&mut self, x: &Tensor, train: bool) -> (Tensor, Vec<Tensor>) {
        let mut out = x.clone();
        let mut activations = vec![out.clone()];
        for layer in &mut self.layers {
            out = layer.forward(&out, train);
            activations.push(out.clone());
        }
        (out, activations)
    }

    /// Forward pass without keeping activations, for inference.
    pub fn predict(&mut self, x: &Tensor) -> Tensor {
        let mut out = x.clone();
        for layer in &mut self.layers {
            out = layer.forward(&out, false);
        }
        out
    }

    /// Runs the backward pass and returns the parameter gradients aligned
    /// with [`Sequential::params_mut`] order.
    pub fn backward(&mut self, activations: &[Tensor], grad: &Tensor) -> Vec<Tensor> {
        let mut grad_out = grad.clone();
        let mut per_layer: Vec<Vec<Tensor>> = Vec::with_capacity(self.layers.len());
        for (layer, activation) in self
            .layers
            .iter_mut()
            .rev()
            .zip(activations.iter().rev().skip(1))
        {
            let (g_in, p) = layer.backward(activation, &grad_out);
            grad_out = g_in;
            per_layer.push(p);
        }
        per_layer.reverse();
        per_layer.into_iter().flatten().collect()
    }

    pub fn params(&self) -> Vec<&Tensor> {
        self.layers.iter().flat_map(|l| l.params()).collect()
    }

    pub fn params_mut(&mut self) -> Vec<&mut Tensor> {
        let mut out = Vec::new();
        for layer in &mut self.layers {
            out.extend(layer.params_mut());
        }
        out
    }
}

impl Default for Sequential {
    fn default() -> Self {
        Self::new()
    }
}
