use crate::tensor::Tensor;

/// Adam optimizer stepping over `(parameter, gradient)` pairs.
///
/// Moment buffers are sized lazily on the first step, so a single `Adam` can
/// be constructed before its network and reused for the whole run.
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    t: usize,
    m: Vec<Vec<f32>>,
    v: Vec<Vec<f32>>,
}

impl Adam {
    #[must_use]
    pub fn new(lr: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    pub fn step(&mut self, params: &mut [(&mut Tensor, &Tensor)]) {
        if self.m.is_empty() {
            self.m = params.iter().map(|(p, _)| vec![0.0; p.len()]).collect();
            self.v = params.iter().map(|(p, _)| vec![0.0; p.len()]).collect();
        }
        self.t += 1;
        for ((p, g), (m_vec, v_vec)) in params
            .iter_mut()
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
        {
            assert_eq!(p.len(), g.len());
            for i in 0..p.len() {
                m_vec[i] = self.beta1 * m_vec[i] + (1.0 - self.beta1) * g.data[i];
                v_vec[i] = self.beta2 * v_vec[i] + (1.0 - self.beta2) * g.data[i] * g.data[i];
                let m_hat = m_vec[i] / (1.0 - self.beta1.powi(self.t as i32));
                let v_hat = v_vec[i] / (1.0 - self.beta2.powi(self.t as i32));
                p.data[i] -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
            }
        }
    }
}
