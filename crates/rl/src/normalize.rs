//! Fit-once observation preprocessing: per-feature standardization followed
//! by a dimensionality-preserving linear projection onto the principal axes
//! of the standardized data.
//!
//! The transform is fitted on the bootstrap batch and never refitted; the
//! fitted state is immutable by construction, so later, on-policy batches
//! keep flowing through the exploratory-data statistics.

/// Per-feature standardization to zero mean and unit variance.
#[derive(Clone, Debug)]
pub struct Scaler {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Scaler {
    /// Fits mean and standard deviation over the rows of a flat `[n, dim]`
    /// sample matrix. Standard deviations are floored at `1e-6`.
    #[must_use]
    pub fn fit(data: &[f32], dim: usize) -> Self {
        assert!(dim > 0 && data.len() % dim == 0);
        let n = data.len() / dim;
        assert!(n > 0);
        let mut mean = vec![0.0f64; dim];
        for row in data.chunks_exact(dim) {
            for (m, &v) in mean.iter_mut().zip(row) {
                *m += f64::from(v);
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }
        let mut var = vec![0.0f64; dim];
        for row in data.chunks_exact(dim) {
            for (j, &v) in row.iter().enumerate() {
                var[j] += (f64::from(v) - mean[j]).powi(2);
            }
        }
        let std = var
            .iter()
            .map(|&v| ((v / n as f64).sqrt() as f32).max(1e-6))
            .collect();
        Self {
            mean: mean.iter().map(|&m| m as f32).collect(),
            std,
        }
    }

    pub fn transform_in_place(&self, x: &mut [f32]) {
        assert_eq!(x.len() % self.mean.len(), 0);
        for row in x.chunks_exact_mut(self.mean.len()) {
            for ((v, &m), &s) in row.iter_mut().zip(&self.mean).zip(&self.std) {
                *v = (*v - m) / s;
            }
        }
    }
}

/// Linear projection onto the eigenvectors of the fitted data's covariance
/// matrix, all components kept, sorted by descending eigenvalue.
#[derive(Clone, Debug)]
pub struct Projection {
    /// Row `i` holds the `i`-th principal axis.
    components: Vec<f32>,
    dim: usize,
}

impl Projection {
    /// Fits the principal axes of a flat `[n, dim]` matrix of standardized
    /// (zero-mean) samples.
    #[must_use]
    pub fn fit(data: &[f32], dim: usize) -> Self {
        assert!(dim > 0 && data.len() % dim == 0);
        let n = data.len() / dim;
        let mut cov = vec![0.0f64; dim * dim];
        for row in data.chunks_exact(dim) {
            for i in 0..dim {
                for j in i..dim {
                    cov[i * dim + j] += f64::from(row[i]) * f64::from(row[j]);
                }
            }
        }
        for i in 0..dim {
            for j in i..dim {
                let v = cov[i * dim + j] / n as f64;
                cov[i * dim + j] = v;
                cov[j * dim + i] = v;
            }
        }

        let (eigenvalues, eigenvectors) = jacobi_eigen(cov, dim);
        let mut order: Vec<usize> = (0..dim).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

        let mut components = vec![0.0f32; dim * dim];
        for (row, &col) in order.iter().enumerate() {
            for j in 0..dim {
                components[row * dim + j] = eigenvectors[j * dim + col] as f32;
            }
        }
        Self { components, dim }
    }

    pub fn transform_in_place(&self, x: &mut [f32]) {
        assert_eq!(x.len() % self.dim, 0);
        let mut projected = vec![0.0f32; self.dim];
        for row in x.chunks_exact_mut(self.dim) {
            for (i, p) in projected.iter_mut().enumerate() {
                let axis = &self.components[i * self.dim..(i + 1) * self.dim];
                *p = axis.iter().zip(row.iter()).map(|(&a, &v)| a * v).sum();
            }
            row.copy_from_slice(&projected);
        }
    }
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// Returns the eigenvalues and a matrix whose columns are the matching
/// eigenvectors.
fn jacobi_eigen(mut a: Vec<f64>, d: usize) -> (Vec<f64>, Vec<f64>) {
    const MAX_SWEEPS: usize = 64;
    const OFF_TOL: f64 = 1e-20;

    let mut v = vec![0.0f64; d * d];
    for i in 0..d {
        v[i * d + i] = 1.0;
    }

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..d {
            for q in (p + 1)..d {
                off += a[p * d + q] * a[p * d + q];
            }
        }
        if off < OFF_TOL {
            break;
        }
        for p in 0..d {
            for q in (p + 1)..d {
                let apq = a[p * d + q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q * d + q] - a[p * d + p]) / (2.0 * apq);
                let t = if theta >= 0.0 {
                    1.0 / (theta + (theta * theta + 1.0).sqrt())
                } else {
                    -1.0 / (-theta + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..d {
                    let akp = a[k * d + p];
                    let akq = a[k * d + q];
                    a[k * d + p] = c * akp - s * akq;
                    a[k * d + q] = s * akp + c * akq;
                }
                for k in 0..d {
                    let apk = a[p * d + k];
                    let aqk = a[q * d + k];
                    a[p * d + k] = c * apk - s * aqk;
                    a[q * d + k] = s * apk + c * aqk;
                }
                for k in 0..d {
                    let vkp = v[k * d + p];
                    let vkq = v[k * d + q];
                    v[k * d + p] = c * vkp - s * vkq;
                    v[k * d + q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..d).map(|i| a[i * d + i]).collect();
    (eigenvalues, v)
}

/// The frozen two-stage observation transform.
#[derive(Clone, Debug)]
pub struct ObsNormalizer {
    scaler: Scaler,
    projection: Projection,
    dim: usize,
}

impl ObsNormalizer {
    /// Fits both stages on a flat `[n, dim]` batch of raw observations. This
    /// is the only way to obtain an `ObsNormalizer`; there is no refit.
    #[must_use]
    pub fn fit(observations: &[f32], dim: usize) -> Self {
        let scaler = Scaler::fit(observations, dim);
        let mut standardized = observations.to_vec();
        scaler.transform_in_place(&mut standardized);
        let projection = Projection::fit(&standardized, dim);
        Self {
            scaler,
            projection,
            dim,
        }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Applies the frozen transform to a flat `[n, dim]` batch.
    #[must_use]
    pub fn transform_batch(&self, observations: &[f32]) -> Vec<f32> {
        let mut out = observations.to_vec();
        self.scaler.transform_in_place(&mut out);
        self.projection.transform_in_place(&mut out);
        out
    }

    /// Applies the frozen transform to a single observation.
    #[must_use]
    pub fn transform_one(&self, observation: &[f32]) -> Vec<f32> {
        assert_eq!(observation.len(), self.dim);
        self.transform_batch(observation)
    }
}
