//! Synthetic synapse tables drawn from the log-linear connectivity rule.
//!
//! For each pair the expected count is
//!
//! ```text
//! μ = exp(θ₀) · pre^θ₁ · post^θ₂ · postAll^θ₃ · …
//! ```
//!
//! With θ = [0, 1, 1, -1] this is `pre · post / postAll`, the rule the
//! simulator's synapse distributor applies. Counts are either Poisson draws
//! with mean μ or, with [`CountNoise::None`], μ itself.

use crate::types::{ParameterVector, SynapseRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};

/// How observed counts relate to the expected count μ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountNoise {
    /// Draw counts from Poisson(μ).
    Poisson,
    /// Echo μ without noise.
    None,
}

/// Settings for synthetic table generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// Number of synapse records.
    pub rows: usize,
    /// RNG seed.
    pub seed: u64,
    /// Count noise model.
    pub noise: CountNoise,
    /// Range of the bouton (presynaptic) feature.
    pub pre_range: (f64, f64),
    /// Range of the all-targets feature; the target feature is a fraction of it.
    pub post_all_range: (f64, f64),
    /// Neurons per presynaptic block when assigning identifiers.
    pub posts_per_pre: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rows: 1_000,
            seed: 42,
            noise: CountNoise::Poisson,
            pre_range: (1.0, 40.0),
            post_all_range: (5.0, 200.0),
            posts_per_pre: 50,
        }
    }
}

/// Generator of synthetic synapse records for a known parameter vector.
///
/// # Example
///
/// ```
/// use calib_core::synthetic::{CountNoise, SyntheticConfig, SyntheticSynapses};
/// use calib_core::types::ParameterVector;
///
/// let theta = ParameterVector::new(vec![0.0, 1.0, 1.0, -1.0]);
/// let config = SyntheticConfig { rows: 10, noise: CountNoise::None, ..Default::default() };
/// let records = SyntheticSynapses::new(theta, config).generate();
/// assert_eq!(records.len(), 10);
/// let r = &records[0];
/// let mu = r.features[0] * r.features[1] / r.features[2];
/// assert!((r.count - mu).abs() < 1e-9 * mu.max(1.0));
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticSynapses {
    theta: ParameterVector,
    config: SyntheticConfig,
}

impl SyntheticSynapses {
    /// Create a generator.
    ///
    /// `theta` must have length `1 + n_features`; the generator emits
    /// `theta.len() - 1` features per record.
    pub fn new(theta: ParameterVector, config: SyntheticConfig) -> Self {
        Self { theta, config }
    }

    /// Expected count for a feature row under θ.
    pub fn expected_count(theta: &ParameterVector, features: &[f64]) -> f64 {
        let eta = theta
            .iter()
            .skip(1)
            .zip(features)
            .fold(theta.as_slice().first().copied().unwrap_or(0.0), |acc, (b, x)| {
                acc + b * x.ln()
            });
        eta.exp()
    }

    /// Number of features per record.
    pub fn n_features(&self) -> usize {
        self.theta.len().saturating_sub(1)
    }

    /// Draw the records.
    pub fn generate(&self) -> Vec<SynapseRecord> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let block = self.config.posts_per_pre.max(1);
        let n_features = self.n_features();

        (0..self.config.rows)
            .map(|i| {
                let features = self.draw_features(&mut rng, n_features);
                let mu = Self::expected_count(&self.theta, &features);
                let count = match self.config.noise {
                    CountNoise::None => mu,
                    CountNoise::Poisson => sample_poisson(&mut rng, mu),
                };
                let pre_id = (i / block) as i64;
                let post_id = 100_000 + (i % block) as i64;
                SynapseRecord::new(pre_id, post_id, count, features)
            })
            .collect()
    }

    fn draw_features(&self, rng: &mut StdRng, n_features: usize) -> Vec<f64> {
        let (pre_lo, pre_hi) = self.config.pre_range;
        let (all_lo, all_hi) = self.config.post_all_range;
        let pre = rng.gen_range(pre_lo..pre_hi);
        let post_all = rng.gen_range(all_lo..all_hi);
        let post = post_all * rng.gen_range(0.05..1.0);

        let mut features: Vec<f64> = [pre, post, post_all]
            .into_iter()
            .take(n_features)
            .collect();
        while features.len() < n_features {
            features.push(rng.gen_range(1.0..10.0));
        }
        features
    }
}

fn sample_poisson(rng: &mut StdRng, mu: f64) -> f64 {
    if mu <= 0.0 || !mu.is_finite() {
        return 0.0;
    }
    match Poisson::new(mu) {
        Ok(dist) => dist.sample(rng),
        Err(_) => 0.0,
    }
}
