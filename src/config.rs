//! Configuration for the Gaussian embedding engine.

use crate::error::{EmbeddingError, Result};
use serde::{Deserialize, Serialize};

/// Covariance parameterization for the word distributions.
///
/// Chosen at construction and fixed for the lifetime of the embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovarianceKind {
    /// One scalar per word: `sigma * I_D` (isotropic).
    Spherical,
    /// One scalar per dimension per word: `diag(sigma[0..D])`.
    Diagonal,
}

impl CovarianceKind {
    /// Number of covariance scalars stored per word for dimensionality `d`.
    #[inline]
    pub fn width(&self, d: usize) -> usize {
        match self {
            CovarianceKind::Spherical => 1,
            CovarianceKind::Diagonal => d,
        }
    }
}

/// Energy function used for similarity scores and training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyKind {
    /// Negative KL divergence `-KL(P || Q)`. Asymmetric.
    Kl,
    /// Expected-likelihood inner product `log N(0; mu_i - mu_j, Sigma_i + Sigma_j)`.
    /// Symmetric.
    Ip,
}

/// Main configuration for a [`GaussianEmbedding`](crate::GaussianEmbedding).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Vocabulary size (number of word distributions).
    pub n_words: usize,

    /// Embedding dimensionality.
    /// Default: 100.
    pub dimension: usize,

    /// Covariance parameterization.
    /// Default: spherical.
    pub covariance: CovarianceKind,

    /// Energy function.
    /// Default: KL.
    pub energy: EnergyKind,

    /// Maximum L2 norm of any mean vector (ball projection bound).
    /// Default: 2.0.
    pub mu_max: f64,

    /// Lower bound on every covariance entry (box constraint).
    /// Default: 0.7.
    pub sigma_min: f64,

    /// Upper bound on every covariance entry (box constraint).
    /// Default: 1.5.
    pub sigma_max: f64,

    /// Base adaptive learning rate.
    /// Default: 0.1.
    pub eta: f64,

    /// Margin of the max-margin hinge loss.
    /// Default: 1.0.
    pub closs: f64,

    /// Random seed for mean-jitter initialization.
    /// Default: None (entropy-seeded).
    pub seed: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            n_words: 10_000,
            dimension: 100,
            covariance: CovarianceKind::Spherical,
            energy: EnergyKind::Kl,
            mu_max: 2.0,
            sigma_min: 0.7,
            sigma_max: 1.5,
            eta: 0.1,
            closs: 1.0,
            seed: None,
        }
    }
}

impl EmbeddingConfig {
    /// Creates a configuration for the given vocabulary size and
    /// dimensionality, with all hyperparameters at their defaults.
    pub fn new(n_words: usize, dimension: usize) -> Self {
        Self {
            n_words,
            dimension,
            ..Default::default()
        }
    }

    /// Validates the hyperparameters.
    pub fn validate(&self) -> Result<()> {
        if self.n_words == 0 {
            return Err(EmbeddingError::Config(
                "vocabulary size must be at least 1".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(EmbeddingError::Config(
                "dimensionality must be at least 1".to_string(),
            ));
        }
        if !(self.mu_max > 0.0 && self.mu_max.is_finite()) {
            return Err(EmbeddingError::Config(format!(
                "mu_max must be positive and finite, got {}",
                self.mu_max
            )));
        }
        if !(self.sigma_min > 0.0 && self.sigma_min.is_finite()) {
            return Err(EmbeddingError::Config(format!(
                "sigma_min must be positive and finite, got {}",
                self.sigma_min
            )));
        }
        if !(self.sigma_max >= self.sigma_min && self.sigma_max.is_finite()) {
            return Err(EmbeddingError::Config(format!(
                "sigma_max must be finite and >= sigma_min, got [{}, {}]",
                self.sigma_min, self.sigma_max
            )));
        }
        if !(self.eta > 0.0 && self.eta.is_finite()) {
            return Err(EmbeddingError::Config(format!(
                "eta must be positive and finite, got {}",
                self.eta
            )));
        }
        if !(self.closs >= 0.0 && self.closs.is_finite()) {
            return Err(EmbeddingError::Config(format!(
                "closs must be non-negative and finite, got {}",
                self.closs
            )));
        }
        Ok(())
    }

    /// Number of covariance scalars stored per word.
    #[inline]
    pub fn sigma_width(&self) -> usize {
        self.covariance.width(self.dimension)
    }
}

/// Configuration for the corpus pair sampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Maximum window radius around a center word. The effective radius for
    /// each center is drawn from the injected sample source in `[1, half_window]`.
    /// Default: 5.
    pub half_window: usize,

    /// Number of records emitted per (center, context) pair, each with an
    /// independently drawn negative.
    /// Default: 1.
    pub nsamples_per_word: usize,

    /// Token id marking an unknown/skip token. Never sampled as center,
    /// context, or negative.
    /// Default: `u32::MAX`.
    pub unknown_id: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            half_window: 5,
            nsamples_per_word: 1,
            unknown_id: u32::MAX,
        }
    }
}

impl SamplerConfig {
    /// Validates the sampler parameters.
    pub fn validate(&self) -> Result<()> {
        if self.half_window == 0 {
            return Err(EmbeddingError::Config(
                "half_window must be at least 1".to_string(),
            ));
        }
        if self.nsamples_per_word == 0 {
            return Err(EmbeddingError::Config(
                "nsamples_per_word must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EmbeddingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sigma_width(), 1);
    }

    #[test]
    fn test_diagonal_sigma_width() {
        let mut config = EmbeddingConfig::new(10, 25);
        config.covariance = CovarianceKind::Diagonal;
        assert_eq!(config.sigma_width(), 25);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut config = EmbeddingConfig::new(10, 5);
        config.sigma_min = 1.5;
        config.sigma_max = 0.7;
        assert!(config.validate().is_err());

        let mut config = EmbeddingConfig::new(10, 5);
        config.mu_max = 0.0;
        assert!(config.validate().is_err());

        let mut config = EmbeddingConfig::new(10, 5);
        config.sigma_min = -1.0;
        assert!(config.validate().is_err());

        let config = EmbeddingConfig::new(0, 5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sampler_config() {
        assert!(SamplerConfig::default().validate().is_ok());

        let config = SamplerConfig {
            half_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
