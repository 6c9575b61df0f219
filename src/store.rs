//! Shared parameter storage for the word distributions.
//!
//! Each word owns one row (mean, covariance, and the two accumulated
//! squared-gradient scalars) behind its own mutex, sized to the vocabulary.
//! Updates to unrelated words proceed fully in parallel; a row is only ever
//! observed whole, never mid-write. Rare same-word collisions serialize on
//! the row's lock.

use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Initial value of the accumulated squared-gradient scalars. Keeps the
/// adaptive step finite before the first gradient arrives.
pub(crate) const ACC_GRAD_EPSILON: f64 = 1e-8;

/// Standard deviation of the mean-jitter initialization.
const MU_INIT_JITTER: f64 = 0.1;

/// Per-word parameters. One row of the store.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WordParams {
    /// Mean vector, length D.
    pub mu: Vec<f64>,
    /// Covariance scalars: length 1 (spherical) or D (diagonal).
    pub sigma: Vec<f64>,
    /// Running sum of squared mean-gradient norms.
    pub acc_grad_mu: f64,
    /// Running sum of squared covariance-gradient norms.
    pub acc_grad_sigma: f64,
}

/// The shared mutable parameter arrays, one mutex-guarded row per word.
pub(crate) struct ParameterStore {
    rows: Vec<Mutex<WordParams>>,
    dimension: usize,
    sigma_width: usize,
    sigma_default: f64,
    rng: ChaCha8Rng,
    n_updates: AtomicU64,
    n_skipped: AtomicU64,
}

impl ParameterStore {
    /// Creates a store with default-initialized rows: means jittered near
    /// the origin to break symmetry, covariances at the midpoint of the
    /// `[sigma_min, sigma_max]` box.
    pub fn new_random(config: &EmbeddingConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let sigma_width = config.sigma_width();
        let sigma_default = 0.5 * (config.sigma_min + config.sigma_max);
        let jitter = Normal::new(0.0, MU_INIT_JITTER).unwrap();

        let rows: Vec<Mutex<WordParams>> = (0..config.n_words)
            .map(|_| {
                let mu: Vec<f64> = (0..config.dimension).map(|_| jitter.sample(&mut rng)).collect();
                Mutex::new(WordParams {
                    mu,
                    sigma: vec![sigma_default; sigma_width],
                    acc_grad_mu: ACC_GRAD_EPSILON,
                    acc_grad_sigma: ACC_GRAD_EPSILON,
                })
            })
            .collect();

        Ok(Self {
            rows,
            dimension: config.dimension,
            sigma_width,
            sigma_default,
            rng,
            n_updates: AtomicU64::new(0),
            n_skipped: AtomicU64::new(0),
        })
    }

    /// Creates a store from explicit parameter tables, validating shapes.
    pub fn from_parameters(
        config: &EmbeddingConfig,
        mu: Vec<Vec<f64>>,
        sigma: Vec<Vec<f64>>,
    ) -> Result<Self> {
        config.validate()?;

        if mu.len() != config.n_words {
            return Err(EmbeddingError::Config(format!(
                "mu has {} rows, expected {}",
                mu.len(),
                config.n_words
            )));
        }
        if sigma.len() != config.n_words {
            return Err(EmbeddingError::Config(format!(
                "sigma has {} rows, expected {}",
                sigma.len(),
                config.n_words
            )));
        }

        let sigma_width = config.sigma_width();
        for (i, row) in mu.iter().enumerate() {
            if row.len() != config.dimension {
                return Err(EmbeddingError::Config(format!(
                    "mu row {} has length {}, expected {}",
                    i,
                    row.len(),
                    config.dimension
                )));
            }
        }
        for (i, row) in sigma.iter().enumerate() {
            if row.len() != sigma_width {
                return Err(EmbeddingError::Config(format!(
                    "sigma row {} has length {}, expected {}",
                    i,
                    row.len(),
                    sigma_width
                )));
            }
            if row.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
                return Err(EmbeddingError::Config(format!(
                    "sigma row {} contains a non-positive or non-finite entry",
                    i
                )));
            }
        }

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let rows: Vec<Mutex<WordParams>> = mu
            .into_iter()
            .zip(sigma)
            .map(|(m, s)| {
                Mutex::new(WordParams {
                    mu: m,
                    sigma: s,
                    acc_grad_mu: ACC_GRAD_EPSILON,
                    acc_grad_sigma: ACC_GRAD_EPSILON,
                })
            })
            .collect();

        Ok(Self {
            rows,
            dimension: config.dimension,
            sigma_width,
            sigma_default: 0.5 * (config.sigma_min + config.sigma_max),
            rng,
            n_updates: AtomicU64::new(0),
            n_skipped: AtomicU64::new(0),
        })
    }

    /// Number of words.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Embedding dimensionality.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of covariance scalars per word.
    #[inline]
    pub fn sigma_width(&self) -> usize {
        self.sigma_width
    }

    /// Locks the row for `word`, failing if the id is out of range.
    ///
    /// A poisoned lock is recovered rather than propagated: every writer
    /// re-establishes the row invariants (projection, clipping) before
    /// releasing, so the row is valid even if a panicking thread held it.
    pub fn lock_row(&self, word: usize) -> Result<MutexGuard<'_, WordParams>> {
        let row = self
            .rows
            .get(word)
            .ok_or(EmbeddingError::OutOfRange {
                index: word,
                max: self.rows.len(),
            })?;
        Ok(row.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Clones the row for `word` under its lock.
    pub fn snapshot(&self, word: usize) -> Result<WordParams> {
        Ok(self.lock_row(word)?.clone())
    }

    /// Clones every row in id order, each under its own lock.
    pub fn snapshot_all(&self) -> Vec<WordParams> {
        self.rows
            .iter()
            .map(|row| row.lock().unwrap_or_else(|p| p.into_inner()).clone())
            .collect()
    }

    /// Appends `new_n - len()` default-initialized rows. Existing rows are
    /// never touched, so word ids remain stable.
    ///
    /// Takes `&mut self`: growing is structurally exclusive with any
    /// concurrent training call.
    pub fn grow(&mut self, new_n: usize) -> Result<()> {
        if new_n < self.rows.len() {
            return Err(EmbeddingError::Config(format!(
                "cannot shrink store from {} to {} words",
                self.rows.len(),
                new_n
            )));
        }

        let jitter = Normal::new(0.0, MU_INIT_JITTER).unwrap();
        for _ in self.rows.len()..new_n {
            let mu: Vec<f64> = (0..self.dimension).map(|_| jitter.sample(&mut self.rng)).collect();
            self.rows.push(Mutex::new(WordParams {
                mu,
                sigma: vec![self.sigma_default; self.sigma_width],
                acc_grad_mu: ACC_GRAD_EPSILON,
                acc_grad_sigma: ACC_GRAD_EPSILON,
            }));
        }
        Ok(())
    }

    /// Records one applied training step.
    #[inline]
    pub fn record_update(&self) {
        self.n_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one skipped (numerically degenerate) record.
    #[inline]
    pub fn record_skip(&self) {
        self.n_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Total number of applied training steps.
    #[inline]
    pub fn n_updates(&self) -> u64 {
        self.n_updates.load(Ordering::Relaxed)
    }

    /// Total number of skipped degenerate records.
    #[inline]
    pub fn n_skipped(&self) -> u64 {
        self.n_skipped.load(Ordering::Relaxed)
    }
}
