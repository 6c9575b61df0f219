//! The Gaussian embedding: construction, training entry points, and queries.

use crate::config::EmbeddingConfig;
use crate::energy::EnergyModel;
use crate::error::{EmbeddingError, Result};
use crate::store::ParameterStore;
use crate::train::{scheduler, TrainingRecord};
use log::info;

/// One nearest-neighbor result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Word id of the candidate.
    pub id: usize,
    /// Energy of the candidate against the query word (higher = more similar).
    pub energy: f64,
}

/// A set of word distributions: one multivariate Gaussian per vocabulary
/// item, trained with a max-margin ranking objective and queried by
/// distributional similarity.
///
/// The energy function and covariance parameterization are fixed at
/// construction. Training mutates the embedding in place; `train` runs
/// multiple workers against the shared parameters with relaxed
/// ("Hogwild"-style) consistency, while `train_batch` is the sequential,
/// reproducible path.
pub struct GaussianEmbedding {
    config: EmbeddingConfig,
    model: EnergyModel,
    store: ParameterStore,
}

impl GaussianEmbedding {
    /// Creates an embedding with default-initialized parameters: means
    /// jittered near the origin, covariances at the midpoint of the
    /// `[sigma_min, sigma_max]` box.
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let store = ParameterStore::new_random(&config)?;
        let model = EnergyModel::new(config.energy, config.covariance);
        Ok(Self {
            config,
            model,
            store,
        })
    }

    /// Creates an embedding from explicit mean and covariance tables, for
    /// deterministic setups and tests. Shapes must match the configuration.
    pub fn with_parameters(
        config: EmbeddingConfig,
        mu: Vec<Vec<f64>>,
        sigma: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let store = ParameterStore::from_parameters(&config, mu, sigma)?;
        let model = EnergyModel::new(config.energy, config.covariance);
        Ok(Self {
            config,
            model,
            store,
        })
    }

    /// The configuration this embedding was built with.
    #[inline]
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Vocabulary size.
    #[inline]
    pub fn n_words(&self) -> usize {
        self.store.len()
    }

    /// Embedding dimensionality.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.store.dimension()
    }

    /// Total number of applied training steps (diagnostics only).
    #[inline]
    pub fn n_updates(&self) -> u64 {
        self.store.n_updates()
    }

    /// Total number of training records skipped as numerically degenerate.
    #[inline]
    pub fn n_skipped(&self) -> u64 {
        self.store.n_skipped()
    }

    /// Computes the energy between words `i` and `j` (higher = more
    /// similar). For the asymmetric KL energy, `i` plays the role of P in
    /// `-KL(P || Q)`.
    pub fn energy(&self, i: usize, j: usize) -> Result<f64> {
        let a = self.store.snapshot(i)?;
        let b = self.store.snapshot(j)?;
        let e = self.model.energy(&a.mu, &a.sigma, &b.mu, &b.sigma);
        if !e.is_finite() {
            return Err(EmbeddingError::Degenerate(format!(
                "energy({}, {}) is not finite",
                i, j
            )));
        }
        Ok(e)
    }

    /// Applies one batch of training records sequentially.
    ///
    /// Bit-reproducible: the same store state and record sequence always
    /// produce the same parameters.
    pub fn train_batch(&self, records: &[TrainingRecord]) -> Result<()> {
        scheduler::train_batch(&self.store, self.model, &self.config, records)
    }

    /// Trains from an iterator of record batches using `n_workers`
    /// concurrent workers sharing this embedding's parameters.
    ///
    /// Workers pull batches in iterator order but apply records with no
    /// cross-worker ordering guarantee, and may compute a gradient from a
    /// row another worker has since updated. This relaxed consistency is an
    /// accepted property of the asynchronous optimizer, not a defect; rows
    /// themselves are never torn.
    pub fn train<I>(&self, batches: I, n_workers: usize) -> Result<()>
    where
        I: IntoIterator<Item = Vec<TrainingRecord>>,
        I::IntoIter: Send,
    {
        scheduler::train(&self.store, self.model, &self.config, batches, n_workers)
    }

    /// Returns the `num` words most similar to `word` by energy, in
    /// descending order with ties broken by ascending id. The query word
    /// itself carries the maximal self-energy and appears first.
    pub fn nearest_neighbors(&self, word: usize, num: usize) -> Result<Vec<Neighbor>> {
        let n = self.store.len();
        if num > n {
            return Err(EmbeddingError::OutOfRange { index: num, max: n });
        }
        let query = self.store.snapshot(word)?;

        let mut scored = Vec::with_capacity(n);
        for id in 0..n {
            let candidate = self.store.snapshot(id)?;
            let energy = self
                .model
                .energy(&query.mu, &query.sigma, &candidate.mu, &candidate.sigma);
            if !energy.is_finite() {
                return Err(EmbeddingError::Degenerate(format!(
                    "energy({}, {}) is not finite",
                    word, id
                )));
            }
            scored.push(Neighbor { id, energy });
        }

        scored.sort_by(|a, b| {
            b.energy
                .partial_cmp(&a.energy)
                .unwrap()
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(num);
        Ok(scored)
    }

    /// Grows the vocabulary to `new_n` words, appending default-initialized
    /// rows. Existing rows, accumulated gradients, and the update counter
    /// are untouched; word ids are stable.
    ///
    /// Not callable while a training run borrows the embedding: growing
    /// takes `&mut self` and is therefore exclusive with `train`.
    pub fn grow(&mut self, new_n: usize) -> Result<()> {
        self.store.grow(new_n)?;
        self.config.n_words = new_n;
        info!("Grew vocabulary to {} words", new_n);
        Ok(())
    }

    /// Snapshot of all mean vectors, shape `(N, D)`.
    pub fn mu(&self) -> Vec<Vec<f64>> {
        self.store.snapshot_all().into_iter().map(|row| row.mu).collect()
    }

    /// Snapshot of all covariance rows, shape `(N, 1)` for spherical and
    /// `(N, D)` for diagonal covariance.
    pub fn sigma(&self) -> Vec<Vec<f64>> {
        self.store.snapshot_all().into_iter().map(|row| row.sigma).collect()
    }

    /// Snapshot of the per-word accumulated squared mean-gradient norms.
    pub fn acc_grad_mu(&self) -> Vec<f64> {
        self.store
            .snapshot_all()
            .into_iter()
            .map(|row| row.acc_grad_mu)
            .collect()
    }

    /// Snapshot of the per-word accumulated squared covariance-gradient
    /// norms.
    pub fn acc_grad_sigma(&self) -> Vec<f64> {
        self.store
            .snapshot_all()
            .into_iter()
            .map(|row| row.acc_grad_sigma)
            .collect()
    }
}
