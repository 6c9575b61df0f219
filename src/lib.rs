//! Gaussian word embeddings: words as probability distributions.
//!
//! Each vocabulary word is represented by a multivariate Gaussian with a
//! learned mean vector and a spherical or diagonal covariance, so that a
//! word carries both a position and an uncertainty (and, under KL energy,
//! an entailment direction). Training follows the max-margin objective of
//! Vilnis & McCallum, "Word Representations via Gaussian Embedding"
//! (ICLR 2015): positive co-occurrence pairs are pushed to score higher
//! than corrupted negative pairs by a fixed margin, with AdaGrad steps and
//! hard constraints keeping means bounded and covariances well conditioned.
//!
//! # Quick start
//!
//! ```no_run
//! use word2gauss::{EmbeddingConfig, GaussianEmbedding, SamplerConfig, RngSource, text_to_pairs};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! # fn main() -> word2gauss::Result<()> {
//! let config = EmbeddingConfig::new(5_000, 50);
//! let embedding = GaussianEmbedding::new(config)?;
//!
//! let documents: Vec<Vec<u32>> = vec![vec![12, 7, 413, 7], vec![7, 12, 9]];
//! let sampler = SamplerConfig::default();
//! let mut source = RngSource::new(ChaCha8Rng::seed_from_u64(42), 5_000, sampler.unknown_id);
//! let records = text_to_pairs(&documents, &mut source, &sampler)?;
//!
//! embedding.train(vec![records], 4)?;
//! let neighbors = embedding.nearest_neighbors(12, 10)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`config`]: embedding and sampler hyperparameters with validation
//! - [`energy`]: KL and inner-product energies with analytic gradients
//! - [`sampler`]: documents of token ids to positive/negative training pairs
//! - [`train`]: training records plus the hinge/AdaGrad optimizer and the
//!   lock-per-word concurrent scheduler behind [`GaussianEmbedding::train`]
//! - [`embedding`]: the public facade tying the pieces together

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod embedding;
pub mod energy;
pub mod error;
pub mod sampler;
mod store;
pub mod train;

pub use config::{CovarianceKind, EmbeddingConfig, EnergyKind, SamplerConfig};
pub use embedding::{GaussianEmbedding, Neighbor};
pub use energy::{EnergyModel, PairGradient};
pub use error::{EmbeddingError, Result};
pub use sampler::{text_to_pairs, RngSource, SampleSource};
pub use train::{Direction, TrainingRecord};
