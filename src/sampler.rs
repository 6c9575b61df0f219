//! Corpus pair sampling: turning token-id documents into training records.
//!
//! For every eligible center position a window radius is drawn, and each
//! (context, center) pair inside the window yields `nsamples_per_word`
//! records whose negative pair replaces the context word (never the center)
//! with an independently drawn id. A sentinel id marks unknown tokens and is
//! never emitted as center, context, or negative.
//!
//! Randomness is injected through [`SampleSource`] so tests can script the
//! window radii and negative ids exactly; [`RngSource`] is the seedable
//! production implementation.

use crate::config::SamplerConfig;
use crate::error::Result;
use crate::train::{Direction, TrainingRecord};
use rand::Rng;

/// Injected source of sampling decisions.
///
/// Implementations must never return the sampler's unknown-token id from
/// `negative_id`.
pub trait SampleSource {
    /// Draws a window radius in `[1, max]`.
    fn window_radius(&mut self, max: usize) -> usize;

    /// Draws a negative word id.
    fn negative_id(&mut self) -> u32;
}

/// Production sample source backed by an RNG: uniform window radii (nearer
/// context words are therefore paired more often than distant ones) and
/// uniform negative ids over the vocabulary.
pub struct RngSource<R: Rng> {
    rng: R,
    n_words: u32,
    unknown_id: u32,
}

impl<R: Rng> RngSource<R> {
    /// Creates a source drawing negative ids uniformly from `[0, n_words)`,
    /// redrawing any hit on `unknown_id`.
    pub fn new(rng: R, n_words: u32, unknown_id: u32) -> Self {
        Self {
            rng,
            n_words,
            unknown_id,
        }
    }
}

impl<R: Rng> SampleSource for RngSource<R> {
    fn window_radius(&mut self, max: usize) -> usize {
        self.rng.gen_range(1..=max)
    }

    fn negative_id(&mut self) -> u32 {
        loop {
            let id = self.rng.gen_range(0..self.n_words);
            if id != self.unknown_id {
                return id;
            }
        }
    }
}

/// Expands documents of token ids into the training-record stream consumed
/// by [`GaussianEmbedding::train`](crate::GaussianEmbedding::train).
///
/// Records are emitted in document order; for each center, left contexts
/// come first (direction [`Right`](Direction::Right): the center sits right
/// of the context), then right contexts (direction
/// [`Left`](Direction::Left)).
pub fn text_to_pairs<S: SampleSource>(
    documents: &[Vec<u32>],
    source: &mut S,
    config: &SamplerConfig,
) -> Result<Vec<TrainingRecord>> {
    config.validate()?;
    let unknown = config.unknown_id;

    let mut records = Vec::new();
    for doc in documents {
        for center in 0..doc.len() {
            if doc[center] == unknown {
                continue;
            }
            let radius = source.window_radius(config.half_window).clamp(1, config.half_window);

            for ctx in center.saturating_sub(radius)..center {
                if doc[ctx] == unknown {
                    continue;
                }
                for _ in 0..config.nsamples_per_word {
                    records.push(TrainingRecord::new(
                        doc[ctx],
                        doc[center],
                        source.negative_id(),
                        doc[center],
                        Direction::Right,
                    ));
                }
            }

            let right_end = doc.len().min(center + radius + 1);
            for ctx in (center + 1)..right_end {
                if doc[ctx] == unknown {
                    continue;
                }
                for _ in 0..config.nsamples_per_word {
                    records.push(TrainingRecord::new(
                        doc[center],
                        doc[ctx],
                        doc[center],
                        source.negative_id(),
                        Direction::Left,
                    ));
                }
            }
        }
    }
    Ok(records)
}
