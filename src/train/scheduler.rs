//! Batch scheduling over the shared parameter store.
//!
//! Two paths: a sequential, bit-reproducible `train_batch` for tests and
//! deterministic pipelines, and a multi-worker `train` where a fixed pool of
//! threads pulls successive batches from a shared iterator and applies them
//! concurrently. Consistency is deliberately relaxed ("Hogwild"-style):
//! workers may act on slightly stale rows, which the approximate stochastic
//! optimization tolerates; per-word locking keeps every individual row
//! intact.

use crate::config::EmbeddingConfig;
use crate::energy::EnergyModel;
use crate::error::{EmbeddingError, Result};
use crate::store::ParameterStore;
use crate::train::optimizer::apply_record;
use crate::train::TrainingRecord;
use log::info;
use std::sync::Mutex;

/// Applies one batch sequentially. Deterministic for a fixed store state and
/// record sequence.
pub(crate) fn train_batch(
    store: &ParameterStore,
    model: EnergyModel,
    config: &EmbeddingConfig,
    records: &[TrainingRecord],
) -> Result<()> {
    for record in records {
        apply_record(store, model, config, record)?;
    }
    Ok(())
}

/// Distributes batches from `batches` across `n_workers` threads, each
/// applying records against the shared store.
///
/// There is no ordering guarantee across workers; the run ends when the
/// batch iterator is exhausted. The first range error aborts the run and is
/// returned.
pub(crate) fn train<I>(
    store: &ParameterStore,
    model: EnergyModel,
    config: &EmbeddingConfig,
    batches: I,
    n_workers: usize,
) -> Result<()>
where
    I: IntoIterator<Item = Vec<TrainingRecord>>,
    I::IntoIter: Send,
{
    if n_workers == 0 {
        return Err(EmbeddingError::Training(
            "n_workers must be at least 1".to_string(),
        ));
    }

    info!("Starting training run with {} workers", n_workers);

    let queue = Mutex::new(batches.into_iter());
    let failure: Mutex<Option<EmbeddingError>> = Mutex::new(None);

    rayon::scope(|scope| {
        for _ in 0..n_workers {
            scope.spawn(|_| loop {
                // Hold the queue lock only for the pull, not the batch.
                let batch = {
                    let mut iter = queue.lock().unwrap_or_else(|p| p.into_inner());
                    iter.next()
                };
                let Some(batch) = batch else { break };

                for record in &batch {
                    if let Err(err) = apply_record(store, model, config, record) {
                        let mut slot = failure.lock().unwrap_or_else(|p| p.into_inner());
                        if slot.is_none() {
                            *slot = Some(err);
                        }
                        return;
                    }
                }

                let failed = failure
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .is_some();
                if failed {
                    return;
                }
            });
        }
    });

    let failure = failure.into_inner().unwrap_or_else(|p| p.into_inner());
    match failure {
        Some(err) => Err(err),
        None => {
            info!(
                "Training run finished: {} steps applied, {} records skipped",
                store.n_updates(),
                store.n_skipped()
            );
            Ok(())
        }
    }
}
