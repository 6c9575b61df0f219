//! Per-record constrained optimization.
//!
//! Each record contributes a max-margin hinge loss
//! `max(0, closs - energy(pos) + energy(neg))`. When the margin is violated,
//! the hinge gradient is accumulated per distinct word, each word takes an
//! AdaGrad step (`eta / sqrt(acc)` with `acc += ||grad||^2`), and the word is
//! projected back into its feasible region: the mean onto the
//! `||mu|| <= mu_max` ball, the covariance clipped into
//! `[sigma_min, sigma_max]`.

use crate::config::EmbeddingConfig;
use crate::energy::EnergyModel;
use crate::error::{EmbeddingError, Result};
use crate::store::{ParameterStore, WordParams};
use crate::train::{Direction, TrainingRecord};
use log::warn;

/// What applying one record did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// The margin was violated and parameters were updated.
    Applied,
    /// The margin was already satisfied; no-op by design.
    Satisfied,
    /// The record produced a non-finite energy or gradient and was dropped.
    Skipped,
}

/// Gradient of the hinge loss with respect to one word's parameters.
struct WordGradient {
    id: usize,
    dmu: Vec<f64>,
    dsigma: Vec<f64>,
}

/// Adds `sign * (dmu, dsigma)` to the accumulator entry for `id`, merging
/// duplicates (a record references at most four distinct words).
fn accumulate(grads: &mut Vec<WordGradient>, id: usize, dmu: &[f64], dsigma: &[f64], sign: f64) {
    if let Some(entry) = grads.iter_mut().find(|g| g.id == id) {
        for (acc, g) in entry.dmu.iter_mut().zip(dmu) {
            *acc += sign * g;
        }
        for (acc, g) in entry.dsigma.iter_mut().zip(dsigma) {
            *acc += sign * g;
        }
    } else {
        grads.push(WordGradient {
            id,
            dmu: dmu.iter().map(|g| sign * g).collect(),
            dsigma: dsigma.iter().map(|g| sign * g).collect(),
        });
    }
}

/// Rescales `mu` onto the ball of radius `mu_max` if its norm exceeds it.
pub(crate) fn project_mean(mu: &mut [f64], mu_max: f64) {
    let norm = mu.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > mu_max {
        let scale = mu_max / norm;
        for x in mu.iter_mut() {
            *x *= scale;
        }
    }
}

/// Clips every covariance entry into `[sigma_min, sigma_max]`.
pub(crate) fn clip_sigma(sigma: &mut [f64], sigma_min: f64, sigma_max: f64) {
    for s in sigma.iter_mut() {
        *s = s.clamp(sigma_min, sigma_max);
    }
}

/// Orients a pair of snapshots so the first element plays the P role.
fn orient<'a>(
    direction: Direction,
    a: (usize, &'a WordParams),
    b: (usize, &'a WordParams),
) -> ((usize, &'a WordParams), (usize, &'a WordParams)) {
    match direction {
        Direction::Left => (a, b),
        Direction::Right => (b, a),
    }
}

/// Applies one training record to the shared store.
///
/// Gradients are computed from row snapshots and applied per word under that
/// word's lock; a concurrent writer may interleave between the two, which
/// the asynchronous training scheme tolerates.
pub(crate) fn apply_record(
    store: &ParameterStore,
    model: EnergyModel,
    config: &EmbeddingConfig,
    record: &TrainingRecord,
) -> Result<StepOutcome> {
    let ids = [
        record.pos_a as usize,
        record.pos_b as usize,
        record.neg_a as usize,
        record.neg_b as usize,
    ];
    for &id in &ids {
        if id >= store.len() {
            return Err(EmbeddingError::OutOfRange {
                index: id,
                max: store.len(),
            });
        }
    }

    let pos_a = store.snapshot(ids[0])?;
    let pos_b = store.snapshot(ids[1])?;
    let neg_a = store.snapshot(ids[2])?;
    let neg_b = store.snapshot(ids[3])?;

    let ((p_id, p), (q_id, q)) = orient(record.direction, (ids[0], &pos_a), (ids[1], &pos_b));
    let ((r_id, r), (s_id, s)) = orient(record.direction, (ids[2], &neg_a), (ids[3], &neg_b));

    let e_pos = model.energy(&p.mu, &p.sigma, &q.mu, &q.sigma);
    let e_neg = model.energy(&r.mu, &r.sigma, &s.mu, &s.sigma);
    let loss = config.closs - e_pos + e_neg;

    if !loss.is_finite() {
        warn!(
            "skipping record {:?}: non-finite hinge loss (e_pos={}, e_neg={})",
            record.to_row(),
            e_pos,
            e_neg
        );
        store.record_skip();
        return Ok(StepOutcome::Skipped);
    }
    if loss <= 0.0 {
        return Ok(StepOutcome::Satisfied);
    }

    // d(loss)/d(theta) = -d(e_pos)/d(theta) + d(e_neg)/d(theta).
    let g_pos = model.gradients(&p.mu, &p.sigma, &q.mu, &q.sigma);
    let g_neg = model.gradients(&r.mu, &r.sigma, &s.mu, &s.sigma);

    if !(g_pos.is_finite() && g_neg.is_finite()) {
        warn!(
            "skipping record {:?}: non-finite gradient",
            record.to_row()
        );
        store.record_skip();
        return Ok(StepOutcome::Skipped);
    }

    let mut grads: Vec<WordGradient> = Vec::with_capacity(4);
    accumulate(&mut grads, p_id, &g_pos.dmu_i, &g_pos.dsigma_i, -1.0);
    accumulate(&mut grads, q_id, &g_pos.dmu_j, &g_pos.dsigma_j, -1.0);
    accumulate(&mut grads, r_id, &g_neg.dmu_i, &g_neg.dsigma_i, 1.0);
    accumulate(&mut grads, s_id, &g_neg.dmu_j, &g_neg.dsigma_j, 1.0);

    for grad in &grads {
        let mut row = store.lock_row(grad.id)?;

        row.acc_grad_mu += grad.dmu.iter().map(|g| g * g).sum::<f64>();
        let step = config.eta / row.acc_grad_mu.sqrt();
        for (w, g) in row.mu.iter_mut().zip(&grad.dmu) {
            *w -= step * g;
        }
        project_mean(&mut row.mu, config.mu_max);

        row.acc_grad_sigma += grad.dsigma.iter().map(|g| g * g).sum::<f64>();
        let step = config.eta / row.acc_grad_sigma.sqrt();
        for (s, g) in row.sigma.iter_mut().zip(&grad.dsigma) {
            *s -= step * g;
        }
        clip_sigma(&mut row.sigma, config.sigma_min, config.sigma_max);
    }

    store.record_update();
    Ok(StepOutcome::Applied)
}
