//! Negative KL divergence energy.
//!
//! `energy(i, j) = -KL(N_i || N_j)` where
//! `KL(P || Q) = 1/2 [ tr(Sigma_q^-1 Sigma_p) + (mu_q - mu_p)^T Sigma_q^-1 (mu_q - mu_p)
//!                     - D - ln(det Sigma_p / det Sigma_q) ]`.
//!
//! The energy is asymmetric: the first operand plays the role of P, so the
//! caller's direction flag decides which word sits where.

use super::{squared_distance, PairGradient};

pub(crate) fn energy_spherical(mu_i: &[f64], sigma_i: &[f64], mu_j: &[f64], sigma_j: &[f64]) -> f64 {
    let d = mu_i.len() as f64;
    let si = sigma_i[0];
    let sj = sigma_j[0];

    let trace = d * (si / sj);
    let quad = squared_distance(mu_i, mu_j) / sj;
    let log_det = d * (si.ln() - sj.ln());

    -0.5 * (trace + quad - d - log_det)
}

pub(crate) fn energy_diagonal(mu_i: &[f64], sigma_i: &[f64], mu_j: &[f64], sigma_j: &[f64]) -> f64 {
    let d = mu_i.len() as f64;
    let mut acc = 0.0;
    for k in 0..mu_i.len() {
        let si = sigma_i[k];
        let sj = sigma_j[k];
        let delta = mu_j[k] - mu_i[k];
        acc += si / sj + delta * delta / sj - (si.ln() - sj.ln());
    }
    -0.5 * (acc - d)
}

pub(crate) fn gradients_spherical(
    mu_i: &[f64],
    sigma_i: &[f64],
    mu_j: &[f64],
    sigma_j: &[f64],
) -> PairGradient {
    let d = mu_i.len() as f64;
    let si = sigma_i[0];
    let sj = sigma_j[0];

    let dmu_i: Vec<f64> = mu_i
        .iter()
        .zip(mu_j.iter())
        .map(|(mi, mj)| (mj - mi) / sj)
        .collect();
    let dmu_j: Vec<f64> = dmu_i.iter().map(|g| -g).collect();

    let dsigma_i = vec![0.5 * d * (1.0 / si - 1.0 / sj)];
    let quad = squared_distance(mu_i, mu_j);
    let dsigma_j = vec![0.5 * ((d * si + quad) / (sj * sj) - d / sj)];

    PairGradient {
        dmu_i,
        dmu_j,
        dsigma_i,
        dsigma_j,
    }
}

pub(crate) fn gradients_diagonal(
    mu_i: &[f64],
    sigma_i: &[f64],
    mu_j: &[f64],
    sigma_j: &[f64],
) -> PairGradient {
    let d = mu_i.len();
    let mut dmu_i = Vec::with_capacity(d);
    let mut dmu_j = Vec::with_capacity(d);
    let mut dsigma_i = Vec::with_capacity(d);
    let mut dsigma_j = Vec::with_capacity(d);

    for k in 0..d {
        let si = sigma_i[k];
        let sj = sigma_j[k];
        let delta = mu_j[k] - mu_i[k];

        dmu_i.push(delta / sj);
        dmu_j.push(-delta / sj);
        dsigma_i.push(0.5 * (1.0 / si - 1.0 / sj));
        dsigma_j.push(0.5 * ((si + delta * delta) / (sj * sj) - 1.0 / sj));
    }

    PairGradient {
        dmu_i,
        dmu_j,
        dsigma_i,
        dsigma_j,
    }
}
