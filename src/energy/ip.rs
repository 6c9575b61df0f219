//! Expected-likelihood inner product energy.
//!
//! `energy(i, j) = log N(0; mu_i - mu_j, Sigma_i + Sigma_j)`: the log-density
//! of a zero-mean Gaussian with mean offset `mu_i - mu_j` and covariance
//! `Sigma_i + Sigma_j`, evaluated at the origin. Symmetric in its operands.

use super::{squared_distance, PairGradient};

/// ln(2 * pi)
const LN_2PI: f64 = 1.837_877_066_409_345_3;

pub(crate) fn energy_spherical(mu_i: &[f64], sigma_i: &[f64], mu_j: &[f64], sigma_j: &[f64]) -> f64 {
    let d = mu_i.len() as f64;
    let s = sigma_i[0] + sigma_j[0];
    let quad = squared_distance(mu_i, mu_j);

    -0.5 * d * LN_2PI - 0.5 * d * s.ln() - 0.5 * quad / s
}

pub(crate) fn energy_diagonal(mu_i: &[f64], sigma_i: &[f64], mu_j: &[f64], sigma_j: &[f64]) -> f64 {
    let d = mu_i.len() as f64;
    let mut log_det = 0.0;
    let mut quad = 0.0;
    for k in 0..mu_i.len() {
        let s = sigma_i[k] + sigma_j[k];
        let delta = mu_i[k] - mu_j[k];
        log_det += s.ln();
        quad += delta * delta / s;
    }
    -0.5 * d * LN_2PI - 0.5 * log_det - 0.5 * quad
}

pub(crate) fn gradients_spherical(
    mu_i: &[f64],
    sigma_i: &[f64],
    mu_j: &[f64],
    sigma_j: &[f64],
) -> PairGradient {
    let d = mu_i.len() as f64;
    let s = sigma_i[0] + sigma_j[0];

    let dmu_i: Vec<f64> = mu_i
        .iter()
        .zip(mu_j.iter())
        .map(|(mi, mj)| -(mi - mj) / s)
        .collect();
    let dmu_j: Vec<f64> = dmu_i.iter().map(|g| -g).collect();

    // The covariance enters only through the sum, so both sides share the
    // same derivative.
    let quad = squared_distance(mu_i, mu_j);
    let dsigma = -0.5 * d / s + 0.5 * quad / (s * s);

    PairGradient {
        dmu_i,
        dmu_j,
        dsigma_i: vec![dsigma],
        dsigma_j: vec![dsigma],
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

    for k in 0..d {
        let s = sigma_i[k] + sigma_j[k];
        let delta = mu_i[k] - mu_j[k];

        dmu_i.push(-delta / s);
        dmu_j.push(delta / s);
        dsigma_i.push(-0.5 / s + 0.5 * delta * delta / (s * s));
    }
    let dsigma_j = dsigma_i.clone();

    PairGradient {
        dmu_i,
        dmu_j,
        dsigma_i,
        dsigma_j,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_form_value_spherical() {
        // mu_1 = (1, -1.25), mu_2 = (-0.1, -0.4), s_1 = 5, s_2 = 0.8.
        // log N(0; mu_1 - mu_2, 5.8 I) computed independently with scipy's
        // multivariate_normal.
        let mu_1 = vec![1.0, -1.25];
        let mu_2 = vec![-0.1, -0.4];
        let e = energy_spherical(&mu_1, &[5.0], &mu_2, &[0.8]);
        assert!((e - (-3.762_329_811_547_926)).abs() < 1e-6);
    }

    #[test]
    fn test_closed_form_value_diagonal() {
        // Same means, sigma_1 = (5, 5.5), sigma_2 = (0.8, 1.1); the combined
        // covariance is diag(5.8, 6.6).
        let mu_1 = vec![1.0, -1.25];
        let mu_2 = vec![-0.1, -0.4];
        let e = energy_diagonal(&mu_1, &[5.0, 5.5], &mu_2, &[0.8, 1.1]);
        assert!((e - (-3.819_386_043_014_157)).abs() < 1e-6);
    }

    #[test]
    fn test_symmetry() {
        let mu_1 = vec![0.3, -0.7, 1.1];
        let mu_2 = vec![-0.2, 0.4, 0.8];
        let s_1 = vec![1.2, 0.9, 1.4];
        let s_2 = vec![0.8, 1.1, 0.7];

        let e12 = energy_diagonal(&mu_1, &s_1, &mu_2, &s_2);
        let e21 = energy_diagonal(&mu_2, &s_2, &mu_1, &s_1);
        assert!((e12 - e21).abs() < 1e-12);

        let e12 = energy_spherical(&mu_1, &s_1[..1], &mu_2, &s_2[..1]);
        let e21 = energy_spherical(&mu_2, &s_2[..1], &mu_1, &s_1[..1]);
        assert!((e12 - e21).abs() < 1e-12);
    }

    #[test]
    fn test_self_energy_is_finite_and_maximal_over_mean_shift() {
        // The self energy is well-defined; shifting one mean away from the
        // other can only lower the score.
        let mu = vec![0.5, 0.5];
        let sigma = vec![1.5];

        let self_e = energy_spherical(&mu, &sigma, &mu, &sigma);
        assert!(self_e.is_finite());

        let shifted = vec![0.9, 0.1];
        let shifted_e = energy_spherical(&mu, &sigma, &shifted, &sigma);
        assert!(shifted_e < self_e);
    }

    #[test]
    fn test_spherical_matches_diagonal_with_equal_entries() {
        let mu_1 = vec![0.3, -0.7];
        let mu_2 = vec![-0.2, 0.4];

        let e_sph = energy_spherical(&mu_1, &[1.3], &mu_2, &[0.9]);
        let e_diag = energy_diagonal(&mu_1, &[1.3, 1.3], &mu_2, &[0.9, 0.9]);
        assert!((e_sph - e_diag).abs() < 1e-12);
    }
}
