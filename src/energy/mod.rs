//! Energy functions and their analytic gradients.
//!
//! Two energies (negative KL divergence, expected-likelihood inner product)
//! crossed with two covariance parameterizations (spherical, diagonal) give
//! four code paths. The pair is fixed per embedding at construction as an
//! [`EnergyModel`] and dispatched through a closed enum, so the hot loop
//! never re-resolves the combination.
//!
//! All covariances involved are diagonal or scalar-times-identity, so every
//! inverse and log-determinant is exact closed-form O(D) arithmetic; no
//! matrix decomposition is ever needed.

mod ip;
mod kl;

use crate::config::{CovarianceKind, EnergyKind};

/// Analytic gradient blocks of an energy with respect to both words of a pair.
///
/// Mean gradients have the embedding dimensionality; covariance gradients
/// have length 1 for spherical covariance and the full dimensionality for
/// diagonal covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct PairGradient {
    /// Gradient with respect to the first word's mean.
    pub dmu_i: Vec<f64>,
    /// Gradient with respect to the second word's mean.
    pub dmu_j: Vec<f64>,
    /// Gradient with respect to the first word's covariance.
    pub dsigma_i: Vec<f64>,
    /// Gradient with respect to the second word's covariance.
    pub dsigma_j: Vec<f64>,
}

impl PairGradient {
    /// True if every gradient entry is finite.
    pub fn is_finite(&self) -> bool {
        self.dmu_i.iter().all(|x| x.is_finite())
            && self.dmu_j.iter().all(|x| x.is_finite())
            && self.dsigma_i.iter().all(|x| x.is_finite())
            && self.dsigma_j.iter().all(|x| x.is_finite())
    }
}

/// The energy function and covariance parameterization of an embedding,
/// resolved once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyModel {
    /// Energy function.
    pub kind: EnergyKind,
    /// Covariance parameterization.
    pub covariance: CovarianceKind,
}

impl EnergyModel {
    /// Creates a model for the given combination.
    pub fn new(kind: EnergyKind, covariance: CovarianceKind) -> Self {
        Self { kind, covariance }
    }

    /// Computes `energy(i, j)` for the pair with parameters
    /// `(mu_i, sigma_i)` and `(mu_j, sigma_j)`.
    ///
    /// For the KL energy the first operand plays the role of P in
    /// `-KL(P || Q)`; the IP energy is symmetric.
    pub fn energy(&self, mu_i: &[f64], sigma_i: &[f64], mu_j: &[f64], sigma_j: &[f64]) -> f64 {
        match (self.kind, self.covariance) {
            (EnergyKind::Kl, CovarianceKind::Spherical) => {
                kl::energy_spherical(mu_i, sigma_i, mu_j, sigma_j)
            }
            (EnergyKind::Kl, CovarianceKind::Diagonal) => {
                kl::energy_diagonal(mu_i, sigma_i, mu_j, sigma_j)
            }
            (EnergyKind::Ip, CovarianceKind::Spherical) => {
                ip::energy_spherical(mu_i, sigma_i, mu_j, sigma_j)
            }
            (EnergyKind::Ip, CovarianceKind::Diagonal) => {
                ip::energy_diagonal(mu_i, sigma_i, mu_j, sigma_j)
            }
        }
    }

    /// Computes all four gradient blocks of `energy(i, j)`.
    pub fn gradients(
        &self,
        mu_i: &[f64],
        sigma_i: &[f64],
        mu_j: &[f64],
        sigma_j: &[f64],
    ) -> PairGradient {
        match (self.kind, self.covariance) {
            (EnergyKind::Kl, CovarianceKind::Spherical) => {
                kl::gradients_spherical(mu_i, sigma_i, mu_j, sigma_j)
            }
            (EnergyKind::Kl, CovarianceKind::Diagonal) => {
                kl::gradients_diagonal(mu_i, sigma_i, mu_j, sigma_j)
            }
            (EnergyKind::Ip, CovarianceKind::Spherical) => {
                ip::gradients_spherical(mu_i, sigma_i, mu_j, sigma_j)
            }
            (EnergyKind::Ip, CovarianceKind::Diagonal) => {
                ip::gradients_diagonal(mu_i, sigma_i, mu_j, sigma_j)
            }
        }
    }
}

/// Squared Euclidean distance between two mean vectors.
#[inline]
pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Central finite difference of the energy along one parameter entry.
    fn numeric_grad<F>(f: F, params: &[f64], k: usize) -> f64
    where
        F: Fn(&[f64]) -> f64,
    {
        let h = 1e-5;
        let mut lo = params.to_vec();
        let mut hi = params.to_vec();
        lo[k] -= h;
        hi[k] += h;
        (f(&hi) - f(&lo)) / (2.0 * h)
    }

    fn check_all_blocks(model: EnergyModel, mu_i: &[f64], sigma_i: &[f64], mu_j: &[f64], sigma_j: &[f64]) {
        let grad = model.gradients(mu_i, sigma_i, mu_j, sigma_j);
        assert!(grad.is_finite());

        let tol = 1e-6;
        for k in 0..mu_i.len() {
            let num = numeric_grad(|m| model.energy(m, sigma_i, mu_j, sigma_j), mu_i, k);
            assert!(
                (grad.dmu_i[k] - num).abs() < tol,
                "dmu_i[{}]: analytic {} vs numeric {}",
                k,
                grad.dmu_i[k],
                num
            );

            let num = numeric_grad(|m| model.energy(mu_i, sigma_i, m, sigma_j), mu_j, k);
            assert!(
                (grad.dmu_j[k] - num).abs() < tol,
                "dmu_j[{}]: analytic {} vs numeric {}",
                k,
                grad.dmu_j[k],
                num
            );
        }
        for k in 0..sigma_i.len() {
            let num = numeric_grad(|s| model.energy(mu_i, s, mu_j, sigma_j), sigma_i, k);
            assert!(
                (grad.dsigma_i[k] - num).abs() < tol,
                "dsigma_i[{}]: analytic {} vs numeric {}",
                k,
                grad.dsigma_i[k],
                num
            );

            let num = numeric_grad(|s| model.energy(mu_i, sigma_i, mu_j, s), sigma_j, k);
            assert!(
                (grad.dsigma_j[k] - num).abs() < tol,
                "dsigma_j[{}]: analytic {} vs numeric {}",
                k,
                grad.dsigma_j[k],
                num
            );
        }
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let mu_i = vec![1.0, -1.25, 0.3];
        let mu_j = vec![-0.1, -0.4, 0.9];
        let sph_i = vec![1.3];
        let sph_j = vec![0.8];
        let diag_i = vec![1.3, 0.9, 1.1];
        let diag_j = vec![0.8, 1.4, 0.75];

        for kind in [EnergyKind::Kl, EnergyKind::Ip] {
            check_all_blocks(
                EnergyModel::new(kind, CovarianceKind::Spherical),
                &mu_i,
                &sph_i,
                &mu_j,
                &sph_j,
            );
            check_all_blocks(
                EnergyModel::new(kind, CovarianceKind::Diagonal),
                &mu_i,
                &diag_i,
                &mu_j,
                &diag_j,
            );
        }
    }

    #[test]
    fn test_squared_distance() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![0.0, 0.0, 3.0];
        assert!((squared_distance(&a, &b) - 5.0).abs() < 1e-12);
    }
}
