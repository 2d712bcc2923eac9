//! IRLS fitting for the binomial-logit model.
//!
//! Each iteration linearizes the likelihood around the current fit and
//! solves a weighted least squares system: working weights w = mu(1 - mu),
//! working response z = eta + (y - mu) / w, then (X'WX) beta = X'Wz via
//! Cholesky with an LU fallback.

use crate::logit::error::{LogitError, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

/// Fitting options. Defaults match the report pipeline: generous iteration
/// budget, tight deviance tolerance.
#[derive(Debug, Clone)]
pub struct LogitConfig {
    pub max_iterations: usize,
    /// Relative deviance change below which the fit is converged.
    pub tolerance: f64,
    /// Lower clamp on working weights to keep the system well-conditioned.
    pub min_weight: f64,
}

impl Default for LogitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            min_weight: 1e-10,
        }
    }
}

/// A fitted logit model.
#[derive(Debug, Clone)]
pub struct LogitFit {
    pub coefficients: Array1<f64>,
    /// Unscaled covariance (X'WX)^-1 at the final weights.
    pub covariance: Array2<f64>,
    pub labels: Vec<String>,
    pub fitted: Array1<f64>,
    pub log_likelihood: f64,
    /// Intercept-only log-likelihood, for the LLR test and pseudo-R2.
    pub null_log_likelihood: f64,
    pub deviance: f64,
    pub iterations: usize,
    pub converged: bool,
    pub nobs: usize,
}

impl LogitFit {
    pub fn std_errors(&self) -> Array1<f64> {
        (0..self.coefficients.len())
            .map(|j| self.covariance[[j, j]].max(0.0).sqrt())
            .collect()
    }

    /// Number of non-intercept coefficients.
    pub fn df_model(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Likelihood-ratio statistic against the intercept-only model.
    pub fn llr(&self) -> f64 {
        2.0 * (self.log_likelihood - self.null_log_likelihood)
    }

    /// Chi-square p-value for the LLR test; None when df is zero.
    pub fn llr_pvalue(&self) -> Option<f64> {
        let df = self.df_model();
        if df == 0 {
            return None;
        }
        let dist = ChiSquared::new(df as f64).ok()?;
        Some(1.0 - dist.cdf(self.llr().max(0.0)))
    }

    /// McFadden's pseudo-R2: 1 - ll / ll_null.
    pub fn pseudo_r2(&self) -> f64 {
        if self.null_log_likelihood == 0.0 {
            return 0.0;
        }
        1.0 - self.log_likelihood / self.null_log_likelihood
    }
}

fn sigmoid(eta: f64) -> f64 {
    1.0 / (1.0 + (-eta).exp())
}

fn clamp_mu(mu: f64) -> f64 {
    mu.clamp(1e-10, 1.0 - 1e-10)
}

fn log_likelihood(y: &Array1<f64>, mu: &Array1<f64>) -> f64 {
    y.iter()
        .zip(mu.iter())
        .map(|(&yi, &mui)| yi * mui.ln() + (1.0 - yi) * (1.0 - mui).ln())
        .sum()
}

fn null_log_likelihood(y: &Array1<f64>) -> f64 {
    let n = y.len() as f64;
    let p = y.iter().sum::<f64>() / n;
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    n * (p * p.ln() + (1.0 - p) * (1.0 - p).ln())
}

/// Solves (X'WX) beta = X'Wz, returning the solution and (X'WX)^-1.
fn weighted_least_squares(
    x: &Array2<f64>,
    z: &Array1<f64>,
    w: &Array1<f64>,
) -> Result<(Array1<f64>, Array2<f64>)> {
    let n = x.nrows();
    let p = x.ncols();

    // Scale rows by sqrt(w) so X'WX = Xw'Xw
    let mut xw = DMatrix::zeros(n, p);
    for i in 0..n {
        let sw = w[i].sqrt();
        for j in 0..p {
            xw[(i, j)] = x[[i, j]] * sw;
        }
    }
    let zw = DVector::from_iterator(n, z.iter().zip(w.iter()).map(|(&zi, &wi)| zi * wi.sqrt()));

    let xtx = xw.transpose() * &xw;
    let xtz = xw.transpose() * zw;

    let beta = match xtx.clone().cholesky() {
        Some(chol) => chol.solve(&xtz),
        None => xtx
            .clone()
            .lu()
            .solve(&xtz)
            .ok_or(LogitError::SingularSystem)?,
    };

    let inv = match xtx.clone().cholesky() {
        Some(chol) => chol.solve(&DMatrix::identity(p, p)),
        None => xtx.try_inverse().ok_or(LogitError::SingularSystem)?,
    };

    let coefficients = Array1::from_iter(beta.iter().copied());
    let mut covariance = Array2::zeros((p, p));
    for i in 0..p {
        for j in 0..p {
            covariance[[i, j]] = inv[(i, j)];
        }
    }
    Ok((coefficients, covariance))
}

/// Fits `y ~ X` with a binomial family and logit link.
///
/// `x` must carry its own intercept column; `labels` names the columns and
/// is stored on the result for reporting.
pub fn fit_logit(
    y: &Array1<f64>,
    x: &Array2<f64>,
    labels: Vec<String>,
    config: &LogitConfig,
) -> Result<LogitFit> {
    let n = y.len();
    let p = x.ncols();
    if n == 0 {
        return Err(LogitError::EmptyInput("y is empty".to_string()));
    }
    if p == 0 {
        return Err(LogitError::EmptyInput("X has no columns".to_string()));
    }
    if x.nrows() != n {
        return Err(LogitError::DimensionMismatch(format!(
            "X has {} rows but y has {}",
            x.nrows(),
            n
        )));
    }
    if labels.len() != p {
        return Err(LogitError::DimensionMismatch(format!(
            "{} labels for {} columns",
            labels.len(),
            p
        )));
    }
    if let Some(&bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(LogitError::InvalidResponse(bad));
    }

    // Standard binomial start: shrink y halfway toward 0.5
    let mut mu: Array1<f64> = y.mapv(|yi| (yi + 0.5) / 2.0);
    let mut eta: Array1<f64> = mu.mapv(|m| (m / (1.0 - m)).ln());
    let mut deviance = -2.0 * log_likelihood(y, &mu);

    let mut coefficients = Array1::zeros(p);
    let mut covariance = Array2::zeros((p, p));
    let mut converged = false;
    let mut iteration = 0;

    while iteration < config.max_iterations {
        iteration += 1;

        let weights: Array1<f64> = mu.mapv(|m| (m * (1.0 - m)).max(config.min_weight));
        let z: Array1<f64> = eta
            .iter()
            .zip(y.iter())
            .zip(mu.iter())
            .zip(weights.iter())
            .map(|(((&e, &yi), &mui), &w)| e + (yi - mui) / w)
            .collect();

        let (beta, cov) = weighted_least_squares(x, &z, &weights)?;
        eta = x.dot(&beta);
        mu = eta.mapv(|e| clamp_mu(sigmoid(e)));

        let deviance_old = deviance;
        deviance = -2.0 * log_likelihood(y, &mu);

        coefficients = beta;
        covariance = cov;

        let rel_change = if deviance_old.abs() > 1e-10 {
            (deviance_old - deviance).abs() / deviance_old.abs()
        } else {
            (deviance_old - deviance).abs()
        };
        if rel_change < config.tolerance {
            converged = true;
            break;
        }
    }

    let log_lik = log_likelihood(y, &mu);
    debug!(
        iterations = iteration,
        converged,
        deviance,
        "logit fit finished"
    );

    Ok(LogitFit {
        coefficients,
        covariance,
        labels,
        fitted: mu,
        log_likelihood: log_lik,
        null_log_likelihood: null_log_likelihood(y),
        deviance,
        iterations: iteration,
        converged,
        nobs: n,
    })
}
