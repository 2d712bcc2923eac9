//! Wald inference on fitted coefficients: z p-values, confidence
//! intervals, and odds-ratio transforms.

use statrs::distribution::{ContinuousCDF, Normal};

/// Two-tailed p-value for a z-statistic (coefficient / standard error).
pub fn pvalue_z(z: f64) -> f64 {
    if !z.is_finite() {
        return f64::NAN;
    }
    let normal = Normal::new(0.0, 1.0).expect("standard normal");
    2.0 * (1.0 - normal.cdf(z.abs()))
}

/// Normal-approximation confidence interval for a coefficient.
pub fn confidence_interval_z(estimate: f64, std_error: f64, confidence: f64) -> (f64, f64) {
    if !estimate.is_finite() || !std_error.is_finite() || std_error <= 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let normal = Normal::new(0.0, 1.0).expect("standard normal");
    let alpha = 1.0 - confidence;
    let z_critical = normal.inverse_cdf(1.0 - alpha / 2.0);
    let margin = z_critical * std_error;
    (estimate - margin, estimate + margin)
}

/// Odds ratio with its confidence interval: exp of the coefficient CI.
pub fn odds_ratio_ci(coef: f64, std_error: f64, confidence: f64) -> (f64, f64, f64) {
    let (lo, hi) = confidence_interval_z(coef, std_error, confidence);
    (coef.exp(), lo.exp(), hi.exp())
}
