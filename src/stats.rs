//! Classical two-group tests used by the descriptive table: Welch's t-test
//! for the standardized scores and the chi-square test of independence for
//! categorical variables.

use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

/// Arithmetic mean. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator). Returns 0.0 when fewer
/// than two values.
pub fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Percentage of `part` in `total`; 0.0 when the denominator is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Result of a two-sample test.
#[derive(Debug, Clone, Copy)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Welch's unequal-variance t-test. Degrees of freedom via
/// Welch-Satterthwaite. Returns None when either group has fewer than two
/// observations or both variances are zero.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Option<TestResult> {
    if a.len() < 2 || b.len() < 2 {
        return None;
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (ma, mb) = (mean(a), mean(b));
    let (va, vb) = (stddev(a).powi(2), stddev(b).powi(2));

    let se2 = va / na + vb / nb;
    if se2 <= 0.0 {
        return None;
    }

    let t = (ma - mb) / se2.sqrt();
    let df = se2.powi(2)
        / ((va / na).powi(2) / (na - 1.0) + (vb / nb).powi(2) / (nb - 1.0));
    if !df.is_finite() || df <= 0.0 {
        return None;
    }

    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p = 2.0 * (1.0 - dist.cdf(t.abs()));
    Some(TestResult {
        statistic: t,
        p_value: p,
    })
}

/// Pearson chi-square test of independence on an r x c table of observed
/// counts. Applies the Yates continuity correction when df == 1, matching
/// the usual convention for 2x2 tables.
///
/// Returns None for degenerate tables (any dimension < 2, ragged rows, or
/// a zero marginal).
pub fn chi_square_test(observed: &[Vec<f64>]) -> Option<TestResult> {
    let n_rows = observed.len();
    let n_cols = observed.first()?.len();
    if n_rows < 2 || n_cols < 2 || observed.iter().any(|r| r.len() != n_cols) {
        return None;
    }

    let row_totals: Vec<f64> = observed.iter().map(|r| r.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..n_cols)
        .map(|j| observed.iter().map(|r| r[j]).sum())
        .collect();
    let grand: f64 = row_totals.iter().sum();
    if grand <= 0.0
        || row_totals.iter().any(|&t| t <= 0.0)
        || col_totals.iter().any(|&t| t <= 0.0)
    {
        return None;
    }

    let df = ((n_rows - 1) * (n_cols - 1)) as f64;
    let yates = df == 1.0;

    let mut stat = 0.0;
    for (i, row) in observed.iter().enumerate() {
        for (j, &o) in row.iter().enumerate() {
            let e = row_totals[i] * col_totals[j] / grand;
            let mut diff = (o - e).abs();
            if yates {
                diff = (diff - 0.5).max(0.0);
            }
            stat += diff * diff / e;
        }
    }

    let dist = ChiSquared::new(df).ok()?;
    let p = 1.0 - dist.cdf(stat);
    Some(TestResult {
        statistic: stat,
        p_value: p,
    })
}

/// Formats a p-value the way the report tables expect: `<.001` below
/// 0.001, otherwise three decimals.
pub fn format_p(p: f64) -> String {
    if p < 0.001 {
        "<.001".to_string()
    } else {
        format!("{:.3}", p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_and_stddev() {
        assert_abs_diff_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_abs_diff_eq!(
            stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]),
            2.138,
            epsilon = 1e-3
        );
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(stddev(&[5.0]), 0.0);
    }

    #[test]
    fn test_pct_zero_denominator() {
        assert_eq!(pct(10, 0), 0.0);
        assert_abs_diff_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_welch_identical_groups() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let r = welch_t_test(&a, &a).unwrap();
        assert_abs_diff_eq!(r.statistic, 0.0);
        assert_abs_diff_eq!(r.p_value, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_welch_separated_groups() {
        let a = [1.0, 1.1, 0.9, 1.0, 1.05];
        let b = [5.0, 5.1, 4.9, 5.0, 5.05];
        let r = welch_t_test(&a, &b).unwrap();
        assert!(r.p_value < 0.001);
    }

    #[test]
    fn test_welch_too_small() {
        assert!(welch_t_test(&[1.0], &[2.0, 3.0]).is_none());
    }

    #[test]
    fn test_chi_square_independent_table() {
        // Perfectly proportional table: statistic ~ 0 after correction
        let table = vec![vec![20.0, 20.0], vec![30.0, 30.0]];
        let r = chi_square_test(&table).unwrap();
        assert!(r.p_value > 0.5);
    }

    #[test]
    fn test_chi_square_associated_table() {
        let table = vec![vec![40.0, 5.0], vec![5.0, 40.0]];
        let r = chi_square_test(&table).unwrap();
        assert!(r.p_value < 0.001);
    }

    #[test]
    fn test_chi_square_yates_applied_for_2x2() {
        // Without correction this 2x2 gives a larger statistic
        let table = vec![vec![10.0, 15.0], vec![15.0, 10.0]];
        let corrected = chi_square_test(&table).unwrap();
        let mut stat_uncorrected = 0.0;
        let e = 12.5;
        for row in &table {
            for &o in row {
                stat_uncorrected += (o - e) * (o - e) / e;
            }
        }
        assert!(corrected.statistic < stat_uncorrected);
    }

    #[test]
    fn test_chi_square_degenerate() {
        assert!(chi_square_test(&[vec![1.0, 2.0]]).is_none());
        assert!(chi_square_test(&[vec![1.0], vec![2.0]]).is_none());
        assert!(chi_square_test(&[vec![0.0, 0.0], vec![0.0, 0.0]]).is_none());
    }

    #[test]
    fn test_format_p() {
        assert_eq!(format_p(0.0004), "<.001");
        assert_eq!(format_p(0.0312), "0.031");
        assert_eq!(format_p(0.5), "0.500");
    }
}
