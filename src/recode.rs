//! Column recoding: yes/no normalization, fixed label maps, binning, and
//! min-max scaling.

use crate::frame::Frame;
use anyhow::Result;
use tracing::debug;

/// Returns 1/0 for a yes/no cell (case-insensitive, trimmed), None otherwise.
pub fn yes_no(value: &str) -> Option<u8> {
    match value.trim().to_lowercase().as_str() {
        "yes" => Some(1),
        "no" => Some(0),
        _ => None,
    }
}

/// True if every non-missing value of the column is yes/no.
pub fn is_yes_no_column(frame: &Frame, name: &str) -> bool {
    match frame.column(name) {
        Some(col) => {
            let mut seen_any = false;
            for v in col.values.iter().flatten() {
                if yes_no(v).is_none() {
                    return false;
                }
                seen_any = true;
            }
            seen_any
        }
        None => false,
    }
}

/// Recodes a yes/no column to 1/0 in place. Non-yes/no cells become missing.
pub fn recode_yes_no(frame: &mut Frame, name: &str) -> Result<()> {
    let Some(col) = frame.column(name) else {
        return Ok(());
    };
    let values: Vec<Option<String>> = col
        .values
        .iter()
        .map(|v| {
            v.as_deref()
                .and_then(yes_no)
                .map(|n| n.to_string())
        })
        .collect();
    frame.set_column(name, values)
}

/// Recodes every column whose non-missing values are all yes/no,
/// skipping the listed columns.
pub fn recode_all_yes_no(frame: &mut Frame, skip: &[&str]) -> Result<()> {
    let names: Vec<String> = frame
        .names()
        .iter()
        .filter(|n| !skip.contains(n))
        .map(|n| n.to_string())
        .collect();
    for name in names {
        if is_yes_no_column(frame, &name) {
            recode_yes_no(frame, &name)?;
        }
    }
    Ok(())
}

/// Maps fixed labels of a column to 1/0. Unknown labels become missing.
pub fn recode_binary_labels(
    frame: &mut Frame,
    name: &str,
    one_label: &str,
    zero_label: &str,
) -> Result<()> {
    let Some(col) = frame.column(name) else {
        return Ok(());
    };
    let values: Vec<Option<String>> = col
        .values
        .iter()
        .map(|v| match v.as_deref() {
            Some(s) if s == one_label => Some("1".to_string()),
            Some(s) if s == zero_label => Some("0".to_string()),
            _ => None,
        })
        .collect();
    frame.set_column(name, values)
}

/// Labeled half-open ranges for a continuous column.
///
/// Edges follow `(lower, upper]` semantics: a value maps to the first bin
/// whose upper edge it does not exceed. The last bin is unbounded above.
pub struct BinSpec {
    /// Interior upper edges, ascending. One fewer than `labels`.
    pub edges: Vec<f64>,
    pub labels: Vec<&'static str>,
}

impl BinSpec {
    pub fn label_for(&self, value: f64) -> &'static str {
        for (edge, label) in self.edges.iter().zip(&self.labels) {
            if value <= *edge {
                return label;
            }
        }
        self.labels[self.labels.len() - 1]
    }
}

/// Replaces a continuous column with its binned labels in place.
/// Missing or non-numeric cells stay missing. Absent columns are a no-op.
pub fn apply_binning(frame: &mut Frame, name: &str, spec: &BinSpec) -> Result<()> {
    let Some(numeric) = frame.numeric(name) else {
        return Ok(());
    };
    let values: Vec<Option<String>> = numeric
        .iter()
        .map(|v| v.map(|x| spec.label_for(x).to_string()))
        .collect();
    frame.set_column(name, values)?;
    debug!(column = name, "binning applied");
    Ok(())
}

/// The study's standard bins for the four continuous background variables.
pub fn standard_bins() -> Vec<(&'static str, BinSpec)> {
    vec![
        (
            "age",
            BinSpec {
                edges: vec![24.0, 30.0],
                labels: vec!["<25", "25-30", ">30"],
            },
        ),
        (
            "BMI",
            BinSpec {
                edges: vec![24.9],
                labels: vec!["<25", ">=25"],
            },
        ),
        (
            "gestational_age_wk",
            BinSpec {
                edges: vec![36.0, 38.0],
                labels: vec!["<37", "37-38", ">=39"],
            },
        ),
        (
            "fetal_weight_est",
            BinSpec {
                edges: vec![2499.0],
                labels: vec!["<2500", ">=2500"],
            },
        ),
    ]
}

/// Applies all standard bins to the frame. Absent columns are skipped.
pub fn apply_standard_bins(frame: &mut Frame) -> Result<()> {
    for (name, spec) in standard_bins() {
        apply_binning(frame, name, &spec)?;
    }
    Ok(())
}

/// Min-max scales a numeric vector into [0, 1].
/// A constant (or empty) vector scales to 0.0 everywhere.
pub fn min_max_scale(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_yes_no_variants() {
        assert_eq!(yes_no("Yes"), Some(1));
        assert_eq!(yes_no(" no "), Some(0));
        assert_eq!(yes_no("YES"), Some(1));
        assert_eq!(yes_no("maybe"), None);
    }

    #[test]
    fn test_recode_all_yes_no_skips_mixed() {
        let mut f =
            Frame::from_csv_str("a,b,outcome\nYes,Yes,Yes\nNo,sometimes,No\n").unwrap();
        recode_all_yes_no(&mut f, &["outcome"]).unwrap();
        assert_eq!(f.get("a", 0), Some("1"));
        assert_eq!(f.get("a", 1), Some("0"));
        // b has a non-yes/no value, so the whole column is left alone
        assert_eq!(f.get("b", 1), Some("sometimes"));
        // outcome is skipped
        assert_eq!(f.get("outcome", 0), Some("Yes"));
    }

    #[test]
    fn test_recode_binary_labels() {
        let mut f = Frame::from_csv_str("grp\nA\nB\nC\n").unwrap();
        recode_binary_labels(&mut f, "grp", "A", "B").unwrap();
        assert_eq!(f.get("grp", 0), Some("1"));
        assert_eq!(f.get("grp", 1), Some("0"));
        assert_eq!(f.get("grp", 2), None);
    }

    #[test]
    fn test_bin_edges_inclusive_upper() {
        let spec = BinSpec {
            edges: vec![24.0, 30.0],
            labels: vec!["<25", "25-30", ">30"],
        };
        assert_eq!(spec.label_for(24.0), "<25");
        assert_eq!(spec.label_for(24.1), "25-30");
        assert_eq!(spec.label_for(30.0), "25-30");
        assert_eq!(spec.label_for(30.5), ">30");
    }

    #[test]
    fn test_apply_binning_keeps_missing() {
        let mut f = Frame::from_csv_str("id,age\n1,23\n2,\n3,42\n4,unknown\n").unwrap();
        let spec = BinSpec {
            edges: vec![24.0, 30.0],
            labels: vec!["<25", "25-30", ">30"],
        };
        apply_binning(&mut f, "age", &spec).unwrap();
        assert_eq!(f.get("age", 0), Some("<25"));
        assert_eq!(f.get("age", 1), None);
        assert_eq!(f.get("age", 2), Some(">30"));
        assert_eq!(f.get("age", 3), None);
    }

    #[test]
    fn test_apply_binning_absent_column_is_noop() {
        let mut f = Frame::from_csv_str("x\n1\n").unwrap();
        let spec = BinSpec {
            edges: vec![0.0],
            labels: vec!["lo", "hi"],
        };
        apply_binning(&mut f, "missing", &spec).unwrap();
        assert_eq!(f.n_cols(), 1);
    }

    #[test]
    fn test_min_max_scale() {
        let scaled = min_max_scale(&[2.0, 4.0, 6.0]);
        assert_abs_diff_eq!(scaled[0], 0.0);
        assert_abs_diff_eq!(scaled[1], 0.5);
        assert_abs_diff_eq!(scaled[2], 1.0);
    }

    #[test]
    fn test_min_max_scale_constant() {
        assert_eq!(min_max_scale(&[3.0, 3.0]), vec![0.0, 0.0]);
        assert!(min_max_scale(&[]).is_empty());
    }
}
