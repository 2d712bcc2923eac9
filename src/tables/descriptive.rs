//! Table 1: descriptive statistics by delivery preference.
//!
//! Continuous variables get mean ± SD per group with Welch's t-test;
//! everything else is tabulated per level with group percentages and a
//! chi-square test.

use crate::frame::Frame;
use crate::output::Sheet;
use crate::recode::apply_standard_bins;
use crate::stats::{chi_square_test, format_p, mean, pct, stddev, welch_t_test};
use crate::tables::types::DescriptiveRow;
use crate::tables::{CONTINUOUS_VARS, OUTCOME};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Row masks for the Yes and No outcome groups (case-insensitive).
fn group_masks(frame: &Frame) -> Result<(Vec<bool>, Vec<bool>)> {
    let col = frame
        .column(OUTCOME)
        .with_context(|| format!("column '{}' not found", OUTCOME))?;
    let yes: Vec<bool> = col
        .values
        .iter()
        .map(|v| v.as_deref().is_some_and(|s| s.trim().eq_ignore_ascii_case("yes")))
        .collect();
    let no: Vec<bool> = col
        .values
        .iter()
        .map(|v| v.as_deref().is_some_and(|s| s.trim().eq_ignore_ascii_case("no")))
        .collect();
    Ok((yes, no))
}

fn numeric_subset(values: &[Option<f64>], mask: Option<&[bool]>) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| mask.is_none_or(|m| m[*i]))
        .filter_map(|(_, v)| *v)
        .collect()
}

fn mean_sd(values: &[f64]) -> String {
    format!("{:.2} ± {:.2}", mean(values), stddev(values))
}

fn continuous_row(frame: &Frame, var: &str, yes: &[bool], no: &[bool]) -> Option<DescriptiveRow> {
    let values = frame.numeric(var)?;
    let all = numeric_subset(&values, None);
    let group_yes = numeric_subset(&values, Some(yes));
    let group_no = numeric_subset(&values, Some(no));
    if all.is_empty() {
        return None;
    }

    let p_text = match welch_t_test(&group_yes, &group_no) {
        Some(t) => format_p(t.p_value),
        None => "N/A".to_string(),
    };

    Some(DescriptiveRow {
        variable: var.to_string(),
        category: "Mean ± SD".to_string(),
        total: mean_sd(&all),
        group_yes: mean_sd(&group_yes),
        group_no: mean_sd(&group_no),
        p_value: p_text,
        test: "t-test".to_string(),
    })
}

fn count_level(frame: &Frame, var: &str, level: &str, mask: &[bool]) -> usize {
    let Some(col) = frame.column(var) else { return 0 };
    col.values
        .iter()
        .enumerate()
        .filter(|(i, v)| mask[*i] && v.as_deref() == Some(level))
        .count()
}

fn categorical_rows(
    frame: &Frame,
    var: &str,
    yes: &[bool],
    no: &[bool],
    n_yes_total: usize,
    n_no_total: usize,
    n_all_total: usize,
) -> Vec<DescriptiveRow> {
    let levels = frame.distinct(var);
    if levels.is_empty() {
        return Vec::new();
    }

    // Contingency: levels x (Yes, No)
    let table: Vec<Vec<f64>> = levels
        .iter()
        .map(|level| {
            vec![
                count_level(frame, var, level, yes) as f64,
                count_level(frame, var, level, no) as f64,
            ]
        })
        .collect();
    let p_text = match chi_square_test(&table) {
        Some(t) => format_p(t.p_value),
        None => "N/A".to_string(),
    };

    let mut rows = Vec::new();
    for (i, level) in levels.iter().enumerate() {
        let n_y = table[i][0] as usize;
        let n_n = table[i][1] as usize;
        let n_total = n_y + n_n;
        let first = i == 0;

        rows.push(DescriptiveRow {
            variable: if first { var.to_string() } else { String::new() },
            category: level.clone(),
            total: format!("{} ({:.1}%)", n_total, pct(n_total, n_all_total)),
            group_yes: format!("{} ({:.1}%)", n_y, pct(n_y, n_yes_total)),
            group_no: format!("{} ({:.1}%)", n_n, pct(n_n, n_no_total)),
            p_value: if first { p_text.clone() } else { String::new() },
            test: if first {
                "Chi-square".to_string()
            } else {
                String::new()
            },
        });
    }
    rows
}

/// Builds the Table 1 sheet from a master frame.
pub fn build(frame: &Frame) -> Result<Sheet> {
    let mut frame = frame.clone();
    apply_standard_bins(&mut frame)?;

    // Exclude rows with a missing outcome
    let outcome_present: Vec<bool> = frame
        .column(OUTCOME)
        .with_context(|| format!("column '{}' not found", OUTCOME))?
        .values
        .iter()
        .map(|v| v.is_some())
        .collect();
    frame.retain_rows(&outcome_present)?;

    let (yes, no) = group_masks(&frame)?;
    let n_yes_total = yes.iter().filter(|b| **b).count();
    let n_no_total = no.iter().filter(|b| **b).count();
    let n_all_total = frame.n_rows();

    let mut sheet = Sheet::new(
        "Descriptive_Statistics",
        &[
            "Variable",
            "Category",
            &format!("Total (N={})", n_all_total),
            &format!("Group_Yes (N={})", n_yes_total),
            &format!("Group_No (N={})", n_no_total),
            "p-value",
            "Test",
        ],
    );

    let features: Vec<String> = frame
        .names()
        .iter()
        .filter(|n| **n != OUTCOME)
        .map(|n| n.to_string())
        .collect();

    for var in &features {
        if frame.distinct(var).is_empty() {
            debug!(variable = %var, "skipped: no non-missing values");
            continue;
        }

        if CONTINUOUS_VARS.contains(&var.as_str()) {
            match continuous_row(&frame, var, &yes, &no) {
                Some(row) => sheet.push_row(row.cells()),
                None => warn!(variable = %var, "continuous summary unavailable"),
            }
            continue;
        }

        for row in categorical_rows(
            &frame,
            var,
            &yes,
            &no,
            n_yes_total,
            n_no_total,
            n_all_total,
        ) {
            sheet.push_row(row.cells());
        }
    }

    info!(
        variables = features.len(),
        rows = sheet.rows.len(),
        n = n_all_total,
        "descriptive table built"
    );
    Ok(sheet)
}

/// Loads the master CSV, builds Table 1, and writes the workbook.
#[tracing::instrument(skip_all, fields(input = %input.as_ref().display()))]
pub fn run(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    let frame = Frame::from_csv_path(input)?;
    let sheet = build(&frame)?;
    crate::output::write_tables(output, &[sheet])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> Frame {
        Frame::from_csv_str(
            "delivery_pref,anemia,fear_score_std,age\n\
             Yes,Yes,0.8,23\n\
             Yes,No,0.9,27\n\
             No,No,0.1,33\n\
             No,No,0.2,29\n\
             ,Yes,0.5,40\n",
        )
        .unwrap()
    }

    #[test]
    fn test_outcome_missing_excluded_from_totals() {
        let sheet = build(&master()).unwrap();
        assert!(sheet.headers[2].contains("N=4"));
        assert!(sheet.headers[3].contains("N=2"));
        assert!(sheet.headers[4].contains("N=2"));
    }

    #[test]
    fn test_continuous_variable_row() {
        let sheet = build(&master()).unwrap();
        let row = sheet
            .rows
            .iter()
            .find(|r| r[0] == "fear_score_std")
            .unwrap();
        assert_eq!(row[1], "Mean ± SD");
        assert_eq!(row[6], "t-test");
        // total over the four kept rows: mean 0.5
        assert!(row[2].starts_with("0.50 ±"));
    }

    #[test]
    fn test_categorical_levels_and_percentages() {
        let sheet = build(&master()).unwrap();
        let anemia_rows: Vec<_> = sheet
            .rows
            .iter()
            .filter(|r| r[0] == "anemia" || (r[0].is_empty() && r[1] == "Yes"))
            .collect();
        // first anemia row carries the variable name and test label
        let first = sheet.rows.iter().find(|r| r[0] == "anemia").unwrap();
        assert_eq!(first[6], "Chi-square");
        assert!(!anemia_rows.is_empty());
        // level "No": 3 of 4 kept rows
        let no_row = sheet
            .rows
            .iter()
            .find(|r| (r[0] == "anemia" || r[0].is_empty()) && r[1] == "No")
            .unwrap();
        assert!(no_row[2].starts_with("3 (75.0%)"));
    }

    #[test]
    fn test_age_is_binned() {
        let sheet = build(&master()).unwrap();
        assert!(sheet.rows.iter().any(|r| r[1] == "<25"));
        assert!(sheet.rows.iter().any(|r| r[1] == "25-30"));
        assert!(sheet.rows.iter().any(|r| r[1] == ">30"));
    }
}
