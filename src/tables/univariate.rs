//! Table 2: one logistic regression per candidate predictor.

use crate::frame::Frame;
use crate::logit::{DesignMatrix, LogitConfig, LogitFit, Term, fit_logit, odds_ratio_ci, pvalue_z};
use crate::output::Sheet;
use crate::tables::types::UnivariateRow;
use crate::tables::{OUTCOME, format_p_model, prepare_model_frame, term_for, term_level};
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info, warn};

/// Raw scale sums are excluded; only their standardized versions enter.
const EXCLUDED_VARS: &[&str] = &["fear_score", "knowledge_score"];

const HEADERS: &[&str] = &[
    "Variable",
    "Level",
    "OR",
    "95% CI",
    "p_value",
    "LLR",
    "LLR_p_value",
    "Pseudo_R2",
    "N",
];

fn llr_p_text(fit: &LogitFit) -> String {
    match fit.llr_pvalue() {
        Some(p) => format_p_model(p),
        None => "N/A".to_string(),
    }
}

/// Rows for one fitted single-predictor model.
fn model_rows(var: &str, term: &Term, design: &DesignMatrix, fit: &LogitFit) -> Vec<UnivariateRow> {
    let llr = format!("{:.3}", fit.llr());
    let llr_p = llr_p_text(fit);
    let r2 = format!("{:.4}", fit.pseudo_r2());
    let n = fit.nobs;

    let mut rows = Vec::new();

    // Reference category leads the block for categorical predictors
    if matches!(term, Term::Categorical { .. }) {
        let reference = design
            .references
            .first()
            .map(|(_, r)| r.clone())
            .unwrap_or_default();
        rows.push(UnivariateRow {
            variable: var.to_string(),
            level: format!("{} (Ref)", reference),
            odds_ratio: "1.0".to_string(),
            ci95: "-".to_string(),
            p_value: "-".to_string(),
            llr: llr.clone(),
            llr_p_value: llr_p.clone(),
            pseudo_r2: r2.clone(),
            n,
        });
    }

    let std_errors = fit.std_errors();
    for (j, label) in fit.labels.iter().enumerate() {
        if label == "Intercept" {
            continue;
        }
        let coef = fit.coefficients[j];
        let se = std_errors[j];
        let (or, ci_lo, ci_hi) = odds_ratio_ci(coef, se, 0.95);
        let p = pvalue_z(coef / se);

        rows.push(UnivariateRow {
            variable: var.to_string(),
            level: term_level(label).unwrap_or("Continuous").to_string(),
            odds_ratio: format!("{:.3}", or),
            ci95: format!("{:.3} - {:.3}", ci_lo, ci_hi),
            p_value: format_p_model(p),
            llr: llr.clone(),
            llr_p_value: llr_p.clone(),
            pseudo_r2: r2.clone(),
            n,
        });
    }
    rows
}

/// Builds the Table 2 sheet from a master frame.
pub fn build(frame: &Frame) -> Result<Sheet> {
    let mut frame = frame.clone();
    prepare_model_frame(&mut frame)?;

    let mut sheet = Sheet::new("Univariate_Results", HEADERS);
    let config = LogitConfig::default();

    let candidates: Vec<String> = frame
        .names()
        .iter()
        .filter(|n| **n != OUTCOME && !EXCLUDED_VARS.contains(*n))
        .map(|n| n.to_string())
        .collect();

    for var in &candidates {
        if frame.distinct(var).len() < 2 {
            debug!(variable = %var, "skipped: fewer than two distinct values");
            continue;
        }

        let term = term_for(var);
        let result = DesignMatrix::build(&frame, OUTCOME, std::slice::from_ref(&term))
            .and_then(|design| {
                fit_logit(&design.y, &design.x, design.labels.clone(), &config)
                    .map(|fit| (design, fit))
            });

        match result {
            Ok((design, fit)) => {
                if !fit.converged {
                    warn!(variable = %var, iterations = fit.iterations, "fit did not converge");
                }
                for row in model_rows(var, &term, &design, &fit) {
                    sheet.push_row(row.cells());
                }
            }
            Err(e) => warn!(variable = %var, error = %e, "model skipped"),
        }
    }

    info!(
        candidates = candidates.len(),
        rows = sheet.rows.len(),
        "univariate table built"
    );
    Ok(sheet)
}

/// Loads the master CSV, builds Table 2, and writes the workbook.
#[tracing::instrument(skip_all, fields(input = %input.as_ref().display()))]
pub fn run(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    let frame = Frame::from_csv_path(input)?;
    let sheet = build(&frame)?;
    crate::output::write_tables(output, &[sheet])
}
