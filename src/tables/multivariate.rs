//! Table 3: hierarchical multivariate logistic regression.
//!
//! Three nested models add predictor blocks in order: background factors,
//! pregnancy factors (after a perfect-separation screen), and psychosocial
//! factors. Output is one workbook with coefficient, fit, and screen-log
//! sheets.

use crate::frame::Frame;
use crate::logit::{DesignMatrix, LogitConfig, Term, fit_logit, odds_ratio_ci, pvalue_z};
use crate::output::Sheet;
use crate::tables::types::{DroppedVariableRow, ModelFitRow, ModelTermRow};
use crate::tables::{CONTINUOUS_VARS, OUTCOME, format_p_model, prepare_model_frame, term_for};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Block 1 spans these columns (inclusive, by position in the master file).
const BLOCK1_RANGE: (&str, &str) = ("age", "health_insurance");
/// Block 2 spans these columns (inclusive).
const BLOCK2_RANGE: (&str, &str) = ("BMI", "amniotic_fluid");
/// Block 3 is a fixed set of psychosocial predictors.
const BLOCK3: &[&str] = &[
    "belief_healthy_pregnancy",
    "belief_vd_ability",
    "fear_score_std",
    "expect_companion",
    "knowledge_score_std",
];

/// Variables exempt from the separation screen. None by default; kept as a
/// named hook because individual study runs occasionally need one.
const SCREEN_EXEMPT: &[&str] = &[];

/// Columns of the frame between `start` and `end`, inclusive.
fn column_block(frame: &Frame, start: &str, end: &str) -> Result<Vec<String>> {
    let s = frame
        .position(start)
        .with_context(|| format!("block start column '{}' not found", start))?;
    let e = frame
        .position(end)
        .with_context(|| format!("block end column '{}' not found", end))?;
    anyhow::ensure!(s <= e, "block start '{}' comes after end '{}'", start, end);
    Ok(frame.names()[s..=e].iter().map(|n| n.to_string()).collect())
}

/// True if the variable-by-outcome contingency table has a zero cell.
fn has_zero_cell(frame: &Frame, var: &str) -> bool {
    let levels = frame.distinct(var);
    let outcomes = frame.distinct(OUTCOME);
    if levels.is_empty() || outcomes.is_empty() {
        return false;
    }

    let var_col = match frame.column(var) {
        Some(c) => c,
        None => return false,
    };
    let out_col = match frame.column(OUTCOME) {
        Some(c) => c,
        None => return false,
    };

    for level in &levels {
        for outcome in &outcomes {
            let count = var_col
                .values
                .iter()
                .zip(&out_col.values)
                .filter(|(v, o)| v.as_deref() == Some(level) && o.as_deref() == Some(outcome))
                .count();
            if count == 0 {
                return true;
            }
        }
    }
    false
}

/// Drops perfectly separated predictors from a block: any categorical
/// variable whose outcome crosstab has a zero cell cannot be estimated and
/// is logged instead. Continuous and exempt variables pass through.
fn screen_separation(
    frame: &Frame,
    vars: &[String],
    model_name: &str,
    exempt: &[&str],
    log: &mut Vec<DroppedVariableRow>,
) -> Vec<String> {
    let mut safe = Vec::new();
    for var in vars {
        if var == OUTCOME {
            continue;
        }
        if exempt.contains(&var.as_str()) || CONTINUOUS_VARS.contains(&var.as_str()) {
            safe.push(var.clone());
            continue;
        }
        if has_zero_cell(frame, var) {
            debug!(variable = %var, model = model_name, "dropped by separation screen");
            log.push(DroppedVariableRow {
                model: model_name.to_string(),
                variable: var.clone(),
                reason: "Perfect separation (zero cell)".to_string(),
            });
        } else {
            safe.push(var.clone());
        }
    }
    safe
}

fn fit_model(
    frame: &Frame,
    model_name: &str,
    vars: &[String],
    config: &LogitConfig,
    term_rows: &mut Vec<ModelTermRow>,
    fit_rows: &mut Vec<ModelFitRow>,
) {
    let terms: Vec<Term> = vars.iter().map(|v| term_for(v)).collect();

    let result = DesignMatrix::build(frame, OUTCOME, &terms).and_then(|design| {
        fit_logit(&design.y, &design.x, design.labels.clone(), config)
    });

    let fit = match result {
        Ok(fit) => fit,
        Err(e) => {
            warn!(model = model_name, error = %e, "model skipped");
            return;
        }
    };
    if !fit.converged {
        warn!(
            model = model_name,
            iterations = fit.iterations,
            "fit did not converge"
        );
    }

    fit_rows.push(ModelFitRow {
        model: model_name.to_string(),
        n: fit.nobs,
        pseudo_r2: format!("{:.4}", fit.pseudo_r2()),
        llr: format!("{:.3}", fit.llr()),
        llr_p_value: match fit.llr_pvalue() {
            Some(p) if p < 0.001 => "<0.001".to_string(),
            Some(p) => format!("{:.4}", p),
            None => "N/A".to_string(),
        },
    });

    let std_errors = fit.std_errors();
    for (j, label) in fit.labels.iter().enumerate() {
        if label == "Intercept" {
            continue;
        }
        let coef = fit.coefficients[j];
        let se = std_errors[j];
        let (or, ci_lo, ci_hi) = odds_ratio_ci(coef, se, 0.95);
        let p = pvalue_z(coef / se);

        term_rows.push(ModelTermRow {
            model: model_name.to_string(),
            variable: label.clone(),
            odds_ratio: format!("{:.3}", or),
            ci95: format!("{:.3} – {:.3}", ci_lo, ci_hi),
            p_value: format_p_model(p),
        });
    }
    info!(model = model_name, n = fit.nobs, "model fitted");
}

/// Builds the three Table 3 sheets from a master frame.
pub fn build(frame: &Frame) -> Result<Vec<Sheet>> {
    let mut frame = frame.clone();
    prepare_model_frame(&mut frame)?;

    // The standardized knowledge score is reported at 3 decimals
    if let Some(values) = frame.numeric("knowledge_score_std") {
        frame.set_column(
            "knowledge_score_std",
            values
                .iter()
                .map(|v| v.map(|x| format!("{:.3}", x)))
                .collect(),
        )?;
    }

    let block1 = column_block(&frame, BLOCK1_RANGE.0, BLOCK1_RANGE.1)?;
    let block2 = column_block(&frame, BLOCK2_RANGE.0, BLOCK2_RANGE.1)?;
    let block3: Vec<String> = BLOCK3
        .iter()
        .filter(|v| frame.has_column(v))
        .map(|v| v.to_string())
        .collect();

    let mut dropped = Vec::new();
    let block2_safe = screen_separation(&frame, &block2, "Model 2", SCREEN_EXEMPT, &mut dropped);

    let model2: Vec<String> = block1.iter().chain(&block2_safe).cloned().collect();
    let model3: Vec<String> = model2.iter().chain(&block3).cloned().collect();
    let models: Vec<(&str, Vec<String>)> = vec![
        ("Model 1", block1),
        ("Model 2", model2),
        ("Model 3", model3),
    ];

    let config = LogitConfig::default();
    let mut term_rows = Vec::new();
    let mut fit_rows = Vec::new();
    for (name, vars) in &models {
        fit_model(&frame, name, vars, &config, &mut term_rows, &mut fit_rows);
    }

    let mut models_sheet = Sheet::new(
        "Logistic_Models",
        &["Model", "Variable", "OR", "95% CI", "p_value"],
    );
    for row in &term_rows {
        models_sheet.push_row(row.cells());
    }

    let mut fit_sheet = Sheet::new(
        "Model_Fit",
        &["Model", "N", "Pseudo_R2", "LLR", "LLR_p_value"],
    );
    for row in &fit_rows {
        fit_sheet.push_row(row.cells());
    }

    let mut dropped_sheet = Sheet::new("Dropped_Variables", &["Model", "Variable", "Reason"]);
    for row in &dropped {
        dropped_sheet.push_row(row.cells());
    }

    info!(
        models = fit_rows.len(),
        terms = term_rows.len(),
        dropped = dropped.len(),
        "multivariate tables built"
    );
    Ok(vec![models_sheet, fit_sheet, dropped_sheet])
}

/// Loads the master CSV, builds Table 3, and writes the workbook.
#[tracing::instrument(skip_all, fields(input = %input.as_ref().display()))]
pub fn run(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    let frame = Frame::from_csv_path(input)?;
    let sheets = build(&frame)?;
    crate::output::write_tables(output, &sheets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> Frame {
        // Column order matters: block 1 is age..health_insurance and
        // block 2 is BMI..amniotic_fluid. `anemia` separates perfectly;
        // every other predictor is mixed across the outcome groups.
        Frame::from_csv_str(
            "delivery_pref,age,health_insurance,BMI,anemia,amniotic_fluid,fear_score_std,belief_healthy_pregnancy,belief_vd_ability,expect_companion,knowledge_score_std\n\
             Yes,23,Yes,22,Yes,정상,0.9,Yes,No,Yes,0.88\n\
             Yes,27,Yes,26,Yes,정상,0.8,Yes,Yes,No,0.75\n\
             Yes,31,No,23,Yes,비정상,0.7,No,Yes,Yes,0.91\n\
             Yes,29,Yes,21,Yes,정상,0.9,Yes,No,Yes,0.80\n\
             Yes,24,No,27,Yes,비정상,0.4,No,Yes,No,0.45\n\
             Yes,33,Yes,24,Yes,정상,0.6,Yes,No,Yes,0.66\n\
             Yes,26,No,25,Yes,정상,0.8,Yes,No,No,0.72\n\
             Yes,28,Yes,22,Yes,비정상,0.5,No,Yes,Yes,0.59\n\
             No,33,No,27,No,정상,0.2,No,Yes,No,0.20\n\
             No,24,Yes,24,No,비정상,0.1,No,Yes,Yes,0.15\n\
             No,26,No,28,No,정상,0.3,Yes,No,Yes,0.33\n\
             No,35,Yes,22,No,비정상,0.2,No,No,No,0.10\n\
             No,23,Yes,25,No,정상,0.6,Yes,No,Yes,0.52\n\
             No,29,No,23,No,정상,0.4,No,Yes,No,0.41\n\
             No,31,No,26,No,비정상,0.3,Yes,No,Yes,0.28\n\
             No,27,Yes,24,No,정상,0.5,No,Yes,No,0.36\n",
        )
        .unwrap()
    }

    #[test]
    fn test_block_extraction_by_position() {
        let mut f = master();
        prepare_model_frame(&mut f).unwrap();
        let block1 = column_block(&f, "age", "health_insurance").unwrap();
        assert_eq!(block1, vec!["age", "health_insurance"]);
        let block2 = column_block(&f, "BMI", "amniotic_fluid").unwrap();
        assert_eq!(block2, vec!["BMI", "anemia", "amniotic_fluid"]);
    }

    #[test]
    fn test_block_extraction_missing_column() {
        let f = Frame::from_csv_str("a\n1\n").unwrap();
        assert!(column_block(&f, "a", "ghost").is_err());
    }

    #[test]
    fn test_separation_screen_drops_zero_cell() {
        let mut f = master();
        prepare_model_frame(&mut f).unwrap();
        let mut log = Vec::new();
        let safe = screen_separation(
            &f,
            &["anemia".to_string(), "amniotic_fluid".to_string()],
            "Model 2",
            &[],
            &mut log,
        );
        // anemia is 1 for every Yes and 0 for every No: zero cells
        assert_eq!(safe, vec!["amniotic_fluid"]);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].variable, "anemia");
        assert_eq!(log[0].reason, "Perfect separation (zero cell)");
    }

    #[test]
    fn test_separation_screen_exempt_and_continuous() {
        let mut f = master();
        prepare_model_frame(&mut f).unwrap();
        let mut log = Vec::new();
        let safe = screen_separation(
            &f,
            &["anemia".to_string(), "fear_score_std".to_string()],
            "Model 2",
            &["anemia"],
            &mut log,
        );
        assert_eq!(safe, vec!["anemia", "fear_score_std"]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_build_produces_three_sheets() {
        let sheets = build(&master()).unwrap();
        assert_eq!(sheets.len(), 3);
        assert_eq!(sheets[0].name, "Logistic_Models");
        assert_eq!(sheets[1].name, "Model_Fit");
        assert_eq!(sheets[2].name, "Dropped_Variables");

        // anemia was screened out of Model 2
        assert!(sheets[2].rows.iter().any(|r| r[1] == "anemia"));
        // three fit rows, one per model
        assert_eq!(sheets[1].rows.len(), 3);
        assert!(sheets[1].rows.iter().all(|r| r[1] == "16"));
    }

    #[test]
    fn test_model_terms_are_labeled() {
        let sheets = build(&master()).unwrap();
        let model1_terms: Vec<_> = sheets[0]
            .rows
            .iter()
            .filter(|r| r[0] == "Model 1")
            .collect();
        assert!(!model1_terms.is_empty());
        // age enters binned with its first label as reference
        assert!(
            model1_terms
                .iter()
                .any(|r| r[1].starts_with("age[T."))
        );
    }
}
