//! Report table builders.
//!
//! Each submodule produces one of the study's result tables from the master
//! dataset: descriptive statistics (Table 1), univariate logistic regression
//! (Table 2), and the hierarchical multivariate models (Table 3). Shared
//! recoding conventions for the regression tables live here.

pub mod descriptive;
pub mod multivariate;
pub mod types;
pub mod univariate;

use crate::frame::Frame;
use crate::logit::Term;
use crate::recode::{apply_standard_bins, recode_all_yes_no, recode_binary_labels, standard_bins};
use anyhow::Result;

/// Dependent variable of every table.
pub const OUTCOME: &str = "delivery_pref";

/// Variables treated as continuous throughout the tables.
pub const CONTINUOUS_VARS: &[&str] = &["fear_score_std", "knowledge_score_std"];

/// Variables entered with treatment coding in the regression tables.
pub const CATEGORICAL_VARS: &[&str] = &[
    "age",
    "BMI",
    "gestational_age_wk",
    "fetal_weight_est",
    "occupation",
    "health_insurance",
    "prev_delivery",
    "chronic_disease",
    "anemia",
    "ivf",
    "fetal_problem",
    "amniotic_fluid",
    "belief_healthy_pregnancy",
    "belief_vd_ability",
    "expect_companion",
];

/// Reference category for occupation: the study's housewife label.
pub const OCCUPATION_REFERENCE: &str = "전업주부";

/// Fixed 0/1 maps for the three labeled binary variables.
const BINARY_LABEL_MAPS: &[(&str, &str, &str)] = &[
    ("Ethic_group", "킨족", "기타"),
    ("prev_delivery", "출산", "미출산"),
    ("amniotic_fluid", "정상", "비정상"),
];

/// Recodes the outcome to 1 for "yes" (case-insensitive) and 0 otherwise.
pub fn recode_outcome(frame: &mut Frame) -> Result<()> {
    let Some(col) = frame.column(OUTCOME) else {
        anyhow::bail!("column '{}' not found", OUTCOME);
    };
    let values: Vec<Option<String>> = col
        .values
        .iter()
        .map(|v| {
            let yes = v
                .as_deref()
                .is_some_and(|s| s.trim().eq_ignore_ascii_case("yes"));
            Some(if yes { "1" } else { "0" }.to_string())
        })
        .collect();
    frame.set_column(OUTCOME, values)
}

/// Shared preparation for the regression tables: outcome to 0/1, labeled
/// binaries to 0/1, yes/no columns to 0/1, standard bins applied.
pub fn prepare_model_frame(frame: &mut Frame) -> Result<()> {
    recode_outcome(frame)?;
    for (name, one, zero) in BINARY_LABEL_MAPS {
        recode_binary_labels(frame, name, one, zero)?;
    }
    recode_all_yes_no(frame, &[OUTCOME])?;
    apply_standard_bins(frame)?;
    Ok(())
}

/// Model term for a variable: treatment-coded when the variable is in the
/// categorical list, with the study's fixed reference levels for occupation
/// and the binned variables.
pub fn term_for(name: &str) -> Term {
    if name == "occupation" {
        return Term::Categorical {
            name: name.to_string(),
            reference: Some(OCCUPATION_REFERENCE.to_string()),
        };
    }
    if let Some((_, spec)) = standard_bins().into_iter().find(|(b, _)| *b == name) {
        return Term::Categorical {
            name: name.to_string(),
            reference: Some(spec.labels[0].to_string()),
        };
    }
    if CATEGORICAL_VARS.contains(&name) {
        return Term::Categorical {
            name: name.to_string(),
            reference: None,
        };
    }
    Term::Continuous(name.to_string())
}

/// p-value text used by the regression tables.
pub fn format_p_model(p: f64) -> String {
    if p < 0.001 {
        "<0.001".to_string()
    } else {
        format!("{:.3}", p)
    }
}

/// Extracts the level from a treatment-coded column label like
/// `occupation[T.level]`; continuous terms have no level.
pub fn term_level(label: &str) -> Option<&str> {
    let start = label.find("[T.")?;
    let end = label.rfind(']')?;
    (end > start + 3).then(|| &label[start + 3..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recode_outcome_yes_else_zero() {
        let mut f =
            Frame::from_csv_str("id,delivery_pref\n1,Yes\n2, no \n3,YES\n4,maybe\n5,\n").unwrap();
        recode_outcome(&mut f).unwrap();
        assert_eq!(f.get(OUTCOME, 0), Some("1"));
        assert_eq!(f.get(OUTCOME, 1), Some("0"));
        assert_eq!(f.get(OUTCOME, 2), Some("1"));
        assert_eq!(f.get(OUTCOME, 3), Some("0"));
        assert_eq!(f.get(OUTCOME, 4), Some("0"));
    }

    #[test]
    fn test_prepare_model_frame() {
        let mut f = Frame::from_csv_str(
            "delivery_pref,anemia,prev_delivery,age\nYes,Yes,출산,23\nNo,No,미출산,31\n",
        )
        .unwrap();
        prepare_model_frame(&mut f).unwrap();
        assert_eq!(f.get("anemia", 0), Some("1"));
        assert_eq!(f.get("prev_delivery", 1), Some("0"));
        assert_eq!(f.get("age", 0), Some("<25"));
        assert_eq!(f.get("age", 1), Some(">30"));
    }

    #[test]
    fn test_term_for() {
        assert!(matches!(
            term_for("occupation"),
            Term::Categorical { reference: Some(ref r), .. } if r == OCCUPATION_REFERENCE
        ));
        assert!(matches!(
            term_for("age"),
            Term::Categorical { reference: Some(ref r), .. } if r == "<25"
        ));
        assert!(matches!(
            term_for("anemia"),
            Term::Categorical { reference: None, .. }
        ));
        assert!(matches!(term_for("fear_score_std"), Term::Continuous(_)));
    }

    #[test]
    fn test_term_level() {
        assert_eq!(term_level("occupation[T.student]"), Some("student"));
        assert_eq!(term_level("age[T.25-30]"), Some("25-30"));
        assert_eq!(term_level("fear_score_std"), None);
    }

    #[test]
    fn test_format_p_model() {
        assert_eq!(format_p_model(0.0001), "<0.001");
        assert_eq!(format_p_model(0.042), "0.042");
    }
}
