//! Preprocessing stage: recode item columns, compute scale scores, scale
//! them, and drop the raw items.

use crate::frame::Frame;
use crate::recode::{min_max_scale, recode_yes_no};
use crate::scores::{all_items, append_scale_columns};
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Raw columns removed from the master dataset once scores are computed.
/// Includes the scale items plus instrument columns outside any scale.
const DROP_AFTER_SCORING: &[&str] = &[
    "antenatal_class",
    "yoga_class",
    "fear_labor_pain",
    "fear_episiotomy",
    "fear_vd_failure",
    "fear_vd_complication",
    "fear_any",
    "belief_cs_less_pain",
    "belief_cs_safer_mother",
    "concern_sex_postpartum",
    "belief_time_control",
    "belief_dob_family",
    "prefer_choose_dob",
    "exposed_negative_story",
    "family_advice_cs",
    "provider_advice_cs",
    "belief_cs_safer_baby",
    "vd_short_stay",
    "vd_less_blood_loss",
    "vd_better_lochia",
    "vd_breastfeeding",
    "vd_less_surgery_risk",
    "vd_fast_recovery",
    "vd_skin_to_skin",
    "vd_future_preg_safe",
    "vd_lower_cost",
    "vd_short_interpreg",
    "vd_less_resp_risk",
    "vd_early_contact",
    "vd_microbiota_benefit",
    "vd_emergency_cs_risk",
    "vd_instrumental_risk",
    "vd_postpartum_pain",
    "cs_avoid_labor_pain",
    "cs_avoid_long_labor",
    "cs_reduce_emergency",
    "cs_avoid_episiotomy",
    "cs_epidural_risk",
    "cs_more_blood_loss",
    "cs_long_stay",
    "cs_slow_recovery",
    "cs_prolonged_pain",
    "cs_breastfeeding_risk",
    "cs_surgery_risk",
    "cs_future_risk",
    "cs_scar_concern",
    "cs_baby_resp_risk",
    "vd_disadvantage_fear",
    "vd_disadvantage_fear_class",
    "cs_disadvantage_know",
    "cs_disadvantage_know_class",
];

/// Runs the full preprocessing pipeline on a loaded frame.
pub fn preprocess(frame: &mut Frame) -> Result<()> {
    // Yes/No -> 1/0 on every scale item that exists in the data
    for item in all_items() {
        recode_yes_no(frame, item)?;
    }

    append_scale_columns(frame)?;

    // Standardize the two scales used as continuous predictors downstream
    for (raw, std_name) in [
        ("fear_score", "fear_score_std"),
        ("knowledge_score", "knowledge_score_std"),
    ] {
        let values: Vec<f64> = frame
            .numeric(raw)
            .unwrap_or_default()
            .iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();
        let scaled = min_max_scale(&values);
        frame.set_column(
            std_name,
            scaled.iter().map(|v| Some(v.to_string())).collect(),
        )?;
    }

    frame.drop_columns(DROP_AFTER_SCORING);
    Ok(())
}

/// Loads a raw survey CSV, preprocesses it, and writes the master CSV.
#[tracing::instrument(skip_all, fields(input = %input.as_ref().display()))]
pub fn run(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
    let mut frame = Frame::from_csv_path(input)?;
    let raw_cols = frame.n_cols();
    preprocess(&mut frame)?;
    info!(
        rows = frame.n_rows(),
        cols_in = raw_cols,
        cols_out = frame.n_cols(),
        "preprocessing complete"
    );
    frame.to_csv_path(output)?;
    Ok(())
}
