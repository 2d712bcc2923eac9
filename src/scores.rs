//! Survey score definitions and row-wise aggregation.
//!
//! The instrument's item columns are grouped into six fixed scales; each
//! scale is the row sum of its items after yes/no recoding.

use crate::frame::Frame;
use anyhow::Result;
use tracing::debug;

pub const FEAR_ITEMS: &[&str] = &[
    "fear_labor_pain",
    "fear_episiotomy",
    "fear_vd_failure",
    "fear_vd_complication",
];

pub const KNOWLEDGE_ITEMS: &[&str] = &[
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
];

pub const CS_PC_ITEMS: &[&str] = &[
    "belief_cs_less_pain",
    "belief_cs_safer_mother",
    "belief_time_control",
    "belief_dob_family",
    "prefer_choose_dob",
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
];

pub const VD_PC_ITEMS: &[&str] = &[
    "concern_sex_postpartum",
    "exposed_negative_story",
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
];

pub const VD_DRAWBACK_ITEMS: &[&str] = &[
    "concern_sex_postpartum",
    "exposed_negative_story",
    "vd_emergency_cs_risk",
    "vd_instrumental_risk",
    "vd_postpartum_pain",
];

pub const CS_BENEFIT_ITEMS: &[&str] = &[
    "belief_cs_less_pain",
    "belief_cs_safer_mother",
    "belief_time_control",
    "belief_dob_family",
    "prefer_choose_dob",
    "family_advice_cs",
    "provider_advice_cs",
    "cs_avoid_labor_pain",
    "cs_avoid_long_labor",
    "cs_reduce_emergency",
    "cs_avoid_episiotomy",
];

/// The six scale definitions: output column name plus item columns.
pub fn scales() -> Vec<(&'static str, &'static [&'static str])> {
    vec![
        ("fear_score", FEAR_ITEMS),
        ("knowledge_score", KNOWLEDGE_ITEMS),
        ("cs_pc_score", CS_PC_ITEMS),
        ("vd_pc_score", VD_PC_ITEMS),
        ("vd_drawback_sum", VD_DRAWBACK_ITEMS),
        ("cs_benefit_sum", CS_BENEFIT_ITEMS),
    ]
}

/// Every item column appearing in any scale, deduplicated.
pub fn all_items() -> Vec<&'static str> {
    let mut items: Vec<&str> = scales().iter().flat_map(|(_, cols)| cols.iter().copied()).collect();
    items.sort();
    items.dedup();
    items
}

/// Row sums of the given item columns. Missing or non-numeric cells count
/// as 0; absent columns contribute nothing.
pub fn row_sums(frame: &Frame, items: &[&str]) -> Vec<f64> {
    let mut sums = vec![0.0; frame.n_rows()];
    for item in items {
        if let Some(values) = frame.numeric(item) {
            for (sum, v) in sums.iter_mut().zip(values) {
                *sum += v.unwrap_or(0.0);
            }
        }
    }
    sums
}

/// Computes all six scale columns and appends them to the frame.
pub fn append_scale_columns(frame: &mut Frame) -> Result<()> {
    for (name, items) in scales() {
        let sums = row_sums(frame, items);
        let present = items.iter().filter(|i| frame.has_column(i)).count();
        debug!(scale = name, items = present, "scale computed");
        frame.set_column(name, sums.iter().map(|s| Some(s.to_string())).collect())?;
    }
    Ok(())
}
