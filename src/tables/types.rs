//! Row types produced by the table builders.

use serde::Serialize;

/// One row of the descriptive statistics table (Table 1).
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveRow {
    pub variable: String,
    pub category: String,
    pub total: String,
    pub group_yes: String,
    pub group_no: String,
    pub p_value: String,
    pub test: String,
}

impl DescriptiveRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.variable.clone(),
            self.category.clone(),
            self.total.clone(),
            self.group_yes.clone(),
            self.group_no.clone(),
            self.p_value.clone(),
            self.test.clone(),
        ]
    }
}

/// One row of the univariate regression table (Table 2).
#[derive(Debug, Clone, Serialize)]
pub struct UnivariateRow {
    pub variable: String,
    pub level: String,
    pub odds_ratio: String,
    pub ci95: String,
    pub p_value: String,
    pub llr: String,
    pub llr_p_value: String,
    pub pseudo_r2: String,
    pub n: usize,
}

impl UnivariateRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.variable.clone(),
            self.level.clone(),
            self.odds_ratio.clone(),
            self.ci95.clone(),
            self.p_value.clone(),
            self.llr.clone(),
            self.llr_p_value.clone(),
            self.pseudo_r2.clone(),
            self.n.to_string(),
        ]
    }
}

/// One coefficient row of the multivariate models sheet.
#[derive(Debug, Clone, Serialize)]
pub struct ModelTermRow {
    pub model: String,
    pub variable: String,
    pub odds_ratio: String,
    pub ci95: String,
    pub p_value: String,
}

impl ModelTermRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.model.clone(),
            self.variable.clone(),
            self.odds_ratio.clone(),
            self.ci95.clone(),
            self.p_value.clone(),
        ]
    }
}

/// One row of the model fit sheet.
#[derive(Debug, Clone, Serialize)]
pub struct ModelFitRow {
    pub model: String,
    pub n: usize,
    pub pseudo_r2: String,
    pub llr: String,
    pub llr_p_value: String,
}

impl ModelFitRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.model.clone(),
            self.n.to_string(),
            self.pseudo_r2.clone(),
            self.llr.clone(),
            self.llr_p_value.clone(),
        ]
    }
}

/// One entry of the separation-screen log sheet.
#[derive(Debug, Clone, Serialize)]
pub struct DroppedVariableRow {
    pub model: String,
    pub variable: String,
    pub reason: String,
}

impl DroppedVariableRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.model.clone(),
            self.variable.clone(),
            self.reason.clone(),
        ]
    }
}
