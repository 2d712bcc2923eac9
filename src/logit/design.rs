//! Design matrix construction with treatment (reference-level) coding.
//!
//! Rows with a missing value in the outcome or any predictor are dropped
//! (listwise deletion), matching how the report tables define their N.

use crate::frame::Frame;
use crate::logit::error::{LogitError, Result};
use ndarray::{Array1, Array2};

/// One model term.
#[derive(Debug, Clone)]
pub enum Term {
    /// Numeric predictor entered as-is.
    Continuous(String),
    /// Categorical predictor with treatment coding. When `reference` is
    /// None the first level in sorted order is the baseline.
    Categorical {
        name: String,
        reference: Option<String>,
    },
}

impl Term {
    pub fn name(&self) -> &str {
        match self {
            Term::Continuous(name) => name,
            Term::Categorical { name, .. } => name,
        }
    }
}

/// The assembled outcome vector and predictor matrix.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub y: Array1<f64>,
    pub x: Array2<f64>,
    /// Column labels; `Intercept` first, categorical columns as
    /// `var[T.level]`.
    pub labels: Vec<String>,
    /// Reference level per categorical term, keyed by variable name order.
    pub references: Vec<(String, String)>,
    pub n_dropped: usize,
}

fn numeric_column(frame: &Frame, name: &str) -> Result<Vec<Option<f64>>> {
    frame
        .numeric(name)
        .ok_or_else(|| LogitError::UnknownColumn(name.to_string()))
}

fn string_column<'a>(frame: &'a Frame, name: &str) -> Result<&'a crate::frame::Column> {
    frame
        .column(name)
        .ok_or_else(|| LogitError::UnknownColumn(name.to_string()))
}

impl DesignMatrix {
    /// Builds the outcome vector and design matrix for `outcome ~ terms`
    /// with an intercept.
    pub fn build(frame: &Frame, outcome: &str, terms: &[Term]) -> Result<Self> {
        let y_raw = numeric_column(frame, outcome)?;
        let n_total = y_raw.len();

        // Per term: the numeric column, or the raw string cells
        enum Prepared<'a> {
            Continuous {
                name: &'a str,
                values: Vec<Option<f64>>,
            },
            Categorical {
                name: &'a str,
                reference: Option<&'a str>,
                cells: &'a [Option<String>],
            },
        }
        let mut prepared = Vec::new();
        for term in terms {
            prepared.push(match term {
                Term::Continuous(name) => Prepared::Continuous {
                    name,
                    values: numeric_column(frame, name)?,
                },
                Term::Categorical { name, reference } => Prepared::Categorical {
                    name,
                    reference: reference.as_deref(),
                    cells: &string_column(frame, name)?.values,
                },
            });
        }

        // Listwise deletion comes first: factor levels are taken from the
        // retained rows, so a level confined to dropped rows contributes
        // no dummy column.
        let mut kept: Vec<(usize, f64)> = Vec::new();
        for i in 0..n_total {
            let Some(yi) = y_raw[i] else { continue };
            if yi != 0.0 && yi != 1.0 {
                return Err(LogitError::InvalidResponse(yi));
            }
            let complete = prepared.iter().all(|p| match p {
                Prepared::Continuous { values, .. } => values[i].is_some(),
                Prepared::Categorical { cells, .. } => cells[i].is_some(),
            });
            if complete {
                kept.push((i, yi));
            }
        }
        if kept.is_empty() {
            return Err(LogitError::EmptyInput(
                "no complete rows after missing-data filtering".to_string(),
            ));
        }

        let mut references = Vec::new();
        let mut labels = vec!["Intercept".to_string()];
        // Contrast levels per term; None for continuous terms
        let mut contrasts: Vec<Option<Vec<String>>> = Vec::new();
        for p in &prepared {
            match p {
                Prepared::Continuous { name, .. } => {
                    labels.push((*name).to_string());
                    contrasts.push(None);
                }
                Prepared::Categorical {
                    name,
                    reference,
                    cells,
                } => {
                    let mut observed: Vec<String> = kept
                        .iter()
                        .filter_map(|&(i, _)| cells[i].clone())
                        .collect();
                    observed.sort();
                    observed.dedup();
                    let reference = match reference {
                        Some(r) => (*r).to_string(),
                        None => observed.first().cloned().ok_or_else(|| {
                            LogitError::EmptyInput(format!("column '{}' has no values", name))
                        })?,
                    };
                    let levels: Vec<String> = observed
                        .into_iter()
                        .filter(|l| *l != reference)
                        .collect();
                    for level in &levels {
                        labels.push(format!("{}[T.{}]", name, level));
                    }
                    references.push(((*name).to_string(), reference));
                    contrasts.push(Some(levels));
                }
            }
        }

        let n = kept.len();
        let p = labels.len();
        let mut x = Array2::zeros((n, p));
        let mut y = Array1::zeros(n);
        for (r, &(i, yi)) in kept.iter().enumerate() {
            y[r] = yi;
            x[[r, 0]] = 1.0;
            let mut j = 1;
            for (term, contrast) in prepared.iter().zip(&contrasts) {
                match term {
                    Prepared::Continuous { values, .. } => {
                        x[[r, j]] = values[i].unwrap_or(0.0);
                        j += 1;
                    }
                    Prepared::Categorical { cells, .. } => {
                        let value = cells[i].as_deref().unwrap_or_default();
                        for level in contrast.as_deref().unwrap_or_default() {
                            if level == value {
                                x[[r, j]] = 1.0;
                            }
                            j += 1;
                        }
                    }
                }
            }
        }

        Ok(DesignMatrix {
            y,
            x,
            labels,
            references,
            n_dropped: n_total - n,
        })
    }

    pub fn n_obs(&self) -> usize {
        self.y.len()
    }
}
