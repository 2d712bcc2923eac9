//! Binomial-logit regression: design matrix construction with treatment
//! coding, an IRLS fitter, and the inference helpers the report tables need.

pub mod design;
pub mod error;
pub mod fit;
pub mod inference;

pub use design::{DesignMatrix, Term};
pub use error::{LogitError, Result};
pub use fit::{LogitConfig, LogitFit, fit_logit};
pub use inference::{confidence_interval_z, odds_ratio_ci, pvalue_z};
