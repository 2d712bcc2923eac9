pub mod frame;
pub mod logit;
pub mod output;
pub mod preprocess;
pub mod recode;
pub mod scores;
pub mod stats;
pub mod tables;
