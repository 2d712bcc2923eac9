//! CLI entry point for the delivery-preference survey analysis pipeline.
//!
//! Provides subcommands for each stage of the study workflow: preprocessing
//! and scoring, descriptive statistics, univariate logistic regression, and
//! the hierarchical multivariate models.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use vpcs_analyzer::{preprocess, tables};

#[derive(Parser)]
#[command(name = "vpcs_analyzer")]
#[command(about = "Statistical report tables for the delivery-preference survey", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the raw survey export and write the master dataset
    Preprocess {
        /// Raw survey CSV (UTF-8 or CP949)
        #[arg(short, long)]
        input: PathBuf,

        /// Master CSV to write
        #[arg(short, long, default_value = "vpcs_master_data.csv")]
        output: PathBuf,
    },
    /// Build Table 1: descriptive statistics by delivery preference
    Describe {
        /// Master CSV produced by `preprocess`
        #[arg(short, long)]
        input: PathBuf,

        /// Output table; format by extension (.xlsx, .csv, or .json)
        #[arg(short, long, default_value = "Table1_Descriptive_Statistics.xlsx")]
        output: PathBuf,
    },
    /// Build Table 2: univariate logistic regression per predictor
    Univariate {
        /// Master CSV produced by `preprocess`
        #[arg(short, long)]
        input: PathBuf,

        /// Output table; format by extension (.xlsx, .csv, or .json)
        #[arg(short, long, default_value = "Table2_Logistic_Univariate_Results.xlsx")]
        output: PathBuf,
    },
    /// Build Table 3: hierarchical multivariate logistic regression
    Multivariate {
        /// Master CSV produced by `preprocess`
        #[arg(short, long)]
        input: PathBuf,

        /// Output table; format by extension (.xlsx, .csv, or .json)
        #[arg(short, long, default_value = "Table3_Logistic_Multivariate_Results.xlsx")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/vpcs_analyzer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("vpcs_analyzer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess { input, output } => {
            preprocess::run(&input, &output)?;
            info!(output = %output.display(), "master dataset written");
        }
        Commands::Describe { input, output } => {
            tables::descriptive::run(&input, &output)?;
            info!(output = %output.display(), "Table 1 written");
        }
        Commands::Univariate { input, output } => {
            tables::univariate::run(&input, &output)?;
            info!(output = %output.display(), "Table 2 written");
        }
        Commands::Multivariate { input, output } => {
            tables::multivariate::run(&input, &output)?;
            info!(output = %output.display(), "Table 3 written");
        }
    }

    Ok(())
}
