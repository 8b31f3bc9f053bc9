use anyhow::Context;
use clap::Parser;
use file_arranger::cli::{Args, RunSummary, run_cli};
use file_arranger::config::AppConfig;
use file_arranger::file_category::Classifier;
use file_arranger::logging::{DEFAULT_LOG_FILE, init_logging};
use file_arranger::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let mut args = Args::parse();

    let log_file = args
        .log_file
        .get_or_insert_with(|| PathBuf::from(DEFAULT_LOG_FILE))
        .clone();
    let _guard = match init_logging(&log_file) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {:#}", log_file.display(), e);
            None
        }
    };

    let dry_run = args.dry_run;
    match run(args) {
        Ok(summary) => {
            OutputFormatter::summary(&summary, dry_run);
            if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<RunSummary> {
    let app_config = AppConfig::load(args.config.as_deref()).context("Error loading configuration")?;
    let filters = app_config
        .compile_filters()
        .context("Error compiling filters")?;
    let classifier = Classifier::new(app_config.category_table());

    let config = args.into_run_config();
    let summary = run_cli(&config, &classifier, &filters)?;
    Ok(summary)
}
