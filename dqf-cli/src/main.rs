//! `dqf` - runs a data-quality suite and writes its report.
//!
//! Exit codes: 0 when every check passed, 2 when at least one check failed,
//! 1 when the run aborted before a report could be written.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dqf_guard::core::{run_suite, run_suite_concurrent, Report, SuiteSpec};
use dqf_guard::formatters::{write_report, FormatterConfig, HumanFormatter, ReportFormatter};
use dqf_guard::logging::setup::{init_logging, LoggingConfig};
use dqf_guard::sources::{load_context, LoadOptions};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};

const EXIT_PASS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_FAIL: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "dqf")]
#[command(author, version, about = "Data quality and validation framework", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a validation suite
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Path to the YAML rules file
    #[arg(long)]
    rules: PathBuf,

    /// Directory containing the dataset files referenced in the rules
    #[arg(long)]
    data_dir: PathBuf,

    /// Output directory for reports
    #[arg(long, default_value = "reports")]
    out: PathBuf,

    /// Log level for dqf (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Evaluate checks concurrently
    #[arg(long)]
    parallel: bool,

    /// Do not print the summary
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let logging = LoggingConfig::default()
                .with_dqf_level(args.log_level)
                .with_json_format(args.json_logs);
            if let Err(e) = init_logging(logging) {
                eprintln!("[dqf] WARNING: {e}");
            }

            match run(&args).await {
                Ok(report) if report.all_passed() => ExitCode::from(EXIT_PASS),
                Ok(_) => ExitCode::from(EXIT_FAIL),
                Err(e) => {
                    eprintln!("[dqf] ERROR: {e:#}");
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
    }
}

async fn run(args: &RunArgs) -> Result<Report> {
    let suite = SuiteSpec::from_path(&args.rules)
        .with_context(|| format!("cannot load rules from {}", args.rules.display()))?;
    let ctx = load_context(&suite, &LoadOptions::new(&args.data_dir)).await?;

    let suite = Arc::new(suite);
    let results = if args.parallel {
        run_suite_concurrent(Arc::clone(&suite), Arc::new(ctx)).await
    } else {
        run_suite(&suite, &ctx)
    };

    let report = Report::from_results(suite.suite_name(), results);
    let paths = write_report(&args.out, &report)
        .with_context(|| format!("cannot write reports to {}", args.out.display()))?;
    info!(
        json = %paths.json.display(),
        html = %paths.html.display(),
        passed = report.summary.passed,
        failed = report.summary.failed,
        "Run finished"
    );

    if !args.quiet {
        let config = FormatterConfig::default().with_colors(std::io::stdout().is_terminal());
        print!("{}", HumanFormatter::with_config(config).format(&report)?);
    }
    Ok(report)
}
