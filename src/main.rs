//! CLI entry point for the grade curving tool.
//!
//! Provides subcommands for searching feasible grade assignments, auditing
//! exported assignment CSVs, recomputing scenario statistics, and packaging
//! results.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use grade_curver::{
    assign::materialize,
    bundle::bundle_dir,
    config::CurveConfig,
    output::{print_json, read_assignment, write_assignment, write_json},
    report::scenario_report,
    roster::{DEFAULT_ROSTER, Roster},
    search::find_partitions,
    verify::{AuditReport, verify_rows},
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_curver")]
#[command(about = "Curve raw scores into letter grades under distribution constraints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for feasible grade assignments and export them as CSV scenarios
    Solve {
        /// JSON config with grade/tier tables (built-in defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// File with one raw score per line (built-in roster when omitted)
        #[arg(short, long)]
        scores: Option<PathBuf>,

        /// Directory to write scenario CSVs and reports to
        #[arg(short, long, default_value = "scenarios")]
        output_dir: PathBuf,

        /// Abort the search after this many seconds
        #[arg(long)]
        max_seconds: Option<u64>,
    },
    /// Audit exported assignment CSVs against the configured constraints
    Verify {
        /// JSON config with grade/tier tables (built-in defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Assignment CSVs to audit
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Recompute the statistics snapshot for an assignment CSV
    Report {
        /// JSON config with grade/tier tables (built-in defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Assignment CSV to summarize
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Gzip exported scenario CSVs into a package directory
    Bundle {
        /// Directory containing scenario CSVs
        #[arg(short, long, default_value = "scenarios")]
        dir: PathBuf,

        /// Directory to write compressed files to
        #[arg(short, long, default_value = "package")]
        package_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grade_curver.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_curver.log"));

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
        Commands::Solve {
            config,
            scores,
            output_dir,
            max_seconds,
        } => run_solve(config.as_deref(), scores.as_deref(), &output_dir, max_seconds),
        Commands::Verify { config, files } => run_verify(config.as_deref(), &files),
        Commands::Report { config, file } => run_report(config.as_deref(), &file),
        Commands::Bundle { dir, package_dir } => {
            bundle_dir(&dir, &package_dir)?;
            Ok(())
        }
    }
}

fn run_solve(
    config: Option<&Path>,
    scores: Option<&Path>,
    output_dir: &Path,
    max_seconds: Option<u64>,
) -> Result<()> {
    let config = CurveConfig::load(config)?;
    let roster = match scores {
        Some(path) => Roster::from_file(path)?,
        None => Roster::from_scores(&DEFAULT_ROSTER)?,
    };
    info!(
        students = roster.total_students(),
        unique_scores = roster.groups().len(),
        "Roster indexed"
    );

    let deadline = max_seconds.map(|s| Instant::now() + Duration::from_secs(s));
    let candidates = find_partitions(&roster, &config, deadline);
    if candidates.is_empty() {
        warn!(
            "No feasible assignment under the configured constraints; relax the tier ranges or \
             the mean window and re-run"
        );
        return Ok(());
    }

    fs::create_dir_all(output_dir)?;
    for (i, candidate) in candidates.iter().enumerate() {
        let rows = materialize(&roster, &config.grades, &candidate.counts)?;
        let name = format!("grade_assignment_scenario_{}", i + 1);

        let csv_path = output_dir.join(format!("{name}.csv"));
        write_assignment(&csv_path, &rows)?;

        let report = scenario_report(&name, &rows, &config);
        write_json(&output_dir.join(format!("{name}.report.json")), &report)?;

        info!(
            scenario = %name,
            mean = candidate.mean,
            deviation = candidate.deviation,
            "Scenario exported"
        );
    }

    Ok(())
}

fn run_verify(config: Option<&Path>, files: &[PathBuf]) -> Result<()> {
    let config = CurveConfig::load(config)?;

    let mut all_passed = true;
    for file in files {
        let rows = read_assignment(file)?;
        let report = verify_rows(&rows, &config)?;
        log_audit(file, &report);
        print_json(&report)?;
        if !report.passed {
            all_passed = false;
        }
    }

    if !all_passed {
        bail!("verification failed for one or more assignments");
    }
    Ok(())
}

fn log_audit(file: &Path, report: &AuditReport) {
    let file = file.display().to_string();

    for violation in &report.monotonicity.violations {
        warn!(file = %file, "{}", violation);
    }
    info!(file = %file, passed = report.monotonicity.passed, "Monotonicity check");

    for violation in &report.tie_consistency.violations {
        warn!(file = %file, "{}", violation);
    }
    info!(file = %file, passed = report.tie_consistency.passed, "Tie consistency check");

    info!(
        file = %file,
        mean = report.mean.mean,
        min = report.mean.min,
        max = report.mean.max,
        passed = report.mean.passed,
        "Mean GPA check"
    );

    for tier in &report.tiers {
        info!(
            file = %file,
            tier = %tier.labels.join("/"),
            percent = tier.percent,
            min = tier.min,
            max = tier.max,
            passed = tier.passed,
            "Tier distribution check"
        );
    }
}

fn run_report(config: Option<&Path>, file: &Path) -> Result<()> {
    let config = CurveConfig::load(config)?;
    let rows = read_assignment(file)?;
    if rows.is_empty() {
        bail!("empty score population: nothing to summarize");
    }
    let name = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("assignment");
    let report = scenario_report(name, &rows, &config);
    print_json(&report)?;
    Ok(())
}
