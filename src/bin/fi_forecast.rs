//! fi-forecast command line
//!
//! Loads the input tables from a directory, runs the pipeline and writes the
//! artifacts.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fi_forecast::{export, Dataset, EvidenceStore, FiResult, IndicatorCode, Pipeline, PipelineConfig};

/// Command line options
struct Args {
    /// Directory holding the input CSV files
    data_dir: PathBuf,
    /// Directory artifacts are written to
    out_dir: PathBuf,
    /// Optional TOML configuration
    config: Option<PathBuf>,
    /// Optional comparable-country evidence catalogue (JSON)
    evidence: Option<PathBuf>,
    /// Aggregation date; today when not given
    target_date: Option<NaiveDate>,
    /// Forecast only these indicators
    indicators: Vec<IndicatorCode>,
    /// Override for the forecast worker count
    workers: Option<usize>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            out_dir: PathBuf::from("./out"),
            config: None,
            evidence: None,
            target_date: None,
            indicators: Vec::new(),
            workers: None,
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    std::process::exit(2);
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(v) => v,
        None => fail(&format!("{flag} requires a value")),
    }
}

fn print_help() {
    println!("fi-forecast - event impacts and scenario forecasts for financial-inclusion indicators");
    println!();
    println!("USAGE:");
    println!("    fi-forecast [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -d, --data-dir <DIR>         Input directory [default: ./data]");
    println!("    -o, --out-dir <DIR>          Output directory [default: ./out]");
    println!("    -c, --config <FILE>          TOML configuration file");
    println!("    -e, --evidence <FILE>        Comparable-country evidence JSON [default: built-in]");
    println!("    -t, --target-date <DATE>     Aggregation date, YYYY-MM-DD [default: today]");
    println!("    -i, --indicator <CODE>       Forecast this indicator (repeatable)");
    println!("    -w, --workers <N>            Forecast worker threads");
    println!("    -h, --help                   Print help information");
    println!();
    println!("Log verbosity follows RUST_LOG [default: info].");
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" => parsed.data_dir = PathBuf::from(value(&args, i, "--data-dir")),
            "--out-dir" | "-o" => parsed.out_dir = PathBuf::from(value(&args, i, "--out-dir")),
            "--config" | "-c" => parsed.config = Some(PathBuf::from(value(&args, i, "--config"))),
            "--evidence" | "-e" => parsed.evidence = Some(PathBuf::from(value(&args, i, "--evidence"))),
            "--target-date" | "-t" => {
                let text = value(&args, i, "--target-date");
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .unwrap_or_else(|_| fail(&format!("invalid date: {text}")));
                parsed.target_date = Some(date);
            }
            "--indicator" | "-i" => {
                let text = value(&args, i, "--indicator");
                let code = IndicatorCode::new(text).unwrap_or_else(|e| fail(&e.to_string()));
                parsed.indicators.push(code);
            }
            "--workers" | "-w" => {
                let text = value(&args, i, "--workers");
                let n = text
                    .parse()
                    .unwrap_or_else(|_| fail(&format!("invalid worker count: {text}")));
                parsed.workers = Some(n);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg => fail(&format!("unknown argument: {arg}")),
        }
        i += 2;
    }

    parsed
}

fn run(args: Args) -> FiResult<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };
    if !args.indicators.is_empty() {
        config.indicators = args.indicators;
    }
    if let Some(workers) = args.workers {
        config.forecast_workers = workers;
    }
    let evidence = match &args.evidence {
        Some(path) => EvidenceStore::from_json_file(path)?,
        None => EvidenceStore::reference(),
    };
    let target_date = args.target_date.unwrap_or_else(|| Utc::now().date_naive());

    info!(data_dir = %args.data_dir.display(), "loading dataset");
    let (dataset, load) = Dataset::load_dir(&args.data_dir)?;
    let report = Pipeline::new(config, evidence)
        .run(&dataset, target_date)?
        .with_load_report(load);

    for path in export::write_all(&report, &args.out_dir)? {
        println!("wrote {}", path.display());
    }
    for gap in &report.target_gaps {
        println!(
            "{} {} {}: forecast {:.1} vs target {:.1} in {} (gap {:+.1}pp)",
            gap.indicator_code, gap.label, gap.scenario, gap.forecast_value, gap.target_value, gap.forecast_year, gap.gap
        );
    }
    if !report.skipped.is_empty() {
        println!("{} item(s) skipped; see run_report.json", report.skipped.len());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
