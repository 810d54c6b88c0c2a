//! GFS partial downloader.
//!
//! Downloads selected fields of GFS 0.25° forecast files from NOMADS using
//! HTTP Range requests driven by the `.idx` inventories.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use downloader::config::load_model_config;
use downloader::request::parse_date;
use downloader::{
    Cycle, DownloadConfig, DownloadManager, ForecastHour, ModelConfig, RunRequest, Scheduler,
};

#[derive(Parser, Debug)]
#[command(name = "gfs-download")]
#[command(about = "Download selected GFS GRIB2 fields with HTTP Range requests")]
struct Args {
    /// Forecast hours (e.g. f006 012 18); default: the full catalog f003..f381
    #[arg(short = 'f', long = "fcst", num_args = 1..)]
    forecast_hours: Vec<String>,

    /// Variables, paired one-to-one with --levs
    #[arg(short = 'v', long = "vars", num_args = 1..)]
    variables: Vec<String>,

    /// Levels, paired one-to-one with --vars
    #[arg(short = 'l', long = "levs", num_args = 1..)]
    levels: Vec<String>,

    /// Model run date (YYYYMMDD)
    #[arg(short = 'd', long = "date")]
    date: String,

    /// Model cycle (00, 06, 12 or 18)
    #[arg(short = 'r', long = "run")]
    run: String,

    /// Output directory
    #[arg(short = 'o', long = "folder", default_value = "./")]
    output_dir: PathBuf,

    /// Configuration directory (contains models/*.yaml)
    #[arg(long, env = "CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Forecast hours processed concurrently
    #[arg(long, env = "GFS_MAX_WORKERS")]
    max_workers: Option<usize>,

    /// Forecast hours handed to a worker at a time
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Additional attempts after an empty response
    #[arg(long)]
    max_retries: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,

    /// Archive root URL
    #[arg(long, env = "GFS_BASE_URL")]
    base_url: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Exit with a failure status if any forecast hour failed
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    info!("Starting GFS downloader");

    let mut model = load_model_config(&args.config_dir, "gfs")?;
    apply_overrides(&mut model, &args);
    model.retrieval.validate()?;

    let run = build_run(&args, &model)?;

    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    info!(
        date = %run.date,
        cycle = %run.cycle,
        forecast_hours = run.forecast_hours.len(),
        fields = run.fields.len(),
        output_dir = %args.output_dir.display(),
        "Run configured"
    );

    let download_config = DownloadConfig::from_model(&model, args.output_dir.clone());
    let download_manager = Arc::new(DownloadManager::new(download_config)?);
    let scheduler = Scheduler::new(
        download_manager,
        model.retrieval.max_workers,
        model.retrieval.chunk_size,
    );

    let report = scheduler.run(run.forecast_requests()).await;

    for (hour, e) in report.failures() {
        error!(forecast_hour = %hour, kind = e.kind(), error = %e, "Forecast hour failed");
    }
    if report.empty() > 0 {
        warn!(count = report.empty(), "Some files were written empty after retries");
    }

    if args.strict && !report.is_success() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Command-line values take precedence over the config file.
fn apply_overrides(model: &mut ModelConfig, args: &Args) {
    let retrieval = &mut model.retrieval;
    if let Some(max_workers) = args.max_workers {
        retrieval.max_workers = max_workers;
    }
    if let Some(chunk_size) = args.chunk_size {
        retrieval.chunk_size = chunk_size;
    }
    if let Some(max_retries) = args.max_retries {
        retrieval.max_retries = max_retries;
    }
    if let Some(timeout) = args.request_timeout_secs {
        retrieval.request_timeout_secs = timeout;
    }
    if let Some(base_url) = &args.base_url {
        model.source.base_url = base_url.clone();
    }
    if !args.variables.is_empty() {
        model.fields.variables = args.variables.clone();
    }
    if !args.levels.is_empty() {
        model.fields.levels = args.levels.clone();
    }
}

fn build_run(args: &Args, model: &ModelConfig) -> Result<RunRequest> {
    let date = parse_date(&args.date)?;
    let cycle: Cycle = args.run.parse()?;

    let forecast_hours = if args.forecast_hours.is_empty() {
        ForecastHour::catalog()
    } else {
        args.forecast_hours
            .iter()
            .map(|h| h.parse::<ForecastHour>())
            .collect::<downloader::Result<Vec<_>>>()?
    };

    Ok(RunRequest::new(
        date,
        cycle,
        forecast_hours,
        &model.fields.variables,
        &model.fields.levels,
    )?)
}
