use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schedule_sync::calculate::parse_time_range;
use schedule_sync::config::AppConfig;
use schedule_sync::fetch::{ServiceAccountKey, SheetsSource, SourceError, SpreadsheetSource};
use schedule_sync::ingest::{ingest, IngestError, IngestResult};
use schedule_sync::normalize::{NormalizeError, NormalizePolicy};
use schedule_sync::storage::{to_json_string, ScheduleWriter};
use schedule_sync::TimeRange;

#[derive(Parser)]
#[command(name = "schedule-sync")]
#[command(about = "Convert class schedules into calendar JSON")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a local spreadsheet file (always exits 0; failures are logged)
    Convert {
        /// Spreadsheet file (.xlsx, .xls, .ods, .csv)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Worksheet to read (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,

        /// Output JSON file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the document instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Convert a Google Sheets worksheet (exits 1 on any failure)
    Sync {
        /// Spreadsheet title
        #[arg(long)]
        spreadsheet: Option<String>,

        /// Worksheet title
        #[arg(long)]
        worksheet: Option<String>,

        /// Output JSON file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the document instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show how TIME values are parsed
    Duration {
        /// Time ranges, e.g. "9:00AM-10:15AM"
        #[arg(required = true)]
        times: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config);
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().ok().map(|c| c.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::debug!("Starting schedule-sync v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Convert {
            input,
            sheet,
            output,
            dry_run,
        } => {
            let config = match config {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!("[FATAL] {}", e);
                    return Ok(());
                }
            };

            let policy = config.local_policy();
            let input = input.unwrap_or_else(|| config.local.input_file.clone());
            let output = output.unwrap_or_else(|| config.local.output_file.clone());
            let source = SpreadsheetSource::new(input).with_sheet(sheet.or(config.local.sheet.clone()));
            let writer = ScheduleWriter::new(output);

            match ingest(&source, &policy, &writer, dry_run).await {
                Ok(result) => report_success(&result, dry_run),
                Err(e) => report_local_failure(&e, &policy),
            }
        }
        Commands::Sync {
            spreadsheet,
            worksheet,
            output,
            dry_run,
        } => match run_sync(config, spreadsheet, worksheet, output, dry_run).await {
            Ok(result) => report_success(&result, dry_run),
            Err(e) => {
                tracing::error!("[FATAL] An unexpected error occurred: {:#}", e);
                std::process::exit(1);
            }
        },
        Commands::Duration { times } => {
            for time in &times {
                let range = parse_time_range(Some(time.as_str()));
                match range {
                    TimeRange::Scheduled { start, end } => {
                        let minutes = range.duration_minutes().unwrap_or_default();
                        println!(
                            "{:<24} {} -> {}  ({} minutes)",
                            time,
                            start.format("%H:%M"),
                            end.format("%H:%M"),
                            minutes
                        );
                    }
                    TimeRange::Unparseable => println!("{:<24} unparseable", time),
                }
            }
        }
    }

    Ok(())
}

/// Google Sheets conversion. Every failure propagates to the caller.
async fn run_sync(
    config: Result<AppConfig, schedule_sync::config::ConfigError>,
    spreadsheet: Option<String>,
    worksheet: Option<String>,
    output: Option<PathBuf>,
    dry_run: bool,
) -> Result<IngestResult> {
    let config = config?;
    let remote = &config.remote;

    tracing::info!("Authenticating with Google Sheets API...");
    let blob = std::env::var(&remote.credentials_env).with_context(|| {
        format!(
            "Service account key not found in environment variable {}",
            remote.credentials_env
        )
    })?;
    let key = ServiceAccountKey::from_json(&blob)?;

    let mut sheets_config = remote.sheets_config();
    if let Some(spreadsheet) = spreadsheet {
        sheets_config.spreadsheet = spreadsheet;
    }
    if let Some(worksheet) = worksheet {
        sheets_config.worksheet = worksheet;
    }

    let source = SheetsSource::new(key, sheets_config);
    let writer = ScheduleWriter::new(output.unwrap_or_else(|| remote.output_file.clone()));
    let policy = config.remote_policy();

    Ok(ingest(&source, &policy, &writer, dry_run).await?)
}

fn report_success(result: &IngestResult, dry_run: bool) {
    if dry_run {
        match to_json_string(&result.records) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to render records: {}", e),
        }
    }

    println!("\n=== Conversion Results ===");
    println!("Rows read:        {}", result.rows_read);
    println!("Records:          {}", result.records.len());
    println!("Unscheduled:      {}", result.unscheduled);

    match &result.output {
        Some(path) => tracing::info!("[SUCCESS] Conversion complete! Data saved to {:?}.", path),
        None => println!("\n(dry run - no data written to disk)"),
    }
}

fn report_local_failure(err: &IngestError, policy: &NormalizePolicy) {
    match err {
        IngestError::Source(SourceError::NotFound(_)) => {
            tracing::error!("[FATAL] Error: {}", err);
        }
        IngestError::Normalize(NormalizeError::MissingColumns { .. }) => {
            tracing::error!("[FATAL] {} in the spreadsheet", err);
            tracing::info!(
                "Please ensure your column headers include: {}",
                policy.required_columns().join(", ")
            );
        }
        _ => tracing::error!("[FATAL] An unexpected error occurred: {}", err),
    }
}
