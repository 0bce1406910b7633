use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use runsplits::analysis::{analyze_details_file, analyze_multiple_activities, BatchConfig};
use runsplits::config::AppConfig;
use runsplits::credentials::{CredentialStore, FileCredentialStore};
use runsplits::export::{
    csv as csv_export, text, ExportFormat, ExportManager, FastestSplitReport, PaceTrendReport,
    SplitRow,
};
use runsplits::import::csv::CsvImporter;
use runsplits::import::summary::load_running_activities;
use runsplits::import::ImportFormat;
use runsplits::logging::{init_logging, LogFormat};
use runsplits::models::format_pace;
use runsplits::RunSplitsError;

/// runsplits - per-kilometer split analysis for running activities
///
/// Reads activity telemetry downloaded from Garmin Connect, breaks each run
/// into kilometer splits and tracks the fastest split over time.
#[derive(Parser)]
#[command(name = "runsplits")]
#[command(version)]
#[command(about = "Per-kilometer split analysis for running activities", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-kilometer splits of one activity details file
    Splits {
        /// Path to a *_details.json file
        file: PathBuf,

        /// Output format (table, csv, json)
        #[arg(short = 'f', long, default_value = "table")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fastest kilometer of every downloaded activity
    Fastest {
        /// Directory holding *_details.json files
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// First kilometer eligible as the fastest split
        #[arg(long)]
        min_km: Option<i64>,

        /// Activities in the rolling mean
        #[arg(short, long)]
        window: Option<usize>,

        /// Export the results to a file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export format (csv, json, text); guessed from the output extension
        #[arg(short = 'f', long)]
        format: Option<String>,
    },

    /// Average pace and heart rate trend from summary files
    Paces {
        /// Directory holding *_summary.json files
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// List every running activity
        #[arg(short, long)]
        list: bool,
    },

    /// Pace and heart rate trend from a Garmin Activities.csv export
    Csv {
        /// Path to the exported CSV file
        file: PathBuf,

        /// Activities in the centered rolling mean
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Show the state of cached login tokens
    Auth,

    /// Show or initialize the configuration file
    Config {
        /// Print the effective configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default configuration file
        #[arg(short, long)]
        init: bool,
    },
}

#[derive(Tabled)]
struct SplitDisplayRow {
    #[tabled(rename = "KM")]
    km: i64,
    #[tabled(rename = "Distance (km)")]
    distance: String,
    #[tabled(rename = "Time (min)")]
    duration: String,
    #[tabled(rename = "Pace")]
    pace: String,
    #[tabled(rename = "Avg HR")]
    heart_rate: String,
}

impl From<&SplitRow> for SplitDisplayRow {
    fn from(row: &SplitRow) -> Self {
        SplitDisplayRow {
            km: row.km,
            distance: format!("{:.3}", row.distance_km),
            duration: format!("{:.2}", row.duration_min),
            pace: row.pace.clone(),
            heart_rate: row
                .avg_heart_rate
                .map(|hr| format!("{:.1}", hr))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct TrendDisplayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Pace")]
    pace: String,
    #[tabled(rename = "HR")]
    heart_rate: String,
    #[tabled(rename = "Smoothed pace")]
    smoothed_pace: String,
    #[tabled(rename = "Smoothed HR")]
    smoothed_heart_rate: String,
}

fn optional(value: Option<f64>, render: impl Fn(f64) -> String) -> String {
    value.map(render).unwrap_or_else(|| "-".to_string())
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<RunSplitsError>() {
            Some(e) => eprintln!("{} {}", "Error:".red().bold(), e.user_message()),
            None => eprintln!("{} {:#}", "Error:".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let initializing = matches!(cli.command, Commands::Config { init: true, .. });
    let config = match &cli.config {
        Some(path) if initializing && !path.exists() => AppConfig::default(),
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    let mut log_config = config.logging.clone().with_verbosity(cli.verbose);
    if let Some(format) = &cli.log_format {
        log_config.format = format
            .parse::<LogFormat>()
            .map_err(RunSplitsError::Configuration)?;
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Splits {
            file,
            format,
            output,
        } => run_splits(&file, &format, output.as_deref()),

        Commands::Fastest {
            dir,
            min_km,
            window,
            output,
            format,
        } => {
            let dir = dir.unwrap_or_else(|| config.analysis.activities_dir.clone());
            let min_km = min_km.unwrap_or(config.analysis.warmup_km);
            let window = window.unwrap_or(config.analysis.rolling_window);
            run_fastest(&dir, min_km, window, output.as_deref(), format.as_deref())
        }

        Commands::Paces { dir, list } => {
            let dir = dir.unwrap_or_else(|| config.analysis.activities_dir.clone());
            let activities = load_running_activities(&dir)?;
            let report = PaceTrendReport::build(&activities, config.analysis.rolling_window);

            let mut stdout = std::io::stdout().lock();
            text::write_pace_trend_report(&mut stdout, &report, list)?;
            Ok(())
        }

        Commands::Csv { file, window } => {
            let window = window.unwrap_or(config.analysis.rolling_window);
            run_csv(&file, window)
        }

        Commands::Auth => run_auth(&config),

        Commands::Config { show, init } => {
            let path = cli.config.unwrap_or_else(AppConfig::default_config_path);

            if init {
                if path.exists() {
                    println!(
                        "{} {}",
                        "Configuration already exists:".yellow(),
                        path.display()
                    );
                } else {
                    AppConfig::default().save_to_file(&path)?;
                    println!("{} {}", "✓ Wrote default configuration to".green(), path.display());
                }
            }
            if show || !init {
                let content = toml::to_string_pretty(&config)
                    .context("Failed to serialize configuration")?;
                println!("{}", format!("# {}", path.display()).dimmed());
                println!("{}", content);
            }
            Ok(())
        }
    }
}

fn run_splits(file: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let report = analyze_details_file(file)?;
    let rows: Vec<SplitRow> = report.splits.iter().map(SplitRow::from).collect();

    if format.eq_ignore_ascii_case("table") {
        if let Some(path) = output {
            ExportManager::export_splits(&report.splits, ExportFormat::Text, path)?;
            println!("{} {}", "✓ Splits written to".green(), path.display());
            return Ok(());
        }

        let display: Vec<SplitDisplayRow> = rows.iter().map(SplitDisplayRow::from).collect();
        println!(
            "{} {:.2} km",
            "Total distance:".bold(),
            report.total_distance_km
        );
        println!("{}", Table::new(display).with(Style::rounded()));
        return Ok(());
    }

    let format = ExportFormat::from_str(format)?;
    match output {
        Some(path) => {
            ExportManager::export_splits(&report.splits, format, path)?;
            println!("{} {}", "✓ Splits written to".green(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            match format {
                ExportFormat::Csv => csv_export::write_rows(stdout.lock(), &rows)?,
                ExportFormat::Json => {
                    let json = serde_json::to_string_pretty(&rows)?;
                    writeln!(stdout.lock(), "{}", json)?;
                }
                ExportFormat::Text => text::write_split_table(&mut stdout.lock(), &rows)?,
            }
        }
    }
    Ok(())
}

fn run_fastest(
    dir: &Path,
    min_km: i64,
    window: usize,
    output: Option<&Path>,
    format: Option<&str>,
) -> Result<()> {
    let batch = BatchConfig {
        min_index: min_km,
        show_progress: true,
    };
    let summary = analyze_multiple_activities(dir, &batch)?;
    let report = FastestSplitReport::build(&summary.results, window, min_km);

    {
        let mut stdout = std::io::stdout().lock();
        text::write_fastest_split_report(&mut stdout, &report)?;
    }

    if !summary.skipped.is_empty() {
        eprintln!(
            "{}",
            format!(
                "Skipped {} of {} activities ({} failed to load)",
                summary.skipped.len(),
                summary.total_files,
                summary.failed_count()
            )
            .yellow()
        );
    }

    if let Some(path) = output {
        let format = match format {
            Some(f) => ExportFormat::from_str(f)?,
            None => ExportFormat::from_path(path).unwrap_or(ExportFormat::Csv),
        };
        ExportManager::export_fastest_splits(&report, format, path)?;
        println!("{} {}", "✓ Results saved to".green(), path.display());
    }

    Ok(())
}

fn run_csv(file: &Path, window: usize) -> Result<()> {
    let activities = CsvImporter::new().import_file(file)?;
    let report = PaceTrendReport::build(&activities, window);

    let display: Vec<TrendDisplayRow> = report
        .activities
        .iter()
        .map(|row| TrendDisplayRow {
            date: row.timestamp.format("%Y-%m-%d").to_string(),
            pace: optional(row.pace_min_per_km, format_pace),
            heart_rate: optional(row.heart_rate, |hr| format!("{:.0}", hr)),
            smoothed_pace: optional(row.smoothed_pace, format_pace),
            smoothed_heart_rate: optional(row.smoothed_heart_rate, |hr| format!("{:.0}", hr)),
        })
        .collect();
    println!("{}", Table::new(display).with(Style::rounded()));

    let mut stdout = std::io::stdout().lock();
    text::write_pace_trend_report(&mut stdout, &report, false)?;
    Ok(())
}

fn run_auth(config: &AppConfig) -> Result<()> {
    let store = FileCredentialStore::new(config.token_dir());

    match store.load()? {
        Some(tokens) => {
            println!(
                "{} {}",
                "✓ Cached tokens found in".green(),
                store.dir().display()
            );
            println!(
                "  Access token: {}",
                config.logging.redact(&tokens.oauth2.access_token)
            );
            if tokens.needs_login() {
                println!("{}", "  Refresh token expired, a new login is required".yellow());
            } else if tokens.oauth2.is_expired_at(chrono::Utc::now().timestamp()) {
                println!("  Access token expired, it will be refreshed on next download");
            } else {
                println!("  Access token valid");
            }
        }
        None => {
            println!(
                "{} {}",
                "No cached tokens in".yellow(),
                store.dir().display()
            );
            println!("  Log in with the downloader to create them");
        }
    }
    Ok(())
}
