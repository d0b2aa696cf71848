use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use resaleclean::{
    config::{CleanConfig, OutputFormat},
    io,
};
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "resaleclean")]
#[command(about = "Clean a housing resale transactions CSV into typed, derived columns")]
struct Args {
    /// Input CSV file (falls back to `input` in the config file)
    input: Option<PathBuf>,

    /// Output file (default: <input stem>_clean.<format>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from the output extension, else parquet)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Rows of the cleaned table to print
    #[arg(long, default_value_t = 5)]
    preview: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_level = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) resolve configuration ────────────────────────────────────
    let config = match &args.config {
        Some(path) => CleanConfig::load(path)?,
        None => CleanConfig::default(),
    };
    let input = args
        .input
        .clone()
        .or_else(|| config.input.clone())
        .context("no input CSV given (pass a path or set `input` in the config)")?;
    let output = args.output.clone().or_else(|| config.output.clone());
    let format = args
        .format
        .or(config.format)
        .or_else(|| output.as_deref().and_then(OutputFormat::from_path))
        .unwrap_or_default();
    let output = output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "resale".to_string());
        input.with_file_name(format!("{}_clean.{}", stem, format.extension()))
    });
    let report_path = args.report.clone().or_else(|| config.report.clone());

    // ─── 3) load + clean ─────────────────────────────────────────────
    let raw = io::load_csv(&input)?;
    let pipeline = config.pipeline();
    info!(stages = ?pipeline.stage_names(), "running pipeline");
    let (cleaned, report) = pipeline
        .run_with_report(raw)
        .with_context(|| format!("cleaning {}", input.display()))?;

    if args.preview > 0 {
        let rows = args.preview.min(cleaned.num_rows());
        println!("{}", pretty_format_batches(&[cleaned.slice(0, rows)])?);
        println!("[{} rows x {} columns]", cleaned.num_rows(), cleaned.num_columns());
    }

    // ─── 4) write outputs ────────────────────────────────────────────
    io::write_table(&cleaned, &output, format)?;
    info!(path = %output.display(), ?format, rows = cleaned.num_rows(), "wrote cleaned table");

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&path, json).with_context(|| format!("writing report {}", path.display()))?;
        info!(path = %path.display(), "wrote run report");
    }

    Ok(())
}
