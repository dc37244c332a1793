//! Fraud Risk Scorer - Main Entry Point
//!
//! Reads NDJSON transactions from a file or stdin, scores them and writes
//! one JSON result per line to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use fraud_risk_scorer::{
    config::{AppConfig, LogFormat, DEFAULT_CONFIG_PATH},
    metrics::{MetricsReporter, PipelineMetrics},
    FeatureExtractor, Pipeline, RiskScorer, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fraud-scorer", about = "Score NDJSON transactions for fraud risk")]
struct Args {
    /// Configuration file. Defaults are used when it does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// NDJSON input file. Reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Log the metrics snapshot as JSON when the input is exhausted.
    #[arg(long)]
    snapshot: bool,
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("fraud_risk_scorer={}", config.logging.level))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = AppConfig::load_or_default(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    init_logging(&config);

    info!("Starting fraud risk scorer");
    info!(
        "Risk levels: medium>={:.2}, high>={:.2}, critical>={:.2}",
        config.detection.risk_levels.medium,
        config.detection.risk_levels.high,
        config.detection.risk_levels.critical
    );

    let extractor = FeatureExtractor::new();
    info!(
        "Feature extractor initialized ({} features): {:?}",
        extractor.feature_count(),
        extractor.feature_names()
    );

    let metrics = Arc::new(PipelineMetrics::new(config.metrics.max_entries));
    let scorer = Arc::new(RiskScorer::with_clock(Arc::new(SystemClock)));
    let config = Arc::new(config);

    // Start metrics reporter
    let reporter = tokio::spawn(
        MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs).start(),
    );

    let pipeline = Pipeline::new(scorer.clone(), metrics.clone(), config.clone());
    let stdout = tokio::io::stdout();

    let summary = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            info!(input = %path.display(), "Reading transactions from file");
            pipeline.run(BufReader::new(file), stdout).await?
        }
        None => {
            info!("Reading transactions from stdin");
            pipeline.run(BufReader::new(tokio::io::stdin()), stdout).await?
        }
    };
    reporter.abort();

    info!(
        processed = summary.processed,
        rejected = summary.rejected,
        alerts = summary.alerts,
        "Scorer shutting down"
    );
    metrics.print_summary();

    if args.snapshot {
        let snapshot = metrics.snapshot(config.metrics.window_seconds, scorer.clock().now());
        info!(
            snapshot = %serde_json::to_string(&snapshot)?,
            "Metrics snapshot"
        );
    }

    Ok(())
}
