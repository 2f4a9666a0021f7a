//! opex-pulse CLI
//!
//! Evaluates a metric catalog against Grafana and writes the results:
//! - `run`: evaluate a catalog over a time window
//! - `config`: print or write a default config file

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use opex_pulse::config::{generate_default_config, Config, LoggingConfig};
use opex_pulse::{
    cancellation, load_catalog, load_token, resolve_window, write_report_file, ApprovalPolicy,
    EvaluationOptions, Evaluator, GrafanaClient, ReducerRegistry, ReportFormat,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "opex-pulse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluate a catalog of PromQL metrics through Grafana")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate every metric in a catalog over a time window
    Run(RunArgs),

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Window start: epoch seconds, "now" or "now-<n><s|m|h|d|w>"
    #[arg(long)]
    pub start: Option<String>,

    /// Window end (default: now)
    #[arg(long)]
    pub end: Option<String>,

    /// File holding the credential token
    #[arg(long, alias = "cookie_file")]
    pub cookie_file: PathBuf,

    /// Metric catalog CSV
    #[arg(long, default_value = "sample.csv")]
    pub catalog: PathBuf,

    /// Report destination, or "-" for stdout
    #[arg(short, long, default_value = "output.csv")]
    pub output: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Csv)]
    pub format: ReportFormat,

    /// Config file (default: standard locations)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Grafana base URL
    #[arg(long)]
    pub grafana_url: Option<String>,

    /// Per-query timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum number of queries in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Deadline for the whole run in seconds
    #[arg(long)]
    pub deadline: Option<u64>,

    /// Read the catalog's Approved column instead of assuming every metric is approved
    #[arg(long)]
    pub trust_approved: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("Failed to create {:?}", parent))?;
                    }
                    std::fs::write(&path, &config)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
            Ok(())
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path),
        None => Config::load_default(),
    }
    .context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, &args);
    init_logging(&config.logging);

    tracing::info!("opex-pulse v{}", env!("CARGO_PKG_VERSION"));

    let window = resolve_window(args.start.as_deref(), args.end.as_deref(), Utc::now())
        .context("Invalid time range")?;

    let catalog = load_catalog(&args.catalog, config.evaluation.approval_policy)
        .context("Failed to load metric catalog")?;

    let token = load_token(&args.cookie_file).context("Failed to load credential")?;

    let client = GrafanaClient::new(config.grafana.clone(), &token)
        .context("Failed to build Grafana client")?;

    let evaluator = Evaluator::new(
        Arc::new(client),
        Arc::new(ReducerRegistry::standard()),
        EvaluationOptions {
            concurrency: config.evaluation.concurrency,
            run_deadline: config.evaluation.run_deadline(),
        },
    );

    let (cancel_handle, cancel_token) = cancellation();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling in-flight queries");
            cancel_handle.cancel();
        }
    });

    let report = evaluator
        .run_until_cancelled(&catalog, window, cancel_token)
        .await;
    interrupt.abort();

    write_report_file(&args.output, args.format, &report)
        .with_context(|| format!("Failed to write report to {:?}", args.output))?;

    tracing::info!(summary = %report, "Run finished");
    Ok(())
}

fn apply_cli_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(url) = &args.grafana_url {
        config.grafana.base_url = url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.grafana.timeout_secs = timeout;
    }
    if let Some(concurrency) = args.concurrency {
        config.evaluation.concurrency = concurrency;
    }
    if let Some(deadline) = args.deadline {
        config.evaluation.run_deadline_secs = Some(deadline);
    }
    if args.trust_approved {
        config.evaluation.approval_policy = ApprovalPolicy::TrustCatalog;
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("opex_pulse={}", logging.level)),
    );
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so a report written to stdout stays clean
    if logging.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
