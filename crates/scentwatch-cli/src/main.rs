//! `scentwatch`: runs the COVID / candle-review correlation pipeline.
//!
//! # Usage
//!
//! ```text
//! scentwatch run                      # all four steps, in order
//! scentwatch ingest-covid
//! scentwatch ingest-reviews
//! scentwatch transform-reviews
//! scentwatch correlate
//! scentwatch report                   # print weekly_correlation
//! scentwatch --config ./scentwatch.toml --store /data/pipeline.db run
//! ```
//!
//! Steps run one after another in a single process. Any failure aborts the
//! run with the step's watermark unchanged, so rerunning is safe.

mod settings;
mod report;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use settings::PipelineConfig;
use scentwatch_core::{
  correlate::run_correlation, loader::run_incremental_load, report::StepReport, store::PipelineStore,
  transform::run_transform,
};
use scentwatch_sources::{CovidApiClient, HttpPageFetcher, ReviewScraper};
use scentwatch_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "COVID cases vs. \"no scent\" candle reviews")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "scentwatch.toml")]
  config: PathBuf,

  /// SQLite file to use; overrides `store_path` from the config.
  #[arg(long, env = "SCENTWATCH_STORE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
  /// Ingest new daily cumulative COVID cases.
  IngestCovid,
  /// Scrape and ingest new critical reviews.
  IngestReviews,
  /// Count reviews and "no scent" reviews per day.
  TransformReviews,
  /// Compute the weekly expanding-window correlation.
  Correlate,
  /// Run every step in order, stopping at the first failure.
  Run,
  /// Print the weekly correlation table.
  Report,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = PipelineConfig::load(&cli.config)?;
  if let Some(store) = cli.store {
    cfg.store_path = settings::expand_tilde(&store);
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::IngestCovid => report_step(ingest_covid(&store, &cfg).await?),
    Command::IngestReviews => report_step(ingest_reviews(&store, &cfg).await?),
    Command::TransformReviews => report_step(transform_reviews(&store, &cfg).await?),
    Command::Correlate => report_step(correlate(&store, &cfg).await?),
    Command::Run => {
      report_step(ingest_covid(&store, &cfg).await?);
      report_step(ingest_reviews(&store, &cfg).await?);
      report_step(transform_reviews(&store, &cfg).await?);
      report_step(correlate(&store, &cfg).await?);
    }
    Command::Report => {
      let weeks = store
        .weekly_correlation()
        .await
        .context("failed to read weekly_correlation")?;
      print!("{}", report::render(&weeks));
    }
  }

  Ok(())
}

fn report_step(report: StepReport) { println!("{report}") }

// ─── Steps ────────────────────────────────────────────────────────────────────

async fn ingest_covid(store: &SqliteStore, cfg: &PipelineConfig) -> Result<StepReport> {
  let source = CovidApiClient::new(&cfg.covid_url, &cfg.http())?;
  run_incremental_load(store, &source, &cfg.covid_watermark_key)
    .await
    .context("ingest-covid failed")
}

async fn ingest_reviews(store: &SqliteStore, cfg: &PipelineConfig) -> Result<StepReport> {
  let fetcher = HttpPageFetcher::new(&cfg.reviews_url, &cfg.http())?;
  let source = ReviewScraper::new(fetcher, cfg.max_review_pages);
  run_incremental_load(store, &source, &cfg.reviews_watermark_key)
    .await
    .context("ingest-reviews failed")
}

async fn transform_reviews(store: &SqliteStore, cfg: &PipelineConfig) -> Result<StepReport> {
  run_transform(store, &cfg.transform_watermark_key)
    .await
    .context("transform-reviews failed")
}

async fn correlate(store: &SqliteStore, cfg: &PipelineConfig) -> Result<StepReport> {
  run_correlation(store, &cfg.correlation_watermark_key)
    .await
    .context("correlate failed")
}
