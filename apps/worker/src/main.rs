use std::path::{Path, PathBuf};

use anyhow::Context;
use cantus_shared_config::Resolution;
use cantus_worker::{
    classify, format_timestamp, melody::load_midi, Config, CorpusCache, Match, MatchError,
    MelodyMatcher, ScaleCatalog, ScaleMatch, WorkerPool,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Query-by-humming melody matcher
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank corpus tracks against each query melody
    Match {
        /// Query MIDI files
        #[arg(required = true)]
        queries: Vec<PathBuf>,
    },
    /// Rank scale templates for each query melody
    Classify {
        /// Query MIDI files
        #[arg(required = true)]
        queries: Vec<PathBuf>,

        /// JSON scale catalog (overrides SCALE_CATALOG_PATH)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct MatchReport {
    #[serde(flatten)]
    matched: Match,
    timestamp: String,
}

#[derive(Serialize)]
struct QueryReport<T: Serialize> {
    query: String,
    notes: usize,
    results: Vec<T>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(config.log_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        corpus = %config.corpus_path().display(),
        resolution = %config.resolution(),
        threads = config.worker_threads,
        "Starting Cantus worker"
    );

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling query");
            ctrl_c_token.cancel();
        }
    });

    let output = tokio::task::spawn_blocking(move || run(cli.command, config, cancel))
        .await
        .context("Worker task panicked")?
        .map_err(|e| {
            e.log();
            anyhow::Error::from(e)
        })?;

    println!("{}", output);
    Ok(())
}

fn run(command: Command, config: Config, cancel: CancellationToken) -> Result<String, MatchError> {
    match command {
        Command::Match { queries } => run_match(&queries, config, &cancel),
        Command::Classify { queries, catalog } => {
            let catalog_path = catalog.or_else(|| config.scale_catalog_path.clone());
            run_classify(&queries, catalog_path.as_deref(), config.resolution())
        }
    }
}

fn run_match(
    queries: &[PathBuf],
    config: Config,
    cancel: &CancellationToken,
) -> Result<String, MatchError> {
    let resolution = config.resolution();
    let corpus_path = config.corpus_path().clone();
    let matcher = MelodyMatcher::new(config.matcher, WorkerPool::new(config.worker_threads)?)?;
    let cache = CorpusCache::new();

    let mut reports = Vec::with_capacity(queries.len());
    for query_path in queries {
        // Re-checks the corpus fingerprint between queries
        let corpus = cache.get_or_load(
            &corpus_path,
            &matcher.config().chunking,
            resolution,
            matcher.pool(),
        )?;
        let query = load_midi(query_path, resolution)?;
        let matches = matcher.search_with_cancel(&query, &corpus, cancel)?;

        reports.push(QueryReport {
            query: display_name(query_path),
            notes: query.len(),
            results: matches
                .into_iter()
                .map(|m| MatchReport {
                    timestamp: format_timestamp(m.start_time),
                    matched: m,
                })
                .collect::<Vec<_>>(),
        });
    }

    Ok(serde_json::to_string_pretty(&reports)?)
}

fn run_classify(
    queries: &[PathBuf],
    catalog_path: Option<&Path>,
    resolution: Resolution,
) -> Result<String, MatchError> {
    let catalog = match catalog_path {
        Some(path) => ScaleCatalog::load(path)?,
        None => ScaleCatalog::maqams(),
    };

    let reports = queries
        .iter()
        .map(|query_path| {
            let query = load_midi(query_path, resolution)?;
            Ok(QueryReport::<ScaleMatch> {
                query: display_name(query_path),
                notes: query.len(),
                results: classify(query.pitches(), &catalog, resolution),
            })
        })
        .collect::<Result<Vec<_>, MatchError>>()?;

    Ok(serde_json::to_string_pretty(&reports)?)
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}
