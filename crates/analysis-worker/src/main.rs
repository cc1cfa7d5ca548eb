//! Analysis Worker
//!
//! Reads per-player PGN exports, samples every game with a local Stockfish
//! and stores one analyzed record per player.
//!
//! ```text
//! analysis-worker --pgn-dir <dir> [--out <dir>]
//! analysis-worker --player <name> --pgn <file> [--out <dir>]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use analysis_worker::analyzer::{analyze_games, select_games, GameSelection};
use analysis_worker::config::WorkerConfig;
use analysis_worker::db;
use analysis_worker::error::WorkerError;
use analysis_worker::stockfish::StockfishEngine;
use anyhow::{bail, Context};
use sqlx::PgPool;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// One player's PGN export.
#[derive(Debug, Clone)]
struct PlayerJob {
    username: String,
    pgn_path: PathBuf,
}

#[derive(Debug, Default)]
struct CliArgs {
    pgn_dir: Option<PathBuf>,
    player: Option<String>,
    pgn: Option<PathBuf>,
    out: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .with_context(|| format!("{flag} needs a value"))
        };
        match flag.as_str() {
            "--pgn-dir" => parsed.pgn_dir = Some(value()?.into()),
            "--player" => parsed.player = Some(value()?),
            "--pgn" => parsed.pgn = Some(value()?.into()),
            "--out" => parsed.out = Some(value()?.into()),
            other => bail!("Unknown argument {other}"),
        }
    }
    Ok(parsed)
}

/// `<dir>/<username>.pgn` for every export in the directory.
fn jobs_from_dir(dir: &std::path::Path) -> anyhow::Result<Vec<PlayerJob>> {
    let pattern = dir.join("*.pgn");
    let pattern = pattern.to_str().context("PGN directory is not valid UTF-8")?;

    let mut jobs = Vec::new();
    for entry in glob::glob(pattern)? {
        let pgn_path = entry?;
        let Some(username) = pgn_path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        jobs.push(PlayerJob {
            username: username.to_string(),
            pgn_path: pgn_path.clone(),
        });
    }
    Ok(jobs)
}

#[derive(Clone)]
enum RecordSink {
    Postgres(PgPool),
    Files(PathBuf),
}

impl RecordSink {
    async fn save(&self, record: &chess_core::record::PlayerRecord) -> Result<(), WorkerError> {
        match self {
            RecordSink::Postgres(pool) => db::save_player_record(pool, record).await,
            RecordSink::Files(dir) => db::write_record_file(dir, record).await.map(|_| ()),
        }
    }
}

async fn run_job(job: PlayerJob, config: Arc<WorkerConfig>, sink: RecordSink) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&job.pgn_path)
        .await
        .with_context(|| format!("Failed to read {}", job.pgn_path.display()))?;

    let selection = GameSelection {
        max_games: config.max_games_per_player,
        min_moves: config.min_moves_per_game,
    };
    let selected = select_games(&text, &job.username, selection);
    info!(
        player = %job.username,
        games = selected.games.len(),
        rejected = selected.rejected,
        "Games selected"
    );

    let mut engine = StockfishEngine::new(&config.stockfish_path).await?;
    let analysis = analyze_games(&mut engine, &job.username, &selected.games, &config.analysis).await;
    engine.quit().await;

    let analysis = analysis?;
    sink.save(&analysis.record).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args = parse_args()?;
    let jobs = match (&args.pgn_dir, &args.player, &args.pgn) {
        (Some(dir), None, None) => jobs_from_dir(dir)?,
        (None, Some(player), Some(pgn)) => vec![PlayerJob {
            username: player.clone(),
            pgn_path: pgn.clone(),
        }],
        _ => bail!("Usage: analysis-worker (--pgn-dir <dir> | --player <name> --pgn <file>) [--out <dir>]"),
    };

    let config = Arc::new(WorkerConfig::load()?);
    info!(
        stockfish_path = %config.stockfish_path,
        max_workers = config.max_workers,
        players = jobs.len(),
        "Worker config loaded"
    );

    let sink = match (&args.out, &config.database_url) {
        (Some(dir), _) => RecordSink::Files(dir.clone()),
        (None, Some(url)) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_workers as u32 + 1)
                .acquire_timeout(std::time::Duration::from_secs(10))
                .connect(url)
                .await?;
            db::ensure_player_table(&pool).await?;
            info!("Database connection pool established");
            RecordSink::Postgres(pool)
        }
        (None, None) => return Err(WorkerError::Config("DATABASE_URL or --out is required").into()),
    };

    // One Stockfish process per running task
    let semaphore = Arc::new(Semaphore::new(config.max_workers));
    let mut handles = Vec::with_capacity(jobs.len());

    for job in jobs {
        let permit = semaphore.clone().acquire_owned().await?;
        let config = config.clone();
        let sink = sink.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit; // Hold until done
            let username = job.username.clone();
            match run_job(job, config, sink).await {
                Ok(()) => {
                    info!(player = %username, "Analysis complete");
                    true
                }
                Err(e) => {
                    error!(player = %username, error = %e, "Analysis failed");
                    false
                }
            }
        }));
    }

    let mut failed = 0usize;
    for handle in handles {
        if !handle.await.unwrap_or(false) {
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} player analyses failed");
    }
    info!("All players analyzed");
    Ok(())
}
