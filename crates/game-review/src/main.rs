//! Game review CLI
//!
//! Reviews a PGN game move by move with a local Stockfish and prints the
//! report to stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use game_review::analyzer::{review_game, GameReview, PreparedGame};
use game_review::config::ReviewConfig;
use game_review::error::ReviewError;
use game_review::report;
use game_review::sample::SAMPLE_PGN;

#[derive(Parser)]
#[command(name = "game-review")]
#[command(author, version, about = "Move-quality review of chess games", long_about = None)]
struct Cli {
    /// PGN file to review; a built-in sample game when omitted
    pgn: Option<PathBuf>,

    /// Path to the UCI engine binary
    #[arg(short, long)]
    engine: Option<PathBuf>,

    /// Search depth for candidate lines
    #[arg(short, long)]
    depth: Option<u32>,

    /// Print JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Review every game in the file, not just the first
    #[arg(long)]
    all_games: bool,

    /// Games reviewed in parallel
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = ReviewConfig::load()?;
    if let Some(engine) = cli.engine {
        config.stockfish_path = engine;
    }
    if let Some(depth) = cli.depth {
        config.analysis_depth = depth;
    }
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs;
    }
    config.validate()?;

    let pgn = match &cli.pgn {
        Some(path) => std::fs::read_to_string(path).map_err(|source| ReviewError::Input {
            path: path.clone(),
            source,
        })?,
        None => {
            eprintln!("Using built-in test game.");
            SAMPLE_PGN.to_string()
        }
    };

    // Every game is parsed and resolved before any engine starts
    let games = if cli.all_games {
        PreparedGame::parse_all(&pgn)?
    } else {
        vec![PreparedGame::parse(&pgn)?]
    };

    let reviews = review_all(games, config).await?;

    if cli.json {
        println!("{}", report::to_json(&reviews)?);
    } else {
        for review in &reviews {
            println!("{}", report::format_review(review));
        }
    }

    Ok(())
}

/// Review games on independent engine sessions, at most `config.jobs` at a time.
/// Results come back in input order.
async fn review_all(
    games: Vec<PreparedGame>,
    config: ReviewConfig,
) -> anyhow::Result<Vec<GameReview>> {
    let total = games.len();
    let config = Arc::new(config);
    let semaphore = Arc::new(Semaphore::new(config.jobs));
    let mut tasks = JoinSet::new();

    info!(games = total, jobs = config.jobs, "Reviewing games");

    for (index, game) in games.into_iter().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let config = config.clone();
        tasks.spawn(async move {
            let _permit = permit; // Hold until done
            (index, review_game(&game, &config).await)
        });
    }

    let mut reviews: Vec<Option<GameReview>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.context("review task panicked")?;
        match result {
            Ok(review) => reviews[index] = Some(review),
            Err(e) => {
                error!(game = index + 1, error = %e, "Review failed");
                return Err(e).with_context(|| format!("game {} could not be reviewed", index + 1));
            }
        }
    }

    Ok(reviews.into_iter().flatten().collect())
}
