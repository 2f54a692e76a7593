//! Review configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::classify::Thresholds;
use crate::error::ReviewError;

#[derive(Clone, Debug)]
pub struct ReviewConfig {
    /// Path to the UCI engine binary
    pub stockfish_path: PathBuf,

    /// Engine `Threads` option
    pub threads: u32,

    /// Engine `Hash` option in MB
    pub hash_mb: u32,

    /// Ask the engine for win/draw/loss stats (dropped if unsupported)
    pub show_wdl: bool,

    /// Depth for candidate-line searches and the first retry rung
    pub analysis_depth: u32,

    /// Depth for the per-move position evaluation
    pub shallow_depth: u32,

    /// Depth for re-evaluating positions after mistakes and blunders
    pub deep_depth: u32,

    /// Number of candidate lines requested per position
    pub multipv: u32,

    /// Upper bound on how long one query may keep the engine silent
    pub query_timeout: Duration,

    /// Games analyzed in parallel, one engine each
    pub jobs: usize,

    pub thresholds: Thresholds,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            stockfish_path: PathBuf::from("/usr/local/bin/stockfish"),
            threads: 8,
            hash_mb: 256,
            show_wdl: true,
            analysis_depth: 16,
            shallow_depth: 10,
            deep_depth: 25,
            multipv: 3,
            query_timeout: Duration::from_secs(30),
            jobs: num_cpus::get(),
            thresholds: Thresholds::default(),
        }
    }
}

impl ReviewConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn load() -> Result<Self, ReviewError> {
        let defaults = Self::default();

        let stockfish_path = env::var("STOCKFISH_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.stockfish_path);

        let config = Self {
            stockfish_path,
            threads: env_parse("ENGINE_THREADS")?.unwrap_or(defaults.threads),
            hash_mb: env_parse("ENGINE_HASH_MB")?.unwrap_or(defaults.hash_mb),
            show_wdl: env_parse("ENGINE_SHOW_WDL")?.unwrap_or(defaults.show_wdl),
            analysis_depth: env_parse("ANALYSIS_DEPTH")?.unwrap_or(defaults.analysis_depth),
            shallow_depth: env_parse("SHALLOW_DEPTH")?.unwrap_or(defaults.shallow_depth),
            deep_depth: env_parse("DEEP_DEPTH")?.unwrap_or(defaults.deep_depth),
            multipv: env_parse("MULTIPV")?.unwrap_or(defaults.multipv),
            query_timeout: env_parse("QUERY_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.query_timeout),
            jobs: env_parse("ANALYSIS_JOBS")?.unwrap_or(defaults.jobs),
            thresholds: defaults.thresholds,
        };

        config.validate()?;
        info!(stockfish_path = %config.stockfish_path.display(), "Review config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.multipv == 0 {
            return Err(ReviewError::Config("MULTIPV must be at least 1".into()));
        }
        if self.jobs == 0 {
            return Err(ReviewError::Config("ANALYSIS_JOBS must be at least 1".into()));
        }
        if self.analysis_depth == 0 || self.shallow_depth == 0 || self.deep_depth == 0 {
            return Err(ReviewError::Config("search depths must be at least 1".into()));
        }
        Ok(())
    }
}

/// Parse an optional environment variable; a set but malformed value is an error.
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ReviewError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ReviewError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}
