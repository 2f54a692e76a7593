//! Review error types

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single engine query or of session setup. Query failures are
/// absorbed by the evaluator's retry ladder; setup failures are fatal.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Stockfish not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine closed its output")]
    Closed,

    #[error("Engine did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Engine does not support option {0}")]
    UnsupportedOption(String),

    #[error("Engine returned no score")]
    NoScore,
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("PGN error: {0}")]
    Pgn(#[from] chess_core::PgnError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Failed to read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
