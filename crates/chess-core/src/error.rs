//! PGN and move-resolution errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("No valid game in PGN")]
    NoGame,

    #[error("Invalid FEN in PGN header: {0}")]
    InvalidFen(String),

    #[error("Illegal or unparsable move {san} at ply {ply}: {reason}")]
    IllegalMove {
        ply: usize,
        san: String,
        reason: String,
    },
}
