pub use chess;

pub mod analyzer;
pub mod board_utils;
pub mod classify;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod motifs;
pub mod report;
pub mod sample;
pub mod score;
pub mod see;
pub mod stockfish;
