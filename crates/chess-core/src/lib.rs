//! Game-record plumbing shared by the review crates: PGN parsing, game
//! splitting and SAN resolution against a `chess::Board`.

pub mod error;
pub mod game_data;
pub mod pgn;
pub mod san;

pub use error::PgnError;
pub use game_data::{GameData, GameMetadata};
