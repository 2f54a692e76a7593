use std::str::FromStr;

use chess::{Board, ChessMove};
use serde::{Deserialize, Serialize};

use crate::error::PgnError;
use crate::san;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub event: Option<String>,
    pub site: Option<String>,
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub link: Option<String>,
    /// Starting position when the game carries a `[FEN]` tag
    pub fen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation
    pub pgn: String,
}

/// One resolved ply of a game: the SAN token from the record, the move
/// itself and the position it was played from.
#[derive(Debug, Clone)]
pub struct Ply {
    pub san: String,
    pub chess_move: ChessMove,
    pub board_before: Board,
}

impl GameData {
    /// Position the movetext starts from.
    pub fn start_board(&self) -> Result<Board, PgnError> {
        match self.metadata.fen.as_deref() {
            Some(fen) => Board::from_str(fen).map_err(|_| PgnError::InvalidFen(fen.to_string())),
            None => Ok(Board::default()),
        }
    }

    /// Replay the mainline, resolving every SAN token against the board it
    /// is played on. Fails on the first token that is not a legal move.
    pub fn plies(&self) -> Result<Vec<Ply>, PgnError> {
        let mut board = self.start_board()?;
        let mut plies = Vec::with_capacity(self.moves.len());

        for (i, token) in self.moves.iter().enumerate() {
            let chess_move =
                san::resolve_san(&board, token).map_err(|reason| PgnError::IllegalMove {
                    ply: i + 1,
                    san: token.clone(),
                    reason,
                })?;
            plies.push(Ply {
                san: token.clone(),
                chess_move,
                board_before: board,
            });
            board = board.make_move_new(chess_move);
        }

        Ok(plies)
    }
}
