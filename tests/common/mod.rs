//! Scripted stand-in for the UCI engine.
//!
//! Positions are keyed by board; scores are written White-relative and handed
//! back relative to the side to move, the way a UCI engine reports them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use chess::{Board, ChessMove, Square};
use chess_core::san::resolve_san;
use game_review::error::EngineError;
use game_review::evaluator::PositionEvaluator;
use game_review::score::{RawScore, ScoreValue};
use game_review::stockfish::{EngineEval, PvLine, SearchBudget};

#[derive(Default)]
pub struct ScriptedEngine {
    evals: HashMap<Board, ScoreValue>,
    lines: HashMap<Board, Vec<(String, ScoreValue)>>,
    /// Every query fails when set
    pub broken: bool,
    pub eval_calls: Vec<SearchBudget>,
    pub line_calls: usize,
    pub shutdowns: usize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    pub fn eval(&mut self, board: Board, white_score: ScoreValue) -> &mut Self {
        self.evals.insert(board, white_score);
        self
    }

    pub fn lines(&mut self, board: Board, lines: &[(&str, ScoreValue)]) -> &mut Self {
        self.lines.insert(
            board,
            lines.iter().map(|(m, s)| (m.to_string(), *s)).collect(),
        );
        self
    }

    fn from_side_to_move(board: &Board, white_score: ScoreValue) -> RawScore {
        RawScore::new(chess::Color::White, white_score).reoriented(board.side_to_move())
    }
}

impl PositionEvaluator for ScriptedEngine {
    async fn evaluate(
        &mut self,
        board: &Board,
        budget: SearchBudget,
    ) -> Result<EngineEval, EngineError> {
        self.eval_calls.push(budget);
        if self.broken {
            return Err(EngineError::Timeout(Duration::from_secs(30)));
        }
        let value = *self.evals.get(board).ok_or(EngineError::NoScore)?;
        let best_move = self
            .lines
            .get(board)
            .and_then(|l| l.first())
            .map(|(m, _)| m.clone());
        Ok(EngineEval {
            score: Self::from_side_to_move(board, value),
            best_move,
        })
    }

    async fn top_lines(
        &mut self,
        board: &Board,
        count: u32,
        _budget: SearchBudget,
    ) -> Result<Vec<PvLine>, EngineError> {
        self.line_calls += 1;
        if self.broken {
            return Err(EngineError::Closed);
        }
        let lines = self.lines.get(board).ok_or(EngineError::NoScore)?;
        Ok(lines
            .iter()
            .take(count as usize)
            .enumerate()
            .map(|(i, (m, s))| PvLine {
                rank: i as u32 + 1,
                score: Self::from_side_to_move(board, *s),
                pv: vec![m.clone()],
            })
            .collect())
    }

    async fn shutdown(&mut self) {
        self.shutdowns += 1;
    }
}

pub fn cp(v: i32) -> ScoreValue {
    ScoreValue::Centipawns(v)
}

pub fn board(fen: &str) -> Board {
    Board::from_str(fen).expect("invalid FEN")
}

/// Boards reached by playing `sans` from the start, starting position first.
pub fn positions(sans: &[&str]) -> Vec<Board> {
    let mut board = Board::default();
    let mut out = vec![board];
    for san in sans {
        let m = resolve_san(&board, san).expect("illegal SAN in test game");
        board = board.make_move_new(m);
        out.push(board);
    }
    out
}

pub fn mv(from: &str, to: &str) -> ChessMove {
    ChessMove::new(
        Square::from_str(from).expect("square"),
        Square::from_str(to).expect("square"),
        None,
    )
}
