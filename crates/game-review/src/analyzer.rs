//! Game analysis driver
//!
//! Walks a game ply by ply: candidate lines for the position, play the move,
//! evaluate the result, classify, tag motifs. The evaluation after one ply is
//! the evaluation before the next, so every position is scored once.

use chess::{Board, Color};
use chess_core::game_data::Ply;
use chess_core::pgn::{parse_pgn, split_games};
use chess_core::san::move_to_uci;
use chess_core::{GameData, GameMetadata};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board_utils::is_capture;
use crate::classify::{best_line, calculate_accuracy, classify, Classifications, MoveQuality};
use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::evaluator::{Evaluator, PositionEvaluator};
use crate::motifs::{self, Motif};
use crate::stockfish::StockfishEngine;

/// Moves losing at least this much get a deeper second look
pub const DEEP_EVAL_MIN_LOSS: i32 = 100;

/// One analysed ply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveResult {
    /// 1-based ply index within the game
    pub ply: usize,
    pub move_number: u32,
    pub white_move: bool,
    pub san: String,
    pub uci: String,
    pub quality: MoveQuality,
    pub cp_loss: i32,
    pub eval_before: i32,
    pub eval_after: i32,
    /// Engine's top choice for the position the move was played from,
    /// when it is not the move that was played
    pub best_move: Option<String>,
    pub motifs: Vec<Motif>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_eval: Option<i32>,
}

impl MoveResult {
    pub fn mover(&self) -> Color {
        if self.white_move {
            Color::White
        } else {
            Color::Black
        }
    }
}

/// Totals for one side of the board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub moves: u32,
    pub total_cp_loss: i32,
    pub acpl: f64,
    pub accuracy: f64,
    pub classifications: Classifications,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub white: SideSummary,
    pub black: SideSummary,
}

impl GameSummary {
    pub fn from_moves(moves: &[MoveResult]) -> Self {
        let mut summary = Self::default();
        for m in moves {
            let side = match m.mover() {
                Color::White => &mut summary.white,
                Color::Black => &mut summary.black,
            };
            side.moves += 1;
            side.total_cp_loss += m.cp_loss;
            side.classifications.record(m.quality);
        }
        for side in [&mut summary.white, &mut summary.black] {
            if side.moves > 0 {
                side.acpl = side.total_cp_loss as f64 / side.moves as f64;
            }
            side.accuracy = calculate_accuracy(side.total_cp_loss, side.moves);
        }
        summary
    }

    pub fn side(&self, color: Color) -> &SideSummary {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReview {
    pub metadata: GameMetadata,
    pub moves: Vec<MoveResult>,
    pub summary: GameSummary,
}

/// A parsed game whose moves have all been resolved against the board.
/// Building one never touches the engine.
#[derive(Debug, Clone)]
pub struct PreparedGame {
    pub data: GameData,
    pub start: Board,
    /// Full-move number of the first ply
    pub first_move_number: u32,
    pub plies: Vec<Ply>,
}

impl PreparedGame {
    pub fn new(data: GameData) -> Result<Self, ReviewError> {
        let start = data.start_board()?;
        let plies = data.plies()?;
        let first_move_number = data
            .metadata
            .fen
            .as_deref()
            .and_then(fullmove_number)
            .unwrap_or(1);
        Ok(Self {
            data,
            start,
            first_move_number,
            plies,
        })
    }

    /// Prepare the first game in `pgn`.
    pub fn parse(pgn: &str) -> Result<Self, ReviewError> {
        Self::new(parse_pgn(pgn)?)
    }

    /// Prepare every game in `pgn`. Any game that fails to parse fails the lot.
    pub fn parse_all(pgn: &str) -> Result<Vec<Self>, ReviewError> {
        let games = split_games(pgn);
        if games.is_empty() {
            return Err(chess_core::PgnError::NoGame.into());
        }
        games.iter().map(|g| Self::parse(g)).collect()
    }

    fn move_number(&self, index: usize) -> u32 {
        let offset = match self.start.side_to_move() {
            Color::White => 0,
            Color::Black => 1,
        };
        self.first_move_number + ((index + offset) / 2) as u32
    }
}

/// Sixth FEN field
fn fullmove_number(fen: &str) -> Option<u32> {
    fen.split_whitespace().nth(5)?.parse().ok().filter(|n| *n > 0)
}

/// Analyse every ply of `game` with `evaluator`.
pub async fn analyze_game<E: PositionEvaluator>(
    evaluator: &mut Evaluator<E>,
    game: &PreparedGame,
    config: &ReviewConfig,
) -> GameReview {
    let metadata = &game.data.metadata;
    info!(
        white = %metadata.white,
        black = %metadata.black,
        plies = game.plies.len(),
        "Starting analysis"
    );

    let mut results = Vec::with_capacity(game.plies.len());
    let mut prev_eval = evaluator.evaluate_safe(&game.start, config.shallow_depth).await;

    for (i, ply) in game.plies.iter().enumerate() {
        let before = &ply.board_before;
        let mover = before.side_to_move();

        let lines = evaluator
            .best_lines(before, config.multipv, config.analysis_depth)
            .await;

        let after = before.make_move_new(ply.chess_move);
        let eval_after = evaluator.evaluate_safe(&after, config.shallow_depth).await;

        let classification = classify(
            prev_eval,
            eval_after,
            mover,
            ply.chess_move,
            before,
            &lines,
            &config.thresholds,
        );
        let was_capture = is_capture(before, ply.chess_move);
        let tags = motifs::detect(before, &after, ply.chess_move, was_capture);

        let deep_eval = if classification.cp_loss >= DEEP_EVAL_MIN_LOSS {
            Some(evaluator.evaluate_safe(&after, config.deep_depth).await)
        } else {
            None
        };

        debug!(
            ply = i + 1,
            san = %ply.san,
            quality = %classification.quality,
            cp_loss = classification.cp_loss,
            "Move classified"
        );

        let uci = move_to_uci(ply.chess_move);
        results.push(MoveResult {
            ply: i + 1,
            move_number: game.move_number(i),
            white_move: mover == Color::White,
            san: ply.san.clone(),
            uci: uci.clone(),
            quality: classification.quality,
            cp_loss: classification.cp_loss,
            eval_before: prev_eval,
            eval_after,
            best_move: best_line(&lines)
                .map(|l| l.first_move.clone())
                .filter(|best| *best != uci),
            motifs: tags,
            deep_eval,
        });

        prev_eval = eval_after;
    }

    let summary = GameSummary::from_moves(&results);
    info!(
        white_accuracy = summary.white.accuracy,
        black_accuracy = summary.black.accuracy,
        "Analysis complete"
    );

    GameReview {
        metadata: metadata.clone(),
        moves: results,
        summary,
    }
}

/// Analyse `game` on a fresh engine session, shut down afterwards whatever
/// the outcome.
pub async fn review_game(
    game: &PreparedGame,
    config: &ReviewConfig,
) -> Result<GameReview, ReviewError> {
    if game.plies.is_empty() {
        return Ok(GameReview {
            metadata: game.data.metadata.clone(),
            moves: Vec::new(),
            summary: GameSummary::default(),
        });
    }

    let engine = StockfishEngine::new(config).await?;
    let mut evaluator = Evaluator::new(engine);
    let review = analyze_game(&mut evaluator, game, config).await;
    evaluator.shutdown().await;
    Ok(review)
}

/// Parse the first game in `pgn` and review it.
/// Input problems surface before any engine is started.
pub async fn review_pgn_text(pgn: &str, config: &ReviewConfig) -> Result<GameReview, ReviewError> {
    let game = PreparedGame::parse(pgn)?;
    review_game(&game, config).await
}
