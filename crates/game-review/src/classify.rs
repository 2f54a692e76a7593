//! Move quality classification: pure functions only
//! (No engine or I/O dependencies)
//!
//! A move is first checked against the coarse centipawn-loss thresholds.
//! Moves that survive are ranked against the engine's candidate lines for the
//! position they were played from, with extra credit for finding a unique
//! best move and for sacrifices that work.

use std::fmt;

use chess::{Board, ChessMove, Color};
use chess_core::san::move_to_uci;
use serde::{Deserialize, Serialize};

use crate::board_utils::{captured_piece, is_attacked_by, piece_value};
use crate::score::{for_side, is_mate_score};
use crate::see::static_exchange;

/// Rank-1 move must beat rank 2 by this much to be the only move
const ONLY_MOVE_GAP: i32 = 150;
const BEST_GAP: i32 = 10;
const EXCELLENT_GAP: i32 = 50;
const GOOD_GAP: i32 = 100;
const MISS_GAP: i32 = 300;

const SACRIFICE_SWING: i32 = -300;
const SACRIFICE_SEE: i32 = -200;
/// A sacrifice still counts if the eval drops by at most this much
const SACRIFICE_MAX_DROP: i32 = 50;
const UNDERPROMOTION_PENALTY: i32 = 200;

/// Brilliancies only happen in positions that are not already decided
const BRILLIANT_MAX_ABS_EVAL: i32 = 500;
const BRILLIANT_MIN_GAIN: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveQuality {
    Brilliant,
    Great,
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    Miss,
}

impl MoveQuality {
    pub const ALL: [MoveQuality; 9] = [
        MoveQuality::Brilliant,
        MoveQuality::Great,
        MoveQuality::Best,
        MoveQuality::Excellent,
        MoveQuality::Good,
        MoveQuality::Inaccuracy,
        MoveQuality::Mistake,
        MoveQuality::Blunder,
        MoveQuality::Miss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brilliant => "Brilliant",
            Self::Great => "Great",
            Self::Best => "Best",
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Inaccuracy => "Inaccuracy",
            Self::Mistake => "Mistake",
            Self::Blunder => "Blunder",
            Self::Miss => "Miss",
        }
    }

    /// Good-or-better labels; the report only suggests alternatives for the rest
    pub fn is_good(&self) -> bool {
        matches!(
            self,
            Self::Brilliant | Self::Great | Self::Best | Self::Excellent | Self::Good
        )
    }
}

impl fmt::Display for MoveQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse centipawn-loss thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub inaccuracy: i32,
    pub mistake: i32,
    pub blunder: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            inaccuracy: 50,
            mistake: 100,
            blunder: 300,
        }
    }
}

/// One ranked engine suggestion for a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLine {
    /// 1 = best
    pub rank: u32,
    /// White-perspective evaluation of the line
    pub eval: i32,
    /// First move of the principal variation, UCI
    pub first_move: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub quality: MoveQuality,
    pub cp_loss: i32,
}

/// Centipawn loss for the side that moved. Never negative.
pub fn cp_loss(eval_before: i32, eval_after: i32, mover: Color) -> i32 {
    for_side(eval_before - eval_after, mover).max(0)
}

/// Label from loss alone, for clearly bad moves
pub fn coarse_label(cp_loss: i32, thresholds: &Thresholds) -> Option<MoveQuality> {
    if cp_loss >= thresholds.blunder {
        Some(MoveQuality::Blunder)
    } else if cp_loss >= thresholds.mistake {
        Some(MoveQuality::Mistake)
    } else if cp_loss >= thresholds.inaccuracy {
        Some(MoveQuality::Inaccuracy)
    } else {
        None
    }
}

/// The top candidate line (lowest rank)
pub fn best_line(lines: &[CandidateLine]) -> Option<&CandidateLine> {
    lines.iter().min_by_key(|l| l.rank)
}

/// True when the played move is rank 1 and the runner-up is far behind.
pub fn is_only_move(lines: &[CandidateLine], played_rank: u32, mover: Color) -> bool {
    if lines.len() < 2 || played_rank != 1 {
        return false;
    }
    let (Some(first), Some(second)) = (
        lines.iter().find(|l| l.rank == 1),
        lines.iter().find(|l| l.rank == 2),
    ) else {
        return false;
    };
    for_side(first.eval, mover) - for_side(second.eval, mover) >= ONLY_MOVE_GAP
}

/// Material given up by the move itself: what it captured minus the piece it
/// put on the square, with under-promotion counted as a loss. Only counts
/// when the landing square can actually be taken.
pub fn material_swing(board_before: &Board, played: ChessMove) -> i32 {
    let Some(moved) = board_before.piece_on(played.get_source()) else {
        return 0;
    };
    let mover = board_before.side_to_move();
    let board_after = board_before.make_move_new(played);
    if !is_attacked_by(&board_after, !mover, played.get_dest()) {
        return 0;
    }

    let captured = captured_piece(board_before, played).map(piece_value).unwrap_or(0);
    let mut swing = captured - piece_value(moved);
    if played
        .get_promotion()
        .is_some_and(|p| p != chess::Piece::Queen)
    {
        swing -= UNDERPROMOTION_PENALTY;
    }
    swing
}

/// Material is offered (by swing or exchange estimate) and the evaluation
/// holds up afterwards.
pub fn is_sacrifice(
    board_before: &Board,
    played: ChessMove,
    eval_before: i32,
    eval_after: i32,
) -> bool {
    let mover = board_before.side_to_move();
    let gives_material = material_swing(board_before, played) <= SACRIFICE_SWING
        || static_exchange(board_before, played) <= SACRIFICE_SEE;
    let holds = for_side(eval_after - eval_before, mover) >= -SACRIFICE_MAX_DROP;
    gives_material && holds
}

/// Classify a played move.
///
/// `eval_before`/`eval_after` and the candidate line evaluations are all
/// White-perspective; `lines` are the engine's candidates for `board_before`.
pub fn classify(
    eval_before: i32,
    eval_after: i32,
    mover: Color,
    played: ChessMove,
    board_before: &Board,
    lines: &[CandidateLine],
    thresholds: &Thresholds,
) -> Classification {
    let loss = cp_loss(eval_before, eval_after, mover);
    let done = |quality| Classification {
        quality,
        cp_loss: loss,
    };

    if let Some(bad) = coarse_label(loss, thresholds) {
        return done(bad);
    }

    let played_uci = move_to_uci(played);
    let (Some(best), Some(played_line)) = (
        best_line(lines),
        lines.iter().find(|l| l.first_move == played_uci),
    ) else {
        return done(MoveQuality::Good);
    };

    let rank = played_line.rank;
    let best_for_mover = for_side(best.eval, mover);
    let gap = (best_for_mover - for_side(played_line.eval, mover)).max(0);

    let only_move = is_only_move(lines, rank, mover);
    let gain = for_side(eval_after - eval_before, mover);

    if only_move
        && eval_before.abs() < BRILLIANT_MAX_ABS_EVAL
        && gain >= BRILLIANT_MIN_GAIN
        && is_sacrifice(board_before, played, eval_before, eval_after)
    {
        return done(MoveQuality::Brilliant);
    }
    if only_move && rank == 1 {
        return done(MoveQuality::Great);
    }
    if rank == 1 && gap <= BEST_GAP {
        return done(MoveQuality::Best);
    }
    if rank <= 2 && gap <= EXCELLENT_GAP {
        return done(MoveQuality::Excellent);
    }
    if rank <= 3 && gap <= GOOD_GAP {
        return done(MoveQuality::Good);
    }

    let missed_mate = is_mate_score(best.eval) && best_for_mover > 0;
    if (gap >= MISS_GAP || missed_mate) && loss < thresholds.mistake {
        return done(MoveQuality::Miss);
    }

    done(MoveQuality::Good)
}

/// Per-side label counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifications {
    pub brilliant: u32,
    pub great: u32,
    pub best: u32,
    pub excellent: u32,
    pub good: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
    pub miss: u32,
}

impl Classifications {
    pub fn record(&mut self, quality: MoveQuality) {
        *self.slot(quality) += 1;
    }

    pub fn count(&self, quality: MoveQuality) -> u32 {
        match quality {
            MoveQuality::Brilliant => self.brilliant,
            MoveQuality::Great => self.great,
            MoveQuality::Best => self.best,
            MoveQuality::Excellent => self.excellent,
            MoveQuality::Good => self.good,
            MoveQuality::Inaccuracy => self.inaccuracy,
            MoveQuality::Mistake => self.mistake,
            MoveQuality::Blunder => self.blunder,
            MoveQuality::Miss => self.miss,
        }
    }

    fn slot(&mut self, quality: MoveQuality) -> &mut u32 {
        match quality {
            MoveQuality::Brilliant => &mut self.brilliant,
            MoveQuality::Great => &mut self.great,
            MoveQuality::Best => &mut self.best,
            MoveQuality::Excellent => &mut self.excellent,
            MoveQuality::Good => &mut self.good,
            MoveQuality::Inaccuracy => &mut self.inaccuracy,
            MoveQuality::Mistake => &mut self.mistake,
            MoveQuality::Blunder => &mut self.blunder,
            MoveQuality::Miss => &mut self.miss,
        }
    }
}

/// Accuracy from average centipawn loss, 0–100
pub fn calculate_accuracy(total_cp_loss: i32, move_count: u32) -> f64 {
    if move_count == 0 {
        return 100.0;
    }
    let acpl = total_cp_loss as f64 / move_count as f64;
    let accuracy = 100.0 * (1.0 / (1.0 + acpl / 100.0)).sqrt();
    accuracy.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use chess::Square;

    fn mv(from: &str, to: &str) -> ChessMove {
        ChessMove::new(
            Square::from_str(from).unwrap(),
            Square::from_str(to).unwrap(),
            None,
        )
    }

    fn line(rank: u32, eval: i32, first_move: &str) -> CandidateLine {
        CandidateLine {
            rank,
            eval,
            first_move: first_move.to_string(),
        }
    }

    fn classify_start(
        before: i32,
        after: i32,
        played: ChessMove,
        lines: &[CandidateLine],
    ) -> Classification {
        classify(
            before,
            after,
            Color::White,
            played,
            &Board::default(),
            lines,
            &Thresholds::default(),
        )
    }

    #[test]
    fn test_cp_loss_never_negative() {
        assert_eq!(cp_loss(100, 80, Color::White), 20);
        assert_eq!(cp_loss(100, 120, Color::White), 0);
        assert_eq!(cp_loss(100, 120, Color::Black), 20);
        assert_eq!(cp_loss(100, 80, Color::Black), 0);
        assert_eq!(cp_loss(-9_990, 9_990, Color::White), 0);
    }

    #[test]
    fn test_coarse_thresholds() {
        let t = Thresholds::default();
        assert_eq!(coarse_label(49, &t), None);
        assert_eq!(coarse_label(50, &t), Some(MoveQuality::Inaccuracy));
        assert_eq!(coarse_label(99, &t), Some(MoveQuality::Inaccuracy));
        assert_eq!(coarse_label(100, &t), Some(MoveQuality::Mistake));
        assert_eq!(coarse_label(299, &t), Some(MoveQuality::Mistake));
        assert_eq!(coarse_label(300, &t), Some(MoveQuality::Blunder));
    }

    #[test]
    fn test_bad_moves_ignore_candidate_lines() {
        let played = mv("e2", "e4");
        let as_best = [line(1, 120, "e2e4"), line(2, -40, "d2d4")];
        for lines in [&as_best[..], &[][..]] {
            assert_eq!(classify_start(50, -260, played, lines).quality, MoveQuality::Blunder);
            assert_eq!(classify_start(50, -260, played, lines).cp_loss, 310);
            assert_eq!(classify_start(50, -100, played, lines).quality, MoveQuality::Mistake);
            assert_eq!(classify_start(50, -20, played, lines).quality, MoveQuality::Inaccuracy);
        }
    }

    #[test]
    fn test_unlisted_move_is_good() {
        let result = classify_start(20, 15, mv("a2", "a3"), &[line(1, 30, "e2e4")]);
        assert_eq!(result.quality, MoveQuality::Good);
        assert_eq!(result.cp_loss, 5);
    }

    #[test]
    fn test_top_move_with_close_runner_up_is_best() {
        let lines = [line(1, 40, "e2e4"), line(2, 30, "d2d4"), line(3, 20, "g1f3")];
        let result = classify_start(40, 35, mv("e2", "e4"), &lines);
        assert_eq!(result.quality, MoveQuality::Best);
    }

    #[test]
    fn test_candidate_scenario_for_black_is_best() {
        // Evaluations are White-perspective, so +120 is the worse line for Black
        // and the rank-1 move has no lead over rank 2 from Black's side.
        let board =
            Board::from_str("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        let lines = [line(1, 120, "e7e5"), line(2, -40, "d7d5")];
        let result = classify(
            30,
            25,
            Color::Black,
            mv("e7", "e5"),
            &board,
            &lines,
            &Thresholds::default(),
        );
        assert_eq!(result.quality, MoveQuality::Best);
    }

    #[test]
    fn test_candidate_scenario_for_white_is_only_move() {
        let lines = [line(1, 120, "e2e4"), line(2, -40, "d2d4")];
        let result = classify_start(20, 15, mv("e2", "e4"), &lines);
        assert_eq!(result.quality, MoveQuality::Great);
    }

    #[test]
    fn test_rank_two_is_never_best() {
        let lines = [line(1, 40, "e2e4"), line(2, 40, "d2d4")];
        let result = classify_start(40, 40, mv("d2", "d4"), &lines);
        assert_eq!(result.quality, MoveQuality::Excellent);
    }

    #[test]
    fn test_rank_three_within_pawn_is_good() {
        let lines = [line(1, 120, "e2e4"), line(2, 80, "d2d4"), line(3, 40, "g1f3")];
        let result = classify_start(60, 40, mv("g1", "f3"), &lines);
        assert_eq!(result.quality, MoveQuality::Good);
    }

    #[test]
    fn test_miss_when_winning_line_skipped() {
        let lines = [line(1, 400, "e2e4"), line(2, 300, "d2d4"), line(3, 50, "g1f3")];
        let result = classify_start(60, 40, mv("g1", "f3"), &lines);
        assert_eq!(result.quality, MoveQuality::Miss);
    }

    #[test]
    fn test_miss_when_mate_skipped() {
        let lines = [line(1, 9_995, "e2e4"), line(2, 9_990, "d2d4"), line(3, 9_800, "g1f3")];
        let result = classify_start(60, 40, mv("g1", "f3"), &lines);
        assert_eq!(result.quality, MoveQuality::Miss);
    }

    // Queen takes a pawn defended by the e6 pawn: SEE -800.
    const QUEEN_SAC_FEN: &str = "4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1";

    #[test]
    fn test_working_sacrifice_is_brilliant() {
        let board = Board::from_str(QUEEN_SAC_FEN).unwrap();
        let lines = [line(1, 200, "d1d5"), line(2, 0, "e1e2")];
        let result = classify(
            100,
            200,
            Color::White,
            mv("d1", "d5"),
            &board,
            &lines,
            &Thresholds::default(),
        );
        assert_eq!(result.quality, MoveQuality::Brilliant);
    }

    #[test]
    fn test_no_brilliant_in_decided_positions() {
        let board = Board::from_str(QUEEN_SAC_FEN).unwrap();
        let lines = [line(1, 700, "d1d5"), line(2, 500, "e1e2")];
        let result = classify(
            500,
            700,
            Color::White,
            mv("d1", "d5"),
            &board,
            &lines,
            &Thresholds::default(),
        );
        assert_eq!(result.quality, MoveQuality::Great);
    }

    #[test]
    fn test_sacrifice_detection() {
        let board = Board::from_str(QUEEN_SAC_FEN).unwrap();
        assert!(material_swing(&board, mv("d1", "d5")) <= -300);
        assert!(is_sacrifice(&board, mv("d1", "d5"), 100, 80));
        // Evaluation collapses: not a sacrifice that worked
        assert!(!is_sacrifice(&board, mv("d1", "d5"), 100, -100));
        // Quiet king move gives nothing away
        assert!(!is_sacrifice(&board, mv("e1", "e2"), 100, 100));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let board = Board::from_str(QUEEN_SAC_FEN).unwrap();
        let lines = [line(1, 200, "d1d5"), line(2, 0, "e1e2")];
        let thresholds = Thresholds::default();
        let run = || classify(100, 200, Color::White, mv("d1", "d5"), &board, &lines, &thresholds);
        assert_eq!(run(), run());
    }

    #[test]
    fn test_classifications_counts() {
        let mut counts = Classifications::default();
        counts.record(MoveQuality::Best);
        counts.record(MoveQuality::Best);
        counts.record(MoveQuality::Miss);
        assert_eq!(counts.count(MoveQuality::Best), 2);
        assert_eq!(counts.count(MoveQuality::Miss), 1);
        assert_eq!(counts.count(MoveQuality::Blunder), 0);
    }

    #[test]
    fn test_calculate_accuracy() {
        assert!((calculate_accuracy(0, 20) - 100.0).abs() < 0.1);
        assert!((calculate_accuracy(500, 20) - 89.4).abs() < 1.0);
        assert!((calculate_accuracy(2000, 20) - 70.7).abs() < 1.0);
        assert_eq!(calculate_accuracy(0, 0), 100.0);
    }
}
