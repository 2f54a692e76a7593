//! Position evaluation with a degrading retry policy.
//!
//! Engine queries can fail (timeouts, a crashed search, no score). Callers of
//! [`Evaluator`] never see those failures: single evaluations walk a ladder
//! of cheaper search budgets and fall back to a balanced 0, candidate-line
//! queries fall back to a single line and then to no lines at all.

use std::time::Duration;

use chess::{Board, BoardStatus, Color};
use tracing::{debug, warn};

use crate::classify::CandidateLine;
use crate::error::EngineError;
use crate::score::{normalize, RawScore, ScoreValue};
use crate::stockfish::{EngineEval, PvLine, SearchBudget};

/// Floor for the reduced-depth retry rung
const MIN_RETRY_DEPTH: u32 = 8;
const RETRY_MOVETIME: Duration = Duration::from_millis(500);
const RETRY_NODES: u64 = 400_000;

/// Anything that can score a position: the UCI engine, or a scripted stand-in.
#[allow(async_fn_in_trait)]
pub trait PositionEvaluator {
    async fn evaluate(
        &mut self,
        board: &Board,
        budget: SearchBudget,
    ) -> Result<EngineEval, EngineError>;

    async fn top_lines(
        &mut self,
        board: &Board,
        count: u32,
        budget: SearchBudget,
    ) -> Result<Vec<PvLine>, EngineError>;

    /// Release the underlying session. Best effort.
    async fn shutdown(&mut self) {}
}

/// The budgets tried in order for one evaluation
pub fn retry_budgets(depth: u32) -> [SearchBudget; 4] {
    [
        SearchBudget::Depth(depth),
        SearchBudget::MoveTime(RETRY_MOVETIME),
        SearchBudget::Depth(depth.saturating_sub(4).max(MIN_RETRY_DEPTH)),
        SearchBudget::Nodes(RETRY_NODES),
    ]
}

pub struct Evaluator<E> {
    engine: E,
    perspective: Color,
}

impl<E: PositionEvaluator> Evaluator<E> {
    /// Evaluations come out White-perspective.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            perspective: Color::White,
        }
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_inner(self) -> E {
        self.engine
    }

    /// First successful evaluation along the retry ladder, if any.
    pub async fn evaluate_with_retries(&mut self, board: &Board, depth: u32) -> Option<EngineEval> {
        for budget in retry_budgets(depth) {
            match self.engine.evaluate(board, budget).await {
                Ok(eval) => return Some(eval),
                Err(e) => debug!(?budget, error = %e, "Evaluation attempt failed"),
            }
        }
        warn!(fen = %board, "All evaluation attempts failed");
        None
    }

    /// Fixed-perspective evaluation of `board`; 0 when every attempt fails.
    pub async fn evaluate_safe(&mut self, board: &Board, depth: u32) -> i32 {
        match board.status() {
            BoardStatus::Checkmate => {
                let mated = RawScore::new(board.side_to_move(), ScoreValue::Mate(0));
                return normalize(Some(mated), self.perspective);
            }
            BoardStatus::Stalemate => return 0,
            BoardStatus::Ongoing => {}
        }

        let score = self
            .evaluate_with_retries(board, depth)
            .await
            .map(|eval| eval.score);
        normalize(score, self.perspective)
    }

    /// Up to `count` ranked candidate lines for `board`.
    pub async fn best_lines(
        &mut self,
        board: &Board,
        count: u32,
        depth: u32,
    ) -> Vec<CandidateLine> {
        if board.status() != BoardStatus::Ongoing {
            return Vec::new();
        }

        match self.engine.top_lines(board, count, SearchBudget::Depth(depth)).await {
            Ok(lines) => {
                return lines
                    .into_iter()
                    .filter_map(|line| self.candidate(line))
                    .collect();
            }
            Err(e) => {
                warn!(error = %e, "Multi-line analysis failed, falling back to a single line");
            }
        }

        let Some(eval) = self.evaluate_with_retries(board, depth).await else {
            return Vec::new();
        };
        match eval.best_move {
            Some(first_move) => vec![CandidateLine {
                rank: 1,
                eval: normalize(Some(eval.score), self.perspective),
                first_move,
            }],
            None => Vec::new(),
        }
    }

    fn candidate(&self, line: PvLine) -> Option<CandidateLine> {
        let first_move = line.pv.into_iter().next()?;
        Some(CandidateLine {
            rank: line.rank,
            eval: normalize(Some(line.score), self.perspective),
            first_move,
        })
    }

    pub async fn shutdown(&mut self) {
        self.engine.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned answers; an empty queue answers with a timeout.
    #[derive(Default)]
    struct Canned {
        evals: VecDeque<Result<EngineEval, EngineError>>,
        lines: VecDeque<Result<Vec<PvLine>, EngineError>>,
        budgets: Vec<SearchBudget>,
    }

    impl PositionEvaluator for Canned {
        async fn evaluate(
            &mut self,
            _board: &Board,
            budget: SearchBudget,
        ) -> Result<EngineEval, EngineError> {
            self.budgets.push(budget);
            self.evals
                .pop_front()
                .unwrap_or(Err(EngineError::Timeout(Duration::from_secs(1))))
        }

        async fn top_lines(
            &mut self,
            _board: &Board,
            _count: u32,
            _budget: SearchBudget,
        ) -> Result<Vec<PvLine>, EngineError> {
            self.lines.pop_front().unwrap_or(Err(EngineError::NoScore))
        }
    }

    fn white_cp(cp: i32, best: &str) -> EngineEval {
        EngineEval {
            score: RawScore::new(Color::White, ScoreValue::Centipawns(cp)),
            best_move: Some(best.to_string()),
        }
    }

    #[test]
    fn test_retry_budgets() {
        assert_eq!(
            retry_budgets(16),
            [
                SearchBudget::Depth(16),
                SearchBudget::MoveTime(Duration::from_millis(500)),
                SearchBudget::Depth(12),
                SearchBudget::Nodes(400_000),
            ]
        );
        assert_eq!(retry_budgets(10)[2], SearchBudget::Depth(8));
        assert_eq!(retry_budgets(2)[2], SearchBudget::Depth(8));
    }

    #[tokio::test]
    async fn test_evaluate_safe_walks_the_ladder() {
        let mut engine = Canned::default();
        engine.evals.push_back(Err(EngineError::NoScore));
        engine.evals.push_back(Err(EngineError::Timeout(Duration::from_secs(1))));
        engine.evals.push_back(Ok(white_cp(42, "e2e4")));

        let mut evaluator = Evaluator::new(engine);
        assert_eq!(evaluator.evaluate_safe(&Board::default(), 16).await, 42);
        assert_eq!(
            evaluator.into_inner().budgets,
            vec![
                SearchBudget::Depth(16),
                SearchBudget::MoveTime(Duration::from_millis(500)),
                SearchBudget::Depth(12),
            ]
        );
    }

    #[tokio::test]
    async fn test_evaluate_safe_falls_back_to_zero() {
        let mut evaluator = Evaluator::new(Canned::default());
        assert_eq!(evaluator.evaluate_safe(&Board::default(), 16).await, 0);
        assert_eq!(evaluator.into_inner().budgets.len(), 4);
    }

    #[tokio::test]
    async fn test_black_to_move_score_is_reoriented() {
        let board = Board::default().make_move_new(chess::ChessMove::new(
            chess::Square::E2,
            chess::Square::E4,
            None,
        ));
        let mut engine = Canned::default();
        engine.evals.push_back(Ok(EngineEval {
            score: RawScore::new(Color::Black, ScoreValue::Centipawns(-30)),
            best_move: Some("e7e5".to_string()),
        }));
        let mut evaluator = Evaluator::new(engine);
        assert_eq!(evaluator.evaluate_safe(&board, 10).await, 30);
    }

    #[tokio::test]
    async fn test_best_lines_from_multipv() {
        let mut engine = Canned::default();
        engine.lines.push_back(Ok(vec![
            PvLine {
                rank: 1,
                score: RawScore::new(Color::White, ScoreValue::Centipawns(35)),
                pv: vec!["e2e4".into(), "e7e5".into()],
            },
            PvLine {
                rank: 2,
                score: RawScore::new(Color::White, ScoreValue::Mate(-4)),
                pv: vec!["f2f3".into()],
            },
        ]));

        let mut evaluator = Evaluator::new(engine);
        let lines = evaluator.best_lines(&Board::default(), 3, 16).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].first_move, "e2e4");
        assert_eq!(lines[0].eval, 35);
        assert_eq!(lines[1].eval, -9_996);
    }

    #[tokio::test]
    async fn test_best_lines_degrades_to_single_line() {
        let mut engine = Canned::default();
        engine.evals.push_back(Ok(white_cp(20, "d2d4")));

        let mut evaluator = Evaluator::new(engine);
        let lines = evaluator.best_lines(&Board::default(), 3, 16).await;
        assert_eq!(
            lines,
            vec![CandidateLine {
                rank: 1,
                eval: 20,
                first_move: "d2d4".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_best_lines_empty_when_everything_fails() {
        let mut evaluator = Evaluator::new(Canned::default());
        assert!(evaluator.best_lines(&Board::default(), 3, 16).await.is_empty());
    }

    #[tokio::test]
    async fn test_checkmate_needs_no_engine() {
        use std::str::FromStr;
        // Fool's mate, White to move and mated
        let fen = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
        let board = Board::from_str(fen).unwrap();
        let mut evaluator = Evaluator::new(Canned::default());
        assert_eq!(evaluator.evaluate_safe(&board, 16).await, -10_000);
        assert!(evaluator.best_lines(&board, 3, 16).await.is_empty());
        assert!(evaluator.into_inner().budgets.is_empty());
    }
}
