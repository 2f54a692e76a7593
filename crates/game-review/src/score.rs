//! Engine score normalization.
//!
//! Every evaluation stored by the review is a plain `i32` in centipawns from
//! one fixed side's point of view (White for a whole analysis run). Forced
//! mates are folded into the same scale: mate in N for the fixed side becomes
//! `10000 - N`, being mated in N becomes `-10000 - N` (N is negative there),
//! so shorter mates always have the larger magnitude.

use chess::Color;

/// Base value mate scores are folded around
pub const MATE_SCORE: i32 = 10_000;

/// Anything at or beyond this magnitude is treated as a forced mate
pub const MATE_THRESHOLD: i32 = 9_500;

/// Raw engine value, before reorientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreValue {
    Centipawns(i32),
    /// Mate in N moves; negative means the tagged side is getting mated
    Mate(i32),
}

/// An engine score tagged with the side it is reported for.
/// UCI engines report from the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawScore {
    pub pov: Color,
    pub value: ScoreValue,
}

impl RawScore {
    pub fn new(pov: Color, value: ScoreValue) -> Self {
        Self { pov, value }
    }

    /// The same score seen from `perspective`.
    pub fn reoriented(self, perspective: Color) -> Self {
        if self.pov == perspective {
            return self;
        }
        let value = match self.value {
            ScoreValue::Centipawns(cp) => ScoreValue::Centipawns(-cp),
            ScoreValue::Mate(m) => ScoreValue::Mate(-m),
        };
        Self { pov: perspective, value }
    }
}

/// Fold a raw engine score into the fixed-perspective centipawn scale.
/// A missing score maps to 0 (balanced).
pub fn normalize(raw: Option<RawScore>, perspective: Color) -> i32 {
    let Some(raw) = raw else {
        return 0;
    };

    // mate 0: the tagged side is already checkmated, no sign to flip
    if raw.value == ScoreValue::Mate(0) {
        return if raw.pov == perspective { -MATE_SCORE } else { MATE_SCORE };
    }

    match raw.reoriented(perspective).value {
        ScoreValue::Centipawns(cp) => cp,
        ScoreValue::Mate(m) if m > 0 => MATE_SCORE - m,
        ScoreValue::Mate(m) => -MATE_SCORE - m,
    }
}

pub fn is_mate_score(eval: i32) -> bool {
    eval.abs() >= MATE_THRESHOLD
}

/// A White-perspective evaluation signed toward `side`.
pub fn for_side(eval: i32, side: Color) -> i32 {
    match side {
        Color::White => eval,
        Color::Black => -eval,
    }
}

/// Human-readable evaluation: `M`/`-M` for forced mates, pawns otherwise.
pub fn fmt_eval(eval: i32) -> String {
    if is_mate_score(eval) {
        return if eval > 0 { "M".to_string() } else { "-M".to_string() };
    }
    format!("{:+.2}", eval as f64 / 100.0)
}
