//! Text and JSON rendering of game reviews

use std::fmt::Write;

use crate::analyzer::{GameReview, GameSummary, MoveResult};
use crate::classify::MoveQuality;
use crate::error::ReviewError;
use crate::score::fmt_eval;

const RULE_WIDTH: usize = 60;

/// Losses at or below this are too small to print
const MIN_REPORTED_LOSS: i32 = 10;

/// One report line, e.g.
/// ` 9.B   Qxg2 | Blunder | -412cp | (+0.31 → -3.81) | [CAPTURE] | Better: f6g6`
pub fn format_move_line(m: &MoveResult) -> String {
    let side = if m.white_move { "W" } else { "B" };

    let mut parts = vec![m.quality.to_string()];
    if m.cp_loss > MIN_REPORTED_LOSS {
        parts.push(format!("-{}cp", m.cp_loss));
    }
    parts.push(format!("({} → {})", fmt_eval(m.eval_before), fmt_eval(m.eval_after)));
    if !m.motifs.is_empty() {
        let tags: Vec<String> = m.motifs.iter().map(ToString::to_string).collect();
        parts.push(format!("[{}]", tags.join(", ")));
    }
    if !m.quality.is_good() {
        if let Some(best) = m.best_move.as_deref().filter(|b| *b != m.uci) {
            parts.push(format!("Better: {best}"));
        }
    }

    format!("{:2}.{} {:>6} | {}", m.move_number, side, m.san, parts.join(" | "))
}

pub fn format_summary(summary: &GameSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12}{:>8}{:>8}", "", "White", "Black");
    let _ = writeln!(out, "{:<12}{:>8}{:>8}", "Moves", summary.white.moves, summary.black.moves);
    for quality in MoveQuality::ALL {
        let _ = writeln!(
            out,
            "{:<12}{:>8}{:>8}",
            quality.as_str(),
            summary.white.classifications.count(quality),
            summary.black.classifications.count(quality)
        );
    }
    let _ = writeln!(out, "{:<12}{:>8.1}{:>8.1}", "ACPL", summary.white.acpl, summary.black.acpl);
    let _ = write!(
        out,
        "{:<12}{:>7.1}%{:>7.1}%",
        "Accuracy", summary.white.accuracy, summary.black.accuracy
    );
    out
}

pub fn format_review(review: &GameReview) -> String {
    let meta = &review.metadata;
    let rule = "=".repeat(RULE_WIDTH);

    let mut out = String::new();
    let _ = writeln!(out, "{} vs {} ({})", meta.white, meta.black, meta.result);
    if let Some(event) = &meta.event {
        let _ = writeln!(out, "{event}");
    }
    let _ = writeln!(out, "\nANALYSIS RESULTS");
    let _ = writeln!(out, "{rule}");
    for m in &review.moves {
        let _ = writeln!(out, "{}", format_move_line(m));
    }

    if !review.moves.is_empty() {
        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(out, "GAME SUMMARY");
        let _ = writeln!(out, "{}", format_summary(&review.summary));
    } else {
        let _ = writeln!(out, "(no moves)");
    }
    out
}

/// Pretty JSON: a single object for one game, an array for several
pub fn to_json(reviews: &[GameReview]) -> Result<String, ReviewError> {
    let json = match reviews {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    Ok(json)
}
