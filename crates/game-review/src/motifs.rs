//! Lightweight tactical motifs on the position after a move.
//! Single-move heuristics only; nothing here searches.

use std::fmt;

use chess::{BitBoard, Board, ChessMove, Piece, EMPTY};
use serde::{Deserialize, Serialize};

use crate::board_utils::{
    attacked_opponent_squares, attacks, is_attacked_by, is_minor_or_major, is_pinned, is_ray_piece,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motif {
    Check,
    Capture,
    /// Number of the mover's pieces left attacked and undefended
    Hanging(u32),
    Fork,
    DiscoveredAttack,
    Pin,
}

impl fmt::Display for Motif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Motif::Check => f.write_str("CHECK"),
            Motif::Capture => f.write_str("CAPTURE"),
            Motif::Hanging(n) => write!(f, "HANGING({n})"),
            Motif::Fork => f.write_str("FORK"),
            Motif::DiscoveredAttack => f.write_str("DISCOVERED_ATTACK"),
            Motif::Pin => f.write_str("PIN"),
        }
    }
}

/// Tag the move `played` from `before` to `after`.
/// Tags come out in a fixed order: check, capture, hanging, fork,
/// discovered attack, pin.
pub fn detect(before: &Board, after: &Board, played: ChessMove, was_capture: bool) -> Vec<Motif> {
    let mut motifs = Vec::new();

    if *after.checkers() != EMPTY {
        motifs.push(Motif::Check);
    }
    if was_capture {
        motifs.push(Motif::Capture);
    }

    let hanging = hanging_count(before, after);
    if hanging > 0 {
        motifs.push(Motif::Hanging(hanging));
    }
    if is_fork(before, after, played) {
        motifs.push(Motif::Fork);
    }
    if is_discovered_attack(before, after, played) {
        motifs.push(Motif::DiscoveredAttack);
    }
    if is_pinned(after, before.side_to_move(), played.get_dest()) {
        motifs.push(Motif::Pin);
    }

    motifs
}

/// Non-king pieces of the side that just moved which the opponent attacks
/// and nothing defends.
pub fn hanging_count(before: &Board, after: &Board) -> u32 {
    let mover = before.side_to_move();
    let own = *after.color_combined(mover) & !*after.pieces(Piece::King);

    own.into_iter()
        .filter(|&sq| is_attacked_by(after, !mover, sq) && !is_attacked_by(after, mover, sq))
        .count() as u32
}

/// The moved piece attacks two or more enemy knights, bishops, rooks or queens.
pub fn is_fork(before: &Board, after: &Board, played: ChessMove) -> bool {
    let targets = attacked_opponent_squares(after, played.get_dest(), before.side_to_move())
        .into_iter()
        .filter(|(piece, _)| is_minor_or_major(*piece))
        .count();
    targets >= 2
}

/// Vacating the origin square opened a line for one of the mover's own
/// sliders onto an enemy king or piece of value.
pub fn is_discovered_attack(before: &Board, after: &Board, played: ChessMove) -> bool {
    let mover = before.side_to_move();
    let origin = BitBoard::from_square(played.get_source());
    let enemy = *after.color_combined(!mover);

    let sliders = *after.color_combined(mover)
        & (*after.pieces(Piece::Bishop) | *after.pieces(Piece::Rook) | *after.pieces(Piece::Queen))
        & !BitBoard::from_square(played.get_dest());

    for slider_sq in sliders {
        if !after.piece_on(slider_sq).is_some_and(is_ray_piece) {
            continue;
        }
        // Only sliders that were already standing there; a castling rook is not one
        if before.piece_on(slider_sq) != after.piece_on(slider_sq)
            || before.color_on(slider_sq) != Some(mover)
        {
            continue;
        }
        let opened = attacks(after, slider_sq) & !attacks(before, slider_sq) & enemy;
        for target in opened {
            let valuable = after
                .piece_on(target)
                .is_some_and(|p| p == Piece::King || is_minor_or_major(p));
            if valuable && chess::between(slider_sq, target) & origin != EMPTY {
                return true;
            }
        }
    }
    false
}
