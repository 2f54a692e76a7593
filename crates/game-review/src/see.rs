//! Static Exchange Evaluation (SEE).
//!
//! Estimates the material outcome of a move when both sides keep recapturing
//! on the destination square with their least valuable attacker and either
//! side may stop when continuing would lose material.

use chess::{BitBoard, Board, ChessMove, Color, Piece, Square, EMPTY};

use crate::board_utils::{attackers_with, captured_piece, is_en_passant, piece_value};

/// The king may join an exchange but must never be the piece left hanging
const KING_SEE_VALUE: i32 = 20_000;

/// Pieces in recapture order, cheapest first
const ATTACKER_ORDER: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

fn see_value(piece: Piece) -> i32 {
    match piece {
        Piece::King => KING_SEE_VALUE,
        other => piece_value(other),
    }
}

fn least_valuable_attacker(board: &Board, attackers: BitBoard) -> Option<(Square, Piece)> {
    ATTACKER_ORDER.into_iter().find_map(|piece| {
        let candidates = attackers & *board.pieces(piece);
        (candidates != EMPTY).then(|| (candidates.to_square(), piece))
    })
}

/// Material balance of `m` for the side making it, in centipawns, after the
/// exchange sequence on the destination square plays out.
pub fn static_exchange(board: &Board, m: ChessMove) -> i32 {
    let src = m.get_source();
    let dst = m.get_dest();
    let mover = board.side_to_move();

    let mut occupied = *board.combined() ^ BitBoard::from_square(src);
    if is_en_passant(board, m) {
        // The captured pawn sits beside the source square, on the destination file
        let captured_sq = Square::make_square(src.get_rank(), dst.get_file());
        occupied ^= BitBoard::from_square(captured_sq);
    }

    let mut gain = [0i32; 32];
    gain[0] = captured_piece(board, m).map(piece_value).unwrap_or(0);

    // Value of the piece now standing on the destination
    let mut on_square = match (m.get_promotion(), board.piece_on(src)) {
        (Some(promo), _) => piece_value(promo),
        (None, Some(piece)) => see_value(piece),
        (None, None) => 0,
    };

    let mut side: Color = !mover;
    let mut depth = 0usize;

    while depth + 1 < gain.len() {
        let attackers = attackers_with(board, side, dst, occupied);
        let Some((sq, piece)) = least_valuable_attacker(board, attackers) else {
            break;
        };

        depth += 1;
        gain[depth] = on_square - gain[depth - 1];

        // Neither side can improve by continuing
        if (-gain[depth - 1]).max(gain[depth]) < 0 {
            break;
        }

        on_square = see_value(piece);
        occupied ^= BitBoard::from_square(sq);
        side = !side;
    }

    while depth > 0 {
        gain[depth - 1] = -(-gain[depth - 1]).max(gain[depth]);
        depth -= 1;
    }

    gain[0]
}
