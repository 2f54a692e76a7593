//! Board helpers for the classifier and motif detector.
//! Attack, defence and pin queries the `chess` crate only answers for the
//! side to move.

use chess::{BitBoard, Board, ChessMove, Color, File, Piece, Rank, Square, EMPTY};

// Piece values in centipawns
pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;

/// Piece value (king counts as 0; it is never traded)
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 0,
    }
}

/// Is this a ray (sliding) piece type?
pub fn is_ray_piece(piece: Piece) -> bool {
    matches!(piece, Piece::Queen | Piece::Rook | Piece::Bishop)
}

/// Pieces that count as fork and discovered-attack targets
pub fn is_minor_or_major(piece: Piece) -> bool {
    matches!(piece, Piece::Queen | Piece::Rook | Piece::Bishop | Piece::Knight)
}

/// Squares attacked by whatever stands on `square`, given `occupied` as blockers.
pub fn attacks_with(board: &Board, square: Square, occupied: BitBoard) -> BitBoard {
    let (piece, color) = match (board.piece_on(square), board.color_on(square)) {
        (Some(p), Some(c)) => (p, c),
        _ => return EMPTY,
    };

    match piece {
        Piece::Pawn => pawn_attacks(square, color),
        Piece::Knight => chess::get_knight_moves(square),
        Piece::King => chess::get_king_moves(square),
        Piece::Bishop => chess::get_bishop_moves(square, occupied),
        Piece::Rook => chess::get_rook_moves(square, occupied),
        Piece::Queen => {
            chess::get_bishop_moves(square, occupied) | chess::get_rook_moves(square, occupied)
        }
    }
}

/// Squares attacked by the piece on `square`
pub fn attacks(board: &Board, square: Square) -> BitBoard {
    attacks_with(board, square, *board.combined())
}

/// Pawn attack squares (diagonals only, no pushes)
pub fn pawn_attacks(square: Square, color: Color) -> BitBoard {
    let file = square.get_file().to_index();
    let rank = square.get_rank().to_index();

    let target_rank = match color {
        Color::White if rank < 7 => rank + 1,
        Color::Black if rank > 0 => rank - 1,
        _ => return EMPTY,
    };

    let mut result = EMPTY;
    for target_file in [file.checked_sub(1), (file < 7).then_some(file + 1)]
        .into_iter()
        .flatten()
    {
        result |= BitBoard::from_square(Square::make_square(
            Rank::from_index(target_rank),
            File::from_index(target_file),
        ));
    }
    result
}

/// All pieces of `color` attacking `square` with the given occupancy.
/// Sliders see through squares missing from `occupied`, which lets the
/// exchange evaluator uncover x-ray attackers.
pub fn attackers_with(board: &Board, color: Color, square: Square, occupied: BitBoard) -> BitBoard {
    let color_pieces = *board.color_combined(color) & occupied;

    // Pawns: reverse lookup from the target square with the opposite color
    let mut result = pawn_attacks(square, !color) & *board.pieces(Piece::Pawn);
    result |= chess::get_knight_moves(square) & *board.pieces(Piece::Knight);
    result |= chess::get_king_moves(square) & *board.pieces(Piece::King);

    let diagonal = *board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen);
    result |= chess::get_bishop_moves(square, occupied) & diagonal;

    let orthogonal = *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    result |= chess::get_rook_moves(square, occupied) & orthogonal;

    result & color_pieces
}

/// All pieces of `color` attacking `square`
pub fn attackers(board: &Board, color: Color, square: Square) -> BitBoard {
    attackers_with(board, color, square, *board.combined())
}

pub fn is_attacked_by(board: &Board, color: Color, square: Square) -> bool {
    attackers(board, color, square) != EMPTY
}

/// Find the king square for a color
pub fn king_square(board: &Board, color: Color) -> Square {
    board.king_square(color)
}

/// The ray through `square` and its king when the piece there is pinned by
/// an enemy slider, None otherwise. Works for either color, unlike
/// `Board::pinned` which only reports the side to move.
pub fn pin_ray(board: &Board, color: Color, square: Square) -> Option<BitBoard> {
    let king_sq = king_square(board, color);
    if king_sq == square {
        return None;
    }

    let line = chess::line(king_sq, square);
    if line == EMPTY {
        return None;
    }

    let diagonal =
        king_sq.get_file() != square.get_file() && king_sq.get_rank() != square.get_rank();
    let sliders = if diagonal {
        *board.pieces(Piece::Bishop) | *board.pieces(Piece::Queen)
    } else {
        *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen)
    };
    let pinners = sliders & *board.color_combined(!color) & line;
    let occupied = *board.combined();

    for pinner_sq in pinners {
        let blockers = chess::between(king_sq, pinner_sq) & occupied;
        if blockers == BitBoard::from_square(square) {
            return Some(line);
        }
    }
    None
}

pub fn is_pinned(board: &Board, color: Color, square: Square) -> bool {
    pin_ray(board, color, square).is_some()
}

/// Opponent pieces attacked from a square, as (piece, square) pairs
pub fn attacked_opponent_squares(
    board: &Board,
    from_square: Square,
    pov: Color,
) -> Vec<(Piece, Square)> {
    attacks(board, from_square)
        .into_iter()
        .filter_map(|sq| match (board.piece_on(sq), board.color_on(sq)) {
            (Some(piece), Some(color)) if color != pov => Some((piece, sq)),
            _ => None,
        })
        .collect()
}

/// Is this move an en passant capture?
pub fn is_en_passant(board: &Board, m: ChessMove) -> bool {
    board.piece_on(m.get_source()) == Some(Piece::Pawn)
        && m.get_source().get_file() != m.get_dest().get_file()
        && board.piece_on(m.get_dest()).is_none()
}

/// Is this move a capture (en passant included)?
pub fn is_capture(board: &Board, m: ChessMove) -> bool {
    board.piece_on(m.get_dest()).is_some() || is_en_passant(board, m)
}

/// Piece standing on the destination before the move, if any
pub fn captured_piece(board: &Board, m: ChessMove) -> Option<Piece> {
    if is_en_passant(board, m) {
        return Some(Piece::Pawn);
    }
    board.piece_on(m.get_dest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sq(s: &str) -> Square {
        Square::from_str(s).unwrap()
    }

    #[test]
    fn test_king_square() {
        let board = Board::default();
        assert_eq!(king_square(&board, Color::White), sq("e1"));
        assert_eq!(king_square(&board, Color::Black), sq("e8"));
    }

    #[test]
    fn test_attacks_starting_position() {
        let board = Board::default();
        let atk = attacks(&board, sq("e2"));
        assert!(atk & BitBoard::from_square(sq("d3")) != EMPTY);
        assert!(atk & BitBoard::from_square(sq("f3")) != EMPTY);
        assert_eq!(atk.popcnt(), 2);
    }

    #[test]
    fn test_pawn_attacks_edges() {
        assert_eq!(pawn_attacks(sq("a2"), Color::White), BitBoard::from_square(sq("b3")));
        assert_eq!(pawn_attacks(sq("h7"), Color::Black), BitBoard::from_square(sq("g6")));
        assert_eq!(pawn_attacks(sq("e8"), Color::White), EMPTY);
    }

    #[test]
    fn test_attackers_reverse_lookup() {
        // White knight on f3 attacks e5
        let board =
            Board::from_str("rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2")
                .unwrap();
        let white = attackers(&board, Color::White, sq("e5"));
        assert!(white & BitBoard::from_square(sq("f3")) != EMPTY);
        assert!(!is_attacked_by(&board, Color::Black, sq("e4")));
    }

    #[test]
    fn test_pin_ray_either_color() {
        // Black knight on c6 pinned by the bishop on b5, white to move
        let board =
            Board::from_str("r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3")
                .unwrap();
        assert!(!is_pinned(&board, Color::Black, sq("c6")));

        let board =
            Board::from_str("r1bqkbnr/ppp2ppp/2np4/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 4")
                .unwrap();
        assert!(is_pinned(&board, Color::Black, sq("c6")));
        assert!(!is_pinned(&board, Color::White, sq("f3")));
    }

    #[test]
    fn test_en_passant_capture() {
        let board =
            Board::from_str("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let m = ChessMove::new(sq("e5"), sq("f6"), None);
        assert!(is_en_passant(&board, m));
        assert!(is_capture(&board, m));
        assert_eq!(captured_piece(&board, m), Some(Piece::Pawn));
    }
}
