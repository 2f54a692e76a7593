//! SAN and UCI notation helpers on top of the `chess` crate.

use chess::{Board, ChessMove, File, MoveGen, Piece, Rank, Square};

/// UCI text for a move, e.g. `e2e4` or `e7e8q`.
pub fn move_to_uci(m: ChessMove) -> String {
    format!(
        "{}{}{}",
        m.get_source(),
        m.get_dest(),
        m.get_promotion()
            .map(|p| match p {
                Piece::Queen => "q",
                Piece::Rook => "r",
                Piece::Bishop => "b",
                Piece::Knight => "n",
                _ => "",
            })
            .unwrap_or("")
    )
}

/// Parse a UCI move string against a board. Returns None when the text is
/// malformed or the move is not legal here.
pub fn parse_uci_move(board: &Board, uci: &str) -> Option<ChessMove> {
    let bytes = uci.as_bytes();
    if bytes.len() < 4 {
        return None;
    }
    let src = parse_square(bytes[0], bytes[1])?;
    let dst = parse_square(bytes[2], bytes[3])?;
    let promotion = match bytes.get(4) {
        Some(b'q') => Some(Piece::Queen),
        Some(b'r') => Some(Piece::Rook),
        Some(b'b') => Some(Piece::Bishop),
        Some(b'n') => Some(Piece::Knight),
        Some(_) => return None,
        None => None,
    };
    let m = ChessMove::new(src, dst, promotion);
    board.legal(m).then_some(m)
}

fn parse_square(file: u8, rank: u8) -> Option<Square> {
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return None;
    }
    Some(Square::make_square(
        Rank::from_index((rank - b'1') as usize),
        File::from_index((file - b'a') as usize),
    ))
}

/// Find the legal move matching a SAN string.
pub fn resolve_san(board: &Board, san: &str) -> Result<ChessMove, String> {
    let clean = san.trim_end_matches(['+', '#', '!', '?']);

    let legal_moves: Vec<ChessMove> = MoveGen::new_legal(board).collect();

    if clean == "O-O" || clean == "0-0" {
        return find_castle(board, &legal_moves, true)
            .ok_or_else(|| format!("no kingside castling move for {san}"));
    }
    if clean == "O-O-O" || clean == "0-0-0" {
        return find_castle(board, &legal_moves, false)
            .ok_or_else(|| format!("no queenside castling move for {san}"));
    }

    // Parse piece, disambiguation, capture, destination, promotion
    let bytes = clean.as_bytes();
    if bytes.is_empty() {
        return Err("empty SAN move".to_string());
    }

    let (piece, rest) = if bytes[0].is_ascii_uppercase() {
        let p = match bytes[0] {
            b'K' => Piece::King,
            b'Q' => Piece::Queen,
            b'R' => Piece::Rook,
            b'B' => Piece::Bishop,
            b'N' => Piece::Knight,
            other => return Err(format!("unknown piece: {}", other as char)),
        };
        (p, &clean[1..])
    } else {
        (Piece::Pawn, clean)
    };

    // Promotion, with or without '='
    let (rest, promotion) = match rest.as_bytes().last() {
        Some(b'Q' | b'R' | b'B' | b'N') if piece == Piece::Pawn => {
            let promo = match rest.as_bytes()[rest.len() - 1] {
                b'Q' => Piece::Queen,
                b'R' => Piece::Rook,
                b'B' => Piece::Bishop,
                _ => Piece::Knight,
            };
            (rest[..rest.len() - 1].trim_end_matches('='), Some(promo))
        }
        _ => (rest, None),
    };

    let rest = rest.replace('x', "");
    let rest_bytes = rest.as_bytes();
    if rest_bytes.len() < 2 {
        return Err(format!("SAN too short: {san}"));
    }

    let dest = parse_square(rest_bytes[rest_bytes.len() - 2], rest_bytes[rest_bytes.len() - 1])
        .ok_or_else(|| format!("invalid destination in SAN: {san}"))?;

    let disambig = &rest_bytes[..rest_bytes.len() - 2];

    let mut candidates: Vec<ChessMove> = legal_moves
        .into_iter()
        .filter(|m| {
            m.get_dest() == dest
                && board.piece_on(m.get_source()) == Some(piece)
                && m.get_promotion() == promotion
        })
        .collect();

    if candidates.len() > 1 && !disambig.is_empty() {
        candidates.retain(|m| {
            let src = m.get_source();
            disambig.iter().all(|&b| {
                if (b'a'..=b'h').contains(&b) {
                    src.get_file().to_index() == (b - b'a') as usize
                } else if (b'1'..=b'8').contains(&b) {
                    src.get_rank().to_index() == (b - b'1') as usize
                } else {
                    true
                }
            })
        });
    }

    match candidates.len() {
        1 => Ok(candidates[0]),
        0 => Err(format!("no legal move matches SAN: {san}")),
        n => Err(format!("ambiguous SAN: {san} ({n} candidates)")),
    }
}

fn find_castle(board: &Board, legal_moves: &[ChessMove], kingside: bool) -> Option<ChessMove> {
    legal_moves.iter().copied().find(|m| {
        if board.piece_on(m.get_source()) != Some(Piece::King) {
            return false;
        }
        let src_file = m.get_source().get_file().to_index() as i32;
        let dst_file = m.get_dest().get_file().to_index() as i32;
        if kingside {
            dst_file - src_file == 2
        } else {
            src_file - dst_file == 2
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_resolve_basic_moves() {
        let board = Board::default();
        let m = resolve_san(&board, "e4").unwrap();
        assert_eq!(move_to_uci(m), "e2e4");
        let m = resolve_san(&board, "Nf3").unwrap();
        assert_eq!(move_to_uci(m), "g1f3");
    }

    #[test]
    fn test_resolve_disambiguation() {
        // Knights on b1 and f3 can both reach d2
        let board =
            Board::from_str("rnbqkbnr/pppppppp/8/8/8/5N2/PPP1PPPP/RNBQKB1R w KQkq - 0 1").unwrap();
        assert!(resolve_san(&board, "Nd2").is_err());
        assert_eq!(move_to_uci(resolve_san(&board, "Nbd2").unwrap()), "b1d2");
        assert_eq!(move_to_uci(resolve_san(&board, "Nfd2").unwrap()), "f3d2");
    }

    #[test]
    fn test_resolve_castling_and_promotion() {
        let board = Board::from_str("r3k2r/1P6/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(move_to_uci(resolve_san(&board, "O-O").unwrap()), "e1g1");
        assert_eq!(move_to_uci(resolve_san(&board, "O-O-O").unwrap()), "e1c1");
        assert_eq!(move_to_uci(resolve_san(&board, "bxa8=Q+").unwrap()), "b7a8q");
        assert_eq!(move_to_uci(resolve_san(&board, "b8N").unwrap()), "b7b8n");
    }

    #[test]
    fn test_illegal_move() {
        let board = Board::default();
        assert!(resolve_san(&board, "e5").is_err());
        assert!(resolve_san(&board, "Zz9").is_err());
    }

    #[test]
    fn test_parse_uci_move() {
        let board = Board::default();
        assert!(parse_uci_move(&board, "e2e4").is_some());
        assert!(parse_uci_move(&board, "e2e5").is_none());
        assert!(parse_uci_move(&board, "(none)").is_none());
    }
}
