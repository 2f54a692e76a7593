//! PGN parsing utilities: lightweight regex-based parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PgnError;
use crate::game_data::{GameData, GameMetadata};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header pattern"));

static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"O-O-O[+#]?|O-O[+#]?|0-0-0[+#]?|0-0[+#]?",
        r"|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=?[QRBN])?[+#]?",
    ))
    .expect("move pattern")
});

/// Parse the first game of a PGN string into a GameData struct.
///
/// Text with neither tag pairs nor movetext is not a game. A tag section
/// without moves is accepted as an empty game.
pub fn parse_pgn(pgn: &str) -> Result<GameData, PgnError> {
    let text = split_games(pgn).into_iter().next().ok_or(PgnError::NoGame)?;

    let mut metadata = GameMetadata {
        white: "Unknown".to_string(),
        black: "Unknown".to_string(),
        result: "*".to_string(),
        ..GameMetadata::default()
    };
    let mut setup = None;
    let mut header_count = 0;

    for cap in HEADER_RE.captures_iter(&text) {
        header_count += 1;
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Event" => metadata.event = Some(value),
            "Site" => metadata.site = Some(value),
            "Date" => metadata.date = Some(value),
            "TimeControl" => metadata.time_control = Some(value),
            "ECO" => metadata.eco = Some(value),
            "Link" => metadata.link = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => metadata.fen = Some(value),
            _ => {}
        }
    }

    // A FEN tag only applies when SetUp is absent or "1"
    if setup.as_deref() == Some("0") {
        metadata.fen = None;
    }

    let moves = extract_moves(&text);
    if moves.is_empty() && header_count == 0 {
        return Err(PgnError::NoGame);
    }

    Ok(GameData {
        metadata,
        moves,
        pgn: text,
    })
}

/// Split a PGN database into one string per game.
///
/// A new game starts at the first tag line that follows movetext. Lines
/// inside a `{...}` comment never start a game, even when they begin with `[`.
pub fn split_games(pgn: &str) -> Vec<String> {
    let mut games = Vec::new();
    let mut current = String::new();
    let mut seen_movetext = false;
    let mut in_comment = false;

    for line in pgn.lines() {
        let trimmed = line.trim();
        let is_tag = !in_comment && trimmed.starts_with('[') && HEADER_RE.is_match(trimmed);

        if is_tag && seen_movetext {
            games.push(std::mem::take(&mut current));
            seen_movetext = false;
        }
        if !is_tag && !trimmed.is_empty() && !trimmed.starts_with('%') {
            seen_movetext = true;
        }
        in_comment = comment_open_after(trimmed, in_comment);

        current.push_str(line);
        current.push('\n');
    }

    if !current.trim().is_empty() {
        games.push(current);
    }
    games
}

/// Whether a brace comment is still open at the end of `line`.
fn comment_open_after(line: &str, mut in_comment: bool) -> bool {
    for c in line.chars() {
        match c {
            '{' if !in_comment => in_comment = true,
            '}' if in_comment => in_comment = false,
            // Rest-of-line comment
            ';' if !in_comment => break,
            _ => {}
        }
    }
    in_comment
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_RE.replace_all(pgn, "");
    let mainline = strip_annotations(&no_headers);

    MOVE_RE
        .find_iter(&mainline)
        .map(|m| m.as_str().replace('0', "O"))
        .collect()
}

/// Drop `{...}` and `;` comments, NAGs and (possibly nested) variations.
fn strip_annotations(movetext: &str) -> String {
    let mut out = String::with_capacity(movetext.len());
    let mut variation_depth = 0usize;
    let mut chars = movetext.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                }
                out.push(' ');
            }
            ';' => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
                out.push(' ');
            }
            '(' => variation_depth += 1,
            ')' => variation_depth = variation_depth.saturating_sub(1),
            '$' => {
                while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                    chars.next();
                }
                out.push(' ');
            }
            _ if variation_depth == 0 => out.push(c),
            _ => {}
        }
    }

    out
}
