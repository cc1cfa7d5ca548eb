//! PGN parsing utilities — lightweight regex-based parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::GameError;
use crate::game_data::{GameData, GameMetadata};

const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("valid header regex"));
static HEADER_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid header block regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid comment regex"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid variation regex"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O")
        .expect("valid SAN regex")
});
static GAME_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\[Event\s").expect("valid event regex"));

/// Parse a single PGN game into a GameData struct.
pub fn parse_pgn(pgn: &str) -> Result<GameData, GameError> {
    let mut white = "Unknown".to_string();
    let mut black = "Unknown".to_string();
    let mut result = "*".to_string();
    let mut white_elo = None;
    let mut black_elo = None;
    let mut date = None;
    let mut end_time = None;
    let mut eco = None;
    let mut eco_url = None;
    let mut opening = None;
    let mut link = None;
    let mut setup = None;
    let mut fen = None;

    for cap in HEADER_RE.captures_iter(pgn) {
        let key = &cap[1];
        let value = cap[2].to_string();
        match key {
            "White" => white = value,
            "Black" => black = value,
            "Result" => result = value,
            "WhiteElo" => white_elo = value.parse().ok(),
            "BlackElo" => black_elo = value.parse().ok(),
            "Date" | "UTCDate" if date.is_none() => date = Some(value),
            "EndTime" => end_time = Some(value),
            "ECO" => eco = Some(value),
            "ECOUrl" => eco_url = Some(value),
            "Opening" => opening = Some(value),
            "Link" => link = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    // Filter non-standard positions
    if setup.as_deref() == Some("1") {
        if let Some(ref f) = fen {
            if f != STANDARD_START_FEN {
                return Err(GameError::NonStandardStart);
            }
        }
    }

    let moves = extract_moves(pgn);
    if moves.is_empty() {
        return Err(GameError::NoMoves);
    }

    Ok(GameData {
        metadata: GameMetadata {
            white,
            black,
            result,
            white_elo,
            black_elo,
            date,
            end_time,
            eco,
            eco_url,
            opening,
            link,
        },
        moves,
        pgn: pgn.to_string(),
    })
}

/// Split a multi-game PGN export into one slice per game.
pub fn split_games(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = GAME_START_RE.find_iter(text).map(|m| m.start()).collect();
    if starts.is_empty() {
        let trimmed = text.trim();
        return if trimmed.is_empty() { vec![] } else { vec![trimmed] };
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end].trim()
        })
        .filter(|game| !game.is_empty())
        .collect()
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_BLOCK_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");
    let no_variations = VARIATION_RE.replace_all(&no_comments, "");

    MOVE_RE
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}
