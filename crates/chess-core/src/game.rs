//! Replayed games: plies with the positions and flags the analysis needs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{Chess, Color, EnPassantMode, Position, Square};

use crate::error::GameError;
use crate::game_data::{GameData, GameMetadata};
use crate::pgn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::White, Side::Black];

    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::White => "white",
            Side::Black => "black",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameResult {
    /// Score of the game from `side`'s point of view: 1 win, 0.5 draw, 0 loss.
    pub fn score_for(self, side: Side) -> f64 {
        match (self, side) {
            (GameResult::Draw, _) => 0.5,
            (GameResult::WhiteWins, Side::White) | (GameResult::BlackWins, Side::Black) => 1.0,
            _ => 0.0,
        }
    }

    pub fn is_draw(self) -> bool {
        self == GameResult::Draw
    }
}

impl FromStr for GameResult {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1-0" => Ok(GameResult::WhiteWins),
            "0-1" => Ok(GameResult::BlackWins),
            "1/2-1/2" | "½-½" => Ok(GameResult::Draw),
            other => Err(GameError::UnknownResult(other.to_string())),
        }
    }
}

/// One half-move of a replayed game.
#[derive(Debug, Clone)]
pub struct Ply {
    pub san: String,
    pub mover: Side,
    /// Full-move number at which this ply was played.
    pub fullmove: u32,
    pub to: Square,
    pub is_castle: bool,
    pub is_en_passant: bool,
    pub fen_before: String,
    pub fen_after: String,
}

/// A parsed, fully replayed game. Immutable once built.
#[derive(Debug, Clone)]
pub struct Game {
    pub metadata: GameMetadata,
    pub result: GameResult,
    pub plies: Vec<Ply>,
}

impl Game {
    pub fn from_pgn(pgn_text: &str) -> Result<Self, GameError> {
        Self::from_game_data(pgn::parse_pgn(pgn_text)?)
    }

    /// Replay SAN moves from the standard start position.
    pub fn from_game_data(data: GameData) -> Result<Self, GameError> {
        let result: GameResult = data.metadata.result.parse()?;
        let plies = replay(&data.moves)?;
        Ok(Self {
            metadata: data.metadata,
            result,
            plies,
        })
    }

    /// Side played by `username` (case-insensitive), if any.
    pub fn side_of(&self, username: &str) -> Option<Side> {
        if self.metadata.white.eq_ignore_ascii_case(username) {
            Some(Side::White)
        } else if self.metadata.black.eq_ignore_ascii_case(username) {
            Some(Side::Black)
        } else {
            None
        }
    }

    pub fn rating(&self, side: Side) -> Option<i32> {
        match side {
            Side::White => self.metadata.white_elo,
            Side::Black => self.metadata.black_elo,
        }
    }

    /// Number of full moves (a game ending on White's move counts that move).
    pub fn move_count(&self) -> u32 {
        self.plies.last().map_or(0, |ply| ply.fullmove)
    }
}

fn replay(moves: &[String]) -> Result<Vec<Ply>, GameError> {
    let mut pos = Chess::default();
    let mut plies = Vec::with_capacity(moves.len());

    for (index, san_str) in moves.iter().enumerate() {
        let san: SanPlus = san_str.parse().map_err(|_| GameError::InvalidSan {
            ply: index,
            san: san_str.clone(),
        })?;
        let mv = san.san.to_move(&pos).map_err(|_| GameError::IllegalMove {
            ply: index,
            san: san_str.clone(),
        })?;

        let mover = Side::from(pos.turn());
        let fullmove = pos.fullmoves().get();
        let fen_before = fen_of(&pos);
        pos.play_unchecked(mv.clone());

        plies.push(Ply {
            san: san_str.clone(),
            mover,
            fullmove,
            to: mv.to(),
            is_castle: mv.is_castle(),
            is_en_passant: mv.is_en_passant(),
            fen_before,
            fen_after: fen_of(&pos),
        });
    }

    Ok(plies)
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRENCH_EP: &str = r#"[White "Alice"]
[Black "bob"]
[Result "0-1"]
[WhiteElo "1510"]
[BlackElo "1490"]

1. e4 e6 2. e5 d5 3. exd6 Bxd6 4. Nf3 Nf6 5. Bc4 O-O 6. O-O Nc6 0-1"#;

    #[test]
    fn replay_flags_special_moves() {
        let game = Game::from_pgn(FRENCH_EP).unwrap();
        assert_eq!(game.plies.len(), 12);
        assert_eq!(game.result, GameResult::BlackWins);

        let ep = &game.plies[4];
        assert_eq!(ep.san, "exd6");
        assert!(ep.is_en_passant);
        assert_eq!(ep.mover, Side::White);
        assert_eq!(ep.fullmove, 3);
        assert_eq!(ep.to, Square::D6);

        let black_castle = &game.plies[9];
        assert!(black_castle.is_castle);
        assert_eq!(black_castle.mover, Side::Black);
        assert_eq!(black_castle.fullmove, 5);

        let white_castle = &game.plies[10];
        assert!(white_castle.is_castle);
        assert_eq!(white_castle.fullmove, 6);

        assert_eq!(game.plies.iter().filter(|p| p.is_castle || p.is_en_passant).count(), 3);
        assert_eq!(game.plies[1].fen_before, game.plies[0].fen_after);
        assert_eq!(game.move_count(), 6);
    }

    #[test]
    fn side_lookup_ignores_case() {
        let game = Game::from_pgn(FRENCH_EP).unwrap();
        assert_eq!(game.side_of("alice"), Some(Side::White));
        assert_eq!(game.side_of("BOB"), Some(Side::Black));
        assert_eq!(game.side_of("carol"), None);
        assert_eq!(game.rating(Side::Black), Some(1490));
    }

    #[test]
    fn illegal_move_is_reported() {
        let err = Game::from_pgn("1. e4 e5 2. Ke3 *").unwrap_err();
        // `*` is rejected before replay
        assert_eq!(err, GameError::UnknownResult("*".into()));

        let err = Game::from_pgn("[Result \"1-0\"]\n\n1. e4 e5 2. Ke3 1-0").unwrap_err();
        assert_eq!(err, GameError::IllegalMove { ply: 2, san: "Ke3".into() });
    }

    #[test]
    fn result_scores() {
        assert_eq!(GameResult::WhiteWins.score_for(Side::White), 1.0);
        assert_eq!(GameResult::WhiteWins.score_for(Side::Black), 0.0);
        assert_eq!(GameResult::Draw.score_for(Side::Black), 0.5);
        assert!("1/2-1/2".parse::<GameResult>().unwrap().is_draw());
        assert!("*".parse::<GameResult>().is_err());
    }
}
