//! Game parsing errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("PGN contains no moves")]
    NoMoves,

    #[error("Game does not start from the standard position")]
    NonStandardStart,

    #[error("Unknown result token: {0}")]
    UnknownResult(String),

    #[error("Missing rating for {0}")]
    MissingRating(&'static str),

    #[error("Invalid SAN at ply {ply}: {san}")]
    InvalidSan { ply: usize, san: String },

    #[error("Illegal move at ply {ply}: {san}")]
    IllegalMove { ply: usize, san: String },
}
