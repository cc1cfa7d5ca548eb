//! Worker error types

use std::time::Duration;

use chess_core::GameError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Stockfish did not answer within {0:?}")]
    EngineTimeout(Duration),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("{player} did not play in this game")]
    TargetNotInGame { player: String },

    #[error("Missing {0} rating")]
    MissingRating(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Errors that leave the engine in an unknown state.
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, WorkerError::Stockfish(_) | WorkerError::EngineTimeout(_))
    }
}
