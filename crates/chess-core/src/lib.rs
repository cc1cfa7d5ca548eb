pub mod error;
pub mod game;
pub mod game_data;
pub mod pgn;
pub mod profile;
pub mod record;

pub use error::GameError;
pub use game::{Game, GameResult, Ply, Side};
