pub mod players;
pub mod pool;
pub mod tournaments;
