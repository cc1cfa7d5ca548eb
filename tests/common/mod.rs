use std::path::PathBuf;
use std::time::Duration;

use analysis_worker::{Evaluation, Evaluator, WorkerError};
use async_trait::async_trait;

/// Scores every position the same and counts queries.
#[derive(Debug, Default)]
pub struct FlatEngine {
    pub queries: usize,
}

#[async_trait]
impl Evaluator for FlatEngine {
    async fn evaluate(&mut self, _fen: &str, _budget: Duration) -> Result<Evaluation, WorkerError> {
        self.queries += 1;
        Ok(Evaluation::Centipawns(0))
    }
}

/// A Sicilian where White castles on move 4 and the game runs to move 8.
const SICILIAN_MOVES: &str =
    "1. e4 c5 2. Nf3 d6 3. Bc4 Nf6 4. O-O Nc6 5. d3 e6 6. Nc3 Be7 7. a3 a6 8. h3 h6";

/// One game of a chess.com style export.
pub fn game(white: &str, black: &str, result: &str, day: u32) -> String {
    format!(
        "[Event \"Live Chess\"]\n\
         [Date \"2024.03.{day:02}\"]\n\
         [White \"{white}\"]\n\
         [Black \"{black}\"]\n\
         [Result \"{result}\"]\n\
         [WhiteElo \"1600\"]\n\
         [BlackElo \"1550\"]\n\
         [Opening \"Sicilian Defense\"]\n\
         \n\
         {SICILIAN_MOVES} {result}\n\n"
    )
}

/// Concatenate games into one export.
pub fn export(games: &[(&str, &str, &str)]) -> String {
    games
        .iter()
        .enumerate()
        .map(|(i, (white, black, result))| game(white, black, result, i as u32 + 1))
        .collect()
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
