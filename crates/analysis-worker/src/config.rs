//! Worker configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::WorkerError;

/// Longer than any real game.
pub const MAX_MOVE_DELAY: u32 = 200;

/// Knobs of the significance analysis itself.
#[derive(Clone, Debug)]
pub struct AnalysisSettings {
    /// Engine search time per position.
    pub query_time: Duration,

    /// Full moves between a special move and its re-sample.
    pub move_delay: u32,

    /// A test is significant when `p < 1 - confidence_level`.
    pub confidence_level: f64,

    /// Wins and losses each required before the outcome regression runs.
    pub min_decisive_games: usize,

    /// Samples required before a move-utility pool is tested.
    pub min_utility_samples: usize,

    /// Clamp a forced mate found at re-sample time to ±1000 cp instead of
    /// discarding the game.
    pub clamp_resample_mates: bool,
}

impl AnalysisSettings {
    pub fn significance_threshold(&self) -> f64 {
        1.0 - self.confidence_level
    }

    pub fn validate(&self) -> Result<(), WorkerError> {
        if !(0.0..1.0).contains(&self.confidence_level) {
            return Err(WorkerError::Config("CONFIDENCE_LEVEL must be in [0, 1)"));
        }
        if !(1..=MAX_MOVE_DELAY).contains(&self.move_delay) {
            return Err(WorkerError::Config("MOVE_DELAY must be between 1 and 200"));
        }
        Ok(())
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            query_time: Duration::from_millis(100),
            move_delay: 3,
            confidence_level: 0.90,
            min_decisive_games: 30,
            min_utility_samples: 4,
            clamp_resample_mates: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Postgres URL; not needed when records are written to files
    pub database_url: Option<String>,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Concurrent player analyses (one engine each)
    pub max_workers: usize,

    /// Most recent games analyzed per player
    pub max_games_per_player: usize,

    /// Shorter games are ignored
    pub min_moves_per_game: u32,

    pub analysis: AnalysisSettings,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, WorkerError> {
        let defaults = AnalysisSettings::default();

        let analysis = AnalysisSettings {
            query_time: Duration::from_millis(env_or("ANALYSIS_TIME_MS", 100)),
            move_delay: env_or("MOVE_DELAY", defaults.move_delay),
            confidence_level: env_or("CONFIDENCE_LEVEL", defaults.confidence_level),
            clamp_resample_mates: env_or("CLAMP_RESAMPLE_MATES", defaults.clamp_resample_mates),
            ..defaults
        };
        analysis.validate()?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok(),
            stockfish_path: env::var("STOCKFISH_PATH")
                .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string()),
            max_workers: env_or("MAX_WORKERS", num_cpus::get()).max(1),
            max_games_per_player: env_or("MAX_GAMES_PER_PLAYER", 500),
            min_moves_per_game: env_or("MIN_MOVES_PER_GAME", 7),
            analysis,
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        assert!(AnalysisSettings::default().validate().is_ok());

        for move_delay in [0, MAX_MOVE_DELAY + 1, u32::MAX] {
            let settings = AnalysisSettings { move_delay, ..Default::default() };
            assert!(matches!(settings.validate(), Err(WorkerError::Config(_))));
        }

        let settings = AnalysisSettings { confidence_level: 1.0, ..Default::default() };
        assert!(matches!(settings.validate(), Err(WorkerError::Config(_))));
    }
}
