use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    /// JSON snapshot file or records directory, used when no database is set.
    pub records_file: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    /// Openings played fewer times are left out of comparisons.
    pub min_games: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok(),
            records_file: env::var("RECORDS_FILE").ok().map(PathBuf::from),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            min_games: env::var("MIN_GAMES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }
}
