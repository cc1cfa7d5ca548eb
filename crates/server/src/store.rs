//! Read access to analyzed player records and tournament rosters.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chess_core::record::{PlayerRecord, TournamentRecord};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::db;
use crate::error::AppError;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Player record by username (case-insensitive).
    async fn player(&self, username: &str) -> Result<Option<PlayerRecord>, AppError>;

    async fn tournament(&self, url: &str) -> Result<Option<TournamentRecord>, AppError>;

    /// All tournaments, sorted by URL.
    async fn tournaments(&self) -> Result<Vec<TournamentRecord>, AppError>;

    /// Tournaments `username` is registered in, sorted by URL.
    async fn tournaments_for_player(&self, username: &str)
        -> Result<Vec<TournamentRecord>, AppError>;
}

pub type SharedStore = Arc<dyn RecordStore>;

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn player(&self, username: &str) -> Result<Option<PlayerRecord>, AppError> {
        db::players::get_player(&self.pool, username).await
    }

    async fn tournament(&self, url: &str) -> Result<Option<TournamentRecord>, AppError> {
        db::tournaments::get_tournament(&self.pool, url).await
    }

    async fn tournaments(&self) -> Result<Vec<TournamentRecord>, AppError> {
        db::tournaments::list_tournaments(&self.pool).await
    }

    async fn tournaments_for_player(
        &self,
        username: &str,
    ) -> Result<Vec<TournamentRecord>, AppError> {
        db::tournaments::tournaments_for_player(&self.pool, username).await
    }
}

/// Snapshot file layout: `{"players": [...], "tournaments": [...]}`.
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    pub tournaments: Vec<TournamentRecord>,
}

/// In-memory store, loaded once at startup.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    players: HashMap<String, PlayerRecord>,
    tournaments: BTreeMap<String, TournamentRecord>,
}

impl MemoryStore {
    pub fn new(
        players: impl IntoIterator<Item = PlayerRecord>,
        tournaments: impl IntoIterator<Item = TournamentRecord>,
    ) -> Self {
        Self {
            players: players
                .into_iter()
                .map(|record| (record.username.to_lowercase(), record))
                .collect(),
            tournaments: tournaments
                .into_iter()
                .map(|record| (record.url.clone(), record))
                .collect(),
        }
    }

    /// Load a snapshot file, or a directory holding `players/*.json` and
    /// `tournaments/*.json` (the layout the worker writes with `--out`).
    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let snapshot = if tokio::fs::metadata(path)
            .await
            .map_err(|e| AppError::Internal(format!("{}: {e}", path.display())))?
            .is_dir()
        {
            Snapshot {
                players: read_dir_records(&path.join("players")).await?,
                tournaments: read_dir_records(&path.join("tournaments")).await?,
            }
        } else {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| AppError::Internal(format!("{}: {e}", path.display())))?;
            serde_json::from_slice(&bytes)?
        };

        info!(
            players = snapshot.players.len(),
            tournaments = snapshot.tournaments.len(),
            "Loaded records from {}",
            path.display()
        );
        Ok(Self::new(snapshot.players, snapshot.tournaments))
    }
}

async fn read_dir_records<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>, AppError> {
    let pattern = dir.join("*.json");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| AppError::Internal("Records path is not valid UTF-8".into()))?;
    let paths = glob::glob(pattern).map_err(|e| AppError::Internal(e.to_string()))?;

    let mut records = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| AppError::Internal(e.to_string()))?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(format!("{}: {e}", path.display())))?;
        records.push(serde_json::from_slice(&bytes)?);
    }
    Ok(records)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn player(&self, username: &str) -> Result<Option<PlayerRecord>, AppError> {
        Ok(self.players.get(&username.to_lowercase()).cloned())
    }

    async fn tournament(&self, url: &str) -> Result<Option<TournamentRecord>, AppError> {
        Ok(self.tournaments.get(url).cloned())
    }

    async fn tournaments(&self) -> Result<Vec<TournamentRecord>, AppError> {
        Ok(self.tournaments.values().cloned().collect())
    }

    async fn tournaments_for_player(
        &self,
        username: &str,
    ) -> Result<Vec<TournamentRecord>, AppError> {
        Ok(self
            .tournaments
            .values()
            .filter(|t| t.has_player(username))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::record::TournamentEntry;

    fn tournament(url: &str, players: &[&str]) -> TournamentRecord {
        TournamentRecord {
            url: url.into(),
            name: url.rsplit('/').next().unwrap_or(url).into(),
            players: players
                .iter()
                .map(|p| TournamentEntry { player: p.to_string(), rating: None })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_tournament_queries() {
        let store = MemoryStore::new(
            vec![],
            vec![
                tournament("https://x/tournament/b", &["Alice", "bob"]),
                tournament("https://x/tournament/a", &["carol"]),
            ],
        );

        let all = store.tournaments().await.unwrap();
        assert_eq!(all[0].url, "https://x/tournament/a");
        assert_eq!(all.len(), 2);

        let alice = store.tournaments_for_player("alice").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].name, "b");
        assert!(store.tournament("https://x/tournament/c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_file_loads() {
        let path = std::env::temp_dir().join(format!("snapshot-{}.json", std::process::id()));
        let json = serde_json::json!({
            "tournaments": [{"url": "https://x/t", "name": "t", "players": [{"player": "a", "rating": 1500}]}]
        });
        tokio::fs::write(&path, json.to_string()).await.unwrap();

        let store = MemoryStore::load(&path).await.unwrap();
        assert_eq!(store.tournaments().await.unwrap()[0].players[0].rating, Some(1500));
        assert!(store.player("a").await.unwrap().is_none());

        let _ = tokio::fs::remove_file(&path).await;
    }
}
