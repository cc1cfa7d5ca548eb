//! Player record persistence: Postgres upsert or JSON files.

use std::path::{Path, PathBuf};

use chess_core::record::PlayerRecord;
use sqlx::PgPool;

use crate::error::WorkerError;

const PLAYER_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS player_records (
    username TEXT PRIMARY KEY,
    record JSONB NOT NULL,
    analyzed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// Create the records table when the worker runs before the server has
/// migrated the database.
pub async fn ensure_player_table(pool: &PgPool) -> Result<(), WorkerError> {
    sqlx::raw_sql(PLAYER_TABLE_SQL).execute(pool).await?;
    Ok(())
}

/// Insert or replace a player's record. Usernames are keyed lowercase.
pub async fn save_player_record(pool: &PgPool, record: &PlayerRecord) -> Result<(), WorkerError> {
    let json = serde_json::to_value(record)?;

    sqlx::query(
        r#"INSERT INTO player_records (username, record, analyzed_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (username) DO UPDATE SET
            record = EXCLUDED.record,
            analyzed_at = EXCLUDED.analyzed_at"#,
    )
    .bind(record.username.to_lowercase())
    .bind(&json)
    .bind(record.analyzed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Write `<dir>/players/<username>.json`, the layout the server's file
/// store reads.
pub async fn write_record_file(dir: &Path, record: &PlayerRecord) -> Result<PathBuf, WorkerError> {
    let players = dir.join("players");
    tokio::fs::create_dir_all(&players).await?;

    let path = players.join(format!("{}.json", record.username.to_lowercase()));
    tokio::fs::write(&path, serde_json::to_vec_pretty(record)?).await?;
    Ok(path)
}
