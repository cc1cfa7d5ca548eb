use chess_core::record::{TournamentEntry, TournamentRecord};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::error::AppError;

fn to_record((url, name, players): (String, String, JsonValue)) -> Result<TournamentRecord, AppError> {
    let players: Vec<TournamentEntry> = serde_json::from_value(players)?;
    Ok(TournamentRecord { url, name, players })
}

pub async fn get_tournament(pool: &PgPool, url: &str) -> Result<Option<TournamentRecord>, AppError> {
    let row = sqlx::query_as::<_, (String, String, JsonValue)>(
        "SELECT url, name, players FROM tournaments WHERE url = $1",
    )
    .bind(url)
    .fetch_optional(pool)
    .await?;

    row.map(to_record).transpose()
}

pub async fn list_tournaments(pool: &PgPool) -> Result<Vec<TournamentRecord>, AppError> {
    let rows = sqlx::query_as::<_, (String, String, JsonValue)>(
        "SELECT url, name, players FROM tournaments ORDER BY url",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(to_record).collect()
}

/// Tournaments whose roster contains `username` (case-insensitive).
pub async fn tournaments_for_player(
    pool: &PgPool,
    username: &str,
) -> Result<Vec<TournamentRecord>, AppError> {
    let rows = sqlx::query_as::<_, (String, String, JsonValue)>(
        r#"
        SELECT url, name, players
        FROM tournaments t
        WHERE EXISTS (
            SELECT 1 FROM jsonb_array_elements(t.players) AS p
            WHERE LOWER(p->>'player') = LOWER($1)
        )
        ORDER BY url
        "#,
    )
    .bind(username)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(to_record).collect()
}
