use chess_core::record::PlayerRecord;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::error::AppError;

/// Look up a player's analyzed record. Usernames are stored lowercase.
pub async fn get_player(pool: &PgPool, username: &str) -> Result<Option<PlayerRecord>, AppError> {
    let row = sqlx::query_scalar::<_, JsonValue>(
        "SELECT record FROM player_records WHERE username = LOWER($1)",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(serde_json::from_value).transpose()?)
}
