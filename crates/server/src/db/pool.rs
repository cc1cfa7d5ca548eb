use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run the full Postgres schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Analyzed player records (written by the analysis worker)
CREATE TABLE IF NOT EXISTS player_records (
    username    TEXT PRIMARY KEY,
    record      JSONB NOT NULL,
    analyzed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Tournament rosters
CREATE TABLE IF NOT EXISTS tournaments (
    url     TEXT PRIMARY KEY,
    name    TEXT NOT NULL,
    players JSONB NOT NULL DEFAULT '[]'::jsonb
);

CREATE INDEX IF NOT EXISTS idx_tournaments_players
    ON tournaments USING GIN (players jsonb_path_ops);
"#;
