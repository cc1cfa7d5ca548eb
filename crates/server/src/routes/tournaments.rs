use axum::{extract::Path, Extension, Json};
use chess_core::record::{TournamentEntry, TournamentRecord};
use serde::Serialize;

use crate::advisor::Advisor;
use crate::error::AppError;

#[derive(Serialize)]
pub struct TournamentSummary {
    pub name: String,
    pub url: String,
}

impl From<TournamentRecord> for TournamentSummary {
    fn from(t: TournamentRecord) -> Self {
        Self { name: t.name, url: t.url }
    }
}

#[derive(Serialize)]
pub struct TournamentPlayersResponse {
    pub name: String,
    pub url: String,
    pub players: Vec<TournamentEntry>,
}

/// GET /tournaments
pub async fn list_tournaments(
    Extension(advisor): Extension<Advisor>,
) -> Result<Json<Vec<TournamentSummary>>, AppError> {
    let tournaments = advisor.store().tournaments().await?;
    Ok(Json(tournaments.into_iter().map(TournamentSummary::from).collect()))
}

/// GET /tournaments/{tournament_id}/players
/// Roster sorted by username.
pub async fn get_tournament_players(
    Extension(advisor): Extension<Advisor>,
    Path(tournament_id): Path<String>,
) -> Result<Json<TournamentPlayersResponse>, AppError> {
    let mut tournament = advisor.tournament(&tournament_id).await?;
    tournament.players.sort_by(|a, b| a.player.cmp(&b.player));

    Ok(Json(TournamentPlayersResponse {
        name: tournament.name,
        url: tournament.url,
        players: tournament.players,
    }))
}

/// GET /players/{player_name}/tournaments
pub async fn get_player_tournaments(
    Extension(advisor): Extension<Advisor>,
    Path(player_name): Path<String>,
) -> Result<Json<Vec<TournamentSummary>>, AppError> {
    let tournaments = advisor.store().tournaments_for_player(&player_name).await?;
    Ok(Json(tournaments.into_iter().map(TournamentSummary::from).collect()))
}
