use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::advisor::{Advisor, CurvePoint, OpponentReport, Recommendations};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct OpponentsQuery {
    /// Comma-separated usernames
    pub opponents: Option<String>,
}

impl OpponentsQuery {
    fn into_list(self) -> Option<Vec<String>> {
        self.opponents
            .map(|list| list.split(',').map(|name| name.trim().to_string()).collect())
    }
}

/// Read `{"opponent_list": [...]}` from a POST body.
fn opponent_list_from_body(body: &JsonValue) -> Result<Vec<String>, AppError> {
    let list = body
        .get("opponent_list")
        .ok_or_else(|| AppError::BadRequest("Missing opponent list in the request body".into()))?;
    let names = list
        .as_array()
        .ok_or_else(|| AppError::BadRequest("Opponent list must be an array".into()))?;

    names
        .iter()
        .map(|name| {
            name.as_str()
                .map(str::to_string)
                .ok_or_else(|| AppError::BadRequest("Opponent names must be strings".into()))
        })
        .collect()
}

/// GET /tournaments/{tournament_id}/recommended-strategies/{player_name}
/// Opponents default to the rest of the roster; `?opponents=a,b` overrides.
pub async fn get_recommended_strategies(
    Extension(advisor): Extension<Advisor>,
    Path((tournament_id, player_name)): Path<(String, String)>,
    Query(query): Query<OpponentsQuery>,
) -> Result<Json<Recommendations>, AppError> {
    let strategies = advisor
        .recommended_strategies(&tournament_id, &player_name, query.into_list())
        .await?;
    Ok(Json(strategies))
}

/// POST /tournaments/{tournament_id}/recommended-strategies/{player_name}
pub async fn post_recommended_strategies(
    Extension(advisor): Extension<Advisor>,
    Path((tournament_id, player_name)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> Result<Json<Recommendations>, AppError> {
    let opponents = opponent_list_from_body(&body)?;
    let strategies = advisor
        .recommended_strategies(&tournament_id, &player_name, Some(opponents))
        .await?;
    Ok(Json(strategies))
}

/// GET /recommended-strategies/{player_name}/{opponent_name}
/// Drill-down on a single opponent.
pub async fn get_opponent_report(
    Extension(advisor): Extension<Advisor>,
    Path((player_name, opponent_name)): Path<(String, String)>,
) -> Result<Json<OpponentReport>, AppError> {
    let report = advisor.opponent_report(&player_name, &opponent_name).await?;
    Ok(Json(report))
}

/// GET /tournaments/{tournament_id}/opponent-game-lengths/{player_name}
pub async fn get_opponent_game_lengths(
    Extension(advisor): Extension<Advisor>,
    Path((tournament_id, player_name)): Path<(String, String)>,
) -> Result<Json<Vec<CurvePoint>>, AppError> {
    let curve = advisor
        .opponent_game_lengths(&tournament_id, &player_name, None)
        .await?;
    Ok(Json(curve))
}

/// POST /tournaments/{tournament_id}/opponent-game-lengths/{player_name}
pub async fn post_opponent_game_lengths(
    Extension(advisor): Extension<Advisor>,
    Path((tournament_id, player_name)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> Result<Json<Vec<CurvePoint>>, AppError> {
    let opponents = opponent_list_from_body(&body)?;
    let curve = advisor
        .opponent_game_lengths(&tournament_id, &player_name, Some(opponents))
        .await?;
    Ok(Json(curve))
}
