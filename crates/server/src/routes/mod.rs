use axum::{routing::get, Extension, Router};

use crate::advisor::Advisor;

pub mod health;
pub mod strategies;
pub mod tournaments;

/// Every route, with the advisor shared as an extension.
pub fn router(advisor: Advisor) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Tournaments
        .route("/tournaments", get(tournaments::list_tournaments))
        .route("/tournaments/{tournament_id}/players", get(tournaments::get_tournament_players))
        .route("/players/{player_name}/tournaments", get(tournaments::get_player_tournaments))
        // Strategy advice
        .route(
            "/tournaments/{tournament_id}/recommended-strategies/{player_name}",
            get(strategies::get_recommended_strategies).post(strategies::post_recommended_strategies),
        )
        .route(
            "/recommended-strategies/{player_name}/{opponent_name}",
            get(strategies::get_opponent_report),
        )
        .route(
            "/tournaments/{tournament_id}/opponent-game-lengths/{player_name}",
            get(strategies::get_opponent_game_lengths).post(strategies::post_opponent_game_lengths),
        )
        .layer(Extension(advisor))
}
