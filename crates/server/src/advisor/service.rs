//! Request-level orchestration over the record store.

use chess_core::record::{PlayerRecord, TournamentRecord};
use tracing::info;

use super::comparator::{compare_multi_opponent, Recommendations};
use super::curve::{pool_buckets, CurvePoint, CurveSmoother};
use super::report::{build_opponent_report, OpponentReport};
use crate::error::AppError;
use crate::store::SharedStore;

const TOURNAMENT_URL_PREFIX: &str = "https://www.chess.com/tournament/";

/// Smoothing for the pooled opponent game-length curve.
const COHORT_SMOOTHING: f64 = 1.0;

/// Expand a bare tournament id to its full URL.
pub fn tournament_url(tournament_id: &str) -> String {
    if tournament_id.contains("://") {
        tournament_id.to_string()
    } else {
        format!("{TOURNAMENT_URL_PREFIX}{tournament_id}")
    }
}

/// Reject empty lists and blank names.
pub fn validate_opponent_list(opponents: &[String]) -> Result<(), AppError> {
    if opponents.is_empty() || opponents.iter().any(|name| name.trim().is_empty()) {
        return Err(AppError::BadRequest("Invalid opponent list provided".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct Advisor {
    store: SharedStore,
    min_games: u32,
}

impl Advisor {
    pub fn new(store: SharedStore, min_games: u32) -> Self {
        Self { store, min_games }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub async fn tournament(&self, tournament_id: &str) -> Result<TournamentRecord, AppError> {
        self.store
            .tournament(&tournament_url(tournament_id))
            .await?
            .ok_or_else(|| AppError::NotFound("Tournament not found.".into()))
    }

    async fn player(&self, username: &str) -> Result<PlayerRecord, AppError> {
        self.store
            .player(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Player data not found: {username}")))
    }

    /// The custom list when given, otherwise everyone else on the roster.
    async fn opponent_names(
        &self,
        tournament_id: &str,
        player: &str,
        custom: Option<Vec<String>>,
    ) -> Result<Vec<String>, AppError> {
        let tournament = self.tournament(tournament_id).await?;
        match custom {
            Some(list) => {
                validate_opponent_list(&list)?;
                Ok(list)
            }
            None => Ok(tournament
                .players
                .into_iter()
                .map(|entry| entry.player)
                .filter(|name| !name.eq_ignore_ascii_case(player))
                .collect()),
        }
    }

    /// Records of the named opponents; names without a record are skipped.
    async fn opponent_records(&self, names: &[String]) -> Result<Vec<PlayerRecord>, AppError> {
        let mut records = Vec::with_capacity(names.len());
        for name in names {
            match self.store.player(name).await? {
                Some(record) => records.push(record),
                None => info!(opponent = %name, "No record for opponent, skipped"),
            }
        }
        Ok(records)
    }

    pub async fn recommended_strategies(
        &self,
        tournament_id: &str,
        player: &str,
        custom: Option<Vec<String>>,
    ) -> Result<Recommendations, AppError> {
        let names = self.opponent_names(tournament_id, player, custom).await?;
        let player = self.player(player).await?;
        let opponents = self.opponent_records(&names).await?;
        Ok(compare_multi_opponent(&player, &opponents, self.min_games))
    }

    pub async fn opponent_report(&self, player: &str, opponent: &str) -> Result<OpponentReport, AppError> {
        let opponent = self.player(opponent).await?;
        let player = self.player(player).await?;
        Ok(build_opponent_report(&player, &opponent, self.min_games))
    }

    /// Pooled game-length curve of the opponents.
    pub async fn opponent_game_lengths(
        &self,
        tournament_id: &str,
        player: &str,
        custom: Option<Vec<String>>,
    ) -> Result<Vec<CurvePoint>, AppError> {
        let names = self.opponent_names(tournament_id, player, custom).await?;
        let opponents = self.opponent_records(&names).await?;
        let pooled = pool_buckets(opponents.iter().map(|o| &o.expected_value_by_num_moves));
        Ok(CurveSmoother::with_smoothing(COHORT_SMOOTHING).smooth(&pooled))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chess_core::record::{MoveAnalysis, OpeningStatistic, PlayerStats, TournamentEntry};
    use chrono::Utc;

    use super::*;
    use crate::store::MemoryStore;

    fn player(name: &str, black_ev: f64) -> PlayerRecord {
        let opening = |expected_value| OpeningStatistic {
            opening: "Sicilian".into(),
            frequency: 1.0,
            expected_value,
            games: 10,
        };
        PlayerRecord {
            username: name.into(),
            stats: PlayerStats::default(),
            openings_as_white: vec![opening(0.7)],
            openings_as_black: vec![opening(black_ev)],
            expected_value_by_num_moves: Default::default(),
            plays_by_outcome: MoveAnalysis::unavailable(),
            plays_by_score: MoveAnalysis::unavailable(),
            analyzed_at: Utc::now(),
        }
    }

    fn advisor() -> Advisor {
        let roster = ["Hero", "a", "b", "ghost"]
            .iter()
            .map(|p| TournamentEntry { player: p.to_string(), rating: Some(1500) })
            .collect();
        let store = MemoryStore::new(
            vec![player("hero", 0.5), player("A", 0.4), player("b", 0.45)],
            vec![TournamentRecord {
                url: tournament_url("spring-open"),
                name: "Spring Open".into(),
                players: roster,
            }],
        );
        Advisor::new(Arc::new(store), 3)
    }

    #[test]
    fn test_tournament_url_expansion() {
        assert_eq!(tournament_url("abc"), "https://www.chess.com/tournament/abc");
        assert_eq!(tournament_url("https://x.org/t/1"), "https://x.org/t/1");
    }

    #[tokio::test]
    async fn test_roster_opponents_exclude_player_and_skip_missing() {
        let strategies = advisor()
            .recommended_strategies("spring-open", "HERO", None)
            .await
            .unwrap();
        let white = &strategies.recommended_white;
        assert_eq!(white.len(), 1);
        assert!((white[0].difference - 0.275).abs() < 1e-12);
        assert!((white[0].confidence - 0.971_14).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_errors_are_distinguishable() {
        let advisor = advisor();
        assert!(matches!(
            advisor.recommended_strategies("nope", "hero", None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            advisor.recommended_strategies("spring-open", "nobody", None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            advisor
                .recommended_strategies("spring-open", "hero", Some(vec!["a".into(), "".into()]))
                .await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            advisor.opponent_report("hero", "ghost").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_list_and_short_history_curve() {
        let advisor = advisor();
        let strategies = advisor
            .recommended_strategies("spring-open", "hero", Some(vec!["b".into()]))
            .await
            .unwrap();
        assert_eq!(strategies.recommended_white[0].confidence, 0.5);

        let curve = advisor
            .opponent_game_lengths("spring-open", "hero", None)
            .await
            .unwrap();
        assert!(curve.is_empty());
    }
}
