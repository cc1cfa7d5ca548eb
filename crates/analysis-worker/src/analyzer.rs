//! Per-player batch driver: game selection, engine sampling, both
//! classifiers and the profile aggregates, assembled into one record.

use chess_core::pgn::split_games;
use chess_core::profile::build_profile;
use chess_core::record::PlayerRecord;
use chess_core::Game;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::AnalysisSettings;
use crate::error::WorkerError;
use crate::evaluator::Evaluator;
use crate::features::{extract_game, BatchAccumulator, BatchSummary};
use crate::outcome::classify_outcomes;
use crate::utility::classify_utility;

/// Which games of an export are analyzed.
#[derive(Debug, Clone, Copy)]
pub struct GameSelection {
    pub max_games: usize,
    pub min_moves: u32,
}

/// Games kept from a PGN export, most recent first.
#[derive(Debug, Default)]
pub struct SelectedGames {
    pub games: Vec<Game>,
    /// Unparsable, non-standard, too short, or without the player.
    pub rejected: usize,
}

pub fn select_games(pgn_text: &str, username: &str, selection: GameSelection) -> SelectedGames {
    let mut selected = SelectedGames::default();

    for (index, text) in split_games(pgn_text).into_iter().enumerate() {
        let game = match Game::from_pgn(text) {
            Ok(game) => game,
            Err(e) => {
                debug!(player = username, game = index, reason = %e, "Game rejected");
                selected.rejected += 1;
                continue;
            }
        };
        if game.side_of(username).is_none() || game.move_count() < selection.min_moves {
            selected.rejected += 1;
            continue;
        }
        selected.games.push(game);
    }

    selected
        .games
        .sort_by(|a, b| b.metadata.played_at().cmp(&a.metadata.played_at()));
    if selected.games.len() > selection.max_games {
        selected.games.truncate(selection.max_games);
    }
    selected
}

#[derive(Debug, Clone)]
pub struct PlayerAnalysis {
    pub record: PlayerRecord,
    pub summary: BatchSummary,
}

/// Run the full analysis for one player on one engine.
///
/// A game that fails is skipped and counted; after an engine failure the
/// engine is recovered before the next game. Only a failed recovery aborts
/// the batch.
pub async fn analyze_games<E: Evaluator + ?Sized>(
    engine: &mut E,
    username: &str,
    games: &[Game],
    settings: &AnalysisSettings,
) -> Result<PlayerAnalysis, WorkerError> {
    let mut batch = BatchAccumulator::default();

    for (index, game) in games.iter().enumerate() {
        batch = match extract_game(engine, game, username, settings).await {
            Ok(contribution) => batch.absorb(contribution),
            Err(e) => {
                warn!(player = username, game = index, reason = %e, "Game skipped");
                if e.is_engine_failure() {
                    engine.recover().await?;
                }
                batch.skip()
            }
        };
    }

    let summary = batch.summary;
    info!(
        player = username,
        decisive = summary.decisive,
        drawn = summary.drawn,
        invalidated = summary.invalidated,
        skipped = summary.skipped,
        "Games sampled"
    );

    let plays_by_outcome = classify_outcomes(&batch.rows, settings);
    let plays_by_score = classify_utility(&batch.pools, settings);
    let profile = build_profile(username, games);

    Ok(PlayerAnalysis {
        record: PlayerRecord {
            username: username.to_string(),
            stats: profile.stats,
            openings_as_white: profile.openings_as_white,
            openings_as_black: profile.openings_as_black,
            expected_value_by_num_moves: profile.expected_value_by_num_moves,
            plays_by_outcome,
            plays_by_score,
            analyzed_at: Utc::now(),
        },
        summary,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chess_core::record::{CategoryResult, Classification};

    use super::*;
    use crate::evaluator::Evaluation;
    use crate::sampler::tests::{ScriptedEngine, SPECIAL_MOVES_PGN};

    fn dated(pgn: &str, date: &str) -> String {
        format!("[Event \"Live Chess\"]\n[Date \"{date}\"]\n{pgn}\n\n")
    }

    #[test]
    fn test_select_games_filters_and_orders() {
        let short = "[White \"Alice\"]\n[Black \"bob\"]\n[Result \"0-1\"]\n\n1. f3 e5 2. g4 Qh4# 0-1";
        let other = SPECIAL_MOVES_PGN.replace("Alice", "carol").replace("bob", "dave");
        let export = [
            dated(SPECIAL_MOVES_PGN, "2024.01.01"),
            dated(short, "2024.01.02"),
            dated(&other, "2024.01.03"),
            dated(SPECIAL_MOVES_PGN, "2024.03.01"),
            dated("[White \"Alice\"]\n[Result \"*\"]\n\n*", "2024.04.01"),
        ]
        .concat();

        let selection = GameSelection { max_games: 500, min_moves: 7 };
        let selected = select_games(&export, "alice", selection);
        assert_eq!(selected.games.len(), 2);
        assert_eq!(selected.rejected, 3);
        assert_eq!(selected.games[0].metadata.date.as_deref(), Some("2024.03.01"));

        let capped = select_games(&export, "alice", GameSelection { max_games: 1, ..selection });
        assert_eq!(capped.games.len(), 1);
        assert_eq!(capped.games[0].metadata.date.as_deref(), Some("2024.03.01"));
    }

    /// Fails every query until recovered once.
    struct FlakyEngine {
        inner: ScriptedEngine,
        broken: bool,
        recoveries: usize,
    }

    #[async_trait]
    impl Evaluator for FlakyEngine {
        async fn evaluate(&mut self, fen: &str, budget: Duration) -> Result<Evaluation, WorkerError> {
            if self.broken {
                return Err(WorkerError::EngineTimeout(budget));
            }
            self.inner.evaluate(fen, budget).await
        }

        async fn recover(&mut self) -> Result<(), WorkerError> {
            self.broken = false;
            self.recoveries += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_engine_failure_skips_game_and_recovers() {
        let game = Game::from_pgn(SPECIAL_MOVES_PGN).unwrap();
        let stranger = Game::from_pgn(&SPECIAL_MOVES_PGN.replace("Alice", "carol")).unwrap();
        let games = vec![game.clone(), stranger, game];

        let mut engine = FlakyEngine {
            inner: ScriptedEngine::new([-30, -10, 80, -40, 25, 20].map(Evaluation::Centipawns)),
            broken: true,
            recoveries: 0,
        };
        let analysis = analyze_games(&mut engine, "alice", &games, &AnalysisSettings::default())
            .await
            .unwrap();

        assert_eq!(engine.recoveries, 1);
        assert_eq!(analysis.summary.skipped, 2);
        assert_eq!(analysis.summary.decisive, 1);

        let record = &analysis.record;
        assert_eq!(record.username, "alice");
        assert_eq!(record.stats.games, 2);
        assert_eq!(record.stats.win, 2);
        assert_eq!(record.stats.rating, Some(1510));
        // One decisive game is far below the regression gate, and a single
        // sample is below the utility gate.
        assert_eq!(record.plays_by_outcome.player_castle, CategoryResult::Unavailable);
        assert_eq!(record.plays_by_score.player_en_passant, CategoryResult::Unavailable);
        assert_eq!(
            record.plays_by_score.player_castle.classification(),
            Classification::NotSignificant
        );
    }
}
