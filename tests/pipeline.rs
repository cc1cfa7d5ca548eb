//! End to end: PGN exports through the worker into records on disk, then
//! served back through the advisor.

mod common;

use std::sync::Arc;

use analysis_worker::analyzer::{analyze_games, select_games, GameSelection};
use analysis_worker::config::AnalysisSettings;
use analysis_worker::db::write_record_file;
use chess_core::record::{CategoryResult, Classification};
use server::advisor::service::tournament_url;
use server::advisor::Advisor;
use server::store::{MemoryStore, RecordStore};

use common::{export, scratch_dir, FlatEngine};

const SELECTION: GameSelection = GameSelection { max_games: 100, min_moves: 5 };

async fn analyze(username: &str, pgn: &str, out: &std::path::Path) -> usize {
    let selected = select_games(pgn, username, SELECTION);
    let mut engine = FlatEngine::default();
    let analysis = analyze_games(&mut engine, username, &selected.games, &AnalysisSettings::default())
        .await
        .unwrap();
    write_record_file(out, &analysis.record).await.unwrap();
    engine.queries
}

#[tokio::test]
async fn test_records_written_by_worker_drive_recommendations() {
    let out = scratch_dir("pipeline-records");

    // hero scores 0.75 as White in the Sicilian
    let hero = export(&[
        ("hero", "x1", "1-0"),
        ("hero", "x2", "1-0"),
        ("hero", "x3", "0-1"),
        ("hero", "x4", "1-0"),
    ]);
    // rook scores 0.125 as Black, pawn 0.5
    let rook = export(&[
        ("y1", "rook", "1-0"),
        ("y2", "rook", "1-0"),
        ("y3", "rook", "1/2-1/2"),
        ("y4", "rook", "1-0"),
    ]);
    let pawn = export(&[
        ("z1", "pawn", "1-0"),
        ("z2", "pawn", "0-1"),
        ("z3", "pawn", "1-0"),
        ("z4", "pawn", "0-1"),
    ]);

    // One baseline after 4. O-O and one re-sample on move 7, per game
    assert_eq!(analyze("hero", &hero, &out).await, 8);
    analyze("rook", &rook, &out).await;
    analyze("pawn", &pawn, &out).await;

    let roster = serde_json::json!({
        "url": tournament_url("spring-open"),
        "name": "Spring Open",
        "players": [
            {"player": "hero", "rating": 1600},
            {"player": "rook", "rating": 1550},
            {"player": "pawn", "rating": 1500},
            {"player": "absent", "rating": null}
        ]
    });
    tokio::fs::create_dir_all(out.join("tournaments")).await.unwrap();
    tokio::fs::write(out.join("tournaments/spring-open.json"), roster.to_string())
        .await
        .unwrap();

    let store = MemoryStore::load(&out).await.unwrap();
    let record = store.player("HERO").await.unwrap().unwrap();
    assert_eq!(record.stats.games, 4);
    assert_eq!(record.stats.win, 3);
    assert_eq!(record.stats.rating, Some(1600));
    // Too few decisive games for the regression; flat engine gives zero deltas
    assert_eq!(record.plays_by_outcome.player_castle, CategoryResult::Unavailable);
    assert_eq!(
        record.plays_by_score.player_castle.classification(),
        Classification::NotSignificant
    );
    assert!(record.plays_by_score.player_castle.results_available());

    let advisor = Advisor::new(Arc::new(store), 3);
    let strategies = advisor
        .recommended_strategies("spring-open", "hero", None)
        .await
        .unwrap();
    assert!(strategies.recommended_black.is_empty());
    let sicilian = &strategies.recommended_white[0];
    assert_eq!(sicilian.opening, "Sicilian Defense");
    assert!((sicilian.difference - 0.4375).abs() < 1e-9);
    // t ≈ 2.33 with one degree of freedom
    assert!((sicilian.confidence - 0.8711).abs() < 1e-3);

    let report = advisor.opponent_report("hero", "rook").await.unwrap();
    assert_eq!(report.username, "rook");
    assert_eq!(report.stats.draw, 1);
    let row = &report.recommendations.recommended_white[0];
    assert!((row.difference - 0.625).abs() < 1e-9);
    assert!((row.confidence - 0.9626).abs() < 1e-3);
    // Every game has the same length: too few buckets for a curve
    assert!(report.player_smoothed_values.is_empty());

    let curve = advisor
        .opponent_game_lengths("spring-open", "hero", None)
        .await
        .unwrap();
    assert!(curve.is_empty());

    let _ = tokio::fs::remove_dir_all(&out).await;
}

#[tokio::test]
async fn test_unknown_names_surface_as_errors() {
    let advisor = Advisor::new(Arc::new(MemoryStore::default()), 3);
    let err = advisor
        .recommended_strategies("missing", "hero", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Tournament not found.");
}
