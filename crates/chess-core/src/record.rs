//! Persisted per-player and per-tournament records.
//!
//! These are written by the ingestion worker and read back by the server, so
//! every type here round-trips through JSON.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Special-move category tracked by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveCategory {
    Castle,
    EnPassant,
}

impl MoveCategory {
    pub const ALL: [MoveCategory; 2] = [MoveCategory::Castle, MoveCategory::EnPassant];

    pub fn index(self) -> usize {
        match self {
            MoveCategory::Castle => 0,
            MoveCategory::EnPassant => 1,
        }
    }
}

/// Whose special moves a classification is about, relative to the analyzed player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    Player,
    Opponents,
}

impl Perspective {
    pub const ALL: [Perspective; 2] = [Perspective::Player, Perspective::Opponents];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Strength,
    Weakness,
    #[serde(rename = "Not-significant")]
    NotSignificant,
}

impl Classification {
    /// Swap Strength and Weakness; used when a label describes the other side.
    pub fn inverted(self) -> Self {
        match self {
            Classification::Strength => Classification::Weakness,
            Classification::Weakness => Classification::Strength,
            Classification::NotSignificant => Classification::NotSignificant,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Classification::Strength => "Strength",
            Classification::Weakness => "Weakness",
            Classification::NotSignificant => "Not-significant",
        })
    }
}

/// Signed effect statistic behind a classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectStatistic {
    /// Logistic regression coefficient of the category indicator.
    Coefficient(f64),
    /// Mean centipawn delta across the category's samples.
    Mean(f64),
}

impl EffectStatistic {
    pub fn value(self) -> f64 {
        match self {
            EffectStatistic::Coefficient(v) | EffectStatistic::Mean(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificanceTest {
    pub classification: Classification,
    pub effect: EffectStatistic,
    pub p_value: f64,
}

/// Outcome of testing one (perspective, category) pair. `Unavailable` means
/// there was too little data to run the test at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "ClassificationWire", try_from = "ClassificationWire")]
pub enum CategoryResult {
    Unavailable,
    Tested(SignificanceTest),
}

impl CategoryResult {
    pub fn results_available(&self) -> bool {
        matches!(self, CategoryResult::Tested(_))
    }

    pub fn classification(&self) -> Classification {
        match self {
            CategoryResult::Unavailable => Classification::NotSignificant,
            CategoryResult::Tested(test) => test.classification,
        }
    }

    pub fn test(&self) -> Option<&SignificanceTest> {
        match self {
            CategoryResult::Unavailable => None,
            CategoryResult::Tested(test) => Some(test),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ClassificationWire {
    results_available: bool,
    classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    analysis: Option<AnalysisWire>,
}

#[derive(Serialize, Deserialize)]
struct AnalysisWire {
    #[serde(flatten)]
    effect: EffectStatistic,
    p_value: f64,
}

impl From<CategoryResult> for ClassificationWire {
    fn from(result: CategoryResult) -> Self {
        match result {
            CategoryResult::Unavailable => Self {
                results_available: false,
                classification: Classification::NotSignificant,
                analysis: None,
            },
            CategoryResult::Tested(test) => Self {
                results_available: true,
                classification: test.classification,
                analysis: Some(AnalysisWire {
                    effect: test.effect,
                    p_value: test.p_value,
                }),
            },
        }
    }
}

impl TryFrom<ClassificationWire> for CategoryResult {
    type Error = String;

    fn try_from(wire: ClassificationWire) -> Result<Self, Self::Error> {
        match (wire.results_available, wire.analysis) {
            (true, Some(analysis)) => Ok(CategoryResult::Tested(SignificanceTest {
                classification: wire.classification,
                effect: analysis.effect,
                p_value: analysis.p_value,
            })),
            (true, None) => Err("results_available is set but analysis is missing".into()),
            (false, _) => Ok(CategoryResult::Unavailable),
        }
    }
}

/// One classification per (perspective, category).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveAnalysis {
    pub player_castle: CategoryResult,
    pub player_en_passant: CategoryResult,
    pub opponents_castle: CategoryResult,
    pub opponents_en_passant: CategoryResult,
}

impl MoveAnalysis {
    pub fn unavailable() -> Self {
        Self {
            player_castle: CategoryResult::Unavailable,
            player_en_passant: CategoryResult::Unavailable,
            opponents_castle: CategoryResult::Unavailable,
            opponents_en_passant: CategoryResult::Unavailable,
        }
    }

    pub fn get(&self, perspective: Perspective, category: MoveCategory) -> &CategoryResult {
        match (perspective, category) {
            (Perspective::Player, MoveCategory::Castle) => &self.player_castle,
            (Perspective::Player, MoveCategory::EnPassant) => &self.player_en_passant,
            (Perspective::Opponents, MoveCategory::Castle) => &self.opponents_castle,
            (Perspective::Opponents, MoveCategory::EnPassant) => &self.opponents_en_passant,
        }
    }

    pub fn get_mut(
        &mut self,
        perspective: Perspective,
        category: MoveCategory,
    ) -> &mut CategoryResult {
        match (perspective, category) {
            (Perspective::Player, MoveCategory::Castle) => &mut self.player_castle,
            (Perspective::Player, MoveCategory::EnPassant) => &mut self.player_en_passant,
            (Perspective::Opponents, MoveCategory::Castle) => &mut self.opponents_castle,
            (Perspective::Opponents, MoveCategory::EnPassant) => &mut self.opponents_en_passant,
        }
    }

    /// True when at least one category was tested.
    pub fn any_available(&self) -> bool {
        Perspective::ALL.iter().any(|&p| {
            MoveCategory::ALL
                .iter()
                .any(|&c| self.get(p, c).results_available())
        })
    }
}

impl Default for MoveAnalysis {
    fn default() -> Self {
        Self::unavailable()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningStatistic {
    pub opening: String,
    /// Share of the player's games with this color that used this opening.
    pub frequency: f64,
    pub expected_value: f64,
    pub games: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvBucket {
    pub expected_value: f64,
    pub games: u32,
}

/// Mean score keyed by game length in full moves.
pub type EvByMoveCount = BTreeMap<u32, EvBucket>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub rating: Option<i32>,
    pub win: u32,
    pub loss: u32,
    pub draw: u32,
    pub games: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub username: String,
    pub stats: PlayerStats,
    pub openings_as_white: Vec<OpeningStatistic>,
    pub openings_as_black: Vec<OpeningStatistic>,
    pub expected_value_by_num_moves: EvByMoveCount,
    pub plays_by_outcome: MoveAnalysis,
    pub plays_by_score: MoveAnalysis,
    pub analyzed_at: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn openings_as(&self, side: crate::game::Side) -> &[OpeningStatistic] {
        match side {
            crate::game::Side::White => &self.openings_as_white,
            crate::game::Side::Black => &self.openings_as_black,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentEntry {
    pub player: String,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub url: String,
    pub name: String,
    pub players: Vec<TournamentEntry>,
}

impl TournamentRecord {
    pub fn has_player(&self, username: &str) -> bool {
        self.players
            .iter()
            .any(|entry| entry.player.eq_ignore_ascii_case(username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_serializes_without_statistics() {
        let json = serde_json::to_value(CategoryResult::Unavailable).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"results_available": false, "classification": "Not-significant"})
        );
        let back: CategoryResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, CategoryResult::Unavailable);
        assert_eq!(back.classification(), Classification::NotSignificant);
        assert!(back.test().is_none());
    }

    #[test]
    fn tested_result_keeps_effect_kind() {
        let result = CategoryResult::Tested(SignificanceTest {
            classification: Classification::Weakness,
            effect: EffectStatistic::Coefficient(-1.25),
            p_value: 0.02,
        });
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["analysis"]["coefficient"], -1.25);
        assert_eq!(json["analysis"]["p_value"], 0.02);
        assert_eq!(json["classification"], "Weakness");

        let back: CategoryResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn available_result_without_analysis_is_rejected() {
        let json = serde_json::json!({"results_available": true, "classification": "Strength"});
        let err = serde_json::from_value::<CategoryResult>(json).unwrap_err();
        assert!(err.to_string().contains("analysis is missing"));
    }

    #[test]
    fn ev_map_keys_survive_json() {
        let mut buckets = EvByMoveCount::new();
        buckets.insert(12, EvBucket { expected_value: 0.5, games: 4 });
        let json = serde_json::to_string(&buckets).unwrap();
        let back: EvByMoveCount = serde_json::from_str(&json).unwrap();
        assert_eq!(back[&12].games, 4);
    }

    #[test]
    fn inverted_swaps_only_significant_labels() {
        assert_eq!(Classification::Strength.inverted(), Classification::Weakness);
        assert_eq!(Classification::Weakness.inverted(), Classification::Strength);
        assert_eq!(
            Classification::NotSignificant.inverted(),
            Classification::NotSignificant
        );
    }
}
