//! Drill-down view of one opponent.

use chess_core::record::{Classification, MoveAnalysis, PlayerRecord, PlayerStats};
use serde::Serialize;

use super::comparator::{compare_single_opponent, Recommendations};
use super::curve::{CurvePoint, CurveSmoother};

/// How the opponent fares with special moves, phrased from the opponent's
/// side: `using_*` is their own play, `against_*` is facing the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpecialMoveProfile {
    pub using_castling: Classification,
    pub using_en_passant: Classification,
    pub against_castling: Classification,
    pub against_en_passant: Classification,
}

impl From<&MoveAnalysis> for SpecialMoveProfile {
    fn from(analysis: &MoveAnalysis) -> Self {
        // Labels on the opponents' moves describe the analyzed player's side;
        // seen from that player they are inverted.
        Self {
            using_castling: analysis.player_castle.classification(),
            using_en_passant: analysis.player_en_passant.classification(),
            against_castling: analysis.opponents_castle.classification().inverted(),
            against_en_passant: analysis.opponents_en_passant.classification().inverted(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentReport {
    pub username: String,
    #[serde(flatten)]
    pub stats: PlayerStats,
    pub move_analysis: SpecialMoveProfile,
    #[serde(flatten)]
    pub recommendations: Recommendations,
    pub player_smoothed_values: Vec<CurvePoint>,
    pub opponent_smoothed_values: Vec<CurvePoint>,
}

pub fn build_opponent_report(
    player: &PlayerRecord,
    opponent: &PlayerRecord,
    min_games: u32,
) -> OpponentReport {
    let smoother = CurveSmoother::default();
    OpponentReport {
        username: opponent.username.clone(),
        stats: opponent.stats.clone(),
        move_analysis: SpecialMoveProfile::from(&opponent.plays_by_score),
        recommendations: compare_single_opponent(player, opponent, min_games),
        player_smoothed_values: smoother.smooth(&player.expected_value_by_num_moves),
        opponent_smoothed_values: smoother.smooth(&opponent.expected_value_by_num_moves),
    }
}

#[cfg(test)]
mod tests {
    use chess_core::record::{CategoryResult, EffectStatistic, SignificanceTest};

    use super::*;

    fn tested(classification: Classification) -> CategoryResult {
        CategoryResult::Tested(SignificanceTest {
            classification,
            effect: EffectStatistic::Mean(1.0),
            p_value: 0.01,
        })
    }

    #[test]
    fn test_against_labels_are_inverted() {
        let analysis = MoveAnalysis {
            player_castle: tested(Classification::Strength),
            player_en_passant: CategoryResult::Unavailable,
            opponents_castle: tested(Classification::Strength),
            opponents_en_passant: tested(Classification::Weakness),
        };
        let profile = SpecialMoveProfile::from(&analysis);
        assert_eq!(profile.using_castling, Classification::Strength);
        assert_eq!(profile.using_en_passant, Classification::NotSignificant);
        assert_eq!(profile.against_castling, Classification::Weakness);
        assert_eq!(profile.against_en_passant, Classification::Strength);

        let json = serde_json::to_value(profile).unwrap();
        assert_eq!(json["using_en_passant"], "Not-significant");
    }
}
