//! Opening comparison between a player and one or more opponents.
//!
//! Both modes pair the player's openings as one color with the opponents'
//! openings as the opposite color: what the player does as White meets what
//! the opponents do as Black.

use std::collections::HashMap;

use chess_core::record::{OpeningStatistic, PlayerRecord};
use chess_core::Side;
use serde::Serialize;
use strategy_stats::descriptive::{mean, sample_variance};
use strategy_stats::distribution::{normal_cdf, student_t_cdf};

/// Guards the t statistic against a zero standard deviation.
const T_EPSILON: f64 = 1e-9;
/// Confidence reported when a single observation leaves no variance.
const NEUTRAL_CONFIDENCE: f64 = 0.5;
const CONFIDENCE_CEILING: f64 = 0.99;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRow {
    pub opening: String,
    /// Player expected value minus the opponents' expected value.
    pub difference: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub recommended_white: Vec<RecommendationRow>,
    pub recommended_black: Vec<RecommendationRow>,
}

fn eligible(openings: &[OpeningStatistic], min_games: u32) -> impl Iterator<Item = &OpeningStatistic> {
    openings.iter().filter(move |o| o.games >= min_games)
}

fn sort_by_difference(rows: &mut [RecommendationRow]) {
    rows.sort_by(|a, b| b.difference.total_cmp(&a.difference));
}

fn per_color(mut rows_for: impl FnMut(Side) -> Vec<RecommendationRow>) -> Recommendations {
    Recommendations {
        recommended_white: rows_for(Side::White),
        recommended_black: rows_for(Side::Black),
    }
}

/// Two-proportion z-test per opening both players use.
pub fn compare_single_opponent(
    player: &PlayerRecord,
    opponent: &PlayerRecord,
    min_games: u32,
) -> Recommendations {
    per_color(|side| {
        single_opponent_rows(
            player.openings_as(side),
            opponent.openings_as(side.opponent()),
            min_games,
        )
    })
}

fn single_opponent_rows(
    player: &[OpeningStatistic],
    opponent: &[OpeningStatistic],
    min_games: u32,
) -> Vec<RecommendationRow> {
    let opponent: HashMap<&str, &OpeningStatistic> = eligible(opponent, min_games)
        .map(|o| (o.opening.as_str(), o))
        .collect();

    let mut rows: Vec<RecommendationRow> = eligible(player, min_games)
        .filter_map(|mine| {
            let theirs = opponent.get(mine.opening.as_str())?;
            let (n_p, n_o) = (f64::from(mine.games), f64::from(theirs.games));
            let difference = mine.expected_value - theirs.expected_value;

            let pooled = (mine.expected_value * n_p + theirs.expected_value * n_o) / (n_p + n_o);
            let z = difference.abs() / (pooled * (1.0 - pooled) * (1.0 / n_p + 1.0 / n_o)).sqrt();
            let confidence = normal_cdf(z);

            Some(RecommendationRow {
                opening: mine.opening.clone(),
                difference,
                confidence: if confidence.is_nan() { 0.0 } else { confidence },
            })
        })
        .collect();

    sort_by_difference(&mut rows);
    rows
}

/// One-sample t-test of the player's edge over each opponent, per opening.
pub fn compare_multi_opponent(
    player: &PlayerRecord,
    opponents: &[PlayerRecord],
    min_games: u32,
) -> Recommendations {
    per_color(|side| {
        let opposing: Vec<&[OpeningStatistic]> = opponents
            .iter()
            .map(|o| o.openings_as(side.opponent()))
            .collect();
        multi_opponent_rows(player.openings_as(side), &opposing, min_games)
    })
}

fn multi_opponent_rows(
    player: &[OpeningStatistic],
    opponents: &[&[OpeningStatistic]],
    min_games: u32,
) -> Vec<RecommendationRow> {
    let mut rows: Vec<RecommendationRow> = eligible(player, min_games)
        .filter_map(|mine| {
            let opponent_evs: Vec<f64> = opponents
                .iter()
                .flat_map(|openings| eligible(openings, min_games))
                .filter(|o| o.opening == mine.opening)
                .map(|o| o.expected_value)
                .collect();
            let opponent_mean = mean(&opponent_evs)?;

            let diffs: Vec<f64> = opponent_evs
                .iter()
                .map(|ev| mine.expected_value - ev)
                .collect();

            Some(RecommendationRow {
                opening: mine.opening.clone(),
                difference: mine.expected_value - opponent_mean,
                confidence: paired_confidence(&diffs),
            })
        })
        .collect();

    sort_by_difference(&mut rows);
    rows
}

/// `1 - p` for the one-sided test in the direction of the mean difference.
fn paired_confidence(diffs: &[f64]) -> f64 {
    let (Some(mean_diff), Some(variance)) = (mean(diffs), sample_variance(diffs)) else {
        return NEUTRAL_CONFIDENCE;
    };
    let n = diffs.len() as f64;
    let t = mean_diff * n.sqrt() / (variance.sqrt() + T_EPSILON);
    let df = n - 1.0;

    let p_value = if t > 0.0 {
        1.0 - student_t_cdf(t, df)
    } else if t < 0.0 {
        student_t_cdf(t, df)
    } else {
        0.5
    };

    let confidence = 1.0 - p_value;
    if confidence >= 0.995 {
        CONFIDENCE_CEILING
    } else {
        confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening(name: &str, expected_value: f64, games: u32) -> OpeningStatistic {
        OpeningStatistic {
            opening: name.into(),
            frequency: 0.0,
            expected_value,
            games,
        }
    }

    #[test]
    fn test_multi_opponent_t_branch() {
        let player = [opening("A", 0.70, 10)];
        let first = [opening("A", 0.40, 6)];
        let second = [opening("A", 0.45, 8)];

        let rows = multi_opponent_rows(&player, &[&first, &second], 3);
        assert_eq!(rows.len(), 1);
        assert!((rows[0].difference - 0.275).abs() < 1e-12);
        // t ≈ 11 with one degree of freedom
        assert!((rows[0].confidence - 0.971_14).abs() < 1e-4);
    }

    #[test]
    fn test_multi_opponent_edge_cases() {
        let player = [
            opening("Single", 0.6, 5),
            opening("Missing", 0.9, 5),
            opening("Rare", 0.9, 2),
            opening("Sure", 0.9, 5),
        ];
        let opponents = [
            vec![opening("Single", 0.3, 5), opening("Sure", 0.1, 5), opening("Missing", 0.1, 1)],
            vec![opening("Sure", 0.1, 9)],
        ];
        let opponents: Vec<&[OpeningStatistic]> = opponents.iter().map(Vec::as_slice).collect();

        let rows = multi_opponent_rows(&player, &opponents, 3);
        let names: Vec<&str> = rows.iter().map(|r| r.opening.as_str()).collect();
        assert_eq!(names, ["Sure", "Single"]);

        // Identical differences: zero variance, t huge, capped
        assert_eq!(rows[0].confidence, 0.99);
        assert_eq!(rows[1].confidence, 0.5);
        for row in &rows {
            assert!((0.0..=0.99).contains(&row.confidence));
        }
    }

    #[test]
    fn test_multi_opponent_zero_t_is_neutral() {
        let player = [opening("A", 0.5, 5)];
        let a = [opening("A", 0.4, 5)];
        let b = [opening("A", 0.6, 5)];
        let rows = multi_opponent_rows(&player, &[&a, &b], 3);
        assert!(rows[0].difference.abs() < 1e-12);
        assert!((rows[0].confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_single_opponent_inner_join_and_order() {
        let player = [
            opening("A", 0.8, 20),
            opening("B", 0.4, 10),
            opening("OnlyMine", 0.9, 10),
        ];
        let opponent = [opening("A", 0.5, 20), opening("B", 0.6, 10), opening("OnlyTheirs", 0.1, 10)];

        let rows = single_opponent_rows(&player, &opponent, 3);
        let names: Vec<&str> = rows.iter().map(|r| r.opening.as_str()).collect();
        assert_eq!(names, ["A", "B"]);

        // pooled 0.65, se = sqrt(0.65 * 0.35 / 10), z ≈ 1.989
        assert!((rows[0].difference - 0.3).abs() < 1e-12);
        assert!((rows[0].confidence - 0.9767).abs() < 1e-3);
        assert!(rows.iter().all(|r| (0.0..=1.0).contains(&r.confidence)));
    }

    #[test]
    fn test_single_opponent_degenerate_pool_is_zero_confidence() {
        let rows = single_opponent_rows(&[opening("A", 1.0, 5)], &[opening("A", 1.0, 5)], 3);
        assert_eq!(rows[0].difference, 0.0);
        assert_eq!(rows[0].confidence, 0.0);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let player = [opening("A", 0.5, 5), opening("B", 0.5, 5), opening("C", 0.7, 5)];
        let opp = [opening("A", 0.3, 5), opening("B", 0.3, 5), opening("C", 0.3, 5)];
        let first = multi_opponent_rows(&player, &[&opp], 3);
        let second = multi_opponent_rows(&player, &[&opp], 3);
        assert_eq!(first, second);
        assert_eq!(first[0].opening, "C");
        assert_eq!(first[1].opening, "A");
    }
}
