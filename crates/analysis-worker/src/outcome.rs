//! Outcome-regression classifier: does using a special move go together
//! with winning, once the rating gap is accounted for?

use chess_core::record::{
    CategoryResult, Classification, EffectStatistic, MoveAnalysis, MoveCategory, Perspective,
    SignificanceTest,
};
use strategy_stats::descriptive::min_max;
use strategy_stats::linalg::Matrix;
use strategy_stats::logistic::FirthLogistic;
use tracing::{debug, warn};

use crate::config::AnalysisSettings;
use crate::features::GameFeatureRow;

/// Classify the four indicators by their association with the player's wins.
pub fn classify_outcomes(rows: &[GameFeatureRow], settings: &AnalysisSettings) -> MoveAnalysis {
    let wins = rows.iter().filter(|row| row.won).count();
    let losses = rows.len() - wins;
    if wins < settings.min_decisive_games || losses < settings.min_decisive_games {
        debug!(wins, losses, "Too few decisive games for outcome regression");
        return MoveAnalysis::unavailable();
    }

    let mut columns: Vec<Vec<f64>> = Vec::new();

    let differentials: Vec<f64> = rows.iter().map(|row| row.rating_differential).collect();
    match min_max(&differentials) {
        Some((min, max)) if max > min => {
            columns.push(differentials.iter().map(|d| (d - min) / (max - min)).collect());
        }
        _ => debug!("Rating differential is constant, column dropped"),
    }

    // Indicators never set cannot be estimated; they stay unavailable.
    let mut indicators = Vec::new();
    for perspective in Perspective::ALL {
        for category in MoveCategory::ALL {
            let column: Vec<f64> = rows
                .iter()
                .map(|row| if row.indicator(perspective, category) { 1.0 } else { 0.0 })
                .collect();
            if column.iter().any(|&v| v > 0.0) {
                indicators.push((perspective, category, columns.len()));
                columns.push(column);
            }
        }
    }
    if indicators.is_empty() {
        return MoveAnalysis::unavailable();
    }

    let design_rows: Vec<Vec<f64>> = (0..rows.len())
        .map(|i| columns.iter().map(|column| column[i]).collect())
        .collect();
    let outcome: Vec<f64> = rows.iter().map(|row| if row.won { 1.0 } else { 0.0 }).collect();

    let fit = match Matrix::from_rows(&design_rows)
        .and_then(|design| FirthLogistic::default().fit(&design, &outcome))
    {
        Ok(fit) => fit,
        Err(e) => {
            warn!(error = %e, games = rows.len(), "Outcome regression failed");
            return MoveAnalysis::unavailable();
        }
    };

    let alpha = settings.significance_threshold();
    let mut analysis = MoveAnalysis::unavailable();
    for (perspective, category, index) in indicators {
        let coefficient = fit.coefficients[index];
        let p_value = fit.p_value(index);
        if !coefficient.is_finite() || !p_value.is_finite() {
            continue;
        }

        let for_player = if p_value >= alpha {
            Classification::NotSignificant
        } else if coefficient > 0.0 {
            Classification::Strength
        } else {
            Classification::Weakness
        };
        // The response is the player's win, so an opponent habit that goes
        // with player wins is a weakness of the opponents.
        let classification = match perspective {
            Perspective::Player => for_player,
            Perspective::Opponents => for_player.inverted(),
        };

        *analysis.get_mut(perspective, category) = CategoryResult::Tested(SignificanceTest {
            classification,
            effect: EffectStatistic::Coefficient(coefficient),
            p_value,
        });
    }
    analysis
}
