//! Move-utility significance tester: does a special move shift the engine
//! evaluation a few moves later?

use chess_core::record::{
    CategoryResult, Classification, EffectStatistic, MoveAnalysis, MoveCategory, Perspective,
    SignificanceTest,
};
use strategy_stats::ttest::OneSampleTTest;

use crate::config::AnalysisSettings;
use crate::features::UtilityPools;

pub fn classify_utility(pools: &UtilityPools, settings: &AnalysisSettings) -> MoveAnalysis {
    let mut analysis = MoveAnalysis::unavailable();
    for perspective in Perspective::ALL {
        for category in MoveCategory::ALL {
            *analysis.get_mut(perspective, category) =
                test_pool(pools.samples(perspective, category), settings);
        }
    }
    analysis
}

fn test_pool(samples: &[f64], settings: &AnalysisSettings) -> CategoryResult {
    if samples.len() < settings.min_utility_samples.max(2) {
        return CategoryResult::Unavailable;
    }
    let Ok(test) = OneSampleTTest::against_zero(samples) else {
        return CategoryResult::Unavailable;
    };

    let p_value = test.p_value_two_sided();
    let classification = if p_value >= settings.significance_threshold() || test.mean == 0.0 {
        Classification::NotSignificant
    } else if test.mean > 0.0 {
        Classification::Strength
    } else {
        Classification::Weakness
    };

    CategoryResult::Tested(SignificanceTest {
        classification,
        effect: EffectStatistic::Mean(test.mean),
        p_value,
    })
}
