//! Smoothed expected-score-by-game-length curves.

use std::collections::BTreeMap;

use chess_core::record::{EvBucket, EvByMoveCount};
use serde::Serialize;
use strategy_stats::spline::SmoothingSpline;
use tracing::warn;

/// Fewer distinct game lengths than this give an empty curve.
const MIN_BUCKETS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub move_count: u32,
    pub expected_value: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CurveSmoother {
    /// First move count evaluated.
    pub x_min: u32,
    /// Evaluation stops before this move count.
    pub x_max: u32,
    pub smoothing: f64,
}

impl Default for CurveSmoother {
    fn default() -> Self {
        Self {
            x_min: 7,
            x_max: 50,
            smoothing: 5.0,
        }
    }
}

impl CurveSmoother {
    pub fn with_smoothing(smoothing: f64) -> Self {
        Self {
            smoothing,
            ..Self::default()
        }
    }

    pub fn smooth(&self, buckets: &EvByMoveCount) -> Vec<CurvePoint> {
        if buckets.len() < MIN_BUCKETS {
            return Vec::new();
        }

        let x: Vec<f64> = buckets.keys().map(|&k| f64::from(k)).collect();
        let y: Vec<f64> = buckets.values().map(|b| b.expected_value).collect();
        let spline = match SmoothingSpline::fit(&x, &y, self.smoothing) {
            Ok(spline) => spline,
            Err(e) => {
                warn!(error = %e, buckets = buckets.len(), "Curve fit failed");
                return Vec::new();
            }
        };

        (self.x_min..self.x_max)
            .map(|move_count| CurvePoint {
                move_count,
                expected_value: spline.evaluate(f64::from(move_count)).clamp(0.0, 1.0),
            })
            .collect()
    }
}

/// Games-weighted average of several players' buckets. Empty buckets are
/// ignored.
pub fn pool_buckets<'a>(sources: impl IntoIterator<Item = &'a EvByMoveCount>) -> EvByMoveCount {
    let mut totals: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
    for source in sources {
        for (&move_count, bucket) in source {
            if bucket.games == 0 {
                continue;
            }
            let total = totals.entry(move_count).or_insert((0.0, 0));
            total.0 += bucket.expected_value * f64::from(bucket.games);
            total.1 += bucket.games;
        }
    }

    totals
        .into_iter()
        .map(|(move_count, (weighted, games))| {
            (
                move_count,
                EvBucket {
                    expected_value: weighted / f64::from(games),
                    games,
                },
            )
        })
        .collect()
}
