//! Engine delta sampling around special moves.
//!
//! After a castle or en-passant capture by one side, the resulting position is
//! scored (the baseline). When that side is next to move at
//! `baseline_move + delay` full moves, the position is scored again and the
//! difference is recorded. Both scores are taken from the mover's point of
//! view, so a positive delta means the position improved for the side that
//! played the special move.

use chess_core::record::MoveCategory;
use chess_core::{Game, Side};
use tracing::debug;

use crate::config::AnalysisSettings;
use crate::error::WorkerError;
use crate::evaluator::{Evaluation, Evaluator};

/// Re-sample timer for one (side, category) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleTimer {
    #[default]
    Idle,
    Armed {
        baseline_cp: i32,
        due_fullmove: u32,
    },
}

impl ResampleTimer {
    /// Arm (or re-arm) the timer. A pending sample is discarded.
    pub fn arm(&mut self, baseline_cp: i32, fullmove: u32, delay: u32) {
        *self = ResampleTimer::Armed {
            baseline_cp,
            due_fullmove: fullmove.saturating_add(delay),
        };
    }

    /// If due at `fullmove`, disarm and return the baseline.
    pub fn take_due(&mut self, fullmove: u32) -> Option<i32> {
        match *self {
            ResampleTimer::Armed {
                baseline_cp,
                due_fullmove,
            } if due_fullmove == fullmove => {
                *self = ResampleTimer::Idle;
                Some(baseline_cp)
            }
            _ => None,
        }
    }
}

/// One recorded delta, in centipawns from the mover's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaSample {
    pub side: Side,
    pub category: MoveCategory,
    pub delta_cp: i32,
}

/// Which special moves each side played in a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecialMoveUsage([[bool; 2]; 2]);

impl SpecialMoveUsage {
    pub fn mark(&mut self, side: Side, category: MoveCategory) {
        self.0[side.index()][category.index()] = true;
    }

    pub fn used(&self, side: Side, category: MoveCategory) -> bool {
        self.0[side.index()][category.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampledGame {
    Sampled {
        samples: Vec<DeltaSample>,
        usage: SpecialMoveUsage,
    },
    /// A forced mate made the evaluation meaningless; the game contributes
    /// nothing.
    Invalidated { ply: usize },
}

/// Walk a game and collect evaluation deltas for every special move.
pub async fn sample_game<E: Evaluator + ?Sized>(
    engine: &mut E,
    game: &Game,
    settings: &AnalysisSettings,
) -> Result<SampledGame, WorkerError> {
    let mut timers = [[ResampleTimer::Idle; 2]; 2];
    let mut usage = SpecialMoveUsage::default();
    let mut samples = Vec::new();

    for (index, ply) in game.plies.iter().enumerate() {
        let side = ply.mover;

        // A due re-sample is taken before this ply's own special move re-arms it.
        for category in MoveCategory::ALL {
            let timer = &mut timers[side.index()][category.index()];
            let Some(baseline_cp) = timer.take_due(ply.fullmove) else {
                continue;
            };
            let eval = engine.evaluate(&ply.fen_before, settings.query_time).await?;
            let current_cp = match eval {
                Evaluation::Centipawns(cp) => cp,
                Evaluation::Mate(_) if settings.clamp_resample_mates => eval.clamped_cp(),
                Evaluation::Mate(_) => {
                    debug!(ply = index, "Mate at re-sample, game discarded");
                    return Ok(SampledGame::Invalidated { ply: index });
                }
            };
            samples.push(DeltaSample {
                side,
                category,
                delta_cp: current_cp - baseline_cp,
            });
        }

        let category = if ply.is_castle {
            MoveCategory::Castle
        } else if ply.is_en_passant {
            MoveCategory::EnPassant
        } else {
            continue;
        };

        // Opponent is to move after the special move.
        let eval = engine.evaluate(&ply.fen_after, settings.query_time).await?;
        let Evaluation::Centipawns(opponent_cp) = eval else {
            debug!(ply = index, "Mate at baseline, game discarded");
            return Ok(SampledGame::Invalidated { ply: index });
        };

        usage.mark(side, category);
        timers[side.index()][category.index()].arm(-opponent_cp, ply.fullmove, settings.move_delay);
    }

    Ok(SampledGame::Sampled { samples, usage })
}
