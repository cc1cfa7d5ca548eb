//! Per-game feature extraction and batch accumulation.

use chess_core::record::{MoveCategory, Perspective};
use chess_core::{Game, Side};

use crate::config::AnalysisSettings;
use crate::error::WorkerError;
use crate::evaluator::Evaluator;
use crate::sampler::{sample_game, SampledGame};

/// One decisive game as seen by the analyzed player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameFeatureRow {
    pub won: bool,
    pub rating_differential: f64,
    pub player_castle: bool,
    pub player_en_passant: bool,
    pub opponents_castle: bool,
    pub opponents_en_passant: bool,
}

impl GameFeatureRow {
    pub fn indicator(&self, perspective: Perspective, category: MoveCategory) -> bool {
        match (perspective, category) {
            (Perspective::Player, MoveCategory::Castle) => self.player_castle,
            (Perspective::Player, MoveCategory::EnPassant) => self.player_en_passant,
            (Perspective::Opponents, MoveCategory::Castle) => self.opponents_castle,
            (Perspective::Opponents, MoveCategory::EnPassant) => self.opponents_en_passant,
        }
    }
}

/// Centipawn deltas pooled per (perspective, category).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UtilityPools([[Vec<f64>; 2]; 2]);

impl UtilityPools {
    pub fn push(&mut self, perspective: Perspective, category: MoveCategory, delta_cp: f64) {
        self.0[perspective_index(perspective)][category.index()].push(delta_cp);
    }

    pub fn samples(&self, perspective: Perspective, category: MoveCategory) -> &[f64] {
        &self.0[perspective_index(perspective)][category.index()]
    }

    fn extend(&mut self, other: UtilityPools) {
        for (mine, theirs) in self.0.iter_mut().flatten().zip(other.0.into_iter().flatten()) {
            mine.extend(theirs);
        }
    }
}

fn perspective_index(perspective: Perspective) -> usize {
    match perspective {
        Perspective::Player => 0,
        Perspective::Opponents => 1,
    }
}

/// What a single game adds to the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum GameContribution {
    Decisive {
        row: GameFeatureRow,
        pools: UtilityPools,
    },
    /// Drawn games feed the utility pools only.
    Drawn { pools: UtilityPools },
    Invalidated,
}

/// Extract the feature row and utility samples of `game` for `player`.
pub async fn extract_game<E: Evaluator + ?Sized>(
    engine: &mut E,
    game: &Game,
    player: &str,
    settings: &AnalysisSettings,
) -> Result<GameContribution, WorkerError> {
    let side = game.side_of(player).ok_or_else(|| WorkerError::TargetNotInGame {
        player: player.to_string(),
    })?;
    let player_rating = game.rating(side).ok_or(WorkerError::MissingRating("player"))?;
    let opponent_rating = game
        .rating(side.opponent())
        .ok_or(WorkerError::MissingRating("opponent"))?;

    let (samples, usage) = match sample_game(engine, game, settings).await? {
        SampledGame::Sampled { samples, usage } => (samples, usage),
        SampledGame::Invalidated { .. } => return Ok(GameContribution::Invalidated),
    };

    let perspective_of = |mover: Side| {
        if mover == side {
            Perspective::Player
        } else {
            Perspective::Opponents
        }
    };
    let mut pools = UtilityPools::default();
    for sample in &samples {
        pools.push(perspective_of(sample.side), sample.category, f64::from(sample.delta_cp));
    }

    let score = game.result.score_for(side);
    if game.result.is_draw() {
        return Ok(GameContribution::Drawn { pools });
    }

    let opponent = side.opponent();
    Ok(GameContribution::Decisive {
        row: GameFeatureRow {
            won: score > 0.5,
            rating_differential: f64::from(player_rating - opponent_rating),
            player_castle: usage.used(side, MoveCategory::Castle),
            player_en_passant: usage.used(side, MoveCategory::EnPassant),
            opponents_castle: usage.used(opponent, MoveCategory::Castle),
            opponents_en_passant: usage.used(opponent, MoveCategory::EnPassant),
        },
        pools,
    })
}

/// Counts of how games were used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub decisive: usize,
    pub drawn: usize,
    pub invalidated: usize,
    pub skipped: usize,
}

/// Accumulated feature table and utility pools for one player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchAccumulator {
    pub rows: Vec<GameFeatureRow>,
    pub pools: UtilityPools,
    pub summary: BatchSummary,
}

impl BatchAccumulator {
    pub fn absorb(mut self, contribution: GameContribution) -> Self {
        match contribution {
            GameContribution::Decisive { row, pools } => {
                self.rows.push(row);
                self.pools.extend(pools);
                self.summary.decisive += 1;
            }
            GameContribution::Drawn { pools } => {
                self.pools.extend(pools);
                self.summary.drawn += 1;
            }
            GameContribution::Invalidated => self.summary.invalidated += 1,
        }
        self
    }

    pub fn skip(mut self) -> Self {
        self.summary.skipped += 1;
        self
    }

    /// Combine two accumulators built from disjoint game sets.
    pub fn merge(mut self, other: BatchAccumulator) -> Self {
        self.rows.extend(other.rows);
        self.pools.extend(other.pools);
        self.summary.decisive += other.summary.decisive;
        self.summary.drawn += other.summary.drawn;
        self.summary.invalidated += other.summary.invalidated;
        self.summary.skipped += other.summary.skipped;
        self
    }

    pub fn wins(&self) -> usize {
        self.rows.iter().filter(|row| row.won).count()
    }

    pub fn losses(&self) -> usize {
        self.rows.len() - self.wins()
    }
}
