//! Engine abstraction used by the sampler.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::WorkerError;

/// Centipawn value used in place of a forced mate when mates are clamped.
pub const MATE_SCORE_CP: i32 = 1000;

/// Position evaluation from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Centipawns(i32),
    /// Mate in N; positive when the side to move delivers it.
    Mate(i32),
}

impl Evaluation {
    pub fn is_mate(self) -> bool {
        matches!(self, Evaluation::Mate(_))
    }

    /// Same evaluation seen by the other side.
    pub fn flipped(self) -> Self {
        match self {
            Evaluation::Centipawns(cp) => Evaluation::Centipawns(-cp),
            Evaluation::Mate(n) => Evaluation::Mate(-n),
        }
    }

    /// Centipawns with mates clamped to ±[`MATE_SCORE_CP`]. `Mate(0)` means
    /// the side to move is already mated.
    pub fn clamped_cp(self) -> i32 {
        match self {
            Evaluation::Centipawns(cp) => cp,
            Evaluation::Mate(n) if n > 0 => MATE_SCORE_CP,
            Evaluation::Mate(_) => -MATE_SCORE_CP,
        }
    }
}

/// Something that can score chess positions. One instance serves one
/// worker; queries on it are sequential.
#[async_trait]
pub trait Evaluator: Send {
    async fn evaluate(&mut self, fen: &str, budget: Duration) -> Result<Evaluation, WorkerError>;

    /// Bring the engine back to a usable state after a failed query.
    async fn recover(&mut self) -> Result<(), WorkerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_cp() {
        assert_eq!(Evaluation::Centipawns(-42).clamped_cp(), -42);
        assert_eq!(Evaluation::Mate(3).clamped_cp(), 1000);
        assert_eq!(Evaluation::Mate(-2).clamped_cp(), -1000);
        assert_eq!(Evaluation::Mate(0).clamped_cp(), -1000);
        assert_eq!(Evaluation::Mate(2).flipped(), Evaluation::Mate(-2));
    }
}
