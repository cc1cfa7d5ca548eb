use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Need at least {needed} points, got {actual}")]
    TooFewPoints { needed: usize, actual: usize },

    #[error("Abscissae must be strictly increasing")]
    NonIncreasing,

    #[error("Matrix is singular")]
    Singular,

    #[error("Did not converge after {0} iterations")]
    NoConvergence(usize),
}
