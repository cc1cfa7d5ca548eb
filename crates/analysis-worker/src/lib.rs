//! Offline ingestion: engine sampling around special moves, the two
//! significance classifiers, and player record persistence.

pub mod analyzer;
pub mod config;
pub mod db;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod outcome;
pub mod sampler;
pub mod stockfish;
pub mod utility;

pub use error::WorkerError;
pub use evaluator::{Evaluation, Evaluator};
