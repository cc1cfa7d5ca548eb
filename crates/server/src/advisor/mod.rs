//! On-demand strategy advice over analyzed records.

pub mod comparator;
pub mod curve;
pub mod report;
pub mod service;

pub use comparator::{RecommendationRow, Recommendations};
pub use curve::{CurvePoint, CurveSmoother};
pub use report::OpponentReport;
pub use service::Advisor;
