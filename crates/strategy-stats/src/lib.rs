//! Statistical routines behind the strategy analysis.
//!
//! - [`descriptive`]: mean and sample variance
//! - [`distribution`]: standard normal and Student-t distribution functions
//! - [`linalg`]: small dense matrices with Gauss-Jordan inversion
//! - [`logistic`]: bias-reduced (Firth) logistic regression with Wald tests
//! - [`ttest`]: one-sample Student t-test
//! - [`spline`]: cubic smoothing spline with a residual-sum-of-squares target
//!
//! # Examples
//!
//! ```
//! use strategy_stats::ttest::OneSampleTTest;
//!
//! let test = OneSampleTTest::against_zero(&[12.0, 30.0, 21.0, 15.0]).unwrap();
//! assert!(test.p_value_two_sided() < 0.05);
//! ```

pub mod descriptive;
pub mod distribution;
pub mod error;
pub mod linalg;
pub mod logistic;
pub mod spline;
pub mod ttest;

pub use error::StatsError;
