//! Spending analysis
//!
//! Per-transaction analysis (velocity, category and merchant insight, budget
//! impact, forecast), rolling-window pattern detection and user summaries.

mod engine;
pub mod patterns;
pub mod stats;
mod types;

pub use engine::{average_monthly_spend, AnalysisEngine};
pub use patterns::{PatternDetector, PatternEngine, PatternWindow};
pub use types::*;
