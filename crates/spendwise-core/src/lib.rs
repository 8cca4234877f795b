//! Spendwise Core Library
//!
//! Transaction intelligence for personal finance:
//! - Closed, versioned category taxonomy
//! - Categorization engine (custom rules, learned patterns, heuristics)
//! - Spending analysis (velocity, trends, budgets, forecasts, patterns)
//! - Processing pipeline with batch and queued submission
//! - SQLite and in-memory storage behind one async trait
//! - CSV import of statement exports

pub mod analysis;
pub mod categorize;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod taxonomy;

/// Fixture builders and scripted collaborators
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analysis::{AnalysisEngine, AnalysisResult, Forecast, Pattern, UserInsights};
pub use categorize::{CategorizationEngine, LearningOutcome, PreferenceAdjuster};
pub use config::{AnalysisConfig, CategorizationConfig, EngineConfig, PipelineConfig};
pub use db::Database;
pub use error::{Error, Result};
pub use pipeline::{
    AutomationDispatcher, DocumentExtractor, PipelineOrchestrator, ProcessingContext,
    ProcessingQueue, ProcessingResult, RawTransaction,
};
pub use store::{MemoryStore, TransactionStore};
pub use taxonomy::Taxonomy;
