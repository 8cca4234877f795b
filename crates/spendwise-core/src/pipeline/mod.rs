//! Transaction processing pipeline
//!
//! Wires extraction, categorization, analysis and persistence together.
//! `PipelineOrchestrator` handles single items and batches; `ProcessingQueue`
//! serializes submissions through one worker.

pub mod automation;
pub mod extract;
mod orchestrator;
mod queue;
mod stats;
mod types;

pub use automation::{AutomationDispatcher, AutomationKind, LoggingDispatcher};
pub use extract::{DocumentExtractor, ExtractedTransaction};
pub use orchestrator::PipelineOrchestrator;
pub use queue::ProcessingQueue;
pub use stats::StatsTracker;
pub use types::*;
