//! Pipeline input and output types

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::models::{CategorizationResult, Transaction, TransactionSource};

/// An amount as it arrives: a number, or text like "$1,234.56"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

/// Unvalidated transaction input
///
/// Receipt and statement sources can carry a `document` payload instead of
/// fields; it is handed to the document extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

impl RawTransaction {
    pub fn new(
        merchant: impl Into<String>,
        amount: impl Into<RawAmount>,
        description: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            merchant: Some(merchant.into()),
            amount: Some(amount.into()),
            description: Some(description.into()),
            date: Some(date.into()),
            document: None,
        }
    }

    /// Input that only carries a document for extraction
    pub fn document(payload: impl Into<String>) -> Self {
        Self {
            document: Some(payload.into()),
            ..Default::default()
        }
    }
}

/// Who is processing what
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingContext {
    pub user_id: String,
    pub source: TransactionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl ProcessingContext {
    pub fn new(user_id: impl Into<String>, source: TransactionSource) -> Self {
        Self {
            user_id: user_id.into(),
            source,
            batch_id: None,
        }
    }

    pub fn with_batch(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }
}

/// Stage of single-item processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extract,
    Validate,
    Categorize,
    Analyze,
    Persist,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Extract => "extract",
            PipelineStage::Validate => "validate",
            PipelineStage::Categorize => "categorize",
            PipelineStage::Analyze => "analyze",
            PipelineStage::Persist => "persist",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingFailure {
    pub stage: PipelineStage,
    pub message: String,
}

impl ProcessingFailure {
    pub fn new(stage: PipelineStage, message: impl fmt::Display) -> Self {
        Self {
            stage,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ProcessingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Outcome of processing one item; never an `Err`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorization: Option<CategorizationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    /// Extractor confidence (1.0 for direct entry)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessingFailure>,
    pub insights: Vec<String>,
    pub warnings: Vec<String>,
}

impl ProcessingResult {
    pub fn failed(failure: ProcessingFailure, warnings: Vec<String>) -> Self {
        Self {
            success: false,
            error: Some(failure),
            warnings,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Position in the submitted batch
    pub index: usize,
    pub failure: ProcessingFailure,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Per-item results in input order
    pub results: Vec<ProcessingResult>,
    pub failures: Vec<BatchFailure>,
    pub category_counts: BTreeMap<String, usize>,
    pub total_amount: f64,
    pub insights: Vec<String>,
}

/// Running orchestrator counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub total_processed: u64,
    pub successful: u64,
    pub failed: u64,
    pub average_latency_ms: f64,
}
