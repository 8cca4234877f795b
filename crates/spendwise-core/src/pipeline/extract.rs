//! Extraction and validation of raw input

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Transaction, TransactionSource};

use super::types::{RawAmount, RawTransaction};

/// Date formats accepted from manual entry and statement exports
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2024-01-15
    "%m/%d/%y", // 01/15/24 (before %Y, which would read "24" as year 24)
    "%m/%d/%Y", // 01/15/2024
    "%m-%d-%Y", // 01-15-2024
];

/// Fields recovered from a receipt or statement document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTransaction {
    pub merchant: String,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
    pub confidence: f64,
}

/// External OCR / document parsing collaborator
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(&self, source: TransactionSource, payload: &str) -> Result<ExtractedTransaction>;
}

/// Parse a date in any accepted format
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }
    Err(Error::Validation(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols, commas and parentheses
pub fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::Validation(format!("Unable to parse amount: {}", s)))
}

/// Turn raw fields into a transaction, rejecting malformed input
pub fn validate(raw: &RawTransaction, source: TransactionSource) -> Result<Transaction> {
    let merchant = raw
        .merchant
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| Error::Validation("merchant is required".into()))?;

    let amount = match &raw.amount {
        Some(RawAmount::Number(n)) => *n,
        Some(RawAmount::Text(text)) => parse_amount(text)?,
        None => return Err(Error::Validation("amount is required".into())),
    };
    validate_amount(amount)?;

    let date = raw
        .date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| Error::Validation("date is required".into()))
        .and_then(parse_date)?;

    let description = raw.description.as_deref().unwrap_or("").trim();

    Ok(Transaction::new(merchant, amount, description, date).with_source(source))
}

/// Validate what an extractor returned
pub fn from_extracted(extracted: &ExtractedTransaction, source: TransactionSource) -> Result<Transaction> {
    let merchant = extracted.merchant.trim();
    if merchant.is_empty() {
        return Err(Error::Validation("extracted merchant is empty".into()));
    }
    validate_amount(extracted.amount)?;
    Ok(Transaction::new(
        merchant,
        extracted.amount,
        extracted.description.trim(),
        extracted.date,
    )
    .with_source(source))
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::Validation(format!(
            "amount must be a positive number, got {}",
            amount
        )));
    }
    Ok(())
}
