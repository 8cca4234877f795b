//! CSV import of statement exports
//!
//! Columns are found by header name, so any export with a date, a merchant
//! (or description) and an amount column works. Rows become
//! [`RawTransaction`]s for the pipeline; malformed values are passed through
//! as text so the pipeline reports them per item.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pipeline::extract::parse_amount;
use crate::pipeline::{RawAmount, RawTransaction};

const DATE_HEADERS: &[&str] = &["date", "transaction date", "posted date", "post date"];
const MERCHANT_HEADERS: &[&str] = &["merchant", "payee", "name", "merchant name"];
const DESCRIPTION_HEADERS: &[&str] = &["description", "memo", "details"];
const AMOUNT_HEADERS: &[&str] = &["amount", "debit", "transaction amount"];

/// Column positions resolved from a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub merchant: usize,
    pub amount: usize,
    /// Separate description column, when the merchant came from its own column
    pub description: Option<usize>,
}

impl ColumnMap {
    /// Resolve columns from headers
    ///
    /// Without a merchant column the description column is used as merchant.
    pub fn detect(headers: &StringRecord) -> Option<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };

        let date = find(DATE_HEADERS)?;
        let amount = find(AMOUNT_HEADERS)?;
        let description = find(DESCRIPTION_HEADERS);

        match find(MERCHANT_HEADERS) {
            Some(merchant) => Some(Self {
                date,
                merchant,
                amount,
                description,
            }),
            None => Some(Self {
                date,
                merchant: description?,
                amount,
                description: None,
            }),
        }
    }
}

/// Parse a statement export into raw pipeline inputs
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = ColumnMap::detect(&headers).ok_or_else(|| {
        Error::Validation(format!(
            "Unrecognized CSV header (need Date, Merchant or Description, Amount): {}",
            headers.iter().collect::<Vec<_>>().join(",")
        ))
    })?;
    debug!(?columns, "Detected CSV columns");

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        rows.push(row_to_raw(&record, &columns));
    }

    debug!("Parsed {} rows from CSV", rows.len());
    Ok(rows)
}

fn row_to_raw(record: &StringRecord, columns: &ColumnMap) -> RawTransaction {
    let field = |i: usize| record.get(i).map(str::to_string).filter(|s| !s.is_empty());

    // Exports sign expenses either way; the pipeline wants positive spend
    let amount = field(columns.amount).map(|text| match parse_amount(&text) {
        Ok(value) => RawAmount::Number(value.abs()),
        Err(_) => RawAmount::Text(text),
    });

    RawTransaction {
        merchant: field(columns.merchant),
        amount,
        description: columns.description.and_then(&field),
        date: field(columns.date),
        document: None,
    }
}
