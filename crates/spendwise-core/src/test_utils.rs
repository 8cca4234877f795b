//! Test utilities for spendwise-core
//!
//! Fixture builders and scripted collaborators (extractor, dispatcher, a
//! store that fails on demand) for unit and integration tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::{
    CategoryLabel, CustomRule, NewCustomRule, Transaction, TransactionSource, UserPattern,
    UserProfile,
};
use crate::pipeline::{
    AutomationDispatcher, AutomationKind, DocumentExtractor, ExtractedTransaction,
    ProcessingContext,
};
use crate::store::TransactionStore;

/// Parse a `YYYY-MM-DD` fixture date
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| panic!("bad fixture date {}", s))
}

/// A manual transaction on the given date
pub fn tx_on(merchant: &str, amount: f64, description: &str, on: &str) -> Transaction {
    Transaction::new(merchant, amount, description, date(on))
}

/// A transaction that already carries a category
pub fn categorized(merchant: &str, amount: f64, on: &str, category: &str, subcategory: &str) -> Transaction {
    tx_on(merchant, amount, "", on).with_category(category, subcategory)
}

/// Extractor that always returns the same fields
pub struct StaticExtractor {
    extracted: ExtractedTransaction,
}

impl StaticExtractor {
    pub fn new(merchant: &str, amount: f64, on: &str, confidence: f64) -> Self {
        Self {
            extracted: ExtractedTransaction {
                merchant: merchant.to_string(),
                amount,
                description: String::new(),
                date: date(on),
                confidence,
            },
        }
    }
}

#[async_trait]
impl DocumentExtractor for StaticExtractor {
    async fn extract(&self, _source: TransactionSource, _payload: &str) -> Result<ExtractedTransaction> {
        Ok(self.extracted.clone())
    }
}

/// Dispatcher that remembers every trigger
#[derive(Default)]
pub struct RecordingDispatcher {
    fired: Mutex<Vec<(AutomationKind, String)>>,
}

impl RecordingDispatcher {
    pub fn kinds(&self) -> Vec<AutomationKind> {
        self.fired()
            .into_iter()
            .map(|(kind, _)| kind)
            .collect()
    }

    /// (kind, merchant) pairs in firing order
    pub fn fired(&self) -> Vec<(AutomationKind, String)> {
        self.fired.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AutomationDispatcher for RecordingDispatcher {
    async fn trigger(&self, kind: AutomationKind, tx: &Transaction, _ctx: &ProcessingContext) -> Result<()> {
        self.fired
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((kind, tx.merchant.clone()));
        Ok(())
    }
}

/// Dispatcher whose every trigger fails
pub struct FailingDispatcher;

#[async_trait]
impl AutomationDispatcher for FailingDispatcher {
    async fn trigger(&self, kind: AutomationKind, _tx: &Transaction, _ctx: &ProcessingContext) -> Result<()> {
        Err(Error::Automation(format!("{} endpoint unreachable", kind)))
    }
}

/// Wraps a store and fails the selected operations
pub struct FailingStore<S> {
    inner: S,
    fail_saves: bool,
    fail_reads: bool,
}

impl<S: TransactionStore> FailingStore<S> {
    /// `save_transaction` fails, everything else passes through
    pub fn failing_saves(inner: S) -> Self {
        Self {
            inner,
            fail_saves: true,
            fail_reads: false,
        }
    }

    /// History, pattern and rule loads fail
    pub fn failing_reads(inner: S) -> Self {
        Self {
            inner,
            fail_saves: false,
            fail_reads: true,
        }
    }

    fn read_guard(&self) -> Result<()> {
        if self.fail_reads {
            return Err(Error::Storage("read failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: TransactionStore> TransactionStore for FailingStore<S> {
    async fn save_transaction(&self, user_id: &str, tx: &Transaction) -> Result<i64> {
        if self.fail_saves {
            return Err(Error::Storage("disk full".into()));
        }
        self.inner.save_transaction(user_id, tx).await
    }

    async fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        self.inner.get_transaction(user_id, id).await
    }

    async fn update_category(
        &self,
        user_id: &str,
        id: i64,
        label: &CategoryLabel,
        confidence: f64,
    ) -> Result<()> {
        self.inner.update_category(user_id, id, label, confidence).await
    }

    async fn find_by_fingerprint(&self, user_id: &str, fingerprint: &str) -> Result<Option<i64>> {
        self.inner.find_by_fingerprint(user_id, fingerprint).await
    }

    async fn load_history(&self, user_id: &str) -> Result<Vec<Transaction>> {
        self.read_guard()?;
        self.inner.load_history(user_id).await
    }

    async fn load_patterns(&self, user_id: &str) -> Result<Vec<UserPattern>> {
        self.read_guard()?;
        self.inner.load_patterns(user_id).await
    }

    async fn save_pattern(&self, user_id: &str, pattern: &UserPattern) -> Result<()> {
        self.inner.save_pattern(user_id, pattern).await
    }

    async fn load_rules(&self, user_id: &str) -> Result<Vec<CustomRule>> {
        self.read_guard()?;
        self.inner.load_rules(user_id).await
    }

    async fn insert_rule(&self, user_id: &str, rule: &NewCustomRule) -> Result<CustomRule> {
        self.inner.insert_rule(user_id, rule).await
    }

    async fn update_rule(&self, rule: &CustomRule) -> Result<()> {
        self.inner.update_rule(rule).await
    }

    async fn record_rule_usage(&self, user_id: &str, rule_id: i64) -> Result<()> {
        self.inner.record_rule_usage(user_id, rule_id).await
    }

    async fn load_profile(&self, user_id: &str) -> Result<UserProfile> {
        self.inner.load_profile(user_id).await
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.inner.save_profile(profile).await
    }
}
