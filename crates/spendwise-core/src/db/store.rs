//! `TransactionStore` over SQLite
//!
//! Calls are synchronous on a pooled connection; statements are short and
//! local, so they run inline on the async task.

use async_trait::async_trait;

use super::Database;
use crate::error::Result;
use crate::models::{CategoryLabel, CustomRule, NewCustomRule, Transaction, UserPattern, UserProfile};
use crate::store::TransactionStore;

#[async_trait]
impl TransactionStore for Database {
    async fn save_transaction(&self, user_id: &str, tx: &Transaction) -> Result<i64> {
        self.insert_transaction(user_id, tx)
    }

    async fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        Database::get_transaction(self, user_id, id)
    }

    async fn update_category(
        &self,
        user_id: &str,
        id: i64,
        label: &CategoryLabel,
        confidence: f64,
    ) -> Result<()> {
        self.update_transaction_category(user_id, id, label, confidence)
    }

    async fn find_by_fingerprint(&self, user_id: &str, fingerprint: &str) -> Result<Option<i64>> {
        self.find_transaction_by_fingerprint(user_id, fingerprint)
    }

    async fn load_history(&self, user_id: &str) -> Result<Vec<Transaction>> {
        self.list_transactions(user_id)
    }

    async fn load_patterns(&self, user_id: &str) -> Result<Vec<UserPattern>> {
        self.list_patterns(user_id)
    }

    async fn save_pattern(&self, user_id: &str, pattern: &UserPattern) -> Result<()> {
        self.upsert_pattern(user_id, pattern)
    }

    async fn load_rules(&self, user_id: &str) -> Result<Vec<CustomRule>> {
        self.list_rules(user_id)
    }

    async fn insert_rule(&self, user_id: &str, rule: &NewCustomRule) -> Result<CustomRule> {
        self.create_rule(user_id, rule)
    }

    async fn update_rule(&self, rule: &CustomRule) -> Result<()> {
        Database::update_rule(self, rule)
    }

    async fn record_rule_usage(&self, user_id: &str, rule_id: i64) -> Result<()> {
        self.increment_rule_usage(user_id, rule_id)
    }

    async fn load_profile(&self, user_id: &str) -> Result<UserProfile> {
        Ok(self
            .get_profile(user_id)?
            .unwrap_or_else(|| UserProfile::new(user_id)))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.upsert_profile(profile)
    }
}
