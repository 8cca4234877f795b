//! Persistence seam for the engines
//!
//! Both engines and the orchestrator only talk to storage through
//! [`TransactionStore`]. Two implementations ship: [`MemoryStore`] for tests
//! and embedding, and the SQLite [`crate::db::Database`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::{CategoryLabel, CustomRule, NewCustomRule, Transaction, UserPattern, UserProfile};

/// Per-user storage of transactions, learned state and profiles
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist a transaction, returning its new id
    async fn save_transaction(&self, user_id: &str, tx: &Transaction) -> Result<i64>;

    async fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>>;

    /// Overwrite the stored category of a transaction
    async fn update_category(
        &self,
        user_id: &str,
        id: i64,
        label: &CategoryLabel,
        confidence: f64,
    ) -> Result<()>;

    /// Id of an already stored transaction with this fingerprint
    async fn find_by_fingerprint(&self, user_id: &str, fingerprint: &str) -> Result<Option<i64>>;

    /// All stored transactions for the user, in insertion order
    async fn load_history(&self, user_id: &str) -> Result<Vec<Transaction>>;

    async fn load_patterns(&self, user_id: &str) -> Result<Vec<UserPattern>>;

    /// Insert or replace the pattern for `pattern.merchant_key`
    async fn save_pattern(&self, user_id: &str, pattern: &UserPattern) -> Result<()>;

    async fn load_rules(&self, user_id: &str) -> Result<Vec<CustomRule>>;

    async fn insert_rule(&self, user_id: &str, rule: &NewCustomRule) -> Result<CustomRule>;

    async fn update_rule(&self, rule: &CustomRule) -> Result<()>;

    /// Bump the usage counter of a rule that just matched
    async fn record_rule_usage(&self, user_id: &str, rule_id: i64) -> Result<()>;

    /// The user's profile; a fresh default profile if none was saved yet
    async fn load_profile(&self, user_id: &str) -> Result<UserProfile>;

    async fn save_profile(&self, profile: &UserProfile) -> Result<()>;
}

#[derive(Debug, Default)]
struct UserData {
    transactions: Vec<(Transaction, String)>,
    patterns: Vec<UserPattern>,
    rules: Vec<CustomRule>,
    profile: Option<UserProfile>,
}

/// In-process store keyed by user id
#[derive(Debug)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserData>>,
    next_transaction_id: AtomicI64,
    next_rule_id: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            next_transaction_id: AtomicI64::new(1),
            next_rule_id: AtomicI64::new(1),
        }
    }

    fn users(&self) -> MutexGuard<'_, HashMap<String, UserData>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn save_transaction(&self, user_id: &str, tx: &Transaction) -> Result<i64> {
        let id = self.next_transaction_id.fetch_add(1, Ordering::SeqCst);
        let mut stored = tx.clone();
        stored.id = Some(id);
        let fingerprint = stored.fingerprint();
        self.users()
            .entry(user_id.to_string())
            .or_default()
            .transactions
            .push((stored, fingerprint));
        Ok(id)
    }

    async fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        Ok(self.users().get(user_id).and_then(|data| {
            data.transactions
                .iter()
                .find(|(tx, _)| tx.id == Some(id))
                .map(|(tx, _)| tx.clone())
        }))
    }

    async fn update_category(
        &self,
        user_id: &str,
        id: i64,
        label: &CategoryLabel,
        confidence: f64,
    ) -> Result<()> {
        let mut users = self.users();
        let tx = users
            .get_mut(user_id)
            .and_then(|data| data.transactions.iter_mut().find(|(tx, _)| tx.id == Some(id)))
            .map(|(tx, _)| tx)
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;
        tx.category = Some(label.category.clone());
        tx.subcategory = Some(label.subcategory.clone());
        tx.confidence = Some(confidence);
        Ok(())
    }

    async fn find_by_fingerprint(&self, user_id: &str, fingerprint: &str) -> Result<Option<i64>> {
        Ok(self.users().get(user_id).and_then(|data| {
            data.transactions
                .iter()
                .find(|(_, fp)| fp == fingerprint)
                .and_then(|(tx, _)| tx.id)
        }))
    }

    async fn load_history(&self, user_id: &str) -> Result<Vec<Transaction>> {
        Ok(self
            .users()
            .get(user_id)
            .map(|data| data.transactions.iter().map(|(tx, _)| tx.clone()).collect())
            .unwrap_or_default())
    }

    async fn load_patterns(&self, user_id: &str) -> Result<Vec<UserPattern>> {
        Ok(self
            .users()
            .get(user_id)
            .map(|data| data.patterns.clone())
            .unwrap_or_default())
    }

    async fn save_pattern(&self, user_id: &str, pattern: &UserPattern) -> Result<()> {
        let mut users = self.users();
        let patterns = &mut users.entry(user_id.to_string()).or_default().patterns;
        match patterns
            .iter_mut()
            .find(|p| p.merchant_key == pattern.merchant_key)
        {
            Some(existing) => *existing = pattern.clone(),
            None => patterns.push(pattern.clone()),
        }
        Ok(())
    }

    async fn load_rules(&self, user_id: &str) -> Result<Vec<CustomRule>> {
        Ok(self
            .users()
            .get(user_id)
            .map(|data| data.rules.clone())
            .unwrap_or_default())
    }

    async fn insert_rule(&self, user_id: &str, rule: &NewCustomRule) -> Result<CustomRule> {
        let stored = CustomRule {
            id: self.next_rule_id.fetch_add(1, Ordering::SeqCst),
            user_id: user_id.to_string(),
            name: rule.name.clone(),
            conditions: rule.conditions.clone(),
            category: rule.category.clone(),
            subcategory: rule.subcategory.clone(),
            priority: rule.priority,
            auto_generated: rule.auto_generated,
            created_at: Utc::now(),
            usage_count: 0,
        };
        self.users()
            .entry(user_id.to_string())
            .or_default()
            .rules
            .push(stored.clone());
        Ok(stored)
    }

    async fn update_rule(&self, rule: &CustomRule) -> Result<()> {
        let mut users = self.users();
        let existing = users
            .get_mut(&rule.user_id)
            .and_then(|data| data.rules.iter_mut().find(|r| r.id == rule.id))
            .ok_or_else(|| Error::NotFound(format!("rule {}", rule.id)))?;
        *existing = rule.clone();
        Ok(())
    }

    async fn record_rule_usage(&self, user_id: &str, rule_id: i64) -> Result<()> {
        let mut users = self.users();
        if let Some(rule) = users
            .get_mut(user_id)
            .and_then(|data| data.rules.iter_mut().find(|r| r.id == rule_id))
        {
            rule.usage_count = rule.usage_count.saturating_add(1);
        }
        Ok(())
    }

    async fn load_profile(&self, user_id: &str) -> Result<UserProfile> {
        Ok(self
            .users()
            .get(user_id)
            .and_then(|data| data.profile.clone())
            .unwrap_or_else(|| UserProfile::new(user_id)))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.users()
            .entry(profile.user_id.clone())
            .or_default()
            .profile = Some(profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RuleCondition;
    use chrono::NaiveDate;

    fn coffee() -> Transaction {
        Transaction::new(
            "Blue Bottle",
            6.5,
            "latte",
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_transactions_are_scoped_per_user() {
        let store = MemoryStore::new();
        let id = store.save_transaction("alice", &coffee()).await.unwrap();

        assert_eq!(store.load_history("alice").await.unwrap().len(), 1);
        assert!(store.load_history("bob").await.unwrap().is_empty());
        assert!(store.get_transaction("bob", id).await.unwrap().is_none());

        let stored = store.get_transaction("alice", id).await.unwrap().unwrap();
        assert_eq!(stored.id, Some(id));
    }

    #[tokio::test]
    async fn test_fingerprint_lookup() {
        let store = MemoryStore::new();
        let tx = coffee();
        assert!(store
            .find_by_fingerprint("alice", &tx.fingerprint())
            .await
            .unwrap()
            .is_none());

        let id = store.save_transaction("alice", &tx).await.unwrap();
        assert_eq!(
            store.find_by_fingerprint("alice", &tx.fingerprint()).await.unwrap(),
            Some(id)
        );
    }

    #[tokio::test]
    async fn test_update_category_missing_transaction() {
        let store = MemoryStore::new();
        let label = CategoryLabel::new("Food & Dining", "Coffee & Tea");
        let err = store.update_category("alice", 99, &label, 1.0).await;
        assert!(matches!(err, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rule_usage_and_update() {
        let store = MemoryStore::new();
        let rule = store
            .insert_rule(
                "alice",
                &NewCustomRule {
                    name: "Coffee".into(),
                    conditions: vec![RuleCondition::MerchantContains {
                        value: "bottle".into(),
                    }],
                    category: "Food & Dining".into(),
                    subcategory: "Coffee & Tea".into(),
                    priority: 10,
                    auto_generated: false,
                },
            )
            .await
            .unwrap();

        store.record_rule_usage("alice", rule.id).await.unwrap();
        store.record_rule_usage("alice", rule.id).await.unwrap();

        let mut loaded = store.load_rules("alice").await.unwrap().remove(0);
        assert_eq!(loaded.usage_count, 2);

        loaded.priority = 50;
        store.update_rule(&loaded).await.unwrap();
        assert_eq!(store.load_rules("alice").await.unwrap()[0].priority, 50);
    }

    #[tokio::test]
    async fn test_profile_defaults_until_saved() {
        let store = MemoryStore::new();
        let mut profile = store.load_profile("alice").await.unwrap();
        assert!(profile.budget_limits.is_empty());

        profile.budget_limits.insert("Shopping".into(), 200.0);
        store.save_profile(&profile).await.unwrap();
        assert_eq!(
            store.load_profile("alice").await.unwrap().budget_for("Shopping"),
            Some(200.0)
        );
    }
}
