//! Categorization engine
//!
//! Resolution runs through a priority chain:
//! 1. Custom rules (descending priority, all conditions must hold)
//! 2. Learned patterns, decisive above the learned confidence threshold
//! 3. Candidates from the heuristic classifier, keyword match, merchant
//!    lookup and any sub-threshold learned pattern, ranked by confidence
//! 4. "Other / General" fallback
//!
//! A [`PreferenceAdjuster`] gets the last word on every result.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CategorizationConfig;
use crate::error::{Error, Result};
use crate::models::{
    Alternative, CategorizationResult, CategorizationSource, CategoryLabel, CustomRule,
    NewCustomRule, Transaction, UserPattern,
};
use crate::store::TransactionStore;
use crate::taxonomy::Taxonomy;

use super::heuristic;
use super::learned::{find_learned_pattern, learn_pattern};
use super::rules::{auto_rule_for, find_matching_rule};

/// Confidence of a keyword hit
pub const KEYWORD_CONFIDENCE: f64 = 0.8;
/// Confidence of a known-merchant hit
pub const MERCHANT_CONFIDENCE: f64 = 0.9;

/// Final pass over every categorization result
pub trait PreferenceAdjuster: Send + Sync {
    fn adjust(
        &self,
        user_id: &str,
        tx: &Transaction,
        result: CategorizationResult,
    ) -> CategorizationResult;
}

/// Identity adjuster
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdjustment;

impl PreferenceAdjuster for NoAdjustment {
    fn adjust(&self, _: &str, _: &Transaction, result: CategorizationResult) -> CategorizationResult {
        result
    }
}

/// What a correction changed
#[derive(Debug, Clone, Serialize)]
pub struct LearningOutcome {
    pub pattern: UserPattern,
    /// Auto-rule created or retargeted by this correction
    pub auto_rule: Option<CustomRule>,
}

pub struct CategorizationEngine {
    store: Arc<dyn TransactionStore>,
    taxonomy: Taxonomy,
    config: CategorizationConfig,
    adjuster: Box<dyn PreferenceAdjuster>,
}

impl CategorizationEngine {
    pub fn new(store: Arc<dyn TransactionStore>, config: CategorizationConfig) -> Self {
        Self {
            store,
            taxonomy: Taxonomy::standard(),
            config,
            adjuster: Box::new(NoAdjustment),
        }
    }

    /// Replace the preference adjuster
    pub fn with_adjuster(mut self, adjuster: Box<dyn PreferenceAdjuster>) -> Self {
        self.adjuster = adjuster;
        self
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn config(&self) -> &CategorizationConfig {
        &self.config
    }

    /// Categorize one transaction for a user
    ///
    /// A matching custom rule has its usage counter bumped. Failing to record
    /// usage is logged and does not affect the result.
    pub async fn categorize(&self, tx: &Transaction, user_id: &str) -> Result<CategorizationResult> {
        let rules = self.store.load_rules(user_id).await?;
        let patterns = self.store.load_patterns(user_id).await?;

        let result = self.resolve(tx, &rules, &patterns);
        if let Some(rule_id) = result.rule_id {
            self.record_usage(user_id, rule_id, 1).await;
        }

        Ok(self.adjuster.adjust(user_id, tx, result))
    }

    /// Run the resolution chain against already loaded rules and patterns
    pub fn resolve(
        &self,
        tx: &Transaction,
        rules: &[CustomRule],
        patterns: &[UserPattern],
    ) -> CategorizationResult {
        if let Some(rule) = find_matching_rule(rules, tx) {
            debug!("Rule '{}' matched '{}'", rule.name, tx.merchant);
            let mut result = CategorizationResult::new(
                rule.category.clone(),
                rule.subcategory.clone(),
                1.0,
                CategorizationSource::CustomRule,
            );
            result.rule_id = Some(rule.id);
            return result;
        }

        let mut candidates: Vec<Alternative> = Vec::new();

        if let Some(found) = find_learned_pattern(patterns, tx, self.config.fuzzy_match_threshold) {
            let pattern = found.pattern;
            if pattern.confidence > self.config.learned_confidence_threshold {
                debug!(
                    "Learned pattern ({:?}) matched '{}' -> {}",
                    found.kind, tx.merchant, pattern.category
                );
                return CategorizationResult::new(
                    pattern.category.clone(),
                    pattern.subcategory.clone(),
                    pattern.confidence,
                    CategorizationSource::LearnedPattern,
                );
            }
            candidates.push(Alternative {
                category: pattern.category.clone(),
                subcategory: pattern.subcategory.clone(),
                confidence: pattern.confidence.clamp(0.0, 1.0),
                source: CategorizationSource::LearnedPattern,
            });
        }

        let text = tx.search_text();

        if let Some(guess) = heuristic::classify(&text, tx.amount, &self.taxonomy) {
            candidates.push(Alternative {
                category: guess.category.to_string(),
                subcategory: guess.subcategory.to_string(),
                confidence: guess.confidence,
                source: CategorizationSource::Heuristic,
            });
        }

        if let Some(hit) = self.taxonomy.keyword_match(&text) {
            debug!("Keyword '{}' matched '{}'", hit.matched, tx.merchant);
            candidates.push(Alternative {
                category: hit.category.to_string(),
                subcategory: hit.subcategory.to_string(),
                confidence: KEYWORD_CONFIDENCE,
                source: CategorizationSource::Keyword,
            });
        }

        if let Some(hit) = self.taxonomy.merchant_lookup(&tx.merchant) {
            debug!("Known merchant '{}' matched '{}'", hit.matched, tx.merchant);
            candidates.push(Alternative {
                category: hit.category.to_string(),
                subcategory: hit.subcategory.to_string(),
                confidence: MERCHANT_CONFIDENCE,
                source: CategorizationSource::Merchant,
            });
        }

        rank_candidates(candidates).unwrap_or_else(|| {
            debug!("Falling back to 'Other' for '{}'", tx.merchant);
            CategorizationResult::fallback()
        })
    }

    /// Learn from a user correction
    ///
    /// Creates or strengthens the merchant's pattern; once the pattern has
    /// enough confirmations an auto-rule takes over for that merchant.
    pub async fn learn_from_correction(
        &self,
        user_id: &str,
        tx: &Transaction,
        old_category: Option<&str>,
        new_label: &CategoryLabel,
    ) -> Result<LearningOutcome> {
        let label = self.canonical_label(new_label)?;
        let key = tx.merchant_key();
        if key.is_empty() {
            return Err(Error::Validation(
                "cannot learn from a transaction without a merchant".into(),
            ));
        }

        let patterns = self.store.load_patterns(user_id).await?;
        let existing = patterns.iter().find(|p| p.merchant_key == key);
        let pattern = learn_pattern(existing, tx, &label, &self.config, Utc::now());
        self.store.save_pattern(user_id, &pattern).await?;

        debug!(
            user_id = %user_id,
            "Learned '{}': {} -> {} (usage {}, confidence {:.2})",
            tx.merchant,
            old_category.unwrap_or("uncategorized"),
            label,
            pattern.usage_count,
            pattern.confidence
        );

        let auto_rule = if pattern.usage_count >= self.config.auto_rule_threshold {
            self.sync_auto_rule(user_id, &pattern).await?
        } else {
            None
        };

        Ok(LearningOutcome { pattern, auto_rule })
    }

    async fn sync_auto_rule(&self, user_id: &str, pattern: &UserPattern) -> Result<Option<CustomRule>> {
        let rules = self.store.load_rules(user_id).await?;
        let existing = rules
            .into_iter()
            .find(|r| r.auto_merchant_key().as_deref() == Some(pattern.merchant_key.as_str()));

        match existing {
            Some(rule)
                if rule.category == pattern.category && rule.subcategory == pattern.subcategory =>
            {
                Ok(None)
            }
            Some(mut rule) => {
                rule.category = pattern.category.clone();
                rule.subcategory = pattern.subcategory.clone();
                self.store.update_rule(&rule).await?;
                info!(user_id = %user_id, "Retargeted auto-rule '{}'", rule.name);
                Ok(Some(rule))
            }
            None => {
                let new_rule = auto_rule_for(pattern, self.config.auto_rule_priority);
                let rule = self.store.insert_rule(user_id, &new_rule).await?;
                info!(user_id = %user_id, "Created auto-rule '{}'", rule.name);
                Ok(Some(rule))
            }
        }
    }

    /// Categorize many transactions, sharing one result per group
    ///
    /// A transaction joins the first group whose representative has the same
    /// normalized merchant or an amount within the bulk similarity fraction.
    /// Results come back in input order.
    pub async fn bulk_categorize(
        &self,
        txs: &[Transaction],
        user_id: &str,
    ) -> Result<Vec<CategorizationResult>> {
        let rules = self.store.load_rules(user_id).await?;
        let patterns = self.store.load_patterns(user_id).await?;

        // (representative, result, members)
        let mut groups: Vec<(&Transaction, CategorizationResult, u32)> = Vec::new();
        let mut assignment = Vec::with_capacity(txs.len());

        for tx in txs {
            let joined = groups
                .iter()
                .position(|(rep, _, _)| self.same_group(rep, tx));
            let index = match joined {
                Some(index) => {
                    groups[index].2 += 1;
                    index
                }
                None => {
                    let result = self.resolve(tx, &rules, &patterns);
                    let result = self.adjuster.adjust(user_id, tx, result);
                    groups.push((tx, result, 1));
                    groups.len() - 1
                }
            };
            assignment.push(index);
        }

        for (_, result, members) in &groups {
            if let Some(rule_id) = result.rule_id {
                self.record_usage(user_id, rule_id, *members).await;
            }
        }

        info!(
            user_id = %user_id,
            transactions = txs.len(),
            groups = groups.len(),
            "Bulk categorization complete"
        );

        Ok(assignment
            .into_iter()
            .map(|index| groups[index].1.clone())
            .collect())
    }

    fn same_group(&self, representative: &Transaction, tx: &Transaction) -> bool {
        let key = tx.merchant_key();
        if !key.is_empty() && key == representative.merchant_key() {
            return true;
        }
        let larger = representative.amount.abs().max(tx.amount.abs());
        larger > 0.0
            && (representative.amount - tx.amount).abs() / larger <= self.config.bulk_amount_similarity
    }

    /// Validate and store a user-defined rule
    pub async fn create_custom_rule(&self, user_id: &str, rule: NewCustomRule) -> Result<CustomRule> {
        if rule.name.trim().is_empty() {
            return Err(Error::Validation("rule name must not be empty".into()));
        }
        if rule.conditions.is_empty() {
            return Err(Error::Validation("rule needs at least one condition".into()));
        }
        for condition in &rule.conditions {
            condition.validate().map_err(Error::Validation)?;
        }

        let label = self.canonical_label(&CategoryLabel::new(
            rule.category.clone(),
            rule.subcategory.clone(),
        ))?;
        let rule = NewCustomRule {
            category: label.category,
            subcategory: label.subcategory,
            ..rule
        };

        let stored = self.store.insert_rule(user_id, &rule).await?;
        info!(user_id = %user_id, "Created rule '{}' (priority {})", stored.name, stored.priority);
        Ok(stored)
    }

    /// Resolve a label to the taxonomy's spelling, rejecting unknown pairs
    pub fn canonical_label(&self, label: &CategoryLabel) -> Result<CategoryLabel> {
        let category = self
            .taxonomy
            .find(&label.category)
            .ok_or_else(|| Error::Validation(format!("unknown category '{}'", label.category)))?;
        let subcategory = category
            .subcategories
            .iter()
            .find(|s| s.eq_ignore_ascii_case(label.subcategory.trim()))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "'{}' is not a subcategory of {}",
                    label.subcategory, category.name
                ))
            })?;
        Ok(CategoryLabel::new(category.name, *subcategory))
    }

    async fn record_usage(&self, user_id: &str, rule_id: i64, times: u32) {
        for _ in 0..times {
            if let Err(e) = self.store.record_rule_usage(user_id, rule_id).await {
                warn!("Failed to record usage of rule {}: {}", rule_id, e);
                return;
            }
        }
    }
}

/// Highest-confidence candidate becomes the result, the rest its alternatives
fn rank_candidates(mut candidates: Vec<Alternative>) -> Option<CategorizationResult> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut iter = candidates.into_iter();
    let top = iter.next()?;
    let mut result =
        CategorizationResult::new(top.category, top.subcategory, top.confidence, top.source);
    for alt in iter {
        let duplicate = (alt.category == result.category && alt.subcategory == result.subcategory)
            || result
                .alternatives
                .iter()
                .any(|a| a.category == alt.category && a.subcategory == alt.subcategory);
        if !duplicate {
            result.alternatives.push(alt);
        }
    }
    Some(result)
}
