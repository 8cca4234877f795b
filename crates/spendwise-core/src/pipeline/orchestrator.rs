//! Pipeline orchestrator
//!
//! Single-item flow: extract/validate → categorize → analyze → insights →
//! persist → profile refresh → automation triggers. Every failure becomes a
//! `ProcessingResult` with `success: false`; nothing before the failing
//! stage is rolled back.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::analysis::{average_monthly_spend, AnalysisEngine, AnalysisResult, Trend};
use crate::categorize::{CategorizationEngine, LearningOutcome};
use crate::config::{EngineConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::models::{CategoryLabel, FinancialGoal, Transaction, UserProfile};
use crate::store::TransactionStore;

use super::automation::{AutomationDispatcher, AutomationKind, LoggingDispatcher};
use super::extract::{from_extracted, validate, DocumentExtractor};
use super::stats::StatsTracker;
use super::types::{
    BatchFailure, BatchResult, PipelineStage, ProcessingContext, ProcessingFailure,
    ProcessingResult, ProcessingStats, RawTransaction,
};

pub struct PipelineOrchestrator {
    store: Arc<dyn TransactionStore>,
    categorizer: CategorizationEngine,
    analyzer: AnalysisEngine,
    extractor: Option<Arc<dyn DocumentExtractor>>,
    dispatcher: Arc<dyn AutomationDispatcher>,
    config: PipelineConfig,
    stats: StatsTracker,
}

/// Everything a successful run produced
struct Processed {
    transaction: Transaction,
    categorization: crate::models::CategorizationResult,
    analysis: AnalysisResult,
    extraction_confidence: f64,
    insights: Vec<String>,
}

impl PipelineOrchestrator {
    /// Orchestrator with the logging dispatcher and no document extractor
    pub fn new(store: Arc<dyn TransactionStore>, config: EngineConfig) -> Self {
        Self {
            categorizer: CategorizationEngine::new(store.clone(), config.categorization),
            analyzer: AnalysisEngine::new(store.clone(), config.analysis),
            store,
            extractor: None,
            dispatcher: Arc::new(LoggingDispatcher),
            config: config.pipeline,
            stats: StatsTracker::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn AutomationDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn categorizer(&self) -> &CategorizationEngine {
        &self.categorizer
    }

    pub fn analyzer(&self) -> &AnalysisEngine {
        &self.analyzer
    }

    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    /// Process one raw transaction end to end
    pub async fn process(&self, raw: &RawTransaction, ctx: &ProcessingContext) -> ProcessingResult {
        let started = Instant::now();
        let mut warnings = Vec::new();

        let result = match self.run(raw, ctx, &mut warnings).await {
            Ok(done) => ProcessingResult {
                success: true,
                transaction: Some(done.transaction),
                categorization: Some(done.categorization),
                analysis: Some(done.analysis),
                extraction_confidence: Some(done.extraction_confidence),
                error: None,
                insights: done.insights,
                warnings,
            },
            Err(failure) => {
                warn!(
                    user_id = %ctx.user_id,
                    stage = failure.stage.as_str(),
                    "Processing failed: {}",
                    failure.message
                );
                ProcessingResult::failed(failure, warnings)
            }
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.stats.record(result.success, latency_ms);
        result
    }

    async fn run(
        &self,
        raw: &RawTransaction,
        ctx: &ProcessingContext,
        warnings: &mut Vec<String>,
    ) -> std::result::Result<Processed, ProcessingFailure> {
        let user_id = ctx.user_id.as_str();

        // 1. Extract
        let (mut tx, extraction_confidence) = self.extract(raw, ctx).await?;

        // 2. Categorize
        let categorization = self
            .categorizer
            .categorize(&tx, user_id)
            .await
            .map_err(|e| ProcessingFailure::new(PipelineStage::Categorize, e))?;
        tx.apply_categorization(&categorization);

        // 3. Analyze
        let analysis = self
            .analyzer
            .analyze(&tx, user_id)
            .await
            .map_err(|e| ProcessingFailure::new(PipelineStage::Analyze, e))?;

        // 4. Insights
        let insights = self.derive_insights(&tx, &analysis);

        // 5. Persist
        match self.store.find_by_fingerprint(user_id, &tx.fingerprint()).await {
            Ok(Some(existing)) => {
                warnings.push(format!("Possible duplicate of transaction #{}", existing))
            }
            Ok(None) => {}
            Err(e) => warnings.push(format!("Duplicate check failed: {}", e)),
        }
        let id = self
            .store
            .save_transaction(user_id, &tx)
            .await
            .map_err(|e| ProcessingFailure::new(PipelineStage::Persist, e))?;
        tx.id = Some(id);
        debug!(
            user_id = %user_id,
            "Stored transaction #{} as {} / {}",
            id,
            categorization.category,
            categorization.subcategory
        );

        // 6. Profile refresh
        if let Err(e) = self.refresh_profile(user_id).await {
            warnings.push(format!("Profile refresh failed: {}", e));
        }

        // 7. Automation
        for kind in self.triggers_for(&tx, &analysis) {
            if let Err(e) = self.dispatcher.trigger(kind, &tx, ctx).await {
                warn!(trigger = kind.as_str(), "Automation dispatch failed: {}", e);
                warnings.push(format!("Automation '{}' failed: {}", kind, e));
            }
        }

        Ok(Processed {
            transaction: tx,
            categorization,
            analysis,
            extraction_confidence,
            insights,
        })
    }

    async fn extract(
        &self,
        raw: &RawTransaction,
        ctx: &ProcessingContext,
    ) -> std::result::Result<(Transaction, f64), ProcessingFailure> {
        let validate_failure = |e: Error| ProcessingFailure::new(PipelineStage::Validate, e);

        match (&raw.document, ctx.source.needs_extraction()) {
            (Some(payload), true) => {
                let extractor = self.extractor.as_ref().ok_or_else(|| {
                    ProcessingFailure::new(
                        PipelineStage::Extract,
                        "no document extractor configured",
                    )
                })?;
                let extracted = extractor
                    .extract(ctx.source, payload)
                    .await
                    .map_err(|e| ProcessingFailure::new(PipelineStage::Extract, e))?;
                let tx = from_extracted(&extracted, ctx.source).map_err(validate_failure)?;
                Ok((tx, extracted.confidence.clamp(0.0, 1.0)))
            }
            _ => {
                let tx = validate(raw, ctx.source).map_err(validate_failure)?;
                Ok((tx, 1.0))
            }
        }
    }

    fn derive_insights(&self, tx: &Transaction, analysis: &AnalysisResult) -> Vec<String> {
        let mut insights = Vec::new();
        let category = &analysis.category.category;

        if analysis.velocity.is_unusual {
            insights.push(format!(
                "Unusual spending: ${:.2} is {:.0}% above your typical {} amount",
                tx.amount, analysis.velocity.percentage_above_normal, category
            ));
        }
        if analysis.category.trend != Trend::Stable {
            insights.push(format!(
                "{} spending is {}",
                category, analysis.category.trend
            ));
        }
        if let (Some(limit), true) = (analysis.budget.limit, analysis.budget.projected_overspend) {
            insights.push(format!(
                "Projected to exceed your {} budget: ${:.2} of ${:.2}",
                category, analysis.budget.projected_spend, limit
            ));
        }
        if analysis.merchant.frequency >= self.config.recurring_trigger_frequency {
            insights.push(format!(
                "Frequent merchant: {} previous visits to {}",
                analysis.merchant.frequency, tx.merchant
            ));
        }
        insights.extend(analysis.recommendations.iter().cloned());
        insights
    }

    fn triggers_for(&self, tx: &Transaction, analysis: &AnalysisResult) -> Vec<AutomationKind> {
        let mut kinds = Vec::new();
        if analysis.budget.projected_overspend {
            kinds.push(AutomationKind::BudgetAlert);
        }
        if analysis.merchant.frequency > self.config.recurring_trigger_frequency {
            kinds.push(AutomationKind::RecurringDetected);
        }
        if tx.amount > self.config.high_value_threshold {
            kinds.push(AutomationKind::HighValue);
        }
        kinds
    }

    async fn refresh_profile(&self, user_id: &str) -> Result<()> {
        let history = self.store.load_history(user_id).await?;
        let mut profile = self.store.load_profile(user_id).await?;
        profile.average_monthly_spending = average_monthly_spend(history.iter());
        self.store.save_profile(&profile).await
    }

    /// Process items in fixed-size chunks; items within a chunk run concurrently
    pub async fn process_batch(&self, items: &[RawTransaction], ctx: &ProcessingContext) -> BatchResult {
        let batch_id = ctx
            .batch_id
            .clone()
            .unwrap_or_else(|| format!("batch-{}", Utc::now().timestamp_millis()));
        let item_ctx = ProcessingContext {
            batch_id: Some(batch_id.clone()),
            ..ctx.clone()
        };

        info!(
            user_id = %ctx.user_id,
            batch_id = %batch_id,
            items = items.len(),
            "Starting batch"
        );

        let mut results = Vec::with_capacity(items.len());
        for chunk in items.chunks(self.config.batch_chunk_size.max(1)) {
            let chunk_results = join_all(chunk.iter().map(|raw| self.process(raw, &item_ctx))).await;
            results.extend(chunk_results);
        }

        let mut batch = BatchResult {
            batch_id,
            total: items.len(),
            ..Default::default()
        };
        let mut merchants: BTreeMap<String, (String, usize)> = BTreeMap::new();

        for (index, result) in results.iter().enumerate() {
            match (&result.transaction, &result.error) {
                (Some(tx), _) if result.success => {
                    batch.successful += 1;
                    batch.total_amount += tx.amount;
                    *batch
                        .category_counts
                        .entry(tx.category_or_fallback().to_string())
                        .or_insert(0) += 1;
                    merchants
                        .entry(tx.merchant_key())
                        .or_insert_with(|| (tx.merchant.clone(), 0))
                        .1 += 1;
                }
                (_, error) => {
                    batch.failed += 1;
                    batch.failures.push(BatchFailure {
                        index,
                        failure: error.clone().unwrap_or_else(|| {
                            ProcessingFailure::new(PipelineStage::Persist, "unknown failure")
                        }),
                    });
                }
            }
        }

        batch.insights = self.batch_insights(&batch, &merchants);
        batch.results = results;

        info!(
            batch_id = %batch.batch_id,
            successful = batch.successful,
            failed = batch.failed,
            "Batch complete"
        );
        batch
    }

    fn batch_insights(
        &self,
        batch: &BatchResult,
        merchants: &BTreeMap<String, (String, usize)>,
    ) -> Vec<String> {
        let mut insights = vec![format!(
            "Processed {} of {} transactions totaling ${:.2}",
            batch.successful, batch.total, batch.total_amount
        )];

        let mut top: Option<(&String, usize)> = None;
        for (category, &count) in &batch.category_counts {
            if top.map(|(_, best)| count > best).unwrap_or(true) {
                top = Some((category, count));
            }
        }
        if let Some((category, count)) = top {
            insights.push(format!("Top category: {} ({} transactions)", category, count));
        }

        for (merchant, count) in merchants.values() {
            if *count >= self.config.batch_repeat_threshold {
                insights.push(format!("{} appears {} times in this batch", merchant, count));
            }
        }

        if batch.failed > 0 {
            insights.push(format!("{} transactions failed", batch.failed));
        }
        insights
    }

    /// Record a user correction on a stored transaction and learn from it
    pub async fn apply_correction(
        &self,
        user_id: &str,
        transaction_id: i64,
        label: &CategoryLabel,
    ) -> Result<LearningOutcome> {
        let tx = self
            .store
            .get_transaction(user_id, transaction_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("transaction #{}", transaction_id)))?;
        let label = self.categorizer.canonical_label(label)?;

        self.store
            .update_category(user_id, transaction_id, &label, 1.0)
            .await?;
        let outcome = self
            .categorizer
            .learn_from_correction(user_id, &tx, tx.category.as_deref(), &label)
            .await?;

        info!(
            user_id = %user_id,
            "Corrected transaction #{} to {}",
            transaction_id,
            label
        );
        Ok(outcome)
    }

    /// Set (or with `None`, remove) a monthly category limit
    pub async fn set_budget_limit(
        &self,
        user_id: &str,
        category: &str,
        limit: Option<f64>,
    ) -> Result<UserProfile> {
        let name = self
            .categorizer
            .taxonomy()
            .find(category)
            .map(|c| c.name)
            .ok_or_else(|| Error::Validation(format!("unknown category '{}'", category)))?;

        let mut profile = self.store.load_profile(user_id).await?;
        match limit {
            Some(limit) if limit.is_finite() && limit > 0.0 => {
                profile.budget_limits.insert(name.to_string(), limit);
            }
            Some(limit) => {
                return Err(Error::Validation(format!(
                    "budget limit must be positive, got {}",
                    limit
                )))
            }
            None => {
                profile.budget_limits.remove(name);
            }
        }
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    /// Insert or replace a goal by id
    pub async fn upsert_goal(&self, user_id: &str, goal: FinancialGoal) -> Result<UserProfile> {
        if goal.id.trim().is_empty() {
            return Err(Error::Validation("goal id must not be empty".into()));
        }
        if !goal.target.is_finite() || goal.target <= 0.0 {
            return Err(Error::Validation("goal target must be positive".into()));
        }

        let mut profile = self.store.load_profile(user_id).await?;
        match profile.financial_goals.iter_mut().find(|g| g.id == goal.id) {
            Some(existing) => *existing = goal,
            None => profile.financial_goals.push(goal),
        }
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    pub fn get_stats(&self) -> ProcessingStats {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategorizationSource, TransactionSource};
    use crate::store::MemoryStore;
    use crate::test_utils::{
        FailingDispatcher, FailingStore, RecordingDispatcher, StaticExtractor,
    };

    fn ctx() -> ProcessingContext {
        ProcessingContext::new("u1", TransactionSource::Manual)
    }

    fn orchestrator() -> (Arc<MemoryStore>, Arc<RecordingDispatcher>, PipelineOrchestrator) {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let orchestrator = PipelineOrchestrator::new(store.clone(), EngineConfig::default())
            .with_dispatcher(dispatcher.clone());
        (store, dispatcher, orchestrator)
    }

    #[tokio::test]
    async fn test_process_manual_entry() {
        let (store, _, orchestrator) = orchestrator();
        let raw = RawTransaction::new("Starbucks", 5.47, "latte", "2024-06-01");

        let result = orchestrator.process(&raw, &ctx()).await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.extraction_confidence, Some(1.0));

        let tx = result.transaction.unwrap();
        assert!(tx.id.is_some());
        assert_eq!(tx.category.as_deref(), Some("Food & Dining"));
        assert_eq!(tx.subcategory.as_deref(), Some("Coffee & Tea"));
        assert_eq!(
            result.categorization.unwrap().source,
            CategorizationSource::Merchant
        );

        assert_eq!(store.load_history("u1").await.unwrap().len(), 1);
        let profile = store.load_profile("u1").await.unwrap();
        assert_eq!(profile.average_monthly_spending, 5.47);

        let stats = orchestrator.get_stats();
        assert_eq!(stats.total_processed, 1);
        assert_eq!(stats.successful, 1);
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_store() {
        let (store, _, orchestrator) = orchestrator();
        let raw = RawTransaction::new("Starbucks", -5.0, "", "2024-06-01");

        let result = orchestrator.process(&raw, &ctx()).await;
        assert!(!result.success);
        assert!(result.transaction.is_none());
        assert_eq!(result.error.unwrap().stage, PipelineStage::Validate);
        assert!(store.load_history("u1").await.unwrap().is_empty());
        assert_eq!(orchestrator.get_stats().failed, 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_reported() {
        let store = Arc::new(FailingStore::failing_saves(MemoryStore::new()));
        let orchestrator = PipelineOrchestrator::new(store, EngineConfig::default());

        let raw = RawTransaction::new("Starbucks", 5.0, "", "2024-06-01");
        let result = orchestrator.process(&raw, &ctx()).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().stage, PipelineStage::Persist);
    }

    #[tokio::test]
    async fn test_store_read_failure_fails_categorize() {
        let store = Arc::new(FailingStore::failing_reads(MemoryStore::new()));
        let orchestrator = PipelineOrchestrator::new(store, EngineConfig::default());

        let raw = RawTransaction::new("Starbucks", 5.0, "", "2024-06-01");
        let result = orchestrator.process(&raw, &ctx()).await;
        assert!(!result.success);
        assert_eq!(result.error.unwrap().stage, PipelineStage::Categorize);
    }

    #[tokio::test]
    async fn test_automation_failure_is_a_warning() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = PipelineOrchestrator::new(store, EngineConfig::default())
            .with_dispatcher(Arc::new(FailingDispatcher));

        let raw = RawTransaction::new("Best Buy", 999.0, "tv", "2024-06-01");
        let result = orchestrator.process(&raw, &ctx()).await;
        assert!(result.success);
        assert!(result.warnings.iter().any(|w| w.contains("high_value")));
    }

    #[tokio::test]
    async fn test_triggers_fired() {
        let (_, dispatcher, orchestrator) = orchestrator();
        orchestrator
            .set_budget_limit("u1", "shopping", Some(100.0))
            .await
            .unwrap();

        for day in 1..=4 {
            let raw = RawTransaction::new("Target", 10.0, "", format!("2024-06-0{}", day));
            assert!(orchestrator.process(&raw, &ctx()).await.success);
        }
        // Fifth visit: frequency 4 > 3, amount > 500, budget blown
        let raw = RawTransaction::new("Target", 600.0, "", "2024-06-05");
        let result = orchestrator.process(&raw, &ctx()).await;
        assert!(result.success);

        let fired = dispatcher.kinds();
        assert!(fired.contains(&AutomationKind::RecurringDetected));
        assert!(fired.contains(&AutomationKind::HighValue));
        assert!(fired.contains(&AutomationKind::BudgetAlert));
        assert!(result
            .insights
            .iter()
            .any(|i| i.starts_with("Projected to exceed your Shopping budget")));
    }

    #[tokio::test]
    async fn test_duplicate_warning() {
        let (store, _, orchestrator) = orchestrator();
        let raw = RawTransaction::new("Starbucks", 5.0, "latte", "2024-06-01");

        let first = orchestrator.process(&raw, &ctx()).await;
        let second = orchestrator.process(&raw, &ctx()).await;
        let first_id = first.transaction.unwrap().id.unwrap();

        assert!(second.success);
        assert_eq!(
            second.warnings,
            vec![format!("Possible duplicate of transaction #{}", first_id)]
        );
        assert_eq!(store.load_history("u1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_receipt_uses_extractor() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = PipelineOrchestrator::new(store, EngineConfig::default())
            .with_extractor(Arc::new(StaticExtractor::new("Shell", 42.0, "2024-06-02", 0.75)));
        let receipt_ctx = ProcessingContext::new("u1", TransactionSource::Receipt);

        let result = orchestrator
            .process(&RawTransaction::document("<jpeg bytes>"), &receipt_ctx)
            .await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.extraction_confidence, Some(0.75));
        let tx = result.transaction.unwrap();
        assert_eq!(tx.merchant, "Shell");
        assert_eq!(tx.source, TransactionSource::Receipt);
        assert_eq!(tx.category.as_deref(), Some("Transportation"));
    }

    #[tokio::test]
    async fn test_receipt_without_extractor_fails_extract() {
        let (_, _, orchestrator) = orchestrator();
        let receipt_ctx = ProcessingContext::new("u1", TransactionSource::Receipt);
        let result = orchestrator
            .process(&RawTransaction::document("<jpeg bytes>"), &receipt_ctx)
            .await;
        assert_eq!(result.error.unwrap().stage, PipelineStage::Extract);
    }

    #[tokio::test]
    async fn test_batch_partial_failure() {
        let (_, _, orchestrator) = orchestrator();
        let items = vec![
            RawTransaction::new("McDonalds", 8.0, "", "2024-06-01"),
            RawTransaction::new("McDonalds", 9.0, "", "2024-06-02"),
            RawTransaction::new("", 9.0, "", "2024-06-02"),
            RawTransaction::new("Netflix", 15.99, "", "2024-06-03"),
            RawTransaction::new("Shell", 40.0, "", "2024-06-03"),
            RawTransaction::new("McDonalds", 7.0, "", "2024-06-04"),
            RawTransaction::new("Target", "n/a", "", "2024-06-04"),
        ];

        let batch = orchestrator
            .process_batch(&items, &ctx().with_batch("june"))
            .await;
        assert_eq!(batch.batch_id, "june");
        assert_eq!(batch.total, 7);
        assert_eq!(batch.successful, 5);
        assert_eq!(batch.failed, 2);
        assert_eq!(batch.results.len(), 7);
        assert_eq!(
            batch.failures.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![2, 6]
        );
        assert_eq!(batch.category_counts.get("Food & Dining"), Some(&3));
        assert!((batch.total_amount - 79.99).abs() < 1e-9);
        assert!(batch
            .insights
            .contains(&"Top category: Food & Dining (3 transactions)".to_string()));
        assert!(batch
            .insights
            .contains(&"McDonalds appears 3 times in this batch".to_string()));
        assert!(batch.insights.contains(&"2 transactions failed".to_string()));
        assert_eq!(orchestrator.get_stats().total_processed, 7);
    }

    #[tokio::test]
    async fn test_batch_generates_id() {
        let (_, _, orchestrator) = orchestrator();
        let batch = orchestrator.process_batch(&[], &ctx()).await;
        assert!(batch.batch_id.starts_with("batch-"));
        assert_eq!(batch.total, 0);
    }

    #[tokio::test]
    async fn test_apply_correction_updates_and_learns() {
        let (store, _, orchestrator) = orchestrator();
        let raw = RawTransaction::new("Pixel Arcade", 12.0, "", "2024-06-01");
        let id = orchestrator
            .process(&raw, &ctx())
            .await
            .transaction
            .unwrap()
            .id
            .unwrap();

        let label = CategoryLabel::new("entertainment", "games");
        let outcome = orchestrator.apply_correction("u1", id, &label).await.unwrap();
        assert_eq!(outcome.pattern.category, "Entertainment");

        let stored = store.get_transaction("u1", id).await.unwrap().unwrap();
        assert_eq!(stored.category.as_deref(), Some("Entertainment"));
        assert_eq!(stored.subcategory.as_deref(), Some("Games"));
        assert_eq!(stored.confidence, Some(1.0));

        let missing = orchestrator.apply_correction("u1", 9999, &label).await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_budget_and_goal_updates() {
        let (store, _, orchestrator) = orchestrator();
        orchestrator
            .set_budget_limit("u1", "food & dining", Some(300.0))
            .await
            .unwrap();
        assert!(orchestrator
            .set_budget_limit("u1", "Crypto", Some(10.0))
            .await
            .is_err());
        assert!(orchestrator
            .set_budget_limit("u1", "Travel", Some(-1.0))
            .await
            .is_err());

        let goal = FinancialGoal {
            id: "emergency".into(),
            name: "Emergency fund".into(),
            target: 1000.0,
            current: 100.0,
            deadline: None,
        };
        orchestrator.upsert_goal("u1", goal.clone()).await.unwrap();
        orchestrator
            .upsert_goal(
                "u1",
                FinancialGoal {
                    current: 400.0,
                    ..goal
                },
            )
            .await
            .unwrap();

        let profile = store.load_profile("u1").await.unwrap();
        assert_eq!(profile.budget_for("Food & Dining"), Some(300.0));
        assert_eq!(profile.financial_goals.len(), 1);
        assert_eq!(profile.financial_goals[0].current, 400.0);

        let profile = orchestrator
            .set_budget_limit("u1", "Food & Dining", None)
            .await
            .unwrap();
        assert!(profile.budget_limits.is_empty());
    }
}
