//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::pipeline::{PipelineOrchestrator, ProcessingContext, RawTransaction};
    use crate::store::TransactionStore;
    use crate::test_utils::tx_on;
    use chrono::Utc;
    use std::sync::Arc;

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.list_transactions("u1").unwrap().is_empty());
        assert_eq!(db.taxonomy_version().unwrap(), crate::taxonomy::TAXONOMY_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::in_memory().unwrap();
        db.insert_transaction("u1", &tx_on("Starbucks", 5.0, "", "2024-06-01"))
            .unwrap();

        let reopened = Database::new(db.path()).unwrap();
        assert_eq!(reopened.count_transactions("u1").unwrap(), 1);
    }

    #[test]
    fn test_transaction_roundtrip() {
        let db = Database::in_memory().unwrap();
        let tx = tx_on("Shell", 40.5, "pump 4", "2024-06-02")
            .with_category("Transportation", "Gas & Fuel")
            .with_source(TransactionSource::Receipt);

        let id = db.insert_transaction("u1", &tx).unwrap();
        let stored = db.get_transaction("u1", id).unwrap().unwrap();

        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.merchant, "Shell");
        assert_eq!(stored.amount, 40.5);
        assert_eq!(stored.description, "pump 4");
        assert_eq!(stored.date, tx.date);
        assert_eq!(stored.subcategory.as_deref(), Some("Gas & Fuel"));
        assert_eq!(stored.source, TransactionSource::Receipt);
    }

    #[test]
    fn test_transactions_are_scoped_by_user() {
        let db = Database::in_memory().unwrap();
        let id = db
            .insert_transaction("alice", &tx_on("Target", 20.0, "", "2024-06-01"))
            .unwrap();
        db.insert_transaction("bob", &tx_on("Shell", 30.0, "", "2024-06-01"))
            .unwrap();

        assert!(db.get_transaction("bob", id).unwrap().is_none());
        let alice = db.list_transactions("alice").unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].merchant, "Target");
    }

    #[test]
    fn test_history_in_insertion_order() {
        let db = Database::in_memory().unwrap();
        db.insert_transaction("u1", &tx_on("B", 1.0, "", "2024-06-05")).unwrap();
        db.insert_transaction("u1", &tx_on("A", 2.0, "", "2024-06-01")).unwrap();

        let merchants: Vec<String> = db
            .list_transactions("u1")
            .unwrap()
            .into_iter()
            .map(|t| t.merchant)
            .collect();
        assert_eq!(merchants, vec!["B", "A"]);
    }

    #[test]
    fn test_fingerprint_lookup() {
        let db = Database::in_memory().unwrap();
        let tx = tx_on("Starbucks #42", 5.47, "Latte", "2024-06-01");
        let first = db.insert_transaction("u1", &tx).unwrap();
        db.insert_transaction("u1", &tx).unwrap();

        // Same fields after normalization match the first insert
        let same = tx_on("STARBUCKS", 5.47, "latte ", "2024-06-01");
        assert_eq!(
            db.find_transaction_by_fingerprint("u1", &same.fingerprint()).unwrap(),
            Some(first)
        );
        assert_eq!(
            db.find_transaction_by_fingerprint("u2", &same.fingerprint()).unwrap(),
            None
        );
    }

    #[test]
    fn test_update_category() {
        let db = Database::in_memory().unwrap();
        let id = db
            .insert_transaction("u1", &tx_on("Pixel Arcade", 12.0, "", "2024-06-01"))
            .unwrap();

        let label = CategoryLabel::new("Entertainment", "Games");
        db.update_transaction_category("u1", id, &label, 1.0).unwrap();
        let stored = db.get_transaction("u1", id).unwrap().unwrap();
        assert_eq!(stored.category.as_deref(), Some("Entertainment"));
        assert_eq!(stored.confidence, Some(1.0));

        let missing = db.update_transaction_category("u2", id, &label, 1.0);
        assert!(matches!(missing, Err(crate::Error::NotFound(_))));
    }

    fn pattern(key: &str, category: &str, usage_count: u32) -> UserPattern {
        UserPattern {
            merchant: key.to_string(),
            merchant_key: key.to_string(),
            amount_range: Some(AmountRange { min: 8.0, max: 12.0 }),
            description_hint: Some("weekly".into()),
            category: category.to_string(),
            subcategory: "General".into(),
            confidence: 0.8,
            usage_count,
            last_used_at: Utc::now(),
        }
    }

    #[test]
    fn test_pattern_upsert_by_merchant_key() {
        let db = Database::in_memory().unwrap();
        db.upsert_pattern("u1", &pattern("corner shop", "Other", 1)).unwrap();
        db.upsert_pattern("u1", &pattern("corner shop", "Shopping", 2)).unwrap();
        db.upsert_pattern("u2", &pattern("corner shop", "Other", 1)).unwrap();

        let patterns = db.list_patterns("u1").unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].category, "Shopping");
        assert_eq!(patterns[0].usage_count, 2);
        assert_eq!(patterns[0].amount_range, Some(AmountRange { min: 8.0, max: 12.0 }));
        assert_eq!(patterns[0].description_hint.as_deref(), Some("weekly"));
        assert_eq!(db.list_patterns("u2").unwrap().len(), 1);
    }

    fn new_rule(name: &str, priority: i32) -> NewCustomRule {
        NewCustomRule {
            name: name.to_string(),
            conditions: vec![
                RuleCondition::MerchantContains {
                    value: "costco".into(),
                },
                RuleCondition::AmountBetween {
                    min: 50.0,
                    max: 500.0,
                },
            ],
            category: "Food & Dining".into(),
            subcategory: "Groceries".into(),
            priority,
            auto_generated: false,
        }
    }

    #[test]
    fn test_rule_crud() {
        let db = Database::in_memory().unwrap();
        let low = db.create_rule("u1", &new_rule("low", 1)).unwrap();
        let high = db.create_rule("u1", &new_rule("high", 10)).unwrap();

        let rules = db.list_rules("u1").unwrap();
        assert_eq!(
            rules.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![high.id, low.id]
        );
        assert_eq!(rules[0].conditions, high.conditions);
        assert_eq!(rules[0], high);

        db.increment_rule_usage("u1", low.id).unwrap();
        db.increment_rule_usage("u1", low.id).unwrap();

        let mut retargeted = low.clone();
        retargeted.category = "Shopping".into();
        retargeted.subcategory = "General Merchandise".into();
        retargeted.usage_count = 2;
        db.update_rule(&retargeted).unwrap();

        let rules = db.list_rules("u1").unwrap();
        let stored = rules.iter().find(|r| r.id == low.id).unwrap();
        assert_eq!(stored.category, "Shopping");
        assert_eq!(stored.usage_count, 2);

        assert!(db.increment_rule_usage("u2", low.id).is_err());
        assert!(db.list_rules("u2").unwrap().is_empty());
    }

    #[test]
    fn test_profile_roundtrip() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_profile("u1").unwrap().is_none());

        let mut profile = UserProfile::new("u1");
        profile.monthly_income = Some(4200.0);
        profile.budget_limits.insert("Food & Dining".into(), 300.0);
        profile.financial_goals.push(FinancialGoal {
            id: "trip".into(),
            name: "Lisbon".into(),
            target: 1500.0,
            current: 250.0,
            deadline: chrono::NaiveDate::from_ymd_opt(2025, 5, 1),
        });
        db.upsert_profile(&profile).unwrap();

        profile.average_monthly_spending = 812.5;
        db.upsert_profile(&profile).unwrap();

        assert_eq!(db.get_profile("u1").unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_store_trait_defaults_profile() {
        let db = Database::in_memory().unwrap();
        let profile = db.load_profile("newcomer").await.unwrap();
        assert_eq!(profile, UserProfile::new("newcomer"));
        assert!(db.load_history("newcomer").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_over_sqlite() {
        let db = Arc::new(Database::in_memory().unwrap());
        let orchestrator = PipelineOrchestrator::new(db.clone(), EngineConfig::default());
        let ctx = ProcessingContext::new("u1", TransactionSource::Manual);

        let result = orchestrator
            .process(&RawTransaction::new("Corner Shop", 9.5, "", "2024-06-01"), &ctx)
            .await;
        let id = result.transaction.unwrap().id.unwrap();

        let label = CategoryLabel::new("Food & Dining", "Groceries");
        for _ in 0..3 {
            orchestrator.apply_correction("u1", id, &label).await.unwrap();
        }

        let rules = db.list_rules("u1").unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].auto_generated);

        let next = orchestrator
            .process(&RawTransaction::new("Corner Shop", 30.0, "", "2024-06-03"), &ctx)
            .await;
        let categorization = next.categorization.unwrap();
        assert_eq!(categorization.source, CategorizationSource::CustomRule);
        assert_eq!(categorization.category, "Food & Dining");
        assert_eq!(db.list_rules("u1").unwrap()[0].usage_count, 1);

        let profile = db.get_profile("u1").unwrap().unwrap();
        assert!((profile.average_monthly_spending - 39.5).abs() < 1e-9);
    }
}
