//! Custom rule evaluation and auto-rule synthesis

use crate::models::{CustomRule, NewCustomRule, RuleCondition, Transaction, UserPattern};
use crate::taxonomy::normalize_merchant;

impl RuleCondition {
    /// Evaluate this condition against a transaction
    pub fn matches(&self, tx: &Transaction) -> bool {
        match self {
            RuleCondition::MerchantEquals { value } => {
                let key = normalize_merchant(value);
                !key.is_empty() && key == tx.merchant_key()
            }
            RuleCondition::MerchantContains { value } => {
                !value.trim().is_empty()
                    && tx
                        .merchant
                        .to_lowercase()
                        .contains(&value.trim().to_lowercase())
            }
            RuleCondition::AmountBetween { min, max } => tx.amount >= *min && tx.amount <= *max,
            RuleCondition::DescriptionContains { value } => {
                !value.trim().is_empty()
                    && tx
                        .description
                        .to_lowercase()
                        .contains(&value.trim().to_lowercase())
            }
            RuleCondition::DescriptionContainsAny { values } => {
                let desc = tx.description.to_lowercase();
                values
                    .iter()
                    .map(|v| v.trim().to_lowercase())
                    .any(|v| !v.is_empty() && desc.contains(&v))
            }
        }
    }

    /// Structural problems that make a condition unusable
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            RuleCondition::MerchantEquals { value }
            | RuleCondition::MerchantContains { value }
            | RuleCondition::DescriptionContains { value } => {
                if value.trim().is_empty() {
                    return Err("condition value must not be empty".to_string());
                }
            }
            RuleCondition::AmountBetween { min, max } => {
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(format!("invalid amount range {}..{}", min, max));
                }
            }
            RuleCondition::DescriptionContainsAny { values } => {
                if values.iter().all(|v| v.trim().is_empty()) {
                    return Err("contains_any needs at least one value".to_string());
                }
            }
        }
        Ok(())
    }
}

impl CustomRule {
    /// A rule matches only if every condition holds (and it has at least one)
    pub fn matches(&self, tx: &Transaction) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.matches(tx))
    }

    /// Auto-rules are single exact-merchant rules; returns that merchant key
    pub fn auto_merchant_key(&self) -> Option<String> {
        if !self.auto_generated {
            return None;
        }
        match self.conditions.as_slice() {
            [RuleCondition::MerchantEquals { value }] => Some(normalize_merchant(value)),
            _ => None,
        }
    }
}

/// First matching rule in descending priority order
///
/// Ties keep the older rule first (lower id).
pub fn find_matching_rule<'r>(rules: &'r [CustomRule], tx: &Transaction) -> Option<&'r CustomRule> {
    let mut ordered: Vec<&CustomRule> = rules.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
    ordered.into_iter().find(|rule| rule.matches(tx))
}

/// Build the deterministic rule that replaces a well-established pattern
pub fn auto_rule_for(pattern: &UserPattern, priority: i32) -> NewCustomRule {
    NewCustomRule {
        name: format!("Auto: {}", pattern.merchant),
        conditions: vec![RuleCondition::MerchantEquals {
            value: pattern.merchant_key.clone(),
        }],
        category: pattern.category.clone(),
        subcategory: pattern.subcategory.clone(),
        priority,
        auto_generated: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn tx(merchant: &str, amount: f64, description: &str) -> Transaction {
        Transaction::new(
            merchant,
            amount,
            description,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        )
    }

    fn rule(id: i64, priority: i32, conditions: Vec<RuleCondition>, category: &str) -> CustomRule {
        CustomRule {
            id,
            user_id: "u1".to_string(),
            name: format!("rule {}", id),
            conditions,
            category: category.to_string(),
            subcategory: "General Merchandise".to_string(),
            priority,
            auto_generated: false,
            created_at: Utc::now(),
            usage_count: 0,
        }
    }

    #[test]
    fn test_merchant_conditions() {
        let t = tx("COSTCO WHSE #0113", 80.0, "");
        assert!(RuleCondition::MerchantEquals {
            value: "Costco Whse".into()
        }
        .matches(&t));
        assert!(RuleCondition::MerchantContains {
            value: "costco".into()
        }
        .matches(&t));
        assert!(!RuleCondition::MerchantEquals {
            value: "Costco".into()
        }
        .matches(&t));
        assert!(!RuleCondition::MerchantContains { value: "  ".into() }.matches(&t));
    }

    #[test]
    fn test_amount_and_description_conditions() {
        let t = tx("Corner Shop", 42.0, "Birthday GIFT wrap");
        assert!(RuleCondition::AmountBetween { min: 40.0, max: 42.0 }.matches(&t));
        assert!(!RuleCondition::AmountBetween { min: 0.0, max: 41.99 }.matches(&t));
        assert!(RuleCondition::DescriptionContains {
            value: "gift".into()
        }
        .matches(&t));
        assert!(RuleCondition::DescriptionContainsAny {
            values: vec!["flowers".into(), "gift".into()]
        }
        .matches(&t));
        assert!(!RuleCondition::DescriptionContainsAny {
            values: vec!["flowers".into(), "".into()]
        }
        .matches(&t));
    }

    #[test]
    fn test_rule_requires_all_conditions() {
        let r = rule(
            1,
            10,
            vec![
                RuleCondition::MerchantContains {
                    value: "target".into(),
                },
                RuleCondition::AmountBetween {
                    min: 100.0,
                    max: 500.0,
                },
            ],
            "Shopping",
        );
        assert!(r.matches(&tx("Target", 150.0, "")));
        assert!(!r.matches(&tx("Target", 50.0, "")));

        let empty = rule(2, 10, vec![], "Shopping");
        assert!(!empty.matches(&tx("Target", 150.0, "")));
    }

    #[test]
    fn test_find_matching_rule_priority_order() {
        let contains_uber = RuleCondition::MerchantContains {
            value: "uber".into(),
        };
        let rules = vec![
            rule(1, 50, vec![contains_uber.clone()], "Food & Dining"),
            rule(2, 100, vec![contains_uber.clone()], "Transportation"),
            rule(3, 100, vec![contains_uber], "Travel"),
        ];

        let matched = find_matching_rule(&rules, &tx("UBER EATS", 20.0, "")).unwrap();
        // Highest priority wins; equal priority keeps the older rule
        assert_eq!(matched.id, 2);
        assert_eq!(matched.category, "Transportation");

        assert!(find_matching_rule(&rules, &tx("Lyft", 20.0, "")).is_none());
    }

    #[test]
    fn test_condition_validation() {
        assert!(RuleCondition::AmountBetween { min: 5.0, max: 1.0 }
            .validate()
            .is_err());
        assert!(RuleCondition::MerchantEquals { value: "".into() }
            .validate()
            .is_err());
        assert!(RuleCondition::DescriptionContainsAny { values: vec![] }
            .validate()
            .is_err());
        assert!(RuleCondition::AmountBetween { min: 1.0, max: 5.0 }
            .validate()
            .is_ok());
    }

    #[test]
    fn test_auto_rule_for_pattern() {
        let pattern = UserPattern {
            merchant: "Blue Bottle".into(),
            merchant_key: "blue bottle".into(),
            amount_range: None,
            description_hint: None,
            category: "Food & Dining".into(),
            subcategory: "Coffee & Tea".into(),
            confidence: 1.0,
            usage_count: 3,
            last_used_at: Utc::now(),
        };
        let new_rule = auto_rule_for(&pattern, 100);
        assert!(new_rule.auto_generated);
        assert_eq!(new_rule.priority, 100);
        assert_eq!(new_rule.name, "Auto: Blue Bottle");
        assert_eq!(
            new_rule.conditions,
            vec![RuleCondition::MerchantEquals {
                value: "blue bottle".into()
            }]
        );
    }
}
