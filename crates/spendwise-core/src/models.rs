//! Domain models for Spendwise

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::taxonomy::{normalize_merchant, FALLBACK_CATEGORY, FALLBACK_SUBCATEGORY};

/// Where a transaction entered the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    /// Typed in by the user
    #[default]
    Manual,
    /// Extracted from a receipt image/PDF
    Receipt,
    /// Extracted from a bank statement document
    Statement,
    /// Row from a CSV export
    Import,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Receipt => "receipt",
            Self::Statement => "statement",
            Self::Import => "import",
        }
    }

    /// Sources whose payload must go through the document extractor
    pub fn needs_extraction(&self) -> bool {
        matches!(self, Self::Receipt | Self::Statement)
    }
}

impl std::str::FromStr for TransactionSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "receipt" => Ok(Self::Receipt),
            "statement" => Ok(Self::Statement),
            "import" | "csv" => Ok(Self::Import),
            _ => Err(format!("Unknown transaction source: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction (an expense; amounts are always positive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Assigned by the store on persistence
    pub id: Option<i64>,
    pub merchant: String,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub source: TransactionSource,
}

impl Transaction {
    pub fn new(
        merchant: impl Into<String>,
        amount: f64,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            merchant: merchant.into(),
            amount,
            description: description.into(),
            date,
            category: None,
            subcategory: None,
            confidence: None,
            source: TransactionSource::Manual,
        }
    }

    pub fn with_source(mut self, source: TransactionSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_category(
        mut self,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Self {
        self.category = Some(category.into());
        self.subcategory = Some(subcategory.into());
        self
    }

    /// Category name, treating uncategorized transactions as "Other"
    pub fn category_or_fallback(&self) -> &str {
        self.category.as_deref().unwrap_or(FALLBACK_CATEGORY)
    }

    /// Normalized merchant used for all merchant comparisons
    pub fn merchant_key(&self) -> String {
        normalize_merchant(&self.merchant)
    }

    /// Merchant and description as one lowercase string for keyword scans
    pub fn search_text(&self) -> String {
        format!("{} {}", self.merchant, self.description).to_lowercase()
    }

    /// Copy a categorization outcome onto this transaction
    pub fn apply_categorization(&mut self, result: &CategorizationResult) {
        self.category = Some(result.category.clone());
        self.subcategory = Some(result.subcategory.clone());
        self.confidence = Some(result.confidence);
    }

    /// SHA-256 over date, normalized merchant, amount and description
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.date.to_string().as_bytes());
        hasher.update(self.merchant_key().as_bytes());
        hasher.update(((self.amount * 100.0).round() as i64).to_be_bytes());
        hasher.update(self.description.trim().to_lowercase().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A category/subcategory pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub category: String,
    pub subcategory: String,
}

impl CategoryLabel {
    pub fn new(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
        }
    }
}

impl std::fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.category, self.subcategory)
    }
}

/// Which layer of the categorization engine produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorizationSource {
    CustomRule,
    LearnedPattern,
    Heuristic,
    Keyword,
    Merchant,
    Fallback,
}

impl CategorizationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomRule => "custom_rule",
            Self::LearnedPattern => "learned_pattern",
            Self::Heuristic => "heuristic",
            Self::Keyword => "keyword",
            Self::Merchant => "merchant",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for CategorizationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lower-ranked candidate category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub category: String,
    pub subcategory: String,
    pub confidence: f64,
    pub source: CategorizationSource,
}

/// Outcome of categorizing one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationResult {
    pub category: String,
    pub subcategory: String,
    /// Always within [0, 1]
    pub confidence: f64,
    pub source: CategorizationSource,
    pub alternatives: Vec<Alternative>,
    /// Custom rule that matched (only set when source is CustomRule)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<i64>,
}

impl CategorizationResult {
    pub fn new(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        confidence: f64,
        source: CategorizationSource,
    ) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
            alternatives: Vec::new(),
            rule_id: None,
        }
    }

    /// The "Other / General" result used when nothing matched
    pub fn fallback() -> Self {
        Self::new(
            FALLBACK_CATEGORY,
            FALLBACK_SUBCATEGORY,
            0.1,
            CategorizationSource::Fallback,
        )
    }

    pub fn label(&self) -> CategoryLabel {
        CategoryLabel::new(self.category.clone(), self.subcategory.clone())
    }
}

/// Inclusive amount window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
}

impl AmountRange {
    /// Window of `amount ± tolerance` (tolerance as a fraction, e.g. 0.2)
    pub fn around(amount: f64, tolerance: f64) -> Self {
        Self {
            min: amount * (1.0 - tolerance),
            max: amount * (1.0 + tolerance),
        }
    }

    pub fn contains(&self, amount: f64) -> bool {
        amount >= self.min && amount <= self.max
    }
}

/// A per-user merchant → category association learned from corrections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPattern {
    /// Merchant as the user last saw it
    pub merchant: String,
    /// Normalized merchant, unique per user
    pub merchant_key: String,
    pub amount_range: Option<AmountRange>,
    pub description_hint: Option<String>,
    pub category: String,
    pub subcategory: String,
    pub confidence: f64,
    pub usage_count: u32,
    pub last_used_at: DateTime<Utc>,
}

/// One condition of a custom rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCondition {
    /// Normalized merchant equals the value
    MerchantEquals { value: String },
    /// Merchant contains the value (case-insensitive)
    MerchantContains { value: String },
    /// Amount within [min, max]
    AmountBetween { min: f64, max: f64 },
    /// Description contains the value (case-insensitive)
    DescriptionContains { value: String },
    /// Description contains any of the values (case-insensitive)
    DescriptionContainsAny { values: Vec<String> },
}

/// A user- or system-authored categorization override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRule {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub conditions: Vec<RuleCondition>,
    pub category: String,
    pub subcategory: String,
    pub priority: i32,
    /// Synthesized from repeated corrections
    pub auto_generated: bool,
    pub created_at: DateTime<Utc>,
    pub usage_count: u32,
}

/// A custom rule before it has been stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomRule {
    pub name: String,
    pub conditions: Vec<RuleCondition>,
    pub category: String,
    pub subcategory: String,
    pub priority: i32,
    #[serde(default)]
    pub auto_generated: bool,
}

/// A savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialGoal {
    pub id: String,
    pub name: String,
    pub target: f64,
    pub current: f64,
    pub deadline: Option<NaiveDate>,
}

impl FinancialGoal {
    /// Progress toward target as a percentage (0 when target is not positive)
    pub fn progress_percent(&self) -> f64 {
        if self.target > 0.0 {
            (self.current / self.target * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Per-user aggregate context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub monthly_income: Option<f64>,
    /// Category name → monthly limit
    pub budget_limits: BTreeMap<String, f64>,
    pub financial_goals: Vec<FinancialGoal>,
    /// Derived from history; refreshed by the orchestrator
    pub average_monthly_spending: f64,
}

impl UserProfile {
    /// Default profile created on first reference
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            monthly_income: None,
            budget_limits: BTreeMap::new(),
            financial_goals: Vec::new(),
            average_monthly_spending: 0.0,
        }
    }

    pub fn budget_for(&self, category: &str) -> Option<f64> {
        self.budget_limits.get(category).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_transaction_source_parsing() {
        assert_eq!(
            "receipt".parse::<TransactionSource>().unwrap(),
            TransactionSource::Receipt
        );
        assert_eq!(
            "CSV".parse::<TransactionSource>().unwrap(),
            TransactionSource::Import
        );
        assert!("fax".parse::<TransactionSource>().is_err());
        assert!(TransactionSource::Statement.needs_extraction());
        assert!(!TransactionSource::Manual.needs_extraction());
    }

    #[test]
    fn test_fingerprint_ignores_merchant_noise() {
        let a = Transaction::new("STARBUCKS #1234", 5.47, "Latte", date(2024, 3, 1));
        let b = Transaction::new("Starbucks", 5.47, "latte ", date(2024, 3, 1));
        let c = Transaction::new("Starbucks", 5.48, "latte", date(2024, 3, 1));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_result_confidence_is_clamped() {
        let r = CategorizationResult::new("Shopping", "Online", 1.7, CategorizationSource::Keyword);
        assert_eq!(r.confidence, 1.0);
        let r = CategorizationResult::new("Shopping", "Online", -0.2, CategorizationSource::Keyword);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_amount_range() {
        let range = AmountRange::around(100.0, 0.2);
        assert!(range.contains(80.0));
        assert!(range.contains(120.0));
        assert!(!range.contains(121.0));
    }

    #[test]
    fn test_rule_condition_serialization() {
        let cond = RuleCondition::AmountBetween { min: 1.0, max: 2.0 };
        let json = serde_json::to_string(&cond).unwrap();
        assert_eq!(json, r#"{"kind":"amount_between","min":1.0,"max":2.0}"#);
        let back: RuleCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cond);
    }

    #[test]
    fn test_goal_progress() {
        let goal = FinancialGoal {
            id: "g1".into(),
            name: "Emergency fund".into(),
            target: 1000.0,
            current: 250.0,
            deadline: None,
        };
        assert_eq!(goal.progress_percent(), 25.0);
    }
}
