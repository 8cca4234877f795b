//! Core types for the analysis engine

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Severity of an alert, or impact of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Direction of recent spending compared to the window before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an amount is an outlier for its category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityInsight {
    pub is_unusual: bool,
    /// How far the amount sits above the normal range's upper bound, in percent
    pub percentage_above_normal: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Prior transactions the judgement was based on
    pub history_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryInsight {
    pub category: String,
    pub total_spend: f64,
    pub average_amount: f64,
    pub transaction_count: usize,
    /// Category spend / total spend, in [0, 1]
    pub share_of_total: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MerchantInsight {
    pub merchant: String,
    /// Prior transactions at this merchant
    pub frequency: usize,
    pub average_amount: f64,
    pub total_spend: f64,
    pub last_seen: Option<NaiveDate>,
    pub trend: Trend,
}

/// Month-to-date budget position for the transaction's category
///
/// All zeros when the user has no limit for the category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetImpact {
    pub limit: Option<f64>,
    pub current_spend: f64,
    pub remaining: f64,
    pub percentage_used: f64,
    pub projected_spend: f64,
    pub projected_overspend: bool,
    pub days_remaining: u32,
}

impl BudgetImpact {
    pub fn has_limit(&self) -> bool {
        self.limit.is_some()
    }

    /// Spend per remaining day that keeps the month within the limit
    pub fn daily_allowance(&self) -> Option<f64> {
        self.limit?;
        if self.days_remaining == 0 {
            return None;
        }
        Some(self.remaining.max(0.0) / f64::from(self.days_remaining))
    }
}

/// Projected spend for the next month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub predicted_amount: f64,
    /// Historical average monthly spend
    pub baseline: f64,
    pub recent_spend: f64,
    pub trend: Trend,
    pub confidence: f64,
    /// Human-readable reasons behind the prediction
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    UnusualSpending,
    BudgetOverspend,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::UnusualSpending => "unusual_spending",
            AlertKind::BudgetOverspend => "budget_overspend",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Per-transaction analysis; computed, never persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub velocity: VelocityInsight,
    pub category: CategoryInsight,
    pub merchant: MerchantInsight,
    pub budget: BudgetImpact,
    pub forecast: Forecast,
    pub alerts: Vec<Alert>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Recurring,
    Unusual,
    Trend,
    Opportunity,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Recurring => "recurring",
            PatternType::Unusual => "unusual",
            PatternType::Trend => "trend",
            PatternType::Opportunity => "opportunity",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recurring" => Ok(PatternType::Recurring),
            "unusual" => Ok(PatternType::Unusual),
            "trend" => Ok(PatternType::Trend),
            "opportunity" => Ok(PatternType::Opportunity),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

/// A cross-transaction signal over a rolling window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_type: PatternType,
    /// Merchant, category or transaction the pattern is about
    pub key: String,
    pub description: String,
    pub confidence: f64,
    pub impact: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: f64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantSummary {
    pub merchant: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub category: String,
    pub limit: f64,
    pub spent: f64,
    pub remaining: f64,
    pub percentage_used: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub id: String,
    pub name: String,
    pub target: f64,
    pub current: f64,
    pub percent: f64,
    pub deadline: Option<NaiveDate>,
}

/// User-level summary across all history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInsights {
    pub user_id: String,
    pub as_of: NaiveDate,
    pub transaction_count: usize,
    pub total_spend: f64,
    pub average_transaction: f64,
    pub average_monthly_spend: f64,
    pub top_categories: Vec<CategoryShare>,
    pub top_merchants: Vec<MerchantSummary>,
    /// Current month, one entry per configured limit
    pub budget_status: Vec<BudgetStatus>,
    pub goals: Vec<GoalProgress>,
    pub patterns: Vec<Pattern>,
    pub forecast: Forecast,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_roundtrip_and_order() {
        for s in [Severity::Low, Severity::Medium, Severity::High] {
            assert_eq!(Severity::from_str(s.as_str()).unwrap(), s);
        }
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::from_str("critical").is_err());
    }

    #[test]
    fn test_daily_allowance() {
        let none = BudgetImpact::default();
        assert_eq!(none.daily_allowance(), None);

        let impact = BudgetImpact {
            limit: Some(200.0),
            current_spend: 180.0,
            remaining: 20.0,
            days_remaining: 20,
            ..Default::default()
        };
        assert_eq!(impact.daily_allowance(), Some(1.0));

        let over = BudgetImpact {
            remaining: -50.0,
            ..impact
        };
        assert_eq!(over.daily_allowance(), Some(0.0));
    }

    #[test]
    fn test_pattern_type_serializes_snake_case() {
        let json = serde_json::to_string(&PatternType::Opportunity).unwrap();
        assert_eq!(json, "\"opportunity\"");
    }
}
