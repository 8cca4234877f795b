//! Cross-transaction pattern detection
//!
//! Detectors run independently over the same rolling window and their
//! findings are concatenated; one transaction can feed several patterns.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::models::Transaction;

use super::stats::{mean, ratio, std_dev};
use super::types::{Pattern, PatternType, Severity};

/// The transactions a detector looks at
pub struct PatternWindow<'a> {
    pub transactions: Vec<&'a Transaction>,
    pub days: i64,
    pub end: NaiveDate,
}

impl<'a> PatternWindow<'a> {
    /// Transactions dated within `(end - days, end]`
    pub fn new(history: &'a [Transaction], days: i64, end: NaiveDate) -> Self {
        let start = end - Duration::days(days.max(0));
        let transactions = history
            .iter()
            .filter(|tx| tx.date > start && tx.date <= end)
            .collect();
        Self {
            transactions,
            days,
            end,
        }
    }

    pub fn total(&self) -> f64 {
        self.transactions.iter().map(|tx| tx.amount).sum()
    }

    /// Per-merchant (display name, count, total), keyed by normalized merchant
    fn by_merchant(&self) -> BTreeMap<String, (String, usize, f64)> {
        let mut merchants: BTreeMap<String, (String, usize, f64)> = BTreeMap::new();
        for tx in &self.transactions {
            let key = tx.merchant_key();
            if key.is_empty() {
                continue;
            }
            let entry = merchants
                .entry(key)
                .or_insert_with(|| (tx.merchant.clone(), 0, 0.0));
            entry.1 += 1;
            entry.2 += tx.amount;
        }
        merchants
    }
}

/// A pattern detector
pub trait PatternDetector: Send + Sync {
    fn pattern_type(&self) -> PatternType;

    fn detect(&self, window: &PatternWindow<'_>) -> Vec<Pattern>;
}

/// Merchants seen repeatedly
pub struct RecurringDetector {
    min_count: usize,
    high_count: usize,
}

impl PatternDetector for RecurringDetector {
    fn pattern_type(&self) -> PatternType {
        PatternType::Recurring
    }

    fn detect(&self, window: &PatternWindow<'_>) -> Vec<Pattern> {
        window
            .by_merchant()
            .into_values()
            .filter(|(_, count, _)| *count >= self.min_count)
            .map(|(merchant, count, total)| Pattern {
                pattern_type: PatternType::Recurring,
                description: format!(
                    "{} transactions at {} in the last {} days (${:.2})",
                    count, merchant, window.days, total
                ),
                confidence: 0.9,
                impact: if count >= self.high_count {
                    Severity::High
                } else {
                    Severity::Medium
                },
                recommendation: format!(
                    "Check whether {} is a subscription or habit worth budgeting for",
                    merchant
                ),
                key: merchant,
            })
            .collect()
    }
}

/// Amounts far above the window's norm
pub struct UnusualDetector {
    sigma: f64,
}

impl PatternDetector for UnusualDetector {
    fn pattern_type(&self) -> PatternType {
        PatternType::Unusual
    }

    fn detect(&self, window: &PatternWindow<'_>) -> Vec<Pattern> {
        let amounts: Vec<f64> = window.transactions.iter().map(|tx| tx.amount).collect();
        let m = mean(&amounts);
        let sd = std_dev(&amounts);
        if sd <= 0.0 {
            return vec![];
        }
        let threshold = m + self.sigma * sd;

        window
            .transactions
            .iter()
            .filter(|tx| tx.amount > threshold)
            .map(|tx| Pattern {
                pattern_type: PatternType::Unusual,
                key: tx.merchant.clone(),
                description: format!(
                    "${:.2} at {} on {} is well above your typical ${:.2}",
                    tx.amount, tx.merchant, tx.date, m
                ),
                confidence: 0.8,
                impact: Severity::Medium,
                recommendation: "Confirm this purchase was expected".to_string(),
            })
            .collect()
    }
}

/// Categories dominating the window's spend
pub struct CategoryTrendDetector {
    share_threshold: f64,
}

impl PatternDetector for CategoryTrendDetector {
    fn pattern_type(&self) -> PatternType {
        PatternType::Trend
    }

    fn detect(&self, window: &PatternWindow<'_>) -> Vec<Pattern> {
        let total = window.total();
        let mut categories: BTreeMap<&str, f64> = BTreeMap::new();
        for tx in &window.transactions {
            *categories.entry(tx.category_or_fallback()).or_insert(0.0) += tx.amount;
        }

        categories
            .into_iter()
            .filter_map(|(category, spend)| {
                let share = ratio(spend, total);
                (share > self.share_threshold).then(|| Pattern {
                    pattern_type: PatternType::Trend,
                    key: category.to_string(),
                    description: format!(
                        "{} is {:.0}% of your spending in the last {} days",
                        category,
                        share * 100.0,
                        window.days
                    ),
                    confidence: 0.9,
                    impact: Severity::High,
                    recommendation: format!("Set or review a monthly budget for {}", category),
                })
            })
            .collect()
    }
}

/// Merchants with enough spend to be worth optimizing
pub struct OpportunityDetector {
    min_spend: f64,
}

impl PatternDetector for OpportunityDetector {
    fn pattern_type(&self) -> PatternType {
        PatternType::Opportunity
    }

    fn detect(&self, window: &PatternWindow<'_>) -> Vec<Pattern> {
        window
            .by_merchant()
            .into_values()
            .filter(|(_, _, total)| *total > self.min_spend)
            .map(|(merchant, count, total)| Pattern {
                pattern_type: PatternType::Opportunity,
                description: format!(
                    "${:.2} spent at {} across {} transactions",
                    total, merchant, count
                ),
                confidence: 0.8,
                impact: Severity::Medium,
                recommendation: format!(
                    "Look for a loyalty program or cheaper alternative to {}",
                    merchant
                ),
                key: merchant,
            })
            .collect()
    }
}

/// Runs every registered detector
pub struct PatternEngine {
    detectors: Vec<Box<dyn PatternDetector>>,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl PatternEngine {
    /// Engine with the four built-in detectors
    pub fn new(config: &AnalysisConfig) -> Self {
        let mut engine = Self { detectors: vec![] };

        engine.register(Box::new(RecurringDetector {
            min_count: config.recurring_min_count,
            high_count: config.recurring_high_count,
        }));
        engine.register(Box::new(UnusualDetector {
            sigma: config.unusual_sigma,
        }));
        engine.register(Box::new(CategoryTrendDetector {
            share_threshold: config.category_share_threshold,
        }));
        engine.register(Box::new(OpportunityDetector {
            min_spend: config.opportunity_min_spend,
        }));

        engine
    }

    pub fn register(&mut self, detector: Box<dyn PatternDetector>) {
        self.detectors.push(detector);
    }

    pub fn detect_all(&self, window: &PatternWindow<'_>) -> Vec<Pattern> {
        let mut patterns = vec![];
        for detector in &self.detectors {
            let found = detector.detect(window);
            debug!(
                detector = detector.pattern_type().as_str(),
                count = found.len(),
                "Pattern detection complete"
            );
            patterns.extend(found);
        }
        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tx_on;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn detect(history: &[Transaction]) -> Vec<Pattern> {
        PatternEngine::default().detect_all(&PatternWindow::new(history, 90, end()))
    }

    fn of_type(patterns: &[Pattern], pattern_type: PatternType) -> Vec<&Pattern> {
        patterns
            .iter()
            .filter(|p| p.pattern_type == pattern_type)
            .collect()
    }

    #[test]
    fn test_empty_history_yields_nothing() {
        assert!(detect(&[]).is_empty());
    }

    #[test]
    fn test_window_bounds() {
        let history = vec![
            tx_on("A", 1.0, "", "2024-04-01"), // exactly 90 days before: excluded
            tx_on("B", 1.0, "", "2024-04-02"),
            tx_on("C", 1.0, "", "2024-06-30"),
            tx_on("D", 1.0, "", "2024-07-01"),
        ];
        let window = PatternWindow::new(&history, 90, end());
        let merchants: Vec<&str> = window
            .transactions
            .iter()
            .map(|t| t.merchant.as_str())
            .collect();
        assert_eq!(merchants, vec!["B", "C"]);
    }

    #[test]
    fn test_recurring_impact_by_count() {
        let mut history: Vec<Transaction> = (1..=3)
            .map(|d| tx_on("Corner Cafe", 4.0, "", &format!("2024-06-0{}", d)))
            .collect();
        history.extend((1..=5).map(|d| tx_on("Gym Co", 30.0, "", &format!("2024-05-0{}", d))));

        let patterns = detect(&history);
        let recurring = of_type(&patterns, PatternType::Recurring);
        assert_eq!(recurring.len(), 2);

        let cafe = recurring.iter().find(|p| p.key == "Corner Cafe").unwrap();
        assert_eq!(cafe.impact, Severity::Medium);
        assert_eq!(cafe.confidence, 0.9);
        let gym = recurring.iter().find(|p| p.key == "Gym Co").unwrap();
        assert_eq!(gym.impact, Severity::High);
    }

    #[test]
    fn test_unusual_amount() {
        let mut history: Vec<Transaction> = (1..=20)
            .map(|d| tx_on(&format!("Shop {}", d), 10.0, "", &format!("2024-06-{:02}", d)))
            .collect();
        history.push(tx_on("Jeweler", 500.0, "", "2024-06-21"));

        let patterns = detect(&history);
        let unusual = of_type(&patterns, PatternType::Unusual);
        assert_eq!(unusual.len(), 1);
        assert_eq!(unusual[0].key, "Jeweler");
        assert_eq!(unusual[0].impact, Severity::Medium);
    }

    #[test]
    fn test_category_share_and_opportunity() {
        let history = vec![
            tx_on("Landlord LLC", 120.0, "", "2024-06-01").with_category("Housing", "Rent"),
            tx_on("Bookshop", 20.0, "", "2024-06-02").with_category("Entertainment", "Books"),
            tx_on("Cinema", 20.0, "", "2024-06-03").with_category("Entertainment", "Movies & Events"),
            tx_on("Deli", 40.0, "", "2024-06-04").with_category("Food & Dining", "Restaurants"),
        ];
        let patterns = detect(&history);

        // Housing 60%, Entertainment 20%, Food 20%
        let trends = of_type(&patterns, PatternType::Trend);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].key, "Housing");
        assert_eq!(trends[0].impact, Severity::High);

        let opportunities = of_type(&patterns, PatternType::Opportunity);
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].key, "Landlord LLC");
    }

    #[test]
    fn test_one_transaction_feeds_several_patterns() {
        let history: Vec<Transaction> = (1..=5)
            .map(|d| {
                tx_on("Meal Kit Co", 40.0, "", &format!("2024-06-0{}", d))
                    .with_category("Food & Dining", "Delivery")
            })
            .collect();
        let patterns = detect(&history);
        assert_eq!(of_type(&patterns, PatternType::Recurring).len(), 1);
        assert_eq!(of_type(&patterns, PatternType::Trend).len(), 1);
        assert_eq!(of_type(&patterns, PatternType::Opportunity).len(), 1);
        assert!(of_type(&patterns, PatternType::Unusual).is_empty());
    }
}
