//! Analysis engine - per-transaction analysis, forecasts and user summaries

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{Transaction, UserProfile};
use crate::store::TransactionStore;

use super::patterns::{PatternEngine, PatternWindow};
use super::stats::{mean, ratio, std_dev, trend};
use super::types::{
    Alert, AlertKind, AnalysisResult, BudgetImpact, BudgetStatus, CategoryInsight, CategoryShare,
    Forecast, GoalProgress, MerchantInsight, MerchantSummary, Pattern, Severity, Trend,
    UserInsights, VelocityInsight,
};

const TOP_N: usize = 5;

pub struct AnalysisEngine {
    store: Arc<dyn TransactionStore>,
    config: AnalysisConfig,
    patterns: PatternEngine,
}

impl AnalysisEngine {
    pub fn new(store: Arc<dyn TransactionStore>, config: AnalysisConfig) -> Self {
        let patterns = PatternEngine::new(&config);
        Self {
            store,
            config,
            patterns,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a transaction against the user's stored history and profile
    pub async fn analyze(&self, tx: &Transaction, user_id: &str) -> Result<AnalysisResult> {
        let history = self.store.load_history(user_id).await?;
        let profile = self.store.load_profile(user_id).await?;
        Ok(self.analyze_against(tx, &history, &profile))
    }

    /// Analyze a transaction against explicit history
    ///
    /// `tx` itself is excluded from `history` if it was already stored.
    /// The transaction date is the reference date for budget and forecast.
    pub fn analyze_against(
        &self,
        tx: &Transaction,
        history: &[Transaction],
        profile: &UserProfile,
    ) -> AnalysisResult {
        let prior = chronological(
            history
                .iter()
                .filter(|h| tx.id.is_none() || h.id != tx.id)
                .collect(),
        );
        let category = tx.category_or_fallback();

        let category_prior: Vec<&Transaction> = prior
            .iter()
            .copied()
            .filter(|h| h.category_or_fallback() == category)
            .collect();
        let key = tx.merchant_key();
        let merchant_prior: Vec<&Transaction> = prior
            .iter()
            .copied()
            .filter(|h| !key.is_empty() && h.merchant_key() == key)
            .collect();

        let velocity = self.velocity(tx.amount, &amounts(&category_prior));
        let category_insight = self.category_insight(tx, category, &category_prior, &prior);
        let merchant_insight = self.merchant_insight(tx, &merchant_prior);
        let budget = budget_impact(tx, &category_prior, profile.budget_for(category));

        let mut with_current = prior.clone();
        with_current.push(tx);
        let forecast = self.forecast(&with_current, tx.date);

        let mut result = AnalysisResult {
            velocity,
            category: category_insight,
            merchant: merchant_insight,
            budget,
            forecast,
            alerts: vec![],
            recommendations: vec![],
        };
        self.add_alerts(tx, &mut result);

        debug!(
            "Analyzed '{}': unusual={} overspend={} alerts={}",
            tx.merchant,
            result.velocity.is_unusual,
            result.budget.projected_overspend,
            result.alerts.len()
        );
        result
    }

    fn velocity(&self, amount: f64, prior_amounts: &[f64]) -> VelocityInsight {
        let history_size = prior_amounts.len();
        if history_size < self.config.min_velocity_history {
            return VelocityInsight {
                history_size,
                ..Default::default()
            };
        }

        let m = mean(prior_amounts);
        let sd = std_dev(prior_amounts);
        let upper_bound = m + self.config.velocity_sigma * sd;
        let lower_bound = (m - self.config.velocity_sigma * sd).max(0.0);
        let is_unusual = amount > upper_bound;
        let percentage_above_normal = if is_unusual {
            ratio(amount - upper_bound, upper_bound) * 100.0
        } else {
            0.0
        };

        VelocityInsight {
            is_unusual,
            percentage_above_normal,
            mean: m,
            std_dev: sd,
            lower_bound,
            upper_bound,
            history_size,
        }
    }

    fn category_insight(
        &self,
        tx: &Transaction,
        category: &str,
        category_prior: &[&Transaction],
        prior: &[&Transaction],
    ) -> CategoryInsight {
        let mut category_amounts = amounts(category_prior);
        category_amounts.push(tx.amount);
        let total_spend: f64 = category_amounts.iter().sum();
        let all_spend: f64 = prior.iter().map(|h| h.amount).sum::<f64>() + tx.amount;

        CategoryInsight {
            category: category.to_string(),
            total_spend,
            average_amount: mean(&category_amounts),
            transaction_count: category_amounts.len(),
            share_of_total: ratio(total_spend, all_spend),
            trend: trend(
                &category_amounts,
                self.config.trend_window,
                self.config.trend_threshold,
            ),
        }
    }

    fn merchant_insight(&self, tx: &Transaction, merchant_prior: &[&Transaction]) -> MerchantInsight {
        let prior_amounts = amounts(merchant_prior);
        let mut with_current = prior_amounts.clone();
        with_current.push(tx.amount);

        MerchantInsight {
            merchant: tx.merchant.clone(),
            frequency: merchant_prior.len(),
            average_amount: mean(&prior_amounts),
            total_spend: prior_amounts.iter().sum(),
            last_seen: merchant_prior.iter().map(|h| h.date).max(),
            trend: trend(
                &with_current,
                self.config.trend_window,
                self.config.trend_threshold,
            ),
        }
    }

    fn add_alerts(&self, tx: &Transaction, result: &mut AnalysisResult) {
        let category = result.category.category.clone();

        if result.velocity.is_unusual {
            let pct = result.velocity.percentage_above_normal;
            result.alerts.push(Alert {
                kind: AlertKind::UnusualSpending,
                severity: if pct > self.config.high_severity_percent {
                    Severity::High
                } else {
                    Severity::Medium
                },
                message: format!(
                    "${:.2} at {} is {:.0}% above your normal {} spending",
                    tx.amount, tx.merchant, pct, category
                ),
                suggested_action: Some("Review this transaction".to_string()),
            });
        }

        let budget = &result.budget;
        if let (Some(limit), true) = (budget.limit, budget.projected_overspend) {
            let allowance = budget.daily_allowance();
            result.alerts.push(Alert {
                kind: AlertKind::BudgetOverspend,
                severity: if budget.current_spend > limit {
                    Severity::High
                } else {
                    Severity::Medium
                },
                message: format!(
                    "{} spending is projected to reach ${:.2} against a ${:.2} budget",
                    category, budget.projected_spend, limit
                ),
                suggested_action: allowance
                    .map(|a| format!("Keep {} under ${:.2}/day for the rest of the month", category, a)),
            });
            if let Some(allowance) = allowance {
                result.recommendations.push(format!(
                    "Limit {} spending to ${:.2} per day to stay within budget",
                    category, allowance
                ));
            }
        }

        if result.category.trend == Trend::Increasing {
            result.recommendations.push(if result.budget.has_limit() {
                format!("Your {} spending is trending up; review recent purchases", category)
            } else {
                format!("Your {} spending is trending up; consider setting a budget", category)
            });
        }

        if result.merchant.frequency >= self.config.recurring_min_count {
            result.recommendations.push(format!(
                "You've spent ${:.2} at {} across {} visits; a loyalty program or cheaper alternative could help",
                result.merchant.total_spend + tx.amount,
                tx.merchant,
                result.merchant.frequency + 1
            ));
        }
    }

    /// Next-month forecast from history, relative to `as_of`
    ///
    /// Recent spend is the total of the 30 days ending at `as_of`, compared
    /// against the average monthly spend.
    pub fn forecast(&self, history: &[&Transaction], as_of: NaiveDate) -> Forecast {
        let baseline = average_monthly_spend(history.iter().copied());
        let window_start = as_of - Duration::days(30);
        let recent_spend: f64 = history
            .iter()
            .filter(|h| h.date > window_start && h.date <= as_of)
            .map(|h| h.amount)
            .sum();

        let t = self.config.trend_threshold;
        let direction = if baseline > 0.0 && recent_spend > baseline * (1.0 + t) {
            Trend::Increasing
        } else if baseline > 0.0 && recent_spend < baseline * (1.0 - t) {
            Trend::Decreasing
        } else {
            Trend::Stable
        };
        let predicted_amount = match direction {
            Trend::Increasing => baseline * (1.0 + self.config.forecast_adjustment),
            Trend::Decreasing => baseline * (1.0 - self.config.forecast_adjustment),
            Trend::Stable => baseline,
        };
        let confidence = if history.len() >= self.config.forecast_min_history {
            0.8
        } else {
            0.5
        };

        let mut factors = vec![
            format!("Based on {} historical transactions", history.len()),
            format!(
                "Last 30 days ${:.2} vs ${:.2} monthly average ({})",
                recent_spend, baseline, direction
            ),
        ];
        let top = top_categories(history.iter().copied(), 3);
        if !top.is_empty() {
            let names: Vec<&str> = top.iter().map(|c| c.category.as_str()).collect();
            factors.push(format!("Top categories: {}", names.join(", ")));
        }

        Forecast {
            predicted_amount,
            baseline,
            recent_spend,
            trend: direction,
            confidence,
            factors,
        }
    }

    /// Patterns over the last `window_days` ending today
    pub async fn detect_patterns(&self, user_id: &str, window_days: i64) -> Result<Vec<Pattern>> {
        self.detect_patterns_as_of(user_id, window_days, Utc::now().date_naive())
            .await
    }

    pub async fn detect_patterns_as_of(
        &self,
        user_id: &str,
        window_days: i64,
        as_of: NaiveDate,
    ) -> Result<Vec<Pattern>> {
        let history = self.store.load_history(user_id).await?;
        Ok(self
            .patterns
            .detect_all(&PatternWindow::new(&history, window_days, as_of)))
    }

    /// Forecast for the month after today
    pub async fn predict_next_period(&self, user_id: &str) -> Result<Forecast> {
        self.predict_next_period_as_of(user_id, Utc::now().date_naive())
            .await
    }

    pub async fn predict_next_period_as_of(&self, user_id: &str, as_of: NaiveDate) -> Result<Forecast> {
        let history = self.store.load_history(user_id).await?;
        let refs: Vec<&Transaction> = history.iter().filter(|h| h.date <= as_of).collect();
        Ok(self.forecast(&refs, as_of))
    }

    /// Summary of the user's spending as of today
    pub async fn get_user_insights(&self, user_id: &str) -> Result<UserInsights> {
        self.get_user_insights_as_of(user_id, Utc::now().date_naive())
            .await
    }

    pub async fn get_user_insights_as_of(&self, user_id: &str, as_of: NaiveDate) -> Result<UserInsights> {
        let history = self.store.load_history(user_id).await?;
        let profile = self.store.load_profile(user_id).await?;
        Ok(self.summarize(user_id, &history, &profile, as_of))
    }

    fn summarize(
        &self,
        user_id: &str,
        history: &[Transaction],
        profile: &UserProfile,
        as_of: NaiveDate,
    ) -> UserInsights {
        let upto: Vec<&Transaction> = history.iter().filter(|h| h.date <= as_of).collect();
        let total_spend: f64 = upto.iter().map(|h| h.amount).sum();

        let budget_status = profile
            .budget_limits
            .iter()
            .map(|(category, &limit)| {
                let spent: f64 = upto
                    .iter()
                    .filter(|h| same_month(h.date, as_of) && h.category_or_fallback() == category)
                    .map(|h| h.amount)
                    .sum();
                BudgetStatus {
                    category: category.clone(),
                    limit,
                    spent,
                    remaining: limit - spent,
                    percentage_used: ratio(spent, limit) * 100.0,
                }
            })
            .collect();

        let goals = profile
            .financial_goals
            .iter()
            .map(|g| GoalProgress {
                id: g.id.clone(),
                name: g.name.clone(),
                target: g.target,
                current: g.current,
                percent: g.progress_percent(),
                deadline: g.deadline,
            })
            .collect();

        let patterns = self.patterns.detect_all(&PatternWindow::new(
            history,
            self.config.pattern_window_days,
            as_of,
        ));

        UserInsights {
            user_id: user_id.to_string(),
            as_of,
            transaction_count: upto.len(),
            total_spend,
            average_transaction: ratio(total_spend, upto.len() as f64),
            average_monthly_spend: average_monthly_spend(upto.iter().copied()),
            top_categories: top_categories(upto.iter().copied(), TOP_N),
            top_merchants: top_merchants(upto.iter().copied(), TOP_N),
            budget_status,
            goals,
            patterns,
            forecast: self.forecast(&upto, as_of),
        }
    }
}

/// Total spend divided by the number of distinct calendar months with activity
pub fn average_monthly_spend<'a>(history: impl Iterator<Item = &'a Transaction>) -> f64 {
    let mut months = BTreeSet::new();
    let mut total = 0.0;
    for tx in history {
        months.insert((tx.date.year(), tx.date.month()));
        total += tx.amount;
    }
    ratio(total, months.len() as f64)
}

fn budget_impact(
    tx: &Transaction,
    category_prior: &[&Transaction],
    limit: Option<f64>,
) -> BudgetImpact {
    let Some(limit) = limit else {
        return BudgetImpact::default();
    };

    let current_spend: f64 = category_prior
        .iter()
        .filter(|h| same_month(h.date, tx.date) && h.date <= tx.date)
        .map(|h| h.amount)
        .sum::<f64>()
        + tx.amount;

    let day = tx.date.day();
    let days_in_month = days_in_month(tx.date);
    let days_remaining = days_in_month.saturating_sub(day);
    let daily_average = current_spend / f64::from(day);
    let projected_spend = current_spend + daily_average * f64::from(days_remaining);

    BudgetImpact {
        limit: Some(limit),
        current_spend,
        remaining: limit - current_spend,
        percentage_used: ratio(current_spend, limit) * 100.0,
        projected_spend,
        projected_overspend: projected_spend > limit,
        days_remaining,
    }
}

pub(crate) fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn amounts(txs: &[&Transaction]) -> Vec<f64> {
    txs.iter().map(|t| t.amount).collect()
}

/// Stable sort by date so same-day entries keep insertion order
fn chronological(mut txs: Vec<&Transaction>) -> Vec<&Transaction> {
    txs.sort_by_key(|t| t.date);
    txs
}

fn top_categories<'a>(history: impl Iterator<Item = &'a Transaction>, n: usize) -> Vec<CategoryShare> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    let mut all = 0.0;
    for tx in history {
        *totals.entry(tx.category_or_fallback()).or_insert(0.0) += tx.amount;
        all += tx.amount;
    }
    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(category, total)| CategoryShare {
            category: category.to_string(),
            total,
            share: ratio(total, all),
        })
        .collect();
    shares.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
    shares.truncate(n);
    shares
}

fn top_merchants<'a>(history: impl Iterator<Item = &'a Transaction>, n: usize) -> Vec<MerchantSummary> {
    let mut merchants: HashMap<String, MerchantSummary> = HashMap::new();
    for tx in history {
        let key = tx.merchant_key();
        if key.is_empty() {
            continue;
        }
        let entry = merchants.entry(key).or_insert_with(|| MerchantSummary {
            merchant: tx.merchant.clone(),
            total: 0.0,
            count: 0,
        });
        entry.total += tx.amount;
        entry.count += 1;
    }
    let mut summaries: Vec<MerchantSummary> = merchants.into_values().collect();
    summaries.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    summaries.truncate(n);
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FinancialGoal;
    use crate::store::MemoryStore;
    use crate::test_utils::tx_on;

    fn engine() -> (Arc<MemoryStore>, AnalysisEngine) {
        let store = Arc::new(MemoryStore::new());
        let engine = AnalysisEngine::new(store.clone(), AnalysisConfig::default());
        (store, engine)
    }

    fn food(merchant: &str, amount: f64, date: &str) -> Transaction {
        tx_on(merchant, amount, "", date).with_category("Food & Dining", "Restaurants")
    }

    #[test]
    fn test_velocity_flags_outlier() {
        let (_, engine) = engine();
        let history: Vec<Transaction> = (1..=5)
            .map(|d| food("Diner", 10.0, &format!("2024-03-0{}", d)))
            .collect();

        let result =
            engine.analyze_against(&food("Diner", 25.0, "2024-03-10"), &history, &UserProfile::new("u1"));
        assert!(result.velocity.is_unusual);
        assert_eq!(result.velocity.percentage_above_normal, 150.0);
        assert_eq!(result.velocity.upper_bound, 10.0);

        let alert = &result.alerts[0];
        assert_eq!(alert.kind, AlertKind::UnusualSpending);
        assert_eq!(alert.severity, Severity::Medium);
    }

    #[test]
    fn test_velocity_high_severity() {
        let (_, engine) = engine();
        let history: Vec<Transaction> = (1..=3)
            .map(|d| food("Diner", 10.0, &format!("2024-03-0{}", d)))
            .collect();
        let result =
            engine.analyze_against(&food("Diner", 40.0, "2024-03-10"), &history, &UserProfile::new("u1"));
        assert_eq!(result.velocity.percentage_above_normal, 300.0);
        assert_eq!(result.alerts[0].severity, Severity::High);
    }

    #[test]
    fn test_velocity_needs_three_priors() {
        let (_, engine) = engine();
        let history = vec![food("Diner", 10.0, "2024-03-01"), food("Diner", 10.0, "2024-03-02")];
        let result =
            engine.analyze_against(&food("Diner", 500.0, "2024-03-10"), &history, &UserProfile::new("u1"));
        assert!(!result.velocity.is_unusual);
        assert_eq!(result.velocity.history_size, 2);
        assert!(result.alerts.is_empty());
    }

    #[test]
    fn test_velocity_only_uses_same_category() {
        let (_, engine) = engine();
        let history: Vec<Transaction> = (1..=5)
            .map(|d| {
                tx_on("Hardware", 10.0, "", &format!("2024-03-0{}", d))
                    .with_category("Shopping", "Home & Garden")
            })
            .collect();
        let result =
            engine.analyze_against(&food("Diner", 25.0, "2024-03-10"), &history, &UserProfile::new("u1"));
        assert_eq!(result.velocity.history_size, 0);
        assert!(!result.velocity.is_unusual);
        // Category share still accounts for everything else
        assert_eq!(result.category.share_of_total, 25.0 / 75.0);
    }

    #[test]
    fn test_empty_history_is_quiet() {
        let (_, engine) = engine();
        let result =
            engine.analyze_against(&food("Diner", 25.0, "2024-03-10"), &[], &UserProfile::new("u1"));
        assert!(!result.velocity.is_unusual);
        assert_eq!(result.category.share_of_total, 1.0);
        assert_eq!(result.category.trend, Trend::Stable);
        assert_eq!(result.merchant.frequency, 0);
        assert_eq!(result.merchant.last_seen, None);
        assert_eq!(result.budget, BudgetImpact::default());
        assert!(result.forecast.predicted_amount.is_finite());
        assert!(result.alerts.is_empty());
    }

    #[test]
    fn test_budget_projection_overspend() {
        let (_, engine) = engine();
        let mut profile = UserProfile::new("u1");
        profile.budget_limits.insert("Shopping".into(), 200.0);

        let history = vec![
            tx_on("Target", 100.0, "", "2024-06-03").with_category("Shopping", "General Merchandise"),
            tx_on("Target", 50.0, "", "2024-06-07").with_category("Shopping", "General Merchandise"),
            // Previous month does not count
            tx_on("Target", 400.0, "", "2024-05-20").with_category("Shopping", "General Merchandise"),
        ];
        let tx = tx_on("Target", 30.0, "", "2024-06-10").with_category("Shopping", "General Merchandise");

        let result = engine.analyze_against(&tx, &history, &profile);
        let budget = &result.budget;
        assert_eq!(budget.current_spend, 180.0);
        assert_eq!(budget.remaining, 20.0);
        assert_eq!(budget.percentage_used, 90.0);
        assert_eq!(budget.days_remaining, 20);
        assert_eq!(budget.projected_spend, 540.0);
        assert!(budget.projected_overspend);

        let alert = result
            .alerts
            .iter()
            .find(|a| a.kind == AlertKind::BudgetOverspend)
            .unwrap();
        // Not yet over the limit
        assert_eq!(alert.severity, Severity::Medium);
        assert!(result.recommendations.iter().any(|r| r.contains("$1.00 per day")));
    }

    #[test]
    fn test_budget_already_exceeded_is_high() {
        let (_, engine) = engine();
        let mut profile = UserProfile::new("u1");
        profile.budget_limits.insert("Food & Dining".into(), 50.0);
        let history = vec![food("Diner", 45.0, "2024-02-02")];
        let result = engine.analyze_against(&food("Diner", 20.0, "2024-02-29"), &history, &profile);

        assert_eq!(result.budget.days_remaining, 0);
        assert!(result.budget.projected_overspend);
        let alert = result
            .alerts
            .iter()
            .find(|a| a.kind == AlertKind::BudgetOverspend)
            .unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert!(alert.suggested_action.is_none());
    }

    #[test]
    fn test_merchant_insight() {
        let (_, engine) = engine();
        let history = vec![
            food("Joe's Diner", 10.0, "2024-03-01"),
            food("JOES DINER", 20.0, "2024-03-05"),
            food("Other Place", 99.0, "2024-03-06"),
        ];
        let result = engine.analyze_against(&food("Joes Diner", 15.0, "2024-03-10"), &history, &UserProfile::new("u1"));
        assert_eq!(result.merchant.frequency, 2);
        assert_eq!(result.merchant.average_amount, 15.0);
        assert_eq!(result.merchant.last_seen, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn test_stored_transaction_excluded_from_its_own_history() {
        let (_, engine) = engine();
        let mut stored = food("Diner", 10.0, "2024-03-01");
        stored.id = Some(7);
        let history = vec![stored.clone()];
        let result = engine.analyze_against(&stored, &history, &UserProfile::new("u1"));
        assert_eq!(result.merchant.frequency, 0);
        assert_eq!(result.category.transaction_count, 1);
    }

    #[test]
    fn test_category_trend_increasing_recommends_budget() {
        let (_, engine) = engine();
        let mut history: Vec<Transaction> = (1..=10)
            .map(|d| food(&format!("Place {}", d), 10.0, &format!("2024-01-{:02}", d)))
            .collect();
        history.extend((1..=9).map(|d| food(&format!("Spot {}", d), 20.0, &format!("2024-02-{:02}", d))));

        let result =
            engine.analyze_against(&food("Spot X", 20.0, "2024-02-20"), &history, &UserProfile::new("u1"));
        assert_eq!(result.category.trend, Trend::Increasing);
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("consider setting a budget")));
    }

    #[test]
    fn test_forecast_adjusts_for_recent_spend() {
        let (_, engine) = engine();
        // Jan and Feb 100 each, then 300 in the last 30 days
        let history = vec![
            food("A", 100.0, "2024-01-10"),
            food("B", 100.0, "2024-02-10"),
            food("C", 300.0, "2024-03-10"),
        ];
        let refs: Vec<&Transaction> = history.iter().collect();
        let forecast = engine.forecast(&refs, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());

        let baseline = 500.0 / 3.0;
        assert_eq!(forecast.baseline, baseline);
        assert_eq!(forecast.trend, Trend::Increasing);
        assert_eq!(forecast.predicted_amount, baseline * 1.15);
        assert_eq!(forecast.confidence, 0.5);
        assert_eq!(forecast.factors[0], "Based on 3 historical transactions");
        assert!(forecast.factors.iter().any(|f| f.starts_with("Top categories")));
    }

    #[test]
    fn test_recent_spend_is_thirty_day_total() {
        let (_, engine) = engine();
        let history = vec![
            food("A", 100.0, "2024-01-10"),
            food("B", 100.0, "2024-02-10"),
            food("C", 40.0, "2024-03-01"),
            food("D", 40.0, "2024-03-05"),
            food("E", 40.0, "2024-03-10"),
        ];
        let refs: Vec<&Transaction> = history.iter().collect();
        let forecast = engine.forecast(&refs, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());

        // Three purchases of 40 add up to a month above the 320 / 3 baseline
        assert_eq!(forecast.recent_spend, 120.0);
        assert_eq!(forecast.trend, Trend::Increasing);
    }

    #[test]
    fn test_forecast_confidence_with_history() {
        let (_, engine) = engine();
        let history: Vec<Transaction> = (1..=10)
            .map(|d| food("Diner", 10.0, &format!("2024-03-{:02}", d)))
            .collect();
        let refs: Vec<&Transaction> = history.iter().collect();
        let forecast = engine.forecast(&refs, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(forecast.confidence, 0.8);
        assert_eq!(forecast.trend, Trend::Stable);
        assert_eq!(forecast.predicted_amount, 100.0);
    }

    #[test]
    fn test_forecast_empty_history() {
        let (_, engine) = engine();
        let forecast = engine.forecast(&[], NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(forecast.predicted_amount, 0.0);
        assert_eq!(forecast.trend, Trend::Stable);
        assert_eq!(forecast.factors.len(), 2);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()), 29);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2023, 2, 10).unwrap()), 28);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()), 31);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()), 30);
    }

    #[tokio::test]
    async fn test_user_insights_summary() {
        let (store, engine) = engine();
        for (merchant, amount, date, category, sub) in [
            ("Landlord", 1000.0, "2024-06-01", "Housing", "Rent"),
            ("Diner", 30.0, "2024-06-05", "Food & Dining", "Restaurants"),
            ("Diner", 20.0, "2024-06-12", "Food & Dining", "Restaurants"),
            ("Diner", 50.0, "2024-05-12", "Food & Dining", "Restaurants"),
        ] {
            let tx = tx_on(merchant, amount, "", date).with_category(category, sub);
            store.save_transaction("u1", &tx).await.unwrap();
        }
        let mut profile = UserProfile::new("u1");
        profile.budget_limits.insert("Food & Dining".into(), 100.0);
        profile.financial_goals.push(FinancialGoal {
            id: "trip".into(),
            name: "Trip".into(),
            target: 2000.0,
            current: 500.0,
            deadline: None,
        });
        store.save_profile(&profile).await.unwrap();

        let insights = engine
            .get_user_insights_as_of("u1", NaiveDate::from_ymd_opt(2024, 6, 20).unwrap())
            .await
            .unwrap();

        assert_eq!(insights.transaction_count, 4);
        assert_eq!(insights.total_spend, 1100.0);
        assert_eq!(insights.average_transaction, 275.0);
        assert_eq!(insights.average_monthly_spend, 550.0);
        assert_eq!(insights.top_categories[0].category, "Housing");
        assert_eq!(insights.top_merchants[0].merchant, "Landlord");
        assert_eq!(insights.top_merchants[1].count, 3);

        assert_eq!(insights.budget_status.len(), 1);
        assert_eq!(insights.budget_status[0].spent, 50.0);
        assert_eq!(insights.budget_status[0].remaining, 50.0);
        assert_eq!(insights.goals[0].percent, 25.0);

        // Landlord > $100 and Housing > 30% share
        assert!(insights
            .patterns
            .iter()
            .any(|p| p.key == "Housing"));
    }

    #[tokio::test]
    async fn test_user_insights_for_unknown_user() {
        let (_, engine) = engine();
        let insights = engine
            .get_user_insights_as_of("nobody", NaiveDate::from_ymd_opt(2024, 6, 20).unwrap())
            .await
            .unwrap();
        assert_eq!(insights.transaction_count, 0);
        assert_eq!(insights.average_transaction, 0.0);
        assert_eq!(insights.average_monthly_spend, 0.0);
        assert!(insights.patterns.is_empty());
    }
}
