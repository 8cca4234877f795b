//! Analysis commands (patterns, forecast, insights)

use anyhow::Result;
use spendwise_core::analysis::Forecast;

use super::{money, print_json, truncate, App};

pub async fn cmd_patterns(app: &App, days: i64) -> Result<()> {
    let patterns = app
        .orchestrator
        .analyzer()
        .detect_patterns(&app.user, days)
        .await?;

    if app.json() {
        return print_json(&patterns);
    }

    if patterns.is_empty() {
        println!("No patterns found in the last {} days.", days);
        return Ok(());
    }

    println!();
    println!("🔎 Patterns (last {} days)", days);
    println!("   ─────────────────────────────────────────────────────────────");
    for pattern in &patterns {
        println!(
            "   [{:11}] [{:6}] {}",
            pattern.pattern_type, pattern.impact, pattern.description
        );
        println!("                          → {}", pattern.recommendation);
    }
    Ok(())
}

pub async fn cmd_forecast(app: &App) -> Result<()> {
    let forecast = app
        .orchestrator
        .analyzer()
        .predict_next_period(&app.user)
        .await?;

    if app.json() {
        return print_json(&forecast);
    }

    print_forecast(&forecast);
    Ok(())
}

fn print_forecast(forecast: &Forecast) {
    println!();
    println!(
        "📈 Next month: {} ({} trend, {:.0}% confidence)",
        money(forecast.predicted_amount),
        forecast.trend,
        forecast.confidence * 100.0
    );
    for factor in &forecast.factors {
        println!("   · {}", factor);
    }
}

pub async fn cmd_insights(app: &App) -> Result<()> {
    let insights = app
        .orchestrator
        .analyzer()
        .get_user_insights(&app.user)
        .await?;

    if app.json() {
        return print_json(&insights);
    }

    if insights.transaction_count == 0 {
        println!("No transactions yet. Add some with:");
        println!("  spendwise import --file statement.csv");
        return Ok(());
    }

    println!();
    println!("📊 Spending summary for {} (as of {})", insights.user_id, insights.as_of);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {} transactions, {} total, {} average, {} per month",
        insights.transaction_count,
        money(insights.total_spend),
        money(insights.average_transaction),
        money(insights.average_monthly_spend)
    );

    println!();
    println!("   Top categories");
    for share in &insights.top_categories {
        println!(
            "   {:20} {:>10}  {:>5.1}%",
            share.category,
            money(share.total),
            share.share * 100.0
        );
    }

    println!();
    println!("   Top merchants");
    for merchant in &insights.top_merchants {
        println!(
            "   {:20} {:>10}  {:>3}x",
            truncate(&merchant.merchant, 20),
            money(merchant.total),
            merchant.count
        );
    }

    for status in &insights.budget_status {
        println!(
            "   💰 {}: {} of {} ({:.0}%)",
            status.category,
            money(status.spent),
            money(status.limit),
            status.percentage_used
        );
    }
    for goal in &insights.goals {
        println!("   🎯 {}: {:.0}%", goal.name, goal.percent);
    }
    for pattern in &insights.patterns {
        println!("   🔎 {}", pattern.description);
    }

    print_forecast(&insights.forecast);
    Ok(())
}
