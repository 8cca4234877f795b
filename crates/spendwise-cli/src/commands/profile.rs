//! Budget and goal commands

use anyhow::Result;
use spendwise_core::models::FinancialGoal;
use spendwise_core::pipeline::extract::parse_date;
use spendwise_core::TransactionStore;

use super::{money, print_json, App};

pub async fn cmd_budget_list(app: &App) -> Result<()> {
    let insights = app.orchestrator.analyzer().get_user_insights(&app.user).await?;

    if app.json() {
        return print_json(&insights.budget_status);
    }

    if insights.budget_status.is_empty() {
        println!("No budgets set. Add one with:");
        println!("  spendwise budget set \"Food & Dining\" 400");
        return Ok(());
    }

    println!();
    println!("💰 Budgets ({})", insights.as_of.format("%B %Y"));
    println!("   ─────────────────────────────────────────────────────────────");
    for status in &insights.budget_status {
        let marker = if status.spent > status.limit { "🔴" } else { "🟢" };
        println!(
            "   {} {:20} {:>10} of {:>10}  ({:.0}%)",
            marker,
            status.category,
            money(status.spent),
            money(status.limit),
            status.percentage_used
        );
    }
    Ok(())
}

pub async fn cmd_budget_set(app: &App, category: &str, limit: Option<f64>) -> Result<()> {
    let profile = app
        .orchestrator
        .set_budget_limit(&app.user, category, limit)
        .await?;

    if app.json() {
        return print_json(&profile.budget_limits);
    }

    match limit {
        Some(limit) => println!("✅ {} budget set to {} per month", category, money(limit)),
        None => println!("✅ {} budget removed", category),
    }
    Ok(())
}

pub async fn cmd_goals_list(app: &App) -> Result<()> {
    let profile = app.db.load_profile(&app.user).await?;

    if app.json() {
        return print_json(&profile.financial_goals);
    }

    if profile.financial_goals.is_empty() {
        println!("No goals yet. Add one with:");
        println!("  spendwise goals set emergency \"Emergency fund\" 5000");
        return Ok(());
    }

    println!();
    println!("🎯 Goals");
    println!("   ─────────────────────────────────────────────────────────────");
    for goal in &profile.financial_goals {
        let deadline = goal
            .deadline
            .map(|d| format!(" by {}", d))
            .unwrap_or_default();
        println!(
            "   {:16} {:24} {:>10} / {:>10} ({:.0}%){}",
            goal.id,
            goal.name,
            money(goal.current),
            money(goal.target),
            goal.progress_percent(),
            deadline
        );
    }
    Ok(())
}

pub async fn cmd_goals_set(
    app: &App,
    id: &str,
    name: &str,
    target: f64,
    current: f64,
    deadline: Option<&str>,
) -> Result<()> {
    let goal = FinancialGoal {
        id: id.to_string(),
        name: name.to_string(),
        target,
        current,
        deadline: deadline.map(parse_date).transpose()?,
    };
    let profile = app.orchestrator.upsert_goal(&app.user, goal).await?;

    if app.json() {
        return print_json(&profile.financial_goals);
    }

    println!("✅ Goal '{}' saved ({} of {})", name, money(current), money(target));
    Ok(())
}
