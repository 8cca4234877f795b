//! Single-transaction commands (categorize, add, correct)

use anyhow::{bail, Result};
use spendwise_core::models::{CategorizationResult, CategoryLabel, TransactionSource};
use spendwise_core::pipeline::extract::validate;
use spendwise_core::{ProcessingContext, ProcessingResult, RawTransaction};

use super::{date_or_today, money, print_json, App};

fn raw_input(
    merchant: &str,
    amount: &str,
    description: Option<&str>,
    date: Option<&str>,
) -> Result<RawTransaction> {
    let date = date_or_today(date)?;
    Ok(RawTransaction::new(
        merchant,
        amount,
        description.unwrap_or(""),
        date.format("%Y-%m-%d").to_string(),
    ))
}

/// Categorize without persisting anything
pub async fn cmd_categorize(
    app: &App,
    merchant: &str,
    amount: &str,
    description: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let raw = raw_input(merchant, amount, description, date)?;
    let tx = validate(&raw, TransactionSource::Manual)?;
    let result = app.orchestrator.categorizer().categorize(&tx, &app.user).await?;

    if app.json() {
        return print_json(&result);
    }

    println!("🏷️  {} ({})", tx.merchant, money(tx.amount));
    print_categorization(&result);
    Ok(())
}

/// Run a transaction through the full pipeline and store it
pub async fn cmd_add(
    app: &App,
    merchant: &str,
    amount: &str,
    description: Option<&str>,
    date: Option<&str>,
) -> Result<()> {
    let raw = raw_input(merchant, amount, description, date)?;
    let ctx = ProcessingContext::new(&app.user, TransactionSource::Manual);
    let result = app.orchestrator.process(&raw, &ctx).await;

    if app.json() {
        print_json(&result)?;
    } else {
        print_processing(&result);
    }

    if let Some(failure) = result.error {
        bail!("{}", failure);
    }
    Ok(())
}

/// Correct a stored transaction and learn from it
pub async fn cmd_correct(app: &App, transaction_id: i64, category: &str, subcategory: &str) -> Result<()> {
    let label = CategoryLabel::new(category, subcategory);
    let outcome = app
        .orchestrator
        .apply_correction(&app.user, transaction_id, &label)
        .await?;

    if app.json() {
        return print_json(&outcome);
    }

    println!(
        "✅ Transaction #{} → {} / {}",
        transaction_id, outcome.pattern.category, outcome.pattern.subcategory
    );
    println!(
        "   Learned pattern for '{}' (confidence {:.2}, seen {}x)",
        outcome.pattern.merchant, outcome.pattern.confidence, outcome.pattern.usage_count
    );
    if let Some(rule) = outcome.auto_rule {
        println!("   📋 Auto-rule #{} '{}' now applies", rule.id, rule.name);
    }
    Ok(())
}

fn print_categorization(result: &CategorizationResult) {
    println!(
        "   {} / {}  ({:.0}% via {})",
        result.category,
        result.subcategory,
        result.confidence * 100.0,
        result.source
    );
    for alt in &result.alternatives {
        println!(
            "   · {} / {}  ({:.0}% via {})",
            alt.category,
            alt.subcategory,
            alt.confidence * 100.0,
            alt.source
        );
    }
}

pub(crate) fn print_processing(result: &ProcessingResult) {
    if let Some(failure) = &result.error {
        println!("❌ {}", failure);
        return;
    }

    if let (Some(tx), Some(categorization)) = (&result.transaction, &result.categorization) {
        println!(
            "✅ #{} {} {} on {}",
            tx.id.unwrap_or_default(),
            tx.merchant,
            money(tx.amount),
            tx.date
        );
        print_categorization(categorization);
    }

    if let Some(analysis) = &result.analysis {
        for alert in &analysis.alerts {
            println!("   ⚠️  [{}] {}", alert.severity, alert.message);
        }
    }
    for insight in &result.insights {
        println!("   💡 {}", insight);
    }
    for warning in &result.warnings {
        println!("   ⚠️  {}", warning);
    }
}
