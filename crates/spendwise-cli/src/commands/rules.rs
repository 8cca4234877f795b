//! Custom rule commands

use anyhow::{bail, Result};
use spendwise_core::models::{NewCustomRule, RuleCondition};
use spendwise_core::TransactionStore;

use super::{print_json, truncate, App};

/// Build rule conditions from CLI flags
pub fn rule_conditions(
    merchant: Option<String>,
    merchant_contains: Option<String>,
    description_contains: Option<String>,
    min_amount: Option<f64>,
    max_amount: Option<f64>,
) -> Result<Vec<RuleCondition>> {
    let mut conditions = Vec::new();
    if let Some(value) = merchant {
        conditions.push(RuleCondition::MerchantEquals { value });
    }
    if let Some(value) = merchant_contains {
        conditions.push(RuleCondition::MerchantContains { value });
    }
    if let Some(value) = description_contains {
        conditions.push(RuleCondition::DescriptionContains { value });
    }
    if min_amount.is_some() || max_amount.is_some() {
        conditions.push(RuleCondition::AmountBetween {
            min: min_amount.unwrap_or(0.0),
            max: max_amount.unwrap_or(f64::MAX),
        });
    }

    if conditions.is_empty() {
        bail!(
            "A rule needs at least one condition: --merchant, --merchant-contains, \
             --description-contains, --min-amount or --max-amount"
        );
    }
    Ok(conditions)
}

pub async fn cmd_rules_list(app: &App) -> Result<()> {
    let rules = app.db.load_rules(&app.user).await?;

    if app.json() {
        return print_json(&rules);
    }

    if rules.is_empty() {
        println!("No rules defined. Add one with:");
        println!("  spendwise rules add <name> <category> <subcategory> --merchant-contains <text>");
        return Ok(());
    }

    println!();
    println!("📋 Rules");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:>4} │ {:>4} │ {:24} │ {:30} │ {:>5}",
        "ID", "Pri", "Name", "Category", "Used"
    );
    println!("   ─────┼──────┼──────────────────────────┼────────────────────────────────┼──────");

    for rule in rules {
        let name = if rule.auto_generated {
            format!("{} (auto)", rule.name)
        } else {
            rule.name.clone()
        };
        println!(
            "   {:>4} │ {:>4} │ {:24} │ {:30} │ {:>5}",
            rule.id,
            rule.priority,
            truncate(&name, 24),
            truncate(&format!("{} / {}", rule.category, rule.subcategory), 30),
            rule.usage_count
        );
    }

    Ok(())
}

pub async fn cmd_rules_add(
    app: &App,
    name: &str,
    category: &str,
    subcategory: &str,
    conditions: Vec<RuleCondition>,
    priority: i32,
) -> Result<()> {
    let rule = app
        .orchestrator
        .categorizer()
        .create_custom_rule(
            &app.user,
            NewCustomRule {
                name: name.to_string(),
                conditions,
                category: category.to_string(),
                subcategory: subcategory.to_string(),
                priority,
                auto_generated: false,
            },
        )
        .await?;

    if app.json() {
        return print_json(&rule);
    }

    println!(
        "✅ Created rule #{} '{}' → {} / {}",
        rule.id, rule.name, rule.category, rule.subcategory
    );
    Ok(())
}
