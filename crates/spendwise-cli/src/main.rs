//! Spendwise CLI - Transaction categorization and spending analysis
//!
//! Usage:
//!   spendwise init                          Initialize database
//!   spendwise add "Starbucks" 5.47          Process and store a transaction
//!   spendwise import --file statement.csv   Import a statement export
//!   spendwise insights                      Show a spending summary

mod cli;
mod commands;


use anyhow::{Context, Result};
use clap::Parser;
use spendwise_core::EngineConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::{App, Output};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let output = if cli.json { Output::Json } else { Output::Text };

    if let Commands::Init = cli.command {
        return commands::cmd_init(&cli.db);
    }
    if let Commands::Categories = cli.command {
        return commands::cmd_categories(output);
    }

    let config = EngineConfig::load(cli.config.as_deref()).context("Failed to load engine config")?;
    let db = commands::open_db(&cli.db)?;
    let app = App::new(db, config, &cli.user, output);

    match cli.command {
        Commands::Init | Commands::Categories => Ok(()),
        Commands::Categorize {
            merchant,
            amount,
            description,
            date,
        } => {
            commands::cmd_categorize(&app, &merchant, &amount, description.as_deref(), date.as_deref())
                .await
        }
        Commands::Add {
            merchant,
            amount,
            description,
            date,
        } => commands::cmd_add(&app, &merchant, &amount, description.as_deref(), date.as_deref()).await,
        Commands::Import { file, batch } => {
            commands::cmd_import(&app, &file, batch).await.map(|_| ())
        }
        Commands::Correct {
            transaction_id,
            category,
            subcategory,
        } => commands::cmd_correct(&app, transaction_id, &category, &subcategory).await,
        Commands::Rules { action } => match action {
            None | Some(RulesAction::List) => commands::cmd_rules_list(&app).await,
            Some(RulesAction::Add {
                name,
                category,
                subcategory,
                merchant,
                merchant_contains,
                description_contains,
                min_amount,
                max_amount,
                priority,
            }) => {
                let conditions = commands::rule_conditions(
                    merchant,
                    merchant_contains,
                    description_contains,
                    min_amount,
                    max_amount,
                )?;
                commands::cmd_rules_add(&app, &name, &category, &subcategory, conditions, priority)
                    .await
            }
        },
        Commands::Budget { action } => match action {
            None | Some(BudgetAction::List) => commands::cmd_budget_list(&app).await,
            Some(BudgetAction::Set { category, limit }) => {
                commands::cmd_budget_set(&app, &category, Some(limit)).await
            }
            Some(BudgetAction::Clear { category }) => {
                commands::cmd_budget_set(&app, &category, None).await
            }
        },
        Commands::Goals { action } => match action {
            None | Some(GoalsAction::List) => commands::cmd_goals_list(&app).await,
            Some(GoalsAction::Set {
                id,
                name,
                target,
                current,
                deadline,
            }) => {
                commands::cmd_goals_set(&app, &id, &name, target, current, deadline.as_deref())
                    .await
            }
        },
        Commands::Patterns { days } => commands::cmd_patterns(&app, days).await,
        Commands::Forecast => commands::cmd_forecast(&app).await,
        Commands::Insights => commands::cmd_insights(&app).await,
    }
}
