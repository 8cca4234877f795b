//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `App` - Orchestrator, user and output mode shared by every command
//! - `cmd_init` - Initialize the database
//! - `cmd_categories` - Print the taxonomy

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use spendwise_core::pipeline::extract::parse_date;
use spendwise_core::{Database, EngineConfig, PipelineOrchestrator, Taxonomy};

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

/// Everything a command needs
pub struct App {
    pub db: Arc<Database>,
    pub orchestrator: PipelineOrchestrator,
    pub user: String,
    pub output: Output,
}

impl App {
    pub fn new(db: Database, config: EngineConfig, user: &str, output: Output) -> Self {
        let db = Arc::new(db);
        Self {
            orchestrator: PipelineOrchestrator::new(db.clone(), config),
            db,
            user: user.to_string(),
            output,
        }
    }

    pub fn json(&self) -> bool {
        self.output == Output::Json
    }
}

/// Open (and migrate) the database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    Database::new(path_str).context("Failed to open database")
}

/// Pretty-print a value as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a user-supplied date, defaulting to today
pub fn date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => Ok(parse_date(s)?),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    println!("   Taxonomy version {}", db.taxonomy_version()?);

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: spendwise import --file statement.csv");
    println!("  2. Set a budget: spendwise budget set \"Food & Dining\" 400");
    println!("  3. See where it goes: spendwise insights");

    Ok(())
}

pub fn cmd_categories(output: Output) -> Result<()> {
    let taxonomy = Taxonomy::standard();

    if output == Output::Json {
        let categories: Vec<serde_json::Value> = taxonomy
            .categories()
            .iter()
            .map(|c| serde_json::json!({ "name": c.name, "subcategories": c.subcategories }))
            .collect();
        return print_json(&serde_json::json!({
            "version": taxonomy.version(),
            "categories": categories,
        }));
    }

    println!();
    println!("🏷️  Categories (taxonomy v{})", taxonomy.version());
    println!("   ─────────────────────────────────────────────────────────────");
    for category in taxonomy.categories() {
        println!("   {:20} │ {}", category.name, category.subcategories.join(", "));
    }

    Ok(())
}
