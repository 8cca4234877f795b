//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Spendwise - Categorize and understand your spending
#[derive(Parser)]
#[command(name = "spendwise")]
#[command(about = "Transaction categorization, spending analysis and forecasts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "spendwise.db", global = true)]
    pub db: PathBuf,

    /// User whose data to operate on
    #[arg(long, default_value = "default", global = true)]
    pub user: String,

    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// List the category taxonomy
    Categories,

    /// Categorize a transaction without storing it
    Categorize {
        /// Merchant name as it appears on the statement
        merchant: String,
        /// Amount spent
        amount: String,
        /// Optional description / memo
        #[arg(short, long)]
        description: Option<String>,
        /// Date (YYYY-MM-DD, MM/DD/YYYY); defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Process and store a transaction
    Add {
        /// Merchant name
        merchant: String,
        /// Amount spent
        amount: String,
        /// Optional description / memo
        #[arg(short, long)]
        description: Option<String>,
        /// Date (YYYY-MM-DD, MM/DD/YYYY); defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Import transactions from a CSV statement export
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Batch id (generated if not specified)
        #[arg(long)]
        batch: Option<String>,
    },

    /// Correct the category of a stored transaction
    Correct {
        /// Transaction ID
        transaction_id: i64,
        /// Category name (e.g., "Food & Dining")
        category: String,
        /// Subcategory name (e.g., "Groceries")
        subcategory: String,
    },

    /// Manage custom categorization rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Manage monthly budget limits
    Budget {
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },

    /// Manage financial goals
    Goals {
        #[command(subcommand)]
        action: Option<GoalsAction>,
    },

    /// Detect spending patterns over a recent window
    Patterns {
        /// Window size in days
        #[arg(long, default_value = "90")]
        days: i64,
    },

    /// Forecast next month's spending
    Forecast,

    /// Show a spending summary
    Insights,
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules (highest priority first)
    List,

    /// Add a new rule; every given condition must match
    Add {
        /// Rule name
        name: String,
        /// Category to assign
        category: String,
        /// Subcategory to assign
        subcategory: String,
        /// Merchant equals (after normalization)
        #[arg(long)]
        merchant: Option<String>,
        /// Merchant contains
        #[arg(long)]
        merchant_contains: Option<String>,
        /// Description contains
        #[arg(long)]
        description_contains: Option<String>,
        /// Minimum amount (inclusive)
        #[arg(long)]
        min_amount: Option<f64>,
        /// Maximum amount (inclusive)
        #[arg(long)]
        max_amount: Option<f64>,
        /// Rule priority (higher = checked first)
        #[arg(long, default_value = "0")]
        priority: i32,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Show this month's budget status
    List,

    /// Set a monthly limit for a category
    Set {
        /// Category name
        category: String,
        /// Monthly limit
        limit: f64,
    },

    /// Remove a category limit
    Clear {
        /// Category name
        category: String,
    },
}

#[derive(Subcommand)]
pub enum GoalsAction {
    /// List goals with progress
    List,

    /// Create or update a goal
    Set {
        /// Goal id (used to update it later)
        id: String,
        /// Display name
        name: String,
        /// Target amount
        target: f64,
        /// Amount saved so far
        #[arg(long, default_value = "0")]
        current: f64,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
    },
}
