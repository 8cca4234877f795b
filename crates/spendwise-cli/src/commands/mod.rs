//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, categories) and shared utilities (open_db, App)
//! - `transactions` - Categorize, add and correct single transactions
//! - `import` - CSV statement import through the batch pipeline
//! - `rules` - Custom rule management
//! - `profile` - Budget limits and goals
//! - `analysis` - Patterns, forecast and insights

pub mod analysis;
pub mod core;
pub mod import;
pub mod profile;
pub mod rules;
pub mod transactions;

// Re-export command functions for main.rs
pub use analysis::*;
pub use core::*;
pub use import::*;
pub use profile::*;
pub use rules::*;
pub use transactions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format a dollar amount with two decimals
pub fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}
