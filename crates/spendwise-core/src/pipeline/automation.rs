//! Automation triggers fired after a transaction is persisted

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::models::Transaction;

use super::types::ProcessingContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationKind {
    /// Month-end projection exceeds the category budget
    BudgetAlert,
    /// Merchant seen often enough to look like a recurring charge
    RecurringDetected,
    HighValue,
}

impl AutomationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomationKind::BudgetAlert => "budget_alert",
            AutomationKind::RecurringDetected => "recurring_detected",
            AutomationKind::HighValue => "high_value",
        }
    }
}

impl fmt::Display for AutomationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification / side-effect collaborator
///
/// Errors are reported back as warnings and never fail processing.
#[async_trait]
pub trait AutomationDispatcher: Send + Sync {
    async fn trigger(
        &self,
        kind: AutomationKind,
        tx: &Transaction,
        ctx: &ProcessingContext,
    ) -> Result<()>;
}

/// Default dispatcher: emits each trigger as a log event
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDispatcher;

#[async_trait]
impl AutomationDispatcher for LoggingDispatcher {
    async fn trigger(
        &self,
        kind: AutomationKind,
        tx: &Transaction,
        ctx: &ProcessingContext,
    ) -> Result<()> {
        info!(
            trigger = kind.as_str(),
            user_id = %ctx.user_id,
            merchant = %tx.merchant,
            amount = tx.amount,
            "Automation trigger"
        );
        Ok(())
    }
}
