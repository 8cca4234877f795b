//! User profile operations

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::Result;
use crate::models::UserProfile;

impl Database {
    /// Stored profile, if the user has one
    pub fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT monthly_income, budget_limits, financial_goals, average_monthly_spending
                FROM user_profiles
                WHERE user_id = ?
                "#,
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, Option<f64>>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((monthly_income, limits_json, goals_json, average_monthly_spending)) = row else {
            return Ok(None);
        };

        Ok(Some(UserProfile {
            user_id: user_id.to_string(),
            monthly_income,
            budget_limits: serde_json::from_str(&limits_json)?,
            financial_goals: serde_json::from_str(&goals_json)?,
            average_monthly_spending,
        }))
    }

    /// Insert or replace a profile
    pub fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        let conn = self.conn()?;
        let limits_json = serde_json::to_string(&profile.budget_limits)?;
        let goals_json = serde_json::to_string(&profile.financial_goals)?;

        conn.execute(
            r#"
            INSERT INTO user_profiles (user_id, monthly_income, budget_limits, financial_goals, average_monthly_spending, updated_at)
            VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(user_id) DO UPDATE SET
                monthly_income = excluded.monthly_income,
                budget_limits = excluded.budget_limits,
                financial_goals = excluded.financial_goals,
                average_monthly_spending = excluded.average_monthly_spending,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![
                profile.user_id,
                profile.monthly_income,
                limits_json,
                goals_json,
                profile.average_monthly_spending,
            ],
        )?;

        Ok(())
    }
}
