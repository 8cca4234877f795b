//! Custom rule operations

use chrono::Utc;
use rusqlite::params;

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{CustomRule, NewCustomRule};

impl Database {
    /// Store a new rule, returning it with id and timestamps filled in
    pub fn create_rule(&self, user_id: &str, rule: &NewCustomRule) -> Result<CustomRule> {
        let conn = self.conn()?;
        let conditions_json = serde_json::to_string(&rule.conditions)?;
        let created_at = Utc::now();

        conn.execute(
            r#"
            INSERT INTO custom_rules (user_id, name, conditions, category, subcategory, priority, auto_generated, usage_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
            params![
                user_id,
                rule.name,
                conditions_json,
                rule.category,
                rule.subcategory,
                rule.priority,
                rule.auto_generated,
                format_datetime(&created_at),
            ],
        )?;

        Ok(CustomRule {
            id: conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            name: rule.name.clone(),
            conditions: rule.conditions.clone(),
            category: rule.category.clone(),
            subcategory: rule.subcategory.clone(),
            priority: rule.priority,
            auto_generated: rule.auto_generated,
            created_at: parse_datetime(&format_datetime(&created_at)),
            usage_count: 0,
        })
    }

    /// All rules for a user, highest priority first
    pub fn list_rules(&self, user_id: &str) -> Result<Vec<CustomRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, name, conditions, category, subcategory, priority, auto_generated, usage_count, created_at
            FROM custom_rules
            WHERE user_id = ?
            ORDER BY priority DESC, id
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                let conditions_json: String = row.get(3)?;
                let created_str: String = row.get(9)?;
                Ok((
                    CustomRule {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        conditions: Vec::new(),
                        category: row.get(4)?,
                        subcategory: row.get(5)?,
                        priority: row.get(6)?,
                        auto_generated: row.get(7)?,
                        usage_count: row.get(8)?,
                        created_at: parse_datetime(&created_str),
                    },
                    conditions_json,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut rule, conditions_json)| {
                rule.conditions = serde_json::from_str(&conditions_json)?;
                Ok(rule)
            })
            .collect()
    }

    /// Replace the definition of an existing rule
    pub fn update_rule(&self, rule: &CustomRule) -> Result<()> {
        let conn = self.conn()?;
        let conditions_json = serde_json::to_string(&rule.conditions)?;

        let updated = conn.execute(
            r#"
            UPDATE custom_rules
            SET name = ?, conditions = ?, category = ?, subcategory = ?, priority = ?, auto_generated = ?, usage_count = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                rule.name,
                conditions_json,
                rule.category,
                rule.subcategory,
                rule.priority,
                rule.auto_generated,
                rule.usage_count,
                rule.id,
                rule.user_id,
            ],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("rule {}", rule.id)));
        }
        Ok(())
    }

    /// Bump the usage counter of a rule
    pub fn increment_rule_usage(&self, user_id: &str, rule_id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE custom_rules SET usage_count = usage_count + 1 WHERE id = ? AND user_id = ?",
            params![rule_id, user_id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("rule {}", rule_id)));
        }
        Ok(())
    }
}
