//! Learned pattern operations

use rusqlite::params;

use super::{format_datetime, parse_datetime, Database};
use crate::error::Result;
use crate::models::{AmountRange, UserPattern};

impl Database {
    /// Insert or replace the pattern for (user, merchant key)
    pub fn upsert_pattern(&self, user_id: &str, pattern: &UserPattern) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO user_patterns (user_id, merchant, merchant_key, amount_min, amount_max, description_hint,
                                       category, subcategory, confidence, usage_count, last_used_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, merchant_key) DO UPDATE SET
                merchant = excluded.merchant,
                amount_min = excluded.amount_min,
                amount_max = excluded.amount_max,
                description_hint = excluded.description_hint,
                category = excluded.category,
                subcategory = excluded.subcategory,
                confidence = excluded.confidence,
                usage_count = excluded.usage_count,
                last_used_at = excluded.last_used_at
            "#,
            params![
                user_id,
                pattern.merchant,
                pattern.merchant_key,
                pattern.amount_range.map(|r| r.min),
                pattern.amount_range.map(|r| r.max),
                pattern.description_hint,
                pattern.category,
                pattern.subcategory,
                pattern.confidence,
                pattern.usage_count,
                format_datetime(&pattern.last_used_at),
            ],
        )?;

        Ok(())
    }

    /// All learned patterns for a user
    pub fn list_patterns(&self, user_id: &str) -> Result<Vec<UserPattern>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT merchant, merchant_key, amount_min, amount_max, description_hint,
                   category, subcategory, confidence, usage_count, last_used_at
            FROM user_patterns
            WHERE user_id = ?
            ORDER BY id
            "#,
        )?;

        let patterns = stmt
            .query_map(params![user_id], |row| {
                let amount_min: Option<f64> = row.get(2)?;
                let amount_max: Option<f64> = row.get(3)?;
                let last_used_str: String = row.get(9)?;

                Ok(UserPattern {
                    merchant: row.get(0)?,
                    merchant_key: row.get(1)?,
                    amount_range: amount_min
                        .zip(amount_max)
                        .map(|(min, max)| AmountRange { min, max }),
                    description_hint: row.get(4)?,
                    category: row.get(5)?,
                    subcategory: row.get(6)?,
                    confidence: row.get(7)?,
                    usage_count: row.get(8)?,
                    last_used_at: parse_datetime(&last_used_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(patterns)
    }
}
