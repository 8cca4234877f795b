//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{CategoryLabel, Transaction, TransactionSource};

const TRANSACTION_COLUMNS: &str =
    "id, merchant, amount, description, date, category, subcategory, confidence, source";

impl Database {
    /// Insert a transaction, returning its id
    ///
    /// Fingerprint collisions are allowed; callers look them up first with
    /// [`Database::find_transaction_by_fingerprint`].
    pub fn insert_transaction(&self, user_id: &str, tx: &Transaction) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, merchant, amount, description, date, category, subcategory, confidence, source, fingerprint)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                tx.merchant,
                tx.amount,
                tx.description,
                tx.date.to_string(),
                tx.category,
                tx.subcategory,
                tx.confidence,
                tx.source.as_str(),
                tx.fingerprint(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get a single transaction by id
    pub fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions WHERE user_id = ? AND id = ?",
                    TRANSACTION_COLUMNS
                ),
                params![user_id, id],
                Self::row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// All transactions for a user, oldest insert first
    pub fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? ORDER BY id",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Overwrite the category of a stored transaction
    pub fn update_transaction_category(
        &self,
        user_id: &str,
        id: i64,
        label: &CategoryLabel,
        confidence: f64,
    ) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE transactions SET category = ?, subcategory = ?, confidence = ? WHERE user_id = ? AND id = ?",
            params![label.category, label.subcategory, confidence, user_id, id],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }

    /// Oldest transaction with the given fingerprint
    pub fn find_transaction_by_fingerprint(
        &self,
        user_id: &str,
        fingerprint: &str,
    ) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let id = conn
            .query_row(
                "SELECT id FROM transactions WHERE user_id = ? AND fingerprint = ? ORDER BY id LIMIT 1",
                params![user_id, fingerprint],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Number of stored transactions for a user
    pub fn count_transactions(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let date_str: String = row.get(4)?;
        let source_str: String = row.get(8)?;

        Ok(Transaction {
            id: Some(row.get(0)?),
            merchant: row.get(1)?,
            amount: row.get(2)?,
            description: row.get(3)?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").unwrap_or_default(),
            category: row.get(5)?,
            subcategory: row.get(6)?,
            confidence: row.get(7)?,
            source: source_str.parse().unwrap_or(TransactionSource::Manual),
        })
    }
}
