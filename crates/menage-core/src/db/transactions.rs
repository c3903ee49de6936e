//! Transaction operations: inserts, hash checks, category updates and
//! deduction bookkeeping

use rusqlite::params;
use rusqlite::Row;

use super::{column_enum, parse_date_col, parse_datetime, Database};
use crate::error::Result;
use crate::models::{
    DeductionStatus, DeductionType, NewTransaction, Transaction, TransactionKind,
};

const TRANSACTION_COLUMNS: &str = "id, account_id, member_id, category_id, date, amount, \
     transaction_type, description, notes, import_line_hash, import_file_id, raw_row, \
     deduction_type, deduction_status, created_at";

fn map_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let date: String = row.get(4)?;
    let kind: String = row.get(6)?;
    let deduction_type: String = row.get(12)?;
    let deduction_status: String = row.get(13)?;
    let created_at: String = row.get(14)?;

    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        member_id: row.get(2)?,
        category_id: row.get(3)?,
        date: parse_date_col(&date),
        amount: row.get(5)?,
        kind: column_enum(6, kind)?,
        description: row.get(7)?,
        notes: row.get(8)?,
        import_line_hash: row.get(9)?,
        import_file_id: row.get(10)?,
        raw_row: row.get(11)?,
        deduction_type: column_enum(12, deduction_type)?,
        deduction_status: column_enum(13, deduction_status)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Insert a transaction and return its id
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transactions
             (account_id, member_id, category_id, date, amount, transaction_type,
              description, import_line_hash, import_file_id, raw_row,
              deduction_type, deduction_status)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                tx.account_id,
                tx.member_id,
                tx.category_id,
                tx.date.format("%Y-%m-%d").to_string(),
                tx.amount,
                tx.kind.as_str(),
                tx.description,
                tx.import_line_hash,
                tx.import_file_id,
                tx.raw_row,
                tx.deduction_type.as_str(),
                tx.deduction_status.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Whether a statement line with this content hash was already booked
    pub fn transaction_hash_exists(&self, hash: &str) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE import_line_hash = ?",
            params![hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List transactions, newest first, with optional account and
    /// category filters
    pub fn list_transactions(
        &self,
        account_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM transactions WHERE 1=1", TRANSACTION_COLUMNS);
        let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(account_id) = account_id {
            sql.push_str(" AND account_id = ?");
            sql_params.push(Box::new(account_id));
        }
        if let Some(category_id) = category_id {
            sql.push_str(" AND category_id = ?");
            sql_params.push(Box::new(category_id));
        }
        sql.push_str(" ORDER BY date DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(
                rusqlite::params_from_iter(sql_params.iter().map(|p| p.as_ref())),
                map_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Transactions booked by one import, optionally narrowed to a
    /// single category (the review pass asks for the fallback one)
    pub fn transactions_for_import_file(
        &self,
        import_file_id: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut sql = format!(
            "SELECT {} FROM transactions WHERE import_file_id = ?",
            TRANSACTION_COLUMNS
        );
        let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(import_file_id)];
        if let Some(category_id) = category_id {
            sql.push_str(" AND category_id = ?");
            sql_params.push(Box::new(category_id));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(
                rusqlite::params_from_iter(sql_params.iter().map(|p| p.as_ref())),
                map_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Move a set of transactions to a category. Returns how many rows
    /// changed.
    pub fn update_transactions_category(&self, ids: &[i64], category_id: i64) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.conn()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE transactions SET category_id = ? WHERE id IN ({})",
            placeholders
        );

        let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(category_id)];
        for id in ids {
            sql_params.push(Box::new(*id));
        }

        let updated = conn.execute(
            &sql,
            rusqlite::params_from_iter(sql_params.iter().map(|p| p.as_ref())),
        )?;
        Ok(updated)
    }

    /// Set a transaction's deduction bucket and review status
    pub fn set_transaction_deduction(
        &self,
        id: i64,
        deduction_type: DeductionType,
        status: DeductionStatus,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE transactions SET deduction_type = ?, deduction_status = ? WHERE id = ?",
            params![deduction_type.as_str(), status.as_str(), id],
        )?;
        Ok(())
    }

    /// Confirmed deduction totals for one calendar year: per bucket,
    /// the summed absolute amount and the transaction count.
    pub fn deduction_totals(&self, year: i32) -> Result<Vec<(DeductionType, f64, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT deduction_type, SUM(amount), COUNT(*)
             FROM transactions
             WHERE deduction_status = ? AND deduction_type != 'none'
               AND strftime('%Y', date) = ?
             GROUP BY deduction_type
             ORDER BY SUM(amount) DESC, deduction_type",
        )?;

        let totals = stmt
            .query_map(
                params![DeductionStatus::Confirmed.as_str(), format!("{:04}", year)],
                |row| {
                    let deduction_type: String = row.get(0)?;
                    Ok((
                        column_enum::<DeductionType>(0, deduction_type)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(totals)
    }

    /// Monthly expense/income totals for the status overview: count and
    /// summed amount per transaction type for the current month.
    pub fn month_totals(&self) -> Result<Vec<(TransactionKind, i64, f64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT transaction_type, COUNT(*), SUM(amount)
             FROM transactions
             WHERE strftime('%Y-%m', date) = strftime('%Y-%m', 'now')
             GROUP BY transaction_type",
        )?;

        let totals = stmt
            .query_map([], |row| {
                let kind: String = row.get(0)?;
                Ok((
                    column_enum::<TransactionKind>(0, kind)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(totals)
    }

    /// Total number of transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}
