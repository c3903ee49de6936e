//! Keyword and merchant categorization rules

use rusqlite::Row;
use rusqlite::{params, OptionalExtension};

use super::{column_enum, parse_datetime, Database};
use crate::error::Result;
use crate::models::{KeywordRule, MerchantRule};

fn map_keyword_rule(row: &Row) -> rusqlite::Result<KeywordRule> {
    let keywords: String = row.get(2)?;
    let created_at: String = row.get(5)?;

    let keywords: Vec<String> = serde_json::from_str(&keywords).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(KeywordRule {
        id: row.get(0)?,
        category_id: row.get(1)?,
        keywords,
        priority: row.get(3)?,
        active: row.get(4)?,
        created_at: parse_datetime(&created_at),
    })
}

const MERCHANT_RULE_COLUMNS: &str = "id, merchant_key, merchant_display, default_category_id, \
     deduction_type, use_count, created_at, updated_at";

fn map_merchant_rule(row: &Row) -> rusqlite::Result<MerchantRule> {
    let deduction_type: String = row.get(4)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(MerchantRule {
        id: row.get(0)?,
        merchant_key: row.get(1)?,
        merchant_display: row.get(2)?,
        category_id: row.get(3)?,
        deduction_type: column_enum(4, deduction_type)?,
        use_count: row.get(5)?,
        created_at: parse_datetime(&created_at),
        updated_at: parse_datetime(&updated_at),
    })
}

impl Database {
    /// Add a keyword rule for a category
    pub fn add_keyword_rule(
        &self,
        category_id: i64,
        keywords: &[String],
        priority: i64,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO keyword_rules (category_id, keywords, priority) VALUES (?, ?, ?)",
            params![category_id, serde_json::to_string(keywords)?, priority],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List active keyword rules, lowest priority first (the order the
    /// categorizer checks them in)
    pub fn list_keyword_rules(&self) -> Result<Vec<KeywordRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, category_id, keywords, priority, is_active, created_at
             FROM keyword_rules WHERE is_active = 1 ORDER BY priority, id",
        )?;

        let rules = stmt
            .query_map([], map_keyword_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Look up a merchant rule by exact normalized key
    pub fn find_merchant_rule(&self, merchant_key: &str) -> Result<Option<MerchantRule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                &format!(
                    "SELECT {} FROM merchant_rules WHERE merchant_key = ?",
                    MERCHANT_RULE_COLUMNS
                ),
                params![merchant_key],
                map_merchant_rule,
            )
            .optional()?;
        Ok(rule)
    }

    /// Partial merchant lookup: rules whose key contains the fragment
    /// (case-insensitive), most used first. Used with the 30-char
    /// truncated key when the exact lookup misses.
    pub fn find_merchant_rule_partial(&self, fragment: &str) -> Result<Option<MerchantRule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                &format!(
                    "SELECT {} FROM merchant_rules
                     WHERE merchant_key LIKE '%' || ? || '%'
                     ORDER BY use_count DESC, id LIMIT 1",
                    MERCHANT_RULE_COLUMNS
                ),
                params![fragment],
                map_merchant_rule,
            )
            .optional()?;
        Ok(rule)
    }

    /// List all merchant rules, most used first
    pub fn list_merchant_rules(&self) -> Result<Vec<MerchantRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM merchant_rules ORDER BY use_count DESC, merchant_key",
            MERCHANT_RULE_COLUMNS
        ))?;

        let rules = stmt
            .query_map([], map_merchant_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Create or refresh a merchant rule. On conflict the display name
    /// is refreshed and a non-null category replaces the stored one.
    pub fn upsert_merchant_rule(
        &self,
        merchant_key: &str,
        merchant_display: &str,
        category_id: Option<i64>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO merchant_rules (merchant_key, merchant_display, default_category_id)
             VALUES (?, ?, ?)
             ON CONFLICT(merchant_key) DO UPDATE SET
                 merchant_display = excluded.merchant_display,
                 default_category_id = COALESCE(excluded.default_category_id, default_category_id),
                 updated_at = CURRENT_TIMESTAMP",
            params![merchant_key, merchant_display, category_id],
        )?;

        let id = conn.query_row(
            "SELECT id FROM merchant_rules WHERE merchant_key = ?",
            params![merchant_key],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Record one use of a merchant rule
    pub fn bump_merchant_rule_use(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE merchant_rules
             SET use_count = use_count + 1, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
            params![id],
        )?;
        Ok(())
    }
}
