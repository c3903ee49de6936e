//! Bank preset catalog
//!
//! The match-header lists and field mappings are stored as JSON text
//! columns; rows that fail to deserialize surface as conversion errors
//! at the read boundary.

use rusqlite::params;
use rusqlite::Row;

use super::{column_enum, parse_datetime, DbConn, Database};
use crate::error::Result;
use crate::models::{BankPreset, PresetMapping};
use crate::presets::builtin_presets;

fn map_preset(row: &Row) -> rusqlite::Result<BankPreset> {
    let match_headers: String = row.get(2)?;
    let delimiter_hint: Option<String> = row.get(3)?;
    let separator_hint: Option<String> = row.get(5)?;
    let mapping: String = row.get(6)?;
    let created_at: String = row.get(9)?;

    let match_headers: Vec<String> = serde_json::from_str(&match_headers).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })?;
    let mapping: PresetMapping = serde_json::from_str(&mapping).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(BankPreset {
        id: row.get(0)?,
        name: row.get(1)?,
        match_headers,
        delimiter_hint: delimiter_hint.and_then(|s| s.chars().next()),
        date_format_hint: row.get(4)?,
        decimal_separator_hint: separator_hint.map(|s| column_enum(5, s)).transpose()?,
        mapping,
        active: row.get(7)?,
        order_index: row.get(8)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// List active presets in catalog (detection) order
    pub fn list_presets(&self) -> Result<Vec<BankPreset>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, match_headers, delimiter_hint, date_format_hint,
                    decimal_separator_hint, mapping, is_active, order_index, created_at
             FROM bank_presets WHERE is_active = 1 ORDER BY order_index, id",
        )?;

        let presets = stmt
            .query_map([], map_preset)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(presets)
    }

    /// Install the built-in preset catalog. Idempotent; presets are
    /// keyed by name so re-running a migration never duplicates them.
    pub(super) fn seed_builtin_presets(&self, conn: &DbConn) -> Result<()> {
        for seed in builtin_presets() {
            let match_headers = serde_json::to_string(&seed.match_headers)?;
            let mapping = serde_json::to_string(&seed.mapping)?;

            conn.execute(
                "INSERT OR IGNORE INTO bank_presets
                 (name, match_headers, delimiter_hint, date_format_hint,
                  decimal_separator_hint, mapping, order_index)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    seed.name,
                    match_headers,
                    seed.delimiter_hint.to_string(),
                    seed.date_format_hint,
                    seed.decimal_separator_hint.as_str(),
                    mapping,
                    seed.order_index,
                ],
            )?;
        }
        Ok(())
    }
}
