//! Import manifest operations

use rusqlite::Row;
use rusqlite::{params, OptionalExtension};

use super::{column_enum, parse_datetime, Database};
use crate::dedupe::DuplicateFileCheck;
use crate::error::{Error, Result};
use crate::models::{ImportFile, ImportFileStatus};

const IMPORT_FILE_COLUMNS: &str = "id, account_id, file_name, file_size, file_hash, status, \
     rows_total, rows_imported, rows_skipped, preset_used, created_at";

fn map_import_file(row: &Row) -> rusqlite::Result<ImportFile> {
    let status: String = row.get(5)?;
    let created_at: String = row.get(10)?;

    Ok(ImportFile {
        id: row.get(0)?,
        account_id: row.get(1)?,
        file_name: row.get(2)?,
        file_size: row.get(3)?,
        file_hash: row.get(4)?,
        status: column_enum(5, status)?,
        rows_total: row.get(6)?,
        rows_imported: row.get(7)?,
        rows_skipped: row.get(8)?,
        preset_used: row.get(9)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Record the start of an import: a manifest row with zero counts
    /// in 'processing' state. Counts and status come in at the end via
    /// `update_import_file_counts`.
    pub fn insert_import_file(
        &self,
        account_id: i64,
        file_name: &str,
        file_size: i64,
        file_hash: &str,
        preset_used: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO import_files (account_id, file_name, file_size, file_hash, preset_used)
             VALUES (?, ?, ?, ?, ?)",
            params![account_id, file_name, file_size, file_hash, preset_used],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Finalize a manifest row with the run's outcome
    pub fn update_import_file_counts(
        &self,
        id: i64,
        status: ImportFileStatus,
        rows_total: i64,
        rows_imported: i64,
        rows_skipped: i64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE import_files
             SET status = ?, rows_total = ?, rows_imported = ?, rows_skipped = ?
             WHERE id = ?",
            params![status.as_str(), rows_total, rows_imported, rows_skipped, id],
        )?;
        Ok(())
    }

    /// Whole-file duplicate lookup for one account. Several manifest
    /// rows may share a hash (re-imports are allowed); the most recent
    /// one answers.
    pub fn check_duplicate_file(
        &self,
        account_id: i64,
        file_hash: &str,
    ) -> Result<DuplicateFileCheck> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT created_at, rows_imported FROM import_files
                 WHERE account_id = ? AND file_hash = ?
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                params![account_id, file_hash],
                |row| {
                    let created_at: String = row.get(0)?;
                    let rows_imported: i64 = row.get(1)?;
                    Ok((created_at, rows_imported))
                },
            )
            .optional()?;

        Ok(match row {
            Some((created_at, rows_imported)) => DuplicateFileCheck {
                is_duplicate: true,
                imported_at: Some(parse_datetime(&created_at)),
                rows_imported: Some(rows_imported),
            },
            None => DuplicateFileCheck::default(),
        })
    }

    /// Get a manifest row by ID
    pub fn get_import_file(&self, id: i64) -> Result<ImportFile> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM import_files WHERE id = ?",
                IMPORT_FILE_COLUMNS
            ),
            params![id],
            map_import_file,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("Import {} not found", id))
            }
            e => e.into(),
        })
    }

    /// List manifest rows, newest first, optionally for one account
    pub fn list_import_files(&self, account_id: Option<i64>) -> Result<Vec<ImportFile>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM import_files WHERE 1=1", IMPORT_FILE_COLUMNS);
        let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(account_id) = account_id {
            sql.push_str(" AND account_id = ?");
            sql_params.push(Box::new(account_id));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let imports = stmt
            .query_map(
                rusqlite::params_from_iter(sql_params.iter().map(|p| p.as_ref())),
                map_import_file,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(imports)
    }
}
