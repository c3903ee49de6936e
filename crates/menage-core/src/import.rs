//! Statement import pipeline
//!
//! Two-phase flow: [`Importer::analyze`] inspects the raw file and
//! reports everything the caller needs to confirm (encoding, dialect,
//! preset, column mapping, preview, duplicate warning); [`Importer::run`]
//! then books the rows. Analysis never writes; a failed run leaves its
//! manifest row marked failed.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::categorize::Categorizer;
use crate::db::Database;
use crate::dedupe::{self, DuplicateFileCheck, LineHashInput};
use crate::error::{Error, Result};
use crate::merchant::extract_merchant_from_parts;
use crate::models::{
    ColumnMapping, DecimalSeparator, DeductionStatus, DeductionType, ImportFileStatus,
    NewTransaction, SignConvention, TransactionKind,
};
use crate::parse::{
    decode_statement, detect_date_format, detect_decimal_separator, detect_delimiter, parse_amount,
    parse_csv, parse_date, DetectedEncoding, ParsedCsv,
};
use crate::presets::{detect_preset, map_columns, validate_mapping, MappingValidation};

/// How many rows the analysis preview carries
const PREVIEW_ROWS: usize = 20;

/// How many cells feed the dialect detectors
const DETECT_SAMPLE_ROWS: usize = 100;

/// Everything learned about a statement file before any row is booked
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub file_name: String,
    pub file_size: i64,
    pub file_hash: String,
    pub encoding: DetectedEncoding,
    pub delimiter: char,
    pub date_format: Option<String>,
    pub decimal_separator: DecimalSeparator,
    pub headers: Vec<String>,
    pub preview_rows: Vec<Vec<String>>,
    pub row_count: usize,
    pub preset_name: Option<String>,
    pub mapping: ColumnMapping,
    pub validation: MappingValidation,
    pub duplicate: DuplicateFileCheck,
}

impl FileAnalysis {
    /// Soft warning text when this exact file was already imported
    /// into the same account. The import may still proceed; line
    /// hashes will skip the individual duplicates.
    pub fn duplicate_warning(&self) -> Option<String> {
        if !self.duplicate.is_duplicate {
            return None;
        }
        let when = self
            .duplicate
            .imported_at
            .map(|t| t.format("%d.%m.%Y %H:%M").to_string())
            .unwrap_or_else(|| "an earlier date".to_string());
        Some(format!(
            "This file was already imported on {} ({} rows). Continue to skip duplicates.",
            when,
            self.duplicate.rows_imported.unwrap_or(0)
        ))
    }
}

/// Caller choices for one import run
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub account_id: i64,
    pub member_id: Option<i64>,
    pub sign_convention: SignConvention,
    /// Consult learned merchant rules before keyword rules
    pub apply_merchant_rules: bool,
    /// Parse and categorize but write nothing
    pub dry_run: bool,
}

/// Outcome of one import run
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    /// Per-row problems, each prefixed "Row N:" (N is the 1-based
    /// line number in the file, headers included)
    pub errors: Vec<String>,
    /// None on dry runs
    pub import_file_id: Option<i64>,
}

/// Runs the import pipeline against one database
pub struct Importer<'a> {
    db: &'a Database,
}

impl<'a> Importer<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Inspect a raw statement file without writing anything.
    ///
    /// Fails only on structural problems (undecodable CSV, no header
    /// line). A mapping that cannot book rows is reported through
    /// `validation`, not as an error, so the caller can show what was
    /// detected and let the user fix the mapping.
    pub fn analyze(&self, bytes: &[u8], file_name: &str, account_id: i64) -> Result<FileAnalysis> {
        let (content, encoding) = decode_statement(bytes);
        let delimiter = detect_delimiter(&content);
        let parsed = parse_csv(&content, delimiter)?;
        if parsed.headers.is_empty() {
            return Err(Error::Import("No headers found in CSV file".to_string()));
        }

        let presets = self.db.list_presets()?;
        let preset = detect_preset(&parsed.headers, &presets);
        let mapping = map_columns(&parsed.headers, preset);
        let validation = validate_mapping(&mapping);

        let date_samples = column_samples(&parsed, mapping.date.as_deref());
        let date_format = detect_date_format(
            &date_samples.iter().map(String::as_str).collect::<Vec<_>>(),
        )
        .map(str::to_string);

        let mut amount_samples = column_samples(&parsed, mapping.amount.as_deref());
        amount_samples.extend(column_samples(&parsed, mapping.debit.as_deref()));
        amount_samples.extend(column_samples(&parsed, mapping.credit.as_deref()));
        let decimal_separator = detect_decimal_separator(
            &amount_samples
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>(),
        );

        let file_hash = dedupe::file_hash(bytes);
        let duplicate = self.db.check_duplicate_file(account_id, &file_hash)?;

        debug!(
            file = file_name,
            encoding = encoding.as_str(),
            delimiter = %delimiter,
            preset = preset.map(|p| p.name.as_str()).unwrap_or("none"),
            rows = parsed.rows.len(),
            "analyzed statement file"
        );

        Ok(FileAnalysis {
            file_name: file_name.to_string(),
            file_size: bytes.len() as i64,
            file_hash,
            encoding,
            delimiter,
            date_format,
            decimal_separator,
            preview_rows: parsed.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
            row_count: parsed.rows.len(),
            headers: parsed.headers,
            preset_name: preset.map(|p| p.name.clone()),
            mapping,
            validation,
            duplicate,
        })
    }

    /// Book the rows of an analyzed statement file.
    ///
    /// Rows with an empty date cell or a zero amount are skipped
    /// silently; rows whose date cannot be parsed produce a "Row N:"
    /// error and are skipped. Rows whose line hash is already in the
    /// database are skipped as duplicates. Store failures on a single
    /// row are recorded as "Row N:" errors too and never abort the
    /// batch, so `imported + skipped` always equals `total`.
    pub fn run(
        &self,
        bytes: &[u8],
        analysis: &FileAnalysis,
        options: &ImportOptions,
    ) -> Result<ImportSummary> {
        if !analysis.validation.valid {
            return Err(Error::Mapping(analysis.validation.errors.join(", ")));
        }

        let (content, _) = decode_statement(bytes);
        let parsed = parse_csv(&content, analysis.delimiter)?;

        let categorizer = Categorizer::new(self.db, options.apply_merchant_rules)?;
        let columns = ResolvedColumns::new(&parsed.headers, &analysis.mapping);

        let import_file_id = if options.dry_run {
            None
        } else {
            Some(self.db.insert_import_file(
                options.account_id,
                &analysis.file_name,
                analysis.file_size,
                &analysis.file_hash,
                analysis.preset_name.as_deref(),
            )?)
        };

        let mut summary = ImportSummary {
            total: parsed.rows.len(),
            imported: 0,
            skipped: 0,
            errors: Vec::new(),
            import_file_id,
        };

        for (index, row) in parsed.rows.iter().enumerate() {
            // 1-based file line number, counting the header line
            let line_no = index + 2;

            let date_cell = columns.cell(row, columns.date);
            if date_cell.is_empty() {
                summary.skipped += 1;
                continue;
            }
            let Some(date) = parse_date(date_cell, analysis.date_format.as_deref()) else {
                summary
                    .errors
                    .push(format!("Row {}: Invalid date '{}'", line_no, date_cell));
                summary.skipped += 1;
                continue;
            };

            let signed = columns.signed_amount(
                row,
                analysis.decimal_separator,
                options.sign_convention,
            );
            if signed == 0.0 {
                summary.skipped += 1;
                continue;
            }

            let parts: Vec<&str> = [columns.description, columns.description2, columns.description3]
                .iter()
                .filter_map(|idx| idx.map(|i| columns.cell(row, Some(i))))
                .collect();
            let raw_description = parts.join(" ");
            let description = extract_merchant_from_parts(&parts);

            let reference = columns.cell_opt(row, columns.reference);
            let value_date = columns
                .cell_opt(row, columns.value_date)
                .and_then(|v| parse_date(v, analysis.date_format.as_deref()));

            let hash = dedupe::line_hash(&LineHashInput {
                account_id: options.account_id,
                date,
                amount: signed,
                description: &description,
                reference,
                value_date,
            });

            if self.db.transaction_hash_exists(&hash)? {
                summary.skipped += 1;
                continue;
            }

            let category_id = match categorizer.categorize(&description, &raw_description) {
                Ok(id) => id,
                Err(e) => {
                    summary.errors.push(format!("Row {}: {}", line_no, e));
                    summary.skipped += 1;
                    continue;
                }
            };

            if options.dry_run {
                summary.imported += 1;
                continue;
            }

            let kind = if signed >= 0.0 {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            };

            let inserted = self.db.insert_transaction(&NewTransaction {
                account_id: options.account_id,
                member_id: options.member_id,
                category_id: Some(category_id),
                date,
                amount: signed.abs(),
                kind,
                description,
                import_line_hash: Some(hash),
                import_file_id,
                raw_row: Some(row_to_json(&parsed.headers, row)),
                deduction_type: DeductionType::None,
                deduction_status: DeductionStatus::None,
            });
            match inserted {
                Ok(_) => summary.imported += 1,
                Err(e) => {
                    summary.errors.push(format!("Row {}: {}", line_no, e));
                    summary.skipped += 1;
                }
            }
        }

        if let Some(id) = import_file_id {
            let status = if summary.errors.len() == summary.total && summary.total > 0 {
                ImportFileStatus::Failed
            } else {
                ImportFileStatus::Completed
            };
            self.db.update_import_file_counts(
                id,
                status,
                summary.total as i64,
                summary.imported as i64,
                summary.skipped as i64,
            )?;
        }

        info!(
            file = analysis.file_name,
            total = summary.total,
            imported = summary.imported,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            dry_run = options.dry_run,
            "import finished"
        );

        Ok(summary)
    }
}

/// Column mapping resolved to row indices for the loop
struct ResolvedColumns {
    date: Option<usize>,
    description: Option<usize>,
    description2: Option<usize>,
    description3: Option<usize>,
    amount: Option<usize>,
    debit: Option<usize>,
    credit: Option<usize>,
    value_date: Option<usize>,
    reference: Option<usize>,
}

impl ResolvedColumns {
    fn new(headers: &[String], mapping: &ColumnMapping) -> Self {
        let index = |name: &Option<String>| {
            name.as_ref()
                .and_then(|n| headers.iter().position(|h| h == n))
        };
        Self {
            date: index(&mapping.date),
            description: index(&mapping.description),
            description2: index(&mapping.description2),
            description3: index(&mapping.description3),
            amount: index(&mapping.amount),
            debit: index(&mapping.debit),
            credit: index(&mapping.credit),
            value_date: index(&mapping.value_date),
            reference: index(&mapping.reference),
        }
    }

    fn cell<'r>(&self, row: &'r [String], index: Option<usize>) -> &'r str {
        index
            .and_then(|i| row.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    fn cell_opt<'r>(&self, row: &'r [String], index: Option<usize>) -> Option<&'r str> {
        let value = self.cell(row, index);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    fn signed_amount(
        &self,
        row: &[String],
        separator: DecimalSeparator,
        convention: SignConvention,
    ) -> f64 {
        if self.amount.is_some() {
            return parse_amount(self.cell(row, self.amount), separator);
        }
        let credit = parse_amount(self.cell(row, self.credit), separator);
        let debit = parse_amount(self.cell(row, self.debit), separator);
        match convention {
            SignConvention::CreditElseDebit => {
                if credit != 0.0 {
                    credit
                } else {
                    -debit.abs()
                }
            }
            SignConvention::CreditMinusDebit => credit - debit,
        }
    }
}

/// Original CSV row as a JSON object keyed by header, kept for audit
fn row_to_json(headers: &[String], row: &[String]) -> String {
    let mut map = serde_json::Map::new();
    for (i, header) in headers.iter().enumerate() {
        if let Some(value) = row.get(i) {
            map.insert(header.clone(), Value::String(value.clone()));
        }
    }
    json!(map).to_string()
}

fn column_samples(parsed: &ParsedCsv, column: Option<&str>) -> Vec<String> {
    let Some(index) = column.and_then(|name| parsed.headers.iter().position(|h| h == name)) else {
        return Vec::new();
    };
    parsed
        .rows
        .iter()
        .take(DETECT_SAMPLE_ROWS)
        .filter_map(|row| row.get(index))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
