//! Ménage Core Library
//!
//! Shared functionality for the Ménage household budget tool:
//! - Database access and migrations (SQLCipher-capable SQLite)
//! - Bank statement decoding and CSV dialect detection
//! - Bank preset matching and column mapping
//! - Merchant description cleaning and normalization
//! - Content-hash deduplication of statement lines and files
//! - Rule-based transaction categorization with a review pass
//! - Receipt text extraction (amount, date, merchant)
//! - Swiss tax deduction bookkeeping

pub mod categorize;
pub mod db;
pub mod dedupe;
pub mod deductions;
pub mod error;
pub mod import;
pub mod merchant;
pub mod models;
pub mod parse;
pub mod presets;
pub mod receipt;

pub use categorize::{
    apply_merchant_groups, build_merchant_groups, Categorizer, MerchantGroup,
};
pub use db::{default_db_path, Database, DB_KEY_ENV};
pub use deductions::{DeductionLine, DeductionReport};
pub use error::{Error, Result};
pub use import::{FileAnalysis, ImportOptions, ImportSummary, Importer};
pub use receipt::{extract_receipt_info, suggest_deduction_type, ReceiptExtraction};
