//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ménage - Swiss household budget tool
#[derive(Parser)]
#[command(name = "menage")]
#[command(about = "Household budgeting with bank statement import", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set MENAGE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed default categories
    Init,

    /// Show database status and this month's totals
    Status,

    /// Manage money accounts (bank, card, cash, digital)
    Account {
        #[command(subcommand)]
        action: Option<AccountAction>,
    },

    /// Manage household members
    Member {
        #[command(subcommand)]
        action: Option<MemberAction>,
    },

    /// Manage budget categories
    Category {
        #[command(subcommand)]
        action: Option<CategoryAction>,
    },

    /// Manage categorization rules (keyword and learned merchant rules)
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Import a bank statement CSV
    Import {
        /// CSV file to import
        file: PathBuf,

        /// Account ID to book the transactions into
        #[arg(short, long)]
        account: i64,

        /// Member ID to attribute the transactions to
        #[arg(short, long)]
        member: Option<i64>,

        /// Analyze and categorize but write nothing
        #[arg(long)]
        dry_run: bool,

        /// How debit/credit columns combine: credit-else-debit or credit-minus-debit
        #[arg(long, default_value = "credit-else-debit")]
        sign_convention: String,

        /// Skip the duplicate-file confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Review merchants an import left on the fallback category
    Review {
        /// Import ID (shown after each import)
        import_id: i64,

        /// Merchant key to assign (requires --category)
        #[arg(long)]
        set: Option<String>,

        /// Category ID to assign the merchant to
        #[arg(long)]
        category: Option<i64>,
    },

    /// Extract amount, date and merchant from receipt text
    Receipt {
        /// Text file with the receipt content (e.g. OCR output)
        file: PathBuf,
    },

    /// Show confirmed tax deductions for a year
    Deductions {
        /// Calendar year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Net income in CHF, enables the health-cost franchise
        #[arg(long)]
        net_income: Option<f64>,
    },
}

#[derive(Subcommand)]
pub enum AccountAction {
    /// Add a new account
    Add {
        /// Account name
        name: String,
        /// Account kind: bank, card, cash, digital
        #[arg(long, short = 't', default_value = "bank")]
        kind: String,
    },

    /// List accounts
    List,
}

#[derive(Subcommand)]
pub enum MemberAction {
    /// Add a household member
    Add {
        /// Member name
        name: String,
        /// Member kind: adult, child, household
        #[arg(long, short = 't', default_value = "adult")]
        kind: String,
    },

    /// List household members
    List,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Add a category
    Add {
        /// Category name
        name: String,
        /// Category kind: expense or income
        #[arg(long, short = 't', default_value = "expense")]
        kind: String,
        /// Display group in pickers (e.g. "Quotidien")
        #[arg(long)]
        group: Option<String>,
    },

    /// List categories grouped for the picker
    List {
        /// Filter by kind: expense or income
        #[arg(long, short = 't')]
        kind: Option<String>,
    },

    /// Most-used categories over the trailing 90 days
    Favorites {
        /// Category kind: expense or income
        #[arg(long, short = 't', default_value = "expense")]
        kind: String,

        /// Number of favorites to show
        #[arg(long, default_value = "8")]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List keyword rules and learned merchant rules
    List,

    /// Add a keyword rule
    Add {
        /// Category ID the rule assigns
        category: i64,

        /// Comma-separated keywords (matched as lowercase substrings)
        keywords: String,

        /// Rule priority (lower is checked first)
        #[arg(long, default_value = "100")]
        priority: i64,
    },
}
