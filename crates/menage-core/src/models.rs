//! Data models for Menage

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Direction of money flow. Used for both transactions and categories
/// (a category only ever applies to one direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Household member role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Adult,
    Child,
    /// Shared bucket for expenses that belong to nobody in particular
    Household,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Adult => "adult",
            MemberKind::Child => "child",
            MemberKind::Household => "household",
        }
    }
}

impl std::str::FromStr for MemberKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adult" => Ok(MemberKind::Adult),
            "child" => Ok(MemberKind::Child),
            "household" => Ok(MemberKind::Household),
            _ => Err(format!("Unknown member kind: {}", s)),
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of money account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Bank,
    Card,
    Cash,
    Digital,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Bank => "bank",
            AccountKind::Card => "card",
            AccountKind::Cash => "cash",
            AccountKind::Digital => "digital",
        }
    }
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bank" => Ok(AccountKind::Bank),
            "card" => Ok(AccountKind::Card),
            "cash" => Ok(AccountKind::Cash),
            "digital" => Ok(AccountKind::Digital),
            _ => Err(format!("Unknown account kind: {}", s)),
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decimal separator used by a statement's amount columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecimalSeparator {
    #[serde(rename = ".")]
    Dot,
    #[serde(rename = ",")]
    Comma,
}

impl DecimalSeparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecimalSeparator::Dot => ".",
            DecimalSeparator::Comma => ",",
        }
    }
}

impl std::str::FromStr for DecimalSeparator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "." | "dot" => Ok(DecimalSeparator::Dot),
            "," | "comma" => Ok(DecimalSeparator::Comma),
            _ => Err(format!("Unknown decimal separator: {}", s)),
        }
    }
}

impl std::fmt::Display for DecimalSeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a signed amount is derived when a statement has separate
/// debit and credit columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignConvention {
    /// Use the credit cell when non-zero, otherwise the negated debit cell
    #[default]
    CreditElseDebit,
    /// Always compute credit minus debit (both cells may be populated)
    CreditMinusDebit,
}

impl SignConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignConvention::CreditElseDebit => "credit-else-debit",
            SignConvention::CreditMinusDebit => "credit-minus-debit",
        }
    }
}

impl std::str::FromStr for SignConvention {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit-else-debit" => Ok(SignConvention::CreditElseDebit),
            "credit-minus-debit" => Ok(SignConvention::CreditMinusDebit),
            _ => Err(format!("Unknown sign convention: {}", s)),
        }
    }
}

impl std::fmt::Display for SignConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Swiss tax deduction bucket a transaction may count towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    #[default]
    None,
    Health,
    Childcare,
    MortgageInterest,
    PropertyMaintenance,
    Donation,
    Other,
}

impl DeductionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Health => "health",
            Self::Childcare => "childcare",
            Self::MortgageInterest => "mortgage_interest",
            Self::PropertyMaintenance => "property_maintenance",
            Self::Donation => "donation",
            Self::Other => "other",
        }
    }

    /// French display label, matching the tax-form vocabulary
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "Aucune",
            Self::Health => "Frais médicaux",
            Self::Childcare => "Garde d'enfants",
            Self::MortgageInterest => "Intérêts hypothécaires",
            Self::PropertyMaintenance => "Entretien immobilier",
            Self::Donation => "Dons",
            Self::Other => "Autres déductions",
        }
    }
}

impl std::str::FromStr for DeductionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "health" => Ok(Self::Health),
            "childcare" => Ok(Self::Childcare),
            "mortgage_interest" => Ok(Self::MortgageInterest),
            "property_maintenance" => Ok(Self::PropertyMaintenance),
            "donation" => Ok(Self::Donation),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown deduction type: {}", s)),
        }
    }
}

impl std::fmt::Display for DeductionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review state of a deduction suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionStatus {
    #[default]
    None,
    Suggested,
    Confirmed,
    Rejected,
}

impl DeductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Suggested => "suggested",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for DeductionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "suggested" => Ok(Self::Suggested),
            "confirmed" => Ok(Self::Confirmed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown deduction status: {}", s)),
        }
    }
}

impl std::fmt::Display for DeductionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a statement import attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFileStatus {
    Processing,
    Completed,
    Failed,
}

impl ImportFileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ImportFileStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown import status: {}", s)),
        }
    }
}

impl std::fmt::Display for ImportFileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A household member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub kind: MemberKind,
    pub active: bool,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

/// A money account (bank account, card, cash wallet or payment app)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub kind: AccountKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub active: bool,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

/// A budget category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: TransactionKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<i64>,
    /// Display group in pickers; missing groups collapse to "Autres"
    pub group_name: Option<String>,
    pub active: bool,
    /// Hidden categories stay valid on old transactions but are
    /// excluded from pickers and favorites
    pub hidden: bool,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

/// A booked transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub member_id: Option<i64>,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    /// Absolute value; `kind` carries the direction
    pub amount: f64,
    pub kind: TransactionKind,
    pub description: String,
    pub notes: Option<String>,
    /// Content hash of the source statement line, None for manual entries
    pub import_line_hash: Option<String>,
    pub import_file_id: Option<i64>,
    /// Original CSV row as JSON, kept for audit and review
    pub raw_row: Option<String>,
    pub deduction_type: DeductionType,
    pub deduction_status: DeductionStatus,
    pub created_at: DateTime<Utc>,
}

/// A new transaction to insert (produced by the import pipeline)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i64,
    pub member_id: Option<i64>,
    pub category_id: Option<i64>,
    pub date: NaiveDate,
    pub amount: f64,
    pub kind: TransactionKind,
    pub description: String,
    pub import_line_hash: Option<String>,
    pub import_file_id: Option<i64>,
    pub raw_row: Option<String>,
    pub deduction_type: DeductionType,
    pub deduction_status: DeductionStatus,
}

/// A keyword-based categorization rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    pub id: i64,
    pub category_id: i64,
    /// Lowercase substrings; any match assigns the category
    pub keywords: Vec<String>,
    /// Rules are checked in ascending priority order; lowest wins first
    pub priority: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A learned merchant-to-category association
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRule {
    pub id: i64,
    /// Normalized merchant key (uppercase, digits stripped)
    pub merchant_key: String,
    /// Human-readable merchant name for display
    pub merchant_display: String,
    pub category_id: Option<i64>,
    pub deduction_type: DeductionType,
    /// How many imported transactions this rule has categorized
    pub use_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit record for one statement import attempt. Also the basis for
/// whole-file duplicate warnings (same hash seen for the same account).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFile {
    pub id: i64,
    pub account_id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub file_hash: String,
    pub status: ImportFileStatus,
    pub rows_total: i64,
    pub rows_imported: i64,
    pub rows_skipped: i64,
    pub preset_used: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Candidate header-name patterns for each logical statement field.
/// Patterns are tried in declared order; first header that matches a
/// pattern (exact case-insensitive, then substring) wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetMapping {
    #[serde(default)]
    pub date: Vec<String>,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub description2: Vec<String>,
    #[serde(default)]
    pub description3: Vec<String>,
    #[serde(default)]
    pub amount: Vec<String>,
    #[serde(default)]
    pub debit: Vec<String>,
    #[serde(default)]
    pub credit: Vec<String>,
    #[serde(default)]
    pub currency: Vec<String>,
    #[serde(default)]
    pub balance: Vec<String>,
    #[serde(default)]
    pub value_date: Vec<String>,
    #[serde(default)]
    pub reference: Vec<String>,
}

/// Resolved column mapping: logical field to concrete header name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: Option<String>,
    pub description: Option<String>,
    pub description2: Option<String>,
    pub description3: Option<String>,
    pub amount: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub currency: Option<String>,
    pub balance: Option<String>,
    pub value_date: Option<String>,
    pub reference: Option<String>,
}

/// A bank-specific column-layout preset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankPreset {
    pub id: i64,
    pub name: String,
    /// Header tokens whose presence identifies this bank's export.
    /// Empty only for the "Generic" fallback preset.
    pub match_headers: Vec<String>,
    pub delimiter_hint: Option<char>,
    pub date_format_hint: Option<String>,
    pub decimal_separator_hint: Option<DecimalSeparator>,
    pub mapping: PresetMapping,
    pub active: bool,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

impl BankPreset {
    /// The universal fallback preset, matched when nothing else is
    pub fn is_generic(&self) -> bool {
        self.name == "Generic"
    }
}
