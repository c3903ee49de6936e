//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `accounts` - Accounts and household members
//! - `categories` - Budget categories, grouping and usage favorites
//! - `presets` - Bank preset catalog (seeded with the built-ins)
//! - `rules` - Keyword rules and learned merchant rules
//! - `transactions` - Transaction inserts, hash checks, deductions
//! - `import_files` - Import manifest and duplicate-file lookups

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod accounts;
mod categories;
mod import_files;
mod presets;
mod rules;
mod transactions;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "MENAGE_DB_KEY";

/// Default database location under the platform data directory,
/// falling back to the working directory when none is known
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("menage").join("menage.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("menage.db"))
}

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path. This allows moving/renaming/restoring the database freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Fixed application salt - changing this would invalidate all existing encrypted databases
    const APP_SALT: &[u8; 16] = b"menage-salt-v1fx";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    // Extract the hash portion for use as SQLCipher key (hex encoded)
    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a SQLite DATE column ("YYYY-MM-DD")
pub(crate) fn parse_date_col(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}

/// Map an enum parse failure onto a rusqlite conversion error so bad
/// stored values surface at the deserialization boundary.
pub(crate) fn column_enum<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse::<T>().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool with encryption
    ///
    /// Requires `MENAGE_DB_KEY` environment variable to be set.
    /// The database will be encrypted using SQLCipher with a key derived
    /// from the passphrase via Argon2.
    ///
    /// Returns an error if `MENAGE_DB_KEY` is not set. Use `new_unencrypted()`
    /// for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        let encryption_key = std::env::var(DB_KEY_ENV).ok();
        match encryption_key {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases (not recommended for production).",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    ///
    /// WARNING: This creates an unencrypted database. Only use for development
    /// or testing. For production, use `new()` with `MENAGE_DB_KEY` set.
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = if let Some(pass) = passphrase {
            let key = derive_key(pass)?;
            let key_pragma = format!("PRAGMA key = 'x\"{}\"';", key);

            // Use with_init to set the key on every new connection
            let manager = manager.with_init(move |conn| {
                conn.execute_batch(&key_pragma)?;
                Ok(())
            });

            Pool::builder().max_size(10).build(manager)?
        } else {
            Pool::builder().max_size(10).build(manager)?
        };

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because SQLCipher
    /// has issues with in-memory databases in the connection pool.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!("/tmp/menage_test_{}.db", id);

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path)
    }

    /// Check if the database is encrypted
    pub fn is_encrypted(&self) -> Result<bool> {
        let conn = self.conn()?;
        // SQLCipher sets cipher_version if encryption is active
        let result: rusqlite::Result<String> =
            conn.query_row("PRAGMA cipher_version;", [], |row| row.get(0));
        Ok(result.is_ok() && std::env::var(DB_KEY_ENV).is_ok())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- Performance pragmas for local storage (SSD/M.2 recommended)
            -- WAL mode: better concurrency, readers don't block writers
            -- Note: creates -wal and -shm sidecar files alongside the database
            PRAGMA journal_mode = WAL;

            -- Cache size: ~8MB (2000 pages * 4KB default page size)
            PRAGMA cache_size = 2000;

            -- Synchronous NORMAL: good balance of safety and performance
            -- FULL is safer but slower; NORMAL is safe for most power-loss scenarios
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory (faster for complex queries)
            PRAGMA temp_store = MEMORY;

            -- Household members
            CREATE TABLE IF NOT EXISTS members (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                member_type TEXT NOT NULL,                 -- adult, child, household
                is_active BOOLEAN DEFAULT 1,
                order_index INTEGER DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Money accounts (bank, card, cash, digital wallet)
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                account_type TEXT NOT NULL,                -- bank, card, cash, digital
                icon TEXT,
                color TEXT,
                is_active BOOLEAN DEFAULT 1,
                order_index INTEGER DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Budget categories
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                category_type TEXT NOT NULL,               -- expense, income
                icon TEXT,
                color TEXT,
                parent_id INTEGER REFERENCES categories(id),
                group_name TEXT,                           -- picker group, NULL collapses to 'Autres'
                is_active BOOLEAN DEFAULT 1,
                is_hidden BOOLEAN DEFAULT 0,               -- excluded from pickers, valid on old rows
                order_index INTEGER DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_categories_type ON categories(category_type);
            CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);

            -- Bank presets (CSV column layouts; seeded with the built-in catalog)
            CREATE TABLE IF NOT EXISTS bank_presets (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                match_headers TEXT NOT NULL,               -- JSON array of header tokens
                delimiter_hint TEXT,
                date_format_hint TEXT,
                decimal_separator_hint TEXT,               -- '.' or ','
                mapping TEXT NOT NULL,                     -- JSON PresetMapping
                is_active BOOLEAN DEFAULT 1,
                order_index INTEGER DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Keyword categorization rules (user-defined, checked by ascending priority)
            CREATE TABLE IF NOT EXISTS keyword_rules (
                id INTEGER PRIMARY KEY,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                keywords TEXT NOT NULL,                    -- JSON array of lowercase substrings
                priority INTEGER NOT NULL DEFAULT 0,
                is_active BOOLEAN DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_keyword_rules_priority ON keyword_rules(priority);

            -- Learned merchant-to-category associations
            CREATE TABLE IF NOT EXISTS merchant_rules (
                id INTEGER PRIMARY KEY,
                merchant_key TEXT NOT NULL UNIQUE,         -- normalized key, uppercase
                merchant_display TEXT NOT NULL,
                default_category_id INTEGER REFERENCES categories(id),
                deduction_type TEXT NOT NULL DEFAULT 'none',
                use_count INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Transactions
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                member_id INTEGER REFERENCES members(id),
                category_id INTEGER REFERENCES categories(id),
                date DATE NOT NULL,
                amount REAL NOT NULL,                      -- absolute value
                transaction_type TEXT NOT NULL,            -- expense, income
                description TEXT NOT NULL,
                notes TEXT,
                import_line_hash TEXT UNIQUE,              -- NULL for manual entries
                import_file_id INTEGER REFERENCES import_files(id),
                raw_row TEXT,                              -- original CSV row as JSON
                deduction_type TEXT NOT NULL DEFAULT 'none',
                deduction_status TEXT NOT NULL DEFAULT 'none',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_import_file ON transactions(import_file_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_deduction ON transactions(deduction_status, deduction_type);

            -- Import manifest (one row per import attempt; also the basis
            -- for whole-file duplicate warnings, so no uniqueness on hash)
            CREATE TABLE IF NOT EXISTS import_files (
                id INTEGER PRIMARY KEY,
                account_id INTEGER NOT NULL REFERENCES accounts(id),
                file_name TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                file_hash TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'processing', -- processing, completed, failed
                rows_total INTEGER NOT NULL DEFAULT 0,
                rows_imported INTEGER NOT NULL DEFAULT 0,
                rows_skipped INTEGER NOT NULL DEFAULT 0,
                preset_used TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_import_files_account_hash ON import_files(account_id, file_hash);
            CREATE INDEX IF NOT EXISTS idx_import_files_created ON import_files(created_at);
            "#,
        )?;

        self.seed_builtin_presets(&conn)?;

        info!("Database schema initialized");
        Ok(())
    }
}
