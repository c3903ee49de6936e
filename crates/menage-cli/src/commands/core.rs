//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database and seed default categories
//! - `cmd_status` - Show database status and this month's totals

use std::path::Path;

use anyhow::{Context, Result};
use menage_core::db::{Database, DB_KEY_ENV};
use menage_core::models::TransactionKind;

use super::format_chf;

/// Default Swiss household categories seeded on first init,
/// (name, kind, picker group)
const DEFAULT_CATEGORIES: &[(&str, TransactionKind, &str)] = &[
    ("Courses", TransactionKind::Expense, "Quotidien"),
    ("Restaurants", TransactionKind::Expense, "Quotidien"),
    ("Transports", TransactionKind::Expense, "Quotidien"),
    ("Santé", TransactionKind::Expense, "Famille"),
    ("Garde d'enfants", TransactionKind::Expense, "Famille"),
    ("Logement", TransactionKind::Expense, "Charges"),
    ("Assurances", TransactionKind::Expense, "Charges"),
    ("Téléphone & Internet", TransactionKind::Expense, "Charges"),
    ("Frais bancaires", TransactionKind::Expense, "Charges"),
    ("Loisirs", TransactionKind::Expense, "Loisirs"),
    ("Vacances", TransactionKind::Expense, "Loisirs"),
    ("Maison", TransactionKind::Expense, "Autres"),
    ("Services", TransactionKind::Expense, "Autres"),
    ("Divers", TransactionKind::Expense, "Autres"),
    ("Salaire", TransactionKind::Income, "Revenus"),
    ("Allocations", TransactionKind::Income, "Revenus"),
    ("Autres revenus", TransactionKind::Income, "Revenus"),
];

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path.to_string_lossy();
    if no_encrypt {
        Database::new_unencrypted(&path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(&path_str).context("Failed to open database")
    }
}

/// Seed the default category set. No-op when categories already exist.
pub fn seed_default_categories(db: &Database) -> Result<usize> {
    if !db.list_categories(None)?.is_empty() {
        return Ok(0);
    }

    for (name, kind, group) in DEFAULT_CATEGORIES {
        db.add_category(name, *kind, Some(group), None)?;
    }
    Ok(DEFAULT_CATEGORIES.len())
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let db = open_db(db_path, no_encrypt)?;

    let seeded = seed_default_categories(&db).context("Failed to seed default categories")?;
    if seeded > 0 {
        println!("   Seeded {} default categories", seeded);
    }
    println!("   Bank presets: {}", db.list_presets()?.len());

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add an account: menage account add \"Compte courant\"");
    println!("  2. Import a statement: menage import statement.csv --account 1");

    Ok(())
}

pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    use std::fs;

    println!();
    println!("📊 Ménage Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    if db_path.exists() {
        match open_db(db_path, no_encrypt) {
            Ok(db) => {
                println!();
                println!("   Accounts: {}", db.list_accounts()?.len());
                println!("   Members: {}", db.list_members()?.len());
                println!("   Categories: {}", db.list_categories(None)?.len());
                println!("   Transactions: {}", db.count_transactions()?);

                let totals = db.month_totals()?;
                if !totals.is_empty() {
                    println!();
                    println!("   This month:");
                    for (kind, count, sum) in totals {
                        let label = match kind {
                            TransactionKind::Expense => "Expenses",
                            TransactionKind::Income => "Income",
                        };
                        println!("   {} {} ({} transactions)", label, format_chf(sum), count);
                    }
                }
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
                if !no_encrypt && !has_key {
                    println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
                } else if has_key {
                    println!("      (Check if {} is correct)", DB_KEY_ENV);
                }
            }
        }
    }

    println!();
    Ok(())
}
