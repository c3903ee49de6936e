//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use menage_core::db::Database;

use crate::commands::{self, format_chf, truncate};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

// ========== Argument Parsing ==========

#[test]
fn test_cli_args_are_consistent() {
    use clap::CommandFactory;
    crate::cli::Cli::command().debug_assert();
}

// ========== Formatting Helpers ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly ten", 11), "exactly ten");
    assert_eq!(truncate("a longer string here", 10), "a longe...");
}

#[test]
fn test_truncate_cuts_on_character_boundaries() {
    // The cut lands on the accented character, not inside its bytes
    assert_eq!(truncate("Dépense café au marché", 10), "Dépense...");
    assert_eq!(truncate("Dépense", 7), "Dépense");
}

#[test]
fn test_format_chf_groups_thousands_with_apostrophes() {
    assert_eq!(format_chf(0.0), "CHF 0.00");
    assert_eq!(format_chf(98.5), "CHF 98.50");
    assert_eq!(format_chf(1234.5), "CHF 1'234.50");
    assert_eq!(format_chf(1_000_000.0), "CHF 1'000'000.00");
}

#[test]
fn test_format_chf_negative() {
    assert_eq!(format_chf(-12.5), "-CHF 12.50");
    assert_eq!(format_chf(-4500.0), "-CHF 4'500.00");
}

// ========== Entity Commands ==========

#[test]
fn test_cmd_account_add_and_list() {
    let db = setup_test_db();
    commands::cmd_account_add(&db, "Compte courant", "bank").unwrap();
    commands::cmd_account_add(&db, "Carte", "card").unwrap();

    let accounts = db.list_accounts().unwrap();
    assert_eq!(accounts.len(), 2);
    assert!(commands::cmd_account_list(&db).is_ok());
}

#[test]
fn test_cmd_account_add_rejects_unknown_kind() {
    let db = setup_test_db();
    let result = commands::cmd_account_add(&db, "Broken", "crypto");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Unknown account kind"));
}

#[test]
fn test_cmd_member_add() {
    let db = setup_test_db();
    commands::cmd_member_add(&db, "Claire", "adult").unwrap();
    commands::cmd_member_add(&db, "Léo", "child").unwrap();
    assert_eq!(db.list_members().unwrap().len(), 2);
}

#[test]
fn test_cmd_category_add_with_group() {
    let db = setup_test_db();
    commands::cmd_category_add(&db, "Courses", "expense", Some("Quotidien")).unwrap();
    commands::cmd_category_add(&db, "Salaire", "income", None).unwrap();

    let categories = db.list_categories(None).unwrap();
    assert_eq!(categories.len(), 2);
    let courses = categories.iter().find(|c| c.name == "Courses").unwrap();
    assert_eq!(courses.group_name.as_deref(), Some("Quotidien"));

    assert!(commands::cmd_category_list(&db, None).is_ok());
    assert!(commands::cmd_category_list(&db, Some("income")).is_ok());
    assert!(commands::cmd_category_list(&db, Some("bogus")).is_err());
}

#[test]
fn test_cmd_category_favorites_empty() {
    let db = setup_test_db();
    assert!(commands::cmd_category_favorites(&db, "expense", 5).is_ok());
}

// ========== Init Seeding ==========

#[test]
fn test_seed_default_categories_is_idempotent() {
    let db = setup_test_db();
    let seeded = commands::seed_default_categories(&db).unwrap();
    assert!(seeded > 0);

    // Second call must not duplicate anything
    assert_eq!(commands::seed_default_categories(&db).unwrap(), 0);
    assert_eq!(db.list_categories(None).unwrap().len(), seeded);
}

// ========== Rules Commands ==========

#[test]
fn test_cmd_rules_add_and_list() {
    let db = setup_test_db();
    let category_id = db
        .add_category(
            "Courses",
            menage_core::models::TransactionKind::Expense,
            None,
            None,
        )
        .unwrap();

    commands::cmd_rules_add(&db, category_id, "denner, Lidl ,ALDI", 5).unwrap();

    let rules = db.list_keyword_rules().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].keywords, vec!["denner", "lidl", "aldi"]);
    assert_eq!(rules[0].priority, 5);

    assert!(commands::cmd_rules_list(&db).is_ok());
}

#[test]
fn test_cmd_rules_add_rejects_empty_keywords() {
    let db = setup_test_db();
    let result = commands::cmd_rules_add(&db, 1, " , ,", 5);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("No keywords"));
}

#[test]
fn test_cmd_rules_add_rejects_missing_category() {
    let db = setup_test_db();
    let result = commands::cmd_rules_add(&db, 42, "migros", 5);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not found"));
}

// ========== Review Command ==========

#[test]
fn test_cmd_review_missing_import() {
    let db = setup_test_db();
    let result = commands::cmd_review(&db, 99, None, None);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not found"));
}

// ========== Deductions Command ==========

#[test]
fn test_cmd_deductions_empty_year() {
    let db = setup_test_db();
    assert!(commands::cmd_deductions(&db, Some(2024), Some(80_000.0)).is_ok());
}
