//! Integration tests for menage-core
//!
//! These tests exercise the full analyze → import → categorize →
//! review workflow against an in-memory database.

use menage_core::{
    apply_merchant_groups, build_merchant_groups,
    db::Database,
    models::{AccountKind, SignConvention, TransactionKind},
    ImportOptions, Importer,
};

/// A realistic 10-row UBS French export: nine card/debit expenses
/// across several merchant categories plus one salary credit carried
/// in the Description 2 column behind e-banking boilerplate.
fn ubs_csv() -> &'static str {
    "Date de comptabilisation;Description 1;Description 2;Description 3;D\u{e9}bit;Cr\u{e9}dit;No de transaction
01.12.2024;ALDI SUISSE SA;;;150.50;;TRX-001
02.12.2024;ENI STATION;;;80.00;;TRX-002
03.12.2024;Ordre e-banking;Versement salaire Entreprise SA;;;3500.00;TRX-003
05.12.2024;MIGROS LAUSANNE;;;120.30;;TRX-004
06.12.2024;FEDEX SWITZERLAND;;;45.00;;TRX-005
08.12.2024;COOP GENEVE;;;98.50;;TRX-006
10.12.2024;LATICRETE MATERIEL;;;450.00;;TRX-007
12.12.2024;PHARMACIE AMAVITA;;;32.80;;TRX-008
15.12.2024;SBB CFF FFS;;;25.00;;TRX-009
18.12.2024;RESTAURANT LA PINTE;;;85.00;;TRX-010"
}

struct Fixture {
    db: Database,
    account_id: i64,
    divers_id: i64,
    maison_id: i64,
}

fn fixture() -> Fixture {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let account_id = db.add_account("Compte courant", AccountKind::Bank).unwrap();

    for name in [
        "Courses",
        "Transports",
        "Sant\u{e9}",
        "Services",
        "Restaurants",
        "Frais bancaires",
    ] {
        db.add_category(name, TransactionKind::Expense, None, None)
            .unwrap();
    }
    let maison_id = db
        .add_category("Maison", TransactionKind::Expense, None, None)
        .unwrap();
    let divers_id = db
        .add_category("Divers", TransactionKind::Expense, None, None)
        .unwrap();
    db.add_category("Revenus", TransactionKind::Income, None, None)
        .unwrap();

    Fixture {
        db,
        account_id,
        divers_id,
        maison_id,
    }
}

fn options(account_id: i64) -> ImportOptions {
    ImportOptions {
        account_id,
        member_id: None,
        sign_convention: SignConvention::CreditElseDebit,
        apply_merchant_rules: true,
        dry_run: false,
    }
}

// =============================================================================
// Full Import Workflow
// =============================================================================

#[test]
fn test_full_ubs_import_workflow() {
    let f = fixture();
    let importer = Importer::new(&f.db);

    let analysis = importer
        .analyze(ubs_csv().as_bytes(), "ubs_export.csv", f.account_id)
        .unwrap();
    assert_eq!(analysis.preset_name.as_deref(), Some("UBS"));
    assert_eq!(analysis.delimiter, ';');
    assert_eq!(analysis.date_format.as_deref(), Some("%d.%m.%Y"));
    assert_eq!(analysis.row_count, 10);
    assert!(analysis.validation.valid);
    assert!(analysis.duplicate_warning().is_none());

    let summary = importer
        .run(ubs_csv().as_bytes(), &analysis, &options(f.account_id))
        .unwrap();
    assert_eq!(summary.total, 10);
    assert_eq!(summary.imported, 10);
    assert_eq!(summary.skipped, 0);
    assert!(summary.errors.is_empty());

    let transactions = f.db.list_transactions(Some(f.account_id), None).unwrap();
    assert_eq!(transactions.len(), 10);

    // The salary credit books as income at its absolute value,
    // everything else as an expense
    let salary = transactions
        .iter()
        .find(|t| t.description.contains("salaire"))
        .unwrap();
    assert_eq!(salary.kind, TransactionKind::Income);
    assert_eq!(salary.amount, 3500.00);
    assert_eq!(
        transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Expense)
            .count(),
        9
    );

    // Every row keeps its audit trail
    assert!(transactions.iter().all(|t| t.import_line_hash.is_some()));
    assert!(transactions.iter().all(|t| t.raw_row.is_some()));
    assert!(transactions
        .iter()
        .all(|t| t.import_file_id == summary.import_file_id));
}

#[test]
fn test_reimport_skips_every_row() {
    let f = fixture();
    let importer = Importer::new(&f.db);

    let analysis = importer
        .analyze(ubs_csv().as_bytes(), "ubs_export.csv", f.account_id)
        .unwrap();
    let first = importer
        .run(ubs_csv().as_bytes(), &analysis, &options(f.account_id))
        .unwrap();
    assert_eq!((first.imported, first.skipped), (10, 0));

    // Second pass: the file-level warning fires and every line hash
    // already exists
    let analysis = importer
        .analyze(ubs_csv().as_bytes(), "ubs_export.csv", f.account_id)
        .unwrap();
    let warning = analysis.duplicate_warning().unwrap();
    assert!(warning.contains("already imported"));
    assert!(warning.contains("10 rows"));

    let second = importer
        .run(ubs_csv().as_bytes(), &analysis, &options(f.account_id))
        .unwrap();
    assert_eq!(second.total, 10);
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 10);
    assert!(second.errors.is_empty());

    assert_eq!(f.db.count_transactions().unwrap(), 10);
}

// =============================================================================
// Categorization
// =============================================================================

#[test]
fn test_builtin_categorization_spread() {
    let f = fixture();
    let importer = Importer::new(&f.db);

    let analysis = importer
        .analyze(ubs_csv().as_bytes(), "ubs_export.csv", f.account_id)
        .unwrap();
    importer
        .run(ubs_csv().as_bytes(), &analysis, &options(f.account_id))
        .unwrap();

    let categories = f.db.list_categories(None).unwrap();
    let id_of = |name: &str| categories.iter().find(|c| c.name == name).unwrap().id;
    let transactions = f.db.list_transactions(Some(f.account_id), None).unwrap();
    let category_of = |needle: &str| {
        transactions
            .iter()
            .find(|t| t.description.contains(needle))
            .unwrap()
            .category_id
            .unwrap()
    };

    assert_eq!(category_of("ALDI"), id_of("Courses"));
    assert_eq!(category_of("MIGROS"), id_of("Courses"));
    assert_eq!(category_of("COOP"), id_of("Courses"));
    assert_eq!(category_of("ENI"), id_of("Transports"));
    assert_eq!(category_of("SBB"), id_of("Transports"));
    assert_eq!(category_of("AMAVITA"), id_of("Sant\u{e9}"));
    assert_eq!(category_of("FEDEX"), id_of("Services"));
    assert_eq!(category_of("RESTAURANT"), id_of("Restaurants"));
    assert_eq!(category_of("salaire"), id_of("Revenus"));

    // The unknown merchant lands on the fallback category
    assert_eq!(category_of("LATICRETE"), f.divers_id);
}

#[test]
fn test_merchant_group_review_teaches_a_rule() {
    let f = fixture();
    let importer = Importer::new(&f.db);

    let analysis = importer
        .analyze(ubs_csv().as_bytes(), "ubs_export.csv", f.account_id)
        .unwrap();
    let summary = importer
        .run(ubs_csv().as_bytes(), &analysis, &options(f.account_id))
        .unwrap();
    let import_file_id = summary.import_file_id.unwrap();

    // Only LATICRETE fell through to the fallback category
    let mut groups = build_merchant_groups(&f.db, import_file_id).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].merchant_key, "LATICRETE MATERIEL");
    assert_eq!(groups[0].count, 1);

    groups[0].selected_category_id = Some(f.maison_id);
    let updated = apply_merchant_groups(&f.db, &groups).unwrap();
    assert_eq!(updated, 1);

    let transactions = f.db.list_transactions(Some(f.account_id), None).unwrap();
    let laticrete = transactions
        .iter()
        .find(|t| t.description.contains("LATICRETE"))
        .unwrap();
    assert_eq!(laticrete.category_id, Some(f.maison_id));

    // The learned rule categorizes the merchant on the next import
    let next_csv = "Date de comptabilisation;Description 1;Description 2;Description 3;D\u{e9}bit;Cr\u{e9}dit;No de transaction
05.01.2025;LATICRETE MATERIEL;;;120.00;;TRX-011";
    let analysis = importer
        .analyze(next_csv.as_bytes(), "ubs_jan.csv", f.account_id)
        .unwrap();
    importer
        .run(next_csv.as_bytes(), &analysis, &options(f.account_id))
        .unwrap();

    let transactions = f.db.list_transactions(Some(f.account_id), None).unwrap();
    let newest = transactions
        .iter()
        .find(|t| t.date.to_string() == "2025-01-05")
        .unwrap();
    assert_eq!(newest.category_id, Some(f.maison_id));

    let rule = f
        .db
        .find_merchant_rule("LATICRETE MATERIEL")
        .unwrap()
        .unwrap();
    assert_eq!(rule.category_id, Some(f.maison_id));
    assert!(rule.use_count >= 1);
}

// =============================================================================
// Dialect Handling
// =============================================================================

#[test]
fn test_sign_conventions_differ_on_dual_columns() {
    // A correction row with both columns populated: net +20 under
    // credit-minus-debit, +50 under credit-else-debit
    let csv = "Date;Libell\u{e9};D\u{e9}bit;Cr\u{e9}dit
02.01.2024;Correction;30.00;50.00";

    for (convention, expected_amount) in [
        (SignConvention::CreditMinusDebit, 20.0),
        (SignConvention::CreditElseDebit, 50.0),
    ] {
        let f = fixture();
        let importer = Importer::new(&f.db);
        let analysis = importer
            .analyze(csv.as_bytes(), "corrections.csv", f.account_id)
            .unwrap();

        let mut opts = options(f.account_id);
        opts.sign_convention = convention;
        let summary = importer.run(csv.as_bytes(), &analysis, &opts).unwrap();
        assert_eq!(summary.imported, 1);

        let transactions = f.db.list_transactions(Some(f.account_id), None).unwrap();
        assert_eq!(transactions[0].amount, expected_amount);
        assert_eq!(transactions[0].kind, TransactionKind::Income);
    }
}

#[test]
fn test_windows_1252_statement_survives_decoding() {
    // "Dépense café" with Latin-1 bytes for é
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"Date;Libell\xe9;Montant\n");
    bytes.extend_from_slice(b"02.01.2024;D\xe9pense caf\xe9;-12.50\n");

    let f = fixture();
    let importer = Importer::new(&f.db);
    let analysis = importer.analyze(&bytes, "latin1.csv", f.account_id).unwrap();
    assert_eq!(analysis.headers[1], "Libell\u{e9}");

    let summary = importer
        .run(&bytes, &analysis, &options(f.account_id))
        .unwrap();
    assert_eq!(summary.imported, 1);

    let transactions = f.db.list_transactions(Some(f.account_id), None).unwrap();
    assert_eq!(transactions[0].description, "D\u{e9}pense caf\u{e9}");
    assert_eq!(transactions[0].amount, 12.50);
    assert_eq!(transactions[0].kind, TransactionKind::Expense);
}

#[test]
fn test_import_into_separate_accounts_books_both() {
    let f = fixture();
    let other_account = f.db.add_account("Carte", AccountKind::Card).unwrap();
    let importer = Importer::new(&f.db);

    for account_id in [f.account_id, other_account] {
        let analysis = importer
            .analyze(ubs_csv().as_bytes(), "ubs_export.csv", account_id)
            .unwrap();
        let summary = importer
            .run(ubs_csv().as_bytes(), &analysis, &options(account_id))
            .unwrap();
        // Line hashes include the account id, so the second account
        // does not collide with the first
        assert_eq!(summary.imported, 10);
    }

    assert_eq!(f.db.count_transactions().unwrap(), 20);
}
