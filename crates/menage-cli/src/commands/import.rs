//! Bank statement import command

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use menage_core::db::Database;
use menage_core::models::SignConvention;
use menage_core::{build_merchant_groups, ImportOptions, Importer};

use super::confirm;

#[allow(clippy::too_many_arguments)]
pub fn cmd_import(
    db: &Database,
    file: &Path,
    account_id: i64,
    member_id: Option<i64>,
    sign_convention: &str,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let sign_convention: SignConvention =
        sign_convention.parse().map_err(|e: String| anyhow!(e))?;

    let bytes =
        fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let account = db.get_account(account_id)?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let importer = Importer::new(db);
    let analysis = importer.analyze(&bytes, &file_name, account_id)?;

    println!();
    println!("📄 {}", analysis.file_name);
    println!("   ─────────────────────────────");
    println!("   Account: {} ({})", account.name, account.kind);
    println!(
        "   Preset: {}",
        analysis.preset_name.as_deref().unwrap_or("none")
    );
    println!(
        "   Encoding: {}   Delimiter: '{}'   Decimal: '{}'",
        analysis.encoding.as_str(),
        analysis.delimiter,
        analysis.decimal_separator
    );
    println!(
        "   Date format: {}",
        analysis.date_format.as_deref().unwrap_or("(auto)")
    );
    println!("   Rows: {}", analysis.row_count);

    if !analysis.validation.valid {
        println!();
        for error in &analysis.validation.errors {
            println!("   ❌ {}", error);
        }
        bail!("Column mapping is incomplete; cannot import this file");
    }

    if let Some(warning) = analysis.duplicate_warning() {
        println!();
        println!("   ⚠️  {}", warning);
        if !dry_run && !yes && !confirm("Continue anyway?")? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let options = ImportOptions {
        account_id,
        member_id,
        sign_convention,
        apply_merchant_rules: true,
        dry_run,
    };
    let summary = importer.run(&bytes, &analysis, &options)?;

    println!();
    if dry_run {
        println!("🔎 Dry run — nothing was written");
    }
    println!(
        "✅ Imported {} of {} rows ({} skipped)",
        summary.imported, summary.total, summary.skipped
    );
    for error in &summary.errors {
        println!("   ❌ {}", error);
    }

    if let Some(import_id) = summary.import_file_id {
        let groups = build_merchant_groups(db, import_id)?;
        if !groups.is_empty() {
            println!();
            println!(
                "🏷️  {} merchant(s) landed on the fallback category.",
                groups.len()
            );
            println!("   Review them with: menage review {}", import_id);
        }
    }

    Ok(())
}
