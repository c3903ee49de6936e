//! Post-import merchant review commands

use anyhow::{bail, Result};
use menage_core::db::Database;
use menage_core::{apply_merchant_groups, build_merchant_groups};

use super::truncate;

pub fn cmd_review(
    db: &Database,
    import_id: i64,
    set: Option<&str>,
    category: Option<i64>,
) -> Result<()> {
    let import_file = db.get_import_file(import_id)?;
    let mut groups = build_merchant_groups(db, import_id)?;

    if groups.is_empty() {
        println!(
            "✅ Nothing left to review for {} (import {}).",
            import_file.file_name, import_id
        );
        return Ok(());
    }

    match (set, category) {
        (Some(merchant_key), Some(category_id)) => {
            let categories = db.list_categories(None)?;
            let Some(category) = categories.iter().find(|c| c.id == category_id) else {
                bail!("Category {} not found", category_id);
            };
            let Some(group) = groups.iter_mut().find(|g| g.merchant_key == merchant_key)
            else {
                bail!("No merchant '{}' in import {}", merchant_key, import_id);
            };

            group.selected_category_id = Some(category_id);
            let updated = apply_merchant_groups(db, &groups)?;
            println!(
                "✅ Moved {} transaction(s) to '{}' and learned the rule for '{}'.",
                updated, category.name, merchant_key
            );
        }
        (None, None) => {
            println!();
            println!("🏷️  Uncategorized merchants in {}", import_file.file_name);
            println!("   ─────────────────────────────");
            for group in &groups {
                println!("   {} ({}×)", group.merchant_key, group.count);
                for name in group.original_names.iter().take(3) {
                    println!("      {}", truncate(name, 60));
                }
            }
            println!();
            println!(
                "Assign one with: menage review {} --set \"MERCHANT\" --category <id>",
                import_id
            );
            println!("See category IDs with: menage category list");
        }
        _ => bail!("--set and --category must be used together"),
    }

    Ok(())
}
