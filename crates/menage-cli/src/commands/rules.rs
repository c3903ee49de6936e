//! Categorization rule management commands

use std::collections::HashMap;

use anyhow::{bail, Result};
use menage_core::db::Database;

use super::truncate;

pub fn cmd_rules_list(db: &Database) -> Result<()> {
    let categories: HashMap<i64, String> = db
        .list_categories(None)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let unknown = "?".to_string();

    let keyword_rules = db.list_keyword_rules()?;
    println!();
    println!("📋 Keyword rules (checked lowest priority first)");
    println!("   ─────────────────────────────");
    if keyword_rules.is_empty() {
        println!("   (none — built-in Swiss keywords still apply)");
    }
    for rule in keyword_rules {
        let category = categories.get(&rule.category_id).unwrap_or(&unknown);
        println!(
            "   [{}] p{} {} → {}",
            rule.id,
            rule.priority,
            truncate(&rule.keywords.join(", "), 50),
            category
        );
    }

    let merchant_rules = db.list_merchant_rules()?;
    println!();
    println!("🏪 Learned merchant rules");
    println!("   ─────────────────────────────");
    if merchant_rules.is_empty() {
        println!("   (none — they appear after 'menage review')");
    }
    for rule in merchant_rules {
        let category = rule
            .category_id
            .and_then(|id| categories.get(&id))
            .unwrap_or(&unknown);
        println!(
            "   {} → {} (used {}×)",
            truncate(&rule.merchant_display, 40),
            category,
            rule.use_count
        );
    }
    println!();
    Ok(())
}

pub fn cmd_rules_add(db: &Database, category_id: i64, keywords: &str, priority: i64) -> Result<()> {
    let keywords: Vec<String> = keywords
        .split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        bail!("No keywords given (use a comma-separated list)");
    }

    let categories = db.list_categories(None)?;
    let Some(category) = categories.iter().find(|c| c.id == category_id) else {
        bail!("Category {} not found", category_id);
    };

    let id = db.add_keyword_rule(category_id, &keywords, priority)?;
    println!(
        "✅ Rule added (id {}): [{}] → {}",
        id,
        keywords.join(", "),
        category.name
    );
    Ok(())
}
