//! Account, member and category management commands

use anyhow::{anyhow, Result};
use menage_core::db::Database;
use menage_core::models::{AccountKind, MemberKind, TransactionKind};

pub fn cmd_account_add(db: &Database, name: &str, kind: &str) -> Result<()> {
    let kind: AccountKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let id = db.add_account(name, kind)?;
    println!("✅ Account '{}' added (id {})", name, id);
    Ok(())
}

pub fn cmd_account_list(db: &Database) -> Result<()> {
    let accounts = db.list_accounts()?;

    if accounts.is_empty() {
        println!("No accounts yet. Add one with:");
        println!("  menage account add \"Compte courant\" --kind bank");
        return Ok(());
    }

    println!();
    println!("📁 Accounts");
    println!("   ─────────────────────────────");
    for account in accounts {
        println!("   [{}] {} ({})", account.id, account.name, account.kind);
    }
    println!();
    Ok(())
}

pub fn cmd_member_add(db: &Database, name: &str, kind: &str) -> Result<()> {
    let kind: MemberKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let id = db.add_member(name, kind)?;
    println!("✅ Member '{}' added (id {})", name, id);
    Ok(())
}

pub fn cmd_member_list(db: &Database) -> Result<()> {
    let members = db.list_members()?;

    if members.is_empty() {
        println!("No members yet. Add one with:");
        println!("  menage member add \"Claire\" --kind adult");
        return Ok(());
    }

    println!();
    println!("👥 Members");
    println!("   ─────────────────────────────");
    for member in members {
        println!("   [{}] {} ({})", member.id, member.name, member.kind);
    }
    println!();
    Ok(())
}

pub fn cmd_category_add(
    db: &Database,
    name: &str,
    kind: &str,
    group: Option<&str>,
) -> Result<()> {
    let kind: TransactionKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let id = db.add_category(name, kind, group, None)?;
    println!("✅ Category '{}' added (id {})", name, id);
    Ok(())
}

pub fn cmd_category_list(db: &Database, kind: Option<&str>) -> Result<()> {
    let kinds: Vec<TransactionKind> = match kind {
        Some(kind) => vec![kind.parse().map_err(|e: String| anyhow!(e))?],
        None => vec![TransactionKind::Expense, TransactionKind::Income],
    };

    println!();
    for kind in kinds {
        let heading = match kind {
            TransactionKind::Expense => "💸 Dépenses",
            TransactionKind::Income => "💰 Revenus",
        };
        println!("{}", heading);
        println!("   ─────────────────────────────");

        let groups = db.list_categories_grouped(kind)?;
        if groups.is_empty() {
            println!("   (none)");
        }
        for (group, categories) in groups {
            println!("   {}", group);
            for category in categories {
                println!("      [{}] {}", category.id, category.name);
            }
        }
        println!();
    }
    Ok(())
}

pub fn cmd_category_favorites(db: &Database, kind: &str, limit: usize) -> Result<()> {
    let kind: TransactionKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let favorites = db.favorite_categories(kind, limit)?;

    if favorites.is_empty() {
        println!("No category usage in the last 90 days.");
        return Ok(());
    }

    println!();
    println!("⭐ Favorite categories (last 90 days)");
    println!("   ─────────────────────────────");
    for (category, uses) in favorites {
        println!("   [{}] {} ({}×)", category.id, category.name, uses);
    }
    println!();
    Ok(())
}
