//! Ménage CLI - Swiss household budget tool
//!
//! Usage:
//!   menage init                         Initialize database
//!   menage import statement.csv -a 1    Import a bank statement
//!   menage review 3                     Review uncategorized merchants
//!   menage deductions --year 2024       Yearly tax deduction report

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(menage_core::default_db_path);

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path, cli.no_encrypt),
        Commands::Status => commands::cmd_status(&db_path, cli.no_encrypt),
        Commands::Receipt { file } => commands::cmd_receipt(&file),
        Commands::Account { action } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            match action {
                None | Some(AccountAction::List) => commands::cmd_account_list(&db),
                Some(AccountAction::Add { name, kind }) => {
                    commands::cmd_account_add(&db, &name, &kind)
                }
            }
        }
        Commands::Member { action } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            match action {
                None | Some(MemberAction::List) => commands::cmd_member_list(&db),
                Some(MemberAction::Add { name, kind }) => {
                    commands::cmd_member_add(&db, &name, &kind)
                }
            }
        }
        Commands::Category { action } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            match action {
                None | Some(CategoryAction::List { kind: None }) => {
                    commands::cmd_category_list(&db, None)
                }
                Some(CategoryAction::List { kind }) => {
                    commands::cmd_category_list(&db, kind.as_deref())
                }
                Some(CategoryAction::Add { name, kind, group }) => {
                    commands::cmd_category_add(&db, &name, &kind, group.as_deref())
                }
                Some(CategoryAction::Favorites { kind, limit }) => {
                    commands::cmd_category_favorites(&db, &kind, limit)
                }
            }
        }
        Commands::Rules { action } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            match action {
                None | Some(RulesAction::List) => commands::cmd_rules_list(&db),
                Some(RulesAction::Add {
                    category,
                    keywords,
                    priority,
                }) => commands::cmd_rules_add(&db, category, &keywords, priority),
            }
        }
        Commands::Import {
            file,
            account,
            member,
            dry_run,
            sign_convention,
            yes,
        } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            commands::cmd_import(&db, &file, account, member, &sign_convention, dry_run, yes)
        }
        Commands::Review {
            import_id,
            set,
            category,
        } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            commands::cmd_review(&db, import_id, set.as_deref(), category)
        }
        Commands::Deductions { year, net_income } => {
            let db = commands::open_db(&db_path, cli.no_encrypt)?;
            commands::cmd_deductions(&db, year, net_income)
        }
    }
}
