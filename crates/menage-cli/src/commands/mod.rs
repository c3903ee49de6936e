//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, status) and shared utilities (open_db)
//! - `deductions` - Yearly tax deduction report
//! - `entities` - Account, member and category management commands
//! - `import` - Bank statement import command
//! - `receipt` - Receipt text extraction command
//! - `review` - Post-import merchant review commands
//! - `rules` - Categorization rule management commands

pub mod core;
pub mod deductions;
pub mod entities;
pub mod import;
pub mod receipt;
pub mod review;
pub mod rules;

// Re-export command functions for main.rs
pub use core::*;
pub use deductions::*;
pub use entities::*;
pub use import::*;
pub use receipt::*;
pub use review::*;
pub use rules::*;

/// Truncate a string to a maximum character count, adding "..." if
/// truncated. Counts characters, not bytes, so accented text never
/// splits mid-character.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount the Swiss way: apostrophe thousands separator and
/// two decimals, e.g. "CHF 1'234.50". Negative amounts get a leading
/// minus before the currency.
pub fn format_chf(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as i64;
    let francs = (cents / 100).to_string();
    let rappen = cents % 100;

    let digits: Vec<char> = francs.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('\'');
        }
        grouped.push(*c);
    }

    format!(
        "{}CHF {}.{:02}",
        if negative { "-" } else { "" },
        grouped,
        rappen
    )
}

/// Yes/no prompt on stdin. Accepts English and French affirmatives.
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(
        input.trim().to_lowercase().as_str(),
        "y" | "yes" | "o" | "oui"
    ))
}
