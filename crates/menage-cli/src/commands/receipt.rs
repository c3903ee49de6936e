//! Receipt text extraction command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use menage_core::{extract_receipt_info, suggest_deduction_type};

use super::format_chf;

pub fn cmd_receipt(file: &Path) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let info = extract_receipt_info(&text);

    println!();
    println!("🧾 Receipt");
    println!("   ─────────────────────────────");
    println!(
        "   Merchant: {}",
        info.merchant_raw.as_deref().unwrap_or("(not found)")
    );
    if let Some(key) = &info.merchant_key {
        println!("   Key: {}", key);
    }
    match info.amount {
        Some(amount) => println!("   Amount: {}", format_chf(amount)),
        None => println!("   Amount: (not found)"),
    }
    match info.date {
        Some(date) => println!("   Date: {}", date.format("%d.%m.%Y")),
        None => println!("   Date: (not found)"),
    }
    println!("   Confidence: {}%", info.confidence);

    if let Some(deduction) = suggest_deduction_type(info.merchant_key.as_deref()) {
        println!("   💡 Possible deduction: {}", deduction.label());
    }
    println!();

    Ok(())
}
