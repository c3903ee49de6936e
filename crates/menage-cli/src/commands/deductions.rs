//! Yearly tax deduction report command

use anyhow::Result;
use chrono::{Datelike, Utc};
use menage_core::db::Database;
use menage_core::models::DeductionType;
use menage_core::DeductionReport;

use super::format_chf;

pub fn cmd_deductions(db: &Database, year: Option<i32>, net_income: Option<f64>) -> Result<()> {
    let year = year.unwrap_or_else(|| Utc::now().year());
    let report = DeductionReport::build(db, year, net_income)?;

    println!();
    println!("🧾 Déductions {}", year);
    println!("   ─────────────────────────────────────────────");

    if report.lines.is_empty() {
        println!("   No confirmed deductions for {}.", year);
        println!();
        return Ok(());
    }

    for line in &report.lines {
        println!(
            "   {} — {} ({} transactions)",
            line.deduction_type.label(),
            format_chf(line.amount),
            line.count
        );
        if line.threshold > 0.0 {
            println!(
                "      Franchise {} → deductible {}",
                format_chf(line.threshold),
                format_chf(line.deductible)
            );
        }
    }

    println!();
    println!("   Total deductible: {}", format_chf(report.total_deductible()));
    if net_income.is_none()
        && report
            .lines
            .iter()
            .any(|l| l.deduction_type == DeductionType::Health)
    {
        println!("   (Pass --net-income to apply the health-cost franchise)");
    }
    println!();

    Ok(())
}
