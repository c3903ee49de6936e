//! Swiss tax deduction report
//!
//! Aggregates confirmed deductions per bucket for one calendar year.
//! The only threshold applied is the health-cost franchise (5% of net
//! income when supplied); bracket arithmetic is out of scope.

use crate::db::Database;
use crate::error::Result;
use crate::models::DeductionType;

/// Share of net income that health costs must exceed before they
/// become deductible (the cantonal franchise)
const HEALTH_FRANCHISE_RATE: f64 = 0.05;

/// One deduction bucket in the yearly report
#[derive(Debug, Clone)]
pub struct DeductionLine {
    pub deduction_type: DeductionType,
    /// Summed absolute amounts of confirmed transactions
    pub amount: f64,
    pub count: i64,
    /// Franchise threshold applied to this bucket, 0 when none
    pub threshold: f64,
    /// `max(0, amount - threshold)`
    pub deductible: f64,
}

/// Confirmed deductions for one year, one line per bucket
#[derive(Debug, Clone)]
pub struct DeductionReport {
    pub year: i32,
    pub net_income: Option<f64>,
    pub lines: Vec<DeductionLine>,
}

impl DeductionReport {
    /// Build the report from the store. `net_income` enables the
    /// health franchise threshold; without it health costs are listed
    /// at full value.
    pub fn build(db: &Database, year: i32, net_income: Option<f64>) -> Result<Self> {
        let totals = db.deduction_totals(year)?;

        let lines = totals
            .into_iter()
            .map(|(deduction_type, amount, count)| {
                let threshold = match (deduction_type, net_income) {
                    (DeductionType::Health, Some(income)) => income * HEALTH_FRANCHISE_RATE,
                    _ => 0.0,
                };
                DeductionLine {
                    deduction_type,
                    amount,
                    count,
                    threshold,
                    deductible: (amount - threshold).max(0.0),
                }
            })
            .collect();

        Ok(Self {
            year,
            net_income,
            lines,
        })
    }

    /// Sum of the deductible column
    pub fn total_deductible(&self) -> f64 {
        self.lines.iter().map(|l| l.deductible).sum()
    }
}
