use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::model::Loan;
use super::schedule::{generate_schedule, Schedule};
use crate::time_value::{self, checked_total, MAX_AMOUNT};
use crate::{types::*, LoanPlannerError, LoanPlannerResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioInput {
    pub loans: Vec<Loan>,
    /// Monthly income the obligations are measured against. Zero means
    /// "not set".
    #[serde(default)]
    pub monthly_income: Money,
    /// Evaluation date. Without one, every loan counts as outstanding in full.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    NotStarted,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl HealthBand {
    pub fn from_debt_to_income(ratio: Percent) -> Self {
        if ratio <= dec!(20) {
            HealthBand::Excellent
        } else if ratio <= dec!(30) {
            HealthBand::Good
        } else if ratio <= dec!(40) {
            HealthBand::Fair
        } else {
            HealthBand::Poor
        }
    }
}

/// Per-loan row for dashboards and charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub loan_id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: LoanStatus,
    pub principal: Money,
    pub monthly_payment: Money,
    pub total_amount: Money,
    pub outstanding: Money,
    pub percent_paid: Percent,
    pub months_remaining: u32,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub loan_count: usize,
    pub active_loan_count: usize,
    pub completed_loan_count: usize,
    pub total_principal: Money,
    pub total_repayable: Money,
    pub total_outstanding: Money,
    /// Installments still owed each month.
    pub total_monthly_payment: Money,
    /// `None` when no monthly income is set.
    pub debt_to_income_ratio: Option<Percent>,
    pub health_score: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_band: Option<HealthBand>,
    pub loans: Vec<LoanSnapshot>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `100 − debt-to-income`, clamped to [0, 100].
pub fn health_score(debt_to_income_ratio: Percent) -> Percent {
    (Decimal::ONE_HUNDRED - debt_to_income_ratio)
        .max(Decimal::ZERO)
        .min(Decimal::ONE_HUNDRED)
}

/// Monthly obligation as a percentage of income, or `None` without income.
pub fn debt_to_income(total_monthly_payment: Money, monthly_income: Money) -> LoanPlannerResult<Option<Percent>> {
    if monthly_income.is_zero() {
        return Ok(None);
    }
    let ratio = total_monthly_payment
        .checked_div(monthly_income)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| LoanPlannerError::InvalidInput {
            field: "monthly_income".into(),
            reason: "Debt-to-income ratio exceeds the supported decimal range".into(),
        })?;
    Ok(Some(time_value::round_percent(ratio)))
}

/// Reject a negative or out-of-range monthly income.
pub(crate) fn validate_income(monthly_income: Money) -> LoanPlannerResult<()> {
    if monthly_income < Decimal::ZERO {
        return Err(LoanPlannerError::InvalidInput {
            field: "monthly_income".into(),
            reason: "Monthly income cannot be negative".into(),
        });
    }
    if monthly_income > MAX_AMOUNT {
        return Err(LoanPlannerError::InvalidInput {
            field: "monthly_income".into(),
            reason: format!("Monthly income cannot exceed {MAX_AMOUNT}"),
        });
    }
    Ok(())
}

/// Summarize a loan collection into totals and ratios.
pub fn aggregate(loans: &[Loan], monthly_income: Money, as_of: Option<NaiveDate>) -> LoanPlannerResult<PortfolioSummary> {
    validate_income(monthly_income)?;

    let mut snapshots = Vec::with_capacity(loans.len());
    for loan in loans {
        let schedule = generate_schedule(loan)?;
        snapshots.push(snapshot(loan, &schedule, as_of));
    }

    let owing = |s: &&LoanSnapshot| s.status != LoanStatus::Completed;

    let total_monthly_payment = checked_total(
        "total_monthly_payment",
        snapshots.iter().filter(owing).map(|s| s.monthly_payment),
    )?;
    let debt_to_income_ratio = debt_to_income(total_monthly_payment, monthly_income)?;

    Ok(PortfolioSummary {
        loan_count: snapshots.len(),
        active_loan_count: snapshots.iter().filter(owing).count(),
        completed_loan_count: snapshots
            .iter()
            .filter(|s| s.status == LoanStatus::Completed)
            .count(),
        total_principal: checked_total("total_principal", loans.iter().map(|l| l.principal))?,
        total_repayable: checked_total("total_repayable", snapshots.iter().map(|s| s.total_amount))?,
        total_outstanding: checked_total("total_outstanding", snapshots.iter().map(|s| s.outstanding))?,
        total_monthly_payment,
        debt_to_income_ratio,
        health_score: debt_to_income_ratio.map(health_score),
        health_band: debt_to_income_ratio.map(HealthBand::from_debt_to_income),
        loans: snapshots,
    })
}

/// Portfolio summary wrapped in the standard output envelope.
pub fn summarize_portfolio(input: &PortfolioInput) -> LoanPlannerResult<ComputationOutput<PortfolioSummary>> {
    let start = Instant::now();
    let summary = aggregate(&input.loans, input.monthly_income, input.as_of)?;

    let mut warnings: Vec<String> = Vec::new();
    if summary.debt_to_income_ratio.is_none() {
        warnings.push("No monthly income set: debt-to-income ratio and health score are undefined".into());
    }
    if summary.loan_count == 0 {
        warnings.push("No loans recorded".into());
    }
    if let Some(ratio) = summary.debt_to_income_ratio {
        if ratio > dec!(40) {
            warnings.push(format!("Debt-to-income ratio of {ratio}% exceeds 40%"));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "monthly_income": input.monthly_income.to_string(),
        "as_of": input.as_of,
        "health_score": "100 - debt_to_income_ratio, clamped to [0, 100]",
    });

    Ok(with_metadata(
        "Loan portfolio aggregation",
        &assumptions,
        warnings,
        elapsed,
        summary,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn snapshot(loan: &Loan, schedule: &Schedule, as_of: Option<NaiveDate>) -> LoanSnapshot {
    let (status, outstanding, percent_paid, elapsed) = match as_of {
        Some(date) => {
            let elapsed = schedule.periods_elapsed(date);
            let status = if schedule.is_completed_as_of(date) {
                LoanStatus::Completed
            } else if elapsed == 0 {
                LoanStatus::NotStarted
            } else {
                LoanStatus::Active
            };
            (status, schedule.balance_as_of(date), schedule.percent_paid_as_of(date), elapsed)
        }
        None => (LoanStatus::Active, schedule.total_amount, Decimal::ZERO, 0),
    };

    LoanSnapshot {
        loan_id: loan.id.clone(),
        name: loan.name.clone(),
        status,
        principal: loan.principal,
        monthly_payment: schedule.monthly_payment,
        total_amount: schedule.total_amount,
        outstanding,
        percent_paid,
        months_remaining: schedule.period_count() - elapsed,
        end_date: schedule.end_date,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
