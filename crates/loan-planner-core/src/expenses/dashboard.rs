use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::breakdown::{category_breakdown, total_expenses, CategoryTotal};
use super::model::Expense;
use crate::loans::model::Loan;
use crate::loans::portfolio::validate_income;
use crate::loans::schedule::generate_schedule;
use crate::time_value::checked_total;
use crate::{types::*, LoanPlannerError, LoanPlannerResult};

const RECENT_ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardInput {
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub monthly_income: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Expense,
    Loan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub id: RecordId,
    pub label: String,
    pub amount: Money,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_expenses: Money,
    /// Sum of loan principals.
    pub total_loans: Money,
    pub monthly_loan_obligation: Money,
    /// Income less expenses.
    pub net_balance: Money,
    /// Income less expenses and loan installments, floored at zero.
    pub savings_potential: Money,
    pub by_category: Vec<CategoryTotal>,
    pub recent_activity: Vec<ActivityItem>,
}

pub fn dashboard_summary(input: &DashboardInput) -> LoanPlannerResult<DashboardSummary> {
    validate_income(input.monthly_income)?;
    for expense in &input.expenses {
        expense.validate()?;
    }

    let mut installments = Vec::with_capacity(input.loans.len());
    for loan in &input.loans {
        installments.push(generate_schedule(loan)?.monthly_payment);
    }
    let monthly_loan_obligation = checked_total("monthly_loan_obligation", installments)?;

    let total_expenses = total_expenses(&input.expenses)?;
    let out_of_range = |field: &str| LoanPlannerError::InvalidInput {
        field: field.into(),
        reason: "Balance exceeds the supported decimal range".into(),
    };
    let net_balance = input
        .monthly_income
        .checked_sub(total_expenses)
        .ok_or_else(|| out_of_range("net_balance"))?;
    let savings_potential = net_balance
        .checked_sub(monthly_loan_obligation)
        .ok_or_else(|| out_of_range("savings_potential"))?
        .max(Decimal::ZERO);

    Ok(DashboardSummary {
        total_expenses,
        total_loans: checked_total("total_loans", input.loans.iter().map(|l| l.principal))?,
        monthly_loan_obligation,
        net_balance,
        savings_potential,
        by_category: category_breakdown(&input.expenses)?,
        recent_activity: recent_activity(&input.expenses, &input.loans, RECENT_ACTIVITY_LIMIT),
    })
}

/// Dashboard wrapped in the standard output envelope.
pub fn build_dashboard(input: &DashboardInput) -> LoanPlannerResult<ComputationOutput<DashboardSummary>> {
    let start = Instant::now();
    let summary = dashboard_summary(input)?;

    let mut warnings = Vec::new();
    if input.monthly_income.is_zero() {
        warnings.push("No monthly income set: balances are shown against zero income".to_string());
    }
    if summary.net_balance < Decimal::ZERO {
        warnings.push(format!("Spending exceeds income by {}", -summary.net_balance));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "monthly_income": input.monthly_income.to_string(),
        "expense_count": input.expenses.len(),
        "loan_count": input.loans.len(),
    });

    Ok(with_metadata("Spending dashboard", &assumptions, warnings, elapsed, summary))
}

/// Most recent expenses and loans, newest first. Loans are dated by start.
pub fn recent_activity(expenses: &[Expense], loans: &[Loan], limit: usize) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = expenses
        .iter()
        .map(|e| ActivityItem {
            kind: ActivityKind::Expense,
            id: e.id.clone(),
            label: e.description.clone(),
            amount: e.amount,
            date: e.date,
        })
        .chain(loans.iter().map(|l| ActivityItem {
            kind: ActivityKind::Loan,
            id: l.id.clone(),
            label: l.label().to_string(),
            amount: l.principal,
            date: l.start_date,
        }))
        .collect();

    items.sort_by(|a, b| b.date.cmp(&a.date));
    items.truncate(limit);
    items
}
