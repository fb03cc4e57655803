use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::model::{Expense, ExpenseCategory};
use crate::time_value;
use crate::{types::*, LoanPlannerError, LoanPlannerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownInput {
    pub expenses: Vec<Expense>,
    /// Restrict to one calendar month; both or neither must be given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownOutput {
    pub total: Money,
    pub expense_count: usize,
    pub categories: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub amount: Money,
    /// Share of all spending, 0–100.
    pub share_pct: Percent,
    pub count: usize,
}

pub fn total_expenses(expenses: &[Expense]) -> LoanPlannerResult<Money> {
    time_value::checked_total("total_expenses", expenses.iter().map(|e| e.amount))
}

/// Spending per category, largest first. Categories with no expenses are
/// omitted; ties keep category order.
pub fn category_breakdown(expenses: &[Expense]) -> LoanPlannerResult<Vec<CategoryTotal>> {
    let total = total_expenses(expenses)?;

    let mut by_category: BTreeMap<ExpenseCategory, (Money, usize)> = BTreeMap::new();
    for expense in expenses {
        let entry = by_category.entry(expense.category).or_insert((Decimal::ZERO, 0));
        entry.0 = entry.0.checked_add(expense.amount).ok_or_else(|| LoanPlannerError::InvalidInput {
            field: "amount".into(),
            reason: format!("{} total exceeds the supported decimal range", expense.category),
        })?;
        entry.1 += 1;
    }

    let mut totals: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (amount, count))| CategoryTotal {
            category,
            amount,
            share_pct: time_value::percent_of(amount, total),
            count,
        })
        .collect();
    totals.sort_by(|a, b| b.amount.cmp(&a.amount));
    Ok(totals)
}

/// Expenses dated within the given calendar month.
pub fn expenses_in_month(expenses: &[Expense], year: i32, month: u32) -> Vec<Expense> {
    expenses
        .iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
        .cloned()
        .collect()
}

/// Category breakdown wrapped in the standard output envelope.
pub fn build_breakdown(input: &BreakdownInput) -> LoanPlannerResult<ComputationOutput<BreakdownOutput>> {
    let start = Instant::now();

    let selected = match (input.year, input.month) {
        (Some(year), Some(month)) => {
            if !(1..=12).contains(&month) {
                return Err(LoanPlannerError::InvalidInput {
                    field: "month".into(),
                    reason: format!("{month} is not a calendar month"),
                });
            }
            expenses_in_month(&input.expenses, year, month)
        }
        (None, None) => input.expenses.clone(),
        _ => {
            return Err(LoanPlannerError::InvalidInput {
                field: "month".into(),
                reason: "Year and month must be given together".into(),
            })
        }
    };
    for expense in &selected {
        expense.validate()?;
    }

    let output = BreakdownOutput {
        total: total_expenses(&selected)?,
        expense_count: selected.len(),
        categories: category_breakdown(&selected)?,
    };

    let mut warnings = Vec::new();
    if selected.is_empty() {
        warnings.push("No expenses in the selected period".to_string());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "year": input.year,
        "month": input.month,
    });

    Ok(with_metadata(
        "Expense breakdown by category",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn expense(amount: Money, category: ExpenseCategory, day: u32, month: u32) -> Expense {
        let date = NaiveDate::from_ymd_opt(2025, month, day).unwrap();
        Expense::new("item", amount, category, date)
    }

    #[test]
    fn test_breakdown_sorted_by_amount() {
        let expenses = vec![
            expense(dec!(100), ExpenseCategory::Food, 1, 1),
            expense(dec!(600), ExpenseCategory::Housing, 2, 1),
            expense(dec!(300), ExpenseCategory::Food, 3, 1),
        ];
        let totals = category_breakdown(&expenses).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, ExpenseCategory::Housing);
        assert_eq!(totals[0].share_pct, dec!(60));
        assert_eq!(totals[1].amount, dec!(400));
        assert_eq!(totals[1].count, 2);
    }

    #[test]
    fn test_breakdown_of_zero_spending() {
        let totals = category_breakdown(&[expense(Decimal::ZERO, ExpenseCategory::Other, 1, 1)]).unwrap();
        assert_eq!(totals[0].share_pct, Decimal::ZERO);
        assert!(category_breakdown(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_overflowing_totals_are_errors() {
        let expenses = vec![
            expense(Decimal::MAX, ExpenseCategory::Food, 1, 1),
            expense(Decimal::MAX, ExpenseCategory::Food, 2, 1),
        ];
        assert!(total_expenses(&expenses).is_err());
        assert!(category_breakdown(&expenses).is_err());

        let input = BreakdownInput {
            expenses,
            year: None,
            month: None,
        };
        match build_breakdown(&input).unwrap_err() {
            LoanPlannerError::InvalidInput { field, .. } => assert_eq!(field, "amount"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_month_filter() {
        let expenses = vec![
            expense(dec!(10), ExpenseCategory::Food, 31, 1),
            expense(dec!(20), ExpenseCategory::Food, 1, 2),
        ];
        let jan = expenses_in_month(&expenses, 2025, 1);
        assert_eq!(jan.len(), 1);
        assert_eq!(jan[0].amount, dec!(10));
    }

    #[test]
    fn test_build_breakdown_for_month() {
        let input = BreakdownInput {
            expenses: vec![
                expense(dec!(10), ExpenseCategory::Food, 31, 1),
                expense(dec!(20), ExpenseCategory::Utilities, 1, 2),
            ],
            year: Some(2025),
            month: Some(2),
        };
        let out = build_breakdown(&input).unwrap();
        assert_eq!(out.result.total, dec!(20));
        assert_eq!(out.result.categories[0].category, ExpenseCategory::Utilities);
    }

    #[test]
    fn test_build_breakdown_rejects_partial_period() {
        let input = BreakdownInput {
            expenses: vec![],
            year: Some(2025),
            month: None,
        };
        assert!(build_breakdown(&input).is_err());
    }
}
