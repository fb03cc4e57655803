use chrono::NaiveDate;
use loan_planner_core::expenses::breakdown::{build_breakdown, BreakdownInput};
use loan_planner_core::expenses::dashboard::{build_dashboard, ActivityKind, DashboardInput};
use loan_planner_core::expenses::{Expense, ExpenseCategory};
use loan_planner_core::loans::Loan;
use loan_planner_core::LoanPlannerError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

fn ledger() -> Vec<Expense> {
    vec![
        Expense::new("Rent", dec!(1200), ExpenseCategory::Housing, date(3, 1)),
        Expense::new("Groceries", dec!(250.40), ExpenseCategory::Food, date(3, 4)),
        Expense::new("Fuel", dec!(80), ExpenseCategory::Transportation, date(3, 9)),
        Expense::new("Dinner out", dec!(49.60), ExpenseCategory::Food, date(3, 12)),
        Expense::new("Electricity", dec!(120), ExpenseCategory::Utilities, date(4, 2)),
    ]
}

// ===========================================================================
// Category breakdown
// ===========================================================================

#[test]
fn test_breakdown_shares_sum_to_total() {
    let input = BreakdownInput {
        expenses: ledger(),
        year: None,
        month: None,
    };
    let out = build_breakdown(&input).unwrap().result;
    assert_eq!(out.total, dec!(1700));
    assert_eq!(out.expense_count, 5);

    let food = out
        .categories
        .iter()
        .find(|c| c.category == ExpenseCategory::Food)
        .unwrap();
    assert_eq!(food.amount, dec!(300));
    assert_eq!(food.count, 2);

    let amounts: Decimal = out.categories.iter().map(|c| c.amount).sum();
    assert_eq!(amounts, out.total);
    assert_eq!(out.categories[0].category, ExpenseCategory::Housing);
}

#[test]
fn test_breakdown_for_empty_month_warns() {
    let input = BreakdownInput {
        expenses: ledger(),
        year: Some(2025),
        month: Some(7),
    };
    let out = build_breakdown(&input).unwrap();
    assert_eq!(out.result.total, Decimal::ZERO);
    assert!(out.result.categories.is_empty());
    assert_eq!(out.warnings.len(), 1);
}

#[test]
fn test_breakdown_rejects_month_thirteen() {
    let input = BreakdownInput {
        expenses: ledger(),
        year: Some(2025),
        month: Some(13),
    };
    match build_breakdown(&input).unwrap_err() {
        LoanPlannerError::InvalidInput { field, .. } => assert_eq!(field, "month"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_category_names_round_trip_through_json() {
    let json = serde_json::to_value(Expense::new("Bus", dec!(2), ExpenseCategory::Transportation, date(1, 1))).unwrap();
    assert_eq!(json["category"], "Transportation");
    assert_eq!(json["amount"], "2");
}

// ===========================================================================
// Dashboard
// ===========================================================================

#[test]
fn test_dashboard_combines_expenses_and_loans() {
    let input = DashboardInput {
        expenses: ledger(),
        loans: vec![Loan::flat(Some("Car".into()), dec!(12_000), date(3, 20), dec!(500))],
        monthly_income: dec!(3000),
    };
    let out = build_dashboard(&input).unwrap();
    let summary = out.result;

    assert_eq!(summary.total_expenses, dec!(1700));
    assert_eq!(summary.total_loans, dec!(12_000));
    assert_eq!(summary.monthly_loan_obligation, dec!(500));
    assert_eq!(summary.net_balance, dec!(1300));
    assert_eq!(summary.savings_potential, dec!(800));
    assert_eq!(summary.recent_activity.len(), 5);
    assert_eq!(summary.recent_activity[0].label, "Electricity");
    assert_eq!(summary.recent_activity[1].kind, ActivityKind::Loan);
    assert!(out.warnings.is_empty());
}

#[test]
fn test_dashboard_without_income() {
    let input = DashboardInput {
        expenses: ledger(),
        loans: vec![],
        monthly_income: Decimal::ZERO,
    };
    let out = build_dashboard(&input).unwrap();
    assert_eq!(out.result.net_balance, dec!(-1700));
    assert_eq!(out.result.savings_potential, Decimal::ZERO);
    assert!(out.warnings.iter().any(|w| w.contains("No monthly income")));
    assert!(out.warnings.iter().any(|w| w.contains("exceeds income by 1700")));
}

#[test]
fn test_dashboard_rejects_negative_expense() {
    let mut expenses = ledger();
    expenses[2].amount = dec!(-5);
    let input = DashboardInput {
        expenses,
        loans: vec![],
        monthly_income: dec!(3000),
    };
    match build_dashboard(&input).unwrap_err() {
        LoanPlannerError::InvalidInput { field, .. } => assert_eq!(field, "amount"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn test_expense_beyond_decimal_range_is_rejected() {
    let mut expenses = ledger();
    expenses.push(Expense::new("Overflow", Decimal::MAX, ExpenseCategory::Other, date(3, 20)));
    expenses.push(Expense::new("Overflow", Decimal::MAX, ExpenseCategory::Other, date(3, 21)));

    let breakdown = BreakdownInput {
        expenses: expenses.clone(),
        year: None,
        month: None,
    };
    assert!(build_breakdown(&breakdown).is_err());

    let input = DashboardInput {
        expenses,
        loans: vec![],
        monthly_income: dec!(3000),
    };
    match build_dashboard(&input).unwrap_err() {
        LoanPlannerError::InvalidInput { field, .. } => assert_eq!(field, "amount"),
        other => panic!("Expected InvalidInput, got {other:?}"),
    }
}
