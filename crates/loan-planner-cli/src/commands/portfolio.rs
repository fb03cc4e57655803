use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_planner_core::expenses::dashboard::{build_dashboard, DashboardInput};
use loan_planner_core::loans::portfolio::{summarize_portfolio, PortfolioInput};

use crate::commands::expenses::load_expenses;
use crate::commands::income::resolve_income;
use crate::commands::loans::load_loans;
use crate::commands::today;
use crate::input;
use crate::store::FileStore;

/// Arguments for the portfolio summary
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON input file (overrides the saved loans)
    #[arg(long)]
    pub input: Option<String>,

    /// Evaluation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Count every loan as outstanding in full, ignoring payments made
    #[arg(long, conflicts_with = "as_of")]
    pub undated: bool,

    /// Monthly income (falls back to the saved income)
    #[arg(long, env = "LOAN_PLANNER_MONTHLY_INCOME")]
    pub monthly_income: Option<Decimal>,
}

/// Arguments for the spending dashboard
#[derive(Args)]
pub struct DashboardArgs {
    /// Path to JSON input file (overrides the saved ledger)
    #[arg(long)]
    pub input: Option<String>,

    /// Monthly income (falls back to the saved income)
    #[arg(long, env = "LOAN_PLANNER_MONTHLY_INCOME")]
    pub monthly_income: Option<Decimal>,
}

pub fn run_portfolio(args: PortfolioArgs, store: &FileStore) -> Result<Value, Box<dyn std::error::Error>> {
    let request: PortfolioInput = match input::read_input(args.input.as_deref())? {
        Some(request) => request,
        None => portfolio_from_store(&args, store)?,
    };
    let result = summarize_portfolio(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_dashboard(args: DashboardArgs, store: &FileStore) -> Result<Value, Box<dyn std::error::Error>> {
    let request: DashboardInput = match input::read_input(args.input.as_deref())? {
        Some(request) => request,
        None => dashboard_from_store(&args, store)?,
    };
    let result = build_dashboard(&request)?;
    Ok(serde_json::to_value(result)?)
}

fn portfolio_from_store(args: &PortfolioArgs, store: &FileStore) -> Result<PortfolioInput, Box<dyn std::error::Error>> {
    let as_of = if args.undated {
        None
    } else {
        Some(args.as_of.unwrap_or_else(today))
    };
    Ok(PortfolioInput {
        loans: load_loans(store)?,
        monthly_income: resolve_income(args.monthly_income, store)?,
        as_of,
    })
}

fn dashboard_from_store(args: &DashboardArgs, store: &FileStore) -> Result<DashboardInput, Box<dyn std::error::Error>> {
    Ok(DashboardInput {
        expenses: load_expenses(store)?,
        loans: load_loans(store)?,
        monthly_income: resolve_income(args.monthly_income, store)?,
    })
}
