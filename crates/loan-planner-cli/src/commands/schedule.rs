use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use loan_planner_core::loans::form::parse_loan_form;
use loan_planner_core::loans::optimization::{
    build_projection, optimize_portfolio, OptimizationInput, PortfolioOptimizationInput,
};
use loan_planner_core::loans::schedule::build_schedule;
use loan_planner_core::loans::Loan;

use crate::commands::loans::{load_loans, position_of, LoanFormArgs};
use crate::commands::today;
use crate::input;
use crate::store::FileStore;

/// Arguments for a single loan's repayment schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to a JSON loan (overrides every other source)
    #[arg(long)]
    pub input: Option<String>,

    /// Id of a saved loan
    #[arg(long)]
    pub loan: Option<String>,

    #[command(flatten)]
    pub fields: LoanFormArgs,
}

/// Arguments for payment redirection
#[derive(Args)]
pub struct OptimizeArgs {
    /// Path to JSON input file: either {target, donor, as_of} or {loans, as_of}
    #[arg(long)]
    pub input: Option<String>,

    /// Evaluation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Saved loan to accelerate (with --donor)
    #[arg(long, requires = "donor")]
    pub target: Option<String>,

    /// Saved, fully repaid loan whose payment is redirected (with --target)
    #[arg(long, requires = "target")]
    pub donor: Option<String>,
}

pub fn run_schedule(args: ScheduleArgs, store: &FileStore) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: Loan = match (&args.input, &args.loan) {
        (Some(path), _) => input::file::read_json(path)?,
        (None, Some(id)) => saved_loan(store, id)?,
        (None, None) => match input::stdin::read_stdin()? {
            Some(data) => serde_json::from_value(data)?,
            None => parse_loan_form(&args.fields.to_form(), None)?,
        },
    };
    let result = build_schedule(&loan)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_optimize(args: OptimizeArgs, store: &FileStore) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return optimize_request(input::file::read_json(path)?);
    }

    let as_of = args.as_of.unwrap_or_else(today);
    if let (Some(target), Some(donor)) = (&args.target, &args.donor) {
        let request = OptimizationInput {
            target: saved_loan(store, target)?,
            donor: saved_loan(store, donor)?,
            as_of,
        };
        return Ok(serde_json::to_value(build_projection(&request)?)?);
    }

    if let Some(data) = input::stdin::read_stdin()? {
        return optimize_request(data);
    }
    let request = PortfolioOptimizationInput {
        loans: load_loans(store)?,
        as_of,
    };
    Ok(serde_json::to_value(optimize_portfolio(&request)?)?)
}

/// A request naming a `target` is a single pairing; anything else is the
/// whole collection.
fn optimize_request(data: Value) -> Result<Value, Box<dyn std::error::Error>> {
    if data.get("target").is_some() {
        let request: OptimizationInput = serde_json::from_value(data)?;
        Ok(serde_json::to_value(build_projection(&request)?)?)
    } else {
        let request: PortfolioOptimizationInput = serde_json::from_value(data)?;
        Ok(serde_json::to_value(optimize_portfolio(&request)?)?)
    }
}

fn saved_loan(store: &FileStore, id: &str) -> Result<Loan, Box<dyn std::error::Error>> {
    let mut loans = load_loans(store)?;
    let idx = position_of(&loans, id)?;
    Ok(loans.swap_remove(idx))
}
