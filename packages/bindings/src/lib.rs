use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use loan_planner_core::expenses::breakdown::{self, BreakdownInput};
use loan_planner_core::expenses::dashboard::{self, DashboardInput};
use loan_planner_core::loans::form::{self, LoanForm};
use loan_planner_core::loans::optimization::{self, OptimizationInput, PortfolioOptimizationInput};
use loan_planner_core::loans::portfolio::{self, PortfolioInput};
use loan_planner_core::loans::{schedule, Loan};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn render<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

/// Loan JSON in, schedule envelope out.
#[napi]
pub fn generate_schedule(loan_json: String) -> NapiResult<String> {
    let loan: Loan = parse(&loan_json)?;
    let output = schedule::build_schedule(&loan).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn aggregate_portfolio(input_json: String) -> NapiResult<String> {
    let input: PortfolioInput = parse(&input_json)?;
    let output = portfolio::summarize_portfolio(&input).map_err(to_napi_error)?;
    render(&output)
}

/// One completed donor and one active target.
#[napi]
pub fn project_optimization(input_json: String) -> NapiResult<String> {
    let input: OptimizationInput = parse(&input_json)?;
    let output = optimization::build_projection(&input).map_err(to_napi_error)?;
    render(&output)
}

/// Every completed/active pairing in a collection.
#[napi]
pub fn find_optimizations(input_json: String) -> NapiResult<String> {
    let input: PortfolioOptimizationInput = parse(&input_json)?;
    let output = optimization::optimize_portfolio(&input).map_err(to_napi_error)?;
    render(&output)
}

/// Form fields in, validated loan out. Pass `id` when editing.
#[napi]
pub fn parse_loan_form(form_json: String, id: Option<String>) -> NapiResult<String> {
    let loan_form: LoanForm = parse(&form_json)?;
    let loan = form::parse_loan_form(&loan_form, id).map_err(to_napi_error)?;
    render(&loan)
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[napi]
pub fn category_breakdown(input_json: String) -> NapiResult<String> {
    let input: BreakdownInput = parse(&input_json)?;
    let output = breakdown::build_breakdown(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn dashboard_summary(input_json: String) -> NapiResult<String> {
    let input: DashboardInput = parse(&input_json)?;
    let output = dashboard::build_dashboard(&input).map_err(to_napi_error)?;
    render(&output)
}
