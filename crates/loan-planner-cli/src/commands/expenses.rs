use chrono::NaiveDate;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use loan_planner_core::expenses::breakdown::{build_breakdown, expenses_in_month, BreakdownInput};
use loan_planner_core::expenses::{Expense, ExpenseCategory};

use crate::commands::today;
use crate::input;
use crate::store::{collection_expiry, FileStore, EXPENSES_KEY};

/// Arguments for the category breakdown
#[derive(Args)]
pub struct BreakdownArgs {
    /// Path to JSON input file (overrides the saved ledger)
    #[arg(long)]
    pub input: Option<String>,

    /// Calendar year to restrict to (with --month)
    #[arg(long, requires = "month")]
    pub year: Option<i32>,

    /// Calendar month 1-12 to restrict to (with --year)
    #[arg(long, requires = "year")]
    pub month: Option<u32>,
}

#[derive(Subcommand)]
pub enum ExpenseCommand {
    /// Record an expense
    Add {
        /// What the money was spent on
        #[arg(long)]
        description: String,

        /// Amount spent
        #[arg(long)]
        amount: Decimal,

        /// Food, Transportation, Housing, Utilities, Loans or Other
        #[arg(long, default_value = "Other")]
        category: String,

        /// Date spent (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List saved expenses, newest first
    List {
        #[arg(long, requires = "month")]
        year: Option<i32>,

        #[arg(long, requires = "year")]
        month: Option<u32>,
    },
    /// Change fields of a saved expense
    Edit {
        /// Expense id
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a saved expense
    Delete {
        /// Expense id
        id: String,
    },
}

pub fn run_breakdown(args: BreakdownArgs, store: &FileStore) -> Result<Value, Box<dyn std::error::Error>> {
    let request: BreakdownInput = match input::read_input(args.input.as_deref())? {
        Some(request) => request,
        None => BreakdownInput {
            expenses: load_expenses(store)?,
            year: args.year,
            month: args.month,
        },
    };
    let result = build_breakdown(&request)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_expense(command: ExpenseCommand, store: &FileStore) -> Result<Value, Box<dyn std::error::Error>> {
    let mut expenses = load_expenses(store)?;

    match command {
        ExpenseCommand::Add {
            description,
            amount,
            category,
            date,
            notes,
        } => {
            let mut expense = Expense::new(
                description,
                amount,
                parse_category(&category),
                date.unwrap_or_else(today),
            );
            expense.notes = notes.filter(|n| !n.trim().is_empty());
            expense.validate()?;

            expenses.push(expense.clone());
            save_expenses(store, &expenses)?;
            Ok(json!({ "result": expense }))
        }
        ExpenseCommand::List { year, month } => {
            let mut selected = match (year, month) {
                (Some(year), Some(month)) => expenses_in_month(&expenses, year, month),
                _ => expenses,
            };
            selected.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(json!({ "result": selected }))
        }
        ExpenseCommand::Edit {
            id,
            description,
            amount,
            category,
            date,
            notes,
        } => {
            let expense = expenses
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| format!("No saved expense with id '{}'", id))?;
            if let Some(description) = description {
                expense.description = description;
            }
            if let Some(amount) = amount {
                expense.amount = amount;
            }
            if let Some(category) = category {
                expense.category = parse_category(&category);
            }
            if let Some(date) = date {
                expense.date = date;
            }
            if notes.is_some() {
                expense.notes = notes.filter(|n| !n.trim().is_empty());
            }
            expense.validate()?;

            let updated = expense.clone();
            save_expenses(store, &expenses)?;
            Ok(json!({ "result": updated }))
        }
        ExpenseCommand::Delete { id } => {
            let before = expenses.len();
            expenses.retain(|e| e.id != id);
            if expenses.len() == before {
                return Err(format!("No saved expense with id '{}'", id).into());
            }
            save_expenses(store, &expenses)?;
            Ok(json!({
                "result": {
                    "deleted": id,
                    "remaining_expenses": expenses.len(),
                }
            }))
        }
    }
}

pub fn load_expenses(store: &FileStore) -> Result<Vec<Expense>, Box<dyn std::error::Error>> {
    Ok(store.load_as(EXPENSES_KEY)?.unwrap_or_default())
}

pub fn save_expenses(store: &FileStore, expenses: &[Expense]) -> Result<(), Box<dyn std::error::Error>> {
    store.save(EXPENSES_KEY, &expenses, collection_expiry())
}

fn parse_category(raw: &str) -> ExpenseCategory {
    raw.parse().unwrap_or_default()
}
