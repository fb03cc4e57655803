mod commands;
mod input;
mod output;
mod store;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::expenses::{BreakdownArgs, ExpenseCommand};
use commands::income::IncomeCommand;
use commands::loans::LoanCommand;
use commands::portfolio::{DashboardArgs, PortfolioArgs};
use commands::schedule::{OptimizeArgs, ScheduleArgs};
use store::FileStore;

/// Loan repayment planning and expense tracking
#[derive(Parser)]
#[command(
    name = "lp",
    version,
    about = "Loan repayment planning and expense tracking",
    long_about = "Generate month-by-month repayment schedules for flat and interest-bearing \
                  loans, aggregate a loan portfolio against income, project how a finished \
                  loan's payment would shorten the others, and keep a categorized expense ledger."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// JSON file holding saved loans, expenses and income
    #[arg(long, global = true, env = "LOAN_PLANNER_STORE", default_value = "loan-planner.json")]
    store: PathBuf,

    /// Log computation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a repayment schedule for one loan
    Schedule(ScheduleArgs),
    /// Summarize all loans against monthly income
    Portfolio(PortfolioArgs),
    /// Project redirecting a completed loan's payment to active loans
    Optimize(OptimizeArgs),
    /// Spending, loan obligations and recent activity at a glance
    Dashboard(DashboardArgs),
    /// Expense totals per category
    Breakdown(BreakdownArgs),
    /// Manage saved loans
    Loan {
        #[command(subcommand)]
        command: LoanCommand,
    },
    /// Manage saved expenses
    Expense {
        #[command(subcommand)]
        command: ExpenseCommand,
    },
    /// Manage the saved monthly income
    Income {
        #[command(subcommand)]
        command: IncomeCommand,
    },
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = FileStore::open(cli.store.clone());

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args, &store),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args, &store),
        Commands::Optimize(args) => commands::schedule::run_optimize(args, &store),
        Commands::Dashboard(args) => commands::portfolio::run_dashboard(args, &store),
        Commands::Breakdown(args) => commands::expenses::run_breakdown(args, &store),
        Commands::Loan { command } => commands::loans::run_loan(command, &store),
        Commands::Expense { command } => commands::expenses::run_expense(command, &store),
        Commands::Income { command } => commands::income::run_income(command, &store),
        Commands::Version => {
            println!("lp {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
