pub mod breakdown;
pub mod dashboard;
pub mod model;

pub use model::{Expense, ExpenseCategory};
