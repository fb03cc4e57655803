pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "expenses")]
pub mod expenses;

pub use error::LoanPlannerError;
pub use types::*;

/// Standard result type for all loan-planner operations
pub type LoanPlannerResult<T> = Result<T, LoanPlannerError>;
