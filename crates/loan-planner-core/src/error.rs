use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanPlannerError {
    #[error("Invalid loan: {field} — {reason}")]
    InvalidLoan { field: String, reason: String },

    #[error("Non-converging schedule: balance not cleared after {periods} periods ({reason})")]
    NonConvergingSchedule { periods: u32, reason: String },

    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LoanPlannerError {
    fn from(e: serde_json::Error) -> Self {
        LoanPlannerError::SerializationError(e.to_string())
    }
}

impl From<chrono::ParseError> for LoanPlannerError {
    fn from(e: chrono::ParseError) -> Self {
        LoanPlannerError::DateError(e.to_string())
    }
}
