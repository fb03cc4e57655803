pub mod flexible;
pub mod form;
pub mod model;
pub mod optimization;
pub mod portfolio;
pub mod schedule;

pub use model::{Loan, LoanTerms};
pub use schedule::{generate_schedule, Schedule, ScheduleEntry};
