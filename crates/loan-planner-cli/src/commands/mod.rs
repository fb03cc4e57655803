pub mod expenses;
pub mod income;
pub mod loans;
pub mod portfolio;
pub mod schedule;

use chrono::{Local, NaiveDate};

/// Default evaluation date for store-backed commands.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
