use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::loans::model::new_record_id;
use crate::time_value::MAX_AMOUNT;
use crate::{types::*, LoanPlannerError, LoanPlannerResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Food,
    Transportation,
    Housing,
    Utilities,
    Loans,
    #[default]
    #[serde(other)]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Food,
        ExpenseCategory::Transportation,
        ExpenseCategory::Housing,
        ExpenseCategory::Utilities,
        ExpenseCategory::Loans,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Transportation => "Transportation",
            ExpenseCategory::Housing => "Housing",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Loans => "Loans",
            ExpenseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; anything unrecognised is `Other`.
impl FromStr for ExpenseCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: RecordId,
    pub description: String,
    pub amount: Money,
    #[serde(default)]
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn new(description: impl Into<String>, amount: Money, category: ExpenseCategory, date: NaiveDate) -> Self {
        Self {
            id: new_record_id(),
            description: description.into(),
            amount,
            category,
            date,
            notes: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn validate(&self) -> LoanPlannerResult<()> {
        if self.description.trim().is_empty() {
            return Err(LoanPlannerError::InvalidInput {
                field: "description".into(),
                reason: "Describe what the money was spent on".into(),
            });
        }
        if self.amount < Decimal::ZERO {
            return Err(LoanPlannerError::InvalidInput {
                field: "amount".into(),
                reason: "Expense amount cannot be negative".into(),
            });
        }
        if self.amount > MAX_AMOUNT {
            return Err(LoanPlannerError::InvalidInput {
                field: "amount".into(),
                reason: format!("Expense amount cannot exceed {MAX_AMOUNT}"),
            });
        }
        Ok(())
    }
}
