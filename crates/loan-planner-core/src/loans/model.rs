use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::flexible::PaymentSegment;
use crate::time_value::{MAX_AMOUNT, MAX_SCHEDULE_PERIODS};
use crate::{types::*, LoanPlannerError, LoanPlannerResult};

// ---------------------------------------------------------------------------
// Loan entity
// ---------------------------------------------------------------------------

/// How a loan is repaid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LoanTerms {
    /// Fixed payment every month, no interest.
    Flat { monthly_payment: Money },
    /// Installment derived from an annual rate (percent, 12 = 12% p.a.)
    /// over a fixed number of months.
    Amortizing {
        annual_interest_rate: Percent,
        tenure_months: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub principal: Money,
    pub start_date: NaiveDate,
    pub terms: LoanTerms,
    /// Month-range overrides of the regular installment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flexible_schedule: Vec<PaymentSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// A new fixed-payment loan with a freshly assigned id.
    pub fn flat(name: Option<String>, principal: Money, start_date: NaiveDate, monthly_payment: Money) -> Self {
        Self {
            id: new_record_id(),
            name,
            principal,
            start_date,
            terms: LoanTerms::Flat { monthly_payment },
            flexible_schedule: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// A new interest-bearing loan with a freshly assigned id.
    pub fn amortizing(
        name: Option<String>,
        principal: Money,
        start_date: NaiveDate,
        annual_interest_rate: Percent,
        tenure_months: u32,
    ) -> Self {
        Self {
            id: new_record_id(),
            name,
            principal,
            start_date,
            terms: LoanTerms::Amortizing {
                annual_interest_rate,
                tenure_months,
            },
            flexible_schedule: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Name for display, falling back to the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.id)
    }

    /// Check the loan invariants, reporting the first offending field.
    ///
    /// A flat payment of exactly zero passes here; it is a valid loan whose
    /// schedule never converges, which schedule generation reports.
    pub fn validate(&self) -> LoanPlannerResult<()> {
        if self.id.trim().is_empty() {
            return Err(LoanPlannerError::InvalidLoan {
                field: "id".into(),
                reason: "Loan id must not be empty".into(),
            });
        }
        if self.principal <= Decimal::ZERO {
            return Err(LoanPlannerError::InvalidLoan {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
        if self.principal > MAX_AMOUNT {
            return Err(LoanPlannerError::InvalidLoan {
                field: "principal".into(),
                reason: format!("Principal cannot exceed {MAX_AMOUNT}"),
            });
        }
        match &self.terms {
            LoanTerms::Flat { monthly_payment } => {
                if *monthly_payment < Decimal::ZERO {
                    return Err(LoanPlannerError::InvalidLoan {
                        field: "monthly_payment".into(),
                        reason: "Monthly payment cannot be negative".into(),
                    });
                }
                if *monthly_payment > MAX_AMOUNT {
                    return Err(LoanPlannerError::InvalidLoan {
                        field: "monthly_payment".into(),
                        reason: format!("Monthly payment cannot exceed {MAX_AMOUNT}"),
                    });
                }
            }
            LoanTerms::Amortizing {
                annual_interest_rate,
                tenure_months,
            } => {
                if *tenure_months < 1 {
                    return Err(LoanPlannerError::InvalidLoan {
                        field: "tenure_months".into(),
                        reason: "Tenure must be at least one month".into(),
                    });
                }
                if *tenure_months > MAX_SCHEDULE_PERIODS {
                    return Err(LoanPlannerError::InvalidLoan {
                        field: "tenure_months".into(),
                        reason: format!("Tenure cannot exceed {MAX_SCHEDULE_PERIODS} months"),
                    });
                }
                if *annual_interest_rate < Decimal::ZERO {
                    return Err(LoanPlannerError::InvalidLoan {
                        field: "annual_interest_rate".into(),
                        reason: "Interest rate cannot be negative".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Fresh opaque identifier for a loan or expense.
pub fn new_record_id() -> RecordId {
    Uuid::new_v4().to_string()
}
