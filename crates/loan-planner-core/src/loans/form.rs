use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::model::{new_record_id, Loan, LoanTerms};
use crate::{types::*, LoanPlannerError, LoanPlannerResult};

/// Raw loan fields as typed into a form. Every field is free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub monthly_payment: Option<String>,
    /// Annual percentage, e.g. "8.5".
    #[serde(default)]
    pub interest_rate: Option<String>,
    #[serde(default)]
    pub tenure_months: Option<String>,
}

impl From<&Loan> for LoanForm {
    fn from(loan: &Loan) -> Self {
        let (monthly_payment, interest_rate, tenure_months) = match &loan.terms {
            LoanTerms::Flat { monthly_payment } => (Some(monthly_payment.to_string()), None, None),
            LoanTerms::Amortizing {
                annual_interest_rate,
                tenure_months,
            } => (
                None,
                Some(annual_interest_rate.to_string()),
                Some(tenure_months.to_string()),
            ),
        };
        LoanForm {
            name: loan.name.clone(),
            amount: Some(loan.principal.to_string()),
            start_date: Some(loan.start_date.format("%Y-%m-%d").to_string()),
            monthly_payment,
            interest_rate,
            tenure_months,
        }
    }
}

/// Parse and validate form fields into a loan.
///
/// With no `id` a fresh one is assigned (create); otherwise the given id is
/// kept (edit). A monthly payment selects flat mode; otherwise interest rate
/// and tenure together select amortizing mode.
pub fn parse_loan_form(form: &LoanForm, id: Option<RecordId>) -> LoanPlannerResult<Loan> {
    let name = present(&form.name).map(str::to_string);

    let principal = parse_decimal("amount", required("amount", &form.amount)?)?;
    let start_date = parse_date("start_date", required("start_date", &form.start_date)?)?;

    let terms = match (
        present(&form.monthly_payment),
        present(&form.interest_rate),
        present(&form.tenure_months),
    ) {
        (Some(payment), _, _) => LoanTerms::Flat {
            monthly_payment: parse_decimal("monthly_payment", payment)?,
        },
        (None, Some(rate), Some(tenure)) => LoanTerms::Amortizing {
            annual_interest_rate: parse_decimal("interest_rate", rate)?,
            tenure_months: tenure.parse::<u32>().map_err(|_| LoanPlannerError::InvalidLoan {
                field: "tenure_months".into(),
                reason: format!("'{tenure}' is not a whole number of months"),
            })?,
        },
        (None, Some(_), None) => {
            return Err(LoanPlannerError::InvalidLoan {
                field: "tenure_months".into(),
                reason: "Tenure is required with an interest rate".into(),
            })
        }
        (None, None, _) => {
            return Err(LoanPlannerError::InvalidLoan {
                field: "monthly_payment".into(),
                reason: "Provide a monthly payment, or an interest rate and tenure".into(),
            })
        }
    };

    let is_new = id.is_none();
    let loan = Loan {
        id: id.unwrap_or_else(new_record_id),
        name,
        principal,
        start_date,
        terms,
        flexible_schedule: Vec::new(),
        created_at: is_new.then(Utc::now),
    };
    loan.validate()?;
    Ok(loan)
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(field: &str, value: &'a Option<String>) -> LoanPlannerResult<&'a str> {
    present(value).ok_or_else(|| LoanPlannerError::InvalidLoan {
        field: field.into(),
        reason: "This field is required".into(),
    })
}

fn parse_decimal(field: &str, raw: &str) -> LoanPlannerResult<Decimal> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '_').collect();
    Decimal::from_str(&cleaned).map_err(|_| LoanPlannerError::InvalidLoan {
        field: field.into(),
        reason: format!("'{raw}' is not a decimal amount"),
    })
}

fn parse_date(field: &str, raw: &str) -> LoanPlannerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| LoanPlannerError::InvalidLoan {
        field: field.into(),
        reason: format!("'{raw}' is not a YYYY-MM-DD date ({e})"),
    })
}
