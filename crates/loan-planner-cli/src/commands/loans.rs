use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

use loan_planner_core::loans::flexible::{attach_flexible_plan, PaymentSegment};
use loan_planner_core::loans::form::{parse_loan_form, LoanForm};
use loan_planner_core::loans::schedule::{build_schedule, generate_schedule, Schedule};
use loan_planner_core::loans::{Loan, LoanTerms};

use crate::store::{collection_expiry, FileStore, LOANS_KEY};

/// Loan fields as free text, parsed the same way for add and edit.
#[derive(Args, Default)]
pub struct LoanFormArgs {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub amount: Option<String>,

    /// First payment date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Fixed monthly payment; selects a flat, interest-free loan
    #[arg(long)]
    pub monthly_payment: Option<String>,

    /// Annual interest rate in percent (e.g. 8.5)
    #[arg(long)]
    pub interest_rate: Option<String>,

    /// Repayment term in months
    #[arg(long)]
    pub tenure_months: Option<String>,
}

impl LoanFormArgs {
    pub fn to_form(&self) -> LoanForm {
        LoanForm {
            name: self.name.clone(),
            amount: self.amount.clone(),
            start_date: self.start_date.clone(),
            monthly_payment: self.monthly_payment.clone(),
            interest_rate: self.interest_rate.clone(),
            tenure_months: self.tenure_months.clone(),
        }
    }

    /// Overlay the given fields on an existing loan's form. Switching to
    /// rate and tenure drops a previous flat payment.
    fn merge_into(&self, mut form: LoanForm) -> LoanForm {
        if self.name.is_some() {
            form.name = self.name.clone();
        }
        if self.amount.is_some() {
            form.amount = self.amount.clone();
        }
        if self.start_date.is_some() {
            form.start_date = self.start_date.clone();
        }
        if self.monthly_payment.is_some() {
            form.monthly_payment = self.monthly_payment.clone();
        } else if self.interest_rate.is_some() || self.tenure_months.is_some() {
            form.monthly_payment = None;
        }
        if self.interest_rate.is_some() {
            form.interest_rate = self.interest_rate.clone();
        }
        if self.tenure_months.is_some() {
            form.tenure_months = self.tenure_months.clone();
        }
        form
    }
}

#[derive(Subcommand)]
pub enum LoanCommand {
    /// Save a new loan
    Add(LoanFormArgs),
    /// List saved loans with their installments
    List,
    /// Change fields of a saved loan
    Edit {
        /// Loan id (a unique prefix is enough)
        id: String,
        #[command(flatten)]
        fields: LoanFormArgs,
    },
    /// Set or clear month-range payment overrides on a saved loan
    Plan {
        /// Loan id (a unique prefix is enough)
        id: String,
        /// START-END:PAYMENT, 1-based months (e.g. 1-6:200); repeatable
        #[arg(long = "segment")]
        segments: Vec<String>,
        /// Remove every override
        #[arg(long, conflicts_with = "segments")]
        clear: bool,
    },
    /// Delete a saved loan
    Delete {
        /// Loan id (a unique prefix is enough)
        id: String,
    },
}

pub fn run_loan(command: LoanCommand, store: &FileStore) -> Result<Value, Box<dyn std::error::Error>> {
    let mut loans = load_loans(store)?;

    match command {
        LoanCommand::Add(fields) => {
            let loan = parse_loan_form(&fields.to_form(), None)?;
            let schedule = generate_schedule(&loan)?;
            let row = loan_row(&loan, &schedule);
            loans.push(loan);
            save_loans(store, &loans)?;
            Ok(json!({ "result": row }))
        }
        LoanCommand::List => {
            let mut rows = Vec::with_capacity(loans.len());
            for loan in &loans {
                rows.push(loan_row(loan, &generate_schedule(loan)?));
            }
            Ok(json!({ "result": rows }))
        }
        LoanCommand::Edit { id, fields } => {
            let idx = position_of(&loans, &id)?;
            let existing = &loans[idx];
            let form = fields.merge_into(LoanForm::from(existing));

            let mut updated = parse_loan_form(&form, Some(existing.id.clone()))?;
            updated.flexible_schedule = existing.flexible_schedule.clone();
            updated.created_at = existing.created_at;
            let schedule = generate_schedule(&updated)?;

            let row = loan_row(&updated, &schedule);
            loans[idx] = updated;
            save_loans(store, &loans)?;
            Ok(json!({ "result": row }))
        }
        LoanCommand::Plan { id, segments, clear } => {
            let idx = position_of(&loans, &id)?;
            let segments = if clear {
                Vec::new()
            } else {
                segments
                    .iter()
                    .map(|raw| parse_segment(raw))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let updated = attach_flexible_plan(&loans[idx], &segments)?;
            let out = build_schedule(&updated)?;

            loans[idx] = updated;
            save_loans(store, &loans)?;
            Ok(serde_json::to_value(out)?)
        }
        LoanCommand::Delete { id } => {
            let idx = position_of(&loans, &id)?;
            let removed = loans.remove(idx);
            save_loans(store, &loans)?;
            Ok(json!({
                "result": {
                    "deleted": removed.id,
                    "remaining_loans": loans.len(),
                }
            }))
        }
    }
}

pub fn load_loans(store: &FileStore) -> Result<Vec<Loan>, Box<dyn std::error::Error>> {
    Ok(store.load_as(LOANS_KEY)?.unwrap_or_default())
}

pub fn save_loans(store: &FileStore, loans: &[Loan]) -> Result<(), Box<dyn std::error::Error>> {
    store.save(LOANS_KEY, &loans, collection_expiry())
}

/// Index of the loan whose id equals `key`, or uniquely starts with it.
pub fn position_of(loans: &[Loan], key: &str) -> Result<usize, Box<dyn std::error::Error>> {
    if let Some(idx) = loans.iter().position(|l| l.id == key) {
        return Ok(idx);
    }
    let matches: Vec<usize> = loans
        .iter()
        .enumerate()
        .filter(|(_, l)| !key.is_empty() && l.id.starts_with(key))
        .map(|(i, _)| i)
        .collect();
    match matches.as_slice() {
        [idx] => Ok(*idx),
        [] => Err(format!("No saved loan with id '{}'", key).into()),
        _ => Err(format!("Loan id '{}' is ambiguous ({} matches)", key, matches.len()).into()),
    }
}

fn parse_segment(raw: &str) -> Result<PaymentSegment, Box<dyn std::error::Error>> {
    let (range, payment) = raw
        .split_once(':')
        .ok_or_else(|| format!("Segment '{}' must look like START-END:PAYMENT", raw))?;
    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (start.trim(), end.trim()),
        None => (range.trim(), range.trim()),
    };
    Ok(PaymentSegment {
        start_month: start
            .parse()
            .map_err(|_| format!("Segment '{}': '{}' is not a month number", raw, start))?,
        end_month: end
            .parse()
            .map_err(|_| format!("Segment '{}': '{}' is not a month number", raw, end))?,
        monthly_payment: Decimal::from_str(payment.trim())
            .map_err(|_| format!("Segment '{}': '{}' is not an amount", raw, payment.trim()))?,
    })
}

fn loan_row(loan: &Loan, schedule: &Schedule) -> Value {
    let mode = match loan.terms {
        LoanTerms::Flat { .. } => "flat",
        LoanTerms::Amortizing { .. } => "amortizing",
    };
    json!({
        "id": loan.id,
        "name": loan.label(),
        "mode": mode,
        "principal": loan.principal,
        "monthly_payment": schedule.monthly_payment,
        "total_amount": schedule.total_amount,
        "periods": schedule.period_count(),
        "start_date": loan.start_date,
        "end_date": schedule.end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn temp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("store.json"));
        (dir, store)
    }

    fn car_fields() -> LoanFormArgs {
        LoanFormArgs {
            name: Some("Car".into()),
            amount: Some("12,000".into()),
            start_date: Some("2025-01-01".into()),
            monthly_payment: Some("1000".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_list() {
        let (_dir, store) = temp_store();
        let added = run_loan(LoanCommand::Add(car_fields()), &store).unwrap();
        assert_eq!(added["result"]["periods"], 12);
        assert_eq!(added["result"]["end_date"], "2025-12-01");

        let listed = run_loan(LoanCommand::List, &store).unwrap();
        assert_eq!(listed["result"].as_array().unwrap().len(), 1);
        assert_eq!(listed["result"][0]["name"], "Car");
    }

    #[test]
    fn test_add_rejects_zero_payment() {
        let (_dir, store) = temp_store();
        let mut fields = car_fields();
        fields.monthly_payment = Some("0".into());
        let err = run_loan(LoanCommand::Add(fields), &store).unwrap_err();
        assert!(err.to_string().starts_with("Non-converging schedule"));
        assert!(load_loans(&store).unwrap().is_empty());
    }

    #[test]
    fn test_edit_switches_to_amortizing() {
        let (_dir, store) = temp_store();
        run_loan(LoanCommand::Add(car_fields()), &store).unwrap();
        let id = load_loans(&store).unwrap()[0].id.clone();

        let fields = LoanFormArgs {
            interest_rate: Some("12".into()),
            tenure_months: Some("12".into()),
            ..Default::default()
        };
        run_loan(
            LoanCommand::Edit {
                id: id[..8].to_string(),
                fields,
            },
            &store,
        )
        .unwrap();

        let loans = load_loans(&store).unwrap();
        assert_eq!(loans[0].id, id);
        assert!(loans[0].created_at.is_some());
        assert_eq!(
            loans[0].terms,
            LoanTerms::Amortizing {
                annual_interest_rate: dec!(12),
                tenure_months: 12
            }
        );
    }

    #[test]
    fn test_plan_and_delete() {
        let (_dir, store) = temp_store();
        run_loan(LoanCommand::Add(car_fields()), &store).unwrap();
        let id = load_loans(&store).unwrap()[0].id.clone();

        let out = run_loan(
            LoanCommand::Plan {
                id: id.clone(),
                segments: vec!["1-2:500".into(), "3:2000".into()],
                clear: false,
            },
            &store,
        )
        .unwrap();
        // 500 + 500 + 2000, then 9000 at 1000 a month
        assert_eq!(out["result"]["entries"].as_array().unwrap().len(), 12);
        assert_eq!(load_loans(&store).unwrap()[0].flexible_schedule.len(), 2);

        let deleted = run_loan(LoanCommand::Delete { id: id.clone() }, &store).unwrap();
        assert_eq!(deleted["result"]["remaining_loans"], 0);
        assert!(run_loan(LoanCommand::Delete { id }, &store).is_err());
    }

    #[test]
    fn test_segment_parsing() {
        let seg = parse_segment("4-9: 250.50").unwrap();
        assert_eq!((seg.start_month, seg.end_month), (4, 9));
        assert_eq!(seg.monthly_payment, dec!(250.50));
        assert!(parse_segment("4-9").is_err());
        assert!(parse_segment("a-9:1").is_err());
    }
}
