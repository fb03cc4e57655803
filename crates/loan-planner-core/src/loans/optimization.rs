use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::model::Loan;
use super::schedule::{assemble, generate_schedule, run_payments, PaymentRun, Schedule};
use crate::time_value;
use crate::{types::*, LoanPlannerError, LoanPlannerResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Payment freed up by a completed loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorPayment {
    pub loan_id: RecordId,
    pub monthly_payment: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub target_loan_id: RecordId,
    pub donor_loan_id: RecordId,
    pub as_of: NaiveDate,
    /// Target balance as of the evaluation date; the projection starts here.
    pub current_balance: Money,
    pub original_payment: Money,
    pub revised_payment: Money,
    pub original_remaining_months: u32,
    pub revised_remaining_months: u32,
    pub months_saved: u32,
    /// months_saved × donor payment. Not an interest saving.
    pub amount_saved: Money,
    pub revised_schedule: Schedule,
}

/// A specific donor/target pairing to evaluate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationInput {
    pub target: Loan,
    pub donor: Loan,
    pub as_of: NaiveDate,
}

/// Every loan in the collection plus an evaluation date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOptimizationInput {
    pub loans: Vec<Loan>,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOptimization {
    pub completed_loan_ids: Vec<RecordId>,
    pub active_loan_ids: Vec<RecordId>,
    pub projections: Vec<OptimizationResult>,
    /// Projection with the largest months_saved, if any saves time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best: Option<OptimizationResult>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project the target loan forward from its current balance with the donor's
/// payment added to its regular installment.
///
/// `months_saved` compares against the periods the target would still need
/// at its original installment from the same current balance, not against
/// its full original schedule.
pub fn project(
    target: &Loan,
    current_target_schedule: &Schedule,
    donor: &DonorPayment,
    as_of: NaiveDate,
) -> LoanPlannerResult<OptimizationResult> {
    if donor.monthly_payment <= Decimal::ZERO {
        return Err(LoanPlannerError::InvalidInput {
            field: "donor.monthly_payment".into(),
            reason: "Redirected payment must be positive".into(),
        });
    }
    if donor.monthly_payment > time_value::MAX_AMOUNT {
        return Err(LoanPlannerError::InvalidInput {
            field: "donor.monthly_payment".into(),
            reason: format!("Redirected payment cannot exceed {}", time_value::MAX_AMOUNT),
        });
    }
    if current_target_schedule.loan_id != target.id {
        return Err(LoanPlannerError::InvalidInput {
            field: "current_target_schedule".into(),
            reason: format!(
                "Schedule belongs to loan {}, not target {}",
                current_target_schedule.loan_id, target.id
            ),
        });
    }
    if donor.loan_id == target.id {
        return Err(LoanPlannerError::PreconditionNotMet(
            "A loan cannot donate its payment to itself".into(),
        ));
    }

    let current_balance = current_target_schedule.balance_as_of(as_of);
    if current_balance.is_zero() {
        return Err(LoanPlannerError::PreconditionNotMet(format!(
            "Target loan {} is already repaid as of {as_of}",
            target.label()
        )));
    }

    let elapsed = current_target_schedule.periods_elapsed(as_of);
    let original_payment = current_target_schedule.monthly_payment;
    let out_of_range = |field: &str| LoanPlannerError::InvalidInput {
        field: field.into(),
        reason: "Projection exceeds the supported decimal range".into(),
    };
    let revised_payment = original_payment
        .checked_add(time_value::ceil_currency(donor.monthly_payment))
        .ok_or_else(|| out_of_range("revised_payment"))?;
    let original_remaining_months = time_value::months_to_repay(current_balance, original_payment)?;

    let first_date = time_value::add_months(target.start_date, elapsed)?;
    let entries = run_payments(&PaymentRun {
        basis: current_target_schedule.total_amount,
        opening_balance: current_balance,
        first_period: elapsed,
        anchor_date: target.start_date,
        installment: revised_payment,
        segments: &[],
    })?;
    let revised_remaining_months = entries.len() as u32;
    let months_saved = original_remaining_months.saturating_sub(revised_remaining_months);
    let amount_saved = Decimal::from(months_saved)
        .checked_mul(donor.monthly_payment)
        .ok_or_else(|| out_of_range("amount_saved"))?;

    debug!(
        target = %target.id,
        donor = %donor.loan_id,
        months_saved,
        "projected redirected payment"
    );

    Ok(OptimizationResult {
        target_loan_id: target.id.clone(),
        donor_loan_id: donor.loan_id.clone(),
        as_of,
        current_balance,
        original_payment,
        revised_payment,
        original_remaining_months,
        revised_remaining_months,
        months_saved,
        amount_saved,
        revised_schedule: assemble(
            target.id.clone(),
            revised_payment,
            current_target_schedule.total_amount,
            current_target_schedule.total_interest,
            first_date,
            entries,
        ),
    })
}

/// Split the collection into completed and active loans and project every
/// (active target, completed donor) pairing.
pub fn find_optimizations(loans: &[Loan], as_of: NaiveDate) -> LoanPlannerResult<PortfolioOptimization> {
    let mut completed: Vec<(&Loan, Schedule)> = Vec::new();
    let mut active: Vec<(&Loan, Schedule)> = Vec::new();

    for loan in loans {
        let schedule = generate_schedule(loan)?;
        if schedule.is_completed_as_of(as_of) {
            completed.push((loan, schedule));
        } else {
            active.push((loan, schedule));
        }
    }

    debug!(
        completed = completed.len(),
        active = active.len(),
        %as_of,
        "classified loans for optimization"
    );

    if completed.is_empty() {
        return Err(LoanPlannerError::PreconditionNotMet(format!(
            "No loan is fully repaid as of {as_of}; there is no payment to redirect"
        )));
    }
    if active.is_empty() {
        return Err(LoanPlannerError::PreconditionNotMet(format!(
            "No loan is still active as of {as_of}; there is nothing to accelerate"
        )));
    }

    let mut projections = Vec::with_capacity(completed.len() * active.len());
    for (target, target_schedule) in &active {
        for (donor, donor_schedule) in &completed {
            let donor_payment = DonorPayment {
                loan_id: donor.id.clone(),
                monthly_payment: donor_schedule.monthly_payment,
            };
            projections.push(project(target, target_schedule, &donor_payment, as_of)?);
        }
    }

    let best = projections
        .iter()
        .filter(|p| p.months_saved > 0)
        .max_by_key(|p| p.months_saved)
        .cloned();

    Ok(PortfolioOptimization {
        completed_loan_ids: completed.iter().map(|(l, _)| l.id.clone()).collect(),
        active_loan_ids: active.iter().map(|(l, _)| l.id.clone()).collect(),
        projections,
        best,
    })
}

/// Evaluate one donor/target pairing, checking the donor is completed.
pub fn build_projection(input: &OptimizationInput) -> LoanPlannerResult<ComputationOutput<OptimizationResult>> {
    let start = Instant::now();

    let donor_schedule = generate_schedule(&input.donor)?;
    if !donor_schedule.is_completed_as_of(input.as_of) {
        return Err(LoanPlannerError::PreconditionNotMet(format!(
            "Donor loan {} still owes {} as of {}; only a completed loan's payment can be redirected",
            input.donor.label(),
            donor_schedule.balance_as_of(input.as_of),
            input.as_of
        )));
    }
    let target_schedule = generate_schedule(&input.target)?;
    let donor = DonorPayment {
        loan_id: input.donor.id.clone(),
        monthly_payment: donor_schedule.monthly_payment,
    };
    let result = project(&input.target, &target_schedule, &donor, input.as_of)?;

    let mut warnings = Vec::new();
    if result.months_saved == 0 {
        warnings.push("Redirected payment does not shorten the target loan".to_string());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "as_of": input.as_of,
        "basis": "current remaining balance",
        "donor_payment": donor.monthly_payment.to_string(),
    });

    Ok(with_metadata(
        "Payment redirection projection (completed donor → active target)",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

/// Portfolio optimization wrapped in the standard output envelope.
pub fn optimize_portfolio(
    input: &PortfolioOptimizationInput,
) -> LoanPlannerResult<ComputationOutput<PortfolioOptimization>> {
    let start = Instant::now();
    let result = find_optimizations(&input.loans, input.as_of)?;

    let mut warnings = vec![
        "Amount saved is months saved × redirected payment, not an interest saving".to_string(),
    ];
    if result.best.is_none() {
        warnings.push("No pairing shortens any active loan".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "as_of": input.as_of,
        "basis": "current remaining balance",
        "loan_count": input.loans.len(),
    });

    Ok(with_metadata(
        "Payment redirection projection (completed donor → active target)",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
