use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::flexible::{normalize_segments, payment_for_month, PaymentSegment};
use super::model::{Loan, LoanTerms};
use crate::time_value::{self, MAX_SCHEDULE_PERIODS};
use crate::{types::*, LoanPlannerError, LoanPlannerResult};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Zero-based month offset from the loan start.
    pub period_index: u32,
    pub period_date: NaiveDate,
    pub period_label: String,
    pub payment_amount: Money,
    pub remaining_balance: Money,
    pub percent_paid: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub loan_id: RecordId,
    /// Regular installment for the schedule (before flexible overrides).
    pub monthly_payment: Money,
    /// Amount repaid over the life of the loan: principal for flat loans,
    /// installment × tenure for amortizing loans.
    pub total_amount: Money,
    pub total_interest: Money,
    pub start_date: NaiveDate,
    /// Date of the final period.
    pub end_date: NaiveDate,
    pub entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn period_count(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn total_paid(&self) -> Money {
        self.entries.iter().map(|e| e.payment_amount).sum()
    }

    /// Balance before the first period of this schedule.
    pub fn opening_balance(&self) -> Money {
        self.entries
            .first()
            .map(|e| e.remaining_balance + e.payment_amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Periods whose date has been reached by `as_of`.
    pub fn periods_elapsed(&self, as_of: NaiveDate) -> u32 {
        self.entries
            .iter()
            .take_while(|e| e.period_date <= as_of)
            .count() as u32
    }

    /// Remaining balance once every period dated on or before `as_of` is paid.
    pub fn balance_as_of(&self, as_of: NaiveDate) -> Money {
        match self.periods_elapsed(as_of) {
            0 => self.opening_balance(),
            n => self.entries[n as usize - 1].remaining_balance,
        }
    }

    pub fn percent_paid_as_of(&self, as_of: NaiveDate) -> Percent {
        match self.periods_elapsed(as_of) {
            0 => time_value::percent_of(self.total_amount - self.opening_balance(), self.total_amount),
            n => self.entries[n as usize - 1].percent_paid,
        }
    }

    /// A loan is completed once its balance as of the evaluation date is zero.
    pub fn is_completed_as_of(&self, as_of: NaiveDate) -> bool {
        self.balance_as_of(as_of).is_zero()
    }

    /// Date of the first unpaid period, if any remain.
    pub fn next_period_date(&self, as_of: NaiveDate) -> Option<NaiveDate> {
        self.entries
            .get(self.periods_elapsed(as_of) as usize)
            .map(|e| e.period_date)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate the month-by-month repayment schedule for a loan.
///
/// Flat loans pay `monthly_payment` against the principal until it is
/// cleared. Amortizing loans derive an EMI from rate and tenure and pay it
/// against principal plus interest; at a zero rate this is exactly the flat
/// schedule for `principal / tenure_months`. The final period always pays
/// exactly the remaining balance.
pub fn generate_schedule(loan: &Loan) -> LoanPlannerResult<Schedule> {
    loan.validate()?;
    let segments = normalize_segments(&loan.flexible_schedule)?;

    let (installment, total_amount) = match &loan.terms {
        LoanTerms::Flat { monthly_payment } => (time_value::ceil_currency(*monthly_payment), loan.principal),
        LoanTerms::Amortizing {
            annual_interest_rate,
            tenure_months,
        } => {
            let installment = time_value::emi(loan.principal, *annual_interest_rate, *tenure_months)?;
            let total = if annual_interest_rate.is_zero() {
                loan.principal
            } else {
                installment
                    .checked_mul(Decimal::from(*tenure_months))
                    .ok_or_else(|| LoanPlannerError::InvalidLoan {
                        field: "annual_interest_rate".into(),
                        reason: "Total repayable exceeds the supported decimal range".into(),
                    })?
            };
            (installment, total)
        }
    };

    if installment.is_zero() && segments.is_empty() {
        warn!(loan_id = %loan.id, "rejecting schedule with zero monthly payment");
        return Err(LoanPlannerError::NonConvergingSchedule {
            periods: 0,
            reason: "monthly payment is zero, the balance never decreases".into(),
        });
    }

    let entries = run_payments(&PaymentRun {
        basis: total_amount,
        opening_balance: total_amount,
        first_period: 0,
        anchor_date: loan.start_date,
        installment,
        segments: &segments,
    })
    .inspect_err(|e| warn!(loan_id = %loan.id, error = %e, "schedule generation failed"))?;

    debug!(
        loan_id = %loan.id,
        periods = entries.len(),
        installment = %installment,
        "generated repayment schedule"
    );

    Ok(assemble(
        loan.id.clone(),
        installment,
        total_amount,
        total_amount - loan.principal,
        loan.start_date,
        entries,
    ))
}

/// Schedule wrapped in the standard output envelope.
pub fn build_schedule(loan: &Loan) -> LoanPlannerResult<ComputationOutput<Schedule>> {
    let start = Instant::now();
    let schedule = generate_schedule(loan)?;

    let mut warnings: Vec<String> = Vec::new();
    let methodology = match &loan.terms {
        LoanTerms::Flat { .. } => {
            warnings.push("Flat schedule: no interest is charged".into());
            "Flat repayment schedule (fixed payment, no interest)"
        }
        LoanTerms::Amortizing {
            annual_interest_rate, ..
        } => {
            if annual_interest_rate.is_zero() {
                warnings.push("Zero interest rate: installment is principal / tenure".into());
            }
            "Amortizing repayment schedule (EMI)"
        }
    };

    if let Some(last) = schedule.entries.last() {
        if schedule.entries.len() > 1 && last.payment_amount < schedule.monthly_payment {
            warnings.push(format!(
                "Final payment of {} is smaller than the regular installment of {}",
                last.payment_amount, schedule.monthly_payment
            ));
        }
    }
    if !loan.flexible_schedule.is_empty() {
        let totals = super::flexible::plan_totals(&loan.flexible_schedule)?;
        warnings.push(format!(
            "Flexible plan overrides payments up to month {} ({} scheduled)",
            totals.total_months, totals.total_scheduled_payment
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "currency_unit": "0.01",
        "installment_rounding": "up to the next currency unit",
        "max_periods": MAX_SCHEDULE_PERIODS,
        "terms": loan.terms,
    });

    Ok(with_metadata(methodology, &assumptions, warnings, elapsed, schedule))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Parameters for a fixed-installment payment run.
pub(crate) struct PaymentRun<'a> {
    /// Amount that `percent_paid` is measured against.
    pub basis: Money,
    pub opening_balance: Money,
    pub first_period: u32,
    /// Date of period 0; period n falls n months after it.
    pub anchor_date: NaiveDate,
    pub installment: Money,
    pub segments: &'a [PaymentSegment],
}

/// Pay down `opening_balance` one month at a time until it reaches zero.
pub(crate) fn run_payments(run: &PaymentRun<'_>) -> LoanPlannerResult<Vec<ScheduleEntry>> {
    let mut entries = Vec::new();
    let mut remaining = run.opening_balance;
    let mut offset: u32 = 0;

    while remaining > Decimal::ZERO {
        if offset >= MAX_SCHEDULE_PERIODS {
            return Err(LoanPlannerError::NonConvergingSchedule {
                periods: MAX_SCHEDULE_PERIODS,
                reason: format!("{remaining} still outstanding at the period cap"),
            });
        }

        let period_index = run.first_period + offset;
        let scheduled = payment_for_month(run.segments, period_index + 1).unwrap_or(run.installment);
        let payment = scheduled.min(remaining);
        remaining -= payment;

        let period_date = time_value::add_months(run.anchor_date, period_index)?;
        let percent_paid = time_value::percent_of(run.basis - remaining, run.basis).min(Decimal::ONE_HUNDRED);

        entries.push(ScheduleEntry {
            period_index,
            period_date,
            period_label: time_value::period_label(period_date),
            payment_amount: payment,
            remaining_balance: remaining,
            percent_paid,
        });
        offset += 1;
    }

    Ok(entries)
}

pub(crate) fn assemble(
    loan_id: RecordId,
    monthly_payment: Money,
    total_amount: Money,
    total_interest: Money,
    start_date: NaiveDate,
    entries: Vec<ScheduleEntry>,
) -> Schedule {
    let end_date = entries.last().map(|e| e.period_date).unwrap_or(start_date);
    Schedule {
        loan_id,
        monthly_payment,
        total_amount,
        total_interest,
        start_date,
        end_date,
        entries,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_flat_schedule_twelve_months() {
        let loan = Loan::flat(Some("Laptop".into()), dec!(12_000), start(), dec!(1000));
        let s = generate_schedule(&loan).unwrap();
        assert_eq!(s.entries.len(), 12);
        assert_eq!(s.entries[0].remaining_balance, dec!(11_000));
        assert_eq!(s.entries[0].percent_paid, dec!(8.33));
        assert_eq!(s.entries[11].remaining_balance, Decimal::ZERO);
        assert_eq!(s.entries[11].percent_paid, dec!(100));
        assert_eq!(s.entries[0].period_label, "January 2025");
        assert_eq!(s.end_date, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(s.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_flat_final_payment_is_capped() {
        let loan = Loan::flat(None, dec!(2500), start(), dec!(1000));
        let s = generate_schedule(&loan).unwrap();
        assert_eq!(s.entries.len(), 3);
        assert_eq!(s.entries[2].payment_amount, dec!(500));
        assert_eq!(s.total_paid(), dec!(2500));
    }

    #[test]
    fn test_amortizing_schedule_totals() {
        let loan = Loan::amortizing(None, dec!(100_000), start(), dec!(12), 12);
        let s = generate_schedule(&loan).unwrap();
        assert_eq!(s.monthly_payment, dec!(8884.88));
        assert_eq!(s.total_amount, dec!(106_618.56));
        assert_eq!(s.total_interest, dec!(6618.56));
        assert_eq!(s.entries.len(), 12);
        assert_eq!(s.entries[11].remaining_balance, Decimal::ZERO);
        assert_eq!(s.entries[11].percent_paid, dec!(100));
        assert_eq!(s.total_paid(), s.total_amount);
    }

    #[test]
    fn test_zero_payment_does_not_converge() {
        let loan = Loan::flat(None, dec!(1000), start(), Decimal::ZERO);
        match generate_schedule(&loan).unwrap_err() {
            LoanPlannerError::NonConvergingSchedule { .. } => {}
            other => panic!("Expected NonConvergingSchedule, got {other:?}"),
        }
    }

    #[test]
    fn test_tiny_payment_hits_period_cap() {
        let loan = Loan::flat(None, dec!(1_000_000), start(), dec!(1));
        match generate_schedule(&loan).unwrap_err() {
            LoanPlannerError::NonConvergingSchedule { periods, .. } => assert_eq!(periods, MAX_SCHEDULE_PERIODS),
            other => panic!("Expected NonConvergingSchedule, got {other:?}"),
        }
    }

    #[test]
    fn test_longest_tenure_converges() {
        let loan = Loan::amortizing(None, dec!(100_000), start(), dec!(1), MAX_SCHEDULE_PERIODS);
        let s = generate_schedule(&loan).unwrap();
        assert_eq!(s.period_count(), MAX_SCHEDULE_PERIODS);
        assert_eq!(s.entries.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_tenure_beyond_cap_is_invalid_not_non_converging() {
        let loan = Loan::amortizing(None, dec!(100_000), start(), dec!(1), MAX_SCHEDULE_PERIODS + 1);
        match generate_schedule(&loan).unwrap_err() {
            LoanPlannerError::InvalidLoan { field, .. } => assert_eq!(field, "tenure_months"),
            other => panic!("Expected InvalidLoan, got {other:?}"),
        }
    }

    #[test]
    fn test_installment_overflow_is_an_error() {
        // 10^15 at 10^20 % p.a. cannot be represented
        let loan = Loan::amortizing(None, crate::time_value::MAX_AMOUNT, start(), dec!(100_000_000_000_000_000_000), 1);
        assert!(matches!(
            generate_schedule(&loan).unwrap_err(),
            LoanPlannerError::InvalidLoan { .. }
        ));
    }

    #[test]
    fn test_flexible_segments_override_installment() {
        let mut loan = Loan::flat(None, dec!(1000), start(), dec!(100));
        loan.flexible_schedule = vec![PaymentSegment {
            start_month: 1,
            end_month: 2,
            monthly_payment: dec!(300),
        }];
        let s = generate_schedule(&loan).unwrap();
        // 300 + 300 + 100 * 4 = 1000
        assert_eq!(s.entries.len(), 6);
        assert_eq!(s.entries[0].payment_amount, dec!(300));
        assert_eq!(s.entries[2].payment_amount, dec!(100));
    }

    #[test]
    fn test_payment_holiday_segment() {
        let mut loan = Loan::flat(None, dec!(300), start(), dec!(100));
        loan.flexible_schedule = vec![PaymentSegment {
            start_month: 2,
            end_month: 2,
            monthly_payment: Decimal::ZERO,
        }];
        let s = generate_schedule(&loan).unwrap();
        assert_eq!(s.entries.len(), 4);
        assert_eq!(s.entries[1].payment_amount, Decimal::ZERO);
        assert_eq!(s.entries[1].remaining_balance, dec!(200));
    }

    #[test]
    fn test_balance_as_of() {
        let loan = Loan::flat(None, dec!(3000), start(), dec!(1000));
        let s = generate_schedule(&loan).unwrap();
        let before = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let feb = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(s.balance_as_of(before), dec!(3000));
        assert_eq!(s.percent_paid_as_of(before), Decimal::ZERO);
        assert_eq!(s.balance_as_of(feb), dec!(1000));
        assert_eq!(s.next_period_date(feb), NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(s.is_completed_as_of(later));
        assert_eq!(s.next_period_date(later), None);
    }

    #[test]
    fn test_build_schedule_envelope() {
        let loan = Loan::flat(None, dec!(2500), start(), dec!(1000));
        let out = build_schedule(&loan).unwrap();
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
        assert!(out.warnings.iter().any(|w| w.contains("Final payment")));
        assert!(out.methodology.contains("Flat"));
    }
}
