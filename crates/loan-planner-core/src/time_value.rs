use chrono::{Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::LoanPlannerError;
use crate::types::{Money, Percent, Rate};
use crate::LoanPlannerResult;

/// Smallest currency unit, in decimal places.
pub const CURRENCY_DP: u32 = 2;

/// Hard cap on schedule length: 100 years of monthly periods. Also the
/// longest tenure an amortizing loan may have.
pub const MAX_SCHEDULE_PERIODS: u32 = 1200;

/// Largest principal, payment, income or expense amount accepted (10^15).
pub const MAX_AMOUNT: Money = dec!(1_000_000_000_000_000);

const MONTHS_PER_YEAR: Decimal = dec!(12);
const HUNDRED: Decimal = dec!(100);

/// Carry an installment up to the next whole currency unit.
pub fn ceil_currency(amount: Money) -> Money {
    amount.round_dp_with_strategy(CURRENCY_DP, RoundingStrategy::ToPositiveInfinity)
}

/// Round a 0–100 value to two decimal places.
pub fn round_percent(value: Percent) -> Percent {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum of `amounts`, failing instead of overflowing the decimal range.
pub fn checked_total<I>(field: &str, amounts: I) -> LoanPlannerResult<Money>
where
    I: IntoIterator<Item = Money>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| LoanPlannerError::InvalidInput {
            field: field.into(),
            reason: "Total exceeds the supported decimal range".into(),
        })
}

/// `part / whole * 100`, or zero when `whole` is zero.
pub fn percent_of(part: Money, whole: Money) -> Percent {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    round_percent(part / whole * HUNDRED)
}

/// Convert an annual percentage (12 = 12% p.a.) into a monthly fractional rate.
pub fn monthly_rate(annual_interest_rate: Percent) -> Rate {
    annual_interest_rate / HUNDRED / MONTHS_PER_YEAR
}

/// Equated monthly installment, carried up to the next currency unit.
///
/// `principal * r * (1+r)^n / ((1+r)^n - 1)`, degenerating to
/// `principal / n` when the rate is zero.
pub fn emi(principal: Money, annual_interest_rate: Percent, tenure_months: u32) -> LoanPlannerResult<Money> {
    if tenure_months == 0 {
        return Err(LoanPlannerError::InvalidLoan {
            field: "tenure_months".into(),
            reason: "Tenure must be at least one month".into(),
        });
    }
    if tenure_months > MAX_SCHEDULE_PERIODS {
        return Err(LoanPlannerError::InvalidLoan {
            field: "tenure_months".into(),
            reason: format!("Tenure cannot exceed {MAX_SCHEDULE_PERIODS} months"),
        });
    }
    if annual_interest_rate < Decimal::ZERO {
        return Err(LoanPlannerError::InvalidLoan {
            field: "annual_interest_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }

    let n = Decimal::from(tenure_months);
    let r = monthly_rate(annual_interest_rate);

    if r.is_zero() {
        return Ok(ceil_currency(principal / n));
    }

    let factor = (Decimal::ONE + r)
        .checked_powi(i64::from(tenure_months))
        .ok_or_else(|| LoanPlannerError::InvalidLoan {
            field: "tenure_months".into(),
            reason: format!(
                "Compounding {annual_interest_rate}% over {tenure_months} months overflows decimal precision"
            ),
        })?;

    let denom = factor - Decimal::ONE;
    if denom.is_zero() {
        return Err(LoanPlannerError::InvalidLoan {
            field: "annual_interest_rate".into(),
            reason: "Rate is too small to compound over the tenure".into(),
        });
    }

    let installment = principal
        .checked_mul(r)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denom))
        .ok_or_else(|| LoanPlannerError::InvalidLoan {
            field: "annual_interest_rate".into(),
            reason: format!("Installment at {annual_interest_rate}% exceeds the supported decimal range"),
        })?;

    Ok(ceil_currency(installment))
}

/// Number of whole periods needed to clear `balance` at `payment` per period.
pub fn months_to_repay(balance: Money, payment: Money) -> LoanPlannerResult<u32> {
    if balance <= Decimal::ZERO {
        return Ok(0);
    }
    if payment <= Decimal::ZERO {
        return Err(LoanPlannerError::NonConvergingSchedule {
            periods: 0,
            reason: "payment must be positive to reduce the balance".into(),
        });
    }

    let periods = (balance / payment).ceil();
    match periods.to_u32() {
        Some(p) if p <= MAX_SCHEDULE_PERIODS => Ok(p),
        _ => Err(LoanPlannerError::NonConvergingSchedule {
            periods: MAX_SCHEDULE_PERIODS,
            reason: format!("{payment} per month cannot clear {balance} within the period cap"),
        }),
    }
}

/// Date of the period `offset` months after `start`.
///
/// Month-end start dates clamp to the last day of shorter months.
pub fn add_months(start: NaiveDate, offset: u32) -> LoanPlannerResult<NaiveDate> {
    start
        .checked_add_months(Months::new(offset))
        .ok_or_else(|| LoanPlannerError::DateError(format!("{start} + {offset} months is out of range")))
}

/// Display label for a period, e.g. "January 2025".
pub fn period_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}
