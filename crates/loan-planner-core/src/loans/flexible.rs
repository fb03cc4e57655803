use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::Loan;
use crate::time_value::{self, MAX_AMOUNT};
use crate::{types::*, LoanPlannerError, LoanPlannerResult};

/// A run of months (1-based, inclusive) paying a fixed amount instead of the
/// loan's regular installment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSegment {
    pub start_month: u32,
    pub end_month: u32,
    pub monthly_payment: Money,
}

impl PaymentSegment {
    /// Months covered; zero for an inverted range.
    pub fn months(&self) -> u32 {
        if self.end_month < self.start_month {
            0
        } else {
            (self.end_month - self.start_month).saturating_add(1)
        }
    }

    pub fn covers(&self, month: u32) -> bool {
        (self.start_month..=self.end_month).contains(&month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexiblePlanTotals {
    /// Last month covered by any segment.
    pub total_months: u32,
    /// Sum of months × payment across segments.
    pub total_scheduled_payment: Money,
}

/// Validate segments and return them sorted by start month.
pub fn normalize_segments(segments: &[PaymentSegment]) -> LoanPlannerResult<Vec<PaymentSegment>> {
    let mut sorted = segments.to_vec();
    sorted.sort_by_key(|s| s.start_month);

    for (i, seg) in sorted.iter().enumerate() {
        if seg.start_month < 1 {
            return Err(LoanPlannerError::InvalidInput {
                field: format!("flexible_schedule[{i}].start_month"),
                reason: "Months are numbered from 1".into(),
            });
        }
        if seg.end_month < seg.start_month {
            return Err(LoanPlannerError::InvalidInput {
                field: format!("flexible_schedule[{i}].end_month"),
                reason: format!("End month {} precedes start month {}", seg.end_month, seg.start_month),
            });
        }
        if seg.monthly_payment < Decimal::ZERO {
            return Err(LoanPlannerError::InvalidInput {
                field: format!("flexible_schedule[{i}].monthly_payment"),
                reason: "Payment cannot be negative".into(),
            });
        }
        if seg.monthly_payment > MAX_AMOUNT {
            return Err(LoanPlannerError::InvalidInput {
                field: format!("flexible_schedule[{i}].monthly_payment"),
                reason: format!("Payment cannot exceed {MAX_AMOUNT}"),
            });
        }
    }

    for pair in sorted.windows(2) {
        if pair[1].start_month <= pair[0].end_month {
            return Err(LoanPlannerError::InvalidInput {
                field: "flexible_schedule".into(),
                reason: format!(
                    "Months {}-{} overlap months {}-{}",
                    pair[1].start_month, pair[1].end_month, pair[0].start_month, pair[0].end_month
                ),
            });
        }
    }

    Ok(sorted)
}

/// Payment for a 1-based month, if a segment covers it.
pub fn payment_for_month(segments: &[PaymentSegment], month: u32) -> Option<Money> {
    segments
        .iter()
        .find(|s| s.covers(month))
        .map(|s| s.monthly_payment)
}

/// Coverage and scheduled amount of a plan, validating it first.
pub fn plan_totals(segments: &[PaymentSegment]) -> LoanPlannerResult<FlexiblePlanTotals> {
    let segments = normalize_segments(segments)?;
    let mut per_segment = Vec::with_capacity(segments.len());
    for seg in &segments {
        let amount = Decimal::from(seg.months())
            .checked_mul(seg.monthly_payment)
            .ok_or_else(|| LoanPlannerError::InvalidInput {
                field: "flexible_schedule".into(),
                reason: format!("Months {}-{} schedule more than the supported range", seg.start_month, seg.end_month),
            })?;
        per_segment.push(amount);
    }

    Ok(FlexiblePlanTotals {
        total_months: segments.iter().map(|s| s.end_month).max().unwrap_or(0),
        total_scheduled_payment: time_value::checked_total("flexible_schedule", per_segment)?,
    })
}

/// Replace a loan's flexible plan after validating it.
pub fn attach_flexible_plan(loan: &Loan, segments: &[PaymentSegment]) -> LoanPlannerResult<Loan> {
    let mut updated = loan.clone();
    updated.flexible_schedule = normalize_segments(segments)?;
    Ok(updated)
}
