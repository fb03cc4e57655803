use chrono::NaiveDate;
use loan_planner_core::loans::schedule::{generate_schedule, Schedule};
use loan_planner_core::loans::{Loan, LoanTerms};
use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
use rust_decimal::Decimal;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn cents(value: u64) -> Decimal {
    Decimal::new(value as i64, 2)
}

fn assert_schedule_invariants(schedule: &Schedule) -> Result<(), proptest::test_runner::TestCaseError> {
    let last = schedule.entries.last().expect("schedule has entries");
    prop_assert_eq!(last.remaining_balance, Decimal::ZERO);
    prop_assert_eq!(last.percent_paid, Decimal::ONE_HUNDRED);

    for pair in schedule.entries.windows(2) {
        prop_assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
        prop_assert!(pair[1].percent_paid >= pair[0].percent_paid);
        prop_assert_eq!(pair[1].period_index, pair[0].period_index + 1);
    }
    for entry in &schedule.entries {
        prop_assert!(entry.remaining_balance >= Decimal::ZERO);
        prop_assert!(entry.percent_paid >= Decimal::ZERO && entry.percent_paid <= Decimal::ONE_HUNDRED);
    }

    prop_assert_eq!(schedule.total_paid(), schedule.total_amount);
    Ok(())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn prop_flat_schedule_converges_and_conserves(
        principal_cents in 100u64..50_000_000,
        periods_hint in 1u64..600,
    ) {
        let principal = cents(principal_cents);
        // Payment sized so the schedule stays within the period cap.
        let payment = cents((principal_cents / periods_hint).max(1));
        let loan = Loan::flat(None, principal, start(), payment);

        let schedule = generate_schedule(&loan).unwrap();
        assert_schedule_invariants(&schedule)?;
        prop_assert_eq!(schedule.total_amount, principal);
    }

    #[test]
    fn prop_amortizing_schedule_converges_and_conserves(
        principal_cents in 10_000u64..100_000_000,
        rate_bp in 0u32..3_000,
        tenure in 1u32..480,
    ) {
        let rate = Decimal::new(i64::from(rate_bp), 2);
        let loan = Loan::amortizing(None, cents(principal_cents), start(), rate, tenure);

        let schedule = generate_schedule(&loan).unwrap();
        assert_schedule_invariants(&schedule)?;
        prop_assert!(schedule.period_count() <= tenure);
        if rate_bp > 0 {
            prop_assert_eq!(schedule.period_count(), tenure);
            prop_assert!(schedule.total_amount >= loan.principal);
        }
    }

    #[test]
    fn prop_zero_rate_equals_flat_division(
        principal_cents in 100u64..10_000_000,
        tenure in 1u32..360,
    ) {
        let principal = cents(principal_cents);
        let amortizing = Loan::amortizing(None, principal, start(), Decimal::ZERO, tenure);
        let mut flat = amortizing.clone();
        flat.terms = LoanTerms::Flat {
            monthly_payment: principal / Decimal::from(tenure),
        };

        let a = generate_schedule(&amortizing).unwrap();
        let f = generate_schedule(&flat).unwrap();
        prop_assert_eq!(a.entries, f.entries);
        prop_assert_eq!(a.monthly_payment, f.monthly_payment);
    }
}
