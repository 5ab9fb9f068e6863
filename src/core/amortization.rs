use chrono::{Months, NaiveDate};
use serde::Serialize;

/// Hard ceiling for open-ended payoff walks (50 years).
pub const MAX_WALK_MONTHS: u32 = 600;

pub fn monthly_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 100.0 / 12.0
}

/// Level payment that amortizes `principal` over `months` at `rate` per month.
pub fn annuity_payment(principal: f64, rate: f64, months: u32) -> f64 {
    if months == 0 {
        return 0.0;
    }
    if rate == 0.0 {
        return principal / months as f64;
    }
    let growth = (1.0 + rate).powi(months as i32);
    principal * rate * growth / (growth - 1.0)
}

/// Closed-form balance after `months_paid` level payments.
pub fn remaining_balance(principal: f64, rate: f64, payment: f64, months_paid: u32) -> f64 {
    if rate == 0.0 {
        return (principal - payment * months_paid as f64).max(0.0);
    }
    let growth = (1.0 + rate).powi(months_paid as i32);
    principal * growth - payment * (growth - 1.0) / rate
}

pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub month: u32,
    pub date: NaiveDate,
    pub beginning_balance: f64,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub ending_balance: f64,
    pub cumulative_interest: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct PaymentPlan {
    /// Amount paid per month, split evenly across `installments_per_month`.
    pub monthly_payment: f64,
    pub installments_per_month: u32,
    pub max_months: u32,
}

impl PaymentPlan {
    pub fn monthly(monthly_payment: f64, max_months: u32) -> Self {
        Self {
            monthly_payment,
            installments_per_month: 1,
            max_months,
        }
    }

    pub fn biweekly(monthly_payment: f64, max_months: u32) -> Self {
        Self {
            monthly_payment,
            installments_per_month: 2,
            max_months,
        }
    }
}

/// Month-by-month amortization: interest accrues on the running balance,
/// the rest of each installment retires principal. Stops at a zero balance
/// or after `plan.max_months`, whichever comes first. A payment that does
/// not cover interest grows the balance until the cap.
pub fn walk(balance: f64, monthly_rate: f64, plan: PaymentPlan, start: NaiveDate) -> Vec<ScheduleEntry> {
    let installments = plan.installments_per_month.max(1);
    let rate = monthly_rate / installments as f64;
    let installment = plan.monthly_payment / installments as f64;

    let mut schedule = Vec::new();
    let mut current = balance;
    let mut cumulative_interest = 0.0;

    for month in 1..=plan.max_months {
        if current <= 0.0 {
            break;
        }
        let beginning = current;
        let mut month_interest = 0.0;
        let mut month_principal = 0.0;

        for _ in 0..installments {
            if current <= 0.0 {
                break;
            }
            let interest = current * rate;
            let principal = (installment - interest).min(current);
            current -= principal;
            month_interest += interest;
            month_principal += principal;
        }

        cumulative_interest += month_interest;
        schedule.push(ScheduleEntry {
            month,
            date: add_months(start, month - 1),
            beginning_balance: beginning,
            payment: month_principal + month_interest,
            principal: month_principal,
            interest: month_interest,
            ending_balance: current,
            cumulative_interest,
        });
    }

    schedule
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkSummary {
    pub months: u32,
    pub years_to_payoff: f64,
    pub total_interest: f64,
    pub total_paid: f64,
    pub payoff_date: Option<NaiveDate>,
    pub paid_off: bool,
}

pub fn summarize(schedule: &[ScheduleEntry]) -> WalkSummary {
    let months = schedule.len() as u32;
    let last = schedule.last();
    WalkSummary {
        months,
        years_to_payoff: months as f64 / 12.0,
        total_interest: schedule.iter().map(|e| e.interest).sum(),
        total_paid: schedule.iter().map(|e| e.payment).sum(),
        payoff_date: last.map(|e| e.date),
        paid_off: last.is_none_or(|e| e.ending_balance <= 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::{prop_assert, proptest};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
    }

    #[test]
    fn annuity_payment_matches_textbook_value() {
        // 200k over 30 years at 6%: the standard 1199.10 payment.
        let payment = annuity_payment(200_000.0, monthly_rate(6.0), 360);
        assert_relative_eq!(payment, 1199.101050, epsilon = 1e-5);
    }

    #[test]
    fn zero_rate_payment_is_straight_line() {
        assert_relative_eq!(annuity_payment(12_000.0, 0.0, 12), 1000.0);
        assert_eq!(annuity_payment(12_000.0, 0.05, 0), 0.0);
    }

    #[test]
    fn walk_with_exact_payment_retires_loan_on_schedule() {
        let rate = monthly_rate(6.0);
        let payment = annuity_payment(200_000.0, rate, 360);
        let schedule = walk(200_000.0, rate, PaymentPlan::monthly(payment, 360), start());
        let summary = summarize(&schedule);

        assert!(summary.months >= 359 && summary.months <= 360);
        assert!(schedule.last().expect("entries").ending_balance < 1.0);
        assert_relative_eq!(
            summary.total_interest,
            payment * 360.0 - 200_000.0,
            max_relative = 1e-3
        );
        assert_eq!(schedule[0].date, start());
        assert_eq!(
            schedule[12].date,
            NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")
        );
    }

    #[test]
    fn walk_matches_closed_form_balance() {
        let rate = monthly_rate(4.5);
        let payment = annuity_payment(150_000.0, rate, 180);
        let schedule = walk(150_000.0, rate, PaymentPlan::monthly(payment, 60), start());

        assert_eq!(schedule.len(), 60);
        assert_relative_eq!(
            schedule[59].ending_balance,
            remaining_balance(150_000.0, rate, payment, 60),
            max_relative = 1e-9
        );
    }

    #[test]
    fn underpayment_is_capped() {
        let rate = monthly_rate(12.0);
        let schedule = walk(100_000.0, rate, PaymentPlan::monthly(500.0, 24), start());
        let summary = summarize(&schedule);

        assert_eq!(summary.months, 24);
        assert!(!summary.paid_off);
        assert!(schedule[23].ending_balance > 100_000.0);
    }

    #[test]
    fn biweekly_pays_off_sooner_than_monthly() {
        let rate = monthly_rate(6.5);
        let payment = annuity_payment(250_000.0, rate, 360);
        let monthly = summarize(&walk(250_000.0, rate, PaymentPlan::monthly(payment, 600), start()));
        let biweekly = summarize(&walk(250_000.0, rate, PaymentPlan::biweekly(payment, 600), start()));

        assert!(biweekly.total_interest < monthly.total_interest);
        assert!(biweekly.months <= monthly.months);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_cumulative_interest_tracks_entries(
            balance in 1_000u32..900_000,
            rate_bp in 0u32..1500,
            extra in 0u32..3000,
        ) {
            let rate = monthly_rate(rate_bp as f64 / 100.0);
            let payment = annuity_payment(balance as f64, rate, 360) + extra as f64;
            let schedule = walk(balance as f64, rate, PaymentPlan::monthly(payment, 360), start());
            let summary = summarize(&schedule);

            prop_assert!(summary.months <= 360);
            let last = schedule.last().expect("non-empty schedule");
            prop_assert!((last.cumulative_interest - summary.total_interest).abs() < 1e-6);
            prop_assert!(schedule.iter().all(|e| e.principal >= 0.0));
        }
    }
}
