use std::fmt::Write;

use chrono::{Datelike, Local, NaiveDate};

use crate::core::amortization::{add_months, annuity_payment, monthly_rate};
use crate::core::format::{grouped, money};

use super::types::*;

pub const AUTOMATIC_LTV: f64 = 78.0;
pub const LENDER_LTV: f64 = 80.0;
/// FHA MIP runs at least this many months before it can be dropped.
const FHA_MINIMUM_MONTHS: u32 = 132;
const HORIZON_MONTHS: u32 = 360;
const PROJECTION_YEARS: u32 = 10;

fn ltv(balance: f64, value: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    balance / value * 100.0
}

/// Whole calendar months from `start` to `end`, never negative.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    months.max(0) as u32
}

#[derive(Debug, Clone, Copy)]
struct MonthState {
    balance: f64,
    value: f64,
}

impl MonthState {
    fn ltv(self) -> f64 {
        ltv(self.balance, self.value)
    }
}

/// Month-by-month balance and value, starting after the lump sum and running
/// for the 30-year horizon. Appreciation is added linearly on the current
/// value; principal is the level payment over the remaining term, plus any
/// additional payment.
fn trajectory(inputs: &PmiInputs, remaining_months: u32) -> Vec<MonthState> {
    let rate = monthly_rate(inputs.interest_rate);
    let mut balance = (inputs.current_balance - inputs.lump_sum_payment).max(0.0);
    let payment = annuity_payment(balance, rate, remaining_months);
    let appreciation = inputs.current_home_value * inputs.appreciation_rate / 100.0 / 12.0;
    let mut value = inputs.current_home_value;

    let mut states = Vec::with_capacity(HORIZON_MONTHS as usize + 1);
    states.push(MonthState { balance, value });
    for _ in 0..HORIZON_MONTHS {
        let interest = balance * rate;
        let principal = (payment - interest + inputs.additional_payments)
            .max(0.0)
            .min(balance);
        balance -= principal;
        value += appreciation;
        states.push(MonthState { balance, value });
    }
    states
}

/// Months until the LTV falls to `target`; infinite when it never does within
/// the horizon.
fn months_to(states: &[MonthState], target: f64) -> f64 {
    states
        .iter()
        .position(|s| s.ltv() <= target)
        .map_or(f64::INFINITY, |m| m as f64)
}

struct Cancellation {
    months: f64,
    method: String,
    requirements: String,
}

fn cancellation(
    inputs: &PmiInputs,
    adjusted_ltv: f64,
    months_since_start: u32,
    states: &[MonthState],
) -> Cancellation {
    let accelerated = inputs.additional_payments > 0.0 || inputs.lump_sum_payment > 0.0;
    match inputs.loan_type {
        LoanType::Conventional => {
            let (months, method) = if adjusted_ltv <= LENDER_LTV {
                (0.0, "Immediate (80% LTV reached)")
            } else if accelerated {
                (months_to(states, LENDER_LTV), "Accelerated (additional payments)")
            } else {
                (months_to(states, LENDER_LTV), "Lender request at 80% LTV")
            };
            let mut requirements = if months == 0.0 {
                "Loan-to-value ratio is 80% or less".to_string()
            } else {
                "Loan-to-value ratio must be 80% or less".to_string()
            };
            if inputs.payment_history == PaymentHistory::Poor {
                requirements.push_str(" and good payment history required");
            }
            Cancellation {
                months,
                method: method.to_string(),
                requirements,
            }
        }
        LoanType::Fha => {
            let wait = FHA_MINIMUM_MONTHS.saturating_sub(months_since_start) as f64;
            let months = wait.max(months_to(states, AUTOMATIC_LTV));
            let method = if months == 0.0 {
                "Immediate (FHA requirements met)"
            } else {
                "FHA 11-year rule"
            };
            Cancellation {
                months,
                method: method.to_string(),
                requirements: "FHA loans require 11 years of payments and 78% LTV".to_string(),
            }
        }
        LoanType::Va => {
            let (method, requirements) = if adjusted_ltv <= 90.0 {
                (
                    "VA loan (Reduced funding fee)",
                    "VA loans with 10% down payment have reduced funding fee",
                )
            } else {
                ("VA loan (No PMI)", "VA loans do not require PMI")
            };
            Cancellation {
                months: 0.0,
                method: method.to_string(),
                requirements: requirements.to_string(),
            }
        }
        LoanType::Usda => {
            let (method, requirements) = if adjusted_ltv <= LENDER_LTV {
                (
                    "USDA loan (Reduced guarantee fee)",
                    "USDA loans with 20% equity have reduced guarantee fee",
                )
            } else {
                (
                    "USDA loan (Guarantee fee)",
                    "USDA loans have annual guarantee fee instead of PMI",
                )
            };
            Cancellation {
                months: 0.0,
                method: method.to_string(),
                requirements: requirements.to_string(),
            }
        }
    }
}

fn threshold_scenario(
    target_ltv: f64,
    months: f64,
    monthly_pmi: f64,
    remaining_months: f64,
    with_probability: bool,
) -> ThresholdScenario {
    let paid_months = months.min(remaining_months);
    let total_pmi_paid = monthly_pmi * paid_months;
    let total_savings = monthly_pmi * (remaining_months - paid_months).max(0.0);
    ThresholdScenario {
        target_ltv,
        months_to_cancellation: months,
        total_pmi_paid,
        total_savings,
        net_benefit: total_savings - total_pmi_paid,
        success_probability: with_probability.then_some(if months < 12.0 {
            90
        } else if months < 24.0 {
            75
        } else {
            60
        }),
    }
}

pub fn break_even_months(cost: f64, monthly_pmi: f64) -> f64 {
    if monthly_pmi <= 0.0 {
        return f64::INFINITY;
    }
    (cost / monthly_pmi).ceil()
}

pub fn recommend(current_ltv: f64, break_even: f64) -> RecommendedAction {
    if current_ltv <= AUTOMATIC_LTV {
        RecommendedAction::CancelNow
    } else if current_ltv <= LENDER_LTV + 2.0 {
        RecommendedAction::RequestLenderCancellation
    } else if break_even <= 24.0 {
        RecommendedAction::CancelNow
    } else if current_ltv > AUTOMATIC_LTV + 10.0 {
        RecommendedAction::WaitForAutomatic
    } else {
        RecommendedAction::RequestLenderCancellation
    }
}

pub fn confidence(current_ltv: f64) -> Confidence {
    if current_ltv < AUTOMATIC_LTV {
        Confidence::High
    } else if current_ltv < LENDER_LTV {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn projection(states: &[MonthState]) -> Vec<LtvPoint> {
    (0..=PROJECTION_YEARS)
        .filter_map(|year| {
            let state = states.get((year * 12) as usize)?;
            Some(LtvPoint {
                year,
                loan_balance: state.balance,
                home_value: state.value,
                ltv: state.ltv(),
            })
        })
        .collect()
}

pub fn calculate(inputs: &PmiInputs) -> PmiResults {
    let as_of = inputs
        .as_of_date
        .unwrap_or_else(|| Local::now().date_naive());
    let months_since_start = inputs
        .loan_start_date
        .map_or(0, |start| months_between(start, as_of));
    let term_months = (inputs.loan_term * 12.0).round().max(0.0) as u32;
    let remaining = term_months.saturating_sub(months_since_start);

    let current_ltv = ltv(inputs.current_balance, inputs.current_home_value);
    let original_ltv = ltv(inputs.original_loan_amount, inputs.original_home_value);
    let adjusted_ltv = ltv(
        (inputs.current_balance - inputs.lump_sum_payment).max(0.0),
        inputs.current_home_value,
    );
    let current_pmi = inputs.current_balance * inputs.pmi_rate / 100.0 / 12.0;
    let equity_gain =
        inputs.current_home_value - inputs.original_home_value + inputs.down_payment;
    let equity_percentage = if inputs.current_home_value > 0.0 {
        (inputs.current_home_value - inputs.current_balance) / inputs.current_home_value * 100.0
    } else {
        0.0
    };

    let states = trajectory(inputs, remaining);
    let plan = cancellation(inputs, adjusted_ltv, months_since_start, &states);
    let pmi_cancellation_date = plan
        .months
        .is_finite()
        .then(|| add_months(as_of, plan.months as u32));

    let remaining = remaining as f64;
    let automatic_scenario = threshold_scenario(
        AUTOMATIC_LTV,
        months_to(&states, AUTOMATIC_LTV),
        current_pmi,
        remaining,
        false,
    );
    let lender_scenario = threshold_scenario(
        LENDER_LTV,
        months_to(&states, LENDER_LTV),
        current_pmi,
        remaining,
        true,
    );
    let total_cancellation_cost = inputs.appraisal_fee + inputs.title_search_fee + inputs.other_fees;
    let break_even = break_even_months(total_cancellation_cost, current_pmi);
    let immediate_scenario = ImmediateScenario {
        total_cost: total_cancellation_cost,
        monthly_savings: current_pmi,
        break_even_months: break_even,
        net_benefit: current_pmi * remaining - total_cancellation_cost,
    };

    let tax_share = (inputs.marginal_tax_rate + inputs.state_tax_rate) / 100.0;
    let mut results = PmiResults {
        current_ltv,
        original_ltv,
        adjusted_ltv,
        current_pmi,
        annual_pmi_savings: current_pmi * 12.0,
        total_pmi_savings: current_pmi
            * automatic_scenario.months_to_cancellation.min(remaining),
        after_tax_monthly_savings: current_pmi * (1.0 - tax_share),
        new_monthly_payment: inputs.monthly_payment - current_pmi,
        equity_gain,
        equity_percentage,
        months_since_start,
        months_to_cancellation: plan.months,
        pmi_cancellation_date,
        cancellation_method: plan.method,
        requirements: plan.requirements,
        ltv_projection: projection(&states),
        total_cancellation_cost,
        break_even_months: break_even,
        automatic_scenario,
        lender_scenario,
        immediate_scenario,
        recommended_action: recommend(current_ltv, break_even),
        confidence_level: confidence(current_ltv),
        analysis: String::new(),
    };
    results.analysis = analysis(inputs, &results);
    results
}

fn analysis(inputs: &PmiInputs, r: &PmiResults) -> String {
    let mut out = String::new();
    let equity = inputs.current_home_value - inputs.current_balance;

    let _ = writeln!(out, "## Current Status");
    let _ = writeln!(out, "- **Current LTV:** {:.1}%", r.current_ltv);
    let _ = writeln!(out, "- **Original LTV:** {:.1}%", r.original_ltv);
    let _ = writeln!(out, "- **Current PMI:** {}/month", money(r.current_pmi));
    let _ = writeln!(out, "- **Annual PMI Cost:** {}", money(r.annual_pmi_savings));
    let _ = writeln!(
        out,
        "- **Current Equity:** ${} ({:.1}%)",
        grouped(equity, 0),
        r.equity_percentage
    );
    let _ = writeln!(out, "- **Equity Gain:** ${}\n", grouped(r.equity_gain, 0));

    let _ = writeln!(out, "## Cancellation Timeline");
    let _ = writeln!(out, "- **Cancellation Method:** {}", r.cancellation_method);
    match r.pmi_cancellation_date {
        Some(date) => {
            let _ = writeln!(out, "- **Months to Cancellation:** {}", r.months_to_cancellation);
            let _ = writeln!(out, "- **Cancellation Date:** {date}");
        }
        None => {
            let _ = writeln!(
                out,
                "- **Months to Cancellation:** not reached within {} years",
                HORIZON_MONTHS / 12
            );
        }
    }
    let _ = writeln!(out, "- **Requirements:** {}\n", r.requirements);

    let _ = writeln!(out, "## Savings Analysis");
    let _ = writeln!(out, "- **Annual Savings:** {}", money(r.annual_pmi_savings));
    let _ = writeln!(out, "- **Total Savings:** {}", money(r.total_pmi_savings));
    let _ = writeln!(out, "- **New Monthly Payment:** {}", money(r.new_monthly_payment));
    let _ = writeln!(out, "- **After-Tax Monthly Savings:** {}\n", money(r.after_tax_monthly_savings));

    let _ = writeln!(out, "## Recommendations");
    if r.months_to_cancellation == 0.0 {
        let _ = writeln!(out, "- Contact your lender to cancel PMI");
        let _ = writeln!(out, "- Prepare home value documentation");
    } else if r.months_to_cancellation <= 12.0 {
        let _ = writeln!(out, "- PMI cancellation is within 1 year");
        let _ = writeln!(out, "- Consider additional payments to accelerate cancellation");
    } else if r.months_to_cancellation.is_finite() {
        let _ = writeln!(
            out,
            "- PMI cancellation is {} months away",
            r.months_to_cancellation
        );
        let _ = writeln!(out, "- Consider refinancing if rates are favorable");
    } else {
        let _ = writeln!(out, "- The current payment does not reduce the loan fast enough to drop PMI");
    }

    if inputs.additional_payments > 0.0 || inputs.lump_sum_payment > 0.0 {
        let _ = writeln!(out, "\n## Additional Payment Impact");
        if inputs.additional_payments > 0.0 {
            let _ = writeln!(out, "- **Monthly Additional:** {}", money(inputs.additional_payments));
        }
        if inputs.lump_sum_payment > 0.0 {
            let _ = writeln!(out, "- **Lump Sum Payment:** {}", money(inputs.lump_sum_payment));
            let _ = writeln!(out, "- **LTV After Lump Sum:** {:.1}%", r.adjusted_ltv);
        }
    }

    let _ = writeln!(out, "\n## Property Considerations");
    let _ = writeln!(out, "- **Property Type:** {}", inputs.property_type.label());
    let _ = writeln!(out, "- **Home Value:** ${}", grouped(inputs.current_home_value, 0));
    let equity_note = if r.equity_percentage >= 20.0 {
        "Strong equity: 20%+ provides financial flexibility"
    } else if r.equity_percentage >= 10.0 {
        "Good equity: building steadily"
    } else {
        "Limited equity: consider strategies to build equity faster"
    };
    let _ = writeln!(out, "- {equity_note}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn inputs() -> PmiInputs {
        super::super::sample_inputs()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn ratios_and_pmi_follow_the_balance() {
        let r = calculate(&inputs());
        // Hand calculation: 330000 / 400000 and 356250 / 375000.
        assert_approx(r.current_ltv, 82.5);
        assert_approx(r.original_ltv, 95.0);
        // 330000 * 0.55% / 12.
        assert_approx(r.current_pmi, 151.25);
        assert_approx(r.annual_pmi_savings, 1815.0);
        assert_approx(r.new_monthly_payment, 2400.0 - 151.25);
        assert_approx(r.equity_gain, 400_000.0 - 375_000.0 + 18_750.0);
        assert_approx(r.equity_percentage, 17.5);
        assert_eq!(r.months_since_start, 36);
    }

    #[test]
    fn conventional_loan_waits_for_eighty_percent() {
        let r = calculate(&inputs());
        assert_eq!(r.months_to_cancellation, 9.0);
        assert_eq!(r.cancellation_method, "Lender request at 80% LTV");
        assert_eq!(r.pmi_cancellation_date, Some(date(2025, 3, 1)));
        assert_eq!(r.lender_scenario.months_to_cancellation, 9.0);
        assert_eq!(r.automatic_scenario.months_to_cancellation, 16.0);
        assert_approx(r.total_pmi_savings, 151.25 * 16.0);
        assert_eq!(r.lender_scenario.success_probability, Some(90));
        assert_eq!(r.automatic_scenario.success_probability, None);
        // 82.5% is past the lender window, but a five-month payback on the
        // appraisal still makes an immediate request worthwhile.
        assert_eq!(r.recommended_action, RecommendedAction::CancelNow);
        assert_eq!(r.confidence_level, Confidence::Low);
    }

    #[test]
    fn lump_sum_that_reaches_eighty_percent_cancels_immediately() {
        let mut i = inputs();
        i.lump_sum_payment = 10_000.0;
        let r = calculate(&i);
        assert_approx(r.adjusted_ltv, 80.0);
        assert_eq!(r.months_to_cancellation, 0.0);
        assert_eq!(r.cancellation_method, "Immediate (80% LTV reached)");
        assert_eq!(r.pmi_cancellation_date, Some(date(2024, 6, 1)));
    }

    #[test]
    fn extra_payments_shorten_the_wait() {
        let mut i = inputs();
        i.additional_payments = 500.0;
        let r = calculate(&i);
        assert!(r.months_to_cancellation < 9.0);
        assert_eq!(r.cancellation_method, "Accelerated (additional payments)");
    }

    #[test]
    fn poor_history_adds_a_requirement() {
        let mut i = inputs();
        i.payment_history = PaymentHistory::Poor;
        let r = calculate(&i);
        assert!(r.requirements.ends_with("and good payment history required"));
    }

    #[test]
    fn fha_needs_eleven_years_of_payments() {
        let mut i = inputs();
        i.loan_type = LoanType::Fha;
        let r = calculate(&i);
        // 132 months minimum, 36 already paid.
        assert_eq!(r.months_to_cancellation, 96.0);
        assert_eq!(r.cancellation_method, "FHA 11-year rule");
    }

    #[test]
    fn stalled_loan_never_reaches_the_threshold() {
        let mut i = inputs();
        i.interest_rate = 0.0;
        i.appreciation_rate = 0.0;
        i.loan_term = 3.0;
        let r = calculate(&i);
        assert!(r.months_to_cancellation.is_infinite());
        assert_eq!(r.pmi_cancellation_date, None);
        assert!(r.analysis.contains("does not reduce the loan fast enough"));
    }

    #[test]
    fn cancellation_costs_break_even_on_monthly_pmi() {
        let r = calculate(&inputs());
        assert_approx(r.total_cancellation_cost, 750.0);
        // Hand calculation: ceil(750 / 151.25) = 5.
        assert_eq!(r.break_even_months, 5.0);
        assert_approx(r.immediate_scenario.net_benefit, 151.25 * 324.0 - 750.0);
        assert!(break_even_months(750.0, 0.0).is_infinite());
    }

    #[test]
    fn after_tax_savings_apply_combined_rates() {
        let mut i = inputs();
        i.marginal_tax_rate = 22.0;
        i.state_tax_rate = 5.0;
        let r = calculate(&i);
        assert_relative_eq!(r.after_tax_monthly_savings, 151.25 * 0.73, max_relative = 1e-12);
    }

    #[test]
    fn projection_samples_each_year() {
        let r = calculate(&inputs());
        assert_eq!(r.ltv_projection.len(), 11);
        assert_approx(r.ltv_projection[0].ltv, 82.5);
        assert!(
            r.ltv_projection
                .windows(2)
                .all(|w| w[1].ltv < w[0].ltv)
        );
        // Linear appreciation: 400000 * 3% per year.
        assert_approx(r.ltv_projection[1].home_value, 412_000.0);
    }

    #[test]
    fn recommendation_ladder() {
        assert_eq!(recommend(77.0, 100.0), RecommendedAction::CancelNow);
        assert_eq!(recommend(81.5, 100.0), RecommendedAction::RequestLenderCancellation);
        assert_eq!(recommend(85.0, 10.0), RecommendedAction::CancelNow);
        assert_eq!(recommend(90.0, 30.0), RecommendedAction::WaitForAutomatic);
        assert_eq!(recommend(85.0, 30.0), RecommendedAction::RequestLenderCancellation);
        assert_eq!(confidence(77.9), Confidence::High);
        assert_eq!(confidence(79.0), Confidence::Medium);
        assert_eq!(confidence(80.0), Confidence::Low);
    }

    #[test]
    fn months_between_counts_calendar_months() {
        assert_eq!(months_between(date(2021, 6, 15), date(2024, 6, 1)), 36);
        assert_eq!(months_between(date(2024, 6, 1), date(2021, 6, 1)), 0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_more_extra_never_delays_cancellation(a in 0u32..2_000, b in 0u32..2_000) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let mut i = inputs();
            i.additional_payments = low as f64;
            let slow = calculate(&i).lender_scenario.months_to_cancellation;
            i.additional_payments = high as f64;
            let fast = calculate(&i).lender_scenario.months_to_cancellation;
            prop_assert!(fast <= slow);
        }
    }
}
