use std::fmt::Write;

use crate::core::amortization::{annuity_payment, monthly_rate, remaining_balance};
use crate::core::format::{grouped, money};

use super::types::*;

/// Horizon searched for the break-even year; reported as-is when never reached.
pub const BREAK_EVEN_HORIZON: u32 = 30;
/// Longest comparison the timeline will build, in years.
pub const MAX_ANALYSIS_YEARS: u32 = 50;

const PMI_EQUITY_THRESHOLD: f64 = 0.2;

/// Monthly carrying costs, fixed for the life of the comparison.
#[derive(Debug, Clone, Copy)]
struct Carrying {
    loan_amount: f64,
    rate: f64,
    term_months: u32,
    payment: f64,
    owner_monthly: f64,
    tenant_monthly: f64,
}

impl Carrying {
    fn new(inputs: &RentVsBuyInputs) -> Self {
        let loan_amount = inputs.home_price - inputs.down_payment;
        let rate = monthly_rate(inputs.interest_rate);
        let term_months = (inputs.loan_term * 12.0).round().max(0.0) as u32;
        let payment = annuity_payment(loan_amount, rate, term_months);

        let property_tax = inputs.home_price * inputs.property_tax_rate / 100.0 / 12.0;
        let pmi = if loan_amount > 0.0
            && inputs.down_payment < inputs.home_price * PMI_EQUITY_THRESHOLD
        {
            loan_amount * inputs.pmi_rate / 100.0 / 12.0
        } else {
            0.0
        };
        let owner_monthly = payment
            + property_tax
            + inputs.homeowners_insurance / 12.0
            + pmi
            + inputs.maintenance_cost / 12.0
            + inputs.utilities_home
            + inputs.hoa_fees;

        Self {
            loan_amount,
            rate,
            term_months,
            payment,
            owner_monthly,
            tenant_monthly: inputs.current_rent + inputs.utilities + inputs.renters_insurance,
        }
    }

    /// Loan balance after `months` payments; zero once the term has run out.
    fn balance_after(&self, months: u32) -> f64 {
        if months >= self.term_months {
            return 0.0;
        }
        remaining_balance(self.loan_amount, self.rate, self.payment, months).max(0.0)
    }
}

fn opportunity_cost(inputs: &RentVsBuyInputs, years: u32) -> f64 {
    (inputs.down_payment + inputs.closing_costs)
        * ((1.0 + inputs.investment_return / 100.0).powi(years as i32) - 1.0)
}

/// Year-by-year comparison for `years` years. Rent escalates at the start of
/// each year after the first.
fn timeline(inputs: &RentVsBuyInputs, carrying: &Carrying, years: u32) -> Vec<YearComparison> {
    let mut rows = Vec::with_capacity(years as usize);
    let mut rent = inputs.current_rent;
    let mut rent_cumulative = 0.0;
    let mut mortgage_cumulative = inputs.closing_costs;
    let mortgage_cost = carrying.owner_monthly * 12.0;

    for year in 1..=years {
        let rent_cost = (rent + inputs.utilities + inputs.renters_insurance) * 12.0;
        rent_cumulative += rent_cost;
        mortgage_cumulative += mortgage_cost;

        let home_value =
            inputs.home_price * (1.0 + inputs.home_appreciation / 100.0).powi(year as i32);
        let loan_balance = carrying.balance_after(year * 12);
        let home_equity = (home_value - loan_balance).max(0.0);
        let opportunity_cost = opportunity_cost(inputs, year);

        rows.push(YearComparison {
            year,
            rent_cost,
            mortgage_cost,
            rent_cumulative,
            mortgage_cumulative,
            home_value,
            loan_balance,
            home_equity,
            opportunity_cost,
            net_home_cost: inputs.down_payment + mortgage_cumulative - home_equity
                + opportunity_cost,
        });

        rent *= 1.0 + inputs.rent_increase_rate / 100.0;
    }
    rows
}

/// First year in which owning has cost no more than renting.
pub fn break_even_years(rows: &[YearComparison]) -> u32 {
    rows.iter()
        .take(BREAK_EVEN_HORIZON as usize)
        .find(|row| row.net_home_cost <= row.rent_cumulative)
        .map_or(BREAK_EVEN_HORIZON, |row| row.year)
}

pub fn recommend(total_rent: f64, net_home_cost: f64, break_even: u32, period: u32) -> Verdict {
    let break_even = break_even as f64;
    let period = period as f64;
    if net_home_cost < total_rent * 0.8 && break_even < period * 0.6 {
        Verdict::StronglyBuy
    } else if net_home_cost < total_rent && break_even < period * 0.8 {
        Verdict::ConsiderBuying
    } else if net_home_cost > total_rent * 1.5 || break_even > period * 1.2 {
        Verdict::StronglyRent
    } else if net_home_cost > total_rent * 1.2 || break_even > period {
        Verdict::ConsiderRenting
    } else {
        Verdict::Comparable
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Depth {
    Top,
    Nested,
}

pub fn calculate(inputs: &RentVsBuyInputs) -> RentVsBuyResults {
    evaluate(inputs, Depth::Top)
}

fn evaluate(inputs: &RentVsBuyInputs, depth: Depth) -> RentVsBuyResults {
    let carrying = Carrying::new(inputs);
    let period = inputs.analysis_period.min(MAX_ANALYSIS_YEARS);
    let rows = timeline(inputs, &carrying, period.max(BREAK_EVEN_HORIZON));
    let break_even = break_even_years(&rows);

    let (total_rent_cost, total_mortgage_cost, home_equity, opportunity_cost, net_home_cost) =
        match period.checked_sub(1).and_then(|i| rows.get(i as usize)) {
            Some(last) => (
                last.rent_cumulative,
                last.mortgage_cumulative,
                last.home_equity,
                last.opportunity_cost,
                last.net_home_cost,
            ),
            None => (
                0.0,
                inputs.closing_costs,
                (inputs.home_price - carrying.loan_amount).max(0.0),
                0.0,
                inputs.closing_costs,
            ),
        };

    let recommendation = recommend(total_rent_cost, net_home_cost, break_even, period);
    let sensitivity = match depth {
        Depth::Top => sensitivity(inputs),
        Depth::Nested => Vec::new(),
    };

    let mut results = RentVsBuyResults {
        loan_amount: carrying.loan_amount,
        monthly_mortgage_payment: carrying.payment,
        monthly_rent_cost: carrying.tenant_monthly,
        monthly_mortgage_cost: carrying.owner_monthly,
        monthly_difference: carrying.owner_monthly - carrying.tenant_monthly,
        total_rent_cost,
        total_mortgage_cost,
        home_equity,
        opportunity_cost,
        net_home_cost,
        break_even_years: break_even,
        recommendation,
        yearly_comparison: rows.into_iter().take(period as usize).collect(),
        sensitivity,
        analysis: String::new(),
    };
    results.analysis = analysis(inputs, &results);
    results
}

/// Interest rate and appreciation moved one point either way.
fn sensitivity(inputs: &RentVsBuyInputs) -> Vec<SensitivityPoint> {
    let mut points = Vec::with_capacity(4);
    for change in [-1.0, 1.0] {
        let mut shifted = inputs.clone();
        shifted.interest_rate = (inputs.interest_rate + change).max(0.0);
        points.push(point("interestRate", change, shifted.interest_rate, &shifted));

        let mut shifted = inputs.clone();
        shifted.home_appreciation = inputs.home_appreciation + change;
        points.push(point("homeAppreciation", change, shifted.home_appreciation, &shifted));
    }
    points
}

fn point(variable: &'static str, change: f64, value: f64, inputs: &RentVsBuyInputs) -> SensitivityPoint {
    let nested = evaluate(inputs, Depth::Nested);
    SensitivityPoint {
        variable,
        change,
        value,
        net_home_cost: nested.net_home_cost,
        break_even_years: nested.break_even_years,
        recommendation: nested.recommendation,
    }
}

fn analysis(inputs: &RentVsBuyInputs, r: &RentVsBuyResults) -> String {
    let period = inputs.analysis_period.min(MAX_ANALYSIS_YEARS);
    let mut out = String::new();

    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out, "- **Monthly Rent Cost:** {}", money(r.monthly_rent_cost));
    let _ = writeln!(out, "- **Monthly Ownership Cost:** {}", money(r.monthly_mortgage_cost));
    let _ = writeln!(out, "- **Monthly Difference:** {}\n", money(r.monthly_difference));

    let _ = writeln!(out, "## Total Costs Over {period} Years");
    let _ = writeln!(out, "- **Total Rent Cost:** {}", money(r.total_rent_cost));
    let _ = writeln!(out, "- **Total Ownership Cost:** {}", money(r.total_mortgage_cost));
    let _ = writeln!(out, "- **Home Equity:** {}", money(r.home_equity));
    let _ = writeln!(out, "- **Opportunity Cost:** {}", money(r.opportunity_cost));
    let _ = writeln!(out, "- **Net Home Cost:** {}\n", money(r.net_home_cost));

    let _ = writeln!(out, "## Break-Even Analysis");
    if r.break_even_years <= period {
        let _ = writeln!(out, "- **Break-Even Point:** {} years", r.break_even_years);
        let _ = writeln!(
            out,
            "- **Years of Savings:** {} years",
            period - r.break_even_years
        );
    } else if r.break_even_years < BREAK_EVEN_HORIZON {
        let _ = writeln!(out, "- **Break-Even Point:** {} years, beyond the analysis period", r.break_even_years);
    } else {
        let _ = writeln!(out, "- **Break-Even Point:** not within {BREAK_EVEN_HORIZON} years");
    }

    let difference = r.total_rent_cost - r.net_home_cost;
    let years = period.max(1) as f64;
    let _ = writeln!(out, "\n## Cost Comparison");
    let who = if difference > 0.0 { "Buying" } else { "Renting" };
    let _ = writeln!(
        out,
        "- **{who} saves:** {} over {period} years",
        money(difference.abs())
    );
    let _ = writeln!(out, "- **Annual savings:** {}", money(difference.abs() / years));

    let _ = writeln!(out, "\n## Key Factors");
    let _ = writeln!(out, "- **Home Price:** ${}", grouped(inputs.home_price, 0));
    let down_share = if inputs.home_price > 0.0 {
        inputs.down_payment / inputs.home_price * 100.0
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "- **Down Payment:** ${} ({down_share:.1}%)",
        grouped(inputs.down_payment, 0)
    );
    let _ = writeln!(out, "- **Home Appreciation:** {}% annually", inputs.home_appreciation);
    let _ = writeln!(out, "- **Investment Return:** {}% annually", inputs.investment_return);

    let _ = writeln!(out, "\n## Final Recommendation");
    let _ = writeln!(out, "**{}**\n", r.recommendation.label());
    let closing = if r.recommendation.favours_buying() {
        "Homeownership appears to be financially beneficial based on the analysis above."
    } else if r.recommendation.favours_renting() {
        "Renting appears to be more financially advantageous at this time."
    } else {
        "Both options are financially comparable. Consider non-financial factors."
    };
    let _ = writeln!(out, "{closing}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn inputs() -> RentVsBuyInputs {
        super::super::sample_inputs()
    }

    #[test]
    fn monthly_costs_add_up() {
        let mut i = inputs();
        i.rent_increase_rate = 0.0;
        let r = calculate(&i);

        // Hand calculation: 2000 rent + 150 utilities + 20 insurance.
        assert_approx(r.monthly_rent_cost, 2170.0);
        let payment = annuity_payment(320_000.0, monthly_rate(6.5), 360);
        assert_approx(r.monthly_mortgage_payment, payment);
        // 400 tax + 125 insurance + 333.33 maintenance + 250 utilities on top.
        assert_approx(r.monthly_mortgage_cost, payment + 400.0 + 125.0 + 4000.0 / 12.0 + 250.0);
        assert_approx(r.total_rent_cost, 2170.0 * 120.0);
        assert_approx(r.total_mortgage_cost, r.monthly_mortgage_cost * 120.0 + 12_000.0);
    }

    #[test]
    fn pmi_only_applies_below_twenty_percent_down() {
        let mut i = inputs();
        i.pmi_rate = 0.6;
        let without = calculate(&i);
        assert_approx(without.monthly_mortgage_cost, calculate(&inputs()).monthly_mortgage_cost);

        i.down_payment = 40_000.0;
        i.pmi_rate = 0.0;
        let base = calculate(&i).monthly_mortgage_cost;
        i.pmi_rate = 0.6;
        // Hand calculation: 360000 * 0.6% / 12 = 180.
        assert_approx(calculate(&i).monthly_mortgage_cost - base, 180.0);
    }

    #[test]
    fn equity_follows_the_amortization_schedule() {
        let r = calculate(&inputs());
        let row = &r.yearly_comparison[4];
        assert_eq!(row.year, 5);
        let payment = annuity_payment(320_000.0, monthly_rate(6.5), 360);
        let balance = remaining_balance(320_000.0, monthly_rate(6.5), payment, 60);
        assert_relative_eq!(row.loan_balance, balance, max_relative = 1e-12);
        assert_relative_eq!(row.home_value, 400_000.0 * 1.035f64.powi(5), max_relative = 1e-12);
        assert_approx(row.home_equity, row.home_value - row.loan_balance);
        assert_eq!(r.yearly_comparison.len(), 10);
    }

    #[test]
    fn paid_off_loan_leaves_no_balance() {
        let mut i = inputs();
        i.loan_term = 5.0;
        i.analysis_period = 8;
        let r = calculate(&i);
        assert_eq!(r.yearly_comparison[4].loan_balance, 0.0);
        assert_eq!(r.yearly_comparison[7].loan_balance, 0.0);
    }

    #[test]
    fn expensive_rent_breaks_even_in_the_first_year() {
        let mut i = inputs();
        i.current_rent = 10_000.0;
        let r = calculate(&i);
        assert_eq!(r.break_even_years, 1);
        assert_eq!(r.recommendation, Verdict::StronglyBuy);
    }

    #[test]
    fn cheap_rent_never_breaks_even() {
        let mut i = inputs();
        i.current_rent = 1_000.0;
        let r = calculate(&i);
        assert_eq!(r.break_even_years, BREAK_EVEN_HORIZON);
        assert_eq!(r.recommendation, Verdict::StronglyRent);
        assert!(r.analysis.contains("not within 30 years"));
    }

    #[test]
    fn recommendation_ladder_reaches_every_rung() {
        assert_eq!(recommend(100.0, 70.0, 3, 10), Verdict::StronglyBuy);
        assert_eq!(recommend(100.0, 90.0, 7, 10), Verdict::ConsiderBuying);
        assert_eq!(recommend(100.0, 160.0, 5, 10), Verdict::StronglyRent);
        assert_eq!(recommend(100.0, 100.0, 13, 10), Verdict::StronglyRent);
        assert_eq!(recommend(100.0, 130.0, 5, 10), Verdict::ConsiderRenting);
        assert_eq!(recommend(100.0, 100.0, 11, 10), Verdict::ConsiderRenting);
        assert_eq!(recommend(100.0, 105.0, 9, 10), Verdict::Comparable);
    }

    #[test]
    fn sensitivity_moves_each_driver_once_in_each_direction() {
        let r = calculate(&inputs());
        assert_eq!(r.sensitivity.len(), 4);
        let higher_rate = r
            .sensitivity
            .iter()
            .find(|p| p.variable == "interestRate" && p.change > 0.0)
            .expect("rate up");
        assert_approx(higher_rate.value, 7.5);
        assert!(higher_rate.net_home_cost > r.net_home_cost);

        let faster_growth = r
            .sensitivity
            .iter()
            .find(|p| p.variable == "homeAppreciation" && p.change > 0.0)
            .expect("appreciation up");
        assert!(faster_growth.net_home_cost < r.net_home_cost);
    }

    #[test]
    fn zero_year_horizon_is_degenerate_but_total() {
        let mut i = inputs();
        i.analysis_period = 0;
        let r = calculate(&i);
        assert!(r.yearly_comparison.is_empty());
        assert_approx(r.total_rent_cost, 0.0);
        assert_approx(r.total_mortgage_cost, 12_000.0);
    }

    #[test]
    fn oversized_horizon_is_capped() {
        let mut i = inputs();
        i.analysis_period = 5_000_000;
        let r = calculate(&i);
        assert_eq!(r.yearly_comparison.len(), MAX_ANALYSIS_YEARS as usize);
        i.analysis_period = MAX_ANALYSIS_YEARS;
        let capped = calculate(&i);
        assert_approx(r.total_rent_cost, capped.total_rent_cost);
        assert_approx(r.net_home_cost, capped.net_home_cost);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_break_even_is_the_first_cheaper_year(rent in 500u32..12_000, period in 1u32..40) {
            let mut i = inputs();
            i.current_rent = rent as f64;
            i.analysis_period = period;
            let r = calculate(&i);
            prop_assert_eq!(r.yearly_comparison.len(), period as usize);
            for row in r.yearly_comparison.iter().filter(|row| row.year < r.break_even_years) {
                prop_assert!(row.net_home_cost > row.rent_cumulative);
            }
            if let Some(row) = r.yearly_comparison.get(r.break_even_years as usize - 1) {
                prop_assert!(
                    r.break_even_years == BREAK_EVEN_HORIZON
                        || row.net_home_cost <= row.rent_cumulative
                );
            }
        }

        #[test]
        fn prop_calculation_is_idempotent(rate in 1u32..15, appreciation in 0u32..8) {
            let mut i = inputs();
            i.interest_rate = rate as f64;
            i.home_appreciation = appreciation as f64;
            prop_assert_eq!(calculate(&i), calculate(&i));
        }
    }
}
