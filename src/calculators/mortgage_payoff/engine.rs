use std::fmt::Write;

use chrono::{Datelike, Local, NaiveDate};

use crate::core::amortization::{
    MAX_WALK_MONTHS, PaymentPlan, ScheduleEntry, WalkSummary, monthly_rate, summarize, walk,
};
use crate::core::format::money;

use super::types::*;

fn first_of_current_month() -> NaiveDate {
    let today = Local::now().date_naive();
    today.with_day(1).unwrap_or(today)
}

fn term_months(inputs: &PayoffInputs) -> u32 {
    (inputs.remaining_term * 12.0)
        .round()
        .clamp(0.0, MAX_WALK_MONTHS as f64) as u32
}

/// Schedule for `strategy`, together with the payment it implies. Only the
/// lump-sum and custom plans apply the lump sum up front.
fn strategy_schedule(
    inputs: &PayoffInputs,
    strategy: PayoffStrategy,
    start: NaiveDate,
) -> (Vec<ScheduleEntry>, f64) {
    let rate = monthly_rate(inputs.interest_rate);
    let balance = match strategy {
        PayoffStrategy::LumpSum | PayoffStrategy::Custom => {
            inputs.current_balance - inputs.lump_sum_payment
        }
        _ => inputs.current_balance,
    };
    let payment = inputs.monthly_payment;

    match strategy {
        PayoffStrategy::Standard | PayoffStrategy::LumpSum => (
            walk(balance, rate, PaymentPlan::monthly(payment, term_months(inputs)), start),
            payment,
        ),
        PayoffStrategy::ExtraMonthly | PayoffStrategy::Custom => {
            let boosted = payment + inputs.extra_payment;
            (
                walk(balance, rate, PaymentPlan::monthly(boosted, MAX_WALK_MONTHS), start),
                boosted,
            )
        }
        // Reported payment is the per-installment amount.
        PayoffStrategy::Biweekly => (
            walk(balance, rate, PaymentPlan::biweekly(payment, MAX_WALK_MONTHS), start),
            payment / 2.0,
        ),
    }
}

pub fn cost_benefit(inputs: &PayoffInputs, interest_savings: f64, years_saved: f64) -> f64 {
    let extra_invested = inputs.extra_payment * 12.0 * years_saved + inputs.lump_sum_payment;
    if extra_invested <= 0.0 {
        return 0.0;
    }
    let invested_fv = extra_invested * (1.0 + inputs.investment_return / 100.0).powf(years_saved);
    let real_savings = interest_savings / (1.0 + inputs.inflation_rate / 100.0).powf(years_saved);
    (real_savings + invested_fv) / extra_invested
}

struct Core {
    current: WalkSummary,
    accelerated: WalkSummary,
    schedule: Vec<ScheduleEntry>,
    new_payment: f64,
}

impl Core {
    fn interest_saved(&self) -> f64 {
        self.current.total_interest - self.accelerated.total_interest
    }

    fn years_saved(&self) -> f64 {
        self.current.years_to_payoff - self.accelerated.years_to_payoff
    }
}

fn run(inputs: &PayoffInputs) -> Core {
    let start = inputs.start_date.unwrap_or_else(first_of_current_month);
    let current_schedule = walk(
        inputs.current_balance,
        monthly_rate(inputs.interest_rate),
        PaymentPlan::monthly(inputs.monthly_payment, term_months(inputs)),
        start,
    );
    let (schedule, new_payment) = strategy_schedule(inputs, inputs.payoff_strategy, start);

    Core {
        current: summarize(&current_schedule),
        accelerated: summarize(&schedule),
        schedule,
        new_payment,
    }
}

/// Ranks the applicable strategies by cost-benefit, best first. Each one is
/// a fresh single-level run on a copy of the inputs.
pub fn compare_strategies(inputs: &PayoffInputs) -> Vec<StrategyOutcome> {
    let mut candidates = vec![PayoffStrategy::Standard];
    if inputs.extra_payment > 0.0 {
        candidates.push(PayoffStrategy::ExtraMonthly);
    }
    candidates.push(PayoffStrategy::Biweekly);
    if inputs.lump_sum_payment > 0.0 {
        candidates.push(PayoffStrategy::LumpSum);
    }

    let mut outcomes: Vec<StrategyOutcome> = candidates
        .into_iter()
        .map(|strategy| {
            let variant = PayoffInputs {
                payoff_strategy: strategy,
                ..inputs.clone()
            };
            let core = run(&variant);
            let standard = strategy == PayoffStrategy::Standard;
            StrategyOutcome {
                name: strategy.label(),
                strategy,
                payoff_date: core.accelerated.payoff_date,
                total_interest: core.accelerated.total_interest,
                interest_savings: if standard { 0.0 } else { core.interest_saved() },
                time_saved: if standard { 0.0 } else { core.years_saved() },
                months: core.accelerated.months,
                monthly_payment: core.new_payment,
                cost_benefit: if standard {
                    0.0
                } else {
                    cost_benefit(inputs, core.interest_saved(), core.years_saved())
                },
            }
        })
        .collect();

    outcomes.sort_by(|a, b| b.cost_benefit.total_cmp(&a.cost_benefit));
    outcomes
}

fn cost_benefit_analysis(inputs: &PayoffInputs, total_interest: f64, saved: f64, years: f64) -> String {
    let tax_savings = saved * inputs.tax_rate / 100.0;
    let extra_invested = inputs.extra_payment * 12.0 * years + inputs.lump_sum_payment;
    let invested_fv = extra_invested * (1.0 + inputs.investment_return / 100.0).powf(years);
    let real_savings = saved / (1.0 + inputs.inflation_rate / 100.0).powf(years);

    let mut out = String::from("## Cost-Benefit Analysis\n\n");
    let _ = writeln!(out, "### Interest Savings");
    let _ = writeln!(out, "- **Total Interest Paid:** {}", money(total_interest));
    let _ = writeln!(out, "- **Interest Savings:** {}", money(saved));
    let _ = writeln!(out, "- **Time Saved:** {years:.1} years\n");

    let _ = writeln!(out, "### Tax Implications");
    let _ = writeln!(out, "- **Tax Savings:** {}", money(tax_savings));
    let _ = writeln!(out, "- **After-Tax Savings:** {}\n", money(saved - tax_savings));

    let _ = writeln!(out, "### Opportunity Cost Analysis");
    let _ = writeln!(out, "- **Total Extra Investment:** {}", money(extra_invested));
    let _ = writeln!(out, "- **Investment Return:** {}%", inputs.investment_return);
    let _ = writeln!(out, "- **Future Value if Invested:** {}", money(invested_fv));
    let _ = writeln!(
        out,
        "- **Net Benefit:** {}\n",
        money(saved - tax_savings - extra_invested)
    );

    let _ = writeln!(out, "### Inflation Impact");
    let _ = writeln!(out, "- **Inflation Rate:** {}%", inputs.inflation_rate);
    let _ = writeln!(out, "- **Inflation-Adjusted Savings:** {}", money(real_savings));
    out
}

fn recommendations(inputs: &PayoffInputs, saved: f64, years: f64) -> String {
    let mut out = String::from("## Personalized Recommendations\n\n");
    match inputs.payoff_strategy {
        PayoffStrategy::ExtraMonthly => {
            let share = if inputs.monthly_payment > 0.0 {
                inputs.extra_payment / inputs.monthly_payment * 100.0
            } else {
                0.0
            };
            let _ = writeln!(out, "### Extra Monthly Payment Strategy");
            let _ = writeln!(
                out,
                "- **Recommended:** Add {} to your monthly payment",
                money(inputs.extra_payment)
            );
            let _ = writeln!(out, "- **Benefits:** Save {} in interest", money(saved));
            let _ = writeln!(out, "- **Time Saved:** {years:.1} years");
            let _ = writeln!(out, "- **Monthly Impact:** Increase payment by {share:.1}%\n");
        }
        PayoffStrategy::Biweekly => {
            let _ = writeln!(out, "### Bi-weekly Payment Strategy");
            let _ = writeln!(out, "- **Recommended:** Switch to bi-weekly payments");
            let _ = writeln!(out, "- **Benefits:** Save {} in interest", money(saved));
            let _ = writeln!(out, "- **Time Saved:** {years:.1} years");
            let _ = writeln!(
                out,
                "- **Payment:** ${:.0} every 2 weeks\n",
                inputs.monthly_payment / 2.0
            );
        }
        PayoffStrategy::LumpSum => {
            let share = if inputs.current_balance > 0.0 {
                inputs.lump_sum_payment / inputs.current_balance * 100.0
            } else {
                0.0
            };
            let _ = writeln!(out, "### Lump Sum Payment Strategy");
            let _ = writeln!(
                out,
                "- **Recommended:** Make a {} lump sum payment",
                money(inputs.lump_sum_payment)
            );
            let _ = writeln!(out, "- **Benefits:** Save {} in interest", money(saved));
            let _ = writeln!(out, "- **Time Saved:** {years:.1} years");
            let _ = writeln!(out, "- **One-time Impact:** Reduce principal by {share:.1}%\n");
        }
        PayoffStrategy::Standard | PayoffStrategy::Custom => {}
    }

    let _ = writeln!(out, "### General Recommendations");
    if saved > 10_000.0 {
        let _ = writeln!(out, "- **High Impact:** This strategy will save significant interest");
    } else if saved > 5_000.0 {
        let _ = writeln!(out, "- **Moderate Impact:** This strategy provides good interest savings");
    } else {
        let _ = writeln!(out, "- **Low Impact:** Consider other strategies for better returns");
    }
    if years > 2.0 {
        let _ = writeln!(
            out,
            "- **Time Savings:** You'll pay off your mortgage {years:.1} years early"
        );
    }

    let _ = writeln!(out, "\n### Risk Considerations");
    let _ = writeln!(out, "- **Liquidity:** Ensure you maintain emergency funds");
    let _ = writeln!(
        out,
        "- **Investment Opportunity:** Consider if money could earn more elsewhere"
    );
    let _ = writeln!(out, "- **Tax Implications:** Mortgage interest may be tax-deductible");
    out
}

pub fn calculate(inputs: &PayoffInputs) -> PayoffResults {
    let core = run(inputs);
    let interest_saved = core.interest_saved();
    let years_saved = core.years_saved();

    let strategies = compare_strategies(inputs);
    let best_strategy = strategies.first().cloned();
    let worst_strategy = strategies.last().cloned();

    PayoffResults {
        payoff_date: core.accelerated.payoff_date,
        total_interest: core.accelerated.total_interest,
        interest_saved,
        years_saved,
        months_saved: core.current.months as i64 - core.accelerated.months as i64,
        new_monthly_payment: core.new_payment,
        cost_benefit_analysis: cost_benefit_analysis(
            inputs,
            core.accelerated.total_interest,
            interest_saved,
            years_saved,
        ),
        recommendations: recommendations(inputs, interest_saved, years_saved),
        current_scenario: core.current,
        accelerated_scenario: core.accelerated,
        payoff_schedule: core.schedule,
        strategies,
        best_strategy,
        worst_strategy,
    }
}

#[cfg(test)]
mod tests {
    use super::super::sample_inputs;
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::{prop_assert, proptest};

    fn with_strategy(strategy: PayoffStrategy) -> PayoffInputs {
        PayoffInputs {
            payoff_strategy: strategy,
            ..sample_inputs()
        }
    }

    #[test]
    fn standard_strategy_saves_nothing() {
        let results = calculate(&with_strategy(PayoffStrategy::Standard));
        assert_eq!(results.interest_saved, 0.0);
        assert_eq!(results.years_saved, 0.0);
        assert_eq!(results.months_saved, 0);
        assert_eq!(results.current_scenario, results.accelerated_scenario);
    }

    #[test]
    fn extra_payment_shortens_the_loan() {
        let results = calculate(&with_strategy(PayoffStrategy::ExtraMonthly));

        assert!(results.interest_saved > 10_000.0);
        assert!(results.months_saved > 0);
        assert_relative_eq!(results.new_monthly_payment, 1599.10, epsilon = 0.01);
        assert!(results.recommendations.contains("High Impact"));
        assert!(results.recommendations.contains("Extra Monthly Payment Strategy"));
    }

    #[test]
    fn savings_close_against_both_scenarios() {
        for strategy in [
            PayoffStrategy::ExtraMonthly,
            PayoffStrategy::Biweekly,
            PayoffStrategy::LumpSum,
            PayoffStrategy::Custom,
        ] {
            let results = calculate(&with_strategy(strategy));
            assert_relative_eq!(
                results.current_scenario.total_interest - results.accelerated_scenario.total_interest,
                results.interest_saved
            );
            assert_relative_eq!(
                results.current_scenario.years_to_payoff
                    - results.accelerated_scenario.years_to_payoff,
                results.years_saved
            );
        }
    }

    #[test]
    fn lump_sum_only_reduces_the_accelerated_balance() {
        let results = calculate(&with_strategy(PayoffStrategy::LumpSum));
        let first = results.payoff_schedule.first().expect("schedule");
        assert_relative_eq!(first.beginning_balance, 200_000.0 - 20_000.0);
        assert!(results.interest_saved > 0.0);
    }

    #[test]
    fn biweekly_reports_half_payment_and_true_balances() {
        let results = calculate(&with_strategy(PayoffStrategy::Biweekly));
        assert_relative_eq!(results.new_monthly_payment, 1199.10 / 2.0);
        let schedule = &results.payoff_schedule;
        assert!(schedule.len() > 2);
        assert_relative_eq!(schedule[1].beginning_balance, schedule[0].ending_balance);
    }

    #[test]
    fn strategies_are_ranked_and_bracketed() {
        let results = calculate(&sample_inputs());
        let names: Vec<_> = results.strategies.iter().map(|s| s.strategy).collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&PayoffStrategy::Standard));

        let benefits: Vec<_> = results.strategies.iter().map(|s| s.cost_benefit).collect();
        assert!(benefits.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(results.best_strategy.as_ref(), results.strategies.first());
        assert_eq!(results.worst_strategy.as_ref(), results.strategies.last());
    }

    #[test]
    fn cost_benefit_is_zero_without_extra_money() {
        let mut inputs = sample_inputs();
        inputs.extra_payment = 0.0;
        inputs.lump_sum_payment = 0.0;
        assert_eq!(cost_benefit(&inputs, 5_000.0, 3.0), 0.0);
    }

    #[test]
    fn cost_benefit_matches_hand_calculation() {
        let inputs = sample_inputs();
        // X = 400*12*2 + 20000 = 29600
        // (10000/1.025^2 + 29600*1.07^2) / 29600
        let expected = (10_000.0 / 1.025f64.powi(2) + 29_600.0 * 1.07f64.powi(2)) / 29_600.0;
        assert_relative_eq!(cost_benefit(&inputs, 10_000.0, 2.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn schedule_dates_follow_start_date() {
        let results = calculate(&sample_inputs());
        assert_eq!(
            results.payoff_schedule[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date")
        );
        assert_eq!(results.payoff_date, results.payoff_schedule.last().map(|e| e.date));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_more_extra_never_costs_more_interest(extra in 0u32..2_000, more in 1u32..500) {
            let mut low = with_strategy(PayoffStrategy::ExtraMonthly);
            low.extra_payment = extra as f64;
            let mut high = low.clone();
            high.extra_payment += more as f64;
            let low = calculate(&low);
            let high = calculate(&high);
            prop_assert!(high.total_interest <= low.total_interest + 1e-6);
            prop_assert!(high.accelerated_scenario.months <= low.accelerated_scenario.months);
        }
    }
}
