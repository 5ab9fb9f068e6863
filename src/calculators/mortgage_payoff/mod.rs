mod engine;
pub mod types;

use std::fmt::Write;

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::core::format::money;
use crate::core::{
    CalcError, Calculator, Example, FieldKind, InputField, Meta, OutputField, Registration, Rule,
};

pub use engine::{calculate, compare_strategies, cost_benefit};
pub use types::{PayoffInputs, PayoffResults, PayoffStrategy};

pub struct MortgagePayoff;

const STRATEGIES: &[&str] = &["standard", "extra-monthly", "biweekly", "lump-sum", "custom"];

pub fn registration() -> Registration {
    Registration::of::<MortgagePayoff>()
}

impl Calculator for MortgagePayoff {
    type Input = PayoffInputs;
    type Output = PayoffResults;

    fn meta() -> Meta {
        Meta {
            id: "mortgage-payoff",
            title: "Mortgage Payoff Calculator",
            category: "finance",
            subcategory: "mortgage",
            description: "Compares the current amortization with extra, bi-weekly and lump-sum \
                          payoff plans",
        }
    }

    fn inputs() -> Vec<InputField> {
        vec![
            InputField::currency("currentBalance", "Current Balance")
                .required()
                .range(1.0, 10_000_000.0),
            InputField::percentage("interestRate", "Interest Rate")
                .required()
                .range(0.0, 30.0),
            InputField::number("remainingTerm", "Remaining Term (years)")
                .required()
                .range(1.0, 50.0),
            InputField::currency("monthlyPayment", "Monthly Payment (P&I)")
                .required()
                .range(1.0, 100_000.0),
            InputField::currency("extraPayment", "Extra Monthly Payment").default_value(0),
            InputField::currency("lumpSumPayment", "Lump Sum Payment").default_value(0),
            InputField::select("payoffStrategy", "Payoff Strategy", STRATEGIES)
                .required()
                .default_value("standard"),
            InputField::date("startDate", "Schedule Start Date"),
            InputField::currency("propertyValue", "Property Value"),
            InputField::percentage("taxRate", "Marginal Tax Rate").default_value(22),
            InputField::percentage("investmentReturn", "Alternative Investment Return")
                .default_value(7),
            InputField::percentage("inflationRate", "Inflation Rate").default_value(2.5),
        ]
    }

    fn outputs() -> Vec<OutputField> {
        vec![
            OutputField::new("payoffDate", "Payoff Date", FieldKind::Date),
            OutputField::new("totalInterest", "Total Interest", FieldKind::Currency),
            OutputField::new("interestSaved", "Interest Saved", FieldKind::Currency),
            OutputField::new("yearsSaved", "Years Saved", FieldKind::Number),
            OutputField::new("newMonthlyPayment", "New Payment", FieldKind::Currency),
            OutputField::new("payoffSchedule", "Payoff Schedule", FieldKind::List),
            OutputField::new("strategies", "Strategy Comparison", FieldKind::List),
        ]
    }

    fn rules() -> Vec<Rule> {
        vec![
            Rule::required("currentBalance", "Current balance is required"),
            Rule::range(
                "currentBalance",
                1.0,
                10_000_000.0,
                "Current balance must be between $1 and $10,000,000",
            ),
            Rule::required("interestRate", "Interest rate is required"),
            Rule::range("interestRate", 0.0, 30.0, "Interest rate must be between 0% and 30%"),
            Rule::required("remainingTerm", "Remaining term is required"),
            Rule::range(
                "remainingTerm",
                1.0,
                50.0,
                "Remaining term must be between 1 and 50 years",
            ),
            Rule::required("monthlyPayment", "Monthly payment is required"),
            Rule::range(
                "monthlyPayment",
                1.0,
                100_000.0,
                "Monthly payment must be between $1 and $100,000",
            ),
            Rule::cross(
                "monthlyPayment",
                "Monthly payment does not cover the monthly interest",
                |f| match (
                    f.number("monthlyPayment"),
                    f.number("currentBalance"),
                    f.number("interestRate"),
                ) {
                    (Some(payment), Some(balance), Some(rate)) => {
                        payment > balance * rate / 100.0 / 12.0
                    }
                    _ => true,
                },
            )
            .warning(),
            Rule::range(
                "extraPayment",
                0.0,
                100_000.0,
                "Extra payment must be between $0 and $100,000",
            ),
            Rule::range(
                "lumpSumPayment",
                0.0,
                10_000_000.0,
                "Lump sum payment must be between $0 and $10,000,000",
            ),
            Rule::cross(
                "lumpSumPayment",
                "Lump sum payment cannot exceed the current balance",
                |f| match (f.number("lumpSumPayment"), f.number("currentBalance")) {
                    (Some(lump), Some(balance)) => lump <= balance,
                    _ => true,
                },
            ),
            Rule::required("payoffStrategy", "Payoff strategy is required"),
            Rule::one_of(
                "payoffStrategy",
                STRATEGIES,
                "Payoff strategy must be standard, extra-monthly, biweekly, lump-sum, or custom",
            ),
            Rule::cross(
                "extraPayment",
                "Extra monthly strategy needs an extra payment amount",
                |f| {
                    f.text("payoffStrategy") != Some("extra-monthly")
                        || f.number("extraPayment").is_some_and(|x| x > 0.0)
                },
            )
            .warning(),
            Rule::cross(
                "lumpSumPayment",
                "Lump sum strategy needs a lump sum amount",
                |f| {
                    f.text("payoffStrategy") != Some("lump-sum")
                        || f.number("lumpSumPayment").is_some_and(|x| x > 0.0)
                },
            )
            .warning(),
            Rule::range("taxRate", 0.0, 60.0, "Tax rate must be between 0% and 60%"),
            Rule::range(
                "investmentReturn",
                -50.0,
                50.0,
                "Investment return must be between -50% and 50%",
            ),
            Rule::range("inflationRate", -10.0, 30.0, "Inflation rate must be between -10% and 30%"),
            Rule::cross(
                "startDate",
                "Start date must be a valid YYYY-MM-DD date",
                |f| {
                    f.get("startDate").is_none()
                        || f.text("startDate").is_some_and(|s| {
                            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok()
                        })
                },
            ),
        ]
    }

    fn calculate(input: &PayoffInputs) -> Result<PayoffResults, CalcError> {
        Ok(engine::calculate(input))
    }

    fn report(input: &PayoffInputs, output: &PayoffResults) -> String {
        let mut out = String::from("# Mortgage Payoff Analysis\n\n");
        let current = &output.current_scenario;
        let accelerated = &output.accelerated_scenario;
        let date = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "n/a".to_string())
        };

        let _ = writeln!(out, "## Summary");
        let _ = writeln!(out, "- **Strategy:** {}", input.payoff_strategy.label());
        let _ = writeln!(out, "- **Current Balance:** {}", money(input.current_balance));
        let _ = writeln!(
            out,
            "- **Current Plan:** {} months, {} interest, payoff {}",
            current.months,
            money(current.total_interest),
            date(current.payoff_date)
        );
        let _ = writeln!(
            out,
            "- **Accelerated Plan:** {} months, {} interest, payoff {}",
            accelerated.months,
            money(accelerated.total_interest),
            date(accelerated.payoff_date)
        );
        if !accelerated.paid_off {
            let _ = writeln!(
                out,
                "- **Note:** the payment does not retire the balance within the schedule horizon"
            );
        }
        let _ = writeln!(out, "- **Interest Saved:** {}", money(output.interest_saved));
        let _ = writeln!(out, "- **Years Saved:** {:.1}\n", output.years_saved);

        let _ = writeln!(out, "## Strategy Comparison");
        for s in &output.strategies {
            let _ = writeln!(
                out,
                "- **{}**: {} interest, {} saved, {:.1} years sooner, cost-benefit {:.2}",
                s.name,
                money(s.total_interest),
                money(s.interest_savings),
                s.time_saved,
                s.cost_benefit
            );
        }
        out.push('\n');
        out.push_str(&output.cost_benefit_analysis);
        out.push('\n');
        out.push_str(&output.recommendations);
        out
    }

    fn examples() -> Vec<Example> {
        vec![
            Example {
                title: "Extra $400 a month",
                description: "200k at 6% with 30 years left, adding 400 per month",
                inputs: extra_monthly(),
            },
            Example {
                title: "Bonus lump sum",
                description: "Apply a 25k bonus to a 310k balance at 7.25%",
                inputs: json!({
                    "currentBalance": 310000,
                    "interestRate": 7.25,
                    "remainingTerm": 27,
                    "monthlyPayment": 2180,
                    "extraPayment": 0,
                    "lumpSumPayment": 25000,
                    "payoffStrategy": "lump-sum",
                    "startDate": "2025-03-01"
                }),
            },
        ]
    }
}

fn extra_monthly() -> Value {
    json!({
        "currentBalance": 200000,
        "interestRate": 6,
        "remainingTerm": 30,
        "monthlyPayment": 1199.10,
        "extraPayment": 400,
        "lumpSumPayment": 20000,
        "payoffStrategy": "extra-monthly",
        "startDate": "2024-01-01",
        "taxRate": 22,
        "investmentReturn": 7,
        "inflationRate": 2.5
    })
}

#[cfg(test)]
pub(crate) fn sample_inputs() -> PayoffInputs {
    serde_json::from_value(extra_monthly()).expect("fixture decodes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InputMap;

    fn fixture_map() -> InputMap {
        extra_monthly().as_object().cloned().expect("object fixture")
    }

    #[test]
    fn defaults_apply_when_optional_rates_are_missing() {
        let inputs: PayoffInputs = serde_json::from_value(json!({
            "currentBalance": 1000, "interestRate": 5, "remainingTerm": 1,
            "monthlyPayment": 100, "payoffStrategy": "standard"
        }))
        .expect("decodes");
        assert_eq!(inputs.tax_rate, 22.0);
        assert_eq!(inputs.investment_return, 7.0);
        assert_eq!(inputs.inflation_rate, 2.5);
        assert!(inputs.start_date.is_none());
    }

    #[test]
    fn lump_sum_larger_than_balance_is_rejected() {
        let mut inputs = fixture_map();
        inputs.insert("lumpSumPayment".into(), json!(250000));
        let result = registration().validate(&inputs, None);
        assert!(!result.is_valid);
        assert!(result.mentions("Lump sum payment cannot exceed the current balance"));
    }

    #[test]
    fn malformed_start_date_fails_validation() {
        let mut inputs = fixture_map();
        inputs.insert("startDate".into(), json!("2024-13-40"));
        let result = registration().validate(&inputs, None);
        assert!(!result.is_valid);
        assert!(result.mentions("Start date must be a valid YYYY-MM-DD date"));

        let check = registration().quick_validate("startDate", &json!("2025-02-01"), &inputs);
        assert!(check.is_valid);
    }

    #[test]
    fn interest_only_shortfall_is_a_warning() {
        let mut inputs = fixture_map();
        inputs.insert("monthlyPayment".into(), json!(900));
        let result = registration().validate(&inputs, None);
        assert!(result.is_valid);
        assert!(result.mentions("Monthly payment does not cover the monthly interest"));
    }

    #[test]
    fn unknown_strategy_is_reported_by_validation_and_rejected_by_decoding() {
        let mut inputs = fixture_map();
        inputs.insert("payoffStrategy".into(), json!("weekly"));
        assert!(!registration().validate(&inputs, None).is_valid);
        assert!(matches!(
            registration().calculate(&inputs),
            Err(CalcError::InvalidInput(_))
        ));
    }

    #[test]
    fn report_lists_every_strategy() {
        let response = registration().calculate(&fixture_map()).expect("calculates");
        assert!(response.report.starts_with("# Mortgage Payoff Analysis"));
        for name in ["Standard Payment", "Extra Monthly Payment", "Bi-weekly Payments", "Lump Sum Payment"] {
            assert!(response.report.contains(name), "missing {name}");
        }
        assert!(response.report.contains("## Cost-Benefit Analysis"));
        assert_eq!(response.output["payoffSchedule"][0]["date"], json!("2024-01-01"));
    }
}
