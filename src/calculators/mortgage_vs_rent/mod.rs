mod engine;
pub mod types;

use serde_json::{Value, json};

use crate::core::format::money;
use crate::core::{
    CalcError, Calculator, Example, FieldKind, InputField, Meta, OutputField, Registration, Rule,
};

pub use engine::{BREAK_EVEN_HORIZON, calculate, recommend};
pub use types::{RentVsBuyInputs, RentVsBuyResults, Verdict};

pub struct MortgageVsRent;

pub fn registration() -> Registration {
    Registration::of::<MortgageVsRent>()
}

impl Calculator for MortgageVsRent {
    type Input = RentVsBuyInputs;
    type Output = RentVsBuyResults;

    fn meta() -> Meta {
        Meta {
            id: "mortgage-vs-rent",
            title: "Mortgage vs Rent Calculator",
            category: "finance",
            subcategory: "mortgage",
            description: "Weighs the full cost of owning against renting, including equity and \
                          forgone investment returns",
        }
    }

    fn inputs() -> Vec<InputField> {
        vec![
            InputField::currency("currentRent", "Monthly Rent")
                .required()
                .range(0.0, 50_000.0),
            InputField::percentage("rentIncreaseRate", "Annual Rent Increase").default_value(3),
            InputField::currency("homePrice", "Home Price")
                .required()
                .range(1.0, 50_000_000.0),
            InputField::currency("downPayment", "Down Payment").required(),
            InputField::percentage("interestRate", "Interest Rate")
                .required()
                .range(0.1, 25.0),
            InputField::number("loanTerm", "Loan Term (years)")
                .required()
                .range(1.0, 50.0)
                .default_value(30),
            InputField::percentage("propertyTaxRate", "Property Tax Rate").default_value(1.2),
            InputField::currency("homeownersInsurance", "Homeowners Insurance (annual)"),
            InputField::percentage("pmiRate", "PMI Rate"),
            InputField::currency("maintenanceCost", "Maintenance (annual)"),
            InputField::currency("utilities", "Utilities While Renting"),
            InputField::currency("utilitiesHome", "Utilities as Owner"),
            InputField::currency("closingCosts", "Closing Costs"),
            InputField::percentage("homeAppreciation", "Home Appreciation").default_value(3),
            InputField::percentage("investmentReturn", "Investment Return").default_value(7),
            InputField::integer("analysisPeriod", "Analysis Period (years)")
                .required()
                .range(1.0, 50.0)
                .default_value(10),
            InputField::percentage("taxRate", "Marginal Tax Rate"),
            InputField::currency("rentersInsurance", "Renters Insurance (monthly)"),
            InputField::currency("hoaFees", "HOA Fees (monthly)"),
        ]
    }

    fn outputs() -> Vec<OutputField> {
        vec![
            OutputField::new("monthlyRentCost", "Monthly Rent Cost", FieldKind::Currency),
            OutputField::new("monthlyMortgageCost", "Monthly Ownership Cost", FieldKind::Currency),
            OutputField::new("totalRentCost", "Total Rent Cost", FieldKind::Currency),
            OutputField::new("totalMortgageCost", "Total Ownership Cost", FieldKind::Currency),
            OutputField::new("homeEquity", "Home Equity", FieldKind::Currency),
            OutputField::new("opportunityCost", "Opportunity Cost", FieldKind::Currency),
            OutputField::new("netHomeCost", "Net Home Cost", FieldKind::Currency),
            OutputField::new("breakEvenYears", "Break-Even (years)", FieldKind::Integer),
            OutputField::new("recommendation", "Recommendation", FieldKind::Text),
            OutputField::new("yearlyComparison", "Year-by-Year Comparison", FieldKind::List),
        ]
    }

    fn rules() -> Vec<Rule> {
        vec![
            Rule::required("currentRent", "Monthly rent is required"),
            Rule::range("currentRent", 0.0, 50_000.0, "Monthly rent must be between $0 and $50,000"),
            Rule::required("homePrice", "Home price is required"),
            Rule::cross("homePrice", "Home price must be greater than 0", |f| {
                f.number("homePrice").is_none_or(|v| v > 0.0)
            }),
            Rule::range(
                "homePrice",
                f64::MIN,
                50_000_000.0,
                "Home price cannot exceed $50,000,000",
            ),
            Rule::required("downPayment", "Down payment is required"),
            Rule::range(
                "downPayment",
                0.0,
                50_000_000.0,
                "Down payment cannot be negative",
            ),
            Rule::cross("downPayment", "Down payment cannot exceed home price", |f| {
                match (f.number("downPayment"), f.number("homePrice")) {
                    (Some(down), Some(price)) => down <= price,
                    _ => true,
                }
            }),
            Rule::cross("downPayment", "Loan amount cannot exceed $10,000,000", |f| {
                match (f.number("downPayment"), f.number("homePrice")) {
                    (Some(down), Some(price)) => price - down <= 10_000_000.0,
                    _ => true,
                }
            }),
            Rule::required("interestRate", "Interest rate is required"),
            Rule::cross("interestRate", "Interest rate must be greater than 0", |f| {
                f.number("interestRate").is_none_or(|v| v > 0.0)
            }),
            Rule::range("interestRate", f64::MIN, 25.0, "Interest rate cannot exceed 25%"),
            Rule::required("loanTerm", "Loan term is required"),
            Rule::range("loanTerm", 1.0, 50.0, "Loan term must be between 1 and 50 years"),
            Rule::required("analysisPeriod", "Analysis period is required"),
            Rule::range(
                "analysisPeriod",
                1.0,
                50.0,
                "Analysis period must be between 1 and 50 years",
            ),
            Rule::cross("analysisPeriod", "Analysis period must be a whole number of years", |f| {
                f.number("analysisPeriod").is_none_or(|v| v.fract() == 0.0)
            }),
            Rule::range(
                "rentIncreaseRate",
                -20.0,
                50.0,
                "Rent increase rate must be between -20% and 50%",
            ),
            Rule::range(
                "homeAppreciation",
                -20.0,
                50.0,
                "Home appreciation must be between -20% and 50%",
            ),
            Rule::range(
                "investmentReturn",
                -50.0,
                50.0,
                "Investment return must be between -50% and 50%",
            ),
            Rule::range(
                "propertyTaxRate",
                0.0,
                10.0,
                "Property tax rate must be between 0% and 10%",
            ),
            Rule::range("pmiRate", 0.0, 5.0, "PMI rate must be between 0% and 5%"),
            Rule::range(
                "homeownersInsurance",
                0.0,
                50_000.0,
                "Homeowners insurance must be between $0 and $50,000",
            ),
            Rule::range(
                "maintenanceCost",
                0.0,
                50_000.0,
                "Maintenance costs must be between $0 and $50,000",
            ),
            Rule::range("utilities", 0.0, 20_000.0, "Utility costs must be between $0 and $20,000"),
            Rule::range(
                "utilitiesHome",
                0.0,
                20_000.0,
                "Utility costs must be between $0 and $20,000",
            ),
            Rule::range(
                "closingCosts",
                0.0,
                500_000.0,
                "Closing costs must be between $0 and $500,000",
            ),
            Rule::range(
                "rentersInsurance",
                0.0,
                5_000.0,
                "Renters insurance must be between $0 and $5,000",
            ),
            Rule::range("hoaFees", 0.0, 50_000.0, "HOA fees must be between $0 and $50,000"),
            Rule::cross(
                "pmiRate",
                "PMI is usually required with less than 20% down",
                |f| match (f.number("downPayment"), f.number("homePrice")) {
                    (Some(down), Some(price)) if down < price * 0.2 => {
                        f.number("pmiRate").is_some_and(|rate| rate > 0.0)
                    }
                    _ => true,
                },
            )
            .warning(),
        ]
    }

    fn calculate(input: &RentVsBuyInputs) -> Result<RentVsBuyResults, CalcError> {
        Ok(engine::calculate(input))
    }

    fn report(input: &RentVsBuyInputs, output: &RentVsBuyResults) -> String {
        let mut out = String::from("# Rent vs. Buy Analysis\n\n");
        out.push_str(&output.analysis);
        if !output.sensitivity.is_empty() {
            out.push_str("\n## Sensitivity\n");
            for p in &output.sensitivity {
                out.push_str(&format!(
                    "- **{} {:+}** ({}%): net home cost {}, break-even {} years, {}\n",
                    p.variable,
                    p.change,
                    p.value,
                    money(p.net_home_cost),
                    p.break_even_years,
                    p.recommendation.label()
                ));
            }
        }
        out.push_str(&format!(
            "\nLoan of {} over {} years.\n",
            money(output.loan_amount),
            input.loan_term
        ));
        out
    }

    fn examples() -> Vec<Example> {
        vec![
            Example {
                title: "First home",
                description: "A $400k home with 20% down against $2,000 rent",
                inputs: first_home(),
            },
            Example {
                title: "Low down payment",
                description: "FHA-style 5% down with PMI in a fast-appreciating market",
                inputs: json!({
                    "currentRent": 1800,
                    "rentIncreaseRate": 4,
                    "homePrice": 300000,
                    "downPayment": 15000,
                    "interestRate": 6.75,
                    "loanTerm": 30,
                    "propertyTaxRate": 1.0,
                    "homeownersInsurance": 1200,
                    "pmiRate": 0.8,
                    "maintenanceCost": 3000,
                    "utilities": 120,
                    "utilitiesHome": 220,
                    "closingCosts": 9000,
                    "homeAppreciation": 4.5,
                    "investmentReturn": 6,
                    "analysisPeriod": 7,
                    "rentersInsurance": 15,
                    "hoaFees": 0
                }),
            },
        ]
    }
}

fn first_home() -> Value {
    json!({
        "currentRent": 2000,
        "rentIncreaseRate": 3,
        "homePrice": 400000,
        "downPayment": 80000,
        "interestRate": 6.5,
        "loanTerm": 30,
        "propertyTaxRate": 1.2,
        "homeownersInsurance": 1500,
        "pmiRate": 0,
        "maintenanceCost": 4000,
        "utilities": 150,
        "utilitiesHome": 250,
        "closingCosts": 12000,
        "homeAppreciation": 3.5,
        "investmentReturn": 7,
        "analysisPeriod": 10,
        "rentersInsurance": 20,
        "hoaFees": 0
    })
}

#[cfg(test)]
pub(crate) fn sample_inputs() -> RentVsBuyInputs {
    serde_json::from_value(first_home()).expect("fixture decodes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InputMap;

    fn fixture_map() -> InputMap {
        first_home().as_object().cloned().expect("object fixture")
    }

    #[test]
    fn first_home_fixture_breaks_even_in_year_six() {
        let r = calculate(&sample_inputs());
        assert_eq!(r.break_even_years, 6);
        assert_eq!(r.recommendation, Verdict::ConsiderBuying);
    }

    #[test]
    fn down_payment_above_price_reports_every_problem() {
        let mut inputs = fixture_map();
        inputs.insert("downPayment".into(), json!(500000));
        inputs.insert("interestRate".into(), json!(30));
        let result = registration().validate(&inputs, None);
        assert!(!result.is_valid);
        assert!(result.mentions("Down payment cannot exceed home price"));
        assert!(result.mentions("Interest rate cannot exceed 25%"));
    }

    #[test]
    fn zero_interest_is_rejected() {
        let mut inputs = fixture_map();
        inputs.insert("interestRate".into(), json!("0"));
        let result = registration().validate(&inputs, None);
        assert!(result.mentions("Interest rate must be greater than 0"));
    }

    #[test]
    fn missing_pmi_with_thin_down_payment_is_only_a_warning() {
        let mut inputs = fixture_map();
        inputs.insert("downPayment".into(), json!(20000));
        let result = registration().validate(&inputs, None);
        assert!(result.is_valid);
        assert!(result.mentions("PMI is usually required with less than 20% down"));
    }

    #[test]
    fn string_period_is_coerced_before_decoding() {
        let mut inputs = fixture_map();
        inputs.insert("analysisPeriod".into(), json!("5"));
        inputs.insert("loanTerm".into(), json!("15"));
        let response = registration().calculate(&inputs).expect("calculates");
        assert_eq!(
            response.output["yearlyComparison"].as_array().map(Vec::len),
            Some(5)
        );
        assert!(response.report.starts_with("# Rent vs. Buy Analysis"));
        assert!(response.report.contains("## Sensitivity"));
    }
}
