mod engine;
pub mod types;

use chrono::{Local, NaiveDate};
use serde_json::{Value, json};

use crate::core::format::money;
use crate::core::{
    CalcError, Calculator, Example, FieldKind, Fields, InputField, Meta, OutputField,
    Registration, Rule,
};

pub use engine::{AUTOMATIC_LTV, LENDER_LTV, calculate, months_between};
pub use types::{PmiInputs, PmiResults};

pub struct PmiCancellation;

const HISTORIES: &[&str] = &["perfect", "good", "fair", "poor"];
const LOAN_TYPES: &[&str] = &["conventional", "fha", "va", "usda"];
const PROPERTY_TYPES: &[&str] = &["primary", "secondary", "investment"];

pub fn registration() -> Registration {
    Registration::of::<PmiCancellation>()
}

fn date(fields: &Fields<'_>, key: &str) -> Option<NaiveDate> {
    fields
        .text(key)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

impl Calculator for PmiCancellation {
    type Input = PmiInputs;
    type Output = PmiResults;

    fn meta() -> Meta {
        Meta {
            id: "pmi-cancellation",
            title: "PMI Cancellation Calculator",
            category: "finance",
            subcategory: "mortgage",
            description: "Estimates when private mortgage insurance can be dropped and what \
                          cancelling early is worth",
        }
    }

    fn inputs() -> Vec<InputField> {
        vec![
            InputField::currency("originalLoanAmount", "Original Loan Amount")
                .required()
                .range(1.0, 10_000_000.0),
            InputField::currency("currentBalance", "Current Loan Balance")
                .required()
                .range(0.0, 10_000_000.0),
            InputField::currency("originalHomeValue", "Original Home Value")
                .required()
                .range(1.0, 10_000_000.0),
            InputField::currency("currentHomeValue", "Current Home Value")
                .required()
                .range(1.0, 10_000_000.0),
            InputField::currency("downPayment", "Down Payment"),
            InputField::number("loanTerm", "Loan Term (years)")
                .required()
                .range(1.0, 50.0)
                .default_value(30),
            InputField::percentage("interestRate", "Interest Rate")
                .required()
                .range(0.0, 20.0),
            InputField::currency("monthlyPayment", "Monthly Payment (incl. PMI)").required(),
            InputField::percentage("pmiRate", "PMI Rate").required().range(0.0, 5.0),
            InputField::date("loanStartDate", "Loan Start Date").required(),
            InputField::date("asOfDate", "Analysis Date"),
            InputField::select("paymentHistory", "Payment History", HISTORIES)
                .default_value("good"),
            InputField::select("loanType", "Loan Type", LOAN_TYPES)
                .required()
                .default_value("conventional"),
            InputField::select("propertyType", "Property Type", PROPERTY_TYPES)
                .default_value("primary"),
            InputField::percentage("appreciationRate", "Expected Appreciation").default_value(3),
            InputField::currency("additionalPayments", "Additional Monthly Principal"),
            InputField::currency("lumpSumPayment", "Lump Sum Payment"),
            InputField::currency("appraisalFee", "Appraisal Fee"),
            InputField::currency("titleSearchFee", "Title Search Fee"),
            InputField::currency("otherFees", "Other Fees"),
            InputField::percentage("marginalTaxRate", "Federal Marginal Tax Rate"),
            InputField::percentage("stateTaxRate", "State Tax Rate"),
        ]
    }

    fn outputs() -> Vec<OutputField> {
        vec![
            OutputField::new("currentLTV", "Current LTV", FieldKind::Percentage),
            OutputField::new("currentPMI", "Monthly PMI", FieldKind::Currency),
            OutputField::new("monthsToCancellation", "Months to Cancellation", FieldKind::Number),
            OutputField::new("pmiCancellationDate", "Cancellation Date", FieldKind::Date),
            OutputField::new("totalPMISavings", "Total PMI Savings", FieldKind::Currency),
            OutputField::new("breakEvenMonths", "Break-Even (months)", FieldKind::Number),
            OutputField::new("recommendedAction", "Recommended Action", FieldKind::Text),
            OutputField::new("ltvProjection", "LTV Projection", FieldKind::List),
        ]
    }

    fn rules() -> Vec<Rule> {
        vec![
            Rule::required("originalLoanAmount", "Original loan amount is required"),
            Rule::range(
                "originalLoanAmount",
                1.0,
                10_000_000.0,
                "Original loan amount must be between $1 and $10 million",
            ),
            Rule::required("currentBalance", "Current loan balance is required"),
            Rule::range(
                "currentBalance",
                0.0,
                10_000_000.0,
                "Current loan balance must be between $0 and $10 million",
            ),
            Rule::cross(
                "currentBalance",
                "Current loan balance cannot exceed original loan amount",
                |f| match (f.number("currentBalance"), f.number("originalLoanAmount")) {
                    (Some(current), Some(original)) => current <= original,
                    _ => true,
                },
            ),
            Rule::required("originalHomeValue", "Original property value is required"),
            Rule::cross(
                "originalHomeValue",
                "Original property value must be greater than 0",
                |f| f.number("originalHomeValue").is_none_or(|v| v > 0.0),
            ),
            Rule::range(
                "originalHomeValue",
                f64::MIN,
                10_000_000.0,
                "Original property value cannot exceed $10 million",
            ),
            Rule::required("currentHomeValue", "Current property value is required"),
            Rule::cross(
                "currentHomeValue",
                "Current property value must be greater than 0",
                |f| f.number("currentHomeValue").is_none_or(|v| v > 0.0),
            ),
            Rule::range(
                "currentHomeValue",
                f64::MIN,
                10_000_000.0,
                "Current property value cannot exceed $10 million",
            ),
            Rule::cross(
                "currentHomeValue",
                "Current property value seems unusually low relative to original property value",
                |f| match (f.number("currentHomeValue"), f.number("originalHomeValue")) {
                    (Some(current), Some(original)) => current >= original * 0.5,
                    _ => true,
                },
            )
            .warning(),
            Rule::range(
                "downPayment",
                0.0,
                10_000_000.0,
                "Original down payment must be 0 or greater",
            ),
            Rule::cross(
                "downPayment",
                "Original down payment cannot exceed original property value",
                |f| match (f.number("downPayment"), f.number("originalHomeValue")) {
                    (Some(down), Some(value)) => down <= value,
                    _ => true,
                },
            ),
            Rule::required("loanTerm", "Loan term is required"),
            Rule::range("loanTerm", 1.0, 50.0, "Loan term must be between 1 and 50 years"),
            Rule::required("interestRate", "Interest rate is required"),
            Rule::range("interestRate", 0.0, 20.0, "Interest rate must be between 0% and 20%"),
            Rule::required("monthlyPayment", "Monthly payment is required"),
            Rule::range(
                "monthlyPayment",
                0.0,
                100_000.0,
                "Monthly payment must be between $0 and $100,000",
            ),
            Rule::required("pmiRate", "PMI rate is required"),
            Rule::range("pmiRate", 0.0, 5.0, "PMI rate must be between 0% and 5%"),
            Rule::cross(
                "pmiRate",
                "PMI rate seems unusually high for conventional loans",
                |f| {
                    f.text("loanType").is_some_and(|t| t != "conventional")
                        || f.number("pmiRate").is_none_or(|rate| rate <= 2.0)
                },
            )
            .warning(),
            Rule::required("loanStartDate", "Loan start date is required"),
            Rule::cross(
                "loanStartDate",
                "Loan start date must be a valid YYYY-MM-DD date",
                |f| f.get("loanStartDate").is_none() || date(f, "loanStartDate").is_some(),
            ),
            Rule::cross(
                "asOfDate",
                "Analysis date must be a valid YYYY-MM-DD date",
                |f| f.get("asOfDate").is_none() || date(f, "asOfDate").is_some(),
            ),
            Rule::cross(
                "loanStartDate",
                "Loan start date cannot be after the analysis date",
                |f| match date(f, "loanStartDate") {
                    Some(start) => {
                        let as_of = date(f, "asOfDate").unwrap_or_else(|| Local::now().date_naive());
                        start <= as_of
                    }
                    None => true,
                },
            ),
            Rule::one_of("paymentHistory", HISTORIES, "Valid payment history is required"),
            Rule::required("loanType", "Valid loan type is required"),
            Rule::one_of("loanType", LOAN_TYPES, "Valid loan type is required"),
            Rule::one_of("propertyType", PROPERTY_TYPES, "Valid property type is required"),
            Rule::range(
                "appreciationRate",
                -20.0,
                20.0,
                "Appreciation rate must be between -20% and 20%",
            ),
            Rule::range(
                "additionalPayments",
                0.0,
                100_000.0,
                "Additional payments must be between $0 and $100,000",
            ),
            Rule::cross(
                "lumpSumPayment",
                "Lump sum payment cannot exceed the current loan balance",
                |f| match (f.number("lumpSumPayment"), f.number("currentBalance")) {
                    (Some(lump), Some(balance)) => (0.0..=balance).contains(&lump),
                    _ => true,
                },
            ),
            Rule::range("appraisalFee", 0.0, 2_000.0, "Appraisal cost must be between $0 and $2,000"),
            Rule::range("titleSearchFee", 0.0, 5_000.0, "Title search fee must be between $0 and $5,000"),
            Rule::range("otherFees", 0.0, 10_000.0, "Other fees must be between $0 and $10,000"),
            Rule::range(
                "marginalTaxRate",
                0.0,
                60.0,
                "Marginal tax rate must be between 0% and 60%",
            ),
            Rule::range("stateTaxRate", 0.0, 20.0, "State tax rate must be between 0% and 20%"),
            Rule::cross(
                "pmiRate",
                "Loans that started at or below 80% LTV normally carry no PMI",
                |f| match (
                    f.number("originalLoanAmount"),
                    f.number("originalHomeValue"),
                    f.number("pmiRate"),
                ) {
                    (Some(loan), Some(value), Some(rate)) if value > 0.0 && rate > 0.0 => {
                        loan / value * 100.0 > LENDER_LTV
                    }
                    _ => true,
                },
            )
            .info(),
        ]
    }

    fn calculate(input: &PmiInputs) -> Result<PmiResults, CalcError> {
        Ok(engine::calculate(input))
    }

    fn report(_input: &PmiInputs, output: &PmiResults) -> String {
        let mut out = String::from("# PMI Cancellation Analysis\n\n");
        out.push_str(&output.analysis);
        out.push_str("\n## Scenarios\n");
        for s in [&output.automatic_scenario, &output.lender_scenario] {
            let timing = if s.months_to_cancellation.is_finite() {
                format!("{} months", s.months_to_cancellation)
            } else {
                "not reached".to_string()
            };
            out.push_str(&format!(
                "- **{}% LTV:** {timing}, {} PMI paid, net benefit {}\n",
                s.target_ltv,
                money(s.total_pmi_paid),
                money(s.net_benefit)
            ));
        }
        out.push_str(&format!(
            "- **Cancel now:** {} in fees, net benefit {}\n",
            money(output.immediate_scenario.total_cost),
            money(output.immediate_scenario.net_benefit)
        ));
        out.push_str(&format!(
            "\n**Recommended action:** {} (confidence: {:?})\n",
            output.recommended_action.label(),
            output.confidence_level
        ));
        out
    }

    fn examples() -> Vec<Example> {
        vec![
            Example {
                title: "Five percent down, three years in",
                description: "A conventional loan approaching the 80% LTV window",
                inputs: approaching_window(),
            },
            Example {
                title: "FHA loan",
                description: "FHA mortgage insurance under the 11-year rule",
                inputs: json!({
                    "originalLoanAmount": 289500,
                    "currentBalance": 262000,
                    "originalHomeValue": 300000,
                    "currentHomeValue": 345000,
                    "downPayment": 10500,
                    "loanTerm": 30,
                    "interestRate": 5.75,
                    "monthlyPayment": 1980,
                    "pmiRate": 0.55,
                    "loanStartDate": "2019-09-01",
                    "asOfDate": "2025-03-01",
                    "paymentHistory": "perfect",
                    "loanType": "fha",
                    "propertyType": "primary",
                    "appreciationRate": 4
                }),
            },
        ]
    }
}

fn approaching_window() -> Value {
    json!({
        "originalLoanAmount": 356250,
        "currentBalance": 330000,
        "originalHomeValue": 375000,
        "currentHomeValue": 400000,
        "downPayment": 18750,
        "loanTerm": 30,
        "interestRate": 6.5,
        "monthlyPayment": 2400,
        "pmiRate": 0.55,
        "loanStartDate": "2021-06-01",
        "asOfDate": "2024-06-01",
        "paymentHistory": "good",
        "loanType": "conventional",
        "propertyType": "primary",
        "appreciationRate": 3,
        "appraisalFee": 500,
        "titleSearchFee": 150,
        "otherFees": 100
    })
}

#[cfg(test)]
pub(crate) fn sample_inputs() -> PmiInputs {
    serde_json::from_value(approaching_window()).expect("fixture decodes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InputMap;

    fn fixture_map() -> InputMap {
        approaching_window().as_object().cloned().expect("object fixture")
    }

    #[test]
    fn balance_above_original_loan_is_an_error() {
        let mut inputs = fixture_map();
        inputs.insert("currentBalance".into(), json!(400000));
        let result = registration().validate(&inputs, None);
        assert!(!result.is_valid);
        assert!(result.mentions("Current loan balance cannot exceed original loan amount"));
    }

    #[test]
    fn start_after_analysis_date_is_an_error() {
        let mut inputs = fixture_map();
        inputs.insert("loanStartDate".into(), json!("2025-01-01"));
        let result = registration().validate(&inputs, None);
        assert!(result.mentions("Loan start date cannot be after the analysis date"));
    }

    #[test]
    fn malformed_date_is_reported_not_panicked() {
        let mut inputs = fixture_map();
        inputs.insert("asOfDate".into(), json!("06/01/2024"));
        let result = registration().validate(&inputs, None);
        assert!(result.mentions("Analysis date must be a valid YYYY-MM-DD date"));
        assert!(matches!(
            registration().calculate(&inputs),
            Err(CalcError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let mut inputs = fixture_map();
        inputs.remove("pmiRate");
        inputs.remove("loanStartDate");
        let result = registration().validate(&inputs, None);
        assert!(result.mentions("PMI rate is required"));
        assert!(result.mentions("Loan start date is required"));
    }

    #[test]
    fn quick_check_on_balance_uses_sibling_values() {
        let check = registration().quick_validate("currentBalance", &json!("360000"), &fixture_map());
        assert!(!check.is_valid);
        assert_eq!(
            check.message.as_deref(),
            Some("Current loan balance cannot exceed original loan amount")
        );
    }

    #[test]
    fn report_lists_each_scenario() {
        let response = registration().calculate(&fixture_map()).expect("calculates");
        assert!(response.report.starts_with("# PMI Cancellation Analysis"));
        assert!(response.report.contains("- **78% LTV:** 16 months"));
        assert!(response.report.contains("- **80% LTV:** 9 months"));
        assert_eq!(response.output["pmiCancellationDate"], json!("2025-03-01"));
    }
}
