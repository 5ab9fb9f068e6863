mod engine;
pub mod types;

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::core::format::{fixed, money};
use crate::core::{
    CalcError, Calculator, Example, FieldKind, Fields, InputField, Meta, OutputField,
    Registration, Rule,
};

pub use engine::{SURPLUS_REFUND_THRESHOLD, calculate, project, required_balance};
pub use types::{EscrowInputs, EscrowResults};

use types::AccountStatus;

pub struct EscrowAnalysis;

const FREQUENCIES: &[&str] = &["monthly", "quarterly", "semi-annually", "annually"];
const HISTORIES: &[&str] = &["current", "late-30", "late-60", "late-90"];
const ACCOUNT_TYPES: &[&str] = &["required", "voluntary", "waived"];

pub fn registration() -> Registration {
    Registration::of::<EscrowAnalysis>()
}

fn annual_escrow(fields: &Fields<'_>) -> f64 {
    ["annualPropertyTax", "annualHomeInsurance", "annualPMI", "annualFloodInsurance"]
        .iter()
        .filter_map(|key| fields.number(key))
        .sum()
}

impl Calculator for EscrowAnalysis {
    type Input = EscrowInputs;
    type Output = EscrowResults;

    fn meta() -> Meta {
        Meta {
            id: "escrow-analysis",
            title: "Escrow Analysis Calculator",
            category: "finance",
            subcategory: "mortgage",
            description: "Checks an escrow account against the lender's required balance and \
                          projects future deposits",
        }
    }

    fn inputs() -> Vec<InputField> {
        vec![
            InputField::currency("propertyValue", "Property Value")
                .required()
                .range(50_000.0, 10_000_000.0),
            InputField::currency("loanAmount", "Loan Amount")
                .required()
                .range(10_000.0, 10_000_000.0),
            InputField::percentage("interestRate", "Interest Rate")
                .required()
                .range(1.0, 20.0),
            InputField::number("loanTerm", "Loan Term (years)")
                .required()
                .range(10.0, 50.0)
                .default_value(30),
            InputField::currency("monthlyPayment", "Monthly P&I Payment")
                .required()
                .range(100.0, 50_000.0),
            InputField::currency("currentEscrowBalance", "Current Escrow Balance")
                .required()
                .range(0.0, 100_000.0),
            InputField::currency("annualPropertyTax", "Annual Property Tax")
                .required()
                .range(0.0, 100_000.0),
            InputField::currency("annualHomeInsurance", "Annual Home Insurance")
                .required()
                .range(0.0, 50_000.0),
            InputField::currency("annualPMI", "Annual PMI").range(0.0, 10_000.0),
            InputField::currency("annualFloodInsurance", "Annual Flood Insurance")
                .range(0.0, 10_000.0),
            InputField::select(
                "propertyTaxPaymentFrequency",
                "Property Tax Payment Frequency",
                FREQUENCIES,
            )
            .required()
            .default_value("semi-annually"),
            InputField::select(
                "insurancePaymentFrequency",
                "Insurance Payment Frequency",
                FREQUENCIES,
            )
            .required()
            .default_value("annually"),
            InputField::select("pmiPaymentFrequency", "PMI Payment Frequency", FREQUENCIES)
                .default_value("monthly"),
            InputField::select(
                "floodInsurancePaymentFrequency",
                "Flood Insurance Payment Frequency",
                FREQUENCIES,
            )
            .default_value("annually"),
            InputField::currency("escrowCushion", "Escrow Cushion")
                .required()
                .range(0.0, 10_000.0),
            InputField::percentage("taxAssessmentIncrease", "Annual Tax Increase")
                .required()
                .range(0.0, 20.0),
            InputField::percentage("insuranceRateIncrease", "Annual Insurance Increase")
                .required()
                .range(0.0, 30.0),
            InputField::integer("analysisPeriod", "Analysis Period (months)")
                .required()
                .range(1.0, 60.0)
                .default_value(12),
            InputField::select("paymentHistory", "Payment History", HISTORIES)
                .required()
                .default_value("current"),
            InputField::select("escrowAccountType", "Escrow Account Type", ACCOUNT_TYPES)
                .required()
                .default_value("required"),
            InputField::date("asOfDate", "Analysis Date"),
        ]
    }

    fn outputs() -> Vec<OutputField> {
        vec![
            OutputField::new("monthlyEscrowPayment", "Monthly Escrow Payment", FieldKind::Currency),
            OutputField::new("totalMonthlyPayment", "Total Monthly Payment", FieldKind::Currency),
            OutputField::new("requiredEscrowBalance", "Required Escrow Balance", FieldKind::Currency),
            OutputField::new("escrowShortage", "Escrow Shortage", FieldKind::Currency),
            OutputField::new("escrowSurplus", "Escrow Surplus", FieldKind::Currency),
            OutputField::new("shortagePayment", "Monthly Shortage Payment", FieldKind::Currency),
            OutputField::new("surplusRefund", "Surplus Refund", FieldKind::Currency),
            OutputField::new("nextEscrowAnalysis", "Next Escrow Analysis", FieldKind::Date),
            OutputField::new("futureProjections", "Future Projections", FieldKind::List),
        ]
    }

    fn rules() -> Vec<Rule> {
        vec![
            Rule::required("propertyValue", "Property value is required"),
            Rule::range(
                "propertyValue",
                50_000.0,
                10_000_000.0,
                "Property value must be between $50,000 and $10,000,000",
            ),
            Rule::required("loanAmount", "Loan amount is required"),
            Rule::range(
                "loanAmount",
                10_000.0,
                10_000_000.0,
                "Loan amount must be between $10,000 and $10,000,000",
            ),
            Rule::cross(
                "loanAmount",
                "Loan amount cannot exceed property value",
                |f| match (f.number("loanAmount"), f.number("propertyValue")) {
                    (Some(loan), Some(value)) => loan <= value,
                    _ => true,
                },
            ),
            Rule::required("interestRate", "Interest rate is required"),
            Rule::range("interestRate", 1.0, 20.0, "Interest rate must be between 1% and 20%"),
            Rule::required("loanTerm", "Loan term is required"),
            Rule::range("loanTerm", 10.0, 50.0, "Loan term must be between 10 and 50 years"),
            Rule::required("monthlyPayment", "Monthly payment is required"),
            Rule::range(
                "monthlyPayment",
                100.0,
                50_000.0,
                "Monthly payment must be between $100 and $50,000",
            ),
            Rule::required("currentEscrowBalance", "Current escrow balance is required"),
            Rule::range(
                "currentEscrowBalance",
                0.0,
                100_000.0,
                "Current escrow balance must be between $0 and $100,000",
            ),
            Rule::required("annualPropertyTax", "Annual property tax is required"),
            Rule::range(
                "annualPropertyTax",
                0.0,
                100_000.0,
                "Annual property tax must be between $0 and $100,000",
            ),
            Rule::required("annualHomeInsurance", "Annual home insurance is required"),
            Rule::range(
                "annualHomeInsurance",
                0.0,
                50_000.0,
                "Annual home insurance must be between $0 and $50,000",
            ),
            Rule::range("annualPMI", 0.0, 10_000.0, "Annual PMI must be between $0 and $10,000"),
            Rule::range(
                "annualFloodInsurance",
                0.0,
                10_000.0,
                "Annual flood insurance must be between $0 and $10,000",
            ),
            Rule::required(
                "propertyTaxPaymentFrequency",
                "Property tax payment frequency is required",
            ),
            Rule::one_of(
                "propertyTaxPaymentFrequency",
                FREQUENCIES,
                "Invalid property tax payment frequency",
            ),
            Rule::required(
                "insurancePaymentFrequency",
                "Insurance payment frequency is required",
            ),
            Rule::one_of(
                "insurancePaymentFrequency",
                FREQUENCIES,
                "Invalid insurance payment frequency",
            ),
            Rule::one_of("pmiPaymentFrequency", FREQUENCIES, "Invalid PMI payment frequency"),
            Rule::one_of(
                "floodInsurancePaymentFrequency",
                FREQUENCIES,
                "Invalid flood insurance payment frequency",
            ),
            Rule::required("escrowCushion", "Escrow cushion is required"),
            Rule::range(
                "escrowCushion",
                0.0,
                10_000.0,
                "Escrow cushion must be between $0 and $10,000",
            ),
            Rule::cross(
                "escrowCushion",
                "Escrow cushion is above the two months of disbursements lenders may hold",
                |f| {
                    f.number("escrowCushion")
                        .is_none_or(|cushion| cushion <= annual_escrow(f) / 6.0 + 0.005)
                },
            )
            .warning(),
            Rule::cross(
                "currentEscrowBalance",
                "Current escrow balance is very low relative to required cushion",
                |f| match (f.number("currentEscrowBalance"), f.number("escrowCushion")) {
                    (Some(balance), Some(cushion)) => balance >= cushion * 0.5,
                    _ => true,
                },
            )
            .warning(),
            Rule::required("taxAssessmentIncrease", "Tax assessment increase is required"),
            Rule::range(
                "taxAssessmentIncrease",
                0.0,
                20.0,
                "Tax assessment increase must be between 0% and 20%",
            ),
            Rule::required("insuranceRateIncrease", "Insurance rate increase is required"),
            Rule::range(
                "insuranceRateIncrease",
                0.0,
                30.0,
                "Insurance rate increase must be between 0% and 30%",
            ),
            Rule::required("analysisPeriod", "Analysis period is required"),
            Rule::range(
                "analysisPeriod",
                1.0,
                60.0,
                "Analysis period must be between 1 and 60 months",
            ),
            Rule::cross(
                "analysisPeriod",
                "Analysis period must be a whole number of months",
                |f| f.number("analysisPeriod").is_none_or(|v| v.fract() == 0.0),
            ),
            Rule::required("paymentHistory", "Payment history is required"),
            Rule::one_of("paymentHistory", HISTORIES, "Invalid payment history status"),
            Rule::required("escrowAccountType", "Escrow account type is required"),
            Rule::one_of("escrowAccountType", ACCOUNT_TYPES, "Invalid escrow account type"),
            Rule::cross(
                "asOfDate",
                "Analysis date must be a valid YYYY-MM-DD date",
                |f| {
                    f.get("asOfDate").is_none()
                        || f.text("asOfDate").is_some_and(|s| {
                            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok()
                        })
                },
            ),
        ]
    }

    fn calculate(input: &EscrowInputs) -> Result<EscrowResults, CalcError> {
        Ok(engine::calculate(input))
    }

    fn report(input: &EscrowInputs, output: &EscrowResults) -> String {
        let mut out = String::from("# Escrow Analysis Report\n\n");

        let _ = writeln!(out, "## Loan Information\n");
        let _ = writeln!(out, "- **Property Value:** {}", money(input.property_value));
        let _ = writeln!(out, "- **Loan Amount:** {}", money(input.loan_amount));
        let _ = writeln!(out, "- **Interest Rate:** {}%", fixed(input.interest_rate, 2));
        let _ = writeln!(out, "- **Monthly P&I Payment:** {}", money(input.monthly_payment));

        let _ = writeln!(out, "\n## Escrow Account Summary\n");
        let _ = writeln!(
            out,
            "- **Current Escrow Balance:** {}",
            money(input.current_escrow_balance)
        );
        let _ = writeln!(
            out,
            "- **Required Escrow Balance:** {}",
            money(output.required_escrow_balance)
        );
        let _ = writeln!(
            out,
            "- **Monthly Escrow Payment:** {}",
            money(output.monthly_escrow_payment)
        );
        let _ = writeln!(
            out,
            "- **Total Monthly Payment:** {}",
            money(output.total_monthly_payment)
        );

        match output.account_status {
            AccountStatus::Shortage => {
                let _ = writeln!(out, "\n## Escrow Shortage\n");
                let _ = writeln!(out, "- **Shortage Amount:** {}", money(output.escrow_shortage));
                let _ = writeln!(
                    out,
                    "- **Monthly Shortage Payment:** {}",
                    money(output.shortage_payment)
                );
                let _ = writeln!(
                    out,
                    "- **New Total Monthly Payment:** {}",
                    money(output.total_monthly_payment + output.shortage_payment)
                );
            }
            AccountStatus::Surplus => {
                let _ = writeln!(out, "\n## Escrow Surplus\n");
                let _ = writeln!(out, "- **Surplus Amount:** {}", money(output.escrow_surplus));
                if output.surplus_refund > 0.0 {
                    let _ = writeln!(
                        out,
                        "- **Available for Refund:** {}",
                        money(output.surplus_refund)
                    );
                }
            }
            AccountStatus::Balanced => {
                let _ = writeln!(out, "\nThe escrow account is balanced.");
            }
        }

        let _ = writeln!(out, "\n## Scheduled Disbursements\n");
        for p in &output.scheduled_payments {
            let _ = writeln!(
                out,
                "- {}: {} a year, paid {} ({} each, {}% of escrow)",
                p.component,
                money(p.annual_amount),
                p.frequency.label(),
                money(p.payment_amount),
                fixed(p.share_of_escrow, 1)
            );
        }

        if !output.future_projections.is_empty() {
            let _ = writeln!(out, "\n## Future Projections\n");
            let _ = writeln!(out, "| Year | Property Tax | Insurance | Monthly Escrow |");
            let _ = writeln!(out, "|------|--------------|-----------|----------------|");
            for y in &output.future_projections {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} |",
                    y.year,
                    money(y.property_tax),
                    money(y.home_insurance),
                    money(y.monthly_escrow_payment)
                );
            }
        }

        let _ = writeln!(out, "\n## Account Details\n");
        let _ = writeln!(out, "- **Payment History:** {}", input.payment_history.label());
        let _ = writeln!(out, "- **Next Analysis Date:** {}", output.next_escrow_analysis);

        let _ = writeln!(out, "\n## Recommendations\n");
        for rec in &output.recommendations {
            let _ = writeln!(out, "- {rec}");
        }
        out
    }

    fn examples() -> Vec<Example> {
        vec![
            Example {
                title: "Surplus at annual review",
                description: "Tax and insurance only, balance well above the requirement",
                inputs: annual_review(),
            },
            Example {
                title: "Shortage with PMI and flood cover",
                description: "Four escrowed items and a thin balance",
                inputs: json!({
                    "propertyValue": 420000,
                    "loanAmount": 378000,
                    "interestRate": 6.75,
                    "loanTerm": 30,
                    "monthlyPayment": 2452,
                    "currentEscrowBalance": 800,
                    "annualPropertyTax": 4800,
                    "annualHomeInsurance": 1800,
                    "annualPMI": 1200,
                    "annualFloodInsurance": 600,
                    "propertyTaxPaymentFrequency": "quarterly",
                    "insurancePaymentFrequency": "annually",
                    "pmiPaymentFrequency": "monthly",
                    "floodInsurancePaymentFrequency": "annually",
                    "escrowCushion": 1400,
                    "taxAssessmentIncrease": 4,
                    "insuranceRateIncrease": 6,
                    "analysisPeriod": 36,
                    "paymentHistory": "late-30",
                    "escrowAccountType": "required",
                    "asOfDate": "2024-09-01"
                }),
            },
        ]
    }
}

fn annual_review() -> Value {
    json!({
        "propertyValue": 300000,
        "loanAmount": 240000,
        "interestRate": 5.5,
        "loanTerm": 30,
        "monthlyPayment": 1363,
        "currentEscrowBalance": 5000,
        "annualPropertyTax": 3000,
        "annualHomeInsurance": 1200,
        "propertyTaxPaymentFrequency": "monthly",
        "insurancePaymentFrequency": "monthly",
        "escrowCushion": 700,
        "taxAssessmentIncrease": 2,
        "insuranceRateIncrease": 3,
        "analysisPeriod": 12,
        "paymentHistory": "current",
        "escrowAccountType": "required",
        "asOfDate": "2024-03-15"
    })
}

#[cfg(test)]
pub(crate) fn sample_inputs() -> EscrowInputs {
    serde_json::from_value(annual_review()).expect("fixture decodes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InputMap;

    fn fixture_map() -> InputMap {
        annual_review().as_object().cloned().expect("object fixture")
    }

    #[test]
    fn fixture_is_clean() {
        let result = registration().validate(&fixture_map(), None);
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn loan_above_value_is_an_error() {
        let mut inputs = fixture_map();
        inputs.insert("loanAmount".into(), json!("350000"));
        let result = registration().validate(&inputs, None);
        assert!(!result.is_valid);
        assert!(result.mentions("Loan amount cannot exceed property value"));
    }

    #[test]
    fn string_inputs_validate_like_numbers() {
        let inputs: InputMap = fixture_map()
            .into_iter()
            .map(|(k, v)| match v {
                Value::Number(n) => (k, Value::String(n.to_string())),
                other => (k, other),
            })
            .collect();
        assert!(registration().validate(&inputs, None).is_valid);
        let response = registration().calculate(&inputs).expect("calculates");
        assert_eq!(response.output["monthlyEscrowPayment"], json!(350.0));
    }

    #[test]
    fn oversized_cushion_and_thin_balance_warn() {
        let mut inputs = fixture_map();
        inputs.insert("escrowCushion".into(), json!(2000));
        inputs.insert("currentEscrowBalance".into(), json!(500));
        let result = registration().validate(&inputs, None);
        assert!(result.is_valid);
        assert!(result.mentions(
            "Escrow cushion is above the two months of disbursements lenders may hold"
        ));
        assert!(result.mentions("Current escrow balance is very low relative to required cushion"));
    }

    #[test]
    fn unknown_frequency_is_rejected() {
        let check = registration().quick_validate(
            "propertyTaxPaymentFrequency",
            &json!("weekly"),
            &fixture_map(),
        );
        assert!(!check.is_valid);
        assert_eq!(
            check.message.as_deref(),
            Some("Invalid property tax payment frequency")
        );
    }

    #[test]
    fn report_covers_status_and_outlook() {
        let response = registration().calculate(&fixture_map()).expect("calculates");
        assert!(response.report.starts_with("# Escrow Analysis Report"));
        assert!(response.report.contains("## Escrow Surplus"));
        assert!(response.report.contains("- **Available for Refund:** $3,600.00"));
        assert!(response.report.contains("- **Next Analysis Date:** 2025-03-15"));
        assert_eq!(response.output["nextEscrowAnalysis"], json!("2025-03-15"));
    }
}
