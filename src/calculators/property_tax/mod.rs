mod engine;
pub mod types;

use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate};
use serde_json::{Value, json};

use crate::core::format::{fixed, money};
use crate::core::{
    CalcError, Calculator, Example, FieldKind, Fields, InputField, Meta, OutputField,
    Registration, Rule,
};

pub use engine::{
    PropertyTaxError, appeal_savings, assessment_change, calculate, escrow, from_assessed_value,
    proration, tax_cap,
};
pub use types::{PropertyTaxInputs, PropertyTaxResult};

use types::*;

pub struct PropertyTax;

const CALCULATION_TYPES: &[&str] = &[
    "proration",
    "from_assessed_value",
    "appeal_savings",
    "escrow",
    "assessment_change",
    "tax_cap",
    "comprehensive",
];
const PRORATION_METHODS: &[&str] = &["365_day", "366_day", "actual_days"];
const CAP_TYPES: &[&str] = &["hard_cap", "soft_cap", "no_cap"];

pub fn registration() -> Registration {
    Registration::of::<PropertyTax>()
}

fn date(fields: &Fields<'_>, key: &str) -> Option<NaiveDate> {
    fields
        .text(key)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

fn valid_date(fields: &Fields<'_>, key: &str) -> bool {
    fields.get(key).is_none() || date(fields, key).is_some()
}

fn calculation_is(fields: &Fields<'_>, types: &[&str]) -> bool {
    fields.text("calculationType").is_some_and(|t| types.contains(&t))
}

/// Passes unless the calculation type is one of `types` and `key` is absent.
fn present_for(fields: &Fields<'_>, types: &[&str], key: &str) -> bool {
    !calculation_is(fields, types) || fields.get(key).is_some()
}

impl Calculator for PropertyTax {
    type Input = PropertyTaxInputs;
    type Output = PropertyTaxResult;

    fn meta() -> Meta {
        Meta {
            id: "property-tax-proration",
            title: "Property Tax Proration Calculator",
            category: "finance",
            subcategory: "real-estate",
            description: "Splits the annual property tax bill at closing and covers assessment, \
                          appeal, escrow and cap calculations",
        }
    }

    fn inputs() -> Vec<InputField> {
        vec![
            InputField::select("calculationType", "Calculation Type", CALCULATION_TYPES)
                .required()
                .default_value("proration"),
            InputField::currency("annualPropertyTax", "Annual Property Tax").range(0.0, 1_000_000.0),
            InputField::currency("salePrice", "Sale Price"),
            InputField::date("closingDate", "Closing Date"),
            InputField::date("taxYearStart", "Tax Year Start"),
            InputField::date("taxYearEnd", "Tax Year End"),
            InputField::select("prorationMethod", "Proration Method", PRORATION_METHODS)
                .default_value("365_day"),
            InputField::new("sellerPaysTax", "Seller Pays Tax", FieldKind::Boolean)
                .default_value(true),
            InputField::currency("assessedValue", "Assessed Value").range(0.0, 100_000_000.0),
            InputField::number("millageRate", "Millage Rate (per $1,000)").range(0.0, 200.0),
            InputField::currency("exemptions", "Exemptions"),
            InputField::currency("specialAssessments", "Special Assessments"),
            InputField::currency("currentAssessedValue", "Current Assessed Value"),
            InputField::currency("appealedAssessedValue", "Appealed Assessed Value"),
            InputField::currency("appealCost", "Appeal Cost"),
            InputField::percentage("successProbability", "Success Probability")
                .range(0.0, 100.0)
                .default_value(100),
            InputField::number("escrowMonths", "Escrow Months")
                .range(1.0, 24.0)
                .default_value(12),
            InputField::currency("currentBalance", "Current Escrow Balance"),
            InputField::currency("monthlyPayment", "Monthly Escrow Deposit"),
            InputField::currency("cushionAmount", "Cushion Amount"),
            InputField::currency("previousAssessedValue", "Previous Assessed Value"),
            InputField::currency("newAssessedValue", "New Assessed Value"),
            InputField::integer("assessmentYear", "Assessment Year"),
            InputField::currency("homesteadExemption", "Homestead Exemption"),
            InputField::currency("portabilityAmount", "Portability Amount"),
            InputField::currency("previousYearTax", "Previous Year Tax"),
            InputField::percentage("taxCapPercentage", "Tax Cap")
                .range(0.0, 100.0)
                .default_value(10),
            InputField::select("capType", "Cap Type", CAP_TYPES).default_value("soft_cap"),
        ]
    }

    fn outputs() -> Vec<OutputField> {
        vec![
            OutputField::new("calculationType", "Calculation Type", FieldKind::Text),
            OutputField::new("sellerTaxResponsibility", "Seller Share", FieldKind::Currency),
            OutputField::new("buyerTaxResponsibility", "Buyer Share", FieldKind::Currency),
            OutputField::new("totalTaxAmount", "Total Tax", FieldKind::Currency),
            OutputField::new("annualSavings", "Annual Savings", FieldKind::Currency),
            OutputField::new("monthlyEscrowPayment", "Monthly Escrow", FieldKind::Currency),
            OutputField::new("escrowShortage", "Escrow Shortage", FieldKind::Currency),
            OutputField::new("taxChange", "Tax Change", FieldKind::Currency),
            OutputField::new("cappedTax", "Capped Tax", FieldKind::Currency),
        ]
    }

    fn rules() -> Vec<Rule> {
        vec![
            Rule::required("calculationType", "Calculation type is required"),
            Rule::one_of(
                "calculationType",
                CALCULATION_TYPES,
                "Calculation type must be one of the supported property tax calculations",
            ),
            Rule::cross(
                "annualPropertyTax",
                "Annual property tax is required for proration and escrow",
                |f| present_for(f, &["proration", "escrow"], "annualPropertyTax"),
            ),
            Rule::range(
                "annualPropertyTax",
                0.0,
                1_000_000.0,
                "Annual property tax must be between $0 and $1,000,000",
            ),
            Rule::cross("salePrice", "Sale price is required for proration", |f| {
                present_for(f, &["proration"], "salePrice")
            }),
            Rule::cross("salePrice", "Sale price must be greater than 0", |f| {
                f.number("salePrice").is_none_or(|v| v > 0.0)
            }),
            Rule::range(
                "salePrice",
                f64::MIN,
                100_000_000.0,
                "Sale price cannot exceed $100,000,000",
            ),
            Rule::cross("closingDate", "Closing date is required for proration", |f| {
                present_for(f, &["proration"], "closingDate")
            }),
            Rule::cross("taxYearStart", "Tax year start is required for proration", |f| {
                present_for(f, &["proration"], "taxYearStart")
            }),
            Rule::cross("taxYearEnd", "Tax year end is required for proration", |f| {
                present_for(f, &["proration"], "taxYearEnd")
            }),
            Rule::cross(
                "closingDate",
                "Closing date must be a valid YYYY-MM-DD date",
                |f| valid_date(f, "closingDate"),
            ),
            Rule::cross(
                "taxYearStart",
                "Tax year start must be a valid YYYY-MM-DD date",
                |f| valid_date(f, "taxYearStart"),
            ),
            Rule::cross(
                "taxYearEnd",
                "Tax year end must be a valid YYYY-MM-DD date",
                |f| valid_date(f, "taxYearEnd"),
            ),
            Rule::cross(
                "taxYearEnd",
                "Tax year end must be after tax year start",
                |f| match (date(f, "taxYearStart"), date(f, "taxYearEnd")) {
                    (Some(start), Some(end)) => end > start,
                    _ => true,
                },
            ),
            Rule::cross(
                "closingDate",
                "Closing date must be within the tax year period",
                |f| match (
                    date(f, "closingDate"),
                    date(f, "taxYearStart"),
                    date(f, "taxYearEnd"),
                ) {
                    (Some(closing), Some(start), Some(end)) => (start..=end).contains(&closing),
                    _ => true,
                },
            ),
            Rule::one_of("prorationMethod", PRORATION_METHODS, "Valid proration method is required"),
            Rule::cross(
                "prorationMethod",
                "The 366-day method is normally used only for leap years",
                |f| {
                    f.text("prorationMethod") != Some("366_day")
                        || date(f, "taxYearStart")
                            .is_none_or(|start| NaiveDate::from_ymd_opt(start.year(), 2, 29).is_some())
                },
            )
            .info(),
            Rule::cross(
                "assessedValue",
                "Assessed value is required for this calculation",
                |f| present_for(f, &["from_assessed_value", "tax_cap"], "assessedValue"),
            ),
            Rule::range(
                "assessedValue",
                0.0,
                100_000_000.0,
                "Assessed value must be between $0 and $100,000,000",
            ),
            Rule::cross(
                "millageRate",
                "Millage rate is required for this calculation",
                |f| {
                    present_for(
                        f,
                        &["from_assessed_value", "appeal_savings", "assessment_change", "tax_cap"],
                        "millageRate",
                    )
                },
            ),
            Rule::range("millageRate", 0.0, 200.0, "Millage rate must be between 0 and 200 mills"),
            Rule::range("exemptions", 0.0, f64::MAX, "Exemptions cannot be negative"),
            Rule::cross(
                "exemptions",
                "Exemptions exceed the assessed value; no tax will be due",
                |f| match (f.number("exemptions"), f.number("assessedValue")) {
                    (Some(exempt), Some(assessed)) => exempt <= assessed,
                    _ => true,
                },
            )
            .warning(),
            Rule::range(
                "specialAssessments",
                0.0,
                f64::MAX,
                "Special assessments cannot be negative",
            ),
            Rule::cross(
                "currentAssessedValue",
                "Current assessed value is required for an appeal",
                |f| present_for(f, &["appeal_savings"], "currentAssessedValue"),
            ),
            Rule::range(
                "currentAssessedValue",
                0.0,
                100_000_000.0,
                "Current assessed value must be between $0 and $100,000,000",
            ),
            Rule::cross(
                "appealedAssessedValue",
                "Appealed assessed value is required for an appeal",
                |f| present_for(f, &["appeal_savings"], "appealedAssessedValue"),
            ),
            Rule::range(
                "appealedAssessedValue",
                0.0,
                100_000_000.0,
                "Appealed assessed value must be between $0 and $100,000,000",
            ),
            Rule::cross(
                "appealedAssessedValue",
                "Appealed assessed value is not below the current assessment",
                |f| match (
                    f.number("appealedAssessedValue"),
                    f.number("currentAssessedValue"),
                ) {
                    (Some(appealed), Some(current)) => appealed < current,
                    _ => true,
                },
            )
            .warning(),
            Rule::range("appealCost", 0.0, f64::MAX, "Appeal cost cannot be negative"),
            Rule::range(
                "successProbability",
                0.0,
                100.0,
                "Success probability must be between 0 and 100",
            ),
            Rule::range("escrowMonths", 1.0, 24.0, "Escrow months must be between 1 and 24"),
            Rule::range("currentBalance", 0.0, f64::MAX, "Current balance cannot be negative"),
            Rule::range("monthlyPayment", 0.0, f64::MAX, "Monthly payment cannot be negative"),
            Rule::range("cushionAmount", 0.0, f64::MAX, "Cushion amount cannot be negative"),
            Rule::cross(
                "cushionAmount",
                "Cushion exceeds the two months of tax a lender may hold",
                |f| match (f.number("cushionAmount"), f.number("annualPropertyTax")) {
                    (Some(cushion), Some(annual)) => cushion <= annual / 6.0 + 0.005,
                    _ => true,
                },
            )
            .warning(),
            Rule::cross(
                "previousAssessedValue",
                "Previous assessed value is required for an assessment change",
                |f| present_for(f, &["assessment_change"], "previousAssessedValue"),
            ),
            Rule::range(
                "previousAssessedValue",
                0.0,
                100_000_000.0,
                "Previous assessed value must be between $0 and $100,000,000",
            ),
            Rule::cross(
                "newAssessedValue",
                "New assessed value is required for an assessment change",
                |f| present_for(f, &["assessment_change"], "newAssessedValue"),
            ),
            Rule::range(
                "newAssessedValue",
                0.0,
                100_000_000.0,
                "New assessed value must be between $0 and $100,000,000",
            ),
            Rule::range(
                "assessmentYear",
                1900.0,
                2100.0,
                "Assessment year must be between 1900 and 2100",
            ),
            Rule::range(
                "homesteadExemption",
                0.0,
                f64::MAX,
                "Homestead exemption cannot be negative",
            ),
            Rule::range(
                "portabilityAmount",
                0.0,
                f64::MAX,
                "Portability amount cannot be negative",
            ),
            Rule::cross(
                "previousYearTax",
                "Previous year tax is required for a tax cap",
                |f| present_for(f, &["tax_cap"], "previousYearTax"),
            ),
            Rule::range("previousYearTax", 0.0, f64::MAX, "Previous year tax cannot be negative"),
            Rule::range(
                "taxCapPercentage",
                0.0,
                100.0,
                "Tax cap percentage must be between 0% and 100%",
            ),
            Rule::one_of("capType", CAP_TYPES, "Valid cap type is required"),
        ]
    }

    fn calculate(input: &PropertyTaxInputs) -> Result<PropertyTaxResult, CalcError> {
        engine::calculate(input).map_err(CalcError::from)
    }

    fn report(_input: &PropertyTaxInputs, output: &PropertyTaxResult) -> String {
        let mut out = String::from("# Property Tax Analysis\n\n");
        match output {
            PropertyTaxResult::Proration(p) => write_proration(&mut out, p),
            PropertyTaxResult::FromAssessedValue(a) => write_assessment(&mut out, a),
            PropertyTaxResult::AppealSavings(a) => {
                let _ = writeln!(out, "## Assessment Appeal\n");
                let _ = writeln!(
                    out,
                    "- Tax at current assessment: {}",
                    money(a.current_annual_tax)
                );
                let _ = writeln!(
                    out,
                    "- Tax at appealed assessment: {}",
                    money(a.appealed_annual_tax)
                );
                let _ = writeln!(out, "- Annual savings: {}", money(a.annual_savings));
                let _ = writeln!(
                    out,
                    "- Expected value at {}% success: {}",
                    fixed(a.success_probability, 0),
                    money(a.expected_value)
                );
                if a.payback_period.is_finite() {
                    let _ = writeln!(out, "- Payback: {} years", fixed(a.payback_period, 2));
                } else {
                    let _ = writeln!(out, "- Payback: never, the appeal saves nothing");
                }
            }
            PropertyTaxResult::Escrow(e) => write_escrow(&mut out, e),
            PropertyTaxResult::AssessmentChange(c) => {
                let _ = writeln!(out, "## Assessment Change\n");
                let _ = writeln!(
                    out,
                    "- Assessed value: {} to {} ({}%)",
                    money(c.previous_assessed_value),
                    money(c.new_assessed_value),
                    fixed(c.percentage_change, 2)
                );
                let _ = writeln!(
                    out,
                    "- Tax: {} to {} (change {})",
                    money(c.previous_tax),
                    money(c.new_tax),
                    money(c.tax_change)
                );
                let _ = writeln!(out, "- Effective rate: {}%", fixed(c.effective_tax_rate, 2));
            }
            PropertyTaxResult::TaxCap(c) => {
                let _ = writeln!(out, "## Tax Cap\n");
                let _ = writeln!(out, "- Calculated tax: {}", money(c.calculated_tax));
                let _ = writeln!(out, "- Tax after cap: {}", money(c.capped_tax));
                if c.cap_applied {
                    let _ = writeln!(out, "- Cap reduced the bill by {}", money(c.cap_amount));
                } else {
                    let _ = writeln!(out, "- Cap not applied");
                }
            }
            PropertyTaxResult::Comprehensive(c) => {
                write_proration(&mut out, &c.proration);
                out.push('\n');
                write_assessment(&mut out, &c.assessment);
                out.push('\n');
                write_escrow(&mut out, &c.escrow);
            }
        }
        out
    }

    fn examples() -> Vec<Example> {
        vec![
            Example {
                title: "Mid-year closing",
                description: "Splits a calendar-year bill at a June closing",
                inputs: mid_year_closing(),
            },
            Example {
                title: "Escrow shortage",
                description: "Escrow balance short of the annual bill plus cushion",
                inputs: json!({
                    "calculationType": "escrow",
                    "annualPropertyTax": 4200,
                    "escrowMonths": 12,
                    "currentBalance": 3500,
                    "cushionAmount": 200
                }),
            },
            Example {
                title: "Appeal an assessment",
                description: "Expected value of contesting an assessment",
                inputs: json!({
                    "calculationType": "appeal_savings",
                    "currentAssessedValue": 320000,
                    "appealedAssessedValue": 290000,
                    "millageRate": 22,
                    "appealCost": 500,
                    "successProbability": 60
                }),
            },
        ]
    }
}

fn write_proration(out: &mut String, p: &Proration) {
    let _ = writeln!(out, "## Proration at Closing\n");
    let _ = writeln!(
        out,
        "- Closing on {}: seller {} days, buyer {} days of {}",
        p.proration_date, p.days_owned_by_seller, p.days_owned_by_buyer, p.total_days_in_period
    );
    let _ = writeln!(out, "- Seller share: {}", money(p.seller_tax_responsibility));
    let _ = writeln!(out, "- Buyer share: {}", money(p.buyer_tax_responsibility));
    let _ = writeln!(out, "- Adjustment at closing: {}", money(p.adjustment_amount));
}

fn write_assessment(out: &mut String, a: &Assessment) {
    let _ = writeln!(out, "## Tax from Assessment\n");
    let _ = writeln!(
        out,
        "- Taxable value: {} at {} mills",
        money(a.taxable_value),
        fixed(a.millage_rate, 2)
    );
    let _ = writeln!(out, "- Annual tax: {}", money(a.annual_property_tax));
    let _ = writeln!(out, "- Total with special assessments: {}", money(a.total_tax_amount));
}

fn write_escrow(out: &mut String, e: &TaxEscrow) {
    let _ = writeln!(out, "## Escrow\n");
    let _ = writeln!(out, "- Monthly escrow: {}", money(e.monthly_escrow_payment));
    let _ = writeln!(out, "- Required balance: {}", money(e.total_escrow_requirement));
    if e.escrow_shortage > 0.0 {
        let _ = writeln!(out, "- Shortage: {}", money(e.escrow_shortage));
    } else {
        let _ = writeln!(out, "- Surplus: {}", money(e.escrow_surplus));
    }
}

fn mid_year_closing() -> Value {
    json!({
        "calculationType": "proration",
        "annualPropertyTax": 3600,
        "salePrice": 450000,
        "closingDate": "2024-06-15",
        "taxYearStart": "2024-01-01",
        "taxYearEnd": "2024-12-31",
        "prorationMethod": "365_day",
        "sellerPaysTax": true
    })
}

#[cfg(test)]
pub(crate) fn sample_inputs() -> PropertyTaxInputs {
    serde_json::from_value(mid_year_closing()).expect("fixture decodes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InputMap;

    fn fixture_map() -> InputMap {
        mid_year_closing().as_object().cloned().expect("object fixture")
    }

    #[test]
    fn fixture_is_clean() {
        let result = registration().validate(&fixture_map(), None);
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn closing_outside_tax_year_is_an_error_and_a_hard_failure() {
        let mut inputs = fixture_map();
        inputs.insert("closingDate".into(), json!("2025-02-01"));
        let result = registration().validate(&inputs, None);
        assert!(result.mentions("Closing date must be within the tax year period"));
        assert!(matches!(
            registration().calculate(&inputs),
            Err(CalcError::PropertyTax(PropertyTaxError::ClosingDateOutsideTaxYear))
        ));
    }

    #[test]
    fn proration_fields_are_required_only_for_proration() {
        let mut inputs = fixture_map();
        inputs.remove("salePrice");
        inputs.remove("closingDate");
        let result = registration().validate(&inputs, None);
        assert!(result.mentions("Sale price is required for proration"));
        assert!(result.mentions("Closing date is required for proration"));

        inputs.insert("calculationType".into(), json!("escrow"));
        assert!(registration().validate(&inputs, None).is_valid);
    }

    #[test]
    fn unknown_calculation_type_fails_validation_and_calculation() {
        let mut inputs = fixture_map();
        inputs.insert("calculationType".into(), json!("transfer_tax"));
        assert!(!registration().validate(&inputs, None).is_valid);
        let err = registration().calculate(&inputs).expect_err("unknown type");
        assert_eq!(
            err.to_string(),
            "unknown property tax calculation type: transfer_tax"
        );
    }

    #[test]
    fn leap_method_outside_leap_year_is_informational() {
        let mut inputs = fixture_map();
        inputs.insert("prorationMethod".into(), json!("366_day"));
        inputs.insert("closingDate".into(), json!("2023-06-15"));
        inputs.insert("taxYearStart".into(), json!("2023-01-01"));
        inputs.insert("taxYearEnd".into(), json!("2023-12-31"));
        let result = registration().validate(&inputs, None);
        assert!(result.is_valid);
        assert!(result.mentions("The 366-day method is normally used only for leap years"));
    }

    #[test]
    fn quick_check_flags_oversized_cushion_as_warning() {
        let mut inputs = fixture_map();
        inputs.insert("calculationType".into(), json!("escrow"));
        let check = registration().quick_validate("cushionAmount", &json!(900), &inputs);
        assert!(check.is_valid);
        assert_eq!(
            check.message.as_deref(),
            Some("Cushion exceeds the two months of tax a lender may hold")
        );
    }

    #[test]
    fn string_amounts_are_coerced_before_dispatch() {
        let mut inputs = fixture_map();
        inputs.insert("annualPropertyTax".into(), json!("3600"));
        let response = registration().calculate(&inputs).expect("calculates");
        assert_eq!(response.output["sellerTaxResponsibility"], json!(1647.12));
    }

    #[test]
    fn report_follows_the_calculation_type() {
        let response = registration().calculate(&fixture_map()).expect("calculates");
        assert!(response.report.starts_with("# Property Tax Analysis"));
        assert!(response.report.contains("- Seller share: $1,647.12"));

        let escrow_example = registration().examples[1].inputs.clone();
        let map = escrow_example.as_object().cloned().expect("object example");
        let response = registration().calculate(&map).expect("calculates");
        assert!(response.report.contains("- Shortage: $900.00"));
    }
}
