//! Business return on investment: ratio metrics, discounted cash flow,
//! risk adjustment and the narrative analysis built on top of them.

mod engine;
mod report;
pub mod types;

use serde_json::{Value, json};

use crate::core::{
    CalcError, Calculator, Example, FieldKind, Fields, InputField, Meta, OutputField,
    Registration, Rule,
};

pub use engine::calculate;
pub use types::{RoiInputs, RoiResults};

pub struct Roi;

const RISK_LEVELS: &[&str] = &["low", "medium", "high"];
const MARKET_CONDITIONS: &[&str] = &["recession", "stable", "growth", "boom"];

pub fn registration() -> Registration {
    Registration::of::<Roi>()
}

impl Calculator for Roi {
    type Input = RoiInputs;
    type Output = RoiResults;

    fn meta() -> Meta {
        Meta {
            id: "business-roi",
            title: "Return on Investment (ROI) Calculator",
            category: "business",
            subcategory: "investment-analysis",
            description: "Basic, annualized, risk-adjusted and discounted returns with payback, \
                          NPV/IRR, sensitivity and strategic analysis",
        }
    }

    fn inputs() -> Vec<InputField> {
        vec![
            InputField::currency("initialInvestment", "Initial Investment")
                .required()
                .range(0.01, 1e9),
            InputField::currency("finalValue", "Final Value").required().range(0.0, 1e10),
            InputField::currency("totalReturn", "Total Return"),
            InputField::integer("investmentPeriod", "Investment Period (months)")
                .required()
                .range(1.0, 600.0),
            InputField::currency("additionalRevenue", "Monthly Additional Revenue"),
            InputField::currency("costSavings", "Monthly Cost Savings"),
            InputField::currency("operationalCosts", "Operational Costs"),
            InputField::currency("maintenanceCosts", "Maintenance Costs"),
            InputField::currency("marketingCosts", "Marketing Costs"),
            InputField::currency("personnelCosts", "Personnel Costs"),
            InputField::new("cashFlows", "Cash Flows", FieldKind::List),
            InputField::select("riskLevel", "Risk Level", RISK_LEVELS)
                .required()
                .default_value("medium"),
            InputField::select("marketConditions", "Market Conditions", MARKET_CONDITIONS)
                .required()
                .default_value("stable"),
            InputField::integer("competitivePressure", "Competitive Pressure").range(1.0, 10.0),
            InputField::integer("regulatoryRisk", "Regulatory Risk").range(1.0, 10.0),
            InputField::percentage("discountRate", "Discount Rate").range(0.0, 100.0),
            InputField::percentage("inflationRate", "Inflation Rate"),
            InputField::percentage("opportunityCost", "Opportunity Cost"),
            InputField::integer("projectionPeriod", "Projection Period (months)").range(1.0, 600.0),
            InputField::percentage("growthRate", "Growth Rate"),
            InputField::percentage("decayRate", "Decay Rate"),
            InputField::percentage("bestCaseScenario", "Best Case ROI").range(-100.0, 1000.0),
            InputField::percentage("worstCaseScenario", "Worst Case ROI").range(-100.0, 1000.0),
            InputField::percentage("mostLikelyScenario", "Most Likely ROI")
                .range(-100.0, 1000.0),
            InputField::percentage("taxRate", "Tax Rate").range(0.0, 100.0),
            InputField::percentage("depreciationRate", "Depreciation Rate"),
            InputField::currency("salvageValue", "Salvage Value"),
            InputField::integer("strategicValue", "Strategic Value").range(1.0, 10.0),
            InputField::integer("competitiveAdvantage", "Competitive Advantage").range(1.0, 10.0),
            InputField::integer("marketPositioning", "Market Positioning").range(1.0, 10.0),
            InputField::integer("scalability", "Scalability").range(1.0, 10.0),
            InputField::percentage("benchmarkROI", "Benchmark ROI"),
            InputField::percentage("industryAverageROI", "Industry Average ROI"),
            InputField::percentage("competitorROI", "Competitor ROI"),
            InputField::new("investmentType", "Investment Type", FieldKind::Text),
            InputField::new("investmentCategory", "Investment Category", FieldKind::Text),
            InputField::new("industry", "Industry", FieldKind::Text),
            InputField::new("businessStage", "Business Stage", FieldKind::Text),
            InputField::new("businessModel", "Business Model", FieldKind::Text),
        ]
    }

    fn outputs() -> Vec<OutputField> {
        vec![
            OutputField::new("basicROI", "Basic ROI", FieldKind::Percentage),
            OutputField::new("annualizedROI", "Annualized ROI", FieldKind::Percentage),
            OutputField::new("riskAdjustedROI", "Risk-Adjusted ROI", FieldKind::Percentage),
            OutputField::new("netROI", "Net ROI", FieldKind::Percentage),
            OutputField::new("paybackPeriod", "Payback Period (months)", FieldKind::Number),
            OutputField::new("netPresentValue", "Net Present Value", FieldKind::Currency),
            OutputField::new("internalRateOfReturn", "IRR", FieldKind::Percentage),
            OutputField::new("profitabilityIndex", "Profitability Index", FieldKind::Number),
            OutputField::new("valueAtRisk", "Value at Risk", FieldKind::Currency),
        ]
    }

    fn rules() -> Vec<Rule> {
        let mut rules = vec![
            Rule::required("initialInvestment", "Initial investment is required"),
            Rule::range(
                "initialInvestment",
                0.01,
                1e9,
                "Initial investment must be between $0.01 and $1 billion",
            )
            .full_only(),
            Rule::range(
                "initialInvestment",
                0.01,
                f64::INFINITY,
                "Initial investment must be at least $0.01",
            )
            .quick_only(),
            Rule::range(
                "initialInvestment",
                f64::NEG_INFINITY,
                1e9,
                "Initial investment cannot exceed $1 billion",
            )
            .quick_only(),
            Rule::required("finalValue", "Final value is required"),
            Rule::range(
                "finalValue",
                0.0,
                1e10,
                "Final value must be between $0 and $10 billion",
            )
            .full_only(),
            Rule::range("finalValue", 0.0, f64::INFINITY, "Final value cannot be negative")
                .quick_only(),
            Rule::cross(
                "finalValue",
                "Final value seems too low relative to initial investment",
                |f| match (f.number("finalValue"), f.number("initialInvestment")) {
                    (Some(fv), Some(init)) => fv >= init * 0.1,
                    _ => true,
                },
            )
            .warning(),
            Rule::cross(
                "totalReturn",
                "Total return should be consistent with final value and initial investment",
                total_return_reconciles,
            ),
            Rule::required("investmentPeriod", "Investment period is required"),
            Rule::range(
                "investmentPeriod",
                1.0,
                600.0,
                "Investment period must be between 1 and 600 months",
            ),
            Rule::cross(
                "investmentPeriod",
                "Investment period seems too long for marketing investments",
                |f| !(f.text("investmentType") == Some("marketing")
                    && f.number("investmentPeriod").is_some_and(|p| p > 60.0)),
            ),
            Rule::required("riskLevel", "Risk level is required"),
            Rule::one_of("riskLevel", RISK_LEVELS, "Risk level must be low, medium, or high"),
            Rule::required("marketConditions", "Market conditions are required"),
            Rule::one_of(
                "marketConditions",
                MARKET_CONDITIONS,
                "Market conditions must be recession, stable, growth, or boom",
            ),
            Rule::range(
                "discountRate",
                0.0,
                100.0,
                "Discount rate must be between 0% and 100%",
            ),
            Rule::cross(
                "discountRate",
                "Discount rate seems too high for real-estate investments in stable market conditions",
                |f| !(f.text("investmentType") == Some("real-estate")
                    && f.text("marketConditions").is_none_or(|m| m == "stable")
                    && f.number("discountRate").is_some_and(|dr| dr > 15.0)),
            ),
            Rule::range(
                "projectionPeriod",
                1.0,
                600.0,
                "Projection period must be between 1 and 600 months",
            ),
            Rule::range("taxRate", 0.0, 100.0, "Tax rate must be between 0% and 100%"),
            Rule::cross("taxRate", "Tax rate seems unusually high", |f| {
                f.number("taxRate").is_none_or(|t| t <= 50.0)
            })
            .warning(),
        ];

        for (field, label) in [
            ("competitivePressure", "Competitive pressure"),
            ("regulatoryRisk", "Regulatory risk"),
        ] {
            rules.push(
                Rule::range(field, 1.0, 10.0, format!("{label} must be between 1 and 10"))
                    .full_only(),
            );
            rules.push(
                Rule::range(field, 1.0, f64::INFINITY, format!("{label} must be at least 1"))
                    .quick_only(),
            );
            rules.push(
                Rule::range(field, f64::NEG_INFINITY, 10.0, format!("{label} cannot exceed 10"))
                    .quick_only(),
            );
        }

        for (field, label) in [
            ("strategicValue", "Strategic value"),
            ("competitiveAdvantage", "Competitive advantage"),
            ("marketPositioning", "Market positioning"),
            ("scalability", "Scalability"),
        ] {
            rules.push(Rule::range(
                field,
                1.0,
                10.0,
                format!("{label} must be between 1 and 10"),
            ));
        }
        rules.push(
            Rule::cross(
                "strategicValue",
                "Startups typically have high strategic value",
                |f| startup_rating_is_high(f, "strategicValue"),
            )
            .info(),
        );
        rules.push(
            Rule::cross(
                "scalability",
                "Startups typically have high scalability potential",
                |f| startup_rating_is_high(f, "scalability"),
            )
            .info(),
        );

        for (field, label) in [
            ("bestCaseScenario", "Best case scenario"),
            ("worstCaseScenario", "Worst case scenario"),
            ("mostLikelyScenario", "Most likely scenario"),
        ] {
            rules.push(Rule::range(
                field,
                -100.0,
                1000.0,
                format!("{label} must be between -100% and 1000%"),
            ));
        }
        rules.extend([
            Rule::cross(
                "bestCaseScenario",
                "Scenario values should be logically consistent",
                |f| scenario_pair_ordered(f, "worstCaseScenario", "mostLikelyScenario")
                    && scenario_pair_ordered(f, "mostLikelyScenario", "bestCaseScenario")
                    && scenario_pair_ordered(f, "worstCaseScenario", "bestCaseScenario"),
            )
            .full_only(),
            Rule::cross(
                "bestCaseScenario",
                "Best case scenario should be higher than worst case scenario",
                |f| scenario_pair_ordered(f, "worstCaseScenario", "bestCaseScenario"),
            )
            .quick_only(),
            Rule::cross(
                "worstCaseScenario",
                "Worst case scenario should be lower than best case scenario",
                |f| scenario_pair_ordered(f, "worstCaseScenario", "bestCaseScenario"),
            )
            .quick_only(),
            Rule::cross(
                "mostLikelyScenario",
                "Most likely scenario should be lower than best case scenario",
                |f| scenario_pair_ordered(f, "mostLikelyScenario", "bestCaseScenario"),
            )
            .quick_only(),
            Rule::cross(
                "mostLikelyScenario",
                "Most likely scenario should be higher than worst case scenario",
                |f| scenario_pair_ordered(f, "worstCaseScenario", "mostLikelyScenario"),
            )
            .quick_only(),
            Rule::cross(
                "cashFlows",
                "Cash flow periods must be positive whole months",
                cash_flow_periods_are_positive_integers,
            ),
        ]);
        rules
    }

    fn calculate(input: &RoiInputs) -> Result<RoiResults, CalcError> {
        Ok(engine::calculate(input))
    }

    fn report(input: &RoiInputs, output: &RoiResults) -> String {
        report::render(input, output)
    }

    fn examples() -> Vec<Example> {
        vec![
            Example {
                title: "Technology capital expenditure",
                description: "100k system upgrade returning 50k over a year with staged cash flows",
                inputs: technology_upgrade(),
            },
            Example {
                title: "Marketing campaign",
                description: "Six-month campaign with modest cost savings in a growth market",
                inputs: json!({
                    "initialInvestment": 25000,
                    "finalValue": 32000,
                    "totalReturn": 7000,
                    "investmentPeriod": 6,
                    "additionalRevenue": 2500,
                    "costSavings": 0,
                    "operationalCosts": 1500,
                    "riskLevel": "high",
                    "marketConditions": "growth",
                    "competitivePressure": 8,
                    "regulatoryRisk": 2,
                    "discountRate": 8,
                    "inflationRate": 3,
                    "opportunityCost": 5,
                    "projectionPeriod": 12,
                    "growthRate": 5,
                    "bestCaseScenario": 45,
                    "worstCaseScenario": -10,
                    "mostLikelyScenario": 28,
                    "taxRate": 21,
                    "strategicValue": 6,
                    "competitiveAdvantage": 5,
                    "marketPositioning": 7,
                    "scalability": 6,
                    "investmentType": "marketing",
                    "investmentCategory": "growth",
                    "industry": "retail",
                    "businessStage": "growth",
                    "businessModel": "b2c"
                }),
            },
        ]
    }
}

fn total_return_reconciles(f: &Fields<'_>) -> bool {
    match (
        f.number("totalReturn"),
        f.number("finalValue"),
        f.number("initialInvestment"),
    ) {
        (Some(total), Some(fv), Some(init)) => {
            let expected = fv - init;
            (total - expected).abs() <= (expected.abs() * 0.1).max(0.01)
        }
        _ => true,
    }
}

fn startup_rating_is_high(f: &Fields<'_>, field: &str) -> bool {
    f.text("businessStage") != Some("startup") || f.number(field).is_none_or(|v| v >= 6.0)
}

fn scenario_pair_ordered(f: &Fields<'_>, lower: &str, upper: &str) -> bool {
    match (f.number(lower), f.number(upper)) {
        (Some(lo), Some(hi)) => lo <= hi,
        _ => true,
    }
}

fn cash_flow_periods_are_positive_integers(f: &Fields<'_>) -> bool {
    f.list("cashFlows").is_none_or(|flows| {
        flows.iter().all(|flow| {
            flow.get("period")
                .and_then(crate::core::rules::coerce_number)
                .is_some_and(|p| p > 0.0 && p.fract() == 0.0)
        })
    })
}

fn technology_upgrade() -> Value {
    json!({
        "initialInvestment": 100000,
        "finalValue": 150000,
        "totalReturn": 50000,
        "investmentPeriod": 12,
        "additionalRevenue": 20000,
        "costSavings": 10000,
        "operationalCosts": 5000,
        "maintenanceCosts": 2000,
        "marketingCosts": 8000,
        "personnelCosts": 15000,
        "cashFlows": [
            {"period": 1, "amount": 5000, "type": "inflow", "description": "Initial savings"},
            {"period": 6, "amount": 10000, "type": "inflow", "description": "Mid-year revenue"},
            {"period": 12, "amount": 15000, "type": "inflow", "description": "Year-end return"}
        ],
        "riskLevel": "medium",
        "marketConditions": "stable",
        "competitivePressure": 6,
        "regulatoryRisk": 4,
        "discountRate": 10,
        "inflationRate": 2,
        "opportunityCost": 8,
        "projectionPeriod": 24,
        "growthRate": 15,
        "decayRate": 5,
        "bestCaseScenario": 80,
        "worstCaseScenario": 20,
        "mostLikelyScenario": 50,
        "taxRate": 25,
        "depreciationRate": 10,
        "salvageValue": 5000,
        "strategicValue": 8,
        "competitiveAdvantage": 7,
        "marketPositioning": 6,
        "scalability": 8,
        "investmentType": "capital-expenditure",
        "investmentCategory": "technology",
        "industry": "technology",
        "businessStage": "growth",
        "businessModel": "b2b"
    })
}

#[cfg(test)]
pub(crate) fn sample_inputs() -> RoiInputs {
    serde_json::from_value(technology_upgrade()).expect("fixture decodes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InputMap;

    fn fixture_map() -> InputMap {
        technology_upgrade().as_object().cloned().expect("object fixture")
    }

    fn validate(inputs: &InputMap) -> crate::core::ValidationResult {
        registration().validate(inputs, None)
    }

    #[test]
    fn fixture_is_valid() {
        let result = validate(&fixture_map());
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn missing_initial_investment_is_named() {
        let mut inputs = fixture_map();
        inputs.remove("initialInvestment");
        let result = validate(&inputs);
        assert!(!result.is_valid);
        assert!(result.mentions("Initial investment is required"));
    }

    #[test]
    fn negative_investment_and_bad_scenarios_are_both_reported() {
        let mut inputs = fixture_map();
        inputs.insert("initialInvestment".into(), json!(-1000));
        inputs.insert("bestCaseScenario".into(), json!(30));
        inputs.insert("worstCaseScenario".into(), json!(50));
        let result = validate(&inputs);

        assert!(!result.is_valid);
        assert!(result.mentions("Initial investment must be between $0.01 and $1 billion"));
        assert!(result.mentions("Scenario values should be logically consistent"));
    }

    #[test]
    fn business_rules_reject_inconsistent_inputs() {
        let mut inputs = fixture_map();
        inputs.insert("totalReturn".into(), json!(200000));
        assert!(validate(&inputs).mentions(
            "Total return should be consistent with final value and initial investment"
        ));

        let mut inputs = fixture_map();
        inputs.insert("investmentPeriod".into(), json!(400));
        inputs.insert("investmentType".into(), json!("marketing"));
        let result = validate(&inputs);
        assert!(!result.is_valid);
        assert!(result.mentions("Investment period seems too long for marketing investments"));

        let mut inputs = fixture_map();
        inputs.insert("discountRate".into(), json!(30));
        inputs.insert("investmentType".into(), json!("real-estate"));
        assert!(validate(&inputs).mentions(
            "Discount rate seems too high for real-estate investments in stable market conditions"
        ));
    }

    #[test]
    fn rule_severities() {
        let is_error = |result: &crate::core::ValidationResult, msg: &str| {
            result.errors.iter().any(|issue| issue.message == msg)
        };
        let is_warning = |result: &crate::core::ValidationResult, msg: &str| {
            result.warnings.iter().any(|issue| issue.message == msg)
        };

        let mut inputs = fixture_map();
        inputs.insert("investmentPeriod".into(), json!(72));
        inputs.insert("investmentType".into(), json!("marketing"));
        let result = validate(&inputs);
        assert!(!result.is_valid);
        assert!(is_error(&result, "Investment period seems too long for marketing investments"));

        let mut inputs = fixture_map();
        inputs.insert("discountRate".into(), json!(20));
        inputs.insert("investmentType".into(), json!("real-estate"));
        let result = validate(&inputs);
        assert!(is_error(
            &result,
            "Discount rate seems too high for real-estate investments in stable market conditions"
        ));

        let mut inputs = fixture_map();
        inputs.insert("taxRate".into(), json!(55));
        let result = validate(&inputs);
        assert!(result.is_valid);
        assert!(is_warning(&result, "Tax rate seems unusually high"));
        inputs.insert("taxRate".into(), json!(50));
        assert!(!validate(&inputs).mentions("Tax rate seems unusually high"));
    }

    #[test]
    fn projection_period_is_bounded() {
        let mut inputs = fixture_map();
        inputs.insert("projectionPeriod".into(), json!(5_000_000));
        let result = validate(&inputs);
        assert!(!result.is_valid);
        assert!(result.mentions("Projection period must be between 1 and 600 months"));
    }

    #[test]
    fn quick_validation_uses_field_level_messages() {
        let reg = registration();
        let base = fixture_map();

        let check = reg.quick_validate("initialInvestment", &json!(""), &base);
        assert_eq!(check.message.as_deref(), Some("Initial investment is required"));
        let check = reg.quick_validate("initialInvestment", &json!(-1000), &base);
        assert_eq!(
            check.message.as_deref(),
            Some("Initial investment must be at least $0.01")
        );
        let check = reg.quick_validate("initialInvestment", &json!(2_000_000_000.0), &base);
        assert_eq!(
            check.message.as_deref(),
            Some("Initial investment cannot exceed $1 billion")
        );
        assert!(reg.quick_validate("initialInvestment", &json!(100000), &base).is_valid);

        let check = reg.quick_validate("competitivePressure", &json!(12), &base);
        assert!(!check.is_valid);
        assert_eq!(check.message.as_deref(), Some("Competitive pressure cannot exceed 10"));
        let check = reg.quick_validate("regulatoryRisk", &json!(0), &base);
        assert_eq!(check.message.as_deref(), Some("Regulatory risk must be at least 1"));

        let mut scenarios = base.clone();
        scenarios.insert("worstCaseScenario".into(), json!(50));
        let check = reg.quick_validate("bestCaseScenario", &json!(30), &scenarios);
        assert_eq!(
            check.message.as_deref(),
            Some("Best case scenario should be higher than worst case scenario")
        );
        let check = reg.quick_validate("mostLikelyScenario", &json!(90), &base);
        assert_eq!(
            check.message.as_deref(),
            Some("Most likely scenario should be lower than best case scenario")
        );
    }

    #[test]
    fn advisory_notes_do_not_block() {
        let reg = registration();
        let mut startup = fixture_map();
        startup.insert("businessStage".into(), json!("startup"));

        let check = reg.quick_validate("strategicValue", &json!(5), &startup);
        assert!(check.is_valid);
        assert_eq!(
            check.message.as_deref(),
            Some("Startups typically have high strategic value")
        );

        let check = reg.quick_validate("taxRate", &json!(60), &fixture_map());
        assert!(check.is_valid);
        assert_eq!(check.message.as_deref(), Some("Tax rate seems unusually high"));
    }

    #[test]
    fn fractional_cash_flow_period_is_rejected() {
        let mut inputs = fixture_map();
        inputs.insert(
            "cashFlows".into(),
            json!([{"period": 1.5, "amount": 100, "type": "inflow"}]),
        );
        assert!(validate(&inputs).mentions("Cash flow periods must be positive whole months"));
    }

    #[test]
    fn calculate_through_registration_coerces_strings() {
        let mut inputs = fixture_map();
        inputs.insert("initialInvestment".into(), json!("100000"));
        inputs.insert("investmentPeriod".into(), json!("12"));
        let response = registration().calculate(&inputs).expect("calculates");

        assert_eq!(response.output["basicROI"], json!(50.0));
        assert_eq!(response.output["netROI"], json!(37.5));
        assert!(response.report.starts_with("# ROI Analysis Report"));
        assert!(response.report.contains("- **Basic ROI**: 50.0%"));
    }

    #[test]
    fn infinite_payback_serializes_as_null() {
        let mut inputs = fixture_map();
        inputs.insert("additionalRevenue".into(), json!(0));
        inputs.insert("costSavings".into(), json!(0));
        let response = registration().calculate(&inputs).expect("calculates");
        assert_eq!(response.output["paybackPeriod"], Value::Null);
        assert!(response.report.contains("- **Payback Period**: n/a months"));
    }
}
