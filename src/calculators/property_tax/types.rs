use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ProrationMethod {
    #[default]
    #[serde(rename = "365_day")]
    Banker365,
    #[serde(rename = "366_day")]
    Leap366,
    #[serde(rename = "actual_days")]
    ActualDays,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapType {
    HardCap,
    #[default]
    SoftCap,
    NoCap,
}

/// One flat record for every calculation type; each branch reads the fields
/// it needs and ignores the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyTaxInputs {
    pub calculation_type: String,

    pub annual_property_tax: Option<f64>,
    pub sale_price: Option<f64>,
    pub closing_date: Option<NaiveDate>,
    pub tax_year_start: Option<NaiveDate>,
    pub tax_year_end: Option<NaiveDate>,
    pub proration_method: ProrationMethod,
    pub seller_pays_tax: bool,

    pub assessed_value: Option<f64>,
    /// Dollars per $1,000 of taxable value.
    pub millage_rate: Option<f64>,
    pub exemptions: Option<f64>,
    pub special_assessments: Option<f64>,

    pub current_assessed_value: Option<f64>,
    pub appealed_assessed_value: Option<f64>,
    pub appeal_cost: Option<f64>,
    pub success_probability: Option<f64>,

    pub escrow_months: Option<f64>,
    pub current_balance: Option<f64>,
    pub monthly_payment: Option<f64>,
    pub cushion_amount: Option<f64>,

    pub previous_assessed_value: Option<f64>,
    pub new_assessed_value: Option<f64>,
    pub assessment_year: Option<i32>,
    pub homestead_exemption: Option<f64>,
    pub portability_amount: Option<f64>,

    pub previous_year_tax: Option<f64>,
    pub tax_cap_percentage: Option<f64>,
    pub cap_type: CapType,
}

impl Default for PropertyTaxInputs {
    fn default() -> Self {
        Self {
            calculation_type: "proration".to_string(),
            annual_property_tax: None,
            sale_price: None,
            closing_date: None,
            tax_year_start: None,
            tax_year_end: None,
            proration_method: ProrationMethod::Banker365,
            seller_pays_tax: true,
            assessed_value: None,
            millage_rate: None,
            exemptions: None,
            special_assessments: None,
            current_assessed_value: None,
            appealed_assessed_value: None,
            appeal_cost: None,
            success_probability: None,
            escrow_months: None,
            current_balance: None,
            monthly_payment: None,
            cushion_amount: None,
            previous_assessed_value: None,
            new_assessed_value: None,
            assessment_year: None,
            homestead_exemption: None,
            portability_amount: None,
            previous_year_tax: None,
            tax_cap_percentage: None,
            cap_type: CapType::SoftCap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proration {
    pub annual_property_tax: f64,
    pub sale_price: f64,
    pub days_owned_by_seller: i64,
    pub days_owned_by_buyer: i64,
    pub total_days_in_period: i64,
    pub seller_tax_responsibility: f64,
    pub buyer_tax_responsibility: f64,
    pub proration_date: NaiveDate,
    pub tax_year_start: NaiveDate,
    pub tax_year_end: NaiveDate,
    pub proration_method: ProrationMethod,
    pub seller_pays_tax: bool,
    pub adjustment_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub assessed_value: f64,
    pub millage_rate: f64,
    pub exemptions: f64,
    pub taxable_value: f64,
    pub annual_property_tax: f64,
    pub special_assessments: f64,
    pub total_tax_amount: f64,
    /// Effective rate against the full assessed value.
    pub tax_rate_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealSavings {
    pub current_assessed_value: f64,
    pub appealed_assessed_value: f64,
    pub millage_rate: f64,
    pub current_annual_tax: f64,
    pub appealed_annual_tax: f64,
    pub annual_savings: f64,
    pub appeal_cost: f64,
    pub net_annual_savings: f64,
    pub success_probability: f64,
    pub expected_value: f64,
    /// Years of savings needed to recover the appeal cost.
    pub payback_period: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxEscrow {
    pub annual_property_tax: f64,
    pub escrow_months: f64,
    pub monthly_escrow_payment: f64,
    pub annual_escrow_payment: f64,
    pub current_balance: f64,
    pub monthly_payment: f64,
    pub cushion_amount: f64,
    pub total_escrow_requirement: f64,
    pub escrow_shortage: f64,
    pub escrow_surplus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentChange {
    pub previous_assessed_value: f64,
    pub new_assessed_value: f64,
    pub millage_rate: f64,
    pub assessment_year: Option<i32>,
    pub value_change: f64,
    pub percentage_change: f64,
    pub previous_tax: f64,
    pub new_tax: f64,
    pub tax_change: f64,
    pub homestead_exemption: f64,
    pub portability_amount: f64,
    pub taxable_value_change: f64,
    pub effective_tax_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCap {
    pub assessed_value: f64,
    pub previous_year_tax: f64,
    pub tax_cap_percentage: f64,
    pub millage_rate: f64,
    pub cap_type: CapType,
    pub calculated_tax: f64,
    pub capped_tax: f64,
    pub tax_increase: f64,
    pub cap_applied: bool,
    pub cap_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveSummary {
    pub annual_property_tax: f64,
    pub assessed_value: f64,
    pub millage_rate: f64,
    pub seller_proration_amount: f64,
    pub buyer_proration_amount: f64,
    pub monthly_escrow_payment: f64,
    pub total_tax_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comprehensive {
    pub proration: Proration,
    pub assessment: Assessment,
    pub escrow: TaxEscrow,
    pub summary: ComprehensiveSummary,
}

/// Result of one dispatch, tagged with the calculation type that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "calculationType", rename_all = "snake_case")]
pub enum PropertyTaxResult {
    Proration(Proration),
    FromAssessedValue(Assessment),
    AppealSavings(AppealSavings),
    Escrow(TaxEscrow),
    AssessmentChange(AssessmentChange),
    TaxCap(TaxCap),
    Comprehensive(Comprehensive),
}
