use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentHistory {
    Perfect,
    #[default]
    Good,
    Fair,
    Poor,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoanType {
    #[default]
    Conventional,
    Fha,
    Va,
    Usda,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    #[default]
    Primary,
    Secondary,
    Investment,
}

impl PropertyType {
    pub fn label(self) -> &'static str {
        match self {
            PropertyType::Primary => "Primary residence",
            PropertyType::Secondary => "Second home",
            PropertyType::Investment => "Investment property",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PmiInputs {
    pub original_loan_amount: f64,
    pub current_balance: f64,
    pub original_home_value: f64,
    pub current_home_value: f64,
    pub down_payment: f64,
    /// Years.
    pub loan_term: f64,
    pub interest_rate: f64,
    /// Total monthly payment including PMI.
    pub monthly_payment: f64,
    /// Annual PMI as a percent of the current balance.
    pub pmi_rate: f64,
    pub loan_start_date: Option<NaiveDate>,
    /// Date the analysis is run for. Defaults to today.
    pub as_of_date: Option<NaiveDate>,
    pub payment_history: PaymentHistory,
    pub loan_type: LoanType,
    pub property_type: PropertyType,
    pub appreciation_rate: f64,
    pub additional_payments: f64,
    pub lump_sum_payment: f64,
    pub appraisal_fee: f64,
    pub title_search_fee: f64,
    pub other_fees: f64,
    pub marginal_tax_rate: f64,
    pub state_tax_rate: f64,
}

impl Default for PmiInputs {
    fn default() -> Self {
        Self {
            original_loan_amount: 0.0,
            current_balance: 0.0,
            original_home_value: 0.0,
            current_home_value: 0.0,
            down_payment: 0.0,
            loan_term: 30.0,
            interest_rate: 0.0,
            monthly_payment: 0.0,
            pmi_rate: 0.0,
            loan_start_date: None,
            as_of_date: None,
            payment_history: PaymentHistory::Good,
            loan_type: LoanType::Conventional,
            property_type: PropertyType::Primary,
            appreciation_rate: 3.0,
            additional_payments: 0.0,
            lump_sum_payment: 0.0,
            appraisal_fee: 0.0,
            title_search_fee: 0.0,
            other_fees: 0.0,
            marginal_tax_rate: 0.0,
            state_tax_rate: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendedAction {
    CancelNow,
    RequestLenderCancellation,
    WaitForAutomatic,
}

impl RecommendedAction {
    pub fn label(self) -> &'static str {
        match self {
            RecommendedAction::CancelNow => "Cancel Now",
            RecommendedAction::RequestLenderCancellation => "Request Lender Cancellation",
            RecommendedAction::WaitForAutomatic => "Wait for Automatic",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LtvPoint {
    pub year: u32,
    pub loan_balance: f64,
    pub home_value: f64,
    pub ltv: f64,
}

/// Waiting for the balance to reach a given LTV threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdScenario {
    pub target_ltv: f64,
    pub months_to_cancellation: f64,
    pub total_pmi_paid: f64,
    pub total_savings: f64,
    pub net_benefit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_probability: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImmediateScenario {
    pub total_cost: f64,
    pub monthly_savings: f64,
    pub break_even_months: f64,
    pub net_benefit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PmiResults {
    #[serde(rename = "currentLTV")]
    pub current_ltv: f64,
    #[serde(rename = "originalLTV")]
    pub original_ltv: f64,
    /// LTV after the lump sum is applied.
    #[serde(rename = "adjustedLTV")]
    pub adjusted_ltv: f64,
    #[serde(rename = "currentPMI")]
    pub current_pmi: f64,
    #[serde(rename = "annualPMISavings")]
    pub annual_pmi_savings: f64,
    #[serde(rename = "totalPMISavings")]
    pub total_pmi_savings: f64,
    pub after_tax_monthly_savings: f64,
    pub new_monthly_payment: f64,
    pub equity_gain: f64,
    pub equity_percentage: f64,
    pub months_since_start: u32,
    pub months_to_cancellation: f64,
    pub pmi_cancellation_date: Option<NaiveDate>,
    pub cancellation_method: String,
    pub requirements: String,
    pub ltv_projection: Vec<LtvPoint>,
    pub total_cancellation_cost: f64,
    pub break_even_months: f64,
    pub automatic_scenario: ThresholdScenario,
    pub lender_scenario: ThresholdScenario,
    pub immediate_scenario: ImmediateScenario,
    pub recommended_action: RecommendedAction,
    pub confidence_level: Confidence,
    pub analysis: String,
}
