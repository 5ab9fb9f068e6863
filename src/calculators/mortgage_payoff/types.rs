use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::amortization::{ScheduleEntry, WalkSummary};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayoffStrategy {
    #[default]
    Standard,
    #[serde(alias = "extra")]
    ExtraMonthly,
    #[serde(alias = "bi-weekly")]
    Biweekly,
    #[serde(alias = "lump")]
    LumpSum,
    Custom,
}

impl PayoffStrategy {
    pub fn label(self) -> &'static str {
        match self {
            PayoffStrategy::Standard => "Standard Payment",
            PayoffStrategy::ExtraMonthly => "Extra Monthly Payment",
            PayoffStrategy::Biweekly => "Bi-weekly Payments",
            PayoffStrategy::LumpSum => "Lump Sum Payment",
            PayoffStrategy::Custom => "Custom Plan",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PayoffInputs {
    pub current_balance: f64,
    pub interest_rate: f64,
    /// Years left on the loan.
    pub remaining_term: f64,
    pub monthly_payment: f64,
    pub extra_payment: f64,
    pub lump_sum_payment: f64,
    pub payoff_strategy: PayoffStrategy,
    /// First schedule month. Defaults to the first of the current month.
    pub start_date: Option<NaiveDate>,
    pub property_value: Option<f64>,
    pub tax_rate: f64,
    pub investment_return: f64,
    pub inflation_rate: f64,
}

impl Default for PayoffInputs {
    fn default() -> Self {
        Self {
            current_balance: 0.0,
            interest_rate: 0.0,
            remaining_term: 0.0,
            monthly_payment: 0.0,
            extra_payment: 0.0,
            lump_sum_payment: 0.0,
            payoff_strategy: PayoffStrategy::Standard,
            start_date: None,
            property_value: None,
            tax_rate: 22.0,
            investment_return: 7.0,
            inflation_rate: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOutcome {
    pub name: &'static str,
    pub strategy: PayoffStrategy,
    pub payoff_date: Option<NaiveDate>,
    pub total_interest: f64,
    pub interest_savings: f64,
    pub time_saved: f64,
    pub months: u32,
    pub monthly_payment: f64,
    pub cost_benefit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffResults {
    pub current_scenario: WalkSummary,
    pub accelerated_scenario: WalkSummary,
    pub payoff_date: Option<NaiveDate>,
    pub total_interest: f64,
    pub interest_saved: f64,
    pub years_saved: f64,
    pub months_saved: i64,
    pub new_monthly_payment: f64,
    pub payoff_schedule: Vec<ScheduleEntry>,
    pub strategies: Vec<StrategyOutcome>,
    pub best_strategy: Option<StrategyOutcome>,
    pub worst_strategy: Option<StrategyOutcome>,
    pub cost_benefit_analysis: String,
    pub recommendations: String,
}
