use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[default]
    Call,
    Put,
}

impl OptionType {
    pub fn label(self) -> &'static str {
        match self {
            OptionType::Call => "CALL",
            OptionType::Put => "PUT",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    LongCall,
    LongPut,
    ShortCall,
    ShortPut,
    CoveredCall,
    ProtectivePut,
    BullSpread,
    BearSpread,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::LongCall => "LONG CALL",
            Strategy::LongPut => "LONG PUT",
            Strategy::ShortCall => "SHORT CALL",
            Strategy::ShortPut => "SHORT PUT",
            Strategy::CoveredCall => "COVERED CALL",
            Strategy::ProtectivePut => "PROTECTIVE PUT",
            Strategy::BullSpread => "BULL SPREAD",
            Strategy::BearSpread => "BEAR SPREAD",
        }
    }

    pub fn is_short(self) -> bool {
        matches!(self, Strategy::ShortCall | Strategy::ShortPut)
    }

    pub fn is_spread(self) -> bool {
        matches!(self, Strategy::BullSpread | Strategy::BearSpread)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StockOptionsInputs {
    pub option_type: OptionType,
    pub strike_price: f64,
    pub current_stock_price: f64,
    /// Premium per share.
    pub option_price: f64,
    pub expiration_date: Option<NaiveDate>,
    pub number_of_contracts: f64,
    /// Shares per contract.
    pub contracts_per_option: f64,
    /// Annualized, percent.
    pub volatility: f64,
    pub risk_free_rate: f64,
    pub dividend_yield: f64,
    pub strategy: Strategy,
    pub days_to_expiration: f64,
    pub second_strike_price: Option<f64>,
    pub second_option_price: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub historical_volatility: Option<f64>,
    pub portfolio_value: f64,
}

impl Default for StockOptionsInputs {
    fn default() -> Self {
        Self {
            option_type: OptionType::Call,
            strike_price: 0.0,
            current_stock_price: 0.0,
            option_price: 0.0,
            expiration_date: None,
            number_of_contracts: 1.0,
            contracts_per_option: 100.0,
            volatility: 0.0,
            risk_free_rate: 0.0,
            dividend_yield: 0.0,
            strategy: Strategy::LongCall,
            days_to_expiration: 0.0,
            second_strike_price: None,
            second_option_price: None,
            implied_volatility: None,
            historical_volatility: None,
            portfolio_value: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub scenario: String,
    pub stock_price: f64,
    /// Per-share value of the option at the scenario price.
    pub option_value: f64,
    pub profit_loss: f64,
    #[serde(rename = "return")]
    pub return_pct: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub strategy: &'static str,
    /// Unbounded upside serializes as `null`.
    pub max_profit: f64,
    pub max_loss: f64,
    pub probability_of_profit: f64,
    pub risk_level: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensitivity {
    pub factor: &'static str,
    pub current_value: f64,
    pub impact: f64,
    pub direction: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOptionsResults {
    pub total_cost: f64,
    pub total_value: f64,
    pub profit_loss: f64,
    pub return_percentage: f64,
    pub intrinsic_value: f64,
    pub time_value: f64,
    pub implied_volatility: f64,
    #[serde(flatten)]
    pub greeks: Greeks,
    pub max_loss: f64,
    pub max_profit: f64,
    pub break_even_price: f64,
    pub probability_of_profit: f64,
    pub expected_value: f64,
    pub strategy_risk: &'static str,
    pub strategy_outlook: &'static str,
    pub optimal_exit_price: f64,
    pub time_decay: f64,
    pub days_to_expiration: f64,
    pub expiration_impact: f64,
    pub volatility_impact: f64,
    pub volatility_risk: &'static str,
    pub volatility_opportunity: &'static str,
    pub scenarios: Vec<Scenario>,
    pub position_size: f64,
    pub portfolio_impact: f64,
    pub margin_requirement: f64,
    pub risk_reward_ratio: f64,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
    pub opportunities: Vec<String>,
    pub market_outlook: &'static str,
    pub volatility_forecast: &'static str,
    pub timing_recommendation: &'static str,
    pub strategy_comparison: Vec<StrategyComparison>,
    pub sensitivity_analysis: Vec<Sensitivity>,
}
