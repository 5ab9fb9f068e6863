use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketConditions {
    Recession,
    #[default]
    Stable,
    Growth,
    Boom,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowType {
    #[default]
    Inflow,
    Outflow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CashFlow {
    pub period: u32,
    pub amount: f64,
    #[serde(rename = "type")]
    pub flow_type: FlowType,
    pub description: String,
}

impl CashFlow {
    pub fn signed_amount(&self) -> f64 {
        match self.flow_type {
            FlowType::Inflow => self.amount,
            FlowType::Outflow => -self.amount,
        }
    }
}

fn lowest_rating() -> f64 {
    1.0
}

/// `totalReturn` is the net gain over the period, not the ending value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoiInputs {
    pub initial_investment: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub investment_period: f64,

    pub additional_revenue: f64,
    pub cost_savings: f64,
    pub operational_costs: f64,
    pub maintenance_costs: f64,
    pub marketing_costs: f64,
    pub personnel_costs: f64,

    pub cash_flows: Vec<CashFlow>,

    pub risk_level: RiskLevel,
    pub market_conditions: MarketConditions,
    #[serde(default = "lowest_rating")]
    pub competitive_pressure: f64,
    #[serde(default = "lowest_rating")]
    pub regulatory_risk: f64,

    pub discount_rate: f64,
    pub inflation_rate: f64,
    pub opportunity_cost: f64,

    pub projection_period: u32,
    pub growth_rate: f64,
    pub decay_rate: f64,

    pub best_case_scenario: f64,
    pub worst_case_scenario: f64,
    pub most_likely_scenario: f64,

    pub tax_rate: f64,
    pub depreciation_rate: f64,
    pub salvage_value: f64,

    pub strategic_value: f64,
    pub competitive_advantage: f64,
    #[serde(alias = "marketPosition")]
    pub market_positioning: f64,
    #[serde(alias = "scalabilityPotential")]
    pub scalability: f64,

    #[serde(rename = "benchmarkROI")]
    pub benchmark_roi: Option<f64>,
    #[serde(rename = "industryAverageROI")]
    pub industry_average_roi: Option<f64>,
    #[serde(rename = "competitorROI")]
    pub competitor_roi: Option<f64>,

    pub investment_type: String,
    pub investment_category: String,
    pub industry: String,
    pub business_stage: String,
    pub business_model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowPoint {
    pub period: u32,
    pub cumulative_cash_flow: f64,
    pub discounted_cash_flow: f64,
    pub payback_status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityCase {
    pub scenario: &'static str,
    pub roi: f64,
    pub npv: f64,
    pub payback_period: f64,
    pub probability: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Excellent,
    Good,
    Average,
    BelowAverage,
    Poor,
}

impl PerformanceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::Average => "average",
            PerformanceTier::BelowAverage => "below_average",
            PerformanceTier::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub metric: &'static str,
    pub your_value: f64,
    pub benchmark: f64,
    pub difference: f64,
    pub performance: PerformanceTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<&'static str>,
    pub risk_score: u32,
    pub mitigation_strategies: Vec<&'static str>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceItem {
    pub category: &'static str,
    pub amount: f64,
    pub percentage: f64,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub period: u32,
    pub projected_value: f64,
    #[serde(rename = "projectedROI")]
    pub projected_roi: f64,
    pub cumulative_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationInsight {
    pub area: &'static str,
    pub current_value: f64,
    pub potential_value: f64,
    pub improvement: f64,
    pub recommendations: [&'static str; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicAnalysis {
    pub strategic_value: f64,
    pub market_positioning: f64,
    pub competitive_advantage: f64,
    pub scalability: f64,
    pub overall_score: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: &'static str,
    pub recommendations: [&'static str; 4],
    pub priority: Priority,
    pub expected_impact: f64,
    pub implementation_time: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessImpact {
    pub metric: &'static str,
    pub current_value: f64,
    pub projected_value: f64,
    pub impact: f64,
    pub timeframe: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub priority: &'static str,
    pub action: &'static str,
    pub owner: &'static str,
    pub timeline: &'static str,
    pub expected_outcome: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiResults {
    #[serde(rename = "basicROI")]
    pub basic_roi: f64,
    #[serde(rename = "annualizedROI")]
    pub annualized_roi: f64,
    #[serde(rename = "adjustedROI")]
    pub adjusted_roi: f64,
    #[serde(rename = "netROI")]
    pub net_roi: f64,
    #[serde(rename = "inflationAdjustedROI")]
    pub inflation_adjusted_roi: f64,

    pub payback_period: f64,
    pub discounted_payback_period: f64,
    pub break_even_point: f64,

    pub net_present_value: f64,
    pub internal_rate_of_return: f64,
    pub modified_internal_rate_of_return: f64,
    pub profitability_index: f64,

    #[serde(rename = "riskAdjustedROI")]
    pub risk_adjusted_roi: f64,
    pub sharpe_ratio: f64,
    pub value_at_risk: f64,
    pub expected_return: f64,

    pub cash_flow_analysis: Vec<CashFlowPoint>,
    pub sensitivity_analysis: Vec<SensitivityCase>,
    #[serde(rename = "expectedROI")]
    pub expected_roi: f64,
    pub comparative_analysis: Vec<Comparison>,
    pub risk_assessment: RiskAssessment,
    pub performance_breakdown: Vec<PerformanceItem>,
    pub projection_analysis: Vec<Projection>,
    pub optimization_insights: Vec<OptimizationInsight>,
    pub strategic_analysis: StrategicAnalysis,
    pub recommendations: Vec<Recommendation>,
    pub business_impact: Vec<BusinessImpact>,
    pub action_items: Vec<ActionItem>,
}
