use crate::core::round2;
use crate::core::solver::{self, DatedFlow, discount_factor};

use super::types::*;

const ASSUMED_VOLATILITY: f64 = 15.0;
const VAR_Z_SCORE: f64 = 1.645;
/// Longest month-by-month projection built, whatever the input asks for.
pub const MAX_PROJECTION_MONTHS: u32 = 600;

pub fn basic_roi(total_return: f64, initial_investment: f64) -> f64 {
    if initial_investment <= 0.0 {
        return 0.0;
    }
    total_return / initial_investment * 100.0
}

pub fn annualized_roi(total_return: f64, initial_investment: f64, period_months: f64) -> f64 {
    if initial_investment <= 0.0 || period_months <= 0.0 {
        return 0.0;
    }
    let growth = 1.0 + total_return / initial_investment;
    (growth.powf(12.0 / period_months) - 1.0) * 100.0
}

/// ROI against the initial outlay grown at the discount rate over the period.
fn adjusted_roi(inputs: &RoiInputs) -> f64 {
    if inputs.initial_investment <= 0.0 {
        return 0.0;
    }
    let adjusted = inputs.initial_investment
        * (1.0 + inputs.discount_rate / 100.0).powf(inputs.investment_period / 12.0);
    (inputs.final_value - adjusted) / adjusted * 100.0
}

fn net_roi(inputs: &RoiInputs) -> f64 {
    if inputs.initial_investment <= 0.0 {
        return 0.0;
    }
    let after_tax = inputs.total_return * (1.0 - inputs.tax_rate / 100.0);
    after_tax / inputs.initial_investment * 100.0
}

fn inflation_adjusted_roi(inputs: &RoiInputs) -> f64 {
    if inputs.initial_investment <= 0.0 {
        return 0.0;
    }
    let real_cost = inputs.initial_investment
        * (1.0 + inputs.inflation_rate / 100.0).powf(inputs.investment_period / 12.0);
    (inputs.final_value - real_cost) / inputs.initial_investment * 100.0
}

/// Months until the monthly benefit covers the outlay.
pub fn payback_period(inputs: &RoiInputs) -> f64 {
    if inputs.initial_investment <= 0.0 {
        return 0.0;
    }
    let monthly = inputs.additional_revenue + inputs.cost_savings;
    if monthly > 0.0 {
        inputs.initial_investment / monthly
    } else {
        f64::INFINITY
    }
}

fn discounted_payback_period(inputs: &RoiInputs) -> f64 {
    if inputs.initial_investment <= 0.0 || inputs.cash_flows.is_empty() {
        return 0.0;
    }
    let rate = inputs.discount_rate / 100.0;
    let mut cumulative = 0.0;
    for flow in &inputs.cash_flows {
        cumulative += flow.signed_amount() / discount_factor(rate, flow.period);
        if cumulative >= inputs.initial_investment {
            return flow.period as f64;
        }
    }
    f64::INFINITY
}

fn dated_flows(inputs: &RoiInputs) -> Vec<DatedFlow> {
    inputs
        .cash_flows
        .iter()
        .map(|flow| DatedFlow {
            period: flow.period,
            amount: flow.signed_amount(),
        })
        .collect()
}

fn risk_multiplier(risk: RiskLevel) -> f64 {
    match risk {
        RiskLevel::Low => 1.0,
        RiskLevel::Medium => 0.85,
        RiskLevel::High => 0.7,
    }
}

fn market_multiplier(market: MarketConditions) -> f64 {
    match market {
        MarketConditions::Recession => 0.8,
        MarketConditions::Stable => 1.0,
        MarketConditions::Growth => 1.1,
        MarketConditions::Boom => 1.2,
    }
}

/// Scales basic ROI by multipliers below one for riskier inputs, so a higher
/// risk level lowers the result only while basic ROI is positive. A loss gets
/// smaller in magnitude instead.
pub fn risk_adjusted_roi(inputs: &RoiInputs, basic: f64) -> f64 {
    basic
        * risk_multiplier(inputs.risk_level)
        * market_multiplier(inputs.market_conditions)
        * (11.0 - inputs.competitive_pressure)
        / 10.0
        * (11.0 - inputs.regulatory_risk)
        / 10.0
}

fn analyze_cash_flows(inputs: &RoiInputs) -> Vec<CashFlowPoint> {
    let rate = inputs.discount_rate / 100.0;
    let mut cumulative = -inputs.initial_investment;
    inputs
        .cash_flows
        .iter()
        .map(|flow| {
            let amount = flow.signed_amount();
            cumulative += amount;
            CashFlowPoint {
                period: flow.period,
                cumulative_cash_flow: cumulative,
                discounted_cash_flow: amount / discount_factor(rate, flow.period),
                payback_status: if cumulative >= 0.0 { "paid" } else { "unpaid" },
            }
        })
        .collect()
}

fn sensitivity_case(scenario: &'static str, roi: f64, initial: f64, probability: f64) -> SensitivityCase {
    let npv = roi * initial / 100.0;
    SensitivityCase {
        scenario,
        roi,
        npv,
        payback_period: initial / (npv / 12.0),
        probability,
    }
}

fn sensitivity_analysis(inputs: &RoiInputs) -> Vec<SensitivityCase> {
    let initial = inputs.initial_investment;
    vec![
        sensitivity_case("Best Case", inputs.best_case_scenario, initial, 0.25),
        sensitivity_case("Most Likely", inputs.most_likely_scenario, initial, 0.5),
        sensitivity_case("Worst Case", inputs.worst_case_scenario, initial, 0.25),
    ]
}

/// Tier thresholds as multiples of the benchmark, best tier first.
fn tier(value: f64, benchmark: f64, thresholds: [f64; 4]) -> PerformanceTier {
    let tiers = [
        PerformanceTier::Excellent,
        PerformanceTier::Good,
        PerformanceTier::Average,
        PerformanceTier::BelowAverage,
    ];
    thresholds
        .iter()
        .zip(tiers)
        .find(|(multiple, _)| value >= benchmark * **multiple)
        .map(|(_, tier)| tier)
        .unwrap_or(PerformanceTier::Poor)
}

fn comparative_analysis(inputs: &RoiInputs, basic: f64) -> Vec<Comparison> {
    let benchmarks = [
        ("Benchmark ROI", inputs.benchmark_roi, [1.1, 1.0, 0.8, 0.6]),
        ("Industry Average ROI", inputs.industry_average_roi, [1.2, 1.1, 1.0, 0.8]),
        ("Competitor ROI", inputs.competitor_roi, [1.15, 1.0, 0.85, 0.7]),
    ];
    benchmarks
        .into_iter()
        .filter_map(|(metric, benchmark, thresholds)| {
            let benchmark = benchmark.filter(|b| *b != 0.0)?;
            Some(Comparison {
                metric,
                your_value: basic,
                benchmark,
                difference: basic - benchmark,
                performance: tier(basic, benchmark, thresholds),
            })
        })
        .collect()
}

pub fn assess_risk(inputs: &RoiInputs) -> RiskAssessment {
    let mut score = 0;
    let mut factors = Vec::new();
    let mut strategies = Vec::new();

    match inputs.risk_level {
        RiskLevel::High => {
            score += 30;
            factors.push("High risk investment");
            strategies.push("Implement comprehensive risk management");
        }
        RiskLevel::Medium => {
            score += 15;
            factors.push("Medium risk investment");
            strategies.push("Monitor key risk indicators");
        }
        RiskLevel::Low => score += 5,
    }
    if inputs.market_conditions == MarketConditions::Recession {
        score += 20;
        factors.push("Recessionary market conditions");
        strategies.push("Diversify investment portfolio");
    }
    if inputs.competitive_pressure > 7.0 {
        score += 15;
        factors.push("High competitive pressure");
        strategies.push("Strengthen competitive advantages");
    }
    if inputs.regulatory_risk > 7.0 {
        score += 15;
        factors.push("High regulatory risk");
        strategies.push("Ensure compliance and regulatory monitoring");
    }
    if inputs.investment_period > 24.0 {
        score += 10;
        factors.push("Long investment period");
        strategies.push("Implement milestone-based monitoring");
    }

    let level = if score >= 50 {
        RiskLevel::High
    } else if score >= 25 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskAssessment {
        risk_level: level,
        risk_factors: factors,
        risk_score: score,
        mitigation_strategies: strategies,
    }
}

fn performance_breakdown(inputs: &RoiInputs) -> Vec<PerformanceItem> {
    [
        ("Additional Revenue", inputs.additional_revenue, Impact::Positive),
        ("Cost Savings", inputs.cost_savings, Impact::Positive),
        ("Operational Costs", inputs.operational_costs, Impact::Negative),
        ("Maintenance Costs", inputs.maintenance_costs, Impact::Negative),
    ]
    .into_iter()
    .filter(|(_, amount, _)| *amount > 0.0)
    .map(|(category, amount, impact)| PerformanceItem {
        category,
        amount,
        percentage: if inputs.total_return != 0.0 {
            amount / inputs.total_return * 100.0
        } else {
            0.0
        },
        impact,
    })
    .collect()
}

fn projections(inputs: &RoiInputs, basic: f64) -> Vec<Projection> {
    let initial = inputs.initial_investment;
    let annual_growth = 1.0 + (basic + inputs.growth_rate) / 100.0;
    (1..=inputs.projection_period.min(MAX_PROJECTION_MONTHS))
        .map(|period| {
            let value = initial * annual_growth.powf(period as f64 / 12.0);
            let roi = if initial > 0.0 {
                (value - initial) / initial * 100.0
            } else {
                0.0
            };
            Projection {
                period,
                projected_value: value.round(),
                projected_roi: round2(roi),
                cumulative_return: (value - initial).round(),
            }
        })
        .collect()
}

fn optimization_insights(inputs: &RoiInputs) -> Vec<OptimizationInsight> {
    let mut insights = Vec::new();
    if inputs.operational_costs > inputs.additional_revenue * 0.3 {
        insights.push(OptimizationInsight {
            area: "Cost Optimization",
            current_value: inputs.operational_costs,
            potential_value: inputs.operational_costs * 0.8,
            improvement: inputs.operational_costs * 0.2,
            recommendations: [
                "Streamline operational processes",
                "Implement automation",
                "Negotiate better vendor contracts",
                "Optimize resource allocation",
            ],
        });
    }
    if inputs.additional_revenue < inputs.initial_investment * 0.5 {
        insights.push(OptimizationInsight {
            area: "Revenue Optimization",
            current_value: inputs.additional_revenue,
            potential_value: inputs.additional_revenue * 1.5,
            improvement: inputs.additional_revenue * 0.5,
            recommendations: [
                "Improve marketing effectiveness",
                "Enhance product value proposition",
                "Expand market reach",
                "Optimize pricing strategy",
            ],
        });
    }
    if inputs.risk_level == RiskLevel::High {
        insights.push(OptimizationInsight {
            area: "Risk Mitigation",
            current_value: 100.0,
            potential_value: 70.0,
            improvement: 30.0,
            recommendations: RISK_MITIGATION_STEPS,
        });
    }
    insights
}

const RISK_MITIGATION_STEPS: [&str; 4] = [
    "Implement comprehensive risk management",
    "Diversify investment portfolio",
    "Strengthen competitive advantages",
    "Enhance regulatory compliance",
];

fn recommendations(basic: f64, risk: &RiskAssessment, payback: f64) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    if basic < 15.0 {
        recs.push(Recommendation {
            category: "ROI Improvement",
            recommendations: [
                "Optimize operational efficiency",
                "Increase revenue generation",
                "Reduce unnecessary costs",
                "Improve resource allocation",
            ],
            priority: Priority::High,
            expected_impact: 25.0,
            implementation_time: "3-6 months",
        });
    }
    if risk.risk_level == RiskLevel::High {
        recs.push(Recommendation {
            category: "Risk Mitigation",
            recommendations: RISK_MITIGATION_STEPS,
            priority: Priority::High,
            expected_impact: 30.0,
            implementation_time: "2-4 months",
        });
    }
    if payback > 24.0 {
        recs.push(Recommendation {
            category: "Performance Optimization",
            recommendations: [
                "Accelerate revenue generation",
                "Reduce initial investment costs",
                "Improve operational efficiency",
                "Optimize cash flow management",
            ],
            priority: Priority::Medium,
            expected_impact: 20.0,
            implementation_time: "4-8 months",
        });
    }
    recs
}

fn business_impact(basic: f64, payback: f64, npv: f64) -> Vec<BusinessImpact> {
    vec![
        BusinessImpact {
            metric: "ROI",
            current_value: basic,
            projected_value: basic * 1.2,
            impact: 20.0,
            timeframe: "12 months",
        },
        BusinessImpact {
            metric: "Payback Period",
            current_value: payback,
            projected_value: payback * 0.8,
            impact: -20.0,
            timeframe: "6 months",
        },
        BusinessImpact {
            metric: "NPV",
            current_value: npv,
            projected_value: npv * 1.3,
            impact: 30.0,
            timeframe: "12 months",
        },
    ]
}

fn action_items() -> Vec<ActionItem> {
    vec![
        ActionItem {
            priority: "immediate",
            action: "Implement cost optimization strategies",
            owner: "Operations Team",
            timeline: "2 weeks",
            expected_outcome: "10% cost reduction",
        },
        ActionItem {
            priority: "short-term",
            action: "Develop revenue enhancement plan",
            owner: "Sales Team",
            timeline: "1 month",
            expected_outcome: "15% revenue increase",
        },
        ActionItem {
            priority: "long-term",
            action: "Establish comprehensive risk management",
            owner: "Risk Management Team",
            timeline: "3 months",
            expected_outcome: "20% risk reduction",
        },
    ]
}

pub fn calculate(inputs: &RoiInputs) -> RoiResults {
    let initial = inputs.initial_investment;
    let basic = basic_roi(inputs.total_return, initial);
    let payback = payback_period(inputs);

    let flows = dated_flows(inputs);
    let npv = solver::npv(initial, &flows, inputs.discount_rate);
    let irr = solver::fixed_step_irr(initial, &flows);
    let profitability_index = if npv > 0.0 { (npv + initial) / initial } else { 0.0 };

    let sensitivity = sensitivity_analysis(inputs);
    let expected_roi: f64 = sensitivity.iter().map(|s| s.roi * s.probability).sum();
    let risk = assess_risk(inputs);

    let strategic = StrategicAnalysis {
        strategic_value: inputs.strategic_value,
        market_positioning: inputs.market_positioning,
        competitive_advantage: inputs.competitive_advantage,
        scalability: inputs.scalability,
        overall_score: (inputs.strategic_value
            + inputs.market_positioning
            + inputs.competitive_advantage
            + inputs.scalability)
            / 4.0,
    };

    RoiResults {
        basic_roi: basic,
        annualized_roi: annualized_roi(inputs.total_return, initial, inputs.investment_period),
        adjusted_roi: adjusted_roi(inputs),
        net_roi: net_roi(inputs),
        inflation_adjusted_roi: inflation_adjusted_roi(inputs),
        payback_period: payback,
        discounted_payback_period: discounted_payback_period(inputs),
        break_even_point: payback,
        net_present_value: npv,
        internal_rate_of_return: irr,
        modified_internal_rate_of_return: irr * 0.9,
        profitability_index,
        risk_adjusted_roi: risk_adjusted_roi(inputs, basic),
        sharpe_ratio: (basic - inputs.opportunity_cost) / ASSUMED_VOLATILITY,
        value_at_risk: initial * (basic / 100.0 - VAR_Z_SCORE * ASSUMED_VOLATILITY / 100.0),
        expected_return: basic,
        cash_flow_analysis: analyze_cash_flows(inputs),
        sensitivity_analysis: sensitivity,
        expected_roi,
        comparative_analysis: comparative_analysis(inputs, basic),
        recommendations: recommendations(basic, &risk, payback),
        risk_assessment: risk,
        performance_breakdown: performance_breakdown(inputs),
        projection_analysis: projections(inputs, basic),
        optimization_insights: optimization_insights(inputs),
        strategic_analysis: strategic,
        business_impact: business_impact(basic, payback, npv),
        action_items: action_items(),
    }
}
