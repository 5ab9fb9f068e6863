use std::fmt::Write;

use crate::core::format::{fixed, grouped, money};

use super::types::{RoiInputs, RoiResults};

fn strength(risk_adjusted: f64) -> &'static str {
    if risk_adjusted >= 15.0 {
        "strong"
    } else if risk_adjusted >= 8.0 {
        "moderate"
    } else {
        "weak"
    }
}

fn signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{value:.1}")
    } else {
        format!("{value:.1}")
    }
}

pub fn render(inputs: &RoiInputs, r: &RoiResults) -> String {
    let mut out = String::new();
    let risk = &r.risk_assessment;
    let strategic = &r.strategic_analysis;

    let _ = writeln!(out, "# ROI Analysis Report\n");
    let _ = writeln!(out, "## Executive Summary");
    let _ = writeln!(
        out,
        "Your investment analysis shows a basic ROI of {:.1}% with an annualized ROI of {:.1}%. \
         The risk-adjusted ROI is {:.1}%, indicating {} performance relative to risk.\n",
        r.basic_roi,
        r.annualized_roi,
        r.risk_adjusted_roi,
        strength(r.risk_adjusted_roi)
    );

    let _ = writeln!(out, "## Key Metrics");
    let _ = writeln!(out, "- **Basic ROI**: {:.1}%", r.basic_roi);
    let _ = writeln!(out, "- **Annualized ROI**: {:.1}%", r.annualized_roi);
    let _ = writeln!(out, "- **Risk-Adjusted ROI**: {:.1}%", r.risk_adjusted_roi);
    let _ = writeln!(out, "- **Net ROI**: {:.1}%", r.net_roi);
    let _ = writeln!(out, "- **Payback Period**: {} months", fixed(r.payback_period, 1));
    let _ = writeln!(out, "- **NPV**: {}", money(r.net_present_value));
    let _ = writeln!(out, "- **IRR**: {:.1}%\n", r.internal_rate_of_return);

    let _ = writeln!(out, "## Investment Performance");
    let _ = writeln!(out, "- **Investment Type**: {}", inputs.investment_type);
    let _ = writeln!(out, "- **Investment Category**: {}", inputs.investment_category);
    let _ = writeln!(out, "- **Investment Period**: {} months", inputs.investment_period);
    let _ = writeln!(out, "- **Initial Investment**: {}", money(inputs.initial_investment));
    let _ = writeln!(out, "- **Total Return**: {}\n", money(inputs.total_return));

    let _ = writeln!(out, "## Risk Assessment");
    let _ = writeln!(out, "- **Risk Level**: {}", risk.risk_level.as_str());
    let _ = writeln!(out, "- **Risk Score**: {}/100", risk.risk_score);
    let _ = writeln!(out, "- **Risk Factors**: {}", risk.risk_factors.join(", "));
    let _ = writeln!(
        out,
        "- **Mitigation Strategies**: {}\n",
        risk.mitigation_strategies.join(", ")
    );

    let _ = writeln!(out, "## Performance Breakdown");
    for item in &r.performance_breakdown {
        let impact = match item.impact {
            super::types::Impact::Positive => "positive",
            super::types::Impact::Negative => "negative",
        };
        let _ = writeln!(
            out,
            "- **{}**: {} ({:.1}%) - {impact} impact",
            item.category,
            money(item.amount),
            item.percentage
        );
    }

    if !r.comparative_analysis.is_empty() {
        let _ = writeln!(out, "\n## Comparative Analysis");
        for comp in &r.comparative_analysis {
            let _ = writeln!(
                out,
                "- **{}**: {:.1}% vs {:.1}% ({}%) - {} performance",
                comp.metric,
                comp.your_value,
                comp.benchmark,
                signed(comp.difference),
                comp.performance.as_str()
            );
        }
    }

    let _ = writeln!(out, "\n## Sensitivity Analysis");
    for case in &r.sensitivity_analysis {
        let _ = writeln!(
            out,
            "- **{}**: {:.1}% ROI, {} NPV, {} months payback ({:.0}% probability)",
            case.scenario,
            case.roi,
            money(case.npv),
            fixed(case.payback_period, 1),
            case.probability * 100.0
        );
    }

    let _ = writeln!(out, "\n## Strategic Analysis");
    let _ = writeln!(out, "- **Strategic Value**: {}/10", strategic.strategic_value);
    let _ = writeln!(out, "- **Market Positioning**: {}/10", strategic.market_positioning);
    let _ = writeln!(out, "- **Competitive Advantage**: {}/10", strategic.competitive_advantage);
    let _ = writeln!(out, "- **Scalability**: {}/10", strategic.scalability);
    let _ = writeln!(out, "- **Overall Score**: {}/10", strategic.overall_score);

    if !r.optimization_insights.is_empty() {
        let _ = writeln!(out, "\n## Optimization Opportunities");
        for insight in &r.optimization_insights {
            let _ = writeln!(out, "### {}", insight.area);
            let _ = writeln!(out, "- **Current**: {}", money(insight.current_value));
            let _ = writeln!(out, "- **Potential**: {}", money(insight.potential_value));
            let _ = writeln!(out, "- **Improvement**: {}", money(insight.improvement));
            let _ = writeln!(
                out,
                "- **Recommendations**: {}",
                insight.recommendations.join(", ")
            );
        }
    }

    let _ = writeln!(out, "\n## Projection Analysis");
    for proj in r.projection_analysis.iter().take(5) {
        let _ = writeln!(
            out,
            "- **Month {}**: ${} value, {:.1}% ROI, ${} cumulative return",
            proj.period,
            grouped(proj.projected_value, 0),
            proj.projected_roi,
            grouped(proj.cumulative_return, 0)
        );
    }

    let _ = writeln!(out, "\n## Business Impact");
    for impact in &r.business_impact {
        let _ = writeln!(
            out,
            "- **{}**: {} -> {} ({}% in {})",
            impact.metric,
            fixed(impact.current_value, 1),
            fixed(impact.projected_value, 1),
            signed(impact.impact),
            impact.timeframe
        );
    }

    if !r.recommendations.is_empty() {
        let _ = writeln!(out, "\n## Recommendations");
        for rec in &r.recommendations {
            let _ = writeln!(out, "### {}", rec.category);
            for line in rec.recommendations {
                let _ = writeln!(out, "- {line}");
            }
            let _ = writeln!(out, "**Expected Impact**: {:.1}% improvement", rec.expected_impact);
            let _ = writeln!(out, "**Implementation Time**: {}\n", rec.implementation_time);
        }
    }

    out.push_str(
        "\nThis ROI analysis covers investment performance and identifies opportunities \
         for optimization and growth.\n",
    );
    out
}
