/// Signed cash flow dated in months from the start of the investment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedFlow {
    pub period: u32,
    pub amount: f64,
}

pub const IRR_START: f64 = 0.1;
pub const IRR_STEP: f64 = 0.01;
pub const IRR_MAX_ITERATIONS: u32 = 100;
pub const IRR_TOLERANCE: f64 = 0.0001;

/// Annual-rate discount factor for a flow `period_months` out.
pub fn discount_factor(annual_rate: f64, period_months: u32) -> f64 {
    (1.0 + annual_rate).powf(period_months as f64 / 12.0)
}

fn net_present_value_at(initial: f64, flows: &[DatedFlow], annual_rate: f64) -> f64 {
    flows.iter().fold(-initial, |npv, flow| {
        npv + flow.amount / discount_factor(annual_rate, flow.period)
    })
}

/// NPV at `rate_pct` (percent). No flows means nothing to value: 0.
pub fn npv(initial: f64, flows: &[DatedFlow], rate_pct: f64) -> f64 {
    if flows.is_empty() {
        return 0.0;
    }
    net_present_value_at(initial, flows, rate_pct / 100.0)
}

/// Fixed-step IRR search, in percent. Starts at 10% and moves one point per
/// iteration toward the NPV sign until |NPV| drops under the tolerance or the
/// iteration budget runs out. The result is whatever the walk reached, not
/// necessarily the true root.
pub fn fixed_step_irr(initial: f64, flows: &[DatedFlow]) -> f64 {
    if flows.is_empty() {
        return 0.0;
    }

    let mut irr = IRR_START;
    for _ in 0..IRR_MAX_ITERATIONS {
        let npv = net_present_value_at(initial, flows, irr);
        if npv.abs() < IRR_TOLERANCE {
            break;
        }
        irr += if npv > 0.0 { IRR_STEP } else { -IRR_STEP };
    }
    irr * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn flows() -> Vec<DatedFlow> {
        vec![
            DatedFlow { period: 1, amount: 5_000.0 },
            DatedFlow { period: 6, amount: 10_000.0 },
            DatedFlow { period: 12, amount: 15_000.0 },
        ]
    }

    #[test]
    fn npv_discounts_each_flow_by_its_month() {
        // Hand calculation at 10%:
        // 5000/1.1^(1/12) + 10000/1.1^(0.5) + 15000/1.1 - 100000
        let expected = 5_000.0 / 1.1f64.powf(1.0 / 12.0)
            + 10_000.0 / 1.1f64.powf(0.5)
            + 15_000.0 / 1.1
            - 100_000.0;
        assert_approx_tol(npv(100_000.0, &flows(), 10.0), expected, 1e-9);
    }

    #[test]
    fn npv_and_irr_are_zero_without_flows() {
        assert_eq!(npv(100_000.0, &[], 10.0), 0.0);
        assert_eq!(fixed_step_irr(100_000.0, &[]), 0.0);
    }

    #[test]
    fn irr_walks_downward_while_npv_is_negative() {
        // Flows only cover the outlay at a deeply negative rate; NPV changes
        // sign between -79% and -80% and the walk ends bouncing across it.
        let irr = fixed_step_irr(100_000.0, &flows());
        assert!((-80.5..=-78.5).contains(&irr), "irr {irr}");
    }

    #[test]
    fn irr_settles_near_root_for_single_flow() {
        // 100 -> 121 after two years is exactly 10%, the starting guess.
        let irr = fixed_step_irr(100.0, &[DatedFlow { period: 24, amount: 121.0 }]);
        assert_approx_tol(irr, 10.0, 1e-9);
    }

    #[test]
    fn irr_oscillates_by_one_step_when_root_is_between_grid_points() {
        let irr = fixed_step_irr(100.0, &[DatedFlow { period: 12, amount: 114.5 }]);
        assert!((13.0..=16.0).contains(&irr), "irr {irr}");
    }
}
