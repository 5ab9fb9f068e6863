use chrono::Local;

use crate::core::amortization::add_months;
use crate::core::format::money;
use crate::core::round2;

use super::types::*;

/// Lenders refund surpluses above this amount; smaller ones roll forward.
pub const SURPLUS_REFUND_THRESHOLD: f64 = 50.0;
const MAX_PROJECTION_YEARS: u32 = 5;
const CUSHION_MONTHS: f64 = 2.0;

pub fn annual_disbursements(inputs: &EscrowInputs) -> f64 {
    inputs.annual_property_tax
        + inputs.annual_home_insurance
        + inputs.annual_pmi
        + inputs.annual_flood_insurance
}

/// Two months of deposits plus the lender's cushion.
pub fn required_balance(monthly_escrow: f64, cushion: f64) -> f64 {
    CUSHION_MONTHS * monthly_escrow + cushion
}

fn scheduled_payments(inputs: &EscrowInputs) -> Vec<ScheduledPayment> {
    let total = annual_disbursements(inputs);
    [
        (
            "Property Tax",
            inputs.annual_property_tax,
            inputs.property_tax_payment_frequency,
        ),
        (
            "Home Insurance",
            inputs.annual_home_insurance,
            inputs.insurance_payment_frequency,
        ),
        ("PMI", inputs.annual_pmi, inputs.pmi_payment_frequency),
        (
            "Flood Insurance",
            inputs.annual_flood_insurance,
            inputs.flood_insurance_payment_frequency,
        ),
    ]
    .into_iter()
    .filter(|(_, annual, _)| *annual > 0.0)
    .map(|(component, annual, frequency)| ScheduledPayment {
        component,
        annual_amount: round2(annual),
        frequency,
        payment_amount: round2(annual / frequency.per_year() as f64),
        share_of_escrow: round2(annual / total * 100.0),
    })
    .collect()
}

/// Yearly cost outlook over the analysis period, capped at five years. Taxes
/// and homeowners insurance grow at their own rates; PMI and flood cover are
/// held flat.
pub fn project(inputs: &EscrowInputs) -> Vec<YearProjection> {
    let years = inputs.analysis_period.div_ceil(12).min(MAX_PROJECTION_YEARS);
    let tax_growth = 1.0 + inputs.tax_assessment_increase / 100.0;
    let insurance_growth = 1.0 + inputs.insurance_rate_increase / 100.0;

    (1..=years)
        .map(|year| {
            let tax = inputs.annual_property_tax * tax_growth.powi(year as i32);
            let insurance = inputs.annual_home_insurance * insurance_growth.powi(year as i32);
            let total = tax + insurance + inputs.annual_pmi + inputs.annual_flood_insurance;
            YearProjection {
                year,
                property_tax: round2(tax),
                home_insurance: round2(insurance),
                pmi: round2(inputs.annual_pmi),
                flood_insurance: round2(inputs.annual_flood_insurance),
                monthly_escrow_payment: round2(total / 12.0),
            }
        })
        .collect()
}

fn recommendations(
    inputs: &EscrowInputs,
    shortage: f64,
    shortage_payment: f64,
    surplus_refund: f64,
) -> Vec<String> {
    let mut out = Vec::new();
    if shortage > 0.0 {
        out.push(format!(
            "Pay the {} shortage as a lump sum or raise the monthly payment by {}",
            money(shortage),
            money(shortage_payment)
        ));
    }
    if surplus_refund > 0.0 {
        out.push(format!(
            "Request the {} surplus refund and consider applying it to principal",
            money(surplus_refund)
        ));
    }
    if inputs.payment_history != PaymentHistory::Current {
        out.push(
            "Bring the account current and set up automatic payments to avoid escrow advances"
                .to_string(),
        );
    }
    if inputs.escrow_account_type == EscrowAccountType::Waived {
        out.push(
            "With escrow waived, set aside tax and insurance money in a separate account"
                .to_string(),
        );
    }
    if inputs.tax_assessment_increase > 5.0 {
        out.push("Watch reassessment notices; appeal if the assessment outpaces the market".to_string());
    }
    out.push("Review the escrow analysis every year and shop insurance at renewal".to_string());
    out
}

pub fn calculate(inputs: &EscrowInputs) -> EscrowResults {
    let monthly_escrow = annual_disbursements(inputs) / 12.0;
    let required = required_balance(monthly_escrow, inputs.escrow_cushion);
    let difference = required - inputs.current_escrow_balance;
    let shortage = difference.max(0.0);
    let surplus = (-difference).max(0.0);
    let shortage_payment = shortage / 12.0;
    let surplus_refund = if surplus > SURPLUS_REFUND_THRESHOLD {
        surplus
    } else {
        0.0
    };

    let account_status = if shortage > 0.0 {
        AccountStatus::Shortage
    } else if surplus > 0.0 {
        AccountStatus::Surplus
    } else {
        AccountStatus::Balanced
    };

    let as_of = inputs
        .as_of_date
        .unwrap_or_else(|| Local::now().date_naive());

    EscrowResults {
        monthly_escrow_payment: round2(monthly_escrow),
        total_monthly_payment: round2(inputs.monthly_payment + monthly_escrow),
        required_escrow_balance: round2(required),
        escrow_shortage: round2(shortage),
        escrow_surplus: round2(surplus),
        shortage_payment: round2(shortage_payment),
        surplus_refund: round2(surplus_refund),
        account_status,
        next_escrow_analysis: add_months(as_of, 12),
        scheduled_payments: scheduled_payments(inputs),
        future_projections: project(inputs),
        recommendations: recommendations(inputs, shortage, shortage_payment, surplus_refund),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn inputs() -> EscrowInputs {
        super::super::sample_inputs()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn surplus_account_is_refunded() {
        let r = calculate(&inputs());
        // Hand calculation: (3000 + 1200) / 12.
        assert_approx(r.monthly_escrow_payment, 350.0);
        assert_approx(r.total_monthly_payment, 1713.0);
        // 2 * 350 + 700.
        assert_approx(r.required_escrow_balance, 1400.0);
        assert_approx(r.escrow_surplus, 3600.0);
        assert_approx(r.escrow_shortage, 0.0);
        assert_approx(r.surplus_refund, 3600.0);
        assert_eq!(r.account_status, AccountStatus::Surplus);
    }

    #[test]
    fn shortage_is_spread_over_twelve_months() {
        let mut i = inputs();
        i.annual_property_tax = 4800.0;
        i.annual_home_insurance = 1800.0;
        i.annual_pmi = 1200.0;
        i.annual_flood_insurance = 600.0;
        i.escrow_cushion = 1400.0;
        i.current_escrow_balance = 800.0;
        let r = calculate(&i);
        assert_approx(r.monthly_escrow_payment, 700.0);
        assert_approx(r.required_escrow_balance, 2800.0);
        assert_approx(r.escrow_shortage, 2000.0);
        assert_approx(r.shortage_payment, 166.67);
        assert_eq!(r.account_status, AccountStatus::Shortage);
        assert!(r.recommendations[0].contains("$2,000.00"));
    }

    #[test]
    fn small_surplus_is_not_refunded() {
        let mut i = inputs();
        i.current_escrow_balance = 1430.0;
        let r = calculate(&i);
        assert_approx(r.escrow_surplus, 30.0);
        assert_approx(r.surplus_refund, 0.0);
    }

    #[test]
    fn exact_requirement_is_balanced() {
        let mut i = inputs();
        i.current_escrow_balance = 1400.0;
        assert_eq!(calculate(&i).account_status, AccountStatus::Balanced);
    }

    #[test]
    fn next_analysis_is_a_year_out() {
        let mut i = inputs();
        i.as_of_date = Some(date(2024, 3, 15));
        assert_eq!(calculate(&i).next_escrow_analysis, date(2025, 3, 15));
        i.as_of_date = Some(date(2024, 2, 29));
        assert_eq!(calculate(&i).next_escrow_analysis, date(2025, 2, 28));
    }

    #[test]
    fn scheduled_payments_follow_frequency() {
        let mut i = inputs();
        i.property_tax_payment_frequency = PaymentFrequency::SemiAnnually;
        i.annual_flood_insurance = 600.0;
        let r = calculate(&i);
        assert_eq!(r.scheduled_payments.len(), 3);
        let tax = &r.scheduled_payments[0];
        assert_eq!(tax.component, "Property Tax");
        assert_approx(tax.payment_amount, 1500.0);
        // 3000 / 4800.
        assert_approx(tax.share_of_escrow, 62.5);
        assert_eq!(r.scheduled_payments[2].component, "Flood Insurance");
    }

    #[test]
    fn projections_grow_tax_and_insurance() {
        let r = calculate(&inputs());
        assert_eq!(r.future_projections.len(), 1);
        let year1 = &r.future_projections[0];
        // Hand calculation: 3000 * 1.02 and 1200 * 1.03.
        assert_approx(year1.property_tax, 3060.0);
        assert_approx(year1.home_insurance, 1236.0);
        assert_approx(year1.monthly_escrow_payment, 358.0);
    }

    #[test]
    fn projections_stop_at_five_years() {
        let mut i = inputs();
        i.analysis_period = 60;
        assert_eq!(project(&i).len(), 5);
        i.analysis_period = 13;
        assert_eq!(project(&i).len(), 2);
    }

    #[test]
    fn late_and_waived_accounts_get_guidance() {
        let mut i = inputs();
        i.payment_history = PaymentHistory::Late60;
        i.escrow_account_type = EscrowAccountType::Waived;
        let recs = calculate(&i).recommendations;
        assert!(recs.iter().any(|r| r.starts_with("Bring the account current")));
        assert!(recs.iter().any(|r| r.starts_with("With escrow waived")));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_shortage_and_surplus_are_exclusive(
            balance in 0u32..20_000,
            tax in 0u32..20_000,
            cushion in 0u32..3_000,
        ) {
            let mut i = inputs();
            i.current_escrow_balance = balance as f64;
            i.annual_property_tax = tax as f64;
            i.escrow_cushion = cushion as f64;
            let r = calculate(&i);
            prop_assert!(r.escrow_shortage == 0.0 || r.escrow_surplus == 0.0);
            let net = r.escrow_surplus - r.escrow_shortage;
            prop_assert!((net - (balance as f64 - r.required_escrow_balance)).abs() < 0.011);
        }
    }
}
