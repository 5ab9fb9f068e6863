use chrono::NaiveDate;
use thiserror::Error;

use crate::core::round2;

use super::types::*;

/// Hard failures of the property tax dispatcher. Unlike validation issues
/// these abort the calculation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyTaxError {
    #[error("unknown property tax calculation type: {0}")]
    UnknownCalculationType(String),
    #[error("Annual property tax cannot be negative")]
    NegativeAnnualTax,
    #[error("Sale price must be positive")]
    NonPositiveSalePrice,
    #[error("Closing date must be within the tax year period")]
    ClosingDateOutsideTaxYear,
    #[error("Tax year end must not be before tax year start")]
    InvalidTaxYear,
    #[error("{0} is required for this calculation")]
    MissingDate(&'static str),
    #[error("{0} cannot be negative")]
    NegativeValue(&'static str),
    #[error("Escrow months must be positive")]
    NonPositiveEscrowMonths,
    #[error("Success probability must be between 0 and 100")]
    SuccessProbabilityOutOfRange,
}

type Result<T> = std::result::Result<T, PropertyTaxError>;

const MILLS_BASE: f64 = 1000.0;

fn non_negative(value: f64, field: &'static str) -> Result<f64> {
    if value < 0.0 {
        Err(PropertyTaxError::NegativeValue(field))
    } else {
        Ok(value)
    }
}

fn tax_at(value: f64, millage_rate: f64) -> f64 {
    value * millage_rate / MILLS_BASE
}

/// Splits an annual bill at the closing date. The seller owns the closing
/// day; the buyer's share absorbs the rounding so the two always sum to the
/// annual amount.
pub fn proration(
    annual_property_tax: f64,
    sale_price: f64,
    closing_date: NaiveDate,
    tax_year_start: NaiveDate,
    tax_year_end: NaiveDate,
    method: ProrationMethod,
    seller_pays_tax: bool,
) -> Result<Proration> {
    if annual_property_tax < 0.0 {
        return Err(PropertyTaxError::NegativeAnnualTax);
    }
    if sale_price <= 0.0 {
        return Err(PropertyTaxError::NonPositiveSalePrice);
    }
    if tax_year_end < tax_year_start {
        return Err(PropertyTaxError::InvalidTaxYear);
    }
    if closing_date < tax_year_start || closing_date > tax_year_end {
        return Err(PropertyTaxError::ClosingDateOutsideTaxYear);
    }

    let total_days = match method {
        ProrationMethod::Banker365 => 365,
        ProrationMethod::Leap366 => 366,
        ProrationMethod::ActualDays => (tax_year_end - tax_year_start).num_days() + 1,
    };
    let seller_days = (closing_date - tax_year_start).num_days() + 1;
    let buyer_days = (tax_year_end - closing_date).num_days();

    let seller = round2(seller_days as f64 * annual_property_tax / total_days as f64);
    let buyer = round2(annual_property_tax - seller);

    Ok(Proration {
        annual_property_tax: round2(annual_property_tax),
        sale_price: round2(sale_price),
        days_owned_by_seller: seller_days,
        days_owned_by_buyer: buyer_days,
        total_days_in_period: total_days,
        seller_tax_responsibility: seller,
        buyer_tax_responsibility: buyer,
        proration_date: closing_date,
        tax_year_start,
        tax_year_end,
        proration_method: method,
        seller_pays_tax,
        adjustment_amount: if seller_pays_tax { seller } else { buyer },
    })
}

pub fn from_assessed_value(
    assessed_value: f64,
    millage_rate: f64,
    exemptions: f64,
    special_assessments: f64,
) -> Result<Assessment> {
    non_negative(assessed_value, "Assessed value")?;
    non_negative(millage_rate, "Millage rate")?;
    non_negative(exemptions, "Exemptions")?;
    non_negative(special_assessments, "Special assessments")?;

    let taxable = (assessed_value - exemptions).max(0.0);
    let tax = tax_at(taxable, millage_rate);
    let rate_pct = if assessed_value > 0.0 {
        tax / assessed_value * 100.0
    } else {
        0.0
    };

    Ok(Assessment {
        assessed_value: round2(assessed_value),
        millage_rate: round2(millage_rate),
        exemptions: round2(exemptions),
        taxable_value: round2(taxable),
        annual_property_tax: round2(tax),
        special_assessments: round2(special_assessments),
        total_tax_amount: round2(tax + special_assessments),
        tax_rate_percentage: round2(rate_pct),
    })
}

pub fn appeal_savings(
    current_assessed_value: f64,
    appealed_assessed_value: f64,
    millage_rate: f64,
    appeal_cost: f64,
    success_probability: f64,
) -> Result<AppealSavings> {
    non_negative(current_assessed_value, "Current assessed value")?;
    non_negative(appealed_assessed_value, "Appealed assessed value")?;
    non_negative(millage_rate, "Millage rate")?;
    non_negative(appeal_cost, "Appeal cost")?;
    if !(0.0..=100.0).contains(&success_probability) {
        return Err(PropertyTaxError::SuccessProbabilityOutOfRange);
    }

    let current_tax = tax_at(current_assessed_value, millage_rate);
    let appealed_tax = tax_at(appealed_assessed_value, millage_rate);
    let savings = current_tax - appealed_tax;
    let payback = if appeal_cost > 0.0 {
        if savings > 0.0 {
            appeal_cost / savings
        } else {
            f64::INFINITY
        }
    } else {
        0.0
    };

    Ok(AppealSavings {
        current_assessed_value: round2(current_assessed_value),
        appealed_assessed_value: round2(appealed_assessed_value),
        millage_rate: round2(millage_rate),
        current_annual_tax: round2(current_tax),
        appealed_annual_tax: round2(appealed_tax),
        annual_savings: round2(savings),
        appeal_cost: round2(appeal_cost),
        net_annual_savings: round2(savings - appeal_cost),
        success_probability,
        expected_value: round2(savings * success_probability / 100.0 - appeal_cost),
        payback_period: round2(payback),
    })
}

pub fn escrow(
    annual_property_tax: f64,
    escrow_months: f64,
    current_balance: f64,
    monthly_payment: f64,
    cushion_amount: f64,
) -> Result<TaxEscrow> {
    if annual_property_tax < 0.0 {
        return Err(PropertyTaxError::NegativeAnnualTax);
    }
    if escrow_months <= 0.0 {
        return Err(PropertyTaxError::NonPositiveEscrowMonths);
    }
    non_negative(current_balance, "Current balance")?;
    non_negative(monthly_payment, "Monthly payment")?;
    non_negative(cushion_amount, "Cushion amount")?;

    let monthly = annual_property_tax / escrow_months;
    let requirement = annual_property_tax + cushion_amount;

    Ok(TaxEscrow {
        annual_property_tax: round2(annual_property_tax),
        escrow_months,
        monthly_escrow_payment: round2(monthly),
        annual_escrow_payment: round2(monthly * 12.0),
        current_balance: round2(current_balance),
        monthly_payment: round2(monthly_payment),
        cushion_amount: round2(cushion_amount),
        total_escrow_requirement: round2(requirement),
        escrow_shortage: round2((requirement - current_balance).max(0.0)),
        escrow_surplus: round2((current_balance - requirement).max(0.0)),
    })
}

/// Reassessment effect. Portability only reduces the new taxable value.
pub fn assessment_change(
    previous_assessed_value: f64,
    new_assessed_value: f64,
    millage_rate: f64,
    assessment_year: Option<i32>,
    homestead_exemption: f64,
    portability_amount: f64,
) -> Result<AssessmentChange> {
    non_negative(previous_assessed_value, "Previous assessed value")?;
    non_negative(new_assessed_value, "New assessed value")?;
    non_negative(millage_rate, "Millage rate")?;
    non_negative(homestead_exemption, "Homestead exemption")?;
    non_negative(portability_amount, "Portability amount")?;

    let value_change = new_assessed_value - previous_assessed_value;
    let pct_change = if previous_assessed_value > 0.0 {
        value_change / previous_assessed_value * 100.0
    } else {
        0.0
    };
    let previous_taxable = (previous_assessed_value - homestead_exemption).max(0.0);
    let new_taxable = (new_assessed_value - homestead_exemption - portability_amount).max(0.0);
    let previous_tax = tax_at(previous_taxable, millage_rate);
    let new_tax = tax_at(new_taxable, millage_rate);
    let effective = if new_assessed_value > 0.0 {
        new_tax / new_assessed_value * 100.0
    } else {
        0.0
    };

    Ok(AssessmentChange {
        previous_assessed_value: round2(previous_assessed_value),
        new_assessed_value: round2(new_assessed_value),
        millage_rate: round2(millage_rate),
        assessment_year,
        value_change: round2(value_change),
        percentage_change: round2(pct_change),
        previous_tax: round2(previous_tax),
        new_tax: round2(new_tax),
        tax_change: round2(new_tax - previous_tax),
        homestead_exemption: round2(homestead_exemption),
        portability_amount: round2(portability_amount),
        taxable_value_change: round2(new_taxable - previous_taxable),
        effective_tax_rate: round2(effective),
    })
}

/// Limits year-over-year growth of the bill. Hard and soft caps bind at the
/// same ceiling; a soft cap measures the overshoot on the increase.
pub fn tax_cap(
    assessed_value: f64,
    previous_year_tax: f64,
    tax_cap_percentage: f64,
    millage_rate: f64,
    cap_type: CapType,
) -> Result<TaxCap> {
    non_negative(assessed_value, "Assessed value")?;
    non_negative(previous_year_tax, "Previous year tax")?;
    non_negative(tax_cap_percentage, "Tax cap percentage")?;
    non_negative(millage_rate, "Millage rate")?;

    let calculated = tax_at(assessed_value, millage_rate);
    let max_increase = previous_year_tax * tax_cap_percentage / 100.0;
    let max_allowed = previous_year_tax + max_increase;
    let increase = calculated - previous_year_tax;

    let (capped, applied, cap_amount) = match cap_type {
        CapType::HardCap if calculated > max_allowed => {
            (max_allowed, true, calculated - max_allowed)
        }
        CapType::SoftCap if increase > max_increase => {
            (max_allowed, true, increase - max_increase)
        }
        _ => (calculated, false, 0.0),
    };

    Ok(TaxCap {
        assessed_value: round2(assessed_value),
        previous_year_tax: round2(previous_year_tax),
        tax_cap_percentage,
        millage_rate: round2(millage_rate),
        cap_type,
        calculated_tax: round2(calculated),
        capped_tax: round2(capped),
        tax_increase: round2(increase),
        cap_applied: applied,
        cap_amount: round2(cap_amount),
    })
}

const DEFAULT_ANNUAL_TAX: f64 = 3000.0;
const DEFAULT_SALE_PRICE: f64 = 250_000.0;
const DEFAULT_ASSESSED_VALUE: f64 = 200_000.0;
const DEFAULT_MILLAGE_RATE: f64 = 25.0;
const DEFAULT_ESCROW_MONTHS: f64 = 12.0;
const DEFAULT_SUCCESS_PROBABILITY: f64 = 100.0;
const DEFAULT_TAX_CAP_PERCENTAGE: f64 = 10.0;

fn default_date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap_or(NaiveDate::MIN)
}

/// Missing or zero amounts fall back to the stock scenario.
fn or_stock(value: Option<f64>, stock: f64) -> f64 {
    value.filter(|v| *v != 0.0).unwrap_or(stock)
}

fn comprehensive(inputs: &PropertyTaxInputs) -> Result<Comprehensive> {
    let annual = or_stock(inputs.annual_property_tax, DEFAULT_ANNUAL_TAX);
    let assessed = or_stock(inputs.assessed_value, DEFAULT_ASSESSED_VALUE);
    let millage = or_stock(inputs.millage_rate, DEFAULT_MILLAGE_RATE);

    let proration = proration(
        annual,
        or_stock(inputs.sale_price, DEFAULT_SALE_PRICE),
        inputs.closing_date.unwrap_or_else(|| default_date(6, 15)),
        inputs.tax_year_start.unwrap_or_else(|| default_date(1, 1)),
        inputs.tax_year_end.unwrap_or_else(|| default_date(12, 31)),
        inputs.proration_method,
        inputs.seller_pays_tax,
    )?;
    let assessment = from_assessed_value(
        assessed,
        millage,
        inputs.exemptions.unwrap_or(0.0),
        inputs.special_assessments.unwrap_or(0.0),
    )?;
    let escrow = escrow(
        annual,
        or_stock(inputs.escrow_months, DEFAULT_ESCROW_MONTHS),
        inputs.current_balance.unwrap_or(0.0),
        inputs.monthly_payment.unwrap_or(0.0),
        inputs.cushion_amount.unwrap_or(0.0),
    )?;

    let summary = ComprehensiveSummary {
        annual_property_tax: annual,
        assessed_value: assessed,
        millage_rate: millage,
        seller_proration_amount: proration.seller_tax_responsibility,
        buyer_proration_amount: proration.buyer_tax_responsibility,
        monthly_escrow_payment: escrow.monthly_escrow_payment,
        total_tax_amount: assessment.total_tax_amount,
    };
    Ok(Comprehensive {
        proration,
        assessment,
        escrow,
        summary,
    })
}

fn required_date(value: Option<NaiveDate>, field: &'static str) -> Result<NaiveDate> {
    value.ok_or(PropertyTaxError::MissingDate(field))
}

/// Dispatches on `calculationType`. Absent amounts are treated as zero,
/// which the branch guards then reject where zero is meaningless.
pub fn calculate(inputs: &PropertyTaxInputs) -> Result<PropertyTaxResult> {
    let amount = |v: Option<f64>| v.unwrap_or(0.0);

    let result = match inputs.calculation_type.as_str() {
        "proration" => PropertyTaxResult::Proration(proration(
            amount(inputs.annual_property_tax),
            amount(inputs.sale_price),
            required_date(inputs.closing_date, "Closing date")?,
            required_date(inputs.tax_year_start, "Tax year start")?,
            required_date(inputs.tax_year_end, "Tax year end")?,
            inputs.proration_method,
            inputs.seller_pays_tax,
        )?),
        "from_assessed_value" => PropertyTaxResult::FromAssessedValue(from_assessed_value(
            amount(inputs.assessed_value),
            amount(inputs.millage_rate),
            amount(inputs.exemptions),
            amount(inputs.special_assessments),
        )?),
        "appeal_savings" => PropertyTaxResult::AppealSavings(appeal_savings(
            amount(inputs.current_assessed_value),
            amount(inputs.appealed_assessed_value),
            amount(inputs.millage_rate),
            amount(inputs.appeal_cost),
            inputs
                .success_probability
                .unwrap_or(DEFAULT_SUCCESS_PROBABILITY),
        )?),
        "escrow" => PropertyTaxResult::Escrow(escrow(
            amount(inputs.annual_property_tax),
            inputs.escrow_months.unwrap_or(DEFAULT_ESCROW_MONTHS),
            amount(inputs.current_balance),
            amount(inputs.monthly_payment),
            amount(inputs.cushion_amount),
        )?),
        "assessment_change" => PropertyTaxResult::AssessmentChange(assessment_change(
            amount(inputs.previous_assessed_value),
            amount(inputs.new_assessed_value),
            amount(inputs.millage_rate),
            inputs.assessment_year,
            amount(inputs.homestead_exemption),
            amount(inputs.portability_amount),
        )?),
        "tax_cap" => PropertyTaxResult::TaxCap(tax_cap(
            amount(inputs.assessed_value),
            amount(inputs.previous_year_tax),
            inputs
                .tax_cap_percentage
                .unwrap_or(DEFAULT_TAX_CAP_PERCENTAGE),
            amount(inputs.millage_rate),
            inputs.cap_type,
        )?),
        "comprehensive" => PropertyTaxResult::Comprehensive(comprehensive(inputs)?),
        other => return Err(PropertyTaxError::UnknownCalculationType(other.to_string())),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn inputs() -> PropertyTaxInputs {
        super::super::sample_inputs()
    }

    fn typed(calculation_type: &str) -> PropertyTaxInputs {
        PropertyTaxInputs {
            calculation_type: calculation_type.to_string(),
            ..PropertyTaxInputs::default()
        }
    }

    #[test]
    fn seller_owns_the_closing_day() {
        let PropertyTaxResult::Proration(p) = calculate(&inputs()).expect("prorates") else {
            panic!("expected a proration result");
        };
        // Hand calculation: Jan 1 .. Jun 15 2024 inclusive is 167 days, Jun 16 .. Dec 31 is 199.
        assert_eq!(p.days_owned_by_seller, 167);
        assert_eq!(p.days_owned_by_buyer, 199);
        assert_eq!(p.total_days_in_period, 365);
        // 167 * 3600 / 365 = 1647.123...
        assert_approx(p.seller_tax_responsibility, 1647.12);
        assert_approx(p.buyer_tax_responsibility, 1952.88);
        assert_approx(p.adjustment_amount, 1647.12);
    }

    #[test]
    fn buyer_side_adjustment_when_seller_does_not_pay() {
        let mut i = inputs();
        i.seller_pays_tax = false;
        let PropertyTaxResult::Proration(p) = calculate(&i).expect("prorates") else {
            panic!("expected a proration result");
        };
        assert_approx(p.adjustment_amount, 1952.88);
    }

    #[test]
    fn actual_days_counts_the_whole_tax_year() {
        let mut i = inputs();
        i.proration_method = ProrationMethod::ActualDays;
        let PropertyTaxResult::Proration(p) = calculate(&i).expect("prorates") else {
            panic!("expected a proration result");
        };
        assert_eq!(p.total_days_in_period, 366);
        // 167 * 3600 / 366 = 1642.62...
        assert_approx(p.seller_tax_responsibility, 1642.62);
        assert_approx(p.buyer_tax_responsibility, 1957.38);
    }

    #[test]
    fn proration_guards_fail_hard() {
        let start = date(2024, 1, 1);
        let end = date(2024, 12, 31);
        let method = ProrationMethod::Banker365;
        assert_eq!(
            proration(-1.0, 1.0, start, start, end, method, true),
            Err(PropertyTaxError::NegativeAnnualTax)
        );
        assert_eq!(
            proration(100.0, 0.0, start, start, end, method, true),
            Err(PropertyTaxError::NonPositiveSalePrice)
        );
        assert_eq!(
            proration(100.0, 1.0, date(2025, 1, 2), start, end, method, true),
            Err(PropertyTaxError::ClosingDateOutsideTaxYear)
        );
        assert_eq!(
            proration(100.0, 1.0, start, end, start, method, true),
            Err(PropertyTaxError::InvalidTaxYear)
        );
    }

    #[test]
    fn proration_without_closing_date_is_rejected() {
        let mut i = inputs();
        i.closing_date = None;
        assert_eq!(
            calculate(&i),
            Err(PropertyTaxError::MissingDate("Closing date"))
        );
    }

    #[test]
    fn unknown_calculation_type_fails_hard() {
        assert_eq!(
            calculate(&typed("reverse_mortgage")),
            Err(PropertyTaxError::UnknownCalculationType(
                "reverse_mortgage".into()
            ))
        );
    }

    #[test]
    fn millage_applies_per_thousand_after_exemptions() {
        let a = from_assessed_value(300_000.0, 25.0, 50_000.0, 150.0).expect("valid");
        // Hand calculation: 250000 * 25 / 1000.
        assert_approx(a.taxable_value, 250_000.0);
        assert_approx(a.annual_property_tax, 6250.0);
        assert_approx(a.total_tax_amount, 6400.0);
        assert_approx(a.tax_rate_percentage, 2.08);
    }

    #[test]
    fn exemptions_cannot_push_taxable_value_below_zero() {
        let a = from_assessed_value(40_000.0, 20.0, 50_000.0, 0.0).expect("valid");
        assert_approx(a.taxable_value, 0.0);
        assert_approx(a.annual_property_tax, 0.0);
    }

    #[test]
    fn negative_millage_names_the_field() {
        let err = from_assessed_value(100.0, -1.0, 0.0, 0.0).expect_err("negative rate");
        assert_eq!(err, PropertyTaxError::NegativeValue("Millage rate"));
        assert_eq!(err.to_string(), "Millage rate cannot be negative");
    }

    #[test]
    fn appeal_weighs_savings_by_probability() {
        let a = appeal_savings(320_000.0, 290_000.0, 22.0, 500.0, 60.0).expect("valid");
        // Hand calculation: 7040 - 6380 = 660 saved a year.
        assert_approx(a.annual_savings, 660.0);
        assert_approx(a.net_annual_savings, 160.0);
        // 660 * 0.6 - 500.
        assert_approx(a.expected_value, -104.0);
        // 500 / 660.
        assert_approx(a.payback_period, 0.76);
    }

    #[test]
    fn appeal_probability_must_be_a_percentage() {
        assert_eq!(
            appeal_savings(1.0, 1.0, 1.0, 0.0, 101.0),
            Err(PropertyTaxError::SuccessProbabilityOutOfRange)
        );
    }

    #[test]
    fn appeal_without_savings_never_pays_back() {
        let a = appeal_savings(200_000.0, 200_000.0, 20.0, 300.0, 50.0).expect("valid");
        assert!(a.payback_period.is_infinite());
    }

    #[test]
    fn escrow_shortage_covers_cushion() {
        let e = escrow(4200.0, 12.0, 3500.0, 0.0, 200.0).expect("valid");
        assert_approx(e.monthly_escrow_payment, 350.0);
        assert_approx(e.total_escrow_requirement, 4400.0);
        // (4200 + 200) - 3500.
        assert_approx(e.escrow_shortage, 900.0);
        assert_approx(e.escrow_surplus, 0.0);
    }

    #[test]
    fn escrow_months_must_be_positive() {
        assert_eq!(
            escrow(1200.0, 0.0, 0.0, 0.0, 0.0),
            Err(PropertyTaxError::NonPositiveEscrowMonths)
        );
    }

    #[test]
    fn portability_lowers_only_the_new_taxable_value() {
        let c = assessment_change(250_000.0, 280_000.0, 20.0, Some(2025), 50_000.0, 10_000.0)
            .expect("valid");
        assert_approx(c.value_change, 30_000.0);
        assert_approx(c.percentage_change, 12.0);
        // Hand calculation: 200000 and 220000 taxable at 20 mills.
        assert_approx(c.previous_tax, 4000.0);
        assert_approx(c.new_tax, 4400.0);
        assert_approx(c.tax_change, 400.0);
        assert_approx(c.taxable_value_change, 20_000.0);
        assert_approx(c.effective_tax_rate, 1.57);
        assert_eq!(c.assessment_year, Some(2025));
    }

    #[test]
    fn caps_bind_at_the_same_ceiling() {
        for cap_type in [CapType::HardCap, CapType::SoftCap] {
            let c = tax_cap(400_000.0, 6500.0, 10.0, 20.0, cap_type).expect("valid");
            // Hand calculation: 8000 computed against a 7150 ceiling.
            assert_approx(c.calculated_tax, 8000.0);
            assert_approx(c.capped_tax, 7150.0);
            assert_approx(c.cap_amount, 850.0);
            assert!(c.cap_applied);
        }
        let uncapped = tax_cap(400_000.0, 6500.0, 10.0, 20.0, CapType::NoCap).expect("valid");
        assert_approx(uncapped.capped_tax, 8000.0);
        assert!(!uncapped.cap_applied);
    }

    #[test]
    fn comprehensive_falls_back_to_stock_scenario() {
        let PropertyTaxResult::Comprehensive(c) =
            calculate(&typed("comprehensive")).expect("defaults are valid")
        else {
            panic!("expected a comprehensive result");
        };
        // Hand calculation: 167 * 3000 / 365.
        assert_approx(c.summary.seller_proration_amount, 1372.60);
        assert_approx(c.summary.buyer_proration_amount, 1627.40);
        assert_approx(c.summary.total_tax_amount, 5000.0);
        assert_approx(c.summary.monthly_escrow_payment, 250.0);
        assert_relative_eq!(c.assessment.tax_rate_percentage, 2.5);
    }

    #[test]
    fn output_is_tagged_with_calculation_type() {
        let out = calculate(&inputs()).expect("prorates");
        let value = serde_json::to_value(&out).expect("serializes");
        assert_eq!(value["calculationType"], "proration");
        assert_eq!(value["prorationMethod"], "365_day");
        assert_eq!(value["prorationDate"], "2024-06-15");
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_shares_sum_to_the_annual_bill(cents in 0u32..2_000_000, day in 0i64..366) {
            let annual = cents as f64 / 100.0;
            let start = date(2024, 1, 1);
            let closing = start + chrono::Duration::days(day);
            let p = proration(
                annual,
                300_000.0,
                closing,
                start,
                date(2024, 12, 31),
                ProrationMethod::ActualDays,
                true,
            )
            .expect("closing inside the year");
            prop_assert_eq!(p.days_owned_by_seller + p.days_owned_by_buyer, 366);
            prop_assert!((p.seller_tax_responsibility + p.buyer_tax_responsibility - annual).abs() < 0.005);
        }

        #[test]
        fn prop_capped_tax_never_exceeds_ceiling(
            assessed in 0u32..2_000_000,
            previous in 0u32..50_000,
            pct in 0u32..50,
        ) {
            let c = tax_cap(assessed as f64, previous as f64, pct as f64, 20.0, CapType::HardCap)
                .expect("non-negative inputs");
            let ceiling = previous as f64 * (1.0 + pct as f64 / 100.0);
            prop_assert!(c.capped_tax <= round2(ceiling) + 0.005);
        }
    }
}
