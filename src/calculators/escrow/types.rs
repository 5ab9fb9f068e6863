use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Quarterly,
    #[serde(alias = "semiannually")]
    SemiAnnually,
    Annually,
}

impl PaymentFrequency {
    pub fn per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::Quarterly => 4,
            PaymentFrequency::SemiAnnually => 2,
            PaymentFrequency::Annually => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentFrequency::Monthly => "monthly",
            PaymentFrequency::Quarterly => "quarterly",
            PaymentFrequency::SemiAnnually => "semi annually",
            PaymentFrequency::Annually => "annually",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum PaymentHistory {
    #[default]
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "late-30")]
    Late30,
    #[serde(rename = "late-60")]
    Late60,
    #[serde(rename = "late-90")]
    Late90,
}

impl PaymentHistory {
    pub fn label(self) -> &'static str {
        match self {
            PaymentHistory::Current => "current",
            PaymentHistory::Late30 => "30 days late",
            PaymentHistory::Late60 => "60 days late",
            PaymentHistory::Late90 => "90 days late",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EscrowAccountType {
    #[default]
    Required,
    Voluntary,
    Waived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EscrowInputs {
    pub property_value: f64,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub loan_term: f64,
    /// Principal and interest only.
    pub monthly_payment: f64,
    pub current_escrow_balance: f64,
    pub annual_property_tax: f64,
    pub annual_home_insurance: f64,
    #[serde(rename = "annualPMI")]
    pub annual_pmi: f64,
    pub annual_flood_insurance: f64,
    pub property_tax_payment_frequency: PaymentFrequency,
    pub insurance_payment_frequency: PaymentFrequency,
    pub pmi_payment_frequency: PaymentFrequency,
    pub flood_insurance_payment_frequency: PaymentFrequency,
    pub escrow_cushion: f64,
    /// Annual growth, percent.
    pub tax_assessment_increase: f64,
    pub insurance_rate_increase: f64,
    /// Months.
    pub analysis_period: u32,
    pub payment_history: PaymentHistory,
    pub escrow_account_type: EscrowAccountType,
    /// Date of this analysis. Defaults to today.
    pub as_of_date: Option<NaiveDate>,
}

impl Default for EscrowInputs {
    fn default() -> Self {
        Self {
            property_value: 0.0,
            loan_amount: 0.0,
            interest_rate: 0.0,
            loan_term: 30.0,
            monthly_payment: 0.0,
            current_escrow_balance: 0.0,
            annual_property_tax: 0.0,
            annual_home_insurance: 0.0,
            annual_pmi: 0.0,
            annual_flood_insurance: 0.0,
            property_tax_payment_frequency: PaymentFrequency::SemiAnnually,
            insurance_payment_frequency: PaymentFrequency::Annually,
            pmi_payment_frequency: PaymentFrequency::Monthly,
            flood_insurance_payment_frequency: PaymentFrequency::Annually,
            escrow_cushion: 0.0,
            tax_assessment_increase: 0.0,
            insurance_rate_increase: 0.0,
            analysis_period: 12,
            payment_history: PaymentHistory::Current,
            escrow_account_type: EscrowAccountType::Required,
            as_of_date: None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountStatus {
    Shortage,
    Surplus,
    Balanced,
}

/// One disbursement stream paid out of the escrow account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPayment {
    pub component: &'static str,
    pub annual_amount: f64,
    pub frequency: PaymentFrequency,
    pub payment_amount: f64,
    pub share_of_escrow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearProjection {
    pub year: u32,
    pub property_tax: f64,
    pub home_insurance: f64,
    pub pmi: f64,
    pub flood_insurance: f64,
    pub monthly_escrow_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowResults {
    pub monthly_escrow_payment: f64,
    pub total_monthly_payment: f64,
    pub required_escrow_balance: f64,
    pub escrow_shortage: f64,
    pub escrow_surplus: f64,
    pub shortage_payment: f64,
    pub surplus_refund: f64,
    pub account_status: AccountStatus,
    pub next_escrow_analysis: NaiveDate,
    pub scheduled_payments: Vec<ScheduledPayment>,
    pub future_projections: Vec<YearProjection>,
    pub recommendations: Vec<String>,
}
