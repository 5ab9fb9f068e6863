use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RentVsBuyInputs {
    /// Monthly rent.
    pub current_rent: f64,
    /// Annual rent escalation, percent.
    pub rent_increase_rate: f64,
    pub home_price: f64,
    pub down_payment: f64,
    pub interest_rate: f64,
    /// Loan term in years.
    pub loan_term: f64,
    /// Annual property tax as a percent of the purchase price.
    pub property_tax_rate: f64,
    /// Annual premium.
    pub homeowners_insurance: f64,
    /// Annual PMI as a percent of the loan amount.
    pub pmi_rate: f64,
    /// Annual maintenance budget.
    pub maintenance_cost: f64,
    /// Monthly utilities while renting.
    pub utilities: f64,
    /// Monthly utilities as an owner.
    pub utilities_home: f64,
    pub closing_costs: f64,
    pub home_appreciation: f64,
    pub investment_return: f64,
    /// Horizon in whole years.
    pub analysis_period: u32,
    pub tax_rate: f64,
    /// Monthly renters insurance.
    pub renters_insurance: f64,
    /// Monthly HOA dues.
    pub hoa_fees: f64,
}

impl Default for RentVsBuyInputs {
    fn default() -> Self {
        Self {
            current_rent: 0.0,
            rent_increase_rate: 3.0,
            home_price: 0.0,
            down_payment: 0.0,
            interest_rate: 0.0,
            loan_term: 30.0,
            property_tax_rate: 1.2,
            homeowners_insurance: 0.0,
            pmi_rate: 0.0,
            maintenance_cost: 0.0,
            utilities: 0.0,
            utilities_home: 0.0,
            closing_costs: 0.0,
            home_appreciation: 3.0,
            investment_return: 7.0,
            analysis_period: 10,
            tax_rate: 0.0,
            renters_insurance: 0.0,
            hoa_fees: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    StronglyBuy,
    ConsiderBuying,
    StronglyRent,
    ConsiderRenting,
    Comparable,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::StronglyBuy => "Strongly recommend buying",
            Verdict::ConsiderBuying => "Consider buying",
            Verdict::StronglyRent => "Strongly recommend renting",
            Verdict::ConsiderRenting => "Consider renting",
            Verdict::Comparable => "Both options are comparable",
        }
    }

    pub fn favours_buying(self) -> bool {
        matches!(self, Verdict::StronglyBuy | Verdict::ConsiderBuying)
    }

    pub fn favours_renting(self) -> bool {
        matches!(self, Verdict::StronglyRent | Verdict::ConsiderRenting)
    }
}

/// One year of the owner-versus-tenant timeline. Cumulative figures include
/// every year up to and including `year`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearComparison {
    pub year: u32,
    pub rent_cost: f64,
    pub mortgage_cost: f64,
    pub rent_cumulative: f64,
    pub mortgage_cumulative: f64,
    pub home_value: f64,
    pub loan_balance: f64,
    pub home_equity: f64,
    pub opportunity_cost: f64,
    /// Cash put into the home, less the equity kept, plus forgone returns.
    pub net_home_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityPoint {
    pub variable: &'static str,
    pub change: f64,
    pub value: f64,
    pub net_home_cost: f64,
    pub break_even_years: u32,
    pub recommendation: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentVsBuyResults {
    pub loan_amount: f64,
    pub monthly_mortgage_payment: f64,
    pub monthly_rent_cost: f64,
    pub monthly_mortgage_cost: f64,
    pub monthly_difference: f64,
    pub total_rent_cost: f64,
    pub total_mortgage_cost: f64,
    pub home_equity: f64,
    pub opportunity_cost: f64,
    pub net_home_cost: f64,
    pub break_even_years: u32,
    pub recommendation: Verdict,
    pub yearly_comparison: Vec<YearComparison>,
    pub sensitivity: Vec<SensitivityPoint>,
    pub analysis: String,
}
