pub mod escrow;
pub mod mortgage_payoff;
pub mod mortgage_vs_rent;
pub mod pmi_cancellation;
pub mod property_tax;
pub mod roi;
pub mod stock_options;

use crate::core::Registration;

/// Every shipped calculator, in listing order.
pub fn registrations() -> Vec<Registration> {
    vec![
        roi::registration(),
        mortgage_payoff::registration(),
        mortgage_vs_rent::registration(),
        pmi_cancellation::registration(),
        property_tax::registration(),
        escrow::registration(),
        stock_options::registration(),
    ]
}
