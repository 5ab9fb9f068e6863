use thiserror::Error;

use crate::calculators::property_tax::PropertyTaxError;

/// Structural misuse of a calculator. Soft input-quality problems never land
/// here; they are reported through `ValidationResult`.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("unknown calculator: {0}")]
    UnknownCalculator(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    PropertyTax(#[from] PropertyTaxError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}
