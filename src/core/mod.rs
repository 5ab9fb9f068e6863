pub mod amortization;
mod engine;
mod error;
pub mod format;
mod registry;
pub mod rules;
pub mod solver;
mod types;

pub use engine::{Calculator, CalculatorInfo, Registration};
pub use error::CalcError;
pub use registry::{Registry, builtin};
pub use rules::{Fields, InputMap, Rule, RuleKind, Scope};
pub use types::{
    CalculationResponse, Example, FieldCheck, FieldKind, InputField, Meta, OutputField, Severity,
    ValidationIssue, ValidationResult, round2,
};
