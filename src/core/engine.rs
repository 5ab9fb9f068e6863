use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::CalcError;
use super::rules::{Fields, InputMap, Rule, normalize_numeric, quick_validate, run_rules};
use super::types::{
    CalculationResponse, Example, FieldCheck, InputField, Meta, OutputField, ValidationResult,
};

/// One calculator family: a typed input record, a formula engine over it, a
/// declarative rule set and the report/registration metadata.
pub trait Calculator {
    type Input: DeserializeOwned + Serialize + Clone;
    type Output: Serialize;

    fn meta() -> Meta;
    fn inputs() -> Vec<InputField>;
    fn outputs() -> Vec<OutputField>;
    fn rules() -> Vec<Rule>;
    fn calculate(input: &Self::Input) -> Result<Self::Output, CalcError>;
    fn report(input: &Self::Input, output: &Self::Output) -> String;
    fn examples() -> Vec<Example>;
}

type ErasedCalculate = fn(&[InputField], &InputMap) -> Result<(Value, String), CalcError>;

/// Type-erased registration entry so families with different record types can
/// share one table.
pub struct Registration {
    pub meta: Meta,
    pub inputs: Vec<InputField>,
    pub outputs: Vec<OutputField>,
    pub rules: Vec<Rule>,
    pub examples: Vec<Example>,
    calculate: ErasedCalculate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorInfo<'a> {
    #[serde(flatten)]
    pub meta: Meta,
    pub inputs: &'a [InputField],
    pub outputs: &'a [OutputField],
    pub examples: &'a [Example],
}

impl Registration {
    pub fn of<C: Calculator>() -> Self {
        Self {
            meta: C::meta(),
            inputs: C::inputs(),
            outputs: C::outputs(),
            rules: C::rules(),
            examples: C::examples(),
            calculate: calculate_erased::<C>,
        }
    }

    pub fn id(&self) -> &'static str {
        self.meta.id
    }

    pub fn describe(&self) -> CalculatorInfo<'_> {
        CalculatorInfo {
            meta: self.meta,
            inputs: &self.inputs,
            outputs: &self.outputs,
            examples: &self.examples,
        }
    }

    pub fn validate(&self, inputs: &InputMap, context: Option<&InputMap>) -> ValidationResult {
        let result = run_rules(&self.rules, &self.inputs, &Fields::new(inputs, context));
        debug!(
            calculator = self.meta.id,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validated inputs"
        );
        result
    }

    pub fn quick_validate(&self, field: &str, value: &Value, inputs: &InputMap) -> FieldCheck {
        quick_validate(&self.rules, &self.inputs, field, value, inputs)
    }

    /// Runs the formula engine and renders the report. The validator is not
    /// consulted; callers decide whether to validate first.
    pub fn calculate(&self, inputs: &InputMap) -> Result<CalculationResponse, CalcError> {
        debug!(calculator = self.meta.id, fields = inputs.len(), "calculating");
        match (self.calculate)(&self.inputs, inputs) {
            Ok((output, report)) => Ok(CalculationResponse {
                calculator_id: self.meta.id,
                output,
                report,
            }),
            Err(err) => {
                warn!(calculator = self.meta.id, error = %err, "calculation rejected");
                Err(err)
            }
        }
    }
}

fn calculate_erased<C: Calculator>(
    schema: &[InputField],
    inputs: &InputMap,
) -> Result<(Value, String), CalcError> {
    let normalized = normalize_numeric(schema, inputs);
    let input: C::Input = serde_json::from_value(Value::Object(normalized))
        .map_err(|e| CalcError::InvalidInput(e.to_string()))?;
    let output = C::calculate(&input)?;
    let report = C::report(&input, &output);
    Ok((serde_json::to_value(&output)?, report))
}
