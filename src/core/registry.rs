use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::warn;

use super::engine::Registration;
use super::error::CalcError;
use super::rules::InputMap;
use super::types::{CalculationResponse, FieldCheck, ValidationResult};
use crate::calculators;

#[derive(Default)]
pub struct Registry {
    entries: Vec<Registration>,
}

static BUILTIN: Lazy<Registry> = Lazy::new(Registry::with_builtin);

/// Process-wide table of every shipped calculator, built on first use.
pub fn builtin() -> &'static Registry {
    &BUILTIN
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for registration in calculators::registrations() {
            registry.register(registration);
        }
        registry
    }

    /// Adds a calculator. A later registration with the same id replaces the
    /// earlier one.
    pub fn register(&mut self, registration: Registration) -> &mut Self {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|r| r.id() == registration.id())
        {
            warn!(calculator = registration.id(), "replacing existing registration");
            *existing = registration;
        } else {
            self.entries.push(registration);
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&Registration> {
        self.entries.iter().find(|r| r.id() == id)
    }

    pub fn lookup(&self, id: &str) -> Result<&Registration, CalcError> {
        self.get(id)
            .ok_or_else(|| CalcError::UnknownCalculator(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn calculate(&self, id: &str, inputs: &InputMap) -> Result<CalculationResponse, CalcError> {
        self.lookup(id)?.calculate(inputs)
    }

    pub fn validate(
        &self,
        id: &str,
        inputs: &InputMap,
        context: Option<&InputMap>,
    ) -> Result<ValidationResult, CalcError> {
        Ok(self.lookup(id)?.validate(inputs, context))
    }

    pub fn quick_validate(
        &self,
        id: &str,
        field: &str,
        value: &Value,
        inputs: &InputMap,
    ) -> Result<FieldCheck, CalcError> {
        Ok(self.lookup(id)?.quick_validate(field, value, inputs))
    }
}
