use serde::Serialize;
use serde_json::Value;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

/// Outcome of a full validation pass. Only error-severity issues make the
/// input invalid; warnings and info notes ride along in `warnings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    pub fn mentions(&self, message: &str) -> bool {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .any(|issue| issue.message == message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldCheck {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    Currency,
    Percentage,
    Integer,
    Text,
    Select,
    Date,
    Boolean,
    List,
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldKind::Number | FieldKind::Currency | FieldKind::Percentage | FieldKind::Integer
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl InputField {
    pub fn new(id: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            id,
            label,
            kind,
            required: false,
            min: None,
            max: None,
            options: Vec::new(),
            default: None,
        }
    }

    pub fn currency(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, FieldKind::Currency)
    }

    pub fn percentage(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, FieldKind::Percentage)
    }

    pub fn number(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, FieldKind::Number)
    }

    pub fn integer(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, FieldKind::Integer)
    }

    pub fn date(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, FieldKind::Date)
    }

    pub fn select(id: &'static str, label: &'static str, options: &[&'static str]) -> Self {
        let mut field = Self::new(id, label, FieldKind::Select);
        field.options = options.to_vec();
        field
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputField {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

impl OutputField {
    pub fn new(id: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { id, label, kind }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub title: &'static str,
    pub description: &'static str,
    pub inputs: Value,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub id: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub subcategory: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResponse {
    pub calculator_id: &'static str,
    pub output: Value,
    pub report: String,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
