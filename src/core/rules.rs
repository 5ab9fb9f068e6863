use serde_json::{Map, Value};

use super::types::{
    FieldCheck, FieldKind, InputField, Severity, ValidationIssue, ValidationResult,
};

pub type InputMap = Map<String, Value>;

/// Business rule over the whole input map. Returns `false` when violated.
pub type Predicate = fn(&Fields<'_>) -> bool;

#[derive(Clone, Copy)]
pub enum RuleKind {
    Required,
    Range { min: f64, max: f64 },
    EnumMember(&'static [&'static str]),
    CrossField(Predicate),
}

/// Which validation pass a rule takes part in. Field-level feedback often
/// wants finer messages than the aggregated full pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    Both,
    FullOnly,
    QuickOnly,
}

#[derive(Clone)]
pub struct Rule {
    pub field: &'static str,
    pub kind: RuleKind,
    pub message: String,
    pub severity: Severity,
    pub scope: Scope,
}

impl Rule {
    fn new(field: &'static str, kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
            severity: Severity::Error,
            scope: Scope::Both,
        }
    }

    pub fn required(field: &'static str, message: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Required, message)
    }

    pub fn range(field: &'static str, min: f64, max: f64, message: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Range { min, max }, message)
    }

    pub fn one_of(
        field: &'static str,
        allowed: &'static [&'static str],
        message: impl Into<String>,
    ) -> Self {
        Self::new(field, RuleKind::EnumMember(allowed), message)
    }

    pub fn cross(field: &'static str, message: impl Into<String>, predicate: Predicate) -> Self {
        Self::new(field, RuleKind::CrossField(predicate), message)
    }

    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn info(mut self) -> Self {
        self.severity = Severity::Info;
        self
    }

    pub fn full_only(mut self) -> Self {
        self.scope = Scope::FullOnly;
        self
    }

    pub fn quick_only(mut self) -> Self {
        self.scope = Scope::QuickOnly;
        self
    }
}

/// Read-only view over caller inputs (and optional sibling context) with
/// numeric coercion applied on access.
#[derive(Clone, Copy)]
pub struct Fields<'a> {
    inputs: &'a InputMap,
    context: Option<&'a InputMap>,
}

impl<'a> Fields<'a> {
    pub fn new(inputs: &'a InputMap, context: Option<&'a InputMap>) -> Self {
        Self { inputs, context }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.inputs.get(key).filter(|v| !is_blank(v))
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(coerce_number)
    }

    pub fn text(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn list(&self, key: &str) -> Option<&'a Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    pub fn context_number(&self, key: &str) -> Option<f64> {
        self.context
            .and_then(|ctx| ctx.get(key))
            .and_then(coerce_number)
    }
}

pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn label_for(schema: &[InputField], field: &str) -> String {
    schema
        .iter()
        .find(|f| f.id == field)
        .map(|f| f.label.to_string())
        .unwrap_or_else(|| field.to_string())
}

fn check(rule: &Rule, schema: &[InputField], fields: &Fields<'_>) -> Option<ValidationIssue> {
    let failed_with = |message: String| ValidationIssue {
        field: rule.field.to_string(),
        message,
        severity: rule.severity,
    };

    match rule.kind {
        RuleKind::Required => fields
            .get(rule.field)
            .is_none()
            .then(|| failed_with(rule.message.clone())),
        RuleKind::Range { min, max } => {
            let value = fields.get(rule.field)?;
            match coerce_number(value) {
                Some(n) if (min..=max).contains(&n) => None,
                Some(_) => Some(failed_with(rule.message.clone())),
                None => Some(ValidationIssue {
                    field: rule.field.to_string(),
                    message: format!("{} must be a number", label_for(schema, rule.field)),
                    severity: Severity::Error,
                }),
            }
        }
        RuleKind::EnumMember(allowed) => {
            let value = fields.get(rule.field)?;
            match value.as_str() {
                Some(s) if allowed.contains(&s) => None,
                _ => Some(failed_with(rule.message.clone())),
            }
        }
        RuleKind::CrossField(predicate) => {
            (!predicate(fields)).then(|| failed_with(rule.message.clone()))
        }
    }
}

/// Runs every rule; a failing rule never stops the ones after it.
pub fn run_rules(rules: &[Rule], schema: &[InputField], fields: &Fields<'_>) -> ValidationResult {
    let issues = rules
        .iter()
        .filter(|rule| rule.scope != Scope::QuickOnly)
        .filter_map(|rule| check(rule, schema, fields))
        .collect();
    ValidationResult::from_issues(issues)
}

/// Re-runs only the rules attached to `field`, with `value` substituted into
/// the input map, and reports the first failure.
pub fn quick_validate(
    rules: &[Rule],
    schema: &[InputField],
    field: &str,
    value: &Value,
    inputs: &InputMap,
) -> FieldCheck {
    let mut merged = inputs.clone();
    merged.insert(field.to_string(), value.clone());
    let fields = Fields::new(&merged, None);

    rules
        .iter()
        .filter(|rule| rule.field == field && rule.scope != Scope::FullOnly)
        .find_map(|rule| check(rule, schema, &fields))
        .map(|issue| FieldCheck {
            is_valid: issue.severity != Severity::Error,
            message: Some(issue.message),
        })
        .unwrap_or_else(FieldCheck::ok)
}

/// Drops blank values so typed records fall back to their defaults, and
/// replaces numeric-looking strings with numbers for every numeric schema
/// field so the typed record can be decoded.
pub fn normalize_numeric(schema: &[InputField], inputs: &InputMap) -> InputMap {
    let mut normalized: InputMap = inputs
        .iter()
        .filter(|(_, value)| !is_blank(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for field in schema.iter().filter(|f| f.kind.is_numeric()) {
        let Some(Value::String(raw)) = normalized.get(field.id) else {
            continue;
        };
        let Some(parsed) = raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()) else {
            continue;
        };
        let number = if field.kind == FieldKind::Integer && parsed.fract() == 0.0 {
            Some(serde_json::Number::from(parsed as i64))
        } else {
            serde_json::Number::from_f64(parsed)
        };
        if let Some(n) = number {
            normalized.insert(field.id.to_string(), Value::Number(n));
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<InputField> {
        vec![
            InputField::currency("amount", "Amount").required(),
            InputField::number("low", "Low"),
            InputField::number("high", "High"),
            InputField::select("mode", "Mode", &["fast", "slow"]),
        ]
    }

    fn rules() -> Vec<Rule> {
        vec![
            Rule::required("amount", "Amount is required"),
            Rule::range("amount", 1.0, 100.0, "Amount must be between 1 and 100"),
            Rule::one_of("mode", &["fast", "slow"], "Mode must be fast or slow"),
            Rule::cross("low", "Low must not exceed high", |f| {
                match (f.number("low"), f.number("high")) {
                    (Some(low), Some(high)) => low <= high,
                    _ => true,
                }
            }),
            Rule::range("high", 0.0, 50.0, "High seems unusually large").warning(),
        ]
    }

    fn map(value: Value) -> InputMap {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn run_rules_reports_every_violation() {
        let inputs = map(json!({"mode": "medium", "low": 9, "high": 3}));
        let result = run_rules(&rules(), &schema(), &Fields::new(&inputs, None));

        assert!(!result.is_valid);
        assert_eq!(
            result.error_messages(),
            vec![
                "Amount is required",
                "Mode must be fast or slow",
                "Low must not exceed high"
            ]
        );
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let inputs = map(json!({"amount": 10, "high": 80}));
        let result = run_rules(&rules(), &schema(), &Fields::new(&inputs, None));

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].severity, Severity::Warning);
        assert!(result.mentions("High seems unusually large"));
    }

    #[test]
    fn numeric_strings_are_coerced_before_range_checks() {
        let inputs = map(json!({"amount": " 42.5 "}));
        let result = run_rules(&rules(), &schema(), &Fields::new(&inputs, None));
        assert!(result.is_valid, "{result:?}");

        let inputs = map(json!({"amount": "lots"}));
        let result = run_rules(&rules(), &schema(), &Fields::new(&inputs, None));
        assert_eq!(result.error_messages(), vec!["Amount must be a number"]);
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let inputs = map(json!({"amount": ""}));
        let result = run_rules(&rules(), &schema(), &Fields::new(&inputs, None));
        assert_eq!(result.error_messages(), vec!["Amount is required"]);
    }

    #[test]
    fn quick_validate_returns_first_failure_for_field_only() {
        let inputs = map(json!({"mode": "bogus"}));
        let check = quick_validate(&rules(), &schema(), "amount", &json!(500), &inputs);
        assert!(!check.is_valid);
        assert_eq!(
            check.message.as_deref(),
            Some("Amount must be between 1 and 100")
        );

        let check = quick_validate(&rules(), &schema(), "amount", &json!(5), &inputs);
        assert_eq!(check, FieldCheck::ok());
    }

    #[test]
    fn quick_validate_flags_warnings_without_invalidating() {
        let check = quick_validate(&rules(), &schema(), "high", &json!(75), &InputMap::new());
        assert!(check.is_valid);
        assert_eq!(check.message.as_deref(), Some("High seems unusually large"));
    }

    #[test]
    fn scoped_rules_only_run_in_their_pass() {
        let rules = vec![
            Rule::range("amount", 1.0, 100.0, "Amount must be between 1 and 100").full_only(),
            Rule::range("amount", f64::NEG_INFINITY, 100.0, "Amount cannot exceed 100")
                .quick_only(),
        ];
        let inputs = map(json!({"amount": 500}));

        let result = run_rules(&rules, &schema(), &Fields::new(&inputs, None));
        assert_eq!(result.error_messages(), vec!["Amount must be between 1 and 100"]);

        let check = quick_validate(&rules, &schema(), "amount", &json!(500), &InputMap::new());
        assert_eq!(check.message.as_deref(), Some("Amount cannot exceed 100"));
    }

    #[test]
    fn normalize_numeric_only_touches_numeric_fields() {
        let mut schema = schema();
        schema.push(InputField::new("note", "Note", FieldKind::Text));
        schema.push(InputField::integer("count", "Count"));
        let inputs = map(json!({
            "amount": "12", "note": "12", "low": "", "mode": null, "count": "7"
        }));

        let normalized = normalize_numeric(&schema, &inputs);
        assert_eq!(normalized.get("amount"), Some(&json!(12.0)));
        assert_eq!(normalized.get("note"), Some(&json!("12")));
        assert_eq!(normalized.get("count"), Some(&json!(7)));
        assert!(!normalized.contains_key("low"));
        assert!(!normalized.contains_key("mode"));
    }
}
