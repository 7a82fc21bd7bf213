//! Parameter schema for actions.
//!
//! Declared parameters serve two audiences: the console renders forms from
//! them and the AI assistant receives them as a JSON Schema. Validation is
//! opt-in: executors call [`validate_params`] (or the [`ParamsExt`]
//! accessors) themselves, the execution wrapper does not enforce the schema.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ActionError;

/// Compiled `pattern` rules, keyed by source.
static PATTERNS: LazyLock<RwLock<HashMap<String, Regex>>> = LazyLock::new(Default::default);

fn compiled(pattern: &str) -> Result<Regex, regex::Error> {
    if let Some(re) = PATTERNS.read().get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    PATTERNS.write().insert(pattern.to_owned(), re.clone());
    Ok(re)
}

/// Parameters passed to an action: a JSON object.
pub type ActionParams = serde_json::Map<String, Value>;

/// JSON type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    /// UTF-8 string.
    String,
    /// Any JSON number.
    Number,
    /// A JSON number without a fractional part.
    Integer,
    /// `true` / `false`.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
    /// RFC 3339 timestamp carried as a string.
    Date,
}

impl ParameterType {
    /// JSON Schema `type` keyword for this parameter type.
    pub fn json_schema_type(self) -> &'static str {
        match self {
            Self::String | Self::Date => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Whether `value` has this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Date => value
                .as_str()
                .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
        }
    }
}

/// Optional constraints on a parameter value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationRule {
    /// Inclusive lower bound for numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound for numbers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Minimum length for strings and arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length for strings and arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression strings must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Allowed values.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Value>,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParameter {
    /// Parameter name (key in [`ActionParams`]).
    pub name: String,
    /// Expected JSON type.
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Whether the parameter must be present and non-null.
    pub required: bool,
    /// Short description.
    pub description: String,
    /// Optional constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRule>,
}

impl ActionParameter {
    /// Optional parameter of the given type.
    pub fn new(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            description: String::new(),
            validation: None,
        }
    }

    /// Optional string parameter.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::String)
    }

    /// Optional integer parameter.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Integer)
    }

    /// Optional boolean parameter.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Boolean)
    }

    /// Optional object parameter.
    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Object)
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach validation rules.
    pub fn with_validation(mut self, rule: ValidationRule) -> Self {
        self.validation = Some(rule);
        self
    }

    /// Restrict to a fixed set of values.
    pub fn one_of<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut rule = self.validation.clone().unwrap_or_default();
        rule.one_of = values.into_iter().map(Into::into).collect();
        self.with_validation(rule)
    }

    /// Bound a numeric parameter.
    pub fn range(self, min: f64, max: f64) -> Self {
        let mut rule = self.validation.clone().unwrap_or_default();
        rule.min = Some(min);
        rule.max = Some(max);
        self.with_validation(rule)
    }

    /// Check one value against type and rules.
    pub fn check(&self, value: &Value) -> Result<(), ActionError> {
        if !self.param_type.accepts(value) {
            return Err(ActionError::validation(format!(
                "{} must be of type {}",
                self.name,
                self.param_type.json_schema_type()
            )));
        }

        let Some(rule) = &self.validation else {
            return Ok(());
        };

        if let Some(n) = value.as_f64() {
            if rule.min.is_some_and(|min| n < min) || rule.max.is_some_and(|max| n > max) {
                return Err(ActionError::validation(format!(
                    "{} must be between {} and {}",
                    self.name,
                    rule.min.map_or_else(|| "-inf".to_owned(), |v| v.to_string()),
                    rule.max.map_or_else(|| "inf".to_owned(), |v| v.to_string()),
                )));
            }
        }

        let len = match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(a) => Some(a.len()),
            _ => None,
        };
        if let Some(len) = len {
            if rule.min_length.is_some_and(|min| len < min) {
                return Err(ActionError::validation(format!(
                    "{} is shorter than {}",
                    self.name,
                    rule.min_length.unwrap_or_default()
                )));
            }
            if rule.max_length.is_some_and(|max| len > max) {
                return Err(ActionError::validation(format!(
                    "{} is longer than {}",
                    self.name,
                    rule.max_length.unwrap_or_default()
                )));
            }
        }

        if let (Some(pattern), Some(s)) = (&rule.pattern, value.as_str()) {
            let re = compiled(pattern).map_err(|e| {
                ActionError::validation(format!("{} has an invalid pattern: {e}", self.name))
            })?;
            if !re.is_match(s) {
                return Err(ActionError::validation(format!(
                    "{} does not match {pattern}",
                    self.name
                )));
            }
        }

        if !rule.one_of.is_empty() && !rule.one_of.contains(value) {
            return Err(ActionError::validation(format!(
                "{} must be one of {}",
                self.name,
                Value::Array(rule.one_of.clone())
            )));
        }

        Ok(())
    }
}

/// Validate `params` against the declared parameters.
///
/// Missing or `null` required parameters fail. Undeclared keys are allowed.
pub fn validate_params(declared: &[ActionParameter], params: &ActionParams) -> Result<(), ActionError> {
    for parameter in declared {
        match params.get(&parameter.name) {
            None | Some(Value::Null) if parameter.required => {
                return Err(ActionError::validation(format!(
                    "{} is required",
                    parameter.name
                )));
            }
            None | Some(Value::Null) => {}
            Some(value) => parameter.check(value)?,
        }
    }
    Ok(())
}

/// Typed accessors over [`ActionParams`] that fail with validation errors.
pub trait ParamsExt {
    /// A required string.
    fn required_str(&self, name: &str) -> Result<&str, ActionError>;
    /// An optional string.
    fn optional_str(&self, name: &str) -> Option<&str>;
    /// An optional non-negative integer.
    fn optional_u64(&self, name: &str) -> Result<Option<u64>, ActionError>;
    /// An optional boolean.
    fn optional_bool(&self, name: &str) -> Result<Option<bool>, ActionError>;
    /// A required object.
    fn required_object(&self, name: &str) -> Result<&serde_json::Map<String, Value>, ActionError>;
    /// An optional object.
    fn optional_object(&self, name: &str) -> Result<Option<&serde_json::Map<String, Value>>, ActionError>;
}

impl ParamsExt for ActionParams {
    fn required_str(&self, name: &str) -> Result<&str, ActionError> {
        match self.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s),
            Some(Value::String(_)) | None | Some(Value::Null) => {
                Err(ActionError::validation(format!("{name} is required")))
            }
            Some(_) => Err(ActionError::validation(format!("{name} must be of type string"))),
        }
    }

    fn optional_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    fn optional_u64(&self, name: &str) -> Result<Option<u64>, ActionError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| {
                ActionError::validation(format!("{name} must be a non-negative integer"))
            }),
        }
    }

    fn optional_bool(&self, name: &str) -> Result<Option<bool>, ActionError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or_else(|| ActionError::validation(format!("{name} must be of type boolean"))),
        }
    }

    fn required_object(&self, name: &str) -> Result<&serde_json::Map<String, Value>, ActionError> {
        self.optional_object(name)?
            .ok_or_else(|| ActionError::validation(format!("{name} is required")))
    }

    fn optional_object(&self, name: &str) -> Result<Option<&serde_json::Map<String, Value>>, ActionError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(ActionError::validation(format!("{name} must be of type object"))),
        }
    }
}
