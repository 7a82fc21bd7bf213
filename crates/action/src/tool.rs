//! Actions described as AI-callable tools.
//!
//! A [`ToolDefinition`] is what the assistant sees: a function name, a
//! description and a JSON Schema for the arguments. Tool names only use
//! `[A-Za-z0-9_-]`, so action ids are sanitized and the original id is kept
//! alongside for dispatch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::metadata::ActionMetadata;
use crate::parameter::{ActionParameter, ActionParams, ParameterType};

const DEPRECATED_PREFIX: &str = "[Deprecated] ";

/// One action exposed to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Sanitized function name.
    pub name: String,
    /// Action id the tool dispatches to.
    pub action_id: String,
    /// Description shown to the model.
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Describe an action as a tool.
    pub fn from_metadata(metadata: &ActionMetadata) -> Self {
        let description = if metadata.deprecated {
            format!("{DEPRECATED_PREFIX}{}", metadata.description)
        } else {
            metadata.description.clone()
        };

        Self {
            name: tool_name(&metadata.id),
            action_id: metadata.id.clone(),
            description,
            parameters: parameters_schema(&metadata.parameters),
        }
    }
}

/// A tool invocation requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name as produced by [`ToolDefinition`], or a raw action id.
    pub name: String,
    /// Arguments object. Anything other than an object is treated as empty.
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// New call with the given arguments.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Arguments as action params.
    pub fn params(&self) -> ActionParams {
        match &self.arguments {
            Value::Object(map) => map.clone(),
            _ => ActionParams::new(),
        }
    }
}

/// Map an action id onto the tool-name alphabet.
pub fn tool_name(action_id: &str) -> String {
    action_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// JSON Schema for a parameter list.
pub fn parameters_schema(parameters: &[ActionParameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in parameters {
        properties.insert(param.name.clone(), property_schema(param));
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn property_schema(param: &ActionParameter) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!(param.param_type.json_schema_type()));
    if !param.description.is_empty() {
        schema.insert("description".into(), json!(param.description));
    }
    if param.param_type == ParameterType::Date {
        schema.insert("format".into(), json!("date-time"));
    }

    if let Some(rule) = &param.validation {
        if let Some(min) = rule.min {
            schema.insert("minimum".into(), json!(min));
        }
        if let Some(max) = rule.max {
            schema.insert("maximum".into(), json!(max));
        }
        if let Some(n) = rule.min_length {
            schema.insert("minLength".into(), json!(n));
        }
        if let Some(n) = rule.max_length {
            schema.insert("maxLength".into(), json!(n));
        }
        if let Some(pattern) = &rule.pattern {
            schema.insert("pattern".into(), json!(pattern));
        }
        if !rule.one_of.is_empty() {
            schema.insert("enum".into(), Value::Array(rule.one_of.clone()));
        }
    }

    Value::Object(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_are_sanitized() {
        assert_eq!(tool_name("objects.list"), "objects_list");
        assert_eq!(tool_name("reports:generate"), "reports_generate");
        assert_eq!(tool_name("plain-id_1"), "plain-id_1");
    }

    #[test]
    fn schema_from_parameters() {
        let meta = ActionMetadata::new("objects.list", "List", "List records")
            .with_parameter(
                ActionParameter::string("className")
                    .required()
                    .describe("Class to query"),
            )
            .with_parameter(ActionParameter::integer("limit").range(1.0, 1000.0))
            .with_parameter(ActionParameter::string("order").one_of(["asc", "desc"]));

        let tool = ToolDefinition::from_metadata(&meta);
        assert_eq!(tool.name, "objects_list");
        assert_eq!(tool.action_id, "objects.list");
        assert_eq!(
            tool.parameters,
            json!({
                "type": "object",
                "properties": {
                    "className": {"type": "string", "description": "Class to query"},
                    "limit": {"type": "integer", "minimum": 1.0, "maximum": 1000.0},
                    "order": {"type": "string", "enum": ["asc", "desc"]},
                },
                "required": ["className"],
            })
        );
    }

    #[test]
    fn deprecated_actions_are_flagged() {
        let meta = ActionMetadata::new("old", "Old", "Does old things").deprecated();
        let tool = ToolDefinition::from_metadata(&meta);
        assert_eq!(tool.description, "[Deprecated] Does old things");
    }

    #[test]
    fn date_parameters_carry_format() {
        let schema = parameters_schema(&[ActionParameter::new("since", ParameterType::Date)]);
        assert_eq!(schema["properties"]["since"]["format"], json!("date-time"));
    }

    #[test]
    fn call_params_ignore_non_objects() {
        assert!(ToolCall::new("x", json!([1, 2])).params().is_empty());
        let call: ToolCall = serde_json::from_value(json!({"name": "x"})).unwrap();
        assert!(call.params().is_empty());
        let call = ToolCall::new("x", json!({"a": 1}));
        assert_eq!(call.params().get("a"), Some(&json!(1)));
    }
}
