//! Tool specifications, tool calls and their results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use super::message::SessionFile;
use crate::error::{BluemarzError, BluemarzResult};
use crate::parameters::Parameters;

/// How the orchestrator must treat a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Must complete before the run can proceed; may be executed locally.
    Sync,
    /// Result arrives out-of-band; the orchestrator hands control back.
    Async,
    /// Ends the conversation.
    Terminal,
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolKind::Sync => write!(f, "sync"),
            ToolKind::Async => write!(f, "async"),
            ToolKind::Terminal => write!(f, "terminal"),
        }
    }
}

/// Value type of a tool variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Integer,
    Enum,
}

impl VariableType {
    /// JSON-Schema type keyword for this variable type.
    pub fn schema_type(&self) -> &'static str {
        match self {
            VariableType::String | VariableType::Enum => "string",
            VariableType::Number => "number",
            VariableType::Boolean => "boolean",
            VariableType::Integer => "integer",
        }
    }
}

fn default_required() -> bool {
    true
}

/// A typed argument declaration of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub description: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl Variable {
    pub fn new(kind: VariableType, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kind,
            required: true,
            enum_values: None,
        }
    }

    /// Declare an enum variable with its allowed values.
    pub fn one_of(description: impl Into<String>, values: &[&str]) -> Self {
        Self {
            enum_values: Some(values.iter().map(|v| v.to_string()).collect()),
            ..Self::new(VariableType::Enum, description)
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn validate(&self, name: &str) -> BluemarzResult<()> {
        if self.description.trim().is_empty() {
            return Err(BluemarzError::Validation(format!(
                "Variable '{name}' must have a description"
            )));
        }
        if self.kind == VariableType::Enum
            && self.enum_values.as_ref().is_none_or(|v| v.is_empty())
        {
            return Err(BluemarzError::Validation(format!(
                "Enum variable '{name}' must list its values"
            )));
        }
        Ok(())
    }

    fn schema(&self) -> Value {
        let mut property = json!({
            "type": self.kind.schema_type(),
            "description": self.description,
        });
        if let Some(values) = &self.enum_values {
            property["enum"] = json!(values);
        }
        property
    }
}

/// Declarative description of a tool an agent may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub tool_type: ToolKind,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, Variable>>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
}

impl ToolSpec {
    pub fn new(kind: ToolKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tool_type: kind,
            name: name.into(),
            description: description.into(),
            variables: None,
            parameters: Parameters::new(),
        }
    }

    pub fn sync(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ToolKind::Sync, name, description)
    }

    pub fn deferred(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ToolKind::Async, name, description)
    }

    pub fn terminal(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ToolKind::Terminal, name, description)
    }

    pub fn with_variable(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.variables
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), variable);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn is_sync(&self) -> bool {
        self.tool_type == ToolKind::Sync
    }

    pub fn validate(&self) -> BluemarzResult<()> {
        if self.name.trim().is_empty() {
            return Err(BluemarzError::Validation(
                "Tool name cannot be empty".to_string(),
            ));
        }
        for (name, variable) in self.variables.iter().flatten() {
            variable.validate(name)?;
        }
        Ok(())
    }

    /// JSON-Schema object describing the tool's arguments.
    ///
    /// Backends embed this in their function-calling declarations. A tool
    /// without variables takes an empty object.
    pub fn calling_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, variable) in self.variables.iter().flatten() {
            properties.insert(name.clone(), variable.schema());
            if variable.required {
                required.push(Value::String(name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Function declaration (`name`, `description`, `parameters`) for this tool.
    pub fn function_schema(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.calling_schema(),
        })
    }
}

/// A tool invocation requested by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Correlation id assigned by the backend.
    pub id: String,
    pub tool_name: String,
    /// The spec of the invoked tool, when the backend could resolve it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolSpec>,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            tool: None,
            arguments: Map::new(),
        }
    }

    /// Build a call for `spec`, taking the tool name from it.
    pub fn for_tool(id: impl Into<String>, spec: ToolSpec) -> Self {
        Self {
            tool_name: spec.name.clone(),
            tool: Some(spec),
            ..Self::new(id, "")
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Name of the invoked tool, preferring the resolved spec.
    pub fn name(&self) -> &str {
        self.tool
            .as_ref()
            .map(|spec| spec.name.as_str())
            .unwrap_or(&self.tool_name)
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }
}

/// Outcome of a tool call, submitted back to the backend.
///
/// A populated `error` reports a failed call without aborting the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub tool_call: ToolCall,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<SessionFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallResult {
    pub fn text(tool_call: ToolCall, text: impl Into<String>) -> Self {
        Self {
            tool_call,
            text: Some(text.into()),
            files: None,
            error: None,
        }
    }

    pub fn files(tool_call: ToolCall, files: Vec<SessionFile>) -> Self {
        Self {
            tool_call,
            text: None,
            files: Some(files),
            error: None,
        }
    }

    pub fn error(tool_call: ToolCall, error: impl Into<String>) -> Self {
        Self {
            tool_call,
            text: None,
            files: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn call_id(&self) -> &str {
        &self.tool_call.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_spec() -> ToolSpec {
        ToolSpec::sync("add", "Add two integers")
            .with_variable("a", Variable::new(VariableType::Integer, "left operand"))
            .with_variable("b", Variable::new(VariableType::Integer, "right operand"))
            .with_variable(
                "mode",
                Variable::one_of("rounding", &["floor", "ceil"]).optional(),
            )
    }

    #[test]
    fn test_calling_schema() {
        let schema = add_spec().calling_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["a"]["type"], "integer");
        assert_eq!(schema["properties"]["mode"]["type"], "string");
        assert_eq!(schema["properties"]["mode"]["enum"], json!(["floor", "ceil"]));
        assert_eq!(schema["required"], json!(["a", "b"]));
    }

    #[test]
    fn test_schema_without_variables() {
        let schema = ToolSpec::deferred("approve", "Ask a human").function_schema();
        assert_eq!(schema["name"], "approve");
        assert_eq!(schema["parameters"]["properties"], json!({}));
        assert_eq!(schema["parameters"]["required"], json!([]));
    }

    #[test]
    fn test_enum_variable_requires_values() {
        let spec = ToolSpec::sync("pick", "Pick one").with_variable(
            "choice",
            Variable::new(VariableType::Enum, "the choice"),
        );
        assert!(matches!(spec.validate(), Err(BluemarzError::Validation(_))));
        assert!(add_spec().validate().is_ok());
    }

    #[test]
    fn test_tool_spec_wire_format() {
        let spec: ToolSpec = serde_json::from_value(json!({
            "toolType": "async",
            "name": "approve",
            "description": "Ask a human",
            "variables": {
                "reason": {"description": "why", "type": "string", "required": false}
            }
        }))
        .unwrap();

        assert_eq!(spec.tool_type, ToolKind::Async);
        let reason = &spec.variables.as_ref().unwrap()["reason"];
        assert!(!reason.required);
        assert_eq!(reason.kind, VariableType::String);
    }

    #[test]
    fn test_tool_call_name_prefers_spec() {
        let call = ToolCall::for_tool("call_1", add_spec())
            .with_argument("a", json!(2))
            .with_argument("b", json!(3));
        assert_eq!(call.name(), "add");
        assert_eq!(call.argument("b"), Some(&json!(3)));

        let unresolved = ToolCall::new("call_2", "search");
        assert_eq!(unresolved.name(), "search");
    }

    #[test]
    fn test_error_result_is_not_a_failure_of_the_handler() {
        let result = ToolCallResult::error(ToolCall::new("call_1", "add"), "division by zero");
        assert!(result.is_error());
        assert_eq!(result.call_id(), "call_1");

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error"], "division by zero");
        assert!(json.get("text").is_none());
    }
}
