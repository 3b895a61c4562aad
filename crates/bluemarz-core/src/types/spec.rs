//! Declarative specifications of agents, sessions and assignments.
//!
//! These are the documents callers write (JSON or YAML, camelCase keys) to
//! describe an assignment. Backends turn them into live [`Agent`](crate::Agent)
//! and [`Session`](crate::Session) objects through registered factories.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use super::message::{SessionFile, SessionMessage};
use super::tool::{ToolCall, ToolSpec};
use crate::error::{BluemarzError, BluemarzResult};
use crate::parameters::Parameters;

/// Session type hint meaning "the backend's own session type for this agent".
pub const NATIVE_SESSION: &str = "NativeSession";

fn non_blank(field: &str, value: &str) -> BluemarzResult<()> {
    if value.trim().is_empty() {
        return Err(BluemarzError::Validation(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}

/// Specification of an agent hosted by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Backend type tag resolved through the agent class registry.
    #[serde(rename = "type")]
    pub agent_type: String,
    pub session_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_query: Option<String>,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
    #[serde(default)]
    pub parameters: Parameters,
}

impl AgentSpec {
    pub fn new(
        id: impl Into<String>,
        agent_type: impl Into<String>,
        session_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            api_key: None,
            agent_type: agent_type.into(),
            session_type: session_type.into(),
            model: None,
            name: None,
            prompt: None,
            default_query: None,
            tools: Vec::new(),
            parameters: Parameters::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_default_query(mut self, query: impl Into<String>) -> Self {
        self.default_query = Some(query.into());
        self
    }

    pub fn with_tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn uses_native_session(&self) -> bool {
        self.session_type == NATIVE_SESSION
    }

    pub fn validate(&self) -> BluemarzResult<()> {
        non_blank("Agent id", &self.id)?;
        non_blank("Agent type", &self.agent_type)?;
        non_blank("Agent session type", &self.session_type)?;
        if let Some(api_key) = &self.api_key {
            non_blank("Agent api key", api_key)?;
        }
        for tool in &self.tools {
            tool.validate()?;
        }
        Ok(())
    }
}

/// Specification of a conversation held by a backend.
///
/// A missing `id` asks the backend to create a new session; the backend then
/// writes the assigned id back with [`SessionSpec::assign_id`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub session_type: Option<String>,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
    #[serde(default)]
    pub files: Vec<SessionFile>,
    #[serde(default)]
    pub setup_tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub parameters: Parameters,
}

impl SessionSpec {
    pub fn existing(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, session_type: impl Into<String>) -> Self {
        self.session_type = Some(session_type.into());
        self
    }

    pub fn with_message(mut self, message: SessionMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Record the identity the backend assigned to a newly created session.
    pub fn assign_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn validate(&self) -> BluemarzResult<()> {
        if let Some(id) = &self.id {
            non_blank("Session id", id)?;
        }
        if let Some(api_key) = &self.api_key {
            non_blank("Session api key", api_key)?;
        }
        if let Some(session_type) = &self.session_type {
            non_blank("Session type", session_type)?;
        }
        for message in &self.messages {
            message.validate()?;
        }
        Ok(())
    }
}

/// Declarative description of a whole assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSpec {
    pub agent: AgentSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSpec>,
    #[serde(default)]
    pub additional_tools: Vec<ToolSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub parameters: Parameters,
}

impl AssignmentSpec {
    pub fn new(agent: AgentSpec) -> Self {
        Self {
            agent,
            session: None,
            additional_tools: Vec::new(),
            query: None,
            parameters: Parameters::new(),
        }
    }

    pub fn with_session(mut self, session: SessionSpec) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_additional_tool(mut self, tool: ToolSpec) -> Self {
        self.additional_tools.push(tool);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Session type an assignment built from this spec will use.
    ///
    /// `NativeSession` agents get `<agent type>NativeSession`; otherwise the
    /// session's own type wins over the agent's hint.
    pub fn resolved_session_type(&self) -> String {
        if self.agent.uses_native_session() {
            return format!("{}{}", self.agent.agent_type, NATIVE_SESSION);
        }
        self.session
            .as_ref()
            .and_then(|session| session.session_type.clone())
            .unwrap_or_else(|| self.agent.session_type.clone())
    }

    pub fn validate(&self) -> BluemarzResult<()> {
        self.agent.validate()?;
        if let Some(session) = &self.session {
            session.validate()?;
        }
        for tool in &self.additional_tools {
            tool.validate()?;
        }
        Ok(())
    }

    /// Parse and validate a JSON assignment document.
    pub fn from_json_str(content: &str) -> BluemarzResult<Self> {
        let spec: Self = serde_json::from_str(content)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse and validate a YAML assignment document.
    pub fn from_yaml_str(content: &str) -> BluemarzResult<Self> {
        let spec: Self = serde_yaml::from_str(content)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load an assignment document, choosing the format by file extension.
    ///
    /// `.yaml` / `.yml` files are read as YAML, anything else as JSON.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> BluemarzResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BluemarzError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        if is_yaml_path(path) {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }
}

/// Whether a spec file should be parsed as YAML.
pub fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_agent_spec_validation() {
        assert!(AgentSpec::new("asst_1", "MockAgent", "MockSession").validate().is_ok());
        assert!(AgentSpec::new("", "MockAgent", "MockSession").validate().is_err());
        assert!(AgentSpec::new("asst_1", " ", "MockSession").validate().is_err());
        assert!(
            AgentSpec::new("asst_1", "MockAgent", "MockSession")
                .with_api_key("")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_session_spec_assign_id() {
        let mut spec = SessionSpec::default();
        assert!(spec.is_new());
        spec.assign_id("thread_1");
        assert_eq!(spec.id.as_deref(), Some("thread_1"));
        assert!(!spec.is_new());
    }

    #[test]
    fn test_assignment_spec_from_json() {
        let spec = AssignmentSpec::from_json_str(
            &json!({
                "agent": {
                    "id": "asst_1",
                    "type": "MockAgent",
                    "sessionType": "NativeSession",
                    "defaultQuery": "hello",
                    "tools": [
                        {"toolType": "sync", "name": "add", "description": "Add numbers"}
                    ]
                },
                "query": "compute 2+3",
                "parameters": {"tenant": "acme"}
            })
            .to_string(),
        )
        .unwrap();

        assert!(spec.agent.uses_native_session());
        assert_eq!(spec.agent.tools.len(), 1);
        assert_eq!(spec.query.as_deref(), Some("compute 2+3"));
        assert_eq!(spec.parameters["tenant"], json!("acme"));
        assert!(spec.session.is_none());
    }

    #[test]
    fn test_assignment_spec_from_yaml() {
        let yaml = r#"
agent:
  id: asst_1
  type: MockAgent
  sessionType: MockSession
session:
  id: thread_9
  parameters:
    region: "$parameters.region"
parameters:
  region: eu
"#;
        let spec = AssignmentSpec::from_yaml_str(yaml).unwrap();
        let session = spec.session.unwrap();
        assert_eq!(session.id.as_deref(), Some("thread_9"));
        assert_eq!(session.parameters["region"], json!("$parameters.region"));
    }

    #[test]
    fn test_invalid_document_is_rejected() {
        let err = AssignmentSpec::from_json_str(
            r#"{"agent": {"id": "", "type": "MockAgent", "sessionType": "MockSession"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BluemarzError::Validation(_)));

        let err = AssignmentSpec::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, BluemarzError::Serialization(_)));
    }

    #[test]
    fn test_yaml_path_detection() {
        assert!(is_yaml_path(Path::new("specs/assignment.yaml")));
        assert!(is_yaml_path(Path::new("a.yml")));
        assert!(!is_yaml_path(Path::new("a.json")));
        assert!(!is_yaml_path(Path::new("noext")));
    }

    #[test]
    fn test_resolved_session_type() {
        let agent = AgentSpec::new("asst_1", "OpenAiAssistant", "Thread");
        let spec = AssignmentSpec::new(agent.clone());
        assert_eq!(spec.resolved_session_type(), "Thread");

        let spec = spec.with_session(SessionSpec::default().with_type("SlackThread"));
        assert_eq!(spec.resolved_session_type(), "SlackThread");

        let native = AssignmentSpec::new(AgentSpec::new("asst_1", "OpenAiAssistant", NATIVE_SESSION))
            .with_session(SessionSpec::default().with_type("SlackThread"));
        assert_eq!(native.resolved_session_type(), "OpenAiAssistantNativeSession");
    }
}
