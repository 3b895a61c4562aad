//! Building assignments from declarative specs.
//!
//! Top-level parameters cascade into the agent, its tools and the session
//! before the registered factories build the live objects. An agent whose
//! session type is `NativeSession` gets the backend's own session type
//! (`<agent type>NativeSession`), inherits the agent's API key and sees the
//! agent parameters too.

use std::sync::Arc;
use tracing::debug;

use bluemarz_core::{
    AgentSpec, AssignmentSpec, BluemarzResult, Parameters, SessionMessage, SessionSpec, ToolSpec,
    merge_parameters,
};
use bluemarz_registry::CapabilityRegistry;

use crate::assignment::Assignment;

fn cascade_agent_spec(
    mut agent: AgentSpec,
    additional_tools: Vec<ToolSpec>,
    parameters: &Parameters,
) -> AgentSpec {
    agent.parameters = merge_parameters(parameters, &agent.parameters);
    agent.tools.extend(additional_tools);
    for tool in &mut agent.tools {
        tool.parameters = merge_parameters(parameters, &tool.parameters);
    }
    agent
}

fn cascade_session_spec(
    agent: &AgentSpec,
    mut session: SessionSpec,
    session_type: String,
    parameters: &Parameters,
) -> SessionSpec {
    if agent.uses_native_session() {
        if session.api_key.is_none() {
            session.api_key = agent.api_key.clone();
        }
        session.parameters = merge_parameters(
            &merge_parameters(parameters, &agent.parameters),
            &session.parameters,
        );
    } else {
        session.parameters = merge_parameters(parameters, &session.parameters);
    }
    session.session_type = Some(session_type);
    session
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.trim().is_empty())
}

impl Assignment {
    /// Build an assignment from a spec using the process-wide registry.
    pub async fn from_spec(spec: AssignmentSpec) -> BluemarzResult<Self> {
        Self::from_spec_with_registry(bluemarz_registry::global(), spec).await
    }

    /// Build an assignment from a spec against an explicit registry.
    ///
    /// The spec's `query` is added to the session as a user message. Without
    /// one, the agent's default query is added if the session is still empty.
    pub async fn from_spec_with_registry(
        registry: Arc<CapabilityRegistry>,
        spec: AssignmentSpec,
    ) -> BluemarzResult<Self> {
        spec.validate()?;
        let session_type = spec.resolved_session_type();
        let AssignmentSpec {
            agent,
            session,
            additional_tools,
            query,
            parameters,
        } = spec;

        let agent_spec = cascade_agent_spec(agent, additional_tools, &parameters);
        let session_spec = cascade_session_spec(
            &agent_spec,
            session.unwrap_or_default(),
            session_type.clone(),
            &parameters,
        );
        debug!(
            agent_type = %agent_spec.agent_type,
            session_type = %session_type,
            tools = agent_spec.tools.len(),
            "Building assignment from spec"
        );

        let agent = registry
            .resolve_agent_class(&agent_spec.agent_type)?
            .from_spec(agent_spec)
            .await?;
        let session = registry
            .resolve_session_class(&session_type)?
            .from_spec(session_spec)
            .await?;

        if let Some(query) = non_empty(query.as_deref()) {
            session.add_message(SessionMessage::user(query)).await?;
        } else if let Some(default_query) = non_empty(agent.spec().default_query.as_deref()) {
            if session.is_empty().await {
                session.add_message(SessionMessage::user(default_query)).await?;
            }
        }

        Self::with_registry(registry, agent, session, None, parameters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluemarz_core::downcast_session;
    use bluemarz_core::types::NATIVE_SESSION;
    use bluemarz_testing::{
        MOCK_AGENT, MOCK_SESSION, MockAgentFactory, MockSession, MockSessionFactory,
        ScriptedExecutor,
    };
    use rstest::rstest;
    use serde_json::json;

    struct Backend {
        registry: Arc<CapabilityRegistry>,
        agents: MockAgentFactory,
        sessions: MockSessionFactory,
    }

    fn backend(session_type: &str) -> Backend {
        let registry = Arc::new(CapabilityRegistry::new());
        let agents = MockAgentFactory::new();
        let sessions = MockSessionFactory::new();
        registry
            .register_agent_class(MOCK_AGENT, Arc::new(agents.clone()))
            .unwrap();
        registry
            .register_session_class(session_type, Arc::new(sessions.clone()))
            .unwrap();
        registry
            .register_executor(Arc::new(ScriptedExecutor::new(MOCK_AGENT, session_type)))
            .unwrap();
        Backend {
            registry,
            agents,
            sessions,
        }
    }

    fn session_messages(assignment: &Assignment) -> Vec<SessionMessage> {
        downcast_session::<MockSession>(assignment.session())
            .unwrap()
            .messages()
    }

    #[tokio::test]
    async fn test_parameters_cascade_into_agent_and_tools() {
        let backend = backend(MOCK_SESSION);
        let spec = AssignmentSpec::new(
            AgentSpec::new("asst_1", MOCK_AGENT, MOCK_SESSION)
                .with_parameter("model", json!("$parameters.model"))
                .with_tool(ToolSpec::sync("add", "Add").with_parameter("owner", json!("$parameters.team"))),
        )
        .with_additional_tool(ToolSpec::deferred("approve", "Ask a human"))
        .with_parameter("model", json!("gpt-4o"))
        .with_parameter("team", json!("blue"));

        let assignment = Assignment::from_spec_with_registry(backend.registry.clone(), spec)
            .await
            .unwrap();

        let built = backend.agents.built_specs().remove(0);
        assert_eq!(built.parameters["model"], json!("gpt-4o"));
        assert_eq!(built.tools.len(), 2);
        assert_eq!(built.tools[0].parameters["owner"], json!("blue"));
        assert_eq!(built.tools[1].parameters["team"], json!("blue"));
        assert_eq!(assignment.parameters()["team"], json!("blue"));
        assert!(assignment.run_id().is_none());
    }

    #[tokio::test]
    async fn test_session_type_defaults_to_agent_hint() {
        let backend = backend(MOCK_SESSION);
        let spec = AssignmentSpec::new(AgentSpec::new("asst_1", MOCK_AGENT, MOCK_SESSION))
            .with_session(SessionSpec::default().with_parameter("region", json!("$parameters.region")))
            .with_parameter("region", json!("eu"));

        Assignment::from_spec_with_registry(backend.registry.clone(), spec)
            .await
            .unwrap();

        let built = backend.sessions.built_specs().remove(0);
        assert_eq!(built.session_type.as_deref(), Some(MOCK_SESSION));
        assert_eq!(built.parameters["region"], json!("eu"));
        assert!(built.api_key.is_none());
    }

    #[tokio::test]
    async fn test_native_session_inherits_from_agent() {
        let backend = backend("MockAgentNativeSession");
        let spec = AssignmentSpec::new(
            AgentSpec::new("asst_1", MOCK_AGENT, NATIVE_SESSION)
                .with_api_key("sk-agent")
                .with_parameter("temperature", json!(0.2)),
        )
        .with_parameter("team", json!("blue"));

        let assignment = Assignment::from_spec_with_registry(backend.registry.clone(), spec)
            .await
            .unwrap();

        let built = backend.sessions.built_specs().remove(0);
        assert_eq!(built.session_type.as_deref(), Some("MockAgentNativeSession"));
        assert_eq!(built.api_key.as_deref(), Some("sk-agent"));
        assert_eq!(built.parameters["temperature"], json!(0.2));
        assert_eq!(built.parameters["team"], json!("blue"));
        assert_eq!(assignment.session().type_name(), "MockAgentNativeSession");
    }

    #[tokio::test]
    async fn test_native_session_keeps_its_own_api_key() {
        let backend = backend("MockAgentNativeSession");
        let mut session = SessionSpec::existing("thread_1");
        session.api_key = Some("sk-session".to_string());
        let spec = AssignmentSpec::new(
            AgentSpec::new("asst_1", MOCK_AGENT, NATIVE_SESSION).with_api_key("sk-agent"),
        )
        .with_session(session);

        Assignment::from_spec_with_registry(backend.registry.clone(), spec)
            .await
            .unwrap();

        assert_eq!(
            backend.sessions.built_specs()[0].api_key.as_deref(),
            Some("sk-session")
        );
    }

    #[rstest]
    #[case::query_wins(Some("What is 2+3?"), Some("Say hello"), false, Some("What is 2+3?"))]
    #[case::default_on_empty_session(None, Some("Say hello"), false, Some("Say hello"))]
    #[case::default_skipped_on_busy_session(None, Some("Say hello"), true, None)]
    #[case::blank_query_ignored(Some("  "), None, false, None)]
    #[tokio::test]
    async fn test_initial_query(
        #[case] query: Option<&str>,
        #[case] default_query: Option<&str>,
        #[case] seeded: bool,
        #[case] expected: Option<&str>,
    ) {
        let backend = backend(MOCK_SESSION);
        let mut agent = AgentSpec::new("asst_1", MOCK_AGENT, MOCK_SESSION);
        agent.default_query = default_query.map(str::to_string);
        let mut session = SessionSpec::default();
        if seeded {
            session = session.with_message(SessionMessage::user("earlier question"));
        }
        let mut spec = AssignmentSpec::new(agent).with_session(session);
        spec.query = query.map(str::to_string);

        let assignment = Assignment::from_spec_with_registry(backend.registry.clone(), spec)
            .await
            .unwrap();

        let messages = session_messages(&assignment);
        let added = messages
            .iter()
            .skip(usize::from(seeded))
            .map(|m| m.text.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(added, expected.map(Some).into_iter().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unknown_agent_class_fails() {
        let backend = backend(MOCK_SESSION);
        let spec = AssignmentSpec::new(AgentSpec::new("asst_1", "OpenAiAssistant", MOCK_SESSION));

        let err = Assignment::from_spec_with_registry(backend.registry.clone(), spec)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown agent OpenAiAssistant"));
    }

    #[tokio::test]
    async fn test_invalid_spec_is_rejected_before_building() {
        let backend = backend(MOCK_SESSION);
        let spec = AssignmentSpec::new(AgentSpec::new("", MOCK_AGENT, MOCK_SESSION));

        let err = Assignment::from_spec_with_registry(backend.registry.clone(), spec)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
        assert!(backend.agents.built_specs().is_empty());
    }
}
