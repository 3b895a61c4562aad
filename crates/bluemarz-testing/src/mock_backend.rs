//! # Mock Backend
//!
//! In-memory agent and session types standing in for a real conversational
//! backend. Sessions record everything added to them so tests can assert on
//! the conversation afterwards.

use async_trait::async_trait;
use bluemarz_core::{
    AddFileResult, AddMessageResult, Agent, AgentFactory, AgentSpec, BluemarzResult,
    DeleteSessionResult, Session, SessionFactory, SessionFile, SessionMessage, SessionSpec,
    ToolCallResult, ToolDefinition,
};
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Type name reported by [`MockAgent`].
pub const MOCK_AGENT: &str = "MockAgent";

/// Default type name reported by [`MockSession`].
pub const MOCK_SESSION: &str = "MockSession";

/// An agent that only keeps its spec and tool definitions.
#[derive(Debug, Clone)]
pub struct MockAgent {
    spec: AgentSpec,
    tools: Vec<ToolDefinition>,
}

impl MockAgent {
    /// Build from a spec, declaring the spec's tools without implementations.
    pub fn new(spec: AgentSpec) -> Self {
        let tools = spec
            .tools
            .iter()
            .cloned()
            .map(ToolDefinition::from_spec)
            .collect();
        Self { spec, tools }
    }

    /// Agent with the given id that pairs with [`MockSession`].
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::new(AgentSpec::new(id, MOCK_AGENT, MOCK_SESSION))
    }
}

impl Agent for MockAgent {
    fn type_name(&self) -> &str {
        MOCK_AGENT
    }

    fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    fn attach_tools(&mut self, tools: Vec<ToolDefinition>) {
        self.tools.extend(tools);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A session that records messages, files and tool call results in memory.
#[derive(Debug, Clone)]
pub struct MockSession {
    type_name: String,
    spec: SessionSpec,
    messages: Arc<Mutex<Vec<SessionMessage>>>,
    files: Arc<Mutex<Vec<SessionFile>>>,
    tool_call_results: Arc<Mutex<Vec<ToolCallResult>>>,
    deleted: Arc<AtomicBool>,
}

impl MockSession {
    /// Build from a spec.
    ///
    /// A spec without id gets a fresh one; the spec's messages and files seed
    /// the conversation. The type name is the spec's type, or [`MOCK_SESSION`].
    pub fn new(mut spec: SessionSpec) -> Self {
        if spec.is_new() {
            spec.assign_id(format!("session_{}", uuid::Uuid::new_v4().simple()));
        }
        let type_name = spec
            .session_type
            .clone()
            .unwrap_or_else(|| MOCK_SESSION.to_string());
        Self {
            type_name,
            messages: Arc::new(Mutex::new(spec.messages.clone())),
            files: Arc::new(Mutex::new(spec.files.clone())),
            tool_call_results: Arc::new(Mutex::new(Vec::new())),
            deleted: Arc::new(AtomicBool::new(false)),
            spec,
        }
    }

    /// Session with the given id and the default type name.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::new(SessionSpec::existing(id))
    }

    /// Messages in the order they were added.
    pub fn messages(&self) -> Vec<SessionMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn files(&self) -> Vec<SessionFile> {
        self.files.lock().unwrap().clone()
    }

    pub fn tool_call_results(&self) -> Vec<ToolCallResult> {
        self.tool_call_results.lock().unwrap().clone()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for MockSession {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn spec(&self) -> &SessionSpec {
        &self.spec
    }

    fn id(&self) -> &str {
        self.spec.id.as_deref().unwrap_or_default()
    }

    async fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }

    async fn add_message(&self, message: SessionMessage) -> BluemarzResult<AddMessageResult> {
        message.validate()?;
        self.messages.lock().unwrap().push(message);
        Ok(AddMessageResult::ok())
    }

    async fn add_file(&self, file: SessionFile) -> BluemarzResult<AddFileResult> {
        let file_id = file
            .id
            .clone()
            .unwrap_or_else(|| format!("file_{}", uuid::Uuid::new_v4().simple()));
        let mut files = self.files.lock().unwrap();
        files.push(SessionFile {
            id: Some(file_id.clone()),
            ..file
        });
        Ok(AddFileResult::uploaded(file_id))
    }

    async fn delete_session(&self) -> BluemarzResult<DeleteSessionResult> {
        self.deleted.store(true, Ordering::SeqCst);
        Ok(DeleteSessionResult { ok: true })
    }

    async fn add_tool_call_result(
        &self,
        result: &ToolCallResult,
    ) -> BluemarzResult<AddMessageResult> {
        self.tool_call_results.lock().unwrap().push(result.clone());
        Ok(AddMessageResult::ok())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds [`MockAgent`]s and remembers the specs it was given.
#[derive(Debug, Clone, Default)]
pub struct MockAgentFactory {
    built: Arc<Mutex<Vec<AgentSpec>>>,
}

impl MockAgentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Specs passed to `from_spec`, oldest first.
    pub fn built_specs(&self) -> Vec<AgentSpec> {
        self.built.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentFactory for MockAgentFactory {
    async fn from_spec(&self, spec: AgentSpec) -> BluemarzResult<Box<dyn Agent>> {
        spec.validate()?;
        let mut spec = spec;
        if let Some(api_key) = spec.api_key.take() {
            spec.api_key = Some(bluemarz_registry::apply_api_key_middleware(&api_key));
        }
        self.built.lock().unwrap().push(spec.clone());
        Ok(Box::new(MockAgent::new(spec)))
    }
}

/// Builds [`MockSession`]s and remembers the specs it was given.
#[derive(Debug, Clone, Default)]
pub struct MockSessionFactory {
    built: Arc<Mutex<Vec<SessionSpec>>>,
}

impl MockSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn built_specs(&self) -> Vec<SessionSpec> {
        self.built.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn from_spec(&self, spec: SessionSpec) -> BluemarzResult<Box<dyn Session>> {
        spec.validate()?;
        self.built.lock().unwrap().push(spec.clone());
        Ok(Box::new(MockSession::new(spec)))
    }
}
