//! Runtime capability registry.
//!
//! Backend integrations plug in by registering their executors, agent and
//! session factories, and local tool handlers under string keys. Assignments
//! resolve them at runtime, which keeps the run loop generic over backends.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use bluemarz_core::{
    Agent, AgentFactory, BluemarzError, BluemarzResult, Executor, Session, SessionFactory,
    ToolHandler,
};

/// Registry key of an executor: the agent and session type names it serves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutorKey {
    pub agent_type: String,
    pub session_type: String,
}

impl ExecutorKey {
    /// Build a key; surrounding whitespace in either type name is ignored.
    pub fn new(agent_type: impl AsRef<str>, session_type: impl AsRef<str>) -> Self {
        Self {
            agent_type: agent_type.as_ref().trim().to_string(),
            session_type: session_type.as_ref().trim().to_string(),
        }
    }

    /// Key of the executor declared by `executor`.
    ///
    /// Fails when either declared type name is blank.
    pub fn declared_by(executor: &dyn Executor) -> BluemarzResult<Self> {
        let key = Self::new(executor.agent_type(), executor.session_type());
        if key.agent_type.is_empty() || key.session_type.is_empty() {
            return Err(BluemarzError::InvalidDefinition(
                "Invalid Executor definition: it must declare both an agent type and a session type"
                    .to_string(),
            ));
        }
        Ok(key)
    }

    /// Key an agent/session pair resolves to.
    pub fn for_pair(agent: &dyn Agent, session: &dyn Session) -> Self {
        Self::new(agent.type_name(), session.type_name())
    }
}

impl fmt::Display for ExecutorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.agent_type, self.session_type)
    }
}

fn checked_name(kind: &str, name: String) -> BluemarzResult<String> {
    if name.trim().is_empty() {
        return Err(BluemarzError::InvalidDefinition(format!(
            "{kind} name cannot be empty"
        )));
    }
    Ok(name)
}

/// Lookup tables for everything an assignment resolves at runtime.
///
/// Each table is a concurrent map, so lookups from many assignments can run
/// alongside each other. Registration is expected to happen during start-up;
/// late registration is allowed but is not atomic across tables.
#[derive(Default)]
pub struct CapabilityRegistry {
    executors: DashMap<ExecutorKey, Arc<dyn Executor>>,
    agents: DashMap<String, Arc<dyn AgentFactory>>,
    sessions: DashMap<String, Arc<dyn SessionFactory>>,
    local_tools: DashMap<String, Arc<dyn ToolHandler>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under the (agent type, session type) pair it declares.
    ///
    /// Fails if the declaration is incomplete or the pair is already taken;
    /// the existing registration is left untouched.
    pub fn register_executor(&self, executor: Arc<dyn Executor>) -> BluemarzResult<ExecutorKey> {
        let key = ExecutorKey::declared_by(executor.as_ref())?;
        match self.executors.entry(key.clone()) {
            Entry::Occupied(_) => Err(BluemarzError::InvalidDefinition(format!(
                "Executor already defined for {} and {}",
                key.agent_type, key.session_type
            ))),
            Entry::Vacant(slot) => {
                slot.insert(executor);
                debug!(key = %key, "Registered executor");
                Ok(key)
            }
        }
    }

    /// Executor registered for the concrete types of `agent` and `session`.
    pub fn resolve_executor(
        &self,
        agent: &dyn Agent,
        session: &dyn Session,
    ) -> BluemarzResult<Arc<dyn Executor>> {
        let key = ExecutorKey::for_pair(agent, session);
        self.executors
            .get(&key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                BluemarzError::InvalidDefinition(format!(
                    "No executor defined for {} and {}",
                    key.agent_type, key.session_type
                ))
            })
    }

    pub fn has_executor(&self, key: &ExecutorKey) -> bool {
        self.executors.contains_key(key)
    }

    /// Register the factory building agents with spec type tag `name`.
    pub fn register_agent_class(
        &self,
        name: impl Into<String>,
        factory: Arc<dyn AgentFactory>,
    ) -> BluemarzResult<()> {
        let name = checked_name("Agent class", name.into())?;
        match self.agents.entry(name) {
            Entry::Occupied(entry) => Err(BluemarzError::InvalidDefinition(format!(
                "Agent class already defined: {}",
                entry.key()
            ))),
            Entry::Vacant(slot) => {
                debug!(agent_class = %slot.key(), "Registered agent class");
                slot.insert(factory);
                Ok(())
            }
        }
    }

    pub fn resolve_agent_class(&self, name: &str) -> BluemarzResult<Arc<dyn AgentFactory>> {
        self.agents
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BluemarzError::InvalidDefinition(format!("Unknown agent {name}")))
    }

    /// Register the factory building sessions with spec type tag `name`.
    pub fn register_session_class(
        &self,
        name: impl Into<String>,
        factory: Arc<dyn SessionFactory>,
    ) -> BluemarzResult<()> {
        let name = checked_name("Session class", name.into())?;
        match self.sessions.entry(name) {
            Entry::Occupied(entry) => Err(BluemarzError::InvalidDefinition(format!(
                "Session class already defined: {}",
                entry.key()
            ))),
            Entry::Vacant(slot) => {
                debug!(session_class = %slot.key(), "Registered session class");
                slot.insert(factory);
                Ok(())
            }
        }
    }

    pub fn resolve_session_class(&self, name: &str) -> BluemarzResult<Arc<dyn SessionFactory>> {
        self.sessions
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BluemarzError::InvalidDefinition(format!("Unknown session {name}")))
    }

    /// Register a local handler under the tool name it reports.
    pub fn register_local_tool(&self, handler: Arc<dyn ToolHandler>) -> BluemarzResult<()> {
        let name = checked_name("Local tool", handler.tool_name().to_string())?;
        match self.local_tools.entry(name) {
            Entry::Occupied(entry) => Err(BluemarzError::InvalidDefinition(format!(
                "Local tool already defined: {}",
                entry.key()
            ))),
            Entry::Vacant(slot) => {
                debug!(tool = %slot.key(), "Registered local tool");
                slot.insert(handler);
                Ok(())
            }
        }
    }

    pub fn resolve_local_tool(&self, name: &str) -> BluemarzResult<Arc<dyn ToolHandler>> {
        self.local_tools
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BluemarzError::InvalidDefinition(format!("Unknown tool {name}")))
    }

    pub fn has_local_tool(&self, name: &str) -> bool {
        self.local_tools.contains_key(name)
    }

    /// Registered executor keys, sorted.
    pub fn executor_keys(&self) -> Vec<ExecutorKey> {
        let mut keys: Vec<_> = self.executors.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Registered agent class names, sorted.
    pub fn agent_classes(&self) -> Vec<String> {
        sorted_keys(&self.agents)
    }

    /// Registered session class names, sorted.
    pub fn session_classes(&self) -> Vec<String> {
        sorted_keys(&self.sessions)
    }

    /// Registered local tool names, sorted.
    pub fn local_tools(&self) -> Vec<String> {
        sorted_keys(&self.local_tools)
    }

    /// Remove every registration.
    pub fn clear(&self) {
        self.executors.clear();
        self.agents.clear();
        self.sessions.clear();
        self.local_tools.clear();
    }
}

fn sorted_keys<V>(map: &DashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<_> = map.iter().map(|e| e.key().clone()).collect();
    keys.sort();
    keys
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("executors", &self.executor_keys())
            .field("agents", &self.agent_classes())
            .field("sessions", &self.session_classes())
            .field("local_tools", &self.local_tools())
            .finish()
    }
}
