//! Agent contract.
//!
//! An agent is a backend-hosted assistant with a set of tools. Concrete
//! backends implement [`Agent`] for their own type and register an
//! [`AgentFactory`] under the type tag used in [`AgentSpec::agent_type`].

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

use crate::error::{BluemarzError, BluemarzResult};
use crate::handler::{ToolDefinition, ToolImplementation};
use crate::types::{AgentSpec, ToolSpec};

/// A backend-hosted assistant.
pub trait Agent: Send + Sync {
    /// Concrete type name; half of the executor registry key.
    fn type_name(&self) -> &str;

    /// The specification this agent was built from.
    fn spec(&self) -> &AgentSpec;

    /// Tools known to this agent, in declaration order.
    fn tools(&self) -> &[ToolDefinition];

    /// Append tool definitions, converting them to the backend's representation.
    fn attach_tools(&mut self, tools: Vec<ToolDefinition>);

    /// Access to the concrete type for executors.
    fn as_any(&self) -> &dyn Any;

    /// Bind local implementations as tools of this agent.
    fn add_tools(&mut self, implementations: Vec<Arc<dyn ToolImplementation>>) {
        self.attach_tools(
            implementations
                .into_iter()
                .map(ToolDefinition::from_implementation)
                .collect(),
        );
    }

    /// Declare tools from specs, without local implementations.
    fn add_tools_from_spec(&mut self, specs: Vec<ToolSpec>) {
        self.attach_tools(specs.into_iter().map(ToolDefinition::from_spec).collect());
    }

    /// The tool definition with the given name.
    ///
    /// When a name was attached more than once the latest definition wins, so
    /// binding an implementation for a tool the spec already declares takes
    /// effect.
    fn tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools().iter().rev().find(|tool| tool.name() == name)
    }
}

/// Builds agents of one backend type from their specification.
#[async_trait]
pub trait AgentFactory: Send + Sync {
    async fn from_spec(&self, spec: AgentSpec) -> BluemarzResult<Box<dyn Agent>>;
}

/// Downcast an agent to the concrete type an executor expects.
pub fn downcast_agent<T: Agent + 'static>(agent: &dyn Agent) -> BluemarzResult<&T> {
    agent.as_any().downcast_ref::<T>().ok_or_else(|| {
        BluemarzError::InvalidDefinition(format!(
            "Expected agent of type {}, got {}",
            std::any::type_name::<T>(),
            agent.type_name()
        ))
    })
}
