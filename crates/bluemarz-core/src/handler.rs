//! Local tool execution contracts.
//!
//! Two kinds of local executors exist:
//!
//! - a [`ToolImplementation`] is bound to one agent through its
//!   [`ToolDefinition`] and carries its own [`ToolSpec`];
//! - a [`ToolHandler`] is registered process-wide by tool name and serves any
//!   agent declaring a sync tool of that name.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::ToolError;
use crate::types::{ToolCall, ToolCallResult, ToolSpec};

/// A tool implementation bound to an agent.
#[async_trait]
pub trait ToolImplementation: Send + Sync {
    /// Specification the agent advertises for this tool.
    fn spec(&self) -> &ToolSpec;

    /// Execute one call.
    ///
    /// Return `Ok(ToolCallResult::error(..))` to report a tool-level failure
    /// to the backend; `Err` aborts the batch the call belongs to.
    async fn call(&self, call: &ToolCall) -> Result<ToolCallResult, ToolError>;
}

/// A local handler registered by tool name in the capability registry.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name of the tool this handler serves.
    fn tool_name(&self) -> &str;

    /// Execute one call. Error semantics match [`ToolImplementation::call`].
    async fn execute_call(&self, call: &ToolCall) -> Result<ToolCallResult, ToolError>;
}

/// A tool as known by an agent: its spec plus an optional bound implementation.
#[derive(Clone)]
pub struct ToolDefinition {
    spec: ToolSpec,
    implementation: Option<Arc<dyn ToolImplementation>>,
}

impl ToolDefinition {
    /// Definition without a bound implementation.
    pub fn from_spec(spec: ToolSpec) -> Self {
        Self {
            spec,
            implementation: None,
        }
    }

    /// Definition bound to `implementation`, advertising its spec.
    pub fn from_implementation(implementation: Arc<dyn ToolImplementation>) -> Self {
        Self {
            spec: implementation.spec().clone(),
            implementation: Some(implementation),
        }
    }

    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn implementation(&self) -> Option<&Arc<dyn ToolImplementation>> {
        self.implementation.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.implementation.is_some()
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("spec", &self.spec)
            .field("bound", &self.is_bound())
            .finish()
    }
}
