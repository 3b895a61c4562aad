//! # Bluemarz Testing
//!
//! Test doubles for the assignment runtime:
//!
//! - [`ScriptedExecutor`] replays canned run results and records submissions
//! - [`MockAgent`] / [`MockSession`] and their factories stand in for a backend
//! - [`FnToolHandler`], [`FailingToolHandler`] and [`StaticToolImplementation`]
//!   are local tools with call tracking
//!
//! ## Example
//!
//! ```rust
//! use bluemarz_registry::CapabilityRegistry;
//! use bluemarz_testing::{ScriptedExecutor, register_mock_backend};
//!
//! let registry = CapabilityRegistry::new();
//! let executor = ScriptedExecutor::for_mocks();
//! register_mock_backend(&registry, executor.clone()).unwrap();
//! assert_eq!(registry.agent_classes(), vec!["MockAgent"]);
//! ```

pub mod mock_backend;
pub mod scripted_executor;
pub mod tool_handlers;

pub use mock_backend::{
    MOCK_AGENT, MOCK_SESSION, MockAgent, MockAgentFactory, MockSession, MockSessionFactory,
};
pub use scripted_executor::{ScriptedExecutor, Submission};
pub use tool_handlers::{
    FailingToolHandler, FnToolHandler, StaticToolImplementation, add_numbers_handler,
};

use bluemarz_core::BluemarzResult;
use bluemarz_registry::CapabilityRegistry;
use std::sync::Arc;

/// Register the mock agent and session classes plus `executor` in `registry`.
pub fn register_mock_backend(
    registry: &CapabilityRegistry,
    executor: ScriptedExecutor,
) -> BluemarzResult<()> {
    registry.register_agent_class(MOCK_AGENT, Arc::new(MockAgentFactory::new()))?;
    registry.register_session_class(MOCK_SESSION, Arc::new(MockSessionFactory::new()))?;
    registry.register_executor(Arc::new(executor))?;
    Ok(())
}
