//! # Bluemarz
//!
//! Bluemarz runs *assignments*: an agent hosted by a conversational AI
//! backend working on one session of that backend. Backend integrations plug
//! in through a capability registry; the assignment loop drives backend runs
//! and completes tool calls that have a local handler without a round trip
//! through the caller.
//!
//! ## Core Components
//!
//! - **[Agent], [Session]**: backend objects built from [AgentSpec] / [SessionSpec]
//! - **[Executor]**: the backend protocol for one (agent type, session type) pair
//! - **[CapabilityRegistry]**: executors, agent/session factories and local tool handlers
//! - **[Assignment]**: the run loop, pausing at breakpoints
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bluemarz::{Assignment, AssignmentSpec, RunExit};
//!
//! // Integrations register their classes and executors once at start-up:
//! // bluemarz::register_agent_class("OpenAiAssistant", Arc::new(MyAgentFactory))?;
//!
//! let spec = AssignmentSpec::load_from_file("assignment.yaml")?;
//! let mut assignment = Assignment::from_spec(spec).await?;
//! let outcome = assignment.run_until_breakpoint().await?;
//! if outcome.exit == RunExit::Completed {
//!     println!("{:?}", outcome.messages());
//! }
//! ```

// ============================================================================
// Module aliases for namespaced access
// ============================================================================

pub use bluemarz_assignment as assignment;
pub use bluemarz_core as core;
pub use bluemarz_registry as registry;

#[cfg(feature = "testing")]
pub use bluemarz_testing as testing;

// ============================================================================
// Contracts
// ============================================================================

pub use bluemarz_core::{
    Agent, AgentFactory, Executor, Session, SessionFactory, ToolDefinition, ToolHandler,
    ToolImplementation, downcast_agent, downcast_session,
};

// ============================================================================
// Model
// ============================================================================

pub use bluemarz_core::{
    AddFileResult, AddMessageResult, AgentSpec, AssignmentRunResult, AssignmentSpec,
    DeleteSessionResult, MessageRole, RunExit, RunOutput, RunResult, RunResultType, SessionFile,
    SessionMessage, SessionSpec, ToolCall, ToolCallResult, ToolKind, ToolSpec, Variable,
    VariableType,
};

pub use bluemarz_core::{NonEmptyVec, Parameters, merge_parameters};

// Error types
pub use bluemarz_core::{BluemarzError, BluemarzResult, ToolError};

// ============================================================================
// Registry
// ============================================================================

pub use bluemarz_registry::{
    ApiKeyMiddleware, CapabilityRegistry, ExecutorKey, InMemorySpecStore, SpecStore,
    StaticSpecStore, apply_api_key_middleware, assignment_spec_by_id, register_agent_class,
    register_api_key_middleware, register_executor, register_local_tool, register_session_class,
    save_assignment_spec, set_assignment_store,
};

// ============================================================================
// Orchestration
// ============================================================================

pub use bluemarz_assignment::{Assignment, AssignmentState};
