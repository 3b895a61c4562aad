//! # Bluemarz Core
//!
//! Core traits and types for the Bluemarz assignment runtime.
//!
//! An *assignment* binds an [`Agent`] to a [`Session`] and drives backend runs
//! through the [`Executor`] registered for that pair. This crate defines those
//! contracts, the value objects that flow between them, the error taxonomy and
//! parameter templating. Registries live in `bluemarz-registry`, the run loop
//! in `bluemarz-assignment`.

pub mod agent;
pub mod collections;
pub mod error;
pub mod executor;
pub mod handler;
pub mod parameters;
pub mod session;
pub mod types;

pub use agent::{Agent, AgentFactory, downcast_agent};
pub use collections::NonEmptyVec;
pub use error::{BluemarzError, BluemarzResult, ToolError};
pub use executor::Executor;
pub use handler::{ToolDefinition, ToolHandler, ToolImplementation};
pub use parameters::{Parameters, merge_parameters};
pub use session::{Session, SessionFactory, downcast_session};
pub use types::{
    AddFileResult, AddMessageResult, AgentSpec, AssignmentRunResult, AssignmentSpec,
    DeleteSessionResult, MessageRole, RunExit, RunOutput, RunResult, RunResultType,
    SessionFile, SessionMessage, SessionSpec, ToolCall, ToolCallResult, ToolKind, ToolSpec,
    Variable, VariableType,
};
