//! Value objects exchanged between assignments, backends and tool handlers.

pub mod message;
pub mod run;
pub mod spec;
pub mod tool;

pub use message::{
    AddFileResult, AddMessageResult, DeleteSessionResult, MessageRole, SessionFile,
    SessionMessage,
};
pub use run::{AssignmentRunResult, RunExit, RunOutput, RunResult, RunResultType};
pub use spec::{AgentSpec, AssignmentSpec, NATIVE_SESSION, SessionSpec, is_yaml_path};
pub use tool::{ToolCall, ToolCallResult, ToolKind, ToolSpec, Variable, VariableType};
