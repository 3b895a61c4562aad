//! Error types for assignments, registries and backend integrations.

use thiserror::Error;

/// Errors raised by a local tool handler.
///
/// A handler that wants to report a *tool-level* failure back to the backend
/// returns `Ok(ToolCallResult::error(..))` instead. A `ToolError` means the
/// handler itself could not produce a result, which aborts the whole sync
/// batch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The handler ran but failed unexpectedly.
    #[error("Tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },

    /// The call arguments could not be interpreted by the handler.
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The task running the handler panicked or was cancelled.
    #[error("Tool '{tool}' aborted: {reason}")]
    Aborted { tool: String, reason: String },
}

impl ToolError {
    /// Name of the tool the error refers to.
    pub fn tool(&self) -> &str {
        match self {
            ToolError::ExecutionFailed { tool, .. }
            | ToolError::InvalidArguments { tool, .. }
            | ToolError::Aborted { tool, .. } => tool,
        }
    }
}

/// Errors that can occur while defining, building or running assignments.
#[derive(Debug, Clone, Error)]
pub enum BluemarzError {
    /// A registry entry is missing, duplicated or malformed.
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// A model invariant was violated while constructing a value.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The executor rejected the agent/session pairing.
    #[error("Incompatible assignment: {0}")]
    Incompatible(String),

    /// A local tool handler failed unexpectedly.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The backend run reached a terminal failure status.
    #[error("Run {run_id} ended with status '{status}'")]
    RunFailed { run_id: String, status: String },

    /// Any other failure reported by a backend integration.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A stored specification was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Process-wide configuration is missing or unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl BluemarzError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BluemarzError::Backend(_))
    }

    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            BluemarzError::InvalidDefinition(_) => "INVALID_DEFINITION",
            BluemarzError::Validation(_) => "VALIDATION_FAILED",
            BluemarzError::Incompatible(_) => "INCOMPATIBLE_ASSIGNMENT",
            BluemarzError::Tool(_) => "TOOL_FAILED",
            BluemarzError::RunFailed { .. } => "RUN_FAILED",
            BluemarzError::Backend(_) => "BACKEND_ERROR",
            BluemarzError::NotFound(_) => "NOT_FOUND",
            BluemarzError::Configuration(_) => "CONFIGURATION_ERROR",
            BluemarzError::Serialization(_) => "SERIALIZATION_ERROR",
            BluemarzError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type for Bluemarz operations.
pub type BluemarzResult<T> = Result<T, BluemarzError>;

impl From<serde_json::Error> for BluemarzError {
    fn from(err: serde_json::Error) -> Self {
        BluemarzError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for BluemarzError {
    fn from(err: serde_yaml::Error) -> Self {
        BluemarzError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for BluemarzError {
    fn from(err: std::io::Error) -> Self {
        BluemarzError::Io(err.to_string())
    }
}
