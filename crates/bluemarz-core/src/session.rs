//! Session contract.
//!
//! A session is the conversation state the backend holds for an agent.
//! Operations take `&self`: implementations keep their backend handle and
//! any cached flags behind interior mutability.

use async_trait::async_trait;
use std::any::Any;

use crate::error::{BluemarzError, BluemarzResult};
use crate::types::{
    AddFileResult, AddMessageResult, DeleteSessionResult, SessionFile, SessionMessage,
    SessionSpec, ToolCallResult,
};

/// A backend-held conversation.
#[async_trait]
pub trait Session: Send + Sync {
    /// Concrete type name; half of the executor registry key.
    fn type_name(&self) -> &str;

    /// The specification this session was built from, with its assigned id.
    fn spec(&self) -> &SessionSpec;

    /// Backend identity of the session.
    fn id(&self) -> &str;

    /// Whether the conversation has no messages yet.
    async fn is_empty(&self) -> bool;

    async fn add_message(&self, message: SessionMessage) -> BluemarzResult<AddMessageResult>;

    async fn add_file(&self, file: SessionFile) -> BluemarzResult<AddFileResult>;

    async fn delete_session(&self) -> BluemarzResult<DeleteSessionResult>;

    /// Record the result of an externally completed tool call in the conversation.
    async fn add_tool_call_result(
        &self,
        result: &ToolCallResult,
    ) -> BluemarzResult<AddMessageResult>;

    /// Access to the concrete type for executors.
    fn as_any(&self) -> &dyn Any;
}

/// Builds sessions of one backend type from their specification.
///
/// When the spec has no id the factory creates a new backend session and
/// writes the assigned id back into the spec it keeps.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn from_spec(&self, spec: SessionSpec) -> BluemarzResult<Box<dyn Session>>;
}

/// Downcast a session to the concrete type an executor expects.
pub fn downcast_session<T: Session + 'static>(session: &dyn Session) -> BluemarzResult<&T> {
    session.as_any().downcast_ref::<T>().ok_or_else(|| {
        BluemarzError::InvalidDefinition(format!(
            "Expected session of type {}, got {}",
            std::any::type_name::<T>(),
            session.type_name()
        ))
    })
}
