//! Results of backend execution steps and of whole assignment runs.

use serde::{Deserialize, Serialize};

use super::message::SessionMessage;
use super::tool::ToolCall;
use crate::collections::NonEmptyVec;
use crate::error::{BluemarzError, BluemarzResult};

/// Discriminant of a [`RunResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunResultType {
    ToolCall,
    MessageResponse,
}

impl std::fmt::Display for RunResultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunResultType::ToolCall => write!(f, "toolCall"),
            RunResultType::MessageResponse => write!(f, "messageResponse"),
        }
    }
}

/// What a run step produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    /// The backend asks for these tools to be called.
    ToolCalls(NonEmptyVec<ToolCall>),
    /// The backend answered with these messages.
    Messages(NonEmptyVec<SessionMessage>),
}

/// Result of one execution step of a backend run.
///
/// A `toolCall` result always carries at least one tool call and a
/// `messageResponse` result at least one message. Both the constructors and
/// deserialization reject empty payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RunResultWire", into = "RunResultWire")]
pub struct RunResult {
    run_id: String,
    output: RunOutput,
}

impl RunResult {
    /// Validated constructor mirroring the wire representation.
    ///
    /// The list that does not match `result_type` is ignored.
    pub fn new(
        run_id: impl Into<String>,
        result_type: RunResultType,
        tool_calls: Option<Vec<ToolCall>>,
        messages: Option<Vec<SessionMessage>>,
    ) -> BluemarzResult<Self> {
        let run_id = run_id.into();
        match result_type {
            RunResultType::ToolCall => Self::tool_calls(run_id, tool_calls.unwrap_or_default()),
            RunResultType::MessageResponse => {
                Self::messages(run_id, messages.unwrap_or_default())
            }
        }
    }

    pub fn tool_calls(run_id: impl Into<String>, calls: Vec<ToolCall>) -> BluemarzResult<Self> {
        let run_id = run_id.into();
        let calls = NonEmptyVec::try_from(calls).map_err(|_| {
            BluemarzError::Validation(format!(
                "Run result {run_id} of type toolCall must have at least one tool call"
            ))
        })?;
        Ok(Self {
            run_id,
            output: RunOutput::ToolCalls(calls),
        })
    }

    pub fn messages(
        run_id: impl Into<String>,
        messages: Vec<SessionMessage>,
    ) -> BluemarzResult<Self> {
        let run_id = run_id.into();
        for message in &messages {
            message.validate()?;
        }
        let messages = NonEmptyVec::try_from(messages).map_err(|_| {
            BluemarzError::Validation(format!(
                "Run result {run_id} of type messageResponse must have at least one message"
            ))
        })?;
        Ok(Self {
            run_id,
            output: RunOutput::Messages(messages),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn result_type(&self) -> RunResultType {
        match self.output {
            RunOutput::ToolCalls(_) => RunResultType::ToolCall,
            RunOutput::Messages(_) => RunResultType::MessageResponse,
        }
    }

    pub fn output(&self) -> &RunOutput {
        &self.output
    }

    pub fn is_tool_call(&self) -> bool {
        matches!(self.output, RunOutput::ToolCalls(_))
    }

    pub fn pending_tool_calls(&self) -> Option<&NonEmptyVec<ToolCall>> {
        match &self.output {
            RunOutput::ToolCalls(calls) => Some(calls),
            RunOutput::Messages(_) => None,
        }
    }

    pub fn response_messages(&self) -> Option<&NonEmptyVec<SessionMessage>> {
        match &self.output {
            RunOutput::Messages(messages) => Some(messages),
            RunOutput::ToolCalls(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunResultWire {
    run_id: String,
    result_type: RunResultType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    messages: Option<Vec<SessionMessage>>,
}

impl TryFrom<RunResultWire> for RunResult {
    type Error = BluemarzError;

    fn try_from(wire: RunResultWire) -> Result<Self, Self::Error> {
        RunResult::new(wire.run_id, wire.result_type, wire.tool_calls, wire.messages)
    }
}

impl From<RunResult> for RunResultWire {
    fn from(result: RunResult) -> Self {
        let result_type = result.result_type();
        let (tool_calls, messages) = match result.output {
            RunOutput::ToolCalls(calls) => (Some(calls.into_vec()), None),
            RunOutput::Messages(messages) => (None, Some(messages.into_vec())),
        };
        RunResultWire {
            run_id: result.run_id,
            result_type,
            tool_calls,
            messages,
        }
    }
}

/// Which exit path ended a `run_until_breakpoint` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunExit {
    /// The backend answered with a final message.
    Completed,
    /// At least one pending tool call must be completed by an external actor.
    AwaitingExternalTool,
    /// A local tool batch failed; its calls stay pending on the backend.
    SyncToolFallback,
}

/// What a `run_until_breakpoint` call hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRunResult {
    pub session_id: String,
    pub last_run_result: RunResult,
    pub exit: RunExit,
}

impl AssignmentRunResult {
    /// Final messages, when the run completed with a message response.
    pub fn messages(&self) -> Option<&NonEmptyVec<SessionMessage>> {
        self.last_run_result.response_messages()
    }

    /// Tool calls still pending on the backend, if any.
    pub fn pending_tool_calls(&self) -> Option<&NonEmptyVec<ToolCall>> {
        self.last_run_result.pending_tool_calls()
    }
}
