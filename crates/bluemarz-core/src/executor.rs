//! Executor contract: the backend protocol for one (agent type, session type) pair.

use async_trait::async_trait;

use crate::agent::Agent;
use crate::error::BluemarzResult;
use crate::parameters::Parameters;
use crate::session::Session;
use crate::types::{RunResult, ToolCallResult};

/// Backend protocol strategy.
///
/// Each executor declares the agent and session type names it serves. The
/// capability registry allows at most one executor per declared pair.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Type name of the agents this executor drives.
    fn agent_type(&self) -> &str;

    /// Type name of the sessions this executor drives.
    fn session_type(&self) -> &str;

    /// Check that the pairing can run, e.g. that both sides share credentials
    /// or that an existing `run_id` is resumable.
    async fn validate_assignment(
        &self,
        agent: &dyn Agent,
        session: &dyn Session,
        run_id: Option<&str>,
        params: &Parameters,
    ) -> BluemarzResult<()>;

    /// Run one step: start a new run, or resume `run_id`, and wait until the
    /// backend either answers or requests tool calls.
    ///
    /// A run that ends in a terminal failure status is reported as
    /// [`BluemarzError::RunFailed`](crate::BluemarzError::RunFailed).
    async fn execute(
        &self,
        agent: &dyn Agent,
        session: &dyn Session,
        run_id: Option<&str>,
        params: &Parameters,
    ) -> BluemarzResult<RunResult>;

    /// Hand a complete batch of tool outputs to the pending run.
    async fn submit_tool_calls(
        &self,
        agent: &dyn Agent,
        session: &dyn Session,
        run_id: &str,
        results: &[ToolCallResult],
        params: &Parameters,
    ) -> BluemarzResult<()>;

    /// Put the backend in a state where an external actor can complete the
    /// pending tool calls later, e.g. by cancelling the active run.
    async fn prepare_for_async_tool_calls(
        &self,
        agent: &dyn Agent,
        session: &dyn Session,
        run_id: &str,
        params: &Parameters,
    ) -> BluemarzResult<()>;
}
