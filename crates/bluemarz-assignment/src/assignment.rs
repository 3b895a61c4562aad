//! The assignment: one agent bound to one session through one executor.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use bluemarz_core::{
    AddFileResult, AddMessageResult, Agent, BluemarzError, BluemarzResult, Executor, Parameters,
    RunResult, Session, SessionFile, SessionMessage, ToolCallResult, ToolImplementation, ToolSpec,
    merge_parameters,
};
use bluemarz_registry::{CapabilityRegistry, ExecutorKey};

use crate::state::AssignmentState;

/// An agent working on a session.
///
/// The assignment owns its agent and session for its whole life and keeps
/// the run state between `run_until_breakpoint` calls, so a paused
/// assignment resumes the same backend run.
pub struct Assignment {
    pub(crate) agent: Box<dyn Agent>,
    pub(crate) session: Box<dyn Session>,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) registry: Arc<CapabilityRegistry>,
    pub(crate) run_id: Option<String>,
    pub(crate) parameters: Parameters,
    pub(crate) last_result: Option<RunResult>,
    pub(crate) last_tools_submitted: Vec<String>,
    pub(crate) state: AssignmentState,
}

impl Assignment {
    /// Bind `agent` to `session` using the process-wide registry.
    ///
    /// Resolves the executor for the pair and lets it validate the
    /// assignment; either failure is returned and no assignment is created.
    pub async fn new(
        agent: Box<dyn Agent>,
        session: Box<dyn Session>,
        run_id: Option<String>,
        parameters: Parameters,
    ) -> BluemarzResult<Self> {
        Self::with_registry(bluemarz_registry::global(), agent, session, run_id, parameters).await
    }

    /// Like [`Assignment::new`], resolving against an explicit registry.
    pub async fn with_registry(
        registry: Arc<CapabilityRegistry>,
        agent: Box<dyn Agent>,
        session: Box<dyn Session>,
        run_id: Option<String>,
        parameters: Parameters,
    ) -> BluemarzResult<Self> {
        let executor = registry.resolve_executor(agent.as_ref(), session.as_ref())?;
        executor
            .validate_assignment(
                agent.as_ref(),
                session.as_ref(),
                run_id.as_deref(),
                &parameters,
            )
            .await?;

        info!(
            agent = %agent.spec().id,
            session = %session.id(),
            executor = %ExecutorKey::for_pair(agent.as_ref(), session.as_ref()),
            run_id = ?run_id,
            "Assignment created"
        );

        Ok(Self {
            agent,
            session,
            executor,
            registry,
            run_id,
            parameters,
            last_result: None,
            last_tools_submitted: Vec::new(),
            state: AssignmentState::Created,
        })
    }

    pub fn agent(&self) -> &dyn Agent {
        self.agent.as_ref()
    }

    pub fn agent_mut(&mut self) -> &mut dyn Agent {
        self.agent.as_mut()
    }

    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    /// The backend run this assignment continues, once one has started.
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn last_result(&self) -> Option<&RunResult> {
        self.last_result.as_ref()
    }

    pub fn state(&self) -> AssignmentState {
        self.state
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Names of the tools whose results were handed over since the last run step.
    pub fn last_tools_submitted(&self) -> &[String] {
        &self.last_tools_submitted
    }

    /// Give up ownership of the agent and session.
    pub fn into_parts(self) -> (Box<dyn Agent>, Box<dyn Session>) {
        (self.agent, self.session)
    }

    /// Add a message to the session. Blank messages are rejected here.
    pub async fn add_message(&self, message: SessionMessage) -> BluemarzResult<AddMessageResult> {
        message.validate()?;
        self.session.add_message(message).await
    }

    pub async fn add_file(&self, file: SessionFile) -> BluemarzResult<AddFileResult> {
        self.session.add_file(file).await
    }

    /// Bind local implementations as tools of the agent.
    pub fn add_tools(&mut self, implementations: Vec<Arc<dyn ToolImplementation>>) {
        self.agent.add_tools(implementations);
    }

    /// Declare tools on the agent, cascading the assignment parameters into them.
    pub fn add_tools_from_spec(&mut self, specs: Vec<ToolSpec>) {
        let specs = specs
            .into_iter()
            .map(|mut spec| {
                spec.parameters = merge_parameters(&self.parameters, &spec.parameters);
                spec
            })
            .collect();
        self.agent.add_tools_from_spec(specs);
    }

    /// Hand a complete batch of tool outputs to the current run.
    ///
    /// Fails with [`BluemarzError::Validation`] before the first run step.
    pub async fn submit_tool_calls(&mut self, results: Vec<ToolCallResult>) -> BluemarzResult<()> {
        let run_id = self.run_id.as_deref().ok_or_else(|| {
            BluemarzError::Validation(
                "Cannot submit tool calls before a run has started".to_string(),
            )
        })?;
        self.executor
            .submit_tool_calls(
                self.agent.as_ref(),
                self.session.as_ref(),
                run_id,
                &results,
                &self.parameters,
            )
            .await?;

        debug!(run_id = %run_id, count = results.len(), "Submitted tool call results");
        self.record_submitted(&results);
        Ok(())
    }

    /// Record externally completed tool calls in the session.
    pub async fn add_tool_call_results(&mut self, results: Vec<ToolCallResult>) -> BluemarzResult<()> {
        for result in &results {
            self.session.add_tool_call_result(result).await?;
            self.last_tools_submitted
                .push(result.tool_call.name().to_string());
        }
        Ok(())
    }

    fn record_submitted(&mut self, results: &[ToolCallResult]) {
        self.last_tools_submitted
            .extend(results.iter().map(|result| result.tool_call.name().to_string()));
    }
}

impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assignment")
            .field("agent", &self.agent.spec().id)
            .field("session", &self.session.id())
            .field("run_id", &self.run_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
