//! The run loop: execute, classify, complete sync tools locally, repeat.

use tracing::{debug, info, warn};

use bluemarz_core::{AssignmentRunResult, BluemarzResult, RunExit, RunOutput, RunResult};

use crate::assignment::Assignment;
use crate::dispatch::{dispatch_sync_batch, plan_sync_batch};
use crate::state::AssignmentState;

impl Assignment {
    /// Run a single backend step and adopt its run id.
    ///
    /// Clears the record of submitted tools; the result is also kept as
    /// [`Assignment::last_result`].
    pub async fn run_once(&mut self) -> BluemarzResult<RunResult> {
        self.last_tools_submitted.clear();
        let result = self
            .executor
            .execute(
                self.agent.as_ref(),
                self.session.as_ref(),
                self.run_id.as_deref(),
                &self.parameters,
            )
            .await?;

        info!(
            run_id = %result.run_id(),
            result_type = %result.result_type(),
            "Run step finished"
        );
        self.run_id = Some(result.run_id().to_string());
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// Drive the backend until it answers or needs an external tool result.
    ///
    /// Tool call batches whose calls can all be completed locally are run
    /// concurrently and submitted, and the run continues. A batch with any
    /// other call pauses the assignment after preparing the backend for
    /// asynchronous completion. If a local batch fails, nothing is submitted
    /// and the pending calls are left on the backend.
    pub async fn run_until_breakpoint(&mut self) -> BluemarzResult<AssignmentRunResult> {
        self.last_tools_submitted.clear();
        self.state = AssignmentState::Running;

        let outcome = self.drive().await;
        self.state = match &outcome {
            Ok((_, RunExit::AwaitingExternalTool)) => AssignmentState::AwaitingExternalTool,
            _ => AssignmentState::Completed,
        };
        let (last_run_result, exit) = outcome?;

        info!(
            session = %self.session.id(),
            run_id = %last_run_result.run_id(),
            exit = ?exit,
            "Assignment reached a breakpoint"
        );
        Ok(AssignmentRunResult {
            session_id: self.session.id().to_string(),
            last_run_result,
            exit,
        })
    }

    async fn drive(&mut self) -> BluemarzResult<(RunResult, RunExit)> {
        loop {
            let result = self.run_once().await?;
            let calls = match result.output() {
                RunOutput::Messages(_) => return Ok((result, RunExit::Completed)),
                RunOutput::ToolCalls(calls) => calls,
            };

            let Some(jobs) = plan_sync_batch(self.agent.as_ref(), &self.registry, calls) else {
                debug!(run_id = %result.run_id(), calls = calls.len(), "Pausing for external tool calls");
                self.executor
                    .prepare_for_async_tool_calls(
                        self.agent.as_ref(),
                        self.session.as_ref(),
                        result.run_id(),
                        &self.parameters,
                    )
                    .await?;
                return Ok((result, RunExit::AwaitingExternalTool));
            };

            debug!(run_id = %result.run_id(), calls = jobs.len(), "Completing tool calls locally");
            match dispatch_sync_batch(jobs).await {
                Ok(results) => self.submit_tool_calls(results).await?,
                Err(error) => {
                    warn!(
                        run_id = %result.run_id(),
                        tool = %error.tool(),
                        error = %error,
                        "Local tool batch failed, leaving its calls pending"
                    );
                    return Ok((result, RunExit::SyncToolFallback));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Assignment, AssignmentState};
    use bluemarz_core::{
        AgentSpec, BluemarzError, Parameters, RunExit, RunResult, SessionMessage, ToolCall, ToolImplementation,
        ToolSpec,
    };
    use bluemarz_registry::CapabilityRegistry;
    use bluemarz_testing::{
        FailingToolHandler, MOCK_AGENT, MOCK_SESSION, MockAgent, MockSession, ScriptedExecutor, StaticToolImplementation,
        add_numbers_handler, register_mock_backend,
    };
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn add_call(id: &str, a: i64, b: i64) -> ToolCall {
        ToolCall::for_tool(id, ToolSpec::sync("add", "Add two numbers"))
            .with_argument("a", json!(a))
            .with_argument("b", json!(b))
    }

    fn answer(run_id: &str, text: &str) -> RunResult {
        RunResult::messages(run_id, vec![SessionMessage::agent(text)]).unwrap()
    }

    async fn setup(executor: ScriptedExecutor) -> (Assignment, Arc<CapabilityRegistry>) {
        let registry = Arc::new(CapabilityRegistry::new());
        register_mock_backend(&registry, executor).unwrap();
        let assignment = Assignment::with_registry(
            registry.clone(),
            Box::new(MockAgent::with_id("asst_1")),
            Box::new(MockSession::with_id("thread_1")),
            None,
            Parameters::new(),
        )
        .await
        .unwrap();
        (assignment, registry)
    }

    #[tokio::test]
    async fn test_message_response_completes_immediately() {
        let executor = ScriptedExecutor::for_mocks().then_respond(answer("run_1", "Hi there"));
        let (mut assignment, _) = setup(executor.clone()).await;

        let outcome = assignment.run_until_breakpoint().await.unwrap();

        assert_eq!(outcome.exit, RunExit::Completed);
        assert_eq!(outcome.session_id, "thread_1");
        assert_eq!(outcome.messages().unwrap().first().text.as_deref(), Some("Hi there"));
        assert_eq!(assignment.state(), AssignmentState::Completed);
        assert_eq!(assignment.run_id(), Some("run_1"));
        assert_eq!(executor.execute_count(), 1);
    }

    #[tokio::test]
    async fn test_sync_batch_is_submitted_and_run_continues() {
        let calls = vec![add_call("c1", 2, 3), add_call("c2", 10, 1)];
        let executor = ScriptedExecutor::for_mocks()
            .then_respond(RunResult::tool_calls("run_1", calls.clone()).unwrap())
            .then_respond(answer("run_2", "Both sums are done"));
        let (mut assignment, registry) = setup(executor.clone()).await;
        registry.register_local_tool(Arc::new(add_numbers_handler())).unwrap();

        let outcome = assignment.run_until_breakpoint().await.unwrap();

        assert_eq!(outcome.exit, RunExit::Completed);
        assert_eq!(outcome.last_run_result.run_id(), "run_2");
        assert_eq!(executor.executed_run_ids(), vec![None, Some("run_1".to_string())]);

        let submissions = executor.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].run_id, "run_1");
        let submitted: HashSet<_> = submissions[0]
            .results
            .iter()
            .map(|r| (r.tool_call.id.clone(), r.text.clone().unwrap()))
            .collect();
        let expected: HashSet<_> = [
            ("c1".to_string(), "5".to_string()),
            ("c2".to_string(), "11".to_string()),
        ]
        .into();
        assert_eq!(submitted, expected);
        assert_eq!(executor.prepare_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_handler_falls_back_without_submitting() {
        let calls = vec![
            add_call("c1", 1, 1),
            ToolCall::for_tool("c2", ToolSpec::sync("flaky", "Sometimes fails")),
        ];
        let executor = ScriptedExecutor::for_mocks()
            .then_respond(RunResult::tool_calls("run_1", calls).unwrap());
        let (mut assignment, registry) = setup(executor.clone()).await;
        let flaky = Arc::new(FailingToolHandler::new("flaky", "upstream timeout"));
        registry.register_local_tool(Arc::new(add_numbers_handler())).unwrap();
        registry.register_local_tool(flaky.clone()).unwrap();

        let outcome = assignment.run_until_breakpoint().await.unwrap();

        assert_eq!(outcome.exit, RunExit::SyncToolFallback);
        assert!(outcome.last_run_result.is_tool_call());
        assert_eq!(outcome.pending_tool_calls().unwrap().len(), 2);
        assert_eq!(flaky.call_count(), 1);
        assert_eq!(executor.submission_count(), 0);
        assert_eq!(executor.prepare_count(), 0);
        assert_eq!(executor.execute_count(), 1);
        assert_eq!(assignment.state(), AssignmentState::Completed);
    }

    #[tokio::test]
    async fn test_mixed_batch_pauses_for_external_tools() {
        let calls = vec![
            add_call("c1", 1, 1),
            ToolCall::for_tool("c2", ToolSpec::deferred("approve", "Ask a human")),
        ];
        let executor = ScriptedExecutor::for_mocks()
            .then_respond(RunResult::tool_calls("run_1", calls).unwrap());
        let (mut assignment, registry) = setup(executor.clone()).await;
        let add = Arc::new(add_numbers_handler());
        registry.register_local_tool(add.clone()).unwrap();

        let outcome = assignment.run_until_breakpoint().await.unwrap();

        assert_eq!(outcome.exit, RunExit::AwaitingExternalTool);
        assert_eq!(executor.prepared_run_ids(), vec!["run_1".to_string()]);
        assert_eq!(executor.submission_count(), 0);
        assert_eq!(add.call_count(), 0);
        assert_eq!(assignment.state(), AssignmentState::AwaitingExternalTool);
    }

    #[tokio::test]
    async fn test_unresolvable_tool_takes_async_path() {
        let executor = ScriptedExecutor::for_mocks()
            .then_respond(RunResult::tool_calls("run_1", vec![ToolCall::new("c1", "mystery")]).unwrap());
        let (mut assignment, _) = setup(executor.clone()).await;

        let outcome = assignment.run_until_breakpoint().await.unwrap();

        assert_eq!(outcome.exit, RunExit::AwaitingExternalTool);
        assert_eq!(executor.prepare_count(), 1);
    }

    #[tokio::test]
    async fn test_resume_after_external_completion() {
        let executor = ScriptedExecutor::for_mocks()
            .then_respond(
                RunResult::tool_calls(
                    "run_1",
                    vec![ToolCall::for_tool("c1", ToolSpec::deferred("approve", "Ask a human"))],
                )
                .unwrap(),
            )
            .then_respond(answer("run_1", "Approved, proceeding"));
        let (mut assignment, _) = setup(executor.clone()).await;

        let paused = assignment.run_until_breakpoint().await.unwrap();
        let pending = paused.pending_tool_calls().unwrap().first().clone();
        assignment
            .submit_tool_calls(vec![bluemarz_core::ToolCallResult::text(pending, "yes")])
            .await
            .unwrap();
        assert_eq!(assignment.last_tools_submitted(), ["approve".to_string()]);

        let resumed = assignment.run_until_breakpoint().await.unwrap();
        assert_eq!(resumed.exit, RunExit::Completed);
        assert_eq!(executor.executed_run_ids()[1].as_deref(), Some("run_1"));
        assert!(assignment.last_tools_submitted().is_empty());
    }

    #[tokio::test]
    async fn test_bound_tools_complete_locally() {
        let executor = ScriptedExecutor::for_mocks()
            .then_respond(RunResult::tool_calls("run_1", vec![ToolCall::new("c1", "now")]).unwrap())
            .then_respond(answer("run_2", "It is noon"));
        let (mut assignment, _) = setup(executor.clone()).await;
        let now: Arc<dyn ToolImplementation> = Arc::new(StaticToolImplementation::new(
            ToolSpec::sync("now", "Current time"),
            "noon",
        ));
        assignment.add_tools(vec![now]);

        let outcome = assignment.run_until_breakpoint().await.unwrap();

        assert_eq!(outcome.exit, RunExit::Completed);
        assert_eq!(executor.submissions()[0].results[0].text.as_deref(), Some("noon"));
    }

    #[tokio::test]
    async fn test_binding_a_declared_tool_completes_locally() {
        let executor = ScriptedExecutor::for_mocks()
            .then_respond(RunResult::tool_calls("run_1", vec![ToolCall::new("c1", "now")]).unwrap())
            .then_respond(answer("run_2", "It is noon"));
        let registry = Arc::new(CapabilityRegistry::new());
        register_mock_backend(&registry, executor.clone()).unwrap();
        let spec = AgentSpec::new("asst_1", MOCK_AGENT, MOCK_SESSION)
            .with_tool(ToolSpec::sync("now", "Current time"));
        let mut assignment = Assignment::with_registry(
            registry,
            Box::new(MockAgent::new(spec)),
            Box::new(MockSession::with_id("thread_1")),
            None,
            Parameters::new(),
        )
        .await
        .unwrap();

        let now: Arc<dyn ToolImplementation> = Arc::new(StaticToolImplementation::new(
            ToolSpec::sync("now", "Current time"),
            "noon",
        ));
        assignment.add_tools(vec![now]);

        let outcome = assignment.run_until_breakpoint().await.unwrap();

        assert_eq!(outcome.exit, RunExit::Completed);
        assert_eq!(executor.submission_count(), 1);
        assert_eq!(executor.prepare_count(), 0);
        assert_eq!(executor.submissions()[0].results[0].text.as_deref(), Some("noon"));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let executor = ScriptedExecutor::for_mocks().then_fail(BluemarzError::RunFailed {
            run_id: "run_1".to_string(),
            status: "failed".to_string(),
        });
        let (mut assignment, _) = setup(executor).await;

        let err = assignment.run_until_breakpoint().await.unwrap_err();
        assert_eq!(err.error_code(), "RUN_FAILED");
        assert_eq!(assignment.state(), AssignmentState::Completed);
        assert!(assignment.last_result().is_none());
    }
}
