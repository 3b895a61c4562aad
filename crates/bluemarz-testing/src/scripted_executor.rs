//! # Scripted Executor
//!
//! An [`Executor`] that replays a queue of canned run results and records
//! every call made to it, for driving assignments through exact scenarios.

use async_trait::async_trait;
use bluemarz_core::{
    Agent, BluemarzError, BluemarzResult, Executor, Parameters, RunResult, Session,
    ToolCallResult,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::mock_backend::{MOCK_AGENT, MOCK_SESSION};

/// One batch handed to [`Executor::submit_tool_calls`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub run_id: String,
    pub results: Vec<ToolCallResult>,
}

#[derive(Debug, Default)]
struct ExecutorLog {
    validations: usize,
    executed_run_ids: Vec<Option<String>>,
    submissions: Vec<Submission>,
    prepared_run_ids: Vec<String>,
    last_params: Option<Parameters>,
}

/// Executor replaying a script of run outcomes.
///
/// Clones share the script and the call log, so a test can keep one handle
/// while the registry holds another.
#[derive(Debug, Clone)]
pub struct ScriptedExecutor {
    agent_type: String,
    session_type: String,
    script: Arc<Mutex<VecDeque<BluemarzResult<RunResult>>>>,
    validation_failure: Option<String>,
    log: Arc<Mutex<ExecutorLog>>,
}

impl ScriptedExecutor {
    pub fn new(agent_type: impl Into<String>, session_type: impl Into<String>) -> Self {
        Self {
            agent_type: agent_type.into(),
            session_type: session_type.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            validation_failure: None,
            log: Arc::new(Mutex::new(ExecutorLog::default())),
        }
    }

    /// Executor for the [`MockAgent`](crate::MockAgent) / [`MockSession`](crate::MockSession) pair.
    pub fn for_mocks() -> Self {
        Self::new(MOCK_AGENT, MOCK_SESSION)
    }

    /// Queue the result of the next `execute`.
    pub fn then_respond(self, result: RunResult) -> Self {
        self.script.lock().unwrap().push_back(Ok(result));
        self
    }

    /// Queue a failure for the next `execute`.
    pub fn then_fail(self, error: BluemarzError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Reject every assignment at validation time.
    pub fn failing_validation(mut self, reason: impl Into<String>) -> Self {
        self.validation_failure = Some(reason.into());
        self
    }

    /// Queue a result after construction.
    pub fn push_result(&self, result: RunResult) {
        self.script.lock().unwrap().push_back(Ok(result));
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    pub fn validate_count(&self) -> usize {
        self.log.lock().unwrap().validations
    }

    pub fn execute_count(&self) -> usize {
        self.log.lock().unwrap().executed_run_ids.len()
    }

    /// The `run_id` argument of every `execute`, in call order.
    pub fn executed_run_ids(&self) -> Vec<Option<String>> {
        self.log.lock().unwrap().executed_run_ids.clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.log.lock().unwrap().submissions.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.log.lock().unwrap().submissions.len()
    }

    pub fn prepare_count(&self) -> usize {
        self.log.lock().unwrap().prepared_run_ids.len()
    }

    pub fn prepared_run_ids(&self) -> Vec<String> {
        self.log.lock().unwrap().prepared_run_ids.clone()
    }

    /// Parameters passed to the most recent call.
    pub fn last_params(&self) -> Option<Parameters> {
        self.log.lock().unwrap().last_params.clone()
    }

    fn record_params(&self, params: &Parameters) {
        self.log.lock().unwrap().last_params = Some(params.clone());
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    fn agent_type(&self) -> &str {
        &self.agent_type
    }

    fn session_type(&self) -> &str {
        &self.session_type
    }

    async fn validate_assignment(
        &self,
        agent: &dyn Agent,
        session: &dyn Session,
        _run_id: Option<&str>,
        params: &Parameters,
    ) -> BluemarzResult<()> {
        self.log.lock().unwrap().validations += 1;
        self.record_params(params);
        match &self.validation_failure {
            Some(reason) => Err(BluemarzError::Incompatible(format!(
                "{} cannot run on {}: {reason}",
                agent.spec().id,
                session.id()
            ))),
            None => Ok(()),
        }
    }

    async fn execute(
        &self,
        _agent: &dyn Agent,
        _session: &dyn Session,
        run_id: Option<&str>,
        params: &Parameters,
    ) -> BluemarzResult<RunResult> {
        {
            let mut log = self.log.lock().unwrap();
            log.executed_run_ids.push(run_id.map(str::to_string));
            log.last_params = Some(params.clone());
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BluemarzError::Backend("Run script exhausted".to_string())))
    }

    async fn submit_tool_calls(
        &self,
        _agent: &dyn Agent,
        _session: &dyn Session,
        run_id: &str,
        results: &[ToolCallResult],
        params: &Parameters,
    ) -> BluemarzResult<()> {
        let mut log = self.log.lock().unwrap();
        log.submissions.push(Submission {
            run_id: run_id.to_string(),
            results: results.to_vec(),
        });
        log.last_params = Some(params.clone());
        Ok(())
    }

    async fn prepare_for_async_tool_calls(
        &self,
        _agent: &dyn Agent,
        _session: &dyn Session,
        run_id: &str,
        params: &Parameters,
    ) -> BluemarzResult<()> {
        let mut log = self.log.lock().unwrap();
        log.prepared_run_ids.push(run_id.to_string());
        log.last_params = Some(params.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_backend::{MockAgent, MockSession};
    use bluemarz_core::SessionMessage;

    #[tokio::test]
    async fn test_replays_script_in_order() {
        let executor = ScriptedExecutor::for_mocks()
            .then_respond(RunResult::messages("run_1", vec![SessionMessage::agent("one")]).unwrap())
            .then_fail(BluemarzError::Backend("rate limited".to_string()));
        let handle = executor.clone();

        let agent = MockAgent::with_id("asst_1");
        let session = MockSession::with_id("thread_1");
        let params = Parameters::new();

        let first = executor.execute(&agent, &session, None, &params).await.unwrap();
        assert_eq!(first.run_id(), "run_1");
        let second = executor.execute(&agent, &session, Some("run_1"), &params).await;
        assert!(second.unwrap_err().is_retryable());
        assert!(executor.execute(&agent, &session, None, &params).await.is_err());

        assert_eq!(handle.execute_count(), 3);
        assert_eq!(
            handle.executed_run_ids(),
            vec![None, Some("run_1".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_validation_failure_is_incompatible() {
        let executor = ScriptedExecutor::for_mocks().failing_validation("different api keys");
        let err = executor
            .validate_assignment(
                &MockAgent::with_id("asst_1"),
                &MockSession::with_id("thread_1"),
                None,
                &Parameters::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "INCOMPATIBLE_ASSIGNMENT");
        assert!(err.to_string().contains("different api keys"));
        assert_eq!(executor.validate_count(), 1);
    }
}
