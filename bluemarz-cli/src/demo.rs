//! Scripted end-to-end run against the in-memory mock backend.
//!
//! The backend first asks for the `add` tool, which is completed locally by a
//! registered handler, then answers with the sum.

use std::sync::Arc;

use bluemarz::testing::{ScriptedExecutor, add_numbers_handler, register_mock_backend};
use bluemarz::{
    AgentSpec, Assignment, AssignmentRunResult, AssignmentSpec, BluemarzResult,
    CapabilityRegistry, RunResult, SessionMessage, ToolCall, ToolSpec, Variable, VariableType,
};
use serde_json::json;

fn add_tool() -> ToolSpec {
    ToolSpec::sync("add", "Add two numbers")
        .with_variable("a", Variable::new(VariableType::Number, "First addend"))
        .with_variable("b", Variable::new(VariableType::Number, "Second addend"))
}

/// Run the scenario on a private registry and return the final outcome.
pub async fn run_demo(a: i64, b: i64) -> BluemarzResult<AssignmentRunResult> {
    let registry = Arc::new(CapabilityRegistry::new());
    let executor = ScriptedExecutor::for_mocks()
        .then_respond(RunResult::tool_calls(
            "run_demo",
            vec![
                ToolCall::for_tool("call_add", add_tool())
                    .with_argument("a", json!(a))
                    .with_argument("b", json!(b)),
            ],
        )?)
        .then_respond(RunResult::messages(
            "run_demo",
            vec![SessionMessage::agent(format!("The answer is {}", a + b))],
        )?);
    register_mock_backend(&registry, executor.clone())?;
    registry.register_local_tool(Arc::new(add_numbers_handler()))?;

    let spec = AssignmentSpec::new(
        AgentSpec::new("asst_demo", "MockAgent", "MockSession").with_tool(add_tool()),
    )
    .with_query(format!("What is {a} + {b}?"));

    let mut assignment = Assignment::from_spec_with_registry(registry, spec).await?;
    let outcome = assignment.run_until_breakpoint().await?;

    tracing::info!(
        executions = executor.execute_count(),
        submissions = executor.submission_count(),
        exit = ?outcome.exit,
        "Demo finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluemarz::RunExit;

    #[tokio::test]
    async fn test_demo_answers_with_sum() {
        let outcome = run_demo(2, 3).await.unwrap();

        assert_eq!(outcome.exit, RunExit::Completed);
        let answer = outcome.messages().unwrap().first().text.clone();
        assert_eq!(answer.as_deref(), Some("The answer is 5"));
    }
}
