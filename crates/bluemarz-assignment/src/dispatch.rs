//! Local execution of sync tool batches.
//!
//! A batch runs locally only when every call in it can: the resolved spec is
//! a sync tool, and either the agent carries a bound implementation or the
//! registry has a handler for that tool name. Each call then runs on its own
//! task and the batch completes when all of them have.

use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

use bluemarz_core::{
    Agent, NonEmptyVec, ToolCall, ToolCallResult, ToolDefinition, ToolError, ToolHandler,
    ToolImplementation, ToolSpec,
};
use bluemarz_registry::CapabilityRegistry;

/// The local executor chosen for one call.
#[derive(Clone)]
pub(crate) enum LocalExecutor {
    Bound(Arc<dyn ToolImplementation>),
    Registered(Arc<dyn ToolHandler>),
}

impl LocalExecutor {
    async fn run(&self, call: &ToolCall) -> Result<ToolCallResult, ToolError> {
        match self {
            LocalExecutor::Bound(implementation) => implementation.call(call).await,
            LocalExecutor::Registered(handler) => handler.execute_call(call).await,
        }
    }
}

pub(crate) struct SyncJob {
    call: ToolCall,
    executor: LocalExecutor,
}

/// The spec a call refers to: the backend-resolved one, else the agent's.
pub(crate) fn resolve_spec<'a>(agent: &'a dyn Agent, call: &'a ToolCall) -> Option<&'a ToolSpec> {
    call.tool
        .as_ref()
        .or_else(|| agent.tool(&call.tool_name).map(ToolDefinition::spec))
}

fn local_executor(
    agent: &dyn Agent,
    registry: &CapabilityRegistry,
    call: &ToolCall,
) -> Option<LocalExecutor> {
    let spec = resolve_spec(agent, call)?;
    if !spec.is_sync() {
        return None;
    }
    if let Some(implementation) = agent
        .tool(&spec.name)
        .and_then(ToolDefinition::implementation)
    {
        return Some(LocalExecutor::Bound(Arc::clone(implementation)));
    }
    registry
        .resolve_local_tool(&spec.name)
        .ok()
        .map(LocalExecutor::Registered)
}

/// Pair every call with its local executor, or `None` if any call has none.
pub(crate) fn plan_sync_batch(
    agent: &dyn Agent,
    registry: &CapabilityRegistry,
    calls: &NonEmptyVec<ToolCall>,
) -> Option<Vec<SyncJob>> {
    calls
        .iter()
        .map(|call| {
            let executor = local_executor(agent, registry, call);
            if executor.is_none() {
                debug!(call_id = %call.id, tool = %call.name(), "Tool call needs external completion");
            }
            executor.map(|executor| SyncJob {
                call: call.clone(),
                executor,
            })
        })
        .collect()
}

/// Run every job on its own task and wait for all of them.
///
/// Results keep the order of `jobs`. The first error in that order is
/// returned; a panicking handler is reported as [`ToolError::Aborted`].
pub(crate) async fn dispatch_sync_batch(jobs: Vec<SyncJob>) -> Result<Vec<ToolCallResult>, ToolError> {
    let (tools, tasks): (Vec<_>, Vec<_>) = jobs
        .into_iter()
        .map(|job| {
            let tool = job.call.name().to_string();
            let task = tokio::spawn(async move { job.executor.run(&job.call).await });
            (tool, task)
        })
        .unzip();

    join_all(tasks)
        .await
        .into_iter()
        .zip(tools)
        .map(|(joined, tool)| {
            joined.unwrap_or_else(|e| {
                Err(ToolError::Aborted {
                    tool,
                    reason: e.to_string(),
                })
            })
        })
        .collect()
}
