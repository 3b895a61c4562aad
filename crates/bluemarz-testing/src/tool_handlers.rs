//! # Test Tool Handlers
//!
//! Local tool executors with predictable behaviour and call tracking.

use async_trait::async_trait;
use bluemarz_core::{ToolCall, ToolCallResult, ToolError, ToolHandler, ToolImplementation, ToolSpec};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type HandlerFn = dyn Fn(&ToolCall) -> Result<ToolCallResult, ToolError> + Send + Sync;

/// A registry-level handler backed by a closure.
#[derive(Clone)]
pub struct FnToolHandler {
    name: String,
    handler: Arc<HandlerFn>,
    calls: Arc<Mutex<Vec<ToolCall>>>,
}

impl FnToolHandler {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ToolCall) -> Result<ToolCallResult, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the number of times this handler has been called
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calls received, in completion order
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl std::fmt::Debug for FnToolHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnToolHandler")
            .field("name", &self.name)
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl ToolHandler for FnToolHandler {
    fn tool_name(&self) -> &str {
        &self.name
    }

    async fn execute_call(&self, call: &ToolCall) -> Result<ToolCallResult, ToolError> {
        self.calls.lock().unwrap().push(call.clone());
        (self.handler)(call)
    }
}

/// A handler whose every call fails unexpectedly.
#[derive(Debug, Clone)]
pub struct FailingToolHandler {
    name: String,
    message: String,
    calls: Arc<AtomicUsize>,
}

impl FailingToolHandler {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolHandler for FailingToolHandler {
    fn tool_name(&self) -> &str {
        &self.name
    }

    async fn execute_call(&self, _call: &ToolCall) -> Result<ToolCallResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ToolError::ExecutionFailed {
            tool: self.name.clone(),
            message: self.message.clone(),
        })
    }
}

/// A bound tool implementation answering every call with the same text.
#[derive(Debug, Clone)]
pub struct StaticToolImplementation {
    spec: ToolSpec,
    response: String,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl StaticToolImplementation {
    pub fn new(spec: ToolSpec, response: impl Into<String>) -> Self {
        Self {
            spec,
            response: response.into(),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep before answering, to exercise concurrent dispatch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolImplementation for StaticToolImplementation {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn call(&self, call: &ToolCall) -> Result<ToolCallResult, ToolError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ToolCallResult::text(call.clone(), self.response.clone()))
    }
}

fn number_argument(call: &ToolCall, name: &str) -> Result<f64, ToolError> {
    call.argument(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: call.name().to_string(),
            reason: format!("'{name}' must be a number"),
        })
}

/// Handler for an `add` tool summing its numeric `a` and `b` arguments.
pub fn add_numbers_handler() -> FnToolHandler {
    FnToolHandler::new("add", |call| {
        let sum = number_argument(call, "a")? + number_argument(call, "b")?;
        Ok(ToolCallResult::text(call.clone(), format_number(sum)))
    })
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
