//! Process-wide registry, middleware chain and assignment store.
//!
//! Integrations call the `register_*` functions once at start-up; assignments
//! built without an explicit registry resolve against these instances.

use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

use bluemarz_core::{
    Agent, AgentFactory, AssignmentSpec, BluemarzError, BluemarzResult, Executor, Session,
    SessionFactory, ToolHandler,
};

use crate::capability::{CapabilityRegistry, ExecutorKey};
use crate::middleware::ApiKeyMiddleware;
use crate::spec_store::SpecStore;

static REGISTRY: Lazy<Arc<CapabilityRegistry>> = Lazy::new(|| Arc::new(CapabilityRegistry::new()));

static API_KEY_MIDDLEWARE: Lazy<ApiKeyMiddleware> = Lazy::new(ApiKeyMiddleware::new);

type AssignmentStore = Arc<dyn SpecStore<AssignmentSpec>>;

static ASSIGNMENT_STORE: Lazy<RwLock<Option<AssignmentStore>>> = Lazy::new(|| RwLock::new(None));

/// Shared handle to the process-wide registry.
pub fn global() -> Arc<CapabilityRegistry> {
    Arc::clone(&REGISTRY)
}

pub fn register_executor(executor: Arc<dyn Executor>) -> BluemarzResult<ExecutorKey> {
    REGISTRY.register_executor(executor)
}

pub fn resolve_executor(agent: &dyn Agent, session: &dyn Session) -> BluemarzResult<Arc<dyn Executor>> {
    REGISTRY.resolve_executor(agent, session)
}

pub fn register_agent_class(
    name: impl Into<String>,
    factory: Arc<dyn AgentFactory>,
) -> BluemarzResult<()> {
    REGISTRY.register_agent_class(name, factory)
}

pub fn resolve_agent_class(name: &str) -> BluemarzResult<Arc<dyn AgentFactory>> {
    REGISTRY.resolve_agent_class(name)
}

pub fn register_session_class(
    name: impl Into<String>,
    factory: Arc<dyn SessionFactory>,
) -> BluemarzResult<()> {
    REGISTRY.register_session_class(name, factory)
}

pub fn resolve_session_class(name: &str) -> BluemarzResult<Arc<dyn SessionFactory>> {
    REGISTRY.resolve_session_class(name)
}

pub fn register_local_tool(handler: Arc<dyn ToolHandler>) -> BluemarzResult<()> {
    REGISTRY.register_local_tool(handler)
}

pub fn resolve_local_tool(name: &str) -> BluemarzResult<Arc<dyn ToolHandler>> {
    REGISTRY.resolve_local_tool(name)
}

pub fn has_local_tool(name: &str) -> bool {
    REGISTRY.has_local_tool(name)
}

/// Append a transform to the process-wide API-key chain.
pub fn register_api_key_middleware<F>(transform: F)
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    API_KEY_MIDDLEWARE.register(transform);
}

/// Pass `api_key` through the process-wide chain.
pub fn apply_api_key_middleware(api_key: &str) -> String {
    API_KEY_MIDDLEWARE.apply(api_key)
}

/// Install the process-wide assignment spec store, replacing any previous one.
pub fn set_assignment_store(store: Arc<dyn SpecStore<AssignmentSpec>>) {
    *ASSIGNMENT_STORE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(store);
}

fn assignment_store() -> BluemarzResult<AssignmentStore> {
    ASSIGNMENT_STORE
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
        .ok_or_else(|| {
            BluemarzError::Configuration("No assignment spec store has been set".to_string())
        })
}

pub fn assignment_spec_by_id(id: &str) -> BluemarzResult<AssignmentSpec> {
    assignment_store()?.get_by_id(id)
}

pub fn save_assignment_spec(id: &str, spec: AssignmentSpec) -> BluemarzResult<()> {
    assignment_store()?.save_by_id(id, spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec_store::InMemorySpecStore;
    use bluemarz_core::AgentSpec;

    // The only test in this crate touching the process-wide store.
    #[test]
    fn test_assignment_store_lifecycle() {
        let spec = AssignmentSpec::new(AgentSpec::new("asst_1", "MockAgent", "MockSession"));

        let err = assignment_spec_by_id("greeting").unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(save_assignment_spec("greeting", spec.clone()).is_err());

        set_assignment_store(Arc::new(InMemorySpecStore::new()));
        save_assignment_spec("greeting", spec.clone()).unwrap();
        assert_eq!(assignment_spec_by_id("greeting").unwrap(), spec);
        assert_eq!(
            assignment_spec_by_id("farewell").unwrap_err().error_code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_global_handle_is_shared() {
        assert!(Arc::ptr_eq(&global(), &global()));
        assert!(!has_local_tool("registry-global-test-missing"));
    }

    #[test]
    fn test_global_middleware_applies_registered_transform() {
        register_api_key_middleware(|key| match key.strip_prefix("global-test:") {
            Some(rest) => format!("sk-{rest}"),
            None => key.to_string(),
        });
        assert_eq!(apply_api_key_middleware("global-test:abc"), "sk-abc");
    }
}
