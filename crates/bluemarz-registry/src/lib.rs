//! # Bluemarz Registry
//!
//! Runtime lookup tables that let backend integrations plug into the
//! assignment runtime: executors keyed by (agent type, session type), agent
//! and session factories keyed by spec type tag, and local tool handlers keyed
//! by tool name. Also hosts the API-key middleware chain and spec stores.
//!
//! ```rust
//! use bluemarz_registry::CapabilityRegistry;
//!
//! let registry = CapabilityRegistry::new();
//! assert!(registry.resolve_agent_class("OpenAiAssistant").is_err());
//! ```

pub mod capability;
pub mod global;
pub mod middleware;
pub mod spec_store;

pub use capability::{CapabilityRegistry, ExecutorKey};
pub use global::{
    apply_api_key_middleware, assignment_spec_by_id, global, has_local_tool,
    register_agent_class, register_api_key_middleware, register_executor, register_local_tool,
    register_session_class, resolve_agent_class, resolve_executor, resolve_local_tool,
    resolve_session_class, save_assignment_spec, set_assignment_store,
};
pub use middleware::{ApiKeyMiddleware, ApiKeyTransform};
pub use spec_store::{InMemorySpecStore, SpecStore, StaticSpecStore};
