//! API-key middleware.
//!
//! Deployments often keep aliases or vault references in specs instead of raw
//! keys. Backend factories pass every spec key through the registered
//! transforms before talking to the backend.

use std::fmt;
use std::sync::{Arc, RwLock};

/// A single key transform.
pub type ApiKeyTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Ordered chain of API-key transforms.
#[derive(Default)]
pub struct ApiKeyMiddleware {
    transforms: RwLock<Vec<ApiKeyTransform>>,
}

impl ApiKeyMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform; it runs after every transform registered before it.
    pub fn register<F>(&self, transform: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.transforms
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::new(transform));
    }

    /// Fold `api_key` through the chain in registration order.
    pub fn apply(&self, api_key: &str) -> String {
        let transforms = self
            .transforms
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        transforms
            .iter()
            .fold(api_key.to_string(), |key, transform| transform(&key))
    }

    pub fn len(&self) -> usize {
        self.transforms
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.transforms
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl fmt::Debug for ApiKeyMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyMiddleware")
            .field("transforms", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = ApiKeyMiddleware::new();
        assert!(chain.is_empty());
        assert_eq!(chain.apply("sk-123"), "sk-123");
    }

    #[test]
    fn test_transforms_run_in_registration_order() {
        let chain = ApiKeyMiddleware::new();
        chain.register(|key| format!("{key}-a"));
        chain.register(|key| key.to_uppercase());

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.apply("sk"), "SK-A");
    }

    #[test]
    fn test_alias_lookup() {
        let chain = ApiKeyMiddleware::new();
        chain.register(|key| match key {
            "alias:team" => "sk-team-secret".to_string(),
            other => other.to_string(),
        });

        assert_eq!(chain.apply("alias:team"), "sk-team-secret");
        assert_eq!(chain.apply("sk-raw"), "sk-raw");

        chain.clear();
        assert_eq!(chain.apply("alias:team"), "alias:team");
    }
}
