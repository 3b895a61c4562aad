//! Keyed stores of declarative specs.
//!
//! Services usually look assignment specs up by id instead of shipping the
//! whole document with every request. A store maps ids to specs; files hold
//! a JSON object or a YAML mapping of id to spec.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use bluemarz_core::types::spec::is_yaml_path;
use bluemarz_core::{BluemarzError, BluemarzResult};

/// Lookup and persistence of specs by id.
pub trait SpecStore<T>: Send + Sync {
    fn get_by_id(&self, id: &str) -> BluemarzResult<T>;

    fn save_by_id(&self, id: &str, spec: T) -> BluemarzResult<()>;
}

fn read_spec_map<T: DeserializeOwned>(path: &Path) -> BluemarzResult<HashMap<String, T>> {
    let content = std::fs::read_to_string(path)?;
    let specs = if is_yaml_path(path) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(specs)
}

fn not_found(id: &str) -> BluemarzError {
    BluemarzError::NotFound(format!("No spec stored under id {id}"))
}

/// Mutable in-process store.
#[derive(Debug)]
pub struct InMemorySpecStore<T> {
    specs: DashMap<String, T>,
}

impl<T> Default for InMemorySpecStore<T> {
    fn default() -> Self {
        Self {
            specs: DashMap::new(),
        }
    }
}

impl<T> InMemorySpecStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(specs: HashMap<String, T>) -> Self {
        Self {
            specs: specs.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<T: DeserializeOwned> InMemorySpecStore<T> {
    /// Load the initial contents from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> BluemarzResult<Self> {
        let path = path.as_ref();
        let specs = read_spec_map(path)?;
        debug!(path = %path.display(), count = specs.len(), "Loaded spec store");
        Ok(Self::from_map(specs))
    }
}

impl<T: Clone + Send + Sync> SpecStore<T> for InMemorySpecStore<T> {
    fn get_by_id(&self, id: &str) -> BluemarzResult<T> {
        self.specs
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| not_found(id))
    }

    fn save_by_id(&self, id: &str, spec: T) -> BluemarzResult<()> {
        self.specs.insert(id.to_string(), spec);
        Ok(())
    }
}

/// Read-only store fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticSpecStore<T> {
    specs: HashMap<String, T>,
}

impl<T> StaticSpecStore<T> {
    /// Fails when `specs` is empty.
    pub fn new(specs: HashMap<String, T>) -> BluemarzResult<Self> {
        if specs.is_empty() {
            return Err(BluemarzError::Configuration(
                "A static spec store needs at least one spec".to_string(),
            ));
        }
        Ok(Self { specs })
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.specs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<T: DeserializeOwned> StaticSpecStore<T> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> BluemarzResult<Self> {
        let path = path.as_ref();
        let specs = read_spec_map(path)?;
        debug!(path = %path.display(), count = specs.len(), "Loaded static spec store");
        Self::new(specs)
    }
}

impl<T: Clone + Send + Sync> SpecStore<T> for StaticSpecStore<T> {
    fn get_by_id(&self, id: &str) -> BluemarzResult<T> {
        self.specs.get(id).cloned().ok_or_else(|| not_found(id))
    }

    fn save_by_id(&self, id: &str, _spec: T) -> BluemarzResult<()> {
        Err(BluemarzError::Configuration(format!(
            "Cannot save spec {id}: static spec stores are read-only"
        )))
    }
}
