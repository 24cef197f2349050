use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::backend::DetectorBackend;

/// Name-keyed registry of detector backends.
///
/// The first registered backend becomes the default; configuration selects a
/// backend by name at startup and the pipeline takes exclusive ownership of
/// it for the run.
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn DetectorBackend>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Box::new(backend));
    }

    pub fn list(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Remove and return a backend by name, or the default when `name` is
    /// empty.
    pub fn take(&mut self, name: &str) -> Result<Box<dyn DetectorBackend>> {
        let name = if name.is_empty() {
            self.default_name
                .clone()
                .ok_or_else(|| anyhow!("no detector backend registered"))?
        } else {
            name.to_string()
        };
        self.backends
            .remove(&name)
            .ok_or_else(|| anyhow!("detector backend '{}' not registered", name))
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
