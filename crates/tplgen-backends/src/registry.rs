//! Backend lookup by id.

use crate::backend::Backend;
use crate::error::RegistryError;
use crate::{Handlebars, Jinja, Liquid, Native, Twig};
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

/// Backends by id, in registration order.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: IndexMap<SmolStr, Arc<dyn Backend>>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in backend.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Jinja);
        registry.register(Twig);
        registry.register(Handlebars);
        registry.register(Liquid);
        registry.register(Native);
        registry
    }

    /// Register a backend, replacing any backend with the same id.
    pub fn register(&mut self, backend: impl Backend + 'static) {
        let id = SmolStr::new(backend.id());
        if self.backends.insert(id.clone(), Arc::new(backend)).is_some() {
            tracing::debug!(backend = %id, "replaced backend");
        }
    }

    /// Get a backend by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(id).cloned()
    }

    /// Registered ids, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(SmolStr::as_str)
    }

    /// Resolve a list of ids. Duplicates are dropped, order is kept.
    pub fn resolve<S: AsRef<str>>(
        &self,
        ids: &[S],
    ) -> Result<Vec<Arc<dyn Backend>>, RegistryError> {
        let mut resolved: Vec<Arc<dyn Backend>> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            let backend = self.get(id).ok_or_else(|| RegistryError::UnknownBackend {
                id: id.to_string(),
                known: self.ids().map(String::from).collect(),
            })?;
            if !resolved.iter().any(|b| b.id() == backend.id()) {
                resolved.push(backend);
            }
        }
        Ok(resolved)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtins() {
        let registry = BackendRegistry::with_builtins();
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["jinja", "twig", "handlebars", "liquid", "native"]
        );
        assert_eq!(registry.get("twig").map(|b| b.extension()), Some("html.twig"));
    }

    #[test]
    fn test_resolve() {
        let registry = BackendRegistry::with_builtins();
        let backends = registry.resolve(&["liquid", "jinja", "liquid"]).unwrap();
        let ids: Vec<_> = backends.iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec!["liquid", "jinja"]);

        let err = registry.resolve(&["erb"]).err().unwrap();
        assert_eq!(
            err.to_string(),
            "unknown backend `erb` (available: jinja, twig, handlebars, liquid, native)"
        );
    }
}
