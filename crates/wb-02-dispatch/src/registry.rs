//! Static method → handler map, built once at startup.

use crate::error::RegistryError;
use crate::handler::RequestHandler;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn RequestHandler>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Exact-match lookup.
    pub fn get(&self, method: &str) -> Option<Arc<dyn RequestHandler>> {
        self.handlers.get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&'static str> {
        let mut methods: Vec<_> = self.handlers.keys().copied().collect();
        methods.sort_unstable();
        methods
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<&'static str, Arc<dyn RequestHandler>>,
}

impl HandlerRegistryBuilder {
    /// Add every method of `handler`; fails without changes on any duplicate.
    pub fn register(mut self, handler: Arc<dyn RequestHandler>) -> Result<Self, RegistryError> {
        let methods = handler.methods();
        if let Some(taken) = methods.iter().find(|m| self.handlers.contains_key(*m)) {
            return Err(RegistryError::DuplicateMethod((*taken).to_string()));
        }
        for &method in methods {
            debug!(method = method, "Registering handler");
            if self.handlers.insert(method, handler.clone()).is_some() {
                return Err(RegistryError::DuplicateMethod(method.to_string()));
            }
        }
        Ok(self)
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}
