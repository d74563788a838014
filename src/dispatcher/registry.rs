use super::core::Handler;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Source of handlers keyed by identifier.
///
/// `None` is the "not found" signal the dispatcher turns into a cascade or
/// a [`RoutingError`](crate::error::RoutingError), depending on the route.
pub trait HandlerRegistry: Send + Sync {
    fn resolve(&self, id: &str) -> Option<Arc<dyn Handler>>;
}

/// Handlers registered up front, looked up by exact identifier.
#[derive(Default, Clone)]
pub struct StaticRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl StaticRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one under `id`.
    pub fn register<H>(&mut self, id: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        let id = id.into();
        if self.handlers.insert(id.clone(), Arc::new(handler)).is_some() {
            warn!(handler = %id, "Replaced existing handler");
        } else {
            info!(
                handler = %id,
                total_handlers = self.handlers.len(),
                "Handler registered"
            );
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl HandlerRegistry for StaticRegistry {
    fn resolve(&self, id: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(id).cloned()
    }
}
