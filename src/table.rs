//! # Route Table
//!
//! The ordered collection of compiled routes. Insertion order is matching
//! priority; a name index gives O(1) named lookup. The [`TransitionGraph`]
//! is derived from the routes when the table is finalized and is dropped
//! whenever more routes are added afterwards.
//!
//! A table is a plain value. Concurrency is handled one level up by
//! [`RouteSet`](crate::route_set::RouteSet), which publishes finished tables
//! atomically.

use crate::error::DrawError;
use crate::graph::TransitionGraph;
use crate::pattern::{CompiledPattern, Constraints, SEPARATORS};
use crate::request::normalize_path;
use crate::route::{Conditions, Endpoint, Route};
use crate::Params;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[allow(clippy::expect_used)]
static ROUTE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_a-zA-Z][_a-zA-Z0-9]*$").expect("route name regex is valid"));

/// Ordered routes plus name index and cached transition graph.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    pub(crate) routes: Vec<Arc<Route>>,
    named: HashMap<String, usize>,
    graph: Option<Arc<TransitionGraph>>,
    finalized: bool,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and append a route.
    ///
    /// An empty `name` is treated as no name. On error the table is left
    /// exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`DrawError::InvalidRouteName`] if `name` does not match `^[_a-zA-Z][_a-zA-Z0-9]*$`
    /// - [`DrawError::DuplicateRouteName`] if `name` is already registered
    /// - [`DrawError::Pattern`] if the path declaration does not compile
    pub fn add_route(
        &mut self,
        endpoint: Endpoint,
        conditions: Conditions,
        requirements: &Constraints,
        defaults: Params,
        name: Option<&str>,
        anchor: bool,
    ) -> Result<Arc<Route>, DrawError> {
        let name = name.filter(|n| !n.is_empty());
        if let Some(name) = name {
            if !ROUTE_NAME.is_match(name) {
                return Err(DrawError::InvalidRouteName(name.to_string()));
            }
            if self.named.contains_key(name) {
                return Err(DrawError::DuplicateRouteName(name.to_string()));
            }
        }

        // declared paths get the same canonical form as request paths
        let path = normalize_path(&conditions.path);
        let pattern = CompiledPattern::compile(&path, requirements, SEPARATORS, anchor)?;
        let index = self.routes.len();
        let route = Arc::new(Route {
            index,
            pattern,
            verbs: conditions.verbs,
            defaults,
            name: name.map(str::to_string),
            endpoint,
        });

        if let Some(name) = name {
            self.named.insert(name.to_string(), index);
        }
        self.routes.push(Arc::clone(&route));
        if self.graph.take().is_some() {
            debug!(route_index = index, "Transition graph invalidated by late route");
        }

        debug!(
            route_index = index,
            route_name = route.name().unwrap_or(""),
            path = %route.path(),
            verbs = %route.verbs(),
            "Route added"
        );
        Ok(route)
    }

    /// Look up a route by name.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Arc<Route>> {
        self.named.get(name).and_then(|&i| self.routes.get(i))
    }

    /// Names of all named routes, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.routes.iter().filter_map(|r| r.name()).collect()
    }

    /// Drop all routes, the name index and the graph.
    pub fn clear(&mut self) {
        self.routes.clear();
        self.named.clear();
        self.graph = None;
        self.finalized = false;
    }

    /// Build the transition graph.
    ///
    /// Returns `true` the first time after construction or [`clear`](Self::clear);
    /// later calls return `false` and only rebuild a graph that late routes
    /// invalidated.
    pub fn finalize(&mut self) -> bool {
        let first = !self.finalized;
        if first || self.graph.is_none() {
            let graph = TransitionGraph::build(&self.routes);
            info!(
                routes_count = self.routes.len(),
                named_count = self.named.len(),
                graph_states = graph.state_count(),
                "Route table finalized"
            );
            self.graph = Some(Arc::new(graph));
        }
        self.finalized = true;
        first
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn graph(&self) -> Option<&TransitionGraph> {
        self.graph.as_deref()
    }

    /// Route indices worth trying for `path`, in priority order.
    ///
    /// Without a graph every route is a candidate.
    pub fn candidates(&self, path: &str) -> Vec<usize> {
        match &self.graph {
            Some(graph) => graph.candidates(path),
            None => (0..self.routes.len()).collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Route>> {
        self.routes.get(index)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }
}
