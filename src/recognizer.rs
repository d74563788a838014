//! # Recognizer
//!
//! Maps `(method, path)` to the first route that fully accepts it.
//!
//! ## Matching Steps
//!
//! For the normalized path, the transition graph yields candidate routes in
//! declaration order. Each candidate is then checked in turn:
//!
//! 1. **Verb** - a route restricted to other verbs is skipped
//! 2. **Pattern** - the route's regex must match; captures are percent-decoded
//!    and merged over the route defaults (a captured value wins)
//! 3. **Handler** - the dispatcher resolves the target; an unresolvable
//!    dynamic controller cascades to the next candidate, an unresolvable
//!    literal one is a [`RoutingError`]
//!
//! The first candidate that passes all three wins. Declaration order is the
//! only tie-break: with `/photos/:id` declared before `/photos/new`, a request
//! for `/photos/new` matches `/photos/:id`.
//!
//! ## HEAD Requests
//!
//! When enabled, a HEAD request that no route accepts is retried against
//! routes that list GET explicitly.
//!
//! A query string on the path is ignored.

use crate::dispatcher::{Dispatch, Dispatcher, Handler, HandlerResponse};
use crate::error::RoutingError;
use crate::request::{normalize_path, unescape, Request};
use crate::route::{Route, VerbSet};
use crate::table::RouteTable;
use crate::Params;
use http::Method;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A recognized route with its final parameters.
#[derive(Clone)]
pub struct MatchResult {
    pub route: Arc<Route>,
    /// Path captures merged over route defaults, dispatch keys canonicalized.
    pub params: Params,
    /// Registry identifier of the resolved handler.
    pub handler_id: Arc<str>,
    pub(crate) handler: Arc<dyn Handler>,
}

impl MatchResult {
    pub fn name(&self) -> Option<&str> {
        self.route.name()
    }

    pub fn verbs(&self) -> &VerbSet {
        self.route.verbs()
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

impl fmt::Debug for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchResult")
            .field("route", &self.route.path())
            .field("name", &self.route.name())
            .field("params", &self.params)
            .field("handler_id", &self.handler_id)
            .finish()
    }
}

/// One recognition pass over a table.
pub struct Recognizer<'a> {
    table: &'a RouteTable,
    dispatcher: &'a Dispatcher,
    head_fallback: bool,
    extras: Option<&'a Params>,
}

impl<'a> Recognizer<'a> {
    pub fn new(table: &'a RouteTable, dispatcher: &'a Dispatcher, head_fallback: bool) -> Self {
        Self {
            table,
            dispatcher,
            head_fallback,
            extras: None,
        }
    }

    /// Merge `extras` over the recognized params of every candidate, before
    /// the handler is resolved.
    #[must_use]
    pub fn with_extras(mut self, extras: &'a Params) -> Self {
        self.extras = Some(extras);
        self
    }

    /// Find the route for `method` and `path` without invoking it.
    ///
    /// # Errors
    ///
    /// [`RoutingError::NoRoute`] if nothing matches, [`RoutingError::MissingHandler`]
    /// if the first match names an unknown literal handler.
    pub fn recognize(&self, method: &Method, path: &str) -> Result<MatchResult, RoutingError> {
        self.run(method, path, Some)
    }

    /// Recognize `req` and invoke handlers until one does not cascade.
    ///
    /// # Errors
    ///
    /// As for [`recognize`](Self::recognize); a request every handler
    /// cascades on ends in [`RoutingError::NoRoute`].
    pub fn serve(&self, req: &Request) -> Result<HandlerResponse, RoutingError> {
        self.run(&req.method, &req.path, |m| {
            match self.dispatcher.serve(&m, req) {
                Dispatch::Handled(response) => Some(response),
                Dispatch::Cascade => {
                    debug!(
                        handler = %m.handler_id,
                        route_index = m.route.index(),
                        "Handler cascaded"
                    );
                    None
                }
            }
        })
    }

    fn run<T>(
        &self,
        method: &Method,
        path: &str,
        mut accept: impl FnMut(MatchResult) -> Option<T>,
    ) -> Result<T, RoutingError> {
        debug!(method = %method, path = %path, "Route match attempt");
        let started = Instant::now();
        let path = normalize_path(path.split_once('?').map_or(path, |(path, _)| path));
        let candidates = self.table.candidates(&path);

        let mut found = self.attempt(&candidates, &path, |verbs| verbs.allows(method), &mut accept)?;
        if found.is_none() && self.head_fallback && *method == Method::HEAD {
            found = self.attempt(&candidates, &path, |verbs| verbs.lists(&Method::GET), &mut accept)?;
        }

        let elapsed = started.elapsed();
        match found {
            Some((value, route)) => {
                if elapsed > Duration::from_millis(1) {
                    warn!(
                        method = %method,
                        path = %path,
                        route_pattern = %route.path(),
                        duration_us = elapsed.as_micros(),
                        candidates = candidates.len(),
                        "Slow route matching detected"
                    );
                } else {
                    info!(
                        method = %method,
                        path = %path,
                        route_pattern = %route.path(),
                        route_name = route.name().unwrap_or(""),
                        duration_us = elapsed.as_micros(),
                        "Route matched"
                    );
                }
                Ok(value)
            }
            None => {
                warn!(
                    method = %method,
                    path = %path,
                    duration_us = elapsed.as_micros(),
                    candidates = candidates.len(),
                    "No route matched"
                );
                Err(RoutingError::NoRoute { path })
            }
        }
    }

    fn attempt<T>(
        &self,
        candidates: &[usize],
        path: &str,
        verb_ok: impl Fn(&VerbSet) -> bool,
        accept: &mut impl FnMut(MatchResult) -> Option<T>,
    ) -> Result<Option<(T, Arc<Route>)>, RoutingError> {
        for &index in candidates {
            let Some(route) = self.table.get(index) else {
                continue;
            };
            if !verb_ok(route.verbs()) {
                continue;
            }
            let Some(captures) = route.pattern().match_path(path) else {
                continue;
            };

            let mut params = route.defaults().clone();
            for (name, value) in captures {
                params.insert(name.to_string(), unescape(&value).into_owned());
            }
            if let Some(extras) = self.extras {
                params.extend(extras.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            self.dispatcher.prepare_params(route, &mut params);

            let Some((handler_id, handler)) = self.dispatcher.resolve(route, &params, path)? else {
                continue;
            };
            let matched = MatchResult {
                route: Arc::clone(route),
                params,
                handler_id,
                handler,
            };
            if let Some(value) = accept(matched) {
                return Ok(Some((value, Arc::clone(route))));
            }
        }
        Ok(None)
    }
}
