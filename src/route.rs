//! A single compiled route and the pieces that describe it.

use crate::pattern::CompiledPattern;
use crate::Params;
use http::Method;
use smallvec::SmallVec;
use std::fmt;

/// Default key naming the handler family for controller-dispatched routes.
pub const CONTROLLER_KEY: &str = "controller";
/// Default key naming the action within a controller.
pub const ACTION_KEY: &str = "action";

/// What a route hands the request to once it matches.
///
/// The router never calls the target itself; the dispatcher resolves it
/// through the [`HandlerRegistry`](crate::dispatcher::HandlerRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Resolved from the `controller` parameter, which comes either from a
    /// route default or from a matched path segment.
    Controller,
    /// A fixed handler registered under this identifier.
    Handler(String),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Controller => f.write_str("controller"),
            Endpoint::Handler(id) => write!(f, "handler:{id}"),
        }
    }
}

/// HTTP verbs a route accepts. Empty means any verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerbSet(SmallVec<[Method; 4]>);

impl VerbSet {
    pub fn any() -> Self {
        Self(SmallVec::new())
    }

    pub fn only(method: Method) -> Self {
        let mut verbs = SmallVec::new();
        verbs.push(method);
        Self(verbs)
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.0.is_empty() || self.0.contains(method)
    }

    /// True only when the verb is listed explicitly.
    pub fn lists(&self, method: &Method) -> bool {
        self.0.contains(method)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.0.iter()
    }
}

impl FromIterator<Method> for VerbSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        let mut verbs: SmallVec<[Method; 4]> = SmallVec::new();
        for method in iter {
            if !verbs.contains(&method) {
                verbs.push(method);
            }
        }
        Self(verbs)
    }
}

impl fmt::Display for VerbSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("ANY");
        }
        let names: Vec<&str> = self.0.iter().map(Method::as_str).collect();
        f.write_str(&names.join("|"))
    }
}

/// Request conditions of a route: its path declaration and verbs.
#[derive(Debug, Clone)]
pub struct Conditions {
    pub path: String,
    pub verbs: VerbSet,
}

impl Conditions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            verbs: VerbSet::any(),
        }
    }

    pub fn with_verbs(mut self, verbs: VerbSet) -> Self {
        self.verbs = verbs;
        self
    }
}

/// A compiled route. Read-only once the table is published.
#[derive(Debug, Clone)]
pub struct Route {
    pub(crate) index: usize,
    pub(crate) pattern: CompiledPattern,
    pub(crate) verbs: VerbSet,
    pub(crate) defaults: Params,
    pub(crate) name: Option<String>,
    pub(crate) endpoint: Endpoint,
}

impl Route {
    /// Position in the table, which is also the matching priority.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn path(&self) -> &str {
        self.pattern.source()
    }

    pub fn verbs(&self) -> &VerbSet {
        &self.verbs
    }

    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// True when the controller is fixed by a default rather than taken
    /// from a path segment.
    pub fn has_literal_controller(&self) -> bool {
        self.defaults.contains_key(CONTROLLER_KEY)
    }

    /// Defaults for keys that are not path segments, e.g. `controller` and
    /// `action` on a `photos#show` route.
    pub fn required_defaults(&self) -> impl Iterator<Item = (&String, &String)> {
        self.defaults
            .iter()
            .filter(|(key, _)| !self.pattern.has_name(key.as_str()))
    }

    /// Score used to rank unnamed routes during generation.
    ///
    /// Returns `None` when a required segment has no value in `constraints`.
    pub fn score(&self, constraints: &Params) -> Option<usize> {
        let supplied = |key: &str| constraints.get(key).is_some_and(|v| !v.is_empty());
        if !self.pattern.required_names().iter().all(|k| supplied(k.as_str())) {
            return None;
        }
        let matched = self.pattern.names().filter(|&k| supplied(k)).count();
        Some(matched + self.required_defaults().count() * 2)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>20} {:<8} {} -> {}",
            self.name.as_deref().unwrap_or(""),
            self.verbs,
            self.path(),
            self.endpoint
        )?;
        if let (Some(controller), Some(action)) =
            (self.defaults.get(CONTROLLER_KEY), self.defaults.get(ACTION_KEY))
        {
            write!(f, " {controller}#{action}")?;
        }
        Ok(())
    }
}
