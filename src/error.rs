//! # Error Module
//!
//! Every failure the router can report, split by the lifecycle phase that
//! raises it:
//!
//! - **Draw time**: [`PatternError`] for malformed path declarations and
//!   [`DrawError`] for route-table violations (name format, name reuse).
//!   These abort the single `add_route` call that raised them.
//! - **Request time**: [`RoutingError`] when nothing matches, or when a route
//!   names a handler by literal default that the registry does not know.
//! - **Generation time**: [`UrlGenerationError`] carrying the missing keys,
//!   wrapped in [`UrlError`] when a full URL is rendered.
//!
//! A cascade is not an error. It is modelled as [`crate::dispatcher::Dispatch::Cascade`].

use crate::Params;
use thiserror::Error;

/// A route path declaration could not be compiled.
#[derive(Debug, Error)]
pub enum PatternError {
    /// Segment name does not match `[_a-zA-Z]\w*`.
    #[error("invalid segment name '{name}' in path '{path}'")]
    InvalidSegmentName { path: String, name: String },

    /// The same name appears twice in one path.
    #[error("segment ':{name}' appears more than once in path '{path}'")]
    DuplicateSegment { path: String, name: String },

    /// A `:` or `*` not followed by a name.
    #[error("empty segment name at byte {position} in path '{path}'")]
    EmptySegmentName { path: String, position: usize },

    /// Parentheses do not balance.
    #[error("unbalanced optional group in path '{path}'")]
    UnbalancedGroup { path: String },

    /// A glob is followed by further path segments.
    #[error("glob '*{name}' must be the last segment of path '{path}'")]
    MisplacedGlob { path: String, name: String },

    /// The constraint for a segment is not a valid regex.
    #[error("invalid constraint for ':{name}': {source}")]
    InvalidConstraint {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Constraints are embedded in a larger expression, anchors would break it.
    #[error("regexp anchor characters are not allowed in the constraint for ':{name}'")]
    AnchoredConstraint { name: String },

    /// The assembled path regex failed to compile.
    #[error("path '{path}' compiled to an invalid expression: {source}")]
    Regex {
        path: String,
        #[source]
        source: regex::Error,
    },
}

/// A route could not be added to the table.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(
        "invalid route name, already in use: '{0}'. Two routes may have been \
         declared with the same name"
    )]
    DuplicateRouteName(String),

    #[error("invalid route name: '{0}'")]
    InvalidRouteName(String),

    /// A verb in a route declaration is not a valid HTTP method.
    #[error("invalid HTTP verb '{0}'")]
    InvalidVerb(String),

    /// A `to` target not of the form `controller#action`.
    #[error("invalid route target '{0}', expected 'controller#action'")]
    InvalidTarget(String),
}

/// Request-time recognition failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("No route matches \"{path}\"")]
    NoRoute { path: String },

    /// The handler was fixed by a route default and the registry has no such handler.
    #[error("A route matches \"{path}\", but references missing handler: {handler}")]
    MissingHandler { path: String, handler: String },
}

/// A path could not be generated from the supplied options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.render())]
pub struct UrlGenerationError {
    /// The merged options the generator was working from.
    pub constraints: Params,
    /// Required keys that were absent (or failed their constraint), sorted.
    pub missing: Vec<String>,
    /// Name of the route that was requested, if any.
    pub route: Option<String>,
}

impl UrlGenerationError {
    pub(crate) fn new(constraints: Params, mut missing: Vec<String>, route: Option<String>) -> Self {
        missing.sort();
        missing.dedup();
        Self {
            constraints,
            missing,
            route,
        }
    }

    fn render(&self) -> String {
        let mut message = format!("No route matches {:?}", self.constraints);
        if !self.missing.is_empty() {
            message.push_str(&format!(" missing required keys: {:?}", self.missing));
        }
        message
    }
}

/// A URL could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error(transparent)]
    Generation(#[from] UrlGenerationError),

    /// A full URL was requested without a host.
    #[error("missing host to link to; set a host or request only the path")]
    MissingHost,

    /// A named-route helper was called with a name no route carries.
    #[error("no route named '{0}'")]
    UnknownRoute(String),
}
