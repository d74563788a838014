//! # Formatter
//!
//! Builds concrete paths from routes and parameter maps.
//!
//! ## Value Precedence
//!
//! For every path segment the value is taken from, in order:
//!
//! 1. the explicit `options`
//! 2. the `recall` (parameters of the current request), but only for
//!    segments up to the last one `options` supplies, plus all required ones
//! 3. the route's own default for that segment
//!
//! A required segment left without a value, or whose value fails the
//! segment's constraint, makes the route ineligible and is reported in
//! [`UrlGenerationError::missing`].
//!
//! ## Route Selection
//!
//! A named route is used directly. Without a name, or with a name no route
//! carries, controller-dispatching routes whose non-path defaults
//! (`controller`, `action`, ...) all agree with the merged parameters are
//! ranked by [`Route::score`], highest first and declaration order within a
//! score.

use crate::error::UrlGenerationError;
use crate::route::{Endpoint, Route};
use crate::table::RouteTable;
use crate::Params;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Generate a path.
///
/// Returns the path plus the options no route segment or default consumed,
/// which callers usually turn into a query string.
///
/// # Errors
///
/// [`UrlGenerationError`] when no eligible route can be completed. For a
/// named route the error lists its missing keys.
pub fn generate(
    table: &RouteTable,
    name: Option<&str>,
    options: &Params,
    recall: &Params,
) -> Result<(String, Params), UrlGenerationError> {
    let mut constraints = recall.clone();
    constraints.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));

    let routes: Vec<&Arc<Route>> = match name.and_then(|n| table.named(n)) {
        Some(route) => vec![route],
        None => {
            if let Some(name) = name {
                debug!(route_name = %name, "Unknown route name, ranking unnamed routes");
            }
            ranked(table, &constraints)
        }
    };

    let mut missing = Vec::new();
    for route in routes {
        let parts = parameterized_parts(route, options, recall);
        let route_missing = missing_keys(route, &parts);
        if !route_missing.is_empty() {
            missing = route_missing;
            continue;
        }

        let leftover: Params = options
            .iter()
            .filter(|(k, _)| !parts.contains_key(*k) && !route.defaults().contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let parts = drop_default_optionals(route, parts);
        let path = route.pattern().format(&parts);
        debug!(
            route_index = route.index(),
            route_name = route.name().unwrap_or(""),
            path = %path,
            leftover = leftover.len(),
            "Path generated"
        );
        return Ok((path, leftover));
    }

    Err(UrlGenerationError::new(
        constraints,
        missing,
        name.map(str::to_string),
    ))
}

/// Option keys that would not be consumed by the route `generate` picks.
///
/// # Errors
///
/// As for [`generate`].
pub fn extra_keys(
    table: &RouteTable,
    name: Option<&str>,
    options: &Params,
    recall: &Params,
) -> Result<Vec<String>, UrlGenerationError> {
    let (_, leftover) = generate(table, name, options, recall)?;
    Ok(leftover.into_keys().collect())
}

/// Candidate unnamed routes, best first.
fn ranked<'t>(table: &'t RouteTable, constraints: &Params) -> Vec<&'t Arc<Route>> {
    let mut by_score: BTreeMap<usize, Vec<&Arc<Route>>> = BTreeMap::new();
    for route in table.iter() {
        if *route.endpoint() != Endpoint::Controller {
            continue;
        }
        let agrees = route
            .required_defaults()
            .all(|(k, v)| constraints.get(k) == Some(v));
        if !agrees {
            continue;
        }
        if let Some(score) = route.score(constraints) {
            by_score.entry(score).or_default().push(route);
        }
    }
    by_score.into_values().rev().flatten().collect()
}

/// Values for the route's segments.
fn parameterized_parts(route: &Route, options: &Params, recall: &Params) -> Params {
    let pattern = route.pattern();
    let names: Vec<&str> = pattern.names().collect();

    // recall only reaches as far as the last segment options mention
    let keep_until = names
        .iter()
        .rposition(|name| options.get(*name).is_some_and(|v| !v.is_empty()));
    let required = pattern.required_names();

    let mut parts = Params::new();
    for (i, name) in names.iter().enumerate() {
        let is_required = required.iter().any(|r| r.as_str() == *name);
        if !is_required && keep_until.map_or(true, |last| i > last) {
            continue;
        }
        let value = options
            .get(*name)
            .or_else(|| recall.get(*name))
            .or_else(|| route.defaults().get(*name))
            .filter(|v| !v.is_empty());
        if let Some(value) = value {
            parts.insert(name.to_string(), value.clone());
        }
    }
    parts
}

fn missing_keys(route: &Route, parts: &Params) -> Vec<String> {
    let pattern = route.pattern();
    let mut missing: Vec<String> = pattern
        .required_names()
        .iter()
        .filter(|name| !parts.contains_key(name.as_str()))
        .cloned()
        .collect();
    for (name, value) in parts {
        if !pattern.satisfies(name, value) {
            missing.push(name.clone());
        }
    }
    missing
}

/// Optional segments equal to their route default are left out.
fn drop_default_optionals(route: &Route, mut parts: Params) -> Params {
    let required = route.pattern().required_names();
    parts.retain(|key, value| {
        required.contains(key) || route.defaults().get(key) != Some(&*value)
    });
    parts
}
