//! Transition graph for candidate pruning.
//!
//! A segment trie built from every route in a table. Each state is reached
//! by one `/`-delimited request segment, either through a static edge
//! (literal text) or through the single dynamic edge shared by all routes
//! with a plain named segment at that position.
//!
//! ## Key Properties
//!
//! - **Conservative**: the graph never drops a route whose regex would match.
//!   Anything it cannot reason about precisely (constrained segments, globs,
//!   unanchored tails) is parked on a `rest` list that accepts any remainder.
//! - **Order preserving**: candidates come back sorted by route index, so the
//!   recognizer still sees routes in declaration order.
//! - **Immutable**: built once when a table is finalized, then shared read-only.
//!
//! ## Example
//!
//! ```text
//! /photos/new        root -photos-> s1 -new-> s2       accept [1]
//! /photos/:id        root -photos-> s1 -*->   s3       accept [0]
//! /files/*path       root -files->  s4                 rest   [2]
//! ```
//!
//! A request for `/photos/new` walks both `s2` and `s3` and yields `[0, 1]`.

use crate::pattern::Node;
use crate::route::Route;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes with more optional-group combinations than this skip the trie.
const MAX_VARIANTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Literal text, matched exactly.
    Static(String),
    /// Contains plain named segments; matches any single request segment.
    Dynamic,
    /// Literal text that may be followed by more characters and segments.
    Prefix(String),
    /// May consume any number of remaining segments.
    Rest,
}

#[derive(Debug, Default, Clone)]
struct State {
    statics: HashMap<String, State>,
    dynamic: Option<Box<State>>,
    /// Routes that end exactly at this state.
    accept: Vec<usize>,
    /// Routes that match any remainder from this state on.
    rest: Vec<usize>,
    /// Routes whose next segment only has to start with the given text.
    prefixed: Vec<(String, usize)>,
}

impl State {
    fn insert(&mut self, segments: &[Segment], index: usize) {
        let mut state = self;
        for segment in segments {
            state = match segment {
                Segment::Static(text) => state.statics.entry(text.clone()).or_default(),
                Segment::Dynamic => state.dynamic.get_or_insert_with(Box::default),
                Segment::Prefix(text) => {
                    state.prefixed.push((text.clone(), index));
                    return;
                }
                Segment::Rest => {
                    state.rest.push(index);
                    return;
                }
            };
        }
        state.accept.push(index);
    }

    fn collect(&self, segments: &[&str], out: &mut Vec<usize>) {
        out.extend_from_slice(&self.rest);
        let Some((first, remaining)) = segments.split_first() else {
            out.extend_from_slice(&self.accept);
            return;
        };
        for (text, index) in &self.prefixed {
            if first.starts_with(text.as_str()) {
                out.push(*index);
            }
        }
        if let Some(child) = self.statics.get(*first) {
            child.collect(remaining, out);
        }
        if let Some(child) = &self.dynamic {
            child.collect(remaining, out);
        }
    }

    fn count(&self) -> usize {
        1 + self.statics.values().map(State::count).sum::<usize>()
            + self.dynamic.as_ref().map_or(0, |d| d.count())
    }
}

/// Cached prefix structure over all routes of one table.
#[derive(Debug, Default, Clone)]
pub struct TransitionGraph {
    root: State,
    /// Routes that are always tried (too many variants to expand).
    always: Vec<usize>,
    route_count: usize,
}

impl TransitionGraph {
    /// Build the graph for `routes`, indexed by [`Route::index`].
    pub fn build(routes: &[Arc<Route>]) -> Self {
        let mut graph = Self {
            route_count: routes.len(),
            ..Self::default()
        };
        for route in routes {
            let pattern = route.pattern();
            let Some(variants) = expand(pattern.spec().nodes(), MAX_VARIANTS) else {
                graph.always.push(route.index());
                continue;
            };
            for variant in variants {
                let mut segments = classify(&variant, |name| pattern.constraint(name).is_some());
                if !pattern.is_anchored() {
                    open_tail(&mut segments);
                }
                graph.root.insert(&segments, route.index());
            }
        }
        graph
    }

    /// Indices of routes that could match `path`, ascending.
    ///
    /// `path` is expected to be normalized (leading slash, no empty segments).
    pub fn candidates(&self, path: &str) -> Vec<usize> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut out = Vec::with_capacity(8);
        self.root.collect(&segments, &mut out);
        out.extend_from_slice(&self.always);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Number of trie states, for diagnostics.
    pub fn state_count(&self) -> usize {
        self.root.count()
    }

    pub fn route_count(&self) -> usize {
        self.route_count
    }
}

/// An unanchored pattern may stop inside its last segment or before any
/// further ones.
fn open_tail(segments: &mut Vec<Segment>) {
    match segments.pop() {
        Some(Segment::Static(text)) => segments.push(Segment::Prefix(text)),
        Some(Segment::Dynamic) => segments.extend([Segment::Dynamic, Segment::Rest]),
        Some(other) => segments.push(other),
        None => segments.push(Segment::Rest),
    }
}

/// Every combination of present/absent optional groups, flattened.
/// `None` when the count would exceed `limit`.
fn expand(nodes: &[Node], limit: usize) -> Option<Vec<Vec<Node>>> {
    let mut variants: Vec<Vec<Node>> = vec![Vec::new()];
    for node in nodes {
        match node {
            Node::Group(inner) => {
                let inner_variants = expand(inner, limit)?;
                if variants.len() * (inner_variants.len() + 1) > limit {
                    return None;
                }
                let mut next = Vec::with_capacity(variants.len() * (inner_variants.len() + 1));
                for prefix in &variants {
                    next.push(prefix.clone());
                    for inner in &inner_variants {
                        let mut joined = prefix.clone();
                        joined.extend(inner.iter().cloned());
                        next.push(joined);
                    }
                }
                variants = next;
            }
            other => {
                for variant in &mut variants {
                    variant.push(other.clone());
                }
            }
        }
    }
    Some(variants)
}

/// Split a group-free node list on `/` and classify each segment.
fn classify(nodes: &[Node], constrained: impl Fn(&str) -> bool) -> Vec<Segment> {
    let mut segments = Vec::new();
    for piece in nodes.split(|n| matches!(n, Node::Separator('/'))) {
        if piece.is_empty() {
            continue;
        }
        let mut text = String::new();
        let mut kind = None;
        for node in piece {
            match node {
                Node::Literal(literal) => text.push_str(literal),
                Node::Separator(c) => text.push(*c),
                Node::Symbol(name) if !constrained(name) => {
                    kind.get_or_insert(Segment::Dynamic);
                }
                _ => kind = Some(Segment::Rest),
            }
        }
        let segment = kind.unwrap_or(Segment::Static(text));
        let stop = segment == Segment::Rest;
        segments.push(segment);
        if stop {
            break;
        }
    }
    segments
}
