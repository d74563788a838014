//! # routeset
//!
//! **routeset** is a declaration-ordered URL routing engine: it recognizes an
//! incoming method and path against an ordered table of routes, dispatches to
//! a registered handler, and generates paths and URLs back from parameters.
//!
//! ## Overview
//!
//! Routes are declared in order. Each route carries a compiled path pattern,
//! accepted verbs, defaults such as `controller` and `action`, optional
//! per-segment constraints and an optional name. Recognition walks the
//! candidates in declaration order and stops at the first route whose handler
//! accepts the request; a handler may cascade to let later routes try.
//! Generation runs the same patterns backwards.
//!
//! ## Architecture
//!
//! - **[`pattern`]** - Path pattern parsing and compilation to anchored regexes
//! - **[`route`]** - A single route: pattern, verbs, defaults, name, endpoint
//! - **[`table`]** - The ordered route table with its named-route index
//! - **[`graph`]** - Segment transition graph that narrows candidates per path
//! - **[`mapper`]** - Route declarations and the drawing API
//! - **[`recognizer`]** - Path recognition and the dispatch loop
//! - **[`dispatcher`]** - Handler trait, registry, controller resolution
//! - **[`formatter`]** - Route selection and path formatting for generation
//! - **[`generator`]** - Recall rules, `url_for` and query strings
//! - **[`route_set`]** - Published table, draw/clear/finalize lifecycle
//! - **[`hot_reload`]** - Redraw from a routes file when it changes
//! - **[`config`]** - Environment configuration and routes files
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Set as RouteSet
//!     participant Graph as TransitionGraph
//!     participant Route
//!     participant Disp as Dispatcher
//!     participant Handler
//!
//!     Client->>Set: call(Request)
//!     Set->>Graph: candidates(path)
//!     Graph-->>Set: route indices, declaration order
//!     loop each candidate
//!         Set->>Route: verbs + pattern match
//!         Route-->>Set: captured params
//!         Set->>Disp: resolve handler
//!         Disp->>Handler: call(request, params)
//!         alt Handled
//!             Handler-->>Client: HandlerResponse
//!         else Cascade
//!             Handler-->>Set: try next route
//!         end
//!     end
//!     Set-->>Client: RoutingError::NoRoute
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use routeset::dispatcher::{Dispatch, HandlerResponse, StaticRegistry};
//! use routeset::generator::UrlOptions;
//! use routeset::request::Request;
//! use routeset::{params, Params, RouteSet};
//! use std::sync::Arc;
//!
//! let mut registry = StaticRegistry::new();
//! registry.register("PhotosController", |_req: &Request, params: &Params| {
//!     let id = params.get("id").cloned().unwrap_or_default();
//!     Dispatch::Handled(HandlerResponse::json(200, serde_json::json!({ "id": id })))
//! });
//!
//! let routes = RouteSet::new(Arc::new(registry));
//! routes
//!     .draw(|map| {
//!         map.get("/photos/new", "photos#new")?;
//!         map.add(routeset::RouteDecl::get("/photos/:id").to("photos#show").name("photo"))?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let response = routes.call(&Request::new(Method::GET, "/photos/3")).unwrap();
//! assert_eq!(response.status, 200);
//!
//! let url = routes
//!     .url_for(&UrlOptions::named("photo", params! { "id" => 3 }).host("example.com"))
//!     .unwrap();
//! assert_eq!(url, "http://example.com/photos/3");
//! ```
//!
//! ## Logging
//!
//! Every module logs through `tracing`. Binaries install a subscriber with
//! [`logging::init_logging_with_config`]; libraries embedding routeset keep
//! their own.

use std::collections::BTreeMap;

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod formatter;
pub mod generator;
pub mod graph;
pub mod hot_reload;
pub mod inflector;
pub mod logging;
pub mod mapper;
pub mod pattern;
pub mod recognizer;
pub mod request;
pub mod route;
pub mod route_set;
pub mod table;

/// Route parameters: path captures, defaults and generation options.
///
/// Ordered so that extra keys render as a stable query string.
pub type Params = BTreeMap<String, String>;

/// Build a [`Params`] map. Values go through [`ToParam`](generator::ToParam).
///
/// ```rust
/// let p = routeset::params! { "controller" => "photos", "id" => 5 };
/// assert_eq!(p["id"], "5");
/// assert!(routeset::params! {}.is_empty());
/// ```
#[macro_export]
macro_rules! params {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::Params::new();
        $(map.insert(::std::string::String::from($key), $crate::generator::ToParam::to_param(&$value));)*
        map
    }};
}

pub use dispatcher::{Dispatch, Dispatcher, Handler, HandlerRegistry, HandlerResponse, StaticRegistry};
pub use error::{DrawError, PatternError, RoutingError, UrlError, UrlGenerationError};
pub use mapper::{Mapper, RouteDecl};
pub use recognizer::MatchResult;
pub use request::Request;
pub use route::{Endpoint, Route, VerbSet};
pub use route_set::RouteSet;
pub use table::RouteTable;
