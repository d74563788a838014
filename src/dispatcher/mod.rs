//! # Dispatcher Module
//!
//! Resolves the handler a matched route points at and invokes it.
//!
//! ## Overview
//!
//! A route names its target in one of two ways:
//!
//! - [`Endpoint::Handler`](crate::route::Endpoint::Handler) - a fixed identifier
//! - [`Endpoint::Controller`](crate::route::Endpoint::Controller) - derived from the
//!   `controller` parameter, e.g. `admin/user_photos` becomes
//!   `Admin::UserPhotosController`
//!
//! Before resolution the controller parameter is underscored and a missing
//! `action` is set to the configured default action (`index`).
//!
//! ## Resolution Outcomes
//!
//! | Situation | Outcome |
//! |---|---|
//! | registry knows the identifier | handler is invoked |
//! | unknown, controller came from a path segment | cascade: try the next route |
//! | unknown, controller fixed by a route default | [`RoutingError::MissingHandler`](crate::error::RoutingError) |
//! | unknown fixed handler identifier | [`RoutingError::MissingHandler`](crate::error::RoutingError) |
//!
//! A handler may also answer [`Dispatch::Cascade`] itself, which sends the
//! recognizer on to the next candidate route.
//!
//! ## Handler Registration
//!
//! ```rust
//! use routeset::dispatcher::{Dispatch, HandlerResponse, StaticRegistry};
//! use routeset::request::Request;
//! use routeset::Params;
//!
//! let mut registry = StaticRegistry::new();
//! registry.register("PhotosController", |_req: &Request, params: &Params| {
//!     Dispatch::Handled(HandlerResponse::json(
//!         200,
//!         serde_json::json!({ "action": params.get("action") }),
//!     ))
//! });
//! assert!(registry.contains("PhotosController"));
//! ```

mod core;
mod registry;

pub use self::core::{Dispatch, Dispatcher, Handler, HandlerResponse};
pub use registry::{HandlerRegistry, StaticRegistry};
