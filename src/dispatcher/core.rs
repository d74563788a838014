use super::registry::HandlerRegistry;
use crate::error::RoutingError;
use crate::inflector::{camelize, underscore};
use crate::recognizer::MatchResult;
use crate::request::{HeaderVec, Request};
use crate::route::{Endpoint, Route, ACTION_KEY, CONTROLLER_KEY};
use crate::Params;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A request handler.
///
/// Implemented for any `Fn(&Request, &Params) -> Dispatch`.
pub trait Handler: Send + Sync {
    fn call(&self, req: &Request, params: &Params) -> Dispatch;
}

impl<F> Handler for F
where
    F: Fn(&Request, &Params) -> Dispatch + Send + Sync,
{
    fn call(&self, req: &Request, params: &Params) -> Dispatch {
        self(req, params)
    }
}

/// What a handler did with a request.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// The handler produced a response; it is returned unmodified.
    Handled(HandlerResponse),
    /// Not handled here; routing continues with the next candidate.
    Cascade,
}

/// Response produced by a handler.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// Response headers (stack-allocated for ≤16 headers)
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with a content-type header.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Header lookup, case-insensitive.
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Turns matched routes into handler calls.
///
/// Identifier derivation is cached per controller name in a [`DashMap`],
/// populated lazily from request threads.
pub struct Dispatcher {
    registry: Arc<dyn HandlerRegistry>,
    default_action: String,
    controller_ids: DashMap<String, Arc<str>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("default_action", &self.default_action)
            .field("cached_ids", &self.controller_ids.len())
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<dyn HandlerRegistry>, default_action: impl Into<String>) -> Self {
        Self {
            registry,
            default_action: default_action.into(),
            controller_ids: DashMap::new(),
        }
    }

    pub fn default_action(&self) -> &str {
        &self.default_action
    }

    /// Canonicalize dispatch parameters in place: underscore the controller
    /// name and fill in the default action.
    pub fn prepare_params(&self, route: &Route, params: &mut Params) {
        if *route.endpoint() != Endpoint::Controller {
            return;
        }
        if let Some(controller) = params.get_mut(CONTROLLER_KEY) {
            *controller = underscore(controller);
        }
        params
            .entry(ACTION_KEY.to_string())
            .or_insert_with(|| self.default_action.clone());
    }

    /// Registry identifier for a controller name, e.g. `admin/photos` ->
    /// `Admin::PhotosController`.
    pub fn handler_id(&self, controller: &str) -> Arc<str> {
        if let Some(id) = self.controller_ids.get(controller) {
            return Arc::clone(id.value());
        }
        let id: Arc<str> = Arc::from(format!("{}Controller", camelize(controller)));
        self.controller_ids
            .entry(controller.to_string())
            .or_insert_with(|| Arc::clone(&id));
        id
    }

    /// Resolve the handler for a matched route.
    ///
    /// `Ok(None)` means cascade.
    ///
    /// # Errors
    ///
    /// [`RoutingError::MissingHandler`] when the target was fixed at draw time
    /// and the registry does not know it.
    pub fn resolve(
        &self,
        route: &Route,
        params: &Params,
        path: &str,
    ) -> Result<Option<(Arc<str>, Arc<dyn Handler>)>, RoutingError> {
        let (id, literal) = match route.endpoint() {
            Endpoint::Handler(id) => (Arc::from(id.as_str()), true),
            Endpoint::Controller => match params.get(CONTROLLER_KEY) {
                Some(controller) => (self.handler_id(controller), route.has_literal_controller()),
                None => {
                    debug!(route_index = route.index(), "Route has no controller, cascading");
                    return Ok(None);
                }
            },
        };

        match self.registry.resolve(&id) {
            Some(handler) => Ok(Some((id, handler))),
            None if literal => {
                warn!(
                    handler = %id,
                    path = %path,
                    route_index = route.index(),
                    "Route references a missing handler"
                );
                Err(RoutingError::MissingHandler {
                    path: path.to_string(),
                    handler: id.to_string(),
                })
            }
            None => {
                debug!(
                    handler = %id,
                    path = %path,
                    route_index = route.index(),
                    "Handler not found, cascading"
                );
                Ok(None)
            }
        }
    }

    /// Invoke the handler of a recognized route with the merged params.
    pub fn serve(&self, matched: &MatchResult, req: &Request) -> Dispatch {
        matched.handler.call(req, &matched.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::StaticRegistry;
    use crate::pattern::Constraints;
    use crate::route::Conditions;
    use crate::table::RouteTable;

    fn ok(_req: &Request, _params: &Params) -> Dispatch {
        Dispatch::Handled(HandlerResponse::json(200, serde_json::json!({})))
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = StaticRegistry::new();
        registry.register("PhotosController", ok);
        registry.register("health", ok);
        Dispatcher::new(Arc::new(registry), "index")
    }

    fn route(path: &str, endpoint: Endpoint, defaults: &[(&str, &str)]) -> Arc<Route> {
        let mut table = RouteTable::new();
        table
            .add_route(
                endpoint,
                Conditions::new(path),
                &Constraints::new(),
                defaults.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                None,
                true,
            )
            .unwrap()
    }

    #[test]
    fn test_handler_id_is_cached() {
        let d = dispatcher();
        assert_eq!(d.handler_id("admin/user_photos").as_ref(), "Admin::UserPhotosController");
        assert_eq!(d.handler_id("admin/user_photos").as_ref(), "Admin::UserPhotosController");
        assert_eq!(d.controller_ids.len(), 1);
    }

    #[test]
    fn test_prepare_params_defaults_action() {
        let d = dispatcher();
        let r = route("/:controller", Endpoint::Controller, &[]);
        let mut params = Params::new();
        params.insert("controller".into(), "UserPhotos".into());
        d.prepare_params(&r, &mut params);
        assert_eq!(params["controller"], "user_photos");
        assert_eq!(params["action"], "index");
    }

    #[test]
    fn test_dynamic_controller_miss_cascades() {
        let d = dispatcher();
        let r = route("/:controller", Endpoint::Controller, &[]);
        let mut params = Params::new();
        params.insert("controller".into(), "videos".into());
        assert!(d.resolve(&r, &params, "/videos").unwrap().is_none());
    }

    #[test]
    fn test_literal_controller_miss_is_error() {
        let d = dispatcher();
        let r = route("/videos", Endpoint::Controller, &[("controller", "videos")]);
        let params = r.defaults().clone();
        let err = d.resolve(&r, &params, "/videos").err().unwrap();
        assert_eq!(
            err,
            RoutingError::MissingHandler {
                path: "/videos".into(),
                handler: "VideosController".into()
            }
        );
    }

    #[test]
    fn test_fixed_handler_resolution() {
        let d = dispatcher();
        let r = route("/up", Endpoint::Handler("health".into()), &[]);
        let (id, _) = d.resolve(&r, &Params::new(), "/up").unwrap().unwrap();
        assert_eq!(id.as_ref(), "health");

        let r = route("/down", Endpoint::Handler("nope".into()), &[]);
        assert!(d.resolve(&r, &Params::new(), "/down").is_err());
    }

    #[test]
    fn test_response_headers() {
        let mut resp = HandlerResponse::error(404, "missing");
        assert_eq!(resp.get_header("Content-Type"), Some("application/json"));
        resp.set_header("X-Cascade", "pass".to_string());
        assert_eq!(resp.get_header("x-cascade"), Some("pass"));
        assert_eq!(resp.body["error"], "missing");
    }
}
