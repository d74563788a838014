//! Route declarations.
//!
//! [`RouteDecl`] is the output shape of a routing DSL: one route's path,
//! verbs, target, constraints, defaults and name. It deserializes from route
//! files (see [`config`](crate::config)) and doubles as a builder in code.
//! [`Mapper`] feeds declarations into a [`RouteTable`].
//!
//! ```rust
//! use routeset::mapper::{Mapper, RouteDecl};
//! use routeset::table::RouteTable;
//!
//! let mut table = RouteTable::new();
//! let mut map = Mapper::new(&mut table);
//! map.add(RouteDecl::get("/photos/:id").to("photos#show").name("photo")).unwrap();
//! map.post("/photos", "photos#create").unwrap();
//! assert_eq!(table.len(), 2);
//! ```

use crate::error::DrawError;
use crate::pattern::Constraints;
use crate::route::{Conditions, Endpoint, Route, VerbSet, ACTION_KEY, CONTROLLER_KEY};
use crate::table::RouteTable;
use crate::Params;
use http::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_anchor() -> bool {
    true
}

/// One declared route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecl {
    pub path: String,
    /// Accepted verbs; empty accepts any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub via: Vec<String>,
    /// `controller#action`, filling the `controller` and `action` defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Fixed handler identifier, instead of controller dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub defaults: Params,
    #[serde(default, alias = "as", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `false` lets the path match as a prefix.
    #[serde(default = "default_anchor")]
    pub anchor: bool,
}

impl RouteDecl {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            via: Vec::new(),
            to: None,
            handler: None,
            constraints: Constraints::new(),
            defaults: Params::new(),
            name: None,
            anchor: true,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path).via(Method::GET)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path).via(Method::POST)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(path).via(Method::PUT)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(path).via(Method::PATCH)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path).via(Method::DELETE)
    }

    #[must_use]
    pub fn via(mut self, method: Method) -> Self {
        self.via.push(method.as_str().to_string());
        self
    }

    #[must_use]
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.to = Some(target.into());
        self
    }

    #[must_use]
    pub fn handler(mut self, id: impl Into<String>) -> Self {
        self.handler = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn constraint(mut self, key: impl Into<String>, regex: impl Into<String>) -> Self {
        self.constraints.insert(key.into(), regex.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn unanchored(mut self) -> Self {
        self.anchor = false;
        self
    }

    fn verbs(&self) -> Result<VerbSet, DrawError> {
        self.via
            .iter()
            .map(|v| {
                let upper = v.to_ascii_uppercase();
                if upper == "ANY" || upper == "ALL" {
                    return Ok(None);
                }
                Method::from_bytes(upper.as_bytes())
                    .map(Some)
                    .map_err(|_| DrawError::InvalidVerb(v.clone()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|verbs| {
                if verbs.iter().any(Option::is_none) {
                    VerbSet::any()
                } else {
                    verbs.into_iter().flatten().collect()
                }
            })
    }

    fn endpoint(&self, defaults: &mut Params) -> Result<Endpoint, DrawError> {
        if let Some(target) = &self.to {
            let (controller, action) = target
                .split_once('#')
                .filter(|(c, a)| !c.is_empty() && !a.is_empty())
                .ok_or_else(|| DrawError::InvalidTarget(target.clone()))?;
            defaults.insert(CONTROLLER_KEY.to_string(), controller.to_string());
            defaults.insert(ACTION_KEY.to_string(), action.to_string());
        }
        Ok(match &self.handler {
            Some(id) => Endpoint::Handler(id.clone()),
            None => Endpoint::Controller,
        })
    }
}

/// Feeds declarations into a table.
pub struct Mapper<'a> {
    table: &'a mut RouteTable,
}

impl<'a> Mapper<'a> {
    pub fn new(table: &'a mut RouteTable) -> Self {
        Self { table }
    }

    /// Add one declared route.
    ///
    /// # Errors
    ///
    /// Any [`DrawError`]; the table is unchanged on error.
    pub fn add(&mut self, decl: RouteDecl) -> Result<Arc<Route>, DrawError> {
        let verbs = decl.verbs()?;
        let mut defaults = decl.defaults.clone();
        let endpoint = decl.endpoint(&mut defaults)?;
        self.table.add_route(
            endpoint,
            Conditions::new(decl.path).with_verbs(verbs),
            &decl.constraints,
            defaults,
            decl.name.as_deref(),
            decl.anchor,
        )
    }

    /// Add declarations in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// The first [`DrawError`]; routes before it stay added.
    pub fn add_all(&mut self, decls: impl IntoIterator<Item = RouteDecl>) -> Result<usize, DrawError> {
        let mut added = 0;
        for decl in decls {
            self.add(decl)?;
            added += 1;
        }
        Ok(added)
    }

    /// `GET path` to `controller#action`.
    pub fn get(&mut self, path: &str, to: &str) -> Result<Arc<Route>, DrawError> {
        self.add(RouteDecl::get(path).to(to))
    }

    pub fn post(&mut self, path: &str, to: &str) -> Result<Arc<Route>, DrawError> {
        self.add(RouteDecl::post(path).to(to))
    }

    pub fn put(&mut self, path: &str, to: &str) -> Result<Arc<Route>, DrawError> {
        self.add(RouteDecl::put(path).to(to))
    }

    pub fn patch(&mut self, path: &str, to: &str) -> Result<Arc<Route>, DrawError> {
        self.add(RouteDecl::patch(path).to(to))
    }

    pub fn delete(&mut self, path: &str, to: &str) -> Result<Arc<Route>, DrawError> {
        self.add(RouteDecl::delete(path).to(to))
    }

    /// `GET /` to `controller#action`, named `root`.
    pub fn root(&mut self, to: &str) -> Result<Arc<Route>, DrawError> {
        self.add(RouteDecl::get("/").to(to).name("root"))
    }

    pub fn table(&self) -> &RouteTable {
        &*self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fills_defaults() {
        let mut table = RouteTable::new();
        let route = Mapper::new(&mut table).get("/photos/:id", "photos#show").unwrap();
        assert_eq!(route.defaults()["controller"], "photos");
        assert_eq!(route.defaults()["action"], "show");
        assert!(route.verbs().lists(&Method::GET));
        assert_eq!(*route.endpoint(), Endpoint::Controller);
    }

    #[test]
    fn test_invalid_target() {
        let mut table = RouteTable::new();
        let err = Mapper::new(&mut table).get("/photos", "photos").unwrap_err();
        assert!(matches!(err, DrawError::InvalidTarget(_)));
    }

    #[test]
    fn test_verbs_parsed() {
        let decl = RouteDecl::new("/x");
        let decl = RouteDecl { via: vec!["get".into(), "Post".into()], ..decl };
        assert_eq!(decl.verbs().unwrap().to_string(), "GET|POST");

        let decl = RouteDecl { via: vec!["any".into()], ..RouteDecl::new("/x") };
        assert!(decl.verbs().unwrap().is_any());

        let decl = RouteDecl { via: vec!["GE T".into()], ..RouteDecl::new("/x") };
        assert!(matches!(decl.verbs(), Err(DrawError::InvalidVerb(_))));
    }

    #[test]
    fn test_handler_endpoint() {
        let mut table = RouteTable::new();
        let route = Mapper::new(&mut table)
            .add(RouteDecl::get("/up").handler("health").name("health"))
            .unwrap();
        assert_eq!(*route.endpoint(), Endpoint::Handler("health".into()));
        assert!(!route.has_literal_controller());
    }

    #[test]
    fn test_deserialize_yaml() {
        let yaml = r#"
path: /photos/:id
via: [GET]
to: photos#show
as: photo
constraints:
  id: '\d+'
"#;
        let decl: RouteDecl = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(decl.name.as_deref(), Some("photo"));
        assert!(decl.anchor);
        assert_eq!(decl.constraints["id"], r"\d+");
    }
}
