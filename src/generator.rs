//! # URL Generation
//!
//! Option normalization in front of the [`formatter`](crate::formatter), and
//! rendering of full URLs with query strings.
//!
//! ## Controller / Action / Id Recall
//!
//! When generating from inside a request, the current `controller`, `action`
//! and `id` are reused only while they stay the same:
//!
//! | Current | Options | Result |
//! |---|---|---|
//! | `photos#show` id 3 | `{action: edit}` | `photos#edit`, id not recalled |
//! | `photos#show` id 3 | `{id: 4}` | `photos#show` id 4 |
//! | `photos#show` | `{controller: users}` | `users#index` |
//! | `admin/photos#show` | `{controller: users}` | `admin/users#index` |
//! | `admin/photos#show` | `{controller: /users}` | `users#index` |
//!
//! ## Example
//!
//! ```rust
//! use routeset::generator::query_string;
//! use routeset::params;
//!
//! let q = query_string(&params! { "page" => 2, "q" => "red shoes" });
//! assert_eq!(q, "page=2&q=red%20shoes");
//! ```

use crate::error::{UrlError, UrlGenerationError};
use crate::formatter;
use crate::route::{Route, ACTION_KEY, CONTROLLER_KEY};
use crate::table::RouteTable;
use crate::Params;
use std::sync::Arc;

const ID_KEY: &str = "id";

/// String form of a value used as a path parameter.
pub trait ToParam {
    fn to_param(&self) -> String;
}

impl ToParam for str {
    fn to_param(&self) -> String {
        self.to_string()
    }
}

impl ToParam for String {
    fn to_param(&self) -> String {
        self.clone()
    }
}

impl ToParam for bool {
    fn to_param(&self) -> String {
        self.to_string()
    }
}

impl ToParam for char {
    fn to_param(&self) -> String {
        self.to_string()
    }
}

macro_rules! impl_to_param_for_ints {
    ($($t:ty),*) => {
        $(impl ToParam for $t {
            fn to_param(&self) -> String {
                self.to_string()
            }
        })*
    };
}

impl_to_param_for_ints!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Slices join with `/`, which suits glob segments.
impl<T: ToParam> ToParam for [T] {
    fn to_param(&self) -> String {
        self.iter()
            .map(ToParam::to_param)
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl<T: ToParam> ToParam for Vec<T> {
    fn to_param(&self) -> String {
        self.as_slice().to_param()
    }
}

impl<T: ToParam + ?Sized> ToParam for &T {
    fn to_param(&self) -> String {
        (**self).to_param()
    }
}

/// Options after controller/action/id recall rules are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub options: Params,
    pub recall: Params,
}

/// Apply the recall rules for `controller`, `action` and `id`.
///
/// `name` is the route name asked for and `named` the route it resolved to.
/// With a resolved route, only keys that are segments of that route are taken
/// from the recall. Relative controllers apply only when no name was given.
pub fn normalize(
    name: Option<&str>,
    named: Option<&Route>,
    options: &Params,
    recall: &Params,
    default_action: &str,
) -> Normalized {
    let mut options = options.clone();
    let mut recall = recall.clone();

    if recall.contains_key(CONTROLLER_KEY) {
        recall
            .entry(ACTION_KEY.to_string())
            .or_insert_with(|| default_action.to_string());
    }

    if options.get(CONTROLLER_KEY).is_some_and(|c| !c.is_empty()) {
        options
            .entry(ACTION_KEY.to_string())
            .or_insert_with(|| default_action.to_string());
    }
    if let Some(action) = options.get_mut(ACTION_KEY) {
        if action.is_empty() {
            *action = default_action.to_string();
        }
    }

    let mut use_recall_for = |key: &str| -> bool {
        let Some(recalled) = recall.get(key) else {
            return false;
        };
        if options.get(key).is_some_and(|v| v != recalled) {
            return false;
        }
        if named.is_some_and(|route| !route.pattern().has_name(key)) {
            return false;
        }
        if let Some(value) = recall.remove(key) {
            options.insert(key.to_string(), value);
        }
        true
    };
    let _ = use_recall_for(CONTROLLER_KEY)
        && use_recall_for(ACTION_KEY)
        && use_recall_for(ID_KEY);

    // relative controller: "users" from within "admin/photos" is "admin/users"
    if name.is_none() {
        if let (Some(controller), Some(current)) =
            (options.get(CONTROLLER_KEY), recall.get(CONTROLLER_KEY))
        {
            if controller != current && !controller.starts_with('/') {
                let old: Vec<&str> = current.split('/').collect();
                let depth = controller.matches('/').count() + 1;
                let keep = old.len().saturating_sub(depth);
                let mut parts: Vec<&str> = old[..keep].to_vec();
                parts.push(controller);
                let relative = parts.join("/");
                options.insert(CONTROLLER_KEY.to_string(), relative);
            }
        }
    }

    if let Some(controller) = options.get_mut(CONTROLLER_KEY) {
        if let Some(stripped) = controller.strip_prefix('/') {
            *controller = stripped.to_string();
        }
    }

    if options.get(ACTION_KEY).map(String::as_str) == Some(default_action) {
        if let Some(action) = options.remove(ACTION_KEY) {
            recall.insert(ACTION_KEY.to_string(), action);
        }
    }

    Normalized { options, recall }
}

/// Normalize, then generate.
///
/// # Errors
///
/// [`UrlGenerationError`] as raised by [`formatter::generate`].
pub fn generate(
    table: &RouteTable,
    name: Option<&str>,
    options: &Params,
    recall: &Params,
    default_action: &str,
) -> Result<(String, Params), UrlGenerationError> {
    let named: Option<&Arc<Route>> = name.and_then(|n| table.named(n));
    let normalized = normalize(name, named.map(Arc::as_ref), options, recall, default_action);
    formatter::generate(table, name, &normalized.options, &normalized.recall)
}

/// Inputs to [`url_for`](crate::route_set::RouteSet::url_for).
///
/// Unset fields fall back to the route set's default URL options; see
/// [`merged_over`](Self::merged_over).
#[derive(Debug, Clone, Default)]
pub struct UrlOptions {
    /// Named route to generate from; `None` searches all routes.
    pub route_name: Option<String>,
    /// Path parameters (controller, action, segments, extra keys).
    pub params: Params,
    /// Parameters of the current request.
    pub recall: Params,
    /// Extra query parameters, merged over the leftovers.
    pub query: Params,
    pub host: Option<String>,
    /// `http` when unset.
    pub protocol: Option<String>,
    pub port: Option<u16>,
    /// Render only the path, no scheme or host.
    pub only_path: Option<bool>,
    /// Fragment, appended after `#`.
    pub anchor: Option<String>,
    pub trailing_slash: Option<bool>,
    /// Mount point prefixed to the generated path.
    pub script_name: Option<String>,
    /// Userinfo for a full URL; used only when both are set.
    pub user: Option<String>,
    pub password: Option<String>,
}

impl UrlOptions {
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn named(name: impl Into<String>, params: Params) -> Self {
        Self {
            route_name: Some(name.into()),
            params,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn recall(mut self, recall: Params) -> Self {
        self.recall = recall;
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn only_path(mut self) -> Self {
        self.only_path = Some(true);
        self
    }

    /// Render a full URL even if the defaults say path only.
    #[must_use]
    pub fn full_url(mut self) -> Self {
        self.only_path = Some(false);
        self
    }

    #[must_use]
    pub fn anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    #[must_use]
    pub fn trailing_slash(mut self) -> Self {
        self.trailing_slash = Some(true);
        self
    }

    #[must_use]
    pub fn script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = Some(script_name.into());
        self
    }

    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToParam) -> Self {
        self.query.insert(key.into(), value.to_param());
        self
    }

    /// Merge a whole map into the query parameters.
    #[must_use]
    pub fn query_params(mut self, params: Params) -> Self {
        self.query.extend(params);
        self
    }

    /// These options with every unset field taken from `defaults`. Map
    /// fields are merged, with entries from `self` winning.
    #[must_use]
    pub fn merged_over(&self, defaults: &UrlOptions) -> UrlOptions {
        fn merge(under: &Params, over: &Params) -> Params {
            let mut merged = under.clone();
            merged.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        }
        UrlOptions {
            route_name: self.route_name.clone().or_else(|| defaults.route_name.clone()),
            params: merge(&defaults.params, &self.params),
            recall: merge(&defaults.recall, &self.recall),
            query: merge(&defaults.query, &self.query),
            host: self.host.clone().or_else(|| defaults.host.clone()),
            protocol: self.protocol.clone().or_else(|| defaults.protocol.clone()),
            port: self.port.or(defaults.port),
            only_path: self.only_path.or(defaults.only_path),
            anchor: self.anchor.clone().or_else(|| defaults.anchor.clone()),
            trailing_slash: self.trailing_slash.or(defaults.trailing_slash),
            script_name: self.script_name.clone().or_else(|| defaults.script_name.clone()),
            user: self.user.clone().or_else(|| defaults.user.clone()),
            password: self.password.clone().or_else(|| defaults.password.clone()),
        }
    }
}

/// Assign positional arguments to the segments of `route`, in declaration
/// order.
///
/// Keys present in `options` take precedence over the next argument. When
/// fewer arguments are given than the route has segments (allowing for an
/// optional format), keys already in `known` are skipped so the arguments
/// line up with the remaining segments. `options` is merged over the result.
pub fn positional_params(
    route: &Route,
    args: &[&dyn ToParam],
    options: &Params,
    known: &Params,
) -> Params {
    let mut result = Params::new();
    if !args.is_empty() {
        let mut keys: Vec<&str> = route.pattern().names().collect();
        if args.len() + 1 < keys.len() {
            keys.retain(|key| !known.contains_key(*key));
        }
        let mut args = args.iter();
        for key in keys {
            let value = options
                .get(key)
                .cloned()
                .or_else(|| args.next().map(|arg| arg.to_param()));
            if let Some(value) = value {
                result.insert(key.to_string(), value);
            }
        }
    }
    result.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));
    result
}

/// Render a path or full URL.
///
/// # Errors
///
/// [`UrlError::Generation`] if no route fits, [`UrlError::MissingHost`] for a
/// full URL without a host.
pub fn url_for(
    table: &RouteTable,
    opts: &UrlOptions,
    default_action: &str,
) -> Result<String, UrlError> {
    let (generated, mut leftover) = generate(
        table,
        opts.route_name.as_deref(),
        &opts.params,
        &opts.recall,
        default_action,
    )?;
    leftover.extend(opts.query.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut path = opts
        .script_name
        .as_deref()
        .map(|script| script.trim_end_matches('/').to_string())
        .unwrap_or_default();
    path.push_str(&generated);
    if opts.trailing_slash.unwrap_or(false) && !path.ends_with('/') && !path.contains('.') {
        path.push('/');
    }
    let query = query_string(&leftover);
    if !query.is_empty() {
        path.push('?');
        path.push_str(&query);
    }
    if let Some(anchor) = &opts.anchor {
        path.push('#');
        path.push_str(&urlencoding::encode(anchor));
    }

    if opts.only_path.unwrap_or(false) {
        return Ok(path);
    }
    let host = opts.host.as_deref().ok_or(UrlError::MissingHost)?;
    let protocol = opts
        .protocol
        .as_deref()
        .map(|p| p.trim_end_matches("://").trim_end_matches(':'))
        .unwrap_or("http");
    let port = match (opts.port, protocol) {
        (Some(80), "http") | (Some(443), "https") | (None, _) => String::new(),
        (Some(port), _) => format!(":{port}"),
    };
    let userinfo = match (&opts.user, &opts.password) {
        (Some(user), Some(password)) => format!(
            "{}:{}@",
            urlencoding::encode(user),
            urlencoding::encode(password)
        ),
        _ => String::new(),
    };
    Ok(format!("{protocol}://{userinfo}{host}{port}{path}"))
}

/// `k=v` pairs joined with `&`, keys sorted, both sides percent-encoded.
#[must_use]
pub fn query_string(params: &Params) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    #[test]
    fn test_to_param() {
        assert_eq!(42u32.to_param(), "42");
        assert_eq!((-1i64).to_param(), "-1");
        assert_eq!("x".to_param(), "x");
        assert_eq!(vec!["a", "b"].to_param(), "a/b");
        assert_eq!(true.to_param(), "true");
    }

    #[test]
    fn test_recall_for_same_controller() {
        let n = normalize(
            None,
            None,
            &params! { "id" => 4 },
            &params! { "controller" => "photos", "action" => "show", "id" => 3 },
            "index",
        );
        assert_eq!(n.options, params! { "controller" => "photos", "action" => "show", "id" => 4 });
    }

    #[test]
    fn test_new_action_stops_id_recall() {
        let n = normalize(
            None,
            None,
            &params! { "action" => "edit" },
            &params! { "controller" => "photos", "action" => "show", "id" => 3 },
            "index",
        );
        assert_eq!(n.options, params! { "controller" => "photos", "action" => "edit" });
        assert_eq!(n.recall.get("id").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_explicit_controller_implies_index() {
        let n = normalize(
            None,
            None,
            &params! { "controller" => "users" },
            &params! { "controller" => "photos", "action" => "show" },
            "index",
        );
        assert_eq!(n.options, params! { "controller" => "users" });
        assert_eq!(n.recall.get("action").map(String::as_str), Some("index"));
    }

    #[test]
    fn test_relative_controller() {
        let n = normalize(
            None,
            None,
            &params! { "controller" => "users" },
            &params! { "controller" => "admin/photos", "action" => "show" },
            "index",
        );
        assert_eq!(n.options["controller"], "admin/users");

        let n = normalize(
            None,
            None,
            &params! { "controller" => "/users" },
            &params! { "controller" => "admin/photos" },
            "index",
        );
        assert_eq!(n.options["controller"], "users");
    }

    #[test]
    fn test_named_route_keeps_relative_controller_off() {
        let n = normalize(
            Some("users"),
            None,
            &params! { "controller" => "users" },
            &params! { "controller" => "admin/photos" },
            "index",
        );
        assert_eq!(n.options["controller"], "users");
    }

    fn user_photo() -> Arc<Route> {
        use crate::mapper::{Mapper, RouteDecl};
        let mut table = RouteTable::new();
        Mapper::new(&mut table)
            .add(RouteDecl::get("/users/:user_id/photos/:id(.:format)").to("photos#show"))
            .unwrap()
    }

    #[test]
    fn test_positional_args_fill_segments_in_order() {
        let route = user_photo();
        let result = positional_params(&route, &[&1, &9], &Params::new(), &Params::new());
        assert_eq!(result, params! { "user_id" => 1, "id" => 9 });

        let result = positional_params(&route, &[&1, &9, &"json"], &params! { "page" => 2 }, &Params::new());
        assert_eq!(result, params! { "user_id" => 1, "id" => 9, "format" => "json", "page" => 2 });
    }

    #[test]
    fn test_positional_args_skip_known_keys() {
        let route = user_photo();
        let result = positional_params(&route, &[&9], &Params::new(), &params! { "user_id" => 1 });
        assert_eq!(result, params! { "id" => 9 });

        // an explicit option takes the slot without using up an argument
        let result = positional_params(&route, &[&9, &"json"], &params! { "user_id" => 4 }, &Params::new());
        assert_eq!(result, params! { "user_id" => 4, "id" => 9, "format" => "json" });
    }

    #[test]
    fn test_merged_over_defaults() {
        let defaults = UrlOptions::new(params! { "locale" => "en" })
            .host("example.com")
            .only_path()
            .query("ref", "nav");
        let merged = UrlOptions::named("photo", params! { "id" => 3, "locale" => "fr" })
            .full_url()
            .merged_over(&defaults);
        assert_eq!(merged.route_name.as_deref(), Some("photo"));
        assert_eq!(merged.params, params! { "id" => 3, "locale" => "fr" });
        assert_eq!(merged.host.as_deref(), Some("example.com"));
        assert_eq!(merged.only_path, Some(false));
        assert_eq!(merged.query, params! { "ref" => "nav" });
    }

    #[test]
    fn test_query_string_sorted_and_escaped() {
        let q = query_string(&params! { "z" => "1", "a b" => "c&d" });
        assert_eq!(q, "a%20b=c%26d&z=1");
        assert_eq!(query_string(&Params::new()), "");
    }
}
