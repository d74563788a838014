//! # Route Set
//!
//! Owner of the published [`RouteTable`] and entry point for recognition,
//! dispatch and URL generation.
//!
//! ## Draw Lifecycle
//!
//! ```text
//! draw(block)  = fresh table + prepend hooks + block + append hooks + finalize
//! clear()      = fresh table + prepend hooks            (not finalized)
//! finalize()   = current table + append hooks + graph   (once per clear)
//! ```
//!
//! Prepend and append hooks are stored closures replayed on every cycle, so
//! routes such as a catch-all fallback never need to be re-declared.
//!
//! With [`set_disable_clear_and_finalize`](RouteSet::set_disable_clear_and_finalize)
//! a draw instead adds its routes to the current table, so several blocks or
//! route files accumulate between an explicit `clear()` and `finalize()`.
//!
//! ## Concurrency
//!
//! Tables are built off to the side and published with a single
//! [`ArcSwap::store`]. A request loads the current table once and works on
//! that snapshot, so concurrent recognition during a redraw sees either the
//! complete old table or the complete new one. Draws are serialized by a
//! mutex; a failed draw publishes nothing.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use routeset::dispatcher::{Dispatch, HandlerResponse, StaticRegistry};
//! use routeset::request::Request;
//! use routeset::route_set::RouteSet;
//! use routeset::{params, Params};
//! use std::sync::Arc;
//!
//! let mut registry = StaticRegistry::new();
//! registry.register("PhotosController", |_req: &Request, params: &Params| {
//!     Dispatch::Handled(HandlerResponse::json(200, serde_json::json!(params)))
//! });
//!
//! let routes = RouteSet::new(Arc::new(registry));
//! routes
//!     .draw(|map| {
//!         map.get("/photos/:id", "photos#show")?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let matched = routes.recognize(&Method::GET, "/photos/42").unwrap();
//! assert_eq!(matched.param("id"), Some("42"));
//! assert_eq!(matched.param("action"), Some("show"));
//!
//! let (path, _) = routes
//!     .generate(None, &params! { "controller" => "photos", "action" => "show", "id" => 7 }, &Params::new())
//!     .unwrap();
//! assert_eq!(path, "/photos/7");
//! ```

use crate::config::RouterConfig;
use crate::dispatcher::{Dispatcher, HandlerRegistry, HandlerResponse};
use crate::error::{DrawError, RoutingError, UrlError, UrlGenerationError};
use crate::generator::{self, ToParam, UrlOptions};
use crate::mapper::{Mapper, RouteDecl};
use crate::recognizer::{MatchResult, Recognizer};
use crate::request::Request;
use crate::route::Route;
use crate::table::RouteTable;
use crate::Params;
use arc_swap::ArcSwap;
use http::Method;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// A stored route block, replayed on every draw.
pub type DrawHook = Arc<dyn Fn(&mut Mapper<'_>) -> Result<(), DrawError> + Send + Sync>;

#[derive(Default, Clone)]
struct Hooks {
    prepend: Vec<DrawHook>,
    append: Vec<DrawHook>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn replay(hooks: &[DrawHook], map: &mut Mapper<'_>) -> Result<(), DrawError> {
    for hook in hooks {
        hook(map)?;
    }
    Ok(())
}

fn build<F>(table: &mut RouteTable, hooks: &Hooks, block: F) -> Result<(), DrawError>
where
    F: FnOnce(&mut Mapper<'_>) -> Result<(), DrawError>,
{
    let mut map = Mapper::new(table);
    replay(&hooks.prepend, &mut map)?;
    block(&mut map)?;
    replay(&hooks.append, &mut map)
}

pub struct RouteSet {
    table: ArcSwap<RouteTable>,
    hooks: Mutex<Hooks>,
    draw_lock: Mutex<()>,
    dispatcher: Dispatcher,
    config: RouterConfig,
    default_url_options: ArcSwap<UrlOptions>,
    disable_clear_and_finalize: AtomicBool,
}

impl fmt::Debug for RouteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.load();
        f.debug_struct("RouteSet")
            .field("routes", &table.len())
            .field("finalized", &table.is_finalized())
            .field("config", &self.config)
            .finish()
    }
}

impl RouteSet {
    /// An empty route set with the default configuration.
    #[must_use]
    pub fn new(registry: Arc<dyn HandlerRegistry>) -> Self {
        Self::with_config(registry, RouterConfig::default())
    }

    #[must_use]
    pub fn with_config(registry: Arc<dyn HandlerRegistry>, config: RouterConfig) -> Self {
        Self {
            table: ArcSwap::from_pointee(RouteTable::new()),
            hooks: Mutex::new(Hooks::default()),
            draw_lock: Mutex::new(()),
            dispatcher: Dispatcher::new(registry, config.default_action.clone()),
            config,
            default_url_options: ArcSwap::from_pointee(UrlOptions::default()),
            disable_clear_and_finalize: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Register a block drawn before every route block.
    ///
    /// Takes effect at the next [`draw`](Self::draw) or [`clear`](Self::clear).
    pub fn prepend<F>(&self, hook: F)
    where
        F: Fn(&mut Mapper<'_>) -> Result<(), DrawError> + Send + Sync + 'static,
    {
        lock(&self.hooks).prepend.push(Arc::new(hook));
    }

    /// Register a block drawn after every route block, at finalize time.
    pub fn append<F>(&self, hook: F)
    where
        F: Fn(&mut Mapper<'_>) -> Result<(), DrawError> + Send + Sync + 'static,
    {
        lock(&self.hooks).append.push(Arc::new(hook));
    }

    fn hooks(&self) -> Hooks {
        lock(&self.hooks).clone()
    }

    /// When `true`, [`draw`](Self::draw) adds to the current table without
    /// clearing it first or finalizing it afterwards.
    pub fn set_disable_clear_and_finalize(&self, disable: bool) {
        self.disable_clear_and_finalize.store(disable, Ordering::SeqCst);
    }

    pub fn disable_clear_and_finalize(&self) -> bool {
        self.disable_clear_and_finalize.load(Ordering::SeqCst)
    }

    /// Options every [`url_for`](Self::url_for) call falls back to.
    pub fn set_default_url_options(&self, defaults: UrlOptions) {
        self.default_url_options.store(Arc::new(defaults));
    }

    pub fn default_url_options(&self) -> Arc<UrlOptions> {
        self.default_url_options.load_full()
    }

    /// Replace all routes with the ones declared by `block`.
    ///
    /// With clear and finalize disabled, `block` is drawn on top of the
    /// current table and no hooks run.
    ///
    /// # Errors
    ///
    /// The first [`DrawError`] raised by a hook or the block. The previously
    /// published table stays in place.
    pub fn draw<F>(&self, block: F) -> Result<(), DrawError>
    where
        F: FnOnce(&mut Mapper<'_>) -> Result<(), DrawError>,
    {
        let _guard = lock(&self.draw_lock);
        if self.disable_clear_and_finalize() {
            let mut table = RouteTable::clone(&self.table.load());
            if let Err(err) = block(&mut Mapper::new(&mut table)) {
                warn!(error = %err, "Route draw failed, keeping previous routes");
                return Err(err);
            }
            if table.is_finalized() {
                table.finalize();
            }
            self.publish(table, "draw");
            return Ok(());
        }

        let hooks = self.hooks();
        let mut table = RouteTable::new();
        if let Err(err) = build(&mut table, &hooks, block) {
            warn!(error = %err, "Route draw failed, keeping previous routes");
            return Err(err);
        }
        table.finalize();
        self.publish(table, "draw");
        Ok(())
    }

    /// [`draw`](Self::draw) from a list of declarations.
    ///
    /// # Errors
    ///
    /// As for [`draw`](Self::draw).
    pub fn draw_decls(&self, decls: Vec<RouteDecl>) -> Result<(), DrawError> {
        self.draw(move |map| map.add_all(decls).map(|_| ()))
    }

    /// Publish a table holding only the prepended routes, not finalized.
    ///
    /// # Errors
    ///
    /// A [`DrawError`] from a prepend hook; nothing is published then.
    pub fn clear(&self) -> Result<(), DrawError> {
        let _guard = lock(&self.draw_lock);
        let hooks = self.hooks();
        let mut table = RouteTable::new();
        replay(&hooks.prepend, &mut Mapper::new(&mut table))?;
        self.publish(table, "clear");
        Ok(())
    }

    /// Replay the append hooks and build the transition graph.
    ///
    /// Returns `Ok(false)` if the current table is already finalized.
    ///
    /// # Errors
    ///
    /// A [`DrawError`] from an append hook; nothing is published then.
    pub fn finalize(&self) -> Result<bool, DrawError> {
        let _guard = lock(&self.draw_lock);
        let current = self.table.load_full();
        if current.is_finalized() {
            debug!("Route set already finalized");
            return Ok(false);
        }
        let hooks = self.hooks();
        let mut table = RouteTable::clone(&current);
        replay(&hooks.append, &mut Mapper::new(&mut table))?;
        table.finalize();
        self.publish(table, "finalize");
        Ok(true)
    }

    fn publish(&self, table: RouteTable, reason: &'static str) {
        info!(
            reason,
            routes_count = table.len(),
            named_count = table.names().len(),
            finalized = table.is_finalized(),
            graph_states = table.graph().map_or(0, |g| g.state_count()),
            "Route table published"
        );
        self.table.store(Arc::new(table));
    }

    /// Snapshot of the published table.
    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Routes in priority order.
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.table.load().iter().cloned().collect()
    }

    pub fn named(&self, name: &str) -> Option<Arc<Route>> {
        self.table.load().named(name).cloned()
    }

    /// Find the route for a request without invoking its handler.
    ///
    /// # Errors
    ///
    /// [`RoutingError`] when nothing matches or a literal handler is missing.
    pub fn recognize(&self, method: &Method, path: &str) -> Result<MatchResult, RoutingError> {
        let table = self.table.load_full();
        Recognizer::new(&table, &self.dispatcher, self.config.head_fallback).recognize(method, path)
    }

    /// [`recognize`](Self::recognize), with `extras` merged over the params
    /// of each candidate before its handler is resolved.
    ///
    /// # Errors
    ///
    /// As for [`recognize`](Self::recognize).
    pub fn recognize_with_extras(
        &self,
        method: &Method,
        path: &str,
        extras: &Params,
    ) -> Result<MatchResult, RoutingError> {
        let table = self.table.load_full();
        Recognizer::new(&table, &self.dispatcher, self.config.head_fallback)
            .with_extras(extras)
            .recognize(method, path)
    }

    /// Route and dispatch a request, returning the handler's response.
    ///
    /// # Errors
    ///
    /// [`RoutingError`] when nothing handles the request.
    pub fn call(&self, req: &Request) -> Result<HandlerResponse, RoutingError> {
        let table = self.table.load_full();
        Recognizer::new(&table, &self.dispatcher, self.config.head_fallback).serve(req)
    }

    /// Generate a path; see [`generator`] for the recall rules.
    ///
    /// # Errors
    ///
    /// [`UrlGenerationError`] listing missing keys.
    pub fn generate(
        &self,
        name: Option<&str>,
        options: &Params,
        recall: &Params,
    ) -> Result<(String, Params), UrlGenerationError> {
        let table = self.table.load();
        generator::generate(&table, name, options, recall, &self.config.default_action)
    }

    /// Path plus the option keys left over for the query string.
    ///
    /// # Errors
    ///
    /// As for [`generate`](Self::generate).
    pub fn generate_extras(
        &self,
        options: &Params,
        recall: &Params,
    ) -> Result<(String, Vec<String>), UrlGenerationError> {
        let (path, leftover) = self.generate(None, options, recall)?;
        Ok((path, leftover.into_keys().collect()))
    }

    /// Option keys that would end up in the query string.
    ///
    /// # Errors
    ///
    /// As for [`generate`](Self::generate).
    pub fn extra_keys(&self, options: &Params, recall: &Params) -> Result<Vec<String>, UrlGenerationError> {
        self.generate_extras(options, recall).map(|(_, keys)| keys)
    }

    /// Render a path or full URL, unset options taken from the
    /// [default URL options](Self::set_default_url_options).
    ///
    /// # Errors
    ///
    /// [`UrlError`] if no route fits or a full URL lacks a host.
    pub fn url_for(&self, opts: &UrlOptions) -> Result<String, UrlError> {
        let table = self.table.load();
        let opts = opts.merged_over(&self.default_url_options.load());
        generator::url_for(&table, &opts, &self.config.default_action)
    }

    /// Full URL for a named route, positional `args` filling its segments
    /// in order. `opts.params` names segments explicitly and adds query keys.
    ///
    /// # Errors
    ///
    /// [`UrlError::UnknownRoute`] for an unknown name, otherwise as for
    /// [`url_for`](Self::url_for).
    pub fn named_url(
        &self,
        name: &str,
        args: &[&dyn ToParam],
        opts: UrlOptions,
    ) -> Result<String, UrlError> {
        let table = self.table.load();
        let route = table
            .named(name)
            .ok_or_else(|| UrlError::UnknownRoute(name.to_string()))?;
        let defaults = self.default_url_options.load();
        let mut known = defaults.params.clone();
        known.extend(route.defaults().iter().map(|(k, v)| (k.clone(), v.clone())));

        let params = generator::positional_params(route, args, &opts.params, &known);
        let opts = UrlOptions {
            route_name: Some(name.to_string()),
            params,
            ..opts
        }
        .merged_over(&defaults);
        generator::url_for(&table, &opts, &self.config.default_action)
    }

    /// Path for a named route; see [`named_url`](Self::named_url).
    ///
    /// # Errors
    ///
    /// As for [`named_url`](Self::named_url).
    pub fn named_path(&self, name: &str, args: &[&dyn ToParam], params: Params) -> Result<String, UrlError> {
        self.named_url(name, args, UrlOptions::new(params).only_path())
    }
}
