//! # Hot Reload
//!
//! Redraws a [`RouteSet`] whenever its routes file changes on disk.
//!
//! ## Reload Process
//!
//! 1. **Detection** - a `notify` watcher reports a modify or create event
//! 2. **Parse** - the file is read with [`load_routes`]
//! 3. **Draw** - the declarations are drawn into a fresh table and published
//! 4. **Callback** - `on_reload` receives the route set and the route count
//!
//! Requests in flight keep the table they loaded; new requests see the new
//! one. A file that fails to parse or draw is logged and the previous routes
//! stay active.
//!
//! ```rust,no_run
//! use routeset::dispatcher::StaticRegistry;
//! use routeset::hot_reload::watch_routes;
//! use routeset::RouteSet;
//! use std::sync::Arc;
//!
//! let routes = Arc::new(RouteSet::new(Arc::new(StaticRegistry::new())));
//! let _watcher = watch_routes("routes.yaml", Arc::clone(&routes), |_set, count| {
//!     println!("reloaded {count} routes");
//! })?;
//! # Ok::<(), notify::Error>(())
//! ```

use crate::config::load_routes;
use crate::route_set::RouteSet;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Load `path` into `routes`, returning the number of routes drawn.
///
/// # Errors
///
/// Read, parse and draw failures. `routes` is untouched on error.
pub fn reload_routes(path: &Path, routes: &RouteSet) -> anyhow::Result<usize> {
    let file = load_routes(path)?;
    routes.draw_decls(file.routes)?;
    Ok(routes.table().len())
}

/// Watch a routes file and redraw `routes` when it changes.
///
/// The returned watcher must be kept alive for as long as reloading should
/// continue.
///
/// # Errors
///
/// Fails if the watcher cannot be created or the path cannot be watched.
pub fn watch_routes<P, F>(
    routes_path: P,
    routes: Arc<RouteSet>,
    mut on_reload: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: FnMut(&RouteSet, usize) + Send + 'static,
{
    let path: PathBuf = routes_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                match reload_routes(&watch_path, &routes) {
                    Ok(count) => {
                        info!(
                            path = %watch_path.display(),
                            routes_count = count,
                            "hot-reload: routes redrawn"
                        );
                        on_reload(&routes, count);
                    }
                    Err(e) => warn!(
                        path = %watch_path.display(),
                        error = %format!("{e:#}"),
                        "hot-reload: keeping previous routes"
                    ),
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::StaticRegistry;
    use std::io::Write;

    #[test]
    fn test_reload_routes_draws_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "routes:\n  - path: /a\n    to: a#index\n  - path: /b\n    to: b#index").unwrap();
        let routes = RouteSet::new(Arc::new(StaticRegistry::new()));
        assert_eq!(reload_routes(file.path(), &routes).unwrap(), 2);
        assert!(routes.table().is_finalized());
    }

    #[test]
    fn test_reload_bad_file_keeps_routes() {
        let routes = RouteSet::new(Arc::new(StaticRegistry::new()));
        routes.draw(|map| map.get("/a", "a#index").map(|_| ())).unwrap();

        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "routes:\n  - path: /x\n    as: '1bad'").unwrap();
        assert!(reload_routes(file.path(), &routes).is_err());
        assert_eq!(routes.table().len(), 1);
        assert_eq!(routes.routes()[0].path(), "/a");
    }
}
