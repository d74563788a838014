use crate::config::{load_routes, RouterConfig};
use crate::dispatcher::{Dispatch, Handler, HandlerRegistry, HandlerResponse};
use crate::generator::UrlOptions;
use crate::route_set::RouteSet;
use crate::Params;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line interface for routeset
#[derive(Parser)]
#[command(name = "routeset")]
#[command(about = "Inspect, recognize and generate against a routes file", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List routes in priority order
    Routes {
        /// Routes file (YAML, or JSON by extension)
        #[arg(short, long, env = "ROUTESET_ROUTES_FILE")]
        file: PathBuf,
    },
    /// Show the route and parameters a request resolves to
    Recognize {
        #[arg(short, long, env = "ROUTESET_ROUTES_FILE")]
        file: PathBuf,

        /// HTTP method
        method: String,

        /// Request path, optionally with a query string
        path: String,
    },
    /// Generate a path or URL from key=value parameters
    Generate {
        #[arg(short, long, env = "ROUTESET_ROUTES_FILE")]
        file: PathBuf,

        /// Named route to generate from
        #[arg(short, long)]
        name: Option<String>,

        /// Host for a full URL; only the path is printed without it
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        protocol: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// Parameters of the current request, as key=value
        #[arg(long = "recall", value_parser = parse_pair)]
        recall: Vec<(String, String)>,

        /// Parameters, as key=value
        #[arg(value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

/// Resolves every identifier to a handler that reports the parameters.
struct InspectRegistry;

impl HandlerRegistry for InspectRegistry {
    fn resolve(&self, _id: &str) -> Option<Arc<dyn Handler>> {
        Some(Arc::new(|_req: &crate::request::Request, params: &Params| {
            Dispatch::Handled(HandlerResponse::json(200, serde_json::json!(params)))
        }))
    }
}

fn load_set(file: &Path) -> Result<RouteSet> {
    let routes = load_routes(file)?;
    let set = RouteSet::with_config(Arc::new(InspectRegistry), RouterConfig::from_env());
    set.draw_decls(routes.routes)
        .with_context(|| format!("Failed to draw routes from {}", file.display()))?;
    Ok(set)
}

/// Run a parsed command, writing its output to `out`.
///
/// # Errors
///
/// Routes file, recognition and generation failures.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Commands::Routes { file } => {
            let set = load_set(file)?;
            for route in set.routes() {
                writeln!(out, "{route}")?;
            }
            Ok(())
        }
        Commands::Recognize { file, method, path } => {
            let set = load_set(file)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method '{method}'"))?;
            let path = path.split('?').next().unwrap_or_default();
            let matched = set.recognize(&method, path)?;
            let report = serde_json::json!({
                "route": matched.route.path(),
                "name": matched.name(),
                "verbs": matched.verbs().to_string(),
                "handler": &*matched.handler_id,
                "params": matched.params,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            Ok(())
        }
        Commands::Generate {
            file,
            name,
            host,
            protocol,
            port,
            recall,
            params,
        } => {
            let set = load_set(file)?;
            let opts = UrlOptions {
                route_name: name.clone(),
                params: params.iter().cloned().collect(),
                recall: recall.iter().cloned().collect(),
                host: host.clone(),
                protocol: protocol.clone(),
                port: *port,
                only_path: Some(host.is_none()),
                ..UrlOptions::default()
            };
            writeln!(out, "{}", set.url_for(&opts)?)?;
            Ok(())
        }
    }
}

/// Parse the process arguments and run the command against stdout.
///
/// # Errors
///
/// As for [`execute`].
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}
