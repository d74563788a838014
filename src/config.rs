//! # Configuration
//!
//! Router behavior from environment variables, and route declarations from
//! YAML or JSON files.
//!
//! ## Environment Variables
//!
//! ### `ROUTESET_DEFAULT_ACTION`
//!
//! Action used when a controller route supplies none. Default: `index`.
//!
//! ### `ROUTESET_HEAD_FALLBACK`
//!
//! Retry unmatched HEAD requests against GET routes. Default: `true`.
//!
//! ## Routes File
//!
//! ```yaml
//! routes:
//!   - path: /photos(.:format)
//!     via: [GET]
//!     to: photos#index
//!     as: photos
//!   - path: /photos/:id(.:format)
//!     via: [GET]
//!     to: photos#show
//!     as: photo
//!     constraints:
//!       id: '\d+'
//!   - path: /up
//!     handler: health
//! ```
//!
//! Files ending in `.json` are read as JSON, everything else as YAML.

use crate::logging::env_flag;
use crate::mapper::RouteDecl;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Router behavior switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Action assumed when a controller route supplies none.
    pub default_action: String,
    /// Retry an unmatched HEAD request against GET routes.
    pub head_fallback: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_action: "index".to_string(),
            head_fallback: true,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_action: env::var("ROUTESET_DEFAULT_ACTION")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.default_action),
            head_fallback: env_flag("ROUTESET_HEAD_FALLBACK").unwrap_or(defaults.head_fallback),
        }
    }
}

/// Contents of a routes file, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutesFile {
    #[serde(default)]
    pub routes: Vec<RouteDecl>,
}

impl RoutesFile {
    /// Parse `text` as JSON when `json` is set, else as YAML.
    ///
    /// # Errors
    ///
    /// Returns the parser error with context.
    pub fn parse(text: &str, json: bool) -> Result<Self> {
        if json {
            serde_json::from_str(text).context("Failed to parse routes JSON")
        } else {
            serde_yaml::from_str(text).context("Failed to parse routes YAML")
        }
    }
}

/// Read and parse a routes file.
///
/// # Errors
///
/// I/O and parse failures, with the file path in the context.
pub fn load_routes<P: AsRef<Path>>(path: P) -> Result<RoutesFile> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read routes file {}", path.display()))?;
    let json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    RoutesFile::parse(&text, json).with_context(|| format!("Invalid routes file {}", path.display()))
}
