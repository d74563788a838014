//! # CLI Module
//!
//! Command-line inspection of a routes file.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! List routes in priority order:
//!
//! ```bash
//! routeset routes --file routes.yaml
//! ```
//!
//! ### `recognize`
//!
//! Show which route a request would reach and the parameters it extracts:
//!
//! ```bash
//! routeset recognize --file routes.yaml GET /photos/42
//! ```
//!
//! ### `generate`
//!
//! Generate a path or URL from parameters:
//!
//! ```bash
//! routeset generate --file routes.yaml controller=photos action=show id=7
//! routeset generate --file routes.yaml --name photo --host example.com id=7
//! ```
//!
//! Handlers are not invoked; every handler identifier resolves, so
//! `recognize` reports the first route whose path and verb fit.

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
