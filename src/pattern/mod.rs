//! # Pattern Module
//!
//! Compiles route path declarations into matchable patterns.
//!
//! ## Grammar
//!
//! | Syntax | Meaning |
//! |---|---|
//! | `photos` | literal text |
//! | `/`, `.` | separators |
//! | `:id` | named segment, by default anything except `/`, `.` and `?` |
//! | `*path` | glob capturing the rest of the path, must be the last segment |
//! | `( ... )` | optional group, may nest |
//!
//! Names must match `[_a-zA-Z]\w*` and be unique within one path.
//!
//! ## Example
//!
//! ```rust
//! use routeset::pattern::{CompiledPattern, Constraints, SEPARATORS};
//!
//! let pattern = CompiledPattern::compile(
//!     "/photos/:id(.:format)",
//!     &Constraints::new(),
//!     SEPARATORS,
//!     true,
//! ).unwrap();
//!
//! let params = pattern.match_path("/photos/42.json").unwrap();
//! assert_eq!(params[0].1, "42");
//! assert_eq!(params[1].1, "json");
//! ```

mod compiled;
mod parser;

pub use compiled::{CompiledPattern, Constraints, ParamVec, MAX_INLINE_PARAMS, SEPARATORS};
pub use parser::{Node, PathSpec};
