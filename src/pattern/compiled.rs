//! Compiled path patterns: one regex for recognition, the node list reused
//! as the generation template.

use super::parser::{Node, PathSpec};
use crate::error::PatternError;
use crate::Params;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Characters that end a dynamic segment unless a constraint says otherwise.
pub const SEPARATORS: &str = "/.?";

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated capture storage for the recognition hot path.
///
/// Names are `Arc<str>` shared with the compiled pattern; values are per-request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Per-segment regex overrides, keyed by segment name.
pub type Constraints = BTreeMap<String, String>;

/// An explicit constraint, kept in both forms.
#[derive(Debug, Clone)]
struct Requirement {
    source: String,
    /// `^(?:source)$`, used to check values during generation.
    exact: Regex,
}

/// An immutable, matchable path pattern.
///
/// Built once at draw time; owns no mutable state afterwards.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    spec: PathSpec,
    regex: Regex,
    anchored: bool,
    names: Vec<Arc<str>>,
    required_names: Vec<String>,
    requirements: HashMap<String, Requirement>,
}

impl CompiledPattern {
    /// Compile declaration text.
    ///
    /// * `constraints` - regex overrides per segment name; entries naming
    ///   keys that are not segments of this path are ignored here
    /// * `separators` - characters a default segment may not contain
    /// * `anchored` - `true` to require the whole path to match
    pub fn compile(
        path: &str,
        constraints: &Constraints,
        separators: &str,
        anchored: bool,
    ) -> Result<Self, PatternError> {
        let spec = PathSpec::parse(path)?;
        spec.validate()?;

        let names: Vec<String> = spec.names();
        let mut requirements = HashMap::with_capacity(constraints.len());
        for (name, source) in constraints {
            if !names.contains(name) {
                continue;
            }
            if has_anchor(source) {
                return Err(PatternError::AnchoredConstraint { name: name.clone() });
            }
            let exact = Regex::new(&format!("^(?:{source})$")).map_err(|source| {
                PatternError::InvalidConstraint {
                    name: name.clone(),
                    source,
                }
            })?;
            requirements.insert(
                name.clone(),
                Requirement {
                    source: source.clone(),
                    exact,
                },
            );
        }

        let default_segment = format!("[^{}]+", regex::escape(separators));
        let mut body = String::with_capacity(path.len() * 2);
        write_regex(spec.nodes(), &requirements, &default_segment, &mut body);

        let pattern = if anchored {
            format!("^{body}$")
        } else {
            format!(r"^{body}(?:\b|/|$)")
        };
        let regex = Regex::new(&pattern).map_err(|source| PatternError::Regex {
            path: path.to_string(),
            source,
        })?;

        Ok(Self {
            required_names: spec.required_names(),
            names: names.into_iter().map(Arc::from).collect(),
            spec,
            regex,
            anchored,
            requirements,
        })
    }

    pub fn source(&self) -> &str {
        self.spec.source()
    }

    pub fn spec(&self) -> &PathSpec {
        &self.spec
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// The full recognition expression, for diagnostics.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// All segment names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_ref())
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.as_ref() == name)
    }

    /// Names outside optional groups.
    pub fn required_names(&self) -> &[String] {
        &self.required_names
    }

    pub fn constraint(&self, name: &str) -> Option<&str> {
        self.requirements.get(name).map(|r| r.source.as_str())
    }

    pub fn has_constraints(&self) -> bool {
        !self.requirements.is_empty()
    }

    /// Whether `value` is acceptable for segment `name` during generation.
    pub fn satisfies(&self, name: &str, value: &str) -> bool {
        match self.requirements.get(name) {
            Some(req) => req.exact.is_match(value),
            None => !value.is_empty(),
        }
    }

    /// Match a normalized path, returning raw (still percent-encoded) captures.
    pub fn match_path(&self, path: &str) -> Option<ParamVec> {
        let captures = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for name in &self.names {
            if let Some(value) = captures.name(name) {
                params.push((Arc::clone(name), value.as_str().to_string()));
            }
        }
        Some(params)
    }

    /// Render a path from already-resolved parts.
    ///
    /// Optional groups are emitted only when every segment inside them is
    /// present and at least one of them was consumed. Required segments are
    /// expected to be present; the caller checks that first.
    pub fn format(&self, parts: &Params) -> String {
        let mut out = String::with_capacity(self.source().len() + 16);
        format_nodes(self.spec.nodes(), parts, &mut out);
        if out.is_empty() {
            out.push('/');
        }
        out
    }
}

fn has_anchor(source: &str) -> bool {
    source.starts_with('^')
        || (source.ends_with('$') && !source.ends_with("\\$"))
        || source.contains("\\A")
        || source.contains("\\z")
        || source.contains("\\Z")
}

fn write_regex(
    nodes: &[Node],
    requirements: &HashMap<String, Requirement>,
    default_segment: &str,
    out: &mut String,
) {
    for node in nodes {
        match node {
            Node::Literal(text) => out.push_str(&regex::escape(text)),
            Node::Separator(c) => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
            Node::Symbol(name) => {
                out.push_str("(?P<");
                out.push_str(name);
                out.push('>');
                match requirements.get(name) {
                    Some(req) => {
                        out.push_str("(?:");
                        out.push_str(&req.source);
                        out.push(')');
                    }
                    // `-` is not a separator, so `:id-:slug` splits by backtracking
                    None => out.push_str(default_segment),
                }
                out.push(')');
            }
            Node::Glob(name) => {
                out.push_str("(?P<");
                out.push_str(name);
                out.push('>');
                match requirements.get(name) {
                    Some(req) => {
                        out.push_str("(?:");
                        out.push_str(&req.source);
                        out.push(')');
                    }
                    None => out.push_str(".+"),
                }
                out.push(')');
            }
            Node::Group(inner) => {
                out.push_str("(?:");
                write_regex(inner, requirements, default_segment, out);
                out.push_str(")?");
            }
        }
    }
}

/// Returns `(missing, consumed)` for the nodes written.
fn format_nodes(nodes: &[Node], parts: &Params, out: &mut String) -> (bool, usize) {
    let mut missing = false;
    let mut consumed = 0;
    for node in nodes {
        match node {
            Node::Literal(text) => out.push_str(text),
            Node::Separator(c) => out.push(*c),
            Node::Symbol(name) => match parts.get(name).filter(|v| !v.is_empty()) {
                Some(value) => {
                    out.push_str(&urlencoding::encode(value));
                    consumed += 1;
                }
                None => missing = true,
            },
            Node::Glob(name) => match parts.get(name).filter(|v| !v.is_empty()) {
                Some(value) => {
                    let escaped: Vec<String> = value
                        .split('/')
                        .map(|piece| urlencoding::encode(piece).into_owned())
                        .collect();
                    out.push_str(&escaped.join("/"));
                    consumed += 1;
                }
                None => missing = true,
            },
            Node::Group(inner) => {
                let mut buf = String::new();
                let (group_missing, group_consumed) = format_nodes(inner, parts, &mut buf);
                if !group_missing && group_consumed > 0 {
                    out.push_str(&buf);
                    consumed += group_consumed;
                }
            }
        }
    }
    (missing, consumed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(path: &str) -> CompiledPattern {
        CompiledPattern::compile(path, &Constraints::new(), SEPARATORS, true).unwrap()
    }

    fn parts(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_root_path() {
        let pattern = compile("/");
        assert!(pattern.match_path("/").is_some());
        assert!(pattern.match_path("/x").is_none());
        assert_eq!(pattern.format(&Params::new()), "/");
    }

    #[test]
    fn test_parameterized_path() {
        let pattern = compile("/items/:id");
        let params = pattern.match_path("/items/123").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].0.as_ref(), "id");
        assert_eq!(params[0].1, "123");
        assert!(pattern.match_path("/items/123/extra").is_none());
        assert!(pattern.match_path("/items/1.json").is_none());
    }

    #[test]
    fn test_optional_format() {
        let pattern = compile("/photos/:id(.:format)");
        let params = pattern.match_path("/photos/7.json").unwrap();
        assert_eq!(params[0].1, "7");
        assert_eq!(params[1].1, "json");
        let params = pattern.match_path("/photos/7").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(pattern.required_names(), &["id".to_string()]);
    }

    #[test]
    fn test_constraint_applied() {
        let mut constraints = Constraints::new();
        constraints.insert("id".to_string(), r"\d+".to_string());
        let pattern =
            CompiledPattern::compile("/photos/:id", &constraints, SEPARATORS, true).unwrap();
        assert!(pattern.match_path("/photos/12").is_some());
        assert!(pattern.match_path("/photos/abc").is_none());
        assert!(pattern.satisfies("id", "12"));
        assert!(!pattern.satisfies("id", "12a"));
    }

    #[test]
    fn test_constraint_may_cross_separators() {
        let mut constraints = Constraints::new();
        constraints.insert("version".to_string(), r"[^/]+".to_string());
        let pattern =
            CompiledPattern::compile("/api/:version/status", &constraints, SEPARATORS, true)
                .unwrap();
        let params = pattern.match_path("/api/1.2/status").unwrap();
        assert_eq!(params[0].1, "1.2");
    }

    #[test]
    fn test_malformed_constraint() {
        let mut constraints = Constraints::new();
        constraints.insert("id".to_string(), r"(\d+".to_string());
        assert!(matches!(
            CompiledPattern::compile("/photos/:id", &constraints, SEPARATORS, true),
            Err(PatternError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_anchored_constraint_rejected() {
        let mut constraints = Constraints::new();
        constraints.insert("id".to_string(), r"^\d+$".to_string());
        assert!(matches!(
            CompiledPattern::compile("/photos/:id", &constraints, SEPARATORS, true),
            Err(PatternError::AnchoredConstraint { .. })
        ));
    }

    #[test]
    fn test_dash_joined_segments() {
        let pattern = compile("/posts/:id-:slug");
        let params = pattern.match_path("/posts/12-hello-world").unwrap();
        assert_eq!(params[0].1, "12-hello");
        assert_eq!(params[1].1, "world");
    }

    #[test]
    fn test_glob_captures_rest() {
        let pattern = compile("/files/*path");
        let params = pattern.match_path("/files/a/b/c.txt").unwrap();
        assert_eq!(params[0].1, "a/b/c.txt");
        assert!(pattern.match_path("/files").is_none());
    }

    #[test]
    fn test_unanchored_prefix() {
        let pattern =
            CompiledPattern::compile("/admin", &Constraints::new(), SEPARATORS, false).unwrap();
        assert!(pattern.match_path("/admin").is_some());
        assert!(pattern.match_path("/admin/users").is_some());
        assert!(pattern.match_path("/administrators").is_none());
    }

    #[test]
    fn test_format_optional_groups() {
        let pattern = compile("/:controller(/:action(/:id))(.:format)");
        assert_eq!(pattern.format(&parts(&[("controller", "posts")])), "/posts");
        assert_eq!(
            pattern.format(&parts(&[("controller", "posts"), ("action", "show"), ("id", "3")])),
            "/posts/show/3"
        );
        // nested group needs its parent
        assert_eq!(
            pattern.format(&parts(&[("controller", "posts"), ("id", "3")])),
            "/posts"
        );
        assert_eq!(
            pattern.format(&parts(&[("controller", "posts"), ("format", "xml")])),
            "/posts.xml"
        );
    }

    #[test]
    fn test_format_escapes_values() {
        let pattern = compile("/search/:q/*rest");
        let out = pattern.format(&parts(&[("q", "a b"), ("rest", "x y/z")]));
        assert_eq!(out, "/search/a%20b/x%20y/z");
    }
}
