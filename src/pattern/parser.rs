//! Path declaration parser.
//!
//! Turns declaration text such as `/photos/:id(.:format)` or `/files/*path`
//! into a [`PathSpec`]: a flat-with-groups list of [`Node`]s.

use crate::error::PatternError;

/// One node of a parsed path declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Verbatim text between separators.
    Literal(String),
    /// A separator character (`/` or `.`), kept apart from literals so the
    /// transition graph can split on segment boundaries.
    Separator(char),
    /// A named dynamic segment (`:name`).
    Symbol(String),
    /// A trailing segment capturing the rest of the path (`*name`).
    Glob(String),
    /// An optional group (`( ... )`).
    Group(Vec<Node>),
}

/// A parsed, not yet compiled path declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    source: String,
    nodes: Vec<Node>,
}

impl PathSpec {
    /// Parse declaration text.
    ///
    /// Only the grammar is checked here. Name uniqueness and glob placement
    /// are enforced by [`PathSpec::validate`].
    pub fn parse(path: &str) -> Result<Self, PatternError> {
        let mut stack: Vec<Vec<Node>> = vec![Vec::new()];
        let chars: Vec<(usize, char)> = path.char_indices().collect();
        let mut i = 0;

        while i < chars.len() {
            let (pos, c) = chars[i];
            match c {
                '/' | '.' => current(&mut stack).push(Node::Separator(c)),
                '(' => stack.push(Vec::new()),
                ')' => {
                    if stack.len() == 1 {
                        return Err(PatternError::UnbalancedGroup {
                            path: path.to_string(),
                        });
                    }
                    let group = stack.pop().unwrap_or_default();
                    current(&mut stack).push(Node::Group(group));
                }
                ':' | '*' => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && is_word(chars[end].1) {
                        end += 1;
                    }
                    if end == start {
                        return Err(PatternError::EmptySegmentName {
                            path: path.to_string(),
                            position: pos,
                        });
                    }
                    let name: String = chars[start..end].iter().map(|(_, ch)| *ch).collect();
                    if !is_valid_name(&name) {
                        return Err(PatternError::InvalidSegmentName {
                            path: path.to_string(),
                            name,
                        });
                    }
                    let node = if c == ':' {
                        Node::Symbol(name)
                    } else {
                        Node::Glob(name)
                    };
                    current(&mut stack).push(node);
                    i = end;
                    continue;
                }
                _ => {
                    let nodes = current(&mut stack);
                    match nodes.last_mut() {
                        Some(Node::Literal(text)) => text.push(c),
                        _ => nodes.push(Node::Literal(c.to_string())),
                    }
                }
            }
            i += 1;
        }

        if stack.len() != 1 {
            return Err(PatternError::UnbalancedGroup {
                path: path.to_string(),
            });
        }

        Ok(Self {
            source: path.to_string(),
            nodes: stack.pop().unwrap_or_default(),
        })
    }

    /// Reject duplicate names and globs that are followed by another segment.
    pub fn validate(&self) -> Result<(), PatternError> {
        let mut seen: Vec<&str> = Vec::new();
        let mut glob: Option<&str> = None;
        let mut flat = Vec::new();
        flatten(&self.nodes, &mut flat);

        for node in flat {
            match node {
                Node::Symbol(name) | Node::Glob(name) => {
                    if seen.contains(&name.as_str()) {
                        return Err(PatternError::DuplicateSegment {
                            path: self.source.clone(),
                            name: name.clone(),
                        });
                    }
                    seen.push(name.as_str());
                    if let Node::Glob(name) = node {
                        glob = Some(name.as_str());
                    }
                }
                Node::Separator('/') => {
                    if let Some(name) = glob {
                        return Err(PatternError::MisplacedGlob {
                            path: self.source.clone(),
                            name: name.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All segment names in declaration order.
    pub fn names(&self) -> Vec<String> {
        let mut flat = Vec::new();
        flatten(&self.nodes, &mut flat);
        flat.into_iter()
            .filter_map(|n| match n {
                Node::Symbol(name) | Node::Glob(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Names outside any optional group.
    pub fn required_names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Symbol(name) | Node::Glob(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_glob(&self) -> bool {
        let mut flat = Vec::new();
        flatten(&self.nodes, &mut flat);
        flat.iter().any(|n| matches!(n, Node::Glob(_)))
    }
}

fn current(stack: &mut [Vec<Node>]) -> &mut Vec<Node> {
    let last = stack.len() - 1;
    &mut stack[last]
}

/// Depth-first walk, groups expanded in place.
pub(crate) fn flatten<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
    for node in nodes {
        match node {
            Node::Group(inner) => flatten(inner, out),
            other => out.push(other),
        }
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `[_a-zA-Z][_a-zA-Z0-9]*`
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => chars.all(is_word),
        _ => false,
    }
}
