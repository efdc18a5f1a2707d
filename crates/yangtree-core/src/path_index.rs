//! Path registration and lookup
//!
//! Nodes register under their absolute path (for example
//! `/interfaces/interface[name='eth0']/mtu`) and leafrefs query the index with
//! XPath-like expressions relative to the referencing leaf.

use std::fmt;
use yangtree_core_types::NodeId;

/// Lookup service mapping tree paths to node handles
pub trait PathIndex: fmt::Debug + Send {
    /// Register `node` under an absolute path, replacing any previous entry
    fn register(&mut self, path: &str, node: NodeId);

    /// Remove the entry for exactly this path
    fn unregister(&mut self, path: &str);

    /// Nodes matching `expr`, evaluated relative to the `caller` path
    ///
    /// Results are in registration order.
    fn get(&self, expr: &str, caller: &str) -> Vec<NodeId>;

    /// Whether exactly this path is registered
    fn is_registered(&self, path: &str) -> bool;
}

/// One `[key='value']` condition; `value` is `None` for non-literal
/// expressions, which match anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub key: String,
    pub value: Option<String>,
}

/// A path step with its module prefix removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub predicates: Vec<Predicate>,
}

impl PathSegment {
    /// Whether a registered segment satisfies this query segment
    fn admits(&self, registered: &PathSegment) -> bool {
        self.name == registered.name
            && self.predicates.iter().all(|wanted| match &wanted.value {
                None => true,
                Some(value) => registered
                    .predicates
                    .iter()
                    .any(|p| p.key == wanted.key && p.value.as_deref() == Some(value.as_str())),
            })
    }
}

fn strip_prefix(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Split on `/` outside predicates and quoted literals
fn split_steps(expr: &str) -> Vec<&str> {
    let mut steps = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in expr.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '/') if depth == 0 => {
                steps.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    steps.push(&expr[start..]);
    steps.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Parse one step such as `if:interface[name='eth0']`
pub fn parse_segment(step: &str) -> Option<PathSegment> {
    let name_end = step.find('[').unwrap_or(step.len());
    let name = strip_prefix(step[..name_end].trim());
    if name.is_empty() {
        return None;
    }

    let mut predicates = Vec::new();
    let mut rest = &step[name_end..];
    while !rest.is_empty() {
        let body = rest.strip_prefix('[')?;
        let close = closing_bracket(body)?;
        parse_conditions(&body[..close], &mut predicates);
        rest = body[close + 1..].trim_start();
    }

    Some(PathSegment {
        name: name.to_string(),
        predicates,
    })
}

fn closing_bracket(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parse `k='v' k2='v2'` or `k='v' and k2=current()/../x`
fn parse_conditions(content: &str, predicates: &mut Vec<Predicate>) {
    let mut rest = content.trim();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("and ") {
            rest = after.trim_start();
            continue;
        }
        let Some(eq) = rest.find('=') else {
            // positional predicates select nothing narrower here
            return;
        };
        let key = strip_prefix(rest[..eq].trim()).to_string();
        let after = rest[eq + 1..].trim_start();

        let (value, remainder) = match after.chars().next() {
            Some(q @ ('\'' | '"')) => {
                let inner = &after[1..];
                match inner.find(q) {
                    Some(end) => (Some(inner[..end].to_string()), &inner[end + 1..]),
                    None => (None, ""),
                }
            }
            _ => {
                let end = after.find(char::is_whitespace).unwrap_or(after.len());
                (None, &after[end..])
            }
        };
        predicates.push(Predicate { key, value });
        rest = remainder.trim_start();
    }
}

/// Resolve `expr` against `caller` into absolute query segments
///
/// Returns `None` when the expression climbs above the root or a step does
/// not parse.
pub fn resolve_query(expr: &str, caller: &str) -> Option<Vec<PathSegment>> {
    let mut segments = if expr.trim_start().starts_with('/') {
        Vec::new()
    } else {
        parse_absolute(caller)?
    };

    for step in split_steps(expr) {
        match step {
            "." => {}
            ".." => {
                segments.pop()?;
            }
            step => segments.push(parse_segment(step)?),
        }
    }
    Some(segments)
}

/// Parse an absolute registered path
pub fn parse_absolute(path: &str) -> Option<Vec<PathSegment>> {
    split_steps(path).into_iter().map(parse_segment).collect()
}

/// In-memory [`PathIndex`]
#[derive(Debug, Default)]
pub struct MemoryPathIndex {
    entries: indexmap::IndexMap<String, (Vec<PathSegment>, NodeId)>,
}

impl MemoryPathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered paths in registration order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl PathIndex for MemoryPathIndex {
    fn register(&mut self, path: &str, node: NodeId) {
        match parse_absolute(path) {
            Some(segments) => {
                self.entries.insert(path.to_string(), (segments, node));
            }
            None => tracing::debug!(path, "skipping unparsable path"),
        }
    }

    fn unregister(&mut self, path: &str) {
        self.entries.shift_remove(path);
    }

    fn get(&self, expr: &str, caller: &str) -> Vec<NodeId> {
        let Some(query) = resolve_query(expr, caller) else {
            return Vec::new();
        };
        self.entries
            .values()
            .filter(|(segments, _)| {
                segments.len() == query.len()
                    && query.iter().zip(segments).all(|(q, r)| q.admits(r))
            })
            .map(|(_, node)| *node)
            .collect()
    }

    fn is_registered(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(n: u32) -> NodeId {
        NodeId::new(n, 0)
    }

    fn populated() -> MemoryPathIndex {
        let mut index = MemoryPathIndex::new();
        index.register("/interfaces", node(1));
        index.register("/interfaces/interface[name='eth0']", node(2));
        index.register("/interfaces/interface[name='eth0']/name", node(3));
        index.register("/interfaces/interface[name='eth1']", node(4));
        index.register("/interfaces/interface[name='eth1']/name", node(5));
        index
    }

    #[test]
    fn test_absolute_lookup() {
        let index = populated();
        assert_eq!(index.get("/interfaces", "/"), vec![node(1)]);
        assert_eq!(
            index.get("/interfaces/interface/name", "/"),
            vec![node(3), node(5)]
        );
    }

    #[test]
    fn test_literal_predicate_filters() {
        let index = populated();
        assert_eq!(
            index.get("/interfaces/interface[name='eth1']/name", "/"),
            vec![node(5)]
        );
        assert_eq!(
            index.get("/interfaces/interface[name=\"eth0\"]", "/"),
            vec![node(2)]
        );
    }

    #[test]
    fn test_relative_and_prefixed() {
        let index = populated();
        let caller = "/interfaces/interface[name='eth0']/name";
        assert_eq!(index.get("../name", caller), vec![node(3)]);
        assert_eq!(index.get("../../interface/name", caller), vec![node(3), node(5)]);
        assert_eq!(index.get("/if:interfaces/if:interface/./if:name", "/"), vec![node(3), node(5)]);
        assert!(index.get("../../../../x", caller).is_empty());
    }

    #[test]
    fn test_non_literal_predicate_is_wildcard() {
        let index = populated();
        let found = index.get("/interfaces/interface[name=current()/../x]/name", "/");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_unregister() {
        let mut index = populated();
        index.unregister("/interfaces/interface[name='eth0']/name");
        assert!(!index.is_registered("/interfaces/interface[name='eth0']/name"));
        assert_eq!(index.get("/interfaces/interface/name", "/"), vec![node(5)]);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_parse_segment_forms() {
        let segment = parse_segment("a[k1='x y' k2='z']").unwrap();
        assert_eq!(segment.name, "a");
        assert_eq!(segment.predicates.len(), 2);
        assert_eq!(segment.predicates[0].value.as_deref(), Some("x y"));

        let element = parse_segment("mtu[.='1500']").unwrap();
        assert_eq!(element.predicates[0].key, ".");

        let multi = parse_segment("a[k1='x'][k2='y']").unwrap();
        assert_eq!(multi.predicates.len(), 2);
    }
}
