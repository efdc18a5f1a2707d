use super::{NodeKind, Tree};
use crate::errors::Result;
use yangtree_core_types::NodeId;

/// `[k1='v1' k2='v2']` for a list entry
pub(crate) fn key_predicate(pairs: &[(String, String)]) -> String {
    let conditions: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{}='{}'", key, value))
        .collect();
    format!("[{}]", conditions.join(" "))
}

/// `[.='v']` for a leaf-list value
pub(crate) fn value_predicate(value: &str) -> String {
    format!("[.='{}']", value)
}

impl Tree {
    /// Path segments from the root, recomputed from the parent chain
    ///
    /// List entries and leaf-list values contribute a single segment carrying
    /// their predicate, e.g. `["interfaces", "interface[name='eth0']", "mtu"]`.
    ///
    /// # Errors
    ///
    /// Returns `StaleNode` when the node or an ancestor was removed.
    pub fn path_segments(&self, id: NodeId) -> Result<Vec<String>> {
        self.segments(id, false)
    }

    /// Absolute path string, `/` for the root
    ///
    /// # Errors
    ///
    /// Returns `StaleNode` when the node or an ancestor was removed.
    pub fn yang_path(&self, id: NodeId) -> Result<String> {
        Ok(format!("/{}", self.path_segments(id)?.join("/")))
    }

    /// Path with `module:` prefixes wherever a node's defining module differs
    /// from its parent's
    ///
    /// # Errors
    ///
    /// Returns `StaleNode` when the node or an ancestor was removed.
    pub fn qualified_path(&self, id: NodeId) -> Result<String> {
        Ok(format!("/{}", self.segments(id, true)?.join("/")))
    }

    fn segments(&self, id: NodeId, qualified: bool) -> Result<Vec<String>> {
        let mut segments = Vec::new();
        let mut current = id;
        let mut first = true;

        loop {
            let node = self.node(current)?;
            let Some(parent) = node.parent else {
                if current != self.root {
                    segments.push(node.name.clone());
                }
                break;
            };

            // the entry below already names the list
            let transparent = !first && matches!(node.kind(), NodeKind::List | NodeKind::LeafList);
            if !transparent {
                let mut segment = String::new();
                if qualified && self.node(parent)?.module != node.module {
                    segment.push_str(&node.module);
                    segment.push(':');
                }
                segment.push_str(&node.name);
                if let Some(predicate) = &node.predicate {
                    segment.push_str(predicate);
                }
                segments.push(segment);
            }

            current = parent;
            first = false;
        }

        segments.reverse();
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_predicate() {
        let pairs = vec![
            ("name".to_string(), "eth0".to_string()),
            ("unit".to_string(), "0".to_string()),
        ];
        assert_eq!(key_predicate(&pairs), "[name='eth0' unit='0']");
        assert_eq!(value_predicate("1500"), "[.='1500']");
    }
}
