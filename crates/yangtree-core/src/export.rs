//! Export of a subtree as plain nested data
//!
//! Containers become mappings keyed by YANG name, lists become mappings keyed
//! by entry key, leaf-lists become sequences. With `filter` set only changed
//! nodes are kept.

use crate::errors::Result;
use crate::tree::{NodeKind, Payload, Tree};
use crate::types::ScalarValue;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use yangtree_core_types::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    /// Unset leaf without a default, or a subtree filtered away
    Empty,
    Scalar(ScalarValue),
    Sequence(Vec<ScalarValue>),
    Mapping(IndexMap<String, ExportValue>),
}

impl ExportValue {
    pub fn is_empty(&self) -> bool {
        match self {
            ExportValue::Empty => true,
            ExportValue::Sequence(values) => values.is_empty(),
            ExportValue::Mapping(entries) => entries.is_empty(),
            ExportValue::Scalar(_) => false,
        }
    }

    /// Entry `key` of a mapping
    pub fn get(&self, key: &str) -> Option<&ExportValue> {
        match self {
            ExportValue::Mapping(entries) => entries.get(key),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            ExportValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns `Serialization` if a value cannot be represented as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for ExportValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ExportValue::Empty => serializer.serialize_none(),
            ExportValue::Scalar(value) => value.serialize(serializer),
            ExportValue::Sequence(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            ExportValue::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl Tree {
    /// Export the subtree at `node`
    ///
    /// Unset leaves fall back to their default. Inactive presence containers
    /// are left out. With `filter`, unchanged nodes and empty results are
    /// left out too.
    ///
    /// # Errors
    ///
    /// Returns `StaleNode` for a removed node and `InvalidPointer` when a
    /// bound leafref no longer resolves.
    pub fn get(&self, node: NodeId, filter: bool) -> Result<ExportValue> {
        let current = self.node(node)?;
        if current.presence == Some(false) || (filter && !current.changed) {
            return Ok(ExportValue::Empty);
        }

        match &current.payload {
            Payload::Leaf(_) => Ok(match self.leaf_value(node)? {
                Some(value) => ExportValue::Scalar(value),
                None if filter => ExportValue::Empty,
                None => self
                    .default_value(node)?
                    .map_or(ExportValue::Empty, ExportValue::Scalar),
            }),
            Payload::Element(value) => Ok(ExportValue::Scalar(value.value().clone())),
            Payload::LeafList(_) => Ok(ExportValue::Sequence(self.sequence_values(node)?)),
            Payload::Container { children, .. } => {
                let mut entries = IndexMap::with_capacity(children.len());
                for (name, child) in children {
                    let value = self.get(*child, filter)?;
                    if self.omitted(*child, &value, filter)? {
                        continue;
                    }
                    entries.insert(name.clone(), value);
                }
                Ok(ExportValue::Mapping(entries))
            }
            Payload::List(_) => {
                let mut entries = IndexMap::new();
                for (key, member) in self.list_entries(node)? {
                    let value = self.get(member, filter)?;
                    if filter && value.is_empty() {
                        continue;
                    }
                    entries.insert(key, value);
                }
                Ok(ExportValue::Mapping(entries))
            }
        }
    }

    fn omitted(&self, child: NodeId, value: &ExportValue, filter: bool) -> Result<bool> {
        let node = self.node(child)?;
        if node.presence == Some(false) {
            return Ok(true);
        }
        // an active presence container is data even when it has no content
        if node.presence == Some(true) && node.kind() == NodeKind::Container {
            return Ok(false);
        }
        Ok(filter && value.is_empty())
    }

    /// Export the whole tree as JSON
    ///
    /// # Errors
    ///
    /// Fails like [`Tree::get`].
    pub fn to_json(&self, filter: bool) -> Result<serde_json::Value> {
        self.get(self.root(), filter)?.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_empty_serialises_as_null() {
        assert_eq!(ExportValue::Empty.to_json().unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_scalars_keep_json_shape() {
        let mut entries = IndexMap::new();
        entries.insert("mtu".to_string(), ExportValue::Scalar(ScalarValue::Integer(1500)));
        entries.insert(
            "ratio".to_string(),
            ExportValue::Scalar(ScalarValue::Decimal(Decimal::from_str("0.50").unwrap())),
        );
        entries.insert(
            "tags".to_string(),
            ExportValue::Sequence(vec![ScalarValue::from("a"), ScalarValue::from("b")]),
        );
        let json = ExportValue::Mapping(entries).to_json().unwrap();
        assert_eq!(json["mtu"], serde_json::json!(1500));
        assert_eq!(json["ratio"], serde_json::json!("0.50"));
        assert_eq!(json["tags"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_is_empty() {
        assert!(ExportValue::Mapping(IndexMap::new()).is_empty());
        assert!(ExportValue::Sequence(Vec::new()).is_empty());
        assert!(!ExportValue::Scalar(ScalarValue::Boolean(false)).is_empty());
    }
}
