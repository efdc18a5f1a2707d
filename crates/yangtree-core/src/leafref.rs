//! Cross references (leafrefs)
//!
//! A leafref leaf stores a [`CrossReference`] instead of a plain value. When
//! the referenced path resolves to exactly one writable leaf the reference is
//! *bound*: reads follow the path every time and writes go through to the
//! target. Otherwise the reference holds a snapshot of the value, checked
//! against the existing instances when `require-instance` is set.

use crate::errors::{Result, YangError};
use crate::schema::{LeafType, LeafrefSpec};
use crate::tree::{LeafValue, NodeKind, Payload, Tree};
use crate::types::ScalarValue;
use yangtree_core_types::NodeId;

/// Outcome of resolving a reference at assignment time
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Reads re-query the path index
    Bound,
    /// Value captured at assignment, with the instance it matched if any
    Snapshot {
        value: Option<ScalarValue>,
        target: Option<NodeId>,
    },
}

#[derive(Debug, Clone)]
pub struct CrossReference {
    path: String,
    caller: String,
    require_instance: bool,
    resolution: Resolution,
}

impl CrossReference {
    pub fn referenced_path(&self) -> &str {
        &self.path
    }

    /// Absolute path of the referencing leaf when the reference was resolved
    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn require_instance(&self) -> bool {
        self.require_instance
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.resolution, Resolution::Bound)
    }
}

impl PartialEq for CrossReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Tree {
    /// Resolve a leafref for `leaf`, writing `value` through when bound
    pub(crate) fn resolve_reference(
        &mut self,
        leaf: NodeId,
        spec: &LeafrefSpec,
        value: Option<ScalarValue>,
    ) -> Result<CrossReference> {
        let caller = self.yang_path(leaf)?;
        // relative paths of a detached entry would match attached siblings
        let searchable = self.node(leaf)?.attached || spec.path.trim_start().starts_with('/');
        let index = self.index().filter(|_| searchable);
        let found = match index {
            Some(index) => index.get(&spec.path, &caller),
            None => Vec::new(),
        };
        let checkable = index.is_some();

        let reference = |resolution| CrossReference {
            path: spec.path.clone(),
            caller: caller.clone(),
            require_instance: spec.require_instance,
            resolution,
        };

        if let [target] = found.as_slice() {
            if self.bindable(leaf, *target)? {
                if let Some(value) = value {
                    self.assign_leaf(*target, value, false)?;
                }
                tracing::debug!(
                    path = %caller,
                    target = %self.display_path(*target),
                    "bound leafref"
                );
                return Ok(reference(Resolution::Bound));
            }
        }

        let Some(value) = value else {
            return Ok(reference(Resolution::Snapshot {
                value: None,
                target: None,
            }));
        };
        if !spec.require_instance || !checkable {
            return Ok(reference(Resolution::Snapshot {
                value: Some(value),
                target: None,
            }));
        }

        let sequence = match found.as_slice() {
            [single] if self.node(*single)?.kind() == NodeKind::LeafList => Some(*single),
            _ => None,
        };
        let candidates = match sequence {
            Some(sequence) => self.sequence_ref(sequence)?.elements().to_vec(),
            None => found,
        };
        let wanted = value.to_string();
        for candidate in candidates {
            if let Some(held) = self.instance_value(candidate)? {
                if held.to_string() == wanted {
                    tracing::debug!(path = %caller, value = %wanted, "leafref matched instance");
                    return Ok(reference(Resolution::Snapshot {
                        value: Some(held),
                        target: Some(candidate),
                    }));
                }
            }
        }

        Err(YangError::DanglingReference {
            path: spec.path.clone(),
            value: wanted,
        })
    }

    /// Re-anchor the references held in a moved subtree at their new paths
    pub(crate) fn refresh_callers(&mut self, id: NodeId) -> Result<()> {
        for node in self.subtree(id)? {
            let path = self.yang_path(node)?;
            if let Payload::Leaf(slot) = &mut self.node_mut(node)?.payload {
                if let Some(LeafValue::Reference(reference)) = &mut slot.value {
                    reference.caller = path;
                }
            }
        }
        Ok(())
    }

    /// A single match can be bound when it is an ordinary leaf other than
    /// the referencing leaf itself
    fn bindable(&self, leaf: NodeId, target: NodeId) -> Result<bool> {
        let node = self.node(target)?;
        Ok(target != leaf && node.kind() == NodeKind::Leaf && !node.key_leaf)
    }

    /// Value held by a leaf or leaf-list element, `None` for structural nodes
    fn instance_value(&self, node: NodeId) -> Result<Option<ScalarValue>> {
        match self.node(node)?.kind() {
            NodeKind::Leaf | NodeKind::Element => self.leaf_value(node),
            _ => Ok(None),
        }
    }

    /// Current value of a reference
    ///
    /// # Errors
    ///
    /// Returns `InvalidPointer` when a bound path no longer matches exactly
    /// one node.
    pub(crate) fn read_reference(&self, reference: &CrossReference) -> Result<Option<ScalarValue>> {
        match &reference.resolution {
            Resolution::Snapshot { value, .. } => Ok(value.clone()),
            Resolution::Bound => {
                let found = match self.index() {
                    Some(index) => index.get(&reference.path, &reference.caller),
                    None => Vec::new(),
                };
                match found.as_slice() {
                    [target] => self.leaf_value(*target),
                    _ => Err(YangError::InvalidPointer {
                        path: reference.path.clone(),
                        matches: found.len(),
                    }),
                }
            }
        }
    }

    /// The reference held by leafref leaf `name`, `None` when unset
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` when the child is not a leaf.
    pub fn leaf_reference(&self, parent: NodeId, name: &str) -> Result<Option<CrossReference>> {
        let leaf = self.child(parent, name)?;
        match &self.node(leaf)?.payload {
            Payload::Leaf(slot) => Ok(match &slot.value {
                Some(LeafValue::Reference(reference)) => Some(reference.clone()),
                _ => None,
            }),
            _ => Err(self.wrong_kind(leaf, NodeKind::Leaf)),
        }
    }

    /// Bind leafref leaf `name` to its target without writing a value
    ///
    /// When the path does not match a single writable leaf the leaf holds an
    /// empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` when the child is not a leafref leaf and
    /// `KeyLeafLocked` for keys of list entries.
    pub fn bind_leaf(&mut self, parent: NodeId, name: &str) -> Result<()> {
        let leaf = self.child(parent, name)?;
        let node = self.node(leaf)?;
        let spec = match &node.payload {
            Payload::Leaf(slot) => match &slot.ty {
                LeafType::Leafref(spec) => spec.clone(),
                _ => {
                    return Err(YangError::WrongNodeKind {
                        path: self.display_path(leaf),
                        expected: "leafref".to_string(),
                        actual: "leaf".to_string(),
                    })
                }
            },
            _ => return Err(self.wrong_kind(leaf, NodeKind::Leaf)),
        };
        if node.key_leaf && node.attached {
            return Err(YangError::KeyLeafLocked {
                path: self.display_path(leaf),
            });
        }

        let reference = self.resolve_reference(leaf, &spec, None)?;
        if let Payload::Leaf(slot) = &mut self.node_mut(leaf)?.payload {
            slot.value = Some(LeafValue::Reference(reference));
        }
        self.mark_changed(leaf)
    }
}
