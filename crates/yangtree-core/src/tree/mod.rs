//! Instance tree
//!
//! The tree owns every node in an arena addressed by [`NodeId`] handles
//! (slot index plus generation), so a handle to a removed node is detected
//! instead of aliasing a newer one. Containers instantiate all declared
//! children eagerly; list entries and leaf-list values are created by the
//! collection operations in [`crate::collections`].
//!
//! ## Accessors
//!
//! Children are addressed by their YANG name:
//!
//! - [`Tree::child`] returns the handle of a declared child
//! - [`Tree::get_leaf`] reads a leaf, resolving bound leafrefs
//! - [`Tree::set_leaf`] validates and assigns, marking the path changed
//! - [`Tree::load_leaf`] does the same but may write list keys
//! - [`Tree::unset`] resets a child to its freshly constructed state

mod changes;
mod node;
mod paths;

pub use node::{Node, NodeKind};
pub(crate) use node::{LeafSlot, LeafValue, Payload};
pub(crate) use paths::{key_predicate, value_predicate};

use crate::collections::{KeyedCollection, TypedSequence};
use crate::errors::{Result, YangError};
use crate::path_index::PathIndex;
use crate::schema::{safe_name, ChildKind, ChildSchema, ChoicePath, Extensions, LeafType, Schema};
use crate::types::{ConstrainedValue, ScalarValue};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use yangtree_core_types::{ContainerId, NodeId};

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Initial attributes of a node about to be created
pub(crate) struct Seed {
    pub(crate) name: String,
    pub(crate) module: String,
    pub(crate) namespace: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) config: bool,
    pub(crate) choice: Option<ChoicePath>,
    pub(crate) key_leaf: bool,
    pub(crate) attached: bool,
    pub(crate) indexed: bool,
    pub(crate) predicate: Option<String>,
    pub(crate) extensions: Extensions,
}

impl Seed {
    fn into_node(self, payload: Payload, presence: Option<bool>) -> Node {
        Node {
            safe_name: safe_name(&self.name),
            name: self.name,
            module: self.module,
            namespace: self.namespace,
            parent: self.parent,
            payload,
            config: self.config,
            choice: self.choice,
            presence,
            changed: false,
            key_leaf: self.key_leaf,
            attached: self.attached,
            indexed: self.indexed,
            predicate: self.predicate,
            extensions: self.extensions,
            metadata: BTreeMap::new(),
        }
    }
}

/// An instance tree built from a [`Schema`]
#[derive(Debug)]
pub struct Tree {
    schema: Arc<Schema>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    root: NodeId,
    index: Option<Box<dyn PathIndex>>,
    /// Highest node change marking may reach while an entry is being filled
    pub(crate) fence: Option<NodeId>,
}

impl Tree {
    /// Instantiate a tree without path registration
    ///
    /// Leafrefs in such a tree always hold snapshots.
    ///
    /// # Errors
    ///
    /// Returns `Internal` when the schema is inconsistent.
    pub fn new(schema: Arc<Schema>) -> Result<Self> {
        Self::build(schema, None)
    }

    /// Instantiate a tree that registers every node path in `index`
    ///
    /// # Errors
    ///
    /// Returns `Internal` when the schema is inconsistent.
    pub fn with_index(schema: Arc<Schema>, index: Box<dyn PathIndex>) -> Result<Self> {
        Self::build(schema, Some(index))
    }

    fn build(schema: Arc<Schema>, index: Option<Box<dyn PathIndex>>) -> Result<Self> {
        let root_schema = schema.root();
        let shape = schema.container(root_schema)?;
        let seed = Seed {
            name: shape.name.clone(),
            module: shape.module.clone(),
            namespace: shape.namespace.clone(),
            parent: None,
            config: true,
            choice: None,
            key_leaf: false,
            attached: true,
            indexed: index.is_some(),
            predicate: None,
            extensions: Extensions::new(),
        };
        let presence = shape.presence.then_some(false);

        let mut tree = Tree {
            schema: Arc::clone(&schema),
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            root: NodeId::new(0, 0),
            index,
            fence: None,
        };
        let payload = Payload::Container {
            schema: root_schema,
            children: IndexMap::new(),
        };
        tree.root = tree.create(seed, payload, presence, &[])?;

        tracing::debug!(node_count = tree.live, "instantiated tree");
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn index(&self) -> Option<&dyn PathIndex> {
        self.index.as_deref()
    }

    /// Number of live nodes, detached entries included
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// # Errors
    ///
    /// Returns `StaleNode` when the node was removed.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or_else(|| YangError::StaleNode {
                node_id: id.to_string(),
            })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or_else(|| YangError::StaleNode {
                node_id: id.to_string(),
            })
    }

    // ===== Arena =====

    fn alloc(&mut self, node: Node) -> Result<NodeId> {
        if let Some(index) = self.free.pop() {
            let slot = self
                .slots
                .get_mut(index as usize)
                .ok_or_else(|| YangError::Internal {
                    message: format!("free list refers to missing slot {}", index),
                })?;
            slot.node = Some(node);
            self.live += 1;
            return Ok(NodeId::new(index, slot.generation));
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| YangError::Internal {
            message: "node arena is full".to_string(),
        })?;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        self.live += 1;
        Ok(NodeId::new(index, 0))
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            if slot.generation == id.generation() && slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index() as u32);
                self.live -= 1;
            }
        }
    }

    /// Allocate a node, register it and instantiate its declared children
    pub(crate) fn create(
        &mut self,
        seed: Seed,
        payload: Payload,
        presence: Option<bool>,
        member_keys: &[String],
    ) -> Result<NodeId> {
        let container = match &payload {
            Payload::Container { schema, .. } => Some(*schema),
            _ => None,
        };
        let id = self.alloc(seed.into_node(payload, presence))?;
        self.register_node(id)?;
        if let Some(schema_id) = container {
            self.populate(id, schema_id, member_keys)?;
        }
        Ok(id)
    }

    fn populate(&mut self, id: NodeId, schema_id: ContainerId, member_keys: &[String]) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let shape = schema.container(schema_id)?;
        let mut created = IndexMap::with_capacity(shape.children.len());
        for child in shape.children.values() {
            let key_leaf = member_keys.contains(&child.name);
            created.insert(child.name.clone(), self.instantiate_child(id, child, key_leaf)?);
        }
        if let Payload::Container { children, .. } = &mut self.node_mut(id)?.payload {
            *children = created;
        }
        Ok(())
    }

    /// Create a fresh node for a declared child of `parent`
    pub(crate) fn instantiate_child(
        &mut self,
        parent: NodeId,
        child: &ChildSchema,
        key_leaf: bool,
    ) -> Result<NodeId> {
        let schema = Arc::clone(&self.schema);
        let owner = self.node(parent)?;

        let (module, namespace) = match (&child.module, &child.kind) {
            (Some(module), _) => (module.name.clone(), module.namespace.clone()),
            (None, ChildKind::Container(id)) | (None, ChildKind::List { member: id, .. }) => {
                let shape = schema.container(*id)?;
                (shape.module.clone(), shape.namespace.clone())
            }
            (None, _) => (owner.module.clone(), owner.namespace.clone()),
        };

        let seed = Seed {
            name: child.name.clone(),
            module,
            namespace,
            parent: Some(parent),
            config: child.config && owner.config,
            choice: child.choice.clone(),
            key_leaf,
            attached: owner.attached,
            indexed: owner.indexed,
            predicate: None,
            extensions: child.extensions.clone(),
        };

        let (payload, presence) = match &child.kind {
            ChildKind::Leaf { ty, default } => (
                Payload::Leaf(LeafSlot {
                    ty: ty.clone(),
                    default: canonical_default(&schema, ty, default.as_ref())?,
                    value: None,
                }),
                None,
            ),
            ChildKind::LeafList { candidates, unique } => (
                Payload::LeafList(TypedSequence::new(candidates.clone(), *unique)),
                None,
            ),
            ChildKind::Container(id) => (
                Payload::Container {
                    schema: *id,
                    children: IndexMap::new(),
                },
                schema.container(*id)?.presence.then_some(false),
            ),
            ChildKind::List {
                member,
                keys,
                user_ordered,
            } => (
                Payload::List(KeyedCollection::new(*member, keys.clone(), *user_ordered)),
                None,
            ),
        };

        self.create(seed, payload, presence, &[])
    }

    // ===== Path registration =====

    fn register_node(&mut self, id: NodeId) -> Result<()> {
        if self.index.is_none() || !self.node(id)?.registers() {
            return Ok(());
        }
        let path = self.yang_path(id)?;
        if let Some(index) = self.index.as_mut() {
            index.register(&path, id);
        }
        tracing::debug!(path = %path, node_id = %id, "registered path");
        Ok(())
    }

    fn unregister_node(&mut self, id: NodeId) -> Result<()> {
        if self.index.is_none() || !self.node(id)?.registers() {
            return Ok(());
        }
        let path = self.yang_path(id)?;
        if let Some(index) = self.index.as_mut() {
            index.unregister(&path);
        }
        tracing::debug!(path = %path, node_id = %id, "unregistered path");
        Ok(())
    }

    /// `id` and all its descendants, parents before children
    pub(crate) fn subtree(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            let mut children = self.children(current)?;
            children.reverse();
            stack.extend(children);
        }
        Ok(order)
    }

    pub(crate) fn register_subtree(&mut self, id: NodeId) -> Result<()> {
        for node in self.subtree(id)? {
            self.register_node(node)?;
        }
        Ok(())
    }

    pub(crate) fn unregister_subtree(&mut self, id: NodeId) -> Result<()> {
        for node in self.subtree(id)? {
            self.unregister_node(node)?;
        }
        Ok(())
    }

    /// Free the arena slots of a subtree without touching the index
    pub(crate) fn release_subtree(&mut self, id: NodeId) -> Result<()> {
        for node in self.subtree(id)? {
            self.release(node);
        }
        Ok(())
    }

    /// Unregister and free a subtree
    ///
    /// The caller removes the handle from the owning container or collection.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> Result<()> {
        self.unregister_subtree(id)?;
        self.release_subtree(id)
    }

    // ===== Navigation =====

    /// Direct children in declaration, key or sequence order
    ///
    /// # Errors
    ///
    /// Returns `StaleNode` when the node was removed.
    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(match &self.node(id)?.payload {
            Payload::Container { children, .. } => children.values().copied().collect(),
            Payload::List(list) => list.members().collect(),
            Payload::LeafList(sequence) => sequence.elements().to_vec(),
            Payload::Leaf(_) | Payload::Element(_) => Vec::new(),
        })
    }

    /// Declared child `name` of a container
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` if `parent` is not a container and
    /// `UnknownChild` if no such child is declared.
    pub fn child(&self, parent: NodeId, name: &str) -> Result<NodeId> {
        match &self.node(parent)?.payload {
            Payload::Container { children, .. } => {
                children
                    .get(name)
                    .copied()
                    .ok_or_else(|| YangError::UnknownChild {
                        path: self.display_path(parent),
                        name: name.to_string(),
                    })
            }
            _ => Err(self.wrong_kind(parent, NodeKind::Container)),
        }
    }

    /// Follow a chain of child names from `from`
    ///
    /// # Errors
    ///
    /// Fails like [`Tree::child`] on the first missing step.
    pub fn descend(&self, from: NodeId, names: &[&str]) -> Result<NodeId> {
        names
            .iter()
            .try_fold(from, |current, name| self.child(current, name))
    }

    /// Nodes matching a path expression evaluated from the root
    pub fn find(&self, expr: &str) -> Vec<NodeId> {
        self.index
            .as_ref()
            .map(|index| index.get(expr, "/"))
            .unwrap_or_default()
    }

    // ===== Leaf accessors =====

    /// Current value of leaf `name`, `None` when unset
    ///
    /// # Errors
    ///
    /// Returns `InvalidPointer` when a bound leafref no longer resolves.
    pub fn get_leaf(&self, parent: NodeId, name: &str) -> Result<Option<ScalarValue>> {
        self.leaf_value(self.child(parent, name)?)
    }

    /// Current value of a leaf or leaf-list entry by handle
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` for structural nodes and `InvalidPointer`
    /// when a bound leafref no longer resolves.
    pub fn leaf_value(&self, leaf: NodeId) -> Result<Option<ScalarValue>> {
        match &self.node(leaf)?.payload {
            Payload::Leaf(slot) => match &slot.value {
                None => Ok(None),
                Some(LeafValue::Value(value)) => Ok(Some(value.value().clone())),
                Some(LeafValue::Reference(reference)) => self.read_reference(reference),
            },
            Payload::Element(value) => Ok(Some(value.value().clone())),
            _ => Err(self.wrong_kind(leaf, NodeKind::Leaf)),
        }
    }

    /// Typed value of a non-leafref leaf, for enumeration mapping
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` when the child is not a leaf.
    pub fn typed_leaf(&self, parent: NodeId, name: &str) -> Result<Option<ConstrainedValue>> {
        let leaf = self.child(parent, name)?;
        match &self.node(leaf)?.payload {
            Payload::Leaf(slot) => Ok(match &slot.value {
                Some(LeafValue::Value(value)) => Some(value.clone()),
                _ => None,
            }),
            _ => Err(self.wrong_kind(leaf, NodeKind::Leaf)),
        }
    }

    /// Schema default of a leaf
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` when `leaf` is not a leaf.
    pub fn default_value(&self, leaf: NodeId) -> Result<Option<ScalarValue>> {
        match &self.node(leaf)?.payload {
            Payload::Leaf(slot) => Ok(slot.default.clone()),
            _ => Err(self.wrong_kind(leaf, NodeKind::Leaf)),
        }
    }

    /// Validate and assign leaf `name`
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` / `InvalidMember` when the type rejects the
    /// value, `KeyLeafLocked` for keys of list entries, or a leafref
    /// resolution error. The tree is unchanged on error.
    pub fn set_leaf(
        &mut self,
        parent: NodeId,
        name: &str,
        value: impl Into<ScalarValue>,
    ) -> Result<()> {
        let leaf = self.child(parent, name)?;
        self.assign_leaf(leaf, value.into(), false)
    }

    /// Assign leaf `name` in load mode, which may also write list keys
    ///
    /// # Errors
    ///
    /// As [`Tree::set_leaf`], without `KeyLeafLocked`.
    pub fn load_leaf(
        &mut self,
        parent: NodeId,
        name: &str,
        value: impl Into<ScalarValue>,
    ) -> Result<()> {
        let leaf = self.child(parent, name)?;
        self.assign_leaf(leaf, value.into(), true)
    }

    pub(crate) fn assign_leaf(&mut self, leaf: NodeId, value: ScalarValue, load: bool) -> Result<()> {
        let node = self.node(leaf)?;
        let Payload::Leaf(slot) = &node.payload else {
            return Err(self.wrong_kind(leaf, NodeKind::Leaf));
        };
        if node.key_leaf && node.attached && !load {
            return Err(YangError::KeyLeafLocked {
                path: self.display_path(leaf),
            });
        }

        let stored = match slot.ty.clone() {
            LeafType::Scalar(id) => LeafValue::Value(self.schema.types().construct(id, &value)?),
            LeafType::Union(candidates) => {
                LeafValue::Value(self.schema.types().first_fit(&candidates, &value)?)
            }
            LeafType::Leafref(spec) => {
                LeafValue::Reference(self.resolve_reference(leaf, &spec, Some(value))?)
            }
        };
        self.commit_leaf(leaf, stored)
    }

    /// Assign an already constructed value, skipping re-validation when it
    /// was built by this leaf's own type
    pub(crate) fn assign_typed(&mut self, leaf: NodeId, value: &ConstrainedValue, load: bool) -> Result<()> {
        let node = self.node(leaf)?;
        let exact = match &node.payload {
            Payload::Leaf(slot) => match &slot.ty {
                LeafType::Scalar(id) => *id == value.type_id(),
                LeafType::Union(candidates) => candidates.contains(&value.type_id()),
                LeafType::Leafref(_) => false,
            },
            _ => false,
        };
        if exact && (!node.key_leaf || !node.attached || load) {
            return self.commit_leaf(leaf, LeafValue::Value(value.clone()));
        }
        self.assign_leaf(leaf, value.value().clone(), load)
    }

    fn commit_leaf(&mut self, leaf: NodeId, stored: LeafValue) -> Result<()> {
        let node = self.node(leaf)?;
        if node.key_leaf && node.attached {
            return self.store_key_leaf(leaf, stored);
        }
        self.store_leaf(leaf, stored)
    }

    pub(crate) fn store_leaf(&mut self, leaf: NodeId, stored: LeafValue) -> Result<()> {
        if let Payload::Leaf(slot) = &mut self.node_mut(leaf)?.payload {
            slot.value = Some(stored);
        }
        self.mark_changed(leaf)
    }

    /// Whether a leaf holds a value (bound leafrefs count as set)
    pub(crate) fn leaf_is_set(&self, leaf: NodeId) -> Result<bool> {
        match &self.node(leaf)?.payload {
            Payload::Leaf(slot) => Ok(slot.value.is_some()),
            _ => Err(self.wrong_kind(leaf, NodeKind::Leaf)),
        }
    }

    // ===== Annotations =====

    /// Attach a metadata annotation to a node
    ///
    /// # Errors
    ///
    /// Returns `StaleNode` when the node was removed.
    pub fn add_metadata(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.node_mut(id)?.metadata.insert(key.into(), value.into());
        Ok(())
    }

    // ===== Error helpers =====

    pub(crate) fn display_path(&self, id: NodeId) -> String {
        self.yang_path(id).unwrap_or_else(|_| id.to_string())
    }

    pub(crate) fn wrong_kind(&self, id: NodeId, expected: NodeKind) -> YangError {
        YangError::WrongNodeKind {
            path: self.display_path(id),
            expected: expected.label().to_string(),
            actual: self
                .node(id)
                .map(|n| n.kind().label().to_string())
                .unwrap_or_else(|_| "removed node".to_string()),
        }
    }
}

/// Default coerced to the form its type stores
fn canonical_default(
    schema: &Schema,
    ty: &LeafType,
    default: Option<&ScalarValue>,
) -> Result<Option<ScalarValue>> {
    let Some(value) = default else {
        return Ok(None);
    };
    let canonical = match ty {
        LeafType::Scalar(id) => schema.types().construct(*id, value)?.into_value(),
        LeafType::Union(candidates) => schema.types().first_fit(candidates, value)?.into_value(),
        LeafType::Leafref(_) => value.clone(),
    };
    Ok(Some(canonical))
}
