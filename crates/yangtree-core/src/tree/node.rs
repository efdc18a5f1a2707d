use crate::collections::{KeyedCollection, TypedSequence};
use crate::leafref::CrossReference;
use crate::schema::{ChoicePath, Extensions, LeafType};
use crate::types::{ConstrainedValue, ScalarValue};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;
use yangtree_core_types::{ContainerId, NodeId};

/// Structural kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Leaf,
    Container,
    List,
    LeafList,
    /// One value of a leaf-list
    Element,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Leaf => "leaf",
            NodeKind::Container => "container",
            NodeKind::List => "list",
            NodeKind::LeafList => "leaf-list",
            NodeKind::Element => "leaf-list entry",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current content of a leaf
#[derive(Debug, Clone)]
pub(crate) enum LeafValue {
    Value(ConstrainedValue),
    Reference(CrossReference),
}

#[derive(Debug, Clone)]
pub(crate) struct LeafSlot {
    pub(crate) ty: LeafType,
    pub(crate) default: Option<ScalarValue>,
    pub(crate) value: Option<LeafValue>,
}

#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Leaf(LeafSlot),
    Container {
        schema: ContainerId,
        children: IndexMap<String, NodeId>,
    },
    List(KeyedCollection),
    LeafList(TypedSequence),
    Element(ConstrainedValue),
}

impl Payload {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Payload::Leaf(_) => NodeKind::Leaf,
            Payload::Container { .. } => NodeKind::Container,
            Payload::List(_) => NodeKind::List,
            Payload::LeafList(_) => NodeKind::LeafList,
            Payload::Element(_) => NodeKind::Element,
        }
    }
}

/// A node of the instance tree
///
/// Nodes live in the [`Tree`](super::Tree) arena and refer to their parent
/// by handle. The root and detached list entries have no parent.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) safe_name: String,
    pub(crate) module: String,
    pub(crate) namespace: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) payload: Payload,
    pub(crate) config: bool,
    pub(crate) choice: Option<ChoicePath>,
    /// `Some(active)` for presence containers
    pub(crate) presence: Option<bool>,
    pub(crate) changed: bool,
    pub(crate) key_leaf: bool,
    /// Reachable from the tree root
    pub(crate) attached: bool,
    /// Paths of this node are kept in the path index
    pub(crate) indexed: bool,
    /// Suffix such as `[name='eth0']` for list entries and leaf-list values
    pub(crate) predicate: Option<String>,
    pub(crate) extensions: Extensions,
    pub(crate) metadata: BTreeMap<String, String>,
}

impl Node {
    /// Declared YANG name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier-safe form of the name
    pub fn safe_name(&self) -> &str {
        &self.safe_name
    }

    /// Defining module
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn is_config(&self) -> bool {
        self.config
    }

    pub fn choice(&self) -> Option<&ChoicePath> {
        self.choice.as_ref()
    }

    pub fn presence_declared(&self) -> bool {
        self.presence.is_some()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn is_key_leaf(&self) -> bool {
        self.key_leaf
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub(crate) fn registers(&self) -> bool {
        self.indexed && self.parent.is_some() && self.kind() != NodeKind::List
    }
}
