//! Typed sequences (leaf-lists)
//!
//! A sequence accepts values of any of its candidate types, trying them in
//! order. Each value lives in its own element node registered at
//! `<sequence-path>[.='<value>']`.

use crate::errors::{Result, YangError};
use crate::schema::Extensions;
use crate::tree::{value_predicate, NodeKind, Payload, Seed, Tree};
use crate::types::{ConstrainedValue, ScalarValue};
use yangtree_core_types::{NodeId, TypeId};

/// Element handles of a leaf-list node
#[derive(Debug, Clone)]
pub struct TypedSequence {
    candidates: Vec<TypeId>,
    unique: bool,
    elements: Vec<NodeId>,
}

impl TypedSequence {
    pub(crate) fn new(candidates: Vec<TypeId>, unique: bool) -> Self {
        Self {
            candidates,
            unique,
            elements: Vec::new(),
        }
    }

    pub fn candidates(&self) -> &[TypeId] {
        &self.candidates
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn elements(&self) -> &[NodeId] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Mutable view of one leaf-list
///
/// Obtained from [`Tree::leaf_list`] or [`Tree::sequence`].
#[derive(Debug)]
pub struct SequenceMut<'a> {
    tree: &'a mut Tree,
    node: NodeId,
}

impl<'a> SequenceMut<'a> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Append a value; duplicates in a unique sequence are skipped
    ///
    /// Returns whether the value was added.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMember` when no candidate type accepts the value.
    pub fn append(&mut self, value: impl Into<ScalarValue>) -> Result<bool> {
        let value = value.into();
        if self.tree.sequence_holds(self.node, &value)? {
            return Ok(false);
        }
        let admitted = self.tree.admit(self.node, &value)?;
        self.push_admitted(admitted)
    }

    /// Append a value built by one of the candidate types without re-checking
    ///
    /// # Errors
    ///
    /// Returns `InvalidMember` when the value's type is not a candidate and
    /// no candidate accepts its content.
    pub fn append_typed(&mut self, value: &ConstrainedValue) -> Result<bool> {
        let admitted = self.tree.admit_typed(self.node, value)?;
        self.push_admitted(admitted)
    }

    fn push_admitted(&mut self, admitted: ConstrainedValue) -> Result<bool> {
        if self.tree.sequence_holds(self.node, admitted.value())? {
            return Ok(false);
        }
        let len = self.len();
        self.tree.place_element(self.node, len, admitted)?;
        self.tree.mark_changed(self.node)?;
        Ok(true)
    }

    /// Insert at `index`, clamped to the current length
    ///
    /// # Errors
    ///
    /// Returns `DuplicateMember` for a value already held by a unique
    /// sequence and `InvalidMember` when no candidate accepts the value.
    pub fn insert(&mut self, index: usize, value: impl Into<ScalarValue>) -> Result<()> {
        let value = value.into();
        if self.tree.sequence_holds(self.node, &value)? {
            return Err(self.duplicate(&value));
        }
        let admitted = self.tree.admit(self.node, &value)?;
        if self.tree.sequence_holds(self.node, admitted.value())? {
            return Err(self.duplicate(admitted.value()));
        }
        self.tree.place_element(self.node, index, admitted)?;
        self.tree.mark_changed(self.node)
    }

    fn duplicate(&self, value: &ScalarValue) -> YangError {
        YangError::DuplicateMember {
            path: self.tree.display_path(self.node),
            value: value.to_string(),
        }
    }

    /// Append several values, validating all of them first
    ///
    /// Returns the number of values added.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMember` if any value is rejected; nothing is added.
    pub fn extend<I, V>(&mut self, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        let admitted = values
            .into_iter()
            .map(|v| self.tree.admit(self.node, &v.into()))
            .collect::<Result<Vec<_>>>()?;

        let mut added = 0;
        for value in admitted {
            if self.tree.sequence_holds(self.node, value.value())? {
                continue;
            }
            let len = self.len();
            self.tree.place_element(self.node, len, value)?;
            added += 1;
        }
        if added > 0 {
            self.tree.mark_changed(self.node)?;
        }
        Ok(added)
    }

    /// Remove the first element equal to `value`
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` when no element matches.
    pub fn remove(&mut self, value: impl Into<ScalarValue>) -> Result<()> {
        let value = value.into();
        let position = match self.tree.position_of(self.node, &value)? {
            Some(position) => Some(position),
            None => match self.tree.admit(self.node, &value) {
                Ok(admitted) => self.tree.position_of(self.node, admitted.value())?,
                Err(_) => None,
            },
        };
        let position = position.ok_or_else(|| YangError::ElementNotFound {
            path: self.tree.display_path(self.node),
            value: value.to_string(),
        })?;
        self.tree.take_element(self.node, position)?;
        Ok(())
    }

    /// Remove and return the element at `index`, or the last one
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` for an empty sequence or an index past the end.
    pub fn pop(&mut self, index: Option<usize>) -> Result<ScalarValue> {
        let len = self.len();
        let position = match index {
            Some(i) if i < len => i,
            None if len > 0 => len - 1,
            _ => {
                return Err(YangError::ElementNotFound {
                    path: self.tree.display_path(self.node),
                    value: format!("index {}", index.unwrap_or(0)),
                })
            }
        };
        self.tree.take_element(self.node, position)
    }

    /// Replace the whole content, validating every value first
    ///
    /// # Errors
    ///
    /// Returns `InvalidMember` if any value is rejected; the content is kept.
    pub fn replace<I, V>(&mut self, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        let values: Vec<ScalarValue> = values.into_iter().map(Into::into).collect();
        for value in &values {
            self.tree.admit(self.node, value)?;
        }
        while !self.is_empty() {
            let last = self.len() - 1;
            self.tree.take_element(self.node, last)?;
        }
        let added = self.extend(values)?;
        self.tree.mark_changed(self.node)?;
        Ok(added)
    }

    /// Current values in order
    ///
    /// # Errors
    ///
    /// Returns `StaleNode` if an element handle is broken.
    pub fn values(&self) -> Result<Vec<ScalarValue>> {
        self.tree.sequence_values(self.node)
    }

    pub fn len(&self) -> usize {
        self.tree
            .sequence_ref(self.node)
            .map(TypedSequence::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Tree {
    /// Mutable view of the leaf-list `name` of `parent`
    ///
    /// # Errors
    ///
    /// Returns `UnknownChild` or `WrongNodeKind` when `name` is not a
    /// declared leaf-list.
    pub fn leaf_list(&mut self, parent: NodeId, name: &str) -> Result<SequenceMut<'_>> {
        let node = self.child(parent, name)?;
        self.sequence(node)
    }

    /// Mutable view of a leaf-list node
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` when `node` is not a leaf-list.
    pub fn sequence(&mut self, node: NodeId) -> Result<SequenceMut<'_>> {
        self.sequence_ref(node)?;
        Ok(SequenceMut { tree: self, node })
    }

    /// Values of a leaf-list node in order
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` when `node` is not a leaf-list.
    pub fn sequence_values(&self, node: NodeId) -> Result<Vec<ScalarValue>> {
        self.sequence_ref(node)?
            .elements
            .iter()
            .map(|element| match &self.node(*element)?.payload {
                Payload::Element(value) => Ok(value.value().clone()),
                _ => Err(self.wrong_kind(*element, NodeKind::Element)),
            })
            .collect()
    }

    pub(crate) fn sequence_ref(&self, node: NodeId) -> Result<&TypedSequence> {
        match &self.node(node)?.payload {
            Payload::LeafList(sequence) => Ok(sequence),
            _ => Err(self.wrong_kind(node, NodeKind::LeafList)),
        }
    }

    fn sequence_entry(&mut self, node: NodeId) -> Result<&mut TypedSequence> {
        self.sequence_ref(node)?;
        match &mut self.node_mut(node)?.payload {
            Payload::LeafList(sequence) => Ok(sequence),
            _ => Err(YangError::Internal {
                message: format!("node {} changed kind", node),
            }),
        }
    }

    fn admit(&self, node: NodeId, value: &ScalarValue) -> Result<ConstrainedValue> {
        let sequence = self.sequence_ref(node)?;
        self.schema().types().first_fit(&sequence.candidates, value)
    }

    fn admit_typed(&self, node: NodeId, value: &ConstrainedValue) -> Result<ConstrainedValue> {
        if self.sequence_ref(node)?.candidates.contains(&value.type_id()) {
            return Ok(value.clone());
        }
        self.admit(node, value.value())
    }

    fn position_of(&self, node: NodeId, value: &ScalarValue) -> Result<Option<usize>> {
        Ok(self
            .sequence_values(node)?
            .iter()
            .position(|held| held == value))
    }

    /// Whether a unique sequence already holds `value`
    fn sequence_holds(&self, node: NodeId, value: &ScalarValue) -> Result<bool> {
        if !self.sequence_ref(node)?.unique {
            return Ok(false);
        }
        Ok(self.position_of(node, value)?.is_some())
    }

    fn place_element(&mut self, node: NodeId, index: usize, value: ConstrainedValue) -> Result<NodeId> {
        let owner = self.node(node)?;
        let seed = Seed {
            name: owner.name.clone(),
            module: owner.module.clone(),
            namespace: owner.namespace.clone(),
            parent: Some(node),
            config: owner.config,
            choice: None,
            key_leaf: false,
            attached: owner.attached,
            indexed: owner.indexed,
            predicate: Some(value_predicate(&value.to_string())),
            extensions: Extensions::new(),
        };
        let element = self.create(seed, Payload::Element(value), None, &[])?;

        let sequence = self.sequence_entry(node)?;
        let index = index.min(sequence.elements.len());
        sequence.elements.insert(index, element);
        tracing::debug!(path = %self.display_path(element), "added leaf-list value");
        Ok(element)
    }

    fn take_element(&mut self, node: NodeId, position: usize) -> Result<ScalarValue> {
        let element = self
            .sequence_ref(node)?
            .elements
            .get(position)
            .copied()
            .ok_or_else(|| YangError::ElementNotFound {
                path: self.display_path(node),
                value: format!("index {}", position),
            })?;
        let value = match &self.node(element)?.payload {
            Payload::Element(value) => value.value().clone(),
            _ => return Err(self.wrong_kind(element, NodeKind::Element)),
        };
        let predicate = self.node(element)?.predicate.clone();
        self.remove_subtree(element)?;
        self.sequence_entry(node)?.elements.remove(position);

        // equal values share one path; it now belongs to the first survivor
        let survivor = self
            .sequence_ref(node)?
            .elements
            .iter()
            .copied()
            .find(|other| self.node(*other).map(|n| n.predicate == predicate).unwrap_or(false));
        if let Some(survivor) = survivor {
            self.register_subtree(survivor)?;
        }

        self.mark_changed(node)?;
        Ok(value)
    }

    /// Copy every element of one leaf-list into another
    pub(crate) fn copy_sequence(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let elements = self.sequence_ref(from)?.elements.clone();
        for element in elements {
            let value = match &self.node(element)?.payload {
                Payload::Element(value) => value.clone(),
                _ => continue,
            };
            self.sequence(to)?.append_typed(&value)?;
        }
        Ok(())
    }
}
