//! Change tracking, presence and choice exclusivity

use super::{NodeKind, Payload, Tree};
use crate::errors::{Result, YangError};
use crate::schema::ChoicePath;
use std::sync::Arc;
use yangtree_core_types::NodeId;

impl Tree {
    /// Mark `id` and every ancestor changed
    ///
    /// Walks up the parent handles. On entering each ancestor through a child
    /// that sits inside a choice, the fields of every other case of that
    /// choice are reset, innermost nesting level first. Presence containers
    /// on the way become present. The walk ends early at the tree's fence.
    pub(crate) fn mark_changed(&mut self, id: NodeId) -> Result<()> {
        let mut current = id;
        let mut via: Option<ChoicePath> = None;

        loop {
            if let Some(choice) = via.take() {
                self.evict_other_cases(current, &choice)?;
            }
            let fenced = self.fence == Some(current);
            let node = self.node_mut(current)?;
            node.changed = true;
            if let Some(present) = node.presence.as_mut() {
                *present = true;
            }
            match node.parent {
                Some(parent) if !fenced => {
                    via = node.choice.clone();
                    current = parent;
                }
                _ => return Ok(()),
            }
        }
    }

    fn evict_other_cases(&mut self, container: NodeId, choice: &ChoicePath) -> Result<()> {
        let schema_id = match &self.node(container)?.payload {
            Payload::Container { schema, .. } => *schema,
            _ => return Ok(()),
        };
        let schema = Arc::clone(&self.schema);
        let shape = schema.container(schema_id)?;

        for depth in (1..=choice.depth()).rev() {
            let choices = &choice.choices[..depth];
            let cases = &choice.cases[..depth];
            let others = shape
                .choices
                .iter()
                .filter(|decl| decl.path.choices == choices && decl.path.cases != cases);

            for decl in others {
                for field in &decl.fields {
                    if !shape.children.contains_key(field) {
                        return Err(YangError::UnmappedChoice {
                            container: self.display_path(container),
                            field: field.clone(),
                        });
                    }
                    let child = self.child(container, field)?;
                    // never-touched children are already in their initial state
                    if !self.node(child)?.changed {
                        continue;
                    }
                    tracing::debug!(
                        path = %self.display_path(child),
                        choice = %choices.join("/"),
                        "evicting field of inactive case"
                    );
                    self.unset(container, field)?;
                }
            }
        }
        Ok(())
    }

    /// Reset child `name` to its freshly constructed state
    ///
    /// Leaves lose their value and keep their handle. Containers, lists and
    /// leaf-lists are rebuilt, so handles into the old subtree become stale.
    /// The parent is not marked changed.
    ///
    /// # Errors
    ///
    /// Returns `UnknownChild` or `WrongNodeKind` when `name` is not a
    /// declared child of `parent`.
    pub fn unset(&mut self, parent: NodeId, name: &str) -> Result<()> {
        let child = self.child(parent, name)?;

        let node = self.node_mut(child)?;
        if let Payload::Leaf(slot) = &mut node.payload {
            slot.value = None;
            node.changed = false;
            return Ok(());
        }

        let schema_id = match &self.node(parent)?.payload {
            Payload::Container { schema, .. } => *schema,
            _ => return Err(self.wrong_kind(parent, NodeKind::Container)),
        };
        let schema = Arc::clone(&self.schema);
        let declared = schema
            .container(schema_id)?
            .children
            .get(name)
            .ok_or_else(|| YangError::UnknownChild {
                path: self.display_path(parent),
                name: name.to_string(),
            })?;

        self.remove_subtree(child)?;
        let fresh = self.instantiate_child(parent, declared, false)?;
        if let Payload::Container { children, .. } = &mut self.node_mut(parent)?.payload {
            children.insert(name.to_string(), fresh);
        }
        Ok(())
    }

    /// Activate or deactivate a presence container
    ///
    /// Activation marks the container and its ancestors changed;
    /// deactivation only clears the flag.
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` unless `id` is a container declaring presence.
    pub fn set_present(&mut self, id: NodeId, present: bool) -> Result<()> {
        let node = self.node(id)?;
        if node.kind() != NodeKind::Container {
            return Err(self.wrong_kind(id, NodeKind::Container));
        }
        if node.presence.is_none() {
            return Err(YangError::WrongNodeKind {
                path: self.display_path(id),
                expected: "presence container".to_string(),
                actual: "container".to_string(),
            });
        }

        if present {
            self.mark_changed(id)
        } else {
            self.node_mut(id)?.presence = Some(false);
            Ok(())
        }
    }

    /// `Some(active)` for presence containers, `None` otherwise
    ///
    /// # Errors
    ///
    /// Returns `StaleNode` when the node was removed.
    pub fn is_present(&self, id: NodeId) -> Result<Option<bool>> {
        Ok(self.node(id)?.presence)
    }

    /// # Errors
    ///
    /// Returns `StaleNode` when the node was removed.
    pub fn is_changed(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.changed)
    }
}
