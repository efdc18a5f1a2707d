//! Keyed collections (YANG lists)
//!
//! Entries are ordered by insertion and addressed by a key string: the value
//! of the single key leaf, the key leaf values joined by a space for
//! composite keys, or a random UUID for keyless lists. Each entry is a
//! container node registered at `<list-path>[k1='v1' k2='v2']`.

use crate::errors::{Result, YangError};
use crate::schema::{ChildKind, Extensions, LeafType};
use crate::tree::{key_predicate, LeafValue, NodeKind, Payload, Seed, Tree};
use crate::types::ScalarValue;
use indexmap::IndexMap;
use yangtree_core_types::{ContainerId, NodeId};

/// Entry handles of a list node
#[derive(Debug, Clone)]
pub struct KeyedCollection {
    member: ContainerId,
    keys: Vec<String>,
    user_ordered: bool,
    entries: IndexMap<String, NodeId>,
}

impl KeyedCollection {
    pub(crate) fn new(member: ContainerId, keys: Vec<String>, user_ordered: bool) -> Self {
        Self {
            member,
            keys,
            user_ordered,
            entries: IndexMap::new(),
        }
    }

    /// Schema of every entry
    pub fn member_schema(&self) -> ContainerId {
        self.member
    }

    /// Declared key leaf names, in key order
    pub fn key_names(&self) -> &[String] {
        &self.keys
    }

    pub fn is_keyless(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn is_user_ordered(&self) -> bool {
        self.user_ordered
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn members(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.values().copied()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How the key of a new or removed entry is given
#[derive(Debug, Clone, PartialEq)]
pub enum KeyArg {
    /// Key values in key order, separated by spaces for composite keys
    Positional(String),
    /// Key values by key leaf name
    Named(Vec<(String, ScalarValue)>),
    /// Fresh random key, keyless lists only
    Generated,
}

impl KeyArg {
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ScalarValue>,
    {
        KeyArg::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for KeyArg {
    fn from(key: &str) -> Self {
        KeyArg::Positional(key.to_string())
    }
}

impl From<String> for KeyArg {
    fn from(key: String) -> Self {
        KeyArg::Positional(key)
    }
}

/// An entry created or replaced in a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub key: String,
    pub node: NodeId,
}

/// Key string plus the value of every key leaf
struct DerivedKey {
    key: String,
    pairs: Vec<(String, ScalarValue)>,
}

/// Mutable view of one list
///
/// Obtained from [`Tree::list`] or [`Tree::collection`].
#[derive(Debug)]
pub struct ListMut<'a> {
    tree: &'a mut Tree,
    node: NodeId,
}

impl<'a> ListMut<'a> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Create an entry with default content and the given key
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` when the key is present and `InvalidKey` when
    /// the key form does not fit the list or a key leaf rejects its value.
    /// Leafref key leaves may fail resolution; the tree is then unchanged.
    pub fn add(&mut self, key: impl Into<KeyArg>) -> Result<ListEntry> {
        let derived = self.tree.derive_key(self.node, &key.into())?;
        if self.tree.collection_ref(self.node)?.entries.contains_key(&derived.key) {
            return Err(YangError::DuplicateKey {
                path: self.tree.display_path(self.node),
                key: derived.key,
            });
        }
        self.tree.insert_entry(self.node, derived, None)
    }

    /// Create a detached entry to populate before [`ListMut::append`]
    ///
    /// The entry is not registered and its key leaves may be set freely.
    ///
    /// # Errors
    ///
    /// Returns `StaleNode` if the list was removed.
    pub fn new_item(&mut self) -> Result<NodeId> {
        self.tree.instantiate_entry(self.node, None, false)
    }

    /// Insert or replace the entry keyed by `item`'s key leaves
    ///
    /// Every changed child of the item is copied into the entry in load mode
    /// and the item is consumed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` when `item` is not a detached entry of this list
    /// or a key leaf is unset; copy errors leave the list and the item as
    /// they were.
    pub fn append(&mut self, item: NodeId) -> Result<ListEntry> {
        self.tree.check_detached_item(self.node, item)?;
        let derived = self.tree.key_from_item(self.node, item)?;
        let entry = self.tree.insert_entry(self.node, derived, Some(item))?;
        self.tree.release_subtree(item)?;
        Ok(entry)
    }

    /// Remove an entry and its whole subtree
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` when no entry has the key, including keys the
    /// key leaf types reject, and `InvalidKey` for a malformed key form.
    pub fn delete(&mut self, key: impl Into<KeyArg>) -> Result<()> {
        let key = self.tree.lookup_key(self.node, &key.into())?;
        let member = self.tree.list_member(self.node, &key)?;

        self.tree.remove_subtree(member)?;
        self.tree.collection_entry(self.node)?.entries.shift_remove(&key);
        self.tree.mark_changed(self.node)?;
        tracing::debug!(
            path = %self.tree.display_path(self.node),
            list_key = %key,
            "deleted list entry"
        );
        Ok(())
    }

    /// Entry with the given key string
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` when no entry has the key.
    pub fn member(&self, key: &str) -> Result<NodeId> {
        self.tree.list_member(self.node, key)
    }

    /// Entry selected by key leaf values
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for missing key names and `KeyNotFound` when no
    /// entry matches or a value does not fit its key leaf.
    pub fn item<I, K, V>(&self, pairs: I) -> Result<NodeId>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ScalarValue>,
    {
        let key = self.tree.lookup_key(self.node, &KeyArg::named(pairs))?;
        self.tree.list_member(self.node, &key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tree
            .collection_ref(self.node)
            .map(|c| c.entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<String> {
        self.tree.list_keys(self.node).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tree
            .collection_ref(self.node)
            .map(KeyedCollection::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Tree {
    /// Mutable view of the list `name` of `parent`
    ///
    /// # Errors
    ///
    /// Returns `UnknownChild` or `WrongNodeKind` when `name` is not a
    /// declared list.
    pub fn list(&mut self, parent: NodeId, name: &str) -> Result<ListMut<'_>> {
        let node = self.child(parent, name)?;
        self.collection(node)
    }

    /// Mutable view of a list node
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` when `node` is not a list.
    pub fn collection(&mut self, node: NodeId) -> Result<ListMut<'_>> {
        self.collection_ref(node)?;
        Ok(ListMut { tree: self, node })
    }

    /// Keys of a list node in order
    ///
    /// # Errors
    ///
    /// Returns `WrongNodeKind` when `node` is not a list.
    pub fn list_keys(&self, node: NodeId) -> Result<Vec<String>> {
        Ok(self.collection_ref(node)?.keys().map(str::to_string).collect())
    }

    /// Entry of a list node by key string
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` when no entry has the key.
    pub fn list_member(&self, node: NodeId, key: &str) -> Result<NodeId> {
        self.collection_ref(node)?
            .get(key)
            .ok_or_else(|| YangError::KeyNotFound {
                path: self.display_path(node),
                key: key.to_string(),
            })
    }

    pub(crate) fn collection_ref(&self, node: NodeId) -> Result<&KeyedCollection> {
        match &self.node(node)?.payload {
            Payload::List(collection) => Ok(collection),
            _ => Err(self.wrong_kind(node, NodeKind::List)),
        }
    }

    fn collection_entry(&mut self, node: NodeId) -> Result<&mut KeyedCollection> {
        self.collection_ref(node)?;
        match &mut self.node_mut(node)?.payload {
            Payload::List(collection) => Ok(collection),
            _ => Err(YangError::Internal {
                message: format!("node {} changed kind", node),
            }),
        }
    }

    fn invalid_key(&self, list: NodeId, reason: impl Into<String>) -> YangError {
        YangError::InvalidKey {
            path: self.display_path(list),
            reason: reason.into(),
        }
    }

    /// Derive the key of a new entry, checking key values against their types
    fn derive_key(&self, list: NodeId, arg: &KeyArg) -> Result<DerivedKey> {
        if self.collection_ref(list)?.is_keyless() {
            return match arg {
                KeyArg::Generated => Ok(DerivedKey {
                    key: uuid::Uuid::new_v4().to_string(),
                    pairs: Vec::new(),
                }),
                _ => Err(self.invalid_key(list, "list has no key leaves; use a generated key")),
            };
        }
        let pairs = self.key_pairs(list, arg)?;
        self.canonical_key(list, pairs)
    }

    /// Split a key argument into raw `(key leaf, value)` pairs in key order
    fn key_pairs(&self, list: NodeId, arg: &KeyArg) -> Result<Vec<(String, ScalarValue)>> {
        let keys = self.collection_ref(list)?.keys.clone();

        let pairs: Vec<(String, ScalarValue)> = match arg {
            KeyArg::Generated => {
                return Err(self.invalid_key(list, "a list with key leaves must be given a key"))
            }
            KeyArg::Positional(key) => {
                if key.trim().is_empty() {
                    return Err(self.invalid_key(list, "cannot set an empty key"));
                }
                let parts: Vec<&str> = if keys.len() == 1 {
                    vec![key.as_str()]
                } else {
                    key.split(' ').collect()
                };
                if parts.len() != keys.len() {
                    return Err(self.invalid_key(
                        list,
                        format!("key {:?} must contain all of: {}", key, keys.join(" ")),
                    ));
                }
                keys.iter()
                    .zip(parts)
                    .map(|(name, part)| (name.clone(), ScalarValue::from(part)))
                    .collect()
            }
            KeyArg::Named(given) => {
                if let Some((unknown, _)) = given.iter().find(|(name, _)| !keys.contains(name)) {
                    return Err(self.invalid_key(list, format!("{} is not a key of this list", unknown)));
                }
                keys.iter()
                    .map(|name| {
                        given
                            .iter()
                            .find(|(given_name, _)| given_name == name)
                            .map(|(_, value)| (name.clone(), value.clone()))
                            .ok_or_else(|| {
                                self.invalid_key(
                                    list,
                                    format!("must have all keys specified - cannot find {}", name),
                                )
                            })
                    })
                    .collect::<Result<_>>()?
            }
        };
        Ok(pairs)
    }

    /// Validate key values with the key leaf types and build the key string
    fn canonical_key(&self, list: NodeId, pairs: Vec<(String, ScalarValue)>) -> Result<DerivedKey> {
        let member = self.collection_ref(list)?.member;
        let shape = self.schema().container(member)?;
        let types = self.schema().types();

        let mut checked = Vec::with_capacity(pairs.len());
        for (name, raw) in pairs {
            let value = match shape.children.get(&name).map(|c| &c.kind) {
                Some(ChildKind::Leaf {
                    ty: LeafType::Scalar(id),
                    ..
                }) => types.construct(*id, &raw).map(|v| v.into_value()),
                Some(ChildKind::Leaf {
                    ty: LeafType::Union(candidates),
                    ..
                }) => types.first_fit(candidates, &raw).map(|v| v.into_value()),
                _ => Ok(raw),
            }
            .map_err(|e| self.invalid_key(list, e.to_string()))?;
            checked.push((name, value));
        }

        let key = checked
            .iter()
            .map(|(_, value)| value.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(DerivedKey { key, pairs: checked })
    }

    /// Key string used to find an existing entry
    ///
    /// A value its key leaf type rejects cannot name an entry, so it is
    /// reported as `KeyNotFound`.
    fn lookup_key(&self, list: NodeId, arg: &KeyArg) -> Result<String> {
        if self.collection_ref(list)?.is_keyless() {
            return match arg {
                KeyArg::Positional(key) => Ok(key.clone()),
                _ => Err(self.invalid_key(list, "entries of a keyless list are found by generated key")),
            };
        }
        let pairs = self.key_pairs(list, arg)?;
        let raw = pairs
            .iter()
            .map(|(_, value)| value.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        match self.canonical_key(list, pairs) {
            Ok(derived) => Ok(derived.key),
            Err(_) => Err(YangError::KeyNotFound {
                path: self.display_path(list),
                key: raw,
            }),
        }
    }

    /// Derive a key from the key leaves of an entry
    fn key_from_item(&self, list: NodeId, item: NodeId) -> Result<DerivedKey> {
        let keys = self.collection_ref(list)?.keys.clone();
        if keys.is_empty() {
            return self.derive_key(list, &KeyArg::Generated);
        }

        let mut pairs = Vec::with_capacity(keys.len());
        for name in keys {
            let leaf = self.child(item, &name)?;
            match self.leaf_value(leaf)? {
                Some(value) => pairs.push((name, value)),
                None => {
                    return Err(self.invalid_key(
                        list,
                        format!("key leaf {} of the appended entry is not set", name),
                    ))
                }
            }
        }
        self.canonical_key(list, pairs)
    }

    fn check_detached_item(&self, list: NodeId, item: NodeId) -> Result<()> {
        let member = self.collection_ref(list)?.member;
        let node = self.node(item)?;
        let fits = matches!(node.payload, Payload::Container { schema, .. } if schema == member);
        if !fits || node.parent.is_some() || node.attached {
            return Err(self.invalid_key(
                list,
                format!("{} is not a detached entry created by new_item", item),
            ));
        }
        Ok(())
    }

    /// Create an entry node of `list`
    ///
    /// Attached entries hang off the list and are registered when the list is
    /// indexed and has keys; detached ones have no parent.
    pub(crate) fn instantiate_entry(
        &mut self,
        list: NodeId,
        predicate: Option<String>,
        attached: bool,
    ) -> Result<NodeId> {
        let owner = self.node(list)?;
        let collection = self.collection_ref(list)?;
        let member = collection.member;
        let keys = collection.keys.clone();

        let seed = Seed {
            name: owner.name.clone(),
            module: owner.module.clone(),
            namespace: owner.namespace.clone(),
            parent: attached.then_some(list),
            config: owner.config,
            choice: None,
            key_leaf: false,
            attached: attached && owner.attached,
            indexed: attached && owner.indexed && !keys.is_empty(),
            predicate,
            extensions: Extensions::new(),
        };
        let payload = Payload::Container {
            schema: member,
            children: IndexMap::new(),
        };
        self.create(seed, payload, None, &keys)
    }

    /// Create or replace the entry for `derived`, loading its key leaves and
    /// copying the changed children of `source`
    ///
    /// Nothing outside the entry is marked changed, and no other choice case
    /// is evicted, before every key leaf and copied child has been accepted.
    fn insert_entry(
        &mut self,
        list: NodeId,
        derived: DerivedKey,
        source: Option<NodeId>,
    ) -> Result<ListEntry> {
        let collection = self.collection_ref(list)?;
        let predicate = if collection.is_keyless() {
            None
        } else {
            let text: Vec<(String, String)> = derived
                .pairs
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect();
            Some(key_predicate(&text))
        };
        let previous = collection.get(&derived.key);

        if let Some(old) = previous {
            self.unregister_subtree(old)?;
        }
        let member = self.instantiate_entry(list, predicate, true)?;

        // changes stop at the entry until it is complete
        let outer = self.fence.replace(member);
        let filled = self.fill_entry(member, &derived.pairs, source);
        self.fence = outer;

        if let Err(err) = filled {
            self.remove_subtree(member)?;
            if let Some(old) = previous {
                self.register_subtree(old)?;
            }
            return Err(err);
        }

        if let Some(old) = previous {
            self.release_subtree(old)?;
        }
        self.collection_entry(list)?
            .entries
            .insert(derived.key.clone(), member);
        self.mark_changed(list)?;

        tracing::debug!(
            path = %self.display_path(member),
            list_key = %derived.key,
            replaced = previous.is_some(),
            "stored list entry"
        );
        Ok(ListEntry {
            key: derived.key,
            node: member,
        })
    }

    /// Store a loaded key leaf value and move its entry to the key it now
    /// spells, re-registering the entry's subtree under the new path
    ///
    /// Entries still being filled are not in the collection yet and keep
    /// the predicate they were created with.
    pub(crate) fn store_key_leaf(&mut self, leaf: NodeId, stored: LeafValue) -> Result<()> {
        let Some(entry) = self.node(leaf)?.parent else {
            return self.store_leaf(leaf, stored);
        };
        let Some(list) = self.node(entry)?.parent else {
            return self.store_leaf(leaf, stored);
        };
        let old_key = match self.collection_ref(list) {
            Ok(collection) => collection
                .entries()
                .find(|(_, member)| *member == entry)
                .map(|(key, _)| key.to_string()),
            Err(_) => None,
        };
        let Some(old_key) = old_key else {
            return self.store_leaf(leaf, stored);
        };

        let previous = self.swap_leaf_value(leaf, Some(stored))?;
        let derived = match self.key_from_item(list, entry) {
            Ok(derived) if derived.key == old_key => return self.mark_changed(leaf),
            Ok(derived) if self.collection_ref(list)?.entries.contains_key(&derived.key) => {
                self.swap_leaf_value(leaf, previous)?;
                return Err(YangError::DuplicateKey {
                    path: self.display_path(list),
                    key: derived.key,
                });
            }
            Ok(derived) => derived,
            Err(err) => {
                self.swap_leaf_value(leaf, previous)?;
                return Err(err);
            }
        };

        self.unregister_subtree(entry)?;
        let text: Vec<(String, String)> = derived
            .pairs
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        self.node_mut(entry)?.predicate = Some(key_predicate(&text));
        let entries = &mut self.collection_entry(list)?.entries;
        if let Some((position, _, _)) = entries.shift_remove_full(&old_key) {
            entries.shift_insert(position, derived.key.clone(), entry);
        }
        self.register_subtree(entry)?;
        self.refresh_callers(entry)?;

        tracing::debug!(
            path = %self.display_path(entry),
            list_key = %derived.key,
            previous_key = %old_key,
            "moved list entry to new key"
        );
        self.mark_changed(leaf)
    }

    fn swap_leaf_value(&mut self, leaf: NodeId, value: Option<LeafValue>) -> Result<Option<LeafValue>> {
        match &mut self.node_mut(leaf)?.payload {
            Payload::Leaf(slot) => Ok(std::mem::replace(&mut slot.value, value)),
            _ => Err(YangError::Internal {
                message: format!("node {} is not a leaf", leaf),
            }),
        }
    }

    fn fill_entry(
        &mut self,
        member: NodeId,
        pairs: &[(String, ScalarValue)],
        source: Option<NodeId>,
    ) -> Result<()> {
        for (name, value) in pairs {
            let leaf = self.child(member, name)?;
            self.assign_leaf(leaf, value.clone(), true)?;
        }
        match source {
            Some(source) => self.copy_changed(source, member),
            None => Ok(()),
        }
    }

    /// Copy every changed child of container `from` into container `to`
    /// through the setters, in load mode
    pub(crate) fn copy_changed(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let names: Vec<String> = match &self.node(from)?.payload {
            Payload::Container { children, .. } => children.keys().cloned().collect(),
            _ => return Err(self.wrong_kind(from, NodeKind::Container)),
        };

        for name in names {
            let source = self.child(from, &name)?;
            if !self.node(source)?.changed {
                continue;
            }
            let target = self.child(to, &name)?;

            match &self.node(source)?.payload {
                Payload::Leaf(slot) => match slot.value.clone() {
                    Some(LeafValue::Value(value)) => self.assign_typed(target, &value, true)?,
                    Some(LeafValue::Reference(reference)) => {
                        if let Some(value) = self.read_reference(&reference)? {
                            self.assign_leaf(target, value, true)?;
                        }
                    }
                    None => {}
                },
                Payload::Container { .. } => {
                    if self.node(source)?.presence == Some(true) {
                        self.set_present(target, true)?;
                    }
                    self.copy_changed(source, target)?;
                }
                Payload::LeafList(_) => self.copy_sequence(source, target)?,
                Payload::List(collection) => {
                    let entries: Vec<NodeId> = collection.members().collect();
                    for entry in entries {
                        let derived = self.key_from_item(target, entry)?;
                        self.insert_entry(target, derived, Some(entry))?;
                    }
                }
                Payload::Element(_) => {}
            }
        }
        Ok(())
    }

    /// `(key, entry)` pairs of a list node
    pub(crate) fn list_entries(&self, node: NodeId) -> Result<Vec<(String, NodeId)>> {
        Ok(self
            .collection_ref(node)?
            .entries()
            .map(|(k, v)| (k.to_string(), v))
            .collect())
    }
}
