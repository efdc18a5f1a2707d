//! Compiled schema descriptors
//!
//! A [`Schema`] is the already-compiled form of a YANG module: a type
//! registry plus one [`ContainerSchema`] per container or list entry shape.
//! It is assembled with [`SchemaBuilder`] and validated once by
//! [`SchemaBuilder::finish`]; the tree then instantiates nodes from it.

use crate::errors::{Result, YangError};
use crate::types::{ScalarValue, TypeRegistry};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use yangtree_core_types::{ContainerId, TypeId};

/// Extension statements keyed by module, then by extension name
pub type Extensions = BTreeMap<String, BTreeMap<String, String>>;

/// Names that cannot be used verbatim as accessor identifiers
pub const RESERVED_NAMES: &[&str] = &[
    "list", "str", "int", "global", "decimal", "float", "as", "if", "else", "elif", "map", "set",
    "class", "from", "import", "pass", "return", "is", "exec", "pop", "insert", "remove", "add",
    "delete", "local", "get", "default", "yang_name", "def", "print", "del", "break", "continue",
    "raise", "in", "assert", "while", "for", "try", "finally", "with", "except", "lambda", "or",
    "and", "not", "yield", "property", "min", "max",
];

/// Schema-safe form of a YANG identifier
///
/// `-` and `.` become `_`, and reserved names get a trailing `_`.
pub fn safe_name(name: &str) -> String {
    let mut safe = name.replace(['-', '.'], "_");
    if RESERVED_NAMES.contains(&safe.as_str()) {
        safe.push('_');
    }
    safe
}

/// Target description of a leafref leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafrefSpec {
    pub path: String,
    pub require_instance: bool,
}

/// Value type of a leaf
#[derive(Debug, Clone, PartialEq)]
pub enum LeafType {
    Scalar(TypeId),
    /// Candidates tried in order, first fit wins
    Union(Vec<TypeId>),
    Leafref(LeafrefSpec),
}

impl LeafType {
    /// Leafref with `require-instance true`, the YANG default
    pub fn leafref(path: impl Into<String>) -> Self {
        LeafType::Leafref(LeafrefSpec {
            path: path.into(),
            require_instance: true,
        })
    }

    /// Leafref that accepts values with no matching instance
    pub fn leafref_optional(path: impl Into<String>) -> Self {
        LeafType::Leafref(LeafrefSpec {
            path: path.into(),
            require_instance: false,
        })
    }
}

/// Structural kind of a declared child
#[derive(Debug, Clone, PartialEq)]
pub enum ChildKind {
    Leaf {
        ty: LeafType,
        default: Option<ScalarValue>,
    },
    LeafList {
        candidates: Vec<TypeId>,
        unique: bool,
    },
    Container(ContainerId),
    List {
        member: ContainerId,
        keys: Vec<String>,
        user_ordered: bool,
    },
}

impl ChildKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChildKind::Leaf { .. } => "leaf",
            ChildKind::LeafList { .. } => "leaf-list",
            ChildKind::Container(_) => "container",
            ChildKind::List { .. } => "list",
        }
    }
}

/// Position of a node inside nested choice statements, outermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoicePath {
    pub choices: Vec<String>,
    pub cases: Vec<String>,
}

impl ChoicePath {
    /// Path with a single choice/case level
    pub fn new(choice: impl Into<String>, case: impl Into<String>) -> Self {
        Self::default().nested(choice, case)
    }

    /// Add one inner nesting level
    pub fn nested(mut self, choice: impl Into<String>, case: impl Into<String>) -> Self {
        self.choices.push(choice.into());
        self.cases.push(case.into());
        self
    }

    pub fn depth(&self) -> usize {
        self.choices.len()
    }
}

/// Fields belonging to one case, as declared on the enclosing container
///
/// For a case nested at depth `n`, `path` has `n` levels and `fields` lists
/// every child inside that case, including those in deeper cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDecl {
    pub path: ChoicePath,
    pub fields: Vec<String>,
}

/// Defining module of a node, when it differs from its parent's
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub name: String,
    pub namespace: String,
}

/// One declared child of a container
#[derive(Debug, Clone, PartialEq)]
pub struct ChildSchema {
    pub name: String,
    pub kind: ChildKind,
    pub config: bool,
    pub choice: Option<ChoicePath>,
    pub module: Option<ModuleRef>,
    pub extensions: Extensions,
}

impl ChildSchema {
    fn new(name: impl Into<String>, kind: ChildKind) -> Self {
        Self {
            name: name.into(),
            kind,
            config: true,
            choice: None,
            module: None,
            extensions: Extensions::new(),
        }
    }

    pub fn leaf(name: impl Into<String>, ty: LeafType) -> Self {
        Self::new(name, ChildKind::Leaf { ty, default: None })
    }

    /// Leaf of a single scalar type
    pub fn scalar(name: impl Into<String>, ty: TypeId) -> Self {
        Self::leaf(name, LeafType::Scalar(ty))
    }

    pub fn leaf_list(name: impl Into<String>, candidates: Vec<TypeId>, unique: bool) -> Self {
        Self::new(name, ChildKind::LeafList { candidates, unique })
    }

    pub fn container(name: impl Into<String>, schema: ContainerId) -> Self {
        Self::new(name, ChildKind::Container(schema))
    }

    /// List keyed by `keys`; an empty key set makes a keyless list
    pub fn list<I, S>(name: impl Into<String>, member: ContainerId, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            ChildKind::List {
                member,
                keys: keys.into_iter().map(Into::into).collect(),
                user_ordered: false,
            },
        )
    }

    /// Default for a leaf; ignored for other kinds
    pub fn with_default(mut self, value: impl Into<ScalarValue>) -> Self {
        if let ChildKind::Leaf { default, .. } = &mut self.kind {
            *default = Some(value.into());
        }
        self
    }

    pub fn ordered_by_user(mut self) -> Self {
        if let ChildKind::List { user_ordered, .. } = &mut self.kind {
            *user_ordered = true;
        }
        self
    }

    /// Mark as operational state (`config false`)
    pub fn state(mut self) -> Self {
        self.config = false;
        self
    }

    pub fn in_choice(mut self, path: ChoicePath) -> Self {
        self.choice = Some(path);
        self
    }

    pub fn in_module(mut self, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.module = Some(ModuleRef {
            name: name.into(),
            namespace: namespace.into(),
        });
        self
    }

    pub fn with_extension(
        mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        self.extensions
            .entry(module.into())
            .or_default()
            .insert(name.into(), argument.into());
        self
    }
}

/// Shape of a container or of a list entry
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSchema {
    pub name: String,
    pub module: String,
    pub namespace: String,
    pub presence: bool,
    pub children: IndexMap<String, ChildSchema>,
    pub choices: Vec<ChoiceDecl>,
    duplicates: Vec<String>,
}

impl ContainerSchema {
    pub fn new(
        name: impl Into<String>,
        module: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            namespace: namespace.into(),
            presence: false,
            children: IndexMap::new(),
            choices: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    pub fn presence(mut self) -> Self {
        self.presence = true;
        self
    }

    pub fn with_child(mut self, child: ChildSchema) -> Self {
        if self.children.contains_key(&child.name) {
            self.duplicates.push(child.name.clone());
        }
        self.children.insert(child.name.clone(), child);
        self
    }

    /// Declare the fields of one case
    pub fn with_case<I, S>(mut self, path: ChoicePath, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices.push(ChoiceDecl {
            path,
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }
}

/// A validated, immutable schema
#[derive(Debug)]
pub struct Schema {
    types: TypeRegistry,
    containers: Vec<ContainerSchema>,
    root: ContainerId,
}

impl Schema {
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn root(&self) -> ContainerId {
        self.root
    }

    /// # Errors
    ///
    /// Returns `Internal` for an id not issued by this schema.
    pub fn container(&self, id: ContainerId) -> Result<&ContainerSchema> {
        self.containers.get(id.index()).ok_or_else(|| YangError::Internal {
            message: format!("unknown container handle {}", id),
        })
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }
}

/// Assembles and validates a [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: TypeRegistry,
    containers: Vec<ContainerSchema>,
}

impl SchemaBuilder {
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            types,
            containers: Vec::new(),
        }
    }

    /// Registry for compiling further types while building
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn add_container(&mut self, container: ContainerSchema) -> ContainerId {
        let id = ContainerId::new(self.containers.len() as u32);
        self.containers.push(container);
        id
    }

    /// Validate every descriptor and freeze the schema
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` for unknown handles, duplicate children, list
    /// keys that are not leaves of the member, empty leaf-list candidate sets
    /// or leafref paths, and `InvalidValue` for defaults their type rejects.
    pub fn finish(self, root: ContainerId) -> Result<Arc<Schema>> {
        let schema = Schema {
            types: self.types,
            containers: self.containers,
            root,
        };
        schema.container(root)?;

        for container in &schema.containers {
            if let Some(name) = container.duplicates.first() {
                return Err(invalid(format!(
                    "container {} declares child {} twice",
                    container.name, name
                )));
            }
            for child in container.children.values() {
                validate_child(&schema, container, child)?;
            }
        }

        tracing::debug!(
            type_count = schema.types.len(),
            container_count = schema.containers.len(),
            "schema compiled"
        );
        Ok(Arc::new(schema))
    }
}

fn invalid(reason: String) -> YangError {
    YangError::InvalidSchema { reason }
}

fn validate_child(schema: &Schema, parent: &ContainerSchema, child: &ChildSchema) -> Result<()> {
    match &child.kind {
        ChildKind::Leaf { ty, default } => {
            match ty {
                LeafType::Scalar(id) => {
                    schema.types.get(*id)?;
                    if let Some(value) = default {
                        schema.types.construct(*id, value)?;
                    }
                }
                LeafType::Union(candidates) => {
                    if candidates.is_empty() {
                        return Err(invalid(format!("union leaf {} has no member types", child.name)));
                    }
                    if let Some(value) = default {
                        schema.types.first_fit(candidates, value)?;
                    }
                }
                LeafType::Leafref(spec) => {
                    if spec.path.trim().is_empty() {
                        return Err(invalid(format!("leafref {} has an empty path", child.name)));
                    }
                }
            }
            Ok(())
        }
        ChildKind::LeafList { candidates, .. } => {
            if candidates.is_empty() {
                return Err(invalid(format!("leaf-list {} has no member types", child.name)));
            }
            for id in candidates {
                schema.types.get(*id)?;
            }
            Ok(())
        }
        ChildKind::Container(id) => schema.container(*id).map(|_| ()),
        ChildKind::List { member, keys, .. } => {
            let member_schema = schema.container(*member)?;
            for (i, key) in keys.iter().enumerate() {
                if keys[..i].contains(key) {
                    return Err(invalid(format!("list {} repeats key {}", child.name, key)));
                }
                match member_schema.children.get(key).map(|c| &c.kind) {
                    Some(ChildKind::Leaf { .. }) => {}
                    _ => {
                        return Err(invalid(format!(
                            "key {} of list {}/{} is not a leaf of the list entry",
                            key, parent.name, child.name
                        )))
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BaseType, TypeDef};

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("mtu-size"), "mtu_size");
        assert_eq!(safe_name("ietf.x"), "ietf_x");
        assert_eq!(safe_name("default"), "default_");
        assert_eq!(safe_name("max"), "max_");
        assert_eq!(safe_name("name"), "name");
    }

    #[test]
    fn test_list_key_must_be_member_leaf() {
        let mut builder = SchemaBuilder::default();
        let string = builder
            .types_mut()
            .compile(&TypeDef::new(BaseType::String))
            .unwrap();
        let entry = builder.add_container(
            ContainerSchema::new("entry", "m", "urn:m").with_child(ChildSchema::scalar("id", string)),
        );
        let root = builder.add_container(
            ContainerSchema::new("m", "m", "urn:m").with_child(ChildSchema::list("entry", entry, ["name"])),
        );
        let result = builder.finish(root);
        assert!(matches!(result, Err(YangError::InvalidSchema { .. })));
    }

    #[test]
    fn test_default_is_validated() {
        let mut builder = SchemaBuilder::default();
        let small = builder
            .types_mut()
            .compile(&TypeDef::new(BaseType::Uint8))
            .unwrap();
        let root = builder.add_container(
            ContainerSchema::new("m", "m", "urn:m")
                .with_child(ChildSchema::scalar("count", small).with_default(1000)),
        );
        assert!(matches!(
            builder.finish(root),
            Err(YangError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let mut builder = SchemaBuilder::default();
        let string = builder
            .types_mut()
            .compile(&TypeDef::new(BaseType::String))
            .unwrap();
        let root = builder.add_container(
            ContainerSchema::new("m", "m", "urn:m")
                .with_child(ChildSchema::scalar("a", string))
                .with_child(ChildSchema::scalar("a", string)),
        );
        assert!(matches!(
            builder.finish(root),
            Err(YangError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_choice_path_nesting() {
        let path = ChoicePath::new("transport", "tcp").nested("mode", "active");
        assert_eq!(path.depth(), 2);
        assert_eq!(path.cases, vec!["tcp".to_string(), "active".to_string()]);
    }
}
