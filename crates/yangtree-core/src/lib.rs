//! yangtree Core - In-memory YANG instance trees
//!
//! This crate provides the runtime for schema-driven configuration data,
//! including:
//! - Constrained scalar types (pattern, range, length, enumeration, decimal64)
//!   compiled once into a shared [`TypeRegistry`]
//! - Leaf-lists with first-fit union members and optional uniqueness
//! - Keyed lists with single, composite and generated keys
//! - Change tracking with choice/case exclusivity and presence containers
//! - Path registration and leafref resolution through a [`PathIndex`]
//! - Export of changed or complete subtrees as plain data / JSON
//! - YAML type catalogs
//!
//! # Example
//!
//! ```rust
//! use yangtree_core::schema::{ChildSchema, ContainerSchema, SchemaBuilder};
//! use yangtree_core::types::{BaseType, TypeDef};
//! use yangtree_core::{MemoryPathIndex, Tree};
//!
//! let mut builder = SchemaBuilder::default();
//! let mtu = builder
//!     .types_mut()
//!     .compile(&TypeDef::new(BaseType::Uint16))
//!     .unwrap();
//! let root = builder.add_container(
//!     ContainerSchema::new("device", "dev", "urn:dev")
//!         .with_child(ChildSchema::scalar("mtu", mtu)),
//! );
//! let schema = builder.finish(root).unwrap();
//!
//! let mut tree = Tree::with_index(schema, Box::new(MemoryPathIndex::new())).unwrap();
//! let root = tree.root();
//! tree.set_leaf(root, "mtu", 1500).unwrap();
//! assert_eq!(tree.to_json(true).unwrap()["mtu"], 1500);
//! ```

pub mod catalog;
pub mod collections;
pub mod errors;
pub mod export;
pub mod leafref;
pub mod logging_facility;
pub mod path_index;
pub mod schema;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use catalog::{parse_catalog_file, parse_catalog_str, TypeCatalog};
pub use collections::{KeyArg, ListEntry, ListMut, SequenceMut};
pub use errors::{ExErrorKind, Result, YangError};
pub use export::ExportValue;
pub use leafref::{CrossReference, Resolution};
pub use path_index::{MemoryPathIndex, PathIndex};
pub use schema::{Schema, SchemaBuilder};
pub use tree::{Node, NodeKind, Tree};
pub use types::{ConstrainedValue, ScalarValue, TypeRegistry};
pub use yangtree_core_types::{ContainerId, NodeId, TypeId};
