//! Core types shared across yangtree crates
//!
//! This crate provides the foundational types used by the engine, the
//! logging facility and the CLI:
//!
//! - **Handles**: `NodeId`, `TypeId`, `ContainerId` opaque arena/registry indices
//! - **Schema constants**: Canonical field keys and event names

pub mod handles;
pub mod schema;

pub use handles::{ContainerId, NodeId, TypeId};
