//! Lists and leaf-lists

pub mod keyed;
pub mod sequence;

pub use keyed::{KeyArg, KeyedCollection, ListEntry, ListMut};
pub use sequence::{SequenceMut, TypedSequence};
