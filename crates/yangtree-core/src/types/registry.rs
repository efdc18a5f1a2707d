//! Type registry
//!
//! Restricted types are compiled once and addressed by [`TypeId`]. Compiling
//! the same [`TypeDef`] twice returns the existing descriptor, so schemas that
//! repeat an inline type share one compiled regex and one enumeration table.
//! The memo is bounded by [`MEMO_CAPACITY`]; past that point new definitions
//! are still compiled but no longer deduplicated.

use crate::errors::{Result, YangError};
use crate::types::{BaseType, ConstrainedValue, RestrictionSpec, ScalarType, ScalarValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use yangtree_core_types::TypeId;

/// Maximum number of distinct definitions remembered for deduplication
pub const MEMO_CAPACITY: usize = 4096;

/// Declarative definition of a restricted type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDef {
    pub base: BaseType,

    /// decimal64 precision; values are rounded half-to-even to this many places
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction_digits: Option<u32>,

    #[serde(default, skip_serializing_if = "RestrictionSpec::is_empty")]
    pub restrictions: RestrictionSpec,
}

impl TypeDef {
    pub fn new(base: BaseType) -> Self {
        Self {
            base,
            fraction_digits: None,
            restrictions: RestrictionSpec::default(),
        }
    }

    pub fn with_fraction_digits(mut self, digits: u32) -> Self {
        self.fraction_digits = Some(digits);
        self
    }

    pub fn with_restrictions(mut self, restrictions: RestrictionSpec) -> Self {
        self.restrictions = restrictions;
        self
    }

    fn canonical_key(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<BaseType> for TypeDef {
    fn from(base: BaseType) -> Self {
        TypeDef::new(base)
    }
}

/// Arena of compiled type descriptors
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: Vec<Arc<ScalarType>>,
    names: HashMap<String, TypeId>,
    memo: HashMap<String, TypeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a definition, reusing an identical earlier one
    ///
    /// # Errors
    ///
    /// Returns a schema error when the definition is inconsistent.
    pub fn compile(&mut self, def: &TypeDef) -> Result<TypeId> {
        self.compile_named(None, def)
    }

    /// Compile a definition and bind it to `name`
    ///
    /// # Errors
    ///
    /// Returns `InvalidSchema` if `name` is already bound, or a schema error
    /// when the definition is inconsistent.
    pub fn define(&mut self, name: &str, def: &TypeDef) -> Result<TypeId> {
        if self.names.contains_key(name) {
            return Err(YangError::InvalidSchema {
                reason: format!("type {} is defined twice", name),
            });
        }
        let id = self.compile_named(Some(name), def)?;
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    fn compile_named(&mut self, name: Option<&str>, def: &TypeDef) -> Result<TypeId> {
        let key = def.canonical_key()?;
        if let Some(id) = self.memo.get(&key) {
            return Ok(*id);
        }

        let index = u32::try_from(self.types.len()).map_err(|_| YangError::Internal {
            message: "type registry is full".to_string(),
        })?;
        let id = TypeId::new(index);
        let name = name.unwrap_or_else(|| def.base.name()).to_string();
        let compiled = ScalarType::compile(id, name, def.clone())?;

        tracing::debug!(type_id = %id, type_name = compiled.name(), "compiled type");
        self.types.push(Arc::new(compiled));
        if self.memo.len() < MEMO_CAPACITY {
            self.memo.insert(key, id);
        }
        Ok(id)
    }

    /// Find a named type
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Descriptor for `id`
    ///
    /// # Errors
    ///
    /// Returns `Internal` when the id was not issued by this registry.
    pub fn get(&self, id: TypeId) -> Result<&Arc<ScalarType>> {
        self.types.get(id.index()).ok_or_else(|| YangError::Internal {
            message: format!("unknown type handle {}", id),
        })
    }

    /// Construct a value of type `id`
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` when the type rejects the input.
    pub fn construct(&self, id: TypeId, input: &ScalarValue) -> Result<ConstrainedValue> {
        ConstrainedValue::new(self.get(id)?, input)
    }

    /// Construct with the first candidate type that accepts the input
    ///
    /// Candidate failures are not reported individually.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMember` when no candidate accepts the input.
    pub fn first_fit(&self, candidates: &[TypeId], input: &ScalarValue) -> Result<ConstrainedValue> {
        let mut accepted = Vec::with_capacity(candidates.len());
        for id in candidates {
            let ty = self.get(*id)?;
            if let Ok(value) = ConstrainedValue::new(ty, input) {
                return Ok(value);
            }
            accepted.push(ty.name().to_string());
        }
        Err(YangError::InvalidMember {
            value: input.to_string(),
            accepted,
        })
    }

    /// Registered names in arbitrary order
    pub fn names(&self) -> impl Iterator<Item = (&str, TypeId)> {
        self.names.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Number of compiled descriptors
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_definitions_share_descriptor() {
        let mut registry = TypeRegistry::new();
        let def = TypeDef::new(BaseType::Uint8)
            .with_restrictions(RestrictionSpec::new().with_range("1..10"));
        let first = registry.compile(&def).unwrap();
        let second = registry.compile(&def.clone()).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);

        let other = registry.compile(&TypeDef::new(BaseType::Uint8)).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_define_and_lookup() {
        let mut registry = TypeRegistry::new();
        let id = registry
            .define(
                "percent",
                &TypeDef::new(BaseType::Uint8)
                    .with_restrictions(RestrictionSpec::new().with_range("0..100")),
            )
            .unwrap();
        assert_eq!(registry.lookup("percent"), Some(id));
        assert_eq!(registry.get(id).unwrap().name(), "percent");
        assert!(registry.construct(id, &ScalarValue::from(100)).is_ok());
        assert!(registry.construct(id, &ScalarValue::from(101)).is_err());
    }

    #[test]
    fn test_define_twice_rejected() {
        let mut registry = TypeRegistry::new();
        registry.define("t", &TypeDef::new(BaseType::String)).unwrap();
        assert!(matches!(
            registry.define("t", &TypeDef::new(BaseType::String)),
            Err(YangError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_first_fit_order() {
        let mut registry = TypeRegistry::new();
        let int = registry.compile(&TypeDef::new(BaseType::Int32)).unwrap();
        let string = registry.compile(&TypeDef::new(BaseType::String)).unwrap();

        let value = registry.first_fit(&[int, string], &"42".into()).unwrap();
        assert_eq!(value.value(), &ScalarValue::Integer(42));

        let value = registry.first_fit(&[string, int], &"42".into()).unwrap();
        assert_eq!(value.value(), &ScalarValue::from("42"));

        let err = registry.first_fit(&[int], &"x".into()).unwrap_err();
        assert!(matches!(err, YangError::InvalidMember { ref accepted, .. } if accepted == &vec!["int32".to_string()]));
    }

    #[test]
    fn test_unknown_handle() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            registry.get(TypeId::new(3)),
            Err(YangError::Internal { .. })
        ));
    }
}
