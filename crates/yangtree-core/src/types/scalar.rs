//! Compiled type descriptors and the values they produce

use crate::errors::{Result, YangError};
use crate::types::decimal::{check_fraction_digits, quantize};
use crate::types::{BaseType, Enumeration, Restriction, ScalarValue, TypeDef};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use yangtree_core_types::TypeId;

/// An immutable, compiled restricted type
///
/// Built once per distinct [`TypeDef`] by the registry and shared by every
/// value constructed from it.
#[derive(Debug)]
pub struct ScalarType {
    id: TypeId,
    name: String,
    def: TypeDef,
    restrictions: Vec<Restriction>,
    enumeration: Option<Enumeration>,
}

impl ScalarType {
    pub(crate) fn compile(id: TypeId, name: String, def: TypeDef) -> Result<Self> {
        if let Some(digits) = def.fraction_digits {
            if def.base != BaseType::Decimal64 {
                return Err(YangError::InvalidSchema {
                    reason: format!("fraction-digits given for non-decimal type {}", name),
                });
            }
            check_fraction_digits(digits)?;
        }

        let restrictions = def.restrictions.compile(def.base)?;
        let enumeration = restrictions.iter().find_map(|r| match r {
            Restriction::Enumeration(e) => Some(e.clone()),
            _ => None,
        });

        Ok(Self {
            id,
            name,
            def,
            restrictions,
            enumeration,
        })
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> BaseType {
        self.def.base
    }

    pub fn def(&self) -> &TypeDef {
        &self.def
    }

    pub fn restrictions(&self) -> &[Restriction] {
        &self.restrictions
    }

    pub fn enumeration(&self) -> Option<&Enumeration> {
        self.enumeration.as_ref()
    }

    /// Coerce and validate an input, returning the stored form
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` when coercion fails or no restriction accepts
    /// the coerced value.
    pub fn check(&self, input: &ScalarValue) -> Result<ScalarValue> {
        let coerced = self
            .def
            .base
            .coerce(input)
            .map_err(|reason| YangError::invalid_value(&self.name, input, reason))?;

        let coerced = match (coerced, self.def.fraction_digits) {
            (ScalarValue::Decimal(d), Some(digits)) => ScalarValue::Decimal(quantize(d, digits)),
            (value, _) => value,
        };

        if self.restrictions.is_empty() || self.restrictions.iter().any(|r| r.accepts(&coerced)) {
            return Ok(coerced);
        }

        let categories: Vec<&str> = self.restrictions.iter().map(Restriction::category).collect();
        Err(YangError::invalid_value(
            &self.name,
            input,
            format!("does not satisfy any {} restriction", categories.join("/")),
        ))
    }
}

/// A value that passed its type's checks
///
/// Values are immutable; assigning a new value to a leaf constructs and
/// validates a fresh one.
#[derive(Debug, Clone)]
pub struct ConstrainedValue {
    ty: Arc<ScalarType>,
    value: ScalarValue,
}

impl ConstrainedValue {
    /// Construct a value of type `ty`
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` when `ty` rejects the input.
    pub fn new(ty: &Arc<ScalarType>, input: &ScalarValue) -> Result<Self> {
        let value = ty.check(input)?;
        Ok(Self {
            ty: Arc::clone(ty),
            value,
        })
    }

    pub fn value(&self) -> &ScalarValue {
        &self.value
    }

    pub fn into_value(self) -> ScalarValue {
        self.value
    }

    pub fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Current value; with `mapped`, enumeration names become their integers
    pub fn get_value(&self, mapped: bool) -> ScalarValue {
        if mapped {
            if let Some(n) = self
                .ty
                .enumeration()
                .and_then(|e| e.value_of(&self.value.to_string()))
            {
                return ScalarValue::Integer(i128::from(n));
            }
        }
        self.value.clone()
    }
}

impl PartialEq for ConstrainedValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<ScalarValue> for ConstrainedValue {
    fn eq(&self, other: &ScalarValue) -> bool {
        &self.value == other
    }
}

impl fmt::Display for ConstrainedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl Serialize for ConstrainedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}
