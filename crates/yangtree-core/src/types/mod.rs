//! Scalar values and the constrained-type factories
//!
//! Every leaf value is a [`ScalarValue`], a closed tagged variant. Base-type
//! behaviour (coercion, numeric bounds) is dispatched on [`BaseType`], and the
//! schema-declared restrictions are compiled into a [`ScalarType`] descriptor
//! held by a [`TypeRegistry`].

pub mod decimal;
pub mod registry;
pub mod restriction;
pub mod scalar;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub use registry::{TypeDef, TypeRegistry, MEMO_CAPACITY};
pub use restriction::{EnumEntry, Enumeration, Interval, Restriction, RestrictionSpec};
pub use scalar::{ConstrainedValue, ScalarType};

/// Bit field backing the YANG `binary` type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BitString(Vec<bool>);

impl BitString {
    /// Parse a string made only of `0` and `1` characters
    pub fn from_bits_str(s: &str) -> Option<Self> {
        s.chars()
            .map(|c| match c {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Expand bytes into bits, most significant bit first
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let bits = bytes
            .iter()
            .flat_map(|b| (0..8).rev().map(move |i| (b >> i) & 1 == 1))
            .collect();
        Self(bits)
    }

    /// Length in bits
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// A primitive value stored in a leaf or leaf-list element
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Integer(i128),
    Decimal(Decimal),
    Boolean(bool),
    Binary(BitString),
}

impl ScalarValue {
    /// Name of the variant, used in error messages
    pub fn tag(&self) -> &'static str {
        match self {
            ScalarValue::String(_) => "string",
            ScalarValue::Integer(_) => "integer",
            ScalarValue::Decimal(_) => "decimal",
            ScalarValue::Boolean(_) => "boolean",
            ScalarValue::Binary(_) => "binary",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            ScalarValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view used by range predicates
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            ScalarValue::Integer(n) => Decimal::try_from_i128_with_scale(*n, 0).ok(),
            ScalarValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::String(s) => f.write_str(s),
            ScalarValue::Integer(n) => write!(f, "{}", n),
            ScalarValue::Decimal(d) => write!(f, "{}", d),
            ScalarValue::Boolean(b) => write!(f, "{}", b),
            ScalarValue::Binary(bits) => write!(f, "{}", bits),
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::String(s) => serializer.serialize_str(s),
            ScalarValue::Integer(n) => {
                if let Ok(v) = i64::try_from(*n) {
                    serializer.serialize_i64(v)
                } else if let Ok(v) = u64::try_from(*n) {
                    serializer.serialize_u64(v)
                } else {
                    serializer.collect_str(n)
                }
            }
            // decimal64 is carried as a string so no precision is lost
            ScalarValue::Decimal(d) => serializer.collect_str(d),
            ScalarValue::Boolean(b) => serializer.serialize_bool(*b),
            ScalarValue::Binary(bits) => serializer.collect_str(bits),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

impl From<&String> for ScalarValue {
    fn from(value: &String) -> Self {
        ScalarValue::String(value.clone())
    }
}

macro_rules! integer_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ScalarValue {
                fn from(value: $t) -> Self {
                    ScalarValue::Integer(i128::from(value))
                }
            }
        )*
    };
}

integer_from!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<Decimal> for ScalarValue {
    fn from(value: Decimal) -> Self {
        ScalarValue::Decimal(value)
    }
}

impl From<BitString> for ScalarValue {
    fn from(value: BitString) -> Self {
        ScalarValue::Binary(value)
    }
}

/// Built-in YANG base types a restricted type can derive from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    String,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    Boolean,
    Binary,
}

impl BaseType {
    pub fn name(&self) -> &'static str {
        match self {
            BaseType::String => "string",
            BaseType::Int8 => "int8",
            BaseType::Int16 => "int16",
            BaseType::Int32 => "int32",
            BaseType::Int64 => "int64",
            BaseType::Uint8 => "uint8",
            BaseType::Uint16 => "uint16",
            BaseType::Uint32 => "uint32",
            BaseType::Uint64 => "uint64",
            BaseType::Decimal64 => "decimal64",
            BaseType::Boolean => "boolean",
            BaseType::Binary => "binary",
        }
    }

    /// Inclusive bounds of the integer types
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        let bounds = match self {
            BaseType::Int8 => (i128::from(i8::MIN), i128::from(i8::MAX)),
            BaseType::Int16 => (i128::from(i16::MIN), i128::from(i16::MAX)),
            BaseType::Int32 => (i128::from(i32::MIN), i128::from(i32::MAX)),
            BaseType::Int64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
            BaseType::Uint8 => (0, i128::from(u8::MAX)),
            BaseType::Uint16 => (0, i128::from(u16::MAX)),
            BaseType::Uint32 => (0, i128::from(u32::MAX)),
            BaseType::Uint64 => (0, i128::from(u64::MAX)),
            _ => return None,
        };
        Some(bounds)
    }

    pub fn is_integer(&self) -> bool {
        self.integer_bounds().is_some()
    }

    /// Whether `range` restrictions apply to this base
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || *self == BaseType::Decimal64
    }

    /// Whether `length` restrictions apply to this base
    pub fn has_length(&self) -> bool {
        matches!(self, BaseType::String | BaseType::Binary)
    }

    /// Coerce an input value into this base type
    ///
    /// Returns the reason on failure; the caller attaches the type name.
    pub fn coerce(&self, value: &ScalarValue) -> Result<ScalarValue, String> {
        match self {
            BaseType::String => match value {
                ScalarValue::String(_) => Ok(value.clone()),
                other => Err(format!("expected a string, got {}", other.tag())),
            },
            BaseType::Decimal64 => coerce_decimal(value).map(ScalarValue::Decimal),
            BaseType::Boolean => coerce_boolean(value).map(ScalarValue::Boolean),
            BaseType::Binary => match value {
                ScalarValue::Binary(_) => Ok(value.clone()),
                ScalarValue::String(s) => BitString::from_bits_str(s)
                    .map(ScalarValue::Binary)
                    .ok_or_else(|| "binary literals must contain only 0 and 1".to_string()),
                other => Err(format!("expected binary, got {}", other.tag())),
            },
            integer => {
                let n = coerce_integer(value)?;
                let (low, high) = integer.integer_bounds().unwrap_or((i128::MIN, i128::MAX));
                if n < low || n > high {
                    return Err(format!("{} is outside {} bounds", n, integer.name()));
                }
                Ok(ScalarValue::Integer(n))
            }
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn coerce_integer(value: &ScalarValue) -> Result<i128, String> {
    match value {
        ScalarValue::Integer(n) => Ok(*n),
        ScalarValue::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| format!("{:?} is not an integer literal", s)),
        ScalarValue::Decimal(d) if d.fract().is_zero() => Ok(d.normalize().mantissa()),
        other => Err(format!("expected an integer, got {}", other.tag())),
    }
}

fn coerce_decimal(value: &ScalarValue) -> Result<Decimal, String> {
    match value {
        ScalarValue::Decimal(d) => Ok(*d),
        ScalarValue::Integer(n) => Decimal::try_from_i128_with_scale(*n, 0)
            .map_err(|_| format!("{} does not fit a decimal", n)),
        ScalarValue::String(s) => {
            let literal = s.trim();
            Decimal::from_str(literal)
                .or_else(|_| Decimal::from_scientific(literal))
                .map_err(|_| "Invalid decimal number".to_string())
        }
        other => Err(format!("expected a decimal, got {}", other.tag())),
    }
}

fn coerce_boolean(value: &ScalarValue) -> Result<bool, String> {
    match value {
        ScalarValue::Boolean(b) => Ok(*b),
        ScalarValue::Integer(0) => Ok(false),
        ScalarValue::Integer(1) => Ok(true),
        ScalarValue::String(s) => match s.as_str() {
            "true" | "True" | "1" => Ok(true),
            "false" | "False" | "0" => Ok(false),
            _ => Err(format!("{} is an invalid value for a boolean", s)),
        },
        other => Err(format!("{} is an invalid value for a boolean", other)),
    }
}
