//! YAML type catalogs
//!
//! A catalog declares named scalar types for one module:
//!
//! ```yaml
//! schema_version: 0
//! module: interfaces
//! types:
//!   mtu:
//!     base: uint16
//!     range: "68..9216"
//!   admin-status:
//!     base: string
//!     dict_key: [up, down, testing]
//!   ratio:
//!     base: decimal64
//!     fraction_digits: 2
//! ```
//!
//! `range` and `length` take one string or a list of alternatives;
//! `dict_key` takes a list of names or a map of names to `{value: n}`.

use crate::errors::{Result, YangError};
use crate::types::{BaseType, EnumEntry, RestrictionSpec, TypeDef, TypeRegistry};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CATALOG_SCHEMA_VERSION: u32 = 0;

/// Top-level catalog file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeCatalog {
    /// Schema version (must be 0 for this format)
    pub schema_version: u32,

    /// Module defining the types
    pub module: String,

    /// Named types in declaration order
    #[serde(default)]
    pub types: IndexMap<String, CatalogType>,
}

/// One named type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogType {
    pub base: BaseType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction_digits: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_arguments",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub range: Vec<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_arguments",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub length: Vec<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_enum",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub dict_key: IndexMap<String, EnumEntry>,
}

impl CatalogType {
    pub fn to_type_def(&self) -> TypeDef {
        let restrictions = RestrictionSpec {
            pattern: self.pattern.clone(),
            range: self.range.clone(),
            length: self.length.clone(),
            dict_key: self.dict_key.clone(),
        };
        let mut def = TypeDef::new(self.base).with_restrictions(restrictions);
        def.fraction_digits = self.fraction_digits;
        def
    }
}

impl TypeCatalog {
    /// Compile every type into a fresh registry, in declaration order
    ///
    /// # Errors
    ///
    /// Returns the first compile error (`MalformedRange`, `InvalidPattern`,
    /// `UnsupportedRestriction`, `InvalidSchema`).
    pub fn compile(&self) -> Result<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        self.compile_into(&mut registry)?;
        Ok(registry)
    }

    /// Compile every type into an existing registry
    ///
    /// # Errors
    ///
    /// As [`TypeCatalog::compile`]; names already defined in `registry` are
    /// rejected with `InvalidSchema`.
    pub fn compile_into(&self, registry: &mut TypeRegistry) -> Result<()> {
        for (name, ty) in &self.types {
            if let Err(err) = registry.define(name, &ty.to_type_def()) {
                tracing::debug!(
                    module = %self.module,
                    type_name = %name,
                    error_code = err.code(),
                    "catalog type rejected"
                );
                return Err(err);
            }
        }
        tracing::debug!(module = %self.module, type_count = self.types.len(), "compiled catalog");
        Ok(())
    }
}

fn catalog_error(reason: impl Into<String>) -> YangError {
    YangError::Catalog {
        reason: reason.into(),
    }
}

/// Parse a catalog file from a path
///
/// # Errors
///
/// Returns `Catalog` when the file cannot be read or is not a valid catalog.
pub fn parse_catalog_file(path: &Path) -> Result<TypeCatalog> {
    let content = fs::read_to_string(path)
        .map_err(|e| catalog_error(format!("Failed to read catalog file: {}", e)))?;
    parse_catalog_str(&content)
}

/// Parse a catalog from a string
///
/// # Errors
///
/// Returns `Catalog` for YAML errors, unknown fields and unsupported
/// schema versions.
pub fn parse_catalog_str(content: &str) -> Result<TypeCatalog> {
    let catalog: TypeCatalog = serde_yaml::from_str(content)
        .map_err(|e| catalog_error(format!("YAML parse error: {}", e)))?;

    if catalog.schema_version != CATALOG_SCHEMA_VERSION {
        return Err(catalog_error(format!(
            "Unsupported schema_version: {}. Expected {}",
            catalog.schema_version, CATALOG_SCHEMA_VERSION
        )));
    }
    if catalog.module.trim().is_empty() {
        return Err(catalog_error("module name must not be empty"));
    }
    Ok(catalog)
}

/// Accept a single argument or a list of alternatives
fn deserialize_arguments<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct ArgumentsVisitor;

    impl<'de> Visitor<'de> for ArgumentsVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a range/length argument or a list of them")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Vec<String>, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Vec<String>, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Vec<String>, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Vec<String>, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut arguments = Vec::new();
            while let Some(argument) = seq.next_element::<serde_yaml::Value>()? {
                match argument {
                    serde_yaml::Value::String(s) => arguments.push(s),
                    serde_yaml::Value::Number(n) => arguments.push(n.to_string()),
                    other => {
                        return Err(de::Error::custom(format!(
                            "unsupported argument {:?}",
                            other
                        )))
                    }
                }
            }
            Ok(arguments)
        }
    }

    deserializer.deserialize_any(ArgumentsVisitor)
}

/// Accept a list of enumeration names or a map of names to entries
fn deserialize_enum<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, EnumEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, MapAccess, SeqAccess, Visitor};
    use std::fmt;

    struct EnumVisitor;

    impl<'de> Visitor<'de> for EnumVisitor {
        type Value = IndexMap<String, EnumEntry>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a list of names or a map of names to {value: n}")
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut entries = IndexMap::new();
            while let Some(name) = seq.next_element::<String>()? {
                entries.insert(name, EnumEntry::default());
            }
            Ok(entries)
        }

        fn visit_map<M>(self, mut map: M) -> std::result::Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut entries = IndexMap::new();
            while let Some(name) = map.next_key::<String>()? {
                let entry = map.next_value::<Option<EnumEntry>>()?;
                if entries.insert(name.clone(), entry.unwrap_or_default()).is_some() {
                    return Err(de::Error::custom(format!("duplicate enum name {}", name)));
                }
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(EnumVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarValue;

    const CATALOG: &str = r#"
schema_version: 0
module: interfaces
types:
  mtu:
    base: uint16
    range: "68..9216"
  admin-status:
    base: string
    dict_key: [up, down, testing]
  oper-status:
    base: string
    dict_key:
      up: {value: 1}
      down:
      "@module": {}
  ratio:
    base: decimal64
    fraction_digits: 2
    range: ["0..1", "5"]
"#;

    #[test]
    fn test_parse_minimal_catalog() {
        let catalog = parse_catalog_str(CATALOG).unwrap();
        assert_eq!(catalog.module, "interfaces");
        assert_eq!(catalog.types.len(), 4);
        assert_eq!(catalog.types["mtu"].range, vec!["68..9216".to_string()]);
        assert_eq!(catalog.types["ratio"].range.len(), 2);
        assert_eq!(catalog.types["oper-status"].dict_key["up"].value, Some(1));
    }

    #[test]
    fn test_compile_registers_names() {
        let registry = parse_catalog_str(CATALOG).unwrap().compile().unwrap();
        let mtu = registry.lookup("mtu").unwrap();
        assert!(registry.construct(mtu, &ScalarValue::from(1500)).is_ok());
        assert!(registry.construct(mtu, &ScalarValue::from(10)).is_err());

        let status = registry.lookup("oper-status").unwrap();
        let ty = registry.get(status).unwrap();
        assert_eq!(ty.enumeration().map(|e| e.len()), Some(2));
    }

    #[test]
    fn test_rejects_wrong_version() {
        let result = parse_catalog_str("schema_version: 3\nmodule: m\n");
        assert!(matches!(result, Err(YangError::Catalog { .. })));
    }

    #[test]
    fn test_rejects_unknown_restriction() {
        let yaml = "schema_version: 0\nmodule: m\ntypes:\n  t:\n    base: string\n    bits: [a]\n";
        let result = parse_catalog_str(yaml);
        assert!(matches!(result, Err(YangError::Catalog { .. })));
    }
}
