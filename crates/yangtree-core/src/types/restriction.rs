//! Restriction specs and their compiled predicates
//!
//! A [`RestrictionSpec`] is the declarative form read from a schema or a type
//! catalog. Compiling it against a base type yields one [`Restriction`] per
//! category. A value satisfies a restricted type when any one of its compiled
//! restrictions accepts it.

use crate::errors::{Result, YangError};
use crate::types::{BaseType, ScalarValue};
use indexmap::IndexMap;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// One `enum` statement of an enumeration restriction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumEntry {
    /// Explicit `value` statement, auto-assigned when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

/// Declarative restriction arguments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestrictionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Range arguments such as `"1..10, 20..max"` or `"5"`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub range: Vec<String>,

    /// Length arguments, counted in characters (strings) or bytes (binary)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub length: Vec<String>,

    /// Enumeration names; keys starting with `@` are metadata and ignored
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dict_key: IndexMap<String, EnumEntry>,
}

impl RestrictionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.range.is_empty()
            && self.length.is_empty()
            && self.dict_key.is_empty()
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range.push(range.into());
        self
    }

    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length.push(length.into());
        self
    }

    /// Add enumeration names without explicit values
    pub fn with_enum<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.dict_key.insert(name.into(), EnumEntry::default());
        }
        self
    }

    /// Add one enumeration name with an explicit value
    pub fn with_enum_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.dict_key
            .insert(name.into(), EnumEntry { value: Some(value) });
        self
    }

    /// Compile every configured category against `base`
    ///
    /// # Errors
    ///
    /// Returns a schema error when a range or length argument is malformed,
    /// a pattern does not compile, or a category does not apply to `base`.
    pub fn compile(&self, base: BaseType) -> Result<Vec<Restriction>> {
        let mut compiled = Vec::new();

        if let Some(pattern) = &self.pattern {
            if base != BaseType::String {
                return Err(unsupported("pattern", base));
            }
            compiled.push(Restriction::pattern(pattern)?);
        }

        if !self.range.is_empty() {
            if !base.is_numeric() {
                return Err(unsupported("range", base));
            }
            let mut intervals = Vec::new();
            for spec in &self.range {
                intervals.extend(parse_intervals(spec, |bound| range_bound(bound, base))?);
            }
            compiled.push(Restriction::Range(intervals));
        }

        if !self.length.is_empty() {
            if !base.has_length() {
                return Err(unsupported("length", base));
            }
            let multiplier: u64 = if base == BaseType::Binary { 8 } else { 1 };
            let mut intervals = Vec::new();
            for spec in &self.length {
                intervals.extend(parse_intervals(spec, |bound| {
                    bound.parse::<u64>().ok()?.checked_mul(multiplier)
                })?);
            }
            compiled.push(Restriction::Length(intervals));
        }

        if !self.dict_key.is_empty() {
            compiled.push(Restriction::Enumeration(Enumeration::from_entries(
                &self.dict_key,
            )));
        }

        Ok(compiled)
    }
}

fn unsupported(category: &str, base: BaseType) -> YangError {
    YangError::UnsupportedRestriction {
        category: category.to_string(),
        base: base.name().to_string(),
    }
}

fn range_bound(bound: &str, base: BaseType) -> Option<Decimal> {
    let value = Decimal::from_str(bound).ok()?;
    if base.is_integer() && !value.fract().is_zero() {
        return None;
    }
    Some(value)
}

/// One alternative of a range or length argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interval<T> {
    /// `low..high`; `None` stands for `min` or `max`
    Between { low: Option<T>, high: Option<T> },
    /// A single value, matched by equality
    Exactly(T),
}

impl<T: PartialOrd> Interval<T> {
    pub fn contains(&self, value: &T) -> bool {
        match self {
            Interval::Exactly(expected) => value == expected,
            Interval::Between { low, high } => {
                low.as_ref().map_or(true, |low| value >= low)
                    && high.as_ref().map_or(true, |high| value <= high)
            }
        }
    }
}

/// Parse a range or length argument into its alternatives
///
/// Alternatives are separated by `,` or `|`. Each one is either
/// `low..high` (with `min` and `max` accepted as open bounds) or a single
/// value.
///
/// # Errors
///
/// Returns `MalformedRange` when an alternative does not parse.
pub fn parse_intervals<T, F>(spec: &str, parse_bound: F) -> Result<Vec<Interval<T>>>
where
    F: Fn(&str) -> Option<T>,
{
    let malformed = || YangError::MalformedRange {
        spec: spec.to_string(),
    };

    let mut intervals = Vec::new();
    for part in spec.split([',', '|']).map(str::trim) {
        if part.is_empty() {
            return Err(malformed());
        }
        let interval = match part.split_once("..") {
            Some((low, high)) => {
                let low = match low.trim() {
                    "min" => None,
                    bound => Some(parse_bound(bound).ok_or_else(malformed)?),
                };
                let high = match high.trim() {
                    "max" => None,
                    bound => Some(parse_bound(bound).ok_or_else(malformed)?),
                };
                Interval::Between { low, high }
            }
            None => Interval::Exactly(parse_bound(part).ok_or_else(malformed)?),
        };
        intervals.push(interval);
    }
    Ok(intervals)
}

/// Anchor a YANG pattern for whole-value matching
///
/// YANG patterns are implicitly anchored, so a leading `^` and trailing `$`
/// are dropped and any other unescaped `$` is matched literally.
pub fn anchored_pattern(pattern: &str) -> String {
    let body = pattern.strip_prefix('^').unwrap_or(pattern);
    let body = match body.strip_suffix('$') {
        Some(stripped) if !ends_in_escape(stripped) => stripped,
        _ => body,
    };

    let mut escaped = String::with_capacity(body.len() + 8);
    let mut backslashes = 0usize;
    for c in body.chars() {
        if c == '$' && backslashes % 2 == 0 {
            escaped.push('\\');
        }
        escaped.push(c);
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
    }
    format!("^(?:{})$", escaped)
}

/// Whether `text` ends in an odd run of backslashes
fn ends_in_escape(text: &str) -> bool {
    text.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Enumeration names with their assigned integer values
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Enumeration {
    values: IndexMap<String, i64>,
}

impl Enumeration {
    /// Build from declared entries, auto-numbering those without a value
    ///
    /// Auto values count up from zero in declaration order, skipping any
    /// value claimed explicitly by another entry.
    pub fn from_entries(entries: &IndexMap<String, EnumEntry>) -> Self {
        let declared: Vec<(&String, &EnumEntry)> = entries
            .iter()
            .filter(|(name, _)| !name.starts_with('@'))
            .collect();
        let explicit: HashSet<i64> = declared.iter().filter_map(|(_, e)| e.value).collect();

        let mut values = IndexMap::new();
        let mut counter: i64 = 0;
        for (name, entry) in declared {
            while explicit.contains(&counter) {
                counter += 1;
            }
            values.insert(name.clone(), entry.value.unwrap_or(counter));
            counter += 1;
        }
        Self { values }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Integer assigned to `name`
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A compiled restriction predicate
#[derive(Debug, Clone)]
pub enum Restriction {
    Pattern { source: String, regex: Regex },
    Range(Vec<Interval<Decimal>>),
    Length(Vec<Interval<u64>>),
    Enumeration(Enumeration),
}

impl Restriction {
    /// Compile a pattern restriction
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` when the anchored expression does not compile.
    pub fn pattern(source: &str) -> Result<Self> {
        let regex = Regex::new(&anchored_pattern(source)).map_err(|e| {
            YangError::InvalidPattern {
                pattern: source.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Restriction::Pattern {
            source: source.to_string(),
            regex,
        })
    }

    pub fn category(&self) -> &'static str {
        match self {
            Restriction::Pattern { .. } => "pattern",
            Restriction::Range(_) => "range",
            Restriction::Length(_) => "length",
            Restriction::Enumeration(_) => "dict_key",
        }
    }

    /// Whether a coerced value satisfies this predicate
    pub fn accepts(&self, value: &ScalarValue) -> bool {
        match self {
            Restriction::Pattern { regex, .. } => match value {
                ScalarValue::String(s) => regex.is_match(s),
                _ => false,
            },
            Restriction::Range(intervals) => value
                .as_decimal()
                .is_some_and(|n| intervals.iter().any(|i| i.contains(&n))),
            Restriction::Length(intervals) => {
                let len = match value {
                    ScalarValue::String(s) => s.chars().count() as u64,
                    ScalarValue::Binary(bits) => bits.len() as u64,
                    _ => return false,
                };
                intervals.iter().any(|i| i.contains(&len))
            }
            Restriction::Enumeration(enumeration) => enumeration.contains(&value.to_string()),
        }
    }
}
