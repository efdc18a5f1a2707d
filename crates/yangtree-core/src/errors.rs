use thiserror::Error;

/// Result type alias using YangError
pub type Result<T> = std::result::Result<T, YangError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the instance tree. Each kind maps to a stable error code that can
/// be used for programmatic error handling, testing, and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Value construction
    InvalidValue,
    InvalidMember,
    DuplicateMember,

    // Keyed collections
    DuplicateKey,
    KeyNotFound,
    InvalidKey,

    // Tree structure
    UnmappedChoice,
    NotFound,
    WrongNodeKind,
    KeyLeafLocked,

    // Cross references
    DanglingReference,
    InvalidPointer,

    // Schema compilation
    InvalidSchema,

    // Integration/IO
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidValue => "ERR_INVALID_VALUE",
            ExErrorKind::InvalidMember => "ERR_INVALID_MEMBER",
            ExErrorKind::DuplicateMember => "ERR_DUPLICATE_MEMBER",
            ExErrorKind::DuplicateKey => "ERR_DUPLICATE_KEY",
            ExErrorKind::KeyNotFound => "ERR_KEY_NOT_FOUND",
            ExErrorKind::InvalidKey => "ERR_INVALID_KEY",
            ExErrorKind::UnmappedChoice => "ERR_UNMAPPED_CHOICE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::WrongNodeKind => "ERR_WRONG_NODE_KIND",
            ExErrorKind::KeyLeafLocked => "ERR_KEY_LEAF_LOCKED",
            ExErrorKind::DanglingReference => "ERR_DANGLING_REFERENCE",
            ExErrorKind::InvalidPointer => "ERR_INVALID_POINTER",
            ExErrorKind::InvalidSchema => "ERR_INVALID_SCHEMA",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether an error of this kind means the tree or schema is inconsistent
    ///
    /// Fatal kinds are invariant violations: the caller cannot fix them by
    /// supplying a different value.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExErrorKind::UnmappedChoice | ExErrorKind::InvalidSchema | ExErrorKind::Internal
        )
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for instance tree operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum YangError {
    // ===== Value Errors =====
    /// Value failed base-type coercion or every restriction predicate
    #[error("Invalid value {value:?} for type {type_name}: {reason}")]
    InvalidValue {
        type_name: String,
        value: String,
        reason: String,
    },

    /// No candidate type of a sequence or union accepted the value
    #[error("Cannot add {value:?} to typed sequence (accepts only {accepted:?})")]
    InvalidMember { value: String, accepted: Vec<String> },

    /// Value already present in a unique sequence
    #[error("Values in {path} must be unique: {value:?} is already present")]
    DuplicateMember { path: String, value: String },

    // ===== Keyed Collection Errors =====
    /// Key already present in a list
    #[error("{key:?} is already defined as a list entry of {path}")]
    DuplicateKey { path: String, key: String },

    /// Key absent from a list
    #[error("key {key:?} was not in list {path}")]
    KeyNotFound { path: String, key: String },

    /// Key form or key value not acceptable for this list
    #[error("Invalid key for list {path}: {reason}")]
    InvalidKey { path: String, reason: String },

    // ===== Structural Errors =====
    /// A declared choice field has no unset hook on its container (fatal)
    #[error("Unmapped choice: field {field} of container {container} has no unset hook")]
    UnmappedChoice { container: String, field: String },

    /// No child with this name is declared on the node
    #[error("Node {path} has no child named {name}")]
    UnknownChild { path: String, name: String },

    /// Operation not applicable to this kind of node
    #[error("Node {path} is a {actual}, expected a {expected}")]
    WrongNodeKind {
        path: String,
        expected: String,
        actual: String,
    },

    /// Key leaves of an instantiated list member can only be loaded
    #[error("Cannot set key leaf {path} directly when within an instantiated list")]
    KeyLeafLocked { path: String },

    /// Sequence has no element with this value or at this position
    #[error("{value} is not in sequence {path}")]
    ElementNotFound { path: String, value: String },

    /// Handle refers to a removed node
    #[error("Stale node handle: {node_id}")]
    StaleNode { node_id: String },

    // ===== Cross Reference Errors =====
    /// Required leafref target does not exist
    #[error("no such key ({value}) existed in path ({path})")]
    DanglingReference { path: String, value: String },

    /// A bound reference no longer resolves to exactly one node
    #[error("Invalid pointer specified: {path} resolved to {matches} nodes")]
    InvalidPointer { path: String, matches: usize },

    // ===== Schema Errors =====
    /// Range or length argument is malformed
    #[error("Invalid range or length argument specified: {spec:?}")]
    MalformedRange { spec: String },

    /// Pattern does not compile
    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Restriction category not supported for this base type
    #[error("Unsupported restriction type {category} for base type {base}")]
    UnsupportedRestriction { category: String, base: String },

    /// Schema descriptor is inconsistent
    #[error("Invalid schema: {reason}")]
    InvalidSchema { reason: String },

    // ===== Generic Errors =====
    /// Type catalog could not be read or parsed
    #[error("Type catalog error: {reason}")]
    Catalog { reason: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl YangError {
    /// Classify this error into the canonical kind taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            YangError::InvalidValue { .. } => ExErrorKind::InvalidValue,
            YangError::InvalidMember { .. } => ExErrorKind::InvalidMember,
            YangError::DuplicateMember { .. } => ExErrorKind::DuplicateMember,
            YangError::DuplicateKey { .. } => ExErrorKind::DuplicateKey,
            YangError::KeyNotFound { .. } => ExErrorKind::KeyNotFound,
            YangError::InvalidKey { .. } => ExErrorKind::InvalidKey,
            YangError::UnmappedChoice { .. } => ExErrorKind::UnmappedChoice,
            YangError::UnknownChild { .. }
            | YangError::ElementNotFound { .. }
            | YangError::StaleNode { .. } => ExErrorKind::NotFound,
            YangError::WrongNodeKind { .. } => ExErrorKind::WrongNodeKind,
            YangError::KeyLeafLocked { .. } => ExErrorKind::KeyLeafLocked,
            YangError::DanglingReference { .. } => ExErrorKind::DanglingReference,
            YangError::InvalidPointer { .. } => ExErrorKind::InvalidPointer,
            YangError::MalformedRange { .. }
            | YangError::InvalidPattern { .. }
            | YangError::UnsupportedRestriction { .. }
            | YangError::InvalidSchema { .. } => ExErrorKind::InvalidSchema,
            YangError::Catalog { .. } => ExErrorKind::Io,
            YangError::Serialization { .. } => ExErrorKind::Serialization,
            YangError::Internal { .. } => ExErrorKind::Internal,
        }
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Whether this error is an invariant violation rather than a bad input
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }

    /// Tree path the error was raised at, when it concerns a node
    pub fn path(&self) -> Option<&str> {
        match self {
            YangError::DuplicateMember { path, .. }
            | YangError::DuplicateKey { path, .. }
            | YangError::KeyNotFound { path, .. }
            | YangError::InvalidKey { path, .. }
            | YangError::UnknownChild { path, .. }
            | YangError::WrongNodeKind { path, .. }
            | YangError::KeyLeafLocked { path }
            | YangError::ElementNotFound { path, .. }
            | YangError::DanglingReference { path, .. }
            | YangError::InvalidPointer { path, .. } => Some(path),
            YangError::UnmappedChoice { container, .. } => Some(container),
            _ => None,
        }
    }

    pub(crate) fn invalid_value(
        type_name: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        YangError::InvalidValue {
            type_name: type_name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for YangError {
    fn from(err: serde_json::Error) -> Self {
        YangError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let err = YangError::DuplicateKey {
            path: "/interfaces/interface".to_string(),
            key: "eth0".to_string(),
        };
        assert_eq!(err.code(), "ERR_DUPLICATE_KEY");
        assert_eq!(err.kind(), ExErrorKind::DuplicateKey);
    }

    #[test]
    fn test_schema_errors_share_kind() {
        let malformed = YangError::MalformedRange {
            spec: "1...".to_string(),
        };
        let pattern = YangError::InvalidPattern {
            pattern: "(".to_string(),
            reason: "unclosed group".to_string(),
        };
        assert_eq!(malformed.kind(), ExErrorKind::InvalidSchema);
        assert_eq!(pattern.kind(), ExErrorKind::InvalidSchema);
        assert!(malformed.is_fatal());
    }

    #[test]
    fn test_unmapped_choice_is_fatal() {
        let err = YangError::UnmappedChoice {
            container: "/a".to_string(),
            field: "b".to_string(),
        };
        assert!(err.is_fatal());
        assert!(!YangError::KeyNotFound {
            path: "/l".to_string(),
            key: "k".to_string()
        }
        .is_fatal());
    }

    #[test]
    fn test_display_includes_context() {
        let err = YangError::invalid_value("uint8", 300, "outside uint8 bounds");
        let msg = err.to_string();
        assert!(msg.contains("uint8"));
        assert!(msg.contains("300"));
    }
}
