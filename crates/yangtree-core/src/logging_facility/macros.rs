//! Operation boundary macros
//!
//! Each tree or catalog operation logs one start event and one end or
//! end-error event, all carrying `op` and the calling module. Extra fields
//! follow the `tracing` field syntax, usually the node `path` the operation
//! works on.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use yangtree_core::log_op_start;
/// log_op_start!("list_add");
/// log_op_start!("list_add", path = "/interfaces/interface", list_key = "eth0");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = yangtree_core_types::schema::EVENT_START,
            $($($field)+)?
        );
    };
}

/// Log the successful end of an operation with its duration
///
/// # Example
///
/// ```
/// # use yangtree_core::log_op_end;
/// log_op_end!("tree_export", duration_ms = 3, node_count = 12);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = yangtree_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)+)?
        );
    };
}

/// Log a failed operation
///
/// Takes a `YangError` by value or by reference and records its kind, code,
/// message and, for node errors, the tree path it was raised at.
///
/// # Example
///
/// ```
/// # use yangtree_core::{log_op_error, errors::YangError};
/// let err = YangError::KeyNotFound { path: "/interfaces/interface".to_string(), key: "eth9".to_string() };
/// log_op_error!("list_delete", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let yang_err: &$crate::errors::YangError = &$err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = yangtree_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?yang_err.kind(),
            err.code = yang_err.code(),
            err.path = yang_err.path(),
            error = %yang_err,
            $($($field)+)?
        );
    }};
}
