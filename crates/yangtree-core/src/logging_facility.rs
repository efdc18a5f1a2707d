//! Structured logging facility for yangtree
//!
//! This module provides a canonical logging facility with:
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! The engine itself only emits `tracing::debug!` events for internal
//! details (path registration, choice eviction, reference resolution).
//! Operation boundaries are logged by callers such as the CLI.
//!
//! # Usage
//!
//! ```rust
//! use yangtree_core::logging_facility::{init, Profile};
//!
//! // Initialize once at application startup
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
