//! Requirement diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by the
//! requirement model and evaluation crates: structured error codes, the
//! umbrella [`RuleError`] type and [`Diagnostic`] reports produced by rule
//! validation.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for requirement operations
pub type Result<T> = std::result::Result<T, RuleError>;
