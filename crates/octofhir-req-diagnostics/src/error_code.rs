//! Requirement error codes following a structured numbering system
//!
//! Error code ranges:
//! - REQ0100-REQ0199: Configuration errors (malformed rule definitions)
//! - REQ0200-REQ0299: Evaluation errors (runtime)
//! - REQ0300-REQ0399: Model errors (entities, catalog)
//! - REQ0400-REQ0499: System errors

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a configuration error (0100-0199)
    pub const fn is_configuration_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is an evaluation error (0200-0299)
    pub const fn is_evaluation_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a model error (0300-0399)
    pub const fn is_model_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REQ{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Configuration errors (0100-0199)
    map.insert(100, ErrorInfo::new("Invalid requirement definition"));
    map.insert(101, ErrorInfo::new("Requirement has no operators")
        .with_help("Attach at least one operator to the requirement"));
    map.insert(102, ErrorInfo::new("Requirement has no types")
        .with_help("Attach at least one requirement type so the expected models are known"));
    map.insert(103, ErrorInfo::new("Unknown operator")
        .with_help("Register the operator in the operator registry before evaluating"));
    map.insert(104, ErrorInfo::new("Missing numeric threshold"));
    map.insert(105, ErrorInfo::new("Missing timeframe bound"));
    map.insert(106, ErrorInfo::new("Missing or non-temporal timeframe unit"));
    map.insert(107, ErrorInfo::new("Invalid timeframe"));
    map.insert(108, ErrorInfo::new("Invalid regular expression"));
    map.insert(109, ErrorInfo::new("Missing accepted values"));
    map.insert(110, ErrorInfo::new("Undefined requirement"));
    map.insert(111, ErrorInfo::new("Undefined requirement set"));
    map.insert(112, ErrorInfo::new("Circular requirement set reference")
        .with_help("Requirement sets must form a directed acyclic graph"));
    map.insert(113, ErrorInfo::new("Requirement set nesting too deep"));
    map.insert(114, ErrorInfo::new("Vacuous timeframe requirement")
        .with_help("Attach the entities the timeframe should apply to"));

    // Evaluation errors (0200-0299)
    map.insert(200, ErrorInfo::new("Evaluation failed"));
    map.insert(201, ErrorInfo::new("Unsupported entity kind"));

    // Model errors (0300-0399)
    map.insert(300, ErrorInfo::new("Duplicate definition"));
    map.insert(301, ErrorInfo::new("Catalog load failed"));
    map.insert(302, ErrorInfo::new("Catalog serialization failed"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));

    map
});

// Configuration errors
pub const REQ0100: ErrorCode = ErrorCode::new(100);
pub const REQ0101: ErrorCode = ErrorCode::new(101);
pub const REQ0102: ErrorCode = ErrorCode::new(102);
pub const REQ0103: ErrorCode = ErrorCode::new(103);
pub const REQ0104: ErrorCode = ErrorCode::new(104);
pub const REQ0105: ErrorCode = ErrorCode::new(105);
pub const REQ0106: ErrorCode = ErrorCode::new(106);
pub const REQ0107: ErrorCode = ErrorCode::new(107);
pub const REQ0108: ErrorCode = ErrorCode::new(108);
pub const REQ0109: ErrorCode = ErrorCode::new(109);
pub const REQ0110: ErrorCode = ErrorCode::new(110);
pub const REQ0111: ErrorCode = ErrorCode::new(111);
pub const REQ0112: ErrorCode = ErrorCode::new(112);
pub const REQ0113: ErrorCode = ErrorCode::new(113);
pub const REQ0114: ErrorCode = ErrorCode::new(114);

// Evaluation errors
pub const REQ0200: ErrorCode = ErrorCode::new(200);
pub const REQ0201: ErrorCode = ErrorCode::new(201);

// Model errors
pub const REQ0300: ErrorCode = ErrorCode::new(300);
pub const REQ0301: ErrorCode = ErrorCode::new(301);
pub const REQ0302: ErrorCode = ErrorCode::new(302);

// System errors
pub const REQ0400: ErrorCode = ErrorCode::new(400);
