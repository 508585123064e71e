//! Requirement error types

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the rule cannot be evaluated
    Error,
    /// Warning - the rule evaluates but likely not as intended
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message about a rule definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Name of the requirement or requirement set the message is about
    pub subject: Option<String>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            subject: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            subject: None,
            help: None,
        }
    }

    /// Set the rule the diagnostic refers to
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Whether this diagnostic blocks evaluation
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(subject) = &self.subject {
            write!(f, " (in '{}')", subject)?;
        }
        Ok(())
    }
}

/// Umbrella error for requirement evaluation
#[derive(Debug, Clone, Error)]
pub enum RuleError {
    /// Malformed rule definition; always surfaced to the administrator
    #[error("{code}: {message}")]
    Configuration {
        code: ErrorCode,
        message: String,
        rule: Option<String>,
    },

    /// Evaluation input the engine does not recognize
    #[error("{code}: {message}")]
    UnsupportedEntity { code: ErrorCode, message: String },

    /// Model error
    #[error("{code}: {message}")]
    Model { code: ErrorCode, message: String },

    /// System error
    #[error("{code}: {message}")]
    System { code: ErrorCode, message: String },
}

impl RuleError {
    /// Create a configuration error
    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
            rule: None,
        }
    }

    /// Create an unsupported entity error
    pub fn unsupported_entity(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::UnsupportedEntity {
            code,
            message: message.into(),
        }
    }

    /// Create a model error
    pub fn model(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Model {
            code,
            message: message.into(),
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
        }
    }

    /// Attach the name of the offending rule to a configuration error
    pub fn in_rule(self, name: impl Into<String>) -> Self {
        match self {
            Self::Configuration { code, message, .. } => Self::Configuration {
                code,
                message,
                rule: Some(name.into()),
            },
            other => other,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { code, .. } => *code,
            Self::UnsupportedEntity { code, .. } => *code,
            Self::Model { code, .. } => *code,
            Self::System { code, .. } => *code,
        }
    }

    /// Whether this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Configuration { code, message, rule } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(rule) = rule {
                    diag = diag.with_subject(rule.clone());
                }
                if let Some(help) = code.info().help {
                    diag = diag.with_help(help);
                }
                diag
            }
            Self::UnsupportedEntity { code, message }
            | Self::Model { code, message }
            | Self::System { code, message } => Diagnostic::error(*code, message.clone()),
        }
    }
}
