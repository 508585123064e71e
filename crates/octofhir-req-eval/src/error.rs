//! Evaluation errors for the requirement engine

use octofhir_req_diagnostics::{
    ErrorCode, REQ0101, REQ0102, REQ0103, REQ0104, REQ0105, REQ0106, REQ0107, REQ0108,
    REQ0109, REQ0110, REQ0111, REQ0112, REQ0113, REQ0201, REQ0300, REQ0301, REQ0302,
    RuleError,
};
use octofhir_req_model::ModelError;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating requirements and requirement sets
///
/// Missing patient data is never an error; operators report it as an
/// indeterminate result instead.
#[derive(Debug, Error, Clone)]
pub enum EvalError {
    /// Requirement without any operator
    #[error("Requirement '{requirement}' has no operators")]
    NoOperators { requirement: String },

    /// Requirement without any type
    #[error("Requirement '{requirement}' has no types")]
    NoTypes { requirement: String },

    /// Operator name not present in the registry
    #[error("Requirement '{requirement}' uses unknown operator '{operator}'")]
    UnknownOperator { requirement: String, operator: String },

    /// Threshold operator without `numeric_value`
    #[error("Requirement '{requirement}': operator '{operator}' needs a numeric value")]
    MissingThreshold { requirement: String, operator: String },

    /// Timeframe operator without both window bounds
    #[error("Requirement '{requirement}': timeframe needs both a minimum and a maximum offset")]
    MissingTimeframeBound { requirement: String },

    /// Timeframe operator without a unit, or with a unit that is not a time unit
    #[error("Requirement '{requirement}': timeframe unit {unit} is not a time unit")]
    InvalidTimeframeUnit { requirement: String, unit: String },

    /// Inverted window or fractional calendar offset
    #[error("Requirement '{requirement}': invalid timeframe: {message}")]
    InvalidTimeframe { requirement: String, message: String },

    /// Accepted value that does not compile as a regular expression
    #[error("Requirement '{requirement}': invalid regex '{pattern}': {message}")]
    InvalidRegex {
        requirement: String,
        pattern: String,
        message: String,
    },

    /// Categorical operator without accepted values
    #[error("Requirement '{requirement}': operator '{operator}' needs at least one accepted value")]
    MissingAcceptedValues { requirement: String, operator: String },

    /// Set member that is not in the catalog
    #[error("Requirement set '{set}' references undefined requirement '{name}'")]
    UndefinedRequirement { set: String, name: String },

    /// Set name that is not in the catalog
    #[error("Undefined requirement set '{name}'")]
    UndefinedSet { name: String },

    /// A set reachable from itself
    #[error("Circular requirement set reference: {}", path.join(" -> "))]
    CyclicRequirementSet { path: Vec<String> },

    /// Set graph deeper than the configured limit
    #[error("Requirement set '{set}' exceeds the maximum nesting depth of {limit}")]
    NestingTooDeep { set: String, limit: usize },

    /// Input the entity facade has no adapter for
    #[error("Unsupported entity kind: {type_name}")]
    UnsupportedEntityKind { type_name: String },

    /// Error raised by the entity model or catalog
    #[error(transparent)]
    Model(ModelError),
}

impl EvalError {
    /// Create an unknown operator error
    pub fn unknown_operator(requirement: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            requirement: requirement.into(),
            operator: operator.into(),
        }
    }

    /// Create a missing threshold error
    pub fn missing_threshold(requirement: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::MissingThreshold {
            requirement: requirement.into(),
            operator: operator.into(),
        }
    }

    /// Create an invalid timeframe error
    pub fn invalid_timeframe(requirement: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTimeframe {
            requirement: requirement.into(),
            message: message.into(),
        }
    }

    /// Create an invalid regex error
    pub fn invalid_regex(
        requirement: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRegex {
            requirement: requirement.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a missing accepted values error
    pub fn missing_accepted_values(
        requirement: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        Self::MissingAcceptedValues {
            requirement: requirement.into(),
            operator: operator.into(),
        }
    }

    /// Create an undefined set error
    pub fn undefined_set(name: impl Into<String>) -> Self {
        Self::UndefinedSet { name: name.into() }
    }

    /// Create an unsupported entity error
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::UnsupportedEntityKind {
            type_name: type_name.into(),
        }
    }

    /// Diagnostic code of the error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoOperators { .. } => REQ0101,
            Self::NoTypes { .. } => REQ0102,
            Self::UnknownOperator { .. } => REQ0103,
            Self::MissingThreshold { .. } => REQ0104,
            Self::MissingTimeframeBound { .. } => REQ0105,
            Self::InvalidTimeframeUnit { .. } => REQ0106,
            Self::InvalidTimeframe { .. } => REQ0107,
            Self::InvalidRegex { .. } => REQ0108,
            Self::MissingAcceptedValues { .. } => REQ0109,
            Self::UndefinedRequirement { .. } => REQ0110,
            Self::UndefinedSet { .. } => REQ0111,
            Self::CyclicRequirementSet { .. } => REQ0112,
            Self::NestingTooDeep { .. } => REQ0113,
            Self::UnsupportedEntityKind { .. } => REQ0201,
            Self::Model(ModelError::UnsupportedEntityKind { .. }) => REQ0201,
            Self::Model(ModelError::DuplicateDefinition { .. }) => REQ0300,
            Self::Model(ModelError::ParseError(_)) => REQ0301,
            Self::Model(ModelError::SerializeError(_)) => REQ0302,
        }
    }

    /// Whether the error comes from a malformed rule definition
    pub fn is_configuration(&self) -> bool {
        self.code().is_configuration_error()
    }

    /// Name of the requirement or set the error is about, if any
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::NoOperators { requirement }
            | Self::NoTypes { requirement }
            | Self::UnknownOperator { requirement, .. }
            | Self::MissingThreshold { requirement, .. }
            | Self::MissingTimeframeBound { requirement }
            | Self::InvalidTimeframeUnit { requirement, .. }
            | Self::InvalidTimeframe { requirement, .. }
            | Self::InvalidRegex { requirement, .. }
            | Self::MissingAcceptedValues { requirement, .. } => Some(requirement),
            Self::UndefinedRequirement { set, .. } | Self::NestingTooDeep { set, .. } => Some(set),
            Self::UndefinedSet { name } => Some(name),
            Self::CyclicRequirementSet { path } => path.first().map(String::as_str),
            _ => None,
        }
    }
}

impl From<ModelError> for EvalError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnsupportedEntityKind { type_name } => Self::UnsupportedEntityKind { type_name },
            other => Self::Model(other),
        }
    }
}

impl From<EvalError> for RuleError {
    fn from(err: EvalError) -> Self {
        let code = err.code();
        if code.is_configuration_error() {
            let rule = err.rule().map(str::to_string);
            let error = RuleError::configuration(code, err.to_string());
            return match rule {
                Some(rule) => error.in_rule(rule),
                None => error,
            };
        }
        match err {
            EvalError::UnsupportedEntityKind { .. } => RuleError::unsupported_entity(code, err.to_string()),
            EvalError::Model(model) => model.into(),
            other => RuleError::model(code, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_by_family() {
        assert!(EvalError::unknown_operator("r", "nope").is_configuration());
        assert!(
            EvalError::CyclicRequirementSet {
                path: vec!["a".into(), "b".into(), "a".into()]
            }
            .is_configuration()
        );
        assert!(!EvalError::unsupported("video_file").is_configuration());
        assert_eq!(EvalError::unsupported("video_file").code(), REQ0201);
    }

    #[test]
    fn test_cycle_message_shows_path() {
        let err = EvalError::CyclicRequirementSet {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular requirement set reference: a -> b -> a");
        assert_eq!(err.rule(), Some("a"));
    }

    #[test]
    fn test_into_rule_error_keeps_rule_name() {
        let rule: RuleError = EvalError::missing_threshold("hb_low", "lab_latest_numeric_lower_than_value").into();
        assert!(rule.is_configuration());
        assert_eq!(rule.code(), REQ0104);
        assert_eq!(rule.to_diagnostic().subject.as_deref(), Some("hb_low"));

        let unsupported: RuleError = EvalError::unsupported("report_pdf").into();
        assert!(matches!(unsupported, RuleError::UnsupportedEntity { .. }));
    }

    #[test]
    fn test_model_errors_convert() {
        let err: EvalError = ModelError::unsupported("video_file").into();
        assert!(matches!(err, EvalError::UnsupportedEntityKind { .. }));

        let err: EvalError = ModelError::ParseError("eof".into()).into();
        assert_eq!(err.code(), REQ0301);

        let err: EvalError = ModelError::SerializeError("key must be a string".into()).into();
        assert_eq!(err.code(), REQ0302);
    }
}
