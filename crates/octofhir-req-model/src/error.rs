//! Model errors

use octofhir_req_diagnostics::{REQ0201, REQ0300, REQ0301, REQ0302, RuleError};

/// Errors raised by the entity model and the definition catalog
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Unsupported entity kind: {type_name}")]
    UnsupportedEntityKind { type_name: String },

    #[error("Duplicate {kind} definition: {name}")]
    DuplicateDefinition { kind: &'static str, name: String },

    #[error("Catalog parse error: {0}")]
    ParseError(String),

    #[error("Catalog serialization error: {0}")]
    SerializeError(String),
}

impl ModelError {
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::UnsupportedEntityKind {
            type_name: type_name.into(),
        }
    }
}

impl From<ModelError> for RuleError {
    fn from(err: ModelError) -> Self {
        match &err {
            ModelError::UnsupportedEntityKind { .. } => {
                RuleError::unsupported_entity(REQ0201, err.to_string())
            }
            ModelError::DuplicateDefinition { .. } => RuleError::model(REQ0300, err.to_string()),
            ModelError::ParseError(_) => RuleError::model(REQ0301, err.to_string()),
            ModelError::SerializeError(_) => RuleError::model(REQ0302, err.to_string()),
        }
    }
}
