//! Clinical requirement evaluation for Rust
//!
//! This crate bundles the requirement engine:
//! - Domain entities and their links snapshots
//! - Requirement, requirement set and catalog definitions
//! - Operator dispatch and requirement set composition
//! - Rule validation with structured diagnostics
//!
//! # Example
//!
//! ```ignore
//! use octofhir_req::{EvaluationContext, RequirementEngine, Subject, load_catalog};
//!
//! let catalog = load_catalog(include_str!("catalog.json"))?;
//! let engine = RequirementEngine::new();
//! let ctx = EvaluationContext::builder().build();
//!
//! let report = engine.explain_set(&catalog, "colonoscopy_quality", &Subject::new(examination), &ctx)?;
//! println!("{report}");
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_req_diagnostics as diagnostics;
pub use octofhir_req_eval as eval;
pub use octofhir_req_model as model;

// Convenience re-exports
pub use octofhir_req_diagnostics::{Diagnostic, ErrorCode, Result, RuleError, Severity};
pub use octofhir_req_eval::{
    EvalError, EvaluationContext, EvaluationMode, EvaluationOptions, EvaluationReport,
    OperatorRegistry, RequirementEngine, Satisfaction, Subject, VacuousTimeframe,
};
pub use octofhir_req_model::{
    DomainEntity, Requirement, RequirementCatalog, RequirementSet, RequirementSetType, RequirementType,
};

/// Parse a catalog document and reject it if it has validation errors.
/// Warning diagnostics do not fail the load.
pub fn load_catalog(json: &str) -> Result<RequirementCatalog> {
    let catalog = RequirementCatalog::from_json(json)?;
    let engine = RequirementEngine::new();
    if let Some(error) = engine
        .validate_catalog(&catalog)
        .into_iter()
        .find(Diagnostic::is_error)
    {
        let rule_error = RuleError::configuration(error.code, error.message);
        return Err(match error.subject {
            Some(subject) => rule_error.in_rule(subject),
            None => rule_error,
        });
    }
    Ok(catalog)
}
