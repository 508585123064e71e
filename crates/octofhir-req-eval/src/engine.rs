//! Requirement evaluation engine
//!
//! This module provides the [`RequirementEngine`], which evaluates single
//! requirements against a [`Subject`]. Set composition, validation and batch
//! evaluation are implemented in their own modules on the same type.

use crate::context::EvaluationContext;
use crate::error::{EvalError, EvalResult};
use crate::registry::{OperatorInput, OperatorRegistry};
use crate::satisfaction::Satisfaction;
use crate::subject::{ResolvedValues, Subject};
use crate::validation::inspect_requirement;
use log::{debug, warn};
use octofhir_req_model::{DomainEntity, Requirement, RequirementCatalog, RequirementLinks, get_links};
use rayon::prelude::*;

/// The requirement evaluation engine
///
/// Holds the operator registry and nothing else; every call is pure for a
/// fixed context, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct RequirementEngine {
    /// Operator registry
    registry: OperatorRegistry,
}

impl Default for RequirementEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementEngine {
    /// Create a new engine with the standard operators
    pub fn new() -> Self {
        Self {
            registry: OperatorRegistry::with_standard_operators(),
        }
    }

    /// Create an engine with a custom registry
    pub fn with_registry(registry: OperatorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Get a mutable reference to the registry
    pub fn registry_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.registry
    }

    /// Whether the requirement holds for the subject
    ///
    /// Indeterminate outcomes count as not satisfied.
    pub fn evaluate(
        &self,
        requirement: &Requirement,
        subject: &Subject,
        ctx: &EvaluationContext,
    ) -> EvalResult<bool> {
        Ok(self.assess(requirement, subject, ctx)?.is_satisfied())
    }

    /// Three-valued outcome of the requirement for the subject
    ///
    /// Operators attached to the requirement are OR'd in order and the first
    /// satisfied one decides. The outcome is not satisfied only when every
    /// operator is; otherwise some operator lacked data and the outcome is
    /// indeterminate.
    pub fn assess(
        &self,
        requirement: &Requirement,
        subject: &Subject,
        ctx: &EvaluationContext,
    ) -> EvalResult<Satisfaction> {
        let inspection = inspect_requirement(&self.registry, requirement);
        if let Some(error) = inspection.errors.into_iter().next() {
            return Err(error);
        }
        if !self.is_applicable(requirement, subject.primary(), ctx)? {
            debug!(
                "Requirement '{}' does not apply to {}",
                requirement.name,
                subject.primary().type_name()
            );
            return Ok(Satisfaction::NotSatisfied);
        }

        let links = self.subject_links(subject, ctx)?;
        let values = ResolvedValues::collect(subject, ctx.mode());
        let input = OperatorInput {
            requirement,
            subject: &links,
            values: &values,
            context: ctx,
            patterns: &inspection.patterns,
        };

        let mut all_not_satisfied = true;
        for operator in requirement.operators() {
            let implementation = self
                .registry
                .get(operator.name())
                .ok_or_else(|| EvalError::unknown_operator(&requirement.name, operator.name()))?;
            let outcome = implementation(&input)?;
            debug!("'{}': {} -> {}", requirement.name, operator, outcome);
            match outcome {
                Satisfaction::Satisfied => return Ok(Satisfaction::Satisfied),
                Satisfaction::NotSatisfied => {}
                Satisfaction::Indeterminate => all_not_satisfied = false,
            }
        }

        Ok(if all_not_satisfied {
            Satisfaction::NotSatisfied
        } else {
            Satisfaction::Indeterminate
        })
    }

    /// Evaluate many `(set name, subject)` pairs in parallel with one shared
    /// context
    pub fn evaluate_batch<S>(
        &self,
        catalog: &RequirementCatalog,
        jobs: &[(S, Subject)],
        ctx: &EvaluationContext,
    ) -> Vec<EvalResult<bool>>
    where
        S: AsRef<str> + Sync,
    {
        debug!("Evaluating batch of {} subjects at {}", jobs.len(), ctx.now());
        jobs.par_iter()
            .map(|(set, subject)| self.evaluate_set(catalog, set.as_ref(), subject, ctx))
            .collect()
    }

    fn is_applicable(
        &self,
        requirement: &Requirement,
        primary: &DomainEntity,
        ctx: &EvaluationContext,
    ) -> EvalResult<bool> {
        let empty_collection = matches!(primary, DomainEntity::Collection(members) if members.is_empty());
        if !primary.is_supported() || empty_collection {
            if ctx.is_strict() {
                return Err(EvalError::unsupported(primary.type_name()));
            }
            warn!(
                "Requirement '{}' evaluated against unsupported input {}",
                requirement.name,
                primary.type_name()
            );
            return Ok(false);
        }

        let expected = requirement.expected_models();
        Ok(primary
            .leaves()
            .iter()
            .all(|leaf| leaf.kind().is_some_and(|kind| expected.contains(&kind))))
    }

    /// Links of the primary merged with those of every supported secondary
    fn subject_links(&self, subject: &Subject, ctx: &EvaluationContext) -> EvalResult<RequirementLinks> {
        let mut links = get_links(subject.primary())?;
        for secondary in subject.secondary() {
            match get_links(secondary) {
                Ok(secondary_links) => links.merge(secondary_links),
                Err(err) if !ctx.is_strict() => {
                    warn!("Skipping secondary input {}: {}", secondary.type_name(), err);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationMode;
    use crate::operators::{LAB_LATEST_NUMERIC_INCREASED, MODELS_MATCH_ANY};
    use chrono::{TimeZone, Utc};
    use octofhir_req_model::{
        LabValueDefinition, LinkCategory, NormalRange, OpaqueEntity, Patient, PatientDisease,
        PatientLabValue, RequirementType,
    };
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn ctx() -> EvaluationContext {
        EvaluationContext::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
    }

    fn ckd() -> Requirement {
        Requirement::new("ckd")
            .with_operator(MODELS_MATCH_ANY)
            .with_type(RequirementType::PatientDisease)
            .with_link(LinkCategory::Diseases, ["ckd_3", "ckd_4"])
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RequirementEngine>();
    }

    #[test]
    fn test_evaluate_matching_disease() {
        let engine = RequirementEngine::new();
        let hit = Subject::new(PatientDisease::new("ckd_4"));
        let miss = Subject::new(PatientDisease::new("asthma"));

        assert!(engine.evaluate(&ckd(), &hit, &ctx()).unwrap());
        assert!(!engine.evaluate(&ckd(), &miss, &ctx()).unwrap());
    }

    #[test]
    fn test_not_applicable_primary() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(Patient::new("p1"));
        assert_eq!(engine.assess(&ckd(), &subject, &ctx()).unwrap(), Satisfaction::NotSatisfied);
    }

    #[test]
    fn test_definition_errors() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(PatientDisease::new("ckd_4"));

        let no_ops = Requirement::new("bare").with_type(RequirementType::PatientDisease);
        assert!(matches!(
            engine.evaluate(&no_ops, &subject, &ctx()),
            Err(EvalError::NoOperators { .. })
        ));

        let no_types = Requirement::new("untyped").with_operator(MODELS_MATCH_ANY);
        assert!(matches!(
            engine.evaluate(&no_types, &subject, &ctx()),
            Err(EvalError::NoTypes { .. })
        ));

        let unknown = ckd().with_operator("does_not_exist");
        assert!(matches!(
            engine.evaluate(&unknown, &subject, &ctx()),
            Err(EvalError::UnknownOperator { .. })
        ));
    }

    #[test]
    fn test_unsupported_primary_by_mode() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(OpaqueEntity::new("Invoice"));

        assert!(!engine.evaluate(&ckd(), &subject, &ctx()).unwrap());

        let strict = EvaluationContext::builder()
            .now(ctx().now())
            .mode(EvaluationMode::Strict)
            .build();
        assert!(matches!(
            engine.evaluate(&ckd(), &subject, &strict),
            Err(EvalError::UnsupportedEntityKind { .. })
        ));
    }

    #[test]
    fn test_unsupported_secondary_by_mode() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(PatientDisease::new("ckd_3")).with_secondary(OpaqueEntity::new("Invoice"));
        assert!(engine.evaluate(&ckd(), &subject, &ctx()).unwrap());

        let strict = EvaluationContext::builder()
            .now(ctx().now())
            .mode(EvaluationMode::Strict)
            .build();
        assert!(engine.evaluate(&ckd(), &subject, &strict).is_err());
    }

    #[test]
    fn test_operators_are_ored() {
        let engine = RequirementEngine::new();
        let hb = Arc::new(
            LabValueDefinition::new("hemoglobin")
                .with_normal_range(NormalRange::between(Decimal::from(12), Decimal::from(16))),
        );
        let reading = PatientLabValue::numeric(hb, Decimal::from(18), ctx().now());
        let requirement = Requirement::new("high_hb")
            .with_operator(MODELS_MATCH_ANY)
            .with_operator(LAB_LATEST_NUMERIC_INCREASED)
            .with_type(RequirementType::PatientLabValue)
            .with_link(LinkCategory::LabValues, ["hemoglobin"]);

        let outcome = engine.assess(&requirement, &Subject::new(reading), &ctx()).unwrap();
        assert_eq!(outcome, Satisfaction::Satisfied);
    }

    #[test]
    fn test_custom_operator() {
        let mut engine = RequirementEngine::new();
        engine
            .registry_mut()
            .register_fn("always", |_| Ok(Satisfaction::Satisfied));
        let requirement = Requirement::new("custom")
            .with_operator("always")
            .with_type(RequirementType::Patient);

        assert!(engine.evaluate(&requirement, &Subject::new(Patient::new("p1")), &ctx()).unwrap());
    }
}
