//! Static checks of requirement definitions and catalogs

use crate::engine::RequirementEngine;
use crate::error::EvalError;
use crate::operators::{self, CategoricalMatch, MODELS_MATCH_ANY, MODELS_MATCH_ANY_IN_TIMEFRAME};
use crate::registry::OperatorRegistry;
use crate::resolver::timeframe_offsets;
use indexmap::IndexSet;
use octofhir_req_diagnostics::{Diagnostic, REQ0100, REQ0111, REQ0114};
use octofhir_req_model::{LinkCategory, Requirement, RequirementCatalog, RequirementSet};
use regex::Regex;

/// Every definition problem that would make evaluating `requirement` fail
pub fn check_requirement(registry: &OperatorRegistry, requirement: &Requirement) -> Vec<EvalError> {
    inspect_requirement(registry, requirement).errors
}

/// Definition problems of a requirement and its compiled regex patterns
pub(crate) struct Inspection {
    pub(crate) errors: Vec<EvalError>,
    pub(crate) patterns: Vec<Regex>,
}

pub(crate) fn inspect_requirement(registry: &OperatorRegistry, requirement: &Requirement) -> Inspection {
    let mut errors = Vec::new();
    let mut patterns = Vec::new();
    let name = &requirement.name;

    if requirement.operators().is_empty() {
        errors.push(EvalError::NoOperators {
            requirement: name.clone(),
        });
    }
    if requirement.types().is_empty() {
        errors.push(EvalError::NoTypes {
            requirement: name.clone(),
        });
    }

    let mut timeframe_checked = false;
    let mut accepted_checked = false;
    for operator in requirement.operators() {
        if !registry.contains(operator.name()) {
            errors.push(EvalError::unknown_operator(name, operator.name()));
            continue;
        }
        let needs = operators::operator_needs(operator.name());

        if needs.timeframe && !timeframe_checked {
            timeframe_checked = true;
            if let Err(err) = timeframe_offsets(requirement) {
                errors.push(err);
            }
        }
        if needs.threshold && requirement.links().numeric_value.is_none() {
            errors.push(EvalError::missing_threshold(name, operator.name()));
        }
        if let Some(matching) = needs.accepted_values {
            if requirement.string_values.is_empty() {
                errors.push(EvalError::missing_accepted_values(name, operator.name()));
            } else if matching == CategoricalMatch::Regex && !accepted_checked {
                accepted_checked = true;
                match operators::categorical::accepted_patterns(requirement) {
                    Ok(compiled) => patterns = compiled,
                    Err(err) => errors.push(err),
                }
            }
        }
    }
    Inspection { errors, patterns }
}

fn to_diagnostic(error: &EvalError) -> Diagnostic {
    let diagnostic = Diagnostic::error(error.code(), error.to_string());
    let diagnostic = match error.rule() {
        Some(rule) => diagnostic.with_subject(rule),
        None => diagnostic,
    };
    match error.code().info().help {
        Some(help) => diagnostic.with_help(help),
        None => diagnostic,
    }
}

impl RequirementEngine {
    /// Validate a requirement definition without evaluating it
    ///
    /// Errors are the problems [`RequirementEngine::evaluate`] would fail
    /// on. Warnings flag definitions that evaluate but can never be
    /// meaningfully satisfied.
    pub fn validate_requirement(&self, requirement: &Requirement) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = check_requirement(self.registry(), requirement)
            .iter()
            .map(to_diagnostic)
            .collect();

        let links = requirement.links();
        let lists_entities = !links.is_empty();
        for operator in requirement.operators() {
            let name = operator.name();
            if name == MODELS_MATCH_ANY_IN_TIMEFRAME && !lists_entities {
                diagnostics.push(
                    Diagnostic::warning(
                        REQ0114,
                        format!("timeframe operator '{name}' has no entities to match"),
                    )
                    .with_subject(&requirement.name)
                    .with_help("the result is decided by the vacuous timeframe policy"),
                );
            } else if name == MODELS_MATCH_ANY && !lists_entities {
                diagnostics.push(
                    Diagnostic::warning(REQ0100, format!("operator '{name}' has no entities to match"))
                        .with_subject(&requirement.name),
                );
            } else if operators::operator_needs(name).lab_values && !links.has(LinkCategory::LabValues) {
                diagnostics.push(
                    Diagnostic::warning(REQ0100, format!("operator '{name}' has no lab values to compare"))
                        .with_subject(&requirement.name),
                );
            }
        }
        diagnostics
    }

    /// Validate every definition of a catalog and the set graph
    ///
    /// Reports dangling member references and each cycle once.
    pub fn validate_catalog(&self, catalog: &RequirementCatalog) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = catalog
            .requirements()
            .flat_map(|requirement| self.validate_requirement(requirement))
            .collect();

        for set in catalog.sets() {
            for name in &set.requirements {
                if catalog.requirement(name).is_none() {
                    diagnostics.push(to_diagnostic(&EvalError::UndefinedRequirement {
                        set: set.name.clone(),
                        name: name.clone(),
                    }));
                }
            }
            for name in &set.linked_sets {
                if catalog.set(name).is_none() {
                    diagnostics.push(
                        Diagnostic::error(
                            REQ0111,
                            format!("requirement set '{}' links undefined set '{}'", set.name, name),
                        )
                        .with_subject(&set.name),
                    );
                }
            }
        }

        for cycle in find_cycles(catalog) {
            diagnostics.push(to_diagnostic(&EvalError::CyclicRequirementSet { path: cycle }));
        }
        diagnostics
    }
}

/// Every distinct cycle of the set graph, each as a path that starts and
/// ends with the same set
fn find_cycles(catalog: &RequirementCatalog) -> Vec<Vec<String>> {
    let mut finished: IndexSet<&str> = IndexSet::new();
    let mut seen: IndexSet<Vec<&str>> = IndexSet::new();
    let mut cycles = Vec::new();

    for set in catalog.sets() {
        let mut path = Vec::new();
        walk(catalog, set, &mut path, &mut finished, &mut |cycle| {
            let mut key = cycle[..cycle.len() - 1].to_vec();
            key.sort_unstable();
            if seen.insert(key) {
                cycles.push(cycle.iter().map(|s| s.to_string()).collect());
            }
        });
    }
    cycles
}

fn walk<'c>(
    catalog: &'c RequirementCatalog,
    set: &'c RequirementSet,
    path: &mut Vec<&'c str>,
    finished: &mut IndexSet<&'c str>,
    on_cycle: &mut impl FnMut(&[&'c str]),
) {
    if finished.contains(set.name.as_str()) {
        return;
    }
    path.push(&set.name);
    for child in &set.linked_sets {
        if let Some(start) = path.iter().position(|name| *name == child.as_str()) {
            let mut cycle = path[start..].to_vec();
            cycle.push(child);
            on_cycle(&cycle);
            continue;
        }
        if let Some(child_set) = catalog.set(child) {
            walk(catalog, child_set, path, finished, on_cycle);
        }
    }
    path.pop();
    finished.insert(&set.name);
}
