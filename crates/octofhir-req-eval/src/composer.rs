//! Requirement set composition
//!
//! Sets combine their requirement members and linked child sets:
//!
//! | set type | boolean            | three-valued (Kleene)   |
//! |----------|--------------------|-------------------------|
//! | all      | every member true  | AND over members        |
//! | any      | some member true   | OR over members         |
//! | none     | no member true     | NOT (OR over members)   |
//!
//! Empty sets are vacuous: `all` and `none` hold, `any` does not.
//!
//! Every traversal carries the path of sets currently being visited. A set
//! that appears twice on the path is a cycle; a path longer than
//! `max_set_depth` is rejected.
//!
//! A set is evaluated once per walk. When another branch reaches it again
//! its outcome is reused, and the report lists it without members; they
//! appear under its first occurrence.

use crate::context::EvaluationContext;
use crate::engine::RequirementEngine;
use crate::error::{EvalError, EvalResult};
use crate::report::EvaluationReport;
use crate::satisfaction::Satisfaction;
use crate::subject::Subject;
use indexmap::{IndexMap, IndexSet};
use log::debug;
use octofhir_req_model::{RequirementCatalog, RequirementSet, RequirementSetType};
use smallvec::SmallVec;

type SetPath<'c> = SmallVec<[&'c str; 8]>;

fn cycle_error(path: &[&str], repeated: &str) -> EvalError {
    let mut names: Vec<String> = path.iter().map(|name| name.to_string()).collect();
    names.push(repeated.to_string());
    EvalError::CyclicRequirementSet { path: names }
}

impl RequirementEngine {
    /// Whether the named set holds for the subject
    pub fn evaluate_set(
        &self,
        catalog: &RequirementCatalog,
        set: &str,
        subject: &Subject,
        ctx: &EvaluationContext,
    ) -> EvalResult<bool> {
        Ok(self.explain_set(catalog, set, subject, ctx)?.passed)
    }

    /// Three-valued outcome of the named set for the subject
    pub fn assess_set(
        &self,
        catalog: &RequirementCatalog,
        set: &str,
        subject: &Subject,
        ctx: &EvaluationContext,
    ) -> EvalResult<Satisfaction> {
        Ok(self.explain_set(catalog, set, subject, ctx)?.satisfaction)
    }

    /// Evaluate the named set and keep every member outcome
    pub fn explain_set(
        &self,
        catalog: &RequirementCatalog,
        set: &str,
        subject: &Subject,
        ctx: &EvaluationContext,
    ) -> EvalResult<EvaluationReport> {
        let mut walk = SetWalk {
            engine: self,
            catalog,
            subject,
            ctx,
            path: SetPath::new(),
            finished: IndexMap::new(),
        };
        let (report, _) = walk.visit(set)?;
        Ok(report)
    }

    /// Every set reachable from the named one through linked sets, each
    /// once, in discovery order. The named set itself is not included.
    pub fn all_linked_sets<'c>(
        &self,
        catalog: &'c RequirementCatalog,
        set: &str,
    ) -> EvalResult<IndexSet<&'c RequirementSet>> {
        let root = catalog.set(set).ok_or_else(|| EvalError::undefined_set(set))?;
        let mut path = SetPath::new();
        let mut found = IndexSet::new();
        collect_linked(catalog, root, &mut path, &mut found)?;
        Ok(found)
    }
}

fn collect_linked<'c>(
    catalog: &'c RequirementCatalog,
    set: &'c RequirementSet,
    path: &mut SetPath<'c>,
    found: &mut IndexSet<&'c RequirementSet>,
) -> EvalResult<()> {
    path.push(&set.name);
    for child_name in &set.linked_sets {
        if path.contains(&child_name.as_str()) {
            return Err(cycle_error(path, child_name));
        }
        let child = catalog
            .set(child_name)
            .ok_or_else(|| EvalError::undefined_set(child_name))?;
        // already explored through another branch
        if found.insert(child) {
            collect_linked(catalog, child, path, found)?;
        }
    }
    path.pop();
    Ok(())
}

struct SetWalk<'a> {
    engine: &'a RequirementEngine,
    catalog: &'a RequirementCatalog,
    subject: &'a Subject,
    ctx: &'a EvaluationContext,
    path: SetPath<'a>,
    finished: IndexMap<&'a str, Finished>,
}

/// Outcome of a set already evaluated in this walk
#[derive(Debug, Clone, Copy)]
struct Finished {
    set_type: RequirementSetType,
    satisfaction: Satisfaction,
    passed: bool,
    /// Levels of sets below and including this one
    height: usize,
}

impl<'a> SetWalk<'a> {
    /// Evaluate the named set; returns its report and height
    fn visit(&mut self, name: &str) -> EvalResult<(EvaluationReport, usize)> {
        let catalog = self.catalog;
        let set = catalog.set(name).ok_or_else(|| EvalError::undefined_set(name))?;

        if self.path.contains(&set.name.as_str()) {
            return Err(cycle_error(&self.path, &set.name));
        }
        let limit = self.ctx.options().max_set_depth;
        let too_deep = || EvalError::NestingTooDeep {
            set: set.name.clone(),
            limit,
        };

        if let Some(done) = self.finished.get(set.name.as_str()).copied() {
            if self.path.len() + done.height > limit {
                return Err(too_deep());
            }
            debug!("Set '{}' already evaluated -> {}", set.name, done.satisfaction);
            let report = EvaluationReport::set(&set.name, done.set_type, done.satisfaction, done.passed, Vec::new());
            return Ok((report, done.height));
        }
        if self.path.len() >= limit {
            return Err(too_deep());
        }

        self.path.push(&set.name);
        let visited = self.visit_members(set);
        self.path.pop();

        let (report, height) = visited?;
        self.finished.insert(
            &set.name,
            Finished {
                set_type: set.set_type,
                satisfaction: report.satisfaction,
                passed: report.passed,
                height,
            },
        );
        Ok((report, height))
    }

    fn visit_members(&mut self, set: &'a RequirementSet) -> EvalResult<(EvaluationReport, usize)> {
        let mut members = Vec::with_capacity(set.requirements.len() + set.linked_sets.len());
        let mut below = 0;

        for name in &set.requirements {
            let requirement =
                self.catalog
                    .requirement(name)
                    .ok_or_else(|| EvalError::UndefinedRequirement {
                        set: set.name.clone(),
                        name: name.clone(),
                    })?;
            let satisfaction = self.engine.assess(requirement, self.subject, self.ctx)?;
            members.push(EvaluationReport::requirement(&requirement.name, satisfaction));
        }
        for child in &set.linked_sets {
            let (report, height) = self.visit(child)?;
            below = below.max(height);
            members.push(report);
        }

        let outcomes = members.iter().map(|member| member.satisfaction);
        let satisfaction = match set.set_type {
            RequirementSetType::All => Satisfaction::all(outcomes),
            RequirementSetType::Any => Satisfaction::any(outcomes),
            RequirementSetType::None => Satisfaction::none(outcomes),
        };
        let passed = set.set_type.combine(members.iter().map(|member| member.passed));
        debug!(
            "Set '{}' ({}) over {} members -> {} (passed: {})",
            set.name,
            set.set_type,
            members.len(),
            satisfaction,
            passed
        );

        let report = EvaluationReport::set(&set.name, set.set_type, satisfaction, passed, members);
        Ok((report, below + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::MODELS_MATCH_ANY;
    use chrono::{TimeZone, Utc};
    use octofhir_req_model::{LinkCategory, PatientDisease, Requirement, RequirementType};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> EvaluationContext {
        EvaluationContext::new(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
    }

    fn disease(name: &str, key: &str) -> Requirement {
        Requirement::new(name)
            .with_operator(MODELS_MATCH_ANY)
            .with_type(RequirementType::PatientDisease)
            .with_link(LinkCategory::Diseases, [key])
    }

    fn catalog(sets: Vec<RequirementSet>) -> RequirementCatalog {
        let mut catalog = RequirementCatalog::new();
        for requirement in [disease("has_ckd", "ckd"), disease("has_asthma", "asthma")] {
            catalog.add_requirement(requirement).unwrap();
        }
        for set in sets {
            catalog.add_set(set).unwrap();
        }
        catalog
    }

    #[test]
    fn test_set_types() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(PatientDisease::new("ckd"));
        let catalog = catalog(vec![
            RequirementSet::all("all").with_requirement("has_ckd").with_requirement("has_asthma"),
            RequirementSet::any("any").with_requirement("has_ckd").with_requirement("has_asthma"),
            RequirementSet::none("none").with_requirement("has_asthma"),
        ]);

        assert!(!engine.evaluate_set(&catalog, "all", &subject, &ctx()).unwrap());
        assert!(engine.evaluate_set(&catalog, "any", &subject, &ctx()).unwrap());
        assert!(engine.evaluate_set(&catalog, "none", &subject, &ctx()).unwrap());
    }

    #[test]
    fn test_vacuous_sets() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(PatientDisease::new("ckd"));
        let catalog = catalog(vec![
            RequirementSet::all("all"),
            RequirementSet::any("any"),
            RequirementSet::none("none"),
        ]);

        for (name, expected) in [("all", true), ("any", false), ("none", true)] {
            assert_eq!(engine.evaluate_set(&catalog, name, &subject, &ctx()).unwrap(), expected);
        }
    }

    #[test]
    fn test_nested_sets_and_report() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(PatientDisease::new("ckd"));
        let catalog = catalog(vec![
            RequirementSet::all("root").with_requirement("has_ckd").with_linked_set("exclusions"),
            RequirementSet::none("exclusions").with_requirement("has_asthma"),
        ]);

        let report = engine.explain_set(&catalog, "root", &subject, &ctx()).unwrap();
        assert!(report.passed);
        assert_eq!(report.satisfaction, Satisfaction::Satisfied);
        assert_eq!(report.members.len(), 2);
        assert!(report.find("exclusions").is_some_and(|r| r.passed));
    }

    #[test]
    fn test_cycle_is_reported() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(PatientDisease::new("ckd"));
        let catalog = catalog(vec![
            RequirementSet::all("a").with_linked_set("b"),
            RequirementSet::all("b").with_linked_set("a"),
        ]);

        let err = engine.evaluate_set(&catalog, "a", &subject, &ctx()).unwrap_err();
        let EvalError::CyclicRequirementSet { path } = &err else {
            panic!("expected a cycle, got {err:?}");
        };
        assert_eq!(path, &["a", "b", "a"]);

        let err = engine.all_linked_sets(&catalog, "a").unwrap_err();
        assert!(matches!(err, EvalError::CyclicRequirementSet { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(PatientDisease::new("ckd"));
        let catalog = catalog(vec![
            RequirementSet::all("level0").with_linked_set("level1"),
            RequirementSet::all("level1").with_linked_set("level2"),
            RequirementSet::all("level2"),
        ]);
        let shallow = EvaluationContext::builder().now(ctx().now()).max_set_depth(2).build();

        assert!(engine.evaluate_set(&catalog, "level1", &subject, &shallow).unwrap());
        assert!(matches!(
            engine.evaluate_set(&catalog, "level0", &subject, &shallow),
            Err(EvalError::NestingTooDeep { limit: 2, .. })
        ));
    }

    #[test]
    fn test_undefined_members() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(PatientDisease::new("ckd"));
        let catalog = catalog(vec![
            RequirementSet::all("bad_requirement").with_requirement("ghost"),
            RequirementSet::all("bad_link").with_linked_set("ghost"),
        ]);

        assert!(matches!(
            engine.evaluate_set(&catalog, "bad_requirement", &subject, &ctx()),
            Err(EvalError::UndefinedRequirement { .. })
        ));
        assert!(matches!(
            engine.evaluate_set(&catalog, "bad_link", &subject, &ctx()),
            Err(EvalError::UndefinedSet { .. })
        ));
        assert!(matches!(
            engine.evaluate_set(&catalog, "missing", &subject, &ctx()),
            Err(EvalError::UndefinedSet { .. })
        ));
    }

    // level_i links level_{i+1} twice, so every set is reachable by
    // 2^i paths
    fn diamond_chain(depth: usize) -> RequirementCatalog {
        let mut catalog = RequirementCatalog::new();
        catalog
            .add_requirement(
                Requirement::new("counted")
                    .with_operator("counted")
                    .with_type(RequirementType::PatientDisease),
            )
            .unwrap();
        for level in 0..depth {
            let mut set = RequirementSet::all(format!("level_{level}")).with_requirement("counted");
            if level + 1 < depth {
                let next = format!("level_{}", level + 1);
                set = set.with_linked_set(next.clone()).with_linked_set(next);
            }
            catalog.add_set(set).unwrap();
        }
        catalog
    }

    #[test]
    fn test_shared_sets_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = RequirementEngine::new();
        let counter = Arc::clone(&calls);
        engine.registry_mut().register_fn("counted", move |_input| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(Satisfaction::Satisfied)
        });
        let subject = Subject::new(PatientDisease::new("ckd"));

        let report = engine.explain_set(&diamond_chain(40), "level_0", &subject, &ctx()).unwrap();
        assert!(report.passed);
        assert_eq!(calls.load(Ordering::Relaxed), 40);

        // the second link to a shared set carries its outcome only
        let first = &report.members[1];
        let second = &report.members[2];
        assert_eq!(first.members.len(), 3);
        assert!(second.members.is_empty());
        assert_eq!(second.satisfaction, first.satisfaction);
    }

    #[test]
    fn test_depth_limit_applies_to_reused_sets() {
        let engine = RequirementEngine::new();
        let subject = Subject::new(PatientDisease::new("ckd"));
        // "shared" is first reached at depth 1, then again at depth 2 via "mid"
        let catalog = catalog(vec![
            RequirementSet::all("root").with_linked_set("shared").with_linked_set("mid"),
            RequirementSet::all("mid").with_linked_set("shared"),
            RequirementSet::all("shared").with_linked_set("leaf"),
            RequirementSet::all("leaf"),
        ]);
        let limit = |depth| EvaluationContext::builder().now(ctx().now()).max_set_depth(depth).build();

        assert!(matches!(
            engine.evaluate_set(&catalog, "root", &subject, &limit(3)),
            Err(EvalError::NestingTooDeep { limit: 3, .. })
        ));
        assert!(engine.evaluate_set(&catalog, "root", &subject, &limit(4)).unwrap());
    }

    #[test]
    fn test_all_linked_sets_deduplicates() {
        let engine = RequirementEngine::new();
        let catalog = catalog(vec![
            RequirementSet::all("root").with_linked_set("left").with_linked_set("right"),
            RequirementSet::any("left").with_linked_set("shared"),
            RequirementSet::any("right").with_linked_set("shared"),
            RequirementSet::none("shared"),
        ]);

        let names: Vec<_> = engine
            .all_linked_sets(&catalog, "root")
            .unwrap()
            .into_iter()
            .map(|set| set.name.as_str())
            .collect();
        assert_eq!(names, vec!["left", "shared", "right"]);
    }
}
