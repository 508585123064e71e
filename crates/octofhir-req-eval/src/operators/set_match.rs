//! Set matching operators
//!
//! Compare the definition keys a requirement expects with the keys the
//! subject exposes, category by category.

use crate::context::VacuousTimeframe;
use crate::error::EvalResult;
use crate::registry::OperatorInput;
use crate::satisfaction::Satisfaction;
use log::{trace, warn};
use octofhir_req_model::LinkedRecord;

fn shares_key(expected: &[LinkedRecord], member: &LinkedRecord) -> bool {
    expected.iter().any(|record| record.key == member.key)
}

/// Satisfied when some expected category shares a key with the subject.
///
/// Not satisfied when the subject exposes an expected category without a
/// shared key; indeterminate when it exposes none of them.
pub fn models_match_any(input: &OperatorInput<'_>) -> EvalResult<Satisfaction> {
    let mut exposed = false;

    for (category, expected) in input.requirement.links().active() {
        let members = input.subject.get(category);
        if members.is_empty() {
            continue;
        }
        exposed = true;
        if let Some(hit) = members.iter().find(|member| shares_key(expected, member)) {
            trace!(
                "'{}': {} matches on '{}'",
                input.requirement.name, category, hit.key
            );
            return Ok(Satisfaction::Satisfied);
        }
    }

    Ok(if exposed {
        Satisfaction::NotSatisfied
    } else {
        Satisfaction::Indeterminate
    })
}

/// Every expected category must share a key with a subject member dated
/// inside the requirement's window.
///
/// Members outside the window or without a date do not count. A requirement
/// that expects no category at all is decided by the configured
/// [`VacuousTimeframe`] policy.
pub fn models_match_any_in_timeframe(input: &OperatorInput<'_>) -> EvalResult<Satisfaction> {
    let window = input.window()?;
    let expected: Vec<_> = input.requirement.links().active().collect();

    if expected.is_empty() {
        let policy = input.context.options().vacuous_timeframe;
        warn!(
            "Timeframe requirement '{}' lists no entities; vacuous policy {:?} decides",
            input.requirement.name, policy
        );
        return Ok(match policy {
            VacuousTimeframe::Pass => Satisfaction::Satisfied,
            VacuousTimeframe::Fail => Satisfaction::NotSatisfied,
        });
    }

    let mut outcome = Satisfaction::Satisfied;
    for (category, expected) in expected {
        let members = input.subject.get(category);
        if members.is_empty() {
            outcome = outcome.and(Satisfaction::Indeterminate);
            continue;
        }
        let in_window = members
            .iter()
            .any(|member| window.contains_opt(member.timestamp) && shares_key(expected, member));
        if !in_window {
            trace!(
                "'{}': no {} inside [{}, {}]",
                input.requirement.name, category, window.start, window.end
            );
            return Ok(Satisfaction::NotSatisfied);
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationContext;
    use crate::subject::ResolvedValues;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use octofhir_req_model::{LinkCategory, Requirement, RequirementLinks, Unit};
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn run(
        operator: fn(&OperatorInput<'_>) -> EvalResult<Satisfaction>,
        requirement: &Requirement,
        subject: &RequirementLinks,
        context: &EvaluationContext,
    ) -> EvalResult<Satisfaction> {
        let values = ResolvedValues::default();
        operator(&OperatorInput {
            requirement,
            subject,
            values: &values,
            context,
            patterns: &[],
        })
    }

    fn diseases(keys: &[&str]) -> RequirementLinks {
        RequirementLinks::new().with(LinkCategory::Diseases, keys.iter().copied())
    }

    #[test]
    fn test_match_any() {
        let ctx = EvaluationContext::new(now());
        let requirement = Requirement::new("ckd").with_link(LinkCategory::Diseases, ["d1", "d2"]);

        let run_with = |subject: RequirementLinks| run(models_match_any, &requirement, &subject, &ctx).unwrap();

        assert_eq!(run_with(diseases(&["d2"])), Satisfaction::Satisfied);
        assert_eq!(run_with(diseases(&["d3"])), Satisfaction::NotSatisfied);
        assert_eq!(run_with(RequirementLinks::new()), Satisfaction::Indeterminate);
        assert_eq!(
            run_with(RequirementLinks::new().with(LinkCategory::Events, ["d1"])),
            Satisfaction::Indeterminate
        );
    }

    fn recent_stroke() -> Requirement {
        Requirement::new("recent_stroke")
            .with_link(LinkCategory::Events, ["stroke"])
            .with_timeframe(Decimal::from(-30), Decimal::ZERO, Unit::new("days"))
    }

    fn events_at(days_ago: &[i64]) -> RequirementLinks {
        RequirementLinks::new().with(
            LinkCategory::Events,
            days_ago
                .iter()
                .map(|d| LinkedRecord::dated("stroke", Some(now() - Duration::days(*d)))),
        )
    }

    #[test]
    fn test_match_any_in_timeframe() {
        let ctx = EvaluationContext::new(now());
        let requirement = recent_stroke();
        let run_with = |subject: RequirementLinks| {
            run(models_match_any_in_timeframe, &requirement, &subject, &ctx).unwrap()
        };

        assert_eq!(run_with(events_at(&[10])), Satisfaction::Satisfied);
        assert_eq!(run_with(events_at(&[400])), Satisfaction::NotSatisfied);
        assert_eq!(run_with(events_at(&[400, 3])), Satisfaction::Satisfied);
        assert!(!run_with(RequirementLinks::new()).is_satisfied());

        let undated = RequirementLinks::new().with(LinkCategory::Events, ["stroke"]);
        assert_eq!(run_with(undated), Satisfaction::NotSatisfied);
    }

    #[test]
    fn test_every_listed_category_must_match_in_window() {
        let ctx = EvaluationContext::new(now());
        let requirement = recent_stroke().with_link(LinkCategory::Diseases, ["afib"]);

        let mut subject = events_at(&[5]);
        subject.push(
            LinkCategory::Diseases,
            LinkedRecord::dated("afib", Some(now() - Duration::days(90))),
        );
        assert_eq!(
            run(models_match_any_in_timeframe, &requirement, &subject, &ctx).unwrap(),
            Satisfaction::NotSatisfied
        );
    }

    #[test]
    fn test_vacuous_timeframe_policy() {
        let requirement = Requirement::new("empty")
            .with_timeframe(Decimal::from(-1), Decimal::ZERO, Unit::new("years"));
        let subject = events_at(&[1]);

        let pass = EvaluationContext::new(now());
        assert_eq!(
            run(models_match_any_in_timeframe, &requirement, &subject, &pass).unwrap(),
            Satisfaction::Satisfied
        );

        let fail = EvaluationContext::builder()
            .now(now())
            .vacuous_timeframe(VacuousTimeframe::Fail)
            .build();
        assert_eq!(
            run(models_match_any_in_timeframe, &requirement, &subject, &fail).unwrap(),
            Satisfaction::NotSatisfied
        );
    }

    #[test]
    fn test_timeframe_configuration_errors_propagate() {
        let ctx = EvaluationContext::new(now());
        let requirement = Requirement::new("no_window").with_link(LinkCategory::Events, ["stroke"]);
        let err = run(models_match_any_in_timeframe, &requirement, &events_at(&[1]), &ctx).unwrap_err();
        assert!(err.is_configuration());
    }
}
