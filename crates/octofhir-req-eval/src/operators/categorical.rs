//! Latest categorical lab value operators

use crate::error::{EvalError, EvalResult};
use crate::registry::OperatorInput;
use crate::resolver::ReadingFilter;
use crate::satisfaction::Satisfaction;
use log::debug;
use octofhir_req_model::{LinkCategory, Requirement};
use regex::Regex;

/// How a reading is compared with the accepted strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalMatch {
    /// Equal to an accepted value (case-sensitive)
    Exact,
    /// Contains an accepted value
    Substring,
    /// An accepted value, read as a regex, matches somewhere in the reading
    Regex,
}

enum Matcher<'r> {
    Literal(CategoricalMatch, &'r [String]),
    Patterns(&'r [Regex]),
}

impl Matcher<'_> {
    fn matches(&self, value: &str) -> bool {
        match self {
            Self::Literal(CategoricalMatch::Substring, accepted) => {
                accepted.iter().any(|a| value.contains(a.as_str()))
            }
            Self::Literal(_, accepted) => accepted.iter().any(|a| a == value),
            Self::Patterns(patterns) => patterns.iter().any(|p| p.is_match(value)),
        }
    }
}

/// Compile the accepted values of a regex requirement
pub fn accepted_patterns(requirement: &Requirement) -> EvalResult<Vec<Regex>> {
    requirement
        .string_values
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| {
                EvalError::invalid_regex(&requirement.name, pattern, e.to_string())
            })
        })
        .collect()
}

/// Compare the latest string reading of each expected lab value with the
/// requirement's accepted values
pub fn lab_latest_categorical(
    input: &OperatorInput<'_>,
    matching: CategoricalMatch,
    in_timeframe: bool,
) -> EvalResult<Satisfaction> {
    let requirement = input.requirement;
    if requirement.string_values.is_empty() {
        return Err(EvalError::missing_accepted_values(
            &requirement.name,
            format!("{matching:?}"),
        ));
    }
    // the engine hands over patterns it already compiled while checking
    // the requirement
    let compiled;
    let matcher = match matching {
        CategoricalMatch::Regex if input.patterns.is_empty() => {
            compiled = accepted_patterns(requirement)?;
            Matcher::Patterns(&compiled)
        }
        CategoricalMatch::Regex => Matcher::Patterns(input.patterns),
        other => Matcher::Literal(other, &requirement.string_values),
    };
    let window = if in_timeframe {
        Some(input.window()?)
    } else {
        None
    };

    let filter = ReadingFilter::categorical(window.as_ref());
    let mut outcomes = Vec::new();
    for lab_value in requirement.links().get(LinkCategory::LabValues) {
        let value = input.values.latest(&lab_value.key, filter)
            .and_then(|reading| reading.value_str.as_deref());
        let Some(value) = value else {
            outcomes.push(Satisfaction::Indeterminate);
            continue;
        };
        let matched = matcher.matches(value);
        debug!(
            "'{}': latest {} = {:?} -> {:?} {}",
            requirement.name, lab_value.key, value, matching, matched
        );
        if matched {
            return Ok(Satisfaction::Satisfied);
        }
        outcomes.push(Satisfaction::NotSatisfied);
    }
    Ok(Satisfaction::any(outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationContext;
    use crate::subject::ResolvedValues;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use octofhir_req_model::{LabValueDefinition, PatientLabValue, RequirementLinks, Unit};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn culture(value: &str, days_ago: i64) -> PatientLabValue {
        PatientLabValue::categorical(
            Arc::new(LabValueDefinition::new("blood_culture")),
            value,
            now() - Duration::days(days_ago),
        )
    }

    fn requirement(accepted: &[&str]) -> Requirement {
        Requirement::new("positive_culture")
            .with_link(LinkCategory::LabValues, ["blood_culture"])
            .with_string_values(accepted.iter().copied())
    }

    fn evaluate(
        requirement: &Requirement,
        readings: &[PatientLabValue],
        matching: CategoricalMatch,
        in_timeframe: bool,
    ) -> EvalResult<Satisfaction> {
        let ctx = EvaluationContext::new(now());
        let subject = RequirementLinks::new();
        let values = ResolvedValues {
            readings: readings.iter().collect(),
            ..ResolvedValues::default()
        };
        lab_latest_categorical(
            &OperatorInput {
                requirement,
                subject: &subject,
                values: &values,
                context: &ctx,
                patterns: &[],
            },
            matching,
            in_timeframe,
        )
    }

    #[rstest]
    #[case(CategoricalMatch::Substring, "test positive, weak", Satisfaction::Satisfied)]
    #[case(CategoricalMatch::Substring, "negative", Satisfaction::NotSatisfied)]
    #[case(CategoricalMatch::Exact, "positive", Satisfaction::Satisfied)]
    #[case(CategoricalMatch::Exact, "test positive, weak", Satisfaction::NotSatisfied)]
    #[case(CategoricalMatch::Exact, "Positive", Satisfaction::NotSatisfied)]
    fn test_literal_matching(
        #[case] matching: CategoricalMatch,
        #[case] value: &str,
        #[case] expected: Satisfaction,
    ) {
        let outcome = evaluate(&requirement(&["positive"]), &[culture(value, 1)], matching, false).unwrap();
        assert_eq!(outcome, expected);
    }

    #[test]
    fn test_regex_matching() {
        let requirement = requirement(&[r"(?i)^pos(itive)?\b"]);
        let hit = evaluate(&requirement, &[culture("Positive for E. coli", 1)], CategoricalMatch::Regex, false);
        assert_eq!(hit.unwrap(), Satisfaction::Satisfied);

        let miss = evaluate(&requirement, &[culture("no growth", 1)], CategoricalMatch::Regex, false);
        assert_eq!(miss.unwrap(), Satisfaction::NotSatisfied);
    }

    #[test]
    fn test_uses_patterns_compiled_by_the_engine() {
        let compiled = accepted_patterns(&requirement(&["growth$"])).unwrap();
        let requirement = requirement(&["positive"]);
        let ctx = EvaluationContext::new(now());
        let subject = RequirementLinks::new();
        let reading = culture("no growth", 1);
        let values = ResolvedValues {
            readings: vec![&reading],
            ..ResolvedValues::default()
        };
        let input = OperatorInput {
            requirement: &requirement,
            subject: &subject,
            values: &values,
            context: &ctx,
            patterns: &compiled,
        };

        let outcome = lab_latest_categorical(&input, CategoricalMatch::Regex, false).unwrap();
        assert_eq!(outcome, Satisfaction::Satisfied);
    }

    #[test]
    fn test_configuration_errors() {
        let err = evaluate(&requirement(&["(unclosed"]), &[], CategoricalMatch::Regex, false).unwrap_err();
        assert!(matches!(err, EvalError::InvalidRegex { .. }));

        let err = evaluate(&requirement(&[]), &[culture("positive", 1)], CategoricalMatch::Exact, false).unwrap_err();
        assert!(matches!(err, EvalError::MissingAcceptedValues { .. }));
    }

    #[test]
    fn test_missing_reading_is_indeterminate() {
        let outcome = evaluate(&requirement(&["positive"]), &[], CategoricalMatch::Exact, false).unwrap();
        assert_eq!(outcome, Satisfaction::Indeterminate);
    }

    #[test]
    fn test_in_timeframe_uses_latest_reading_in_window() {
        let requirement = requirement(&["positive"])
            .with_timeframe(Decimal::from(-14), Decimal::ZERO, Unit::new("days"));
        let readings = [culture("positive", 60), culture("negative", 3)];

        let outcome = evaluate(&requirement, &readings, CategoricalMatch::Exact, true).unwrap();
        assert_eq!(outcome, Satisfaction::NotSatisfied);

        let stale = [culture("positive", 60)];
        let outcome = evaluate(&requirement, &stale, CategoricalMatch::Exact, true).unwrap();
        assert_eq!(outcome, Satisfaction::Indeterminate);
    }
}
