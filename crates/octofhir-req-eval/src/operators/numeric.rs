//! Latest numeric lab value operators

use crate::error::{EvalError, EvalResult};
use crate::registry::OperatorInput;
use crate::resolver::{ReadingFilter, normal_range};
use crate::satisfaction::Satisfaction;
use log::{debug, warn};
use octofhir_req_model::LinkCategory;
use rust_decimal::Decimal;

/// What the latest reading is compared with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericComparison {
    /// Above the normal range maximum
    Increased,
    /// Below the normal range minimum
    Decreased,
    /// Inside the normal range, bounds inclusive
    Normal,
    /// Below the requirement's `numeric_value`
    LowerThanValue,
    /// Above the requirement's `numeric_value`
    GreaterThanValue,
}

impl NumericComparison {
    pub fn needs_threshold(&self) -> bool {
        matches!(self, Self::LowerThanValue | Self::GreaterThanValue)
    }
}

/// Compare the latest numeric reading of each expected lab value.
///
/// Lab values are OR'd: the first satisfied one decides. A lab value without
/// a (windowed) reading is indeterminate.
pub fn lab_latest_numeric(
    input: &OperatorInput<'_>,
    comparison: NumericComparison,
    in_timeframe: bool,
) -> EvalResult<Satisfaction> {
    let requirement = input.requirement;
    let threshold = if comparison.needs_threshold() {
        let value = requirement.links().numeric_value.ok_or_else(|| {
            EvalError::missing_threshold(&requirement.name, format!("{comparison:?}"))
        })?;
        Some(value)
    } else {
        None
    };
    let window = if in_timeframe {
        Some(input.window()?)
    } else {
        None
    };

    let lab_values = requirement.links().get(LinkCategory::LabValues);
    if lab_values.is_empty() {
        warn!("Requirement '{}' lists no lab values to compare", requirement.name);
    }

    let filter = ReadingFilter::numeric(window.as_ref());
    let mut outcomes = Vec::with_capacity(lab_values.len());
    for lab_value in lab_values {
        let Some(reading) = input.values.latest(&lab_value.key, filter) else {
            outcomes.push(Satisfaction::Indeterminate);
            continue;
        };
        let Some(value) = reading.value else {
            outcomes.push(Satisfaction::Indeterminate);
            continue;
        };

        let satisfied = match (comparison, threshold) {
            (NumericComparison::LowerThanValue, Some(limit)) => value < limit,
            (NumericComparison::GreaterThanValue, Some(limit)) => value > limit,
            _ => {
                let range = normal_range(
                    &reading.lab_value,
                    reading,
                    &input.values.demographics,
                    input.context.now(),
                );
                compare_with_range(comparison, value, range.min, range.max)
            }
        };
        debug!(
            "'{}': latest {} = {} at {} -> {:?} {}",
            requirement.name, lab_value.key, value, reading.datetime, comparison, satisfied
        );
        if satisfied {
            return Ok(Satisfaction::Satisfied);
        }
        outcomes.push(Satisfaction::NotSatisfied);
    }

    Ok(Satisfaction::any(outcomes))
}

fn compare_with_range(
    comparison: NumericComparison,
    value: Decimal,
    min: Option<Decimal>,
    max: Option<Decimal>,
) -> bool {
    match comparison {
        NumericComparison::Increased => max.is_some_and(|max| value > max),
        NumericComparison::Decreased => min.is_some_and(|min| value < min),
        NumericComparison::Normal => {
            min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
        }
        NumericComparison::LowerThanValue | NumericComparison::GreaterThanValue => false,
    }
}
