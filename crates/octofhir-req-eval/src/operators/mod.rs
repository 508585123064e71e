//! Standard requirement operators
//!
//! - Set matching: `models_match_any`, `models_match_any_in_timeframe`
//! - Latest numeric lab value against the normal range or a threshold
//! - Latest categorical lab value against accepted strings
//!
//! Every numeric and categorical operator has an `_in_timeframe` variant that
//! only considers readings dated inside the requirement's window.

pub mod categorical;
pub mod numeric;
pub mod set_match;

pub use categorical::CategoricalMatch;
pub use numeric::NumericComparison;

use crate::registry::OperatorRegistry;

pub const MODELS_MATCH_ANY: &str = "models_match_any";
pub const MODELS_MATCH_ANY_IN_TIMEFRAME: &str = "models_match_any_in_timeframe";

pub const LAB_LATEST_NUMERIC_INCREASED: &str = "lab_latest_numeric_increased";
pub const LAB_LATEST_NUMERIC_DECREASED: &str = "lab_latest_numeric_decreased";
pub const LAB_LATEST_NUMERIC_NORMAL: &str = "lab_latest_numeric_normal";
pub const LAB_LATEST_NUMERIC_LOWER_THAN_VALUE: &str = "lab_latest_numeric_lower_than_value";
pub const LAB_LATEST_NUMERIC_GREATER_THAN_VALUE: &str = "lab_latest_numeric_greater_than_value";
pub const LAB_LATEST_NUMERIC_INCREASED_IN_TIMEFRAME: &str = "lab_latest_numeric_increased_in_timeframe";
pub const LAB_LATEST_NUMERIC_DECREASED_IN_TIMEFRAME: &str = "lab_latest_numeric_decreased_in_timeframe";
pub const LAB_LATEST_NUMERIC_NORMAL_IN_TIMEFRAME: &str = "lab_latest_numeric_normal_in_timeframe";
pub const LAB_LATEST_NUMERIC_LOWER_THAN_VALUE_IN_TIMEFRAME: &str =
    "lab_latest_numeric_lower_than_value_in_timeframe";
pub const LAB_LATEST_NUMERIC_GREATER_THAN_VALUE_IN_TIMEFRAME: &str =
    "lab_latest_numeric_greater_than_value_in_timeframe";

pub const LAB_LATEST_CATEGORICAL_MATCH: &str = "lab_latest_categorical_match";
pub const LAB_LATEST_CATEGORICAL_MATCH_SUBSTRING: &str = "lab_latest_categorical_match_substring";
pub const LAB_LATEST_CATEGORICAL_MATCH_REGEX: &str = "lab_latest_categorical_match_regex";
pub const LAB_LATEST_CATEGORICAL_MATCH_IN_TIMEFRAME: &str = "lab_latest_categorical_match_in_timeframe";
pub const LAB_LATEST_CATEGORICAL_MATCH_SUBSTRING_IN_TIMEFRAME: &str =
    "lab_latest_categorical_match_substring_in_timeframe";
pub const LAB_LATEST_CATEGORICAL_MATCH_REGEX_IN_TIMEFRAME: &str =
    "lab_latest_categorical_match_regex_in_timeframe";

const NUMERIC_OPERATORS: [(&str, NumericComparison, bool); 10] = [
    (LAB_LATEST_NUMERIC_INCREASED, NumericComparison::Increased, false),
    (LAB_LATEST_NUMERIC_DECREASED, NumericComparison::Decreased, false),
    (LAB_LATEST_NUMERIC_NORMAL, NumericComparison::Normal, false),
    (LAB_LATEST_NUMERIC_LOWER_THAN_VALUE, NumericComparison::LowerThanValue, false),
    (LAB_LATEST_NUMERIC_GREATER_THAN_VALUE, NumericComparison::GreaterThanValue, false),
    (LAB_LATEST_NUMERIC_INCREASED_IN_TIMEFRAME, NumericComparison::Increased, true),
    (LAB_LATEST_NUMERIC_DECREASED_IN_TIMEFRAME, NumericComparison::Decreased, true),
    (LAB_LATEST_NUMERIC_NORMAL_IN_TIMEFRAME, NumericComparison::Normal, true),
    (LAB_LATEST_NUMERIC_LOWER_THAN_VALUE_IN_TIMEFRAME, NumericComparison::LowerThanValue, true),
    (LAB_LATEST_NUMERIC_GREATER_THAN_VALUE_IN_TIMEFRAME, NumericComparison::GreaterThanValue, true),
];

const CATEGORICAL_OPERATORS: [(&str, CategoricalMatch, bool); 6] = [
    (LAB_LATEST_CATEGORICAL_MATCH, CategoricalMatch::Exact, false),
    (LAB_LATEST_CATEGORICAL_MATCH_SUBSTRING, CategoricalMatch::Substring, false),
    (LAB_LATEST_CATEGORICAL_MATCH_REGEX, CategoricalMatch::Regex, false),
    (LAB_LATEST_CATEGORICAL_MATCH_IN_TIMEFRAME, CategoricalMatch::Exact, true),
    (LAB_LATEST_CATEGORICAL_MATCH_SUBSTRING_IN_TIMEFRAME, CategoricalMatch::Substring, true),
    (LAB_LATEST_CATEGORICAL_MATCH_REGEX_IN_TIMEFRAME, CategoricalMatch::Regex, true),
];

/// What a standard operator needs from the requirement definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorNeeds {
    pub timeframe: bool,
    pub threshold: bool,
    pub lab_values: bool,
    pub accepted_values: Option<CategoricalMatch>,
}

/// Definition requirements of a standard operator; custom operators need
/// nothing the engine can check
pub fn operator_needs(name: &str) -> OperatorNeeds {
    if name == MODELS_MATCH_ANY_IN_TIMEFRAME {
        return OperatorNeeds {
            timeframe: true,
            ..OperatorNeeds::default()
        };
    }
    if let Some((_, comparison, windowed)) = NUMERIC_OPERATORS.iter().find(|(n, ..)| *n == name) {
        return OperatorNeeds {
            timeframe: *windowed,
            threshold: comparison.needs_threshold(),
            lab_values: true,
            accepted_values: None,
        };
    }
    if let Some((_, matching, windowed)) = CATEGORICAL_OPERATORS.iter().find(|(n, ..)| *n == name) {
        return OperatorNeeds {
            timeframe: *windowed,
            threshold: false,
            lab_values: true,
            accepted_values: Some(*matching),
        };
    }
    OperatorNeeds::default()
}

/// Register every standard operator
pub fn register_standard(registry: &mut OperatorRegistry) {
    registry.register_fn(MODELS_MATCH_ANY, set_match::models_match_any);
    registry.register_fn(
        MODELS_MATCH_ANY_IN_TIMEFRAME,
        set_match::models_match_any_in_timeframe,
    );

    for (name, comparison, windowed) in NUMERIC_OPERATORS {
        registry.register_fn(name, move |input| {
            numeric::lab_latest_numeric(input, comparison, windowed)
        });
    }

    for (name, matching, windowed) in CATEGORICAL_OPERATORS {
        registry.register_fn(name, move |input| {
            categorical::lab_latest_categorical(input, matching, windowed)
        });
    }
}
