//! Three-valued requirement outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a requirement or set.
///
/// `Indeterminate` means the data needed to decide was missing. The boolean
/// projection used by `evaluate*` treats it as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Satisfaction {
    Satisfied,
    NotSatisfied,
    Indeterminate,
}

impl Satisfaction {
    pub fn is_satisfied(self) -> bool {
        self == Self::Satisfied
    }

    pub fn is_indeterminate(self) -> bool {
        self == Self::Indeterminate
    }

    /// Kleene conjunction
    ///
    /// | A             | B             | A and B       |
    /// |---------------|---------------|---------------|
    /// | Satisfied     | Satisfied     | Satisfied     |
    /// | NotSatisfied  | any           | NotSatisfied  |
    /// | Indeterminate | Satisfied     | Indeterminate |
    /// | Indeterminate | Indeterminate | Indeterminate |
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::NotSatisfied, _) | (_, Self::NotSatisfied) => Self::NotSatisfied,
            (Self::Satisfied, Self::Satisfied) => Self::Satisfied,
            _ => Self::Indeterminate,
        }
    }

    /// Kleene disjunction
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Satisfied, _) | (_, Self::Satisfied) => Self::Satisfied,
            (Self::NotSatisfied, Self::NotSatisfied) => Self::NotSatisfied,
            _ => Self::Indeterminate,
        }
    }

    /// Conjunction over many outcomes; empty input is `Satisfied`
    pub fn all<I: IntoIterator<Item = Self>>(outcomes: I) -> Self {
        outcomes.into_iter().fold(Self::Satisfied, Self::and)
    }

    /// Disjunction over many outcomes; empty input is `NotSatisfied`
    pub fn any<I: IntoIterator<Item = Self>>(outcomes: I) -> Self {
        outcomes.into_iter().fold(Self::NotSatisfied, Self::or)
    }

    /// No outcome satisfied; empty input is `Satisfied`
    pub fn none<I: IntoIterator<Item = Self>>(outcomes: I) -> Self {
        !Self::any(outcomes)
    }
}

/// Kleene negation
impl std::ops::Not for Satisfaction {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::Satisfied => Self::NotSatisfied,
            Self::NotSatisfied => Self::Satisfied,
            Self::Indeterminate => Self::Indeterminate,
        }
    }
}

impl From<bool> for Satisfaction {
    fn from(value: bool) -> Self {
        if value {
            Self::Satisfied
        } else {
            Self::NotSatisfied
        }
    }
}

impl From<Option<bool>> for Satisfaction {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Indeterminate, Self::from)
    }
}

impl fmt::Display for Satisfaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Satisfied => "satisfied",
            Self::NotSatisfied => "not satisfied",
            Self::Indeterminate => "indeterminate",
        })
    }
}
