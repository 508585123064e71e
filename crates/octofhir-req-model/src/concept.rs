//! Definition-level concepts referenced by patient records and requirements

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural key of a definition object (a disease, an event type, a lab value,
/// a unit, ...). Set operators compare entities by this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptKey(String);

impl ConceptKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConceptKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ConceptKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for ConceptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Administrative gender used for demographic normal ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Measurement unit.
///
/// Lab readings and medication doses carry a unit; timeframe requirements use
/// a unit to interpret their offsets (see [`Unit::time_unit`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub key: ConceptKey,
    #[serde(default)]
    pub abbreviation: Option<String>,
}

impl Unit {
    pub fn new(key: impl Into<ConceptKey>) -> Self {
        Self {
            key: key.into(),
            abbreviation: None,
        }
    }

    pub fn with_abbreviation(mut self, abbreviation: impl Into<String>) -> Self {
        self.abbreviation = Some(abbreviation.into());
        self
    }

    /// Interpret this unit as a calendar/clock unit, if it is one
    pub fn time_unit(&self) -> Option<TimeUnit> {
        let name = self.key.as_str().trim().to_ascii_lowercase();
        TimeUnit::parse(&name).or_else(|| {
            self.abbreviation
                .as_deref()
                .and_then(|abbr| TimeUnit::parse(&abbr.trim().to_ascii_lowercase()))
        })
    }
}

/// Units a timeframe window can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "minute" | "minutes" | "min" => Some(Self::Minute),
            "hour" | "hours" | "h" => Some(Self::Hour),
            "day" | "days" | "d" => Some(Self::Day),
            "week" | "weeks" | "wk" => Some(Self::Week),
            "month" | "months" | "mo" => Some(Self::Month),
            "year" | "years" | "a" | "y" => Some(Self::Year),
            _ => None,
        }
    }

    /// Calendar units have no fixed length and must be applied with
    /// calendar arithmetic
    pub fn is_calendar(&self) -> bool {
        matches!(self, Self::Month | Self::Year)
    }
}

/// Normal range of a lab value; either bound may be undefined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalRange {
    #[serde(default)]
    pub min: Option<Decimal>,
    #[serde(default)]
    pub max: Option<Decimal>,
}

impl NormalRange {
    pub fn new(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self { min, max }
    }

    pub fn between(min: Decimal, max: Decimal) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Overlay another range: bounds defined in `other` win
    pub fn overlay(self, other: &NormalRange) -> Self {
        Self {
            min: other.min.or(self.min),
            max: other.max.or(self.max),
        }
    }
}

/// Age band with its own normal range (ages in whole years, inclusive)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgeBand {
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub max_age: Option<u32>,
    pub range: NormalRange,
}

impl AgeBand {
    pub fn contains(&self, age: u32) -> bool {
        self.min_age.is_none_or(|min| age >= min) && self.max_age.is_none_or(|max| age <= max)
    }
}

/// Definition of a lab measurement (e.g. hemoglobin)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabValueDefinition {
    pub key: ConceptKey,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub default_unit: Option<Unit>,
    #[serde(default)]
    pub default_normal_range: NormalRange,
    #[serde(default)]
    pub gender_ranges: IndexMap<Gender, NormalRange>,
    #[serde(default)]
    pub age_ranges: Vec<AgeBand>,
}

impl LabValueDefinition {
    pub fn new(key: impl Into<ConceptKey>) -> Self {
        Self {
            key: key.into(),
            name: None,
            default_unit: None,
            default_normal_range: NormalRange::default(),
            gender_ranges: IndexMap::new(),
            age_ranges: Vec::new(),
        }
    }

    pub fn with_normal_range(mut self, range: NormalRange) -> Self {
        self.default_normal_range = range;
        self
    }

    pub fn with_gender_range(mut self, gender: Gender, range: NormalRange) -> Self {
        self.gender_ranges.insert(gender, range);
        self
    }

    pub fn with_age_band(mut self, min_age: Option<u32>, max_age: Option<u32>, range: NormalRange) -> Self {
        self.age_ranges.push(AgeBand {
            min_age,
            max_age,
            range,
        });
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.default_unit = Some(unit);
        self
    }

    /// First age band containing `age`
    pub fn age_band(&self, age: u32) -> Option<&AgeBand> {
        self.age_ranges.iter().find(|band| band.contains(age))
    }
}
