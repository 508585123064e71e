//! Rule definitions: requirements, requirement sets and their vocabulary

use crate::concept::Unit;
use crate::entity::DomainEntityKind;
use crate::links::{LinkCategory, LinkedRecord, RequirementLinks};
use indexmap::IndexSet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a comparison strategy attached to a requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementOperator(String);

impl RequirementOperator {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Windowed operators only consider records dated inside the timeframe
    pub fn is_timeframe(&self) -> bool {
        self.0.ends_with("_in_timeframe")
    }
}

impl From<&str> for RequirementOperator {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for RequirementOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which entity kinds a requirement may be evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    Patient,
    PatientDisease,
    PatientEvent,
    PatientLabSample,
    PatientLabValue,
    PatientExamination,
    PatientExaminationIndication,
    PatientFinding,
    PatientFindingClassification,
    PatientFindingIntervention,
    PatientMedication,
    PatientMedicationSchedule,
    PatientRisk,
    InformationSource,
    /// Any lab result: a single reading or a whole sample
    LabResult,
}

impl RequirementType {
    pub fn expected_kinds(&self) -> &'static [DomainEntityKind] {
        use DomainEntityKind as K;
        match self {
            Self::Patient => &[K::Patient],
            Self::PatientDisease => &[K::PatientDisease],
            Self::PatientEvent => &[K::PatientEvent],
            Self::PatientLabSample => &[K::PatientLabSample],
            Self::PatientLabValue => &[K::PatientLabValue],
            Self::PatientExamination => &[K::PatientExamination],
            Self::PatientExaminationIndication => &[K::PatientExaminationIndication],
            Self::PatientFinding => &[K::PatientFinding],
            Self::PatientFindingClassification => &[K::PatientFindingClassification],
            Self::PatientFindingIntervention => &[K::PatientFindingIntervention],
            Self::PatientMedication => &[K::PatientMedication],
            Self::PatientMedicationSchedule => &[K::PatientMedicationSchedule],
            Self::PatientRisk => &[K::PatientRisk],
            Self::InformationSource => &[K::InformationSource],
            Self::LabResult => &[K::PatientLabValue, K::PatientLabSample],
        }
    }
}

/// A named business rule.
///
/// The rule's expected values live in its [`RequirementLinks`] payload
/// together with the numeric threshold/bounds, the unit and the attached
/// operators and types. Accepted strings for categorical operators are kept
/// alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub links: RequirementLinks,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub string_values: Vec<String>,
}

impl Requirement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            links: RequirementLinks::new(),
            string_values: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_operator(mut self, operator: impl Into<RequirementOperator>) -> Self {
        self.links.operators.push(operator.into());
        self
    }

    pub fn with_type(mut self, requirement_type: RequirementType) -> Self {
        self.links.types.push(requirement_type);
        self
    }

    /// Expect the given definition keys in a category
    pub fn with_link<I, R>(mut self, category: LinkCategory, keys: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<LinkedRecord>,
    {
        self.links.extend(category, keys);
        self
    }

    pub fn with_numeric_value(mut self, value: Decimal) -> Self {
        self.links.numeric_value = Some(value);
        self
    }

    /// Timeframe window `[min, max]` relative to the evaluation instant
    pub fn with_timeframe(mut self, min: Decimal, max: Decimal, unit: Unit) -> Self {
        self.links.numeric_value_min = Some(min);
        self.links.numeric_value_max = Some(max);
        self.links.unit = Some(unit);
        self
    }

    pub fn with_string_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.string_values.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn links(&self) -> &RequirementLinks {
        &self.links
    }

    pub fn operators(&self) -> &[RequirementOperator] {
        &self.links.operators
    }

    pub fn types(&self) -> &[RequirementType] {
        &self.links.types
    }

    /// Union of the entity kinds accepted by the requirement's types
    pub fn expected_models(&self) -> IndexSet<DomainEntityKind> {
        self.links
            .types
            .iter()
            .flat_map(|t| t.expected_kinds().iter().copied())
            .collect()
    }
}

/// How a requirement set combines its members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementSetType {
    All,
    Any,
    None,
}

impl RequirementSetType {
    /// Result of the set when it has no members
    pub fn vacuous(&self) -> bool {
        !matches!(self, Self::Any)
    }

    /// Combine member results
    pub fn combine<I: IntoIterator<Item = bool>>(&self, results: I) -> bool {
        let mut results = results.into_iter();
        match self {
            Self::All => results.all(|r| r),
            Self::Any => results.any(|r| r),
            Self::None => !results.any(|r| r),
        }
    }
}

impl fmt::Display for RequirementSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Any => "any",
            Self::None => "none",
        })
    }
}

/// A named checklist of requirements and nested sets, referenced by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequirementSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub set_type: RequirementSetType,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub linked_sets: Vec<String>,
}

impl RequirementSet {
    pub fn new(name: impl Into<String>, set_type: RequirementSetType) -> Self {
        Self {
            name: name.into(),
            description: None,
            set_type,
            requirements: Vec::new(),
            linked_sets: Vec::new(),
        }
    }

    pub fn all(name: impl Into<String>) -> Self {
        Self::new(name, RequirementSetType::All)
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, RequirementSetType::Any)
    }

    pub fn none(name: impl Into<String>) -> Self {
        Self::new(name, RequirementSetType::None)
    }

    pub fn with_requirement(mut self, name: impl Into<String>) -> Self {
        self.requirements.push(name.into());
        self
    }

    pub fn with_linked_set(mut self, name: impl Into<String>) -> Self {
        self.linked_sets.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && self.linked_sets.is_empty()
    }
}
