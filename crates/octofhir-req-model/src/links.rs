//! Requirement links: which categories of related entities an object exposes

use crate::concept::{ConceptKey, Unit};
use crate::definitions::{RequirementOperator, RequirementType};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of linked entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCategory {
    Diseases,
    DiseaseClassificationChoices,
    Events,
    LabValues,
    Findings,
    FindingClassificationChoices,
    Interventions,
    Medications,
    MedicationIndications,
    MedicationSchedules,
    IntakeTimes,
    Examinations,
    ExaminationIndications,
    Risks,
    RiskTypes,
    InformationSources,
    LinkedSets,
    Units,
}

impl LinkCategory {
    /// Every category, in declaration order
    pub const ALL: [LinkCategory; 18] = [
        Self::Diseases,
        Self::DiseaseClassificationChoices,
        Self::Events,
        Self::LabValues,
        Self::Findings,
        Self::FindingClassificationChoices,
        Self::Interventions,
        Self::Medications,
        Self::MedicationIndications,
        Self::MedicationSchedules,
        Self::IntakeTimes,
        Self::Examinations,
        Self::ExaminationIndications,
        Self::Risks,
        Self::RiskTypes,
        Self::InformationSources,
        Self::LinkedSets,
        Self::Units,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Diseases => "diseases",
            Self::DiseaseClassificationChoices => "disease_classification_choices",
            Self::Events => "events",
            Self::LabValues => "lab_values",
            Self::Findings => "findings",
            Self::FindingClassificationChoices => "finding_classification_choices",
            Self::Interventions => "interventions",
            Self::Medications => "medications",
            Self::MedicationIndications => "medication_indications",
            Self::MedicationSchedules => "medication_schedules",
            Self::IntakeTimes => "intake_times",
            Self::Examinations => "examinations",
            Self::ExaminationIndications => "examination_indications",
            Self::Risks => "risks",
            Self::RiskTypes => "risk_types",
            Self::InformationSources => "information_sources",
            Self::LinkedSets => "linked_sets",
            Self::Units => "units",
        }
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One referenced entity: its definition key and, for subject snapshots, the
/// date of the record that exposed it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkedRecord {
    pub key: ConceptKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl LinkedRecord {
    pub fn new(key: impl Into<ConceptKey>) -> Self {
        Self {
            key: key.into(),
            timestamp: None,
        }
    }

    pub fn dated(key: impl Into<ConceptKey>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            key: key.into(),
            timestamp,
        }
    }
}

impl From<&str> for LinkedRecord {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<ConceptKey> for LinkedRecord {
    fn from(key: ConceptKey) -> Self {
        Self::new(key)
    }
}

/// Snapshot of the entities an object links to, per category.
///
/// Only non-empty categories are stored, so [`RequirementLinks::active`]
/// never yields an empty category. For requirements the snapshot also
/// carries the numeric threshold/bounds, the unit and the attached operators
/// and types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementLinks {
    #[serde(default)]
    categories: IndexMap<LinkCategory, Vec<LinkedRecord>>,
    #[serde(default)]
    pub numeric_value: Option<Decimal>,
    #[serde(default)]
    pub numeric_value_min: Option<Decimal>,
    #[serde(default)]
    pub numeric_value_max: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<Unit>,
    #[serde(default)]
    pub operators: Vec<RequirementOperator>,
    #[serde(default)]
    pub types: Vec<RequirementType>,
}

impl RequirementLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record to a category; exact duplicates are collapsed
    pub fn push(&mut self, category: LinkCategory, record: LinkedRecord) {
        let members = self.categories.entry(category).or_default();
        if !members.contains(&record) {
            members.push(record);
        }
    }

    /// Add several records to a category
    pub fn extend<I, R>(&mut self, category: LinkCategory, records: I)
    where
        I: IntoIterator<Item = R>,
        R: Into<LinkedRecord>,
    {
        for record in records {
            self.push(category, record.into());
        }
    }

    /// Builder form of [`RequirementLinks::extend`]
    pub fn with<I, R>(mut self, category: LinkCategory, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<LinkedRecord>,
    {
        self.extend(category, records);
        self
    }

    /// Union another snapshot's categories into this one
    pub fn merge(&mut self, other: RequirementLinks) {
        for (category, records) in other.categories {
            for record in records {
                self.push(category, record);
            }
        }
    }

    /// Members of a category (empty when the category is not exposed)
    pub fn get(&self, category: LinkCategory) -> &[LinkedRecord] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the category holds at least one member
    pub fn has(&self, category: LinkCategory) -> bool {
        !self.get(category).is_empty()
    }

    /// Non-empty categories with their members, in declaration order
    pub fn active(&self) -> impl Iterator<Item = (LinkCategory, &[LinkedRecord])> {
        LinkCategory::ALL
            .into_iter()
            .map(|category| (category, self.get(category)))
            .filter(|(_, records)| !records.is_empty())
    }

    /// Names of the non-empty categories
    pub fn active_categories(&self) -> Vec<LinkCategory> {
        self.active().map(|(category, _)| category).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    /// Whether the category contains a member with this key
    pub fn contains_key(&self, category: LinkCategory, key: &ConceptKey) -> bool {
        self.get(category).iter().any(|record| &record.key == key)
    }

    /// Members of `category` in `self` whose key also appears in `other`
    pub fn intersection<'a>(
        &'a self,
        other: &'a RequirementLinks,
        category: LinkCategory,
    ) -> impl Iterator<Item = &'a LinkedRecord> + 'a {
        self.get(category)
            .iter()
            .filter(move |record| other.contains_key(category, &record.key))
    }
}
