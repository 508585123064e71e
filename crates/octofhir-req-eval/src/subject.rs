//! Evaluation subjects and the values resolved from them

use crate::context::EvaluationMode;
use crate::resolver::{Demographics, ReadingFilter, latest_reading};
use octofhir_req_model::{ConceptKey, DomainEntity, Patient, PatientLabValue};

/// The domain object(s) a requirement is evaluated against.
///
/// The primary entity decides applicability. Secondary entities supply
/// explicit values, e.g. the one lab reading a requirement should look at.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    primary: DomainEntity,
    secondary: Vec<DomainEntity>,
}

impl Subject {
    pub fn new(primary: impl Into<DomainEntity>) -> Self {
        Self {
            primary: primary.into(),
            secondary: Vec::new(),
        }
    }

    pub fn with_secondary(mut self, entity: impl Into<DomainEntity>) -> Self {
        self.secondary.push(entity.into());
        self
    }

    pub fn primary(&self) -> &DomainEntity {
        &self.primary
    }

    pub fn secondary(&self) -> &[DomainEntity] {
        &self.secondary
    }

    /// Primary followed by the secondaries
    pub fn entities(&self) -> impl Iterator<Item = &DomainEntity> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }
}

/// Lab readings and demographics the lab operators work with
#[derive(Debug, Clone, Default)]
pub struct ResolvedValues<'a> {
    /// Readings passed explicitly, as lab values or samples
    pub readings: Vec<&'a PatientLabValue>,
    /// A patient's own readings; only filled in loose mode
    pub patient_readings: Vec<&'a PatientLabValue>,
    pub demographics: Demographics,
}

impl<'a> ResolvedValues<'a> {
    /// Collect candidate readings and demographics from every supported
    /// input.
    pub fn collect(subject: &'a Subject, mode: EvaluationMode) -> Self {
        let mut values = Self::default();
        let mut patients = Vec::new();

        for leaf in subject.entities().flat_map(DomainEntity::leaves) {
            match leaf {
                DomainEntity::PatientLabValue(reading) => values.readings.push(reading),
                DomainEntity::PatientLabSample(sample) => values.readings.extend(sample.values.iter()),
                DomainEntity::Patient(patient) => patients.push(patient),
                _ => {}
            }
        }

        if let Some(patient) = patients.first() {
            values.demographics = Demographics::from_patient(patient);
        }
        if mode == EvaluationMode::Loose {
            values.patient_readings = patients.iter().copied().flat_map(Patient::readings).collect();
        }
        values
    }

    /// Latest reading of `key` that passes the filter.
    ///
    /// Explicit readings of a lab value shadow the patient's readings of
    /// the same lab value; other lab values still resolve from the patient.
    pub fn latest(&self, key: &ConceptKey, filter: ReadingFilter<'_>) -> Option<&'a PatientLabValue> {
        if self.readings.iter().any(|reading| reading.key() == key) {
            latest_reading(&self.readings, key, filter)
        } else {
            latest_reading(&self.patient_readings, key, filter)
        }
    }
}
