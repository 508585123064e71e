//! The closed union of every entity kind a requirement can be evaluated against

use crate::records::{
    InformationSourceRecord, Patient, PatientDisease, PatientEvent, PatientExamination,
    PatientExaminationIndication, PatientFinding, PatientFindingClassification,
    PatientFindingIntervention, PatientLabSample, PatientLabValue, PatientMedication,
    PatientMedicationSchedule, PatientRisk,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a supported clinical-data entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainEntityKind {
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
}

impl DomainEntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::PatientDisease => "patient_disease",
            Self::PatientEvent => "patient_event",
            Self::PatientLabSample => "patient_lab_sample",
            Self::PatientLabValue => "patient_lab_value",
            Self::PatientExamination => "patient_examination",
            Self::PatientExaminationIndication => "patient_examination_indication",
            Self::PatientFinding => "patient_finding",
            Self::PatientFindingClassification => "patient_finding_classification",
            Self::PatientFindingIntervention => "patient_finding_intervention",
            Self::PatientMedication => "patient_medication",
            Self::PatientMedicationSchedule => "patient_medication_schedule",
            Self::PatientRisk => "patient_risk",
            Self::InformationSource => "information_source",
        }
    }
}

impl fmt::Display for DomainEntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record handed over by the surrounding application that the engine has
/// no adapter for (a video file, a report PDF, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueEntity {
    pub type_name: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl OpaqueEntity {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: None,
        }
    }
}

/// Any input a requirement can be evaluated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DomainEntity {
    Patient(Patient),
    PatientDisease(PatientDisease),
    PatientEvent(PatientEvent),
    PatientLabSample(PatientLabSample),
    PatientLabValue(PatientLabValue),
    PatientExamination(PatientExamination),
    PatientExaminationIndication(PatientExaminationIndication),
    PatientFinding(PatientFinding),
    PatientFindingClassification(PatientFindingClassification),
    PatientFindingIntervention(PatientFindingIntervention),
    PatientMedication(PatientMedication),
    PatientMedicationSchedule(PatientMedicationSchedule),
    PatientRisk(PatientRisk),
    InformationSource(InformationSourceRecord),
    /// Several entities evaluated together (e.g. a query result)
    Collection(Vec<DomainEntity>),
    /// A record without an adapter
    Other(OpaqueEntity),
}

impl DomainEntity {
    /// Kind of a single supported entity; `None` for collections and
    /// unsupported records
    pub fn kind(&self) -> Option<DomainEntityKind> {
        let kind = match self {
            Self::Patient(_) => DomainEntityKind::Patient,
            Self::PatientDisease(_) => DomainEntityKind::PatientDisease,
            Self::PatientEvent(_) => DomainEntityKind::PatientEvent,
            Self::PatientLabSample(_) => DomainEntityKind::PatientLabSample,
            Self::PatientLabValue(_) => DomainEntityKind::PatientLabValue,
            Self::PatientExamination(_) => DomainEntityKind::PatientExamination,
            Self::PatientExaminationIndication(_) => DomainEntityKind::PatientExaminationIndication,
            Self::PatientFinding(_) => DomainEntityKind::PatientFinding,
            Self::PatientFindingClassification(_) => DomainEntityKind::PatientFindingClassification,
            Self::PatientFindingIntervention(_) => DomainEntityKind::PatientFindingIntervention,
            Self::PatientMedication(_) => DomainEntityKind::PatientMedication,
            Self::PatientMedicationSchedule(_) => DomainEntityKind::PatientMedicationSchedule,
            Self::PatientRisk(_) => DomainEntityKind::PatientRisk,
            Self::InformationSource(_) => DomainEntityKind::InformationSource,
            Self::Collection(_) | Self::Other(_) => return None,
        };
        Some(kind)
    }

    /// Whether the facade has an adapter for this entity (recursively for
    /// collections)
    pub fn is_supported(&self) -> bool {
        match self {
            Self::Other(_) => false,
            Self::Collection(members) => members.iter().all(Self::is_supported),
            _ => true,
        }
    }

    /// Human-readable type name, used in error messages
    pub fn type_name(&self) -> String {
        match self {
            Self::Other(opaque) => opaque.type_name.clone(),
            Self::Collection(members) => format!("collection[{}]", members.len()),
            other => other.kind().map(|k| k.name().to_string()).unwrap_or_default(),
        }
    }

    /// Iterate over the leaf entities (flattening nested collections)
    pub fn leaves(&self) -> Vec<&DomainEntity> {
        match self {
            Self::Collection(members) => members.iter().flat_map(Self::leaves).collect(),
            other => vec![other],
        }
    }
}

macro_rules! impl_from_record {
    ($($record:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$record> for DomainEntity {
                fn from(record: $record) -> Self {
                    Self::$variant(record)
                }
            }
        )*
    };
}

impl_from_record! {
    Patient => Patient,
    PatientDisease => PatientDisease,
    PatientEvent => PatientEvent,
    PatientLabSample => PatientLabSample,
    PatientLabValue => PatientLabValue,
    PatientExamination => PatientExamination,
    PatientExaminationIndication => PatientExaminationIndication,
    PatientFinding => PatientFinding,
    PatientFindingClassification => PatientFindingClassification,
    PatientFindingIntervention => PatientFindingIntervention,
    PatientMedication => PatientMedication,
    PatientMedicationSchedule => PatientMedicationSchedule,
    PatientRisk => PatientRisk,
    InformationSourceRecord => InformationSource,
    OpaqueEntity => Other,
}

impl From<Vec<DomainEntity>> for DomainEntity {
    fn from(members: Vec<DomainEntity>) -> Self {
        Self::Collection(members)
    }
}
