//! Patient record types
//!
//! Records are materialized by the persistence layer before evaluation; the
//! engine only reads them.

use crate::concept::{ConceptKey, Gender, LabValueDefinition, NormalRange};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A patient together with every record the caller loaded for them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub diseases: Vec<PatientDisease>,
    #[serde(default)]
    pub events: Vec<PatientEvent>,
    #[serde(default)]
    pub lab_samples: Vec<PatientLabSample>,
    /// Readings recorded without a sample
    #[serde(default)]
    pub lab_values: Vec<PatientLabValue>,
    #[serde(default)]
    pub examinations: Vec<PatientExamination>,
    #[serde(default)]
    pub medications: Vec<PatientMedication>,
    #[serde(default)]
    pub medication_schedules: Vec<PatientMedicationSchedule>,
    #[serde(default)]
    pub risks: Vec<PatientRisk>,
}

impl Patient {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    /// All lab readings, sampled or not
    pub fn readings(&self) -> impl Iterator<Item = &PatientLabValue> {
        self.lab_samples
            .iter()
            .flat_map(|sample| sample.values.iter())
            .chain(self.lab_values.iter())
    }

    /// Age in completed years on `date`
    pub fn age_at(&self, date: NaiveDate) -> Option<u32> {
        age_on(self.birth_date?, date)
    }
}

/// Age in completed years on `date` for someone born on `birth`
pub fn age_on(birth: NaiveDate, date: NaiveDate) -> Option<u32> {
    if date < birth {
        return None;
    }
    let mut years = date.year() - birth.year();
    if (date.month(), date.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// A diagnosed disease
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDisease {
    pub disease: ConceptKey,
    #[serde(default)]
    pub classification_choices: Vec<ConceptKey>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl PatientDisease {
    pub fn new(disease: impl Into<ConceptKey>) -> Self {
        Self {
            disease: disease.into(),
            classification_choices: Vec::new(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_choice(mut self, choice: impl Into<ConceptKey>) -> Self {
        self.classification_choices.push(choice.into());
        self
    }

    pub fn starting(mut self, date: DateTime<Utc>) -> Self {
        self.start_date = Some(date);
        self
    }
}

/// A dated clinical event (e.g. a stroke, a surgery)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientEvent {
    pub event: ConceptKey,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub information_source: Option<ConceptKey>,
}

impl PatientEvent {
    pub fn new(event: impl Into<ConceptKey>, date: DateTime<Utc>) -> Self {
        Self {
            event: event.into(),
            date,
            information_source: None,
        }
    }
}

/// A lab sample with the readings measured from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientLabSample {
    pub sample_type: ConceptKey,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub values: Vec<PatientLabValue>,
    #[serde(default)]
    pub information_source: Option<ConceptKey>,
}

impl PatientLabSample {
    pub fn new(sample_type: impl Into<ConceptKey>, date: DateTime<Utc>) -> Self {
        Self {
            sample_type: sample_type.into(),
            date,
            values: Vec::new(),
            information_source: None,
        }
    }

    pub fn with_value(mut self, value: PatientLabValue) -> Self {
        self.values.push(value);
        self
    }
}

/// A single recorded lab reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientLabValue {
    pub lab_value: Arc<LabValueDefinition>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub value_str: Option<String>,
    #[serde(default)]
    pub unit: Option<ConceptKey>,
    pub datetime: DateTime<Utc>,
    /// Range reported by the lab for this reading; overrides the definition
    #[serde(default)]
    pub normal_range: Option<NormalRange>,
}

impl PatientLabValue {
    pub fn numeric(lab_value: Arc<LabValueDefinition>, value: Decimal, datetime: DateTime<Utc>) -> Self {
        Self {
            lab_value,
            value: Some(value),
            value_str: None,
            unit: None,
            datetime,
            normal_range: None,
        }
    }

    pub fn categorical(
        lab_value: Arc<LabValueDefinition>,
        value: impl Into<String>,
        datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            lab_value,
            value: None,
            value_str: Some(value.into()),
            unit: None,
            datetime,
            normal_range: None,
        }
    }

    pub fn with_normal_range(mut self, range: NormalRange) -> Self {
        self.normal_range = Some(range);
        self
    }

    pub fn key(&self) -> &ConceptKey {
        &self.lab_value.key
    }
}

/// A performed or planned examination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientExamination {
    pub examination: ConceptKey,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub indications: Vec<PatientExaminationIndication>,
    #[serde(default)]
    pub findings: Vec<PatientFinding>,
    #[serde(default)]
    pub risks: Vec<PatientRisk>,
}

impl PatientExamination {
    pub fn new(examination: impl Into<ConceptKey>) -> Self {
        Self {
            examination: examination.into(),
            date: None,
            indications: Vec::new(),
            findings: Vec::new(),
            risks: Vec::new(),
        }
    }

    pub fn on(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_finding(mut self, finding: PatientFinding) -> Self {
        self.findings.push(finding);
        self
    }

    pub fn with_indication(mut self, indication: PatientExaminationIndication) -> Self {
        self.indications.push(indication);
        self
    }
}

/// Why an examination was requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientExaminationIndication {
    pub indication: ConceptKey,
    #[serde(default)]
    pub examination: Option<ConceptKey>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl PatientExaminationIndication {
    pub fn new(indication: impl Into<ConceptKey>) -> Self {
        Self {
            indication: indication.into(),
            examination: None,
            date: None,
        }
    }
}

/// A finding documented during an examination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFinding {
    pub finding: ConceptKey,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub classifications: Vec<PatientFindingClassification>,
    #[serde(default)]
    pub interventions: Vec<PatientFindingIntervention>,
}

impl PatientFinding {
    pub fn new(finding: impl Into<ConceptKey>) -> Self {
        Self {
            finding: finding.into(),
            date: None,
            classifications: Vec::new(),
            interventions: Vec::new(),
        }
    }

    pub fn with_classification(mut self, classification: PatientFindingClassification) -> Self {
        self.classifications.push(classification);
        self
    }

    pub fn with_intervention(mut self, intervention: PatientFindingIntervention) -> Self {
        self.interventions.push(intervention);
        self
    }
}

/// The choice made for one classification of a finding (e.g. Paris 0-Is)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFindingClassification {
    pub classification: ConceptKey,
    pub choice: ConceptKey,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl PatientFindingClassification {
    pub fn new(classification: impl Into<ConceptKey>, choice: impl Into<ConceptKey>) -> Self {
        Self {
            classification: classification.into(),
            choice: choice.into(),
            date: None,
        }
    }
}

/// An intervention performed on a finding (e.g. a polypectomy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFindingIntervention {
    pub intervention: ConceptKey,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl PatientFindingIntervention {
    pub fn new(intervention: impl Into<ConceptKey>) -> Self {
        Self {
            intervention: intervention.into(),
            date: None,
        }
    }
}

/// A medication the patient takes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientMedication {
    pub medication: ConceptKey,
    #[serde(default)]
    pub indication: Option<ConceptKey>,
    #[serde(default)]
    pub intake_times: Vec<ConceptKey>,
    #[serde(default)]
    pub unit: Option<ConceptKey>,
    #[serde(default)]
    pub dosage: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
}

impl PatientMedication {
    pub fn new(medication: impl Into<ConceptKey>) -> Self {
        Self {
            medication: medication.into(),
            indication: None,
            intake_times: Vec::new(),
            unit: None,
            dosage: None,
            start_date: None,
        }
    }

    pub fn for_indication(mut self, indication: impl Into<ConceptKey>) -> Self {
        self.indication = Some(indication.into());
        self
    }

    pub fn with_intake_time(mut self, intake_time: impl Into<ConceptKey>) -> Self {
        self.intake_times.push(intake_time.into());
        self
    }
}

/// A medication plan grouping several medications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientMedicationSchedule {
    pub schedule: ConceptKey,
    #[serde(default)]
    pub medications: Vec<PatientMedication>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
}

impl PatientMedicationSchedule {
    pub fn new(schedule: impl Into<ConceptKey>) -> Self {
        Self {
            schedule: schedule.into(),
            medications: Vec::new(),
            start_date: None,
        }
    }

    pub fn with_medication(mut self, medication: PatientMedication) -> Self {
        self.medications.push(medication);
        self
    }
}

/// An assessed risk (e.g. bleeding risk, classified by risk type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRisk {
    pub risk: ConceptKey,
    pub risk_type: ConceptKey,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl PatientRisk {
    pub fn new(risk: impl Into<ConceptKey>, risk_type: impl Into<ConceptKey>) -> Self {
        Self {
            risk: risk.into(),
            risk_type: risk_type.into(),
            date: None,
        }
    }
}

/// Where a piece of information came from (report, interview, device ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationSourceRecord {
    pub source: ConceptKey,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl InformationSourceRecord {
    pub fn new(source: impl Into<ConceptKey>) -> Self {
        Self {
            source: source.into(),
            date: None,
        }
    }
}
