//! Domain entity facade
//!
//! One adapter per supported entity kind turns a record into a
//! [`RequirementLinks`] snapshot. Every linked member carries the date of the
//! record that exposed it so timeframe operators can filter on it.

use crate::concept::ConceptKey;
use crate::entity::DomainEntity;
use crate::error::ModelError;
use crate::links::{LinkCategory, LinkedRecord, RequirementLinks};
use crate::records::{
    InformationSourceRecord, Patient, PatientDisease, PatientEvent, PatientExamination,
    PatientExaminationIndication, PatientFinding, PatientFindingClassification,
    PatientFindingIntervention, PatientLabSample, PatientLabValue, PatientMedication,
    PatientMedicationSchedule, PatientRisk,
};
use chrono::{DateTime, Utc};

/// A clinical record that can describe what it is linked to
pub trait LinkableEntity {
    /// Snapshot of linked entities, recomputed on every call
    fn links(&self) -> RequirementLinks;

    /// Date of the record, if it is dated
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

/// Build the links snapshot of any entity.
///
/// Collections union the snapshots of their members; records without an
/// adapter fail with [`ModelError::UnsupportedEntityKind`].
pub fn get_links(entity: &DomainEntity) -> Result<RequirementLinks, ModelError> {
    let links = match entity {
        DomainEntity::Patient(r) => r.links(),
        DomainEntity::PatientDisease(r) => r.links(),
        DomainEntity::PatientEvent(r) => r.links(),
        DomainEntity::PatientLabSample(r) => r.links(),
        DomainEntity::PatientLabValue(r) => r.links(),
        DomainEntity::PatientExamination(r) => r.links(),
        DomainEntity::PatientExaminationIndication(r) => r.links(),
        DomainEntity::PatientFinding(r) => r.links(),
        DomainEntity::PatientFindingClassification(r) => r.links(),
        DomainEntity::PatientFindingIntervention(r) => r.links(),
        DomainEntity::PatientMedication(r) => r.links(),
        DomainEntity::PatientMedicationSchedule(r) => r.links(),
        DomainEntity::PatientRisk(r) => r.links(),
        DomainEntity::InformationSource(r) => r.links(),
        DomainEntity::Collection(members) => {
            let mut links = RequirementLinks::new();
            for member in members {
                links.merge(get_links(member)?);
            }
            links
        }
        DomainEntity::Other(opaque) => {
            return Err(ModelError::unsupported(opaque.type_name.clone()));
        }
    };
    Ok(links)
}

impl DomainEntity {
    /// Date of the entity, if it is a single dated record
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Patient(r) => r.timestamp(),
            Self::PatientDisease(r) => r.timestamp(),
            Self::PatientEvent(r) => r.timestamp(),
            Self::PatientLabSample(r) => r.timestamp(),
            Self::PatientLabValue(r) => r.timestamp(),
            Self::PatientExamination(r) => r.timestamp(),
            Self::PatientExaminationIndication(r) => r.timestamp(),
            Self::PatientFinding(r) => r.timestamp(),
            Self::PatientFindingClassification(r) => r.timestamp(),
            Self::PatientFindingIntervention(r) => r.timestamp(),
            Self::PatientMedication(r) => r.timestamp(),
            Self::PatientMedicationSchedule(r) => r.timestamp(),
            Self::PatientRisk(r) => r.timestamp(),
            Self::InformationSource(r) => r.timestamp(),
            Self::Collection(_) | Self::Other(_) => None,
        }
    }
}

fn link(
    links: &mut RequirementLinks,
    category: LinkCategory,
    key: &ConceptKey,
    at: Option<DateTime<Utc>>,
) {
    links.push(category, LinkedRecord::dated(key.clone(), at));
}

impl LinkableEntity for Patient {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        for disease in &self.diseases {
            links.merge(disease.links());
        }
        for event in &self.events {
            links.merge(event.links());
        }
        for sample in &self.lab_samples {
            links.merge(sample.links());
        }
        for reading in &self.lab_values {
            links.merge(reading.links());
        }
        for examination in &self.examinations {
            links.merge(examination.links());
        }
        for medication in &self.medications {
            links.merge(medication.links());
        }
        for schedule in &self.medication_schedules {
            links.merge(schedule.links());
        }
        for risk in &self.risks {
            links.merge(risk.links());
        }
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl LinkableEntity for PatientDisease {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        link(&mut links, LinkCategory::Diseases, &self.disease, self.start_date);
        for choice in &self.classification_choices {
            link(&mut links, LinkCategory::DiseaseClassificationChoices, choice, self.start_date);
        }
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }
}

impl LinkableEntity for PatientEvent {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        link(&mut links, LinkCategory::Events, &self.event, Some(self.date));
        if let Some(source) = &self.information_source {
            link(&mut links, LinkCategory::InformationSources, source, Some(self.date));
        }
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.date)
    }
}

impl LinkableEntity for PatientLabSample {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        for reading in &self.values {
            links.merge(reading.links());
        }
        if let Some(source) = &self.information_source {
            link(&mut links, LinkCategory::InformationSources, source, Some(self.date));
        }
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.date)
    }
}

impl LinkableEntity for PatientLabValue {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        link(&mut links, LinkCategory::LabValues, self.key(), Some(self.datetime));
        if let Some(unit) = &self.unit {
            link(&mut links, LinkCategory::Units, unit, Some(self.datetime));
        }
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.datetime)
    }
}

impl LinkableEntity for PatientExamination {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        link(&mut links, LinkCategory::Examinations, &self.examination, self.date);
        for indication in &self.indications {
            let at = indication.date.or(self.date);
            link(&mut links, LinkCategory::ExaminationIndications, &indication.indication, at);
        }
        for finding in &self.findings {
            links.merge(finding_links(finding, self.date));
        }
        for risk in &self.risks {
            links.merge(risk_links(risk, self.date));
        }
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

impl LinkableEntity for PatientExaminationIndication {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        link(&mut links, LinkCategory::ExaminationIndications, &self.indication, self.date);
        if let Some(examination) = &self.examination {
            link(&mut links, LinkCategory::Examinations, examination, self.date);
        }
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

// Findings and risks recorded during an examination inherit its date when
// they have none of their own.
fn finding_links(finding: &PatientFinding, fallback: Option<DateTime<Utc>>) -> RequirementLinks {
    let at = finding.date.or(fallback);
    let mut links = RequirementLinks::new();
    link(&mut links, LinkCategory::Findings, &finding.finding, at);
    for classification in &finding.classifications {
        let when = classification.date.or(at);
        link(&mut links, LinkCategory::FindingClassificationChoices, &classification.choice, when);
    }
    for intervention in &finding.interventions {
        let when = intervention.date.or(at);
        link(&mut links, LinkCategory::Interventions, &intervention.intervention, when);
    }
    links
}

fn risk_links(risk: &PatientRisk, fallback: Option<DateTime<Utc>>) -> RequirementLinks {
    let at = risk.date.or(fallback);
    let mut links = RequirementLinks::new();
    link(&mut links, LinkCategory::Risks, &risk.risk, at);
    link(&mut links, LinkCategory::RiskTypes, &risk.risk_type, at);
    links
}

impl LinkableEntity for PatientFinding {
    fn links(&self) -> RequirementLinks {
        finding_links(self, None)
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

impl LinkableEntity for PatientFindingClassification {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        link(&mut links, LinkCategory::FindingClassificationChoices, &self.choice, self.date);
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

impl LinkableEntity for PatientFindingIntervention {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        link(&mut links, LinkCategory::Interventions, &self.intervention, self.date);
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

fn medication_links(medication: &PatientMedication, fallback: Option<DateTime<Utc>>) -> RequirementLinks {
    let at = medication.start_date.or(fallback);
    let mut links = RequirementLinks::new();
    link(&mut links, LinkCategory::Medications, &medication.medication, at);
    if let Some(indication) = &medication.indication {
        link(&mut links, LinkCategory::MedicationIndications, indication, at);
    }
    for intake_time in &medication.intake_times {
        link(&mut links, LinkCategory::IntakeTimes, intake_time, at);
    }
    if let Some(unit) = &medication.unit {
        link(&mut links, LinkCategory::Units, unit, at);
    }
    links
}

impl LinkableEntity for PatientMedication {
    fn links(&self) -> RequirementLinks {
        medication_links(self, None)
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }
}

impl LinkableEntity for PatientMedicationSchedule {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        link(&mut links, LinkCategory::MedicationSchedules, &self.schedule, self.start_date);
        for medication in &self.medications {
            links.merge(medication_links(medication, self.start_date));
        }
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }
}

impl LinkableEntity for PatientRisk {
    fn links(&self) -> RequirementLinks {
        risk_links(self, None)
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

impl LinkableEntity for InformationSourceRecord {
    fn links(&self) -> RequirementLinks {
        let mut links = RequirementLinks::new();
        link(&mut links, LinkCategory::InformationSources, &self.source, self.date);
        links
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}
