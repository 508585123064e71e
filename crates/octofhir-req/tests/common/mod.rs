//! Common test utilities for requirement evaluation
//!
//! This module provides shared fixtures:
//! - A fixed evaluation instant and contexts built on it
//! - Lab value definitions and readings
//! - Patients and clinical records dated relative to the fixed instant
//! - A catalog document covering every operator family

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use octofhir_req::model::{
    LabValueDefinition, LinkCategory, NormalRange, Patient, PatientDisease, PatientEvent,
    PatientLabValue, Unit,
};
use octofhir_req::{EvaluationContext, EvaluationMode, Requirement, RequirementType};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Route engine logs to the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 2024-06-15 12:00:00 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

pub fn test_context() -> EvaluationContext {
    EvaluationContext::new(now())
}

pub fn strict_context() -> EvaluationContext {
    EvaluationContext::builder()
        .now(now())
        .mode(EvaluationMode::Strict)
        .build()
}

pub fn hemoglobin() -> Arc<LabValueDefinition> {
    Arc::new(
        LabValueDefinition::new("hemoglobin")
            .with_normal_range(NormalRange::between(Decimal::from(12), Decimal::from(16))),
    )
}

pub fn hemoglobin_reading(value: i64, age_days: i64) -> PatientLabValue {
    PatientLabValue::numeric(hemoglobin(), Decimal::from(value), days_ago(age_days))
}

pub fn culture_reading(value: &str, age_days: i64) -> PatientLabValue {
    PatientLabValue::categorical(
        Arc::new(LabValueDefinition::new("blood_culture")),
        value,
        days_ago(age_days),
    )
}

pub fn patient_with_diseases(keys: &[&str]) -> Patient {
    let mut patient = Patient::new("patient-1");
    patient
        .diseases
        .extend(keys.iter().map(|key| PatientDisease::new(*key)));
    patient
}

pub fn patient_with_stroke(age_days: i64) -> Patient {
    let mut patient = Patient::new("patient-1");
    patient
        .events
        .push(PatientEvent::new("stroke", days_ago(age_days)));
    patient
}

/// Diseases D1 or D2 on a patient
pub fn disease_requirement() -> Requirement {
    Requirement::new("has_d1_or_d2")
        .with_operator("models_match_any")
        .with_type(RequirementType::Patient)
        .with_link(LinkCategory::Diseases, ["D1", "D2"])
}

/// Stroke within the last 30 days
pub fn recent_stroke_requirement() -> Requirement {
    Requirement::new("recent_stroke")
        .with_operator("models_match_any_in_timeframe")
        .with_type(RequirementType::Patient)
        .with_link(LinkCategory::Events, ["stroke"])
        .with_timeframe(Decimal::from(-30), Decimal::ZERO, Unit::new("days"))
}

pub fn lab_requirement(name: &str, operator: &str, lab_value: &str) -> Requirement {
    Requirement::new(name)
        .with_operator(operator)
        .with_type(RequirementType::LabResult)
        .with_type(RequirementType::Patient)
        .with_link(LinkCategory::LabValues, [lab_value])
}

/// Catalog document exercising every operator family and nested sets
pub const CATALOG_JSON: &str = r#"{
  "requirements": [
    {
      "name": "has_ckd",
      "categories": { "diseases": [{ "key": "ckd_3" }, { "key": "ckd_4" }] },
      "operators": ["models_match_any"],
      "types": ["patient"]
    },
    {
      "name": "recent_stroke",
      "categories": { "events": [{ "key": "stroke" }] },
      "numeric_value_min": "-30",
      "numeric_value_max": "0",
      "unit": { "key": "days" },
      "operators": ["models_match_any_in_timeframe"],
      "types": ["patient"]
    },
    {
      "name": "anemia",
      "categories": { "lab_values": [{ "key": "hemoglobin" }] },
      "operators": ["lab_latest_numeric_decreased"],
      "types": ["patient", "lab_result"]
    },
    {
      "name": "positive_culture",
      "categories": { "lab_values": [{ "key": "blood_culture" }] },
      "operators": ["lab_latest_categorical_match_substring"],
      "types": ["patient"],
      "string_values": ["positive"]
    }
  ],
  "requirement_sets": [
    {
      "name": "anticoagulation_review",
      "set_type": "all",
      "requirements": ["has_ckd"],
      "linked_sets": ["contraindications_absent"]
    },
    {
      "name": "contraindications_absent",
      "set_type": "none",
      "requirements": ["recent_stroke", "anemia"]
    },
    {
      "name": "infection_workup",
      "set_type": "any",
      "requirements": ["positive_culture", "anemia"]
    }
  ]
}"#;
