//! Patient domain models
//!
//! Field names follow the stored document layout, so the JSON accepted by the
//! API is written to MongoDB unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;

/// Terminology code (e.g. SNOMED CT, LOINC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coding {
    pub system: String,
    pub code: String,
    pub display: String,
}

/// Diagnosed condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Condition {
    #[validate(length(min = 1))]
    pub id: String,
    /// Codings grouped by key, usually `"coding"`
    pub code: BTreeMap<String, Vec<Coding>>,
    #[serde(rename = "onsetDateTime")]
    pub onset_date_time: String,
    #[serde(rename = "clinicalStatus")]
    pub clinical_status: String,
}

/// Medication order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Medication {
    pub status: String,
    pub stage: String,
    pub medication: String,
    #[serde(rename = "patientReference")]
    pub patient_reference: String,
    #[serde(rename = "contextReference")]
    pub context_reference: String,
    #[serde(rename = "dateWritten")]
    pub date_written: String,
    #[serde(rename = "dosageInstruction")]
    pub dosage_instruction: Vec<BTreeMap<String, Option<Value>>>,
}

/// Clinical observation (vitals, lab results)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Observation {
    #[validate(length(min = 1))]
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(rename = "effectiveDateTime")]
    pub effective_date_time: String,
    pub components: Vec<Value>,
}

/// Medical records embedded in a patient document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct MedicalRecords {
    #[validate(nested)]
    pub conditions: Vec<Condition>,
    #[validate(nested)]
    pub medications: Vec<Medication>,
    #[validate(nested)]
    pub observations: Vec<Observation>,
}

/// Patient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Patient {
    #[serde(rename = "patientID")]
    #[validate(length(min = 1, max = PATIENT_ID_MAX_LEN))]
    pub patient_id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0, max = 150))]
    pub age: i32,
    pub gender: String,
    pub region: String,
    #[serde(rename = "medicalRecords")]
    #[validate(nested)]
    pub medical_records: MedicalRecords,
}

/// Patient create response
#[derive(Debug, Serialize, Deserialize)]
pub struct PatientCreatedResponse {
    pub message: String,
    pub patient_id: String,
}

/// Medical record list a single entry can be appended to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Condition,
    Medication,
    Observation,
}

impl RecordKind {
    /// Dotted path of the array inside the patient document
    pub fn field_path(&self) -> &'static str {
        match self {
            RecordKind::Condition => "medicalRecords.conditions",
            RecordKind::Medication => "medicalRecords.medications",
            RecordKind::Observation => "medicalRecords.observations",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Condition => "condition",
            RecordKind::Medication => "medication",
            RecordKind::Observation => "observation",
        }
    }

    /// Message returned once an entry was appended
    pub fn added_message(&self) -> &'static str {
        match self {
            RecordKind::Condition => "Condition added successfully",
            RecordKind::Medication => "Medication added successfully",
            RecordKind::Observation => "Observation added successfully",
        }
    }
}

/// Top-level field holding the medical records
pub const MEDICAL_RECORDS_FIELD: &str = "medicalRecords";

/// Field carrying the external patient identifier
pub const PATIENT_ID_FIELD: &str = "patientID";

/// Upper bound on `patientID` length, in characters
pub const PATIENT_ID_MAX_LEN: u64 = 64;
