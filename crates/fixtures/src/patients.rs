//! Patients (clients receiving home care).

use serde::{Deserialize, Serialize};

use crate::error::FixtureResult;
use crate::overrides::{apply_overrides, Overrides};
use crate::params::{filter_and_slice, ItemResponse, ListParams, ListResponse};
use crate::seed;

pub const PATIENT_POPULATION: usize = 50;

const DIAGNOSES: &[&str] = &[
    "Type 2 diabetes mellitus",
    "Congestive heart failure",
    "Alzheimer's disease",
    "COPD",
    "Parkinson's disease",
    "Post-stroke hemiplegia",
    "Intellectual disability",
];

const PROGRAMS: &[&str] = &["PASSPORT", "Ohio Home Care Waiver", "Assisted Living Waiver", "Private Pay"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Active,
    Pending,
    OnHold,
    Discharged,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Active => "active",
            PatientStatus::Pending => "pending",
            PatientStatus::OnHold => "on_hold",
            PatientStatus::Discharged => "discharged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Patient {
    pub id: String,
    pub medical_record_number: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub status: PatientStatus,
    pub payer: String,
    pub program: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub primary_diagnosis: String,
    pub assigned_caregiver_id: String,
    pub admission_date: String,
    pub authorized_hours_per_week: u32,
}

pub fn generate_patient() -> Patient {
    let status = if seed::chance(0.75) {
        PatientStatus::Active
    } else {
        seed::pick(&[PatientStatus::Pending, PatientStatus::OnHold, PatientStatus::Discharged])
    };
    Patient {
        id: seed::id("pat"),
        medical_record_number: format!("MRN-{:06}", seed::int_between(100_000, 999_999)),
        first_name: seed::first_name().to_string(),
        last_name: seed::last_name().to_string(),
        date_of_birth: seed::date_string(seed::date_offset(-365 * 98, -365 * 22)),
        gender: seed::pick(&["female", "male"]).to_string(),
        status,
        payer: seed::pick(seed::PAYERS).to_string(),
        program: seed::pick(PROGRAMS).to_string(),
        address: format!("{} {}", seed::int_between(100, 9999), seed::pick(seed::STREETS)),
        city: seed::pick(seed::CITIES).to_string(),
        state: "OH".to_string(),
        phone: seed::phone(),
        primary_diagnosis: seed::pick(DIAGNOSES).to_string(),
        assigned_caregiver_id: seed::id("cg"),
        admission_date: seed::date_string(seed::date_offset(-900, -7)),
        authorized_hours_per_week: seed::int_between(4, 56),
    }
}

pub fn generate_patient_with(overrides: &Overrides) -> FixtureResult<Patient> {
    apply_overrides(generate_patient(), overrides)
}

pub fn generate_patients(count: usize) -> Vec<Patient> {
    (0..count).map(|_| generate_patient()).collect()
}

pub fn get_patients_response(params: &ListParams) -> ListResponse<Patient> {
    filter_and_slice(generate_patients(PATIENT_POPULATION), params, |p| {
        params.status_matches(p.status.as_str())
            && params.search_matches(&[&p.first_name, &p.last_name, &p.medical_record_number])
    })
}

pub fn get_patient_response(id: &str) -> FixtureResult<ItemResponse<Patient>> {
    Ok(ItemResponse::new(generate_patient_with(&Overrides::new().set("id", id))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter() {
        let response = get_patients_response(&ListParams::new().with_status("active"));
        assert!(response.data.iter().all(|p| p.status == PatientStatus::Active));
    }

    #[test]
    fn test_limit_slices_but_total_does_not() {
        let response = get_patients_response(&ListParams::new().with_limit(5));
        assert_eq!(response.data.len(), 5);
        assert_eq!(response.total, PATIENT_POPULATION);
    }

    #[test]
    fn test_pinned_id() {
        let response = get_patient_response("pat-001").unwrap();
        assert_eq!(response.data.id, "pat-001");
    }
}
