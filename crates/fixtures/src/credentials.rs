//! Caregiver credentials (certifications, background checks, licenses).
//!
//! `daysLeft` and `status` are both derived from the one expiration date that
//! is returned, so a single credential is always internally consistent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FixtureResult;
use crate::overrides::{apply_overrides, Overrides};
use crate::params::{filter_and_slice, ItemResponse, ListParams, ListResponse};
use crate::seed;

pub const CREDENTIAL_POPULATION: usize = 100;

/// Credentials expiring within this many days are `expiring`.
pub const EXPIRING_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialType {
    #[serde(rename = "CPR")]
    Cpr,
    #[serde(rename = "First Aid")]
    FirstAid,
    #[serde(rename = "STNA")]
    Stna,
    #[serde(rename = "HHA Certification")]
    HhaCertification,
    #[serde(rename = "TB Test")]
    TbTest,
    #[serde(rename = "Background Check")]
    BackgroundCheck,
    #[serde(rename = "Driver License")]
    DriverLicense,
    #[serde(rename = "Auto Insurance")]
    AutoInsurance,
}

const CREDENTIAL_TYPES: &[CredentialType] = &[
    CredentialType::Cpr,
    CredentialType::FirstAid,
    CredentialType::Stna,
    CredentialType::HhaCertification,
    CredentialType::TbTest,
    CredentialType::BackgroundCheck,
    CredentialType::DriverLicense,
    CredentialType::AutoInsurance,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Active,
    Expiring,
    Expired,
}

impl CredentialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStatus::Active => "active",
            CredentialStatus::Expiring => "expiring",
            CredentialStatus::Expired => "expired",
        }
    }

    pub fn from_days_left(days_left: i64) -> Self {
        if days_left < 0 {
            CredentialStatus::Expired
        } else if days_left <= EXPIRING_WINDOW_DAYS {
            CredentialStatus::Expiring
        } else {
            CredentialStatus::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Credential {
    pub id: String,
    pub caregiver_id: String,
    pub caregiver_name: String,
    pub credential_type: CredentialType,
    pub issue_date: String,
    pub expiration_date: String,
    pub days_left: i64,
    pub status: CredentialStatus,
    pub verified: bool,
    pub document_url: String,
}

fn build_credential(caregiver_id: String, caregiver_name: String) -> Credential {
    let expiration = seed::date_offset(-60, 365);
    let days_left = (expiration - seed::today()).num_days();
    let issued = expiration - chrono::Duration::days(365 * i64::from(seed::int_between(1, 2)));
    let id = seed::id("cred");
    Credential {
        document_url: format!("/documents/credentials/{}.pdf", id),
        id,
        caregiver_id,
        caregiver_name,
        credential_type: seed::pick(CREDENTIAL_TYPES),
        issue_date: seed::date_string(issued),
        expiration_date: seed::date_string(expiration),
        days_left,
        status: CredentialStatus::from_days_left(days_left),
        verified: seed::chance(0.85),
    }
}

pub fn generate_credential() -> Credential {
    build_credential(
        seed::id("cg"),
        format!("{} {}", seed::first_name(), seed::last_name()),
    )
}

pub fn generate_credential_with(overrides: &Overrides) -> FixtureResult<Credential> {
    apply_overrides(generate_credential(), overrides)
}

pub fn generate_credentials(count: usize) -> Vec<Credential> {
    (0..count).map(|_| generate_credential()).collect()
}

pub fn get_credentials_response(params: &ListParams) -> ListResponse<Credential> {
    filter_and_slice(generate_credentials(CREDENTIAL_POPULATION), params, |c| {
        params.status_matches(c.status.as_str())
            && params.search_matches(&[&c.caregiver_name, &c.id])
            && expiration_in_range(c, params)
    })
}

/// Credentials expiring within `params.days` (default 30), soonest first.
pub fn get_expiring_credentials_response(params: &ListParams) -> ListResponse<Credential> {
    let window = params.days.unwrap_or(EXPIRING_WINDOW_DAYS);
    let mut candidates = generate_credentials(CREDENTIAL_POPULATION);
    candidates.sort_by_key(|c| c.days_left);
    filter_and_slice(candidates, params, |c| c.days_left >= 0 && c.days_left <= window)
}

pub fn get_caregiver_credentials_response(caregiver_id: &str) -> ItemResponse<Vec<Credential>> {
    let name = format!("{} {}", seed::first_name(), seed::last_name());
    let count = seed::int_between(3, 8) as usize;
    let credentials = (0..count)
        .map(|_| build_credential(caregiver_id.to_string(), name.clone()))
        .collect();
    ItemResponse::new(credentials)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub total: usize,
    pub active: usize,
    pub expiring: usize,
    pub expired: usize,
    pub compliance_rate: f64,
}

/// `GET /credentials/summary` returns a bare object, computed from one population.
pub fn get_credential_summary_response() -> CredentialSummary {
    let credentials = generate_credentials(CREDENTIAL_POPULATION);
    let count = |status: CredentialStatus| credentials.iter().filter(|c| c.status == status).count();
    let active = count(CredentialStatus::Active);
    let expiring = count(CredentialStatus::Expiring);
    let expired = count(CredentialStatus::Expired);
    let total = credentials.len();
    CredentialSummary {
        total,
        active,
        expiring,
        expired,
        compliance_rate: seed::round_cents((active + expiring) as f64 / total.max(1) as f64 * 100.0),
    }
}

fn expiration_in_range(credential: &Credential, params: &ListParams) -> bool {
    match NaiveDate::parse_from_str(&credential.expiration_date, "%Y-%m-%d") {
        Ok(date) => params.date_in_range(date),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_derived_from_returned_date() {
        for _ in 0..200 {
            let credential = generate_credential();
            let expiration =
                NaiveDate::parse_from_str(&credential.expiration_date, "%Y-%m-%d").unwrap();
            let days_left = (expiration - seed::today()).num_days();
            assert_eq!(credential.days_left, days_left);
            assert_eq!(credential.status, CredentialStatus::from_days_left(days_left));
        }
    }

    #[test]
    fn test_status_override_wins() {
        for _ in 0..50 {
            let credential =
                generate_credential_with(&Overrides::new().set("status", "expired")).unwrap();
            assert_eq!(credential.status, CredentialStatus::Expired);
        }
    }

    #[test]
    fn test_expiring_window() {
        let params = ListParams { days: Some(14), ..Default::default() };
        let response = get_expiring_credentials_response(&params);
        assert!(response.data.iter().all(|c| (0..=14).contains(&c.days_left)));
        assert!(response.data.windows(2).all(|w| w[0].days_left <= w[1].days_left));
    }

    #[test]
    fn test_summary_adds_up() {
        let summary = get_credential_summary_response();
        assert_eq!(summary.active + summary.expiring + summary.expired, summary.total);
    }

    #[test]
    fn test_credential_type_wire_name() {
        let value = serde_json::to_value(CredentialType::TbTest).unwrap();
        assert_eq!(value, "TB Test");
    }
}
