//! HR: applicant pipeline, employees and onboarding checklists.

use serde::{Deserialize, Serialize};

use crate::error::FixtureResult;
use crate::overrides::{apply_overrides, Overrides};
use crate::params::{filter_and_slice, ItemResponse, ListParams, ListResponse};
use crate::seed;

pub const APPLICANT_POPULATION: usize = 30;
pub const EMPLOYEE_POPULATION: usize = 35;

const POSITIONS: &[&str] = &["STNA", "HHA", "RN", "LPN", "DSP", "Scheduler"];
const SOURCES: &[&str] = &["Indeed", "Referral", "Website", "Job Fair", "ZipRecruiter"];
const DEPARTMENTS: &[&str] = &["Field Staff", "Clinical", "Operations", "Finance", "Human Resources"];
const ONBOARDING_TASKS: &[&str] = &[
    "I-9 verification",
    "Background check",
    "TB test",
    "CPR certification upload",
    "HIPAA training",
    "EVV app setup",
    "Direct deposit form",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStage {
    Applied,
    Screening,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl ApplicantStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantStage::Applied => "applied",
            ApplicantStage::Screening => "screening",
            ApplicantStage::Interview => "interview",
            ApplicantStage::Offer => "offer",
            ApplicantStage::Hired => "hired",
            ApplicantStage::Rejected => "rejected",
        }
    }

    /// The next stage in the pipeline; terminal stages stay put.
    pub fn advance(&self) -> Self {
        match self {
            ApplicantStage::Applied => ApplicantStage::Screening,
            ApplicantStage::Screening => ApplicantStage::Interview,
            ApplicantStage::Interview => ApplicantStage::Offer,
            ApplicantStage::Offer | ApplicantStage::Hired => ApplicantStage::Hired,
            ApplicantStage::Rejected => ApplicantStage::Rejected,
        }
    }
}

const STAGES: &[ApplicantStage] = &[
    ApplicantStage::Applied,
    ApplicantStage::Applied,
    ApplicantStage::Screening,
    ApplicantStage::Interview,
    ApplicantStage::Offer,
    ApplicantStage::Hired,
    ApplicantStage::Rejected,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Applicant {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub stage: ApplicantStage,
    pub applied_date: String,
    pub source: String,
    pub rating: u8,
}

pub fn generate_applicant() -> Applicant {
    let first = seed::first_name();
    let last = seed::last_name();
    Applicant {
        id: seed::id("app"),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: seed::email(first, last),
        phone: seed::phone(),
        position: seed::pick(POSITIONS).to_string(),
        stage: seed::pick(STAGES),
        applied_date: seed::date_string(seed::date_offset(-60, 0)),
        source: seed::pick(SOURCES).to_string(),
        rating: seed::int_between(1, 5) as u8,
    }
}

pub fn generate_applicant_with(overrides: &Overrides) -> FixtureResult<Applicant> {
    apply_overrides(generate_applicant(), overrides)
}

/// `status` filters on pipeline stage.
pub fn get_applicants_response(params: &ListParams) -> ListResponse<Applicant> {
    let candidates = (0..APPLICANT_POPULATION).map(|_| generate_applicant()).collect();
    filter_and_slice(candidates, params, |a| {
        params.status_matches(a.stage.as_str())
            && params.extra_matches("position", &a.position)
            && params.search_matches(&[&a.first_name, &a.last_name, &a.email])
    })
}

/// Response to `POST /hr/applicants/:id/advance`.
pub fn advance_applicant_response(id: &str) -> FixtureResult<ItemResponse<Applicant>> {
    let applicant = generate_applicant_with(&Overrides::new().set("id", id))?;
    let next = applicant.stage.advance();
    Ok(ItemResponse::new(Applicant { stage: next, ..applicant }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    OnLeave,
    Terminated,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::OnLeave => "on_leave",
            EmployeeStatus::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub hire_date: String,
    pub status: EmployeeStatus,
    pub hourly_rate: f64,
    pub pod_id: String,
}

pub fn generate_employee() -> Employee {
    let first = seed::first_name();
    let last = seed::last_name();
    let status = if seed::chance(0.85) {
        EmployeeStatus::Active
    } else {
        seed::pick(&[EmployeeStatus::OnLeave, EmployeeStatus::Terminated])
    };
    Employee {
        id: seed::id("emp"),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: seed::email(first, last),
        position: seed::pick(POSITIONS).to_string(),
        department: seed::pick(DEPARTMENTS).to_string(),
        hire_date: seed::date_string(seed::date_offset(-2000, -14)),
        status,
        hourly_rate: seed::money_between(15.0, 42.0),
        pod_id: seed::pick(seed::PODS).to_string(),
    }
}

pub fn generate_employee_with(overrides: &Overrides) -> FixtureResult<Employee> {
    apply_overrides(generate_employee(), overrides)
}

pub fn get_employees_response(params: &ListParams) -> ListResponse<Employee> {
    let candidates = (0..EMPLOYEE_POPULATION).map(|_| generate_employee()).collect();
    filter_and_slice(candidates, params, |e| {
        params.status_matches(e.status.as_str())
            && params.extra_matches("department", &e.department)
            && params.search_matches(&[&e.first_name, &e.last_name, &e.email])
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingTask {
    pub employee_id: String,
    pub employee_name: String,
    pub task: String,
    pub due_date: String,
    pub completed: bool,
}

/// `GET /hr/onboarding` returns a bare array.
pub fn get_onboarding_response() -> Vec<OnboardingTask> {
    (0..seed::int_between(3, 6))
        .flat_map(|_| {
            let employee_id = seed::id("emp");
            let employee_name = format!("{} {}", seed::first_name(), seed::last_name());
            ONBOARDING_TASKS.iter().map(move |task| OnboardingTask {
                employee_id: employee_id.clone(),
                employee_name: employee_name.clone(),
                task: task.to_string(),
                due_date: seed::date_string(seed::date_offset(0, 21)),
                completed: seed::chance(0.5),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_filter() {
        let response = get_applicants_response(&ListParams::new().with_status("interview"));
        assert!(response.data.iter().all(|a| a.stage == ApplicantStage::Interview));
    }

    #[test]
    fn test_advance_moves_forward() {
        assert_eq!(ApplicantStage::Applied.advance(), ApplicantStage::Screening);
        assert_eq!(ApplicantStage::Offer.advance(), ApplicantStage::Hired);
        assert_eq!(ApplicantStage::Rejected.advance(), ApplicantStage::Rejected);
    }

    #[test]
    fn test_hourly_rate_is_cents() {
        for _ in 0..50 {
            let rate = generate_employee().hourly_rate;
            assert_eq!(seed::round_cents(rate), rate);
        }
    }

    #[test]
    fn test_onboarding_groups_tasks() {
        let tasks = get_onboarding_response();
        assert_eq!(tasks.len() % ONBOARDING_TASKS.len(), 0);
    }
}
