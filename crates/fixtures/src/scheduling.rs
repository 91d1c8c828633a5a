//! Scheduling: shifts and the open-shift board.

use serde::{Deserialize, Serialize};

use crate::error::FixtureResult;
use crate::overrides::{apply_overrides, Overrides};
use crate::params::{filter_and_slice, ItemResponse, ListParams, ListResponse};
use crate::seed;

pub const SHIFT_POPULATION: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Assigned,
    Confirmed,
    Completed,
    Cancelled,
}

impl ShiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Open => "open",
            ShiftStatus::Assigned => "assigned",
            ShiftStatus::Confirmed => "confirmed",
            ShiftStatus::Completed => "completed",
            ShiftStatus::Cancelled => "cancelled",
        }
    }
}

const STATUSES: &[ShiftStatus] = &[
    ShiftStatus::Open,
    ShiftStatus::Open,
    ShiftStatus::Assigned,
    ShiftStatus::Confirmed,
    ShiftStatus::Confirmed,
    ShiftStatus::Completed,
    ShiftStatus::Cancelled,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Shift {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    /// Empty while the shift is open.
    pub caregiver_id: String,
    pub caregiver_name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub hours: f64,
    pub status: ShiftStatus,
    pub pod_id: String,
    pub service_code: String,
}

fn build_shift(status: ShiftStatus) -> Shift {
    let start_hour = seed::int_between(6, 18);
    let length = seed::int_between(2, 8).min(23 - start_hour);
    let (caregiver_id, caregiver_name) = if status == ShiftStatus::Open {
        (String::new(), String::new())
    } else {
        (seed::id("cg"), format!("{} {}", seed::first_name(), seed::last_name()))
    };
    Shift {
        id: seed::id("shf"),
        patient_id: seed::id("pat"),
        patient_name: format!("{} {}", seed::first_name(), seed::last_name()),
        caregiver_id,
        caregiver_name,
        date: seed::date_string(seed::date_offset(-3, 14)),
        start_time: format!("{:02}:00", start_hour),
        end_time: format!("{:02}:00", start_hour + length),
        hours: f64::from(length),
        status,
        pod_id: seed::pick(seed::PODS).to_string(),
        service_code: seed::pick(seed::SERVICE_CODES).to_string(),
    }
}

pub fn generate_shift() -> Shift {
    build_shift(seed::pick(STATUSES))
}

pub fn generate_shift_with(overrides: &Overrides) -> FixtureResult<Shift> {
    apply_overrides(generate_shift(), overrides)
}

pub fn generate_shifts(count: usize) -> Vec<Shift> {
    (0..count).map(|_| generate_shift()).collect()
}

pub fn get_shifts_response(params: &ListParams) -> ListResponse<Shift> {
    filter_and_slice(generate_shifts(SHIFT_POPULATION), params, |s| {
        params.status_matches(s.status.as_str())
            && params.extra_matches("podId", &s.pod_id)
            && params.search_matches(&[&s.patient_name, &s.caregiver_name])
            && chrono::NaiveDate::parse_from_str(&s.date, "%Y-%m-%d")
                .map_or(true, |d| params.date_in_range(d))
    })
}

/// `GET /scheduling/open-shifts` returns a bare array.
pub fn get_open_shifts_response() -> Vec<Shift> {
    (0..seed::int_between(4, 15))
        .map(|_| build_shift(ShiftStatus::Open))
        .collect()
}

/// Response to `POST /scheduling/shifts/:id/assign`.
pub fn assign_shift_response(id: &str, caregiver_id: Option<&str>) -> ItemResponse<Shift> {
    let mut shift = build_shift(ShiftStatus::Assigned);
    shift.id = id.to_string();
    if let Some(caregiver_id) = caregiver_id {
        shift.caregiver_id = caregiver_id.to_string();
    }
    ItemResponse::new(shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_shifts_have_no_caregiver() {
        for shift in get_open_shifts_response() {
            assert_eq!(shift.status, ShiftStatus::Open);
            assert!(shift.caregiver_id.is_empty());
        }
    }

    #[test]
    fn test_hours_match_times() {
        for shift in generate_shifts(100) {
            let start: u32 = shift.start_time[..2].parse().unwrap();
            let end: u32 = shift.end_time[..2].parse().unwrap();
            assert_eq!(f64::from(end - start), shift.hours);
            assert!(end <= 23);
        }
    }

    #[test]
    fn test_assign_pins_caregiver() {
        let response = assign_shift_response("shf-1", Some("cg-9"));
        assert_eq!(response.data.caregiver_id, "cg-9");
        assert_eq!(response.data.status, ShiftStatus::Assigned);
    }
}
