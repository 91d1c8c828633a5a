//! Electronic Visit Verification: visits, exceptions, clock events.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FixtureResult;
use crate::overrides::{apply_overrides, Overrides};
use crate::params::{filter_and_slice, ListParams, ListResponse};
use crate::seed;

pub const VISIT_POPULATION: usize = 40;

const EXCEPTION_REASONS: &[&str] = &[
    "GPS location outside geofence",
    "Late clock-in",
    "Missing clock-out",
    "Visit shorter than authorized",
    "Caregiver not on schedule",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Scheduled,
    InProgress,
    Completed,
    Missed,
    Exception,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "scheduled",
            VisitStatus::InProgress => "in_progress",
            VisitStatus::Completed => "completed",
            VisitStatus::Missed => "missed",
            VisitStatus::Exception => "exception",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Visit {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub caregiver_id: String,
    pub caregiver_name: String,
    pub service_code: String,
    pub scheduled_start: String,
    pub scheduled_end: String,
    pub clock_in: String,
    pub clock_out: String,
    pub status: VisitStatus,
    pub gps_verified: bool,
    pub duration_minutes: u32,
    pub exception_reason: String,
}

/// Status follows from where the scheduled window sits relative to now.
fn status_for(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> VisitStatus {
    if start > now {
        VisitStatus::Scheduled
    } else if end > now {
        VisitStatus::InProgress
    } else if seed::chance(0.8) {
        VisitStatus::Completed
    } else {
        seed::pick(&[VisitStatus::Missed, VisitStatus::Exception])
    }
}

fn build_visit(date: NaiveDate) -> Visit {
    let start = seed::at_hour(date, 6, 18);
    let hours = i64::from(seed::int_between(1, 4));
    let end = start + Duration::hours(hours);
    let status = status_for(start, end, Utc::now());

    // Clock times are only real for visits that happened; otherwise mirror the schedule.
    let (clock_in, clock_out, minutes) = match status {
        VisitStatus::Completed | VisitStatus::Exception => {
            let drift = Duration::minutes(i64::from(seed::int_between(0, 15)));
            let clock_in = start + drift;
            let clock_out = end + Duration::minutes(i64::from(seed::int_between(0, 10)));
            let minutes = (clock_out - clock_in).num_minutes().max(0) as u32;
            (clock_in, clock_out, minutes)
        }
        VisitStatus::Scheduled | VisitStatus::InProgress | VisitStatus::Missed => (start, end, 0),
    };

    Visit {
        id: seed::id("vis"),
        patient_id: seed::id("pat"),
        patient_name: format!("{} {}", seed::first_name(), seed::last_name()),
        caregiver_id: seed::id("cg"),
        caregiver_name: format!("{} {}", seed::first_name(), seed::last_name()),
        service_code: seed::pick(seed::SERVICE_CODES).to_string(),
        scheduled_start: seed::timestamp_string(start),
        scheduled_end: seed::timestamp_string(end),
        clock_in: seed::timestamp_string(clock_in),
        clock_out: seed::timestamp_string(clock_out),
        status,
        gps_verified: status == VisitStatus::Completed,
        duration_minutes: minutes,
        exception_reason: if status == VisitStatus::Exception {
            seed::pick(EXCEPTION_REASONS).to_string()
        } else {
            String::new()
        },
    }
}

pub fn generate_visit() -> Visit {
    build_visit(seed::date_offset(-7, 7))
}

pub fn generate_visit_with(overrides: &Overrides) -> FixtureResult<Visit> {
    apply_overrides(generate_visit(), overrides)
}

pub fn generate_visits(count: usize) -> Vec<Visit> {
    (0..count).map(|_| generate_visit()).collect()
}

pub fn get_visits_response(params: &ListParams) -> ListResponse<Visit> {
    filter_and_slice(generate_visits(VISIT_POPULATION), params, |v| {
        params.status_matches(v.status.as_str())
            && params.search_matches(&[&v.patient_name, &v.caregiver_name])
            && visit_date(v).map_or(true, |d| params.date_in_range(d))
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitException {
    pub id: String,
    pub visit_id: String,
    pub patient_name: String,
    pub caregiver_name: String,
    pub reason: String,
    pub occurred_at: String,
    pub resolved: bool,
}

/// `GET /evv/exceptions` returns a bare array.
pub fn get_exceptions_response() -> Vec<VisitException> {
    (0..seed::int_between(3, 12))
        .map(|_| {
            let visit = build_visit(seed::date_offset(-7, -1));
            VisitException {
                id: seed::id("exc"),
                visit_id: visit.id,
                patient_name: visit.patient_name,
                caregiver_name: visit.caregiver_name,
                reason: seed::pick(EXCEPTION_REASONS).to_string(),
                occurred_at: visit.scheduled_start,
                resolved: seed::chance(0.3),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockResponse {
    pub success: bool,
    pub visit: Visit,
}

/// Response to `POST /evv/clock-in`; the returned visit is in progress from now.
pub fn clock_in_response(visit_id: Option<&str>) -> ClockResponse {
    let now = Utc::now();
    let mut visit = build_visit(now.date_naive());
    if let Some(id) = visit_id {
        visit.id = id.to_string();
    }
    visit.status = VisitStatus::InProgress;
    visit.clock_in = seed::timestamp_string(now);
    visit.exception_reason = String::new();
    visit.gps_verified = true;
    ClockResponse { success: true, visit }
}

/// Response to `POST /evv/clock-out`; duration is computed from the returned clock times.
pub fn clock_out_response(visit_id: Option<&str>) -> ClockResponse {
    let now = Utc::now();
    let clock_in = now - Duration::minutes(i64::from(seed::int_between(30, 240)));
    let mut visit = build_visit(clock_in.date_naive());
    if let Some(id) = visit_id {
        visit.id = id.to_string();
    }
    visit.status = VisitStatus::Completed;
    visit.clock_in = seed::timestamp_string(clock_in);
    visit.clock_out = seed::timestamp_string(now);
    visit.duration_minutes = (now - clock_in).num_minutes() as u32;
    visit.exception_reason = String::new();
    visit.gps_verified = true;
    ClockResponse { success: true, visit }
}

fn visit_date(visit: &Visit) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(&visit.scheduled_start)
        .ok()
        .map(|ts| ts.with_timezone(&Utc).date_naive())
}
