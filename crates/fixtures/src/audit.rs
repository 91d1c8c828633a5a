//! HIPAA audit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FixtureResult;
use crate::overrides::{apply_overrides, Overrides};
use crate::params::{ListParams, PagedResponse};
use crate::seed;

pub const AUDIT_POPULATION: usize = 500;
pub const AUDIT_DEFAULT_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Login,
    Logout,
    FailedLogin,
    ViewPhi,
    UpdateRecord,
    ExportData,
    PermissionChange,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::FailedLogin => "failed_login",
            AuditAction::ViewPhi => "view_phi",
            AuditAction::UpdateRecord => "update_record",
            AuditAction::ExportData => "export_data",
            AuditAction::PermissionChange => "permission_change",
        }
    }

    fn touches_phi(&self) -> bool {
        matches!(self, AuditAction::ViewPhi | AuditAction::UpdateRecord | AuditAction::ExportData)
    }
}

const ACTIONS: &[AuditAction] = &[
    AuditAction::Login,
    AuditAction::Logout,
    AuditAction::FailedLogin,
    AuditAction::ViewPhi,
    AuditAction::ViewPhi,
    AuditAction::UpdateRecord,
    AuditAction::ExportData,
    AuditAction::PermissionChange,
];

const RESOURCES: &[&str] = &["patient", "visit", "claim", "user", "credential", "care_plan"];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) Safari/605.1.15",
    "SerenityMobile/2.3.1 (iOS 17.4)",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuditLog {
    pub id: String,
    pub timestamp: String,
    pub user_id: String,
    pub user_email: String,
    pub action: AuditAction,
    pub resource: String,
    pub resource_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub outcome: String,
    pub phi_accessed: bool,
}

fn build_audit_log(at: DateTime<Utc>) -> AuditLog {
    let action = seed::pick(ACTIONS);
    let resource = seed::pick(RESOURCES);
    AuditLog {
        id: seed::id("aud"),
        timestamp: seed::timestamp_string(at),
        user_id: seed::id("usr"),
        user_email: seed::email(seed::first_name(), seed::last_name()),
        action,
        resource: resource.to_string(),
        resource_id: seed::id(&resource[..3]),
        ip_address: format!("10.{}.{}.{}", seed::int_between(0, 255), seed::int_between(0, 255), seed::int_between(1, 254)),
        user_agent: seed::pick(USER_AGENTS).to_string(),
        outcome: if action == AuditAction::FailedLogin { "failure" } else { "success" }.to_string(),
        phi_accessed: action.touches_phi(),
    }
}

pub fn generate_audit_log() -> AuditLog {
    build_audit_log(seed::recent_timestamp(30))
}

pub fn generate_audit_log_with(overrides: &Overrides) -> FixtureResult<AuditLog> {
    apply_overrides(generate_audit_log(), overrides)
}

/// Newest first.
pub fn generate_audit_logs(count: usize) -> Vec<AuditLog> {
    let mut stamps: Vec<DateTime<Utc>> = (0..count).map(|_| seed::recent_timestamp(30)).collect();
    stamps.sort_by(|a, b| b.cmp(a));
    stamps.into_iter().map(build_audit_log).collect()
}

/// Paged envelope; `status` filters on outcome, `action` and `userId` on the entry.
pub fn get_audit_logs_response(params: &ListParams) -> PagedResponse<AuditLog> {
    let filtered: Vec<AuditLog> = generate_audit_logs(AUDIT_POPULATION)
        .into_iter()
        .filter(|log| {
            params.status_matches(&log.outcome)
                && params.extra_matches("action", log.action.as_str())
                && params.extra_matches("userId", &log.user_id)
                && params.search_matches(&[&log.user_email, &log.resource, &log.resource_id])
                && log_date(log).map_or(true, |date| params.date_in_range(date))
        })
        .collect();

    let limit = params.limit.unwrap_or(AUDIT_DEFAULT_LIMIT);
    let page = params.page(AUDIT_DEFAULT_LIMIT);
    let total = filtered.len();
    let sliced = ListParams { limit: Some(limit), ..params.clone() }.paginate(filtered);

    PagedResponse { success: true, data: sliced, total, page, limit }
}

fn log_date(log: &AuditLog) -> Option<chrono::NaiveDate> {
    DateTime::parse_from_rfc3339(&log.timestamp)
        .ok()
        .map(|ts| ts.with_timezone(&Utc).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_shape() {
        let response = get_audit_logs_response(&ListParams::new());
        assert_eq!(response.data.len(), AUDIT_DEFAULT_LIMIT);
        assert_eq!(response.total, AUDIT_POPULATION);
        assert_eq!(response.page, 1);
        assert_eq!(response.limit, AUDIT_DEFAULT_LIMIT);
    }

    #[test]
    fn test_action_filter() {
        let params = ListParams::new().with_extra("action", "failed_login").with_limit(500);
        let response = get_audit_logs_response(&params);
        assert!(response.data.iter().all(|l| l.action == AuditAction::FailedLogin));
        assert!(response.data.iter().all(|l| l.outcome == "failure"));
    }

    #[test]
    fn test_phi_flag_follows_action() {
        for log in generate_audit_logs(100) {
            assert_eq!(log.phi_accessed, log.action.touches_phi());
        }
    }

    #[test]
    fn test_newest_first() {
        let logs = generate_audit_logs(50);
        assert!(logs.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }
}
