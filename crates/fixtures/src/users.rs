//! Console users, role summaries and admin statistics.

use serde::{Deserialize, Serialize};
use serenity_common::{rbac, Role};

use crate::error::FixtureResult;
use crate::overrides::{apply_overrides, Overrides};
use crate::params::{filter_and_slice, ItemResponse, ListParams, ListResponse};
use crate::seed;

/// Size of the synthetic user population behind the list endpoint.
pub const USER_POPULATION: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
    Pending,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Pending => "pending",
            UserStatus::Suspended => "suspended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub status: UserStatus,
    pub department: String,
    pub phone: String,
    pub mfa_enabled: bool,
    pub permissions: Vec<String>,
    pub last_login: String,
    pub created_at: String,
}

fn department_for(role: Role) -> &'static str {
    match role {
        Role::Founder | Role::Ceo | Role::Coo => "Executive",
        Role::Cfo | Role::FinanceDirector | Role::BillingManager => "Finance",
        Role::ItAdmin | Role::SecurityOfficer => "Information Technology",
        Role::ComplianceOfficer => "Compliance",
        Role::HrManager => "Human Resources",
        Role::Scheduler | Role::PodLead => "Operations",
        Role::ClinicalDirector | Role::RnCaseManager => "Clinical",
        Role::Caregiver => "Field Staff",
    }
}

fn build_user(role: Role) -> User {
    let first = seed::first_name();
    let last = seed::last_name();
    let status = if seed::chance(0.8) {
        UserStatus::Active
    } else {
        seed::pick(&[UserStatus::Inactive, UserStatus::Pending, UserStatus::Suspended])
    };
    let created = seed::recent_timestamp(720);
    User {
        id: seed::id("usr"),
        email: seed::email(first, last),
        first_name: first.to_string(),
        last_name: last.to_string(),
        role,
        status,
        department: department_for(role).to_string(),
        phone: seed::phone(),
        mfa_enabled: seed::chance(0.7),
        permissions: rbac::permissions_for(role),
        last_login: seed::timestamp_string(seed::recent_timestamp(14)),
        created_at: seed::timestamp_string(created),
    }
}

pub fn generate_user() -> User {
    build_user(seed::pick(&Role::ALL))
}

/// Generate a user with pinned fields. Pinning `role` keeps the role's
/// permission list unless `permissions` is pinned too.
pub fn generate_user_with(overrides: &Overrides) -> FixtureResult<User> {
    let role = match overrides.get("role") {
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|_| seed::pick(&Role::ALL)),
        None => seed::pick(&Role::ALL),
    };
    apply_overrides(build_user(role), overrides)
}

/// The candidate population: every role appears at least once, the rest are
/// caregivers and schedulers as in a real agency.
pub fn generate_users(count: usize) -> Vec<User> {
    (0..count)
        .map(|i| match Role::ALL.get(i) {
            Some(role) => build_user(*role),
            None => build_user(seed::pick(&[Role::Caregiver, Role::Caregiver, Role::Scheduler])),
        })
        .collect()
}

pub fn get_users_response(params: &ListParams) -> ListResponse<User> {
    filter_and_slice(generate_users(USER_POPULATION), params, |user| {
        params.role_matches(user.role.as_str())
            && params.status_matches(user.status.as_str())
            && params.search_matches(&[&user.first_name, &user.last_name, &user.email])
    })
}

pub fn get_user_response(id: &str) -> FixtureResult<ItemResponse<User>> {
    let user = generate_user_with(&Overrides::new().set("id", id))?;
    Ok(ItemResponse::new(user))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub user_count: u32,
    pub permissions: Vec<String>,
}

/// `GET /admin/roles` returns a bare array.
pub fn get_roles_response() -> Vec<RoleSummary> {
    Role::ALL
        .iter()
        .map(|role| RoleSummary {
            id: role.as_str().to_string(),
            name: role.title().to_string(),
            description: format!("{} access to the Serenity console", role.title()),
            user_count: if *role == Role::Caregiver {
                seed::int_between(80, 240)
            } else {
                seed::int_between(1, 6)
            },
            permissions: rbac::permissions_for(*role),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u32,
    pub active_users: u32,
    pub pending_invites: u32,
    pub mfa_adoption_rate: f64,
    pub audit_events_today: u32,
}

/// `GET /admin/stats` returns a bare object.
pub fn get_admin_stats_response() -> AdminStats {
    let total = seed::int_between(180, 320);
    let active = total - seed::int_between(5, 30);
    AdminStats {
        total_users: total,
        active_users: active,
        pending_invites: seed::int_between(0, 12),
        mfa_adoption_rate: seed::round_cents(active as f64 / total as f64 * 100.0),
        audit_events_today: seed::int_between(200, 1500),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_filter_returns_only_that_role() {
        let response = get_users_response(&ListParams::new().with_role("caregiver"));
        assert!(!response.data.is_empty());
        assert!(response.data.iter().all(|u| u.role == Role::Caregiver));
        assert_eq!(response.total, response.data.len());
    }

    #[test]
    fn test_unknown_role_filter_is_empty_not_error() {
        let response = get_users_response(&ListParams::new().with_role("astronaut"));
        assert!(response.success);
        assert!(response.data.is_empty());
        assert_eq!(response.total, 0);
    }

    #[test]
    fn test_every_role_in_population() {
        let users = generate_users(USER_POPULATION);
        for role in Role::ALL {
            assert!(users.iter().any(|u| u.role == role), "missing {}", role);
        }
    }

    #[test]
    fn test_role_override_keeps_permissions_consistent() {
        let user = generate_user_with(&Overrides::new().set("role", "billing_manager")).unwrap();
        assert_eq!(user.role, Role::BillingManager);
        assert_eq!(user.permissions, rbac::permissions_for(Role::BillingManager));
    }

    #[test]
    fn test_unknown_override_field_is_rejected() {
        assert!(generate_user_with(&Overrides::new().set("favoriteColor", "blue")).is_err());
    }

    #[test]
    fn test_roles_response_covers_all_roles() {
        assert_eq!(get_roles_response().len(), Role::ALL.len());
    }
}
