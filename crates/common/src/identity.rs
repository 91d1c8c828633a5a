//! Deterministic test identities, one per role.

use serde::{Deserialize, Serialize};

use crate::rbac;
use crate::role::{Role, RoleResolution};

/// Email domain used by every synthesized identity.
pub const TEST_EMAIL_DOMAIN: &str = "test.serenitycare.com";

/// Password accepted by the mocked login endpoint for every test identity.
pub const TEST_PASSWORD: &str = "TestPassword123!";

pub const TEST_ORGANIZATION_ID: &str = "org-serenity-001";
pub const TEST_ORGANIZATION_NAME: &str = "Serenity Care Partners";

/// A synthesized user as the console stores it after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub permissions: Vec<String>,
    pub organization_id: String,
    pub organization_name: String,
}

impl Identity {
    /// Build the identity for a role. The same role always yields the same identity.
    pub fn for_role(role: Role) -> Self {
        let (first_name, last_name) = display_name(role);
        Self {
            id: format!("test-user-{}", role.as_str().replace('_', "-")),
            email: email_for(role),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role,
            permissions: rbac::permissions_for(role),
            organization_id: TEST_ORGANIZATION_ID.to_string(),
            organization_name: TEST_ORGANIZATION_NAME.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Resolve a role identifier to an identity; unknown identifiers act as the fallback role.
pub fn resolve_identity(role: &str) -> Identity {
    Identity::for_role(RoleResolution::resolve(role).effective())
}

pub fn email_for(role: Role) -> String {
    format!("{}@{}", role.as_str(), TEST_EMAIL_DOMAIN)
}

/// Reverse of [`email_for`]. Emails outside the test domain map to nothing.
pub fn role_for_email(email: &str) -> Option<Role> {
    let (local, domain) = email.trim().split_once('@')?;
    if !domain.eq_ignore_ascii_case(TEST_EMAIL_DOMAIN) {
        return None;
    }
    local.parse().ok()
}

fn display_name(role: Role) -> (&'static str, &'static str) {
    match role {
        Role::Founder => ("Gloria", "Serenity"),
        Role::Ceo => ("Marcus", "Whitfield"),
        Role::Cfo => ("Priya", "Raman"),
        Role::Coo => ("Daniel", "Okafor"),
        Role::ItAdmin => ("Kevin", "Tran"),
        Role::SecurityOfficer => ("Rachel", "Stone"),
        Role::ComplianceOfficer => ("Helen", "Marsh"),
        Role::FinanceDirector => ("Omar", "Haddad"),
        Role::BillingManager => ("Lisa", "Nguyen"),
        Role::HrManager => ("Teresa", "Campbell"),
        Role::Scheduler => ("Jamal", "Price"),
        Role::PodLead => ("Angela", "Brooks"),
        Role::ClinicalDirector => ("Susan", "Park"),
        Role::RnCaseManager => ("Maria", "Lopez"),
        Role::Caregiver => ("Test", "Caregiver"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_deterministic() {
        assert_eq!(Identity::for_role(Role::Cfo), Identity::for_role(Role::Cfo));
    }

    #[test]
    fn test_founder_email() {
        let identity = resolve_identity("founder");
        assert_eq!(identity.email, "founder@test.serenitycare.com");
        assert_eq!(identity.role, Role::Founder);
        assert_eq!(identity.permissions, vec!["*".to_string()]);
    }

    #[test]
    fn test_unknown_role_falls_back_to_caregiver() {
        let identity = resolve_identity("not-a-role");
        assert_eq!(identity.role, Role::Caregiver);
    }

    #[test]
    fn test_email_round_trip() {
        for role in Role::ALL {
            assert_eq!(role_for_email(&email_for(role)), Some(role));
        }
        assert_eq!(role_for_email("founder@example.com"), None);
        assert_eq!(role_for_email("no-at-sign"), None);
    }

    #[test]
    fn test_serialized_user_is_camel_case() {
        let value = serde_json::to_value(Identity::for_role(Role::HrManager)).unwrap();
        assert_eq!(value["firstName"], "Teresa");
        assert_eq!(value["role"], "hr_manager");
        assert_eq!(value["organizationId"], TEST_ORGANIZATION_ID);
    }
}
