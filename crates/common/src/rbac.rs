//! Role → permission catalog.
//!
//! Permissions are `resource:action` strings. A role may hold `resource:*`
//! for every action on a resource, or `*` for everything.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use crate::role::Role;

static CATALOG: Lazy<HashMap<Role, Vec<&'static str>>> = Lazy::new(|| {
    let mut catalog = HashMap::new();
    for role in Role::ALL {
        catalog.insert(role, direct_permissions(role).to_vec());
    }
    catalog
});

fn direct_permissions(role: Role) -> &'static [&'static str] {
    match role {
        Role::Founder => &["*"],
        Role::Ceo => &[
            "dashboard:*",
            "patients:read",
            "caregivers:read",
            "scheduling:read",
            "billing:read",
            "hr:read",
            "compliance:read",
            "reports:*",
            "users:read",
        ],
        Role::Cfo => &[
            "dashboard:*",
            "billing:*",
            "payroll:*",
            "reports:*",
            "patients:read",
        ],
        Role::Coo => &[
            "dashboard:*",
            "patients:*",
            "caregivers:*",
            "scheduling:*",
            "evv:*",
            "hr:read",
            "reports:*",
        ],
        Role::ItAdmin => &["users:*", "roles:*", "settings:*", "integrations:*", "audit:read"],
        Role::SecurityOfficer => &["audit:*", "users:read", "roles:read", "settings:read"],
        Role::ComplianceOfficer => &[
            "compliance:*",
            "audit:read",
            "credentials:*",
            "evv:read",
            "patients:read",
        ],
        Role::FinanceDirector => &["billing:*", "payroll:read", "reports:read", "dashboard:finance"],
        Role::BillingManager => &["billing:*", "patients:read", "evv:read"],
        Role::HrManager => &[
            "hr:*",
            "credentials:*",
            "caregivers:*",
            "training:*",
            "dashboard:hr",
        ],
        Role::Scheduler => &["scheduling:*", "caregivers:read", "patients:read", "evv:read"],
        Role::PodLead => &[
            "scheduling:*",
            "caregivers:read",
            "patients:read",
            "evv:*",
            "messages:*",
        ],
        Role::ClinicalDirector => &[
            "patients:*",
            "clinical:*",
            "caregivers:read",
            "compliance:read",
            "dashboard:clinical",
        ],
        Role::RnCaseManager => &["patients:*", "clinical:*", "scheduling:read"],
        Role::Caregiver => &[
            "schedule:read_own",
            "evv:clock",
            "messages:read",
            "training:read",
            "profile:*",
        ],
    }
}

/// Permissions granted to a role, in catalog order.
pub fn permissions_for(role: Role) -> Vec<String> {
    CATALOG
        .get(&role)
        .map(|perms| perms.iter().map(|p| p.to_string()).collect())
        .unwrap_or_default()
}

/// Union of permissions over a set of roles.
pub fn permissions_for_roles(roles: &[Role]) -> HashSet<String> {
    roles.iter().flat_map(|role| permissions_for(*role)).collect()
}

/// Check a permission, honoring `*` and `resource:*` wildcards.
pub fn has_permission(role: Role, permission: &str) -> bool {
    let perms = permissions_for_roles(&[role]);
    if perms.contains("*") || perms.contains(permission) {
        return true;
    }
    if let Some((resource, _action)) = permission.split_once(':') {
        if perms.contains(&format!("{}:*", resource)) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_founder_has_everything() {
        assert!(has_permission(Role::Founder, "users:delete"));
        assert!(has_permission(Role::Founder, "anything:at:all"));
    }

    #[test]
    fn test_resource_wildcard() {
        assert!(has_permission(Role::BillingManager, "billing:submit"));
        assert!(has_permission(Role::BillingManager, "evv:read"));
        assert!(!has_permission(Role::BillingManager, "users:read"));
    }

    #[test]
    fn test_caregiver_is_narrow() {
        assert!(has_permission(Role::Caregiver, "evv:clock"));
        assert!(!has_permission(Role::Caregiver, "users:read"));
        assert!(!has_permission(Role::Caregiver, "billing:read"));
    }

    #[test]
    fn test_every_role_has_permissions() {
        for role in Role::ALL {
            assert!(!permissions_for(role).is_empty(), "{} has no permissions", role);
        }
    }
}
