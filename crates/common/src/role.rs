//! Roles used as the access-control axis of the console tests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Closed set of console roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Founder,
    Ceo,
    Cfo,
    Coo,
    ItAdmin,
    SecurityOfficer,
    ComplianceOfficer,
    FinanceDirector,
    BillingManager,
    HrManager,
    Scheduler,
    PodLead,
    ClinicalDirector,
    RnCaseManager,
    Caregiver,
}

impl Role {
    pub const ALL: [Role; 15] = [
        Role::Founder,
        Role::Ceo,
        Role::Cfo,
        Role::Coo,
        Role::ItAdmin,
        Role::SecurityOfficer,
        Role::ComplianceOfficer,
        Role::FinanceDirector,
        Role::BillingManager,
        Role::HrManager,
        Role::Scheduler,
        Role::PodLead,
        Role::ClinicalDirector,
        Role::RnCaseManager,
        Role::Caregiver,
    ];

    /// Role used when an identifier cannot be resolved.
    pub const FALLBACK: Role = Role::Caregiver;

    /// Wire identifier, as stored on user objects and in tokens.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Founder => "founder",
            Role::Ceo => "ceo",
            Role::Cfo => "cfo",
            Role::Coo => "coo",
            Role::ItAdmin => "it_admin",
            Role::SecurityOfficer => "security_officer",
            Role::ComplianceOfficer => "compliance_officer",
            Role::FinanceDirector => "finance_director",
            Role::BillingManager => "billing_manager",
            Role::HrManager => "hr_manager",
            Role::Scheduler => "scheduler",
            Role::PodLead => "pod_lead",
            Role::ClinicalDirector => "clinical_director",
            Role::RnCaseManager => "rn_case_manager",
            Role::Caregiver => "caregiver",
        }
    }

    /// Human-readable title shown in the console header.
    pub fn title(&self) -> &'static str {
        match self {
            Role::Founder => "Founder",
            Role::Ceo => "Chief Executive Officer",
            Role::Cfo => "Chief Financial Officer",
            Role::Coo => "Chief Operating Officer",
            Role::ItAdmin => "IT Administrator",
            Role::SecurityOfficer => "Security Officer",
            Role::ComplianceOfficer => "Compliance Officer",
            Role::FinanceDirector => "Finance Director",
            Role::BillingManager => "Billing Manager",
            Role::HrManager => "HR Manager",
            Role::Scheduler => "Scheduler",
            Role::PodLead => "Pod Lead",
            Role::ClinicalDirector => "Clinical Director",
            Role::RnCaseManager => "RN Case Manager",
            Role::Caregiver => "Caregiver",
        }
    }

    /// Executive roles see every dashboard.
    pub fn is_executive(&self) -> bool {
        matches!(self, Role::Founder | Role::Ceo | Role::Cfo | Role::Coo)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Outcome of resolving a caller-supplied role identifier.
///
/// Resolution never fails: an unrecognized identifier is kept as
/// [`RoleResolution::Unknown`] so callers can assert on misconfiguration,
/// while [`RoleResolution::effective`] still yields a usable role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleResolution {
    Known(Role),
    Unknown(String),
}

impl RoleResolution {
    pub fn resolve(input: &str) -> Self {
        match input.parse::<Role>() {
            Ok(role) => RoleResolution::Known(role),
            Err(UnknownRole(original)) => RoleResolution::Unknown(original),
        }
    }

    /// The role to act as. Unknown identifiers fall back to [`Role::FALLBACK`].
    pub fn effective(&self) -> Role {
        match self {
            RoleResolution::Known(role) => *role,
            RoleResolution::Unknown(original) => {
                warn!(
                    "Unknown role '{}', falling back to '{}'",
                    original,
                    Role::FALLBACK
                );
                Role::FALLBACK
            }
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, RoleResolution::Known(_))
    }
}

impl From<Role> for RoleResolution {
    fn from(role: Role) -> Self {
        RoleResolution::Known(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("founder", Role::Founder)]
    #[test_case("billing_manager", Role::BillingManager)]
    #[test_case("Compliance-Officer", Role::ComplianceOfficer)]
    #[test_case("  caregiver ", Role::Caregiver)]
    fn test_parse_known_roles(input: &str, expected: Role) {
        assert_eq!(input.parse::<Role>().unwrap(), expected);
    }

    #[test]
    fn test_round_trip_every_role() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_is_preserved() {
        let resolution = RoleResolution::resolve("foundr");
        assert_eq!(resolution, RoleResolution::Unknown("foundr".to_string()));
        assert!(!resolution.is_known());
        assert_eq!(resolution.effective(), Role::Caregiver);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::RnCaseManager).unwrap();
        assert_eq!(json, "\"rn_case_manager\"");
    }
}
