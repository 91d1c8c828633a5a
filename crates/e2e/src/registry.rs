//! Declarative route registry.
//!
//! [`PUBLIC_ROUTES`] and [`ERP_ROUTES`] are the built-in tables. A
//! [`RouteRegistry`] starts from them and may be extended from YAML before a
//! run. Every view over it (dashboard routes, RBAC routes, the denial matrix)
//! is a fresh filter of the table, so extensions show up everywhere.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

use serenity_common::Role;

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Path pattern; `:name` segments are parameters.
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub required_role: Option<Role>,
    #[serde(default)]
    pub denied_roles: BTreeSet<Role>,
    #[serde(default)]
    pub has_params: bool,
    /// A concrete, navigable instance of a parameterized path.
    #[serde(default)]
    pub param_example: Option<String>,
    #[serde(default)]
    pub has_form: bool,
    /// Reachable without signing in.
    #[serde(default)]
    pub public: bool,
}

impl RouteDescriptor {
    pub fn new(path: &str, name: &str) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            required_role: None,
            denied_roles: BTreeSet::new(),
            has_params: path.split('/').any(|s| s.starts_with(':')),
            param_example: None,
            has_form: false,
            public: false,
        }
    }

    pub fn public(path: &str, name: &str) -> Self {
        Self { public: true, ..Self::new(path, name) }
    }

    pub fn requires(mut self, role: Role) -> Self {
        self.required_role = Some(role);
        self
    }

    pub fn deny(mut self, roles: &[Role]) -> Self {
        self.denied_roles.extend(roles.iter().copied());
        self
    }

    pub fn example(mut self, path: &str) -> Self {
        self.param_example = Some(path.to_string());
        self
    }

    pub fn form(mut self) -> Self {
        self.has_form = true;
        self
    }

    /// The URL a driver can navigate to, if there is one.
    pub fn navigable_path(&self) -> Option<&str> {
        if self.has_params {
            self.param_example.as_deref()
        } else {
            Some(&self.path)
        }
    }

    pub fn is_dashboard(&self) -> bool {
        self.path == "/dashboard" || self.path.starts_with("/dashboard/")
    }

    pub fn is_admin(&self) -> bool {
        self.path.starts_with("/admin/")
    }

    pub fn allows(&self, role: Role) -> bool {
        !self.denied_roles.contains(&role)
    }

    /// Does a concrete path (query and fragment ignored) instantiate this pattern?
    pub fn matches_path(&self, concrete: &str) -> bool {
        let concrete = strip_query(concrete);
        let pattern: Vec<&str> = segments(&self.path).collect();
        let actual: Vec<&str> = segments(concrete).collect();
        pattern.len() == actual.len()
            && pattern
                .iter()
                .zip(&actual)
                .all(|(p, a)| p.starts_with(':') || p == a)
    }

    /// File-name-safe identifier, used for screenshots.
    pub fn slug(&self) -> String {
        let slug: String = self
            .navigable_path()
            .unwrap_or(&self.path)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let slug = slug.trim_matches('-').to_string();
        if slug.is_empty() {
            "root".to_string()
        } else {
            slug
        }
    }

    pub fn validate(&self) -> E2eResult<()> {
        let invalid = |reason: &str| E2eError::InvalidRoute { path: self.path.clone(), reason: reason.to_string() };
        if !self.path.starts_with('/') {
            return Err(invalid("path must start with '/'"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if let Some(role) = self.required_role {
            if self.denied_roles.contains(&role) {
                return Err(invalid(&format!("required role {} is also denied", role)));
            }
        }
        if self.has_params != segments(&self.path).any(|s| s.starts_with(':')) {
            return Err(invalid("has_params does not agree with the path"));
        }
        if self.has_params {
            match &self.param_example {
                None => return Err(invalid("parameterized route needs a param_example")),
                Some(example) if !self.matches_path(example) || example.contains(':') => {
                    return Err(invalid(&format!("param_example {} does not instantiate the path", example)));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

const FIELD_STAFF: &[Role] = &[Role::Caregiver];
const ADMIN_DENIED: &[Role] = &[
    Role::Caregiver,
    Role::Scheduler,
    Role::PodLead,
    Role::BillingManager,
    Role::HrManager,
    Role::RnCaseManager,
];
const FINANCE_DENIED: &[Role] = &[
    Role::Caregiver,
    Role::Scheduler,
    Role::PodLead,
    Role::HrManager,
    Role::RnCaseManager,
];
const HR_DENIED: &[Role] = &[Role::Caregiver, Role::BillingManager, Role::Scheduler];
const COMPLIANCE_DENIED: &[Role] = &[Role::Caregiver, Role::Scheduler, Role::PodLead, Role::BillingManager];

pub static PUBLIC_ROUTES: Lazy<Vec<RouteDescriptor>> = Lazy::new(|| {
    vec![
        RouteDescriptor::public("/", "Home"),
        RouteDescriptor::public("/login", "Login").form(),
        RouteDescriptor::public("/forgot-password", "Forgot Password").form(),
        RouteDescriptor::public("/careers", "Careers"),
        RouteDescriptor::public("/apply", "Job Application").form(),
        RouteDescriptor::public("/contact", "Contact").form(),
    ]
});

pub static ERP_ROUTES: Lazy<Vec<RouteDescriptor>> = Lazy::new(|| {
    use Role::*;
    vec![
        // Dashboards
        RouteDescriptor::new("/dashboard", "Dashboard"),
        RouteDescriptor::new("/dashboard/executive", "Executive Dashboard").requires(Founder).deny(ADMIN_DENIED),
        RouteDescriptor::new("/dashboard/finance", "Finance Dashboard").requires(Cfo).deny(FINANCE_DENIED),
        RouteDescriptor::new("/dashboard/clinical", "Clinical Dashboard")
            .requires(ClinicalDirector)
            .deny(&[Caregiver, BillingManager, Scheduler]),
        RouteDescriptor::new("/dashboard/hr", "HR Dashboard")
            .requires(HrManager)
            .deny(&[Caregiver, BillingManager, Scheduler, PodLead]),
        RouteDescriptor::new("/dashboard/compliance", "Compliance Dashboard")
            .requires(ComplianceOfficer)
            .deny(COMPLIANCE_DENIED),
        RouteDescriptor::new("/dashboard/operations", "Operations Dashboard")
            .requires(Coo)
            .deny(&[Caregiver, BillingManager]),
        RouteDescriptor::new("/dashboard/caregiver", "My Day").requires(Caregiver),
        // Patients and caregivers
        RouteDescriptor::new("/patients", "Patients").deny(FIELD_STAFF),
        RouteDescriptor::new("/patients/new", "New Patient")
            .form()
            .deny(&[Caregiver, BillingManager, Scheduler]),
        RouteDescriptor::new("/patients/:id", "Patient Detail").example("/patients/pat-001").deny(FIELD_STAFF),
        RouteDescriptor::new("/caregivers", "Caregivers").deny(&[Caregiver, BillingManager]),
        RouteDescriptor::new("/caregivers/:id", "Caregiver Profile")
            .example("/caregivers/cg-001")
            .deny(&[Caregiver, BillingManager]),
        // Scheduling and EVV
        RouteDescriptor::new("/scheduling", "Scheduling").deny(&[Caregiver, BillingManager]),
        RouteDescriptor::new("/scheduling/open-shifts", "Open Shifts").deny(&[BillingManager]),
        RouteDescriptor::new("/scheduling/my-schedule", "My Schedule").requires(Caregiver),
        RouteDescriptor::new("/evv", "EVV Monitor").deny(FIELD_STAFF),
        RouteDescriptor::new("/evv/exceptions", "EVV Exceptions").deny(&[Caregiver, HrManager]),
        RouteDescriptor::new("/evv/clock", "Clock In/Out").requires(Caregiver),
        // Billing and payroll
        RouteDescriptor::new("/billing", "Billing").deny(FINANCE_DENIED),
        RouteDescriptor::new("/billing/claims", "Claims").deny(FINANCE_DENIED),
        RouteDescriptor::new("/billing/claims/:id", "Claim Detail")
            .example("/billing/claims/clm-001")
            .deny(FINANCE_DENIED),
        RouteDescriptor::new("/billing/denials", "Denials").deny(FINANCE_DENIED),
        RouteDescriptor::new("/payroll", "Payroll").deny(&[Caregiver, Scheduler, PodLead, RnCaseManager]),
        // HR
        RouteDescriptor::new("/hr/applicants", "Applicants").deny(HR_DENIED),
        RouteDescriptor::new("/hr/applicants/:id", "Applicant Detail")
            .example("/hr/applicants/app-001")
            .deny(HR_DENIED),
        RouteDescriptor::new("/hr/onboarding", "Onboarding").deny(HR_DENIED),
        RouteDescriptor::new("/hr/employees", "Employees").deny(HR_DENIED),
        // Credentials and compliance
        RouteDescriptor::new("/credentials", "Credentials").deny(&[Caregiver, BillingManager]),
        RouteDescriptor::new("/credentials/expiring", "Expiring Credentials").deny(&[Caregiver, BillingManager]),
        RouteDescriptor::new("/compliance/audits", "Compliance Audits").deny(COMPLIANCE_DENIED),
        RouteDescriptor::new("/compliance/incidents", "Incident Reports").form().deny(&[BillingManager]),
        // Everyone
        RouteDescriptor::new("/training", "Training"),
        RouteDescriptor::new("/messages", "Messages"),
        RouteDescriptor::new("/reports", "Reports").deny(FIELD_STAFF),
        RouteDescriptor::new("/settings/profile", "Profile Settings").form(),
        // Administration
        RouteDescriptor::new("/admin/users", "User Management").deny(ADMIN_DENIED),
        RouteDescriptor::new("/admin/users/:id", "User Detail")
            .example("/admin/users/usr-001")
            .deny(ADMIN_DENIED),
        RouteDescriptor::new("/admin/roles", "Roles & Permissions").deny(ADMIN_DENIED),
        RouteDescriptor::new("/admin/audit-logs", "Audit Logs").deny(ADMIN_DENIED),
        RouteDescriptor::new("/admin/settings", "System Settings")
            .requires(ItAdmin)
            .form()
            .deny(ADMIN_DENIED),
        RouteDescriptor::new("/admin/integrations", "Integrations").deny(ADMIN_DENIED),
    ]
});

/// One entry of the denial matrix: `role` must not reach `route`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenialCase<'a> {
    pub route: &'a RouteDescriptor,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
struct RouteExtension {
    routes: Vec<RouteDescriptor>,
}

#[derive(Debug, Clone)]
pub struct RouteRegistry {
    routes: Vec<RouteDescriptor>,
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RouteRegistry {
    pub fn empty() -> Self {
        Self { routes: Vec::new() }
    }

    /// Public and ERP tables, in that order.
    pub fn builtin() -> Self {
        Self { routes: PUBLIC_ROUTES.iter().chain(ERP_ROUTES.iter()).cloned().collect() }
    }

    /// Validate and append. Paths are unique.
    pub fn register(&mut self, route: RouteDescriptor) -> E2eResult<()> {
        route.validate()?;
        if self.get(&route.path).is_some() {
            return Err(E2eError::DuplicateRoute(route.path));
        }
        debug!("Registered route {} ({})", route.path, route.name);
        self.routes.push(route);
        Ok(())
    }

    /// Register every route of a YAML extension, or none of them.
    pub fn extend_from_yaml(&mut self, yaml: &str) -> E2eResult<usize> {
        let extension: RouteExtension =
            serde_yaml::from_str(yaml).map_err(|e| E2eError::RegistryParse(e.to_string()))?;
        let count = extension.routes.len();
        let mut staged = self.clone();
        for route in extension.routes {
            staged.register(route)?;
        }
        *self = staged;
        Ok(count)
    }

    /// Append routes from every `.yaml`/`.yml` file under `dir`, all or none.
    /// An unreadable `dir` is an error; unreadable entries below it are skipped.
    pub fn load_extensions(&mut self, dir: &Path) -> E2eResult<usize> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(dir) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(E2eError::RegistryParse(format!("{}: {}", dir.display(), e)));
                }
                Err(e) => {
                    warn!("Skipping unreadable route extension entry: {}", e);
                    continue;
                }
            };
            let is_yaml = entry
                .path()
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if is_yaml {
                files.push(entry.into_path());
            }
        }
        files.sort();

        let mut staged = self.clone();
        let mut added = 0;
        for file in files {
            let content = std::fs::read_to_string(&file)?;
            added += staged.extend_from_yaml(&content).map_err(|e| match e {
                E2eError::RegistryParse(msg) => E2eError::RegistryParse(format!("{}: {}", file.display(), msg)),
                other => other,
            })?;
        }
        *self = staged;
        info!("Loaded {} route extension(s) from {}", added, dir.display());
        Ok(added)
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.path == path)
    }

    /// Resolve a concrete path. Exact patterns win over parameterized ones.
    pub fn matches(&self, concrete: &str) -> Option<&RouteDescriptor> {
        let path = strip_query(concrete);
        self.get(path)
            .or_else(|| self.routes.iter().find(|r| r.has_params && r.matches_path(path)))
    }

    pub fn filter(&self, predicate: impl Fn(&RouteDescriptor) -> bool) -> Vec<&RouteDescriptor> {
        self.routes.iter().filter(|r| predicate(r)).collect()
    }

    pub fn public_routes(&self) -> Vec<&RouteDescriptor> {
        self.filter(|r| r.public)
    }

    pub fn erp_routes(&self) -> Vec<&RouteDescriptor> {
        self.filter(|r| !r.public)
    }

    pub fn dashboard_routes(&self) -> Vec<&RouteDescriptor> {
        self.filter(RouteDescriptor::is_dashboard)
    }

    pub fn admin_routes(&self) -> Vec<&RouteDescriptor> {
        self.filter(RouteDescriptor::is_admin)
    }

    /// Exactly the routes that deny at least one role.
    pub fn rbac_routes(&self) -> Vec<&RouteDescriptor> {
        self.filter(|r| !r.denied_roles.is_empty())
    }

    pub fn form_routes(&self) -> Vec<&RouteDescriptor> {
        self.filter(|r| r.has_form)
    }

    pub fn param_routes(&self) -> Vec<&RouteDescriptor> {
        self.filter(|r| r.has_params)
    }

    /// Routes a blanket crawler visits: everything without parameters.
    pub fn crawlable_routes(&self) -> Vec<&RouteDescriptor> {
        self.filter(|r| !r.has_params)
    }

    /// Each RBAC route paired with each of its own denied roles.
    pub fn denial_matrix(&self) -> Vec<DenialCase<'_>> {
        self.rbac_routes()
            .into_iter()
            .flat_map(|route| route.denied_roles.iter().map(move |role| DenialCase { route, role: *role }))
            .collect()
    }
}
