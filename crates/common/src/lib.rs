//! Serenity Common Library
//!
//! Roles, synthesized identities and the permission catalog shared by the
//! fixture generators and the e2e harness.

pub mod identity;
pub mod rbac;
pub mod role;

pub use identity::{
    email_for, resolve_identity, role_for_email, Identity, TEST_EMAIL_DOMAIN, TEST_PASSWORD,
};
pub use role::{Role, RoleResolution, UnknownRole};

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
