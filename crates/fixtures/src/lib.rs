//! Serenity Fixtures
//!
//! Pure generators that synthesize realistic console entities, and response
//! shapers that wrap them in the envelope each backend endpoint returns.
//!
//! Every generator comes in two forms:
//! - `generate_x()` returns a fresh entity with randomized, internally
//!   consistent fields
//! - `generate_x_with(&Overrides)` shallow-merges pinned fields on top
//!
//! Values vary from call to call; key sets, value types and the enumerated
//! status vocabulary never do.

pub mod audit;
pub mod auth;
pub mod billing;
pub mod credentials;
pub mod error;
pub mod evv;
pub mod hr;
pub mod overrides;
pub mod params;
pub mod patients;
pub mod scheduling;
pub mod seed;
pub mod users;

pub use error::{FixtureError, FixtureResult};
pub use overrides::{apply_overrides, Overrides};
pub use params::{ItemResponse, ListParams, ListResponse, PagedResponse};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    /// Key → JSON type name, for comparing entity shapes.
    fn shape(value: &Value) -> Vec<(String, &'static str)> {
        let mut shape: Vec<(String, &'static str)> = value
            .as_object()
            .expect("entities serialize as objects")
            .iter()
            .map(|(k, v)| {
                let kind = match v {
                    Value::Null => "null",
                    Value::Bool(_) => "bool",
                    Value::Number(n) if n.is_f64() => "float",
                    Value::Number(_) => "integer",
                    Value::String(_) => "string",
                    Value::Array(_) => "array",
                    Value::Object(_) => "object",
                };
                (k.clone(), kind)
            })
            .collect();
        shape.sort();
        shape
    }

    fn assert_stable_shape<T: serde::Serialize>(mut generate: impl FnMut() -> T) {
        let first = shape(&serde_json::to_value(generate()).unwrap());
        for _ in 0..25 {
            assert_eq!(shape(&serde_json::to_value(generate()).unwrap()), first);
        }
    }

    #[test]
    fn test_generators_have_stable_shapes() {
        assert_stable_shape(users::generate_user);
        assert_stable_shape(patients::generate_patient);
        assert_stable_shape(credentials::generate_credential);
        assert_stable_shape(audit::generate_audit_log);
        assert_stable_shape(evv::generate_visit);
        assert_stable_shape(scheduling::generate_shift);
        assert_stable_shape(billing::generate_claim);
        assert_stable_shape(hr::generate_applicant);
        assert_stable_shape(hr::generate_employee);
    }

    #[test]
    fn test_overridden_fields_survive_unchanged() {
        let overrides = Overrides::new()
            .set("status", "expired")
            .set("caregiverName", "Pinned Name")
            .set("daysLeft", 400);
        let credential = credentials::generate_credential_with(&overrides).unwrap();
        let value = serde_json::to_value(&credential).unwrap();
        for field in overrides.fields() {
            assert_eq!(Some(&value[field.as_str()]), overrides.get(field));
        }
    }

    #[test]
    fn test_override_shape_matches_generated_shape() {
        let plain = serde_json::to_value(billing::generate_claim()).unwrap();
        let pinned = serde_json::to_value(
            billing::generate_claim_with(&Overrides::new().set("status", "paid")).unwrap(),
        )
        .unwrap();
        assert_eq!(shape(&plain), shape(&pinned));
    }
}
