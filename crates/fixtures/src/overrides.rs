//! Shallow field overrides applied on top of generated entities.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{FixtureError, FixtureResult};

/// Top-level fields to pin on a generated entity.
///
/// Keys use the entity's wire names (camelCase). Merging is shallow: a nested
/// object given here replaces the generated one wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides(Map<String, Value>);

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: Value) -> FixtureResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(FixtureError::OverridesNotObject(other.to_string())),
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

/// Merge `overrides` into `entity` and read the result back as `T`.
///
/// Overrides are applied after every derived field has been computed, so a
/// pinned field always wins and nothing is re-derived from it.
pub fn apply_overrides<T>(entity: T, overrides: &Overrides) -> FixtureResult<T>
where
    T: Serialize + DeserializeOwned,
{
    if overrides.is_empty() {
        return Ok(entity);
    }

    let mut value = serde_json::to_value(entity)?;
    if let Value::Object(fields) = &mut value {
        for (key, override_value) in &overrides.0 {
            fields.insert(key.clone(), override_value.clone());
        }
    }

    serde_json::from_value(value).map_err(|e| FixtureError::InvalidOverride {
        fields: overrides.fields().cloned().collect::<Vec<_>>().join(", "),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        name: String,
        days_left: i64,
    }

    #[test]
    fn test_override_replaces_field() {
        let sample = Sample { name: "a".into(), days_left: 3 };
        let merged = apply_overrides(sample, &Overrides::new().set("daysLeft", 99)).unwrap();
        assert_eq!(merged.days_left, 99);
        assert_eq!(merged.name, "a");
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let sample = Sample { name: "a".into(), days_left: 3 };
        let err = apply_overrides(sample, &Overrides::new().set("daysLeft", "soon")).unwrap_err();
        assert!(err.to_string().contains("daysLeft"));
    }

    #[test]
    fn test_from_json_requires_object() {
        assert!(Overrides::from_json(json!({"status": "expired"})).is_ok());
        assert!(Overrides::from_json(json!(["status"])).is_err());
    }
}
