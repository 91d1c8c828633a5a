//! Error types for fixture generation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Overrides must be a JSON object, got: {0}")]
    OverridesNotObject(String),

    #[error("Invalid override for field(s) [{fields}]: {reason}")]
    InvalidOverride { fields: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type FixtureResult<T> = Result<T, FixtureError>;
