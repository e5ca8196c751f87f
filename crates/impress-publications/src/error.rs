//! Error types for impress-publications

use thiserror::Error;

/// Result type alias for publication list operations
pub type Result<T> = std::result::Result<T, PublicationsError>;

/// Main error type for publication list operations
#[derive(Error, Debug)]
pub enum PublicationsError {
    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Presenter errors
    #[error("Presenter error: {0}")]
    Presenter(#[from] PresenterError),

    /// Template errors, passed through untouched
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Record payload could not be decoded
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Record store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Operation exists but has no implementation
    #[error("{0} is not implemented yet")]
    Unimplemented(&'static str),

    /// Record cannot be placed into a group
    #[error("Invalid record {key}: {reason}")]
    InvalidRecord { key: String, reason: String },
}

/// Presenter errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresenterError {
    /// No record in the last displayed store carries this key
    #[error("Record not found: {0}")]
    RecordNotFound(String),
}

/// Template errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Generic rendering failure
    #[error("Render failed: {0}")]
    Render(String),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value is not acceptable
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Source text could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unimplemented("group_by_collections");
        assert_eq!(err.to_string(), "group_by_collections is not implemented yet");

        let err = StoreError::InvalidRecord {
            key: "ABCD1234".into(),
            reason: "missing itemType".into(),
        };
        assert!(err.to_string().contains("ABCD1234"));
    }

    #[test]
    fn test_wrapping_preserves_message() {
        let err: PublicationsError = PresenterError::RecordNotFound("XYZ".into()).into();
        assert!(matches!(
            err,
            PublicationsError::Presenter(PresenterError::RecordNotFound(ref k)) if k == "XYZ"
        ));
        assert!(err.to_string().contains("XYZ"));
    }
}
