//! Configuration for publication lists
//!
//! Options here are read by templates and by callers deciding how to group a
//! store. The presenter's state machine never looks at them.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::store::{Expand, GroupMode};

/// Fields shown in the details view when none are configured
pub const DEFAULT_DETAIL_FIELDS: &[&str] = &[
    "title",
    "creators",
    "date",
    "publicationTitle",
    "publisher",
    "place",
    "url",
    "DOI",
    "abstractNote",
];

/// Publication list configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicationsConfig {
    /// How to group records before display
    pub group: GroupMode,
    /// Which groups start expanded
    pub expand: Expand,
    /// Append branding after the list
    pub show_branding: bool,
    /// Make item titles open the details view
    pub show_details: bool,
    /// Fields listed in the details view, in order
    pub detail_fields: Vec<String>,
}

impl Default for PublicationsConfig {
    fn default() -> Self {
        Self {
            group: GroupMode::None,
            expand: Expand::None,
            show_branding: true,
            show_details: true,
            detail_fields: DEFAULT_DETAIL_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl PublicationsConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group == GroupMode::ByCollection {
            return Err(ConfigError::InvalidValue(
                "grouping by collection is not supported".to_string(),
            ));
        }

        if self.detail_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::InvalidValue(
                "detail_fields must not contain empty names".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PublicationsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.group, GroupMode::None);
        assert!(config.show_branding);
        assert_eq!(config.detail_fields.first().map(String::as_str), Some("title"));
    }

    #[test]
    fn test_from_toml() {
        let config = PublicationsConfig::from_toml(
            r#"
group = "type"
expand = ["book", "thesis"]
showBranding = false
"#,
        )
        .unwrap();
        assert_eq!(config.group, GroupMode::ByType);
        assert!(config.expand.includes("thesis"));
        assert!(!config.expand.includes("journalArticle"));
        assert!(!config.show_branding);
        assert!(config.show_details);
    }

    #[test]
    fn test_json_round_trip() {
        let config = PublicationsConfig {
            group: GroupMode::ByType,
            expand: Expand::All,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert!(json.contains("\"all\""));
        let parsed = PublicationsConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PublicationsConfig {
            expand: Expand::types(["book"]),
            ..Default::default()
        };
        let parsed = PublicationsConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_collection_grouping() {
        let err = PublicationsConfig::from_json(r#"{"group": "collection"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_rejects_empty_detail_field() {
        let mut config = PublicationsConfig::default();
        config.detail_fields.push("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        let err = PublicationsConfig::from_toml("group = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
