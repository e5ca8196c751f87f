//! Record model for items returned by a Zotero-style API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// A single bibliographic record.
///
/// Only `key` and `data.item_type` mean anything to the store and presenter;
/// everything else is carried for templates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default)]
    pub data: RecordData,
}

/// Item fields of a record
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    #[serde(rename = "itemType", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record with a key and an item type
    pub fn new(key: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: None,
            data: RecordData {
                item_type: Some(item_type.into()),
                fields: Map::new(),
            },
        }
    }

    /// Set a field value, returning the record
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.fields.insert(name.into(), value.into());
        self
    }

    /// The type classifier, if present and non-empty
    pub fn item_type(&self) -> Option<&str> {
        self.data.item_type.as_deref().filter(|t| !t.is_empty())
    }

    /// Get a field rendered as text.
    ///
    /// Strings are returned as-is, numbers and booleans are formatted,
    /// empty strings and structured values yield `None`.
    pub fn field(&self, name: &str) -> Option<String> {
        if name == "itemType" {
            return self.item_type().map(str::to_string);
        }
        match self.data.fields.get(name)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Title of the record, falling back to the key
    pub fn title(&self) -> String {
        self.field("title").unwrap_or_else(|| self.key.clone())
    }

    /// Creators joined into a single line, e.g. `Curie, M.; Einstein, A.`
    pub fn creators_summary(&self) -> Option<String> {
        let creators = self.data.fields.get("creators")?.as_array()?;
        let names: Vec<String> = creators
            .iter()
            .filter_map(|c| {
                if let Some(name) = c.get("name").and_then(Value::as_str) {
                    return Some(name.to_string());
                }
                let last = c.get("lastName").and_then(Value::as_str)?;
                match c.get("firstName").and_then(Value::as_str) {
                    Some(first) if !first.is_empty() => Some(format!("{}, {}", last, first)),
                    _ => Some(last.to_string()),
                }
            })
            .collect();

        if names.is_empty() {
            None
        } else {
            Some(names.join("; "))
        }
    }
}

/// Decode a JSON array of records as returned by the API
pub fn records_from_json(json: &str) -> Result<Vec<Record>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_api_item() {
        let json = r#"[{
            "key": "X42A7DEE",
            "version": 1204,
            "data": {
                "itemType": "journalArticle",
                "title": "On the Electrodynamics of Moving Bodies",
                "creators": [{"creatorType": "author", "firstName": "Albert", "lastName": "Einstein"}],
                "date": "1905"
            }
        }]"#;
        let records = records_from_json(json).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.key, "X42A7DEE");
        assert_eq!(record.version, Some(1204));
        assert_eq!(record.item_type(), Some("journalArticle"));
        assert_eq!(record.title(), "On the Electrodynamics of Moving Bodies");
        assert_eq!(record.creators_summary(), Some("Einstein, Albert".to_string()));
        assert_eq!(record.field("date"), Some("1905".to_string()));
    }

    #[test]
    fn test_missing_item_type() {
        let records = records_from_json(r#"[{"key": "A", "data": {"title": "T"}}]"#).unwrap();
        assert_eq!(records[0].item_type(), None);

        let empty = Record::new("B", "");
        assert_eq!(empty.item_type(), None);
    }

    #[test]
    fn test_field_formatting() {
        let record = Record::new("A", "book")
            .with_field("numPages", json!(320))
            .with_field("extra", json!(""))
            .with_field("tags", json!([{"tag": "physics"}]));
        assert_eq!(record.field("numPages"), Some("320".to_string()));
        assert_eq!(record.field("extra"), None);
        assert_eq!(record.field("tags"), None);
        assert_eq!(record.field("itemType"), Some("book".to_string()));
        assert_eq!(record.title(), "A");
    }

    #[test]
    fn test_creators_with_single_field_name() {
        let record = Record::new("A", "report").with_field(
            "creators",
            json!([{"name": "CERN"}, {"lastName": "Higgs", "firstName": ""}]),
        );
        assert_eq!(record.creators_summary(), Some("CERN; Higgs".to_string()));
    }

    #[test]
    fn test_invalid_json() {
        assert!(records_from_json("{not json").is_err());
    }
}
