use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, Result};

/// Format of the `updated` field, e.g. `Monday 05 Aug 2024 14:30:00 UTC`.
pub const UPDATED_FORMAT: &str = "%A %d %b %Y %H:%M:%S UTC";

pub const DATA_FIELD: &str = "data";
pub const UPDATED_FIELD: &str = "updated";

/// Handle addressing one document inside one collection.
///
/// Holding a reference says nothing about whether the document exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    collection: String,
    name: String,
}

impl DocumentRef {
    pub fn new(collection: &str, name: &str) -> Result<Self> {
        require_collection(collection)?;
        require_path_segment("document_name", name)?;
        Ok(Self {
            collection: collection.to_string(),
            name: name.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `collection/name`, relative to the database's documents root.
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.name)
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.name)
    }
}

pub fn require_collection(collection: &str) -> Result<()> {
    require_path_segment("collection_name", collection)
}

/// Names address exactly one level of the database path, so `/` is refused.
fn require_path_segment(field: &str, value: &str) -> Result<()> {
    require_non_empty(field, value)?;
    if value.contains('/') {
        return Err(DomainError::invalid_argument(format!(
            "{field} cannot contain '/': {value:?}"
        )));
    }
    Ok(())
}

/// Unwraps an optional project id, rejecting absent and blank values.
pub fn require_project_id(project_id: Option<&str>) -> Result<&str> {
    let project_id =
        project_id.ok_or_else(|| DomainError::invalid_argument("project_id cannot be nil"))?;
    require_non_empty("project_id", project_id)?;
    Ok(project_id)
}

pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_argument(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(())
}

/// Body written on every save. Always replaces the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub data: serde_json::Value,
    pub updated: String,
}

impl StoredDocument {
    pub fn new(data: serde_json::Value, at: DateTime<Utc>) -> Self {
        Self {
            data,
            updated: format_updated(at),
        }
    }

    pub fn into_fields(self) -> serde_json::Map<String, serde_json::Value> {
        let mut fields = serde_json::Map::new();
        fields.insert(DATA_FIELD.to_string(), self.data);
        fields.insert(UPDATED_FIELD.to_string(), serde_json::Value::String(self.updated));
        fields
    }
}

pub fn format_updated(at: DateTime<Utc>) -> String {
    at.format(UPDATED_FORMAT).to_string()
}

pub fn parse_updated(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, UPDATED_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::internal(format!("invalid updated timestamp {value:?}: {e}")))
}
