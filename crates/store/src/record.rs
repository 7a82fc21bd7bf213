use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use switchboard_core::JsonMap;

/// Field names the store manages itself.
pub mod fields {
    /// Record id.
    pub const OBJECT_ID: &str = "objectId";
    /// Creation timestamp.
    pub const CREATED_AT: &str = "createdAt";
    /// Last update timestamp.
    pub const UPDATED_AT: &str = "updatedAt";
    /// Tenant that owns the record.
    pub const ORGANIZATION_ID: &str = "organizationId";
}

/// One stored object.
///
/// A record without an `object_id` has never been saved. The store assigns
/// the id and both timestamps on first save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Class (table) name.
    pub class_name: String,
    /// Store-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// Set on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set on every save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// User-defined fields.
    #[serde(flatten)]
    pub fields: JsonMap,
}

impl Record {
    /// Unsaved record of a class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
            created_at: None,
            updated_at: None,
            fields: JsonMap::new(),
        }
    }

    /// Handle to an existing record, for updates.
    pub fn with_id(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_id: Some(object_id.into()),
            ..Self::new(class_name)
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field. Managed fields (`objectId`, `createdAt`, `updatedAt`)
    /// are ignored.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if is_managed(&name) {
            return;
        }
        self.fields.insert(name, value.into());
    }

    /// Merge every entry of `fields` with [`set`](Self::set).
    pub fn merge(&mut self, fields: &JsonMap) {
        for (name, value) in fields {
            self.set(name.clone(), value.clone());
        }
    }

    /// Remove a field.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Read a field, including the managed ones.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            fields::OBJECT_ID => self.object_id.clone().map(Value::String),
            fields::CREATED_AT => self.created_at.map(|t| Value::String(t.to_rfc3339())),
            fields::UPDATED_AT => self.updated_at.map(|t| Value::String(t.to_rfc3339())),
            _ => self.fields.get(name).cloned(),
        }
    }

    /// Read a string field.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match name {
            fields::OBJECT_ID => self.object_id.as_deref(),
            _ => self.fields.get(name).and_then(Value::as_str),
        }
    }

    /// Organization the record belongs to.
    pub fn organization_id(&self) -> Option<&str> {
        self.get_str(fields::ORGANIZATION_ID)
    }

    /// Whether the record has never been saved.
    pub fn is_new(&self) -> bool {
        self.object_id.is_none()
    }

    /// JSON form handed back to callers.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Keep only `keep` among the user-defined fields.
    pub(crate) fn project(mut self, keep: &[String]) -> Self {
        self.fields.retain(|name, _| keep.iter().any(|k| k == name));
        self
    }
}

fn is_managed(name: &str) -> bool {
    matches!(
        name,
        fields::OBJECT_ID | fields::CREATED_AT | fields::UPDATED_AT | "className"
    )
}
