//! Record types and the store trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Field map of one record. Values are arbitrary JSON.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// One record held by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Opaque record identifier assigned by the store.
    pub record_id: String,
    /// Record fields.
    pub fields: Fields,
}

/// One page of query or list results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPage {
    /// Records on this page.
    pub items: Vec<Record>,
    /// Whether more pages exist.
    pub has_more: bool,
    /// Token for fetching the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// Equality filter on a single field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Field name to match.
    pub field: String,
    /// Value the field must equal.
    pub value: serde_json::Value,
}

impl RecordFilter {
    /// Creates an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Filter matching a workflow's checkpoint record.
    pub fn workflow_id(id: &str) -> Self {
        Self::eq("workflow_id", id)
    }
}

/// Paging options for record listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOptions {
    /// Page size; the store default applies when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Continuation token from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// Column type in a provisioned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
}

/// Column definition used when provisioning a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldSchema {
    /// Creates a column definition.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// The record store consumed by the orchestrator.
///
/// All operations are potentially failing remote calls; callers do not
/// retry internally. A checkpoint write failure is treated as a stage
/// failure by the orchestrator.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates a record and returns it with its assigned id.
    async fn create_record(&self, fields: Fields) -> Result<Record, StoreError>;

    /// Merges fields into an existing record.
    async fn update_record(&self, record_id: &str, fields: Fields) -> Result<Record, StoreError>;

    /// Queries records matching a single-field equality filter.
    async fn query_records(&self, filter: &RecordFilter) -> Result<RecordPage, StoreError>;

    /// Lists records with paging.
    async fn list_records(&self, options: &ListOptions) -> Result<RecordPage, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_workflow_id() {
        let filter = RecordFilter::workflow_id("wf_1");
        assert_eq!(filter.field, "workflow_id");
        assert_eq!(filter.value, serde_json::json!("wf_1"));
    }

    #[test]
    fn test_list_options_skip_unset() {
        let json = serde_json::to_value(ListOptions::default()).unwrap();
        assert!(json.get("page_size").is_none());
        assert!(json.get("page_token").is_none());
    }

    #[test]
    fn test_field_schema_serialize() {
        let schema = FieldSchema::new("progress", FieldType::Number);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["name"], "progress");
        assert_eq!(json["type"], "number");
    }
}
