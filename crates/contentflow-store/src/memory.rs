//! In-memory record store.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::record::{Fields, ListOptions, Record, RecordFilter, RecordPage, RecordStore};

/// In-memory record store for tests and storeless deployments.
///
/// Records are kept in insertion order; queries scan linearly. Like the
/// remote store, `created_at` and `updated_at` fields are stamped on
/// write.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<Record>>,
    next_id: AtomicU64,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_record(&self, mut fields: Fields) -> Result<Record, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        fields.insert("created_at".to_string(), Utc::now().to_rfc3339().into());

        let record = Record {
            record_id: format!("rec_{id}"),
            fields,
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_record(&self, record_id: &str, fields: Fields) -> Result<Record, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.record_id == record_id)
            .ok_or_else(|| StoreError::Api {
                status: 404,
                message: format!("record not found: {record_id}"),
            })?;

        for (key, value) in fields {
            record.fields.insert(key, value);
        }
        record
            .fields
            .insert("updated_at".to_string(), Utc::now().to_rfc3339().into());
        Ok(record.clone())
    }

    async fn query_records(&self, filter: &RecordFilter) -> Result<RecordPage, StoreError> {
        let records = self.records.read().await;
        let items: Vec<Record> = records
            .iter()
            .filter(|r| r.fields.get(&filter.field) == Some(&filter.value))
            .cloned()
            .collect();

        Ok(RecordPage {
            items,
            has_more: false,
            page_token: None,
        })
    }

    async fn list_records(&self, options: &ListOptions) -> Result<RecordPage, StoreError> {
        let records = self.records.read().await;
        let offset: usize = options
            .page_token
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);
        let page_size = options.page_size.unwrap_or(20) as usize;

        let items: Vec<Record> = records.iter().skip(offset).take(page_size).cloned().collect();
        let consumed = offset + items.len();
        let has_more = consumed < records.len();

        Ok(RecordPage {
            items,
            has_more,
            page_token: has_more.then(|| consumed.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_created_at() {
        let store = MemoryRecordStore::new();
        let record = store
            .create_record(fields(&[("topic", json!("rust"))]))
            .await
            .unwrap();

        assert!(record.record_id.starts_with("rec_"));
        assert!(record.fields.contains_key("created_at"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryRecordStore::new();
        let record = store
            .create_record(fields(&[("stage", json!("initialization"))]))
            .await
            .unwrap();

        let updated = store
            .update_record(&record.record_id, fields(&[("stage", json!("research")), ("progress", json!(15))]))
            .await
            .unwrap();

        assert_eq!(updated.fields["stage"], "research");
        assert_eq!(updated.fields["progress"], 15);
        assert!(updated.fields.contains_key("updated_at"));
    }

    #[tokio::test]
    async fn test_update_unknown_record_fails() {
        let store = MemoryRecordStore::new();
        let result = store.update_record("rec_missing", Fields::new()).await;
        assert!(matches!(result, Err(StoreError::Api { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_query_by_field_equality() {
        let store = MemoryRecordStore::new();
        store
            .create_record(fields(&[("workflow_id", json!("wf_a"))]))
            .await
            .unwrap();
        store
            .create_record(fields(&[("workflow_id", json!("wf_b"))]))
            .await
            .unwrap();

        let page = store
            .query_records(&RecordFilter::workflow_id("wf_b"))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].fields["workflow_id"], "wf_b");
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_list_paging() {
        let store = MemoryRecordStore::new();
        for i in 0..5 {
            store
                .create_record(fields(&[("n", json!(i))]))
                .await
                .unwrap();
        }

        let first = store
            .list_records(&ListOptions {
                page_size: Some(2),
                page_token: None,
            })
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.has_more);

        let second = store
            .list_records(&ListOptions {
                page_size: Some(2),
                page_token: first.page_token,
            })
            .await
            .unwrap();
        assert_eq!(second.items[0].fields["n"], 2);

        let rest = store
            .list_records(&ListOptions {
                page_size: Some(10),
                page_token: second.page_token,
            })
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 1);
        assert!(!rest.has_more);
    }
}
