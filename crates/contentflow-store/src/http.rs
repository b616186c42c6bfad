//! HTTP client for the remote tabular record store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::{FieldSchema, Fields, ListOptions, Record, RecordFilter, RecordPage, RecordStore};

/// Client for a tabular record store exposing JSON CRUD over HTTP.
///
/// Requests are authenticated with a static bearer token. The client
/// stamps `created_at` on create and `updated_at` on update, matching
/// the checkpoint schema the orchestrator reads back.
pub struct HttpRecordStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
    table_id: String,
}

/// Request/response envelope for a single record.
#[derive(Debug, Serialize, Deserialize)]
struct RecordEnvelope {
    record: Record,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    fields: &'a Fields,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    filter: &'a RecordFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CreateTableRequest<'a> {
    name: &'a str,
    fields: &'a [FieldSchema],
}

#[derive(Debug, Deserialize)]
struct CreateTableResponse {
    table_id: String,
}

/// Table metadata returned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct TableInfo {
    /// Opaque table identifier.
    pub table_id: String,
    /// Table name.
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TableListResponse {
    items: Vec<TableInfo>,
}

impl HttpRecordStore {
    /// Creates a client for one table of the remote store.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            table_id: table_id.into(),
        }
    }

    /// The table this client reads and writes.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    fn records_url(&self) -> String {
        format!("{}/tables/{}/records", self.base_url, self.table_id)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or(body);
        Err(StoreError::Api { status, message })
    }

    async fn decode_record(response: reqwest::Response) -> Result<Record, StoreError> {
        let envelope: RecordEnvelope = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(envelope.record)
    }

    /// Creates a table, returning its id.
    pub async fn create_table(
        &self,
        name: &str,
        fields: &[FieldSchema],
    ) -> Result<String, StoreError> {
        let response = self
            .client
            .post(format!("{}/tables", self.base_url))
            .bearer_auth(&self.token)
            .json(&CreateTableRequest { name, fields })
            .send()
            .await?;
        let response = Self::check(response).await?;

        let created: CreateTableResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        debug!(table = name, table_id = %created.table_id, "created table");
        Ok(created.table_id)
    }

    /// Lists existing tables.
    pub async fn list_tables(&self) -> Result<Vec<TableInfo>, StoreError> {
        let response = self
            .client
            .get(format!("{}/tables", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let listed: TableListResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(listed.items)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn create_record(&self, mut fields: Fields) -> Result<Record, StoreError> {
        fields.insert("created_at".to_string(), Utc::now().to_rfc3339().into());

        let response = self
            .client
            .post(self.records_url())
            .bearer_auth(&self.token)
            .json(&WriteRequest { fields: &fields })
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::decode_record(response).await
    }

    async fn update_record(&self, record_id: &str, mut fields: Fields) -> Result<Record, StoreError> {
        fields.insert("updated_at".to_string(), Utc::now().to_rfc3339().into());

        let response = self
            .client
            .patch(format!("{}/{}", self.records_url(), record_id))
            .bearer_auth(&self.token)
            .json(&WriteRequest { fields: &fields })
            .send()
            .await?;
        let response = Self::check(response).await?;
        Self::decode_record(response).await
    }

    async fn query_records(&self, filter: &RecordFilter) -> Result<RecordPage, StoreError> {
        let response = self
            .client
            .post(format!("{}/search", self.records_url()))
            .bearer_auth(&self.token)
            .json(&SearchRequest {
                filter,
                page_size: Some(20),
            })
            .send()
            .await?;
        let response = Self::check(response).await?;

        response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn list_records(&self, options: &ListOptions) -> Result<RecordPage, StoreError> {
        let mut request = self
            .client
            .get(self.records_url())
            .bearer_auth(&self.token);
        if let Some(size) = options.page_size {
            request = request.query(&[("page_size", size.to_string())]);
        }
        if let Some(token) = &options.page_token {
            request = request.query(&[("page_token", token.clone())]);
        }

        let response = Self::check(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
