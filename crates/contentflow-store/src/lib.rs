//! # Contentflow Store
//!
//! The record store consumed by the workflow orchestrator. Checkpoints
//! live in an external tabular store addressed by opaque record ids;
//! this crate provides the `RecordStore` trait plus an HTTP client for
//! the remote store and an in-memory implementation for tests and
//! storeless deployments.

mod error;
mod http;
mod memory;
mod record;

pub use error::StoreError;
pub use http::{HttpRecordStore, TableInfo};
pub use memory::MemoryRecordStore;
pub use record::{FieldSchema, FieldType, Fields, ListOptions, Record, RecordFilter, RecordPage, RecordStore};
