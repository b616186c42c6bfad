//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Record store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store, no persistence across restarts.
    Memory,
    /// Remote tabular record store over HTTP.
    Http,
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,

    /// Base URL of the remote store (http backend only).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for the remote store (http backend only).
    #[serde(default)]
    pub token: Option<String>,

    /// Table holding workflow checkpoint records.
    #[serde(default = "default_table_id")]
    pub table_id: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            base_url: None,
            token: None,
            table_id: default_table_id(),
        }
    }
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Memory
}

fn default_table_id() -> String {
    "workflows".to_string()
}

/// Event stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Heartbeat broadcast interval in seconds.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

fn default_heartbeat_secs() -> u64 {
    30
}

/// Workflow pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Pause between pipeline stages in milliseconds.
    #[serde(default = "default_stage_delay_ms")]
    pub stage_delay_ms: u64,

    /// Pause between generated sections in milliseconds.
    #[serde(default = "default_section_delay_ms")]
    pub section_delay_ms: u64,

    /// Number of content sections generated per workflow.
    #[serde(default = "default_sections")]
    pub sections: u32,

    /// When set, terminal workflows older than this many seconds are
    /// pruned from the in-memory registry.
    #[serde(default)]
    pub completed_retention_secs: Option<u64>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            stage_delay_ms: default_stage_delay_ms(),
            section_delay_ms: default_section_delay_ms(),
            sections: default_sections(),
            completed_retention_secs: None,
        }
    }
}

fn default_stage_delay_ms() -> u64 {
    1500
}

fn default_section_delay_ms() -> u64 {
    500
}

fn default_sections() -> u32 {
    5
}
