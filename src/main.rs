//! ContentFlow - stage-sequenced content workflow service.
//!
//! Main entry point for the ContentFlow CLI and server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use contentflow_api::{ApiServer, AppState, ServerConfig};
use contentflow_config::{Config, ConfigLoader, StoreBackend};
use contentflow_engine::{
    ContentWorker, EventBroadcaster, OrchestratorConfig, WorkflowOrchestrator,
};
use contentflow_protocols::WorkflowStage;
use contentflow_store::{FieldSchema, FieldType, HttpRecordStore, MemoryRecordStore, RecordStore};

/// ContentFlow CLI.
#[derive(Parser)]
#[command(name = "contentflow")]
#[command(about = "Stage-sequenced content workflow service")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server in foreground (default)
    Run {
        /// Server host, overriding the config file
        #[arg(long)]
        host: Option<String>,

        /// Server port, overriding the config file
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create the checkpoint table in the remote record store
    Provision {
        /// Table name
        #[arg(long, default_value = "workflows")]
        name: String,
    },
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ConfigLoader::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    match cli.command {
        None => run_server(config, None, None).await,
        Some(Commands::Run { host, port }) => run_server(config, host, port).await,
        Some(Commands::Provision { name }) => provision(config, &name).await,
    }
}

async fn run_server(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let store = build_store(&config)?;
    let broadcaster = Arc::new(EventBroadcaster::new());
    let heartbeat = broadcaster.spawn_heartbeat(Duration::from_secs(config.stream.heartbeat_secs));

    let orchestrator = Arc::new(WorkflowOrchestrator::new(
        Arc::clone(&store),
        Arc::clone(&broadcaster),
        Arc::new(ContentWorker),
        OrchestratorConfig {
            stage_delay: Duration::from_millis(config.workflow.stage_delay_ms),
            section_delay: Duration::from_millis(config.workflow.section_delay_ms),
            sections: config.workflow.sections,
            completed_retention: config
                .workflow
                .completed_retention_secs
                .map(Duration::from_secs),
        },
    ));
    let pruner = orchestrator.spawn_pruner();

    let server_config = ServerConfig::new(
        host.unwrap_or(config.server.host),
        port.unwrap_or(config.server.port),
    );
    let state = Arc::new(AppState::new(orchestrator, broadcaster, store));
    let server = ApiServer::new(server_config, state);

    info!("starting ContentFlow on {}", server.addr());
    server
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    heartbeat.abort();
    if let Some(pruner) = pruner {
        pruner.abort();
    }
    Ok(())
}

fn build_store(config: &Config) -> Result<Arc<dyn RecordStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            info!("using in-memory record store");
            Ok(Arc::new(MemoryRecordStore::new()))
        }
        StoreBackend::Http => Ok(Arc::new(build_http_store(config)?)),
    }
}

fn build_http_store(config: &Config) -> Result<HttpRecordStore> {
    let base_url = config
        .store
        .base_url
        .as_deref()
        .context("store.base_url is required for the http backend")?;
    let token = config
        .store
        .token
        .as_deref()
        .context("store.token is required for the http backend")?;
    info!(base_url, table_id = %config.store.table_id, "using HTTP record store");
    Ok(HttpRecordStore::new(base_url, token, &config.store.table_id))
}

async fn provision(config: Config, name: &str) -> Result<()> {
    if config.store.backend != StoreBackend::Http {
        bail!("provisioning requires the http store backend");
    }
    let store = build_http_store(&config)?;

    let existing = store.list_tables().await?;
    if let Some(table) = existing.iter().find(|t| t.name == name) {
        info!(table_id = %table.table_id, "table already exists, nothing to do");
        return Ok(());
    }

    let table_id = store.create_table(name, &checkpoint_schema()).await?;
    info!(table = name, table_id = %table_id, "checkpoint table created");
    println!("created table {name} ({table_id})");
    Ok(())
}

/// Column schema for the workflow checkpoint table.
fn checkpoint_schema() -> Vec<FieldSchema> {
    let mut fields = vec![
        FieldSchema::new("workflow_id", FieldType::Text),
        FieldSchema::new("topic", FieldType::Text),
        FieldSchema::new("status", FieldType::Text),
        FieldSchema::new("stage", FieldType::Text),
        FieldSchema::new("stage_name", FieldType::Text),
        FieldSchema::new("progress", FieldType::Number),
        FieldSchema::new("parameters", FieldType::Text),
        FieldSchema::new("created_by", FieldType::Text),
        FieldSchema::new("error_stage", FieldType::Text),
        FieldSchema::new("error_message", FieldType::Text),
        FieldSchema::new("current_section", FieldType::Number),
        FieldSchema::new("total_sections", FieldType::Number),
        FieldSchema::new("created_at", FieldType::Date),
        FieldSchema::new("updated_at", FieldType::Date),
        FieldSchema::new("completed_at", FieldType::Date),
    ];
    for stage in WorkflowStage::PIPELINE {
        fields.push(FieldSchema::new(format!("{stage}_data"), FieldType::Text));
        fields.push(FieldSchema::new(
            format!("{stage}_completed_at"),
            FieldType::Date,
        ));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_schema_covers_every_stage() {
        let schema = checkpoint_schema();
        let names: Vec<&str> = schema.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"workflow_id"));
        assert!(names.contains(&"research_data"));
        assert!(names.contains(&"finalization_completed_at"));
        assert!(names.contains(&"complete_data"));
    }
}
